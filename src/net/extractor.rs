use std::path::PathBuf;

use crate::error::NetlockError;

use super::{
    parser::{HostSpec, classify, read_vpn_config},
    resolver::DnsResolver,
};

/// One destination input as given by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DestinationInput {
    /// Address literal; an invalid one falls through to name resolution
    Ip(String),
    Host(String),
    /// OpenVPN / WireGuard client configuration file
    File(PathBuf),
}

/// Raw destination inputs in the order they were given, before anything is resolved
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DestinationInputs {
    entries: Vec<DestinationInput>,
}

impl DestinationInputs {
    pub fn new(entries: Vec<DestinationInput>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[DestinationInput] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append another set of inputs after this one
    pub fn extend(&mut self, other: Self) {
        self.entries.extend(other.entries);
    }
}

/// Turns [`DestinationInputs`] into the concrete addresses used in pass rules
pub struct DestinationExtractor<R: DnsResolver> {
    resolver: R,
}

impl<R: DnsResolver> DestinationExtractor<R> {
    pub fn new(resolver: R) -> Self {
        Self { resolver }
    }

    /// Produce the destination list in first-seen order, without duplicates
    ///
    /// All files are read before the first lookup. Any unreadable file or failed
    /// lookup aborts the whole extraction, so the caller never sees a partial
    /// allowlist.
    pub async fn extract(&self, inputs: &DestinationInputs) -> Result<Vec<String>, NetlockError> {
        let mut specs: Vec<HostSpec> = Vec::new();
        for input in inputs.entries() {
            match input {
                DestinationInput::Ip(token) | DestinationInput::Host(token) => {
                    if !token.trim().is_empty() {
                        specs.push(classify(token));
                    }
                }
                DestinationInput::File(path) => {
                    specs.extend(read_vpn_config(path)?.iter().map(|token| classify(token)));
                }
            }
        }

        let mut destinations = Vec::new();
        for spec in specs {
            match spec {
                HostSpec::Address(addr) => push_unique(&mut destinations, addr),
                HostSpec::Host(host) => {
                    for ip in self.resolver.lookup(&host).await? {
                        log::info!("Resolved {} to {}", host, ip);
                        push_unique(&mut destinations, ip.to_string());
                    }
                }
            }
        }
        Ok(destinations)
    }
}

fn push_unique(destinations: &mut Vec<String>, addr: String) {
    if !destinations.contains(&addr) {
        destinations.push(addr);
    }
}
