use std::path::{Path, PathBuf};

/// Baseline pf ruleset restored when the lock is disabled
pub const DEFAULT_CONFIGURATION_PATH: &str = "/etc/pf.conf";

/// Desired lock state for a single invocation
///
/// Built once from already-resolved inputs and never mutated afterwards, so the
/// compiled ruleset is a pure function of this value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    allow_incoming: bool,
    allow_outgoing: bool,
    allow_private_network: bool,
    allow_icmp: bool,
    interfaces: Vec<String>,
    destinations: Vec<String>,
    default_configuration: PathBuf,
}

/// Allow switches of a [`Policy`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AllowFlags {
    pub incoming: bool,
    pub outgoing: bool,
    pub private_network: bool,
    pub icmp: bool,
}

impl Policy {
    /// Create a policy; an empty `default_configuration` falls back to [`DEFAULT_CONFIGURATION_PATH`]
    pub fn new(
        allow: AllowFlags,
        interfaces: Vec<String>,
        destinations: Vec<String>,
        default_configuration: Option<PathBuf>,
    ) -> Self {
        let default_configuration = default_configuration
            .filter(|path| !path.as_os_str().is_empty())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIGURATION_PATH));
        Self {
            allow_incoming: allow.incoming,
            allow_outgoing: allow.outgoing,
            allow_private_network: allow.private_network,
            allow_icmp: allow.icmp,
            interfaces,
            destinations,
            default_configuration,
        }
    }

    pub fn allow_incoming(&self) -> bool {
        self.allow_incoming
    }

    pub fn allow_outgoing(&self) -> bool {
        self.allow_outgoing
    }

    pub fn allow_private_network(&self) -> bool {
        self.allow_private_network
    }

    pub fn allow_icmp(&self) -> bool {
        self.allow_icmp
    }

    /// Interfaces pf skips, in insertion order
    pub fn interfaces(&self) -> &[String] {
        &self.interfaces
    }

    /// Addresses permitted to receive outbound traffic
    pub fn destinations(&self) -> &[String] {
        &self.destinations
    }

    pub fn default_configuration(&self) -> &Path {
        &self.default_configuration
    }
}

impl Default for Policy {
    fn default() -> Self {
        Self::new(AllowFlags::default(), Vec::new(), Vec::new(), None)
    }
}
