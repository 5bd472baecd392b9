use std::net::IpAddr;

use async_trait::async_trait;
use hickory_resolver::{
    Resolver, TokioResolver,
    config::{LookupIpStrategy, ResolverOpts},
};

#[cfg(test)]
use mockall::automock;

use crate::error::NetlockError;

/// Name resolution abstraction for testing
#[cfg_attr(test, automock)]
#[async_trait]
pub trait DnsResolver: Send + Sync + 'static {
    /// Resolve a hostname to every address it maps to
    ///
    /// An empty answer is an error: a host that cannot be allowed must not
    /// silently shrink the allowlist.
    async fn lookup(&self, host: &str) -> Result<Vec<IpAddr>, NetlockError>;
}

/// Production resolver using the system configuration (`/etc/resolv.conf`, hosts file)
pub struct SystemDnsResolver {
    resolver: TokioResolver,
}

impl SystemDnsResolver {
    /// Build one resolver from the system configuration, reused for every lookup
    pub fn new() -> Result<Self, NetlockError> {
        let mut builder =
            Resolver::builder_tokio().map_err(|source| NetlockError::DnsResolverInit { source })?;
        query_all_families(builder.options_mut());
        Ok(Self {
            resolver: builder.build(),
        })
    }
}

/// Ask for A and AAAA records together; the default stops after a non-empty A answer
fn query_all_families(opts: &mut ResolverOpts) {
    opts.ip_strategy = LookupIpStrategy::Ipv4AndIpv6;
}

#[async_trait]
impl DnsResolver for SystemDnsResolver {
    async fn lookup(&self, host: &str) -> Result<Vec<IpAddr>, NetlockError> {
        let response = self
            .resolver
            .lookup_ip(host)
            .await
            .map_err(|source| NetlockError::DnsLookup {
                host: host.to_string(),
                source,
            })?;

        let addrs: Vec<IpAddr> = response.iter().collect();
        if addrs.is_empty() {
            return Err(NetlockError::NoAddresses {
                host: host.to_string(),
            });
        }
        log::debug!("Resolved {} to {:?}", host, addrs);
        Ok(addrs)
    }
}
