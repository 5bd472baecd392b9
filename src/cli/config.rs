use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{
    error::NetlockError,
    net::{DestinationInput, DestinationInputs},
    policy::AllowFlags,
};

#[derive(Debug, Deserialize, Serialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Ruleset restored on disable
    #[serde(default)]
    pub default_configuration: Option<PathBuf>,
    #[serde(default)]
    pub allow: AllowConfig,
    #[serde(default)]
    pub lock: LockConfig,
}

#[derive(Debug, Deserialize, Serialize, Default)]
#[serde(deny_unknown_fields)]
pub struct AllowConfig {
    #[serde(default)]
    pub incoming: bool,
    #[serde(default)]
    pub outgoing: bool,
    #[serde(default)]
    pub private_network: bool,
    #[serde(default)]
    pub icmp: bool,
}

#[derive(Debug, Deserialize, Serialize, Default)]
#[serde(deny_unknown_fields)]
pub struct LockConfig {
    /// Interfaces exempted from filtering
    #[serde(default)]
    pub interfaces: Vec<String>,
    /// Allowed IP addresses
    #[serde(default)]
    pub ips: Vec<String>,
    /// Allowed hostnames
    #[serde(default)]
    pub hosts: Vec<String>,
    /// VPN client configuration files to take endpoints from
    #[serde(default)]
    pub files: Vec<PathBuf>,
}

impl ConfigFile {
    /// Load configuration file
    pub fn load(path: &Path) -> Result<Self, NetlockError> {
        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|source| NetlockError::ConfigParse {
            path: PathBuf::from(path),
            source,
        })
    }

    pub fn allow_flags(&self) -> AllowFlags {
        AllowFlags {
            incoming: self.allow.incoming,
            outgoing: self.allow.outgoing,
            private_network: self.allow.private_network,
            icmp: self.allow.icmp,
        }
    }

    /// TOML keys carry no relative order, so entries are grouped as ips, hosts, files
    pub fn destinations(&self) -> DestinationInputs {
        let ips = self.lock.ips.iter().cloned().map(DestinationInput::Ip);
        let hosts = self.lock.hosts.iter().cloned().map(DestinationInput::Host);
        let files = self.lock.files.iter().cloned().map(DestinationInput::File);
        DestinationInputs::new(ips.chain(hosts).chain(files).collect())
    }
}
