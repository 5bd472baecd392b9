use std::path::PathBuf;

use crate::error::NetlockError;
use crate::net::{DestinationExtractor, DestinationInputs, DnsResolver};
use crate::policy::{AllowFlags, Policy};

use super::args::{Action, Args};
use super::config::ConfigFile;

/// Raw, unresolved policy inputs merged from the config file and the command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyInputs {
    pub allow: AllowFlags,
    pub interfaces: Vec<String>,
    pub destinations: DestinationInputs,
    pub default_configuration: Option<PathBuf>,
}

impl PolicyInputs {
    /// Build the final policy from already-extracted destinations
    pub fn into_policy(self, destinations: Vec<String>) -> Policy {
        Policy::new(
            self.allow,
            self.interfaces,
            destinations,
            self.default_configuration,
        )
    }
}

/// Load and merge policy inputs from command line arguments and config file
pub struct PolicyLoader;

impl PolicyLoader {
    /// Collect every input without touching the network
    ///
    /// Config file entries come first, CLI entries after in command line order.
    /// Allow flags are OR-ed, and `--default-conf` overrides the file's
    /// `default_configuration`.
    pub fn gather(args: &Args) -> Result<PolicyInputs, NetlockError> {
        let mut inputs = PolicyInputs::default();

        if let Some(config_path) = args.config.as_ref() {
            let config = ConfigFile::load(config_path)?;
            inputs.allow = config.allow_flags();
            inputs.destinations = config.destinations();
            inputs.interfaces = config.lock.interfaces;
            inputs.default_configuration = config.default_configuration;
        }

        inputs.allow.incoming |= args.allow_incoming;
        inputs.allow.outgoing |= args.allow_outgoing;
        inputs.allow.private_network |= args.allow_private_network;
        inputs.allow.icmp |= args.allow_icmp;
        inputs.interfaces.extend(args.interfaces.iter().cloned());
        inputs.destinations.extend(args.destinations.clone());
        if let Some(default_conf) = args.default_conf.as_ref() {
            inputs.default_configuration = Some(default_conf.clone());
        }

        Ok(inputs)
    }

    /// Load the complete policy for `action`
    ///
    /// The resolver is only built when the action compiles lock rules. Disabling
    /// must keep working under an active lock, where name resolution is blocked.
    pub async fn load<R, F>(
        args: &Args,
        action: Action,
        resolver: F,
    ) -> Result<Policy, NetlockError>
    where
        R: DnsResolver,
        F: FnOnce() -> Result<R, NetlockError>,
    {
        let inputs = Self::gather(args)?;
        let destinations = if action.needs_destinations() {
            DestinationExtractor::new(resolver()?)
                .extract(&inputs.destinations)
                .await?
        } else {
            Vec::new()
        };
        Ok(inputs.into_policy(destinations))
    }
}
