use std::{ffi::OsString, path::PathBuf};

use clap::{ArgAction, ArgMatches, CommandFactory, FromArgMatches, Parser};

use crate::error::NetlockError;
use crate::net::{DestinationInput, DestinationInputs};

#[derive(Parser, Debug, Default)]
#[command(
    author,
    version,
    about = "Network killswitch for pf: block all traffic except VPN endpoints"
)]
pub struct Args {
    /// Path to configuration file (TOML)
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable lock
    #[arg(short = 'e', long = "enable")]
    pub enable: bool,

    /// Disable lock and restore the default configuration
    #[arg(short = 'd', long = "disable")]
    pub disable: bool,

    /// Print lock rules
    #[arg(short = 'p', long = "print")]
    pub print: bool,

    /// Show packet filter status and active rules
    #[arg(short = 's', long = "status")]
    pub status: bool,

    /// Allow incoming traffic
    #[arg(long = "allow-incoming")]
    pub allow_incoming: bool,

    /// Allow outgoing traffic
    #[arg(long = "allow-outgoing")]
    pub allow_outgoing: bool,

    /// Allow traffic within private networks (LAN, link-local, multicast)
    #[arg(long = "allow-private-network")]
    pub allow_private_network: bool,

    /// Allow ICMP and ICMPv6
    #[arg(long = "allow-icmp")]
    pub allow_icmp: bool,

    /// Pass out to the specified IP address
    #[arg(long = "ip", value_name = "ADDR", value_delimiter = ',')]
    pub ips: Vec<String>,

    /// Pass out to every address the host resolves to
    #[arg(long = "host", value_name = "HOST", value_delimiter = ',')]
    pub hosts: Vec<String>,

    /// Pass out to the endpoints of an OpenVPN (.ovpn) or WireGuard config file
    #[arg(long = "file", value_name = "PATH")]
    pub files: Vec<PathBuf>,

    /// Skip filtering on the interface (lo0 is always skipped)
    #[arg(long = "if", value_name = "INTERFACE", value_delimiter = ',')]
    pub interfaces: Vec<String>,

    /// Ruleset restored on disable [default: /etc/pf.conf]
    #[arg(long = "default-conf", value_name = "PATH")]
    pub default_conf: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    /// `--ip`, `--host` and `--file` values in command line order
    #[arg(skip)]
    pub destinations: DestinationInputs,
}

/// What a single invocation does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Print,
    Enable { print: bool },
    Disable { print: bool },
    Status,
}

impl Action {
    pub fn prints_rules(self) -> bool {
        matches!(
            self,
            Action::Print | Action::Enable { print: true } | Action::Disable { print: true }
        )
    }

    /// Destinations only need resolving when lock rules are compiled
    pub fn needs_destinations(self) -> bool {
        matches!(self, Action::Enable { .. }) || self.prints_rules()
    }
}

impl Args {
    /// Parse `std::env::args_os`, keeping the relative order of destination flags
    pub fn parse_ordered() -> Self {
        let matches = Self::command().get_matches();
        Self::from_matches(&matches).unwrap_or_else(|err| err.exit())
    }

    pub fn try_parse_ordered_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = Self::command().try_get_matches_from(itr)?;
        Self::from_matches(&matches)
    }

    fn from_matches(matches: &ArgMatches) -> Result<Self, clap::Error> {
        let mut args = Self::from_arg_matches(matches)?;
        args.destinations = ordered_destinations(matches);
        Ok(args)
    }

    /// Resolve the action flags, rejecting missing or contradictory combinations
    pub fn action(&self) -> Result<Action, NetlockError> {
        match (self.enable, self.disable, self.print, self.status) {
            (true, true, _, _) => Err(NetlockError::Usage(
                "--enable and --disable are mutually exclusive".to_string(),
            )),
            (_, _, _, true) if self.enable || self.disable || self.print => Err(
                NetlockError::Usage("--status cannot be combined with other actions".to_string()),
            ),
            (false, false, false, false) => Err(NetlockError::Usage(
                "one of --enable, --disable, --print or --status is required".to_string(),
            )),
            (_, _, _, true) => Ok(Action::Status),
            (true, false, print, _) => Ok(Action::Enable { print }),
            (false, true, print, _) => Ok(Action::Disable { print }),
            (false, false, true, _) => Ok(Action::Print),
        }
    }
}

/// Interleave the destination flags by their argv index
fn ordered_destinations(matches: &ArgMatches) -> DestinationInputs {
    let mut indexed = indexed_values(matches, "ips", DestinationInput::Ip);
    indexed.extend(indexed_values(matches, "hosts", DestinationInput::Host));
    indexed.extend(indexed_values(matches, "files", DestinationInput::File));
    indexed.sort_by_key(|(index, _)| *index);
    DestinationInputs::new(indexed.into_iter().map(|(_, input)| input).collect())
}

fn indexed_values<T>(
    matches: &ArgMatches,
    id: &str,
    wrap: fn(T) -> DestinationInput,
) -> Vec<(usize, DestinationInput)>
where
    T: Clone + Send + Sync + 'static,
{
    match (matches.indices_of(id), matches.get_many::<T>(id)) {
        (Some(indices), Some(values)) => indices
            .zip(values.cloned())
            .map(|(index, value)| (index, wrap(value)))
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(&["netlock", "-e"], Action::Enable { print: false })]
    #[case(&["netlock", "-e", "--print"], Action::Enable { print: true })]
    #[case(&["netlock", "--disable"], Action::Disable { print: false })]
    #[case(&["netlock", "-d", "-p"], Action::Disable { print: true })]
    #[case(&["netlock", "--print"], Action::Print)]
    #[case(&["netlock", "--status"], Action::Status)]
    fn test_action(#[case] argv: &[&str], #[case] expected: Action) {
        let args = Args::try_parse_from(argv).unwrap();
        assert_eq!(args.action().unwrap(), expected);
    }

    #[rstest]
    #[case(&["netlock"])]
    #[case(&["netlock", "--allow-icmp", "--ip", "9.9.9.9"])]
    #[case(&["netlock", "-e", "-d"])]
    #[case(&["netlock", "-s", "-e"])]
    #[case(&["netlock", "-s", "-p"])]
    fn test_action_usage_errors(#[case] argv: &[&str]) {
        let args = Args::try_parse_from(argv).unwrap();
        let err = args.action().unwrap_err();
        assert!(matches!(err, NetlockError::Usage(_)));
        assert_eq!(err.exit_code(), 64);
    }

    #[rstest]
    #[case(Action::Print, true, true)]
    #[case(Action::Enable { print: false }, false, true)]
    #[case(Action::Disable { print: false }, false, false)]
    #[case(Action::Disable { print: true }, true, true)]
    #[case(Action::Status, false, false)]
    fn test_action_requirements(
        #[case] action: Action,
        #[case] prints: bool,
        #[case] resolves: bool,
    ) {
        assert_eq!(action.prints_rules(), prints);
        assert_eq!(action.needs_destinations(), resolves);
    }

    #[test]
    fn test_parse_destinations_and_interfaces() {
        let args = Args::try_parse_from([
            "netlock",
            "-e",
            "--ip",
            "9.9.9.9,1.1.1.1",
            "--host",
            "vpn.example.com",
            "--file",
            "/etc/openvpn/client.ovpn",
            "--if",
            "utun0",
            "--if",
            "utun1",
            "--allow-private-network",
            "-vv",
        ])
        .unwrap();
        assert_eq!(args.ips, vec!["9.9.9.9", "1.1.1.1"]);
        assert_eq!(args.hosts, vec!["vpn.example.com"]);
        assert_eq!(args.files, vec![PathBuf::from("/etc/openvpn/client.ovpn")]);
        assert_eq!(args.interfaces, vec!["utun0", "utun1"]);
        assert!(args.allow_private_network);
        assert!(!args.allow_icmp);
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_destinations_keep_command_line_order() {
        let args = Args::try_parse_ordered_from([
            "netlock",
            "-p",
            "--file",
            "/etc/openvpn/client.ovpn",
            "--ip",
            "9.9.9.9,1.1.1.1",
            "--host",
            "vpn.example.com",
            "--ip",
            "8.8.8.8",
        ])
        .unwrap();
        assert_eq!(
            args.destinations.entries(),
            [
                DestinationInput::File(PathBuf::from("/etc/openvpn/client.ovpn")),
                DestinationInput::Ip("9.9.9.9".to_string()),
                DestinationInput::Ip("1.1.1.1".to_string()),
                DestinationInput::Host("vpn.example.com".to_string()),
                DestinationInput::Ip("8.8.8.8".to_string()),
            ]
        );
        assert_eq!(args.ips, vec!["9.9.9.9", "1.1.1.1", "8.8.8.8"]);
    }

    #[test]
    fn test_ordered_parse_without_destinations() {
        let args = Args::try_parse_ordered_from(["netlock", "-d"]).unwrap();
        assert!(args.destinations.is_empty());
        assert_eq!(args.action().unwrap(), Action::Disable { print: false });
    }
}
