use std::{fs, net::IpAddr, path::Path};

use crate::error::NetlockError;

/// Shortest token accepted from a VPN client configuration line
const MIN_TOKEN_LEN: usize = 4;

/// A destination token after classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostSpec {
    /// Syntactically valid IPv4/IPv6 literal, kept verbatim
    Address(String),
    /// Anything else; must be resolved before it can be used in a rule
    Host(String),
}

/// Classify a raw token as an address literal or a hostname
///
/// Tokens that fail to parse as an IP address are treated as hostnames, so
/// `999.1.1.1` ends up in name resolution rather than being rejected here.
pub fn classify(token: &str) -> HostSpec {
    let token = token.trim();
    if token.parse::<IpAddr>().is_ok() {
        HostSpec::Address(token.to_string())
    } else {
        HostSpec::Host(token.to_string())
    }
}

/// Read a VPN client configuration file and return its endpoint tokens
pub fn read_vpn_config(path: &Path) -> Result<Vec<String>, NetlockError> {
    let content = fs::read_to_string(path).map_err(|source| NetlockError::DestinationFile {
        path: path.to_path_buf(),
        source,
    })?;
    let tokens = parse_vpn_config(&content);
    log::info!("Found {} endpoint(s) in {}", tokens.len(), path.display());
    Ok(tokens)
}

/// Extract endpoint tokens from OpenVPN or WireGuard client configuration text
///
/// Recognised lines:
/// - OpenVPN: `remote <host> [port] [proto]`
/// - WireGuard: `Endpoint = <host>:<port>` (key is case-insensitive, IPv6 in brackets)
///
/// Every other line is ignored. Tokens shorter than four characters are dropped.
///
/// # Examples
/// ```
/// use netlock::net::parse_vpn_config;
///
/// let tokens = parse_vpn_config("client\nremote vpn.example.com 1194 udp\n");
/// assert_eq!(tokens, vec!["vpn.example.com".to_string()]);
/// ```
pub fn parse_vpn_config(content: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    for line in content.lines() {
        let Some(token) = endpoint_token(line) else {
            continue;
        };
        if token.chars().count() < MIN_TOKEN_LEN {
            log::warn!(
                "Ignoring malformed endpoint '{}' in line: {}",
                token,
                line.trim()
            );
            continue;
        }
        tokens.push(token.to_string());
    }
    tokens
}

fn endpoint_token(line: &str) -> Option<&str> {
    let line = line.trim();
    if line.starts_with('#') || line.starts_with(';') {
        return None;
    }

    // `remote-random` and friends share the prefix, so require whitespace after it
    if let Some(rest) = line.strip_prefix("remote")
        && rest.starts_with(char::is_whitespace)
    {
        return rest.split_whitespace().next();
    }

    let (key, value) = line.split_once('=')?;
    if !key.trim().eq_ignore_ascii_case("endpoint") {
        return None;
    }
    let value = value.split_once('#').map_or(value, |(value, _)| value).trim();
    if value.is_empty() {
        return None;
    }
    Some(strip_port(value))
}

/// Drop the `:port` suffix of a WireGuard endpoint
fn strip_port(endpoint: &str) -> &str {
    if let Some(rest) = endpoint.strip_prefix('[') {
        return rest.split_once(']').map_or(rest, |(host, _)| host);
    }
    if endpoint.parse::<IpAddr>().is_ok() {
        return endpoint;
    }
    match endpoint.rsplit_once(':') {
        Some((host, port)) if !host.is_empty() && port.chars().all(|c| c.is_ascii_digit()) => host,
        _ => endpoint,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;

    #[rstest]
    #[case("9.9.9.9", HostSpec::Address("9.9.9.9".to_string()))]
    #[case("2001:4860:4860::8888", HostSpec::Address("2001:4860:4860::8888".to_string()))]
    #[case("  10.0.0.1 ", HostSpec::Address("10.0.0.1".to_string()))]
    #[case("vpn.example.com", HostSpec::Host("vpn.example.com".to_string()))]
    #[case("999.999.999.999", HostSpec::Host("999.999.999.999".to_string()))]
    #[case("192.168.1", HostSpec::Host("192.168.1".to_string()))]
    fn test_classify(#[case] token: &str, #[case] expected: HostSpec) {
        assert_eq!(classify(token), expected);
    }

    #[rstest]
    #[case("remote vpn.example.com 1194 udp", Some("vpn.example.com"))]
    #[case("remote 203.0.113.5", Some("203.0.113.5"))]
    #[case("  remote\t198.51.100.7 443 tcp", Some("198.51.100.7"))]
    #[case("remote-random", None)]
    #[case("remote", None)]
    #[case("# remote vpn.example.com 1194", None)]
    #[case("; remote vpn.example.com 1194", None)]
    #[case("Endpoint = 203.0.113.9:51820", Some("203.0.113.9"))]
    #[case("endpoint=wg.example.net:51820", Some("wg.example.net"))]
    #[case("Endpoint = [2001:db8::1]:51820", Some("2001:db8::1"))]
    #[case("Endpoint = 2001:db8::1", Some("2001:db8::1"))]
    #[case("Endpoint =", None)]
    #[case("Endpoint = 1.2.3.4:51820 # home", Some("1.2.3.4"))]
    #[case("Endpoint = [2001:db8::1]:51820#office", Some("2001:db8::1"))]
    #[case("Endpoint = # unset", None)]
    #[case("PublicKey = abc=", None)]
    #[case("proto udp", None)]
    fn test_endpoint_token(#[case] line: &str, #[case] expected: Option<&str>) {
        assert_eq!(endpoint_token(line), expected);
    }

    #[test]
    fn test_parse_openvpn_config() {
        let content = "\
client
dev tun
proto udp
remote vpn.example.com 1194 udp
remote 203.0.113.5 1194
resolv-retry infinite
";
        assert_eq!(
            parse_vpn_config(content),
            vec!["vpn.example.com".to_string(), "203.0.113.5".to_string()]
        );
    }

    #[test]
    fn test_parse_wireguard_config() {
        let content = "\
[Interface]
PrivateKey = aGVsbG8=
Address = 10.2.0.2/32
DNS = 10.2.0.1

[Peer]
PublicKey = d29ybGQ=
AllowedIPs = 0.0.0.0/0
Endpoint = 185.159.157.1:51820
";
        assert_eq!(parse_vpn_config(content), vec!["185.159.157.1".to_string()]);
    }

    #[test]
    fn test_short_tokens_are_dropped() {
        let content = "remote a.b 1194\nremote x\nEndpoint = ab:51820\n";
        assert!(parse_vpn_config(content).is_empty());
    }

    #[test]
    fn test_read_vpn_config_from_file() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "client\nremote vpn.example.com 1194 udp").unwrap();

        let tokens = read_vpn_config(tmp.path()).unwrap();
        assert_eq!(tokens, vec!["vpn.example.com".to_string()]);
    }

    #[test]
    fn test_read_missing_vpn_config_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.ovpn");

        let result = read_vpn_config(&missing);
        match result {
            Err(NetlockError::DestinationFile { path, .. }) => assert_eq!(path, missing),
            other => panic!("Expected DestinationFile error, got {other:?}"),
        }
    }
}
