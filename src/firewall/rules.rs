//! pf ruleset generation.
//!
//! The template is order-sensitive: pf evaluates rules last-match-wins, so the
//! per-destination pass rules must come after the default block rules.

use crate::policy::Policy;

/// Interface that is never filtered
pub const LOOPBACK_INTERFACE: &str = "lo0";

/// Private IPv4 ranges, each allowed to talk to itself
pub const IPV4_PRIVATE_NETWORKS: [&str; 4] = ["169.254/16", "192.168/16", "172.16/12", "10/8"];

/// Local multicast (incl. mDNS), SSDP/SLP and limited broadcast destinations
pub const IPV4_LOCAL_DESTINATIONS: [&str; 4] = [
    "224/24",
    "239.255.255.250/32",
    "239.255.255.253/32",
    "255.255.255.255/32",
];

/// Link-local and unique-local IPv6 ranges
pub const IPV6_PRIVATE_NETWORKS: [&str; 2] = ["fe80::/10", "fc00::/7"];

/// Link-local scoped IPv6 multicast
pub const IPV6_LOCAL_DESTINATIONS: [&str; 2] = ["ff02::/16", "ff12::/16"];

/// Compile a policy into pf ruleset text
///
/// Pure and infallible; the same policy always yields the same bytes.
pub fn compile(policy: &Policy) -> String {
    let mut rules = String::from("set block-policy return\n");

    let mut skip = vec![LOOPBACK_INTERFACE];
    skip.extend(policy.interfaces().iter().map(String::as_str));
    rules.push_str(&format!("set skip on {{ {} }}\n", skip.join(" ")));

    rules.push_str("scrub in all fragment reassemble\n");

    if policy.allow_incoming() {
        rules.push_str("pass in all\n");
    } else {
        rules.push_str("block in all\n");
    }
    if policy.allow_outgoing() {
        rules.push_str("pass out all\n");
    } else {
        rules.push_str("block out all\n");
    }

    if policy.allow_private_network() {
        push_private_networks(&mut rules, &IPV4_PRIVATE_NETWORKS, &IPV4_LOCAL_DESTINATIONS);
        push_private_networks(&mut rules, &IPV6_PRIVATE_NETWORKS, &IPV6_LOCAL_DESTINATIONS);
    }

    if policy.allow_icmp() {
        rules.push_str("pass quick proto { icmp, icmp6 } all\n");
    }

    for destination in policy.destinations() {
        rules.push_str(&format!(
            "pass out quick {} from any to {}\n",
            address_family(destination),
            destination
        ));
    }

    rules
}

fn push_private_networks(rules: &mut String, networks: &[&str], local_destinations: &[&str]) {
    for network in networks {
        rules.push_str(&format!("pass quick from {network} to {network}\n"));
    }
    rules.push_str(&format!(
        "pass out quick from {{ {} }} to {{ {} }}\n",
        networks.join(", "),
        local_destinations.join(", ")
    ));
}

fn address_family(destination: &str) -> &'static str {
    if destination.contains(':') {
        "inet6"
    } else {
        "inet"
    }
}
