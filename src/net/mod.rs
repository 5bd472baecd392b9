pub mod extractor;
pub mod parser;
pub mod resolver;

// Re-export main types and functions
pub use extractor::{DestinationExtractor, DestinationInput, DestinationInputs};
pub use parser::{HostSpec, classify, parse_vpn_config, read_vpn_config};
pub use resolver::{DnsResolver, SystemDnsResolver};
