pub mod cli;
pub mod error;
pub mod firewall;
pub mod net;
pub mod policy;
