use thiserror::Error;

use std::path::PathBuf;

use hickory_resolver::ResolveError;

#[derive(Debug, Error)]
pub enum NetlockError {
    #[error("{0}")]
    Usage(String),

    #[error("failed to read destination file {path}: {source}")]
    DestinationFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to initialize DNS resolver: {source}")]
    DnsResolverInit {
        #[source]
        source: ResolveError,
    },

    #[error("failed to resolve host {host}: {source}")]
    DnsLookup {
        host: String,
        #[source]
        source: ResolveError,
    },

    #[error("host {host} resolved to no addresses")]
    NoAddresses { host: String },

    #[error("failed to parse config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("{program} not found in PATH")]
    EngineNotFound { program: String },

    #[error("superuser privileges are required for {program}")]
    NotSuperuser { program: String },

    #[error("default configuration {path} does not exist")]
    BaselineMissing { path: PathBuf },

    #[error("packet filter is disabled")]
    EngineDisabled,

    #[error("failed to run {command}: {source}")]
    EngineSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} exited with {status}:\n{output}")]
    EngineCommand {
        command: String,
        status: std::process::ExitStatus,
        output: String,
    },

    #[error("failed to {action} temporary ruleset: {source}")]
    TempRuleset {
        action: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl NetlockError {
    /// Usage errors map to `EX_USAGE`, everything else is a plain failure
    pub fn exit_code(&self) -> i32 {
        match self {
            NetlockError::Usage(_) => 64,
            _ => 1,
        }
    }
}
