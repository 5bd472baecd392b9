use std::{
    ffi::OsStr,
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use tokio::process::Command;

#[cfg(test)]
use mockall::automock;

use crate::error::NetlockError;

/// Name of the pf control binary
pub const PFCTL: &str = "pfctl";

/// Resolved path of the firewall control binary, valid for one operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineHandle {
    ctl_path: PathBuf,
}

impl EngineHandle {
    pub fn new(ctl_path: impl Into<PathBuf>) -> Self {
        Self {
            ctl_path: ctl_path.into(),
        }
    }

    pub fn ctl_path(&self) -> &Path {
        &self.ctl_path
    }
}

/// Firewall engine abstraction for testing
#[cfg_attr(test, automock)]
#[async_trait]
pub trait FirewallEngine: Send + Sync + 'static {
    /// Find the control binary on the search path
    fn locate(&self) -> Result<EngineHandle, NetlockError>;

    /// Engine status text (`pfctl -s info`)
    async fn status(&self, handle: &EngineHandle) -> Result<String, NetlockError>;

    /// Active filter rules (`pfctl -s rules`)
    async fn rules(&self, handle: &EngineHandle) -> Result<String, NetlockError>;

    /// Flush all engine state and load the ruleset at `path`
    async fn load(&self, handle: &EngineHandle, path: &Path) -> Result<String, NetlockError>;
}

/// macOS / BSD packet filter driven through `pfctl`
pub struct Pfctl;

#[async_trait]
impl FirewallEngine for Pfctl {
    fn locate(&self) -> Result<EngineHandle, NetlockError> {
        let ctl_path = find_program(PFCTL).ok_or_else(|| NetlockError::EngineNotFound {
            program: PFCTL.to_string(),
        })?;
        log::info!("Using {}", ctl_path.display());
        Ok(EngineHandle::new(ctl_path))
    }

    async fn status(&self, handle: &EngineHandle) -> Result<String, NetlockError> {
        run(handle, ["-s", "info"]).await
    }

    async fn rules(&self, handle: &EngineHandle) -> Result<String, NetlockError> {
        run(handle, ["-s", "rules"]).await
    }

    async fn load(&self, handle: &EngineHandle, path: &Path) -> Result<String, NetlockError> {
        log::info!("Loading ruleset {}", path.display());
        run(
            handle,
            [OsStr::new("-F"), OsStr::new("all"), OsStr::new("-f"), path.as_os_str()],
        )
        .await
    }
}

/// Run the control binary and return its combined stdout and stderr
async fn run<I, S>(handle: &EngineHandle, args: I) -> Result<String, NetlockError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let args: Vec<S> = args.into_iter().collect();
    let command = describe(handle.ctl_path(), &args);
    log::debug!("Running {}", command);

    let output = Command::new(handle.ctl_path())
        .args(&args)
        .output()
        .await
        .map_err(|source| NetlockError::EngineSpawn {
            command: command.clone(),
            source,
        })?;

    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));

    if !output.status.success() {
        return Err(NetlockError::EngineCommand {
            command,
            status: output.status,
            output: combined,
        });
    }
    Ok(combined)
}

fn describe<S: AsRef<OsStr>>(program: &Path, args: &[S]) -> String {
    let mut command = program.display().to_string();
    for arg in args {
        command.push(' ');
        command.push_str(&arg.as_ref().to_string_lossy());
    }
    command
}

/// Search `PATH` for an executable regular file named `name`
fn find_program(name: &str) -> Option<PathBuf> {
    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

fn is_executable(path: &Path) -> bool {
    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}
