use std::io::Write;

use tempfile::NamedTempFile;

use crate::{error::NetlockError, policy::Policy};

use super::{
    engine::{EngineHandle, FirewallEngine},
    host::Privileges,
    rules,
};

/// Marker `pfctl -s info` prints when the packet filter is running
const ENABLED_MARKER: &str = "status: enabled";

/// Engine state as observed by a single operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    /// Engine is running; whether our ruleset is active is not tracked
    Unknown,
    FirewallDisabledOrAbsent,
    Locked,
    Restored,
}

/// Result of a status query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub state: LockState,
    /// Active filter rules, only queried when the engine is enabled
    pub rules: Option<String>,
}

impl StatusReport {
    pub fn is_enabled(&self) -> bool {
        self.state == LockState::Unknown
    }
}

/// Sequences privileged pf state transitions
///
/// Every mutating operation validates all preconditions before the engine is
/// asked to change anything, so a failed call leaves the active ruleset as it was.
/// Nothing is remembered between calls; each one re-queries the live engine.
pub struct LockController<E: FirewallEngine, P: Privileges> {
    engine: E,
    privileges: P,
}

impl<E: FirewallEngine, P: Privileges> LockController<E, P> {
    pub fn new(engine: E, privileges: P) -> Self {
        Self { engine, privileges }
    }

    /// Ruleset that `enable_lock` would load; no engine interaction
    pub fn build_lock_rules(&self, policy: &Policy) -> String {
        rules::compile(policy)
    }

    /// Replace the active ruleset with the compiled lock ruleset
    pub async fn enable_lock(&self, policy: &Policy) -> Result<LockState, NetlockError> {
        let handle = self.preconditions(policy).await?;

        let ruleset = write_ruleset(&rules::compile(policy))?;
        let loaded = self.engine.load(&handle, ruleset.path()).await;
        let removed = ruleset
            .close()
            .map_err(|source| NetlockError::TempRuleset {
                action: "remove",
                source,
            });

        let output = loaded?;
        removed?;
        log::debug!("pfctl: {}", output.trim_end());
        log::info!("Lock enabled");
        Ok(LockState::Locked)
    }

    /// Reload the baseline ruleset
    pub async fn disable_lock(&self, policy: &Policy) -> Result<LockState, NetlockError> {
        let handle = self.preconditions(policy).await?;

        let output = self
            .engine
            .load(&handle, policy.default_configuration())
            .await?;
        log::debug!("pfctl: {}", output.trim_end());
        log::info!(
            "Lock disabled, restored {}",
            policy.default_configuration().display()
        );
        Ok(LockState::Restored)
    }

    /// Whether the packet filter itself is running
    pub async fn is_enabled(&self) -> Result<bool, NetlockError> {
        let handle = self.engine.locate()?;
        self.query_enabled(&handle).await
    }

    /// Observe the engine without changing it
    pub async fn state(&self) -> Result<LockState, NetlockError> {
        let (state, _) = self.observe().await?;
        Ok(state)
    }

    /// Engine state plus the active rules when it is running
    pub async fn report(&self) -> Result<StatusReport, NetlockError> {
        let (state, running) = self.observe().await?;
        let rules = match running {
            Some(handle) => Some(self.engine.rules(&handle).await?),
            None => None,
        };
        Ok(StatusReport { state, rules })
    }

    /// The handle is only returned while the engine is running
    async fn observe(&self) -> Result<(LockState, Option<EngineHandle>), NetlockError> {
        let handle = match self.engine.locate() {
            Ok(handle) => handle,
            Err(NetlockError::EngineNotFound { .. }) => {
                return Ok((LockState::FirewallDisabledOrAbsent, None));
            }
            Err(err) => return Err(err),
        };
        if self.query_enabled(&handle).await? {
            Ok((LockState::Unknown, Some(handle)))
        } else {
            Ok((LockState::FirewallDisabledOrAbsent, None))
        }
    }

    /// Checked in order: engine present, superuser, baseline exists, engine enabled
    async fn preconditions(&self, policy: &Policy) -> Result<EngineHandle, NetlockError> {
        let handle = self.engine.locate()?;

        if !self.privileges.is_superuser() {
            return Err(NetlockError::NotSuperuser {
                program: handle.ctl_path().display().to_string(),
            });
        }

        let baseline = policy.default_configuration();
        if !baseline.exists() {
            return Err(NetlockError::BaselineMissing {
                path: baseline.to_path_buf(),
            });
        }

        // TODO: the engine can be disabled between this check and the load call;
        // decide whether to re-check right before loading or rely on the load error.
        if !self.query_enabled(&handle).await? {
            return Err(NetlockError::EngineDisabled);
        }

        Ok(handle)
    }

    async fn query_enabled(&self, handle: &EngineHandle) -> Result<bool, NetlockError> {
        let status = self.engine.status(handle).await?;
        let enabled = is_enabled_status(&status);
        log::info!(
            "Packet filter is {}",
            if enabled { "enabled" } else { "disabled" }
        );
        Ok(enabled)
    }
}

fn is_enabled_status(status: &str) -> bool {
    status.to_lowercase().contains(ENABLED_MARKER)
}

/// Write the ruleset to a fresh owner-only temporary file
fn write_ruleset(rules: &str) -> Result<NamedTempFile, NetlockError> {
    let mut file = tempfile::Builder::new()
        .prefix("netlock.")
        .suffix(".conf")
        .tempfile()
        .map_err(|source| NetlockError::TempRuleset {
            action: "create",
            source,
        })?;
    file.write_all(rules.as_bytes())
        .and_then(|()| file.flush())
        .map_err(|source| NetlockError::TempRuleset {
            action: "write",
            source,
        })?;
    log::debug!("Wrote ruleset to {}", file.path().display());
    Ok(file)
}
