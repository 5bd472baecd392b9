use nix::unistd::Uid;

#[cfg(test)]
use mockall::automock;

/// Process identity abstraction for testing
#[cfg_attr(test, automock)]
pub trait Privileges: Send + Sync + 'static {
    /// Whether the effective user is root
    fn is_superuser(&self) -> bool;
}

/// Identity of the running process
pub struct EffectiveUser;

impl Privileges for EffectiveUser {
    fn is_superuser(&self) -> bool {
        Uid::effective().is_root()
    }
}
