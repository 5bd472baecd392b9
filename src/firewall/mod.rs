pub mod engine;
pub mod host;
pub mod lock;
pub mod rules;

pub use engine::{EngineHandle, FirewallEngine, Pfctl};
pub use host::{EffectiveUser, Privileges};
pub use lock::{LockController, LockState, StatusReport};
pub use rules::compile;
