pub mod health;
pub mod selector;

pub use health::{HealthMonitor, ProbeOutcome, SourceHealth, SourceKind, probe};
pub use selector::{ResolvedSource, SourceSelector, racing_port};
