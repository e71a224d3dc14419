pub mod core;
pub mod inflight;

pub use core::{DataEvent, DataManager};
pub use inflight::{InflightLease, InflightMap, InflightSlot, InflightWaiter};
