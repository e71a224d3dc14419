pub mod api;
pub mod cache;
pub mod manager;
pub mod models;
pub mod processors;
pub mod sources;

pub use manager::{DataEvent, DataManager};
pub use models::{ContentItem, ContentType, LoadOptions, NormalizedData};
pub use sources::SourceHealth;
