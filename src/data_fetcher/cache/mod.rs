pub mod response_cache;
pub mod types;

pub use response_cache::ResponseCache;
pub use types::{CacheKey, CachedPayload};
