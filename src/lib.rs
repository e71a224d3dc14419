//! Data-access layer for the MX Bikes community site.
//!
//! A [`DataManager`] loads tracks, mods, downloads, races, rankings and rider
//! profiles from a public or internal API. Results are normalized into one
//! schema per content type and cached. Loads are retried and rate limited,
//! and fall back to static JSON documents when a source is down. Domain
//! managers in [`managers`] build listings on top of it.
//!
//! # Examples
//!
//! ```rust,no_run
//! use mxbikes_data::{AppError, Config, DataManager, LoadOptions};
//! use mxbikes_data::managers::TracksManager;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), AppError> {
//!     let manager = DataManager::new(Config::load().await?)?;
//!     manager.initialize().await;
//!
//!     let tracks = manager
//!         .load_data("tracks", LoadOptions::new().with_category("Motocross"))
//!         .await?;
//!     println!("{} motocross tracks", tracks.len());
//!
//!     let mut listing = TracksManager::new(manager.clone());
//!     listing.load().await;
//!     for track in listing.tracks() {
//!         println!("{} by {}", track.name, track.creator);
//!     }
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod constants;
pub mod data_fetcher;
pub mod error;
pub mod logging;
pub mod managers;
pub mod testing_utils;

// Re-export commonly used types for convenience
pub use config::Config;
pub use data_fetcher::models::{ContentItem, ContentType, LoadOptions, NormalizedData};
pub use data_fetcher::{DataEvent, DataManager};
pub use error::AppError;

/// Current version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
