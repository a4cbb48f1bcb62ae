pub mod api;
pub mod config;
pub mod engine;
pub mod internal;
pub mod utils;

pub use engine::{EngineEvent, EngineOptions, FeedEngine};
pub use internal::document::{Document, MemoryDocument};
