pub mod builders;
pub mod context;
pub mod document;
pub mod endpoint;
pub mod models;
pub mod render;
pub mod sentinel;
pub mod state;
