pub mod client;
pub mod models;
pub mod portals;

// Re-export the ergonomic client and configuration for easy access
pub use client::{CkanClient, CkanError, Configuration, DEFAULT_TIMEOUT_SECS};
pub use portals::{PORTALS, Portal};
