//! Infrastructure - adapters behind the domain ports
//!
//! - `config`: layered settings loading (file, environment)
//! - `store`: YAML record store with atomic output replacement
//! - `portal`: HTTP client for the portal automation bridge, session reuse

pub mod config;
pub mod portal;
pub mod store;

pub use config::{ConfigSource, SettingsLoader};
pub use portal::{HttpPortal, SessionStore};
pub use store::YamlRecordStore;
