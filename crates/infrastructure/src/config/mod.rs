pub mod loader;

pub use loader::{ConfigSource, SettingsLoader};
