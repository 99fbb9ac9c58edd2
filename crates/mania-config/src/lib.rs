// Persisted player settings and the key-value store they live in

pub mod settings;
pub mod store;

pub use settings::Settings;
pub use store::{JsonFileStore, KeyValueStore, MemoryStore};
