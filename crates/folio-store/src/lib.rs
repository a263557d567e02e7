pub mod config;
pub mod fs;

pub use config::StoreConfig;
pub use fs::FsBlobStore;
