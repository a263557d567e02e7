use std::path::PathBuf;

use folio_core::AppError;

/// Configuration for the filesystem blob store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub data_dir: PathBuf,
}

impl StoreConfig {
    /// Read configuration from environment variables.
    ///
    /// - `FOLIO_DATA_DIR` (optional, defaults to `./data`)
    pub fn from_env() -> Result<Self, AppError> {
        let data_dir = match std::env::var("FOLIO_DATA_DIR") {
            Ok(raw) if raw.trim().is_empty() => {
                return Err(AppError::ConfigError(
                    "FOLIO_DATA_DIR is set but empty".into(),
                ));
            }
            Ok(raw) => PathBuf::from(raw),
            Err(_) => PathBuf::from("./data"),
        };
        Ok(Self { data_dir })
    }
}
