//! Error type for `quiz-fixtures`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("failed to parse batch file {source_name}: {error}")]
  Parse {
    source_name: String,
    #[source]
    error:       toml::de::Error,
  },

  #[error("failed to read {path:?}: {error}")]
  Io {
    path:  PathBuf,
    #[source]
    error: std::io::Error,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
