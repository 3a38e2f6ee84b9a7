//! Runtime configuration: an optional TOML file overlaid by `QUIZ_*`
//! environment variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
  /// SQLite database file; created if missing.
  #[serde(default = "default_database_path")]
  pub database_path: PathBuf,
  /// Directory of extra `*.toml` batches loaded alongside the built-in ones.
  #[serde(default)]
  pub fixtures_dir:  Option<PathBuf>,
}

fn default_database_path() -> PathBuf { PathBuf::from("quiz.db") }

impl Settings {
  /// Read `path` (if it exists), then apply `QUIZ_DATABASE_PATH` and
  /// `QUIZ_FIXTURES_DIR` on top.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings: Self = config::Config::builder()
      .add_source(config::File::from(path.to_path_buf()).required(false))
      .add_source(config::Environment::with_prefix("QUIZ"))
      .build()
      .context("failed to read config file")?
      .try_deserialize()
      .context("failed to deserialise settings")?;

    Ok(Self {
      database_path: expand_tilde(&settings.database_path),
      fixtures_dir:  settings.fixtures_dir.as_deref().map(expand_tilde),
    })
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
