//! Seed data for the quiz store.
//!
//! Each batch is a TOML file under `data/`, embedded at compile time. Extra
//! batches can be read from a directory at run time with [`load_dir`]; they
//! join the same dependency graph as the built-in ones.

mod error;

use std::path::Path;

use quiz_core::fixture::FixtureBatch;

pub use error::{Error, Result};

/// Built-in batch files, as `(file name, contents)`.
const BUILTIN: &[(&str, &str)] = &[
  ("base.toml", include_str!("../data/base.toml")),
  ("php.toml", include_str!("../data/php.toml")),
  ("symfony.toml", include_str!("../data/symfony.toml")),
  ("symfony_certification.toml", include_str!("../data/symfony_certification.toml")),
];

/// Parse one batch file. `source_name` only appears in error messages.
pub fn parse(source_name: &str, contents: &str) -> Result<FixtureBatch> {
  toml::from_str(contents).map_err(|error| Error::Parse {
    source_name: source_name.to_owned(),
    error,
  })
}

/// Every built-in batch, in file order.
pub fn builtin() -> Result<Vec<FixtureBatch>> {
  BUILTIN
    .iter()
    .map(|(name, contents)| parse(name, contents))
    .collect()
}

/// Read every `*.toml` batch in `dir`, sorted by file name.
pub fn load_dir(dir: impl AsRef<Path>) -> Result<Vec<FixtureBatch>> {
  let dir = dir.as_ref();
  let io_err = |path: &Path| {
    let path = path.to_path_buf();
    move |error: std::io::Error| Error::Io { path, error }
  };

  let mut paths = std::fs::read_dir(dir)
    .map_err(io_err(dir))?
    .map(|entry| entry.map(|e| e.path()))
    .collect::<std::io::Result<Vec<_>>>()
    .map_err(io_err(dir))?;
  paths.retain(|p| p.extension().is_some_and(|ext| ext == "toml"));
  paths.sort();

  paths
    .iter()
    .map(|path| {
      let contents = std::fs::read_to_string(path).map_err(io_err(path))?;
      tracing::debug!(path = %path.display(), "read batch file");
      parse(&path.display().to_string(), &contents)
    })
    .collect()
}
