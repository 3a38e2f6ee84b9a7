//! Error types for `quiz-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A batch referenced a category that no earlier batch created. This means
  /// the base batch was skipped or the dependency graph is wrong.
  #[error("category {0:?} does not exist; load the batch that creates it first")]
  MissingCategory(String),

  #[error("subcategory {category:?}:{name:?} does not exist")]
  UnknownSubcategory { category: String, name: String },

  #[error("question {0:?} has no category and its batch declares no default")]
  MissingQuestionCategory(String),

  #[error("batch {0:?} is declared more than once")]
  DuplicateBatch(String),

  #[error("batch {batch:?} depends on unknown batch {dependency:?}")]
  UnknownDependency { batch: String, dependency: String },

  #[error("dependency cycle between batches: {}", .0.join(", "))]
  DependencyCycle(Vec<String>),

  #[error("no batch belongs to group {0:?}")]
  UnknownGroup(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a backend error.
  pub fn store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
