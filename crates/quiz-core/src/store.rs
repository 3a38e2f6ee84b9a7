//! The `QuizStore` trait and the unit-of-work it commits.
//!
//! The trait is implemented by storage backends (e.g. `quiz-store-sqlite`).
//! The taxonomy resolver, the upsert synchronizer and the fixture loader
//! depend on this abstraction, not on any concrete backend.

use std::{collections::HashMap, future::Future};

use serde::Serialize;

use crate::model::{Category, Question, Subcategory};

// ─── Unit of work ────────────────────────────────────────────────────────────

/// Writes staged for a single commit.
///
/// Nothing staged here is visible to readers of the store until
/// [`QuizStore::commit`] succeeds. Questions are indexed by text, so staging
/// the same question twice keeps only the latest copy.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
  categories:     Vec<Category>,
  subcategories:  Vec<Subcategory>,
  questions:      Vec<Question>,
  question_index: HashMap<String, usize>,
}

impl WriteBatch {
  pub fn new() -> Self { Self::default() }

  pub fn stage_category(&mut self, category: Category) {
    self.categories.push(category);
  }

  pub fn stage_subcategory(&mut self, subcategory: Subcategory) {
    self.subcategories.push(subcategory);
  }

  /// Stage a question aggregate (insert or update, keyed by its UUID in the
  /// backend). Its answers replace whatever the backend currently holds.
  pub fn stage_question(&mut self, question: Question) {
    match self.question_index.get(&question.text) {
      Some(&idx) => self.questions[idx] = question,
      None => {
        self
          .question_index
          .insert(question.text.clone(), self.questions.len());
        self.questions.push(question);
      }
    }
  }

  /// A question staged in this batch but not yet committed.
  pub fn staged_question(&self, text: &str) -> Option<&Question> {
    self.question_index.get(text).map(|&idx| &self.questions[idx])
  }

  pub fn categories(&self) -> &[Category] { &self.categories }

  pub fn subcategories(&self) -> &[Subcategory] { &self.subcategories }

  pub fn questions(&self) -> &[Question] { &self.questions }

  pub fn is_empty(&self) -> bool {
    self.categories.is_empty()
      && self.subcategories.is_empty()
      && self.questions.is_empty()
  }
}

/// Row counts written by a successful commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CommitSummary {
  pub categories:    usize,
  pub subcategories: usize,
  pub questions:     usize,
  pub answers:       usize,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a quiz content store backend.
///
/// Reads always reflect committed state only. All writes go through
/// [`QuizStore::commit`], which must apply a [`WriteBatch`] atomically.
///
/// All methods return `Send` futures so the trait can be used from a
/// multi-threaded tokio runtime.
pub trait QuizStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Taxonomy ──────────────────────────────────────────────────────────

  /// Look up a category by its unique name.
  fn find_category<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Option<Category>, Self::Error>> + Send + 'a;

  fn list_categories(
    &self,
  ) -> impl Future<Output = Result<Vec<Category>, Self::Error>> + Send + '_;

  /// All subcategories, each with its owning category attached.
  fn list_subcategories(
    &self,
  ) -> impl Future<Output = Result<Vec<Subcategory>, Self::Error>> + Send + '_;

  // ── Questions ─────────────────────────────────────────────────────────

  /// Find a question by exact text match. If several rows share the text
  /// (the key is not constrained) the oldest one is returned.
  fn find_question<'a>(
    &'a self,
    text: &'a str,
  ) -> impl Future<Output = Result<Option<Question>, Self::Error>> + Send + 'a;

  /// Every question with its answers, oldest first.
  fn list_questions(
    &self,
  ) -> impl Future<Output = Result<Vec<Question>, Self::Error>> + Send + '_;

  // ── Writes ────────────────────────────────────────────────────────────

  /// Apply every staged write in one transaction.
  fn commit(
    &self,
    batch: WriteBatch,
  ) -> impl Future<Output = Result<CommitSummary, Self::Error>> + Send + '_;
}
