//! Persisted entity types: the category taxonomy, questions and answers.
//!
//! Every entity carries a surrogate UUID for storage, but identity across
//! runs is decided by natural keys: a category's name, a subcategory's
//! `(category, name)` pair and a question's full text.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString, IntoStaticStr};
use uuid::Uuid;

// ─── Taxonomy ────────────────────────────────────────────────────────────────

/// Top-level grouping, e.g. "Symfony" or "PHP". Never mutated once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
  pub category_id: Uuid,
  /// Unique natural key.
  pub name:        String,
  pub description: String,
}

/// A topic within a category, e.g. "Symfony:Routing".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subcategory {
  pub subcategory_id: Uuid,
  /// The owning category, denormalised so the natural key can be computed
  /// without a second lookup.
  pub category:       Category,
  pub name:           String,
  pub description:    String,
}

impl Subcategory {
  /// The `"Category:Subcategory"` label used in logs and reports.
  pub fn key(&self) -> String { taxonomy_key(&self.category.name, &self.name) }
}

/// Format a `"Category:Subcategory"` label. Not unique when names contain
/// `:`, so lookups key by the name pair instead.
pub fn taxonomy_key(category: &str, subcategory: &str) -> String {
  format!("{category}:{subcategory}")
}

// ─── Questions ───────────────────────────────────────────────────────────────

/// How a question expects to be answered.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum QuestionType {
  SingleChoice,
  MultipleChoice,
  TrueFalse,
}

/// One answer choice. Owned by exactly one [`Question`] and replaced
/// together with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
  pub answer_id: Uuid,
  /// May contain inline markup.
  pub text:      String,
  pub correct:   bool,
}

/// A quiz question aggregate. `text` is the natural key used by the upsert
/// synchronizer; it is not backed by a uniqueness constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
  pub question_id:      Uuid,
  pub text:             String,
  pub question_type:    QuestionType,
  pub difficulty:       u8,
  pub explanation:      String,
  /// One or more references, comma separated.
  pub resource_url:     String,
  pub is_certification: bool,
  pub category_id:      Uuid,
  pub subcategory_id:   Uuid,
  /// Display order is insertion order.
  pub answers:          Vec<Answer>,
  pub created_at:       DateTime<Utc>,
  pub updated_at:       DateTime<Utc>,
}

impl Question {
  /// The individual references packed into `resource_url`.
  pub fn resource_urls(&self) -> impl Iterator<Item = &str> {
    self
      .resource_url
      .split(',')
      .map(str::trim)
      .filter(|s| !s.is_empty())
  }
}
