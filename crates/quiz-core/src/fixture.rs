//! Fixture batches — the literal seed data, as deserialised from batch files.
//!
//! A batch is pure data: the categories it introduces, the subcategories it
//! needs, the questions it supplies, and which other batches must load
//! before it. [`crate::loader::FixtureLoader`] turns a batch into store
//! writes.

use serde::{Deserialize, Serialize};

use crate::model::QuestionType;

/// A unit of seed data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureBatch {
  /// Unique batch name; dependencies refer to it.
  pub name:          String,
  /// Batches whose writes must be committed before this one runs.
  #[serde(default)]
  pub depends_on:    Vec<String>,
  /// Group labels for selective loading.
  #[serde(default)]
  pub groups:        Vec<String>,
  /// Category used by questions that don't name one.
  #[serde(default)]
  pub category:      Option<String>,
  /// Certification flag used by questions that don't set one.
  #[serde(default)]
  pub certification: bool,
  #[serde(default)]
  pub categories:    Vec<CategorySpec>,
  #[serde(default)]
  pub subcategories: Vec<SubcategorySpec>,
  #[serde(default)]
  pub questions:     Vec<QuestionSpec>,
}

impl FixtureBatch {
  pub fn in_group(&self, group: &str) -> bool {
    self.groups.iter().any(|g| g == group)
  }
}

/// A category the batch guarantees to exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySpec {
  pub name:        String,
  #[serde(default)]
  pub description: String,
}

/// A `(category, name)` subcategory the batch guarantees to exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubcategorySpec {
  pub category:    String,
  pub name:        String,
  #[serde(default)]
  pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerSpec {
  pub text:    String,
  #[serde(default)]
  pub correct: bool,
}

/// One desired question, with taxonomy references still by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionSpec {
  /// Falls back to [`FixtureBatch::category`].
  #[serde(default)]
  pub category:             Option<String>,
  pub subcategory:          String,
  /// Used when `subcategory` does not resolve.
  #[serde(default)]
  pub fallback_subcategory: Option<String>,
  #[serde(rename = "type")]
  pub question_type:        QuestionType,
  #[serde(default = "default_difficulty")]
  pub difficulty:           u8,
  pub text:                 String,
  #[serde(default)]
  pub explanation:          String,
  #[serde(default)]
  pub resource_url:         String,
  /// Falls back to [`FixtureBatch::certification`].
  #[serde(default)]
  pub certification:        Option<bool>,
  pub answers:              Vec<AnswerSpec>,
}

fn default_difficulty() -> u8 { 1 }
