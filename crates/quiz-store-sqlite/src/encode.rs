//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, UUIDs as hyphenated lowercase
//! strings, question types as their snake_case names and booleans as 0/1.

use chrono::{DateTime, Utc};
use quiz_core::model::{Answer, Category, Question, QuestionType, Subcategory};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── QuestionType ────────────────────────────────────────────────────────────

/// Stored as the strum `snake_case` form, the same string serde uses.
pub fn encode_question_type(t: QuestionType) -> &'static str { t.into() }

pub fn decode_question_type(s: &str) -> Result<QuestionType> {
  s.parse().map_err(|_| Error::InvalidValue {
    column: "question_type",
    value:  s.to_owned(),
  })
}

// ─── Difficulty ──────────────────────────────────────────────────────────────

pub fn decode_difficulty(v: i64) -> Result<u8> {
  u8::try_from(v).map_err(|_| Error::InvalidValue {
    column: "difficulty",
    value:  v.to_string(),
  })
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `categories` row.
pub struct RawCategory {
  pub category_id: String,
  pub name:        String,
  pub description: String,
}

impl RawCategory {
  pub fn into_category(self) -> Result<Category> {
    Ok(Category {
      category_id: decode_uuid(&self.category_id)?,
      name:        self.name,
      description: self.description,
    })
  }
}

/// A `subcategories` row joined with its owning category.
pub struct RawSubcategory {
  pub subcategory_id: String,
  pub name:           String,
  pub description:    String,
  pub category:       RawCategory,
}

impl RawSubcategory {
  pub fn into_subcategory(self) -> Result<Subcategory> {
    Ok(Subcategory {
      subcategory_id: decode_uuid(&self.subcategory_id)?,
      category:       self.category.into_category()?,
      name:           self.name,
      description:    self.description,
    })
  }
}

/// Raw values read from a `questions` row.
pub struct RawQuestion {
  pub question_id:      String,
  pub text:             String,
  pub question_type:    String,
  pub difficulty:       i64,
  pub explanation:      String,
  pub resource_url:     String,
  pub is_certification: bool,
  pub category_id:      String,
  pub subcategory_id:   String,
  pub created_at:       String,
  pub updated_at:       String,
}

/// Raw values read from an `answers` row.
pub struct RawAnswer {
  pub answer_id: String,
  pub text:      String,
  pub correct:   bool,
}

impl RawAnswer {
  fn into_answer(self) -> Result<Answer> {
    Ok(Answer {
      answer_id: decode_uuid(&self.answer_id)?,
      text:      self.text,
      correct:   self.correct,
    })
  }
}

impl RawQuestion {
  /// `answers` must already be in display order.
  pub fn into_question(self, answers: Vec<RawAnswer>) -> Result<Question> {
    Ok(Question {
      question_id:      decode_uuid(&self.question_id)?,
      text:             self.text,
      question_type:    decode_question_type(&self.question_type)?,
      difficulty:       decode_difficulty(self.difficulty)?,
      explanation:      self.explanation,
      resource_url:     self.resource_url,
      is_certification: self.is_certification,
      category_id:      decode_uuid(&self.category_id)?,
      subcategory_id:   decode_uuid(&self.subcategory_id)?,
      answers:          answers
        .into_iter()
        .map(RawAnswer::into_answer)
        .collect::<Result<_>>()?,
      created_at:       decode_dt(&self.created_at)?,
      updated_at:       decode_dt(&self.updated_at)?,
    })
  }
}
