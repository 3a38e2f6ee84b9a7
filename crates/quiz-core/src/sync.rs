//! The question upsert synchronizer.
//!
//! Reconciles desired [`QuestionRecord`]s against stored questions using the
//! question text as the natural key. An existing question is overwritten in
//! place (scalars last-write-wins, answers fully replaced); a missing one is
//! created. Repeating the same input never adds rows.

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::{
  Error, Result,
  model::{Answer, Category, Question, QuestionType, Subcategory},
  store::{CommitSummary, QuizStore, WriteBatch},
};

// ─── Input ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAnswer {
  pub text:    String,
  pub correct: bool,
}

/// The desired state of one question. Taxonomy references are resolved
/// entities, so a record cannot point at a category or subcategory that
/// does not exist.
#[derive(Debug, Clone)]
pub struct QuestionRecord {
  pub category:         Category,
  pub subcategory:      Subcategory,
  pub text:             String,
  pub question_type:    QuestionType,
  pub difficulty:       u8,
  pub explanation:      String,
  pub resource_url:     String,
  pub is_certification: bool,
  pub answers:          Vec<NewAnswer>,
}

impl QuestionRecord {
  /// Whether `question` already holds exactly this state.
  fn matches(&self, question: &Question) -> bool {
    question.question_type == self.question_type
      && question.difficulty == self.difficulty
      && question.explanation == self.explanation
      && question.resource_url == self.resource_url
      && question.is_certification == self.is_certification
      && question.category_id == self.category.category_id
      && question.subcategory_id == self.subcategory.subcategory_id
      && question.answers.len() == self.answers.len()
      && question
        .answers
        .iter()
        .zip(&self.answers)
        .all(|(a, b)| a.text == b.text && a.correct == b.correct)
  }

  /// Overwrite every mutable field of `question` and rebuild its answers.
  fn apply_to(self, question: &mut Question) {
    question.question_type = self.question_type;
    question.difficulty = self.difficulty;
    question.explanation = self.explanation;
    question.resource_url = self.resource_url;
    question.is_certification = self.is_certification;
    question.category_id = self.category.category_id;
    question.subcategory_id = self.subcategory.subcategory_id;
    question.answers = build_answers(self.answers);
    question.updated_at = Utc::now();
  }

  fn into_question(self) -> Question {
    let now = Utc::now();
    Question {
      question_id:      Uuid::new_v4(),
      text:             self.text,
      question_type:    self.question_type,
      difficulty:       self.difficulty,
      explanation:      self.explanation,
      resource_url:     self.resource_url,
      is_certification: self.is_certification,
      category_id:      self.category.category_id,
      subcategory_id:   self.subcategory.subcategory_id,
      answers:          build_answers(self.answers),
      created_at:       now,
      updated_at:       now,
    }
  }
}

fn build_answers(answers: Vec<NewAnswer>) -> Vec<Answer> {
  answers
    .into_iter()
    .map(|a| Answer {
      answer_id: Uuid::new_v4(),
      text:      a.text,
      correct:   a.correct,
    })
    .collect()
}

// ─── Outcome ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertOutcome {
  /// No question with this text existed; a new one was staged.
  Created,
  /// An existing question was overwritten.
  Updated,
  /// The stored question already matched; nothing was staged.
  Unchanged,
}

// ─── Synchronizer ────────────────────────────────────────────────────────────

/// Stages upserts against `store` and commits them as one unit.
///
/// Call [`Synchronizer::upsert`] once per record, then
/// [`Synchronizer::commit`] once for the whole batch.
pub struct Synchronizer<'s, S> {
  store: &'s S,
  work:  WriteBatch,
}

impl<'s, S: QuizStore> Synchronizer<'s, S> {
  pub fn new(store: &'s S) -> Self { Self { store, work: WriteBatch::new() } }

  /// Reconcile one record.
  ///
  /// Questions staged earlier in this synchronizer take precedence over the
  /// store, so a record repeated within one batch updates the staged copy
  /// instead of creating a second row.
  pub async fn upsert(&mut self, record: QuestionRecord) -> Result<UpsertOutcome> {
    let existing = match self.work.staged_question(&record.text) {
      Some(staged) => Some(staged.clone()),
      None => self
        .store
        .find_question(&record.text)
        .await
        .map_err(Error::store)?,
    };

    let outcome = match existing {
      Some(question) if record.matches(&question) => UpsertOutcome::Unchanged,
      Some(mut question) => {
        record.apply_to(&mut question);
        self.work.stage_question(question);
        UpsertOutcome::Updated
      }
      None => {
        self.work.stage_question(record.into_question());
        UpsertOutcome::Created
      }
    };

    Ok(outcome)
  }

  /// Number of questions staged so far.
  pub fn pending(&self) -> usize { self.work.questions().len() }

  /// Commit everything staged. A synchronizer with nothing staged does not
  /// touch the store.
  pub async fn commit(self) -> Result<CommitSummary> {
    if self.work.is_empty() {
      return Ok(CommitSummary::default());
    }
    self.store.commit(self.work).await.map_err(Error::store)
  }
}
