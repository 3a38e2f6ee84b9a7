//! Runs fixture batches against a store.
//!
//! For each batch in plan order: create its declared categories, resolve its
//! subcategories, turn every [`QuestionSpec`] into a [`QuestionRecord`],
//! upsert, and commit once. The first error aborts the run.

use serde::Serialize;

use crate::{
  Error, Result,
  fixture::{FixtureBatch, QuestionSpec},
  model::QuestionType,
  plan::LoadPlan,
  store::QuizStore,
  sync::{NewAnswer, QuestionRecord, Synchronizer, UpsertOutcome},
  taxonomy::{Taxonomy, ensure_categories},
};

// ─── Reports ─────────────────────────────────────────────────────────────────

/// What one batch did to the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
  pub batch:                 String,
  pub categories_created:    usize,
  pub subcategories_created: usize,
  pub created:               usize,
  pub updated:               usize,
  pub unchanged:             usize,
}

impl BatchReport {
  fn tally(&mut self, outcome: UpsertOutcome) {
    match outcome {
      UpsertOutcome::Created => self.created += 1,
      UpsertOutcome::Updated => self.updated += 1,
      UpsertOutcome::Unchanged => self.unchanged += 1,
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
  pub batches: Vec<BatchReport>,
}

impl LoadReport {
  pub fn created(&self) -> usize { self.batches.iter().map(|b| b.created).sum() }

  pub fn updated(&self) -> usize { self.batches.iter().map(|b| b.updated).sum() }

  pub fn unchanged(&self) -> usize {
    self.batches.iter().map(|b| b.unchanged).sum()
  }
}

// ─── Loader ──────────────────────────────────────────────────────────────────

pub struct FixtureLoader<'s, S> {
  store: &'s S,
}

impl<'s, S: QuizStore> FixtureLoader<'s, S> {
  pub fn new(store: &'s S) -> Self { Self { store } }

  /// Run every batch of `plan`, in order.
  pub async fn load(&self, plan: &LoadPlan<'_>) -> Result<LoadReport> {
    let mut report = LoadReport::default();
    for batch in plan.batches() {
      report.batches.push(self.load_batch(batch).await?);
    }
    tracing::info!(
      batches = report.batches.len(),
      created = report.created(),
      updated = report.updated(),
      unchanged = report.unchanged(),
      "fixtures loaded"
    );
    Ok(report)
  }

  /// Run a single batch. Its dependencies must already be loaded.
  pub async fn load_batch(&self, batch: &FixtureBatch) -> Result<BatchReport> {
    let mut report = BatchReport { batch: batch.name.clone(), ..Default::default() };

    report.categories_created =
      ensure_categories(self.store, &batch.categories).await?;

    let taxonomy = Taxonomy::resolve(self.store, &batch.subcategories).await?;
    report.subcategories_created = taxonomy.created();

    // Build every record before staging anything so a bad reference fails
    // the batch without a partial commit.
    let records = batch
      .questions
      .iter()
      .map(|spec| build_record(batch, spec, &taxonomy))
      .collect::<Result<Vec<_>>>()?;

    let mut sync = Synchronizer::new(self.store);
    for record in records {
      check_editorial(&record);
      let text = record.text.clone();
      let outcome = sync.upsert(record).await?;
      tracing::debug!(batch = %batch.name, ?outcome, question = %preview(&text), "upserted");
      report.tally(outcome);
    }
    sync.commit().await?;

    tracing::info!(
      batch = %batch.name,
      created = report.created,
      updated = report.updated,
      unchanged = report.unchanged,
      subcategories_created = report.subcategories_created,
      "batch committed"
    );
    Ok(report)
  }
}

/// Resolve a question's taxonomy names and batch defaults into a record.
pub fn build_record(
  batch: &FixtureBatch,
  spec: &QuestionSpec,
  taxonomy: &Taxonomy,
) -> Result<QuestionRecord> {
  let category_name = spec
    .category
    .as_deref()
    .or(batch.category.as_deref())
    .ok_or_else(|| Error::MissingQuestionCategory(spec.text.clone()))?;

  let category = taxonomy
    .category(category_name)
    .ok_or_else(|| Error::MissingCategory(category_name.to_owned()))?;

  let subcategory = taxonomy
    .subcategory_or(
      category_name,
      &spec.subcategory,
      spec.fallback_subcategory.as_deref(),
    )
    .ok_or_else(|| Error::UnknownSubcategory {
      category: category_name.to_owned(),
      name:     spec.subcategory.clone(),
    })?;

  Ok(QuestionRecord {
    category:         category.clone(),
    subcategory:      subcategory.clone(),
    text:             spec.text.clone(),
    question_type:    spec.question_type,
    difficulty:       spec.difficulty,
    explanation:      spec.explanation.clone(),
    resource_url:     spec.resource_url.clone(),
    is_certification: spec.certification.unwrap_or(batch.certification),
    answers:          spec
      .answers
      .iter()
      .map(|a| NewAnswer { text: a.text.clone(), correct: a.correct })
      .collect(),
  })
}

/// Log content that breaks the editorial conventions. Never fatal.
fn check_editorial(record: &QuestionRecord) {
  let correct = record.answers.iter().filter(|a| a.correct).count();
  let question = preview(&record.text);

  if correct == 0 {
    tracing::warn!(%question, "question has no correct answer");
  }
  match record.question_type {
    QuestionType::SingleChoice if correct > 1 => {
      tracing::warn!(%question, correct, "single-choice question has several correct answers");
    }
    QuestionType::TrueFalse if record.answers.len() != 2 => {
      tracing::warn!(%question, answers = record.answers.len(), "true/false question without two answers");
    }
    _ => {}
  }
  if !(1..=3).contains(&record.difficulty) {
    tracing::warn!(%question, difficulty = record.difficulty, "difficulty outside 1-3");
  }
}

fn preview(text: &str) -> String {
  const MAX: usize = 60;
  match text.char_indices().nth(MAX) {
    Some((end, _)) => format!("{}…", &text[..end]),
    None => text.to_owned(),
  }
}
