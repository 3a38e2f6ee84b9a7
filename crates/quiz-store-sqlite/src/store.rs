//! [`SqliteStore`] — the SQLite implementation of [`QuizStore`].

use std::{collections::HashMap, path::Path};

use rusqlite::OptionalExtension as _;

use quiz_core::{
  model::{Category, Question, Subcategory},
  store::{CommitSummary, QuizStore, WriteBatch},
};

use crate::{
  Result,
  encode::{
    RawAnswer, RawCategory, RawQuestion, RawSubcategory, encode_dt,
    encode_question_type, encode_uuid,
  },
  schema::SCHEMA,
};

const QUESTION_COLUMNS: &str = "question_id, text, question_type, difficulty, explanation,
   resource_url, is_certification, category_id, subcategory_id, created_at, updated_at";

fn raw_question(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawQuestion> {
  Ok(RawQuestion {
    question_id:      row.get(0)?,
    text:             row.get(1)?,
    question_type:    row.get(2)?,
    difficulty:       row.get(3)?,
    explanation:      row.get(4)?,
    resource_url:     row.get(5)?,
    is_certification: row.get(6)?,
    category_id:      row.get(7)?,
    subcategory_id:   row.get(8)?,
    created_at:       row.get(9)?,
    updated_at:       row.get(10)?,
  })
}

fn raw_category(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawCategory> {
  Ok(RawCategory {
    category_id: row.get(0)?,
    name:        row.get(1)?,
    description: row.get(2)?,
  })
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A quiz content store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Current row count of every table.
  pub async fn counts(&self) -> Result<CommitSummary> {
    let counts = self
      .conn
      .call(|conn| {
        let count = |table: &str| -> rusqlite::Result<usize> {
          let n: i64 =
            conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))?;
          Ok(n as usize)
        };
        Ok(CommitSummary {
          categories:    count("categories")?,
          subcategories: count("subcategories")?,
          questions:     count("questions")?,
          answers:       count("answers")?,
        })
      })
      .await?;
    Ok(counts)
  }

  /// Run raw SQL against the connection.
  #[cfg(test)]
  pub(crate) async fn execute_sql(&self, sql: &'static str) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(sql)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── QuizStore impl ──────────────────────────────────────────────────────────

impl QuizStore for SqliteStore {
  type Error = crate::Error;

  // ── Taxonomy ──────────────────────────────────────────────────────────────

  async fn find_category(&self, name: &str) -> Result<Option<Category>> {
    let name = name.to_owned();

    let raw: Option<RawCategory> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT category_id, name, description FROM categories WHERE name = ?1",
              rusqlite::params![name],
              raw_category,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawCategory::into_category).transpose()
  }

  async fn list_categories(&self) -> Result<Vec<Category>> {
    let raws: Vec<RawCategory> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT category_id, name, description FROM categories ORDER BY rowid",
        )?;
        let rows = stmt
          .query_map([], raw_category)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCategory::into_category).collect()
  }

  async fn list_subcategories(&self) -> Result<Vec<Subcategory>> {
    let raws: Vec<RawSubcategory> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT s.subcategory_id, s.name, s.description,
                  c.category_id, c.name, c.description
           FROM subcategories s
           JOIN categories c ON c.category_id = s.category_id
           ORDER BY s.rowid",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawSubcategory {
              subcategory_id: row.get(0)?,
              name:           row.get(1)?,
              description:    row.get(2)?,
              category:       RawCategory {
                category_id: row.get(3)?,
                name:        row.get(4)?,
                description: row.get(5)?,
              },
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSubcategory::into_subcategory).collect()
  }

  // ── Questions ─────────────────────────────────────────────────────────────

  async fn find_question(&self, text: &str) -> Result<Option<Question>> {
    let text = text.to_owned();

    let found: Option<(RawQuestion, Vec<RawAnswer>)> = self
      .conn
      .call(move |conn| {
        let raw = conn
          .query_row(
            &format!(
              "SELECT {QUESTION_COLUMNS} FROM questions
               WHERE text = ?1 ORDER BY rowid LIMIT 1"
            ),
            rusqlite::params![text],
            raw_question,
          )
          .optional()?;

        let Some(raw) = raw else { return Ok(None) };

        let mut stmt = conn.prepare(
          "SELECT answer_id, text, correct FROM answers
           WHERE question_id = ?1 ORDER BY position",
        )?;
        let answers = stmt
          .query_map(rusqlite::params![raw.question_id], |row| {
            Ok(RawAnswer {
              answer_id: row.get(0)?,
              text:      row.get(1)?,
              correct:   row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Some((raw, answers)))
      })
      .await?;

    found.map(|(q, answers)| q.into_question(answers)).transpose()
  }

  async fn list_questions(&self) -> Result<Vec<Question>> {
    let (raws, mut answers): (Vec<RawQuestion>, HashMap<String, Vec<RawAnswer>>) =
      self
        .conn
        .call(|conn| {
          let mut stmt = conn.prepare(&format!(
            "SELECT {QUESTION_COLUMNS} FROM questions ORDER BY rowid"
          ))?;
          let questions = stmt
            .query_map([], raw_question)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

          let mut stmt = conn.prepare(
            "SELECT question_id, answer_id, text, correct FROM answers
             ORDER BY question_id, position",
          )?;
          let mut answers: HashMap<String, Vec<RawAnswer>> = HashMap::new();
          let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, RawAnswer {
              answer_id: row.get(1)?,
              text:      row.get(2)?,
              correct:   row.get(3)?,
            }))
          })?;
          for row in rows {
            let (question_id, answer) = row?;
            answers.entry(question_id).or_default().push(answer);
          }

          Ok((questions, answers))
        })
        .await?;

    raws
      .into_iter()
      .map(|q| {
        let own = answers.remove(&q.question_id).unwrap_or_default();
        q.into_question(own)
      })
      .collect()
  }

  // ── Writes ────────────────────────────────────────────────────────────────

  async fn commit(&self, batch: WriteBatch) -> Result<CommitSummary> {
    let summary = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut summary = CommitSummary::default();

        {
          let mut stmt = tx.prepare(
            "INSERT INTO categories (category_id, name, description)
             VALUES (?1, ?2, ?3)",
          )?;
          for c in batch.categories() {
            stmt.execute(rusqlite::params![
              encode_uuid(c.category_id),
              c.name,
              c.description,
            ])?;
            summary.categories += 1;
          }
        }

        {
          let mut stmt = tx.prepare(
            "INSERT INTO subcategories (subcategory_id, category_id, name, description)
             VALUES (?1, ?2, ?3, ?4)",
          )?;
          for s in batch.subcategories() {
            stmt.execute(rusqlite::params![
              encode_uuid(s.subcategory_id),
              encode_uuid(s.category.category_id),
              s.name,
              s.description,
            ])?;
            summary.subcategories += 1;
          }
        }

        {
          let mut upsert = tx.prepare(
            "INSERT INTO questions (
               question_id, text, question_type, difficulty, explanation,
               resource_url, is_certification, category_id, subcategory_id,
               created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
             ON CONFLICT (question_id) DO UPDATE SET
               text             = excluded.text,
               question_type    = excluded.question_type,
               difficulty       = excluded.difficulty,
               explanation      = excluded.explanation,
               resource_url     = excluded.resource_url,
               is_certification = excluded.is_certification,
               category_id      = excluded.category_id,
               subcategory_id   = excluded.subcategory_id,
               updated_at       = excluded.updated_at",
          )?;
          let mut clear =
            tx.prepare("DELETE FROM answers WHERE question_id = ?1")?;
          let mut insert_answer = tx.prepare(
            "INSERT INTO answers (answer_id, question_id, position, text, correct)
             VALUES (?1, ?2, ?3, ?4, ?5)",
          )?;

          for q in batch.questions() {
            let question_id = encode_uuid(q.question_id);
            upsert.execute(rusqlite::params![
              question_id,
              q.text,
              encode_question_type(q.question_type),
              q.difficulty,
              q.explanation,
              q.resource_url,
              q.is_certification,
              encode_uuid(q.category_id),
              encode_uuid(q.subcategory_id),
              encode_dt(q.created_at),
              encode_dt(q.updated_at),
            ])?;
            summary.questions += 1;

            clear.execute(rusqlite::params![question_id])?;
            for (position, a) in q.answers.iter().enumerate() {
              insert_answer.execute(rusqlite::params![
                encode_uuid(a.answer_id),
                question_id,
                position as i64,
                a.text,
                a.correct,
              ])?;
              summary.answers += 1;
            }
          }
        }

        tx.commit()?;
        Ok(summary)
      })
      .await?;

    tracing::debug!(?summary, "sqlite commit");
    Ok(summary)
  }
}
