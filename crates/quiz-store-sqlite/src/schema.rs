//! SQL schema for the quiz SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS categories (
    category_id TEXT PRIMARY KEY,
    name        TEXT NOT NULL UNIQUE,
    description TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS subcategories (
    subcategory_id TEXT PRIMARY KEY,
    category_id    TEXT NOT NULL REFERENCES categories(category_id),
    name           TEXT NOT NULL,
    description    TEXT NOT NULL DEFAULT '',
    UNIQUE (category_id, name)
);

-- `text` is the upsert key but is deliberately not UNIQUE: uniqueness is
-- the synchronizer's job, and the schema must not reject existing duplicates.
CREATE TABLE IF NOT EXISTS questions (
    question_id      TEXT PRIMARY KEY,
    text             TEXT NOT NULL,
    question_type    TEXT NOT NULL,   -- 'single_choice' | 'multiple_choice' | 'true_false'
    difficulty       INTEGER NOT NULL,
    explanation      TEXT NOT NULL DEFAULT '',
    resource_url     TEXT NOT NULL DEFAULT '',
    is_certification INTEGER NOT NULL DEFAULT 0,
    category_id      TEXT NOT NULL REFERENCES categories(category_id),
    subcategory_id   TEXT NOT NULL REFERENCES subcategories(subcategory_id),
    created_at       TEXT NOT NULL,   -- ISO 8601 UTC
    updated_at       TEXT NOT NULL
);

-- Answers are owned by their question and replaced wholesale with it.
CREATE TABLE IF NOT EXISTS answers (
    answer_id   TEXT PRIMARY KEY,
    question_id TEXT NOT NULL REFERENCES questions(question_id) ON DELETE CASCADE,
    position    INTEGER NOT NULL,
    text        TEXT NOT NULL,
    correct     INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS questions_text_idx    ON questions(text);
CREATE INDEX IF NOT EXISTS answers_question_idx  ON answers(question_id, position);

PRAGMA user_version = 1;
";
