//! Integration tests for `SqliteStore` against an in-memory database.

use quiz_core::{
  Error as CoreError,
  fixture::{AnswerSpec, CategorySpec, FixtureBatch, QuestionSpec, SubcategorySpec},
  loader::FixtureLoader,
  model::{Question, QuestionType},
  plan::LoadPlan,
  store::{CommitSummary, QuizStore},
  sync::{NewAnswer, QuestionRecord, Synchronizer, UpsertOutcome},
  taxonomy::{Taxonomy, ensure_categories},
};

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn category(name: &str) -> CategorySpec {
  CategorySpec { name: name.into(), description: format!("{name} questions") }
}

fn subcategory(category: &str, name: &str) -> SubcategorySpec {
  SubcategorySpec {
    category:    category.into(),
    name:        name.into(),
    description: String::new(),
  }
}

/// A store with the Symfony category and its Routing subcategory.
async fn seeded() -> (SqliteStore, Taxonomy) {
  let s = store().await;
  ensure_categories(&s, &[category("Symfony")]).await.unwrap();
  let taxonomy = Taxonomy::resolve(&s, &[subcategory("Symfony", "Routing")])
    .await
    .unwrap();
  (s, taxonomy)
}

fn record(taxonomy: &Taxonomy, text: &str, answers: &[(&str, bool)]) -> QuestionRecord {
  QuestionRecord {
    category:         taxonomy.category("Symfony").unwrap().clone(),
    subcategory:      taxonomy.subcategory("Symfony", "Routing").unwrap().clone(),
    text:             text.into(),
    question_type:    QuestionType::SingleChoice,
    difficulty:       1,
    explanation:      "Because.".into(),
    resource_url:     "https://symfony.com/doc/current/routing.html".into(),
    is_certification: false,
    answers:          answers
      .iter()
      .map(|(t, c)| NewAnswer { text: (*t).into(), correct: *c })
      .collect(),
  }
}

async fn upsert_one(s: &SqliteStore, record: QuestionRecord) -> UpsertOutcome {
  let mut sync = Synchronizer::new(s);
  let outcome = sync.upsert(record).await.unwrap();
  sync.commit().await.unwrap();
  outcome
}

// ─── Taxonomy ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn ensure_categories_is_idempotent() {
  let s = store().await;
  let specs = [category("Symfony"), category("PHP"), category("Symfony")];

  assert_eq!(ensure_categories(&s, &specs).await.unwrap(), 2);
  assert_eq!(ensure_categories(&s, &specs).await.unwrap(), 0);

  let all = s.list_categories().await.unwrap();
  assert_eq!(all.len(), 2);
  let php = s.find_category("PHP").await.unwrap().unwrap();
  assert_eq!(php.description, "PHP questions");
  assert!(s.find_category("Twig").await.unwrap().is_none());
}

#[tokio::test]
async fn repeated_resolution_creates_one_subcategory() {
  let s = store().await;
  ensure_categories(&s, &[category("Symfony")]).await.unwrap();
  let specs = [subcategory("Symfony", "Routing")];

  let first = Taxonomy::resolve(&s, &specs).await.unwrap();
  assert_eq!(first.created(), 1);
  for _ in 0..3 {
    let again = Taxonomy::resolve(&s, &specs).await.unwrap();
    assert_eq!(again.created(), 0);
    assert_eq!(
      again.subcategory("Symfony", "Routing").unwrap().subcategory_id,
      first.subcategory("Symfony", "Routing").unwrap().subcategory_id,
    );
  }

  let subs = s.list_subcategories().await.unwrap();
  assert_eq!(subs.len(), 1);
  assert_eq!(subs[0].key(), "Symfony:Routing");
  assert_eq!(subs[0].category.name, "Symfony");
}

#[tokio::test]
async fn same_subcategory_name_in_two_categories() {
  let s = store().await;
  ensure_categories(&s, &[category("Symfony"), category("PHP")])
    .await
    .unwrap();
  let t = Taxonomy::resolve(&s, &[
    subcategory("Symfony", "Security"),
    subcategory("PHP", "Security"),
  ])
  .await
  .unwrap();

  assert_eq!(t.subcategory_count(), 2);
  assert_ne!(
    t.subcategory("Symfony", "Security").unwrap().subcategory_id,
    t.subcategory("PHP", "Security").unwrap().subcategory_id,
  );
}

#[tokio::test]
async fn colon_in_names_does_not_collide() {
  let s = store().await;
  ensure_categories(&s, &[category("A"), category("A:B")])
    .await
    .unwrap();

  let t = Taxonomy::resolve(&s, &[subcategory("A", "B:C"), subcategory("A:B", "C")])
    .await
    .unwrap();
  assert_eq!(t.created(), 2);
  assert_eq!(s.list_subcategories().await.unwrap().len(), 2);

  let inner = t.subcategory("A:B", "C").unwrap();
  assert_eq!(inner.category.name, "A:B");
  assert_eq!(inner.name, "C");
  let outer = t.subcategory("A", "B:C").unwrap();
  assert_eq!(outer.category.name, "A");
  assert_ne!(inner.subcategory_id, outer.subcategory_id);

  let again = Taxonomy::resolve(&s, &[subcategory("A", "B:C"), subcategory("A:B", "C")])
    .await
    .unwrap();
  assert_eq!(again.created(), 0);
  assert_eq!(again.subcategory_count(), 2);
}

#[tokio::test]
async fn missing_category_is_fatal_and_writes_nothing() {
  let s = store().await;
  ensure_categories(&s, &[category("Symfony")]).await.unwrap();

  let err = Taxonomy::resolve(&s, &[
    subcategory("Symfony", "Routing"),
    subcategory("PHP", "Arrays"),
  ])
  .await
  .unwrap_err();

  assert!(matches!(err, CoreError::MissingCategory(ref name) if name == "PHP"));
  assert!(s.list_subcategories().await.unwrap().is_empty());
}

// ─── Synchronizer ────────────────────────────────────────────────────────────

#[tokio::test]
async fn true_false_upserted_twice_is_one_row() {
  let (s, t) = seeded().await;
  let mut r = record(&t, "Is X true?", &[("Yes", true), ("No", false)]);
  r.question_type = QuestionType::TrueFalse;

  assert_eq!(upsert_one(&s, r.clone()).await, UpsertOutcome::Created);
  assert_eq!(upsert_one(&s, r).await, UpsertOutcome::Unchanged);

  let questions = s.list_questions().await.unwrap();
  assert_eq!(questions.len(), 1);
  let q = &questions[0];
  assert_eq!(q.text, "Is X true?");
  assert_eq!(q.question_type, QuestionType::TrueFalse);
  let answers: Vec<_> = q.answers.iter().map(|a| (a.text.as_str(), a.correct)).collect();
  assert_eq!(answers, [("Yes", true), ("No", false)]);
  assert_eq!(s.counts().await.unwrap().answers, 2);
}

#[tokio::test]
async fn last_write_wins_on_difficulty() {
  let (s, t) = seeded().await;
  let mut r = record(&t, "Which component routes requests?", &[("Routing", true)]);

  upsert_one(&s, r.clone()).await;
  let original = s.find_question(&r.text).await.unwrap().unwrap();

  r.difficulty = 3;
  assert_eq!(upsert_one(&s, r.clone()).await, UpsertOutcome::Updated);

  let q = s.find_question(&r.text).await.unwrap().unwrap();
  assert_eq!(q.difficulty, 3);
  assert_eq!(q.question_id, original.question_id);
  assert_eq!(q.created_at, original.created_at);
  assert_eq!(s.list_questions().await.unwrap().len(), 1);
}

#[tokio::test]
async fn update_replaces_answers_wholesale() {
  let (s, t) = seeded().await;
  let text = "Which answer survives?";

  upsert_one(&s, record(&t, text, &[("A", true), ("B", false)])).await;
  upsert_one(&s, record(&t, text, &[("C", true)])).await;

  let q = s.find_question(text).await.unwrap().unwrap();
  assert_eq!(q.answers.len(), 1);
  assert_eq!(q.answers[0].text, "C");
  assert!(q.answers[0].correct);
  assert_eq!(s.counts().await.unwrap().answers, 1);
}

#[tokio::test]
async fn update_overwrites_every_scalar() {
  let (s, t) = seeded().await;
  let text = "What does <code>bin/console debug:router</code> list?";
  upsert_one(&s, record(&t, text, &[("Routes", true)])).await;

  let console = Taxonomy::resolve(&s, &[subcategory("Symfony", "Console")])
    .await
    .unwrap();
  let mut r = record(&t, text, &[("Routes", true)]);
  r.subcategory = console.subcategory("Symfony", "Console").unwrap().clone();
  r.question_type = QuestionType::MultipleChoice;
  r.explanation = "It lists routes.".into();
  r.resource_url = "https://a.example,https://b.example".into();
  r.is_certification = true;
  upsert_one(&s, r.clone()).await;

  let q = s.find_question(text).await.unwrap().unwrap();
  assert_eq!(q.subcategory_id, r.subcategory.subcategory_id);
  assert_eq!(q.question_type, QuestionType::MultipleChoice);
  assert_eq!(q.explanation, "It lists routes.");
  assert_eq!(q.resource_urls().count(), 2);
  assert!(q.is_certification);
}

#[tokio::test]
async fn full_pass_twice_is_idempotent() {
  let (s, t) = seeded().await;
  let records = vec![
    record(&t, "Q1", &[("a", true), ("b", false)]),
    record(&t, "Q2", &[("c", true)]),
    record(&t, "Q3", &[("d", false), ("e", true), ("f", false)]),
  ];

  let pass = |records: Vec<QuestionRecord>| {
    let s = s.clone();
    async move {
      let mut sync = Synchronizer::new(&s);
      for r in records {
        sync.upsert(r).await.unwrap();
      }
      sync.commit().await.unwrap();
    }
  };

  pass(records.clone()).await;
  let after_first = s.list_questions().await.unwrap();
  let counts_first = s.counts().await.unwrap();

  pass(records).await;
  let after_second = s.list_questions().await.unwrap();

  assert_eq!(s.counts().await.unwrap(), counts_first);
  assert_eq!(after_first, after_second);
}

#[tokio::test]
async fn repeated_text_within_one_batch_is_one_row() {
  let (s, t) = seeded().await;
  let mut sync = Synchronizer::new(&s);

  let first = sync.upsert(record(&t, "Dup?", &[("old", true)])).await.unwrap();
  let second = sync.upsert(record(&t, "Dup?", &[("new", true)])).await.unwrap();
  assert_eq!((first, second), (UpsertOutcome::Created, UpsertOutcome::Updated));
  assert_eq!(sync.pending(), 1);

  // Nothing visible until commit.
  assert!(s.find_question("Dup?").await.unwrap().is_none());
  let summary = sync.commit().await.unwrap();
  assert_eq!(summary, CommitSummary { questions: 1, answers: 1, ..Default::default() });

  let q = s.find_question("Dup?").await.unwrap().unwrap();
  assert_eq!(q.answers[0].text, "new");
}

#[tokio::test]
async fn text_is_matched_exactly() {
  let (s, t) = seeded().await;
  upsert_one(&s, record(&t, "Is X true?", &[("Yes", true)])).await;
  upsert_one(&s, record(&t, "Is X true ?", &[("Yes", true)])).await;

  assert_eq!(s.list_questions().await.unwrap().len(), 2);
}

#[tokio::test]
async fn empty_commit_is_a_no_op() {
  let s = store().await;
  let summary = Synchronizer::new(&s).commit().await.unwrap();
  assert_eq!(summary, CommitSummary::default());
}

// ─── Loader ──────────────────────────────────────────────────────────────────

fn question(subcategory: &str, text: &str) -> QuestionSpec {
  QuestionSpec {
    category:             None,
    subcategory:          subcategory.into(),
    fallback_subcategory: None,
    question_type:        QuestionType::SingleChoice,
    difficulty:           2,
    text:                 text.into(),
    explanation:          String::new(),
    resource_url:         String::new(),
    certification:        None,
    answers:              vec![
      AnswerSpec { text: "right".into(), correct: true },
      AnswerSpec { text: "wrong".into(), correct: false },
    ],
  }
}

fn batches() -> Vec<FixtureBatch> {
  let base = FixtureBatch {
    name:          "base".into(),
    depends_on:    vec![],
    groups:        vec![],
    category:      None,
    certification: false,
    categories:    vec![category("Symfony"), category("PHP")],
    subcategories: vec![subcategory("Symfony", "Core")],
    questions:     vec![],
  };

  let mut fallback = question("Messenger", "Which transport is synchronous?");
  fallback.fallback_subcategory = Some("Core".into());

  let symfony = FixtureBatch {
    name:          "symfony".into(),
    depends_on:    vec!["base".into()],
    groups:        vec!["questions".into()],
    category:      Some("Symfony".into()),
    certification: false,
    categories:    vec![],
    subcategories: vec![subcategory("Symfony", "Routing")],
    questions:     vec![question("Routing", "What is a route?"), fallback],
  };

  let cert = FixtureBatch {
    name:          "certification".into(),
    depends_on:    vec!["symfony".into()],
    groups:        vec!["certification11".into()],
    category:      Some("Symfony".into()),
    certification: true,
    categories:    vec![],
    subcategories: vec![],
    questions:     vec![question("Routing", "What is a route?")],
  };

  vec![cert, symfony, base]
}

#[tokio::test]
async fn loader_runs_batches_in_dependency_order() {
  let s = store().await;
  let all = batches();
  let plan = LoadPlan::new(&all, &[]).unwrap();
  assert_eq!(plan.names(), ["base", "symfony", "certification"]);

  let report = FixtureLoader::new(&s).load(&plan).await.unwrap();
  assert_eq!(report.batches[0].categories_created, 2);
  assert_eq!(report.batches[1].created, 2);
  assert_eq!(report.batches[1].subcategories_created, 1);
  // The certification batch re-files the routing question.
  assert_eq!(report.batches[2].updated, 1);

  let q = s.find_question("What is a route?").await.unwrap().unwrap();
  assert!(q.is_certification);

  let fell_back = s
    .find_question("Which transport is synchronous?")
    .await
    .unwrap()
    .unwrap();
  let core = s
    .list_subcategories()
    .await
    .unwrap()
    .into_iter()
    .find(|sc| sc.name == "Core")
    .unwrap();
  assert_eq!(fell_back.subcategory_id, core.subcategory_id);
}

#[tokio::test]
async fn reloading_everything_changes_nothing() {
  let s = store().await;
  let all = batches();
  let plan = LoadPlan::new(&all, &[]).unwrap();
  let loader = FixtureLoader::new(&s);

  loader.load(&plan).await.unwrap();
  let counts = s.counts().await.unwrap();
  let questions = snapshot(s.list_questions().await.unwrap());

  let again = loader.load(&plan).await.unwrap();
  assert_eq!(again.created(), 0);
  assert_eq!(s.counts().await.unwrap(), counts);
  assert_eq!(snapshot(s.list_questions().await.unwrap()), questions);
}

/// Domain fields only; row identities and timestamps may churn when two
/// batches supply the same question.
fn snapshot(questions: Vec<Question>) -> Vec<(String, u8, bool, Vec<(String, bool)>)> {
  questions
    .into_iter()
    .map(|q| {
      let answers = q.answers.into_iter().map(|a| (a.text, a.correct)).collect();
      (q.text, q.difficulty, q.is_certification, answers)
    })
    .collect()
}

#[tokio::test]
async fn batch_without_its_base_aborts() {
  let s = store().await;
  let all = batches();
  let symfony = all.iter().find(|b| b.name == "symfony").unwrap();

  let err = FixtureLoader::new(&s).load_batch(symfony).await.unwrap_err();
  assert!(matches!(err, CoreError::MissingCategory(ref c) if c == "Symfony"));
  assert_eq!(s.counts().await.unwrap(), CommitSummary::default());
}

#[tokio::test]
async fn unresolvable_question_aborts_before_any_upsert() {
  let s = store().await;
  let mut all = batches();
  let symfony = all.iter_mut().find(|b| b.name == "symfony").unwrap();
  symfony.questions.push(question("Nowhere", "Orphan?"));

  let plan = LoadPlan::new(&all, &["questions".to_string()]).unwrap();
  let err = FixtureLoader::new(&s).load(&plan).await.unwrap_err();

  assert!(matches!(err, CoreError::UnknownSubcategory { ref name, .. } if name == "Nowhere"));
  assert!(s.list_questions().await.unwrap().is_empty());
}

#[tokio::test]
async fn failed_commit_aborts_the_run() {
  let s = store().await;
  s.execute_sql(
    "CREATE TRIGGER reject_transport BEFORE INSERT ON questions
     WHEN NEW.text = 'Which transport is synchronous?'
     BEGIN SELECT RAISE(ABORT, 'question rejected'); END;",
  )
  .await
  .unwrap();

  let all = batches();
  let plan = LoadPlan::new(&all, &[]).unwrap();
  let err = FixtureLoader::new(&s).load(&plan).await.unwrap_err();

  let CoreError::Store(source) = err else {
    panic!("expected a store error");
  };
  assert!(matches!(
    source.downcast_ref::<crate::Error>(),
    Some(crate::Error::Database(_))
  ));

  // The symfony commit rolled back and the certification batch never ran,
  // though it would have inserted "What is a route?" on its own.
  assert!(s.list_questions().await.unwrap().is_empty());
  assert_eq!(s.counts().await.unwrap().answers, 0);
}
