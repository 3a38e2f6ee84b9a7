//! Taxonomy resolution: make sure categories and subcategories exist exactly
//! once, and hand back a name-keyed lookup table for building questions.

use std::collections::HashMap;

use uuid::Uuid;

use crate::{
  Error, Result,
  fixture::{CategorySpec, SubcategorySpec},
  model::{Category, Subcategory},
  store::{QuizStore, WriteBatch},
};

/// Create every category in `specs` that is not already stored.
///
/// Returns how many categories were created. Existing categories are left
/// untouched, descriptions included.
pub async fn ensure_categories<S: QuizStore>(
  store: &S,
  specs: &[CategorySpec],
) -> Result<usize> {
  if specs.is_empty() {
    return Ok(0);
  }

  let mut known: HashMap<String, Category> = store
    .list_categories()
    .await
    .map_err(Error::store)?
    .into_iter()
    .map(|c| (c.name.clone(), c))
    .collect();

  let mut batch = WriteBatch::new();
  for spec in specs {
    if known.contains_key(&spec.name) {
      continue;
    }
    let category = Category {
      category_id: Uuid::new_v4(),
      name:        spec.name.clone(),
      description: spec.description.clone(),
    };
    tracing::debug!(category = %category.name, "creating category");
    known.insert(category.name.clone(), category.clone());
    batch.stage_category(category);
  }

  let created = batch.categories().len();
  if created > 0 {
    store.commit(batch).await.map_err(Error::store)?;
  }
  Ok(created)
}

/// `(category name, subcategory name)`. Kept as a pair so names containing
/// `:` cannot collide.
type PairKey = (String, String);

fn pair_key(subcategory: &Subcategory) -> PairKey {
  (subcategory.category.name.clone(), subcategory.name.clone())
}

/// The resolved taxonomy, keyed by category name and by
/// (category, subcategory) name pair.
#[derive(Debug, Clone, Default)]
pub struct Taxonomy {
  categories:    HashMap<String, Category>,
  subcategories: HashMap<PairKey, Subcategory>,
  created:       usize,
}

impl Taxonomy {
  /// Resolve `specs` against the store.
  ///
  /// Loads every persisted subcategory once, stages the missing ones and
  /// commits them before returning, so the table only ever refers to
  /// committed rows. Fails with [`Error::MissingCategory`] without writing
  /// anything if a subcategory names a category that does not exist.
  pub async fn resolve<S: QuizStore>(
    store: &S,
    specs: &[SubcategorySpec],
  ) -> Result<Self> {
    let categories: HashMap<String, Category> = store
      .list_categories()
      .await
      .map_err(Error::store)?
      .into_iter()
      .map(|c| (c.name.clone(), c))
      .collect();

    let mut subcategories: HashMap<PairKey, Subcategory> = store
      .list_subcategories()
      .await
      .map_err(Error::store)?
      .into_iter()
      .map(|s| (pair_key(&s), s))
      .collect();

    let mut batch = WriteBatch::new();
    for spec in specs {
      let key = (spec.category.clone(), spec.name.clone());
      if subcategories.contains_key(&key) {
        continue;
      }
      let category = categories
        .get(&spec.category)
        .ok_or_else(|| Error::MissingCategory(spec.category.clone()))?;
      let subcategory = Subcategory {
        subcategory_id: Uuid::new_v4(),
        category:       category.clone(),
        name:           spec.name.clone(),
        description:    spec.description.clone(),
      };
      tracing::debug!(subcategory = %subcategory.key(), "creating subcategory");
      subcategories.insert(key, subcategory.clone());
      batch.stage_subcategory(subcategory);
    }

    let created = batch.subcategories().len();
    if created > 0 {
      store.commit(batch).await.map_err(Error::store)?;
    }

    Ok(Self { categories, subcategories, created })
  }

  /// Build a table from rows already in hand, without touching a store.
  pub fn from_rows(
    categories: impl IntoIterator<Item = Category>,
    subcategories: impl IntoIterator<Item = Subcategory>,
  ) -> Self {
    Self {
      categories:    categories.into_iter().map(|c| (c.name.clone(), c)).collect(),
      subcategories: subcategories.into_iter().map(|s| (pair_key(&s), s)).collect(),
      created:       0,
    }
  }

  /// Subcategories created while resolving this table.
  pub fn created(&self) -> usize { self.created }

  pub fn category(&self, name: &str) -> Option<&Category> {
    self.categories.get(name)
  }

  pub fn subcategory(&self, category: &str, name: &str) -> Option<&Subcategory> {
    self.subcategories.get(&(category.to_owned(), name.to_owned()))
  }

  /// Look up `name`, falling back to `fallback` in the same category when
  /// `name` is absent. `None` only when neither resolves.
  pub fn subcategory_or(
    &self,
    category: &str,
    name: &str,
    fallback: Option<&str>,
  ) -> Option<&Subcategory> {
    self
      .subcategory(category, name)
      .or_else(|| fallback.and_then(|f| self.subcategory(category, f)))
  }

  /// Subcategories known to this table, stored and newly created.
  pub fn subcategory_count(&self) -> usize { self.subcategories.len() }
}
