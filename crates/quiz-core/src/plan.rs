//! Load ordering: group selection and a topological sort over the batch
//! dependency graph, computed once before any batch runs.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::{Error, Result, fixture::FixtureBatch};

/// The batches to run, in dependency order.
#[derive(Debug, Clone)]
pub struct LoadPlan<'a> {
  order: Vec<&'a FixtureBatch>,
}

impl<'a> LoadPlan<'a> {
  /// Plan a run over `batches`.
  ///
  /// With no `groups` every batch is selected. Otherwise the selection is
  /// every batch in one of `groups` plus all of its transitive
  /// dependencies. Ties in the topological order are broken by position in
  /// `batches`, so the same input always yields the same order.
  pub fn new(batches: &'a [FixtureBatch], groups: &[String]) -> Result<Self> {
    let mut index: HashMap<&str, usize> = HashMap::with_capacity(batches.len());
    for (i, batch) in batches.iter().enumerate() {
      if index.insert(batch.name.as_str(), i).is_some() {
        return Err(Error::DuplicateBatch(batch.name.clone()));
      }
    }

    for batch in batches {
      for dep in &batch.depends_on {
        if !index.contains_key(dep.as_str()) {
          return Err(Error::UnknownDependency {
            batch:      batch.name.clone(),
            dependency: dep.clone(),
          });
        }
      }
    }

    let selected = select(batches, &index, groups)?;
    let order = topological_order(batches, &index, &selected)?;

    Ok(Self { order: order.into_iter().map(|i| &batches[i]).collect() })
  }

  pub fn batches(&self) -> &[&'a FixtureBatch] { &self.order }

  pub fn names(&self) -> Vec<&'a str> {
    self.order.iter().map(|b| b.name.as_str()).collect()
  }

  pub fn len(&self) -> usize { self.order.len() }

  pub fn is_empty(&self) -> bool { self.order.is_empty() }
}

/// Indices of the selected batches, dependencies included.
fn select(
  batches: &[FixtureBatch],
  index: &HashMap<&str, usize>,
  groups: &[String],
) -> Result<Vec<bool>> {
  if groups.is_empty() {
    return Ok(vec![true; batches.len()]);
  }

  let mut selected = vec![false; batches.len()];
  let mut stack = Vec::new();
  for group in groups {
    let before = stack.len();
    stack.extend(
      batches
        .iter()
        .enumerate()
        .filter(|(_, b)| b.in_group(group))
        .map(|(i, _)| i),
    );
    if stack.len() == before {
      return Err(Error::UnknownGroup(group.clone()));
    }
  }

  while let Some(i) = stack.pop() {
    if selected[i] {
      continue;
    }
    selected[i] = true;
    stack.extend(batches[i].depends_on.iter().map(|d| index[d.as_str()]));
  }

  Ok(selected)
}

/// Kahn's algorithm restricted to `selected`.
fn topological_order(
  batches: &[FixtureBatch],
  index: &HashMap<&str, usize>,
  selected: &[bool],
) -> Result<Vec<usize>> {
  let mut in_degree = vec![0usize; batches.len()];
  let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); batches.len()];

  for (i, batch) in batches.iter().enumerate().filter(|(i, _)| selected[*i]) {
    // A batch listing the same dependency twice still has one edge.
    let deps: HashSet<usize> =
      batch.depends_on.iter().map(|d| index[d.as_str()]).collect();
    in_degree[i] = deps.len();
    for dep in deps {
      dependents[dep].push(i);
    }
  }
  for list in &mut dependents {
    list.sort_unstable();
  }

  let mut ready: VecDeque<usize> = (0..batches.len())
    .filter(|&i| selected[i] && in_degree[i] == 0)
    .collect();
  let mut order = Vec::with_capacity(batches.len());

  while let Some(i) = ready.pop_front() {
    order.push(i);
    for &next in &dependents[i] {
      in_degree[next] -= 1;
      if in_degree[next] == 0 {
        insert_sorted(&mut ready, next);
      }
    }
  }

  let total = selected.iter().filter(|s| **s).count();
  if order.len() < total {
    let stuck = (0..batches.len())
      .filter(|&i| selected[i] && in_degree[i] > 0)
      .map(|i| batches[i].name.clone())
      .collect();
    return Err(Error::DependencyCycle(stuck));
  }

  Ok(order)
}

fn insert_sorted(queue: &mut VecDeque<usize>, value: usize) {
  let pos = queue.iter().position(|&v| v > value).unwrap_or(queue.len());
  queue.insert(pos, value);
}
