//! Set-difference planning for page child collections.
//!
//! Given a desired set and the currently-remote set of labels or content
//! properties, these functions compute disjoint add/update/remove action
//! lists keyed by natural identity. All lists come out stably sorted by
//! natural key, so repeated runs against the same input are
//! order-independent, and applying a plan twice in a row produces an empty
//! second plan.

use std::collections::{BTreeMap, BTreeSet};

use crate::models::{ContentProperty, IdentifiedContentProperty, Label};

/// Planned label mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelPlan {
  /// Labels present in the desired set but not on the page, sorted by
  /// `(name, prefix)`.
  pub add: Vec<Label>,
  /// Labels on the page but absent from the desired set, sorted by
  /// `(name, prefix)`. Empty when existing labels are kept.
  pub remove: Vec<Label>,
}

impl LabelPlan {
  /// `true` when applying the plan would perform no mutations.
  pub fn is_empty(&self) -> bool {
    self.add.is_empty() && self.remove.is_empty()
  }
}

/// Compute the minimal label mutations that make the remote set match
/// `desired`. With `keep_existing`, removals are skipped entirely.
pub fn plan_labels(desired: &[Label], current: &[Label], keep_existing: bool) -> LabelPlan {
  let desired: BTreeSet<&Label> = desired.iter().collect();
  let current: BTreeSet<&Label> = current.iter().collect();

  let add = desired.difference(&current).map(|label| (*label).clone()).collect();
  let remove = if keep_existing {
    Vec::new()
  } else {
    current.difference(&desired).map(|label| (*label).clone()).collect()
  };

  LabelPlan { add, remove }
}

/// A planned in-place property update.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyUpdate {
  /// Service-assigned ID of the existing property.
  pub id: String,
  /// Version counter to submit: the current version plus one.
  pub new_version: u32,
  /// Key and replacement value.
  pub property: ContentProperty,
}

/// A planned property removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyRemoval {
  /// Natural key of the property being removed.
  pub key: String,
  /// Service-assigned ID of the existing property.
  pub id: String,
}

/// Planned content-property mutations.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyPlan {
  /// Properties to create, sorted by key.
  pub add: Vec<ContentProperty>,
  /// Properties whose value actually differs, sorted by key. Unchanged
  /// values are skipped to avoid gratuitous version churn.
  pub update: Vec<PropertyUpdate>,
  /// Properties to delete, sorted by key. Empty when existing properties
  /// are kept.
  pub remove: Vec<PropertyRemoval>,
}

impl PropertyPlan {
  /// `true` when applying the plan would perform no mutations.
  pub fn is_empty(&self) -> bool {
    self.add.is_empty() && self.update.is_empty() && self.remove.is_empty()
  }
}

/// Compute the minimal content-property mutations that make the remote set
/// match `desired`, keyed by property key. With `keep_existing`, removals
/// are skipped entirely.
pub fn plan_properties(
  desired: &[ContentProperty],
  current: &[IdentifiedContentProperty],
  keep_existing: bool,
) -> PropertyPlan {
  let desired: BTreeMap<&str, &ContentProperty> = desired.iter().map(|p| (p.key.as_str(), p)).collect();
  let current: BTreeMap<&str, &IdentifiedContentProperty> = current.iter().map(|p| (p.key.as_str(), p)).collect();

  let mut add = Vec::new();
  let mut update = Vec::new();
  let mut remove = Vec::new();

  for (key, property) in &desired {
    match current.get(key) {
      None => add.push((*property).clone()),
      Some(existing) if existing.value != property.value => update.push(PropertyUpdate {
        id: existing.id.clone(),
        new_version: existing.version.number + 1,
        property: (*property).clone(),
      }),
      Some(_) => {}
    }
  }

  if !keep_existing {
    for (key, existing) in &current {
      if !desired.contains_key(key) {
        remove.push(PropertyRemoval {
          key: (*key).to_string(),
          id: existing.id.clone(),
        });
      }
    }
  }

  PropertyPlan { add, update, remove }
}
