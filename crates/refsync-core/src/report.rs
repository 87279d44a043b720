//! Run outcome: counts and the human-readable summary returned to callers.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::reconcile::Plan;

/// Operation counts for one run. `updated` counts supersessions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncCounts {
  pub inserted: usize,
  pub updated:  usize,
  pub retired:  usize,
}

impl fmt::Display for SyncCounts {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{} inserted, {} updated, {} retired",
      self.inserted, self.updated, self.retired
    )
  }
}

/// What a successful run reports back to its trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResult {
  pub inserted: usize,
  pub updated:  usize,
  pub retired:  usize,
  pub message:  String,
}

impl SyncResult {
  pub fn counts(&self) -> SyncCounts {
    SyncCounts {
      inserted: self.inserted,
      updated:  self.updated,
      retired:  self.retired,
    }
  }
}

/// Summarise an applied plan.
pub fn summarize(plan: &Plan) -> SyncResult {
  let counts = plan.counts();

  let mut message = if plan.source_empty {
    if counts.retired == 0 {
      "no entities found upstream".to_string()
    } else {
      format!("no entities found upstream: {} retired", counts.retired)
    }
  } else {
    format!("sync complete: {counts}")
  };

  if !plan.duplicates.is_empty() {
    message.push_str(&format!(
      " ({} external id(s) repeated upstream; last occurrence used)",
      plan.duplicates.len()
    ));
  }

  SyncResult {
    inserted: counts.inserted,
    updated: counts.updated,
    retired: counts.retired,
    message,
  }
}
