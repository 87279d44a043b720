//! Batch application: turn a [`Plan`] into store writes.

use tracing::{debug, info};

use crate::{
  Error, Result,
  reconcile::Plan,
  store::{ApplyFailure, BatchAck, RecordStore},
};

/// Write `plan` to `store` as one deactivate-then-insert batch.
///
/// An empty plan never touches the store.
pub async fn apply<S: RecordStore>(store: &S, plan: &Plan) -> Result<BatchAck> {
  let batch = plan.to_batch();
  if batch.is_empty() {
    return Ok(BatchAck::default());
  }

  for record in &plan.to_retire {
    info!(
      external_id = %record.external_id,
      name = %record.name,
      "retiring record no longer present upstream"
    );
  }
  for sup in &plan.to_supersede {
    info!(
      external_id = %sup.old.external_id,
      from = %sup.old.name,
      to = %sup.new.name,
      "superseding renamed record"
    );
  }
  for record in &plan.to_insert {
    debug!(external_id = %record.external_id, name = %record.name, "inserting record");
  }

  let planned = plan.counts();
  store.apply_batch(batch).await.map_err(
    |ApplyFailure { error, deactivations_committed, stale_snapshot }| {
      if deactivations_committed {
        Error::PartialApplication { planned, source: Box::new(error) }
      } else if stale_snapshot {
        Error::StaleSnapshot { planned, source: Box::new(error) }
      } else {
        Error::BatchRejected { planned, source: Box::new(error) }
      }
    },
  )
}
