use cdc_common::err::CResult;
use cdc_common::model::ModelRegistry;
use cdc_common::record::{Action, RowValues};

use crate::decode::decode_row;
use crate::event::SourceEvent;

/// Sink for decoded row-level mutations. The default production
/// implementation appends into the change-log; tests can supply an
/// in-memory collector.
pub trait ChangeHandler {
    fn on_insert(&mut self, table: &str, new: RowValues) -> CResult<()>;
    fn on_update(&mut self, table: &str, old: RowValues, new: RowValues) -> CResult<()>;
    fn on_delete(&mut self, table: &str, old: RowValues) -> CResult<()>;
}

/// Slices `event.rows` by its action and emits exactly one callback per
/// logical record. Unknown tables are skipped silently; a single
/// row's decode failure is logged and the rest of the event is still
/// processed. A `ChangeHandler` failure (e.g. the change-log append is
/// unavailable) is propagated — that is fatal per the error taxonomy's
/// `StoreUnavailable` entry, not a per-row condition.
pub fn dispatch(
    event: &SourceEvent,
    registry: &ModelRegistry,
    handler: &mut dyn ChangeHandler,
) -> CResult<()> {
    let model = match registry.get(&event.table)? {
        Some(model) => model,
        None => return Ok(()),
    };

    match event.action {
        Action::Insert => {
            for row_index in 0..event.rows.len() {
                match decode_row(event, row_index, &model) {
                    Ok(new) => handler.on_insert(&event.table, new)?,
                    Err(e) => tracing::warn!(table = %event.table, row = row_index, error = %e, "insert row failed to decode, skipping"),
                }
            }
        }
        Action::Delete => {
            for row_index in 0..event.rows.len() {
                match decode_row(event, row_index, &model) {
                    Ok(old) => handler.on_delete(&event.table, old)?,
                    Err(e) => tracing::warn!(table = %event.table, row = row_index, error = %e, "delete row failed to decode, skipping"),
                }
            }
        }
        Action::Update => {
            // Rows arrive as adjacent (pre-image, post-image) pairs; an odd
            // trailing row (no post-image) has no pair and is skipped.
            let pair_count = event.rows.len() / 2;
            for pair in 0..pair_count {
                let old_index = pair * 2;
                let new_index = pair * 2 + 1;
                let old = decode_row(event, old_index, &model);
                let new = decode_row(event, new_index, &model);
                match (old, new) {
                    (Ok(old), Ok(new)) => handler.on_update(&event.table, old, new)?,
                    (old, new) => {
                        if let Err(e) = old {
                            tracing::warn!(table = %event.table, row = old_index, error = %e, "update pre-image failed to decode, skipping pair");
                        }
                        if let Err(e) = new {
                            tracing::warn!(table = %event.table, row = new_index, error = %e, "update post-image failed to decode, skipping pair");
                        }
                    }
                }
            }
        }
    }
    Ok(())
}
