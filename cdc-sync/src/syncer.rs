use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{oneshot, Mutex as AsyncMutex};
use tokio::task::JoinHandle;

use cdc_changelog::{ChangeLog, CodecStyle, RecordCodec};
use cdc_common::err::{CResult, ReError};
use cdc_common::model::{Model, ModelRegistry};
use cdc_common::record::{Action, ChangeRecord};

use crate::cache::StatementCache;
use crate::connection::TargetConnection;
use crate::param::{bind_pk, bind_row};

/// The periodic drainer: reads the change-log, emits parameterized
/// SQL against the target DB, and head-trims on success.
///
/// Construction takes a non-owning handle to the change-log (`Arc<dyn
/// ChangeLog>`) rather than the Syncer owning the log outright, breaking
/// the cyclic `Syncer ↔ Store` reference the original carried: the log
/// outlives the Syncer, and lifecycle is bottom-up.
pub struct Syncer {
    cache: StatementCache,
    change_log: Arc<dyn ChangeLog>,
    registry: ModelRegistry,
    codec: RecordCodec,
    codec_style: CodecStyle,
    interval: Duration,
    /// Held for the duration of one drain pass; a tick that can't acquire
    /// it is dropped rather than queued, satisfying "a new tick that
    /// arrives while a drain is in progress does not start a second drain"
    /// with `try_lock` instead of hand-rolled re-entrancy tracking.
    draining: Arc<AsyncMutex<()>>,
    cancel: AsyncMutex<Option<oneshot::Sender<()>>>,
    task: AsyncMutex<Option<JoinHandle<()>>>,
}

impl Syncer {
    pub fn new(
        connection: Arc<dyn TargetConnection>,
        change_log: Arc<dyn ChangeLog>,
        registry: ModelRegistry,
        interval: Duration,
    ) -> Arc<Self> {
        Arc::new(Syncer {
            cache: StatementCache::new(connection),
            change_log,
            registry,
            codec: RecordCodec::new(),
            codec_style: CodecStyle::LittleVar,
            interval,
            draining: Arc::new(AsyncMutex::new(())),
            cancel: AsyncMutex::new(None),
            task: AsyncMutex::new(None),
        })
    }

    /// Starts the periodic drain task. Idempotent:
    /// calling twice on an already-started Syncer is a no-op.
    pub async fn start(self: &Arc<Self>) {
        let mut task_guard = self.task.lock().await;
        if task_guard.is_some() {
            return;
        }
        let (tx, mut rx) = oneshot::channel();
        *self.cancel.lock().await = Some(tx);

        let syncer = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(syncer.interval);
            loop {
                tokio::select! {
                    _ = &mut rx => {
                        tracing::info!("syncer received stop signal, exiting drain loop");
                        break;
                    }
                    _ = ticker.tick() => {
                        let Ok(permit) = syncer.draining.clone().try_lock_owned() else {
                            tracing::debug!("drain already in progress, dropping this tick");
                            continue;
                        };
                        if let Err(e) = syncer.drain_once().await {
                            tracing::error!(error = %e, "drain pass failed");
                        }
                        drop(permit);
                    }
                }
            }
        });
        *task_guard = Some(handle);
    }

    /// Stops the drain task. Completes one in-progress
    /// drain pass before exiting (the `draining` lock is acquired by the
    /// loop itself, not here, so `stop` only signals — it never aborts a
    /// pass mid-flight). Releases the prepared-statement cache before
    /// returning so the caller can safely close the underlying connection.
    pub async fn stop(&self) {
        if let Some(tx) = self.cancel.lock().await.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.task.lock().await.take() {
            let _ = handle.await;
        }
        self.cache.clear().await;
    }

    /// One full drain pass over every registered table.
    /// Exposed directly (not only via the background task) so callers and
    /// tests can drive a single pass deterministically.
    pub async fn drain_once(&self) -> CResult<()> {
        let tables = self.registry.table_names()?;
        for table in tables {
            if let Err(e) = self.drain_table(&table).await {
                tracing::error!(table = %table, error = %e, "drain pass failed for table");
            }
        }
        Ok(())
    }

    /// Drains one table: snapshot, decode + apply in order, trim exactly
    /// the successfully-applied prefix.
    pub async fn drain_table(&self, table: &str) -> CResult<()> {
        let n = self.change_log.size(table)?;
        if n == 0 {
            return Ok(());
        }
        let raw_records = self.change_log.range_read(table, 0, (n - 1) as i64)?;
        let model = self.registry.get(table)?.ok_or_else(|| {
            ReError::ConfigInvalid(format!("no model registered for table {}", table))
        })?;

        let mut applied = 0usize;
        let mut failure: Option<ReError> = None;
        for raw in &raw_records {
            let record = match self.codec.decode(&self.codec_style, raw) {
                Ok(r) => r,
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            };
            match self.apply(&model, &record).await {
                Ok(()) => applied += 1,
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }

        if applied > 0 {
            self.change_log.trim_head(table, applied)?;
        }
        if let Some(e) = failure {
            return Err(e);
        }
        tracing::debug!(table, applied, "drain pass complete");
        Ok(())
    }

    async fn apply(&self, model: &Model, record: &ChangeRecord) -> CResult<()> {
        match record.action {
            Action::Insert => {
                let new_values = record.new_values.as_ref().ok_or_else(|| {
                    ReError::DecodeCorrupt("Insert record missing new_values".into())
                })?;
                let stmt = self.cache.insert_statement(model).await?;
                let params = bind_row(new_values, model.bindings());
                stmt.execute(&params).await?;
            }
            Action::Update => {
                let new_values = record.new_values.as_ref().ok_or_else(|| {
                    ReError::DecodeCorrupt("Update record missing new_values".into())
                })?;
                let old_values = record.old_values.as_ref().ok_or_else(|| {
                    ReError::DecodeCorrupt("Update record missing old_values".into())
                })?;
                let stmt = self.cache.update_by_pk_statement(model).await?;
                let mut params = bind_row(new_values, model.bindings());
                params.extend(bind_pk(old_values, model.bindings()));
                stmt.execute(&params).await?;
            }
            Action::Delete => {
                let old_values = record.old_values.as_ref().ok_or_else(|| {
                    ReError::DecodeCorrupt("Delete record missing old_values".into())
                })?;
                let stmt = self.cache.delete_by_pk_statement(model).await?;
                let params = bind_pk(old_values, model.bindings());
                stmt.execute(&params).await?;
            }
        }
        Ok(())
    }
}
