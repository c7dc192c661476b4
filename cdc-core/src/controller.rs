use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{oneshot, Mutex as AsyncMutex};
use tokio::task::JoinHandle;

use cdc_binlog::{dispatch, ChangeHandler};
use cdc_changelog::{ChangeLog, CodecStyle, RecordCodec};
use cdc_common::err::{CResult, ReError};
use cdc_common::model::{Model, ModelRegistry};
use cdc_common::record::{ChangeRecord, RowValues};
use cdc_sync::{Syncer, TargetConnection};

use crate::source::ReplicationSource;

/// Default `ChangeHandler`: writes each decoded tuple into the change-log.
struct ChangeLogHandler {
    change_log: Arc<dyn ChangeLog>,
    codec: RecordCodec,
    codec_style: CodecStyle,
}

impl ChangeHandler for ChangeLogHandler {
    fn on_insert(&mut self, table: &str, new: RowValues) -> CResult<()> {
        self.append(table, ChangeRecord::insert(new))
    }

    fn on_update(&mut self, table: &str, old: RowValues, new: RowValues) -> CResult<()> {
        self.append(table, ChangeRecord::update(old, new))
    }

    fn on_delete(&mut self, table: &str, old: RowValues) -> CResult<()> {
        self.append(table, ChangeRecord::delete(old))
    }
}

impl ChangeLogHandler {
    fn append(&mut self, table: &str, record: ChangeRecord) -> CResult<()> {
        let bytes = self.codec.encode(&self.codec_style, &record)?;
        self.change_log.append(table, bytes)
    }
}

struct ReaderHandle {
    cancel: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

/// Wires Decoder → Change-Log → Syncer together and exposes the lifecycle
/// as plain methods — no transport binding (HTTP/RPC) is implemented, but
/// the method names and signatures are chosen so one could wrap these 1:1.
pub struct Controller {
    registry: ModelRegistry,
    change_log: Arc<dyn ChangeLog>,
    connection: Arc<dyn TargetConnection>,
    codec: RecordCodec,
    codec_style: CodecStyle,
    reader: AsyncMutex<Option<ReaderHandle>>,
    syncer: AsyncMutex<Option<Arc<Syncer>>>,
}

impl Controller {
    pub fn new(
        registry: ModelRegistry,
        change_log: Arc<dyn ChangeLog>,
        connection: Arc<dyn TargetConnection>,
    ) -> Self {
        Controller {
            registry,
            change_log,
            connection,
            codec: RecordCodec::new(),
            codec_style: CodecStyle::LittleVar,
            reader: AsyncMutex::new(None),
            syncer: AsyncMutex::new(None),
        }
    }

    /// `put-model`: register or replace a table's declared [`Model`].
    pub fn put_model(&self, model: Model) -> CResult<()> {
        self.registry.register(model)
    }

    /// `get-model`.
    pub fn get_model(&self, table: &str) -> CResult<Option<Arc<Model>>> {
        self.registry.get(table)
    }

    /// `start-parser`: attaches `source` and
    /// begins the replication-reader task, dispatching each decoded row
    /// into the change-log via the default handler. Returns
    /// `ConfigInvalid` if a parser is already running.
    pub async fn start_parser(&self, mut source: Box<dyn ReplicationSource>) -> CResult<()> {
        let mut guard = self.reader.lock().await;
        if guard.is_some() {
            return Err(ReError::ConfigInvalid("parser already running".into()));
        }
        let (cancel_tx, mut cancel_rx) = oneshot::channel();
        let registry = self.registry.clone();
        let mut handler = ChangeLogHandler {
            change_log: Arc::clone(&self.change_log),
            codec: self.codec.clone(),
            codec_style: self.codec_style.clone(),
        };

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut cancel_rx => {
                        tracing::info!("replication-reader received stop signal, detaching stream");
                        break;
                    }
                    event = source.next_event() => {
                        match event {
                            Ok(Some(event)) => {
                                if let Err(e) = dispatch(&event, &registry, &mut handler) {
                                    // Only a change-log append failure
                                    // (StoreUnavailable) reaches here — per-row
                                    // decode failures are already logged and
                                    // skipped inside `dispatch`.
                                    tracing::error!(error = %e, "replication-reader stopping: change-log store unavailable");
                                    break;
                                }
                            }
                            Ok(None) => {
                                tracing::info!("replication source stream ended");
                                break;
                            }
                            Err(e) => {
                                tracing::error!(error = %e, "replication source transport error, stopping reader");
                                break;
                            }
                        }
                    }
                }
            }
        });

        *guard = Some(ReaderHandle { cancel: cancel_tx, task });
        Ok(())
    }

    /// `stop-parser`: detaches the stream
    /// cleanly. A row already mid-decode when the signal arrives may be
    /// dropped (at-least-once does not cover rows never appended).
    pub async fn stop_parser(&self) -> CResult<()> {
        let handle = self.reader.lock().await.take();
        if let Some(handle) = handle {
            let _ = handle.cancel.send(());
            let _ = handle.task.await;
        }
        Ok(())
    }

    /// `start-syncer`: starts the periodic
    /// drain at `interval`. A second call while already running is a
    /// no-op, matching the Syncer's own start idempotence.
    pub async fn start_syncer(&self, interval: Duration) -> CResult<()> {
        let mut guard = self.syncer.lock().await;
        if guard.is_none() {
            let syncer = Syncer::new(
                Arc::clone(&self.connection),
                Arc::clone(&self.change_log),
                self.registry.clone(),
                interval,
            );
            syncer.start().await;
            *guard = Some(syncer);
        }
        Ok(())
    }

    /// `stop-syncer`: completes the in-progress
    /// drain pass, then exits.
    pub async fn stop_syncer(&self) -> CResult<()> {
        let syncer = self.syncer.lock().await.take();
        if let Some(syncer) = syncer {
            syncer.stop().await;
        }
        Ok(())
    }
}
