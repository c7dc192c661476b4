//! Drives the Syncer against a real [`DiskChangeLog`] and a hand-rolled
//! target-connection double (the crate's own `pub(crate)` mock is
//! intentionally not reachable from here — see `cdc-sync`'s unit tests for
//! that one). Exercises the update-by-PK statement shape end to end and the
//! "a tick that lands while a drain is in progress does not start a second
//! drain" property.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use cdc_changelog::{ChangeLog, CodecStyle, DiskChangeLog, RecordCodec};
use cdc_common::err::CResult;
use cdc_common::model::{FieldBinding, Model, ModelRegistry};
use cdc_common::record::{ChangeRecord, RowValues};
use cdc_common::value::{Kind, Value};
use cdc_sync::{BoundParam, ExecuteResult, PreparedStatement, Syncer, TargetConnection};

struct CountingResult(u64);

impl ExecuteResult for CountingResult {
    fn rows_affected(&self) -> u64 {
        self.0
    }
}

/// Records every bound-parameter list it is asked to execute, and can be
/// told to sleep past the next tick to exercise the overlap-drop path.
struct RecordingStatement {
    sql: String,
    calls: Arc<std::sync::Mutex<Vec<(String, Vec<BoundParam>)>>>,
    delay: Duration,
}

#[async_trait]
impl PreparedStatement for RecordingStatement {
    async fn execute(&self, params: &[BoundParam]) -> CResult<Box<dyn ExecuteResult>> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.calls.lock().unwrap().push((self.sql.clone(), params.to_vec()));
        Ok(Box::new(CountingResult(1)))
    }
}

#[derive(Default)]
struct RecordingConnection {
    calls: Arc<std::sync::Mutex<Vec<(String, Vec<BoundParam>)>>>,
    delay: Duration,
    prepared_count: AtomicUsize,
}

#[async_trait]
impl TargetConnection for RecordingConnection {
    async fn prepare(&self, statement_text: &str) -> CResult<Box<dyn PreparedStatement>> {
        self.prepared_count.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(RecordingStatement {
            sql: statement_text.to_string(),
            calls: Arc::clone(&self.calls),
            delay: self.delay,
        }))
    }

    async fn close(&self) -> CResult<()> {
        Ok(())
    }
}

fn staff_registry() -> ModelRegistry {
    let registry = ModelRegistry::new();
    registry
        .register(
            Model::new(
                "staff",
                vec![
                    FieldBinding::new("id", "id", Kind::Int).primary_key(),
                    FieldBinding::new("name", "name", Kind::Str),
                ],
            )
            .unwrap(),
        )
        .unwrap();
    registry
}

fn row(id: i64, name: &str) -> RowValues {
    let mut values = RowValues::new();
    values.insert("id".into(), Value::Int(id));
    values.insert("name".into(), Value::Str(name.to_string()));
    values
}

#[tokio::test]
async fn update_by_pk_drains_against_a_disk_backed_log() {
    let dir = tempfile::tempdir().unwrap();
    let log: Arc<dyn ChangeLog> = Arc::new(DiskChangeLog::open(dir.path(), 8 * 1024 * 1024).unwrap());
    let codec = RecordCodec::new();

    let record = ChangeRecord::update(row(1, "旧"), row(1, "新"));
    log.append("staff", codec.encode(&CodecStyle::LittleVar, &record).unwrap())
        .unwrap();

    let connection = Arc::new(RecordingConnection::default());
    let syncer = Syncer::new(connection.clone(), log.clone(), staff_registry(), Duration::from_secs(1));
    syncer.drain_table("staff").await.unwrap();

    assert_eq!(log.size("staff").unwrap(), 0);
    let calls = connection.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].0.starts_with("update staff set"));
    // new-values first, then PK where-clause param, per the bind order
    // the Syncer's apply() uses for an update-by-PK statement.
    assert_eq!(calls[0].1[1], BoundParam::Str("新".into()));
    assert_eq!(calls[0].1[2], BoundParam::Int(1));
}

#[tokio::test]
async fn an_overlapping_tick_drops_rather_than_starting_a_second_drain() {
    let log: Arc<dyn ChangeLog> = Arc::new(cdc_changelog::MemoryChangeLog::new());
    let codec = RecordCodec::new();
    log.append(
        "staff",
        codec
            .encode(&CodecStyle::LittleVar, &ChangeRecord::insert(row(1, "a")))
            .unwrap(),
    )
    .unwrap();

    let connection = Arc::new(RecordingConnection {
        delay: Duration::from_millis(120),
        ..Default::default()
    });
    let syncer = Syncer::new(connection.clone(), log.clone(), staff_registry(), Duration::from_millis(30));
    syncer.start().await;

    // Several ticks elapse while the first drain's single insert is still
    // "executing" (sleeping); only one drain pass should ever prepare a
    // statement, since every later tick finds `draining` held and drops.
    tokio::time::sleep(Duration::from_millis(200)).await;
    syncer.stop().await;

    assert_eq!(connection.prepared_count.load(Ordering::SeqCst), 1);
    assert_eq!(connection.calls.lock().unwrap().len(), 1);
}
