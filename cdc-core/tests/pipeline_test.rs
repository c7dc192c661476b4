//! End-to-end: replication source → decode → change-log → syncer, with a
//! simulated crash/restart of the change-log in between, covering Set/
//! Decimal/Blob-bearing columns.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use cdc_binlog::{RawValue, SourceColumn, SourceEvent, SourceTypeTag};
use cdc_changelog::{ChangeLog, DiskChangeLog};
use cdc_common::err::CResult;
use cdc_common::model::{FieldBinding, Model, ModelRegistry};
use cdc_common::record::Action;
use cdc_common::value::Kind;
use cdc_core::{Controller, ReplicationSource};
use cdc_sync::{BoundParam, ExecuteResult, PreparedStatement, TargetConnection};

struct FiniteSource {
    events: Vec<SourceEvent>,
    index: AtomicUsize,
}

#[async_trait]
impl ReplicationSource for FiniteSource {
    async fn next_event(&mut self) -> CResult<Option<SourceEvent>> {
        let i = self.index.fetch_add(1, Ordering::SeqCst);
        Ok(self.events.get(i).cloned())
    }
}

struct RecordingResult;
impl ExecuteResult for RecordingResult {
    fn rows_affected(&self) -> u64 {
        1
    }
}

struct RecordingStatement {
    sql: String,
    calls: Arc<std::sync::Mutex<Vec<(String, Vec<BoundParam>)>>>,
}

#[async_trait]
impl PreparedStatement for RecordingStatement {
    async fn execute(&self, params: &[BoundParam]) -> CResult<Box<dyn ExecuteResult>> {
        self.calls.lock().unwrap().push((self.sql.clone(), params.to_vec()));
        Ok(Box::new(RecordingResult))
    }
}

#[derive(Default)]
struct RecordingConnection {
    calls: Arc<std::sync::Mutex<Vec<(String, Vec<BoundParam>)>>>,
}

#[async_trait]
impl TargetConnection for RecordingConnection {
    async fn prepare(&self, statement_text: &str) -> CResult<Box<dyn PreparedStatement>> {
        Ok(Box::new(RecordingStatement {
            sql: statement_text.to_string(),
            calls: Arc::clone(&self.calls),
        }))
    }

    async fn close(&self) -> CResult<()> {
        Ok(())
    }
}

fn staff_model() -> Model {
    Model::new(
        "staff",
        vec![
            FieldBinding::new("id", "staff_id", Kind::Int).primary_key(),
            FieldBinding::new("roles", "roles", Kind::Set),
            FieldBinding::new("balance", "balance", Kind::Decimal),
            FieldBinding::new("photo", "photo", Kind::Blob),
        ],
    )
    .unwrap()
}

fn staff_registry() -> ModelRegistry {
    let registry = ModelRegistry::new();
    registry.register(staff_model()).unwrap();
    registry
}

fn insert_event() -> SourceEvent {
    SourceEvent {
        schema: "sakila".into(),
        table: "staff".into(),
        action: Action::Insert,
        columns: vec![
            SourceColumn::new("staff_id", SourceTypeTag::Number),
            SourceColumn::new("roles", SourceTypeTag::Set).with_set_values(
                vec!["admin", "staff", "guest"].into_iter().map(String::from).collect(),
            ),
            SourceColumn::new("balance", SourceTypeTag::Decimal),
            SourceColumn::new("photo", SourceTypeTag::Binary),
        ],
        rows: vec![vec![
            RawValue::I64(1),
            RawValue::I64(5), // binary 101 -> reversed -> bit0=admin,bit2=guest
            RawValue::String("42.5000".into()),
            RawValue::Bytes(vec![1, 2, 3, 4]),
        ]],
    }
}

#[tokio::test]
async fn insert_round_trip_survives_a_change_log_restart_then_drains() {
    let dir = tempfile::tempdir().unwrap();

    // Phase 1: decode the event and append into a disk-backed change-log,
    // then simulate a crash by dropping every handle to it.
    {
        let change_log: Arc<dyn ChangeLog> =
            Arc::new(DiskChangeLog::open(dir.path(), 8 * 1024 * 1024).unwrap());
        let connection = Arc::new(RecordingConnection::default());
        let controller = Controller::new(staff_registry(), Arc::clone(&change_log), connection);

        let source = Box::new(FiniteSource {
            events: vec![insert_event()],
            index: AtomicUsize::new(0),
        });
        controller.start_parser(source).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        controller.stop_parser().await.unwrap();

        assert_eq!(change_log.size("staff").unwrap(), 1);
    }

    // Phase 2: reopen the same directory (simulating a process restart) and
    // drain the still-durable record against the target connection.
    let reopened_log: Arc<dyn ChangeLog> =
        Arc::new(DiskChangeLog::open(dir.path(), 8 * 1024 * 1024).unwrap());
    assert_eq!(reopened_log.size("staff").unwrap(), 1);

    let connection = Arc::new(RecordingConnection::default());
    let controller = Controller::new(staff_registry(), Arc::clone(&reopened_log), Arc::clone(&connection));
    controller.start_syncer(Duration::from_millis(20)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(80)).await;
    controller.stop_syncer().await.unwrap();

    assert_eq!(reopened_log.size("staff").unwrap(), 0);
    let calls = connection.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].0.starts_with("insert into staff"));
    // roles (Set), balance (Decimal cast to Int-or-Decimal via bind_value),
    // photo (Blob) all made it through decode -> change-log -> bind.
    assert!(matches!(calls[0].1[3], BoundParam::Blob(ref b) if b == &vec![1, 2, 3, 4]));
}
