//! A thin CLI for local smoke-testing the core pipeline end to end against
//! the in-memory change-log and a logging stand-in for the target driver.
//! No real source/target drivers live in this workspace; both are
//! out-of-scope collaborators reached only through trait seams.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use clap::Parser;

use cdc_binlog::{RawValue, SourceColumn, SourceEvent, SourceTypeTag};
use cdc_changelog::{ChangeLog, MemoryChangeLog};
use cdc_common::err::CResult;
use cdc_common::log::TracingFactory;
use cdc_common::model::{FieldBinding, Model, ModelRegistry};
use cdc_common::record::Action;
use cdc_common::value::Kind;
use cdc_core::{Controller, ReplicationSource};
use cdc_sync::{BoundParam, ExecuteResult, PreparedStatement, TargetConnection};

#[derive(Parser, Debug, Clone)]
#[command(name = "cdc-cli")]
#[command(version = "0.0.1")]
#[command(about = "MySQL-to-SQL-Server CDC pipeline smoke-test CLI")]
struct CliArgs {
    /// enable debug-level logging
    #[arg(short, long, default_value_t = false)]
    debug: bool,

    /// syncer drain interval, in seconds
    #[arg(long, default_value_t = 1)]
    interval_secs: u64,

    /// how long to let the demo pipeline run before shutting down, in seconds
    #[arg(long, default_value_t = 3)]
    run_secs: u64,
}

/// A fixed, in-process replay of a handful of row-change events, standing
/// in for a live replication connection.
struct DemoSource {
    events: Vec<SourceEvent>,
    index: AtomicUsize,
}

impl DemoSource {
    fn new() -> Self {
        let columns = vec![
            SourceColumn::new("staff_id", SourceTypeTag::Number),
            SourceColumn::new("name", SourceTypeTag::String),
        ];
        let events = vec![
            SourceEvent {
                schema: "sakila".into(),
                table: "staff".into(),
                action: Action::Insert,
                columns: columns.clone(),
                rows: vec![vec![RawValue::I64(1), RawValue::String("中文".into())]],
            },
            SourceEvent {
                schema: "sakila".into(),
                table: "staff".into(),
                action: Action::Update,
                columns: columns.clone(),
                rows: vec![
                    vec![RawValue::I64(1), RawValue::String("中文".into())],
                    vec![RawValue::I64(1), RawValue::String("新".into())],
                ],
            },
            SourceEvent {
                schema: "sakila".into(),
                table: "staff".into(),
                action: Action::Delete,
                columns,
                rows: vec![vec![RawValue::I64(1), RawValue::String("新".into())]],
            },
        ];
        DemoSource {
            events,
            index: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ReplicationSource for DemoSource {
    async fn next_event(&mut self) -> CResult<Option<SourceEvent>> {
        let i = self.index.fetch_add(1, Ordering::SeqCst);
        Ok(self.events.get(i).cloned())
    }
}

struct LoggingResult(u64);

impl ExecuteResult for LoggingResult {
    fn rows_affected(&self) -> u64 {
        self.0
    }
}

struct LoggingStatement {
    sql: String,
}

#[async_trait]
impl PreparedStatement for LoggingStatement {
    async fn execute(&self, params: &[BoundParam]) -> CResult<Box<dyn ExecuteResult>> {
        tracing::info!(sql = %self.sql, ?params, "applying statement to target");
        Ok(Box::new(LoggingResult(1)))
    }
}

/// Stands in for the out-of-scope SQL-Server-family driver: logs every
/// statement it would have sent instead of opening a real connection.
struct LoggingConnection;

#[async_trait]
impl TargetConnection for LoggingConnection {
    async fn prepare(&self, statement_text: &str) -> CResult<Box<dyn PreparedStatement>> {
        tracing::debug!(sql = statement_text, "preparing statement");
        Ok(Box::new(LoggingStatement { sql: statement_text.to_string() }))
    }

    async fn close(&self) -> CResult<()> {
        Ok(())
    }
}

fn demo_registry() -> ModelRegistry {
    let registry = ModelRegistry::new();
    registry
        .register(
            Model::new(
                "staff",
                vec![
                    FieldBinding::new("id", "staff_id", Kind::Int).primary_key(),
                    FieldBinding::new("name", "name", Kind::Str),
                ],
            )
            .unwrap(),
        )
        .unwrap();
    registry
}

#[tokio::main]
async fn main() -> CResult<()> {
    let args = CliArgs::parse();
    TracingFactory::init_log(args.debug);

    eprintln!();
    eprintln!("╔╦╗╔═╗ ╔═╗╔╦╗╦  ");
    eprintln!(" ║ ╠═╣ ║   ║ ║  ");
    eprintln!(" ╩ ╩ ╩ ╚═╝ ╩ ╩═╝ CDC smoke-test CLI");
    eprintln!();

    let change_log: Arc<dyn ChangeLog> = Arc::new(MemoryChangeLog::new());
    let connection = Arc::new(LoggingConnection);
    let controller = Controller::new(demo_registry(), Arc::clone(&change_log), connection);

    controller.start_parser(Box::new(DemoSource::new())).await?;
    controller.start_syncer(Duration::from_secs(args.interval_secs)).await?;

    tokio::time::sleep(Duration::from_secs(args.run_secs)).await;

    controller.stop_syncer().await?;
    controller.stop_parser().await?;

    let remaining = change_log.size("staff")?;
    eprintln!("demo run complete; {} record(s) remain in the change-log", remaining);

    Ok(())
}
