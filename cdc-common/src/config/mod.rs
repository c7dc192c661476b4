use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::err::{CResult, ReError};

/// Configuration for the durable change-log's disk backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeLogConfig {
    /// Directory segment files are written under.
    pub dir: String,
    /// Segment size in bytes. Defaults to 8 MiB, per the on-disk layout spec.
    #[serde(default = "default_segment_size")]
    pub segment_size: u64,
}

fn default_segment_size() -> u64 {
    8 * 1024 * 1024
}

impl ChangeLogConfig {
    pub fn validate(&self) -> CResult<()> {
        if self.dir.trim().is_empty() {
            return Err(ReError::ConfigInvalid(
                "ChangeLogConfig.dir must not be empty".into(),
            ));
        }
        if self.segment_size == 0 {
            return Err(ReError::ConfigInvalid(
                "ChangeLogConfig.segment_size must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Target SQL-Server-family connection configuration. Mirrors the
/// semicolon-separated connection string shape the target driver
/// expects.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetDbConfig {
    pub server: String,
    pub database: String,
    pub user_id: String,
    pub password: String,
    #[serde(default)]
    pub log: LogFlags,
    pub encrypt: Option<String>,
    pub app_name: Option<String>,
}

bitflags::bitflags! {
    /// The `log=<bitmask>` connection-string field: 1 errors, 2 messages,
    /// 4 rows, 8 statements, 16 params, 32 txns; 63 = all.
    #[derive(Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct LogFlags: u8 {
        const ERRORS = 1;
        const MESSAGES = 2;
        const ROWS = 4;
        const STATEMENTS = 8;
        const PARAMS = 16;
        const TRANSACTIONS = 32;
    }
}

impl Default for LogFlags {
    fn default() -> Self {
        LogFlags::empty()
    }
}

impl TargetDbConfig {
    pub fn validate(&self) -> CResult<()> {
        if self.database.trim().is_empty() {
            return Err(ReError::ConfigInvalid(
                "TargetDbConfig.database must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Builds the semicolon-separated connection string the target driver
    /// expects. Order is insignificant per the contract, but kept stable
    /// here (server, database, user id/password, log, encrypt, app name)
    /// for readability and to make tests deterministic.
    pub fn to_connection_string(&self) -> String {
        let mut out = String::with_capacity(64);
        if !self.server.is_empty() {
            let _ = write!(out, "server={};", self.server);
        }
        if !self.database.is_empty() {
            let _ = write!(out, "database={};", self.database);
        }
        if !self.user_id.is_empty() {
            let _ = write!(out, "user id={};password={};", self.user_id, self.password);
        }
        let _ = write!(out, "log={};", self.log.bits());
        if let Some(encrypt) = &self.encrypt {
            let _ = write!(out, "encrypt={};", encrypt);
        }
        if let Some(app_name) = &self.app_name {
            let _ = write!(out, "app name={};", app_name);
        }
        out
    }
}

/// Drain loop cadence and other Syncer knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncerConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

fn default_interval_secs() -> u64 {
    1
}

impl Default for SyncerConfig {
    fn default() -> Self {
        SyncerConfig {
            interval_secs: default_interval_secs(),
        }
    }
}

/// TLS settings for the source replication connection: server name
/// for certificate verification, a root CA bundle, and an optional client
/// cert/key pair for mutual TLS.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TlsConfig {
    pub server_name: Option<String>,
    pub root_ca_path: Option<String>,
    pub client_cert_path: Option<String>,
    pub client_key_path: Option<String>,
}

/// Source-side connection and filtering configuration. The core only
/// carries these fields through to wherever the replication driver is
/// constructed — it does not itself speak the wire protocol, resolve TLS,
/// or resume a stream position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Regexes matched against fully qualified `schema.table` names (e.g.
    /// `"sakila\\.staff"`). An empty list means "no inclusion filter".
    #[serde(default)]
    pub include_tables: Vec<String>,
    #[serde(default)]
    pub exclude_tables: Vec<String>,
    #[serde(default)]
    pub tls: Option<TlsConfig>,
    /// An opaque, driver-defined position to resume the stream from (e.g.
    /// a binlog file+offset or GTID set), persisted by the driver itself.
    #[serde(default)]
    pub resume_position: Option<String>,
}

impl SourceConfig {
    pub fn validate(&self) -> CResult<()> {
        if self.host.trim().is_empty() {
            return Err(ReError::ConfigInvalid("SourceConfig.host must not be empty".into()));
        }
        if self.port == 0 {
            return Err(ReError::ConfigInvalid("SourceConfig.port must not be zero".into()));
        }
        for pattern in self.include_tables.iter().chain(self.exclude_tables.iter()) {
            regex::Regex::new(pattern).map_err(|e| {
                ReError::ConfigInvalid(format!("invalid table filter regex '{}': {}", pattern, e))
            })?;
        }
        Ok(())
    }
}

/// The whole-component configuration a control-plane startup call loads in
/// one shot: source connection/filtering, change-log durability, target
/// connection, and drain cadence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub source: SourceConfig,
    pub change_log: ChangeLogConfig,
    pub target: TargetDbConfig,
    #[serde(default)]
    pub syncer: SyncerConfig,
}

impl PipelineConfig {
    pub fn validate(&self) -> CResult<()> {
        self.source.validate()?;
        self.change_log.validate()?;
        self.target.validate()?;
        Ok(())
    }
}

/// On-disk encoding a config file is written in: plain TOML vs. YAML,
/// chosen explicitly by the caller rather than auto-sniffed from the
/// file extension.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum LoadStyle {
    Toml,
    Yaml,
}

/// Reads and validates a [`PipelineConfig`] from `path`, encoded per
/// `style`. `ConfigInvalid` covers both a missing/unreadable file and a
/// file that parses but fails `validate`, matching the error taxonomy's
/// "fail at startup; do not start the component" handling.
pub fn read_config<P: AsRef<Path>>(path: P, style: LoadStyle) -> CResult<PipelineConfig> {
    let text = fs::read_to_string(path.as_ref()).map_err(|e| {
        ReError::ConfigInvalid(format!("failed to read {}: {}", path.as_ref().display(), e))
    })?;
    let config = match style {
        LoadStyle::Toml => toml::from_str(&text)
            .map_err(|e| ReError::ConfigInvalid(format!("invalid TOML config: {}", e)))?,
        LoadStyle::Yaml => serde_yaml::from_str(&text)
            .map_err(|e| ReError::ConfigInvalid(format!("invalid YAML config: {}", e)))?,
    };
    let config: PipelineConfig = config;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_string_order_and_fields() {
        let cfg = TargetDbConfig {
            server: "127.0.0.1".into(),
            database: "sakila".into(),
            user_id: "sa".into(),
            password: "pw".into(),
            log: LogFlags::all(),
            encrypt: Some("disable".into()),
            app_name: Some("cdc-sync".into()),
        };
        let s = cfg.to_connection_string();
        assert!(s.contains("server=127.0.0.1;"));
        assert!(s.contains("database=sakila;"));
        assert!(s.contains("user id=sa;password=pw;"));
        assert!(s.contains("log=63;"));
        assert!(s.contains("encrypt=disable;"));
        assert!(s.contains("app name=cdc-sync;"));
    }

    #[test]
    fn change_log_config_rejects_empty_dir() {
        let cfg = ChangeLogConfig {
            dir: "".into(),
            segment_size: default_segment_size(),
        };
        assert!(matches!(cfg.validate(), Err(ReError::ConfigInvalid(_))));
    }

    #[test]
    fn target_db_config_rejects_empty_database() {
        let cfg = TargetDbConfig::default();
        assert!(matches!(cfg.validate(), Err(ReError::ConfigInvalid(_))));
    }

    fn source_config() -> SourceConfig {
        SourceConfig {
            host: "127.0.0.1".into(),
            port: 3306,
            username: "root".into(),
            password: "".into(),
            include_tables: vec!["sakila\\.staff".into()],
            exclude_tables: vec![],
            tls: None,
            resume_position: None,
        }
    }

    #[test]
    fn source_config_accepts_valid_filter_regex() {
        assert!(source_config().validate().is_ok());
    }

    #[test]
    fn source_config_rejects_invalid_filter_regex() {
        let mut cfg = source_config();
        cfg.include_tables.push("(unclosed".into());
        assert!(matches!(cfg.validate(), Err(ReError::ConfigInvalid(_))));
    }

    #[test]
    fn source_config_rejects_empty_host() {
        let mut cfg = source_config();
        cfg.host = "".into();
        assert!(matches!(cfg.validate(), Err(ReError::ConfigInvalid(_))));
    }

    fn pipeline_config() -> PipelineConfig {
        PipelineConfig {
            source: source_config(),
            change_log: ChangeLogConfig {
                dir: "/tmp/cdc-changelog".into(),
                segment_size: default_segment_size(),
            },
            target: TargetDbConfig {
                server: "127.0.0.1".into(),
                database: "sakila".into(),
                user_id: "sa".into(),
                password: "pw".into(),
                log: LogFlags::empty(),
                encrypt: Some("disable".into()),
                app_name: Some("cdc-sync".into()),
            },
            syncer: SyncerConfig::default(),
        }
    }

    #[test]
    fn read_config_round_trips_through_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.toml");
        let text = toml::to_string(&pipeline_config()).unwrap();
        fs::write(&path, text).unwrap();

        let loaded = read_config(&path, LoadStyle::Toml).unwrap();
        assert_eq!(loaded.target.database, "sakila");
        assert_eq!(loaded.source.host, "127.0.0.1");
    }

    #[test]
    fn read_config_round_trips_through_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.yaml");
        let text = serde_yaml::to_string(&pipeline_config()).unwrap();
        fs::write(&path, text).unwrap();

        let loaded = read_config(&path, LoadStyle::Yaml).unwrap();
        assert_eq!(loaded.target.database, "sakila");
    }

    #[test]
    fn read_config_surfaces_config_invalid_for_a_missing_file() {
        let result = read_config("/no/such/path.toml", LoadStyle::Toml);
        assert!(matches!(result, Err(ReError::ConfigInvalid(_))));
    }

    #[test]
    fn read_config_rejects_a_file_that_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.toml");
        let mut cfg = pipeline_config();
        cfg.target.database = String::new();
        fs::write(&path, toml::to_string(&cfg).unwrap()).unwrap();

        let result = read_config(&path, LoadStyle::Toml);
        assert!(matches!(result, Err(ReError::ConfigInvalid(_))));
    }
}
