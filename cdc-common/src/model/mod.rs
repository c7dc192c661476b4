use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use once_cell::sync::OnceCell;

use crate::err::{CResult, ReError};
use crate::value::Kind;

/// One declared field of a [`Model`]: how an in-memory field maps onto a
/// source column.
#[derive(Debug, Clone)]
pub struct FieldBinding {
    /// In-memory field identifier, used for reflection-style population of
    /// a user struct. Not interpreted by the decoder itself.
    pub field_id: String,
    pub column_name: String,
    pub kind: Kind,
    pub nullable: bool,
    pub is_primary_key: bool,
    /// Wire value is a string that must be parsed into a nested shape.
    pub json: bool,
}

impl FieldBinding {
    pub fn new(field_id: impl Into<String>, column_name: impl Into<String>, kind: Kind) -> Self {
        FieldBinding {
            field_id: field_id.into(),
            column_name: column_name.into(),
            kind,
            nullable: false,
            is_primary_key: false,
            json: false,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self
    }

    pub fn json(mut self) -> Self {
        self.json = true;
        self
    }
}

/// Schema-binding output for one column, computed once per model
/// registration and cached on the [`Model`].
#[derive(Debug, Clone)]
pub struct ColumnBinding {
    pub name: String,
    pub nullable: bool,
    pub is_primary_key: bool,
    pub kind: Kind,
    pub json: bool,
    /// Set when the target driver requires a cast-wrapped placeholder for
    /// this column (Blob/nullable-Blob columns only).
    pub binary_column: bool,
}

/// A named, ordered list of [`FieldBinding`]s describing one source table.
#[derive(Debug)]
pub struct Model {
    pub table: String,
    pub fields: Vec<FieldBinding>,
    bindings: OnceCell<Vec<ColumnBinding>>,
}

impl Model {
    pub fn new(table: impl Into<String>, fields: Vec<FieldBinding>) -> CResult<Self> {
        let table = table.into();
        let mut seen = std::collections::HashSet::new();
        for f in &fields {
            if !seen.insert(f.column_name.as_str()) {
                return Err(ReError::ConfigInvalid(format!(
                    "model {}: duplicate column name {}",
                    table, f.column_name
                )));
            }
        }
        Ok(Model {
            table,
            fields,
            bindings: OnceCell::new(),
        })
    }

    /// Incremental construction, for call sites that build up a field list
    /// one column at a time rather than assembling the whole `Vec` up front.
    pub fn builder(table: impl Into<String>) -> ModelBuilder {
        ModelBuilder {
            table: table.into(),
            fields: Vec::new(),
        }
    }

    /// Schema Binding: computed once, cached thereafter.
    pub fn bindings(&self) -> &[ColumnBinding] {
        self.bindings.get_or_init(|| {
            self.fields
                .iter()
                .map(|f| ColumnBinding {
                    name: f.column_name.clone(),
                    nullable: f.nullable,
                    is_primary_key: f.is_primary_key,
                    kind: f.kind,
                    json: f.json,
                    binary_column: matches!(f.kind, Kind::Blob),
                })
                .collect()
        })
    }

    pub fn primary_key_columns(&self) -> Vec<&ColumnBinding> {
        self.bindings().iter().filter(|c| c.is_primary_key).collect()
    }

    pub fn has_primary_key(&self) -> bool {
        self.bindings().iter().any(|c| c.is_primary_key)
    }

    pub fn field_by_column(&self, column_name: &str) -> Option<&FieldBinding> {
        self.fields.iter().find(|f| f.column_name == column_name)
    }
}

/// Accumulates [`FieldBinding`]s one at a time before handing off to
/// [`Model::new`] for the duplicate-column check. A plain struct rather than
/// a `getset`-derived one: `Model`/`FieldBinding` are small and built once,
/// at registration time.
pub struct ModelBuilder {
    table: String,
    fields: Vec<FieldBinding>,
}

impl ModelBuilder {
    pub fn field(mut self, binding: FieldBinding) -> Self {
        self.fields.push(binding);
        self
    }

    pub fn build(self) -> CResult<Model> {
        Model::new(self.table, self.fields)
    }
}

/// Read-only-mostly mapping from logical table name to its [`Model`].
/// Single-writer/many-reader discipline via `RwLock`, flattened to one
/// level since the registry is a plain table-name → Model map.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    inner: Arc<RwLock<HashMap<String, Arc<Model>>>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, model: Model) -> CResult<()> {
        if model.fields.is_empty() {
            return Err(ReError::ConfigInvalid(format!(
                "model {} has no field bindings",
                model.table
            )));
        }
        let mut guard = self
            .inner
            .write()
            .map_err(|e| ReError::Bug(format!("model registry lock poisoned: {}", e)))?;
        guard.insert(model.table.clone(), Arc::new(model));
        Ok(())
    }

    pub fn unregister(&self, table: &str) -> CResult<bool> {
        let mut guard = self
            .inner
            .write()
            .map_err(|e| ReError::Bug(format!("model registry lock poisoned: {}", e)))?;
        Ok(guard.remove(table).is_some())
    }

    pub fn get(&self, table: &str) -> CResult<Option<Arc<Model>>> {
        let guard = self
            .inner
            .read()
            .map_err(|e| ReError::Bug(format!("model registry lock poisoned: {}", e)))?;
        Ok(guard.get(table).cloned())
    }

    pub fn table_names(&self) -> CResult<Vec<String>> {
        let guard = self
            .inner
            .read()
            .map_err(|e| ReError::Bug(format!("model registry lock poisoned: {}", e)))?;
        Ok(guard.keys().cloned().collect())
    }
}
