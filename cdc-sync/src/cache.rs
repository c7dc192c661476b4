use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use cdc_common::err::CResult;
use cdc_common::model::Model;

use crate::connection::{PreparedStatement, TargetConnection};
use crate::statement;
use crate::statement::Operation;

/// Lazily-built, per-`(operation, table)` prepared-statement cache, owned
/// solely by the drain task for the Syncer's lifetime. Builder
/// output is deterministic given the same column list, so caching on this
/// key is safe even across repeated drain passes.
pub struct StatementCache {
    connection: Arc<dyn TargetConnection>,
    statements: Mutex<HashMap<(Operation, String), Arc<dyn PreparedStatement>>>,
}

impl StatementCache {
    pub fn new(connection: Arc<dyn TargetConnection>) -> Self {
        StatementCache {
            connection,
            statements: Mutex::new(HashMap::new()),
        }
    }

    async fn get_or_prepare(
        &self,
        operation: Operation,
        model: &Model,
        build: impl FnOnce() -> CResult<String>,
    ) -> CResult<Arc<dyn PreparedStatement>> {
        let key = (operation, model.table.clone());
        let mut guard = self.statements.lock().await;
        if let Some(existing) = guard.get(&key) {
            return Ok(Arc::clone(existing));
        }
        let sql = build()?;
        let prepared: Arc<dyn PreparedStatement> = Arc::from(self.connection.prepare(&sql).await?);
        guard.insert(key, Arc::clone(&prepared));
        Ok(prepared)
    }

    pub async fn insert_statement(&self, model: &Model) -> CResult<Arc<dyn PreparedStatement>> {
        self.get_or_prepare(Operation::Insert, model, || {
            Ok(statement::build_insert(&model.table, model.bindings()))
        })
        .await
    }

    pub async fn update_by_pk_statement(&self, model: &Model) -> CResult<Arc<dyn PreparedStatement>> {
        self.get_or_prepare(Operation::UpdateByPk, model, || {
            statement::build_update_by_pk(&model.table, model.bindings())
        })
        .await
    }

    pub async fn delete_by_pk_statement(&self, model: &Model) -> CResult<Arc<dyn PreparedStatement>> {
        self.get_or_prepare(Operation::DeleteByPk, model, || {
            statement::build_delete_by_pk(&model.table, model.bindings())
        })
        .await
    }

    pub async fn update_where_statement(
        &self,
        model: &Model,
        where_clause: &str,
    ) -> CResult<Arc<dyn PreparedStatement>> {
        self.get_or_prepare(Operation::UpdateWhere, model, || {
            Ok(statement::build_update_where(&model.table, model.bindings(), where_clause))
        })
        .await
    }

    pub async fn delete_where_statement(
        &self,
        model: &Model,
        where_clause: &str,
    ) -> CResult<Arc<dyn PreparedStatement>> {
        self.get_or_prepare(Operation::DeleteWhere, model, || {
            Ok(statement::build_delete_where(&model.table, where_clause))
        })
        .await
    }

    /// Releases every cached statement. Must run before the underlying
    /// connection is closed.
    pub async fn clear(&self) {
        self.statements.lock().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use cdc_common::model::FieldBinding;
    use cdc_common::value::Kind;

    use super::*;
    use crate::connection::mock::MockConnection;

    fn model() -> Model {
        Model::new(
            "staff",
            vec![FieldBinding::new("id", "id", Kind::Int).primary_key()],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn repeated_lookups_prepare_only_once() {
        let conn = Arc::new(MockConnection::new());
        let cache = StatementCache::new(conn.clone());
        let m = model();
        cache.insert_statement(&m).await.unwrap();
        cache.insert_statement(&m).await.unwrap();
        assert_eq!(conn.prepared.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn distinct_operations_prepare_distinct_statements() {
        let conn = Arc::new(MockConnection::new());
        let cache = StatementCache::new(conn.clone());
        let m = model();
        cache.insert_statement(&m).await.unwrap();
        cache.update_by_pk_statement(&m).await.unwrap();
        cache.delete_by_pk_statement(&m).await.unwrap();
        assert_eq!(conn.prepared.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn update_by_pk_without_primary_key_fails_without_preparing() {
        let conn = Arc::new(MockConnection::new());
        let cache = StatementCache::new(conn.clone());
        let m = Model::new("t", vec![FieldBinding::new("name", "name", Kind::Str)]).unwrap();
        let result = cache.update_by_pk_statement(&m).await;
        assert!(result.is_err());
        assert!(conn.prepared.lock().unwrap().is_empty());
    }
}
