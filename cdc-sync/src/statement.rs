use cdc_common::err::{CResult, ReError};
use cdc_common::model::ColumnBinding;

/// The five prepared-statement shapes the Syncer caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Insert,
    UpdateByPk,
    UpdateWhere,
    DeleteByPk,
    DeleteWhere,
}

fn placeholder(column: &ColumnBinding) -> &'static str {
    if column.binary_column {
        "CONVERT(VARBINARY(MAX),?)"
    } else {
        "?"
    }
}

fn pk_clause(columns: &[ColumnBinding]) -> CResult<String> {
    let pk_columns: Vec<&ColumnBinding> = columns.iter().filter(|c| c.is_primary_key).collect();
    if pk_columns.is_empty() {
        return Err(ReError::NoPrimaryKey(
            "no primary-key column declared for this model".into(),
        ));
    }
    Ok(pk_columns
        .iter()
        .map(|c| format!("{}=?", c.name))
        .collect::<Vec<_>>()
        .join(" AND "))
}

/// `insert into T (c1,…,cN) values (p1,…,pN)`.
pub fn build_insert(table: &str, columns: &[ColumnBinding]) -> String {
    let names = columns.iter().map(|c| c.name.as_str()).collect::<Vec<_>>().join(",");
    let placeholders = columns.iter().map(placeholder).collect::<Vec<_>>().join(",");
    format!("insert into {} ({}) values ({})", table, names, placeholders)
}

fn set_clause(columns: &[ColumnBinding]) -> String {
    columns
        .iter()
        .map(|c| format!("{}={}", c.name, placeholder(c)))
        .collect::<Vec<_>>()
        .join(",")
}

/// `update T set c1=p1,…,cN=pN where <userClause>`; params are
/// `[newValues..., userArgs...]` at bind time.
pub fn build_update_where(table: &str, columns: &[ColumnBinding], where_clause: &str) -> String {
    format!("update {} set {} where {}", table, set_clause(columns), where_clause)
}

/// `update T set c1=p1,…,cN=pN where pk1=? AND pk2=? …`; fails with
/// `NoPrimaryKey` if the model declares no primary-key column.
pub fn build_update_by_pk(table: &str, columns: &[ColumnBinding]) -> CResult<String> {
    let clause = pk_clause(columns)?;
    Ok(format!("update {} set {} where {}", table, set_clause(columns), clause))
}

/// `delete from T where <userClause>`.
pub fn build_delete_where(table: &str, where_clause: &str) -> String {
    format!("delete from {} where {}", table, where_clause)
}

/// `delete from T where pk1=? AND pk2=?…`; fails with `NoPrimaryKey` if the
/// model declares no primary-key column. The original driver built this
/// same statement from the full column list and only filtered to PK columns
/// inside the loop — when none were marked primary key the `where` clause
/// came out empty after its trailing-`AND` trim, producing an unbounded
/// delete. Failing the build instead is the fix noted in the design notes.
pub fn build_delete_by_pk(table: &str, columns: &[ColumnBinding]) -> CResult<String> {
    let clause = pk_clause(columns)?;
    Ok(format!("delete from {} where {}", table, clause))
}

#[cfg(test)]
mod tests {
    use cdc_common::value::Kind;

    use super::*;

    fn columns() -> Vec<ColumnBinding> {
        vec![
            ColumnBinding {
                name: "id".into(),
                nullable: false,
                is_primary_key: true,
                kind: Kind::Int,
                json: false,
                binary_column: false,
            },
            ColumnBinding {
                name: "name".into(),
                nullable: false,
                is_primary_key: false,
                kind: Kind::Str,
                json: false,
                binary_column: false,
            },
        ]
    }

    #[test]
    fn insert_statement_matches_scenario_one_shape() {
        let cols = vec![ColumnBinding {
            name: "blob_col".into(),
            nullable: false,
            is_primary_key: false,
            kind: Kind::Blob,
            json: false,
            binary_column: true,
        }];
        assert_eq!(
            build_insert("staff", &cols),
            "insert into staff (blob_col) values (CONVERT(VARBINARY(MAX),?))"
        );
    }

    #[test]
    fn update_by_pk_matches_scenario_two() {
        let stmt = build_update_by_pk("staff", &columns()).unwrap();
        assert_eq!(stmt, "update staff set id=?,name=? where id=?");
    }

    #[test]
    fn update_by_pk_fails_without_primary_key() {
        let cols = vec![ColumnBinding {
            name: "name".into(),
            nullable: false,
            is_primary_key: false,
            kind: Kind::Str,
            json: false,
            binary_column: false,
        }];
        assert!(matches!(build_update_by_pk("staff", &cols), Err(ReError::NoPrimaryKey(_))));
    }

    #[test]
    fn delete_by_pk_fails_without_primary_key() {
        let cols = vec![ColumnBinding {
            name: "name".into(),
            nullable: false,
            is_primary_key: false,
            kind: Kind::Str,
            json: false,
            binary_column: false,
        }];
        assert!(matches!(build_delete_by_pk("staff", &cols), Err(ReError::NoPrimaryKey(_))));
    }

    #[test]
    fn delete_by_pk_uses_only_pk_columns() {
        let stmt = build_delete_by_pk("staff", &columns()).unwrap();
        assert_eq!(stmt, "delete from staff where id=?");
    }
}
