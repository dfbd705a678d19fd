use serde_json::{Map, Value};
use sqlx::{postgres::PgRow, FromRow, PgPool};
use uuid::Uuid;

use crate::database::manager::{DatabaseError, DatabaseManager};

/// Thin typed access to a single table keyed by `id uuid`
pub struct Repository<'a, T> {
    table_name: &'static str,
    columns: &'static str,
    pool: &'a PgPool,
    _phantom: std::marker::PhantomData<T>,
}

impl<'a, T> Repository<'a, T>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    pub fn new(table_name: &'static str, pool: &'a PgPool) -> Result<Self, DatabaseError> {
        Self::with_columns(table_name, "*", pool)
    }

    /// `columns` is a static select list, used where enum columns need a `::text` cast
    pub fn with_columns(
        table_name: &'static str,
        columns: &'static str,
        pool: &'a PgPool,
    ) -> Result<Self, DatabaseError> {
        check_identifier(table_name)?;
        Ok(Self {
            table_name,
            columns,
            pool,
            _phantom: std::marker::PhantomData,
        })
    }

    pub async fn select_one(&self, id: Uuid) -> Result<Option<T>, DatabaseError> {
        let sql = format!("SELECT {} FROM \"{}\" WHERE id = $1", self.columns, self.table_name);
        let row = sqlx::query_as::<_, T>(&sql).bind(id).fetch_optional(self.pool).await?;
        Ok(row)
    }

    /// All rows ordered by `order_by`, optionally restricted to `column = value`
    pub async fn select_all(
        &self,
        filter: Option<(&str, Uuid)>,
        order_by: &str,
    ) -> Result<Vec<T>, DatabaseError> {
        check_identifier(order_by)?;
        let rows = match filter {
            Some((column, value)) => {
                check_identifier(column)?;
                let sql = format!(
                    "SELECT {} FROM \"{}\" WHERE \"{}\" = $1 ORDER BY \"{}\"",
                    self.columns, self.table_name, column, order_by
                );
                sqlx::query_as::<_, T>(&sql).bind(value).fetch_all(self.pool).await?
            }
            None => {
                let sql = format!("SELECT {} FROM \"{}\" ORDER BY \"{}\"", self.columns, self.table_name, order_by);
                sqlx::query_as::<_, T>(&sql).fetch_all(self.pool).await?
            }
        };
        Ok(rows)
    }

    pub async fn count_where(&self, column: &str, value: Uuid) -> Result<i64, DatabaseError> {
        count_where(self.pool, self.table_name, column, value).await
    }

    /// Returns the number of rows removed
    pub async fn delete(&self, id: Uuid) -> Result<u64, DatabaseError> {
        let sql = format!("DELETE FROM \"{}\" WHERE id = $1", self.table_name);
        let result = sqlx::query(&sql).bind(id).execute(self.pool).await?;
        Ok(result.rows_affected())
    }
}

/// Whole row as a JSON object, for pass-through responses
pub async fn select_json(
    pool: &PgPool,
    table_name: &str,
    id: Uuid,
) -> Result<Option<Map<String, Value>>, DatabaseError> {
    check_identifier(table_name)?;
    let sql = format!("SELECT row_to_json(t) AS row FROM \"{}\" t WHERE t.id = $1", table_name);
    let row: Option<Value> = sqlx::query_scalar(&sql).bind(id).fetch_optional(pool).await?;
    Ok(row.and_then(into_object))
}

/// Insert one row from a JSON object. Values are coerced to the column types
/// by `json_populate_record`, so enum and jsonb columns need no casts; columns
/// not present in `record` keep their defaults.
pub async fn insert_json(
    pool: &PgPool,
    table_name: &str,
    record: &Map<String, Value>,
) -> Result<Map<String, Value>, DatabaseError> {
    check_identifier(table_name)?;
    let columns = column_list(record)?;
    if columns.is_empty() {
        return Err(DatabaseError::InvalidIdentifier("(no columns)".to_string()));
    }
    let quoted: Vec<String> = columns.iter().map(|c| format!("\"{}\"", c)).collect();
    let projected: Vec<String> = columns.iter().map(|c| format!("r.\"{}\"", c)).collect();
    let sql = format!(
        "INSERT INTO \"{table}\" AS t ({cols}) SELECT {vals} FROM json_populate_record(NULL::\"{table}\", $1::json) AS r \
         RETURNING row_to_json(t) AS row",
        table = table_name,
        cols = quoted.join(", "),
        vals = projected.join(", "),
    );
    let row: Value = sqlx::query_scalar(&sql)
        .bind(Value::Object(record.clone()))
        .fetch_one(pool)
        .await?;
    into_object(row).ok_or_else(|| DatabaseError::NotFound(table_name.to_string()))
}

/// Update the listed columns of one row and stamp `updated_at`. `None` when
/// no row has that id.
pub async fn update_json(
    pool: &PgPool,
    table_name: &str,
    id: Uuid,
    changes: &Map<String, Value>,
) -> Result<Option<Map<String, Value>>, DatabaseError> {
    check_identifier(table_name)?;
    let columns = column_list(changes)?;
    let mut assignments: Vec<String> = columns
        .iter()
        .filter(|c| **c != "updated_at")
        .map(|c| format!("\"{c}\" = r.\"{c}\""))
        .collect();
    assignments.push("\"updated_at\" = now()".to_string());

    let sql = format!(
        "UPDATE \"{table}\" AS t SET {set} FROM json_populate_record(NULL::\"{table}\", $1::json) AS r \
         WHERE t.id = $2 RETURNING row_to_json(t) AS row",
        table = table_name,
        set = assignments.join(", "),
    );
    let row: Option<Value> = sqlx::query_scalar(&sql)
        .bind(Value::Object(changes.clone()))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.and_then(into_object))
}

fn column_list(record: &Map<String, Value>) -> Result<Vec<&str>, DatabaseError> {
    record
        .keys()
        .map(|key| -> Result<&str, DatabaseError> {
            check_identifier(key)?;
            Ok(key.as_str())
        })
        .collect()
}

fn into_object(value: Value) -> Option<Map<String, Value>> {
    match value {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

/// `SELECT COUNT(*)` for tables that have no typed model here (content, workflows)
pub async fn count_where(
    pool: &PgPool,
    table_name: &str,
    column: &str,
    value: Uuid,
) -> Result<i64, DatabaseError> {
    check_identifier(table_name)?;
    check_identifier(column)?;
    let sql = format!("SELECT COUNT(*) FROM \"{}\" WHERE \"{}\" = $1", table_name, column);
    let count: i64 = sqlx::query_scalar(&sql).bind(value).fetch_one(pool).await?;
    Ok(count)
}

fn check_identifier(name: &str) -> Result<(), DatabaseError> {
    if DatabaseManager::is_valid_identifier(name) {
        Ok(())
    } else {
        Err(DatabaseError::InvalidIdentifier(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn column_list_rejects_unsafe_keys() {
        let ok = json!({"claim_text": "x", "country_code": "GB"});
        let mut cols = column_list(ok.as_object().unwrap()).unwrap();
        cols.sort();
        assert_eq!(cols, vec!["claim_text", "country_code"]);

        let bad = json!({"name\"; DROP TABLE brands; --": 1});
        assert!(matches!(
            column_list(bad.as_object().unwrap()),
            Err(DatabaseError::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn only_objects_become_rows() {
        assert!(into_object(json!({"id": 1})).is_some());
        assert!(into_object(json!([1])).is_none());
        assert!(into_object(Value::Null).is_none());
    }
}
