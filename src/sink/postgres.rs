//! PostgreSQL backend for [`Store`].
//!
//! Every write runs in its own transaction: a failed write leaves the table
//! as it was before that write. Rows are inserted with multi-row
//! `INSERT ... VALUES` statements, chunked to stay under PostgreSQL's limit
//! of 65535 bind parameters per statement.

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Postgres, QueryBuilder, Transaction};
use tracing::{debug, info};

use super::{ColumnDef, Store, TableData, Value, WriteMode};
use crate::error::StorageError;

const MAX_BIND_PARAMS: usize = 65_535;

pub struct PostgresStore {
    pool: sqlx::PgPool,
}

impl PostgresStore {
    /// Connects to `url` and verifies the connection with a round trip.
    pub async fn connect(url: &str) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new().max_connections(2).connect(url).await?;
        sqlx::query("SELECT 1").execute(&pool).await?;
        info!("Connected to database");
        Ok(Self { pool })
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn create_table_sql(name: &str, columns: &[ColumnDef], if_not_exists: bool) -> String {
    let cols: Vec<String> = columns
        .iter()
        .map(|c| format!("{} {}", quote_ident(c.name), c.sql_type.ddl()))
        .collect();
    format!(
        "CREATE TABLE {}{} ({})",
        if if_not_exists { "IF NOT EXISTS " } else { "" },
        quote_ident(name),
        cols.join(", ")
    )
}

fn drop_table_sql(name: &str) -> String {
    format!("DROP TABLE IF EXISTS {}", quote_ident(name))
}

fn insert_prefix(table: &TableData) -> String {
    let cols: Vec<String> = table.columns.iter().map(|c| quote_ident(c.name)).collect();
    format!("INSERT INTO {} ({}) ", quote_ident(&table.name), cols.join(", "))
}

async fn insert_rows_tx(
    table: &TableData,
    tx: &mut Transaction<'_, Postgres>,
) -> Result<u64, StorageError> {
    if table.is_empty() {
        return Ok(0);
    }

    let rows_per_statement = (MAX_BIND_PARAMS / table.columns.len().max(1)).max(1);
    let prefix = insert_prefix(table);
    let mut written = 0;

    for chunk in table.rows.chunks(rows_per_statement) {
        let mut query_builder: QueryBuilder<Postgres> = QueryBuilder::new(&prefix);
        query_builder.push_values(chunk, |mut b, row| {
            for value in row {
                match value {
                    Value::Text(v) => b.push_bind(v.clone()),
                    Value::BigInt(v) => b.push_bind(*v),
                    Value::Double(v) => b.push_bind(*v),
                    Value::Boolean(v) => b.push_bind(*v),
                    Value::Date(v) => b.push_bind(*v),
                    Value::Timestamp(v) => b.push_bind(*v),
                };
            }
        });
        let result = query_builder.build().execute(&mut **tx).await?;
        written += result.rows_affected();
        debug!(table = %table.name, rows = chunk.len(), "Inserted chunk");
    }

    Ok(written)
}

#[async_trait]
impl Store for PostgresStore {
    async fn write_table(&self, table: &TableData, mode: WriteMode) -> Result<u64, StorageError> {
        let mut tx = self.pool.begin().await?;

        match mode {
            WriteMode::Append => {
                sqlx::query(&create_table_sql(&table.name, table.columns, true))
                    .execute(&mut *tx)
                    .await?;
            }
            WriteMode::Replace => {
                sqlx::query(&drop_table_sql(&table.name))
                    .execute(&mut *tx)
                    .await?;
                sqlx::query(&create_table_sql(&table.name, table.columns, false))
                    .execute(&mut *tx)
                    .await?;
            }
        }

        let written = insert_rows_tx(table, &mut tx).await?;
        tx.commit().await?;
        Ok(written)
    }

    async fn reset_table(&self, name: &str, columns: &'static [ColumnDef]) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(&drop_table_sql(name)).execute(&mut *tx).await?;
        sqlx::query(&create_table_sql(name, columns, false))
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::rows::{SqlType, col};

    const COLUMNS: &[ColumnDef] = &[
        col("tanggal", SqlType::Date),
        col("route_code", SqlType::Text),
        col("total_amount", SqlType::BigInt),
    ];

    #[test]
    fn test_create_table_sql() {
        assert_eq!(
            create_table_sql("report_route", COLUMNS, false),
            r#"CREATE TABLE "report_route" ("tanggal" DATE, "route_code" TEXT, "total_amount" BIGINT)"#
        );
        assert!(create_table_sql("t", COLUMNS, true).starts_with("CREATE TABLE IF NOT EXISTS \"t\""));
    }

    #[test]
    fn test_quote_ident_escapes_quotes() {
        assert_eq!(quote_ident(r#"we"ird"#), r#""we""ird""#);
    }

    #[test]
    fn test_insert_prefix() {
        let table = TableData {
            name: "report_route".to_string(),
            columns: COLUMNS,
            rows: vec![],
        };
        assert_eq!(
            insert_prefix(&table),
            r#"INSERT INTO "report_route" ("tanggal", "route_code", "total_amount") "#
        );
    }
}
