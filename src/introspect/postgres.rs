use postgres::types::Type;
use postgres::Client;
use tracing::{debug, error, trace};

use super::MetadataExecutor;
use crate::action::{MetadataOperation, QueryMetadataAction};
use crate::prelude::SnapshotError;
use crate::result::{Row, RowBasedResult, Value};

/// Foreign keys with one row per key column, labelled like imported-keys metadata
///
/// `$1` matches the current database, `$2` the referencing schema and `$3` the
/// referencing table; a NULL parameter matches everything.
const IMPORTED_KEYS_SQL: &str = r#"
    SELECT
        current_database()::text AS "PKTABLE_CAT",
        pns.nspname::text AS "PKTABLE_SCHEM",
        pc.relname::text AS "PKTABLE_NAME",
        pa.attname::text AS "PKCOLUMN_NAME",
        current_database()::text AS "FKTABLE_CAT",
        fns.nspname::text AS "FKTABLE_SCHEM",
        fc.relname::text AS "FKTABLE_NAME",
        fa.attname::text AS "FKCOLUMN_NAME",
        k.pos::int4 AS "KEY_SEQ",
        (CASE con.confupdtype
            WHEN 'c' THEN 0 WHEN 'r' THEN 1 WHEN 'n' THEN 2 WHEN 'a' THEN 3 WHEN 'd' THEN 4
        END)::int2 AS "UPDATE_RULE",
        (CASE con.confdeltype
            WHEN 'c' THEN 0 WHEN 'r' THEN 1 WHEN 'n' THEN 2 WHEN 'a' THEN 3 WHEN 'd' THEN 4
        END)::int2 AS "DELETE_RULE",
        con.conname::text AS "FK_NAME",
        (CASE
            WHEN con.condeferrable AND con.condeferred THEN 5
            WHEN con.condeferrable THEN 6
            ELSE 7
        END)::int2 AS "DEFERRABILITY"
    FROM pg_constraint con
    JOIN pg_class fc ON fc.oid = con.conrelid
    JOIN pg_namespace fns ON fns.oid = fc.relnamespace
    JOIN pg_class pc ON pc.oid = con.confrelid
    JOIN pg_namespace pns ON pns.oid = pc.relnamespace
    CROSS JOIN LATERAL unnest(con.conkey, con.confkey) WITH ORDINALITY AS k(fk_attnum, pk_attnum, pos)
    JOIN pg_attribute fa ON fa.attrelid = fc.oid AND fa.attnum = k.fk_attnum
    JOIN pg_attribute pa ON pa.attrelid = pc.oid AND pa.attnum = k.pk_attnum
    WHERE con.contype = 'f'
        AND ($1::text IS NULL OR current_database() = $1::text)
        AND ($2::text IS NULL OR fns.nspname = $2::text)
        AND ($3::text IS NULL OR fc.relname = $3::text)
    ORDER BY fns.nspname, fc.relname, con.conname, k.pos
"#;

/// Primary key columns, labelled like primary-keys metadata
const PRIMARY_KEYS_SQL: &str = r#"
    SELECT
        current_database()::text AS "TABLE_CAT",
        n.nspname::text AS "TABLE_SCHEM",
        c.relname::text AS "TABLE_NAME",
        a.attname::text AS "COLUMN_NAME",
        k.pos::int2 AS "KEY_SEQ",
        con.conname::text AS "PK_NAME"
    FROM pg_constraint con
    JOIN pg_class c ON c.oid = con.conrelid
    JOIN pg_namespace n ON n.oid = c.relnamespace
    CROSS JOIN LATERAL unnest(con.conkey) WITH ORDINALITY AS k(attnum, pos)
    JOIN pg_attribute a ON a.attrelid = c.oid AND a.attnum = k.attnum
    WHERE con.contype = 'p'
        AND ($1::text IS NULL OR current_database() = $1::text)
        AND ($2::text IS NULL OR n.nspname = $2::text)
        AND ($3::text IS NULL OR c.relname = $3::text)
    ORDER BY n.nspname, c.relname, k.pos
"#;

/// PostgreSQL metadata executor
///
/// Expects three-slot arguments laid out for two container levels: slot 0 is
/// the database, slot 1 the schema. See [`DbConfig::ensure_postgres_compatible`].
///
/// [`DbConfig::ensure_postgres_compatible`]: crate::config::DbConfig::ensure_postgres_compatible
pub struct PostgresExecutor<'a> {
    client: &'a mut Client,
}

impl<'a> PostgresExecutor<'a> {
    pub fn new(client: &'a mut Client) -> Self {
        Self { client }
    }
}

impl MetadataExecutor for PostgresExecutor<'_> {
    fn query_metadata(
        &mut self,
        action: &QueryMetadataAction,
    ) -> Result<RowBasedResult, SnapshotError> {
        let sql = match action.operation() {
            MetadataOperation::ImportedKeys => IMPORTED_KEYS_SQL,
            MetadataOperation::PrimaryKeys => PRIMARY_KEYS_SQL,
        };

        let catalog = action.argument(0);
        let schema = action.argument(1);
        let table = action.argument(2);
        trace!(
            operation = %action.operation(),
            catalog = ?catalog,
            schema = ?schema,
            table = ?table,
            "Querying metadata"
        );

        let rows = self
            .client
            .query(sql, &[&catalog, &schema, &table])
            .map_err(|e| {
                error!(operation = %action.operation(), error = ?e, "Metadata query failed");
                SnapshotError::Execution {
                    operation: action.operation().to_string(),
                    message: e.to_string(),
                }
            })?;

        debug!(operation = %action.operation(), rows = rows.len(), "Metadata rows fetched");
        rows.iter().map(convert_row).collect()
    }
}

/// Copy a driver row into a labelled metadata row
fn convert_row(row: &postgres::Row) -> Result<Row, SnapshotError> {
    let mut converted = Row::new();

    for (idx, column) in row.columns().iter().enumerate() {
        let label = column.name();
        let ty = column.type_();

        let value = if *ty == Type::TEXT || *ty == Type::VARCHAR || *ty == Type::NAME {
            Value::from(row.try_get::<_, Option<String>>(idx).map_err(|e| decode_error(label, e))?)
        } else if *ty == Type::INT2 {
            Value::from(row.try_get::<_, Option<i16>>(idx).map_err(|e| decode_error(label, e))?)
        } else if *ty == Type::INT4 {
            Value::from(row.try_get::<_, Option<i32>>(idx).map_err(|e| decode_error(label, e))?)
        } else if *ty == Type::INT8 {
            Value::from(row.try_get::<_, Option<i64>>(idx).map_err(|e| decode_error(label, e))?)
        } else if *ty == Type::BOOL {
            Value::from(row.try_get::<_, Option<bool>>(idx).map_err(|e| decode_error(label, e))?)
        } else {
            return Err(SnapshotError::Decode {
                column: label.to_string(),
                message: format!("unsupported column type {}", ty),
            });
        };

        converted.insert(label, value);
    }

    Ok(converted)
}

fn decode_error(column: &str, e: postgres::Error) -> SnapshotError {
    SnapshotError::Decode {
        column: column.to_string(),
        message: e.to_string(),
    }
}
