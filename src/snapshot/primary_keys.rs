//! Primary key snapshots
//!
//! Built on the primary-keys metadata call: one row per key column, labelled
//! `TABLE_CAT`, `TABLE_SCHEM`, `TABLE_NAME`, `COLUMN_NAME`, `KEY_SEQ` and
//! `PK_NAME`.

use super::normalize::merge_objects;
use super::{qualified_name, table_query_arguments, Modifier, Scope, SnapshotLogic};
use crate::action::{MetadataOperation, QueryMetadataAction, SnapshotObjectsAction};
use crate::prelude::SnapshotError;
use crate::result::Row;
use crate::structure::{DatabaseObject, ObjectKind, PrimaryKey, PrimaryKeyColumn};

#[derive(Debug, Clone, Copy, Default)]
pub struct PrimaryKeysLogic;

impl SnapshotLogic for PrimaryKeysLogic {
    fn type_to_snapshot(&self) -> ObjectKind {
        ObjectKind::PrimaryKey
    }

    fn supported_related_kinds(&self) -> &'static [ObjectKind] {
        &[
            ObjectKind::PrimaryKey,
            ObjectKind::Relation,
            ObjectKind::Schema,
            ObjectKind::Catalog,
        ]
    }

    fn create_snapshot_action(
        &self,
        action: &SnapshotObjectsAction,
        scope: &Scope<'_>,
    ) -> Result<QueryMetadataAction, SnapshotError> {
        let arguments = table_query_arguments(action, scope)?;
        Ok(QueryMetadataAction::new(
            MetadataOperation::PrimaryKeys,
            arguments,
        ))
    }

    fn convert_to_object(
        &self,
        row: &Row,
        _action: &SnapshotObjectsAction,
        _scope: &Scope<'_>,
    ) -> Result<DatabaseObject, SnapshotError> {
        let catalog: Option<String> = row.get("TABLE_CAT")?;
        let schema: Option<String> = row.get("TABLE_SCHEM")?;
        let table_name: Option<String> = row.get("TABLE_NAME")?;
        let column_name: Option<String> = row.get("COLUMN_NAME")?;
        let position: Option<i32> = row.get("KEY_SEQ")?;
        let pk_name: Option<String> = row.get("PK_NAME")?;

        let table = qualified_name(catalog.as_deref(), schema.as_deref(), table_name.as_deref());
        let name = qualified_name(catalog.as_deref(), schema.as_deref(), pk_name.as_deref());

        Ok(PrimaryKey {
            name,
            columns: vec![PrimaryKeyColumn {
                column: table.child(column_name.as_deref()),
                position,
            }],
            table,
        }
        .into())
    }

    fn modifier(&self) -> Modifier {
        merge_objects::<PrimaryKey>
    }

    fn include(&self, object: &DatabaseObject, action: &SnapshotObjectsAction) -> bool {
        if action.related_to.kind != ObjectKind::PrimaryKey {
            return true;
        }
        match action.related_to.simple_name() {
            Some(wanted) => object.name().name() == Some(wanted),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::name::ObjectName;
    use crate::snapshot::testing::CannedExecutor;
    use crate::snapshot::{DatabaseProfile, LogicRegistry};
    use crate::structure::ObjectReference;

    fn pk_row(table: &str, column: &str, position: Option<i32>, pk_name: Option<&str>) -> Row {
        Row::new()
            .with("TABLE_CAT", "shop")
            .with("TABLE_SCHEM", "app")
            .with("TABLE_NAME", table)
            .with("COLUMN_NAME", column)
            .with("KEY_SEQ", position)
            .with("PK_NAME", pk_name)
    }

    fn snapshot(rows: Vec<Row>, related_to: ObjectReference) -> (Vec<PrimaryKey>, CannedExecutor) {
        let database = DatabaseProfile::new("testdb", 2);
        let mut executor = CannedExecutor::returning(rows);
        let action = SnapshotObjectsAction::new(ObjectKind::PrimaryKey, related_to);
        let result = {
            let mut scope = Scope::new(&database, &mut executor);
            LogicRegistry::with_builtins()
                .snapshot(&action, &mut scope)
                .unwrap()
        };
        (result.as_list::<PrimaryKey>(), executor)
    }

    #[test]
    fn test_composite_key_ordered_by_key_seq() {
        let schema = ObjectName::new([Some("shop"), Some("app")]);
        let (keys, executor) = snapshot(
            vec![
                pk_row("order_lines", "line_no", Some(2), Some("pk_order_lines")),
                pk_row("order_lines", "order_id", Some(1), Some("pk_order_lines")),
                pk_row("orders", "id", Some(1), Some("pk_orders")),
            ],
            ObjectReference::new(ObjectKind::Schema, schema),
        );

        assert_eq!(
            executor.received[0],
            QueryMetadataAction::new(
                MetadataOperation::PrimaryKeys,
                [Some("shop".to_string()), Some("app".to_string()), None],
            )
        );
        assert_eq!(keys.len(), 2);
        let columns: Vec<_> = keys[0]
            .columns
            .iter()
            .map(|c| c.column.name().unwrap_or_default())
            .collect();
        assert_eq!(columns, vec!["order_id", "line_no"]);
        assert_eq!(
            keys[0].table,
            ObjectName::new([Some("shop"), Some("app"), Some("order_lines")])
        );
    }

    #[test]
    fn test_unnamed_keys_stay_separate_per_table() {
        let (keys, _) = snapshot(
            vec![
                pk_row("a", "id", Some(1), None),
                pk_row("b", "id", Some(1), None),
            ],
            ObjectReference::new(ObjectKind::Catalog, "shop".into()),
        );
        assert_eq!(keys.len(), 2);
        assert!(keys.iter().all(|k| k.name.name().is_none()));
    }

    #[test]
    fn test_primary_key_scope_filters_by_name() {
        let name = ObjectName::new([Some("shop"), Some("app"), Some("pk_orders")]);
        let (keys, _) = snapshot(
            vec![
                pk_row("order_lines", "order_id", Some(1), Some("pk_order_lines")),
                pk_row("orders", "id", Some(1), Some("pk_orders")),
            ],
            ObjectReference::new(ObjectKind::PrimaryKey, name.clone()),
        );
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].name, name);
    }
}
