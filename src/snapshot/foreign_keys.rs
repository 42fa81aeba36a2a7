//! Foreign key snapshots
//!
//! Built on the imported-keys metadata call, which reports one row per key
//! column using the JDBC column labels and vendor codes.

use tracing::warn;

use super::normalize::merge_objects;
use super::{qualified_name, table_query_arguments, Modifier, Scope, SnapshotLogic};
use crate::action::{MetadataOperation, QueryMetadataAction, SnapshotObjectsAction};
use crate::name::ObjectName;
use crate::prelude::SnapshotError;
use crate::result::Row;
use crate::structure::{
    DatabaseObject, Deferrability, ForeignKey, ForeignKeyColumnCheck, ForeignKeyRule, ObjectKind,
};

// Vendor codes for UPDATE_RULE / DELETE_RULE
const IMPORTED_KEY_CASCADE: i64 = 0;
const IMPORTED_KEY_RESTRICT: i64 = 1;
const IMPORTED_KEY_SET_NULL: i64 = 2;
const IMPORTED_KEY_NO_ACTION: i64 = 3;
const IMPORTED_KEY_SET_DEFAULT: i64 = 4;

// Vendor codes for DEFERRABILITY
const IMPORTED_KEY_INITIALLY_DEFERRED: i64 = 5;
const IMPORTED_KEY_INITIALLY_IMMEDIATE: i64 = 6;
const IMPORTED_KEY_NOT_DEFERRABLE: i64 = 7;

/// Decode an update/delete rule code
pub fn rule_from_code(code: i64) -> Option<ForeignKeyRule> {
    match code {
        IMPORTED_KEY_NO_ACTION => Some(ForeignKeyRule::NoAction),
        IMPORTED_KEY_CASCADE => Some(ForeignKeyRule::Cascade),
        IMPORTED_KEY_SET_NULL => Some(ForeignKeyRule::SetNull),
        IMPORTED_KEY_SET_DEFAULT => Some(ForeignKeyRule::SetDefault),
        IMPORTED_KEY_RESTRICT => Some(ForeignKeyRule::Restrict),
        _ => None,
    }
}

/// Decode a deferrability code
pub fn deferrability_from_code(code: i64) -> Option<Deferrability> {
    match code {
        IMPORTED_KEY_INITIALLY_DEFERRED => Some(Deferrability::InitiallyDeferred),
        IMPORTED_KEY_INITIALLY_IMMEDIATE => Some(Deferrability::InitiallyImmediate),
        IMPORTED_KEY_NOT_DEFERRABLE => Some(Deferrability::NotDeferrable),
        _ => None,
    }
}

/// Read a vendor code column
///
/// Codes are advisory: a value that is not an integer reads as unset instead
/// of failing the row.
fn code_column(row: &Row, label: &str, foreign_key: &ObjectName) -> Option<i64> {
    match row.get::<i64>(label) {
        Ok(code) => code,
        Err(e) => {
            warn!(
                foreign_key = %foreign_key,
                column = label,
                error = %e,
                "Unreadable code, leaving unset"
            );
            None
        }
    }
}

/// Snapshots foreign keys within a catalog, schema, table or by key name
#[derive(Debug, Clone, Copy, Default)]
pub struct ForeignKeysLogic;

impl SnapshotLogic for ForeignKeysLogic {
    fn type_to_snapshot(&self) -> ObjectKind {
        ObjectKind::ForeignKey
    }

    fn supported_related_kinds(&self) -> &'static [ObjectKind] {
        &[
            ObjectKind::ForeignKey,
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
            MetadataOperation::ImportedKeys,
            arguments,
        ))
    }

    fn convert_to_object(
        &self,
        row: &Row,
        _action: &SnapshotObjectsAction,
        _scope: &Scope<'_>,
    ) -> Result<DatabaseObject, SnapshotError> {
        let pk_table_cat: Option<String> = row.get("PKTABLE_CAT")?;
        let pk_table_schema: Option<String> = row.get("PKTABLE_SCHEM")?;
        let pk_table_name: Option<String> = row.get("PKTABLE_NAME")?;
        let pk_column_name: Option<String> = row.get("PKCOLUMN_NAME")?;

        let fk_table_cat: Option<String> = row.get("FKTABLE_CAT")?;
        let fk_table_schema: Option<String> = row.get("FKTABLE_SCHEM")?;
        let fk_table_name: Option<String> = row.get("FKTABLE_NAME")?;
        let fk_column_name: Option<String> = row.get("FKCOLUMN_NAME")?;

        let position: Option<i32> = row.get("KEY_SEQ")?;
        let fk_name: Option<String> = row.get("FK_NAME")?;

        let name = qualified_name(
            fk_table_cat.as_deref(),
            fk_table_schema.as_deref(),
            fk_name.as_deref(),
        );
        let fk_table = qualified_name(
            fk_table_cat.as_deref(),
            fk_table_schema.as_deref(),
            fk_table_name.as_deref(),
        );
        let pk_table = qualified_name(
            pk_table_cat.as_deref(),
            pk_table_schema.as_deref(),
            pk_table_name.as_deref(),
        );

        let mut fk = ForeignKey::new(name);
        fk.column_checks.push(ForeignKeyColumnCheck {
            base_column: fk_table.child(fk_column_name.as_deref()),
            referenced_column: pk_table.child(pk_column_name.as_deref()),
            position,
        });

        let update_rule = code_column(row, "UPDATE_RULE", &fk.name);
        let delete_rule = code_column(row, "DELETE_RULE", &fk.name);
        let deferrability = code_column(row, "DEFERRABILITY", &fk.name);

        fk.update_rule = update_rule.and_then(|code| {
            let rule = rule_from_code(code);
            if rule.is_none() {
                warn!(foreign_key = %fk.name, code, "Unrecognized UPDATE_RULE, leaving unset");
            }
            rule
        });
        fk.delete_rule = delete_rule.and_then(|code| {
            let rule = rule_from_code(code);
            if rule.is_none() {
                warn!(foreign_key = %fk.name, code, "Unrecognized DELETE_RULE, leaving unset");
            }
            rule
        });
        fk.deferrability = deferrability.and_then(|code| {
            let value = deferrability_from_code(code);
            if value.is_none() {
                warn!(foreign_key = %fk.name, code, "Unrecognized DEFERRABILITY, leaving unset");
            }
            value
        });

        Ok(fk.into())
    }

    fn modifier(&self) -> Modifier {
        merge_objects::<ForeignKey>
    }

    fn include(&self, object: &DatabaseObject, action: &SnapshotObjectsAction) -> bool {
        if action.related_to.kind != ObjectKind::ForeignKey {
            return true;
        }
        match action.related_to.simple_name() {
            Some(wanted) => object.name().name() == Some(wanted),
            None => true,
        }
    }
}
