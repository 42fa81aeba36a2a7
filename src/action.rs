//! Action descriptors
//!
//! Actions are plain data describing what should happen. They carry no
//! execution logic; the snapshot logic and the metadata executor give them
//! meaning.

use std::fmt;

use crate::name::ObjectName;
use crate::structure::{
    Column, ForeignKey, ObjectKind, ObjectReference, PrimaryKey, Table, UniqueConstraint,
};

/// Request to snapshot all objects of `kind` found within `related_to`
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotObjectsAction {
    pub kind: ObjectKind,
    pub related_to: ObjectReference,
}

impl SnapshotObjectsAction {
    pub fn new(kind: ObjectKind, related_to: ObjectReference) -> Self {
        Self { kind, related_to }
    }
}

impl fmt::Display for SnapshotObjectsAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "snapshot {} in {}", self.kind, self.related_to)
    }
}

/// Metadata calls understood by executors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataOperation {
    /// Foreign keys declared on the matching tables
    ImportedKeys,
    /// Primary key columns of the matching tables
    PrimaryKeys,
}

impl MetadataOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            MetadataOperation::ImportedKeys => "getImportedKeys",
            MetadataOperation::PrimaryKeys => "getPrimaryKeys",
        }
    }
}

impl fmt::Display for MetadataOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw metadata query: an operation plus positional arguments
///
/// Arguments follow the catalog, schema, table convention. `None` means the
/// position is not constrained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryMetadataAction {
    operation: MetadataOperation,
    arguments: Vec<Option<String>>,
}

impl QueryMetadataAction {
    pub fn new<I>(operation: MetadataOperation, arguments: I) -> Self
    where
        I: IntoIterator<Item = Option<String>>,
    {
        Self {
            operation,
            arguments: arguments.into_iter().collect(),
        }
    }

    pub fn operation(&self) -> MetadataOperation {
        self.operation
    }

    pub fn arguments(&self) -> &[Option<String>] {
        &self.arguments
    }

    /// Positional argument, `None` when unset or out of range
    pub fn argument(&self, index: usize) -> Option<&str> {
        self.arguments.get(index).and_then(|a| a.as_deref())
    }
}

impl fmt::Display for QueryMetadataAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let args: Vec<&str> = self
            .arguments
            .iter()
            .map(|a| a.as_deref().unwrap_or("null"))
            .collect();
        write!(f, "{}({})", self.operation, args.join(", "))
    }
}

/// Description of a table to create, accumulated in declaration order
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTableAction {
    pub table: Table,
    pub columns: Vec<Column>,
    pub primary_key: Option<PrimaryKey>,
    pub foreign_keys: Vec<ForeignKey>,
    pub unique_constraints: Vec<UniqueConstraint>,
}

impl CreateTableAction {
    pub fn new(table: Table) -> Self {
        Self {
            table,
            columns: Vec::new(),
            primary_key: None,
            foreign_keys: Vec::new(),
            unique_constraints: Vec::new(),
        }
    }

    /// Add a column named relative to the table
    pub fn add_column(self, column_name: &str, type_name: &str) -> Self {
        let name = self.table.name.child(Some(column_name));
        self.add_column_def(Column::new(name, type_name))
    }

    pub fn add_qualified_column(self, column_name: ObjectName, type_name: &str) -> Self {
        self.add_column_def(Column::new(column_name, type_name))
    }

    pub fn add_column_def(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    pub fn with_primary_key(mut self, primary_key: PrimaryKey) -> Self {
        self.primary_key = Some(primary_key);
        self
    }

    pub fn add_foreign_key(mut self, foreign_key: ForeignKey) -> Self {
        self.foreign_keys.push(foreign_key);
        self
    }

    pub fn add_unique_constraint(mut self, constraint: UniqueConstraint) -> Self {
        self.unique_constraints.push(constraint);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_column_qualifies_under_table() {
        let table = Table::new(ObjectName::new([Some("app"), Some("orders")]));
        let action = CreateTableAction::new(table)
            .add_column("id", "bigint")
            .add_column("total", "numeric(10,2)");

        let names: Vec<String> = action.columns.iter().map(|c| c.name.to_string()).collect();
        assert_eq!(names, vec!["app.orders.id", "app.orders.total"]);
        assert_eq!(action.columns[1].type_name.as_deref(), Some("numeric(10,2)"));
    }

    #[test]
    fn test_builder_preserves_insertion_order() {
        let table = Table::new(ObjectName::simple("orders"));
        let action = CreateTableAction::new(table)
            .add_qualified_column(ObjectName::new([Some("orders"), Some("b")]), "int")
            .add_column("a", "int")
            .add_unique_constraint(UniqueConstraint {
                name: ObjectName::simple("uq_b"),
                columns: vec![ObjectName::simple("b")],
            })
            .add_unique_constraint(UniqueConstraint {
                name: ObjectName::simple("uq_a"),
                columns: vec![ObjectName::simple("a")],
            })
            .add_foreign_key(ForeignKey::new(ObjectName::simple("fk_1")));

        let columns: Vec<_> = action.columns.iter().map(|c| c.name.name()).collect();
        assert_eq!(columns, vec![Some("b"), Some("a")]);
        let uniques: Vec<_> = action
            .unique_constraints
            .iter()
            .map(|u| u.name.to_string())
            .collect();
        assert_eq!(uniques, vec!["uq_b", "uq_a"]);
        assert_eq!(action.foreign_keys.len(), 1);
        assert!(action.primary_key.is_none());
    }

    #[test]
    fn test_query_action_arguments() {
        let query = QueryMetadataAction::new(
            MetadataOperation::ImportedKeys,
            [Some("app".to_string()), None, Some("orders".to_string())],
        );
        assert_eq!(query.argument(0), Some("app"));
        assert_eq!(query.argument(1), None);
        assert_eq!(query.argument(7), None);
        assert_eq!(query.to_string(), "getImportedKeys(app, null, orders)");
    }
}
