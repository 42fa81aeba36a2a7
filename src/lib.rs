//! # schemasnap
//!
//! Snapshot database metadata into a database-agnostic object model
//!
//! This crate resolves a request such as "foreign keys of table ORDERS" into
//! the metadata query the connected database understands, runs it through a
//! [`MetadataExecutor`](introspect::MetadataExecutor), and normalizes the
//! returned rows into merged, ordered domain objects.

pub mod action;
pub mod config;
pub mod error;
pub mod introspect;
pub mod name;
pub mod report;
pub mod result;
pub mod snapshot;
pub mod structure;

pub mod prelude {
    pub use crate::action::{
        CreateTableAction, MetadataOperation, QueryMetadataAction, SnapshotObjectsAction,
    };
    pub use crate::config::DbConfig;
    pub use crate::error::SnapshotError;
    pub use crate::introspect::MetadataExecutor;
    pub use crate::name::ObjectName;
    pub use crate::report::ReportRenderer;
    pub use crate::result::{ActionResult, ObjectBasedResult, Row, RowBasedResult, Value};
    pub use crate::snapshot::{Database, DatabaseProfile, LogicRegistry, Scope, SnapshotLogic};
    pub use crate::structure::{
        DatabaseObject, Deferrability, ForeignKey, ForeignKeyColumnCheck, ForeignKeyRule,
        ObjectKind, ObjectReference, PrimaryKey,
    };
}

#[cfg(feature = "postgres")]
pub use introspect::PostgresExecutor;
