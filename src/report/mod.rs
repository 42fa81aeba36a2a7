//! Snapshot reports
//!
//! Renders an object-based result as a human readable text report.

use minijinja::{context, Environment, Value};
use tracing::debug;

use crate::action::SnapshotObjectsAction;
use crate::error::SnapshotError;
use crate::result::ObjectBasedResult;
use crate::structure::{DatabaseObject, Deferrability, ForeignKey, PrimaryKey};

/// Text report renderer
pub struct ReportRenderer {
    env: Environment<'static>,
}

impl ReportRenderer {
    pub fn new() -> Self {
        let mut env = Environment::new();

        env.add_template("report", include_str!("templates/report.txt.jinja"))
            .expect("Failed to load report template");

        Self { env }
    }

    /// Render `result` as the answer to `action`
    pub fn render(
        &self,
        action: &SnapshotObjectsAction,
        database: &str,
        result: &ObjectBasedResult,
    ) -> Result<String, SnapshotError> {
        let template = self
            .env
            .get_template("report")
            .map_err(|e| SnapshotError::Output(format!("Template error: {}", e)))?;

        let objects: Vec<Value> = result.objects().iter().map(object_context).collect();
        debug!(objects = objects.len(), "Rendering snapshot report");

        let ctx = context! {
            kind => action.kind.as_str(),
            scope => action.related_to.to_string(),
            database => database,
            objects => objects,
        };

        template
            .render(ctx)
            .map_err(|e| SnapshotError::Output(format!("Render error: {}", e)))
    }
}

impl Default for ReportRenderer {
    fn default() -> Self {
        Self::new()
    }
}

fn object_context(object: &DatabaseObject) -> Value {
    match object {
        DatabaseObject::ForeignKey(fk) => foreign_key_context(fk),
        DatabaseObject::PrimaryKey(pk) => primary_key_context(pk),
        other => context! {
            kind => other.kind().as_str(),
            name => other.name().to_string(),
        },
    }
}

fn foreign_key_context(fk: &ForeignKey) -> Value {
    let deferral = fk.deferrability.map(|d| match d {
        Deferrability::NotDeferrable => "not deferrable",
        Deferrability::InitiallyImmediate => "deferrable, initially immediate",
        Deferrability::InitiallyDeferred => "deferrable, initially deferred",
    });

    context! {
        kind => "foreign key",
        name => fk.name.to_string(),
        table => fk.base_table().map(|t| t.to_string()),
        columns => fk.column_checks.iter().map(|check| {
            context! {
                position => check.position,
                base => check.base_column.name(),
                referenced => check.referenced_column.to_string(),
            }
        }).collect::<Vec<_>>(),
        update_rule => fk.update_rule.map(|r| r.as_str()),
        delete_rule => fk.delete_rule.map(|r| r.as_str()),
        deferral => deferral,
    }
}

fn primary_key_context(pk: &PrimaryKey) -> Value {
    context! {
        kind => "primary key",
        name => pk.name.to_string(),
        table => pk.table.to_string(),
        columns => pk.columns.iter().map(|column| {
            context! {
                position => column.position,
                base => column.column.name(),
            }
        }).collect::<Vec<_>>(),
    }
}
