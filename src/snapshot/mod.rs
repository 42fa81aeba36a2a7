//! Snapshot logic resolution
//!
//! A snapshot request names an object kind and the reference it is scoped to.
//! The [`LogicRegistry`] picks the [`SnapshotLogic`] registered for that kind,
//! which turns the request into a metadata query, decodes each returned row
//! into a candidate object and finally merges candidates describing the same
//! entity.

use std::collections::HashMap;

use tracing::{debug, info, trace};

use crate::action::{QueryMetadataAction, SnapshotObjectsAction};
use crate::introspect::MetadataExecutor;
use crate::name::ObjectName;
use crate::prelude::SnapshotError;
use crate::result::{ActionResult, ObjectBasedResult, Row, RowBasedResult};
use crate::structure::{DatabaseObject, ObjectKind};

pub mod foreign_keys;
pub mod normalize;
pub mod primary_keys;

pub use foreign_keys::ForeignKeysLogic;
pub use primary_keys::PrimaryKeysLogic;

/// Capabilities of the connected database
pub trait Database {
    /// Human readable name used in error messages
    fn short_name(&self) -> &str;

    /// Number of container levels addressable above a table
    ///
    /// 2 for catalog + schema, 1 when only one level exists, 0 for none.
    fn max_snapshot_container_depth(&self) -> usize;
}

/// Plain capability description, usually built from configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseProfile {
    pub short_name: String,
    pub max_container_depth: usize,
}

impl DatabaseProfile {
    pub fn new(short_name: impl Into<String>, max_container_depth: usize) -> Self {
        Self {
            short_name: short_name.into(),
            max_container_depth,
        }
    }
}

impl Database for DatabaseProfile {
    fn short_name(&self) -> &str {
        &self.short_name
    }

    fn max_snapshot_container_depth(&self) -> usize {
        self.max_container_depth
    }
}

/// Collaborators available to a single snapshot request
pub struct Scope<'a> {
    database: &'a dyn Database,
    executor: &'a mut dyn MetadataExecutor,
}

impl<'a> Scope<'a> {
    pub fn new(database: &'a dyn Database, executor: &'a mut dyn MetadataExecutor) -> Self {
        Self { database, executor }
    }

    pub fn database(&self) -> &dyn Database {
        self.database
    }

    /// Run a metadata query, passing executor failures through unchanged
    pub fn execute(&mut self, action: &QueryMetadataAction) -> Result<RowBasedResult, SnapshotError> {
        self.executor.query_metadata(action)
    }
}

/// Post-processing applied to decoded candidates
pub type Modifier = fn(Vec<DatabaseObject>) -> Result<Vec<DatabaseObject>, SnapshotError>;

/// Snapshot strategy for one object kind
pub trait SnapshotLogic: Send + Sync {
    /// The kind this logic produces
    fn type_to_snapshot(&self) -> ObjectKind;

    /// Kinds accepted as the related-to scope, abstract categories allowed
    fn supported_related_kinds(&self) -> &'static [ObjectKind];

    /// Build the metadata query answering `action`
    fn create_snapshot_action(
        &self,
        action: &SnapshotObjectsAction,
        scope: &Scope<'_>,
    ) -> Result<QueryMetadataAction, SnapshotError>;

    /// Decode one row into one candidate object
    fn convert_to_object(
        &self,
        row: &Row,
        action: &SnapshotObjectsAction,
        scope: &Scope<'_>,
    ) -> Result<DatabaseObject, SnapshotError>;

    /// Merge and ordering stage run over all candidates
    fn modifier(&self) -> Modifier {
        Ok
    }

    /// Final filter over merged objects
    fn include(&self, _object: &DatabaseObject, _action: &SnapshotObjectsAction) -> bool {
        true
    }

    fn supports(&self, action: &SnapshotObjectsAction) -> bool {
        action.kind == self.type_to_snapshot()
            && self
                .supported_related_kinds()
                .iter()
                .any(|kind| action.related_to.instance_of(*kind))
    }
}

/// Run one snapshot end to end with an already selected logic
pub fn execute(
    logic: &dyn SnapshotLogic,
    action: &SnapshotObjectsAction,
    scope: &mut Scope<'_>,
) -> Result<ObjectBasedResult, SnapshotError> {
    let query = logic.create_snapshot_action(action, scope)?;
    debug!(query = %query, "Running metadata query");

    let rows = scope.execute(&query)?;
    debug!(operation = %query.operation(), rows = rows.len(), "Metadata query returned");

    rewrite(logic, action, scope, ActionResult::RowBased(rows))
}

/// Turn any query result into the final object-based result
///
/// Row-based input is decoded row by row first. Any failing row aborts the
/// whole rewrite, since merging needs every row of an entity.
pub fn rewrite(
    logic: &dyn SnapshotLogic,
    action: &SnapshotObjectsAction,
    scope: &Scope<'_>,
    result: ActionResult,
) -> Result<ObjectBasedResult, SnapshotError> {
    let candidates = match result {
        ActionResult::RowBased(rows) => rows
            .rows()
            .iter()
            .map(|row| {
                let object = logic.convert_to_object(row, action, scope)?;
                trace!(kind = %object.kind(), name = %object.name(), "Decoded row");
                Ok::<_, SnapshotError>(object)
            })
            .collect::<Result<Vec<_>, SnapshotError>>()?,
        ActionResult::ObjectBased(objects) => objects.into_objects(),
    };

    let merged = (logic.modifier())(candidates)?;
    let objects = merged
        .into_iter()
        .filter(|object| logic.include(object, action))
        .collect();

    Ok(ObjectBasedResult::new(objects))
}

/// Table-level query arguments for a snapshot scoped to `action.related_to`
///
/// Accepts catalog, schema, table and the logic's own kind as the scope.
/// Catalog and schema scopes select every table below them. A reference of the
/// logic's own kind selects every table in that object's container, since
/// constraint names are qualified by catalog and schema rather than by table.
///
/// The result always has three slots. With fewer than two addressable
/// container levels the single container travels in the first slot and the
/// second stays unset.
pub fn table_query_arguments(
    action: &SnapshotObjectsAction,
    scope: &Scope<'_>,
) -> Result<Vec<Option<String>>, SnapshotError> {
    let database = scope.database();
    let depth = database.max_snapshot_container_depth();
    let related_to = &action.related_to;

    let table_name = if related_to.instance_of(ObjectKind::Catalog) {
        if depth < 2 {
            return Err(SnapshotError::Unsupported {
                database: database.short_name().to_string(),
                kind: action.kind,
                message: "catalogs are not addressable".to_string(),
            });
        }
        ObjectName::new([related_to.simple_name(), None, None])
    } else if related_to.instance_of(ObjectKind::Schema) {
        related_to.name.child(None)
    } else if related_to.instance_of(ObjectKind::Table) {
        related_to.name.clone()
    } else if related_to.instance_of(action.kind) {
        match related_to.name.container() {
            Some(container) => container.child(None),
            None => ObjectName::new([None::<String>]),
        }
    } else {
        return Err(SnapshotError::Invariant(format!(
            "Unexpected related-to type {} for {} snapshot",
            related_to.kind, action.kind
        )));
    };

    let parts = table_name.truncate(depth + 2).as_list(3)?;
    trace!(table = %table_name, parts = ?parts, depth, "Resolved table scope");

    let [catalog, schema, table]: [Option<String>; 3] = parts
        .try_into()
        .map_err(|_| SnapshotError::Invariant("name list is not three slots".to_string()))?;

    if depth >= 2 {
        Ok(vec![catalog, schema, table])
    } else {
        Ok(vec![schema, None, table])
    }
}

/// Qualified name built from row values
///
/// Databases with a single container level report it as the catalog and leave
/// the schema empty; those names get two segments instead of three.
pub fn qualified_name(
    catalog: Option<&str>,
    schema: Option<&str>,
    name: Option<&str>,
) -> ObjectName {
    if catalog.is_some() && schema.is_none() {
        ObjectName::new([catalog, name])
    } else {
        ObjectName::new([catalog, schema, name])
    }
}

/// Registration table of snapshot logic, one per object kind
#[derive(Default)]
pub struct LogicRegistry {
    logics: HashMap<ObjectKind, Box<dyn SnapshotLogic>>,
}

impl LogicRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in logic
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for logic in [
            Box::new(ForeignKeysLogic) as Box<dyn SnapshotLogic>,
            Box::new(PrimaryKeysLogic) as Box<dyn SnapshotLogic>,
        ] {
            registry.logics.insert(logic.type_to_snapshot(), logic);
        }
        registry
    }

    /// Register a logic for the kind it declares
    pub fn register(&mut self, logic: impl SnapshotLogic + 'static) -> Result<(), SnapshotError> {
        let kind = logic.type_to_snapshot();
        if kind.is_abstract() {
            return Err(SnapshotError::Config(format!(
                "Cannot register snapshot logic for abstract kind {}",
                kind
            )));
        }
        if self.logics.contains_key(&kind) {
            return Err(SnapshotError::Config(format!(
                "Snapshot logic for {} is already registered",
                kind
            )));
        }
        self.logics.insert(kind, Box::new(logic));
        Ok(())
    }

    /// Registered kinds in declaration order of [`ObjectKind`]
    pub fn registered_kinds(&self) -> Vec<ObjectKind> {
        let mut kinds: Vec<_> = self.logics.keys().copied().collect();
        kinds.sort();
        kinds
    }

    /// Fail unless every `required` kind has a logic
    pub fn ensure_complete(&self, required: &[ObjectKind]) -> Result<(), SnapshotError> {
        let missing: Vec<&str> = required
            .iter()
            .filter(|kind| !self.logics.contains_key(kind))
            .map(|kind| kind.as_str())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(SnapshotError::Config(format!(
                "No snapshot logic registered for: {}",
                missing.join(", ")
            )))
        }
    }

    /// Select the logic answering `action`
    pub fn resolve(
        &self,
        action: &SnapshotObjectsAction,
        database: &dyn Database,
    ) -> Result<&dyn SnapshotLogic, SnapshotError> {
        let logic = self
            .logics
            .get(&action.kind)
            .ok_or_else(|| SnapshotError::Unsupported {
                database: database.short_name().to_string(),
                kind: action.kind,
                message: "no snapshot logic is registered".to_string(),
            })?;

        if !logic.supports(action) {
            return Err(SnapshotError::Unsupported {
                database: database.short_name().to_string(),
                kind: action.kind,
                message: format!("cannot scope a snapshot to {}", action.related_to.kind),
            });
        }

        Ok(logic.as_ref())
    }

    /// Resolve and run a snapshot request
    pub fn snapshot(
        &self,
        action: &SnapshotObjectsAction,
        scope: &mut Scope<'_>,
    ) -> Result<ObjectBasedResult, SnapshotError> {
        info!(
            kind = %action.kind,
            related_to = %action.related_to,
            database = scope.database().short_name(),
            "Starting snapshot"
        );

        let logic = self.resolve(action, scope.database())?;
        let result = execute(logic, action, scope)?;

        info!(kind = %action.kind, objects = result.len(), "Snapshot complete");
        Ok(result)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;

    use super::*;

    /// Executor returning canned results and recording what it was asked
    #[derive(Default)]
    pub struct CannedExecutor {
        pub responses: VecDeque<Result<RowBasedResult, SnapshotError>>,
        pub received: Vec<QueryMetadataAction>,
    }

    impl CannedExecutor {
        pub fn returning(rows: Vec<Row>) -> Self {
            let mut executor = Self::default();
            executor.responses.push_back(Ok(RowBasedResult::new(rows)));
            executor
        }
    }

    impl MetadataExecutor for CannedExecutor {
        fn query_metadata(
            &mut self,
            action: &QueryMetadataAction,
        ) -> Result<RowBasedResult, SnapshotError> {
            self.received.push(action.clone());
            self.responses
                .pop_front()
                .unwrap_or_else(|| Ok(RowBasedResult::default()))
        }
    }
}
