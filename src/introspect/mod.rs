//! Metadata query execution
//!
//! Snapshot logic decides *what* to ask; a [`MetadataExecutor`] asks the
//! database and hands back labelled rows. Each supported database has its
//! own feature-gated submodule.

use crate::action::QueryMetadataAction;
use crate::prelude::{RowBasedResult, SnapshotError};

/// Runs raw metadata queries against a connected database
///
/// Positional arguments follow the catalog, schema, table convention and a
/// `None` argument matches anything. Implementations report failures as
/// [`SnapshotError::Execution`]; callers pass them through unchanged.
pub trait MetadataExecutor {
    fn query_metadata(
        &mut self,
        action: &QueryMetadataAction,
    ) -> Result<RowBasedResult, SnapshotError>;
}

// Feature-gated database implementations
#[cfg(feature = "postgres")]
mod postgres;

#[cfg(feature = "postgres")]
pub use postgres::PostgresExecutor;
