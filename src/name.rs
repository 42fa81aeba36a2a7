//! Hierarchical object names
//!
//! An [`ObjectName`] is an ordered chain of optional segments running from the
//! outermost container to the leaf, e.g. `catalog.schema.table.column`. A
//! segment that is not known is `None`, never an empty string.

use std::fmt;

use crate::error::SnapshotError;

/// Fully or partially qualified name of a database object
///
/// Equality and ordering compare segment by segment and are case-sensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectName {
    segments: Vec<Option<String>>,
}

impl ObjectName {
    /// Build a name from segments ordered outermost first
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(|s| s.map(Into::into)).collect(),
        }
    }

    /// Single segment name with no container
    pub fn simple(name: impl Into<String>) -> Self {
        Self {
            segments: vec![Some(name.into())],
        }
    }

    /// Name nested one level below this one
    pub fn child(&self, name: Option<&str>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(name.map(str::to_string));
        Self { segments }
    }

    /// Leaf segment
    pub fn name(&self) -> Option<&str> {
        self.segments.last().and_then(|s| s.as_deref())
    }

    /// Everything above the leaf, if there is anything above it
    pub fn container(&self) -> Option<ObjectName> {
        if self.segments.len() < 2 {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Number of segments, populated or not
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    pub fn segments(&self) -> &[Option<String>] {
        &self.segments
    }

    /// Keep at most `max_depth` innermost segments
    ///
    /// A name that is already short enough is returned unchanged.
    pub fn truncate(&self, max_depth: usize) -> Self {
        let start = self.segments.len().saturating_sub(max_depth);
        Self {
            segments: self.segments[start..].to_vec(),
        }
    }

    /// Render as exactly `length` entries, outermost first
    ///
    /// Shorter names are padded with `None` on the outer side, so
    /// `schema.table` becomes `[None, schema, table]` for a length of 3.
    /// Longer names may only shed outer segments that are unset.
    pub fn as_list(&self, length: usize) -> Result<Vec<Option<String>>, SnapshotError> {
        let depth = self.segments.len();
        if length >= depth {
            let mut list = vec![None; length - depth];
            list.extend(self.segments.iter().cloned());
            return Ok(list);
        }

        let (dropped, kept) = self.segments.split_at(depth - length);
        if dropped.iter().any(Option::is_some) {
            return Err(SnapshotError::Config(format!(
                "Cannot represent '{}' with {} name segments",
                self, length
            )));
        }
        Ok(kept.to_vec())
    }
}

impl fmt::Display for ObjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<&str> = self
            .segments
            .iter()
            .map(|s| s.as_deref().unwrap_or("*"))
            .collect();
        f.write_str(&parts.join("."))
    }
}

impl From<&str> for ObjectName {
    fn from(name: &str) -> Self {
        Self::simple(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(parts: &[Option<&str>]) -> ObjectName {
        ObjectName::new(parts.iter().copied())
    }

    #[test]
    fn test_truncate_keeps_innermost_segments() {
        let full = name(&[Some("cat"), Some("app"), Some("orders")]);
        assert_eq!(full.truncate(2), name(&[Some("app"), Some("orders")]));
    }

    #[test]
    fn test_truncate_short_name_unchanged() {
        let short = name(&[Some("app"), Some("orders")]);
        assert_eq!(short.truncate(4), short);
    }

    #[test]
    fn test_truncate_idempotent() {
        let full = name(&[Some("cat"), None, Some("orders"), Some("id")]);
        for depth in 0..6 {
            let once = full.truncate(depth);
            assert_eq!(once.truncate(depth), once);
        }
    }

    #[test]
    fn test_as_list_pads_outer_side() {
        let short = name(&[Some("app"), Some("orders")]);
        assert_eq!(
            short.as_list(3).unwrap(),
            vec![None, Some("app".to_string()), Some("orders".to_string())]
        );
    }

    #[test]
    fn test_as_list_drops_unset_outer_segments() {
        let padded = name(&[None, None, Some("app"), Some("orders")]);
        assert_eq!(
            padded.as_list(3).unwrap(),
            vec![None, Some("app".to_string()), Some("orders".to_string())]
        );
    }

    #[test]
    fn test_as_list_too_short_is_config_error() {
        let full = name(&[Some("cat"), Some("app"), Some("orders"), Some("id")]);
        let err = full.as_list(3).unwrap_err();
        assert!(matches!(err, SnapshotError::Config(_)));
    }

    #[test]
    fn test_container_and_leaf() {
        let column = name(&[Some("app"), Some("orders"), Some("id")]);
        assert_eq!(column.name(), Some("id"));
        assert_eq!(
            column.container(),
            Some(name(&[Some("app"), Some("orders")]))
        );
        assert_eq!(ObjectName::simple("orders").container(), None);
    }

    #[test]
    fn test_child_with_unset_leaf() {
        let table = ObjectName::simple("app").child(None);
        assert_eq!(table.depth(), 2);
        assert_eq!(table.name(), None);
        assert_eq!(table.to_string(), "app.*");
    }

    #[test]
    fn test_equality_is_case_sensitive() {
        assert_ne!(ObjectName::simple("Orders"), ObjectName::simple("orders"));
        assert!(ObjectName::simple("A") < ObjectName::simple("a"));
    }
}
