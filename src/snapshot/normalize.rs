//! Merging of multi-row entities
//!
//! Metadata calls report composite constraints as one row per column. Each row
//! decodes to its own candidate; this module folds candidates sharing a key
//! back into a single entity and puts its members in key order.

use std::collections::HashMap;
use std::hash::Hash;

use crate::name::ObjectName;
use crate::prelude::SnapshotError;
use crate::structure::{DatabaseObject, ForeignKey, PrimaryKey};

/// An entity that may arrive split over several candidates
pub trait Composite {
    type Key: Eq + Hash + Clone;

    /// Candidates with equal keys describe the same entity
    fn merge_key(&self) -> Self::Key;

    /// Take over the members of a later candidate
    fn absorb(&mut self, other: Self);

    /// Put members into their final order
    fn order_members(&mut self);
}

/// Fold candidates by key, keeping first-seen entity order
pub fn merge_by_key<T: Composite>(candidates: Vec<T>) -> Vec<T> {
    let mut index: HashMap<T::Key, usize> = HashMap::new();
    let mut merged: Vec<T> = Vec::new();

    for candidate in candidates {
        let key = candidate.merge_key();
        match index.get(&key) {
            Some(&position) => merged[position].absorb(candidate),
            None => {
                index.insert(key, merged.len());
                merged.push(candidate);
            }
        }
    }

    for entity in &mut merged {
        entity.order_members();
    }
    merged
}

/// [`merge_by_key`] over generic objects, usable as a snapshot modifier
///
/// Any object that is not a `T` is an invariant violation.
pub fn merge_objects<T>(objects: Vec<DatabaseObject>) -> Result<Vec<DatabaseObject>, SnapshotError>
where
    T: Composite + TryFrom<DatabaseObject, Error = SnapshotError> + Into<DatabaseObject>,
{
    let candidates = objects
        .into_iter()
        .map(T::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(merge_by_key(candidates).into_iter().map(Into::into).collect())
}

/// Sort by reported position, or by name when any position is missing
///
/// The fallback applies to the whole list so the order stays total.
pub fn sort_by_position<T, P, N>(members: &mut [T], position: P, name: N)
where
    P: Fn(&T) -> Option<i32>,
    N: Fn(&T) -> Option<&str>,
{
    if members.iter().all(|m| position(m).is_some()) {
        members.sort_by_key(|m| position(m));
    } else {
        members.sort_by(|a, b| name(a).cmp(&name(b)));
    }
}

impl Composite for ForeignKey {
    type Key = ObjectName;

    fn merge_key(&self) -> ObjectName {
        self.name.clone()
    }

    fn absorb(&mut self, other: Self) {
        self.column_checks.extend(other.column_checks);
    }

    // Fallback compares base columns only, never the referenced side.
    fn order_members(&mut self) {
        sort_by_position(
            &mut self.column_checks,
            |check| check.position,
            |check| check.base_column.name(),
        );
    }
}

impl Composite for PrimaryKey {
    type Key = (ObjectName, ObjectName);

    fn merge_key(&self) -> Self::Key {
        (self.table.clone(), self.name.clone())
    }

    fn absorb(&mut self, other: Self) {
        self.columns.extend(other.columns);
    }

    fn order_members(&mut self) {
        sort_by_position(
            &mut self.columns,
            |column| column.position,
            |column| column.column.name(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::{ForeignKeyColumnCheck, Table};

    fn fk(name: &str, base: &str, referenced: &str, position: Option<i32>) -> ForeignKey {
        let mut key = ForeignKey::new(ObjectName::new([Some("app"), Some(name)]));
        key.column_checks.push(ForeignKeyColumnCheck {
            base_column: ObjectName::new([Some("app"), Some("orders"), Some(base)]),
            referenced_column: ObjectName::new([Some("app"), Some("other"), Some(referenced)]),
            position,
        });
        key
    }

    fn base_columns(key: &ForeignKey) -> Vec<&str> {
        key.column_checks
            .iter()
            .filter_map(|c| c.base_column.name())
            .collect()
    }

    #[test]
    fn test_merge_orders_by_position() {
        let merged = merge_by_key(vec![
            fk("fk_multi", "A1", "B1", Some(2)),
            fk("fk_multi", "A2", "B2", Some(1)),
        ]);

        assert_eq!(merged.len(), 1);
        let checks = &merged[0].column_checks;
        assert_eq!(checks[0].base_column.name(), Some("A2"));
        assert_eq!(checks[0].referenced_column.name(), Some("B2"));
        assert_eq!(checks[0].position, Some(1));
        assert_eq!(checks[1].base_column.name(), Some("A1"));
        assert_eq!(checks[1].referenced_column.name(), Some("B1"));
        assert_eq!(checks[1].position, Some(2));
    }

    #[test]
    fn test_missing_position_falls_back_to_base_column_name() {
        let merged = merge_by_key(vec![
            fk("fk_multi", "b_col", "x", Some(1)),
            fk("fk_multi", "a_col", "y", None),
        ]);
        assert_eq!(base_columns(&merged[0]), vec!["a_col", "b_col"]);
    }

    #[test]
    fn test_fallback_ignores_referenced_column() {
        let merged = merge_by_key(vec![
            fk("fk_multi", "b_col", "a_ref", None),
            fk("fk_multi", "a_col", "z_ref", None),
        ]);
        assert_eq!(base_columns(&merged[0]), vec!["a_col", "b_col"]);
    }

    #[test]
    fn test_distinct_keys_keep_first_seen_order() {
        let merged = merge_by_key(vec![
            fk("fk_z", "c1", "r1", Some(1)),
            fk("fk_a", "c2", "r2", Some(1)),
            fk("fk_z", "c3", "r3", Some(2)),
        ]);
        let names: Vec<_> = merged.iter().map(|k| k.name.name()).collect();
        assert_eq!(names, vec![Some("fk_z"), Some("fk_a")]);
        assert_eq!(base_columns(&merged[0]), vec!["c1", "c3"]);
    }

    #[test]
    fn test_merge_objects_rejects_foreign_variant() {
        let objects = vec![
            DatabaseObject::from(fk("fk", "a", "b", Some(1))),
            DatabaseObject::from(Table::new(ObjectName::simple("orders"))),
        ];
        let err = merge_objects::<ForeignKey>(objects).unwrap_err();
        assert!(matches!(err, SnapshotError::Invariant(_)));
    }
}
