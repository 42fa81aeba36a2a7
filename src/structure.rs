//! Database object model
//!
//! These types are the database-agnostic result of a snapshot. Every supported
//! database reports metadata differently; the snapshot logic normalizes it into
//! these shapes before handing it back to callers.

use std::fmt;

use crate::error::SnapshotError;
use crate::name::ObjectName;

/// Kinds of database objects
///
/// `Relation` is an abstract category covering tables and views. It can be
/// asked about but no object is ever of that exact kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ObjectKind {
    Catalog,
    Schema,
    Relation,
    Table,
    View,
    Column,
    PrimaryKey,
    ForeignKey,
    UniqueConstraint,
}

impl ObjectKind {
    pub const ALL: [ObjectKind; 9] = [
        ObjectKind::Catalog,
        ObjectKind::Schema,
        ObjectKind::Relation,
        ObjectKind::Table,
        ObjectKind::View,
        ObjectKind::Column,
        ObjectKind::PrimaryKey,
        ObjectKind::ForeignKey,
        ObjectKind::UniqueConstraint,
    ];

    /// Abstract category directly containing this kind
    pub fn category(self) -> Option<ObjectKind> {
        match self {
            ObjectKind::Table | ObjectKind::View => Some(ObjectKind::Relation),
            _ => None,
        }
    }

    pub fn is_abstract(self) -> bool {
        matches!(self, ObjectKind::Relation)
    }

    /// True if this kind is `other` or belongs to the category `other`
    pub fn is_a(self, other: ObjectKind) -> bool {
        self == other || self.category().is_some_and(|c| c.is_a(other))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ObjectKind::Catalog => "catalog",
            ObjectKind::Schema => "schema",
            ObjectKind::Relation => "relation",
            ObjectKind::Table => "table",
            ObjectKind::View => "view",
            ObjectKind::Column => "column",
            ObjectKind::PrimaryKey => "primary key",
            ObjectKind::ForeignKey => "foreign key",
            ObjectKind::UniqueConstraint => "unique constraint",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A name together with the kind of object it identifies
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectReference {
    pub kind: ObjectKind,
    pub name: ObjectName,
}

impl ObjectReference {
    pub fn new(kind: ObjectKind, name: ObjectName) -> Self {
        Self { kind, name }
    }

    /// Exact or category match; mismatches are simply false
    pub fn instance_of(&self, kind: ObjectKind) -> bool {
        self.kind.is_a(kind)
    }

    pub fn simple_name(&self) -> Option<&str> {
        self.name.name()
    }
}

impl fmt::Display for ObjectReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    pub name: ObjectName,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub name: ObjectName,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: ObjectName,
    pub remarks: Option<String>,
}

impl Table {
    pub fn new(name: ObjectName) -> Self {
        Self {
            name,
            remarks: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct View {
    pub name: ObjectName,
    pub definition: Option<String>,
}

/// A table column
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Qualified by the owning relation
    pub name: ObjectName,
    /// Vendor type name as reported, e.g. `varchar(255)`
    pub type_name: Option<String>,
    pub nullable: Option<bool>,
}

impl Column {
    pub fn new(name: ObjectName, type_name: impl Into<String>) -> Self {
        Self {
            name,
            type_name: Some(type_name.into()),
            nullable: None,
        }
    }
}

/// One column of a primary key
#[derive(Debug, Clone, PartialEq)]
pub struct PrimaryKeyColumn {
    /// Qualified by the owning table
    pub column: ObjectName,
    pub position: Option<i32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrimaryKey {
    pub name: ObjectName,
    pub table: ObjectName,
    /// Key columns in declared key order once normalized
    pub columns: Vec<PrimaryKeyColumn>,
}

/// Referential action taken on update or delete of the referenced row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForeignKeyRule {
    NoAction,
    Cascade,
    SetNull,
    SetDefault,
    Restrict,
}

impl ForeignKeyRule {
    pub fn as_str(self) -> &'static str {
        match self {
            ForeignKeyRule::NoAction => "NO ACTION",
            ForeignKeyRule::Cascade => "CASCADE",
            ForeignKeyRule::SetNull => "SET NULL",
            ForeignKeyRule::SetDefault => "SET DEFAULT",
            ForeignKeyRule::Restrict => "RESTRICT",
        }
    }
}

impl fmt::Display for ForeignKeyRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Constraint checking mode
///
/// A single value rather than two flags, so a key can never be
/// "not deferrable but initially deferred".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deferrability {
    NotDeferrable,
    InitiallyImmediate,
    InitiallyDeferred,
}

/// One base column / referenced column pairing of a foreign key
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKeyColumnCheck {
    /// Column of the referencing table, qualified by that table
    pub base_column: ObjectName,
    /// Column of the referenced table, qualified by that table
    pub referenced_column: ObjectName,
    /// Ordinal within the key, if the database reported one
    pub position: Option<i32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKey {
    pub name: ObjectName,
    pub column_checks: Vec<ForeignKeyColumnCheck>,
    pub update_rule: Option<ForeignKeyRule>,
    pub delete_rule: Option<ForeignKeyRule>,
    pub deferrability: Option<Deferrability>,
}

impl ForeignKey {
    pub fn new(name: ObjectName) -> Self {
        Self {
            name,
            column_checks: Vec::new(),
            update_rule: None,
            delete_rule: None,
            deferrability: None,
        }
    }

    pub fn deferrable(&self) -> Option<bool> {
        self.deferrability
            .map(|d| !matches!(d, Deferrability::NotDeferrable))
    }

    pub fn initially_deferred(&self) -> Option<bool> {
        self.deferrability
            .map(|d| matches!(d, Deferrability::InitiallyDeferred))
    }

    /// Referencing table, taken from the first column check
    pub fn base_table(&self) -> Option<ObjectName> {
        self.column_checks
            .first()
            .and_then(|check| check.base_column.container())
    }

    /// Referenced table, taken from the first column check
    pub fn referenced_table(&self) -> Option<ObjectName> {
        self.column_checks
            .first()
            .and_then(|check| check.referenced_column.container())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UniqueConstraint {
    pub name: ObjectName,
    pub columns: Vec<ObjectName>,
}

/// Any object a snapshot can produce
#[derive(Debug, Clone, PartialEq)]
pub enum DatabaseObject {
    Catalog(Catalog),
    Schema(Schema),
    Table(Table),
    View(View),
    Column(Column),
    PrimaryKey(PrimaryKey),
    ForeignKey(ForeignKey),
    UniqueConstraint(UniqueConstraint),
}

impl DatabaseObject {
    pub fn kind(&self) -> ObjectKind {
        match self {
            DatabaseObject::Catalog(_) => ObjectKind::Catalog,
            DatabaseObject::Schema(_) => ObjectKind::Schema,
            DatabaseObject::Table(_) => ObjectKind::Table,
            DatabaseObject::View(_) => ObjectKind::View,
            DatabaseObject::Column(_) => ObjectKind::Column,
            DatabaseObject::PrimaryKey(_) => ObjectKind::PrimaryKey,
            DatabaseObject::ForeignKey(_) => ObjectKind::ForeignKey,
            DatabaseObject::UniqueConstraint(_) => ObjectKind::UniqueConstraint,
        }
    }

    pub fn name(&self) -> &ObjectName {
        match self {
            DatabaseObject::Catalog(o) => &o.name,
            DatabaseObject::Schema(o) => &o.name,
            DatabaseObject::Table(o) => &o.name,
            DatabaseObject::View(o) => &o.name,
            DatabaseObject::Column(o) => &o.name,
            DatabaseObject::PrimaryKey(o) => &o.name,
            DatabaseObject::ForeignKey(o) => &o.name,
            DatabaseObject::UniqueConstraint(o) => &o.name,
        }
    }

    pub fn to_reference(&self) -> ObjectReference {
        ObjectReference::new(self.kind(), self.name().clone())
    }
}

macro_rules! object_conversions {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for DatabaseObject {
                fn from(object: $variant) -> Self {
                    DatabaseObject::$variant(object)
                }
            }

            impl TryFrom<DatabaseObject> for $variant {
                type Error = SnapshotError;

                fn try_from(object: DatabaseObject) -> Result<Self, Self::Error> {
                    match object {
                        DatabaseObject::$variant(inner) => Ok(inner),
                        other => Err(SnapshotError::Invariant(format!(
                            "Expected {} but found {} '{}'",
                            ObjectKind::$variant,
                            other.kind(),
                            other.name()
                        ))),
                    }
                }
            }
        )*
    };
}

object_conversions!(
    Catalog,
    Schema,
    Table,
    View,
    Column,
    PrimaryKey,
    ForeignKey,
    UniqueConstraint,
);
