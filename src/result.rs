//! Query results
//!
//! Metadata queries come back row-based: each row maps column labels to
//! loosely typed values. Snapshot logic turns those into an object-based
//! result of [`DatabaseObject`]s.

use crate::error::SnapshotError;
use crate::structure::DatabaseObject;

/// A single value reported by a metadata query
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Text(String),
    Int(i64),
    Bool(bool),
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Value::Int(v as i64)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Conversion out of a row value
///
/// `Null` always converts to `None`. A present value that cannot be
/// represented as `Self` is a decode error.
pub trait FromValue: Sized {
    fn from_value(value: &Value, column: &str) -> Result<Option<Self>, SnapshotError>;
}

fn decode_error(column: &str, message: String) -> SnapshotError {
    SnapshotError::Decode {
        column: column.to_string(),
        message,
    }
}

impl FromValue for String {
    fn from_value(value: &Value, _column: &str) -> Result<Option<Self>, SnapshotError> {
        Ok(match value {
            Value::Null => None,
            Value::Text(s) => Some(s.clone()),
            Value::Int(i) => Some(i.to_string()),
            Value::Bool(b) => Some(b.to_string()),
        })
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value, column: &str) -> Result<Option<Self>, SnapshotError> {
        match value {
            Value::Null => Ok(None),
            Value::Int(i) => Ok(Some(*i)),
            Value::Text(s) => s
                .trim()
                .parse()
                .map(Some)
                .map_err(|e| decode_error(column, format!("'{}' is not an integer: {}", s, e))),
            Value::Bool(b) => Err(decode_error(
                column,
                format!("expected an integer, found boolean {}", b),
            )),
        }
    }
}

macro_rules! narrow_int_from_value {
    ($($ty:ty),*) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: &Value, column: &str) -> Result<Option<Self>, SnapshotError> {
                    match i64::from_value(value, column)? {
                        None => Ok(None),
                        Some(wide) => <$ty>::try_from(wide).map(Some).map_err(|_| {
                            decode_error(
                                column,
                                format!("{} is out of range for {}", wide, stringify!($ty)),
                            )
                        }),
                    }
                }
            }
        )*
    };
}

narrow_int_from_value!(i32, i16);

impl FromValue for bool {
    fn from_value(value: &Value, column: &str) -> Result<Option<Self>, SnapshotError> {
        match value {
            Value::Null => Ok(None),
            Value::Bool(b) => Ok(Some(*b)),
            Value::Int(0) => Ok(Some(false)),
            Value::Int(1) => Ok(Some(true)),
            Value::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "y" | "t" | "1" => Ok(Some(true)),
                "false" | "no" | "n" | "f" | "0" => Ok(Some(false)),
                _ => Err(decode_error(column, format!("'{}' is not a boolean", s))),
            },
            Value::Int(i) => Err(decode_error(column, format!("{} is not a boolean", i))),
        }
    }
}

/// One labelled row of a metadata query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    values: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, label: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(label, value);
        self
    }

    /// Set a value, replacing any existing value under the same label
    pub fn insert(&mut self, label: impl Into<String>, value: impl Into<Value>) {
        let label = label.into();
        let value = value.into();
        match self.values.iter_mut().find(|(l, _)| *l == label) {
            Some((_, existing)) => *existing = value,
            None => self.values.push((label, value)),
        }
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(l, _)| l.as_str())
    }

    /// Raw value by label
    ///
    /// Exact matches win; otherwise labels compare ASCII case-insensitively,
    /// since drivers disagree on label case.
    pub fn value(&self, label: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(l, _)| l == label)
            .or_else(|| self.values.iter().find(|(l, _)| l.eq_ignore_ascii_case(label)))
            .map(|(_, v)| v)
    }

    /// Typed value by label; a missing column reads as `None`
    pub fn get<T: FromValue>(&self, label: &str) -> Result<Option<T>, SnapshotError> {
        match self.value(label) {
            Some(value) => T::from_value(value, label),
            None => Ok(None),
        }
    }
}

/// Raw rows returned by a metadata query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowBasedResult {
    rows: Vec<Row>,
}

impl RowBasedResult {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl FromIterator<Row> for RowBasedResult {
    fn from_iter<I: IntoIterator<Item = Row>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Decoded, normalized objects
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectBasedResult {
    objects: Vec<DatabaseObject>,
}

impl ObjectBasedResult {
    pub fn new(objects: Vec<DatabaseObject>) -> Self {
        Self { objects }
    }

    pub fn objects(&self) -> &[DatabaseObject] {
        &self.objects
    }

    pub fn into_objects(self) -> Vec<DatabaseObject> {
        self.objects
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Objects of one variant, e.g. `result.as_list::<ForeignKey>()`
    pub fn as_list<T>(&self) -> Vec<T>
    where
        T: TryFrom<DatabaseObject>,
    {
        self.objects
            .iter()
            .cloned()
            .filter_map(|o| T::try_from(o).ok())
            .collect()
    }
}

/// Either shape a query can produce
#[derive(Debug, Clone, PartialEq)]
pub enum ActionResult {
    RowBased(RowBasedResult),
    ObjectBased(ObjectBasedResult),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_column_reads_as_none() {
        let row = Row::new().with("FK_NAME", "fk_cust");
        let schema: Option<String> = row.get("FKTABLE_SCHEM").unwrap();
        assert_eq!(schema, None);
    }

    #[test]
    fn test_null_reads_as_none() {
        let row = Row::new().with("KEY_SEQ", Value::Null);
        let position: Option<i32> = row.get("KEY_SEQ").unwrap();
        assert_eq!(position, None);
    }

    #[test]
    fn test_label_lookup_falls_back_to_case_insensitive() {
        let row = Row::new().with("fk_name", "lower").with("PK_NAME", "upper");
        assert_eq!(row.get::<String>("FK_NAME").unwrap().as_deref(), Some("lower"));
        assert_eq!(row.get::<String>("PK_NAME").unwrap().as_deref(), Some("upper"));
    }

    #[test]
    fn test_integer_from_text() {
        let row = Row::new().with("KEY_SEQ", " 2 ");
        assert_eq!(row.get::<i32>("KEY_SEQ").unwrap(), Some(2));
    }

    #[test]
    fn test_non_numeric_text_is_decode_error() {
        let row = Row::new().with("KEY_SEQ", "second");
        let err = row.get::<i32>("KEY_SEQ").unwrap_err();
        assert!(matches!(err, SnapshotError::Decode { ref column, .. } if column == "KEY_SEQ"));
    }

    #[test]
    fn test_narrowing_out_of_range() {
        let row = Row::new().with("UPDATE_RULE", 70_000i64);
        assert!(row.get::<i16>("UPDATE_RULE").is_err());
        assert_eq!(row.get::<i32>("UPDATE_RULE").unwrap(), Some(70_000));
    }

    #[test]
    fn test_insert_replaces_existing_label() {
        let mut row = Row::new().with("A", 1i64);
        row.insert("A", 2i64);
        assert_eq!(row.labels().count(), 1);
        assert_eq!(row.get::<i64>("A").unwrap(), Some(2));
    }

    #[test]
    fn test_bool_conversions() {
        let row = Row::new()
            .with("a", true)
            .with("b", "NO")
            .with("c", 1i64);
        assert_eq!(row.get::<bool>("a").unwrap(), Some(true));
        assert_eq!(row.get::<bool>("b").unwrap(), Some(false));
        assert_eq!(row.get::<bool>("c").unwrap(), Some(true));
    }
}
