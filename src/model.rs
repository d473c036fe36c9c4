use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableId(Uuid);

impl TableId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TableId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "table_{}", self.0.simple())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldId(Uuid);

impl FieldId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for FieldId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "field_{}", self.0.simple())
    }
}

/// Point in canvas space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Tables never leave the positive quadrant.
    pub fn clamped(self) -> Self {
        Self {
            x: self.x.max(0.0),
            y: self.y.max(0.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    String,
    Integer,
    Number,
    Date,
    Boolean,
}

impl FieldType {
    pub const ALL: [FieldType; 5] = [
        FieldType::String,
        FieldType::Integer,
        FieldType::Number,
        FieldType::Date,
        FieldType::Boolean,
    ];

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "string" => Some(Self::String),
            "integer" => Some(Self::Integer),
            "number" => Some(Self::Number),
            "date" => Some(Self::Date),
            "boolean" => Some(Self::Boolean),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Date => "date",
            Self::Boolean => "boolean",
        }
    }

    /// Label shown in the type select.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::String => "String",
            Self::Integer => "Integer",
            Self::Number => "Number",
            Self::Date => "Date",
            Self::Boolean => "Boolean",
        }
    }

    /// Icon class drawn in front of a field row.
    pub fn icon(&self) -> &'static str {
        match self {
            Self::String => "bi-type",
            Self::Integer => "bi-123",
            Self::Number => "bi-hash",
            Self::Date => "bi-calendar-date",
            Self::Boolean => "bi-toggle-on",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A column definition inside a designer table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub id: FieldId,
    pub name: String,
    pub field_type: FieldType,
    pub is_primary: bool,
    pub is_foreign: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self::with_id(FieldId::new(), name, field_type)
    }

    /// Key flags are always derived from the name.
    pub fn with_id(id: FieldId, name: impl Into<String>, field_type: FieldType) -> Self {
        let name = name.into();
        Self {
            id,
            is_primary: is_primary_name(&name),
            is_foreign: is_foreign_name(&name),
            name,
            field_type,
        }
    }
}

pub fn is_primary_name(name: &str) -> bool {
    name == "id"
}

pub fn is_foreign_name(name: &str) -> bool {
    name != "id" && name.ends_with("Id")
}

/// Directed reference from a field of the owning table to a field of another table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub kind: String,
    pub local_field: String,
    pub target_table: TableId,
    pub target_field: String,
}

impl Relationship {
    pub fn same_link(&self, local_field: &str, target_table: TableId, target_field: &str) -> bool {
        self.local_field == local_field
            && self.target_table == target_table
            && self.target_field == target_field
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub id: TableId,
    pub name: String,
    pub fields: Vec<Field>,
    pub relationships: Vec<Relationship>,
    pub position: Position,
}

impl Table {
    pub fn field(&self, id: FieldId) -> Option<&Field> {
        self.fields.iter().find(|f| f.id == id)
    }

    pub fn field_by_name(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_flag() {
        let f = Field::new("id", FieldType::Integer);
        assert!(f.is_primary);
        assert!(!f.is_foreign);
    }

    #[test]
    fn test_foreign_flag() {
        let f = Field::new("customerId", FieldType::Integer);
        assert!(f.is_foreign);
        assert!(!f.is_primary);
    }

    #[test]
    fn test_plain_field() {
        let f = Field::new("email", FieldType::String);
        assert!(!f.is_primary);
        assert!(!f.is_foreign);
        // Lowercase suffix is not a foreign key
        assert!(!Field::new("userid", FieldType::Integer).is_foreign);
    }

    #[test]
    fn test_clamped_position() {
        let p = Position::new(-12.5, 40.0).clamped();
        assert_eq!(p, Position::new(0.0, 40.0));
    }

    #[test]
    fn test_field_type_names() {
        for t in FieldType::ALL {
            assert_eq!(FieldType::from_str(t.as_str()), Some(t));
        }
        assert_eq!(FieldType::from_str("datetime"), None);
    }

    #[test]
    fn test_id_display() {
        let id = TableId::new();
        assert!(id.to_string().starts_with("table_"));
        assert_ne!(id, TableId::new());
    }
}
