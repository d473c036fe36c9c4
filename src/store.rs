//! In-memory graph of designer tables.

use crate::model::{Field, FieldId, FieldType, Position, Relationship, Table, TableId};
use tracing::{info, warn};

/// Offset of the first table and diagonal step between new tables.
const ORIGIN: f64 = 100.0;
const STAGGER: f64 = 50.0;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("Table name is required")]
    EmptyTableName,
    #[error("A table named {0} already exists")]
    DuplicateTableName(String),
    #[error("Add at least one field")]
    NoFields,
    #[error("Table not found: {0}")]
    TableNotFound(TableId),
    #[error("Fill in every relationship field")]
    IncompleteRelationship,
    #[error("A table cannot be related to itself")]
    SelfRelationship,
    #[error("This relationship already exists")]
    DuplicateRelationship,
    #[error("Relationship {index} not found on table {table}")]
    RelationshipNotFound { table: TableId, index: usize },
}

/// Field as typed into a form, before it gets an id.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDraft {
    pub name: String,
    pub field_type: FieldType,
}

impl FieldDraft {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }
}

/// Relationship whose target table no longer exists.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DanglingRef {
    pub owner: TableId,
    pub index: usize,
    pub target: TableId,
}

#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    tables: Vec<Table>,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn table(&self, id: TableId) -> Option<&Table> {
        self.tables.iter().find(|t| t.id == id)
    }

    fn table_mut(&mut self, id: TableId) -> Option<&mut Table> {
        self.tables.iter_mut().find(|t| t.id == id)
    }

    pub fn table_by_name(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Current name of the table a relationship points at.
    pub fn target_name(&self, rel: &Relationship) -> Option<&str> {
        self.table(rel.target_table).map(|t| t.name.as_str())
    }

    pub fn find_field(&self, id: FieldId) -> Option<(&Table, &Field)> {
        self.tables
            .iter()
            .find_map(|t| t.field(id).map(|f| (t, f)))
    }

    pub fn relationships_for(&self, id: TableId) -> Vec<(usize, &Relationship)> {
        self.table(id)
            .map(|t| t.relationships.iter().enumerate().collect())
            .unwrap_or_default()
    }

    pub fn add_table(&mut self, name: &str, fields: &[FieldDraft]) -> Result<TableId, StoreError> {
        let name = self.validate_name(name, None)?;
        let fields = build_fields(fields, &[])?;

        let step = self.tables.len() as f64 * STAGGER;
        let table = Table {
            id: TableId::new(),
            name,
            fields,
            relationships: Vec::new(),
            position: Position::new(ORIGIN + step, ORIGIN + step),
        };
        let id = table.id;
        info!(table = %id, name = %table.name, fields = table.fields.len(), "table added");
        self.tables.push(table);
        Ok(id)
    }

    /// Replaces name and fields. Id, position and relationships are kept.
    pub fn update_table(
        &mut self,
        id: TableId,
        name: &str,
        fields: &[FieldDraft],
    ) -> Result<(), StoreError> {
        let name = self.validate_name(name, Some(id))?;
        let table = self.table_mut(id).ok_or(StoreError::TableNotFound(id))?;
        let fields = build_fields(fields, &table.fields)?;

        table.name = name;
        table.fields = fields;
        info!(table = %id, name = %table.name, "table updated");
        Ok(())
    }

    /// Removes the table. Relationships elsewhere that point at it are left in place.
    pub fn delete_table(&mut self, id: TableId) -> Result<Table, StoreError> {
        let idx = self
            .tables
            .iter()
            .position(|t| t.id == id)
            .ok_or(StoreError::TableNotFound(id))?;
        let removed = self.tables.remove(idx);

        let orphaned = self
            .dangling_relationships()
            .iter()
            .filter(|d| d.target == id)
            .count();
        if orphaned > 0 {
            warn!(table = %id, orphaned, "deleted table is still referenced");
        }
        info!(table = %id, name = %removed.name, "table deleted");
        Ok(removed)
    }

    pub fn add_relationship(
        &mut self,
        source: TableId,
        local_field: &str,
        target: TableId,
        target_field: &str,
        kind: &str,
    ) -> Result<(), StoreError> {
        if local_field.is_empty() || target_field.is_empty() {
            return Err(StoreError::IncompleteRelationship);
        }
        if source == target {
            return Err(StoreError::SelfRelationship);
        }
        if self.table(target).is_none() {
            return Err(StoreError::TableNotFound(target));
        }
        let table = self
            .table_mut(source)
            .ok_or(StoreError::TableNotFound(source))?;

        if table
            .relationships
            .iter()
            .any(|r| r.same_link(local_field, target, target_field))
        {
            return Err(StoreError::DuplicateRelationship);
        }

        table.relationships.push(Relationship {
            kind: kind.to_string(),
            local_field: local_field.to_string(),
            target_table: target,
            target_field: target_field.to_string(),
        });
        info!(source = %source, target = %target, local_field, target_field, "relationship added");
        Ok(())
    }

    pub fn delete_relationship(
        &mut self,
        table: TableId,
        index: usize,
    ) -> Result<Relationship, StoreError> {
        let owner = self
            .table_mut(table)
            .ok_or(StoreError::TableNotFound(table))?;
        if index >= owner.relationships.len() {
            return Err(StoreError::RelationshipNotFound { table, index });
        }
        let removed = owner.relationships.remove(index);
        info!(table = %table, index, "relationship deleted");
        Ok(removed)
    }

    /// Writes a new position, clamped to the positive quadrant.
    pub fn set_position(&mut self, id: TableId, position: Position) -> Option<Position> {
        let table = self.table_mut(id)?;
        table.position = position.clamped();
        Some(table.position)
    }

    pub fn dangling_relationships(&self) -> Vec<DanglingRef> {
        let mut dangling = Vec::new();
        for table in &self.tables {
            for (index, rel) in table.relationships.iter().enumerate() {
                if self.table(rel.target_table).is_none() {
                    dangling.push(DanglingRef {
                        owner: table.id,
                        index,
                        target: rel.target_table,
                    });
                }
            }
        }
        dangling
    }

    fn validate_name(&self, name: &str, editing: Option<TableId>) -> Result<String, StoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::EmptyTableName);
        }
        if self
            .tables
            .iter()
            .any(|t| t.name == name && Some(t.id) != editing)
        {
            return Err(StoreError::DuplicateTableName(name.to_string()));
        }
        Ok(name.to_string())
    }
}

/// Drops blank drafts. Ids of previous fields are reused when a name survives an edit.
fn build_fields(drafts: &[FieldDraft], previous: &[Field]) -> Result<Vec<Field>, StoreError> {
    let mut reused: Vec<FieldId> = Vec::new();
    let fields: Vec<Field> = drafts
        .iter()
        .filter_map(|d| {
            let name = d.name.trim();
            if name.is_empty() {
                return None;
            }
            let id = previous
                .iter()
                .find(|f| f.name == name && !reused.contains(&f.id))
                .map(|f| f.id)
                .unwrap_or_default();
            reused.push(id);
            Some(Field::with_id(id, name, d.field_type))
        })
        .collect();

    if fields.is_empty() {
        return Err(StoreError::NoFields);
    }
    Ok(fields)
}
