//! Dialog state for creating and editing tables, relationships and records.

use crate::codec::{CodecError, FieldValue};
use crate::model::{Field, FieldType, Table, TableId};
use crate::store::{FieldDraft, GraphStore, StoreError};
use serde::Serialize;
use serde_json::{Map, Value};

/// One entry of a select element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableForm {
    /// Table being edited, `None` when creating.
    pub editing: Option<TableId>,
    pub name: String,
    pub rows: Vec<FieldDraft>,
}

impl TableForm {
    /// Blank form with one empty field row.
    pub fn new() -> Self {
        Self {
            editing: None,
            name: String::new(),
            rows: vec![FieldDraft::new("", FieldType::default())],
        }
    }

    pub fn edit(table: &Table) -> Self {
        Self {
            editing: Some(table.id),
            name: table.name.clone(),
            rows: table
                .fields
                .iter()
                .map(|f| FieldDraft::new(f.name.clone(), f.field_type))
                .collect(),
        }
    }

    pub fn title(&self) -> &'static str {
        match self.editing {
            Some(_) => "Edit Table",
            None => "New Table",
        }
    }

    pub fn add_row(&mut self) {
        self.rows.push(FieldDraft::new("", FieldType::default()));
    }

    pub fn remove_row(&mut self, index: usize) -> bool {
        if index < self.rows.len() {
            self.rows.remove(index);
            true
        } else {
            false
        }
    }

    pub fn set_row(&mut self, index: usize, name: &str, field_type: FieldType) -> bool {
        match self.rows.get_mut(index) {
            Some(row) => {
                row.name = name.to_string();
                row.field_type = field_type;
                true
            }
            None => false,
        }
    }

    pub fn type_options() -> Vec<SelectOption> {
        FieldType::ALL
            .iter()
            .map(|t| SelectOption {
                value: t.as_str().to_string(),
                label: t.display_name().to_string(),
            })
            .collect()
    }

    pub fn submit(&self, store: &mut GraphStore) -> Result<TableId, StoreError> {
        match self.editing {
            Some(id) => store.update_table(id, &self.name, &self.rows).map(|_| id),
            None => store.add_table(&self.name, &self.rows),
        }
    }
}

impl Default for TableForm {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipForm {
    pub source_table: Option<TableId>,
    pub source_field: Option<String>,
    pub target_table: Option<TableId>,
    pub target_field: Option<String>,
    pub kind: String,
}

impl RelationshipForm {
    pub fn new(default_kind: impl Into<String>) -> Self {
        Self {
            source_table: None,
            source_field: None,
            target_table: None,
            target_field: None,
            kind: default_kind.into(),
        }
    }

    pub fn table_options(store: &GraphStore) -> Vec<SelectOption> {
        store
            .tables()
            .iter()
            .map(|t| SelectOption {
                value: t.id.to_string(),
                label: t.name.clone(),
            })
            .collect()
    }

    /// Changing the table invalidates the dependent field select.
    pub fn set_source_table(&mut self, table: Option<TableId>) {
        if self.source_table != table {
            self.source_field = None;
        }
        self.source_table = table;
    }

    pub fn set_target_table(&mut self, table: Option<TableId>) {
        if self.target_table != table {
            self.target_field = None;
        }
        self.target_table = table;
    }

    pub fn source_field_options(&self, store: &GraphStore) -> Vec<SelectOption> {
        field_options(store, self.source_table)
    }

    pub fn target_field_options(&self, store: &GraphStore) -> Vec<SelectOption> {
        field_options(store, self.target_table)
    }

    pub fn submit(&self, store: &mut GraphStore) -> Result<(), StoreError> {
        let (Some(source), Some(target)) = (self.source_table, self.target_table) else {
            return Err(StoreError::IncompleteRelationship);
        };
        store.add_relationship(
            source,
            self.source_field.as_deref().unwrap_or_default(),
            target,
            self.target_field.as_deref().unwrap_or_default(),
            &self.kind,
        )
    }
}

fn field_options(store: &GraphStore, table: Option<TableId>) -> Vec<SelectOption> {
    table
        .and_then(|id| store.table(id))
        .map(|t| {
            t.fields
                .iter()
                .map(|f| SelectOption {
                    value: f.name.clone(),
                    label: format!("{} ({})", f.name, f.field_type),
                })
                .collect()
        })
        .unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordInput {
    pub field: String,
    pub field_type: FieldType,
    pub raw: String,
}

/// Input whose text does not decode for its type.
#[derive(Debug, Clone, PartialEq)]
pub struct InputError {
    pub field: String,
    pub error: CodecError,
}

/// Editable record of a designed table. Primary keys are server-assigned and skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordForm {
    pub inputs: Vec<RecordInput>,
}

impl RecordForm {
    pub fn blank(fields: &[Field]) -> Self {
        Self {
            inputs: fields
                .iter()
                .filter(|f| !f.is_primary)
                .map(|f| RecordInput {
                    field: f.name.clone(),
                    field_type: f.field_type,
                    raw: String::new(),
                })
                .collect(),
        }
    }

    /// Fills inputs from a stored record. Values that do not read as their type stay blank.
    pub fn populate(fields: &[Field], record: &Value) -> Self {
        let mut form = Self::blank(fields);
        for input in &mut form.inputs {
            let Some(value) = record.get(&input.field) else {
                continue;
            };
            if let Ok(Some(v)) = input.field_type.from_json(value) {
                input.raw = input.field_type.encode(&v);
            }
        }
        form
    }

    pub fn set(&mut self, field: &str, raw: &str) -> bool {
        match self.inputs.iter_mut().find(|i| i.field == field) {
            Some(input) => {
                input.raw = raw.to_string();
                true
            }
            None => false,
        }
    }

    pub fn validate(&self) -> Vec<InputError> {
        self.inputs
            .iter()
            .filter_map(|i| {
                i.field_type.decode(&i.raw).err().map(|error| InputError {
                    field: i.field.clone(),
                    error,
                })
            })
            .collect()
    }

    /// Typed JSON object of the non-blank inputs.
    pub fn collect(&self) -> Result<Map<String, Value>, Vec<InputError>> {
        let errors = self.validate();
        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(self
            .inputs
            .iter()
            .filter_map(|i| {
                let value: Option<FieldValue> = i.field_type.decode(&i.raw).ok().flatten();
                value.map(|v| (i.field.clone(), v.to_json()))
            })
            .collect())
    }
}
