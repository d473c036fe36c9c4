//! Sidebar table list and properties view.

use crate::interaction::Selection;
use crate::store::GraphStore;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableListItem {
    pub id: String,
    pub name: String,
    pub field_count: usize,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelationshipLine {
    /// Index to pass back when deleting.
    pub index: usize,
    pub kind: String,
    pub label: String,
    pub dangling: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Properties {
    Empty,
    Table {
        name: String,
        field_count: usize,
        x: i64,
        y: i64,
        relationships: Vec<RelationshipLine>,
    },
    Field {
        name: String,
        field_type: &'static str,
        primary: bool,
        foreign: bool,
    },
    /// Selection points at something that no longer exists.
    Missing,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SidePanel {
    pub tables: Vec<TableListItem>,
    pub properties: Properties,
}

pub fn build(store: &GraphStore, selection: Selection) -> SidePanel {
    let tables = store
        .tables()
        .iter()
        .map(|t| TableListItem {
            id: t.id.to_string(),
            name: t.name.clone(),
            field_count: t.fields.len(),
            active: selection == Selection::Table(t.id),
        })
        .collect();

    SidePanel {
        tables,
        properties: properties(store, selection),
    }
}

fn properties(store: &GraphStore, selection: Selection) -> Properties {
    match selection {
        Selection::None => Properties::Empty,
        Selection::Table(id) => {
            let Some(table) = store.table(id) else {
                return Properties::Missing;
            };
            let relationships = table
                .relationships
                .iter()
                .enumerate()
                .map(|(index, rel)| {
                    let target = store.target_name(rel);
                    RelationshipLine {
                        index,
                        kind: rel.kind.clone(),
                        label: format!(
                            "{} → {}.{}",
                            rel.local_field,
                            target.unwrap_or("?"),
                            rel.target_field
                        ),
                        dangling: target.is_none(),
                    }
                })
                .collect();
            Properties::Table {
                name: table.name.clone(),
                field_count: table.fields.len(),
                x: table.position.x.round() as i64,
                y: table.position.y.round() as i64,
                relationships,
            }
        }
        Selection::Field(id) => match store.find_field(id) {
            Some((_, field)) => Properties::Field {
                name: field.name.clone(),
                field_type: field.field_type.as_str(),
                primary: field.is_primary,
                foreign: field.is_foreign,
            },
            None => Properties::Missing,
        },
    }
}
