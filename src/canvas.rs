//! Projection of the graph store onto positioned blocks and connectors.

use crate::interaction::{Interaction, Selection};
use crate::measure::TextMetrics;
use crate::model::{FieldId, Position, Table, TableId};
use crate::store::GraphStore;
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum KeyBadge {
    Primary,
    Foreign,
}

impl KeyBadge {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Primary => "PK",
            Self::Foreign => "FK",
        }
    }

    pub fn class(&self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Foreign => "foreign",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldRow {
    pub id: String,
    pub icon: &'static str,
    pub name: String,
    pub type_label: &'static str,
    pub badge: Option<KeyBadge>,
    pub selected: bool,
}

/// One table as drawn on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableBlock {
    #[serde(skip)]
    pub table: TableId,
    /// Element id.
    pub id: String,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub selected: bool,
    /// Set while the block follows the pointer; transitions are suppressed.
    pub dragging: bool,
    pub rows: Vec<FieldRow>,
}

impl TableBlock {
    pub fn right_center(&self) -> (f64, f64) {
        (self.x + self.width, self.y + self.height / 2.0)
    }

    pub fn left_center(&self) -> (f64, f64) {
        (self.x, self.y + self.height / 2.0)
    }
}

/// Straight line between two blocks, expressed the way a rotated line element needs it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Connector {
    #[serde(skip)]
    pub source: TableId,
    #[serde(skip)]
    pub target: TableId,
    /// Position in the source table's relationship list.
    pub index: usize,
    pub kind: String,
    pub label: String,
    pub from: (f64, f64),
    pub to: (f64, f64),
    pub length: f64,
    /// Rotation around `from`, in degrees.
    pub angle: f64,
}

impl Connector {
    fn between(from: (f64, f64), to: (f64, f64)) -> (f64, f64) {
        let dx = to.0 - from.0;
        let dy = to.1 - from.1;
        ((dx * dx + dy * dy).sqrt(), dy.atan2(dx).to_degrees())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scene {
    pub tables: Vec<TableBlock>,
    pub connectors: Vec<Connector>,
    /// Extent of all blocks plus a margin.
    pub width: f64,
    pub height: f64,
}

pub struct CanvasRenderer {
    metrics: TextMetrics,
    margin: f64,
}

impl Default for CanvasRenderer {
    fn default() -> Self {
        Self::new(TextMetrics::default())
    }
}

impl CanvasRenderer {
    pub fn new(metrics: TextMetrics) -> Self {
        Self {
            metrics,
            margin: 40.0,
        }
    }

    /// Full re-render of blocks and connectors.
    pub fn render(&self, store: &GraphStore, ui: &Interaction) -> Scene {
        let tables = self.render_tables(store, ui);
        let connectors = self.render_relationships(store, &tables);

        let width = tables
            .iter()
            .map(|t| t.x + t.width)
            .fold(0.0, f64::max)
            + self.margin;
        let height = tables
            .iter()
            .map(|t| t.y + t.height)
            .fold(0.0, f64::max)
            + self.margin;

        debug!(
            tables = tables.len(),
            connectors = connectors.len(),
            "scene rendered"
        );
        Scene {
            tables,
            connectors,
            width,
            height,
        }
    }

    pub fn render_tables(&self, store: &GraphStore, ui: &Interaction) -> Vec<TableBlock> {
        let selection = ui.selection();
        let dragging = ui.dragging();
        store
            .tables()
            .iter()
            .map(|t| self.block(t, t.position, selection, dragging == Some(t.id)))
            .collect()
    }

    /// Blocks at explicit positions, used while transitions are still moving them.
    pub fn render_tables_at(
        &self,
        store: &GraphStore,
        ui: &Interaction,
        observed: &[(TableId, Position)],
    ) -> Vec<TableBlock> {
        let overrides: HashMap<TableId, Position> = observed.iter().copied().collect();
        let selection = ui.selection();
        store
            .tables()
            .iter()
            .map(|t| {
                let pos = overrides.get(&t.id).copied().unwrap_or(t.position);
                self.block(t, pos, selection, false)
            })
            .collect()
    }

    fn block(
        &self,
        table: &Table,
        position: Position,
        selection: Selection,
        dragging: bool,
    ) -> TableBlock {
        let (width, height) = self.metrics.table_size(&table.name, &table.fields);
        let selected_field: Option<FieldId> = selection.field();

        let rows = table
            .fields
            .iter()
            .map(|f| FieldRow {
                id: f.id.to_string(),
                icon: f.field_type.icon(),
                name: f.name.clone(),
                type_label: f.field_type.as_str(),
                badge: if f.is_primary {
                    Some(KeyBadge::Primary)
                } else if f.is_foreign {
                    Some(KeyBadge::Foreign)
                } else {
                    None
                },
                selected: selected_field == Some(f.id),
            })
            .collect();

        TableBlock {
            table: table.id,
            id: table.id.to_string(),
            name: table.name.clone(),
            x: position.x,
            y: position.y,
            width,
            height,
            selected: selection == Selection::Table(table.id),
            dragging,
            rows,
        }
    }

    /// Connectors from each source block's right edge to its target's left edge.
    /// Relationships whose tables have no block are skipped.
    pub fn render_relationships(&self, store: &GraphStore, blocks: &[TableBlock]) -> Vec<Connector> {
        let by_id: HashMap<TableId, &TableBlock> = blocks.iter().map(|b| (b.table, b)).collect();

        let mut connectors = Vec::new();
        for table in store.tables() {
            let Some(source) = by_id.get(&table.id) else {
                continue;
            };
            for (index, rel) in table.relationships.iter().enumerate() {
                let Some(target) = by_id.get(&rel.target_table) else {
                    continue;
                };

                let from = source.right_center();
                let to = target.left_center();
                let (length, angle) = Connector::between(from, to);
                connectors.push(Connector {
                    source: table.id,
                    target: rel.target_table,
                    index,
                    kind: rel.kind.clone(),
                    label: format!("{} → {}.{}", rel.local_field, target.name, rel.target_field),
                    from,
                    to,
                    length,
                    angle,
                });
            }
        }
        connectors
    }
}
