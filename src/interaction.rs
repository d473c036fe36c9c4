//! Selection, drag and dialog state of the canvas.

use crate::forms::{RelationshipForm, TableForm};
use crate::model::{FieldId, Position, TableId};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    None,
    Table(TableId),
    Field(FieldId),
}

impl Selection {
    pub fn table(&self) -> Option<TableId> {
        match self {
            Self::Table(id) => Some(*id),
            _ => None,
        }
    }

    pub fn field(&self) -> Option<FieldId> {
        match self {
            Self::Field(id) => Some(*id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drag {
    pub table: TableId,
    /// Pointer position relative to the table's top-left corner.
    pub offset: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Dialog {
    Table(TableForm),
    Relationship(RelationshipForm),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Mode {
    #[default]
    Idle,
    Dragging(Drag),
    Editing(Dialog),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Delete,
    Escape,
    Other,
}

impl Key {
    /// Maps a DOM `KeyboardEvent.key` value.
    pub fn from_dom(key: &str) -> Self {
        match key {
            "Delete" => Self::Delete,
            "Escape" => Self::Escape,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    None,
    DeleteTable(TableId),
    CloseDialog,
}

#[derive(Debug, Clone, Default)]
pub struct Interaction {
    selection: Selection,
    mode: Mode,
}

impl Interaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.mode, Mode::Editing(_))
    }

    pub fn dragging(&self) -> Option<TableId> {
        match self.mode {
            Mode::Dragging(drag) => Some(drag.table),
            _ => None,
        }
    }

    pub fn select_table(&mut self, id: TableId) {
        self.selection = Selection::Table(id);
    }

    pub fn select_field(&mut self, id: FieldId) {
        self.selection = Selection::Field(id);
    }

    pub fn clear_selection(&mut self) {
        self.selection = Selection::None;
    }

    /// Drops the selection if it points at the given table.
    pub fn forget_table(&mut self, id: TableId) {
        if self.selection == Selection::Table(id) {
            self.selection = Selection::None;
        }
        if self.dragging() == Some(id) {
            self.mode = Mode::Idle;
        }
    }

    /// Starts dragging a table by its header. Ignored while a dialog is open.
    pub fn begin_drag(&mut self, table: TableId, pointer: Position, table_pos: Position) -> bool {
        if self.is_editing() {
            return false;
        }
        let offset = Position::new(pointer.x - table_pos.x, pointer.y - table_pos.y);
        self.mode = Mode::Dragging(Drag { table, offset });
        self.selection = Selection::Table(table);
        debug!(table = %table, dx = offset.x, dy = offset.y, "drag started");
        true
    }

    /// New clamped position for the dragged table.
    pub fn drag_to(&self, pointer: Position) -> Option<(TableId, Position)> {
        match self.mode {
            Mode::Dragging(drag) => {
                let pos = Position::new(pointer.x - drag.offset.x, pointer.y - drag.offset.y);
                Some((drag.table, pos.clamped()))
            }
            _ => None,
        }
    }

    pub fn end_drag(&mut self) -> Option<TableId> {
        match self.mode {
            Mode::Dragging(drag) => {
                self.mode = Mode::Idle;
                debug!(table = %drag.table, "drag ended");
                Some(drag.table)
            }
            _ => None,
        }
    }

    /// Opening a dialog cancels any drag in progress.
    pub fn open_dialog(&mut self, dialog: Dialog) {
        self.mode = Mode::Editing(dialog);
    }

    pub fn dialog(&self) -> Option<&Dialog> {
        match &self.mode {
            Mode::Editing(dialog) => Some(dialog),
            _ => None,
        }
    }

    pub fn dialog_mut(&mut self) -> Option<&mut Dialog> {
        match &mut self.mode {
            Mode::Editing(dialog) => Some(dialog),
            _ => None,
        }
    }

    pub fn close_dialog(&mut self) -> Option<Dialog> {
        match std::mem::take(&mut self.mode) {
            Mode::Editing(dialog) => Some(dialog),
            other => {
                self.mode = other;
                None
            }
        }
    }

    pub fn handle_key(&self, key: Key) -> KeyAction {
        match key {
            Key::Delete => match (&self.mode, self.selection) {
                (Mode::Editing(_), _) => KeyAction::None,
                (_, Selection::Table(id)) => KeyAction::DeleteTable(id),
                _ => KeyAction::None,
            },
            Key::Escape if self.is_editing() => KeyAction::CloseDialog,
            _ => KeyAction::None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settle {
    /// Rendered position changed since the last frame.
    Moved,
    Unchanged,
    /// Watcher is done and can be dropped.
    Settled,
}

/// Follows a table's rendered position while a CSS transition plays out.
#[derive(Debug, Clone, PartialEq)]
pub struct SettleWatcher {
    pub table: TableId,
    target: Position,
    last: Position,
    frames_left: u32,
}

impl SettleWatcher {
    pub fn new(table: TableId, from: Position, target: Position, max_frames: u32) -> Self {
        Self {
            table,
            target,
            last: from,
            frames_left: max_frames,
        }
    }

    pub fn target(&self) -> Position {
        self.target
    }

    pub fn observe(&mut self, rendered: Position) -> Settle {
        if self.frames_left == 0 {
            return Settle::Settled;
        }
        self.frames_left -= 1;

        let moved = rendered != self.last;
        self.last = rendered;

        if rendered == self.target || self.frames_left == 0 {
            // Final frame still needs a redraw if it moved
            self.frames_left = 0;
            return if moved { Settle::Moved } else { Settle::Settled };
        }
        if moved { Settle::Moved } else { Settle::Unchanged }
    }

    pub fn is_settled(&self) -> bool {
        self.frames_left == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_exclusive() {
        let mut ui = Interaction::new();
        let table = TableId::new();
        let field = FieldId::new();

        ui.select_table(table);
        assert_eq!(ui.selection().table(), Some(table));
        ui.select_field(field);
        assert_eq!(ui.selection().table(), None);
        assert_eq!(ui.selection().field(), Some(field));
        ui.select_table(table);
        assert_eq!(ui.selection().field(), None);
        ui.clear_selection();
        assert_eq!(ui.selection(), Selection::None);
    }

    #[test]
    fn test_drag_offset_and_clamp() {
        let mut ui = Interaction::new();
        let table = TableId::new();
        assert!(ui.begin_drag(table, Position::new(130.0, 115.0), Position::new(100.0, 100.0)));
        assert_eq!(ui.selection(), Selection::Table(table));

        let (_, pos) = ui.drag_to(Position::new(330.0, 215.0)).unwrap();
        assert_eq!(pos, Position::new(300.0, 200.0));

        let (_, pos) = ui.drag_to(Position::new(-500.0, 5.0)).unwrap();
        assert_eq!(pos, Position::new(0.0, 0.0));

        assert_eq!(ui.end_drag(), Some(table));
        assert!(ui.drag_to(Position::new(1.0, 1.0)).is_none());
    }

    #[test]
    fn test_no_drag_while_editing() {
        let mut ui = Interaction::new();
        ui.open_dialog(Dialog::Table(TableForm::new()));
        assert!(!ui.begin_drag(TableId::new(), Position::default(), Position::default()));
        assert!(ui.is_editing());
    }

    #[test]
    fn test_dialog_cancels_drag() {
        let mut ui = Interaction::new();
        let table = TableId::new();
        ui.begin_drag(table, Position::default(), Position::default());
        ui.open_dialog(Dialog::Table(TableForm::new()));
        assert_eq!(ui.dragging(), None);
        assert!(ui.close_dialog().is_some());
        assert_eq!(*ui.mode(), Mode::Idle);
        assert!(ui.close_dialog().is_none());
    }

    #[test]
    fn test_keys() {
        let mut ui = Interaction::new();
        assert_eq!(ui.handle_key(Key::Delete), KeyAction::None);

        let table = TableId::new();
        ui.select_table(table);
        assert_eq!(ui.handle_key(Key::Delete), KeyAction::DeleteTable(table));
        assert_eq!(ui.handle_key(Key::Escape), KeyAction::None);

        ui.open_dialog(Dialog::Table(TableForm::new()));
        assert_eq!(ui.handle_key(Key::Escape), KeyAction::CloseDialog);
        // Typing Delete inside a dialog must not remove the table
        assert_eq!(ui.handle_key(Key::Delete), KeyAction::None);
        assert_eq!(Key::from_dom("Escape"), Key::Escape);
        assert_eq!(Key::from_dom("a"), Key::Other);
    }

    #[test]
    fn test_forget_table() {
        let mut ui = Interaction::new();
        let table = TableId::new();
        ui.begin_drag(table, Position::default(), Position::default());
        ui.forget_table(table);
        assert_eq!(ui.selection(), Selection::None);
        assert_eq!(ui.dragging(), None);
    }

    #[test]
    fn test_watcher_settles_on_target() {
        let table = TableId::new();
        let target = Position::new(200.0, 200.0);
        let mut w = SettleWatcher::new(table, Position::new(100.0, 100.0), target, 10);

        assert_eq!(w.observe(Position::new(150.0, 150.0)), Settle::Moved);
        assert_eq!(w.observe(Position::new(150.0, 150.0)), Settle::Unchanged);
        assert_eq!(w.observe(target), Settle::Moved);
        assert!(w.is_settled());
        assert_eq!(w.observe(target), Settle::Settled);
    }

    #[test]
    fn test_watcher_frame_budget() {
        let table = TableId::new();
        let mut w = SettleWatcher::new(
            table,
            Position::new(0.0, 0.0),
            Position::new(50.0, 50.0),
            2,
        );
        assert_eq!(w.observe(Position::new(0.0, 0.0)), Settle::Unchanged);
        assert_eq!(w.observe(Position::new(0.0, 0.0)), Settle::Settled);
        assert!(w.is_settled());
    }
}
