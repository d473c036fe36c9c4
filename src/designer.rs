//! Entry point tying the store, interaction state, dialogs and renderers together.

use crate::canvas::{CanvasRenderer, Connector, Scene};
use crate::config::{DesignerConfig, Theme};
use crate::forms::{RelationshipForm, TableForm};
use crate::interaction::{Dialog, Interaction, Key, KeyAction, Settle, SettleWatcher};
use crate::layout::Viewport;
use crate::model::{FieldId, Position, TableId};
use crate::panel::{self, SidePanel};
use crate::store::GraphStore;
use crate::svg::SvgRenderer;
use tracing::{debug, warn};

/// Blocking prompts provided by the page.
pub trait Host {
    fn confirm(&mut self, message: &str) -> bool;
    fn alert(&mut self, message: &str);
}

/// What the page has to refresh after an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redraw {
    None,
    /// Highlighting and side panel only.
    Selection,
    /// Connector lines only.
    Relationships,
    /// A dialog opened or closed.
    Dialog,
    All,
}

impl Redraw {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Selection => "selection",
            Self::Relationships => "relationships",
            Self::Dialog => "dialog",
            Self::All => "all",
        }
    }
}

pub struct Designer<H: Host> {
    store: GraphStore,
    ui: Interaction,
    renderer: CanvasRenderer,
    config: DesignerConfig,
    watchers: Vec<SettleWatcher>,
    host: H,
}

impl<H: Host> Designer<H> {
    pub fn new(config: DesignerConfig, host: H) -> Self {
        Self {
            store: GraphStore::new(),
            ui: Interaction::new(),
            renderer: CanvasRenderer::new(config.metrics.clone()),
            config,
            watchers: Vec::new(),
            host,
        }
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub fn interaction(&self) -> &Interaction {
        &self.ui
    }

    pub fn config(&self) -> &DesignerConfig {
        &self.config
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn theme(&self) -> Theme {
        self.config.theme
    }

    pub fn set_theme(&mut self, theme: Theme) -> Redraw {
        self.config.theme = theme;
        Redraw::All
    }

    pub fn toggle_theme(&mut self) -> Redraw {
        self.set_theme(self.config.theme.toggled())
    }

    pub fn scene(&self) -> Scene {
        self.renderer.render(&self.store, &self.ui)
    }

    pub fn connectors(&self) -> Vec<Connector> {
        let blocks = self.renderer.render_tables(&self.store, &self.ui);
        self.renderer.render_relationships(&self.store, &blocks)
    }

    pub fn svg(&self) -> String {
        SvgRenderer::new(self.config.metrics.clone(), self.config.theme).render(&self.scene())
    }

    pub fn side_panel(&self) -> SidePanel {
        panel::build(&self.store, self.ui.selection())
    }

    pub fn dialog(&self) -> Option<&Dialog> {
        self.ui.dialog()
    }

    pub fn open_table_form(&mut self) -> Redraw {
        self.ui.open_dialog(Dialog::Table(TableForm::new()));
        Redraw::Dialog
    }

    pub fn edit_table(&mut self, id: TableId) -> Redraw {
        match self.store.table(id) {
            Some(table) => {
                let form = TableForm::edit(table);
                self.ui.open_dialog(Dialog::Table(form));
                Redraw::Dialog
            }
            None => Redraw::None,
        }
    }

    pub fn table_form_mut(&mut self) -> Option<&mut TableForm> {
        match self.ui.dialog_mut() {
            Some(Dialog::Table(form)) => Some(form),
            _ => None,
        }
    }

    /// Saves the open table dialog. On failure the host is alerted and the dialog stays open.
    pub fn save_table_form(&mut self) -> Option<TableId> {
        let Some(Dialog::Table(form)) = self.ui.dialog() else {
            return None;
        };
        match form.submit(&mut self.store) {
            Ok(id) => {
                self.ui.close_dialog();
                Some(id)
            }
            Err(e) => {
                warn!(error = %e, "table not saved");
                self.host.alert(&e.to_string());
                None
            }
        }
    }

    pub fn open_relationship_form(&mut self) -> Redraw {
        let form = RelationshipForm::new(self.config.default_kind());
        self.ui.open_dialog(Dialog::Relationship(form));
        Redraw::Dialog
    }

    pub fn relationship_form_mut(&mut self) -> Option<&mut RelationshipForm> {
        match self.ui.dialog_mut() {
            Some(Dialog::Relationship(form)) => Some(form),
            _ => None,
        }
    }

    pub fn save_relationship_form(&mut self) -> bool {
        let Some(Dialog::Relationship(form)) = self.ui.dialog() else {
            return false;
        };
        match form.submit(&mut self.store) {
            Ok(()) => {
                self.ui.close_dialog();
                true
            }
            Err(e) => {
                warn!(error = %e, "relationship not saved");
                self.host.alert(&e.to_string());
                false
            }
        }
    }

    pub fn close_dialog(&mut self) -> Redraw {
        match self.ui.close_dialog() {
            Some(_) => Redraw::Dialog,
            None => Redraw::None,
        }
    }

    pub fn delete_table(&mut self, id: TableId) -> bool {
        if self.store.table(id).is_none() {
            return false;
        }
        if !self
            .host
            .confirm("Are you sure you want to delete this table?")
        {
            return false;
        }
        if self.store.delete_table(id).is_err() {
            return false;
        }
        self.ui.forget_table(id);
        self.watchers.retain(|w| w.table != id);
        true
    }

    pub fn delete_relationship(&mut self, table: TableId, index: usize) -> bool {
        if index >= self.store.relationships_for(table).len() {
            return false;
        }
        if !self
            .host
            .confirm("Are you sure you want to delete this relationship?")
        {
            return false;
        }
        self.store.delete_relationship(table, index).is_ok()
    }

    pub fn select_table(&mut self, id: TableId) -> Redraw {
        self.ui.select_table(id);
        Redraw::Selection
    }

    pub fn select_field(&mut self, id: FieldId) -> Redraw {
        self.ui.select_field(id);
        Redraw::Selection
    }

    /// Click on empty canvas.
    pub fn click_canvas(&mut self) -> Redraw {
        self.ui.clear_selection();
        Redraw::Selection
    }

    /// Press on a table header. `pointer` is in canvas coordinates.
    pub fn pointer_down(&mut self, table: TableId, pointer: Position) -> Redraw {
        let Some(pos) = self.store.table(table).map(|t| t.position) else {
            return Redraw::None;
        };
        if self.ui.begin_drag(table, pointer, pos) {
            Redraw::Selection
        } else {
            Redraw::None
        }
    }

    /// Every move redraws the connectors; moves are not coalesced.
    pub fn pointer_move(&mut self, pointer: Position) -> Redraw {
        let Some((table, pos)) = self.ui.drag_to(pointer) else {
            return Redraw::None;
        };
        match self.store.set_position(table, pos) {
            Some(_) => Redraw::Relationships,
            None => Redraw::None,
        }
    }

    /// Ends a drag and watches the block until its transition settles.
    pub fn pointer_up(&mut self) -> Redraw {
        let Some(table) = self.ui.end_drag() else {
            return Redraw::None;
        };
        if let Some(pos) = self.store.table(table).map(|t| t.position) {
            self.watch(table, pos, pos);
        }
        Redraw::Relationships
    }

    pub fn key(&mut self, key: Key) -> Redraw {
        match self.ui.handle_key(key) {
            KeyAction::DeleteTable(id) => {
                if self.delete_table(id) {
                    Redraw::All
                } else {
                    Redraw::None
                }
            }
            KeyAction::CloseDialog => self.close_dialog(),
            KeyAction::None => Redraw::None,
        }
    }

    /// Arranges every table on a grid centered in the viewport.
    pub fn center_all(&mut self, viewport: Viewport) -> Redraw {
        if self.store.is_empty() {
            return Redraw::None;
        }
        let positions = self.config.grid.arrange(self.store.len(), viewport);
        let moves: Vec<(TableId, Position)> = self
            .store
            .tables()
            .iter()
            .map(|t| (t.id, t.position))
            .collect();

        for ((id, from), target) in moves.into_iter().zip(positions) {
            if let Some(placed) = self.store.set_position(id, target) {
                self.watch(id, from, placed);
            }
        }
        debug!(tables = self.store.len(), "tables centered");
        Redraw::All
    }

    fn watch(&mut self, table: TableId, from: Position, target: Position) {
        self.watchers.retain(|w| w.table != table);
        self.watchers.push(SettleWatcher::new(
            table,
            from,
            target,
            self.config.settle_frames,
        ));
    }

    pub fn is_settling(&self) -> bool {
        !self.watchers.is_empty()
    }

    /// Called once per animation frame with the positions the page currently shows.
    /// Returns fresh connectors when any watched block moved.
    pub fn animation_frame(&mut self, observed: &[(TableId, Position)]) -> Option<Vec<Connector>> {
        let mut moved = false;
        for watcher in &mut self.watchers {
            let rendered = observed
                .iter()
                .find(|(id, _)| *id == watcher.table)
                .map(|(_, pos)| *pos)
                .unwrap_or_else(|| watcher.target());
            if watcher.observe(rendered) == Settle::Moved {
                moved = true;
            }
        }
        self.watchers.retain(|w| !w.is_settled());

        if !moved {
            return None;
        }
        let blocks = self.renderer.render_tables_at(&self.store, &self.ui, observed);
        Some(self.renderer.render_relationships(&self.store, &blocks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FieldType;
    use crate::store::FieldDraft;

    #[derive(Default)]
    struct MockHost {
        refuse: bool,
        alerts: Vec<String>,
        confirms: usize,
    }

    impl Host for MockHost {
        fn confirm(&mut self, _message: &str) -> bool {
            self.confirms += 1;
            !self.refuse
        }

        fn alert(&mut self, message: &str) {
            self.alerts.push(message.to_string());
        }
    }

    fn designer() -> Designer<MockHost> {
        Designer::new(DesignerConfig::default(), MockHost::default())
    }

    fn create_table(d: &mut Designer<MockHost>, name: &str, fields: &[(&str, FieldType)]) -> TableId {
        d.open_table_form();
        let form = d.table_form_mut().unwrap();
        form.name = name.to_string();
        form.rows = fields.iter().map(|(n, t)| FieldDraft::new(*n, *t)).collect();
        d.save_table_form().unwrap()
    }

    fn relate(d: &mut Designer<MockHost>, source: TableId, local: &str, target: TableId, field: &str) -> bool {
        d.open_relationship_form();
        let form = d.relationship_form_mut().unwrap();
        form.set_source_table(Some(source));
        form.source_field = Some(local.to_string());
        form.set_target_table(Some(target));
        form.target_field = Some(field.to_string());
        form.kind = "one-to-many".to_string();
        d.save_relationship_form()
    }

    fn users_and_orders(d: &mut Designer<MockHost>) -> (TableId, TableId) {
        let users = create_table(
            d,
            "users",
            &[
                ("id", FieldType::Integer),
                ("name", FieldType::String),
                ("email", FieldType::String),
            ],
        );
        let orders = create_table(
            d,
            "orders",
            &[
                ("id", FieldType::Integer),
                ("userId", FieldType::Integer),
                ("total", FieldType::Number),
            ],
        );
        (users, orders)
    }

    #[test]
    fn test_scenario_duplicate_relationship() {
        let mut d = designer();
        let (users, orders) = users_and_orders(&mut d);

        let users_table = d.store().table(users).unwrap();
        assert!(users_table.fields[0].is_primary);
        assert!(users_table.fields[1..].iter().all(|f| !f.is_primary && !f.is_foreign));
        assert!(d.store().table(orders).unwrap().fields[1].is_foreign);

        assert!(relate(&mut d, orders, "userId", users, "id"));
        assert!(d.dialog().is_none());
        assert!(!relate(&mut d, orders, "userId", users, "id"));

        assert_eq!(d.store().table(orders).unwrap().relationships.len(), 1);
        assert_eq!(d.host().alerts, vec!["This relationship already exists".to_string()]);
        // Rejected save keeps the dialog open for correction
        assert!(matches!(d.dialog(), Some(Dialog::Relationship(_))));
    }

    #[test]
    fn test_scenario_delete_target_leaves_dangling() {
        let mut d = designer();
        let (users, orders) = users_and_orders(&mut d);
        relate(&mut d, orders, "userId", users, "id");

        d.select_table(users);
        assert_eq!(d.key(Key::Delete), Redraw::All);
        assert_eq!(d.host().confirms, 1);
        assert!(d.store().table(users).is_none());
        assert_eq!(d.interaction().selection().table(), None);

        assert_eq!(d.store().table(orders).unwrap().relationships.len(), 1);
        let scene = d.scene();
        assert_eq!(scene.tables.len(), 1);
        assert!(scene.connectors.is_empty());
    }

    #[test]
    fn test_invalid_table_keeps_dialog_open() {
        let mut d = designer();
        users_and_orders(&mut d);

        d.open_table_form();
        d.table_form_mut().unwrap().name = "users".into();
        assert_eq!(d.save_table_form(), None);
        assert!(matches!(d.dialog(), Some(Dialog::Table(_))));
        assert_eq!(d.store().len(), 2);

        // The initial row is blank
        d.table_form_mut().unwrap().name = "audit".into();
        assert_eq!(d.save_table_form(), None);
        assert_eq!(
            d.host().alerts,
            vec![
                "A table named users already exists".to_string(),
                "Add at least one field".to_string()
            ]
        );

        assert_eq!(d.key(Key::Escape), Redraw::Dialog);
        assert!(d.dialog().is_none());
    }

    #[test]
    fn test_refused_confirmation_keeps_table() {
        let mut d = designer();
        let (users, _) = users_and_orders(&mut d);
        d.host_mut().refuse = true;
        assert!(!d.delete_table(users));
        assert!(d.store().table(users).is_some());
    }

    #[test]
    fn test_delete_relationship() {
        let mut d = designer();
        let (users, orders) = users_and_orders(&mut d);
        relate(&mut d, orders, "userId", users, "id");
        assert!(!d.delete_relationship(orders, 4));
        assert!(!d.delete_relationship(users, 0));
        // Nothing to delete, so nothing to confirm
        assert_eq!(d.host().confirms, 0);
        assert!(d.delete_relationship(orders, 0));
        assert_eq!(d.host().confirms, 1);
        assert!(d.store().table(orders).unwrap().relationships.is_empty());
    }

    #[test]
    fn test_edit_table() {
        let mut d = designer();
        let (users, _) = users_and_orders(&mut d);
        assert_eq!(d.edit_table(users), Redraw::Dialog);
        d.table_form_mut().unwrap().name = "customers".into();
        assert_eq!(d.save_table_form(), Some(users));
        assert_eq!(d.store().table(users).unwrap().name, "customers");
        assert_eq!(d.edit_table(TableId::new()), Redraw::None);
    }

    #[test]
    fn test_drag_clamps_and_redraws() {
        let mut d = designer();
        let (users, orders) = users_and_orders(&mut d);
        relate(&mut d, orders, "userId", users, "id");

        assert_eq!(d.pointer_down(orders, Position::new(160.0, 155.0)), Redraw::Selection);
        assert_eq!(d.interaction().selection().table(), Some(orders));
        assert!(d.scene().tables[1].dragging);

        for (x, y) in [(300.0, 400.0), (-80.0, 2.0), (5.0, -900.0)] {
            assert_eq!(d.pointer_move(Position::new(x, y)), Redraw::Relationships);
            let pos = d.store().table(orders).unwrap().position;
            assert!(pos.x >= 0.0 && pos.y >= 0.0);
        }
        assert_eq!(d.store().table(orders).unwrap().position, Position::new(0.0, 0.0));

        assert_eq!(d.pointer_up(), Redraw::Relationships);
        assert!(d.is_settling());
        assert_eq!(d.pointer_move(Position::new(50.0, 50.0)), Redraw::None);
    }

    #[test]
    fn test_no_drag_with_dialog_open() {
        let mut d = designer();
        let (users, _) = users_and_orders(&mut d);
        d.open_relationship_form();
        assert_eq!(d.pointer_down(users, Position::new(110.0, 110.0)), Redraw::None);
        assert_eq!(d.pointer_move(Position::new(400.0, 400.0)), Redraw::None);
        assert_eq!(d.store().table(users).unwrap().position, Position::new(100.0, 100.0));
    }

    #[test]
    fn test_center_all_and_settle() {
        let mut d = designer();
        let (users, orders) = users_and_orders(&mut d);
        relate(&mut d, orders, "userId", users, "id");

        assert_eq!(d.center_all(Viewport::new(1000.0, 600.0)), Redraw::All);
        let users_pos = d.store().table(users).unwrap().position;
        let orders_pos = d.store().table(orders).unwrap().position;
        assert_eq!(users_pos, Position::new(260.0, 200.0));
        assert_eq!(orders_pos, Position::new(520.0, 200.0));

        // Mid-transition frame moves both blocks
        let halfway = [
            (users, Position::new(180.0, 150.0)),
            (orders, Position::new(335.0, 175.0)),
        ];
        let connectors = d.animation_frame(&halfway).unwrap();
        assert_eq!(connectors.len(), 1);
        assert!(d.animation_frame(&halfway).is_none());

        let done = [(users, users_pos), (orders, orders_pos)];
        let connectors = d.animation_frame(&done).unwrap();
        assert_eq!(connectors[0], d.connectors()[0]);
        assert!(!d.is_settling());
    }

    #[test]
    fn test_center_all_empty() {
        let mut d = designer();
        assert_eq!(d.center_all(Viewport::new(800.0, 600.0)), Redraw::None);
        assert!(d.animation_frame(&[]).is_none());
    }

    #[test]
    fn test_canvas_click_clears_selection() {
        let mut d = designer();
        let (users, _) = users_and_orders(&mut d);
        let field = d.store().table(users).unwrap().fields[1].id;
        d.select_field(field);
        assert_eq!(d.interaction().selection().field(), Some(field));
        d.click_canvas();
        assert_eq!(d.interaction().selection().field(), None);
        assert_eq!(d.interaction().selection().table(), None);
    }

    #[test]
    fn test_theme_changes_svg() {
        let mut d = designer();
        users_and_orders(&mut d);
        assert!(d.svg().contains(r#"data-theme="light""#));
        d.toggle_theme();
        assert_eq!(d.theme(), Theme::Dark);
        assert!(d.svg().contains(r#"data-theme="dark""#));
    }
}
