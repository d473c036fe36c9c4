pub mod canvas;
pub mod codec;
pub mod config;
pub mod designer;
pub mod envelope;
pub mod forms;
pub mod interaction;
pub mod layout;
pub mod measure;
pub mod model;
pub mod panel;
pub mod store;
pub mod svg;

use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::warn;
use wasm_bindgen::prelude::*;

use config::{DesignerConfig, Theme};
use designer::{Designer, Host};
use envelope::ApiPayload;
use forms::{RecordForm, RelationshipForm, TableForm};
use interaction::{Dialog, Key};
use layout::Viewport;
use model::{FieldId, FieldType, Position, TableId};

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

/// Page callbacks standing in for `window.confirm` and `window.alert`.
struct JsHost {
    confirm: Option<js_sys::Function>,
    alert: Option<js_sys::Function>,
}

impl Host for JsHost {
    fn confirm(&mut self, message: &str) -> bool {
        match &self.confirm {
            Some(f) => match f.call1(&JsValue::NULL, &JsValue::from_str(message)) {
                Ok(answer) => answer.as_bool().unwrap_or(false),
                Err(e) => {
                    warn!(error = ?e, "confirm callback threw");
                    false
                }
            },
            None => true,
        }
    }

    fn alert(&mut self, message: &str) {
        if let Some(f) = &self.alert {
            if let Err(e) = f.call1(&JsValue::NULL, &JsValue::from_str(message)) {
                warn!(error = ?e, message, "alert callback threw");
            }
        }
    }
}

#[derive(Deserialize)]
struct ObservedPosition {
    id: String,
    x: f64,
    y: f64,
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| e.to_string())
}

fn parse_field_type(raw: &str) -> Result<FieldType, String> {
    FieldType::from_str(raw).ok_or_else(|| format!("Unknown field type: {}", raw))
}

/// Schema designer bound to a canvas element on the page.
#[wasm_bindgen(js_name = "Designer")]
pub struct WasmDesigner {
    inner: Designer<JsHost>,
}

impl WasmDesigner {
    fn table_id(&self, raw: &str) -> Result<TableId, String> {
        self.inner
            .store()
            .tables()
            .iter()
            .find(|t| t.id.to_string() == raw)
            .map(|t| t.id)
            .ok_or_else(|| format!("Unknown table: {}", raw))
    }

    fn field_id(&self, raw: &str) -> Result<FieldId, String> {
        self.inner
            .store()
            .tables()
            .iter()
            .flat_map(|t| t.fields.iter())
            .find(|f| f.id.to_string() == raw)
            .map(|f| f.id)
            .ok_or_else(|| format!("Unknown field: {}", raw))
    }

    fn optional_table(&self, raw: &str) -> Result<Option<TableId>, String> {
        if raw.is_empty() {
            Ok(None)
        } else {
            self.table_id(raw).map(Some)
        }
    }

    fn table_form(&mut self) -> Result<&mut TableForm, String> {
        self.inner
            .table_form_mut()
            .ok_or_else(|| "No table dialog is open".to_string())
    }
}

#[wasm_bindgen(js_class = "Designer")]
impl WasmDesigner {
    #[wasm_bindgen(constructor)]
    pub fn new(
        config: Option<String>,
        confirm: Option<js_sys::Function>,
        alert: Option<js_sys::Function>,
    ) -> Result<WasmDesigner, String> {
        let config = match config.as_deref() {
            Some(raw) if !raw.trim().is_empty() => {
                serde_json::from_str::<DesignerConfig>(raw).map_err(|e| e.to_string())?
            }
            _ => DesignerConfig::default(),
        };
        Ok(Self {
            inner: Designer::new(config, JsHost { confirm, alert }),
        })
    }

    #[wasm_bindgen(js_name = "sceneJson")]
    pub fn scene_json(&self) -> Result<String, String> {
        to_json(&self.inner.scene())
    }

    #[wasm_bindgen(js_name = "connectorsJson")]
    pub fn connectors_json(&self) -> Result<String, String> {
        to_json(&self.inner.connectors())
    }

    pub fn svg(&self) -> String {
        self.inner.svg()
    }

    #[wasm_bindgen(js_name = "sidePanelJson")]
    pub fn side_panel_json(&self) -> Result<String, String> {
        to_json(&self.inner.side_panel())
    }

    /// Open dialog as JSON, `null` when none is open.
    #[wasm_bindgen(js_name = "dialogJson")]
    pub fn dialog_json(&self) -> Result<String, String> {
        let store = self.inner.store();
        let view = match self.inner.dialog() {
            None => Value::Null,
            Some(Dialog::Table(form)) => json!({
                "kind": "table",
                "title": form.title(),
                "name": form.name,
                "rows": form.rows.iter().map(|r| json!({
                    "name": r.name,
                    "type": r.field_type.as_str(),
                })).collect::<Vec<_>>(),
                "typeOptions": TableForm::type_options(),
            }),
            Some(Dialog::Relationship(form)) => json!({
                "kind": "relationship",
                "sourceTable": form.source_table.map(|id| id.to_string()),
                "sourceField": form.source_field,
                "targetTable": form.target_table.map(|id| id.to_string()),
                "targetField": form.target_field,
                "relationKind": form.kind,
                "tableOptions": RelationshipForm::table_options(store),
                "sourceFieldOptions": form.source_field_options(store),
                "targetFieldOptions": form.target_field_options(store),
                "kindOptions": self.inner.config().relation_kinds,
            }),
        };
        to_json(&view)
    }

    pub fn theme(&self) -> String {
        self.inner.theme().as_str().to_string()
    }

    #[wasm_bindgen(js_name = "setTheme")]
    pub fn set_theme(&mut self, theme: &str) -> Result<String, String> {
        let theme = Theme::from_str(theme).ok_or_else(|| format!("Unknown theme: {}", theme))?;
        Ok(self.inner.set_theme(theme).as_str().to_string())
    }

    #[wasm_bindgen(js_name = "toggleTheme")]
    pub fn toggle_theme(&mut self) -> String {
        self.inner.toggle_theme().as_str().to_string()
    }

    #[wasm_bindgen(js_name = "openTableForm")]
    pub fn open_table_form(&mut self) -> String {
        self.inner.open_table_form().as_str().to_string()
    }

    #[wasm_bindgen(js_name = "editTable")]
    pub fn edit_table(&mut self, id: &str) -> Result<String, String> {
        let id = self.table_id(id)?;
        Ok(self.inner.edit_table(id).as_str().to_string())
    }

    #[wasm_bindgen(js_name = "setTableName")]
    pub fn set_table_name(&mut self, name: &str) -> Result<(), String> {
        self.table_form()?.name = name.to_string();
        Ok(())
    }

    #[wasm_bindgen(js_name = "addFieldRow")]
    pub fn add_field_row(&mut self) -> Result<(), String> {
        self.table_form()?.add_row();
        Ok(())
    }

    #[wasm_bindgen(js_name = "removeFieldRow")]
    pub fn remove_field_row(&mut self, index: usize) -> Result<bool, String> {
        Ok(self.table_form()?.remove_row(index))
    }

    #[wasm_bindgen(js_name = "setFieldRow")]
    pub fn set_field_row(
        &mut self,
        index: usize,
        name: &str,
        field_type: &str,
    ) -> Result<bool, String> {
        let field_type = parse_field_type(field_type)?;
        Ok(self.table_form()?.set_row(index, name, field_type))
    }

    /// Saved table id, or `undefined` when validation failed and the page was alerted.
    #[wasm_bindgen(js_name = "saveTableForm")]
    pub fn save_table_form(&mut self) -> Option<String> {
        self.inner.save_table_form().map(|id| id.to_string())
    }

    #[wasm_bindgen(js_name = "openRelationshipForm")]
    pub fn open_relationship_form(&mut self) -> String {
        self.inner.open_relationship_form().as_str().to_string()
    }

    /// Updates the relationship dialog. Empty strings leave a select unset.
    #[wasm_bindgen(js_name = "setRelationship")]
    pub fn set_relationship(
        &mut self,
        source_table: &str,
        source_field: &str,
        target_table: &str,
        target_field: &str,
        kind: &str,
    ) -> Result<(), String> {
        let source = self.optional_table(source_table)?;
        let target = self.optional_table(target_table)?;
        let form = self
            .inner
            .relationship_form_mut()
            .ok_or_else(|| "No relationship dialog is open".to_string())?;

        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
        form.set_source_table(source);
        form.source_field = non_empty(source_field);
        form.set_target_table(target);
        form.target_field = non_empty(target_field);
        if !kind.is_empty() {
            form.kind = kind.to_string();
        }
        Ok(())
    }

    #[wasm_bindgen(js_name = "saveRelationshipForm")]
    pub fn save_relationship_form(&mut self) -> bool {
        self.inner.save_relationship_form()
    }

    #[wasm_bindgen(js_name = "closeDialog")]
    pub fn close_dialog(&mut self) -> String {
        self.inner.close_dialog().as_str().to_string()
    }

    #[wasm_bindgen(js_name = "deleteTable")]
    pub fn delete_table(&mut self, id: &str) -> Result<bool, String> {
        let id = self.table_id(id)?;
        Ok(self.inner.delete_table(id))
    }

    #[wasm_bindgen(js_name = "deleteRelationship")]
    pub fn delete_relationship(&mut self, table: &str, index: usize) -> Result<bool, String> {
        let table = self.table_id(table)?;
        Ok(self.inner.delete_relationship(table, index))
    }

    #[wasm_bindgen(js_name = "selectTable")]
    pub fn select_table(&mut self, id: &str) -> Result<String, String> {
        let id = self.table_id(id)?;
        Ok(self.inner.select_table(id).as_str().to_string())
    }

    #[wasm_bindgen(js_name = "selectField")]
    pub fn select_field(&mut self, id: &str) -> Result<String, String> {
        let id = self.field_id(id)?;
        Ok(self.inner.select_field(id).as_str().to_string())
    }

    #[wasm_bindgen(js_name = "clickCanvas")]
    pub fn click_canvas(&mut self) -> String {
        self.inner.click_canvas().as_str().to_string()
    }

    #[wasm_bindgen(js_name = "pointerDown")]
    pub fn pointer_down(&mut self, table: &str, x: f64, y: f64) -> Result<String, String> {
        let table = self.table_id(table)?;
        Ok(self
            .inner
            .pointer_down(table, Position::new(x, y))
            .as_str()
            .to_string())
    }

    #[wasm_bindgen(js_name = "pointerMove")]
    pub fn pointer_move(&mut self, x: f64, y: f64) -> String {
        self.inner
            .pointer_move(Position::new(x, y))
            .as_str()
            .to_string()
    }

    #[wasm_bindgen(js_name = "pointerUp")]
    pub fn pointer_up(&mut self) -> String {
        self.inner.pointer_up().as_str().to_string()
    }

    #[wasm_bindgen(js_name = "keyDown")]
    pub fn key_down(&mut self, key: &str) -> String {
        self.inner.key(Key::from_dom(key)).as_str().to_string()
    }

    #[wasm_bindgen(js_name = "centerAll")]
    pub fn center_all(&mut self, width: f64, height: f64) -> String {
        self.inner
            .center_all(Viewport::new(width, height))
            .as_str()
            .to_string()
    }

    #[wasm_bindgen(js_name = "isSettling")]
    pub fn is_settling(&self) -> bool {
        self.inner.is_settling()
    }

    /// Takes `[{id, x, y}]` as currently shown; returns connector JSON when lines must be redrawn.
    #[wasm_bindgen(js_name = "animationFrame")]
    pub fn animation_frame(&mut self, observed: &str) -> Result<Option<String>, String> {
        let observed: Vec<ObservedPosition> =
            serde_json::from_str(observed).map_err(|e| e.to_string())?;
        let mut positions = Vec::with_capacity(observed.len());
        for o in observed {
            // Blocks the store no longer knows are ignored
            if let Ok(id) = self.table_id(&o.id) {
                positions.push((id, Position::new(o.x, o.y)));
            }
        }
        match self.inner.animation_frame(&positions) {
            Some(connectors) => to_json(&connectors).map(Some),
            None => Ok(None),
        }
    }

    /// Raw input strings for editing `record` in the given table's form.
    #[wasm_bindgen(js_name = "recordInputs")]
    pub fn record_inputs(&self, table: &str, record: Option<String>) -> Result<String, String> {
        let id = self.table_id(table)?;
        let fields = self
            .inner
            .store()
            .table(id)
            .map(|t| t.fields.as_slice())
            .unwrap_or_default();
        let form = match record.as_deref() {
            Some(raw) => {
                let value: Value = serde_json::from_str(raw).map_err(|e| e.to_string())?;
                RecordForm::populate(fields, &value)
            }
            None => RecordForm::blank(fields),
        };
        let inputs: Vec<Value> = form
            .inputs
            .iter()
            .map(|i| {
                json!({
                    "field": i.field,
                    "type": i.field_type.as_str(),
                    "icon": i.field_type.icon(),
                    "value": i.raw,
                })
            })
            .collect();
        to_json(&inputs)
    }

    /// Typed record body from `{field: text}` inputs; fails listing every invalid field.
    #[wasm_bindgen(js_name = "collectRecord")]
    pub fn collect_record(&self, table: &str, inputs: &str) -> Result<String, String> {
        let id = self.table_id(table)?;
        let fields = self
            .inner
            .store()
            .table(id)
            .map(|t| t.fields.as_slice())
            .unwrap_or_default();
        let raw: Map<String, Value> = serde_json::from_str(inputs).map_err(|e| e.to_string())?;

        let mut form = RecordForm::blank(fields);
        for (field, value) in &raw {
            if let Some(text) = value.as_str() {
                form.set(field, text);
            }
        }
        match form.collect() {
            Ok(body) => to_json(&body),
            Err(errors) => Err(errors
                .iter()
                .map(|e| format!("{}: {}", e.field, e.error))
                .collect::<Vec<_>>()
                .join("\n")),
        }
    }
}

/// Unwrap a FlexBase API response body to its data, as JSON
#[wasm_bindgen(js_name = "unwrapResponse")]
pub fn unwrap_response(body: &str) -> Result<String, String> {
    let payload: ApiPayload<Value> = serde_json::from_str(body).map_err(|e| e.to_string())?;
    let data = payload.into_data().map_err(|e| e.to_string())?;
    to_json(&data)
}

/// `Authorization` header value for a session token
#[wasm_bindgen(js_name = "bearerHeader")]
pub fn bearer_header(token: &str) -> String {
    envelope::bearer_header(token).1
}
