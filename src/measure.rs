use crate::model::Field;
use serde::{Deserialize, Serialize};
use unicode_width::UnicodeWidthStr;

/// Text and block metrics standing in for the browser's box measurements.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TextMetrics {
    pub char_width: f64,
    pub line_height: f64,
    pub padding_x: f64,
    pub padding_y: f64,
    pub header_padding: f64,
    pub icon_width: f64,
    pub badge_width: f64,
    pub column_gap: f64,
    pub min_table_width: f64,
    pub min_table_height: f64,
}

impl Default for TextMetrics {
    fn default() -> Self {
        Self {
            char_width: 8.0,
            line_height: 24.0,
            padding_x: 12.0,
            padding_y: 6.0,
            header_padding: 8.0,
            icon_width: 20.0,
            badge_width: 28.0,
            column_gap: 8.0,
            min_table_width: 220.0,
            min_table_height: 60.0,
        }
    }
}

impl TextMetrics {
    pub fn text_width(&self, text: &str) -> f64 {
        let width = UnicodeWidthStr::width(text);
        width as f64 * self.char_width
    }

    pub fn header_height(&self) -> f64 {
        self.line_height + self.header_padding * 2.0
    }

    /// Width of one field row: icon, name, type label and optional key badge.
    pub fn row_width(&self, field: &Field) -> f64 {
        let badge = if field.is_primary || field.is_foreign {
            self.badge_width + self.column_gap
        } else {
            0.0
        };
        self.icon_width
            + self.text_width(&field.name)
            + self.column_gap
            + self.text_width(field.field_type.as_str())
            + badge
    }

    pub fn table_size(&self, name: &str, fields: &[Field]) -> (f64, f64) {
        // Header also holds the edit and delete buttons
        let header_width = self.text_width(name) + self.icon_width * 2.0 + self.column_gap;

        let max_row_width = fields
            .iter()
            .map(|f| self.row_width(f))
            .fold(0.0, f64::max);

        let content_width = header_width.max(max_row_width) + self.padding_x * 2.0;
        let width = content_width.max(self.min_table_width);

        let body_height = if fields.is_empty() {
            0.0
        } else {
            fields.len() as f64 * self.line_height + self.padding_y * 2.0
        };

        let height = (self.header_height() + body_height).max(self.min_table_height);

        (width, height)
    }
}
