use crate::canvas::{Connector, Scene, TableBlock};
use crate::config::Theme;
use crate::measure::TextMetrics;
use std::fmt::Write;

struct Palette {
    canvas: &'static str,
    table_bg: &'static str,
    header_bg: &'static str,
    border: &'static str,
    selected: &'static str,
    text: &'static str,
    muted: &'static str,
    primary: &'static str,
    foreign: &'static str,
    edge: &'static str,
}

impl Palette {
    fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Light => Self {
                canvas: "#f8f9fa",
                table_bg: "#fff",
                header_bg: "#e9ecef",
                border: "#343a40",
                selected: "#0d6efd",
                text: "#212529",
                muted: "#6c757d",
                primary: "#ffc107",
                foreign: "#0dcaf0",
                edge: "#6c757d",
            },
            Theme::Dark => Self {
                canvas: "#212529",
                table_bg: "#2b3035",
                header_bg: "#343a40",
                border: "#adb5bd",
                selected: "#6ea8fe",
                text: "#f8f9fa",
                muted: "#adb5bd",
                primary: "#ffda6a",
                foreign: "#6edff6",
                edge: "#adb5bd",
            },
        }
    }
}

pub struct SvgRenderer {
    metrics: TextMetrics,
    theme: Theme,
}

impl Default for SvgRenderer {
    fn default() -> Self {
        Self {
            metrics: TextMetrics::default(),
            theme: Theme::Light,
        }
    }
}

impl SvgRenderer {
    pub fn new(metrics: TextMetrics, theme: Theme) -> Self {
        Self { metrics, theme }
    }

    pub fn render(&self, scene: &Scene) -> String {
        let mut svg = String::new();
        let p = Palette::for_theme(self.theme);

        writeln!(
            &mut svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}" data-theme="{}">"#,
            scene.width,
            scene.height,
            scene.width,
            scene.height,
            self.theme.as_str()
        )
        .unwrap();

        // Style
        writeln!(
            &mut svg,
            r#"<style>
  .canvas {{ fill: {}; }}
  .table-bg {{ fill: {}; }}
  .table-header {{ fill: {}; }}
  .table-border {{ fill: none; stroke: {}; stroke-width: 1.5; }}
  .canvas-table.selected .table-border {{ stroke: {}; stroke-width: 3; }}
  .table-name {{ font-family: sans-serif; font-size: 14px; font-weight: bold; fill: {}; }}
  .field-row.selected .field-name {{ fill: {}; }}
  .field-name {{ font-family: sans-serif; font-size: 12px; fill: {}; }}
  .field-type {{ font-family: monospace; font-size: 11px; fill: {}; }}
  .field-key {{ font-family: sans-serif; font-size: 10px; font-weight: bold; }}
  .field-key.primary {{ fill: {}; }}
  .field-key.foreign {{ fill: {}; }}
  .relationship-line {{ stroke: {}; stroke-width: 2; fill: none; }}
  .relationship-kind {{ font-family: sans-serif; font-size: 11px; fill: {}; }}
</style>"#,
            p.canvas,
            p.table_bg,
            p.header_bg,
            p.border,
            p.selected,
            p.text,
            p.selected,
            p.text,
            p.muted,
            p.primary,
            p.foreign,
            p.edge,
            p.muted
        )
        .unwrap();

        writeln!(
            &mut svg,
            r#"<rect class="canvas" x="0" y="0" width="{}" height="{}" />"#,
            scene.width, scene.height
        )
        .unwrap();

        // Connectors first (behind tables)
        for connector in &scene.connectors {
            self.render_connector(&mut svg, connector);
        }

        for table in &scene.tables {
            self.render_table(&mut svg, table);
        }

        writeln!(&mut svg, "</svg>").unwrap();
        svg
    }

    fn render_table(&self, svg: &mut String, block: &TableBlock) {
        let x = block.x;
        let y = block.y;
        let w = block.width;
        let header_h = self.metrics.header_height();

        let mut class = "canvas-table".to_string();
        if block.selected {
            class.push_str(" selected");
        }
        if block.dragging {
            class.push_str(" dragging");
        }
        writeln!(
            svg,
            r#"<g id="{}" class="{}" data-table-id="{}">"#,
            block.id, class, block.id
        )
        .unwrap();

        // 1. Background
        writeln!(
            svg,
            r#"<rect class="table-bg" x="{}" y="{}" width="{}" height="{}" rx="6" />"#,
            x, y, w, block.height
        )
        .unwrap();

        // 2. Header with square bottom corners
        writeln!(
            svg,
            r#"<rect class="table-header" x="{}" y="{}" width="{}" height="{}" rx="6" />"#,
            x, y, w, header_h
        )
        .unwrap();
        writeln!(
            svg,
            r#"<rect class="table-header" x="{}" y="{}" width="{}" height="{}" />"#,
            x,
            y + header_h - 6.0,
            w,
            6.0
        )
        .unwrap();

        // 3. Table name
        writeln!(
            svg,
            r#"<text class="table-name" x="{}" y="{}">{}</text>"#,
            x + self.metrics.padding_x,
            y + header_h / 2.0 + 5.0,
            escape_xml(&block.name)
        )
        .unwrap();

        // 4. Field rows
        let mut row_y = y + header_h + self.metrics.padding_y;
        for row in &block.rows {
            let baseline = row_y + self.metrics.line_height * 0.65;
            let class = if row.selected {
                "field-row selected"
            } else {
                "field-row"
            };
            writeln!(
                svg,
                r#"<g class="{}" data-field-id="{}" data-icon="{}">"#,
                class, row.id, row.icon
            )
            .unwrap();

            let name_x = x + self.metrics.padding_x + self.metrics.icon_width;
            writeln!(
                svg,
                r#"<text class="field-name" x="{}" y="{}">{}</text>"#,
                name_x,
                baseline,
                escape_xml(&row.name)
            )
            .unwrap();

            let type_x = name_x + self.metrics.text_width(&row.name) + self.metrics.column_gap;
            writeln!(
                svg,
                r#"<text class="field-type" x="{}" y="{}">{}</text>"#,
                type_x, baseline, row.type_label
            )
            .unwrap();

            if let Some(badge) = row.badge {
                writeln!(
                    svg,
                    r#"<text class="field-key {}" x="{}" y="{}" text-anchor="end">{}</text>"#,
                    badge.class(),
                    x + w - self.metrics.padding_x,
                    baseline,
                    badge.label()
                )
                .unwrap();
            }
            writeln!(svg, "</g>").unwrap();

            row_y += self.metrics.line_height;
        }

        // 5. Border (drawn last to be on top)
        writeln!(
            svg,
            r#"<rect class="table-border" x="{}" y="{}" width="{}" height="{}" rx="6" />"#,
            x, y, w, block.height
        )
        .unwrap();
        writeln!(svg, "</g>").unwrap();
    }

    fn render_connector(&self, svg: &mut String, connector: &Connector) {
        let (x1, y1) = connector.from;
        let (x2, y2) = connector.to;

        writeln!(
            svg,
            r#"<line class="relationship-line" x1="{}" y1="{}" x2="{}" y2="{}"><title>{}</title></line>"#,
            x1,
            y1,
            x2,
            y2,
            escape_xml(&connector.label)
        )
        .unwrap();

        if connector.length > 0.0 {
            let mid_x = (x1 + x2) / 2.0;
            let mid_y = (y1 + y2) / 2.0 - 5.0;
            writeln!(
                svg,
                r#"<text class="relationship-kind" x="{}" y="{}" text-anchor="middle">{}</text>"#,
                mid_x,
                mid_y,
                escape_xml(&connector.kind)
            )
            .unwrap();
        }
    }
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::CanvasRenderer;
    use crate::interaction::Interaction;
    use crate::model::FieldType;
    use crate::store::{FieldDraft, GraphStore};

    fn render(store: &GraphStore, theme: Theme) -> String {
        let scene = CanvasRenderer::default().render(store, &Interaction::new());
        SvgRenderer::new(TextMetrics::default(), theme).render(&scene)
    }

    #[test]
    fn test_render_basic() {
        let mut store = GraphStore::new();
        store
            .add_table(
                "users",
                &[
                    FieldDraft::new("id", FieldType::Integer),
                    FieldDraft::new("name", FieldType::String),
                ],
            )
            .unwrap();
        let svg = render(&store, Theme::Light);

        assert!(svg.contains("<svg"));
        assert!(svg.contains("users"));
        assert!(svg.contains(">PK</text>"));
        assert!(svg.contains("</svg>"));
    }

    #[test]
    fn test_render_escapes_names() {
        let mut store = GraphStore::new();
        store
            .add_table("a<b>&c", &[FieldDraft::new("x\"y", FieldType::String)])
            .unwrap();
        let svg = render(&store, Theme::Light);
        assert!(svg.contains("a&lt;b&gt;&amp;c"));
        assert!(svg.contains("x&quot;y"));
    }

    #[test]
    fn test_render_with_connectors() {
        let mut store = GraphStore::new();
        let users = store
            .add_table("users", &[FieldDraft::new("id", FieldType::Integer)])
            .unwrap();
        let orders = store
            .add_table(
                "orders",
                &[
                    FieldDraft::new("id", FieldType::Integer),
                    FieldDraft::new("userId", FieldType::Integer),
                ],
            )
            .unwrap();
        store
            .add_relationship(orders, "userId", users, "id", "one-to-many")
            .unwrap();
        let svg = render(&store, Theme::Dark);

        assert!(svg.contains(r#"class="relationship-line""#));
        assert!(svg.contains("one-to-many"));
        assert!(svg.contains(r#"data-theme="dark""#));
        assert!(svg.contains(">FK</text>"));
    }
}
