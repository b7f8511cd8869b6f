//! HTML output: module script tags, modulepreload links, the import map and
//! per-module JSON data blocks.

use crate::domain::{Placement, Priority};
use crate::error::Result;
use crate::plan::{DataEntry, EmissionPlan, LoadTag, PreloadEntry, TableEntry};

/// Default id of the import map script element.
pub const DEFAULT_IMPORTMAP_ID: &str = "wp-importmap";

/// Default id prefix of module data script elements.
pub const DEFAULT_DATA_ID_PREFIX: &str = "wp-script-module-data-";

#[derive(Debug, Clone)]
pub struct HtmlWriter {
    importmap_id: String,
    data_id_prefix: String,
    /// Emit `data-wp-fetchpriority` with the declared value when propagation changed it
    annotate_declared_priority: bool,
}

impl Default for HtmlWriter {
    fn default() -> Self {
        Self {
            importmap_id: DEFAULT_IMPORTMAP_ID.to_string(),
            data_id_prefix: DEFAULT_DATA_ID_PREFIX.to_string(),
            annotate_declared_priority: true,
        }
    }
}

impl HtmlWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_importmap_id(mut self, id: impl Into<String>) -> Self {
        self.importmap_id = id.into();
        self
    }

    pub fn with_data_id_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.data_id_prefix = prefix.into();
        self
    }

    pub fn with_declared_priority(mut self, annotate: bool) -> Self {
        self.annotate_declared_priority = annotate;
        self
    }

    /// `<script type="module">` for an enqueued module.
    pub fn load_tag(&self, tag: &LoadTag) -> String {
        let mut out = format!(
            r#"<script type="module" src="{}" id="{}-js-module""#,
            escape_attr(&tag.src),
            escape_attr(&tag.id)
        );
        self.push_priority(&mut out, tag.priority, tag.priority_changed().then_some(tag.declared_priority));
        out.push_str("></script>");
        out
    }

    /// `<link rel="modulepreload">` for a statically imported dependency.
    pub fn preload_link(&self, entry: &PreloadEntry) -> String {
        let mut out = format!(
            r#"<link rel="modulepreload" href="{}" id="{}-js-modulepreload""#,
            escape_attr(&entry.href),
            escape_attr(&entry.id)
        );
        self.push_priority(&mut out, entry.priority, entry.priority_changed().then_some(entry.declared_priority));
        out.push('>');
        out
    }

    /// The import map, or `None` when the table is empty.
    pub fn import_map(&self, table: &[TableEntry]) -> Result<Option<String>> {
        if table.is_empty() {
            return Ok(None);
        }
        // serde_json is built with preserve_order, so entries keep plan order
        let imports: serde_json::Map<String, serde_json::Value> = table
            .iter()
            .map(|entry| (entry.id.clone(), serde_json::Value::String(entry.address.clone())))
            .collect();
        let json = serde_json::to_string(&serde_json::json!({ "imports": imports }))?;
        Ok(Some(format!(
            r#"<script type="importmap" id="{}">{}</script>"#,
            escape_attr(&self.importmap_id),
            escape_script_json(&json)
        )))
    }

    /// `<script type="application/json">` carrying a module's data.
    pub fn data_block(&self, entry: &DataEntry) -> Result<String> {
        let json = serde_json::to_string(&entry.data)?;
        Ok(format!(
            r#"<script type="application/json" id="{}{}">{}</script>"#,
            escape_attr(&self.data_id_prefix),
            escape_attr(&entry.id),
            escape_script_json(&json)
        ))
    }

    /// Head section: import map, preloads, then early load tags.
    pub fn head(&self, plan: &EmissionPlan) -> Result<String> {
        let mut lines = Vec::new();
        if let Some(map) = self.import_map(&plan.resolution_table)? {
            lines.push(map);
        }
        lines.extend(plan.preloads.iter().map(|entry| self.preload_link(entry)));
        lines.extend(
            plan.load_tags_for(Placement::Early)
                .iter()
                .map(|tag| self.load_tag(tag)),
        );
        Ok(join_lines(lines))
    }

    /// Footer section: late load tags, then module data blocks.
    pub fn footer(&self, plan: &EmissionPlan) -> Result<String> {
        let mut lines: Vec<String> = plan
            .load_tags_for(Placement::Late)
            .iter()
            .map(|tag| self.load_tag(tag))
            .collect();
        for entry in &plan.module_data {
            lines.push(self.data_block(entry)?);
        }
        Ok(join_lines(lines))
    }

    /// Head and footer separated by a blank line.
    pub fn document(&self, plan: &EmissionPlan) -> Result<String> {
        let head = self.head(plan)?;
        let footer = self.footer(plan)?;
        Ok(match (head.is_empty(), footer.is_empty()) {
            (_, true) => head,
            (true, false) => footer,
            (false, false) => format!("{}\n{}", head, footer),
        })
    }

    /// `declared` is set only when propagation moved the priority.
    fn push_priority(&self, out: &mut String, effective: Priority, declared: Option<Priority>) {
        if effective != Priority::Auto {
            out.push_str(&format!(r#" fetchpriority="{}""#, effective));
        }
        if self.annotate_declared_priority
            && let Some(declared) = declared
        {
            out.push_str(&format!(r#" data-wp-fetchpriority="{}""#, declared));
        }
    }
}

fn join_lines(lines: Vec<String>) -> String {
    let mut out = lines.join("\n");
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

/// Keep serialized JSON from closing the surrounding script element.
fn escape_script_json(json: &str) -> String {
    json.replace('&', "\\u0026")
        .replace('<', "\\u003C")
        .replace('>', "\\u003E")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(priority: Priority, declared: Priority, placement: Placement) -> LoadTag {
        LoadTag {
            id: "app".to_string(),
            src: "/app.js?ver=1".to_string(),
            priority,
            declared_priority: declared,
            placement,
            static_dependencies: vec![],
            dynamic_dependencies: vec![],
        }
    }

    #[test]
    fn test_load_tag_auto_has_no_fetchpriority() {
        let html = HtmlWriter::new().load_tag(&tag(Priority::Auto, Priority::Auto, Placement::Early));
        assert_eq!(html, r#"<script type="module" src="/app.js?ver=1" id="app-js-module"></script>"#);
    }

    #[test]
    fn test_load_tag_bumped_priority() {
        let html = HtmlWriter::new().load_tag(&tag(Priority::High, Priority::Low, Placement::Early));
        assert_eq!(
            html,
            r#"<script type="module" src="/app.js?ver=1" id="app-js-module" fetchpriority="high" data-wp-fetchpriority="low"></script>"#
        );
    }

    #[test]
    fn test_declared_annotation_can_be_disabled() {
        let html = HtmlWriter::new()
            .with_declared_priority(false)
            .load_tag(&tag(Priority::Auto, Priority::Low, Placement::Early));
        assert!(!html.contains("data-wp-fetchpriority"));
    }

    #[test]
    fn test_preload_link() {
        let entry = PreloadEntry {
            id: "dep".to_string(),
            href: "/dep.js?a=1&b=2".to_string(),
            priority: Priority::Low,
            declared_priority: Priority::Low,
            placement: Placement::Early,
        };
        assert_eq!(
            HtmlWriter::new().preload_link(&entry),
            r#"<link rel="modulepreload" href="/dep.js?a=1&amp;b=2" id="dep-js-modulepreload" fetchpriority="low">"#
        );
    }

    #[test]
    fn test_import_map_keeps_table_order() {
        let table = vec![
            TableEntry {
                id: "b".to_string(),
                address: "/b.js".to_string(),
            },
            TableEntry {
                id: "a".to_string(),
                address: "/a.js?x=<y>".to_string(),
            },
        ];
        let html = HtmlWriter::new().import_map(&table).unwrap().unwrap();
        assert_eq!(
            html,
            r#"<script type="importmap" id="wp-importmap">{"imports":{"b":"/b.js","a":"/a.js?x=\u003Cy\u003E"}}</script>"#
        );
        assert!(HtmlWriter::new().import_map(&[]).unwrap().is_none());
    }

    #[test]
    fn test_data_block_escapes_script_close() {
        let entry = DataEntry {
            id: "app".to_string(),
            data: serde_json::json!({ "html": "</script>" }),
        };
        let html = HtmlWriter::new().with_data_id_prefix("data-").data_block(&entry).unwrap();
        assert_eq!(
            html,
            r#"<script type="application/json" id="data-app">{"html":"\u003C/script\u003E"}</script>"#
        );
    }

    #[test]
    fn test_head_and_footer_split_by_placement() {
        let mut late = tag(Priority::Auto, Priority::Auto, Placement::Late);
        late.id = "late".to_string();
        let plan = EmissionPlan {
            load_tags: vec![tag(Priority::Auto, Priority::Auto, Placement::Early), late],
            ..Default::default()
        };
        let writer = HtmlWriter::new();
        let head = writer.head(&plan).unwrap();
        let footer = writer.footer(&plan).unwrap();
        assert!(head.contains(r#"id="app-js-module""#));
        assert!(!head.contains("late-js-module"));
        assert!(footer.contains(r#"id="late-js-module""#));
        assert_eq!(writer.document(&plan).unwrap(), format!("{}\n{}", head, footer));
    }

    #[test]
    fn test_empty_plan_renders_nothing() {
        let writer = HtmlWriter::new();
        assert_eq!(writer.document(&EmissionPlan::default()).unwrap(), "");
    }
}
