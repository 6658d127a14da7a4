//! Composed document fragments.

use edge_head::MetadataContext;
use edge_manifest::{PreloadFile, PreloadFiles, ResourceHints};
use serde::Serialize;

/// Everything the document template needs for one page.
///
/// Created once per cache miss and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FragmentRecord {
    html_attrs: String,
    body_attrs: String,
    head: String,
    body_scripts: String,
    resource_hints: String,
    #[serde(skip)]
    preload: PreloadFiles,
}

/// Template placeholder names, in document order.
pub const TEMPLATE_SLOTS: [&str; 4] = ["HTML_ATTRS", "BODY_ATTRS", "HEAD", "BODY_SCRIPTS"];

impl FragmentRecord {
    /// Attributes for the `<html>` element.
    pub fn html_attrs(&self) -> &str {
        &self.html_attrs
    }

    /// Attributes for the `<body>` element.
    pub fn body_attrs(&self) -> &str {
        &self.body_attrs
    }

    /// Contents of `<head>`, resource hints included.
    pub fn head(&self) -> &str {
        &self.head
    }

    /// Scripts injected at the end of `<body>`.
    pub fn body_scripts(&self) -> &str {
        &self.body_scripts
    }

    /// Preload tags followed by prefetch tags.
    pub fn resource_hints(&self) -> &str {
        &self.resource_hints
    }

    /// Files behind the preload hints, derived again on every call.
    pub fn preload_files(&self) -> impl Iterator<Item = PreloadFile> + '_ {
        self.preload.iter()
    }

    /// Placeholder name and value pairs for the document template.
    pub fn template_slots(&self) -> [(&'static str, &str); 4] {
        [
            (TEMPLATE_SLOTS[0], self.html_attrs()),
            (TEMPLATE_SLOTS[1], self.body_attrs()),
            (TEMPLATE_SLOTS[2], self.head()),
            (TEMPLATE_SLOTS[3], self.body_scripts()),
        ]
    }
}

/// Merge a metadata context and resource hints into a record.
pub fn compose(context: MetadataContext, hints: ResourceHints) -> FragmentRecord {
    let mut head = String::new();
    for group in [
        &context.meta,
        &context.title,
        &context.link,
        &context.style,
        &context.script,
        &context.noscript,
    ] {
        head.push_str(&group.text());
    }
    head.push_str(&hints.markup);

    let mut body_scripts = context.script.body_text();
    body_scripts.push_str(&context.noscript.body_text());

    FragmentRecord {
        html_attrs: context.html_attrs.text(),
        body_attrs: context.body_attrs.text(),
        head,
        body_scripts,
        resource_hints: hints.markup,
        preload: hints.preload,
    }
}
