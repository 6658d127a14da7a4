//! Application-level head configuration.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Attribute value as written in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    /// `true` renders a bare attribute, `false` omits it.
    Flag(bool),
    /// Numeric value.
    Number(i64),
    /// String value.
    Text(String),
}

impl AttrValue {
    /// Rendered value: `None` to omit, `Some(None)` for a bare attribute.
    pub fn rendered(&self) -> Option<Option<String>> {
        match self {
            Self::Flag(false) => None,
            Self::Flag(true) => Some(None),
            Self::Number(n) => Some(Some(n.to_string())),
            Self::Text(s) => Some(Some(s.clone())),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        Self::Flag(b)
    }
}

impl From<i64> for AttrValue {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// One `<meta>`, `<link>`, `<style>`, `<script>` or `<noscript>` entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementSpec {
    /// Identity used to deduplicate entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hid: Option<String>,

    /// Place the element at the end of `<body>` instead of `<head>`.
    #[serde(default, skip_serializing_if = "is_false")]
    pub body: bool,

    /// Raw inner content, emitted verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inner_html: Option<String>,

    /// Element attributes in declaration order.
    #[serde(flatten)]
    pub attrs: IndexMap<String, AttrValue>,
}

impl ElementSpec {
    /// Create an empty element.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an attribute.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    /// Set the deduplication id.
    pub fn with_hid(mut self, hid: impl Into<String>) -> Self {
        self.hid = Some(hid.into());
        self
    }

    /// Place the element at the end of `<body>`.
    pub fn in_body(mut self) -> Self {
        self.body = true;
        self
    }

    /// Set raw inner content.
    pub fn with_inner_html(mut self, html: impl Into<String>) -> Self {
        self.inner_html = Some(html.into());
        self
    }
}

/// Head configuration shared by every page of the application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadConfig {
    /// Page title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Title template; `%s` is replaced by the title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_template: Option<String>,

    /// Attributes for `<html>`.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub html_attrs: IndexMap<String, AttrValue>,

    /// Attributes for `<body>`.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub body_attrs: IndexMap<String, AttrValue>,

    /// `<meta>` entries.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub meta: Vec<ElementSpec>,

    /// `<link>` entries.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub link: Vec<ElementSpec>,

    /// `<style>` entries.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub style: Vec<ElementSpec>,

    /// `<script>` entries.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub script: Vec<ElementSpec>,

    /// `<noscript>` entries.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub noscript: Vec<ElementSpec>,
}

impl HeadConfig {
    /// Create a head configuration with a title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    /// Set the title template.
    pub fn with_title_template(mut self, template: impl Into<String>) -> Self {
        self.title_template = Some(template.into());
        self
    }

    /// Add an `<html>` attribute.
    pub fn with_html_attr(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.html_attrs.insert(name.into(), value.into());
        self
    }

    /// Add a `<body>` attribute.
    pub fn with_body_attr(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.body_attrs.insert(name.into(), value.into());
        self
    }

    /// Add a named meta tag.
    pub fn with_meta(mut self, name: &str, content: &str) -> Self {
        self.meta.push(
            ElementSpec::new()
                .with_hid(name)
                .attr("name", name)
                .attr("content", content),
        );
        self
    }

    /// Add a stylesheet link.
    pub fn with_stylesheet(mut self, href: &str) -> Self {
        self.link
            .push(ElementSpec::new().attr("rel", "stylesheet").attr("href", href));
        self
    }

    /// Add inline CSS.
    pub fn with_style(mut self, css: &str) -> Self {
        self.style.push(ElementSpec::new().with_inner_html(css));
        self
    }

    /// Add an external script in `<head>`.
    pub fn with_script(mut self, src: &str) -> Self {
        self.script.push(ElementSpec::new().attr("src", src));
        self
    }

    /// Add an external script at the end of `<body>`.
    pub fn with_body_script(mut self, src: &str) -> Self {
        self.script.push(ElementSpec::new().attr("src", src).in_body());
        self
    }

    /// Add an arbitrary element to a group.
    pub fn with_element(mut self, kind: ElementKind, element: ElementSpec) -> Self {
        self.elements_mut(kind).push(element);
        self
    }

    /// Title after applying the template.
    pub fn resolved_title(&self) -> Option<String> {
        let title = self.title.as_deref()?;
        Some(match &self.title_template {
            Some(template) => template.replace("%s", title),
            None => title.to_string(),
        })
    }

    /// Elements of one group, with later `hid` duplicates replacing earlier ones.
    pub fn elements(&self, kind: ElementKind) -> Vec<&ElementSpec> {
        let list = match kind {
            ElementKind::Meta => &self.meta,
            ElementKind::Link => &self.link,
            ElementKind::Style => &self.style,
            ElementKind::Script => &self.script,
            ElementKind::Noscript => &self.noscript,
        };
        dedupe_by_hid(list)
    }

    fn elements_mut(&mut self, kind: ElementKind) -> &mut Vec<ElementSpec> {
        match kind {
            ElementKind::Meta => &mut self.meta,
            ElementKind::Link => &mut self.link,
            ElementKind::Style => &mut self.style,
            ElementKind::Script => &mut self.script,
            ElementKind::Noscript => &mut self.noscript,
        }
    }
}

/// Element groups in a head configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Meta,
    Link,
    Style,
    Script,
    Noscript,
}

impl ElementKind {
    /// HTML tag name.
    pub fn tag_name(&self) -> &'static str {
        match self {
            Self::Meta => "meta",
            Self::Link => "link",
            Self::Style => "style",
            Self::Script => "script",
            Self::Noscript => "noscript",
        }
    }

    /// Void elements have no closing tag.
    pub fn is_void(&self) -> bool {
        matches!(self, Self::Meta | Self::Link)
    }
}

fn dedupe_by_hid(list: &[ElementSpec]) -> Vec<&ElementSpec> {
    let mut out: Vec<&ElementSpec> = Vec::with_capacity(list.len());
    for element in list {
        let existing = element
            .hid
            .as_ref()
            .and_then(|hid| out.iter().position(|e| e.hid.as_ref() == Some(hid)));
        match existing {
            Some(pos) => out[pos] = element,
            None => out.push(element),
        }
    }
    out
}
