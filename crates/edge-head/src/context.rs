//! Structured metadata produced for a single page.

use crate::escape::escape_attr;

/// Where a tag ends up in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Placement {
    /// Inside `<head>`.
    #[default]
    Head,
    /// At the end of `<body>`.
    Body,
}

/// A single rendered tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    /// Serialized markup.
    pub markup: String,
    /// Placement in the document.
    pub placement: Placement,
}

impl Tag {
    /// Create a head-placed tag.
    pub fn head(markup: impl Into<String>) -> Self {
        Self {
            markup: markup.into(),
            placement: Placement::Head,
        }
    }

    /// Create a body-placed tag.
    pub fn body(markup: impl Into<String>) -> Self {
        Self {
            markup: markup.into(),
            placement: Placement::Body,
        }
    }
}

/// Ordered group of tags of one kind (meta, title, link, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagGroup {
    tags: Vec<Tag>,
}

impl TagGroup {
    /// Create an empty group.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a tag.
    pub fn push(&mut self, tag: Tag) {
        self.tags.push(tag);
    }

    /// Append a tag (builder style).
    pub fn with(mut self, tag: Tag) -> Self {
        self.push(tag);
        self
    }

    /// Head-placed tags, concatenated in order.
    pub fn text(&self) -> String {
        self.concat(Placement::Head)
    }

    /// Body-placed tags, concatenated in order.
    pub fn body_text(&self) -> String {
        self.concat(Placement::Body)
    }

    /// Iterate over all tags.
    pub fn iter(&self) -> impl Iterator<Item = &Tag> {
        self.tags.iter()
    }

    /// Number of tags in the group.
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Whether the group has no tags.
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    fn concat(&self, placement: Placement) -> String {
        self.tags
            .iter()
            .filter(|t| t.placement == placement)
            .map(|t| t.markup.as_str())
            .collect()
    }
}

impl FromIterator<Tag> for TagGroup {
    fn from_iter<I: IntoIterator<Item = Tag>>(iter: I) -> Self {
        Self {
            tags: iter.into_iter().collect(),
        }
    }
}

/// Ordered attribute set for the `<html>` or `<body>` element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttrSet {
    attrs: Vec<(String, Option<String>)>,
}

impl AttrSet {
    /// Create an empty attribute set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a valued attribute, replacing an existing one in place.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.upsert(name.into(), Some(value.into()));
    }

    /// Set a boolean (bare) attribute.
    pub fn set_flag(&mut self, name: impl Into<String>) {
        self.upsert(name.into(), None);
    }

    /// Add a valued attribute (builder style).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// Look up an attribute value. Bare attributes yield `Some(None)`.
    pub fn get(&self, name: &str) -> Option<Option<&str>> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_deref())
    }

    /// Attribute names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.attrs.iter().map(|(n, _)| n.as_str())
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    /// Render as `name="value"` pairs separated by spaces.
    pub fn text(&self) -> String {
        self.attrs
            .iter()
            .map(|(name, value)| match value {
                Some(v) => format!(r#"{}="{}""#, name, escape_attr(v)),
                None => name.clone(),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn upsert(&mut self, name: String, value: Option<String>) {
        match self.attrs.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name, value)),
        }
    }
}

/// Everything the renderer produced for one page.
///
/// Built once per cache miss and consumed by value when the fragment record
/// is composed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataContext {
    /// Attributes for `<html>`.
    pub html_attrs: AttrSet,
    /// Attributes for `<body>`.
    pub body_attrs: AttrSet,
    /// `<meta>` tags.
    pub meta: TagGroup,
    /// `<title>` tag.
    pub title: TagGroup,
    /// `<link>` tags.
    pub link: TagGroup,
    /// `<style>` tags.
    pub style: TagGroup,
    /// `<script>` tags.
    pub script: TagGroup,
    /// `<noscript>` tags.
    pub noscript: TagGroup,
}
