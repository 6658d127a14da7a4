//! Metadata extraction seam and the built-in static renderer.

use std::sync::Arc;

use async_trait::async_trait;
use edge_core::PageId;
use indexmap::IndexMap;

use crate::config::{AttrValue, ElementKind, ElementSpec, HeadConfig};
use crate::context::{AttrSet, MetadataContext, Placement, Tag, TagGroup};
use crate::escape::{escape_attr, escape_text};

/// Error returned by a renderer. Passed through to callers untouched.
pub type ExtractError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Input to a single extraction.
#[derive(Debug, Clone, Copy)]
pub struct ExtractRequest<'a> {
    /// Page being rendered.
    pub page: &'a PageId,
    /// Head configuration to render.
    pub head: &'a HeadConfig,
}

/// Produces the metadata context for a page.
///
/// Invoked once per fragment cache miss.
#[async_trait]
pub trait MetadataExtractor: Send + Sync {
    /// Render the head configuration into a metadata context.
    async fn extract(&self, request: ExtractRequest<'_>) -> Result<MetadataContext, ExtractError>;
}

#[async_trait]
impl<T: MetadataExtractor + ?Sized> MetadataExtractor for Arc<T> {
    async fn extract(&self, request: ExtractRequest<'_>) -> Result<MetadataContext, ExtractError> {
        (**self).extract(request).await
    }
}

/// Default marker attribute placed on rendered tags.
pub const DEFAULT_MARKER_ATTRIBUTE: &str = "data-n-head";

/// Value of the marker attribute on rendered tags.
pub const MARKER_VALUE: &str = "true";

/// Renders a `HeadConfig` directly, without a component tree.
///
/// Every page gets the same output; the page identifier is only used for
/// tracing.
#[derive(Debug, Clone)]
pub struct StaticHeadExtractor {
    marker: Option<String>,
}

impl Default for StaticHeadExtractor {
    fn default() -> Self {
        Self {
            marker: Some(DEFAULT_MARKER_ATTRIBUTE.to_string()),
        }
    }
}

impl StaticHeadExtractor {
    /// Create an extractor using the default marker attribute.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom marker attribute name.
    pub fn with_marker(mut self, attribute: impl Into<String>) -> Self {
        self.marker = Some(attribute.into());
        self
    }

    /// Render tags without any marker attribute.
    pub fn without_marker(mut self) -> Self {
        self.marker = None;
        self
    }

    /// Render synchronously.
    pub fn render(&self, head: &HeadConfig) -> MetadataContext {
        MetadataContext {
            html_attrs: self.render_attrs(&head.html_attrs),
            body_attrs: self.render_attrs(&head.body_attrs),
            meta: self.render_group(head, ElementKind::Meta),
            title: head
                .resolved_title()
                .map(|t| Tag::head(format!("<title>{}</title>", escape_text(&t))))
                .into_iter()
                .collect(),
            link: self.render_group(head, ElementKind::Link),
            style: self.render_group(head, ElementKind::Style),
            script: self.render_group(head, ElementKind::Script),
            noscript: self.render_group(head, ElementKind::Noscript),
        }
    }

    fn render_attrs(&self, attrs: &IndexMap<String, AttrValue>) -> AttrSet {
        let mut set = AttrSet::new();
        let mut managed = Vec::new();

        for (name, value) in attrs {
            match value.rendered() {
                None => continue,
                Some(None) => set.set_flag(name.clone()),
                Some(Some(v)) => set.set(name.clone(), v),
            }
            managed.push(name.as_str());
        }

        if let Some(marker) = &self.marker {
            if !managed.is_empty() {
                set.set(marker.clone(), managed.join(","));
            }
        }

        set
    }

    fn render_group(&self, head: &HeadConfig, kind: ElementKind) -> TagGroup {
        head.elements(kind)
            .into_iter()
            .map(|element| self.render_element(kind, element))
            .collect()
    }

    fn render_element(&self, kind: ElementKind, element: &ElementSpec) -> Tag {
        let mut html = format!("<{}", kind.tag_name());

        if let Some(marker) = &self.marker {
            html.push_str(&format!(r#" {}="{}""#, marker, MARKER_VALUE));
        }
        if let Some(hid) = &element.hid {
            html.push_str(&format!(r#" data-hid="{}""#, escape_attr(hid)));
        }
        for (name, value) in &element.attrs {
            match value.rendered() {
                None => {}
                Some(None) => {
                    html.push(' ');
                    html.push_str(name);
                }
                Some(Some(v)) => html.push_str(&format!(r#" {}="{}""#, name, escape_attr(&v))),
            }
        }
        html.push('>');

        if !kind.is_void() {
            if let Some(inner) = &element.inner_html {
                html.push_str(inner);
            }
            html.push_str(&format!("</{}>", kind.tag_name()));
        }

        Tag {
            markup: html,
            placement: if element.body {
                Placement::Body
            } else {
                Placement::Head
            },
        }
    }
}

#[async_trait]
impl MetadataExtractor for StaticHeadExtractor {
    async fn extract(&self, request: ExtractRequest<'_>) -> Result<MetadataContext, ExtractError> {
        tracing::trace!(page = %request.page, "rendering static head configuration");
        Ok(self.render(request.head))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_head() -> HeadConfig {
        HeadConfig::new("Home")
            .with_title_template("%s - Acme")
            .with_html_attr("lang", "en")
            .with_meta("description", "Best & cheapest")
            .with_stylesheet("/main.css")
            .with_script("/head.js")
            .with_body_script("/tail.js")
    }

    #[test]
    fn test_render_title() {
        let ctx = StaticHeadExtractor::new().render(&sample_head());
        assert_eq!(ctx.title.text(), "<title>Home - Acme</title>");
    }

    #[test]
    fn test_render_title_escapes() {
        let ctx = StaticHeadExtractor::new().render(&HeadConfig::new("A <b> & c"));
        assert_eq!(ctx.title.text(), "<title>A &lt;b&gt; &amp; c</title>");
    }

    #[test]
    fn test_render_meta_with_marker_and_hid() {
        let ctx = StaticHeadExtractor::new().render(&sample_head());
        assert_eq!(
            ctx.meta.text(),
            r#"<meta data-n-head="true" data-hid="description" name="description" content="Best &amp; cheapest">"#
        );
    }

    #[test]
    fn test_render_without_marker() {
        let ctx = StaticHeadExtractor::new()
            .without_marker()
            .render(&sample_head());

        assert_eq!(ctx.link.text(), r#"<link rel="stylesheet" href="/main.css">"#);
        assert_eq!(ctx.html_attrs.text(), r#"lang="en""#);
    }

    #[test]
    fn test_render_html_attrs_lists_managed_names() {
        let head = HeadConfig::default()
            .with_html_attr("lang", "en")
            .with_html_attr("amp", true)
            .with_html_attr("hidden", false);
        let ctx = StaticHeadExtractor::new().render(&head);

        assert_eq!(ctx.html_attrs.text(), r#"lang="en" amp data-n-head="lang,amp""#);
        assert!(ctx.body_attrs.is_empty());
    }

    #[test]
    fn test_render_scripts_split_by_placement() {
        let ctx = StaticHeadExtractor::new()
            .with_marker("data-meta")
            .render(&sample_head());

        assert_eq!(
            ctx.script.text(),
            r#"<script data-meta="true" src="/head.js"></script>"#
        );
        assert_eq!(
            ctx.script.body_text(),
            r#"<script data-meta="true" src="/tail.js"></script>"#
        );
    }

    #[test]
    fn test_render_inline_style() {
        let head = HeadConfig::default().with_style("body{margin:0}");
        let ctx = StaticHeadExtractor::new().without_marker().render(&head);
        assert_eq!(ctx.style.text(), "<style>body{margin:0}</style>");
    }

    #[test]
    fn test_render_empty_config() {
        let ctx = StaticHeadExtractor::new().render(&HeadConfig::default());
        assert_eq!(ctx, MetadataContext::default());
    }

    #[tokio::test]
    async fn test_extract_ignores_page() {
        let extractor = StaticHeadExtractor::new();
        let head = sample_head();

        let a = extractor
            .extract(ExtractRequest {
                page: &PageId::from("/a"),
                head: &head,
            })
            .await
            .unwrap();
        let b = extractor
            .extract(ExtractRequest {
                page: &PageId::from("/b"),
                head: &head,
            })
            .await
            .unwrap();

        assert_eq!(a, b);
    }

    struct Failing;

    #[async_trait]
    impl MetadataExtractor for Failing {
        async fn extract(&self, _request: ExtractRequest<'_>) -> Result<MetadataContext, ExtractError> {
            Err(anyhow::anyhow!("renderer crashed").into())
        }
    }

    #[tokio::test]
    async fn test_extract_error_passes_through_arc() {
        let extractor: Arc<dyn MetadataExtractor> = Arc::new(Failing);
        let err = extractor
            .extract(ExtractRequest {
                page: &PageId::from("/"),
                head: &HeadConfig::default(),
            })
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "renderer crashed");
    }
}
