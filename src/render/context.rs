use std::fmt;

use serde::{Deserialize, Serialize};

use super::citations::Citation;
use crate::config::RenderConfig;
use crate::model::BlockRange;

/// Callback receiving a block id and an optional range within it.
pub type BlockCallback = Box<dyn Fn(&str, Option<BlockRange>)>;
/// Callback receiving a raw link href.
pub type LinkCallback = Box<dyn Fn(&str)>;
/// Callback receiving a content id and a file name to save it as.
pub type SaveFileCallback = Box<dyn Fn(&str, &str)>;

/// Host-provided interaction handlers. An affordance whose handler is not
/// set is not rendered at all.
#[derive(Default)]
pub struct ActionHandlers {
    pub on_copy_block: Option<BlockCallback>,
    pub on_reply_block: Option<BlockCallback>,
    pub on_block_comment: Option<BlockCallback>,
    pub on_citation_click: Option<BlockCallback>,
    pub on_link_click: Option<LinkCallback>,
    pub save_cid_as_file: Option<SaveFileCallback>,
}

impl ActionHandlers {
    pub fn on_copy_block(mut self, f: impl Fn(&str, Option<BlockRange>) + 'static) -> Self {
        self.on_copy_block = Some(Box::new(f));
        self
    }

    pub fn on_reply_block(mut self, f: impl Fn(&str, Option<BlockRange>) + 'static) -> Self {
        self.on_reply_block = Some(Box::new(f));
        self
    }

    pub fn on_block_comment(mut self, f: impl Fn(&str, Option<BlockRange>) + 'static) -> Self {
        self.on_block_comment = Some(Box::new(f));
        self
    }

    pub fn on_citation_click(mut self, f: impl Fn(&str, Option<BlockRange>) + 'static) -> Self {
        self.on_citation_click = Some(Box::new(f));
        self
    }

    pub fn on_link_click(mut self, f: impl Fn(&str) + 'static) -> Self {
        self.on_link_click = Some(Box::new(f));
        self
    }

    pub fn save_cid_as_file(mut self, f: impl Fn(&str, &str) + 'static) -> Self {
        self.save_cid_as_file = Some(Box::new(f));
        self
    }
}

impl fmt::Debug for ActionHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionHandlers")
            .field("on_copy_block", &self.on_copy_block.is_some())
            .field("on_reply_block", &self.on_reply_block.is_some())
            .field("on_block_comment", &self.on_block_comment.is_some())
            .field("on_citation_click", &self.on_citation_click.is_some())
            .field("on_link_click", &self.on_link_click.is_some())
            .field("save_cid_as_file", &self.save_cid_as_file.is_some())
            .finish()
    }
}

/// Navigation state injected by the host; read-only for the renderer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteParams {
    pub document_id: Option<String>,
    pub version: Option<String>,
    pub block_ref: Option<String>,
}

impl RouteParams {
    pub fn block(block_ref: impl Into<String>) -> Self {
        Self {
            block_ref: Some(block_ref.into()),
            ..Self::default()
        }
    }
}

/// Everything the renderer needs besides the document itself.
#[derive(Debug)]
pub struct RenderContext {
    pub layout_unit: f64,
    pub text_unit: f64,
    pub ipfs_blob_prefix: String,
    pub gateway_url: String,
    /// Disables every interactive affordance.
    pub render_only: bool,
    /// Comment mode suppresses the deep-link highlight.
    pub comment: bool,
    pub route: RouteParams,
    pub citations: Vec<Citation>,
    pub highlight_code: bool,
    pub handlers: ActionHandlers,
}

impl Default for RenderContext {
    fn default() -> Self {
        Self::from_config(&RenderConfig::default())
    }
}

impl RenderContext {
    pub fn from_config(config: &RenderConfig) -> Self {
        Self {
            layout_unit: config.layout_unit,
            text_unit: config.text_unit,
            ipfs_blob_prefix: config.ipfs_blob_prefix.clone(),
            gateway_url: config.gateway_url.clone(),
            render_only: false,
            comment: false,
            route: RouteParams::default(),
            citations: Vec::new(),
            highlight_code: config.highlight_code,
            handlers: ActionHandlers::default(),
        }
    }

    pub fn with_handlers(mut self, handlers: ActionHandlers) -> Self {
        self.handlers = handlers;
        self
    }

    pub fn with_citations(mut self, citations: Vec<Citation>) -> Self {
        self.citations = citations;
        self
    }

    pub fn with_route(mut self, route: RouteParams) -> Self {
        self.route = route;
        self
    }

    pub fn render_only(mut self, render_only: bool) -> Self {
        self.render_only = render_only;
        self
    }

    /// Number of citations whose target fragment is `block_id`.
    pub fn citation_count(&self, block_id: &str) -> usize {
        self.citations
            .iter()
            .filter(|citation| citation.target_fragment.as_deref() == Some(block_id))
            .count()
    }

    /// Blob URL for an `ipfs://` reference, `None` for anything else.
    pub fn ipfs_url(&self, reference: &str) -> Option<String> {
        cid_from_ipfs_url(reference).map(|cid| format!("{}{cid}", self.ipfs_blob_prefix))
    }
}

/// Content id of an `ipfs://<cid>` reference.
pub fn cid_from_ipfs_url(reference: &str) -> Option<&str> {
    reference
        .strip_prefix("ipfs://")
        .filter(|cid| !cid.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_follow_config() {
        let ctx = RenderContext::default();
        assert_eq!(ctx.layout_unit, 24.0);
        assert_eq!(ctx.text_unit, 18.0);
        assert!(!ctx.render_only);
        assert!(ctx.handlers.on_copy_block.is_none());
    }

    #[test]
    fn test_ipfs_urls() {
        let ctx = RenderContext::default();
        assert_eq!(
            ctx.ipfs_url("ipfs://bafyabc").as_deref(),
            Some("http://localhost:55001/ipfs/bafyabc")
        );
        assert_eq!(ctx.ipfs_url("https://example.com/a.png"), None);
        assert_eq!(cid_from_ipfs_url("ipfs://"), None);
    }

    #[test]
    fn test_citation_count() {
        let ctx = RenderContext::default().with_citations(vec![
            Citation::new("hm://d/one", Some("b1")),
            Citation::new("hm://d/two", Some("b1")),
            Citation::new("hm://d/three", Some("b2")),
            Citation::new("hm://d/four", None),
        ]);
        assert_eq!(ctx.citation_count("b1"), 2);
        assert_eq!(ctx.citation_count("b2"), 1);
        assert_eq!(ctx.citation_count("b3"), 0);
    }

    #[test]
    fn test_handlers_debug_shows_presence() {
        let handlers = ActionHandlers::default().on_link_click(|_| {});
        let debug = format!("{handlers:?}");
        assert!(debug.contains("on_link_click: true"));
        assert!(debug.contains("on_copy_block: false"));
    }
}
