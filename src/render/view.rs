//! Stateful document view: owns collapse and highlight state across renders
//! and turns user interactions into host callbacks.

use std::collections::HashSet;
use std::time::Instant;

use super::Affordance;
use super::context::{RenderContext, RouteParams, cid_from_ipfs_url};
use super::embed::EmbedResolver;
use super::state::{HighlightTimer, Highlighter, NodeStates, ScrollRequest};
use super::walker::Walker;
use crate::error::{Error, Result};
use crate::model::{BlockNode, BlockRange, Document, unpack_hm_id};
use crate::tree::{
    EmbedsContent, OutlineEntry, build_outline, clip_content_blocks, find_by_id, focused_blocks,
};

/// A rendered document plus the UI state that survives between renders.
///
/// Typical loop: [`render`](Self::render), then forward user interactions
/// ([`press`](Self::press), [`navigate`](Self::navigate), [`tick`](Self::tick))
/// and render again.
pub struct DocumentView<R = ()> {
    content: Vec<BlockNode>,
    ctx: RenderContext,
    resolver: R,
    states: NodeStates,
    highlighter: Highlighter,
    pending_scroll: Option<ScrollRequest>,
    pending_timer: Option<HighlightTimer>,
    show_referenced: HashSet<String>,
    focus: Option<String>,
    max_blocks: Option<usize>,
    expanded: bool,
}

impl DocumentView<()> {
    /// A block reference already in the context's route is highlighted
    /// right away; its timer is available from
    /// [`take_highlight_timer`](Self::take_highlight_timer).
    pub fn new(content: Vec<BlockNode>, ctx: RenderContext) -> Self {
        let mut view = Self {
            content,
            ctx,
            resolver: (),
            states: NodeStates::default(),
            highlighter: Highlighter::default(),
            pending_scroll: None,
            pending_timer: None,
            show_referenced: HashSet::new(),
            focus: None,
            max_blocks: None,
            expanded: true,
        };
        view.pending_timer = view.apply_route(Instant::now());
        view
    }

    pub fn from_document(document: &Document, ctx: RenderContext) -> Self {
        Self::new(document.content.clone(), ctx)
    }
}

impl<R: EmbedResolver> DocumentView<R> {
    pub fn with_resolver<T: EmbedResolver>(self, resolver: T) -> DocumentView<T> {
        DocumentView {
            content: self.content,
            ctx: self.ctx,
            resolver,
            states: self.states,
            highlighter: self.highlighter,
            pending_scroll: self.pending_scroll,
            pending_timer: self.pending_timer,
            show_referenced: self.show_referenced,
            focus: self.focus,
            max_blocks: self.max_blocks,
            expanded: self.expanded,
        }
    }

    /// Render only the subtree rooted at `block_id`.
    pub fn with_focus(mut self, block_id: impl Into<String>) -> Self {
        self.focus = Some(block_id.into());
        self
    }

    pub fn with_max_blocks(mut self, max_blocks: Option<usize>) -> Self {
        self.max_blocks = max_blocks;
        self
    }

    pub fn with_expanded(mut self, expanded: bool) -> Self {
        self.expanded = expanded;
        self
    }

    pub fn context(&self) -> &RenderContext {
        &self.ctx
    }

    pub fn content(&self) -> &[BlockNode] {
        &self.content
    }

    pub fn render(&mut self) -> Result<String> {
        let focused = focused_blocks(&self.content, self.focus.as_deref());
        if focused.is_none() {
            tracing::debug!(focus = ?self.focus, "focused block not found, rendering nothing");
        }
        // the budget counts the focused subtree only
        let clipped = self
            .max_blocks
            .and_then(|max| clip_content_blocks(focused, max));
        let blocks = clipped.as_deref().or(focused);

        let highlighted = if self.ctx.comment {
            None
        } else {
            self.highlighter.highlighted()
        };

        let mut walker = Walker::new(
            &self.ctx,
            &self.resolver,
            &mut self.states,
            highlighted,
            &self.show_referenced,
        );
        let layout_unit = self.ctx.layout_unit.to_string();
        let text_unit = self.ctx.text_unit.to_string();
        walker.w.open(
            "div",
            &[
                ("class", "doc-content"),
                ("data-layout-unit", &layout_unit),
                ("data-text-unit", &text_unit),
            ],
        )?;
        range_bubble(&mut walker)?;
        walker.blocks_content(blocks, self.expanded)?;
        walker.w.close("div")?;
        Ok(walker.into_html())
    }

    /// Outline of the full content, embeds resolved through `embeds`.
    pub fn outline(&self, embeds: &EmbedsContent) -> Vec<OutlineEntry> {
        let parent = self
            .ctx
            .route
            .document_id
            .as_deref()
            .and_then(unpack_hm_id);
        build_outline(&self.content, embeds, parent.as_ref(), None)
    }

    /// Apply new route params. A block reference starts a fresh highlight
    /// unless the view is in comment mode.
    pub fn navigate(&mut self, route: RouteParams, now: Instant) -> Option<HighlightTimer> {
        self.ctx.route = route;
        self.pending_timer = None;
        self.apply_route(now)
    }

    fn apply_route(&mut self, now: Instant) -> Option<HighlightTimer> {
        match self.ctx.route.block_ref.as_deref() {
            Some(block_ref) if !block_ref.is_empty() && !self.ctx.comment => {
                let (timer, scroll) = self.highlighter.activate(block_ref, now);
                self.pending_scroll = Some(scroll);
                Some(timer)
            }
            _ => {
                self.highlighter.clear();
                None
            }
        }
    }

    pub fn set_comment_mode(&mut self, comment: bool) {
        self.ctx.comment = comment;
        if comment {
            self.highlighter.clear();
            self.pending_scroll = None;
            self.pending_timer = None;
        }
    }

    pub fn fire(&mut self, timer: &HighlightTimer) -> bool {
        self.highlighter.fire(timer)
    }

    pub fn tick(&mut self, now: Instant) -> bool {
        self.highlighter.tick(now)
    }

    pub fn highlighted(&self) -> Option<&str> {
        if self.ctx.comment {
            return None;
        }
        self.highlighter.highlighted()
    }

    pub fn take_scroll_request(&mut self) -> Option<ScrollRequest> {
        self.pending_scroll.take()
    }

    /// Timer for the highlight started from the initial route, if any.
    pub fn take_highlight_timer(&mut self) -> Option<HighlightTimer> {
        self.pending_timer.take()
    }

    /// Flip a rendered node's expand state. Keys come from the
    /// `data-node-key` attribute of the last render.
    pub fn toggle(&mut self, key: &str) -> Result<bool> {
        let expanded = self
            .states
            .toggle(key)
            .ok_or_else(|| Error::UnknownBlock(key.to_string()))?;
        tracing::debug!(key, expanded, "toggled block");
        Ok(expanded)
    }

    pub fn is_expanded(&self, key: &str) -> Option<bool> {
        self.states.get(key).map(|state| state.expanded())
    }

    /// Change the expand prop of the top-level blocks; they reset to it on
    /// the next render.
    pub fn set_expanded(&mut self, expanded: bool) {
        self.expanded = expanded;
    }

    pub fn copy_block(&self, block_id: &str) -> Result<()> {
        self.block_action(Affordance::CopyBlock, block_id, Some(BlockRange::expanded()))
    }

    pub fn reply_block(&self, block_id: &str) -> Result<()> {
        self.block_action(Affordance::ReplyBlock, block_id, None)
    }

    pub fn comment_block(&self, block_id: &str) -> Result<()> {
        self.block_action(Affordance::CommentBlock, block_id, None)
    }

    /// Copy a reference to part of a block, as the selection bubble does.
    pub fn copy_range(&self, block_id: &str, range: BlockRange) -> Result<()> {
        self.block_action(Affordance::CopyRange, block_id, Some(range))
    }

    pub fn comment_range(&self, block_id: &str, range: BlockRange) -> Result<()> {
        self.block_action(Affordance::CommentRange, block_id, Some(range))
    }

    pub fn citation_click(&self, block_id: &str) -> Result<()> {
        let handler = self
            .ctx
            .handlers
            .on_citation_click
            .as_ref()
            .ok_or(Error::AffordanceUnavailable(Affordance::Citations))?;
        if self.ctx.citation_count(block_id) == 0 {
            return Err(Error::UnknownBlock(block_id.to_string()));
        }
        handler(block_id, None);
        Ok(())
    }

    pub fn link_click(&self, href: &str) -> Result<()> {
        let handler = self
            .ctx
            .handlers
            .on_link_click
            .as_ref()
            .ok_or(Error::AffordanceUnavailable(Affordance::OpenLink))?;
        tracing::debug!(href, "link clicked");
        handler(href);
        Ok(())
    }

    /// Save the file behind a file block under its display name.
    pub fn save_file(&self, block_id: &str) -> Result<()> {
        let handler = self
            .ctx
            .handlers
            .save_cid_as_file
            .as_ref()
            .ok_or(Error::AffordanceUnavailable(Affordance::SaveFile))?;
        let node = find_by_id(&self.content, block_id)
            .ok_or_else(|| Error::UnknownBlock(block_id.to_string()))?;
        let cid = cid_from_ipfs_url(&node.block.link)
            .ok_or_else(|| Error::UnknownBlock(block_id.to_string()))?;
        let name = node
            .block
            .attributes
            .name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or("Untitled File");
        handler(cid, name);
        Ok(())
    }

    /// Switch an embed between its latest and its referenced version.
    /// Returns whether the referenced version is now shown.
    pub fn show_referenced(&mut self, key: &str) -> bool {
        if self.show_referenced.remove(key) {
            false
        } else {
            self.show_referenced.insert(key.to_string());
            true
        }
    }

    /// Dispatch a rendered affordance. `target` is the value the affordance
    /// carries in the HTML: a block id, a node key or an href.
    pub fn press(&mut self, affordance: Affordance, target: &str) -> Result<()> {
        match affordance {
            Affordance::CopyBlock => self.copy_block(target),
            Affordance::ReplyBlock => self.reply_block(target),
            Affordance::CommentBlock => self.comment_block(target),
            Affordance::Citations => self.citation_click(target),
            Affordance::Toggle | Affordance::More => self.toggle(target).map(|_| ()),
            Affordance::OpenLink => self.link_click(target),
            Affordance::SaveFile => self.save_file(target),
            Affordance::ShowReferenced => {
                self.show_referenced(target);
                Ok(())
            }
            Affordance::CopyRange => self.copy_range(target, BlockRange::expanded()),
            Affordance::CommentRange => self.comment_range(target, BlockRange::expanded()),
        }
    }

    fn block_action(
        &self,
        affordance: Affordance,
        block_id: &str,
        range: Option<BlockRange>,
    ) -> Result<()> {
        let handlers = &self.ctx.handlers;
        let handler = match affordance {
            Affordance::CopyBlock | Affordance::CopyRange => handlers.on_copy_block.as_ref(),
            Affordance::ReplyBlock => handlers.on_reply_block.as_ref(),
            Affordance::CommentBlock | Affordance::CommentRange => {
                handlers.on_block_comment.as_ref()
            }
            _ => None,
        };
        let handler = match handler {
            Some(handler) if !self.ctx.render_only => handler,
            _ => return Err(Error::AffordanceUnavailable(affordance)),
        };
        if find_by_id(&self.content, block_id).is_none() {
            return Err(Error::UnknownBlock(block_id.to_string()));
        }
        tracing::debug!(%affordance, block_id, ?range, "block action");
        handler(block_id, range);
        Ok(())
    }
}

/// Hidden toolbar shown by the host over a text selection.
fn range_bubble(walker: &mut Walker<'_>) -> std::fmt::Result {
    let handlers = &walker.ctx.handlers;
    if walker.ctx.render_only
        || (handlers.on_copy_block.is_none() && handlers.on_block_comment.is_none())
    {
        return Ok(());
    }
    let copy = handlers.on_copy_block.is_some();
    let comment = handlers.on_block_comment.is_some();
    walker.w.open(
        "div",
        &[("class", "range-bubble"), ("hidden", "hidden")],
    )?;
    if copy {
        let action = Affordance::CopyRange.to_string();
        walker.w.element(
            "button",
            &[("type", "button"), ("data-action", &action), ("data-icon", "link")],
            "Copy Block Range",
        )?;
    }
    if comment {
        let action = Affordance::CommentRange.to_string();
        walker.w.element(
            "button",
            &[
                ("type", "button"),
                ("data-action", &action),
                ("data-icon", "message-square"),
            ],
            "Comment",
        )?;
    }
    walker.w.close("div")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Block;
    use crate::render::context::ActionHandlers;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    type Calls = Rc<RefCell<Vec<(String, Option<BlockRange>)>>>;

    fn content() -> Vec<BlockNode> {
        vec![
            BlockNode::with_children(
                Block::heading("h1", "Intro"),
                vec![BlockNode::new(Block::paragraph("p1", "Hello"))],
            ),
            BlockNode::new(Block::paragraph("p2", "World")),
        ]
    }

    fn recording_ctx(calls: &Calls) -> RenderContext {
        let copy = calls.clone();
        let comment = calls.clone();
        RenderContext::default().with_handlers(
            ActionHandlers::default()
                .on_copy_block(move |id, range| copy.borrow_mut().push((id.to_string(), range)))
                .on_block_comment(move |id, range| {
                    comment.borrow_mut().push((format!("comment:{id}"), range))
                }),
        )
    }

    #[test]
    fn test_render_wraps_document() {
        let mut view = DocumentView::new(content(), RenderContext::default());
        let html = view.render().unwrap();
        assert!(html.starts_with("<div class=\"doc-content\" data-layout-unit=\"24\" data-text-unit=\"18\">"));
        assert!(html.contains("Hello"));
        assert!(!html.contains("range-bubble"));
    }

    #[test]
    fn test_focus_and_clip() {
        let mut view = DocumentView::new(content(), RenderContext::default()).with_focus("p2");
        let html = view.render().unwrap();
        assert!(html.contains("World"));
        assert!(!html.contains("Intro"));

        let mut view = DocumentView::new(content(), RenderContext::default()).with_focus("nope");
        assert!(!view.render().unwrap().contains("blocknode-list"));

        let mut view =
            DocumentView::new(content(), RenderContext::default()).with_max_blocks(Some(2));
        let html = view.render().unwrap();
        assert!(html.contains("Hello"));
        assert!(!html.contains("World"));
    }

    #[test]
    fn test_toggle_persists_across_renders() {
        let mut view = DocumentView::new(content(), RenderContext::default());
        view.render().unwrap();
        assert!(!view.toggle("h1").unwrap());
        let html = view.render().unwrap();
        assert!(!html.contains("Hello"));
        assert_eq!(view.is_expanded("h1"), Some(false));

        assert!(matches!(view.toggle("missing"), Err(Error::UnknownBlock(_))));
    }

    #[test]
    fn test_set_expanded_resets_nodes() {
        let mut view = DocumentView::new(content(), RenderContext::default());
        view.render().unwrap();
        view.toggle("h1").unwrap();
        view.set_expanded(false);
        view.render().unwrap();
        view.set_expanded(true);
        let html = view.render().unwrap();
        assert!(html.contains("Hello"));
    }

    #[test]
    fn test_navigate_highlights_and_scrolls() {
        let start = Instant::now();
        let mut view = DocumentView::new(content(), RenderContext::default());
        let timer = view.navigate(RouteParams::block("p2"), start).unwrap();
        assert_eq!(view.highlighted(), Some("p2"));
        assert_eq!(view.take_scroll_request().unwrap().block_id, "p2");
        assert!(view.take_scroll_request().is_none());
        assert!(view.render().unwrap().contains("blocknode-content highlighted\" id=\"p2\""));

        assert!(view.tick(timer.deadline + Duration::from_millis(1)));
        assert_eq!(view.highlighted(), None);
    }

    #[test]
    fn test_focus_applies_before_clip_budget() {
        let content = vec![
            BlockNode::new(Block::paragraph("a", "first")),
            BlockNode::with_children(
                Block::paragraph("b", "second"),
                vec![BlockNode::new(Block::paragraph("c", "third"))],
            ),
        ];
        let mut view = DocumentView::new(content.clone(), RenderContext::default())
            .with_focus("b")
            .with_max_blocks(Some(1));
        let html = view.render().unwrap();
        assert!(html.contains("second"));
        assert!(!html.contains("first"));
        assert!(!html.contains("third"));

        let mut view = DocumentView::new(content, RenderContext::default())
            .with_focus("b")
            .with_max_blocks(Some(2));
        assert!(view.render().unwrap().contains("third"));
    }

    #[test]
    fn test_initial_route_highlights_block() {
        let ctx = RenderContext::default().with_route(RouteParams::block("p1"));
        let mut view = DocumentView::new(content(), ctx);
        assert_eq!(view.highlighted(), Some("p1"));
        assert_eq!(view.take_scroll_request().unwrap().block_id, "p1");
        let timer = view.take_highlight_timer().unwrap();
        assert_eq!(timer.block_id, "p1");
        assert!(view.take_highlight_timer().is_none());
        assert!(view.render().unwrap().contains("blocknode-content highlighted\" id=\"p1\""));

        assert!(view.fire(&timer));
        assert_eq!(view.highlighted(), None);
    }

    #[test]
    fn test_initial_route_in_comment_mode() {
        let mut ctx = RenderContext::default().with_route(RouteParams::block("p1"));
        ctx.comment = true;
        let mut view = DocumentView::new(content(), ctx);
        assert_eq!(view.highlighted(), None);
        assert!(view.take_highlight_timer().is_none());
        assert!(view.take_scroll_request().is_none());
    }

    #[test]
    fn test_comment_mode_suppresses_highlight() {
        let mut view = DocumentView::new(content(), RenderContext::default());
        view.set_comment_mode(true);
        assert!(view.navigate(RouteParams::block("p2"), Instant::now()).is_none());
        assert_eq!(view.highlighted(), None);
        assert!(!view.render().unwrap().contains("highlighted"));
    }

    #[test]
    fn test_block_actions_invoke_handlers() {
        let calls: Calls = Rc::default();
        let mut view = DocumentView::new(content(), recording_ctx(&calls));
        view.copy_block("p1").unwrap();
        view.comment_range("p2", BlockRange::span(0, 3)).unwrap();
        view.press(Affordance::CopyBlock, "h1").unwrap();
        assert_eq!(
            *calls.borrow(),
            vec![
                ("p1".to_string(), Some(BlockRange::expanded())),
                ("comment:p2".to_string(), Some(BlockRange::span(0, 3))),
                ("h1".to_string(), Some(BlockRange::expanded())),
            ]
        );

        assert!(matches!(
            view.reply_block("p1"),
            Err(Error::AffordanceUnavailable(Affordance::ReplyBlock))
        ));
        assert!(matches!(view.copy_block("zzz"), Err(Error::UnknownBlock(_))));
        assert!(view.render().unwrap().contains("range-bubble"));
    }

    #[test]
    fn test_render_only_disables_actions() {
        let calls: Calls = Rc::default();
        let view = DocumentView::new(content(), recording_ctx(&calls).render_only(true));
        assert!(view.copy_block("p1").is_err());
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn test_show_referenced_toggles() {
        let mut view = DocumentView::new(content(), RenderContext::default());
        assert!(view.show_referenced("e1"));
        assert!(!view.show_referenced("e1"));
    }

    #[test]
    fn test_save_file_uses_block_name() {
        let saved: Rc<RefCell<Vec<(String, String)>>> = Rc::default();
        let sink = saved.clone();
        let mut file = Block::new(crate::model::BlockKind::File, "f1").with_ref("ipfs://bafyfile");
        file.attributes.name = Some("notes.txt".into());
        let ctx = RenderContext::default().with_handlers(
            ActionHandlers::default()
                .save_cid_as_file(move |cid, name| sink.borrow_mut().push((cid.into(), name.into()))),
        );
        let mut view = DocumentView::new(vec![BlockNode::new(file)], ctx);
        view.press(Affordance::SaveFile, "f1").unwrap();
        assert_eq!(
            *saved.borrow(),
            vec![("bafyfile".to_string(), "notes.txt".to_string())]
        );
    }
}
