//! Recursive block tree walker producing HTML.

use std::collections::HashSet;
use std::fmt;

use super::Affordance;
use super::citations::citation_tooltip;
use super::context::RenderContext;
use super::embed::EmbedResolver;
use super::html::HtmlWriter;
use super::layout::{heading_margin, px};
use super::state::{NodeStates, node_key};
use crate::model::{BlockKind, BlockNode, ChildrenType, is_block_node_empty};

const EXPANDED_TOOLTIP: &str = "You can collapse this block and hide its children";
const COLLAPSED_TOOLTIP: &str = "This block is collapsed. you can expand it and see its children";

/// Position of a node in the tree being rendered.
#[derive(Debug, Clone, Copy)]
pub(crate) struct NodeParams<'p> {
    pub depth: usize,
    pub is_first: bool,
    /// 0 for the document itself, +1 for each embed level.
    pub embed_depth: usize,
    pub parent_block_id: Option<&'p str>,
    /// Parent-driven initial expand state.
    pub expanded: bool,
}

pub(crate) struct Walker<'a> {
    pub(crate) w: HtmlWriter,
    pub(crate) ctx: &'a RenderContext,
    pub(crate) resolver: &'a dyn EmbedResolver,
    pub(crate) states: &'a mut NodeStates,
    pub(crate) highlighted: Option<&'a str>,
    pub(crate) show_referenced: &'a HashSet<String>,
    /// Embed block ids enclosing the node being rendered.
    pub(crate) scope: Vec<String>,
    /// Entities currently being embedded, outermost first.
    pub(crate) embed_chain: Vec<String>,
}

impl<'a> Walker<'a> {
    pub fn new(
        ctx: &'a RenderContext,
        resolver: &'a dyn EmbedResolver,
        states: &'a mut NodeStates,
        highlighted: Option<&'a str>,
        show_referenced: &'a HashSet<String>,
    ) -> Self {
        Self {
            w: HtmlWriter::new(),
            ctx,
            resolver,
            states,
            highlighted,
            show_referenced,
            scope: Vec::new(),
            embed_chain: Vec::new(),
        }
    }

    pub fn into_html(self) -> String {
        self.w.into_string()
    }

    /// Top-level block list of a document.
    pub fn blocks_content(&mut self, blocks: Option<&[BlockNode]>, expanded: bool) -> fmt::Result {
        let Some(blocks) = blocks else {
            return Ok(());
        };
        let tag = self.list_open(&ChildrenType::Group, None, None, None)?;
        for (index, node) in blocks.iter().enumerate() {
            self.node(
                node,
                NodeParams {
                    depth: 1,
                    is_first: index == 0,
                    embed_depth: 0,
                    parent_block_id: None,
                    expanded,
                },
            )?;
        }
        self.w.close(tag)
    }

    pub(crate) fn list_open(
        &mut self,
        children_type: &ChildrenType,
        start: Option<&str>,
        list_level: Option<&str>,
        padding_left: Option<f64>,
    ) -> Result<&'static str, fmt::Error> {
        let tag = children_type.list_tag().unwrap_or("div");
        let list_type = children_type.list_tag().unwrap_or("");
        let style = padding_left
            .map(|padding| format!("padding-left:{}", px(padding)))
            .unwrap_or_default();
        self.w.open(
            tag,
            &[
                ("class", "blocknode-list"),
                ("data-node-type", "blockGroup"),
                (if list_type.is_empty() { "" } else { "data-list-type" }, list_type),
                (if start.is_some() { "start" } else { "" }, start.unwrap_or_default()),
                (
                    if list_level.is_some() { "data-list-level" } else { "" },
                    list_level.unwrap_or_default(),
                ),
                (if style.is_empty() { "" } else { "style" }, &style),
            ],
        )?;
        Ok(tag)
    }

    pub(crate) fn node(&mut self, node: &BlockNode, p: NodeParams<'_>) -> fmt::Result {
        if is_block_node_empty(node) {
            return Ok(());
        }
        let block = &node.block;
        let key = node_key(&self.scope, &block.id);
        let has_children = node.has_children();
        let expanded = self.states.visit(&key, p.expanded);
        let is_highlighted = self.highlighted == Some(block.id.as_str());
        let is_heading = block.kind == BlockKind::Heading;
        let is_embed = block.kind == BlockKind::Embed;

        let class = if is_highlighted {
            "blocknode-content highlighted"
        } else {
            "blocknode-content"
        };
        self.w.open(
            "div",
            &[
                ("class", class),
                ("id", &block.id),
                ("data-node-type", "blockContainer"),
                ("data-node-key", &key),
                (
                    if is_highlighted { "data-scroll-into-view" } else { "" },
                    "smooth start",
                ),
            ],
        )?;

        let mut row_style = format!(
            "padding:{}",
            px(if is_embed { 0.0 } else { self.ctx.layout_unit / 3.0 })
        );
        if is_heading {
            row_style.push(';');
            row_style.push_str(
                &heading_margin(p.depth, self.ctx.layout_unit, p.is_first).style("margin-top"),
            );
        }
        self.w.open(
            "div",
            &[
                (
                    "class",
                    if is_heading {
                        "blocknode-row blocknode-content-heading"
                    } else {
                        "blocknode-row"
                    },
                ),
                ("style", &row_style),
            ],
        )?;

        if has_children {
            let icon = if expanded { "chevron-down" } else { "chevron-right" };
            let tooltip = if expanded {
                EXPANDED_TOOLTIP
            } else {
                COLLAPSED_TOOLTIP
            };
            self.toggle_button(Affordance::Toggle, &key, icon, tooltip, expanded)?;
        }

        self.block_content(block, p.depth, p.embed_depth, p.parent_block_id)?;

        if has_children && !expanded {
            self.toggle_button(Affordance::More, &key, "more-horizontal", COLLAPSED_TOOLTIP, false)?;
        }

        self.block_actions(&block.id, p.embed_depth)?;
        self.w.close("div")?;

        if has_children && expanded {
            let children_type = block.attributes.children_type.clone().unwrap_or_default();
            let padding = if is_heading { 0.0 } else { self.ctx.layout_unit };
            let tag = self.list_open(
                &children_type,
                block.attributes.start.as_deref(),
                block.attributes.list_level.as_deref(),
                Some(padding),
            )?;
            for (index, child) in node.child_nodes().iter().enumerate() {
                self.node(
                    child,
                    NodeParams {
                        depth: p.depth + 1,
                        is_first: index == 0,
                        embed_depth: p.embed_depth,
                        parent_block_id: Some(&block.id),
                        expanded: true,
                    },
                )?;
            }
            self.w.close(tag)?;
        }

        self.w.close("div")
    }

    fn toggle_button(
        &mut self,
        affordance: Affordance,
        key: &str,
        icon: &str,
        tooltip: &str,
        expanded: bool,
    ) -> fmt::Result {
        let action = affordance.to_string();
        let class = format!("block-{action}");
        self.w.open(
            "button",
            &[
                ("class", &class),
                ("type", "button"),
                ("data-action", &action),
                ("data-node-key", key),
                ("data-icon", icon),
                ("aria-expanded", if expanded { "true" } else { "false" }),
                ("title", tooltip),
            ],
        )?;
        self.w.close("button")
    }

    /// Citation count and the copy / reply / comment buttons. Each one is
    /// rendered only when its handler is set; the three block actions are
    /// further limited to the top-level document outside render-only mode.
    fn block_actions(&mut self, block_id: &str, embed_depth: usize) -> fmt::Result {
        let handlers = &self.ctx.handlers;
        let citations = self.ctx.citation_count(block_id);
        let show_citations = citations > 0 && handlers.on_citation_click.is_some();
        let interactive = embed_depth == 0 && !self.ctx.render_only;

        let mut buttons: Vec<(Affordance, &str, &str)> = Vec::new();
        if interactive {
            if handlers.on_copy_block.is_some() {
                buttons.push((Affordance::CopyBlock, "link", "Copy block reference"));
            }
            if handlers.on_reply_block.is_some() {
                buttons.push((Affordance::ReplyBlock, "reply", "Reply to block"));
            }
            if handlers.on_block_comment.is_some() {
                buttons.push((Affordance::CommentBlock, "message-square", "Comment on this block"));
            }
        }
        if !show_citations && buttons.is_empty() {
            return Ok(());
        }

        self.w.open("div", &[("class", "block-actions")])?;
        if show_citations {
            let action = Affordance::Citations.to_string();
            let tooltip = citation_tooltip(citations);
            self.w.open(
                "button",
                &[
                    ("class", "block-citations"),
                    ("type", "button"),
                    ("data-action", &action),
                    ("data-block-id", block_id),
                    ("data-icon", "block-quote"),
                    ("title", &tooltip),
                ],
            )?;
            self.w.text(&citations.to_string())?;
            self.w.close("button")?;
        }
        for (affordance, icon, tooltip) in buttons {
            let action = affordance.to_string();
            self.w.open(
                "button",
                &[
                    ("class", "block-action"),
                    ("type", "button"),
                    ("data-action", &action),
                    ("data-block-id", block_id),
                    ("data-icon", icon),
                    ("title", tooltip),
                ],
            )?;
            self.w.close("button")?;
        }
        self.w.close("div")
    }
}
