//! Navigable outline of headings and embeds.

use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::locate::find_by_id;
use crate::model::{Account, BlockKind, BlockNode, Comment, Document, HmId};

/// Embeds nested deeper than this are left out of the outline.
pub const MAX_EMBED_DEPTH: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OutlineIcon {
    Document,
    Contact,
}

/// A resolved embed target, as cached by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EmbedEntity {
    #[serde(alias = "d")]
    Document { id: HmId, document: Arc<Document> },
    #[serde(alias = "a")]
    Account { id: HmId, account: Account },
    #[serde(alias = "c")]
    Comment { id: HmId, comment: Comment },
}

impl EmbedEntity {
    pub fn id(&self) -> &HmId {
        match self {
            EmbedEntity::Document { id, .. }
            | EmbedEntity::Account { id, .. }
            | EmbedEntity::Comment { id, .. } => id,
        }
    }
}

/// Resolved embeds keyed by the id of the embed block that references them.
pub type EmbedsContent = IndexMap<String, EmbedEntity>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutlineEntry {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<HmId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_block_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<OutlineEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<OutlineIcon>,
}

impl OutlineEntry {
    pub fn child_entries(&self) -> &[OutlineEntry] {
        self.children.as_deref().unwrap_or(&[])
    }

    fn label(&self) -> String {
        match self.icon {
            Some(icon) => format!("{} ({icon})", self.title),
            None => self.title.clone(),
        }
    }

    /// Render this entry and its children with box-drawing characters.
    pub fn render_box_tree(&self, prefix: &str, is_last: bool) -> String {
        let connector = if is_last { "└── " } else { "├── " };
        let mut out = format!("{prefix}{connector}{}\n", self.label());

        let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
        let children = self.child_entries();
        for (i, child) in children.iter().enumerate() {
            out.push_str(&child.render_box_tree(&child_prefix, i == children.len() - 1));
        }
        out
    }

    /// Indented plain-text rendering, two spaces per level.
    pub fn render_plain(&self, depth: usize) -> String {
        let mut out = format!("{}{}  #{}\n", "  ".repeat(depth), self.label(), self.id);
        for child in self.child_entries() {
            out.push_str(&child.render_plain(depth + 1));
        }
        out
    }
}

/// Spacing between top-level entries in box-tree output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum TreeStyle {
    #[default]
    Compact,
    Spaced,
}

pub fn render_outline_tree(entries: &[OutlineEntry], style: TreeStyle) -> String {
    let mut out = String::new();
    for (i, entry) in entries.iter().enumerate() {
        if style == TreeStyle::Spaced && i > 0 {
            out.push_str("│\n");
        }
        out.push_str(&entry.render_box_tree("", i == entries.len() - 1));
    }
    out
}

/// Derive the outline of `nodes`.
///
/// Headings become entries. Card embeds become a single document or
/// contact entry. Other resolved embeds splice the referenced content's
/// outline in place. Containers splice their children. Unresolved embeds
/// contribute nothing until they resolve.
pub fn build_outline(
    nodes: &[BlockNode],
    embeds: &EmbedsContent,
    parent_entity_id: Option<&HmId>,
    parent_block_id: Option<&str>,
) -> Vec<OutlineEntry> {
    let mut outline = Vec::new();
    walk(nodes, embeds, parent_entity_id, parent_block_id, 0, &mut outline);
    outline
}

fn walk(
    nodes: &[BlockNode],
    embeds: &EmbedsContent,
    parent_entity_id: Option<&HmId>,
    parent_block_id: Option<&str>,
    embed_depth: usize,
    outline: &mut Vec<OutlineEntry>,
) {
    for node in nodes {
        let block = &node.block;
        match &block.kind {
            BlockKind::Heading => {
                let children = node.children.as_deref().map(|children| {
                    let mut nested = Vec::new();
                    walk(
                        children,
                        embeds,
                        parent_entity_id,
                        parent_block_id,
                        embed_depth,
                        &mut nested,
                    );
                    nested
                });
                outline.push(OutlineEntry {
                    id: block.id.clone(),
                    title: block.text.clone(),
                    entity_id: parent_entity_id.cloned(),
                    parent_block_id: parent_block_id.map(str::to_string),
                    children,
                    icon: None,
                });
            }
            BlockKind::Embed => {
                let Some(entity) = embeds.get(&block.id) else {
                    tracing::debug!(block = %block.id, "embed not resolved, omitted from outline");
                    continue;
                };
                if block.attributes.is_card_view() {
                    outline.extend(card_entry(&block.id, entity, parent_block_id));
                } else if embed_depth >= MAX_EMBED_DEPTH {
                    tracing::warn!(block = %block.id, "embed nesting too deep for outline");
                } else {
                    splice_embed(
                        node,
                        entity,
                        embeds,
                        parent_block_id,
                        embed_depth,
                        outline,
                    );
                }
            }
            _ => {
                if let Some(children) = node.children.as_deref() {
                    walk(
                        children,
                        embeds,
                        parent_entity_id,
                        parent_block_id,
                        embed_depth,
                        outline,
                    );
                }
            }
        }
    }
}

fn card_entry(
    block_id: &str,
    entity: &EmbedEntity,
    parent_block_id: Option<&str>,
) -> Option<OutlineEntry> {
    let (title, icon) = match entity {
        EmbedEntity::Document { document, .. } => (
            document.title().unwrap_or("Untitled Document").to_string(),
            OutlineIcon::Document,
        ),
        EmbedEntity::Account { account, .. } => (
            account.display_name().unwrap_or("Untitled Account").to_string(),
            OutlineIcon::Contact,
        ),
        EmbedEntity::Comment { .. } => return None,
    };
    Some(OutlineEntry {
        id: block_id.to_string(),
        title,
        entity_id: Some(entity.id().clone()),
        parent_block_id: parent_block_id.map(str::to_string),
        children: None,
        icon: Some(icon),
    })
}

fn splice_embed(
    node: &BlockNode,
    entity: &EmbedEntity,
    embeds: &EmbedsContent,
    parent_block_id: Option<&str>,
    embed_depth: usize,
    outline: &mut Vec<OutlineEntry>,
) {
    let target_id = entity.id();
    let content = match entity {
        EmbedEntity::Document { document, .. } => match target_id.block_ref.as_deref() {
            Some(block_ref) => find_by_id(&document.content, block_ref).map(BlockNode::child_nodes),
            None => Some(document.content.as_slice()),
        },
        EmbedEntity::Comment { comment, .. } => Some(comment.content.as_slice()),
        EmbedEntity::Account { .. } => {
            outline.extend(card_entry(node.id(), entity, parent_block_id));
            return;
        }
    };
    if let Some(content) = content {
        walk(
            content,
            embeds,
            Some(target_id),
            Some(node.id()),
            embed_depth + 1,
            outline,
        );
    }
}

/// Serialize an outline as pretty JSON.
pub fn outline_to_json(entries: &[OutlineEntry]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(entries)
}
