//! Embed resolution and rendering of embed blocks.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::{Value, json};

use super::Affordance;
use super::html::HtmlWriter;
use super::state::node_key;
use super::walker::{NodeParams, Walker};
use crate::model::{
    Account, Annotation, AnnotationKind, Block, BlockNode, BlockRange, ChildrenType, Comment,
    Document, EntityType, HmId, unpack_hm_id,
};
use crate::tree::{EmbedEntity, EmbedsContent, MAX_EMBED_DEPTH, find_by_id};

/// Outcome of looking up an embedded entity.
#[derive(Debug, Clone)]
pub enum EmbedState {
    Loading,
    Document(Arc<Document>),
    Account(Account),
    Comment(Comment),
    NotFound,
    Error(String),
}

/// Supplies the entities referenced by embed blocks and inline embeds.
pub trait EmbedResolver {
    fn resolve(&self, id: &HmId) -> EmbedState;

    /// Short label for an inline mention: `@alias` for accounts, the title
    /// for documents.
    fn inline_label(&self, id: &HmId) -> Option<String> {
        let latest = HmId {
            version: None,
            ..id.clone()
        };
        match self.resolve(&latest) {
            EmbedState::Account(account) => account.display_name().map(|name| format!("@{name}")),
            EmbedState::Document(document) => document.title().map(str::to_string),
            _ => None,
        }
    }
}

/// Nothing resolves; every embed shows its loading state.
impl EmbedResolver for () {
    fn resolve(&self, _id: &HmId) -> EmbedState {
        EmbedState::Loading
    }
}

/// Resolver over a fixed set of entities, keyed by qualified id and by
/// qualified id plus version.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    entities: IndexMap<String, EmbedEntity>,
}

impl StaticResolver {
    pub fn from_embeds(embeds: &EmbedsContent) -> Self {
        let mut resolver = Self::default();
        for entity in embeds.values() {
            resolver.insert(entity.clone());
        }
        resolver
    }

    pub fn insert(&mut self, entity: EmbedEntity) {
        let id = entity.id();
        let qid = id.qid();
        if let Some(version) = &id.version {
            self.entities
                .insert(format!("{qid}?v={version}"), entity.clone());
        }
        self.entities.insert(qid, entity);
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl EmbedResolver for StaticResolver {
    fn resolve(&self, id: &HmId) -> EmbedState {
        let qid = id.qid();
        let entity = match &id.version {
            Some(version) => {
                let entity = self.entities.get(&format!("{qid}?v={version}"));
                if entity.is_none() {
                    tracing::debug!(%qid, %version, "requested version not loaded");
                }
                entity
            }
            None => self.entities.get(&qid),
        };
        match entity {
            Some(EmbedEntity::Document { document, .. }) => EmbedState::Document(document.clone()),
            Some(EmbedEntity::Account { account, .. }) => EmbedState::Account(account.clone()),
            Some(EmbedEntity::Comment { comment, .. }) => EmbedState::Comment(comment.clone()),
            None => EmbedState::NotFound,
        }
    }
}

/// Alert block with an optional collapsible JSON dump.
pub(crate) fn error_block(w: &mut HtmlWriter, message: &str, debug: Option<&Value>) -> fmt::Result {
    w.open(
        "div",
        &[("class", "block-content block-unknown"), ("role", "alert")],
    )?;
    match debug {
        Some(data) => {
            let pretty = serde_json::to_string_pretty(data).unwrap_or_default();
            w.open("details", &[])?;
            w.element("summary", &[("class", "error-message")], message)?;
            w.open("pre", &[])?;
            w.element("code", &[], &pretty)?;
            w.close("pre")?;
            w.close("details")?;
        }
        None => w.element("span", &[("class", "error-message")], message)?,
    }
    w.close("div")
}

impl Walker<'_> {
    pub(super) fn embed(&mut self, block: &Block, depth: usize, embed_depth: usize) -> fmt::Result {
        let Some(id) = unpack_hm_id(&block.link) else {
            tracing::warn!(block = %block.id, reference = %block.link, "unrecognized embed");
            return error_block(
                &mut self.w,
                &format!("Unrecognized Embed: {}", block.link),
                None,
            );
        };
        let qid = id.qid();
        if embed_depth >= MAX_EMBED_DEPTH || self.embed_chain.contains(&qid) {
            tracing::warn!(block = %block.id, %qid, embed_depth, "embed nesting stopped");
            return error_block(
                &mut self.w,
                "Embed nesting is too deep",
                Some(&json!({ "ref": block.link })),
            );
        }

        let key = node_key(&self.scope, &block.id);
        let show_referenced = self.show_referenced.contains(&key);
        let lookup = if show_referenced {
            id.clone()
        } else {
            HmId {
                version: None,
                ..id.clone()
            }
        };
        let state = self.resolver.resolve(&lookup);

        let action = Affordance::OpenLink.to_string();
        let raw = id.to_string();
        let embed_depth_attr = embed_depth.to_string();
        self.w.open(
            "div",
            &[
                ("class", "embed-wrapper"),
                ("data-hm-ref", &raw),
                ("data-embed-depth", &embed_depth_attr),
                ("data-action", &action),
                ("data-href", &raw),
            ],
        )?;
        match state {
            EmbedState::Loading => self.w.element(
                "div",
                &[("class", "spinner"), ("role", "status"), ("aria-label", "Loading")],
                "",
            )?,
            EmbedState::Error(message) => {
                tracing::warn!(%qid, %message, "embed failed to load");
                let debug = serde_json::to_value(block).unwrap_or_default();
                error_block(&mut self.w, &message, Some(&debug))?;
            }
            EmbedState::NotFound => match id.block_ref.as_deref() {
                Some(block_ref) => self.block_not_found(&id, block_ref, &key)?,
                None => error_block(
                    &mut self.w,
                    &format!("Unrecognized Embed: {}", block.link),
                    None,
                )?,
            },
            EmbedState::Document(document) if block.attributes.is_card_view() => {
                self.document_card(&id, &document)?
            }
            EmbedState::Document(document) => {
                self.enter_embed(&block.id, qid);
                let result = self.content_embed(&id, &document, &key, depth, embed_depth);
                self.leave_embed();
                result?;
                if show_referenced {
                    self.referenced_toggle(&key, "Back to Reference", "arrow-up-right")?;
                }
            }
            EmbedState::Account(account) => self.account_card(&account)?,
            EmbedState::Comment(comment) => {
                self.enter_embed(&block.id, qid);
                let result = self.embed_list(&comment.content, true, embed_depth + 1);
                self.leave_embed();
                result?;
            }
        }
        self.w.close("div")
    }

    fn enter_embed(&mut self, block_id: &str, qid: String) {
        self.scope.push(block_id.to_string());
        self.embed_chain.push(qid);
    }

    fn leave_embed(&mut self) {
        self.scope.pop();
        self.embed_chain.pop();
    }

    fn content_embed(
        &mut self,
        id: &HmId,
        document: &Document,
        key: &str,
        depth: usize,
        embed_depth: usize,
    ) -> fmt::Result {
        if let Some(block_ref) = id.block_ref.as_deref() {
            let Some(selected) = find_by_id(&document.content, block_ref) else {
                return self.block_not_found(id, block_ref, key);
            };
            let mut block = (*selected.block).clone();
            if let Some(BlockRange::Span { start, end }) = id.block_range {
                block
                    .annotations
                    .push(Annotation::new(AnnotationKind::Range, start, end));
            }
            let node = BlockNode {
                block: Arc::new(block),
                children: selected.children.clone(),
            };
            let expanded = id.block_range.is_some_and(|range| range.is_expanded());
            return self.embed_list(std::slice::from_ref(&node), expanded, embed_depth + 1);
        }

        match document.title() {
            Some(title) => {
                let heading = BlockNode::with_children(
                    Block::heading(format!("heading-{}", id.eid), title),
                    document.content.clone(),
                );
                let tag = self.list_open(&ChildrenType::Group, None, None, None)?;
                self.node(
                    &heading,
                    NodeParams {
                        depth,
                        is_first: true,
                        embed_depth: embed_depth + 1,
                        parent_block_id: None,
                        expanded: true,
                    },
                )?;
                self.w.close(tag)
            }
            None => self.embed_list(&document.content, false, embed_depth + 1),
        }
    }

    fn embed_list(&mut self, nodes: &[BlockNode], expanded: bool, embed_depth: usize) -> fmt::Result {
        let tag = self.list_open(&ChildrenType::Group, None, None, None)?;
        for (index, node) in nodes.iter().enumerate() {
            self.node(
                node,
                NodeParams {
                    depth: 1,
                    is_first: index == 0,
                    embed_depth,
                    parent_block_id: None,
                    expanded,
                },
            )?;
        }
        self.w.close(tag)
    }

    fn block_not_found(&mut self, id: &HmId, block_ref: &str, key: &str) -> fmt::Result {
        tracing::debug!(%id, block_ref, "embedded block not found");
        self.w.open(
            "div",
            &[("class", "block-not-found"), ("role", "alert")],
        )?;
        self.w.element(
            "span",
            &[("class", "error-message")],
            &format!("Block #{block_ref} was not found in this version"),
        )?;
        self.w.open("div", &[("class", "block-not-found-actions")])?;
        if id.version.is_some() {
            self.referenced_toggle(key, "Show Referenced Version", "move-left")?;
        }
        let action = Affordance::OpenLink.to_string();
        let raw = id.to_string();
        self.w.element(
            "button",
            &[
                ("type", "button"),
                ("data-action", &action),
                ("data-href", &raw),
                ("data-icon", "arrow-up-right"),
            ],
            "Open",
        )?;
        self.w.close("div")?;
        self.w.close("div")
    }

    fn referenced_toggle(&mut self, key: &str, label: &str, icon: &str) -> fmt::Result {
        let action = Affordance::ShowReferenced.to_string();
        self.w.element(
            "button",
            &[
                ("class", "embed-referenced"),
                ("type", "button"),
                ("data-action", &action),
                ("data-node-key", key),
                ("data-icon", icon),
            ],
            label,
        )
    }

    fn document_card(&mut self, id: &HmId, document: &Document) -> fmt::Result {
        let action = Affordance::OpenLink.to_string();
        let raw = id.to_string();
        self.w.open(
            "div",
            &[
                ("class", "document-card"),
                ("data-action", &action),
                ("data-href", &raw),
            ],
        )?;
        self.w.element(
            "div",
            &[("class", "card-title")],
            document.title().unwrap_or("Untitled Document"),
        )?;
        let text = document.text_content();
        if !text.is_empty() {
            self.w.element("div", &[("class", "card-text")], &text)?;
        }
        if !document.editors.is_empty() {
            self.w.open("div", &[("class", "card-editors")])?;
            for editor in &document.editors {
                let label = self
                    .resolver
                    .inline_label(&HmId::new(EntityType::Account, editor.as_str()))
                    .unwrap_or_else(|| editor.clone());
                self.w.element(
                    "span",
                    &[("class", "card-editor"), ("data-account-id", editor)],
                    &label,
                )?;
            }
            self.w.close("div")?;
        }
        self.w.close("div")
    }

    fn account_card(&mut self, account: &Account) -> fmt::Result {
        let name = account.display_name().unwrap_or(&account.id);
        self.w.open("div", &[("class", "embed-account")])?;
        if let Some(avatar) = &account.profile.avatar {
            let src = self
                .ctx
                .ipfs_url(avatar)
                .unwrap_or_else(|| format!("{}{avatar}", self.ctx.ipfs_blob_prefix));
            self.w
                .void("img", &[("class", "avatar"), ("src", &src), ("alt", name)])?;
        }
        self.w
            .element("span", &[("class", "embed-label")], "Account")?;
        self.w.element("strong", &[("class", "account-name")], name)?;
        self.w.close("div")
    }
}
