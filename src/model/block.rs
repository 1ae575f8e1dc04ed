use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Kind of a block. Kinds this crate does not know about are kept as
/// [`BlockKind::Unknown`] so they can be rendered as an error affordance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockKind {
    Paragraph,
    Heading,
    Image,
    Video,
    File,
    WebEmbed,
    Embed,
    #[serde(alias = "codeBlock")]
    Code,
    #[serde(alias = "equation")]
    Math,
    Nostr,
    #[serde(untagged)]
    Unknown(String),
}

impl Default for BlockKind {
    fn default() -> Self {
        BlockKind::Unknown(String::new())
    }
}

impl BlockKind {
    pub fn as_str(&self) -> &str {
        match self {
            BlockKind::Paragraph => "paragraph",
            BlockKind::Heading => "heading",
            BlockKind::Image => "image",
            BlockKind::Video => "video",
            BlockKind::File => "file",
            BlockKind::WebEmbed => "web-embed",
            BlockKind::Embed => "embed",
            BlockKind::Code => "code",
            BlockKind::Math => "math",
            BlockKind::Nostr => "nostr",
            BlockKind::Unknown(kind) => kind,
        }
    }

    /// Kinds whose content lives in `text`.
    pub fn is_text_bearing(&self) -> bool {
        matches!(
            self,
            BlockKind::Paragraph | BlockKind::Heading | BlockKind::Code | BlockKind::Math
        )
    }

    /// Kinds whose content lives in `ref`.
    pub fn is_ref_bearing(&self) -> bool {
        matches!(
            self,
            BlockKind::Image
                | BlockKind::Video
                | BlockKind::File
                | BlockKind::WebEmbed
                | BlockKind::Embed
                | BlockKind::Nostr
        )
    }
}

impl std::fmt::Display for BlockKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the children of a block are laid out.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChildrenType {
    #[default]
    Group,
    Ol,
    Ul,
    Blockquote,
    #[serde(untagged)]
    Other(String),
}

impl ChildrenType {
    /// HTML tag for the children list, `None` for a plain group.
    pub fn list_tag(&self) -> Option<&'static str> {
        match self {
            ChildrenType::Ol => Some("ol"),
            ChildrenType::Ul => Some("ul"),
            ChildrenType::Blockquote => Some("blockquote"),
            ChildrenType::Group | ChildrenType::Other(_) => None,
        }
    }
}

/// Display mode of an embed block. Anything but "card" shows content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum EmbedView {
    #[default]
    Content,
    Card,
}

impl From<String> for EmbedView {
    fn from(view: String) -> Self {
        if view.eq_ignore_ascii_case("card") {
            EmbedView::Card
        } else {
            EmbedView::Content
        }
    }
}

/// Kind-specific block attributes. Values arrive as strings from the
/// backend; numbers are accepted and stringified.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children_type: Option<ChildrenType>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "opt_string")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "opt_string")]
    pub width: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "opt_string")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "opt_string")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "opt_string")]
    pub alt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view: Option<EmbedView>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "opt_string")]
    pub start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "opt_string")]
    pub list_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "opt_string")]
    pub sub_type: Option<String>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl BlockAttributes {
    pub fn is_empty(&self) -> bool {
        *self == BlockAttributes::default()
    }

    pub fn is_card_view(&self) -> bool {
        self.view == Some(EmbedView::Card)
    }
}

fn opt_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

/// Kind of a text-range annotation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnnotationKind {
    Strong,
    Emphasis,
    Underline,
    Strike,
    Code,
    Link,
    Color,
    InlineEmbed,
    Range,
    #[serde(untagged)]
    Unknown(String),
}

/// A decoration over one or more character ranges of a block's text.
///
/// `starts[i]..ends[i]` is the i-th range, in characters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(rename = "type")]
    pub kind: AnnotationKind,
    #[serde(default)]
    pub starts: Vec<usize>,
    #[serde(default)]
    pub ends: Vec<usize>,
    #[serde(rename = "ref", default, skip_serializing_if = "String::is_empty")]
    pub link: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub attributes: Map<String, Value>,
}

impl Annotation {
    pub fn new(kind: AnnotationKind, start: usize, end: usize) -> Self {
        Self {
            kind,
            starts: vec![start],
            ends: vec![end],
            link: String::new(),
            attributes: Map::new(),
        }
    }

    pub fn link(href: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            link: href.into(),
            ..Self::new(AnnotationKind::Link, start, end)
        }
    }

    pub fn inline_embed(reference: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            link: reference.into(),
            ..Self::new(AnnotationKind::InlineEmbed, start, end)
        }
    }

    /// Paired `(start, end)` ranges. Unpaired trailing offsets are dropped.
    pub fn ranges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.starts.iter().copied().zip(self.ends.iter().copied())
    }

    /// Check the parallel offset arrays against a text of `text_len` chars.
    pub fn validate(&self, text_len: usize) -> Result<()> {
        if self.starts.len() != self.ends.len() {
            return Err(Error::InvalidAnnotation {
                index: self.starts.len().min(self.ends.len()),
                reason: format!(
                    "{} starts but {} ends",
                    self.starts.len(),
                    self.ends.len()
                ),
            });
        }
        for (index, (start, end)) in self.ranges().enumerate() {
            if start > end {
                return Err(Error::InvalidAnnotation {
                    index,
                    reason: format!("start {start} is after end {end}"),
                });
            }
            if end > text_len {
                return Err(Error::InvalidAnnotation {
                    index,
                    reason: format!("end {end} is past the text length {text_len}"),
                });
            }
        }
        Ok(())
    }

    /// Text color carried by a `color` annotation.
    pub fn color(&self) -> Option<&str> {
        self.attributes.get("color").and_then(Value::as_str)
    }
}

/// A single content unit of a document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: BlockKind,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
    #[serde(rename = "ref", default, skip_serializing_if = "String::is_empty")]
    pub link: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
    #[serde(default, skip_serializing_if = "BlockAttributes::is_empty")]
    pub attributes: BlockAttributes,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Block {
    pub fn new(kind: BlockKind, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            ..Self::default()
        }
    }

    pub fn paragraph(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(BlockKind::Paragraph, id).with_text(text)
    }

    pub fn heading(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(BlockKind::Heading, id).with_text(text)
    }

    pub fn embed(id: impl Into<String>, reference: impl Into<String>) -> Self {
        Self::new(BlockKind::Embed, id).with_ref(reference)
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_ref(mut self, reference: impl Into<String>) -> Self {
        self.link = reference.into();
        self
    }

    pub fn with_view(mut self, view: EmbedView) -> Self {
        self.attributes.view = Some(view);
        self
    }

    pub fn with_children_type(mut self, children_type: ChildrenType) -> Self {
        self.attributes.children_type = Some(children_type);
        self
    }

    /// True when the block has nothing to show for its kind.
    ///
    /// Text kinds need `text`, media and embed kinds need `ref`. Unknown
    /// kinds are never empty so that they surface as an error affordance.
    pub fn is_empty(&self) -> bool {
        if self.kind.is_text_bearing() {
            self.text.is_empty()
        } else if self.kind.is_ref_bearing() {
            self.link.is_empty()
        } else {
            false
        }
    }
}

/// A block plus its nested children.
///
/// `children: None` and `children: Some(vec![])` are distinct and preserved
/// by every derived view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockNode {
    pub block: Arc<Block>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<BlockNode>>,
}

impl BlockNode {
    pub fn new(block: Block) -> Self {
        Self {
            block: Arc::new(block),
            children: None,
        }
    }

    pub fn with_children(block: Block, children: Vec<BlockNode>) -> Self {
        Self {
            block: Arc::new(block),
            children: Some(children),
        }
    }

    pub fn id(&self) -> &str {
        &self.block.id
    }

    /// Children slice, empty when the node has none.
    pub fn child_nodes(&self) -> &[BlockNode] {
        self.children.as_deref().unwrap_or(&[])
    }

    pub fn has_children(&self) -> bool {
        !self.child_nodes().is_empty()
    }
}

/// Emptiness predicate shared by every render call site.
///
/// A node with children is never empty; otherwise the block decides.
pub fn is_block_node_empty(node: &BlockNode) -> bool {
    if node.has_children() {
        return false;
    }
    node.block.is_empty()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// An immutable document value for one `(id, version)` pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub metadata: DocumentMetadata,
    #[serde(default)]
    pub content: Vec<BlockNode>,
    #[serde(default)]
    pub editors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_time: Option<String>,
}

impl Document {
    pub fn new(id: impl Into<String>, content: Vec<BlockNode>) -> Self {
        Self {
            id: id.into(),
            content,
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.metadata.name = Some(title.into());
        self
    }

    /// Title from metadata, if one is set and non-blank.
    pub fn title(&self) -> Option<&str> {
        self.metadata
            .name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
    }

    /// Plain text of every text-bearing block in pre-order, space separated.
    pub fn text_content(&self) -> String {
        let mut parts = Vec::new();
        collect_text(&self.content, &mut parts);
        parts.join(" ")
    }
}

fn collect_text<'a>(nodes: &'a [BlockNode], parts: &mut Vec<&'a str>) {
    for node in nodes {
        if node.block.kind.is_text_bearing() && !node.block.text.is_empty() {
            parts.push(&node.block.text);
        }
        collect_text(node.child_nodes(), parts);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    #[serde(default)]
    pub profile: Profile,
}

impl Account {
    pub fn display_name(&self) -> Option<&str> {
        self.profile.alias.as_deref().filter(|a| !a.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub target: String,
    #[serde(default)]
    pub content: Vec<BlockNode>,
}
