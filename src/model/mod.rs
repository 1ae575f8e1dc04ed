//! Block tree model for hypermedia documents.
//!
//! A [`Document`] owns a forest of [`BlockNode`]s. Nodes share their
//! [`Block`] through an `Arc`, so derived views (clipped trees, embeds with
//! an added range annotation) are new node values pointing at the same
//! block data.

mod block;
pub mod hmid;
pub mod inline;

pub use block::{
    Account, Annotation, AnnotationKind, Block, BlockAttributes, BlockKind, BlockNode,
    ChildrenType, Comment, Document, DocumentMetadata, EmbedView, Profile, is_block_node_empty,
};
pub use hmid::{BlockRange, EntityType, HYPERMEDIA_SCHEME, HmId, is_hypermedia_scheme, unpack_hm_id};
pub use inline::{InlineContent, TextStyles, to_inline_content};
