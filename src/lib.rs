//! # hmtree
//!
//! A renderer for hypermedia documents: trees of typed content blocks with
//! inline annotations, embeds and deep links.
//!
//! The library turns a document's block tree into HTML, extracts its
//! outline, clips it to a block budget and locates blocks by id. Rendering
//! keeps per-node collapse state and a deep-link highlight between renders,
//! so a [`DocumentView`] can be rendered repeatedly while the user toggles
//! blocks or follows links.
//!
//! ## Features
//!
//! - Block model matching the hypermedia JSON wire format
//! - Clipping, pre-order lookup and outline extraction over block trees
//! - HTML rendering with collapse toggles, embeds and citations
//! - Inline rendering of annotated text with leaf offsets
//! - Syntax-highlighted code blocks
//!
//! ## Example
//!
//! ```rust
//! use hmtree::{Block, BlockNode, DocumentView, RenderContext, build_outline};
//! use hmtree::tree::EmbedsContent;
//!
//! let content = vec![
//!     BlockNode::with_children(
//!         Block::heading("intro", "Introduction"),
//!         vec![BlockNode::new(Block::paragraph("p1", "Some content here."))],
//!     ),
//! ];
//!
//! let outline = build_outline(&content, &EmbedsContent::default(), None, None);
//! assert_eq!(outline[0].title, "Introduction");
//!
//! let mut view = DocumentView::new(content, RenderContext::default());
//! let html = view.render()?;
//! assert!(html.contains("Some content here."));
//! # Ok::<(), hmtree::Error>(())
//! ```

/// Configuration module for persisting render preferences.
///
/// Provides layout units, gateway addresses and logging defaults.
pub mod config;

/// Error type shared by loading, rendering and interaction.
pub mod error;

/// Input handling for document, embed and citation JSON.
pub mod input;

/// Block tree data model and hypermedia ids.
pub mod model;

/// HTML rendering of block trees.
pub mod render;

/// Clipping, lookup and outline extraction.
pub mod tree;

// Re-export commonly used types for convenience
pub use config::Config;
pub use error::{Error, Result};
pub use model::{Block, BlockNode, Document, HmId};
pub use render::{DocumentView, RenderContext};
pub use tree::{build_outline, clip_content_blocks, find_by_id};
