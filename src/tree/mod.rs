//! Pure functions over block trees: clipping, lookup and outline extraction.

mod clip;
mod locate;
pub mod outline;

pub use clip::{clip_content_blocks, count_nodes};
pub use locate::{Preorder, block_path, find_by_id, focused_blocks, validate_unique_ids};
pub use outline::{
    EmbedEntity, EmbedsContent, MAX_EMBED_DEPTH, OutlineEntry, OutlineIcon, TreeStyle,
    build_outline, outline_to_json, render_outline_tree,
};
