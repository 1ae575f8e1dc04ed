//! HTML rendering of block trees.
//!
//! [`DocumentView`] is the entry point: it walks the tree, keeps collapse and
//! highlight state between renders, and routes pressed affordances to the
//! host's [`ActionHandlers`]. Interactive elements carry a `data-action`
//! attribute holding the kebab-case name of their [`Affordance`].

mod blocks;
pub mod citations;
pub mod context;
pub mod embed;
mod html;
pub mod inline;
pub mod layout;
pub mod state;
mod view;
mod walker;

use strum::{Display, EnumIter, EnumString};

pub use blocks::{format_bytes, highlight_code};
pub use citations::{Citation, citation_tooltip, render_citation_item};
pub use context::{ActionHandlers, RenderContext, RouteParams};
pub use embed::{EmbedResolver, EmbedState, StaticResolver};
pub use inline::{InlineOutput, LeafOffset, LinkType, render_inline};
pub use state::{ExpandState, HIGHLIGHT_DURATION, HighlightTimer, Highlighter, ScrollRequest};
pub use view::DocumentView;

/// Interactive element of a rendered document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum Affordance {
    CopyBlock,
    ReplyBlock,
    CommentBlock,
    Citations,
    Toggle,
    More,
    SaveFile,
    OpenLink,
    ShowReferenced,
    CopyRange,
    CommentRange,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_affordance_names_round_trip() {
        for affordance in Affordance::iter() {
            let name = affordance.to_string();
            assert_eq!(Affordance::from_str(&name).unwrap(), affordance);
        }
        assert_eq!(Affordance::OpenLink.to_string(), "open-link");
        assert_eq!(Affordance::from_str("show-referenced").unwrap(), Affordance::ShowReferenced);
    }
}
