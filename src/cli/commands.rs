use clap::{ArgAction, Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "hmtree")]
#[command(version)]
#[command(about = "Render and inspect hypermedia document block trees")]
#[command(
    long_about = "hmtree - Render hypermedia documents to HTML and inspect their block tree.\n\n\
    Without flags the document is rendered to HTML on stdout. Use flags to print\n\
    the outline, count blocks, or locate a single block.\n\n\
    Examples:\n  \
    hmtree doc.json                        # Render HTML\n  \
    hmtree --outline doc.json              # Outline as a box tree\n  \
    hmtree --outline -o json doc.json      # Outline as JSON\n  \
    hmtree --embeds embeds.json doc.json   # Resolve embeds while rendering\n  \
    hmtree --find blk-1 doc.json           # Print one block node\n  \
    cat doc.json | hmtree --count -        # Count blocks from stdin"
)]
pub struct Cli {
    /// Document JSON file, or '-' for stdin
    ///
    /// The file holds either a full document (id, metadata, content, ...)
    /// or a bare array of block nodes. If no file is given and stdin is
    /// piped, input is read from stdin.
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub file: Option<String>,

    /// JSON map of embed block id to resolved entity
    ///
    /// Used to resolve embeds in the outline and in rendered HTML.
    #[arg(long = "embeds", value_name = "FILE")]
    pub embeds: Option<PathBuf>,

    /// JSON array of citations pointing into this document
    #[arg(long = "citations", value_name = "FILE")]
    pub citations: Option<PathBuf>,

    /// Print the document outline instead of HTML
    ///
    /// Headings and card embeds become entries; resolved content embeds
    /// splice their own outline in place.
    #[arg(long = "outline")]
    pub outline: bool,

    /// Output format for --outline
    ///
    ///   plain - Indented titles with block ids (default)
    ///   json  - Nested JSON entries
    ///   tree  - Box-drawing tree structure
    #[arg(short = 'o', long = "output", default_value = "plain")]
    pub output: OutputFormat,

    /// Count blocks by kind (shows statistics)
    #[arg(long = "count")]
    pub count: bool,

    /// Print the block node with this id as JSON
    #[arg(long = "find", value_name = "ID")]
    pub find: Option<String>,

    /// Clip the tree to at most N blocks in pre-order
    ///
    /// Overrides render.max_block_count from the config file.
    #[arg(long = "clip", visible_alias = "max-blocks", value_name = "N")]
    pub clip: Option<usize>,

    /// Render only the subtree of this block
    ///
    /// A block id that does not exist renders nothing.
    #[arg(long = "block", value_name = "ID")]
    pub block: Option<String>,

    /// Highlight this block as if deep-linked to it
    #[arg(long = "highlight", value_name = "ID")]
    pub highlight: Option<String>,

    /// Render in comment mode (no deep-link highlight)
    #[arg(long = "comment")]
    pub comment: bool,

    /// Render without interactive affordances
    #[arg(long = "render-only")]
    pub render_only: bool,

    /// Render top-level blocks collapsed
    #[arg(long = "collapsed")]
    pub collapsed: bool,

    /// Disable syntax highlighting of code blocks
    #[arg(long = "no-highlight")]
    pub no_highlight: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    ///
    /// RUST_LOG takes precedence when set.
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    Plain,
    /// JSON output
    Json,
    /// Tree format with box-drawing
    Tree,
}

impl Cli {
    /// Log filter for the verbosity flag, `None` to keep the configured level.
    pub fn log_level(&self) -> Option<&'static str> {
        match self.verbose {
            0 => None,
            1 => Some("debug"),
            _ => Some("trace"),
        }
    }
}
