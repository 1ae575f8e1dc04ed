//! # hmtree
//!
//! Render hypermedia documents to HTML and inspect their block tree.
//!
//! ## Features
//!
//! - HTML rendering with collapse toggles, embeds and code highlighting
//! - Outline extraction (plain, JSON, box tree)
//! - Block counts, block lookup and clipping
//!
//! ## Usage
//!
//! Render a document:
//! ```sh
//! hmtree doc.json > doc.html
//! ```
//!
//! Show the outline with embeds resolved:
//! ```sh
//! hmtree --outline -o tree --embeds embeds.json doc.json
//! ```

mod cli;

use clap::Parser as ClapParser;
use cli::{Cli, OutputFormat};
use color_eyre::Result;
use color_eyre::eyre::WrapErr;
use hmtree::Config;
use hmtree::input::{determine_input_source, load_citations, load_document, load_embeds};
use hmtree::model::{BlockNode, Document, EntityType, HmId, unpack_hm_id};
use hmtree::render::{DocumentView, RenderContext, RouteParams, StaticResolver};
use hmtree::tree::{
    EmbedsContent, Preorder, build_outline, clip_content_blocks, find_by_id, outline_to_json,
    render_outline_tree, validate_unique_ids,
};
use indexmap::IndexMap;
use std::process;

fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Cli::parse();
    let config = Config::load();
    setup_tracing(args.log_level().unwrap_or(&config.log.level))?;

    let source = match determine_input_source(args.file.as_deref()) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error reading input: {}", e);
            eprintln!("\nUsage: hmtree [OPTIONS] <FILE>");
            eprintln!("       hmtree [OPTIONS] -");
            eprintln!("       cat doc.json | hmtree [OPTIONS]");
            process::exit(1);
        }
    };
    let input_name = source.name();
    let document =
        load_document(source).wrap_err_with(|| format!("failed to load {input_name}"))?;

    let duplicates = validate_unique_ids(&document.content);
    if !duplicates.is_empty() {
        tracing::warn!(
            ?duplicates,
            "document has duplicate block ids; lookups use the first match"
        );
    }

    let embeds = match &args.embeds {
        Some(path) => load_embeds(path)?,
        None => EmbedsContent::default(),
    };

    handle_cli_mode(&args, &config, &document, &embeds)
}

/// `RUST_LOG` wins over the level from flags or config.
fn setup_tracing(default_level: &str) -> Result<()> {
    use tracing_subscriber::prelude::*;

    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| default_level.to_string());
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_new(filter)?)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_timer(tracing_subscriber::fmt::time::uptime()),
        )
        .try_init()?;
    Ok(())
}

fn handle_cli_mode(
    args: &Cli,
    config: &Config,
    document: &Document,
    embeds: &EmbedsContent,
) -> Result<()> {
    let max_blocks = args.clip.or(config.render.max_block_count);
    let clipped = max_blocks.and_then(|max| clip_content_blocks(Some(&document.content), max));
    let content = clipped.as_deref().unwrap_or(&document.content);

    // Handle different modes
    if args.count {
        print_block_counts(content);
    } else if let Some(ref id) = args.find {
        print_block(content, id)?;
    } else if args.outline {
        print_outline(content, embeds, document, &args.output, config)?;
    } else {
        render_html(args, config, document, embeds, max_blocks)?;
    }
    Ok(())
}

/// Entity id of the document itself, used as the parent of outline entries.
fn document_hm_id(document: &Document) -> Option<HmId> {
    if document.id.is_empty() {
        return None;
    }
    unpack_hm_id(&document.id)
        .or_else(|| Some(HmId::new(EntityType::Document, document.id.as_str())))
}

fn print_block_counts(content: &[BlockNode]) {
    let mut counts: IndexMap<String, usize> = IndexMap::new();
    for node in Preorder::new(content) {
        *counts.entry(node.block.kind.to_string()).or_insert(0) += 1;
    }

    println!("Block counts:");
    for (kind, count) in &counts {
        println!("  {}: {}", kind, count);
    }
    println!("\nTotal: {}", counts.values().sum::<usize>());
}

fn print_block(content: &[BlockNode], id: &str) -> Result<()> {
    let Some(node) = find_by_id(content, id) else {
        eprintln!("Block '{}' not found", id);
        process::exit(1);
    };
    println!("{}", serde_json::to_string_pretty(node)?);
    Ok(())
}

fn print_outline(
    content: &[BlockNode],
    embeds: &EmbedsContent,
    document: &Document,
    format: &OutputFormat,
    config: &Config,
) -> Result<()> {
    let parent = document_hm_id(document);
    let outline = build_outline(content, embeds, parent.as_ref(), None);

    match format {
        OutputFormat::Plain => {
            for entry in &outline {
                print!("{}", entry.render_plain(0));
            }
        }
        OutputFormat::Json => println!("{}", outline_to_json(&outline)?),
        OutputFormat::Tree => print!("{}", render_outline_tree(&outline, config.tree_style())),
    }
    Ok(())
}

fn render_html(
    args: &Cli,
    config: &Config,
    document: &Document,
    embeds: &EmbedsContent,
    max_blocks: Option<usize>,
) -> Result<()> {
    let mut render_config = config.render.clone();
    if args.no_highlight {
        render_config.highlight_code = false;
    }

    let route = RouteParams {
        document_id: document_hm_id(document).map(|id| id.to_string()),
        version: Some(document.version.clone()).filter(|version| !version.is_empty()),
        block_ref: args.highlight.clone(),
    };
    let mut ctx = RenderContext::from_config(&render_config)
        .render_only(args.render_only)
        .with_route(route);
    ctx.comment = args.comment;
    if let Some(path) = &args.citations {
        ctx = ctx.with_citations(load_citations(path)?);
    }

    let mut view = DocumentView::from_document(document, ctx)
        .with_resolver(StaticResolver::from_embeds(embeds))
        .with_max_blocks(max_blocks)
        .with_expanded(!args.collapsed);
    if let Some(ref block) = args.block {
        view = view.with_focus(block.as_str());
    }
    if let Some(ref highlight) = args.highlight {
        if view.highlighted().is_none() {
            tracing::info!(block = %highlight, "highlight suppressed in comment mode");
        }
    }

    println!("{}", view.render()?);
    Ok(())
}
