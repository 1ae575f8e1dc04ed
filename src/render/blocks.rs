//! Content of a single block, by kind.

use std::fmt;
use std::sync::OnceLock;

use syntect::html::{ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

use super::Affordance;
use super::context::cid_from_ipfs_url;
use super::embed::error_block;
use super::inline::InlineRenderer;
use super::layout::{FontMetrics, heading_text, inline_content_size};
use super::walker::Walker;
use crate::model::{Block, BlockKind, to_inline_content};

/// Prefix keeps highlight classes from clashing with the block classes.
const CODE_CLASS_STYLE: ClassStyle = ClassStyle::SpacedPrefixed { prefix: "hl-" };

fn syntax_set() -> &'static SyntaxSet {
    static SYNTAXES: OnceLock<SyntaxSet> = OnceLock::new();
    SYNTAXES.get_or_init(SyntaxSet::load_defaults_newlines)
}

/// Classed HTML for `source`, or `None` when the language is unknown or
/// highlighting fails.
pub fn highlight_code(language: &str, source: &str) -> Option<String> {
    let syntaxes = syntax_set();
    let syntax = syntaxes.find_syntax_by_token(language)?;
    let mut generator = ClassedHTMLGenerator::new_with_class_style(syntax, syntaxes, CODE_CLASS_STYLE);
    for line in LinesWithEndings::from(source) {
        if let Err(err) = generator.parse_html_for_line_which_includes_newline(line) {
            tracing::debug!(language, error = %err, "code highlighting failed");
            return None;
        }
    }
    Some(generator.finalize())
}

/// Human readable byte count using powers of 1024.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut exponent = 0;
    let mut value = bytes as f64;
    while value >= 1024.0 && exponent < UNITS.len() - 1 {
        value /= 1024.0;
        exponent += 1;
    }
    let rounded = format!("{value:.2}");
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", UNITS[exponent])
}

/// `abcdef...uvwxyz` for long keys.
fn shorten_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 12 {
        return key.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 6..].iter().collect();
    format!("{head}...{tail}")
}

fn file_extension(name: &str) -> Option<&str> {
    name.rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty())
}

impl Walker<'_> {
    pub(crate) fn block_content(
        &mut self,
        block: &Block,
        depth: usize,
        embed_depth: usize,
        parent_block_id: Option<&str>,
    ) -> fmt::Result {
        let depth_attr = depth.to_string();
        let kind = block.kind.as_str().to_string();
        let class = format!("block-content block-{kind}");
        self.w.open(
            "div",
            &[
                ("class", &class),
                ("data-blockid", &block.id),
                ("data-content-type", &kind),
                ("data-depth", &depth_attr),
                (
                    if parent_block_id.is_some() { "data-parent-block-id" } else { "" },
                    parent_block_id.unwrap_or_default(),
                ),
            ],
        )?;
        match &block.kind {
            BlockKind::Paragraph => self.paragraph(block)?,
            BlockKind::Heading => self.heading(block, depth)?,
            BlockKind::Image => self.image(block)?,
            BlockKind::Video => self.video(block)?,
            BlockKind::File => match &block.attributes.sub_type {
                Some(sub_type) if sub_type.starts_with("nostr:") => self.nostr(block)?,
                _ => self.file(block)?,
            },
            BlockKind::Nostr => self.nostr(block)?,
            BlockKind::WebEmbed => self.web_embed(block)?,
            BlockKind::Embed => self.embed(block, depth, embed_depth)?,
            BlockKind::Code => self.code(block)?,
            BlockKind::Math => self.math(block)?,
            BlockKind::Unknown(kind) => {
                tracing::warn!(block = %block.id, %kind, "unrecognized block kind");
                let debug = serde_json::to_value(block).unwrap_or_default();
                error_block(&mut self.w, "Unrecognized Block", Some(&debug))?;
            }
        }
        self.w.close("div")
    }

    fn inline(&mut self, block: &Block, font: FontMetrics) -> fmt::Result {
        let spans = to_inline_content(&block.text, &block.annotations);
        let mut renderer = InlineRenderer::new(&mut self.w, self.ctx, self.resolver);
        renderer.render(&spans, 0, font)?;
        Ok(())
    }

    fn paragraph(&mut self, block: &Block) -> fmt::Result {
        let size = inline_content_size(self.ctx.text_unit);
        let style = size.style();
        let class = if self.ctx.comment {
            "content-inline is-comment"
        } else {
            "content-inline"
        };
        self.w.open("p", &[("class", class), ("style", &style)])?;
        self.inline(block, size.base)?;
        self.w.close("p")
    }

    fn heading(&mut self, block: &Block, depth: usize) -> fmt::Result {
        let size = heading_text(depth, self.ctx.text_unit);
        let tag = format!("h{}", depth.clamp(1, 6));
        let style = size.style();
        self.w.open(
            &tag,
            &[("class", "content-inline heading-inline"), ("style", &style)],
        )?;
        self.inline(block, size.base)?;
        self.w.close(&tag)
    }

    fn image(&mut self, block: &Block) -> fmt::Result {
        let Some(cid) = cid_from_ipfs_url(&block.link) else {
            tracing::debug!(block = %block.id, reference = %block.link, "image without ipfs reference");
            return Ok(());
        };
        let src = format!("{}{cid}", self.ctx.ipfs_blob_prefix);
        let width = block
            .attributes
            .width
            .as_deref()
            .map(|width| format!("width:{width}px"))
            .unwrap_or_default();
        self.w.open("figure", &[("class", "image-figure")])?;
        self.w.void(
            "img",
            &[
                ("src", &src),
                ("alt", block.attributes.alt.as_deref().unwrap_or(&block.text)),
                (if width.is_empty() { "" } else { "style" }, &width),
            ],
        )?;
        if !block.text.is_empty() {
            let size = FontMetrics {
                font_size: self.ctx.text_unit * 0.85,
                line_height: self.ctx.text_unit * 0.85 * 1.3,
            };
            self.w.open("figcaption", &[("class", "image-caption")])?;
            self.inline(block, size)?;
            self.w.close("figcaption")?;
        }
        self.w.close("figure")
    }

    fn video(&mut self, block: &Block) -> fmt::Result {
        if block.link.is_empty() {
            return Ok(());
        }
        let width = block
            .attributes
            .width
            .as_deref()
            .map(|width| format!("width:{width}px"))
            .unwrap_or_default();
        let width_attr = (if width.is_empty() { "" } else { "style" }, width.as_str());
        match cid_from_ipfs_url(&block.link) {
            Some(cid) => {
                let src = format!("{}{cid}", self.ctx.ipfs_blob_prefix);
                let mime = block
                    .attributes
                    .name
                    .as_deref()
                    .and_then(file_extension)
                    .map(|ext| format!("video/{ext}"))
                    .unwrap_or_default();
                self.w.open(
                    "video",
                    &[("class", "video"), ("controls", "controls"), width_attr],
                )?;
                self.w.void(
                    "source",
                    &[("src", &src), (if mime.is_empty() { "" } else { "type" }, &mime)],
                )?;
                self.w.text("Something is wrong with the video file.")?;
                self.w.close("video")
            }
            None => {
                self.w.open(
                    "iframe",
                    &[
                        ("class", "video"),
                        ("src", &block.link),
                        ("allowfullscreen", "allowfullscreen"),
                        width_attr,
                    ],
                )?;
                self.w.close("iframe")
            }
        }
    }

    fn file(&mut self, block: &Block) -> fmt::Result {
        let name = block
            .attributes
            .name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or("Untitled File");
        self.w.open("div", &[("class", "file-card")])?;
        self.w.element("span", &[("class", "file-name")], name)?;
        if let Some(size) = block
            .attributes
            .size
            .as_deref()
            .and_then(|size| size.parse::<u64>().ok())
        {
            self.w
                .element("span", &[("class", "file-size")], &format_bytes(size))?;
        }
        let cid = cid_from_ipfs_url(&block.link);
        if let (Some(cid), true) = (cid, self.ctx.handlers.save_cid_as_file.is_some()) {
            let action = Affordance::SaveFile.to_string();
            self.w.element(
                "button",
                &[
                    ("class", "file-save"),
                    ("type", "button"),
                    ("data-action", &action),
                    ("data-cid", cid),
                    ("data-file-name", name),
                    ("data-icon", "download"),
                ],
                "Download",
            )?;
        }
        self.w.close("div")
    }

    fn nostr(&mut self, block: &Block) -> fmt::Result {
        let name = block.attributes.name.as_deref().unwrap_or_default();
        self.w.open("div", &[("class", "nostr-card")])?;
        self.w.element(
            "div",
            &[("class", "nostr-header")],
            &format!("Public Key: {}", shorten_key(name)),
        )?;
        if !block.text.is_empty() {
            self.w
                .element("div", &[("class", "nostr-content")], &block.text)?;
        }
        self.w.close("div")
    }

    fn web_embed(&mut self, block: &Block) -> fmt::Result {
        let action = Affordance::OpenLink.to_string();
        self.w.open(
            "div",
            &[
                ("class", "x-post-container"),
                ("data-url", &block.link),
                ("data-action", &action),
                ("data-href", &block.link),
            ],
        )?;
        self.w.element(
            "a",
            &[
                ("href", &block.link),
                ("target", "_blank"),
                ("rel", "noopener noreferrer"),
            ],
            &block.link,
        )?;
        self.w.close("div")
    }

    fn code(&mut self, block: &Block) -> fmt::Result {
        let language = block
            .attributes
            .language
            .as_deref()
            .filter(|language| !language.is_empty());
        let class = language
            .map(|language| format!("language-{language}"))
            .unwrap_or_default();
        self.w.open("pre", &[("class", "code-block")])?;
        self.w
            .open("code", &[(if class.is_empty() { "" } else { "class" }, &class)])?;
        let highlighted = match language {
            Some(language) if self.ctx.highlight_code => highlight_code(language, &block.text),
            _ => None,
        };
        match highlighted {
            Some(html) => self.w.raw(&html)?,
            None => self.w.text(&block.text)?,
        }
        self.w.close("code")?;
        self.w.close("pre")
    }

    fn math(&mut self, block: &Block) -> fmt::Result {
        self.w.element(
            "div",
            &[("class", "block-katex"), ("data-tex", &block.text)],
            &block.text,
        )
    }
}
