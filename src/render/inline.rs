//! Inline content to HTML, with character offsets for range selection.

use std::fmt;

use super::Affordance;
use super::context::RenderContext;
use super::embed::EmbedResolver;
use super::html::HtmlWriter;
use super::layout::{FontMetrics, px};
use crate::model::{InlineContent, TextStyles, is_hypermedia_scheme, unpack_hm_id};

/// Kind of link a text leaf sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkType {
    Basic,
    Hypermedia,
}

/// Starting offset and length of a text or inline-embed leaf, in chars
/// from the beginning of the block text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeafOffset {
    pub offset: usize,
    pub len: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineOutput {
    pub html: String,
    pub leaves: Vec<LeafOffset>,
    /// Offset just past the last rendered character.
    pub end_offset: usize,
}

/// Render `spans` as standalone HTML, numbering characters from
/// `base_offset`.
pub fn render_inline(
    spans: &[InlineContent],
    base_offset: usize,
    ctx: &RenderContext,
    resolver: &dyn EmbedResolver,
) -> crate::Result<InlineOutput> {
    let mut w = HtmlWriter::new();
    let font = super::layout::inline_content_size(ctx.text_unit).base;
    let mut renderer = InlineRenderer::new(&mut w, ctx, resolver);
    let end_offset = renderer.render(spans, base_offset, font)?;
    let leaves = renderer.into_leaves();
    Ok(InlineOutput {
        html: w.into_string(),
        leaves,
        end_offset,
    })
}

pub(crate) struct InlineRenderer<'w, 'a> {
    w: &'w mut HtmlWriter,
    ctx: &'a RenderContext,
    resolver: &'a dyn EmbedResolver,
    leaves: Vec<LeafOffset>,
}

impl<'w, 'a> InlineRenderer<'w, 'a> {
    pub fn new(w: &'w mut HtmlWriter, ctx: &'a RenderContext, resolver: &'a dyn EmbedResolver) -> Self {
        Self {
            w,
            ctx,
            resolver,
            leaves: Vec::new(),
        }
    }

    pub fn into_leaves(self) -> Vec<LeafOffset> {
        self.leaves
    }

    /// Returns the offset after the last span.
    pub fn render(
        &mut self,
        spans: &[InlineContent],
        base_offset: usize,
        font: FontMetrics,
    ) -> Result<usize, fmt::Error> {
        self.spans(spans, base_offset, font, None, false)
    }

    fn spans(
        &mut self,
        spans: &[InlineContent],
        base_offset: usize,
        font: FontMetrics,
        link_type: Option<LinkType>,
        is_range: bool,
    ) -> Result<usize, fmt::Error> {
        let style = format!(
            "font-size:{};line-height:{}",
            px(font.font_size),
            px(font.line_height)
        );
        let base = base_offset.to_string();
        self.w.open(
            "span",
            &[
                ("class", "inline-content"),
                ("style", &style),
                ("data-range-offset", &base),
            ],
        )?;

        let mut offset = base_offset;
        for span in spans {
            let entry = offset;
            offset += span.char_len();
            match span {
                InlineContent::Text { text, styles } => {
                    self.leaves.push(LeafOffset {
                        offset: entry,
                        len: offset - entry,
                    });
                    self.text(text, styles, entry, font, link_type, is_range)?;
                }
                InlineContent::Link { href, content } => {
                    self.link(href, content, entry, font, is_range)?;
                }
                InlineContent::InlineEmbed { link, .. } => {
                    self.leaves.push(LeafOffset {
                        offset: entry,
                        len: offset - entry,
                    });
                    self.inline_embed(link, entry)?;
                }
                InlineContent::Range { content } => {
                    let entry_attr = entry.to_string();
                    self.w.open(
                        "span",
                        &[
                            ("class", "range-highlight"),
                            ("data-range-offset", &entry_attr),
                        ],
                    )?;
                    self.spans(content, entry, font, link_type, true)?;
                    self.w.close("span")?;
                }
            }
        }

        self.w.close("span")?;
        Ok(offset)
    }

    /// Layers, outermost first: decoration span, strong, em, code.
    fn text(
        &mut self,
        text: &str,
        styles: &TextStyles,
        offset: usize,
        font: FontMetrics,
        link_type: Option<LinkType>,
        is_range: bool,
    ) -> fmt::Result {
        let offset = offset.to_string();
        let class = match link_type {
            Some(LinkType::Basic) => "text text-basic",
            Some(LinkType::Hypermedia) => "text text-hypermedia",
            None => "text text-default",
        };

        let mut lines = Vec::new();
        if styles.underline || link_type.is_some() {
            lines.push("underline");
        }
        if styles.strike {
            lines.push("line-through");
        }
        let mut style = String::new();
        if !lines.is_empty() {
            style.push_str("text-decoration-line:");
            style.push_str(&lines.join(" "));
        }
        if let Some(color) = &styles.color {
            if !style.is_empty() {
                style.push(';');
            }
            style.push_str("color:");
            style.push_str(color);
        }

        self.w.open(
            "span",
            &[
                ("class", class),
                (if style.is_empty() { "" } else { "style" }, &style),
                ("data-range-offset", &offset),
            ],
        )?;
        if styles.bold {
            self.w.open("strong", &[("data-range-offset", &offset)])?;
        }
        if styles.italic {
            self.w.open("em", &[("data-range-offset", &offset)])?;
        }
        if styles.code {
            let code_style = format!("font-size:{}", px(font.font_size * 0.85));
            self.w.open(
                "code",
                &[
                    (
                        "class",
                        if is_range {
                            "inline-code range-highlight"
                        } else {
                            "inline-code"
                        },
                    ),
                    ("style", &code_style),
                    ("data-range-offset", &offset),
                ],
            )?;
        }

        for (index, line) in text.split('\n').enumerate() {
            if index > 0 {
                self.w.void("br", &[])?;
            }
            self.w.text(line)?;
        }

        if styles.code {
            self.w.close("code")?;
        }
        if styles.italic {
            self.w.close("em")?;
        }
        if styles.bold {
            self.w.close("strong")?;
        }
        self.w.close("span")
    }

    fn link(
        &mut self,
        href: &str,
        content: &[InlineContent],
        entry: usize,
        font: FontMetrics,
        is_range: bool,
    ) -> fmt::Result {
        let (url, link_type) = if is_hypermedia_scheme(href) {
            match unpack_hm_id(href) {
                Some(id) => (id.to_gateway_url(&self.ctx.gateway_url), LinkType::Hypermedia),
                None => {
                    tracing::warn!(href, "unparseable hypermedia link");
                    self.spans(content, entry, font, None, is_range)?;
                    return Ok(());
                }
            }
        } else {
            (href.to_string(), LinkType::Basic)
        };

        let action = Affordance::OpenLink.to_string();
        let entry_attr = entry.to_string();
        let external = link_type == LinkType::Basic;
        self.w.open(
            "a",
            &[
                ("href", &url),
                (
                    "class",
                    if external { "link" } else { "hm-link" },
                ),
                (if external { "target" } else { "" }, "_blank"),
                (if external { "rel" } else { "" }, "noopener noreferrer"),
                ("data-action", &action),
                ("data-href", href),
                ("data-range-offset", &entry_attr),
            ],
        )?;
        self.spans(content, entry, font, Some(link_type), is_range)?;
        self.w.close("a")
    }

    /// The covered text is only a placeholder, so unresolved mentions show
    /// the raw reference.
    fn inline_embed(&mut self, reference: &str, entry: usize) -> fmt::Result {
        let label = unpack_hm_id(reference)
            .and_then(|id| self.resolver.inline_label(&id))
            .unwrap_or_else(|| reference.to_string());
        let action = Affordance::OpenLink.to_string();
        let entry_attr = entry.to_string();
        self.w.element(
            "span",
            &[
                ("class", "inline-embed"),
                ("data-ref", reference),
                ("data-action", &action),
                ("data-href", reference),
                ("data-range-offset", &entry_attr),
            ],
            &label,
        )
    }
}
