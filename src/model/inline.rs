//! Inline content spans derived from a block's text and annotations.
//!
//! Spans partition the block text left to right. Every character belongs to
//! exactly one leaf (`Text` or `InlineEmbed`), optionally wrapped by a `Link`
//! and then a `Range` container. Offsets count Unicode scalar values.

use std::ops::Range;

use serde::Serialize;

use super::block::{Annotation, AnnotationKind};

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct TextStyles {
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub bold: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub italic: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub underline: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub strike: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub code: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl TextStyles {
    pub fn is_plain(&self) -> bool {
        *self == TextStyles::default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum InlineContent {
    Text {
        text: String,
        styles: TextStyles,
    },
    Link {
        href: String,
        content: Vec<InlineContent>,
    },
    InlineEmbed {
        #[serde(rename = "ref")]
        link: String,
        text: String,
    },
    Range {
        content: Vec<InlineContent>,
    },
}

impl InlineContent {
    pub fn text(text: impl Into<String>) -> Self {
        InlineContent::Text {
            text: text.into(),
            styles: TextStyles::default(),
        }
    }

    /// Characters this span covers; containers sum their children.
    pub fn char_len(&self) -> usize {
        match self {
            InlineContent::Text { text, .. } | InlineContent::InlineEmbed { text, .. } => {
                text.chars().count()
            }
            InlineContent::Link { content, .. } | InlineContent::Range { content } => {
                content.iter().map(InlineContent::char_len).sum()
            }
        }
    }
}

/// Per-character decoration collected from all annotations.
#[derive(Default, Clone)]
struct CharMarks {
    styles: TextStyles,
    link: Option<usize>,
    embed: Option<(usize, usize)>,
    range: bool,
}

/// Build inline spans for `text` decorated by `annotations`.
///
/// Annotations that fail [`Annotation::validate`] are logged and still
/// applied: ranges with `start > end` are skipped, ranges past the end of
/// the text are clamped, and unpaired offsets are ignored.
pub fn to_inline_content(text: &str, annotations: &[Annotation]) -> Vec<InlineContent> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return Vec::new();
    }

    let mut marks = vec![CharMarks::default(); chars.len()];
    for (index, annotation) in annotations.iter().enumerate() {
        if let Err(err) = annotation.validate(chars.len()) {
            tracing::warn!(annotation = index, %err, "malformed annotation");
        }
        for (range_index, (start, end)) in annotation.ranges().enumerate() {
            if start > end {
                continue;
            }
            let end = end.min(chars.len());
            for mark in marks.iter_mut().take(end).skip(start) {
                apply_annotation(mark, annotation, index, range_index);
            }
        }
    }

    build_ranges(&chars, &marks, annotations, 0..chars.len())
}

fn apply_annotation(mark: &mut CharMarks, annotation: &Annotation, index: usize, range_index: usize) {
    match &annotation.kind {
        AnnotationKind::Strong => mark.styles.bold = true,
        AnnotationKind::Emphasis => mark.styles.italic = true,
        AnnotationKind::Underline => mark.styles.underline = true,
        AnnotationKind::Strike => mark.styles.strike = true,
        AnnotationKind::Code => mark.styles.code = true,
        AnnotationKind::Color => mark.styles.color = annotation.color().map(str::to_string),
        AnnotationKind::Link => mark.link = Some(index),
        AnnotationKind::InlineEmbed => mark.embed = Some((index, range_index)),
        AnnotationKind::Range => mark.range = true,
        AnnotationKind::Unknown(kind) => {
            tracing::debug!(kind = %kind, "ignoring unknown annotation kind");
        }
    }
}

/// Split `span` into maximal runs sharing the same key.
fn runs<K: PartialEq>(span: Range<usize>, key: impl Fn(usize) -> K) -> Vec<(K, Range<usize>)> {
    let mut out: Vec<(K, Range<usize>)> = Vec::new();
    for i in span {
        let k = key(i);
        match out.last_mut() {
            Some((last, range)) if *last == k => range.end = i + 1,
            _ => out.push((k, i..i + 1)),
        }
    }
    out
}

fn slice(chars: &[char], range: Range<usize>) -> String {
    chars[range].iter().collect()
}

fn build_ranges(
    chars: &[char],
    marks: &[CharMarks],
    annotations: &[Annotation],
    span: Range<usize>,
) -> Vec<InlineContent> {
    let mut out = Vec::new();
    for (in_range, run) in runs(span, |i| marks[i].range) {
        let content = build_links(chars, marks, annotations, run);
        if in_range {
            out.push(InlineContent::Range { content });
        } else {
            out.extend(content);
        }
    }
    out
}

fn build_links(
    chars: &[char],
    marks: &[CharMarks],
    annotations: &[Annotation],
    span: Range<usize>,
) -> Vec<InlineContent> {
    let mut out = Vec::new();
    for (link, run) in runs(span, |i| marks[i].link) {
        let content = build_leaves(chars, marks, annotations, run);
        match link {
            Some(index) => out.push(InlineContent::Link {
                href: annotations[index].link.clone(),
                content,
            }),
            None => out.extend(content),
        }
    }
    out
}

fn build_leaves(
    chars: &[char],
    marks: &[CharMarks],
    annotations: &[Annotation],
    span: Range<usize>,
) -> Vec<InlineContent> {
    runs(span, |i| (marks[i].embed, marks[i].styles.clone()))
        .into_iter()
        .map(|((embed, styles), run)| match embed {
            Some((index, _)) => InlineContent::InlineEmbed {
                link: annotations[index].link.clone(),
                text: slice(chars, run),
            },
            None => InlineContent::Text {
                text: slice(chars, run),
                styles,
            },
        })
        .collect()
}
