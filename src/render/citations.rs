use std::fmt;

use serde::{Deserialize, Serialize};

use super::Affordance;
use super::context::RenderContext;
use super::embed::{EmbedResolver, EmbedState, error_block};
use super::html::HtmlWriter;
use crate::model::{EntityType, HmId, unpack_hm_id};

/// A document or comment that links to a block of the current document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Citation {
    #[serde(default)]
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_version: Option<String>,
    /// Block of the source that holds the link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_context: Option<String>,
    /// Block of this document the link points at.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_fragment: Option<String>,
}

impl Citation {
    pub fn new(source: impl Into<String>, target_fragment: Option<&str>) -> Self {
        Self {
            source: source.into(),
            target_fragment: target_fragment.map(str::to_string),
            ..Self::default()
        }
    }
}

/// Tooltip of the citation count affordance.
pub fn citation_tooltip(count: usize) -> String {
    let noun = if count == 1 { "document" } else { "documents" };
    format!("See {count} {noun} referencing this")
}

/// Render one entry of a citations list.
///
/// Document and comment sources render as a card; other sources render
/// nothing. A citation without a source renders an error block instead of
/// failing the list.
pub fn render_citation_item(
    citation: &Citation,
    ctx: &RenderContext,
    resolver: &dyn EmbedResolver,
) -> crate::Result<String> {
    let mut w = HtmlWriter::new();
    write_citation_item(&mut w, citation, ctx, resolver)?;
    Ok(w.into_string())
}

fn write_citation_item(
    w: &mut HtmlWriter,
    citation: &Citation,
    ctx: &RenderContext,
    resolver: &dyn EmbedResolver,
) -> fmt::Result {
    if citation.source.is_empty() {
        tracing::warn!(?citation, "citation without a source");
        let debug = serde_json::to_value(citation).unwrap_or_default();
        return error_block(w, "Invalid citation", Some(&debug));
    }
    let Some(source) = unpack_hm_id(&citation.source) else {
        return Ok(());
    };

    let mut target = source.clone();
    if let Some(version) = &citation.source_version {
        target = target.with_version(version.as_str());
    }
    if let Some(block) = &citation.source_context {
        target = target.with_block(block.as_str(), None);
    }
    let href = target.to_gateway_url(&ctx.gateway_url);
    let raw = target.to_string();

    let (kind, title, text) = match (source.entity_type, resolver.resolve(&source)) {
        (EntityType::Document, EmbedState::Document(document)) => (
            "document",
            document.title().unwrap_or("Untitled Document").to_string(),
            document.text_content(),
        ),
        (EntityType::Document, _) => ("document", "Untitled Document".to_string(), String::new()),
        (EntityType::Comment, EmbedState::Comment(comment)) => {
            let author = resolver
                .inline_label(&HmId::new(EntityType::Account, comment.author.as_str()))
                .unwrap_or_else(|| comment.author.clone());
            ("comment", format!("Comment by {author}"), String::new())
        }
        (EntityType::Comment, _) => ("comment", "Comment".to_string(), String::new()),
        _ => return Ok(()),
    };

    let action = Affordance::OpenLink.to_string();
    w.open(
        "a",
        &[
            ("class", &format!("citation-item citation-{kind}")),
            ("href", &href),
            ("data-action", &action),
            ("data-href", &raw),
        ],
    )?;
    w.element("span", &[("class", "citation-title")], &title)?;
    if !text.is_empty() {
        w.element("span", &[("class", "citation-text")], &text)?;
    }
    w.close("a")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Document;
    use crate::render::embed::StaticResolver;
    use crate::tree::EmbedEntity;
    use std::sync::Arc;

    #[test]
    fn test_tooltip_pluralization() {
        assert_eq!(citation_tooltip(1), "See 1 document referencing this");
        assert_eq!(citation_tooltip(3), "See 3 documents referencing this");
    }

    #[test]
    fn test_missing_source_renders_error() {
        let ctx = RenderContext::default();
        let html = render_citation_item(&Citation::default(), &ctx, &()).unwrap();
        assert!(html.contains("block-unknown"));
        assert!(html.contains("Invalid citation"));
    }

    #[test]
    fn test_document_citation_uses_resolved_title() {
        let ctx = RenderContext::default();
        let mut resolver = StaticResolver::default();
        resolver.insert(EmbedEntity::Document {
            id: unpack_hm_id("hm://d/src").unwrap(),
            document: Arc::new(Document::new("src", vec![]).with_title("Source Doc")),
        });
        let citation = Citation {
            source: "hm://d/src".into(),
            source_version: Some("v3".into()),
            source_context: Some("blk".into()),
            target_fragment: Some("b1".into()),
        };
        let html = render_citation_item(&citation, &ctx, &resolver).unwrap();
        assert!(html.contains("Source Doc"));
        assert!(html.contains("href=\"https://hyper.media/d/src?v=v3#blk\""));
        assert!(html.contains("data-action=\"open-link\""));
    }

    #[test]
    fn test_foreign_source_renders_nothing() {
        let ctx = RenderContext::default();
        let citation = Citation::new("https://example.com", Some("b1"));
        assert_eq!(render_citation_item(&citation, &ctx, &()).unwrap(), "");
    }
}
