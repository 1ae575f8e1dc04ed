use hmtree::input::{load_embeds, parse_document};
use hmtree::render::StaticResolver;
use hmtree::tree::{count_nodes, outline_to_json};
use hmtree::{DocumentView, HmId, RenderContext, build_outline, clip_content_blocks, find_by_id};
use serde_json::json;

fn sample_document() -> hmtree::Document {
    let json = json!({
        "id": "hm://d/main",
        "version": "v1",
        "metadata": { "name": "Main" },
        "content": [
            {
                "block": { "id": "h1", "type": "heading", "text": "Intro" },
                "children": [
                    {
                        "block": {
                            "id": "p1",
                            "type": "paragraph",
                            "text": "Hello world",
                            "annotations": [
                                { "type": "strong", "starts": [0], "ends": [5] }
                            ]
                        }
                    },
                    { "block": { "id": "e1", "type": "embed", "ref": "hm://d/other" } }
                ]
            },
            { "block": { "id": "p2", "type": "paragraph", "text": "Tail & end" } }
        ]
    });
    parse_document(&json.to_string()).unwrap()
}

fn embeds_json() -> serde_json::Value {
    json!({
        "e1": {
            "type": "document",
            "id": "hm://d/other",
            "document": {
                "id": "other",
                "metadata": { "name": "Other" },
                "content": [
                    {
                        "block": { "id": "oh", "type": "heading", "text": "Embedded heading" },
                        "children": [
                            { "block": { "id": "op", "type": "paragraph", "text": "Embedded body" } }
                        ]
                    }
                ]
            }
        }
    })
}

fn load_sample_embeds() -> hmtree::tree::EmbedsContent {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("embeds.json");
    std::fs::write(&path, embeds_json().to_string()).unwrap();
    load_embeds(&path).unwrap()
}

#[test]
fn test_outline_splices_resolved_embed() {
    let document = sample_document();
    let embeds = load_sample_embeds();
    let parent = HmId::parse(&document.id).unwrap();

    let outline = build_outline(&document.content, &embeds, Some(&parent), None);
    assert_eq!(outline.len(), 1);
    assert_eq!(outline[0].title, "Intro");

    let nested = outline[0].child_entries();
    assert_eq!(nested.len(), 1);
    assert_eq!(nested[0].title, "Embedded heading");
    assert_eq!(nested[0].parent_block_id.as_deref(), Some("e1"));
    assert_eq!(nested[0].entity_id.as_ref().map(|id| id.eid.as_str()), Some("other"));

    let json = outline_to_json(&outline).unwrap();
    assert!(json.contains("\"Embedded heading\""));
}

#[test]
fn test_outline_without_embeds_omits_them() {
    let document = sample_document();
    let outline = build_outline(&document.content, &Default::default(), None, None);
    assert_eq!(outline.len(), 1);
    assert!(outline[0].child_entries().is_empty());
}

#[test]
fn test_render_document_html() {
    let document = sample_document();
    let embeds = load_sample_embeds();

    let mut view = DocumentView::from_document(&document, RenderContext::default())
        .with_resolver(StaticResolver::from_embeds(&embeds));
    let html = view.render().unwrap();

    assert!(html.starts_with("<div class=\"doc-content\""));
    assert!(html.contains("id=\"h1\""));
    assert!(html.contains("Intro"));
    assert!(html.contains("world"));
    assert!(html.contains("Tail &amp; end"));
    assert!(html.contains("Embedded body"));
}

#[test]
fn test_render_focused_block_only() {
    let document = sample_document();
    let mut view =
        DocumentView::from_document(&document, RenderContext::default()).with_focus("p2");
    let html = view.render().unwrap();
    assert!(html.contains("Tail &amp; end"));
    assert!(!html.contains("Intro"));

    let mut missing =
        DocumentView::from_document(&document, RenderContext::default()).with_focus("nope");
    let html = missing.render().unwrap();
    assert!(!html.contains("blocknode-content"));
}

#[test]
fn test_clip_and_find() {
    let document = sample_document();
    assert_eq!(count_nodes(&document.content), 4);

    let clipped = clip_content_blocks(Some(&document.content), 2).unwrap();
    assert_eq!(count_nodes(&clipped), 2);
    assert_eq!(clipped[0].child_nodes()[0].id(), "p1");
    assert!(find_by_id(&clipped, "p2").is_none());

    let found = find_by_id(&document.content, "e1").unwrap();
    assert_eq!(found.block.link, "hm://d/other");
}
