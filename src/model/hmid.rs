//! Hypermedia ids (`hm://d/<eid>?v=<version>#<block>[start:end]`).

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const HYPERMEDIA_SCHEME: &str = "hm";

/// True for links that stay inside the hypermedia network.
pub fn is_hypermedia_scheme(href: &str) -> bool {
    href.strip_prefix(HYPERMEDIA_SCHEME)
        .is_some_and(|rest| rest.starts_with("://"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Account,
    Document,
    Comment,
    Group,
}

impl EntityType {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "a" => Some(EntityType::Account),
            "d" => Some(EntityType::Document),
            "c" => Some(EntityType::Comment),
            "g" => Some(EntityType::Group),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            EntityType::Account => "a",
            EntityType::Document => "d",
            EntityType::Comment => "c",
            EntityType::Group => "g",
        }
    }
}

/// Sub-range of a block addressed by a link, or the whole block with its
/// children expanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlockRange {
    Span { start: usize, end: usize },
    Expanded { expanded: bool },
}

impl BlockRange {
    pub fn span(start: usize, end: usize) -> Self {
        BlockRange::Span { start, end }
    }

    pub fn expanded() -> Self {
        BlockRange::Expanded { expanded: true }
    }

    pub fn is_expanded(&self) -> bool {
        matches!(self, BlockRange::Expanded { expanded: true })
    }
}

/// An unpacked hypermedia id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HmId {
    pub entity_type: EntityType,
    pub eid: String,
    pub version: Option<String>,
    pub block_ref: Option<String>,
    pub block_range: Option<BlockRange>,
}

fn hm_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"^hm://(?P<type>[a-z])/(?P<eid>[^/?#]+)(?:\?v=(?P<version>[^#&]+))?(?:#(?P<block>[^\[+]+)(?:\[(?P<start>\d+):(?P<end>\d+)\]|(?P<expanded>\+))?)?$",
        )
        .expect("hypermedia id pattern is valid")
    })
}

impl HmId {
    pub fn new(entity_type: EntityType, eid: impl Into<String>) -> Self {
        Self {
            entity_type,
            eid: eid.into(),
            version: None,
            block_ref: None,
            block_range: None,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_block(mut self, block: impl Into<String>, range: Option<BlockRange>) -> Self {
        self.block_ref = Some(block.into());
        self.block_range = range;
        self
    }

    /// Parse a full `hm://` id.
    pub fn parse(input: &str) -> Result<Self> {
        let caps = hm_id_pattern()
            .captures(input.trim())
            .ok_or_else(|| Error::InvalidHmId(input.to_string()))?;

        let entity_type = EntityType::from_code(&caps["type"])
            .ok_or_else(|| Error::InvalidHmId(input.to_string()))?;

        let block_range = match (caps.name("start"), caps.name("end"), caps.name("expanded")) {
            (Some(start), Some(end), _) => {
                let start = start
                    .as_str()
                    .parse()
                    .map_err(|_| Error::InvalidHmId(input.to_string()))?;
                let end = end
                    .as_str()
                    .parse()
                    .map_err(|_| Error::InvalidHmId(input.to_string()))?;
                Some(BlockRange::span(start, end))
            }
            (_, _, Some(_)) => Some(BlockRange::expanded()),
            _ => None,
        };

        Ok(Self {
            entity_type,
            eid: caps["eid"].to_string(),
            version: caps.name("version").map(|m| m.as_str().to_string()),
            block_ref: caps.name("block").map(|m| m.as_str().to_string()),
            block_range,
        })
    }

    /// Id of the entity without version or block fragment.
    pub fn qid(&self) -> String {
        format!(
            "{HYPERMEDIA_SCHEME}://{}/{}",
            self.entity_type.code(),
            self.eid
        )
    }

    /// Browser URL for this id on a web gateway.
    pub fn to_gateway_url(&self, gateway: &str) -> String {
        let mut url = format!(
            "{}/{}/{}",
            gateway.trim_end_matches('/'),
            self.entity_type.code(),
            self.eid
        );
        self.push_suffix(&mut url);
        url
    }

    fn push_suffix(&self, out: &mut String) {
        if let Some(version) = &self.version {
            out.push_str("?v=");
            out.push_str(version);
        }
        if let Some(block) = &self.block_ref {
            out.push('#');
            out.push_str(block);
            match self.block_range {
                Some(BlockRange::Span { start, end }) => {
                    out.push_str(&format!("[{start}:{end}]"));
                }
                Some(BlockRange::Expanded { expanded: true }) => out.push('+'),
                _ => {}
            }
        }
    }
}

impl fmt::Display for HmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = self.qid();
        self.push_suffix(&mut out);
        f.write_str(&out)
    }
}

impl TryFrom<String> for HmId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        HmId::parse(&value)
    }
}

impl From<HmId> for String {
    fn from(id: HmId) -> Self {
        id.to_string()
    }
}

/// Lenient unpacking: `None` for anything that is not a hypermedia id.
pub fn unpack_hm_id(reference: &str) -> Option<HmId> {
    HmId::parse(reference).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_document_id() {
        let id = HmId::parse("hm://d/abc123").unwrap();
        assert_eq!(id.entity_type, EntityType::Document);
        assert_eq!(id.eid, "abc123");
        assert_eq!(id.version, None);
        assert_eq!(id.block_ref, None);
    }

    #[test]
    fn test_parse_version_block_and_range() {
        let id = HmId::parse("hm://d/abc?v=bafy1#blk9[3:8]").unwrap();
        assert_eq!(id.version.as_deref(), Some("bafy1"));
        assert_eq!(id.block_ref.as_deref(), Some("blk9"));
        assert_eq!(id.block_range, Some(BlockRange::span(3, 8)));

        let expanded = HmId::parse("hm://d/abc#blk9+").unwrap();
        assert_eq!(expanded.block_range, Some(BlockRange::expanded()));
        assert!(expanded.block_range.unwrap().is_expanded());
    }

    #[test]
    fn test_parse_rejects_other_schemes() {
        assert!(HmId::parse("https://example.com").is_err());
        assert!(HmId::parse("hm://x/abc").is_err());
        assert!(unpack_hm_id("").is_none());
    }

    #[test]
    fn test_display_round_trip() {
        for raw in [
            "hm://a/alice",
            "hm://d/abc?v=v1",
            "hm://d/abc?v=v1#b1[0:4]",
            "hm://c/comment1#b2+",
        ] {
            assert_eq!(HmId::parse(raw).unwrap().to_string(), raw);
        }
    }

    #[test]
    fn test_gateway_url_and_qid() {
        let id = HmId::parse("hm://d/abc?v=v2#intro").unwrap();
        assert_eq!(id.qid(), "hm://d/abc");
        assert_eq!(
            id.to_gateway_url("https://hyper.media/"),
            "https://hyper.media/d/abc?v=v2#intro"
        );
    }

    #[test]
    fn test_is_hypermedia_scheme() {
        assert!(is_hypermedia_scheme("hm://d/abc"));
        assert!(!is_hypermedia_scheme("https://hm.example"));
        assert!(!is_hypermedia_scheme("hmm://d/abc"));
    }

    #[test]
    fn test_block_range_json_shapes() {
        assert_eq!(
            serde_json::to_string(&BlockRange::span(1, 4)).unwrap(),
            r#"{"start":1,"end":4}"#
        );
        assert_eq!(
            serde_json::to_string(&BlockRange::expanded()).unwrap(),
            r#"{"expanded":true}"#
        );
    }
}
