//! Parsed navigation targets and `:param` path patterns

use std::collections::BTreeMap;
use std::fmt;

use reqwest::Url;

/// Base used only to borrow `Url`'s query parsing and serialization
const QUERY_BASE: &str = "http://localhost/";

/// A path plus its decoded query pairs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl Location {
    /// Parse `"/poem/12?from=search"`
    ///
    /// The path is normalized to start with `/` and lose any trailing `/`.
    /// Path segments are kept encoded; `PathPattern::matches` decodes them.
    pub fn parse(target: &str) -> Self {
        let (raw_path, raw_query) = match target.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (target, None),
        };
        let raw_path = raw_path.split('#').next().unwrap_or_default();

        let segments: Vec<&str> = raw_path.split('/').filter(|s| !s.is_empty()).collect();
        let path = format!("/{}", segments.join("/"));

        let query = raw_query
            .map(|q| q.split('#').next().unwrap_or_default())
            .filter(|q| !q.is_empty())
            .and_then(|q| Url::parse(&format!("{QUERY_BASE}?{q}")).ok())
            .map(|url| {
                url.query_pairs()
                    .map(|(k, v)| (k.into_owned(), v.into_owned()))
                    .collect()
            })
            .unwrap_or_default();

        Self { path, query }
    }

    /// Build a path from raw segments, percent-encoding each one
    ///
    /// A name containing `/` or `?` stays a single segment.
    pub fn from_segments(segments: &[&str]) -> Self {
        let encoded: Vec<String> = segments
            .iter()
            .filter(|s| !s.is_empty())
            .map(|s| urlencoding::encode(s).into_owned())
            .collect();
        Self {
            path: format!("/{}", encoded.join("/")),
            query: Vec::new(),
        }
    }

    pub fn with_query(mut self, key: &str, value: &str) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// First value for `key`
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.path.split('/').filter(|s| !s.is_empty())
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)?;
        if self.query.is_empty() {
            return Ok(());
        }

        // Url::parse of a constant cannot fail; fall back to the bare path if it ever does
        let Ok(mut url) = Url::parse(QUERY_BASE) else {
            return Ok(());
        };
        url.query_pairs_mut().extend_pairs(&self.query);
        match url.query() {
            Some(query) => write!(f, "?{query}"),
            None => Ok(()),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Path patterns
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// Route pattern such as `/poem/:id`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    pub fn new(pattern: &str) -> Self {
        let segments = pattern
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| match s.strip_prefix(':') {
                Some(name) => Segment::Param(name.to_string()),
                None => Segment::Literal(s.to_string()),
            })
            .collect();
        Self {
            raw: pattern.to_string(),
            segments,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Match a location, returning the captured (percent-decoded) parameters
    pub fn matches(&self, location: &Location) -> Option<BTreeMap<String, String>> {
        let parts: Vec<&str> = location.segments().collect();
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = BTreeMap::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            let part = decode_segment(part);
            match segment {
                Segment::Literal(literal) if *literal == part => {}
                Segment::Literal(_) => return None,
                Segment::Param(name) => {
                    params.insert(name.clone(), part);
                }
            }
        }
        Some(params)
    }
}

/// Percent-decode one path segment, keeping it verbatim if it is not UTF-8
fn decode_segment(part: &str) -> String {
    match urlencoding::decode(part) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => part.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalizes_path() {
        assert_eq!(Location::parse("").path, "/");
        assert_eq!(Location::parse("catalog/").path, "/catalog");
        assert_eq!(Location::parse("//poem//7").path, "/poem/7");
    }

    #[test]
    fn test_query_decoded_and_reencoded() {
        let location = Location::parse("/search?q=%E6%98%8E%E6%9C%88&page=2");
        assert_eq!(location.query_value("q"), Some("明月"));
        assert_eq!(location.query_value("page"), Some("2"));
        assert_eq!(location.query_value("missing"), None);

        let nested = Location::parse("/login").with_query("redirect", "/profile?tab=1");
        let reparsed = Location::parse(&nested.to_string());
        assert_eq!(reparsed.query_value("redirect"), Some("/profile?tab=1"));
    }

    #[test]
    fn test_display_without_query() {
        assert_eq!(Location::parse("/author/李白").to_string(), "/author/李白");
    }

    #[test]
    fn test_pattern_captures_params() {
        let pattern = PathPattern::new("/author/:name");
        let params = pattern.matches(&Location::parse("/author/杜甫")).unwrap();
        assert_eq!(params.get("name").map(String::as_str), Some("杜甫"));

        assert!(pattern.matches(&Location::parse("/author")).is_none());
        assert!(pattern.matches(&Location::parse("/poem/杜甫")).is_none());
        assert!(PathPattern::new("/").matches(&Location::parse("/")).is_some());
    }

    #[test]
    fn test_pattern_decodes_params() {
        let pattern = PathPattern::new("/author/:name");
        let params = pattern
            .matches(&Location::parse("/author/%E6%9D%8E%E7%99%BD"))
            .unwrap();
        assert_eq!(params.get("name").map(String::as_str), Some("李白"));

        // Undecodable bytes are kept as typed
        let params = pattern.matches(&Location::parse("/author/%FF")).unwrap();
        assert_eq!(params.get("name").map(String::as_str), Some("%FF"));
    }

    #[test]
    fn test_from_segments_keeps_reserved_characters_in_one_segment() {
        let location = Location::from_segments(&["author", "AC/DC"]);
        assert_eq!(location.path, "/author/AC%2FDC");
        let params = PathPattern::new("/author/:name").matches(&location).unwrap();
        assert_eq!(params.get("name").map(String::as_str), Some("AC/DC"));

        // Survives a round trip through its string form
        let reparsed = Location::parse(&Location::from_segments(&["poem", "12?x"]).to_string());
        let params = PathPattern::new("/poem/:id").matches(&reparsed).unwrap();
        assert_eq!(params.get("id").map(String::as_str), Some("12?x"));
    }
}
