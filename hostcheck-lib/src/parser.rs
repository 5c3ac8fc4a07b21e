//! Hosts-file parsing with category attribution.
//!
//! The grammar is line oriented. Comment lines either declare a category or
//! are ignored; every other line is classified as an IPv4-prefixed entry, a
//! hostname-prefixed entry, or noise.
//!
//! ```text
//! # CORE SERVICES          <- category declaration
//! 10.0.0.1   svc-a.local   <- (10.0.0.1, svc-a.local, CORE SERVICES)
//! # 10.0.0.2 old.local     <- commented-out entry, ignored
//! ```

use crate::error::HostCheckError;
use crate::types::{HostEntry, DEFAULT_CATEGORY, DEFAULT_NULL_ROUTE};
use lazy_static::lazy_static;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Prefixes that mark a comment as a commented-out address rather than a
/// category name.
pub const COMMENTED_IP_PREFIXES: [&str; 3] = ["10.", "5.", "22."];

lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
    static ref IPV4_LINE: Regex =
        Regex::new(r"^([0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}) (.+)$").unwrap();
    static ref HOSTNAME_LINE: Regex = Regex::new(r"^([A-Za-z0-9\-\.]+) (.+)$").unwrap();
}

/// How a single input line was classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    /// Blank line or plain comment
    Ignored,
    /// Category declaration carrying the uppercased label
    Category(String),
    /// Entry line: identifier plus the raw trailing tokens
    Entry { identifier: String, tokens: Vec<String> },
    /// Line matching neither entry pattern
    Malformed,
}

/// Hosts-file parser.
///
/// Holds the null-route sentinel; everything else about the grammar is fixed.
#[derive(Debug, Clone)]
pub struct HostsParser {
    null_route: String,
}

impl Default for HostsParser {
    fn default() -> Self {
        Self::new(DEFAULT_NULL_ROUTE)
    }
}

impl HostsParser {
    pub fn new<S: Into<String>>(null_route: S) -> Self {
        Self {
            null_route: null_route.into(),
        }
    }

    pub fn null_route(&self) -> &str {
        &self.null_route
    }

    /// Classify one raw line.
    pub fn classify(&self, line: &str) -> LineKind {
        let line = line.trim();

        if line.starts_with('#') {
            let text = line.trim_start_matches('#').trim();
            if text.is_empty() || looks_like_commented_ip(text) {
                return LineKind::Ignored;
            }
            return LineKind::Category(text.to_uppercase());
        }

        if line.is_empty() {
            return LineKind::Ignored;
        }

        let line = WHITESPACE.replace_all(line, " ");

        let captures = IPV4_LINE
            .captures(&line)
            .or_else(|| HOSTNAME_LINE.captures(&line));

        match captures {
            Some(caps) => LineKind::Entry {
                identifier: caps[1].to_string(),
                tokens: caps[2].split_whitespace().map(str::to_string).collect(),
            },
            None => LineKind::Malformed,
        }
    }

    /// Parse hosts text into entries, preserving file order.
    pub fn parse(&self, text: &str) -> Vec<HostEntry> {
        let mut entries = Vec::new();
        let mut category = DEFAULT_CATEGORY.to_string();

        for (number, line) in text.lines().enumerate() {
            match self.classify(line) {
                LineKind::Ignored => {}
                LineKind::Category(label) => {
                    tracing::trace!(line = number + 1, category = %label, "category marker");
                    category = label;
                }
                LineKind::Entry { identifier, tokens } => {
                    if identifier == self.null_route {
                        tracing::trace!(line = number + 1, "null-routed line skipped");
                        continue;
                    }
                    entries.extend(
                        tokens
                            .into_iter()
                            .filter(|token| self.is_usable_alias(token))
                            .map(|alias| HostEntry::new(identifier.clone(), alias, category.clone())),
                    );
                }
                LineKind::Malformed => {
                    tracing::trace!(line = number + 1, "unrecognised line skipped");
                }
            }
        }

        entries
    }

    /// Read and parse a hosts file.
    ///
    /// Invalid UTF-8 is replaced rather than rejected. A missing or unreadable
    /// file is the only error.
    pub fn parse_file<P: AsRef<Path>>(&self, path: P) -> Result<Vec<HostEntry>, HostCheckError> {
        let path = path.as_ref();

        let bytes = fs::read(path).map_err(|e| {
            HostCheckError::file_error(
                path.to_string_lossy(),
                format!("Failed to read hosts file: {}", e),
            )
        })?;

        Ok(self.parse(&String::from_utf8_lossy(&bytes)))
    }

    fn is_usable_alias(&self, token: &str) -> bool {
        !token.is_empty() && !token.starts_with('-') && token != self.null_route
    }
}

/// Parse hosts text with the default null-route sentinel.
pub fn parse_hosts(text: &str) -> Vec<HostEntry> {
    HostsParser::default().parse(text)
}

/// Read and parse a hosts file with the default null-route sentinel.
pub fn parse_hosts_file<P: AsRef<Path>>(path: P) -> Result<Vec<HostEntry>, HostCheckError> {
    HostsParser::default().parse_file(path)
}

// Prefix heuristic only; "10.x" style category names are misread as addresses.
fn looks_like_commented_ip(text: &str) -> bool {
    COMMENTED_IP_PREFIXES
        .iter()
        .any(|prefix| text.starts_with(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_category_then_entry() {
        let entries = parse_hosts("# CORE\n10.0.0.1 svc-a.local\n");
        assert_eq!(entries, vec![HostEntry::new("10.0.0.1", "svc-a.local", "CORE")]);
    }

    #[test]
    fn test_null_route_line_is_dropped() {
        assert!(parse_hosts("00.00.00.00 ghost.local").is_empty());
        assert!(parse_hosts("00.00.00.00 a.local b.local c.local").is_empty());
    }

    #[test]
    fn test_custom_null_route() {
        let parser = HostsParser::new("0.0.0.0");
        assert!(parser.parse("0.0.0.0 ads.example").is_empty());
        assert_eq!(parser.parse("00.00.00.00 ghost.local").len(), 1);
    }

    #[test]
    fn test_default_category_before_any_marker() {
        let entries = parse_hosts("192.168.1.1 router.lan\n# LAB\n192.168.1.2 nas.lan");
        assert_eq!(entries[0].category, DEFAULT_CATEGORY);
        assert_eq!(entries[1].category, "LAB");
    }

    #[test]
    fn test_category_scope_ends_at_next_marker() {
        let text = "# first\n1.1.1.1 a\n1.1.1.2 b\n## Second Group ##\n1.1.1.3 c\n";
        let categories: Vec<_> = parse_hosts(text)
            .into_iter()
            .map(|e| e.category)
            .collect();
        assert_eq!(categories, vec!["FIRST", "FIRST", "SECOND GROUP ##"]);
    }

    #[test]
    fn test_commented_ip_is_not_a_category() {
        let text = "# NET\n# 10.1.1.1 old.local\n#5.5.5.5 x\n# 22.0.0.1 y\n8.8.8.8 dns.google";
        let entries = parse_hosts(text);
        assert_eq!(entries, vec![HostEntry::new("8.8.8.8", "dns.google", "NET")]);
    }

    #[test]
    fn test_bare_hash_is_ignored() {
        let entries = parse_hosts("# NET\n#\n###   \n8.8.8.8 dns.google");
        assert_eq!(entries[0].category, "NET");
    }

    #[test]
    fn test_multiple_aliases_and_flags() {
        let entries = parse_hosts("10.0.0.5\t\tweb.local   api.local -flag  --x db.local");
        let aliases: Vec<_> = entries.iter().map(|e| e.alias.as_str()).collect();
        assert_eq!(aliases, vec!["web.local", "api.local", "db.local"]);
        assert!(entries.iter().all(|e| e.identifier == "10.0.0.5"));
    }

    #[test]
    fn test_hostname_prefixed_line() {
        let entries = parse_hosts("gateway.corp portal.corp");
        assert_eq!(
            entries,
            vec![HostEntry::new("gateway.corp", "portal.corp", DEFAULT_CATEGORY)]
        );
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let text = "10.0.0.1\nnot_a_host! value\n:: ipv6\n10.0.0.2 ok.local";
        let entries = parse_hosts(text);
        assert_eq!(entries, vec![HostEntry::new("10.0.0.2", "ok.local", DEFAULT_CATEGORY)]);
    }

    #[test]
    fn test_classify() {
        let parser = HostsParser::default();
        assert_eq!(parser.classify("   "), LineKind::Ignored);
        assert_eq!(parser.classify("# dns"), LineKind::Category("DNS".to_string()));
        assert_eq!(parser.classify("?? !!"), LineKind::Malformed);
        assert_eq!(
            parser.classify("1.2.3.4   a  b"),
            LineKind::Entry {
                identifier: "1.2.3.4".to_string(),
                tokens: vec!["a".to_string(), "b".to_string()],
            }
        );
    }

    #[test]
    fn test_parsing_is_deterministic() {
        let text = "# A\n1.1.1.1 x y\n# B\nhost.b z\n";
        assert_eq!(parse_hosts(text), parse_hosts(text));
    }

    #[test]
    fn test_parse_file_tolerates_invalid_utf8() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"# CAT\xff\n10.0.0.1 svc\xfe.local\n10.0.0.2 ok.local\n")
            .unwrap();
        file.flush().unwrap();

        let entries = parse_hosts_file(file.path()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1], HostEntry::new("10.0.0.2", "ok.local", "CAT\u{FFFD}"));
    }

    #[test]
    fn test_parse_missing_file_is_error() {
        let err = parse_hosts_file("/definitely/not/here/hosts").unwrap_err();
        assert!(matches!(err, HostCheckError::FileError { .. }));
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_hosts("").is_empty());
    }
}
