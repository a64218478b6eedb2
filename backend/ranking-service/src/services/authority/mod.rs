//! Domain Authority Table
//!
//! Declarative, ordered list of `(pattern, score)` pairs. Entries without a
//! `*` are exact domains and are looked up through a map; entries with a `*`
//! are wildcard patterns tried in declaration order, first match wins. The
//! ordering is part of the policy: `blog.*` declared before `*.dev` means
//! `blog.example.dev` scores as a blog.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

pub const UNKNOWN_DOMAIN: &str = "unknown";
pub const DEFAULT_AUTHORITY_SCORE: f64 = 3.0;

#[derive(Debug, Error)]
pub enum AuthorityTableError {
    #[error("failed to read authority table {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse authority table {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// One declared row of the table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorityEntry {
    pub pattern: String,
    pub score: f64,
}

impl AuthorityEntry {
    pub fn new(pattern: impl Into<String>, score: f64) -> Self {
        Self {
            pattern: pattern.into(),
            score,
        }
    }

    fn is_wildcard(&self) -> bool {
        self.pattern.contains('*')
    }
}

/// On-disk / introspection shape of the table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorityTableSpec {
    #[serde(default = "default_score")]
    pub default: f64,
    pub entries: Vec<AuthorityEntry>,
}

fn default_score() -> f64 {
    DEFAULT_AUTHORITY_SCORE
}

struct CompiledPattern {
    // `None` when the pattern failed to compile; it then matches nothing.
    regex: Option<Regex>,
    score: f64,
}

pub struct DomainAuthorityTable {
    entries: Vec<AuthorityEntry>,
    exact: HashMap<String, f64>,
    patterns: Vec<CompiledPattern>,
    default: f64,
}

impl Default for DomainAuthorityTable {
    fn default() -> Self {
        Self::from_spec(default_spec())
    }
}

impl DomainAuthorityTable {
    pub fn from_spec(spec: AuthorityTableSpec) -> Self {
        let mut exact = HashMap::new();
        let mut patterns = Vec::new();

        for entry in &spec.entries {
            if entry.is_wildcard() {
                patterns.push(CompiledPattern {
                    regex: compile_pattern(&entry.pattern),
                    score: entry.score,
                });
            } else {
                // First declaration wins, mirroring pattern precedence.
                exact
                    .entry(entry.pattern.trim().to_ascii_lowercase())
                    .or_insert(entry.score);
            }
        }

        Self {
            entries: spec.entries,
            exact,
            patterns,
            default: spec.default,
        }
    }

    /// Load a JSON table (`{"default": 3, "entries": [{"pattern": "...", "score": 10}]}`).
    pub fn load_from_file(path: &Path) -> Result<Self, AuthorityTableError> {
        let shown = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|source| AuthorityTableError::Io {
            path: shown.clone(),
            source,
        })?;
        let spec: AuthorityTableSpec =
            serde_json::from_str(&raw).map_err(|source| AuthorityTableError::Parse {
                path: shown.clone(),
                source,
            })?;

        info!(
            path = %shown,
            entries = spec.entries.len(),
            "Loaded domain authority table"
        );
        Ok(Self::from_spec(spec))
    }

    pub fn default_score(&self) -> f64 {
        self.default
    }

    pub fn spec(&self) -> AuthorityTableSpec {
        AuthorityTableSpec {
            default: self.default,
            entries: self.entries.clone(),
        }
    }

    /// Authority of a source URL; missing or blank URLs get the default score.
    pub fn authority_score(&self, source_url: Option<&str>) -> f64 {
        match source_url.map(str::trim).filter(|url| !url.is_empty()) {
            Some(url) => self.score_for_domain(&normalize_domain(url)),
            None => self.default,
        }
    }

    /// Authority of an already-normalized domain.
    pub fn score_for_domain(&self, domain: &str) -> f64 {
        if let Some(score) = self.exact.get(domain) {
            return *score;
        }

        self.patterns
            .iter()
            .find(|p| p.regex.as_ref().is_some_and(|re| re.is_match(domain)))
            .map(|p| p.score)
            .unwrap_or(self.default)
    }
}

/// `*` becomes `.*`, `.` becomes a literal dot, anchored at both ends.
fn compile_pattern(pattern: &str) -> Option<Regex> {
    let body = pattern.trim().to_ascii_lowercase().replace('.', r"\.").replace('*', ".*");
    match Regex::new(&format!("^{}$", body)) {
        Ok(re) => Some(re),
        Err(e) => {
            warn!(pattern = %pattern, error = %e, "Ignoring malformed authority pattern");
            None
        }
    }
}

/// Host of a URL, lower-cased, with the leading `www.` removed.
///
/// Scheme-less input is read as a bare host so that normalizing an already
/// normalized domain is a no-op. Anything without a host is `"unknown"`.
pub fn normalize_domain(url: &str) -> String {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return UNKNOWN_DOMAIN.to_string();
    }

    let parsed = match Url::parse(trimmed) {
        Ok(parsed) => Ok(parsed),
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(&format!("http://{}", trimmed)),
        Err(e) => Err(e),
    };

    let host = parsed
        .ok()
        .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
        .filter(|h| !h.is_empty());

    let Some(host) = host else {
        return UNKNOWN_DOMAIN.to_string();
    };

    // Repeated prefixes are stripped too, otherwise `www.www.x` would need two passes.
    let mut domain = host.as_str();
    while let Some(rest) = domain.strip_prefix("www.") {
        if rest.is_empty() {
            break;
        }
        domain = rest;
    }
    domain.to_string()
}

/// Normalized domain of an optional source URL.
pub fn source_domain(source_url: Option<&str>) -> String {
    source_url
        .map(normalize_domain)
        .unwrap_or_else(|| UNKNOWN_DOMAIN.to_string())
}

fn default_spec() -> AuthorityTableSpec {
    let entries = [
        // Official Laravel sources
        ("laravel.com", 10.0),
        ("blog.laravel.com", 10.0),
        // High authority community sites
        ("laracasts.com", 9.0),
        ("laravel-news.com", 9.0),
        ("codecourse.com", 9.0),
        ("laraveldaily.com", 9.0),
        // Well-known developers
        ("freek.dev", 8.0),
        ("mattstauffer.com", 8.0),
        ("stitcher.io", 8.0),
        ("christoph-rumpel.com", 8.0),
        ("dyrynda.com.au", 8.0),
        // Community blogs
        ("tighten.co", 7.0),
        ("spatie.be", 7.0),
        ("beyondco.de", 7.0),
        ("nunomaduro.com", 7.0),
        // General publishing platforms
        ("dev.to", 6.0),
        ("medium.com", 6.0),
        ("hackernoon.com", 6.0),
        // Wildcards
        ("blog.*", 5.0),
        ("*.dev", 5.0),
    ];

    AuthorityTableSpec {
        default: DEFAULT_AUTHORITY_SCORE,
        entries: entries
            .into_iter()
            .map(|(pattern, score)| AuthorityEntry::new(pattern, score))
            .collect(),
    }
}
