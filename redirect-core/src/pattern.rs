use crate::error::RedirectError;
use crate::Result;
use std::fmt;
use url::Url;
use wildmatch::WildMatch;

/// A WebExtension-style match pattern such as `*://*.youtube.com/watch?*`.
///
/// Matching rules:
/// 1. Scheme `*` accepts `http` and `https` only.
/// 2. Host `*.example.com` accepts `example.com` and any subdomain of it.
/// 3. `*` in the path matches any run of characters, including `/`.
/// 4. A `?` in the pattern is the literal query separator, not a wildcard.
#[derive(Debug, Clone)]
pub struct UrlPattern {
    source: String,
    scheme: SchemeMatch,
    host: HostMatch,
    path: WildMatch,
    query: Option<WildMatch>,
}

#[derive(Debug, Clone)]
enum SchemeMatch {
    HttpOrHttps,
    Exact(String),
}

#[derive(Debug, Clone)]
enum HostMatch {
    Any,
    Exact(String),
    Subdomains { base: String, glob: WildMatch },
}

impl UrlPattern {
    pub fn parse(pattern: &str) -> Result<Self> {
        let invalid = |reason: &str| {
            RedirectError::Configuration(format!("Invalid URL pattern '{}': {}", pattern, reason))
        };

        let (scheme, rest) = pattern
            .split_once("://")
            .ok_or_else(|| invalid("missing scheme separator"))?;
        let slash = rest.find('/').ok_or_else(|| invalid("missing path"))?;
        let (host, path) = rest.split_at(slash);

        let scheme = match scheme {
            "*" => SchemeMatch::HttpOrHttps,
            "" => return Err(invalid("empty scheme")),
            s if s.contains('*') => return Err(invalid("wildcard inside scheme")),
            s => SchemeMatch::Exact(s.to_ascii_lowercase()),
        };

        let host = match host {
            "" => return Err(invalid("empty host")),
            "*" => HostMatch::Any,
            h => match h.strip_prefix("*.") {
                Some(base) if !base.is_empty() && !base.contains('*') => {
                    let base = base.to_ascii_lowercase();
                    HostMatch::Subdomains {
                        glob: WildMatch::new(&format!("*.{}", base)),
                        base,
                    }
                }
                Some(_) => return Err(invalid("malformed wildcard host")),
                None if h.contains('*') => {
                    return Err(invalid("wildcard must lead the host"));
                }
                None => HostMatch::Exact(h.to_ascii_lowercase()),
            },
        };

        let (path, query) = match path.split_once('?') {
            Some((path, query)) => (WildMatch::new(path), Some(WildMatch::new(query))),
            None => (WildMatch::new(path), None),
        };

        Ok(Self {
            source: pattern.to_string(),
            scheme,
            host,
            path,
            query,
        })
    }

    /// Parse a list of patterns, failing on the first invalid one.
    pub fn parse_all<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<Self>> {
        patterns.iter().map(|p| Self::parse(p.as_ref())).collect()
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, url: &Url) -> bool {
        let scheme_ok = match &self.scheme {
            SchemeMatch::HttpOrHttps => matches!(url.scheme(), "http" | "https"),
            SchemeMatch::Exact(s) => url.scheme() == s,
        };
        if !scheme_ok {
            return false;
        }

        let host = url.host_str().unwrap_or("").to_ascii_lowercase();
        let host_ok = match &self.host {
            HostMatch::Any => !host.is_empty(),
            HostMatch::Exact(h) => host == *h,
            HostMatch::Subdomains { base, glob } => host == *base || glob.matches(&host),
        };
        if !host_ok {
            return false;
        }

        match (&self.query, url.query()) {
            (Some(query_glob), Some(query)) => {
                self.path.matches(url.path()) && query_glob.matches(query)
            }
            (Some(_), None) => false,
            // Without a separator in the pattern the path glob has to cover the query too
            (None, Some(query)) => self.path.matches(&format!("{}?{}", url.path(), query)),
            (None, None) => self.path.matches(url.path()),
        }
    }

    /// Like [`UrlPattern::matches`], but for a raw string. Unparsable URLs never match.
    pub fn matches_str(&self, url: &str) -> bool {
        Url::parse(url).map(|u| self.matches(&u)).unwrap_or(false)
    }
}

impl fmt::Display for UrlPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// True when any pattern in the set matches the URL.
pub fn any_matches(patterns: &[UrlPattern], url: &Url) -> bool {
    patterns.iter().any(|p| p.matches(url))
}
