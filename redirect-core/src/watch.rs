//! Watch-page rewriter
//!
//! Appends the theme refresh marker to top-level watch page loads, once per
//! request lifecycle.

use crate::config::WatchConfig;
use crate::decision::Decision;
use crate::error::RedirectError;
use crate::pattern::{any_matches, UrlPattern};
use crate::request::InterceptedRequest;
use crate::seen::SeenRequests;
use crate::Result;
use url::Url;

#[derive(Debug, Clone)]
pub struct WatchRewriter {
    config: WatchConfig,
    patterns: Vec<UrlPattern>,
    seen: SeenRequests,
}

impl WatchRewriter {
    pub fn new(config: WatchConfig, seen: SeenRequests) -> Result<Self> {
        let patterns = UrlPattern::parse_all(&config.patterns)?;
        Ok(Self {
            config,
            patterns,
            seen,
        })
    }

    pub fn patterns(&self) -> &[UrlPattern] {
        &self.patterns
    }

    pub fn seen(&self) -> &SeenRequests {
        &self.seen
    }

    /// True when this rewriter listens on the request's URL.
    pub fn accepts(&self, url: &Url) -> bool {
        any_matches(&self.patterns, url)
    }

    pub fn rewrite(&self, req: &InterceptedRequest) -> Result<Decision> {
        if !req.is_main_frame() {
            return Ok(Decision::Allow);
        }
        if self.config.get_only && !req.is_method("GET") {
            return Ok(Decision::Allow);
        }

        // Redirects keep their request id; skip the request we already rewrote
        if !self.seen.mark_if_new(&req.request_id) {
            return Ok(Decision::Allow);
        }

        let url = Url::parse(&req.url).map_err(|e| RedirectError::invalid_url(&req.url, e))?;
        match append_marker(&url, &self.config.marker_param, &self.config.marker_value) {
            Some(url) => Ok(Decision::Redirect { url }),
            None => Ok(Decision::Allow),
        }
    }
}

/// Returns `url` with `param=value` appended to its query, or `None` when the
/// query already carries `param`. Existing query text is kept verbatim.
pub fn append_marker(url: &Url, param: &str, value: &str) -> Option<Url> {
    if has_param(url, param) {
        return None;
    }
    let mut rewritten = url.clone();
    rewritten.query_pairs_mut().append_pair(param, value);
    Some(rewritten)
}

pub fn has_param(url: &Url, param: &str) -> bool {
    url.query_pairs().any(|(key, _)| key == param)
}
