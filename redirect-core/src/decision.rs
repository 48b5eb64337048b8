use serde::Serialize;
use std::fmt;
use url::Url;

/// Why a player request was left alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuppressReason {
    Autoplay,
    /// Hover-preview playback
    Autonav,
    /// The referer path starts with this prefix
    Referer(String),
}

impl fmt::Display for SuppressReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SuppressReason::Autoplay => write!(f, "autoplay"),
            SuppressReason::Autonav => write!(f, "autonav"),
            SuppressReason::Referer(prefix) => write!(f, "referer prefix {}", prefix),
        }
    }
}

/// Outcome of running an interceptor over a request.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Let the request through unmodified
    Allow,
    /// Player request left alone on purpose
    Suppressed(SuppressReason),
    /// Redirect the request to another URL
    Redirect { url: Url },
    /// Cancel the request and send its tab to `url`
    CancelAndNavigate { tab_id: i32, url: Url },
}

impl Decision {
    pub fn is_pass_through(&self) -> bool {
        matches!(self, Decision::Allow | Decision::Suppressed(_))
    }
}

/// Value returned to the host from a blocking listener.
///
/// Serializes to `{}`, `{"redirectUrl": ...}` or `{"cancel": true}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockingResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub cancel: bool,
}

impl BlockingResponse {
    pub fn allow() -> Self {
        Self::default()
    }

    pub fn redirect(url: &Url) -> Self {
        Self {
            redirect_url: Some(url.as_str().to_string()),
            cancel: false,
        }
    }

    pub fn cancel() -> Self {
        Self {
            redirect_url: None,
            cancel: true,
        }
    }

    /// True when the host should proceed with the request as-is.
    pub fn is_noop(&self) -> bool {
        self.redirect_url.is_none() && !self.cancel
    }
}
