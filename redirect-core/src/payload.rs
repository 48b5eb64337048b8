//! Player endpoint request payload

use crate::error::RedirectError;
use crate::Result;
use serde::Deserialize;
use url::Url;

/// The subset of the player request body the redirector inspects.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerPayload {
    pub video_id: String,
    #[serde(default)]
    pub playback_context: PlaybackContext,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackContext {
    #[serde(default)]
    pub content_playback_context: ContentPlaybackContext,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContentPlaybackContext {
    #[serde(default)]
    pub autoplay: bool,
    /// Set for hover-preview playback
    #[serde(default)]
    pub autonav: bool,
    #[serde(default)]
    pub referer: Option<String>,
}

impl PlayerPayload {
    /// Decode a raw request body: UTF-8 text holding a JSON object.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(bytes)?;
        let payload: PlayerPayload = serde_json::from_str(text)?;
        if payload.video_id.trim().is_empty() {
            return Err(RedirectError::InvalidPayload("empty videoId".to_string()));
        }
        Ok(payload)
    }

    pub fn is_autoplay(&self) -> bool {
        self.playback_context.content_playback_context.autoplay
    }

    pub fn is_autonav(&self) -> bool {
        self.playback_context.content_playback_context.autonav
    }

    pub fn referer(&self) -> Option<&str> {
        self.playback_context.content_playback_context.referer.as_deref()
    }

    /// Path of the referer URL, if the referer is an absolute URL.
    pub fn referer_path(&self) -> Option<String> {
        let referer = self.referer()?;
        Url::parse(referer).ok().map(|u| u.path().to_string())
    }
}
