//! Player endpoint redirector
//!
//! Turns an in-page video transition into a full navigation to the watch page.

use crate::config::{PlayerConfig, WatchConfig};
use crate::decision::{Decision, SuppressReason};
use crate::error::RedirectError;
use crate::payload::PlayerPayload;
use crate::pattern::{any_matches, UrlPattern};
use crate::request::InterceptedRequest;
use crate::Result;
use url::Url;

#[derive(Debug, Clone)]
pub struct PlayerRedirector {
    config: PlayerConfig,
    patterns: Vec<UrlPattern>,
    /// Marker appended to synthesized watch URLs, when enabled
    marker: Option<(String, String)>,
}

impl PlayerRedirector {
    pub fn new(config: PlayerConfig, watch: &WatchConfig) -> Result<Self> {
        let patterns = UrlPattern::parse_all(&config.patterns)?;
        let marker = config
            .carry_marker
            .then(|| (watch.marker_param.clone(), watch.marker_value.clone()));
        Ok(Self {
            config,
            patterns,
            marker,
        })
    }

    pub fn patterns(&self) -> &[UrlPattern] {
        &self.patterns
    }

    pub fn accepts(&self, url: &Url) -> bool {
        any_matches(&self.patterns, url)
    }

    pub fn redirect(&self, req: &InterceptedRequest) -> Result<Decision> {
        if !req.is_method("POST") {
            return Ok(Decision::Allow);
        }

        let body = req.body.as_deref().ok_or(RedirectError::MissingBody)?;
        let payload = PlayerPayload::from_bytes(body)?;

        if let Some(reason) = self.suppression_reason(&payload) {
            return Ok(Decision::Suppressed(reason));
        }

        let url = self.watch_url(&req.url, &payload.video_id)?;
        Ok(Decision::CancelAndNavigate {
            tab_id: req.tab_id,
            url,
        })
    }

    /// Returns why the default in-page transition should be kept, if it should.
    pub fn suppression_reason(&self, payload: &PlayerPayload) -> Option<SuppressReason> {
        if self.config.suppress_autoplay && payload.is_autoplay() {
            return Some(SuppressReason::Autoplay);
        }
        if self.config.suppress_autonav && payload.is_autonav() {
            return Some(SuppressReason::Autonav);
        }

        let path = payload.referer_path()?;
        self.config
            .suppressed_referer_prefixes
            .iter()
            .find(|prefix| path.starts_with(prefix.as_str()))
            .map(|prefix| SuppressReason::Referer(prefix.clone()))
    }

    /// `<origin of request_url>/watch?v=<video_id>`, plus the marker when enabled.
    pub fn watch_url(&self, request_url: &str, video_id: &str) -> Result<Url> {
        let mut url =
            Url::parse(request_url).map_err(|e| RedirectError::invalid_url(request_url, e))?;
        url.set_path("/watch");
        url.set_query(None);
        url.set_fragment(None);
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("v", video_id);
            if let Some((param, value)) = &self.marker {
                query.append_pair(param, value);
            }
        }
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::ResourceType;

    const PLAYER_URL: &str = "https://www.youtube.com/youtubei/v1/player?key=k&prettyPrint=false";

    fn redirector() -> PlayerRedirector {
        PlayerRedirector::new(PlayerConfig::default(), &WatchConfig::default()).unwrap()
    }

    fn player_request(body: &str) -> InterceptedRequest {
        InterceptedRequest::new("9", PLAYER_URL)
            .with_method("POST")
            .with_resource_type(ResourceType::XmlHttpRequest)
            .with_tab_id(4)
            .with_body(body.as_bytes().to_vec())
    }

    fn body(autoplay: bool, autonav: bool, referer: &str) -> String {
        format!(
            r#"{{"videoId":"abc123","playbackContext":{{"contentPlaybackContext":{{"autoplay":{},"autonav":{},"referer":"{}"}}}}}}"#,
            autoplay, autonav, referer
        )
    }

    #[test]
    fn test_redirects_search_click() {
        let req = player_request(&body(false, false, "https://www.youtube.com/results?search_query=x"));
        match redirector().redirect(&req).unwrap() {
            Decision::CancelAndNavigate { tab_id, url } => {
                assert_eq!(tab_id, 4);
                assert_eq!(url.as_str(), "https://www.youtube.com/watch?v=abc123&themeRefresh=1");
            }
            other => panic!("expected navigation, got {:?}", other),
        }
    }

    #[test]
    fn test_without_marker() {
        let config = PlayerConfig {
            carry_marker: false,
            ..PlayerConfig::default()
        };
        let redirector = PlayerRedirector::new(config, &WatchConfig::default()).unwrap();
        let url = redirector.watch_url(PLAYER_URL, "abc123").unwrap();
        assert_eq!(url.as_str(), "https://www.youtube.com/watch?v=abc123");
    }

    #[test]
    fn test_suppressed_contexts() {
        let redirector = redirector();
        let home = "https://www.youtube.com/";

        let cases = [
            (body(true, false, home), SuppressReason::Autoplay),
            (body(false, true, home), SuppressReason::Autonav),
            (
                body(false, false, "https://www.youtube.com/watch?v=other"),
                SuppressReason::Referer("/watch".into()),
            ),
            (
                body(false, false, "https://www.youtube.com/embed/xyz"),
                SuppressReason::Referer("/embed".into()),
            ),
            (
                body(false, false, "https://www.youtube.com/@channelname"),
                SuppressReason::Referer("/@".into()),
            ),
        ];

        for (payload, reason) in cases {
            assert_eq!(
                redirector.redirect(&player_request(&payload)).unwrap(),
                Decision::Suppressed(reason)
            );
        }
    }

    #[test]
    fn test_home_feed_click_redirects() {
        let req = player_request(&body(false, false, "https://www.youtube.com/"));
        assert!(matches!(
            redirector().redirect(&req).unwrap(),
            Decision::CancelAndNavigate { .. }
        ));
    }

    #[test]
    fn test_autoplay_not_suppressed_when_disabled() {
        let config = PlayerConfig {
            suppress_autoplay: false,
            ..PlayerConfig::default()
        };
        let redirector = PlayerRedirector::new(config, &WatchConfig::default()).unwrap();
        let req = player_request(&body(true, false, "https://www.youtube.com/feed/subscriptions"));
        assert!(matches!(
            redirector.redirect(&req).unwrap(),
            Decision::CancelAndNavigate { .. }
        ));
    }

    #[test]
    fn test_get_requests_ignored() {
        let req = player_request("{}").with_method("GET");
        assert_eq!(redirector().redirect(&req).unwrap(), Decision::Allow);
    }

    #[test]
    fn test_malformed_bodies_are_errors() {
        let redirector = redirector();

        let mut req = player_request("");
        req.body = None;
        assert!(matches!(redirector.redirect(&req), Err(RedirectError::MissingBody)));

        let req = player_request("{ truncated");
        assert!(redirector.redirect(&req).unwrap_err().is_payload_error());
    }
}
