//! Host integration
//!
//! A host (the browser, or the replay agent) owns the network hook. It
//! registers the listeners described by [`Interceptors::listeners`], hands each
//! event to the matching [`RequestInterceptor`] method and applies the returned
//! [`BlockingResponse`].

use crate::config::RedirectConfig;
use crate::decision::{BlockingResponse, Decision};
use crate::error::RedirectError;
use crate::player::PlayerRedirector;
use crate::request::InterceptedRequest;
use crate::seen::{Clock, SeenRequests, SystemClock};
use crate::watch::WatchRewriter;
use crate::Result;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use url::Url;

/// Commands the interceptors can issue back to their host.
pub trait NavigationHost: Send + Sync {
    /// Point the given tab at `url`.
    fn navigate_tab(&self, tab_id: i32, url: &str) -> Result<()>;

    /// True when the extension runs as a development install. Only gates
    /// diagnostic logging.
    fn is_development_install(&self) -> bool {
        false
    }
}

/// One callback per subscribed host event.
pub trait RequestInterceptor {
    fn on_watch_request(&self, req: &InterceptedRequest) -> BlockingResponse;
    fn on_player_request(&self, req: &InterceptedRequest) -> BlockingResponse;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ListenerKind {
    Watch,
    Player,
}

/// What a host needs to register one `onBeforeRequest` listener.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListenerSpec {
    pub kind: ListenerKind,
    pub urls: Vec<String>,
    pub extra_info_spec: Vec<&'static str>,
}

/// The watch rewriter and player redirector wired to a host.
pub struct Interceptors<H: NavigationHost> {
    watch: WatchRewriter,
    player: PlayerRedirector,
    host: H,
    diagnostics: bool,
}

impl<H: NavigationHost> Interceptors<H> {
    pub fn new(config: &RedirectConfig, host: H) -> Result<Self> {
        Self::with_clock(config, host, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &RedirectConfig, host: H, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;
        let seen = SeenRequests::with_clock(config.seen.ttl_ms, config.seen.max_entries, clock);
        let watch = WatchRewriter::new(config.watch.clone(), seen)?;
        let player = PlayerRedirector::new(config.player.clone(), &config.watch)?;
        let diagnostics = host.is_development_install();
        if diagnostics {
            info!(
                "Interceptors ready (watch: {:?}, player: {:?})",
                config.watch.patterns, config.player.patterns
            );
        }
        Ok(Self {
            watch,
            player,
            host,
            diagnostics,
        })
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn watch_rewriter(&self) -> &WatchRewriter {
        &self.watch
    }

    pub fn player_redirector(&self) -> &PlayerRedirector {
        &self.player
    }

    pub fn diagnostics_enabled(&self) -> bool {
        self.diagnostics
    }

    /// Override the install-type gate, e.g. once an async host lookup resolves.
    pub fn set_diagnostics(&mut self, enabled: bool) {
        self.diagnostics = enabled;
    }

    pub fn listeners(&self) -> Vec<ListenerSpec> {
        vec![
            ListenerSpec {
                kind: ListenerKind::Watch,
                urls: self.watch.patterns().iter().map(|p| p.to_string()).collect(),
                extra_info_spec: vec!["blocking"],
            },
            ListenerSpec {
                kind: ListenerKind::Player,
                urls: self.player.patterns().iter().map(|p| p.to_string()).collect(),
                extra_info_spec: vec!["blocking", "requestBody"],
            },
        ]
    }

    /// Which listener a request would reach, for hosts with a single hook.
    pub fn route(&self, req: &InterceptedRequest) -> Option<ListenerKind> {
        let url = Url::parse(&req.url).ok()?;
        if self.watch.accepts(&url) {
            Some(ListenerKind::Watch)
        } else if self.player.accepts(&url) {
            Some(ListenerKind::Player)
        } else {
            None
        }
    }

    /// Route a request to the interceptor whose patterns match its URL.
    pub fn dispatch(&self, req: &InterceptedRequest) -> (Option<ListenerKind>, BlockingResponse) {
        let kind = self.route(req);
        let response = match kind {
            Some(ListenerKind::Watch) => self.on_watch_request(req),
            Some(ListenerKind::Player) => self.on_player_request(req),
            None => BlockingResponse::allow(),
        };
        (kind, response)
    }

    fn apply(&self, req: &InterceptedRequest, decision: Result<Decision>) -> BlockingResponse {
        let decision = match decision {
            Ok(decision) => decision,
            Err(e) => {
                if self.diagnostics {
                    warn!("Request [{}] passed through: {}", req.request_id, e);
                }
                return BlockingResponse::allow();
            }
        };

        match decision {
            Decision::Allow => BlockingResponse::allow(),
            Decision::Suppressed(reason) => {
                if self.diagnostics {
                    info!("Request [{}] left alone ({})", req.request_id, reason);
                }
                BlockingResponse::allow()
            }
            Decision::Redirect { url } => {
                if self.diagnostics {
                    info!("Request [{}] redirected to {}", req.request_id, url);
                }
                BlockingResponse::redirect(&url)
            }
            Decision::CancelAndNavigate { tab_id, url } => {
                if let Err(e) = self.navigate(tab_id, &url) {
                    if self.diagnostics {
                        warn!(
                            "Request [{}] passed through, tab {} not navigated: {}",
                            req.request_id, tab_id, e
                        );
                    }
                    return BlockingResponse::allow();
                }
                if self.diagnostics {
                    info!(
                        "Request [{}] cancelled, tab {} sent to {}",
                        req.request_id, tab_id, url
                    );
                }
                BlockingResponse::cancel()
            }
        }
    }

    fn navigate(&self, tab_id: i32, url: &Url) -> Result<()> {
        if tab_id < 0 {
            return Err(RedirectError::Navigation(
                "request is not tied to a tab".to_string(),
            ));
        }
        self.host.navigate_tab(tab_id, url.as_str())
    }
}

impl<H: NavigationHost> RequestInterceptor for Interceptors<H> {
    fn on_watch_request(&self, req: &InterceptedRequest) -> BlockingResponse {
        self.apply(req, self.watch.rewrite(req))
    }

    fn on_player_request(&self, req: &InterceptedRequest) -> BlockingResponse {
        self.apply(req, self.player.redirect(req))
    }
}

impl<H: NavigationHost> std::fmt::Debug for Interceptors<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interceptors")
            .field("watch", &self.watch)
            .field("player", &self.player)
            .field("diagnostics", &self.diagnostics)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::ResourceType;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingHost {
        navigations: Mutex<Vec<(i32, String)>>,
        fail: bool,
    }

    impl NavigationHost for RecordingHost {
        fn navigate_tab(&self, tab_id: i32, url: &str) -> Result<()> {
            if self.fail {
                return Err(RedirectError::Navigation("no such tab".to_string()));
            }
            self.navigations.lock().unwrap().push((tab_id, url.to_string()));
            Ok(())
        }
    }

    fn player_request(tab_id: i32, body: &str) -> InterceptedRequest {
        InterceptedRequest::new("p1", "https://www.youtube.com/youtubei/v1/player?key=k")
            .with_method("POST")
            .with_resource_type(ResourceType::XmlHttpRequest)
            .with_tab_id(tab_id)
            .with_body(body.as_bytes().to_vec())
    }

    #[test]
    fn test_listeners() {
        let interceptors =
            Interceptors::new(&RedirectConfig::default(), RecordingHost::default()).unwrap();
        let listeners = interceptors.listeners();
        assert_eq!(listeners[0].kind, ListenerKind::Watch);
        assert_eq!(listeners[0].urls, vec!["*://*.youtube.com/watch?*"]);
        assert_eq!(listeners[1].extra_info_spec, vec!["blocking", "requestBody"]);
    }

    #[test]
    fn test_player_navigates_and_cancels() {
        let interceptors =
            Interceptors::new(&RedirectConfig::default(), RecordingHost::default()).unwrap();
        let response = interceptors.on_player_request(&player_request(5, r#"{"videoId":"v1"}"#));

        assert_eq!(response, BlockingResponse::cancel());
        let navigations = interceptors.host().navigations.lock().unwrap();
        assert_eq!(
            *navigations,
            vec![(5, "https://www.youtube.com/watch?v=v1&themeRefresh=1".to_string())]
        );
    }

    #[test]
    fn test_failed_navigation_passes_through() {
        let host = RecordingHost {
            fail: true,
            ..RecordingHost::default()
        };
        let interceptors = Interceptors::new(&RedirectConfig::default(), host).unwrap();
        let response = interceptors.on_player_request(&player_request(5, r#"{"videoId":"v1"}"#));
        assert!(response.is_noop());

        let interceptors =
            Interceptors::new(&RedirectConfig::default(), RecordingHost::default()).unwrap();
        let response = interceptors.on_player_request(&player_request(-1, r#"{"videoId":"v1"}"#));
        assert!(response.is_noop());
        assert!(interceptors.host().navigations.lock().unwrap().is_empty());
    }

    #[test]
    fn test_malformed_payload_passes_through() {
        let interceptors =
            Interceptors::new(&RedirectConfig::default(), RecordingHost::default()).unwrap();
        assert!(interceptors.on_player_request(&player_request(5, "<html>")).is_noop());
        assert!(interceptors.host().navigations.lock().unwrap().is_empty());
    }

    #[test]
    fn test_dispatch_routes_by_pattern() {
        let interceptors =
            Interceptors::new(&RedirectConfig::default(), RecordingHost::default()).unwrap();

        let watch = InterceptedRequest::new("w1", "https://www.youtube.com/watch?v=1")
            .with_resource_type(ResourceType::MainFrame);
        let (kind, response) = interceptors.dispatch(&watch);
        assert_eq!(kind, Some(ListenerKind::Watch));
        assert_eq!(
            response.redirect_url.as_deref(),
            Some("https://www.youtube.com/watch?v=1&themeRefresh=1")
        );

        let other = InterceptedRequest::new("o1", "https://www.youtube.com/results?search_query=x");
        assert_eq!(interceptors.dispatch(&other), (None, BlockingResponse::allow()));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = RedirectConfig::default();
        config.seen.max_entries = 0;
        assert!(Interceptors::new(&config, RecordingHost::default()).is_err());
    }
}
