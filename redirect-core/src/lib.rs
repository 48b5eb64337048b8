//! Redirect Core Library
//!
//! Decision logic for the YouTube navigation redirector: the watch-page
//! rewriter, the player-endpoint redirector, and the small host interface
//! that browser and replay adapters implement.

/// Configuration types and utilities
pub mod config;
pub mod decision;
/// Error types for interceptor operations
pub mod error;
pub mod host;
pub mod logging;
pub mod pattern;
pub mod payload;
/// Player endpoint redirector
pub mod player;
pub mod request;
/// Per-request idempotency store
pub mod seen;
/// Watch-page rewriter
pub mod watch;

pub use config::{PlayerConfig, RedirectConfig, SeenConfig, WatchConfig};
pub use decision::{BlockingResponse, Decision, SuppressReason};
pub use error::RedirectError;
pub use host::{Interceptors, ListenerKind, ListenerSpec, NavigationHost, RequestInterceptor};
pub use logging::{init_logging, LoggingConfig};
pub use pattern::UrlPattern;
pub use payload::PlayerPayload;
pub use player::PlayerRedirector;
pub use request::{InterceptedRequest, RequestDetails, ResourceType};
pub use seen::{Clock, ManualClock, SeenRequests, SystemClock};
pub use watch::WatchRewriter;

/// Result type alias for interceptor operations
pub type Result<T> = std::result::Result<T, RedirectError>;
