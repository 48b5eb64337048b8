//! Redirect Agent
//!
//! Replays recorded `webRequest.onBeforeRequest` details through the
//! interceptors outside the browser and reports what the extension would do
//! with each request.

use clap::Parser;
use redirect_core::{
    BlockingResponse, InterceptedRequest, Interceptors, ListenerKind, LoggingConfig,
    NavigationHost, RedirectConfig, RedirectError, RequestDetails,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Mutex;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Recorded request details, one JSON object per line ("-" reads stdin)
    #[arg(long, default_value = "-")]
    pub input: String,

    /// Path to a JSON interceptor config
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Behave like a development install (enables decision diagnostics)
    #[arg(long, default_value_t = false)]
    pub dev: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Override the watch marker parameter name
    #[arg(long)]
    pub marker_param: Option<String>,

    /// Override how long a request id stays marked, in milliseconds
    #[arg(long)]
    pub seen_ttl_ms: Option<u64>,
}

mod config_test;

/// Load interceptor configuration.
///
/// Precedence, lowest first: defaults, config file, `REDIRECT_*` environment
/// variables, command line flags.
pub fn load_config(args: &Args) -> Result<RedirectConfig, RedirectError> {
    let mut config = match &args.config {
        Some(path) => {
            tracing::info!("Loading interceptor config from {}", path.display());
            RedirectConfig::load_from_file(path)?
        }
        None => RedirectConfig::default(),
    };

    config.apply_env_overrides()?;

    if let Some(param) = &args.marker_param {
        config.watch.marker_param = param.clone();
    }
    if let Some(ttl) = args.seen_ttl_ms {
        config.seen.ttl_ms = ttl;
    }

    config.validate()?;
    Ok(config)
}

pub fn logging_config(args: &Args) -> LoggingConfig {
    LoggingConfig::default().with_level(args.log_level.clone())
}

/// One line of replay input: the host's event details, optionally with the
/// request body given as text instead of raw bytes.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayRecord {
    #[serde(flatten)]
    pub details: RequestDetails,
    #[serde(default)]
    pub body_text: Option<String>,
}

impl ReplayRecord {
    pub fn into_request(self) -> InterceptedRequest {
        let body_text = self.body_text;
        let mut req = InterceptedRequest::from(self.details);
        if req.body.is_none() {
            req.body = body_text.map(String::into_bytes);
        }
        req
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationRecord {
    pub tab_id: i32,
    pub url: String,
}

/// Host that records navigations instead of driving a browser.
#[derive(Debug, Default)]
pub struct ReplayHost {
    development: bool,
    navigations: Mutex<Vec<NavigationRecord>>,
}

impl ReplayHost {
    pub fn new(development: bool) -> Self {
        Self {
            development,
            navigations: Mutex::new(Vec::new()),
        }
    }

    pub fn take_navigations(&self) -> Vec<NavigationRecord> {
        match self.navigations.lock() {
            Ok(mut navigations) => std::mem::take(&mut *navigations),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl NavigationHost for ReplayHost {
    fn navigate_tab(&self, tab_id: i32, url: &str) -> Result<(), RedirectError> {
        let mut navigations = self
            .navigations
            .lock()
            .map_err(|_| RedirectError::Navigation("navigation log poisoned".to_string()))?;
        navigations.push(NavigationRecord {
            tab_id,
            url: url.to_string(),
        });
        Ok(())
    }

    fn is_development_install(&self) -> bool {
        self.development
    }
}

/// What the extension would have done with one recorded request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayOutcome {
    pub request_id: String,
    pub listener: Option<ListenerKind>,
    pub response: BlockingResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub navigation: Option<NavigationRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub processed: u64,
    pub skipped: u64,
    pub redirected: u64,
    pub cancelled: u64,
}

/// Run one input line through the interceptors.
///
/// Blank lines and `#` comments yield `Ok(None)`.
pub fn replay_line(
    interceptors: &Interceptors<ReplayHost>,
    line: &str,
) -> serde_json::Result<Option<ReplayOutcome>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let record: ReplayRecord = serde_json::from_str(line)?;
    let req = record.into_request();
    let (listener, response) = interceptors.dispatch(&req);
    let navigation = interceptors.host().take_navigations().into_iter().next();

    Ok(Some(ReplayOutcome {
        request_id: req.request_id,
        listener,
        response,
        navigation,
    }))
}

/// Replay every line of `reader`, writing one JSON outcome per line to `writer`.
pub async fn run_replay<R, W>(
    interceptors: &Interceptors<ReplayHost>,
    reader: R,
    writer: &mut W,
) -> std::io::Result<ReplaySummary>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut summary = ReplaySummary::default();
    let mut lines = reader.lines();
    let mut line_no = 0u64;

    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        let outcome = match replay_line(interceptors, &line) {
            Ok(Some(outcome)) => outcome,
            Ok(None) => continue,
            Err(e) => {
                tracing::warn!("Skipping line {}: {}", line_no, e);
                summary.skipped += 1;
                continue;
            }
        };

        summary.processed += 1;
        if outcome.response.redirect_url.is_some() {
            summary.redirected += 1;
        }
        if outcome.response.cancel {
            summary.cancelled += 1;
        }

        let mut encoded = serde_json::to_vec(&outcome)?;
        encoded.push(b'\n');
        writer.write_all(&encoded).await?;
    }

    writer.flush().await?;
    Ok(summary)
}

pub async fn run_agent(args: Args) -> Result<ReplaySummary, Box<dyn std::error::Error>> {
    let config = load_config(&args)?;
    let interceptors = Interceptors::new(&config, ReplayHost::new(args.dev))?;

    tracing::info!("Starting replay...");
    tracing::info!("  Input:  {}", args.input);
    tracing::info!("  Marker: {}", config.watch.marker_param);

    let mut stdout = tokio::io::stdout();
    let summary = if args.input == "-" {
        run_replay(&interceptors, BufReader::new(tokio::io::stdin()), &mut stdout).await?
    } else {
        let file = tokio::fs::File::open(&args.input).await?;
        run_replay(&interceptors, BufReader::new(file), &mut stdout).await?
    };

    tracing::info!(
        "Replay finished: {} processed, {} redirected, {} cancelled, {} skipped",
        summary.processed,
        summary.redirected,
        summary.cancelled,
        summary.skipped
    );
    Ok(summary)
}
