// # ddnsd - DDNS Daemon
//
// ⚠️ ARCHITECTURAL CONSTRAINTS ⚠️
//
// - This is a THIN integration layer ONLY
// - DO NOT add reconciliation, DNS or retry logic here
// - All DDNS logic MUST be in ddns-core
// - Configuration is via environment variables ONLY
//
// The ddnsd daemon is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing logging and the runtime
// 3. Building the DNSPod provider and the HTTP IP source
// 4. Running the DDNS engine until SIGTERM/SIGINT (or once)
//
// ## Configuration
//
// ### DNSPod
// - `DDNS_DNSPOD_ID`: API token id (required)
// - `DDNS_DNSPOD_SECRET`: API token secret (required)
// - `DDNS_TTL`: record TTL in seconds (default 600)
//
// ### Address families
// - `DDNS_IPV4_ENABLED` / `DDNS_IPV6_ENABLED`: default true / false
// - `DDNS_IPV4_URL` / `DDNS_IPV6_URL`: echo service returning the public address
// - `DDNS_IPV4_DOMAINS` / `DDNS_IPV6_DOMAINS`: comma-separated domains,
//   `sub.example.com` or `sub:example.com`
//
// ### Engine
// - `DDNS_INTERVAL_SECS`: seconds between passes (default 300)
// - `DDNS_RUN_ONCE`: run a single pass and exit
// - `DDNS_LOG_LEVEL`: trace, debug, info, warn, error (default info)
//
// ## Example
//
// ```bash
// export DDNS_DNSPOD_ID=12345
// export DDNS_DNSPOD_SECRET=your_secret
// export DDNS_IPV4_DOMAINS=example.com,www.example.com
//
// ddnsd
// ```

use anyhow::{Context, Result};
use ddns_core::config::{DdnsConfig, ProviderConfig, ProviderCredential, Ttl};
use ddns_core::{DdnsEngine, EngineEvent};
use ddns_ip_http::HttpIpSource;
use std::env;
use std::process::ExitCode;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
/// - 3: Single pass finished with failed updates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DdnsExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
    /// `DDNS_RUN_ONCE` pass left at least one domain failed
    UpdateFailed = 3,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
#[derive(Debug)]
struct Config {
    ddns: DdnsConfig,
    run_once: bool,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let id = var("DDNS_DNSPOD_ID").context(
            "DDNS_DNSPOD_ID is required. Set it via: export DDNS_DNSPOD_ID=your_token_id",
        )?;
        let secret = var("DDNS_DNSPOD_SECRET").context(
            "DDNS_DNSPOD_SECRET is required. Set it via: export DDNS_DNSPOD_SECRET=your_secret",
        )?;

        let mut ddns = DdnsConfig::new(ProviderConfig::Dnspod {
            credential: ProviderCredential::new(id.trim(), secret.trim()),
        });

        ddns.ttl = var("DDNS_TTL")
            .unwrap_or_default()
            .parse::<Ttl>()
            .context("DDNS_TTL is invalid")?;

        if let Some(enabled) = var("DDNS_IPV4_ENABLED") {
            ddns.ipv4.enabled = parse_bool("DDNS_IPV4_ENABLED", &enabled)?;
        }
        if let Some(url) = var("DDNS_IPV4_URL") {
            ddns.ipv4.url = url.trim().to_string();
        }
        ddns.ipv4.domains = split_list(var("DDNS_IPV4_DOMAINS").as_deref());

        if let Some(enabled) = var("DDNS_IPV6_ENABLED") {
            ddns.ipv6.enabled = parse_bool("DDNS_IPV6_ENABLED", &enabled)?;
        }
        if let Some(url) = var("DDNS_IPV6_URL") {
            ddns.ipv6.url = url.trim().to_string();
        }
        ddns.ipv6.domains = split_list(var("DDNS_IPV6_DOMAINS").as_deref());

        if let Some(interval) = var("DDNS_INTERVAL_SECS") {
            ddns.engine.interval_secs = interval
                .trim()
                .parse()
                .with_context(|| format!("DDNS_INTERVAL_SECS must be a number. Got: {}", interval))?;
        }

        let run_once = match var("DDNS_RUN_ONCE") {
            Some(value) => parse_bool("DDNS_RUN_ONCE", &value)?,
            None => false,
        };

        Ok(Self {
            ddns,
            run_once,
            log_level: var("DDNS_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        self.ddns.validate()?;

        for family in [&self.ddns.ipv4, &self.ddns.ipv6] {
            if family.enabled && family.url.starts_with("http://") {
                eprintln!(
                    "WARNING: {} uses HTTP (not HTTPS). \
                     Consider using HTTPS.",
                    family.url
                );
            }
        }

        self.level()?;
        Ok(())
    }

    fn level(&self) -> Result<Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(Level::TRACE),
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            "warn" => Ok(Level::WARN),
            "error" => Ok(Level::ERROR),
            _ => anyhow::bail!(
                "DDNS_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => anyhow::bail!("{} must be true or false. Got: {}", key, value),
    }
}

fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return DdnsExitCode::ConfigError.into();
    }

    // Initialize tracing
    let log_level = config.level().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    info!("Starting ddnsd daemon");
    info!(
        "Configuration loaded: {} IPv4 domain(s), {} IPv6 domain(s), TTL {}",
        config.ddns.ipv4.active_domains().len(),
        config.ddns.ipv6.active_domains().len(),
        config.ddns.ttl
    );

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdnsExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        match run_daemon(config).await {
            Ok(code) => code,
            Err(e) => {
                error!("Daemon error: {:#}", e);
                DdnsExitCode::RuntimeError
            }
        }
    });

    result.into()
}

/// Run the daemon
async fn run_daemon(config: Config) -> Result<DdnsExitCode> {
    let ip_source = HttpIpSource::from_config(&config.ddns)?;
    let provider = ddns_provider_dnspod::from_config(&config.ddns.provider)?;

    let (engine, event_rx) =
        DdnsEngine::new(Box::new(ip_source), Box::new(provider), &config.ddns)?;

    if config.run_once {
        return Ok(run_single_pass(engine, event_rx).await);
    }

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    tokio::spawn(async move {
        match wait_for_shutdown().await {
            Ok(signal) => info!("Received shutdown signal: {}", signal),
            Err(e) => error!("Shutdown error: {}", e),
        }
        let _ = shutdown_tx.send(());
    });

    run_until_shutdown(engine, event_rx, shutdown_rx).await?;
    info!("Shutting down daemon");

    Ok(DdnsExitCode::CleanShutdown)
}

/// One pass, then exit with the pass outcome
///
/// The engine is dropped before returning so the event logger sees the
/// channel close and flushes the pass summary.
async fn run_single_pass(
    mut engine: DdnsEngine,
    event_rx: mpsc::Receiver<EngineEvent>,
) -> DdnsExitCode {
    let events = tokio::spawn(log_events(event_rx));

    let any_failed = engine.reconcile_all().await.any_failed();
    drop(engine);
    await_event_logger(events).await;

    if any_failed {
        DdnsExitCode::UpdateFailed
    } else {
        DdnsExitCode::CleanShutdown
    }
}

/// Passes on the engine interval until `shutdown_rx` fires
async fn run_until_shutdown(
    mut engine: DdnsEngine,
    event_rx: mpsc::Receiver<EngineEvent>,
    shutdown_rx: oneshot::Receiver<()>,
) -> Result<()> {
    let events = tokio::spawn(log_events(event_rx));

    let result = engine.run_with_shutdown(shutdown_rx).await;
    drop(engine);
    await_event_logger(events).await;

    Ok(result?)
}

async fn await_event_logger(events: JoinHandle<usize>) {
    match events.await {
        Ok(count) => debug!("Event logger drained {} event(s)", count),
        Err(e) => warn!("Event logger stopped abnormally: {}", e),
    }
}

/// Drain engine events into the log until the engine is dropped
///
/// Returns the number of events seen.
async fn log_events(mut event_rx: mpsc::Receiver<EngineEvent>) -> usize {
    let mut count = 0;
    while let Some(event) = event_rx.recv().await {
        count += 1;
        match event {
            EngineEvent::PassCompleted { succeeded, failed } if failed > 0 => {
                warn!("Pass completed: {} succeeded, {} failed", succeeded, failed);
            }
            EngineEvent::PassCompleted { succeeded, .. } => {
                info!("Pass completed: {} succeeded", succeeded);
            }
            other => debug!("Engine event: {:?}", other),
        }
    }
    count
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
