use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use vigil_common::{Clock, SystemClock};

use crate::api::{self, ApiState};
use crate::config::{MonitorConfig, NotificationsConfig};
use crate::context::Context;
use crate::metrics::MonitorMetrics;
use crate::monitor::{Monitor, Settings};
use crate::notifier::{EmailNotifier, NotificationHub, RetryNotifier, SlackNotifier};
use crate::probe::{HttpEndpointProbe, Probes, RpcLedgerProbe, StoreInstrumentation};
use crate::scheduler::PeriodicTask;
use crate::store::{MemoryBackend, TtlStore};

const PURGE_INTERVAL: Duration = Duration::from_secs(600);

pub async fn run(config: MonitorConfig) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        rpc_url = %config.ledger.rpc_url,
        api_base_url = %config.health.api_base_url,
        metrics_interval_s = config.intervals.metrics_seconds,
        health_interval_s = config.intervals.health_seconds,
        "monitor configured"
    );

    let metrics = MonitorMetrics::new();
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let backend = Arc::new(MemoryBackend::new(clock.clone()));
    let store = TtlStore::new(backend.clone(), metrics.clone());
    let hub = build_hub(&config.notifications, metrics.clone())?
        .with_timeout(Duration::from_millis(config.timeouts.notify_ms));
    let ctx = Context::new(store.clone(), hub, clock, metrics.clone());

    let instruments = Arc::new(StoreInstrumentation::new(store.clone()));
    let probes = Probes {
        ledger: Arc::new(RpcLedgerProbe::new(config.ledger.rpc_url.clone()).with_tallies((*instruments).clone())),
        app: instruments.clone(),
        contract: instruments.clone(),
        endpoints: Arc::new(HttpEndpointProbe::new(config.health.api_base_url.clone())),
    };

    let monitor = Monitor::new(probes, ctx, Settings::from_config(&config));
    monitor
        .install_defaults(config.load_default_rules, config.load_default_benchmarks)
        .await;

    for (channel, ok) in monitor.test_notification_channels().await {
        if ok {
            tracing::info!(channel = %channel, "notification channel reachable");
        } else {
            tracing::warn!(channel = %channel, "notification channel unreachable");
        }
    }

    let state = ApiState::new(metrics)
        .with_monitor(monitor.clone())
        .with_instruments((*instruments).clone());
    let handle = monitor.start();
    let purge = PeriodicTask::new("store-purge", PURGE_INTERVAL).spawn(move || {
        let backend = backend.clone();
        async move {
            let removed = backend.purge_expired();
            tracing::debug!(removed, "expired entries purged");
        }
    });
    spawn_api(config.api_port, state.clone()).await;
    state.set_ready(true);

    tracing::info!("monitor running");
    crate::shutdown::wait_for_shutdown().await;

    tracing::info!("shutting down");
    state.set_ready(false);
    purge.abort();
    handle.shutdown();
    Ok(())
}

fn build_hub(cfg: &NotificationsConfig, metrics: Arc<MonitorMetrics>) -> Result<NotificationHub, Box<dyn std::error::Error>> {
    let mut hub = NotificationHub::new(metrics);
    let retry = &cfg.retry;

    if let Some(slack) = &cfg.slack {
        match resolve_secret(slack.token.as_deref(), "VIGIL_SLACK_TOKEN") {
            Some(token) => {
                let notifier = SlackNotifier::new(token, slack.default_channel.clone());
                hub = hub.with_channel(Arc::new(RetryNotifier::new(notifier, retry.max_retries, retry.base_delay_ms)));
            }
            None => tracing::warn!("slack configured without a token, channel disabled"),
        }
    }

    if let Some(email) = &cfg.email {
        let password = resolve_secret(email.password.as_deref(), "VIGIL_SMTP_PASSWORD").unwrap_or_default();
        let notifier = EmailNotifier::new(
            &email.host,
            email.port,
            &email.username,
            &password,
            email.from.clone(),
            email.recipients.clone(),
        )?;
        hub = hub.with_channel(Arc::new(RetryNotifier::new(notifier, retry.max_retries, retry.base_delay_ms)));
    }

    if hub.channel_names().is_empty() {
        tracing::warn!("no notification channels configured");
    }
    Ok(hub)
}

async fn spawn_api(port: u16, state: ApiState) {
    let addr = format!("0.0.0.0:{port}");
    tokio::spawn(async move {
        match TcpListener::bind(&addr).await {
            Ok(listener) => {
                tracing::info!(addr = %addr, "HTTP API listening");
                if let Err(e) = api::serve(listener, state).await {
                    tracing::error!(error = %e, "HTTP API error");
                }
            }
            Err(e) => tracing::error!(error = %e, addr = %addr, "failed to bind HTTP API"),
        }
    });
}

/// The file value wins; otherwise the environment variable, if set and non-empty.
fn resolve_secret(configured: Option<&str>, env_var: &str) -> Option<String> {
    if let Some(v) = configured.filter(|v| !v.is_empty()) {
        return Some(v.to_string());
    }
    std::env::var(env_var).ok().filter(|v| !v.is_empty())
}
