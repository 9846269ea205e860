use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::http::{http_client, REQUEST_TIMEOUT};
use super::instrumentation::StoreInstrumentation;
use super::traits::{LedgerProbe, PerformanceSample, ProbeError};

/// Slots spanned when estimating the block interval from block times.
pub const BLOCK_INTERVAL_WINDOW: u64 = 150;

/// JSON-RPC ledger client. Confirmation time and failure rate are not exposed
/// by the node; they come from recorded tallies when attached.
pub struct RpcLedgerProbe {
    url: String,
    client: Client,
    next_id: AtomicU64,
    tallies: Option<StoreInstrumentation>,
}

#[derive(Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

#[derive(Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcPerformanceSample {
    num_transactions: u64,
    num_slots: u64,
    sample_period_secs: u64,
}

impl RpcLedgerProbe {
    pub fn new(url: String) -> Self {
        Self {
            url,
            client: http_client(REQUEST_TIMEOUT),
            next_id: AtomicU64::new(1),
            tallies: None,
        }
    }

    pub fn with_tallies(mut self, tallies: StoreInstrumentation) -> Self {
        self.tallies = Some(tallies);
        self
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<Option<T>, ProbeError> {
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "id": self.next_id.fetch_add(1, Ordering::Relaxed),
            "method": method,
            "params": params,
        });
        let resp: RpcResponse<T> = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProbeError(format!("{method}: {e}")))?
            .error_for_status()
            .map_err(|e| ProbeError(format!("{method}: {e}")))?
            .json()
            .await
            .map_err(|e| ProbeError(format!("{method}: {e}")))?;

        if let Some(err) = resp.error {
            return Err(ProbeError(format!("{method}: rpc error {}: {}", err.code, err.message)));
        }
        Ok(resp.result)
    }
}

#[async_trait]
impl LedgerProbe for RpcLedgerProbe {
    async fn current_slot(&self) -> Result<u64, ProbeError> {
        self.call("getSlot", serde_json::json!([]))
            .await?
            .ok_or_else(|| ProbeError("getSlot: empty result".into()))
    }

    async fn recent_performance_sample(&self) -> Result<PerformanceSample, ProbeError> {
        let samples: Vec<RpcPerformanceSample> = self
            .call("getRecentPerformanceSamples", serde_json::json!([1]))
            .await?
            .unwrap_or_default();
        Ok(samples
            .first()
            .map(|s| PerformanceSample {
                num_transactions: s.num_transactions,
                num_slots: s.num_slots,
                sample_period_secs: s.sample_period_secs,
            })
            .unwrap_or_default())
    }

    async fn block_time_for(&self, slot: u64) -> Result<Option<i64>, ProbeError> {
        self.call("getBlockTime", serde_json::json!([slot])).await
    }

    async fn confirmation_time(&self) -> Result<f64, ProbeError> {
        match &self.tallies {
            Some(t) => Ok(t.ledger_confirmation_time().await),
            None => Ok(0.0),
        }
    }

    async fn failure_rate(&self) -> Result<f64, ProbeError> {
        match &self.tallies {
            Some(t) => Ok(t.ledger_failure_rate().await),
            None => Ok(0.0),
        }
    }
}

/// Average milliseconds per slot between two block times `window` slots apart.
pub async fn block_interval_ms(probe: &dyn LedgerProbe, window: u64) -> Result<f64, ProbeError> {
    let slot = probe.current_slot().await?;
    if slot < window || window == 0 {
        return Ok(0.0);
    }
    let (newest, oldest) = tokio::join!(probe.block_time_for(slot), probe.block_time_for(slot - window));
    match (newest?, oldest?) {
        (Some(new), Some(old)) if new >= old => Ok((new - old) as f64 * 1000.0 / window as f64),
        _ => Err(ProbeError(format!("block time unavailable around slot {slot}"))),
    }
}
