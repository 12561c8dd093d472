use crate::ExchangeRateClient;
use crate::cache::TimedCache;
use crate::error::ApiError;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use configuration::ExchangeRateConfig;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Anything that can quote the current USD→THB rate.
#[async_trait]
pub trait RateSource: Send + Sync {
    async fn fetch_usd_thb(&self) -> Result<Decimal, ApiError>;
}

/// The rate handed to clients. `is_fallback` is set when the live rate could
/// not be fetched and the configured constant was used instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateQuote {
    pub rate: Decimal,
    pub is_fallback: bool,
}

/// The exchange rate with a shared TTL cache in front of the upstream API.
///
/// Fallback quotes are cached like live ones, so a failing upstream is retried
/// at most once per TTL.
pub struct ExchangeRateService {
    source: Option<Arc<dyn RateSource>>,
    fallback_rate: Decimal,
    cache: Mutex<TimedCache<RateQuote>>,
}

impl ExchangeRateService {
    pub fn new(source: Option<Arc<dyn RateSource>>, fallback_rate: Decimal, ttl: Duration) -> Self {
        Self {
            source,
            fallback_rate,
            cache: Mutex::new(TimedCache::new(ttl)),
        }
    }

    /// Builds the service from config. Without an API key every quote is the
    /// fallback.
    pub fn from_config(
        config: &ExchangeRateConfig,
        api_key: Option<&str>,
    ) -> Result<Self, ApiError> {
        let source = match api_key {
            Some(key) => {
                let client = ExchangeRateClient::new(&config.base_url, key)?;
                Some(Arc::new(client) as Arc<dyn RateSource>)
            }
            None => None,
        };
        let ttl = i64::try_from(config.ttl_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .ok_or_else(|| {
                ApiError::InvalidData(format!(
                    "exchange_rate.ttl_secs {} is out of range",
                    config.ttl_secs
                ))
            })?;
        Ok(Self::new(source, config.fallback_rate, ttl))
    }

    pub async fn current(&self, now: DateTime<Utc>) -> RateQuote {
        let mut cache = self.cache.lock().await;
        cache.get_or_refresh(now, || self.fetch_or_fallback()).await
    }

    async fn fetch_or_fallback(&self) -> RateQuote {
        let fallback = RateQuote {
            rate: self.fallback_rate,
            is_fallback: true,
        };
        let Some(source) = &self.source else {
            tracing::warn!("Exchange rate API key is missing; serving the fallback rate.");
            return fallback;
        };
        match source.fetch_usd_thb().await {
            Ok(rate) => {
                tracing::info!(%rate, "Fetched USD/THB exchange rate.");
                RateQuote {
                    rate,
                    is_fallback: false,
                }
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Exchange rate fetch failed; serving the fallback rate."
                );
                fallback
            }
        }
    }
}
