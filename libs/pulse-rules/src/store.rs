//! RuleStore - TTL-cached rule resolution
//!
//! Resolution order: cache (`rule:{machine_id}`, SETEX) → rule-storage
//! service (`GET /machines/{id}/logic`, bounded by a request timeout).
//! A 404 degrades to the default rule and is not cached, so a later
//! registration is picked up on the next event. A transport or service
//! failure degrades to the fallback error rule and is not cached either, so
//! the next event retries resolution fresh. The store never fails its
//! caller and never mutates the remote service.

use crate::rule::Rule;
use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use pulse_rtdb::{keyspace, Rtdb};
use reqwest::StatusCode;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Default rule cache TTL (matches the original 5-minute window)
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Default rule-storage fetch timeout
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Resolves a machine identifier to its current decision rule.
///
/// This is the seam the event processor depends on; tests substitute a stub.
#[async_trait]
pub trait RuleResolver: Send + Sync + 'static {
    /// Resolve the rule for a machine. Never fails: resolution problems
    /// degrade to [`Rule::Default`] or [`Rule::Fallback`].
    async fn resolve(&self, machine_id: &str) -> Rule;
}

/// RuleStore configuration
#[derive(Debug, Clone)]
pub struct RuleStoreConfig {
    /// Base URL of the rule-storage service, e.g. "http://localhost:8001"
    pub api_url: String,
    /// Cache TTL for fetched rules
    pub cache_ttl: Duration,
    /// HTTP request timeout
    pub fetch_timeout: Duration,
}

impl RuleStoreConfig {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            cache_ttl: DEFAULT_CACHE_TTL,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

/// Wire format of the rule-storage service response
#[derive(Debug, Deserialize)]
struct LogicResponse {
    #[allow(dead_code)]
    machine_id: String,
    logic: String,
}

/// TTL-cached rule resolution against the rule-storage service
pub struct RuleStore {
    rtdb: Arc<dyn Rtdb>,
    http: reqwest::Client,
    config: RuleStoreConfig,
}

impl RuleStore {
    pub fn new(rtdb: Arc<dyn Rtdb>, config: RuleStoreConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.fetch_timeout)
            .build()
            .context("Failed to build HTTP client for rule store")?;
        Ok(Self { rtdb, http, config })
    }

    /// Parse cached or fetched rule text, degrading to the fallback rule
    /// when the text is unusable
    fn parse_or_fallback(machine_id: &str, text: &str) -> Rule {
        match Rule::parse(text) {
            Ok(rule) => rule,
            Err(e) => {
                warn!(
                    machine_id = %machine_id,
                    "Unusable rule text, using fallback error rule: {}", e
                );
                Rule::Fallback
            },
        }
    }

    /// Fetch rule text from the rule-storage service
    ///
    /// Returns `Ok(Some(text))` on success, `Ok(None)` when no rule is
    /// registered (404), `Err` on transport/service failure.
    async fn fetch(&self, machine_id: &str) -> Result<Option<String>> {
        let url = format!(
            "{}/machines/{}/logic",
            self.config.api_url.trim_end_matches('/'),
            machine_id
        );
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("GET {} failed", url))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = response
            .error_for_status()
            .with_context(|| format!("GET {} returned an error status", url))?;
        let body: LogicResponse = response
            .json()
            .await
            .with_context(|| format!("GET {} returned an invalid body", url))?;
        Ok(Some(body.logic))
    }
}

#[async_trait]
impl RuleResolver for RuleStore {
    async fn resolve(&self, machine_id: &str) -> Rule {
        let cache_key = keyspace::rule_key(machine_id);

        // Cache hit: no remote fetch within the TTL window
        match self.rtdb.get(&cache_key).await {
            Ok(Some(bytes)) => {
                let text = String::from_utf8_lossy(&bytes).to_string();
                debug!(machine_id = %machine_id, "Using cached rule");
                return Self::parse_or_fallback(machine_id, &text);
            },
            Ok(None) => {},
            Err(e) => {
                // Cache unavailable is not fatal; fall through to the fetch
                warn!(machine_id = %machine_id, "Rule cache read failed: {}", e);
            },
        }

        match self.fetch(machine_id).await {
            Ok(Some(text)) => {
                let ttl = self.config.cache_ttl.as_secs();
                if let Err(e) = self
                    .rtdb
                    .set_ex(&cache_key, Bytes::from(text.clone()), ttl)
                    .await
                {
                    warn!(machine_id = %machine_id, "Rule cache write failed: {}", e);
                }
                debug!(machine_id = %machine_id, ttl, "Fetched and cached rule");
                Self::parse_or_fallback(machine_id, &text)
            },
            Ok(None) => {
                // Not cached: a later registration is picked up promptly
                debug!(machine_id = %machine_id, "No rule registered, using default rule");
                Rule::Default
            },
            Err(e) => {
                // Not cached: the next event retries resolution fresh
                warn!(machine_id = %machine_id, "Rule fetch failed, using fallback error rule: {:#}", e);
                Rule::Fallback
            },
        }
    }
}
