// SPDX-License-Identifier: MIT

//! Adaptive-resolution intraday heart-rate fetcher.
//!
//! The finest detail level is preferred but not always available (varies by
//! device and subscription), so the resolver probes `1min → 5min → 15min`
//! and memoizes the best level per day. Probing is strictly sequential so a
//! rate-limit signal aborts the remaining probes.

use crate::error::AppError;
use crate::models::heart::{HeartIntradayDay, IntradayPoint, ZoneMinutes};
use crate::services::fitbit::{DetailLevel, FitbitClient, IntradayResponse};
use crate::services::token::TokenService;
use chrono::{NaiveDate, Utc};
use dashmap::DashMap;
use std::sync::Arc;

/// Upper bound on memoized days; the oldest cached day is evicted beyond it.
const MAX_CACHED_DAYS: usize = 64;

/// Resolved intraday series for one day.
#[derive(Debug, Clone)]
pub struct ResolvedIntraday {
    pub response: IntradayResponse,
    /// Level the data was found at; `None` when every level came back empty.
    pub detail_level: Option<DetailLevel>,
}

impl ResolvedIntraday {
    fn empty() -> Self {
        Self {
            response: IntradayResponse::default(),
            detail_level: None,
        }
    }
}

/// Per-day memoizing resolver; one instance per process, caches are owned
/// here rather than living in process-wide globals.
pub struct IntradayResolver {
    client: FitbitClient,
    cache: DashMap<NaiveDate, ResolvedIntraday>,
    best_level: DashMap<NaiveDate, DetailLevel>,
}

impl IntradayResolver {
    pub fn new(client: FitbitClient) -> Self {
        Self {
            client,
            cache: DashMap::new(),
            best_level: DashMap::new(),
        }
    }

    /// Fetch the intraday series for `date` at the finest available
    /// granularity, memoized per completed day.
    ///
    /// A cached past day is returned verbatim with no network call; the
    /// current day is only cached at the best-level layer, so its data is
    /// always fetched fresh. Once a day's
    /// best level is discovered it is never downgraded by a later transient
    /// failure; a full re-probe happens only when nothing is cached for the
    /// day. `RateLimited` always propagates immediately.
    pub async fn resolve(
        &self,
        access_token: &str,
        date: NaiveDate,
    ) -> Result<ResolvedIntraday, AppError> {
        if let Some(cached) = self.cache.get(&date) {
            return Ok(cached.clone());
        }

        // A known best level without a cached dataset: try it before probing.
        let known = self.best_level.get(&date).map(|l| *l);
        if let Some(level) = known {
            match self.client.get_heart_intraday(access_token, date, level).await {
                Ok(response) if response.has_data() => {
                    return Ok(self.commit(date, response, level));
                }
                Ok(_) => {
                    tracing::debug!(%date, level = level.as_str(), "Known level came back empty, re-probing");
                }
                Err(e @ AppError::RateLimited { .. }) => {
                    tracing::warn!(%date, level = level.as_str(), "Rate limit hit fetching intraday at known level");
                    return Err(e);
                }
                Err(e) => {
                    tracing::warn!(%date, level = level.as_str(), error = %e, "Known level fetch failed, falling back to full probe");
                }
            }
        }

        // Full probe, strictly in order, stopping at the first usable level.
        for level in DetailLevel::PROBE_ORDER {
            match self.client.get_heart_intraday(access_token, date, level).await {
                Ok(response) if response.has_data() => {
                    return Ok(self.commit(date, response, level));
                }
                Ok(_) => {}
                Err(e @ AppError::RateLimited { .. }) => {
                    tracing::warn!(%date, level = level.as_str(), "Rate limit hit during intraday probe");
                    return Err(e);
                }
                Err(e) => {
                    tracing::debug!(%date, level = level.as_str(), error = %e, "Intraday probe failed");
                }
            }
        }

        // All levels empty: return without caching so a later call re-probes.
        Ok(ResolvedIntraday::empty())
    }

    /// Record the discovered level and, for completed days, the dataset.
    ///
    /// The current day is still accumulating samples, so only its best
    /// level is remembered; the dataset itself is re-fetched every time.
    fn commit(
        &self,
        date: NaiveDate,
        response: IntradayResponse,
        level: DetailLevel,
    ) -> ResolvedIntraday {
        let resolved = ResolvedIntraday {
            response,
            detail_level: Some(level),
        };
        self.best_level.insert(date, level);
        if date < Utc::now().date_naive() {
            self.cache.insert(date, resolved.clone());
            self.evict_overflow();
        }
        resolved
    }

    /// Drop the oldest cached day once the map outgrows its bound, so a
    /// long-running process does not accumulate history without limit.
    fn evict_overflow(&self) {
        while self.cache.len() > MAX_CACHED_DAYS {
            let oldest = self.cache.iter().map(|e| *e.key()).min();
            match oldest {
                Some(date) => {
                    self.cache.remove(&date);
                    self.best_level.remove(&date);
                }
                None => break,
            }
        }
    }

}

// ─────────────────────────────────────────────────────────────────────────────
// HeartIntradayService - intraday day DTO composition
// ─────────────────────────────────────────────────────────────────────────────

/// Composes the intraday heart-rate day card: resolved series plus resting
/// heart rate, zones and calories from the daily endpoints.
pub struct HeartIntradayService {
    tokens: Arc<TokenService>,
    client: FitbitClient,
    resolver: IntradayResolver,
}

impl HeartIntradayService {
    pub fn new(tokens: Arc<TokenService>, client: FitbitClient) -> Self {
        let resolver = IntradayResolver::new(client.clone());
        Self {
            tokens,
            client,
            resolver,
        }
    }

    pub async fn get_day(
        &self,
        subject: &str,
        date: NaiveDate,
    ) -> Result<HeartIntradayDay, AppError> {
        let token = self.tokens.get_valid_token(subject).await?;

        let resolved = self.resolver.resolve(&token.access_token, date).await?;
        let dataset = resolved.response.dataset();

        let min_bpm = dataset.iter().map(|p| p.value).min().unwrap_or(0);
        let max_bpm = dataset.iter().map(|p| p.value).max().unwrap_or(0);
        let points = dataset
            .iter()
            .map(|p| IntradayPoint {
                time: p.time.clone(),
                bpm: p.value,
            })
            .collect();

        let day = self.client.get_heart_for_day(&token.access_token, date).await?;
        let item = day.activities_heart.first();
        let resting_hr = item
            .and_then(|i| i.value.as_ref())
            .and_then(|v| v.resting_heart_rate);
        let zones = item
            .and_then(|i| i.value.as_ref())
            .map(|v| {
                v.heart_rate_zones
                    .iter()
                    .map(|z| ZoneMinutes {
                        name: z.name.clone().unwrap_or_default(),
                        min: z.min,
                        max: z.max,
                        minutes: z.minutes,
                    })
                    .collect()
            })
            .unwrap_or_default();

        let activity = self.client.get_activity_summary(&token.access_token, date).await?;
        let summary = activity.summary.as_ref();

        Ok(HeartIntradayDay {
            date,
            resting_hr,
            min_bpm,
            max_bpm,
            calories_out: summary.and_then(|s| s.calories_out),
            activity_calories: summary.and_then(|s| s.activity_calories),
            detail_level: resolved.detail_level.map(|l| l.as_str().to_string()),
            zones,
            points,
        })
    }
}
