// src/services/client.rs

//! Indicator fetch client.
//!
//! Wraps an [`IndicatorSource`] with retry/backoff and normalizes the
//! `[metadata, records]` envelope into a sorted, rounded series.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::models::{
    FetchConfig, FetchFailure, FetchOutcome, IndicatorFetch, PeriodWindow, Rounding, SeriesPoint,
    period_span,
};

use super::source::{IndicatorSource, SourceError};

/// Retry schedule for transient failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Delay after the first failed attempt; grows linearly
    pub delay_base: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay_base: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay_base,
        }
    }

    /// Delay to wait after failed attempt `attempt` (1-based). Saturates
    /// instead of overflowing.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.delay_base.saturating_mul(attempt)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(2))
    }
}

/// Fetches single indicators from a remote source.
#[derive(Clone)]
pub struct IndicatorClient {
    source: Arc<dyn IndicatorSource>,
    retry: RetryPolicy,
    rounding: Rounding,
    request_delay: Duration,
}

impl IndicatorClient {
    pub fn new(source: Arc<dyn IndicatorSource>) -> Self {
        Self {
            source,
            retry: RetryPolicy::default(),
            rounding: Rounding::default(),
            request_delay: Duration::ZERO,
        }
    }

    /// Create a client with retry, rounding and pacing taken from config.
    pub fn from_config(source: Arc<dyn IndicatorSource>, config: &FetchConfig) -> Self {
        Self::new(source)
            .with_retry(RetryPolicy::new(
                config.max_attempts,
                Duration::from_millis(config.retry_delay_ms),
            ))
            .with_rounding(config.rounding)
            .with_request_delay(Duration::from_millis(config.request_delay_ms))
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_rounding(mut self, rounding: Rounding) -> Self {
        self.rounding = rounding;
        self
    }

    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    /// Wait between consecutive requests of a batch.
    pub async fn pace(&self) {
        if !self.request_delay.is_zero() {
            tokio::time::sleep(self.request_delay).await;
        }
    }

    /// Fetch one indicator over `window`, rounding values to `precision` places.
    ///
    /// Never returns an error: every failure is folded into the outcome.
    pub async fn fetch_indicator(
        &self,
        code: &str,
        window: PeriodWindow,
        precision: u32,
    ) -> IndicatorFetch {
        if code.trim().is_empty() {
            log::warn!("Refusing to fetch an empty indicator code");
            return IndicatorFetch {
                code: code.to_string(),
                attempts: 0,
                outcome: FetchOutcome::Failed(FetchFailure::InvalidCode),
            };
        }

        log::info!("Fetching {} from {} ({})...", code, self.source.name(), window);
        let max = self.retry.max_attempts;
        let mut attempt = 0;

        let body = loop {
            attempt += 1;
            log::debug!("  Attempt {attempt}/{max} for {code}");

            match self.source.request(code, window).await {
                Ok(body) => break body,
                Err(error) if error.is_transient() => {
                    if attempt >= max {
                        log::warn!("Failed to fetch {code} after {max} attempts: {error}");
                        return self.finish(
                            code,
                            attempt,
                            FetchOutcome::Failed(FetchFailure::RetriesExhausted {
                                attempts: attempt,
                                last_error: error.to_string(),
                            }),
                        );
                    }
                    let delay = self.retry.delay_after(attempt);
                    log::info!("  Retry {attempt}/{max} for {code} in {delay:?} ({error})");
                    tokio::time::sleep(delay).await;
                }
                Err(error) => {
                    log::warn!("Request for {code} failed: {error}; returning empty");
                    let failure = match error {
                        SourceError::Status(status) => FetchFailure::Status(status),
                        SourceError::Decode(detail) => FetchFailure::Malformed(detail),
                        other => FetchFailure::Request(other.to_string()),
                    };
                    return self.finish(code, attempt, FetchOutcome::Failed(failure));
                }
            }
        };

        let outcome = parse_envelope(code, &body, precision, self.rounding);
        self.finish(code, attempt, outcome)
    }

    fn finish(&self, code: &str, attempts: u32, outcome: FetchOutcome) -> IndicatorFetch {
        match &outcome {
            FetchOutcome::Series(points) => {
                if let Some((first, last)) = period_span(points) {
                    log::info!(
                        "  Got {} data points for {} ({}–{})",
                        points.len(),
                        code,
                        first,
                        last
                    );
                }
            }
            FetchOutcome::NoData => log::info!("  No data for {code}"),
            FetchOutcome::Failed(failure) => log::info!("  No data for {code} ({failure})"),
        }

        IndicatorFetch {
            code: code.to_string(),
            attempts,
            outcome,
        }
    }
}

/// Turn a `[metadata, records]` body into a fetch outcome.
///
/// Records with a null or missing value are dropped. The remaining values
/// are rounded and sorted by period; the first record wins on a duplicate
/// period.
pub fn parse_envelope(code: &str, body: &Value, precision: u32, rounding: Rounding) -> FetchOutcome {
    let parts = match body.as_array() {
        Some(parts) if parts.len() >= 2 => parts,
        _ => {
            log::warn!("Unexpected response format for {code}");
            return FetchOutcome::Failed(FetchFailure::Malformed(
                "expected a [metadata, records] array".into(),
            ));
        }
    };

    let records = match &parts[1] {
        Value::Null => {
            log::warn!("No data returned for {code}");
            return FetchOutcome::NoData;
        }
        Value::Array(records) => records,
        other => {
            log::warn!("Unexpected records payload for {code}");
            return FetchOutcome::Failed(FetchFailure::Malformed(format!(
                "records should be an array, got {}",
                json_kind(other)
            )));
        }
    };

    let mut points = Vec::with_capacity(records.len());
    for record in records {
        let value = match record.get("value") {
            None | Some(Value::Null) => continue,
            Some(value) => value,
        };
        let (Some(period), Some(number)) = (
            record.get("date").and_then(Value::as_str),
            value.as_f64(),
        ) else {
            log::debug!("Skipping unreadable record for {code}: {record}");
            continue;
        };
        points.push(SeriesPoint::new(period, rounding.apply(number, precision)));
    }

    let mut seen = HashSet::new();
    points.retain(|p| seen.insert(p.period.clone()));
    points.sort_by(|a, b| a.period.cmp(&b.period));

    if points.is_empty() {
        FetchOutcome::NoData
    } else {
        FetchOutcome::Series(points)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::source::scripted::ScriptedSource;
    use serde_json::json;

    fn window() -> PeriodWindow {
        PeriodWindow::new(2000, 2025).unwrap()
    }

    fn scenario_body() -> Value {
        json!([
            {"page": 1, "pages": 1, "per_page": 100, "total": 3},
            [
                {"date": "2020", "value": 1.005},
                {"date": "2019", "value": null},
                {"date": "2021", "value": 2.0}
            ]
        ])
    }

    fn client(source: Arc<ScriptedSource>) -> IndicatorClient {
        IndicatorClient::new(source).with_retry(RetryPolicy::new(3, Duration::from_secs(2)))
    }

    #[test]
    fn test_envelope_drops_nulls_rounds_and_sorts() {
        let outcome = parse_envelope("X", &scenario_body(), 2, Rounding::HalfUp);
        assert_eq!(
            outcome,
            FetchOutcome::Series(vec![
                SeriesPoint::new("2020", 1.01),
                SeriesPoint::new("2021", 2.0),
            ])
        );
    }

    #[test]
    fn test_envelope_half_even_keeps_binary_value() {
        let outcome = parse_envelope("X", &scenario_body(), 2, Rounding::HalfEven);
        assert_eq!(
            outcome,
            FetchOutcome::Series(vec![
                SeriesPoint::new("2020", 1.0),
                SeriesPoint::new("2021", 2.0),
            ])
        );
    }

    #[test]
    fn test_envelope_with_null_records_is_no_data() {
        let body = json!([{"message": "no data"}, null]);
        assert_eq!(parse_envelope("X", &body, 2, Rounding::HalfUp), FetchOutcome::NoData);
    }

    #[test]
    fn test_envelope_with_all_null_values_is_no_data() {
        let body = json!([{}, [{"date": "2024", "value": null}, {"date": "2023"}]]);
        assert_eq!(parse_envelope("X", &body, 2, Rounding::HalfUp), FetchOutcome::NoData);
    }

    #[test]
    fn test_single_element_envelope_is_malformed() {
        let body = json!([{"message": [{"id": "120", "value": "Invalid value"}]}]);
        assert!(matches!(
            parse_envelope("X", &body, 2, Rounding::HalfUp),
            FetchOutcome::Failed(FetchFailure::Malformed(_))
        ));
        assert!(matches!(
            parse_envelope("X", &json!({"error": true}), 2, Rounding::HalfUp),
            FetchOutcome::Failed(FetchFailure::Malformed(_))
        ));
    }

    #[test]
    fn test_duplicate_periods_keep_first_record() {
        let body = json!([{}, [
            {"date": "2021", "value": 5.0},
            {"date": "2020", "value": 4.0},
            {"date": "2021", "value": 9.0}
        ]]);
        assert_eq!(
            parse_envelope("X", &body, 2, Rounding::HalfUp),
            FetchOutcome::Series(vec![
                SeriesPoint::new("2020", 4.0),
                SeriesPoint::new("2021", 5.0),
            ])
        );
    }

    #[test]
    fn test_unreadable_records_are_skipped() {
        let body = json!([{}, [
            {"date": 2020, "value": 1.0},
            {"date": "2021", "value": "n/a"},
            {"date": "2022", "value": 3.333}
        ]]);
        assert_eq!(
            parse_envelope("X", &body, 1, Rounding::HalfUp),
            FetchOutcome::Series(vec![SeriesPoint::new("2022", 3.3)])
        );
    }

    #[test]
    fn test_series_is_monotonic_in_period() {
        let records: Vec<Value> = [2011, 2003, 2024, 2000, 2017]
            .iter()
            .map(|y| json!({"date": y.to_string(), "value": *y as f64 / 7.0}))
            .collect();
        let body = json!([{}, records]);
        let FetchOutcome::Series(points) = parse_envelope("X", &body, 3, Rounding::HalfUp) else {
            panic!("expected a series");
        };
        assert!(points.windows(2).all(|w| w[0].period <= w[1].period));
        assert_eq!(points.len(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_http_error_is_not_retried() {
        let source = Arc::new(ScriptedSource::new().reply("MISSING", Err(SourceError::Status(404))));
        let fetch = client(source.clone())
            .fetch_indicator("MISSING", window(), 2)
            .await;

        assert_eq!(fetch.attempts, 1);
        assert_eq!(fetch.outcome, FetchOutcome::Failed(FetchFailure::Status(404)));
        assert_eq!(source.calls_for("MISSING"), 1);
        assert!(fetch.into_series().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_two_timeouts_then_success() {
        let source = Arc::new(
            ScriptedSource::new()
                .reply("SP.POP.TOTL", Err(SourceError::Timeout("slow".into())))
                .reply("SP.POP.TOTL", Err(SourceError::Timeout("slow".into())))
                .reply("SP.POP.TOTL", Ok(scenario_body())),
        );

        let started = tokio::time::Instant::now();
        let fetch = client(source.clone())
            .fetch_indicator("SP.POP.TOTL", window(), 2)
            .await;
        let elapsed = started.elapsed();

        assert_eq!(fetch.attempts, 3);
        assert_eq!(fetch.series().len(), 2);
        assert_eq!(source.calls_for("SP.POP.TOTL"), 3);
        // 2s after the first failure, 4s after the second
        assert!(elapsed >= Duration::from_secs(6));
        assert!(elapsed < Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_degrade_to_failure() {
        let source = Arc::new(
            ScriptedSource::new()
                .reply("X", Err(SourceError::Connect("refused".into())))
                .reply("X", Err(SourceError::Connect("refused".into())))
                .reply("X", Err(SourceError::Connect("refused".into())))
                .reply("X", Ok(scenario_body())),
        );

        let fetch = client(source.clone()).fetch_indicator("X", window(), 2).await;

        assert_eq!(fetch.attempts, 3);
        assert_eq!(source.calls_for("X"), 3);
        assert!(matches!(
            fetch.outcome,
            FetchOutcome::Failed(FetchFailure::RetriesExhausted { attempts: 3, .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_decode_failure_is_not_retried() {
        let source = Arc::new(ScriptedSource::new().reply("X", Err(SourceError::Decode("html".into()))));
        let fetch = client(source.clone()).fetch_indicator("X", window(), 2).await;
        assert_eq!(source.calls_for("X"), 1);
        assert!(matches!(fetch.outcome, FetchOutcome::Failed(FetchFailure::Malformed(_))));
    }

    #[tokio::test]
    async fn test_empty_code_issues_no_request() {
        let source = Arc::new(ScriptedSource::new());
        let fetch = client(source.clone()).fetch_indicator("  ", window(), 2).await;
        assert_eq!(fetch.attempts, 0);
        assert_eq!(fetch.outcome, FetchOutcome::Failed(FetchFailure::InvalidCode));
        assert!(source.calls().is_empty());
    }

    #[tokio::test]
    async fn test_repeated_fetches_are_identical() {
        let source = Arc::new(
            ScriptedSource::new()
                .reply("X", Ok(scenario_body()))
                .reply("X", Ok(scenario_body())),
        );
        let client = client(source);
        let first = client.fetch_indicator("X", window(), 2).await;
        let second = client.fetch_indicator("X", window(), 2).await;
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(first.series()).unwrap(),
            serde_json::to_string(second.series()).unwrap()
        );
    }

    #[test]
    fn test_retry_delay_grows_linearly() {
        let policy = RetryPolicy::new(3, Duration::from_millis(500));
        assert_eq!(policy.delay_after(1), Duration::from_millis(500));
        assert_eq!(policy.delay_after(2), Duration::from_millis(1000));
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts, 1);
    }

    #[test]
    fn test_retry_delay_saturates_on_huge_base() {
        let policy = RetryPolicy::new(u32::MAX, Duration::from_millis(u64::MAX));
        assert_eq!(policy.delay_after(u32::MAX), Duration::MAX);
        assert_eq!(RetryPolicy::new(3, Duration::MAX).delay_after(2), Duration::MAX);
    }
}
