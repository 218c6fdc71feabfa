// src/services/batch.rs

//! Batch fetch over a domain's indicator map.

use std::collections::BTreeSet;

use crate::models::{BatchFetch, IndicatorMap, PeriodWindow};

use super::client::IndicatorClient;

/// Fetch every requested key of `indicators`, one request at a time.
///
/// An empty `requested` slice means every key in the map. Keys missing from
/// the map are logged and reported in [`BatchFetch::unknown_keys`]; every
/// other requested key gets an entry, empty when the fetch produced nothing.
pub async fn fetch_multiple(
    client: &IndicatorClient,
    indicators: &IndicatorMap,
    requested: &[String],
    window: PeriodWindow,
    precision: u32,
) -> BatchFetch {
    let keys: Vec<&str> = if requested.is_empty() {
        indicators.keys().map(String::as_str).collect()
    } else {
        let mut seen = BTreeSet::new();
        requested
            .iter()
            .map(String::as_str)
            .filter(|key| seen.insert(*key))
            .collect()
    };

    let mut batch = BatchFetch::default();
    let mut issued = 0usize;

    for key in keys {
        let Some(code) = indicators.get(key) else {
            log::warn!("Unknown indicator key: {key}");
            batch.unknown_keys.push(key.to_string());
            continue;
        };

        if issued > 0 {
            client.pace().await;
        }
        issued += 1;

        let fetch = client.fetch_indicator(code, window, precision).await;
        if let Some(failure) = fetch.failure() {
            batch.failures.insert(key.to_string(), failure.clone());
        }
        batch.series.insert(key.to_string(), fetch.into_series());
    }

    log::info!(
        "Fetched {} indicator(s), {} data point(s), {} failure(s)",
        batch.series.len(),
        batch.total_points(),
        batch.failures.len()
    );

    batch
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::models::{FetchFailure, SeriesPoint};
    use crate::services::client::RetryPolicy;
    use crate::services::source::scripted::ScriptedSource;

    fn map(pairs: &[(&str, &str)]) -> IndicatorMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn keys(keys: &[&str]) -> Vec<String> {
        keys.iter().map(|k| k.to_string()).collect()
    }

    fn body(value: f64) -> serde_json::Value {
        json!([{}, [{"date": "2024", "value": value}]])
    }

    fn window() -> PeriodWindow {
        PeriodWindow::new(2020, 2024).unwrap()
    }

    #[tokio::test]
    async fn test_unknown_keys_are_skipped_and_unrequested_keys_absent() {
        let source = Arc::new(
            ScriptedSource::new()
                .reply("CODE_A", Ok(body(1.0)))
                .reply("CODE_B", Ok(body(2.0))),
        );
        let client = IndicatorClient::new(source.clone());
        let indicators = map(&[("a", "CODE_A"), ("b", "CODE_B")]);

        let batch = fetch_multiple(&client, &indicators, &keys(&["a", "c"]), window(), 2).await;

        assert_eq!(batch.series.len(), 1);
        assert_eq!(batch.series["a"], vec![SeriesPoint::new("2024", 1.0)]);
        assert_eq!(batch.unknown_keys, vec!["c".to_string()]);
        assert!(batch.failures.is_empty());
        assert_eq!(source.calls(), vec!["CODE_A".to_string()]);
    }

    #[tokio::test]
    async fn test_empty_request_fetches_every_key() {
        let source = Arc::new(
            ScriptedSource::new()
                .reply("CODE_A", Ok(body(1.0)))
                .reply("CODE_B", Ok(body(2.0))),
        );
        let client = IndicatorClient::new(source);
        let indicators = map(&[("a", "CODE_A"), ("b", "CODE_B")]);

        let batch = fetch_multiple(&client, &indicators, &[], window(), 2).await;

        assert_eq!(
            batch.series.keys().cloned().collect::<Vec<_>>(),
            keys(&["a", "b"])
        );
        assert_eq!(batch.total_points(), 2);
    }

    #[tokio::test]
    async fn test_failed_keys_keep_an_empty_entry() {
        let source = Arc::new(ScriptedSource::new().reply("CODE_A", Ok(body(1.0))));
        let client = IndicatorClient::new(source);
        let indicators = map(&[("a", "CODE_A"), ("b", "CODE_B")]);

        let batch = fetch_multiple(&client, &indicators, &[], window(), 2).await;

        assert!(batch.series["b"].is_empty());
        assert_eq!(batch.failures["b"], FetchFailure::Status(404));
    }

    #[tokio::test]
    async fn test_duplicate_keys_are_fetched_once() {
        let source = Arc::new(ScriptedSource::new().reply("CODE_A", Ok(body(1.0))));
        let client = IndicatorClient::new(source.clone());
        let indicators = map(&[("a", "CODE_A")]);

        let batch = fetch_multiple(&client, &indicators, &keys(&["a", "a"]), window(), 2).await;

        assert_eq!(source.calls_for("CODE_A"), 1);
        assert_eq!(batch.series["a"].len(), 1);
    }

    #[tokio::test]
    async fn test_key_order_does_not_change_result() {
        let script = || {
            Arc::new(
                ScriptedSource::new()
                    .reply("CODE_A", Ok(body(1.0)))
                    .reply("CODE_B", Ok(body(2.0))),
            )
        };
        let indicators = map(&[("a", "CODE_A"), ("b", "CODE_B")]);

        let forward = fetch_multiple(
            &IndicatorClient::new(script()),
            &indicators,
            &keys(&["a", "b"]),
            window(),
            2,
        )
        .await;
        let backward = fetch_multiple(
            &IndicatorClient::new(script()),
            &indicators,
            &keys(&["b", "a"]),
            window(),
            2,
        )
        .await;

        assert_eq!(forward, backward);
    }

    #[tokio::test(start_paused = true)]
    async fn test_requests_are_paced_but_not_before_the_first() {
        let source = Arc::new(
            ScriptedSource::new()
                .reply("CODE_A", Ok(body(1.0)))
                .reply("CODE_B", Ok(body(2.0)))
                .reply("CODE_C", Ok(body(3.0))),
        );
        let client = IndicatorClient::new(source)
            .with_retry(RetryPolicy::new(1, Duration::ZERO))
            .with_request_delay(Duration::from_millis(250));
        let indicators = map(&[("a", "CODE_A"), ("b", "CODE_B"), ("c", "CODE_C")]);

        let started = tokio::time::Instant::now();
        fetch_multiple(&client, &indicators, &[], window(), 2).await;

        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(500));
        assert!(elapsed < Duration::from_millis(750));
    }
}
