// src/pipeline/validate.rs

use crate::error::Result;
use crate::models::Config;
use crate::utils::log;

/// Validate configuration and report what it contains.
pub fn run_validate(config: &Config) -> Result<()> {
    log::header("Validating configuration");

    if let Err(e) = config.validate() {
        log::error(&format!("Config validation failed: {e}"));
        return Err(e);
    }

    log::success("Config OK");
    log::sub_item(&format!("Source: {}", config.fetch.base_url));
    log::sub_item(&format!("Timeout: {}s", config.fetch.timeout_secs));
    log::sub_item(&format!(
        "Retries: {} attempt(s), {}ms base delay",
        config.fetch.max_attempts, config.fetch.retry_delay_ms
    ));
    log::sub_item(&format!("Output: {}", config.paths.output_dir));

    for domain in &config.domains {
        let unknown: Vec<&str> = domain
            .keys
            .iter()
            .filter(|k| !domain.indicators.contains_key(*k))
            .map(String::as_str)
            .collect();

        log::sub_item(&format!(
            "{}: {} indicator(s), {}–{}",
            domain.name,
            domain.indicators.len(),
            domain.start_year,
            domain.end_year
        ));
        if !unknown.is_empty() {
            log::warn(&format!(
                "{}: requested keys not in the indicator map will be skipped: {}",
                domain.name,
                unknown.join(", ")
            ));
        }
    }

    Ok(())
}
