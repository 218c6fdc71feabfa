//! Application configuration structures.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{IndicatorMap, PeriodWindow, Rounding};

static DOMAIN_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9_-]+$").expect("valid domain name pattern"));

static INDICATOR_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._]+$").expect("valid indicator code pattern"));

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Remote source and retry behavior
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Output locations
    #[serde(default)]
    pub paths: PathsConfig,

    /// Log filter defaults
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Indicator domains, each published under its own directory
    #[serde(default = "defaults::domains")]
    pub domains: Vec<DomainConfig>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Look up a domain by name.
    pub fn domain(&self, name: &str) -> Option<&DomainConfig> {
        self.domains.iter().find(|d| d.name == name)
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        let base = Url::parse(&self.fetch.base_url)?;
        if base.cannot_be_a_base() {
            return Err(AppError::validation(
                "fetch.base_url must be a hierarchical URL",
            ));
        }
        if self.fetch.user_agent.trim().is_empty() {
            return Err(AppError::validation("fetch.user_agent is empty"));
        }
        if self.fetch.timeout_secs == 0 {
            return Err(AppError::validation("fetch.timeout_secs must be > 0"));
        }
        if self.fetch.max_attempts == 0 {
            return Err(AppError::validation("fetch.max_attempts must be > 0"));
        }
        if self.fetch.per_page == 0 {
            return Err(AppError::validation("fetch.per_page must be > 0"));
        }
        if self.paths.output_dir.trim().is_empty() {
            return Err(AppError::validation("paths.output_dir is empty"));
        }
        if self.domains.is_empty() {
            return Err(AppError::validation("No domains defined"));
        }

        let mut seen = HashSet::new();
        for domain in &self.domains {
            if !seen.insert(domain.name.as_str()) {
                return Err(AppError::validation(format!(
                    "domain '{}' is defined more than once",
                    domain.name
                )));
            }
            domain.validate()?;
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fetch: FetchConfig::default(),
            paths: PathsConfig::default(),
            logging: LoggingConfig::default(),
            domains: defaults::domains(),
        }
    }
}

/// Remote source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Indicator endpoint; the indicator code is appended as a path segment
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Total attempts on transient failures
    #[serde(default = "defaults::max_attempts")]
    pub max_attempts: u32,

    /// Base retry delay; attempt `n` waits `n` times this
    #[serde(default = "defaults::retry_delay")]
    pub retry_delay_ms: u64,

    /// Pause between consecutive requests of a batch
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,

    /// Page size requested from the API
    #[serde(default = "defaults::per_page")]
    pub per_page: u32,

    /// Rounding rule for fetched values
    #[serde(default)]
    pub rounding: Rounding,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            max_attempts: defaults::max_attempts(),
            retry_delay_ms: defaults::retry_delay(),
            request_delay_ms: defaults::request_delay(),
            per_page: defaults::per_page(),
            rounding: Rounding::default(),
        }
    }
}

/// Output locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Root of the published data tree
    #[serde(default = "defaults::output_dir")]
    pub output_dir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            output_dir: defaults::output_dir(),
        }
    }
}

/// Logging defaults; `RUST_LOG` still wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

/// One indicator domain (census, economy, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainConfig {
    /// Directory name under the output root
    pub name: String,

    /// Label of the publication year (e.g. `2025-26`)
    #[serde(default = "defaults::year_label")]
    pub year_label: String,

    /// Attribution written into every artifact
    #[serde(default = "defaults::source")]
    pub source: String,

    #[serde(default = "defaults::start_year")]
    pub start_year: i32,

    #[serde(default = "defaults::end_year")]
    pub end_year: i32,

    /// Decimal places kept on fetched values
    #[serde(default = "defaults::precision")]
    pub precision: u32,

    /// Subset of indicator keys to fetch; empty means all
    #[serde(default)]
    pub keys: Vec<String>,

    /// Friendly key to remote indicator code
    pub indicators: IndicatorMap,
}

impl DomainConfig {
    pub fn window(&self) -> Result<PeriodWindow> {
        PeriodWindow::new(self.start_year, self.end_year)
    }

    /// Indicators a run fetches and publishes: every mapped key when `keys`
    /// is empty, otherwise the requested keys present in the map.
    pub fn selected_indicators(&self) -> impl Iterator<Item = (&String, &String)> {
        self.indicators
            .iter()
            .filter(|(key, _)| self.keys.is_empty() || self.keys.contains(*key))
    }

    pub fn validate(&self) -> Result<()> {
        if !DOMAIN_NAME.is_match(&self.name) {
            return Err(AppError::validation(format!(
                "domain name '{}' must match [a-z0-9_-]+",
                self.name
            )));
        }
        if self.year_label.trim().is_empty() {
            return Err(AppError::validation(format!(
                "domain '{}' has an empty year_label",
                self.name
            )));
        }
        self.window().map_err(|e| {
            AppError::validation(format!("domain '{}': {}", self.name, e))
        })?;
        if self.indicators.is_empty() {
            return Err(AppError::validation(format!(
                "domain '{}' has no indicators",
                self.name
            )));
        }
        for (key, code) in &self.indicators {
            if !INDICATOR_CODE.is_match(code) {
                return Err(AppError::validation(format!(
                    "domain '{}': indicator '{}' has invalid code '{}'",
                    self.name, key, code
                )));
            }
        }
        Ok(())
    }
}

mod defaults {
    use super::DomainConfig;
    use crate::models::IndicatorMap;

    // Fetch defaults
    pub fn base_url() -> String {
        "https://api.worldbank.org/v2/country/ind/indicator".into()
    }
    pub fn user_agent() -> String {
        "statpipe/0.1 (+public statistics pipeline)".into()
    }
    pub fn timeout() -> u64 {
        60
    }
    pub fn max_attempts() -> u32 {
        3
    }
    pub fn retry_delay() -> u64 {
        2000
    }
    pub fn request_delay() -> u64 {
        250
    }
    pub fn per_page() -> u32 {
        100
    }

    // Path and logging defaults
    pub fn output_dir() -> String {
        "public/data".into()
    }
    pub fn log_level() -> String {
        "info".into()
    }

    // Domain defaults
    pub fn year_label() -> String {
        "2025-26".into()
    }
    pub fn source() -> String {
        "World Bank Development Indicators".into()
    }
    pub fn start_year() -> i32 {
        2000
    }
    pub fn end_year() -> i32 {
        2025
    }
    pub fn precision() -> u32 {
        2
    }

    fn indicator_map(pairs: &[(&str, &str)]) -> IndicatorMap {
        pairs
            .iter()
            .map(|(key, code)| (key.to_string(), code.to_string()))
            .collect()
    }

    fn domain(name: &str, start_year: i32, pairs: &[(&str, &str)]) -> DomainConfig {
        DomainConfig {
            name: name.into(),
            year_label: year_label(),
            source: source(),
            start_year,
            end_year: end_year(),
            precision: precision(),
            keys: Vec::new(),
            indicators: indicator_map(pairs),
        }
    }

    pub fn domains() -> Vec<DomainConfig> {
        let mut economy = domain(
            "economy",
            2014,
            &[
                ("gdp_growth", "NY.GDP.MKTP.KD.ZG"),
                ("gdp_current_usd", "NY.GDP.MKTP.CD"),
                ("gdp_per_capita", "NY.GDP.PCAP.CD"),
                ("inflation_cpi", "FP.CPI.TOTL.ZG"),
                ("exports_pct_gdp", "NE.EXP.GNFS.ZS"),
                ("imports_pct_gdp", "NE.IMP.GNFS.ZS"),
                ("trade_pct_gdp", "NE.TRD.GNFS.ZS"),
                ("fdi_pct_gdp", "BX.KLT.DINV.WD.GD.ZS"),
                ("agri_va_pct_gdp", "NV.AGR.TOTL.ZS"),
                ("industry_va_pct_gdp", "NV.IND.TOTL.ZS"),
                ("services_va_pct_gdp", "NV.SRV.TOTL.ZS"),
                ("unemployment", "SL.UEM.TOTL.ZS"),
                ("current_account_pct_gdp", "BN.CAB.XOKA.GD.ZS"),
                ("govt_debt_pct_gdp", "GC.DOD.TOTL.GD.ZS"),
                ("population", "SP.POP.TOTL"),
                ("gni_per_capita", "NY.GNP.PCAP.CD"),
            ],
        );
        economy.keys = [
            "gdp_growth",
            "inflation_cpi",
            "exports_pct_gdp",
            "imports_pct_gdp",
            "agri_va_pct_gdp",
            "industry_va_pct_gdp",
            "services_va_pct_gdp",
            "current_account_pct_gdp",
            "population",
            "gdp_current_usd",
        ]
        .iter()
        .map(|k| k.to_string())
        .collect();

        vec![
            domain(
                "census",
                2000,
                &[
                    ("population", "SP.POP.TOTL"),
                    ("pop_growth", "SP.POP.GROW"),
                    ("pop_0_14", "SP.POP.0014.TO.ZS"),
                    ("pop_15_64", "SP.POP.1564.TO.ZS"),
                    ("pop_65_up", "SP.POP.65UP.TO.ZS"),
                    ("dependency", "SP.POP.DPND"),
                    ("birth_rate", "SP.DYN.CBRT.IN"),
                    ("death_rate", "SP.DYN.CDRT.IN"),
                    ("fertility", "SP.DYN.TFRT.IN"),
                    ("life_exp", "SP.DYN.LE00.IN"),
                    ("life_exp_male", "SP.DYN.LE00.MA.IN"),
                    ("life_exp_female", "SP.DYN.LE00.FE.IN"),
                    ("urban_pct", "SP.URB.TOTL.IN.ZS"),
                    ("imr", "SP.DYN.IMRT.IN"),
                    ("under5_mr", "SH.DYN.MORT"),
                    ("mmr", "SH.STA.MMRT"),
                    ("literacy", "SE.ADT.LITR.ZS"),
                    ("literacy_male", "SE.ADT.LITR.MA.ZS"),
                    ("literacy_female", "SE.ADT.LITR.FE.ZS"),
                ],
            ),
            economy,
            domain(
                "education",
                2000,
                &[
                    ("prim_enroll", "SE.PRM.ENRR"),
                    ("sec_enroll", "SE.SEC.ENRR"),
                    ("tert_enroll", "SE.TER.ENRR"),
                    ("sec_enroll_f", "SE.SEC.ENRR.FE"),
                    ("sec_enroll_m", "SE.SEC.ENRR.MA"),
                    ("literacy_adult", "SE.ADT.LITR.ZS"),
                    ("literacy_youth", "SE.ADT.1524.LT.ZS"),
                    ("literacy_adult_f", "SE.ADT.LITR.FE.ZS"),
                    ("edu_spend_gdp", "SE.XPD.TOTL.GD.ZS"),
                    ("edu_spend_govt", "SE.XPD.TOTL.GB.ZS"),
                    ("prim_compl", "SE.PRM.CMPT.ZS"),
                    ("out_of_school", "SE.PRM.UNER"),
                    ("ptr_primary", "SE.PRM.ENRL.TC.ZS"),
                    ("ptr_secondary", "SE.SEC.ENRL.TC.ZS"),
                ],
            ),
            domain(
                "employment",
                2000,
                &[
                    ("unemp_total", "SL.UEM.TOTL.ZS"),
                    ("unemp_national", "SL.UEM.TOTL.NE.ZS"),
                    ("unemp_youth", "SL.UEM.1524.ZS"),
                    ("unemp_youth_nat", "SL.UEM.1524.NE.ZS"),
                    ("unemp_female", "SL.UEM.TOTL.FE.ZS"),
                    ("unemp_male", "SL.UEM.TOTL.MA.ZS"),
                    ("lfpr_total", "SL.TLF.CACT.ZS"),
                    ("lfpr_female", "SL.TLF.CACT.FE.ZS"),
                    ("lfpr_male", "SL.TLF.CACT.MA.ZS"),
                    ("lfpr_national", "SL.TLF.CACT.NE.ZS"),
                    ("emp_agri", "SL.AGR.EMPL.ZS"),
                    ("emp_industry", "SL.IND.EMPL.ZS"),
                    ("emp_services", "SL.SRV.EMPL.ZS"),
                    ("emp_self", "SL.EMP.SELF.ZS"),
                    ("labor_force", "SL.TLF.TOTL.IN"),
                    ("emp_pop_ratio", "SL.EMP.TOTL.SP.ZS"),
                    ("vulnerable_emp", "SL.EMP.VULN.ZS"),
                ],
            ),
            domain(
                "environment",
                2000,
                &[
                    ("co2_per_capita", "EN.ATM.CO2E.PC"),
                    ("co2_total", "EN.ATM.CO2E.KT"),
                    ("renewables_pct", "EG.FEC.RNEW.ZS"),
                    ("forest_pct", "AG.LND.FRST.ZS"),
                    ("forest_km2", "AG.LND.FRST.K2"),
                    ("pm25", "EN.ATM.PM25.MC.M3"),
                    ("renewable_elec", "EG.ELC.RNEW.ZS"),
                    ("energy_use_pc", "EG.USE.PCAP.KG.OE"),
                    ("coal_elec", "EG.ELC.COAL.ZS"),
                    ("ghg_total", "EN.ATM.GHGT.KT.CE"),
                    ("protected_areas", "ER.PTD.TOTL.ZS"),
                ],
            ),
            domain(
                "healthcare",
                2000,
                &[
                    ("hospital_beds", "SH.MED.BEDS.ZS"),
                    ("physicians", "SH.MED.PHYS.ZS"),
                    ("nurses", "SH.MED.NUMW.P3"),
                    ("health_exp_gdp", "SH.XPD.CHEX.GD.ZS"),
                    ("health_exp_pc", "SH.XPD.CHEX.PC.CD"),
                    ("oop_health", "SH.XPD.OOPC.CH.ZS"),
                    ("govt_health_exp", "SH.XPD.GHED.GD.ZS"),
                    ("imm_dpt", "SH.IMM.IDPT"),
                    ("imm_measles", "SH.IMM.MEAS"),
                    ("tb_incidence", "SH.TBS.INCD"),
                    ("hiv_prev", "SH.DYN.AIDS.ZS"),
                    ("births_attended", "SH.STA.BRTC.ZS"),
                ],
            ),
            domain(
                "rbi",
                2014,
                &[
                    ("broad_money_growth", "FM.LBL.BMNY.ZG"),
                    ("broad_money_pct_gdp", "FM.LBL.BMNY.GD.ZS"),
                    ("domestic_credit_pct_gdp", "FS.AST.DOMS.GD.ZS"),
                    ("private_credit_pct_gdp", "FD.AST.PRVT.GD.ZS"),
                    ("reserves_usd", "FI.RES.TOTL.CD"),
                    ("exchange_rate", "PA.NUS.FCRF"),
                    ("inflation_cpi", "FP.CPI.TOTL.ZG"),
                    ("lending_rate", "FR.INR.LEND"),
                    ("deposit_rate", "FR.INR.DPST"),
                    ("bank_branches", "FB.CBK.BRCH.P5"),
                ],
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_attempts() {
        let mut config = Config::default();
        config.fetch.max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_window() {
        let mut config = Config::default();
        config.domains[0].start_year = 2030;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_duplicate_domains() {
        let mut config = Config::default();
        let first = config.domains[0].clone();
        config.domains.push(first);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_indicator_code() {
        let mut config = Config::default();
        config.domains[0]
            .indicators
            .insert("broken".into(), "SP POP/TOTL".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_tolerates_unknown_requested_keys() {
        let mut config = Config::default();
        config.domains[0].keys = vec!["not_in_map".into()];
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [fetch]
            max_attempts = 5
            rounding = "half_even"

            [[domains]]
            name = "census"
            [domains.indicators]
            population = "SP.POP.TOTL"
            "#,
        )
        .unwrap();

        assert_eq!(config.fetch.max_attempts, 5);
        assert_eq!(config.fetch.rounding, Rounding::HalfEven);
        assert_eq!(config.fetch.timeout_secs, 60);
        assert_eq!(config.domains.len(), 1);
        assert_eq!(config.domains[0].year_label, "2025-26");
        assert_eq!(config.domains[0].precision, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_selected_indicators_follow_requested_keys() {
        let mut config = Config::default().domain("census").cloned().unwrap();
        assert_eq!(config.selected_indicators().count(), config.indicators.len());

        config.keys = vec!["population".into(), "retired".into(), "population".into()];
        let keys: Vec<&str> = config.selected_indicators().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["population"]);
    }

    #[test]
    fn test_default_economy_requests_subset() {
        let config = Config::default();
        let economy = config.domain("economy").unwrap();
        assert_eq!(economy.keys.len(), 10);
        assert_eq!(economy.start_year, 2014);
        assert!(economy.keys.iter().all(|k| economy.indicators.contains_key(k)));
    }
}
