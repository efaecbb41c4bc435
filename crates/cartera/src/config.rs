//! Run configuration.
//!
//! A configuration file has `signal` and `backtest` sections, plus optional
//! `data` and `output` sections used by the command-line tool. Files ending in
//! `.json` are parsed as JSON; anything else as TOML.
//!
//! ```toml
//! [signal]
//! name = "idio_vol_22"
//! type = "idio_vol"
//! window_size = 22
//! direction = -1
//!
//! [backtest]
//! constraints = ["FullInvestment", "LongOnly"]
//! gamma = 400
//! n_cpus = 8
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use cartera_backtest::BacktestConfig;
use cartera_optimizer::ConstraintSet;
use cartera_signals::{Direction, SignalType, TransformParams};
use cartera_traits::{CarteraError, Result, columns};
use serde::{Deserialize, Serialize};

/// `[signal]` section as written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalSection {
    /// Output name of the signal, used for column names.
    pub name: String,
    /// Registered signal type identifier.
    #[serde(rename = "type")]
    pub signal_type: String,
    /// Rolling window length in rows.
    pub window_size: i64,
    /// Minimum non-null observations; defaults to `window_size`.
    #[serde(default)]
    pub min_periods: Option<i64>,
    /// `1` or `-1`.
    #[serde(default = "default_direction")]
    pub direction: i64,
    /// Publication lag in rows.
    #[serde(default)]
    pub shift: i64,
}

const fn default_direction() -> i64 {
    1
}

/// `[backtest]` section as written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestSection {
    /// Constraint tags.
    pub constraints: Vec<String>,
    /// Risk aversion.
    pub gamma: f64,
    /// Worker pool size; defaults to the available parallelism.
    #[serde(default)]
    pub n_cpus: Option<i64>,
    /// Optional `[lower, upper]` bounds applied to every weight.
    #[serde(default)]
    pub weight_bounds: Option<[f64; 2]>,
    /// Optional solver time limit per date, in seconds.
    #[serde(default)]
    pub time_limit_secs: Option<f64>,
}

/// `[data]` section: where the panel lives and how to clean it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSection {
    /// Parquet or CSV file.
    pub path: PathBuf,
    /// Asset identifier column.
    #[serde(default = "default_asset_key")]
    pub asset_key: String,
    /// Date column.
    #[serde(default = "default_date_key")]
    pub date_key: String,
    /// Divide percent-scaled return and risk columns by 100.
    #[serde(default)]
    pub convert_returns_to_decimal: bool,
    /// Treat zero daily volume as missing.
    #[serde(default)]
    pub replace_zero_volume: bool,
}

fn default_asset_key() -> String {
    columns::ASSET.to_string()
}

fn default_date_key() -> String {
    columns::DATE.to_string()
}

/// `[output]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSection {
    /// Directory under which a folder per run is created.
    pub results_path: PathBuf,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            results_path: PathBuf::from("results"),
        }
    }
}

/// A configuration file before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawConfig {
    /// Signal definition.
    pub signal: SignalSection,
    /// Backtest definition.
    pub backtest: BacktestSection,
    /// Input data, for the command-line tool.
    #[serde(default)]
    pub data: Option<DataSection>,
    /// Output location, for the command-line tool.
    #[serde(default)]
    pub output: Option<OutputSection>,
}

impl RawConfig {
    /// Parse TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| CarteraError::ConfigParse(e.to_string()))
    }

    /// Parse JSON text.
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| CarteraError::ConfigParse(e.to_string()))
    }

    /// Read a file, choosing the format by extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&text)
        } else {
            Self::from_toml_str(&text)
        }
    }
}

/// Validated, immutable configuration for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Run name; the configuration file stem when loaded from disk.
    pub run_name: String,
    /// Output name of the signal.
    pub signal_name: String,
    /// Registered signal type.
    pub signal_type: SignalType,
    /// Rolling transform parameters.
    pub transform: TransformParams,
    /// Backtest parameters.
    pub backtest: BacktestConfig,
    /// Input data section, if given.
    pub data: Option<DataSection>,
    /// Output section.
    pub output: OutputSection,
}

impl PipelineConfig {
    /// Load and validate a configuration file. The run name is the file stem.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let run_name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "run".to_string());
        Self::from_sections(RawConfig::from_path(path)?, run_name)
    }

    /// Validate raw sections.
    ///
    /// Every failure names the offending field.
    pub fn from_sections(raw: RawConfig, run_name: impl Into<String>) -> Result<Self> {
        let RawConfig {
            signal,
            backtest,
            data,
            output,
        } = raw;

        if signal.name.trim().is_empty() {
            return Err(CarteraError::invalid_parameter(
                "signal.name",
                "must not be empty",
            ));
        }
        let signal_type: SignalType = signal.signal_type.parse()?;
        let transform = transform_params(&signal, data.as_ref())?;
        let backtest = backtest_config(&backtest)?;

        Ok(Self {
            run_name: run_name.into(),
            signal_name: signal.name,
            signal_type,
            transform,
            backtest,
            data,
            output: output.unwrap_or_default(),
        })
    }

    /// Directory this run writes to: `<results_path>/<run_name>`.
    pub fn output_dir(&self) -> PathBuf {
        self.output.results_path.join(&self.run_name)
    }
}

fn positive(field: &str, value: i64) -> Result<usize> {
    usize::try_from(value)
        .ok()
        .filter(|v| *v > 0)
        .ok_or_else(|| {
            CarteraError::invalid_parameter(field, format!("must be positive, got {value}"))
        })
}

fn transform_params(signal: &SignalSection, data: Option<&DataSection>) -> Result<TransformParams> {
    let window_size = positive("signal.window_size", signal.window_size)?;
    let min_periods = match signal.min_periods {
        Some(m) => positive("signal.min_periods", m)?,
        None => window_size,
    };
    let shift = usize::try_from(signal.shift).map_err(|_| {
        CarteraError::invalid_parameter(
            "signal.shift",
            format!("must be non-negative, got {}", signal.shift),
        )
    })?;
    let direction = Direction::from_sign(signal.direction)?;

    let mut params = TransformParams::new(window_size)
        .with_min_periods(min_periods)
        .with_direction(direction)
        .with_shift(shift);
    if let Some(data) = data {
        params = params.with_keys(&data.asset_key, &data.date_key);
    }
    params.validate()?;
    Ok(params)
}

fn backtest_config(section: &BacktestSection) -> Result<BacktestConfig> {
    let mut constraints = ConstraintSet::from_tags(&section.constraints)?;
    if let Some([lower, upper]) = section.weight_bounds {
        constraints = constraints.with_bounds(lower, upper)?;
    }

    let mut config = BacktestConfig::new(constraints, section.gamma);
    if let Some(n) = section.n_cpus {
        config = config.with_n_cpus(positive("backtest.n_cpus", n)?);
    }
    if let Some(secs) = section.time_limit_secs {
        if !secs.is_finite() || secs <= 0.0 {
            return Err(CarteraError::invalid_parameter(
                "backtest.time_limit_secs",
                format!("must be positive and finite, got {secs}"),
            ));
        }
        config = config.with_time_limit(Duration::from_secs_f64(secs));
    }
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cartera_optimizer::Constraint;
    use cartera_traits::ErrorKind;

    const TOML: &str = r#"
[signal]
name = "idio_vol_22"
type = "idio_vol"
window_size = 22
direction = -1

[backtest]
constraints = ["FullInvestment", "LongOnly", "LongOnly"]
gamma = 400
n_cpus = 4
weight_bounds = [0.0, 0.05]
time_limit_secs = 2.5

[data]
path = "data/panel.parquet"
convert_returns_to_decimal = true
"#;

    fn raw() -> RawConfig {
        RawConfig::from_toml_str(TOML).unwrap()
    }

    #[test]
    fn test_parse_toml() {
        let raw = raw();
        assert_eq!(raw.signal.signal_type, "idio_vol");
        assert_eq!(raw.signal.min_periods, None);
        assert_eq!(raw.signal.shift, 0);
        let data = raw.data.unwrap();
        assert_eq!(data.asset_key, "barrid");
        assert!(data.convert_returns_to_decimal);
        assert!(!data.replace_zero_volume);
        assert!(raw.output.is_none());
    }

    #[test]
    fn test_parse_json() {
        let json = r#"{
            "signal": {"name": "rev", "type": "str", "window_size": 5},
            "backtest": {"constraints": ["NoBuyingOnMargin"], "gamma": 2.0}
        }"#;
        let config = PipelineConfig::from_sections(RawConfig::from_json_str(json).unwrap(), "rev")
            .unwrap();
        assert_eq!(config.signal_type, SignalType::ShortTermReversal);
        assert_eq!(config.transform.direction, Direction::Long);
        assert!(config.backtest.constraints.contains(&Constraint::NoLeverage));
    }

    #[test]
    fn test_validate_defaults_and_overrides() {
        let config = PipelineConfig::from_sections(raw(), "idio_vol_22").unwrap();
        assert_eq!(config.signal_type, SignalType::IdioVol);
        assert_eq!(config.transform.window_size, 22);
        assert_eq!(config.transform.min_periods, 22);
        assert_eq!(config.transform.direction, Direction::Short);
        assert_eq!(config.backtest.n_cpus, 4);
        assert_eq!(config.backtest.constraints.len(), 3);
        assert_eq!(config.backtest.time_limit, Some(Duration::from_millis(2500)));
        assert_eq!(
            config.output_dir(),
            PathBuf::from("results").join("idio_vol_22")
        );
    }

    #[test]
    fn test_unknown_signal_type() {
        let mut raw = raw();
        raw.signal.signal_type = "momentum".to_string();
        let err = PipelineConfig::from_sections(raw, "x").unwrap_err();
        assert!(matches!(err, CarteraError::UnknownSignal(ref s) if s == "momentum"));
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn test_unknown_constraint() {
        let mut raw = raw();
        raw.backtest.constraints.push("MaxTurnover".to_string());
        let err = PipelineConfig::from_sections(raw, "x").unwrap_err();
        assert!(matches!(err, CarteraError::UnknownConstraint(ref s) if s == "MaxTurnover"));
    }

    #[test]
    fn test_invalid_numbers_name_the_field() {
        let cases: Vec<(fn(&mut RawConfig), &str)> = vec![
            (|r: &mut RawConfig| r.signal.window_size = 0, "signal.window_size"),
            (|r: &mut RawConfig| r.signal.min_periods = Some(-2), "signal.min_periods"),
            (|r: &mut RawConfig| r.signal.direction = 2, "signal.direction"),
            (|r: &mut RawConfig| r.signal.shift = -1, "signal.shift"),
            (|r: &mut RawConfig| r.backtest.gamma = 0.0, "backtest.gamma"),
            (|r: &mut RawConfig| r.backtest.n_cpus = Some(0), "backtest.n_cpus"),
            (|r: &mut RawConfig| r.backtest.weight_bounds = Some([0.5, 0.1]), "backtest.weight_bounds"),
            (|r: &mut RawConfig| r.backtest.time_limit_secs = Some(-1.0), "backtest.time_limit_secs"),
        ];
        for (mutate, expected) in cases {
            let mut raw = raw();
            mutate(&mut raw);
            match PipelineConfig::from_sections(raw, "x") {
                Err(CarteraError::InvalidParameter { field, .. }) => assert_eq!(field, expected),
                other => panic!("expected invalid {expected}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_malformed_file() {
        let err = RawConfig::from_toml_str("[signal]\nname = 1").unwrap_err();
        assert!(matches!(err, CarteraError::ConfigParse(_)));
    }

    #[test]
    fn test_shipped_configs_validate() {
        let toml = RawConfig::from_toml_str(include_str!("../../../configs/idio_vol_22.toml"))
            .unwrap();
        let config = PipelineConfig::from_sections(toml, "idio_vol_22").unwrap();
        assert_eq!(config.transform.shift, 1);
        assert_eq!(config.backtest.constraints.len(), 3);

        let json =
            RawConfig::from_json_str(include_str!("../../../configs/str_22_zero_beta.json"))
                .unwrap();
        let config = PipelineConfig::from_sections(json, "str_22_zero_beta").unwrap();
        assert!(config.backtest.constraints.uses_beta());
        assert_eq!(config.transform.min_periods, 15);
    }

    #[test]
    fn test_load_uses_file_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("str_22_low_quality.toml");
        std::fs::write(&path, TOML).unwrap();
        let config = PipelineConfig::load(&path).unwrap();
        assert_eq!(config.run_name, "str_22_low_quality");
    }
}
