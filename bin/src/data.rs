//! Panel loading and cleaning for the Cartera CLI.

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result, bail};
use cartera::{DataSection, Panel, columns};
use polars::prelude::*;
use tracing::{debug, info};

/// Load, clean and validate the panel described by `section`.
pub(crate) fn load_panel(section: &DataSection) -> Result<Panel> {
    let df = read_frame(&section.path)?;
    info!(path = %section.path.display(), rows = df.height(), "Loaded panel");

    let df = prepare(df, section)?;
    validate(&df, section)?;
    Ok(Panel::new(df))
}

/// Read a parquet or CSV file.
pub(crate) fn read_frame(path: &Path) -> Result<DataFrame> {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    let df = match ext.as_str() {
        "parquet" | "pq" => {
            let file =
                File::open(path).with_context(|| format!("opening {}", path.display()))?;
            ParquetReader::new(file).finish()?
        }
        "csv" => CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()?,
        other => bail!("unsupported data format `{other}` for {}", path.display()),
    };
    Ok(df)
}

/// Apply the configured cleaning steps.
///
/// Percent-scaled `return`, `specific_return` and `specific_risk` are divided
/// by 100 when requested; zero `daily_volume` becomes null.
pub(crate) fn prepare(df: DataFrame, section: &DataSection) -> Result<DataFrame> {
    let has = |name: &str| df.get_column_names().iter().any(|c| c.as_str() == name);
    let mut exprs = Vec::new();

    if section.convert_returns_to_decimal {
        for name in [
            columns::RETURN,
            columns::SPECIFIC_RETURN,
            columns::SPECIFIC_RISK,
        ] {
            if has(name) {
                exprs.push((col(name).cast(DataType::Float64) / lit(100.0)).alias(name));
            }
        }
    }
    if section.replace_zero_volume && has(columns::DAILY_VOLUME) {
        exprs.push(
            when(col(columns::DAILY_VOLUME).eq(lit(0)))
                .then(lit(NULL))
                .otherwise(col(columns::DAILY_VOLUME))
                .alias(columns::DAILY_VOLUME),
        );
    }

    if exprs.is_empty() {
        return Ok(df);
    }
    debug!(steps = exprs.len(), "Cleaning panel");
    Ok(df.lazy().with_columns(exprs).collect()?)
}

/// Reject empty panels and panels missing the key or core columns.
pub(crate) fn validate(df: &DataFrame, section: &DataSection) -> Result<()> {
    if df.height() == 0 {
        bail!("panel {} is empty", section.path.display());
    }
    let required = [
        section.date_key.as_str(),
        section.asset_key.as_str(),
        columns::RETURN,
        columns::SPECIFIC_RISK,
    ];
    for name in required {
        if !df.get_column_names().iter().any(|c| c.as_str() == name) {
            bail!(
                "panel {} is missing required column `{name}`",
                section.path.display()
            );
        }
    }
    Ok(())
}

/// Write a DataFrame to parquet.
pub(crate) fn write_parquet(df: &mut DataFrame, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    ParquetWriter::new(file).finish(df)?;
    Ok(())
}
