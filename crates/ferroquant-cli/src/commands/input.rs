//! JSON input files supplied by the caller.
//!
//! Layouts:
//! - bars: `{"symbol": "sh.600519", "bars": [{"date", "open", "high", "low", "close", "volume"}]}`
//! - fundamentals: `{"symbol": ..., "snapshots": [FundamentalSnapshot]}`
//! - valuation snapshots: `{"symbol": ..., "snapshots": [ValuationSnapshot]}`
//! - peers: `[PeerValuation]`
//! - universe: a directory of bar files, or one file holding an array of them

use std::fs;
use std::path::{Path, PathBuf};

use ferroquant_core::{
    BarSeries, FundamentalHistory, FundamentalSnapshot, PeerValuation, Symbol, ValuationSnapshot,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::CliError;

#[derive(Debug, Deserialize)]
struct FundamentalsFile {
    symbol: Symbol,
    snapshots: Vec<FundamentalSnapshot>,
}

#[derive(Debug, Deserialize)]
pub struct ValuationFile {
    pub symbol: Symbol,
    pub snapshots: Vec<ValuationSnapshot>,
}

pub fn load_bars(path: &Path) -> Result<BarSeries, CliError> {
    read_json(path)
}

pub fn load_fundamentals(path: &Path) -> Result<FundamentalHistory, CliError> {
    let file: FundamentalsFile = read_json(path)?;
    let history = FundamentalHistory::new(file.symbol, file.snapshots)?;
    if history.snapshots().is_empty() {
        tracing::warn!(path = %path.display(), "no snapshots match the file symbol");
    }
    Ok(history)
}

pub fn load_valuation_snapshots(path: &Path) -> Result<ValuationFile, CliError> {
    let mut file: ValuationFile = read_json(path)?;
    file.snapshots.sort_by_key(|snapshot| snapshot.date);
    Ok(file)
}

pub fn load_peers(path: &Path) -> Result<Vec<PeerValuation>, CliError> {
    read_json(path)
}

/// Every `*.json` file in a directory (sorted by name), or the array held
/// by a single file.
pub fn load_universe(path: &Path) -> Result<Vec<BarSeries>, CliError> {
    if !path.is_dir() {
        return read_json(path);
    }

    let mut files: Vec<PathBuf> = fs::read_dir(path)?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<Result<_, _>>()?;
    files.retain(|file| file.extension().is_some_and(|ext| ext == "json"));
    files.sort();

    if files.is_empty() {
        return Err(CliError::Input(format!(
            "no .json bar files in {}",
            path.display()
        )));
    }

    files.iter().map(|file| load_bars(file)).collect()
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let raw = fs::read_to_string(path).map_err(|error| {
        CliError::Input(format!("cannot read {}: {error}", path.display()))
    })?;
    tracing::debug!(path = %path.display(), bytes = raw.len(), "loaded input file");
    serde_json::from_str(&raw)
        .map_err(|error| CliError::Input(format!("invalid input {}: {error}", path.display())))
}
