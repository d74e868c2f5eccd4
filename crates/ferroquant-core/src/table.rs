//! Outbound tabular contract handed to the formatting collaborator.
//!
//! Column names are stable for a given indicator/metric set so downstream
//! rendering stays mechanical.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{TradingDate, ValidationError};

/// One table cell. `Undefined` serializes as JSON `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
    Undefined,
}

impl Cell {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }
}

impl From<Option<f64>> for Cell {
    fn from(value: Option<f64>) -> Self {
        match value {
            Some(value) if value.is_finite() => Self::Number(value),
            _ => Self::Undefined,
        }
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Self::from(Some(value))
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<TradingDate> for Cell {
    fn from(value: TradingDate) -> Self {
        Self::Text(value.to_string())
    }
}

/// Ordered rows under a fixed column list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<Cell>) -> Result<(), ValidationError> {
        if row.len() != self.columns.len() {
            return Err(ValidationError::RowWidth {
                expected: self.columns.len(),
                actual: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&Cell> {
        let index = self.column_index(column)?;
        self.rows.get(row).and_then(|cells| cells.get(index))
    }

    /// Keep only the last `n` rows.
    pub fn tail(mut self, n: usize) -> Self {
        if self.rows.len() > n {
            self.rows.drain(..self.rows.len() - n);
        }
        self
    }

    /// Round every numeric cell to `digits` decimal places.
    pub fn rounded(mut self, digits: u32) -> Self {
        let factor = 10f64.powi(digits as i32);
        for cell in self.rows.iter_mut().flatten() {
            if let Cell::Number(value) = cell {
                *value = (*value * factor).round() / factor;
            }
        }
        self
    }
}

/// Per-date values of named series (indicators or moving averages).
///
/// A value is `None` until its lookback window is satisfied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorTable {
    pub columns: Vec<String>,
    pub rows: Vec<IndicatorRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRow {
    pub date: TradingDate,
    pub close: f64,
    pub values: BTreeMap<String, Option<f64>>,
}

impl IndicatorTable {
    /// Rows for every `(date, close)` with no columns yet.
    pub fn with_axis(axis: impl IntoIterator<Item = (TradingDate, f64)>) -> Self {
        Self {
            columns: Vec::new(),
            rows: axis
                .into_iter()
                .map(|(date, close)| IndicatorRow {
                    date,
                    close,
                    values: BTreeMap::new(),
                })
                .collect(),
        }
    }

    /// Attach a full-length column; `values.len()` must equal the row count.
    pub(crate) fn insert_column(&mut self, name: &str, values: Vec<Option<f64>>) {
        debug_assert_eq!(values.len(), self.rows.len());
        if !self.columns.iter().any(|column| column == name) {
            self.columns.push(name.to_owned());
        }
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.values.insert(name.to_owned(), value);
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// `None` when the column is unknown, `Some(None)` when undefined at `index`.
    pub fn value(&self, index: usize, column: &str) -> Option<Option<f64>> {
        self.rows
            .get(index)
            .and_then(|row| row.values.get(column))
            .copied()
    }

    pub fn value_at(&self, date: TradingDate, column: &str) -> Option<Option<f64>> {
        let index = self.rows.iter().position(|row| row.date == date)?;
        self.value(index, column)
    }

    pub fn column(&self, name: &str) -> Option<Vec<Option<f64>>> {
        if !self.columns.iter().any(|column| column == name) {
            return None;
        }
        Some(
            self.rows
                .iter()
                .map(|row| row.values.get(name).copied().flatten())
                .collect(),
        )
    }

    pub fn latest(&self, column: &str) -> Option<f64> {
        self.rows
            .last()
            .and_then(|row| row.values.get(column).copied().flatten())
    }

    /// Flatten into `date, close, <columns…>` rows.
    pub fn to_table(&self) -> Table {
        let mut table = Table::new(
            ["date", "close"]
                .into_iter()
                .map(String::from)
                .chain(self.columns.iter().cloned()),
        );
        for row in &self.rows {
            let mut cells = Vec::with_capacity(self.columns.len() + 2);
            cells.push(Cell::from(row.date));
            cells.push(Cell::from(row.close));
            cells.extend(
                self.columns
                    .iter()
                    .map(|column| Cell::from(row.values.get(column).copied().flatten())),
            );
            table.rows.push(cells);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn axis() -> Vec<(TradingDate, f64)> {
        ["2024-01-02", "2024-01-03", "2024-01-04"]
            .iter()
            .zip([10.0, 11.0, 12.0])
            .map(|(date, close)| (TradingDate::parse(date).expect("date"), close))
            .collect()
    }

    #[test]
    fn undefined_cells_serialize_as_null() {
        let mut table = IndicatorTable::with_axis(axis());
        table.insert_column("SMA_2", vec![None, Some(10.5), Some(11.5)]);

        let json = serde_json::to_value(table.to_table()).expect("json");
        assert_eq!(json["columns"][2], "SMA_2");
        assert!(json["rows"][0][2].is_null());
        assert_eq!(json["rows"][1][2], 10.5);
    }

    #[test]
    fn tail_and_round() {
        let mut table = Table::new(["value"]);
        for value in [1.234_56, 2.345_67, 3.456_78] {
            table.push_row(vec![Cell::from(value)]).expect("row");
        }
        let table = table.tail(2).rounded(2);
        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(0, "value"), Some(&Cell::Number(2.35)));
    }

    #[test]
    fn rejects_ragged_rows() {
        let mut table = Table::new(["a", "b"]);
        let err = table.push_row(vec![Cell::Undefined]).expect_err("must fail");
        assert!(matches!(err, ValidationError::RowWidth { expected: 2, actual: 1 }));
    }

    #[test]
    fn distinguishes_unknown_from_undefined() {
        let mut table = IndicatorTable::with_axis(axis());
        table.insert_column("ATR", vec![None, None, Some(1.0)]);
        assert_eq!(table.value(0, "ATR"), Some(None));
        assert_eq!(table.value(0, "CCI"), None);
        assert_eq!(table.latest("ATR"), Some(1.0));
    }
}
