// src/plot.rs
//
// Plot view of a tabular history.
//
// Rendering is left to whoever consumes the JSON: this only decides which
// columns are drawn and how. The action column becomes a scatter series and
// every other selected column a line series, all against the step index.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SimResult;
use crate::table::Table;

pub const DEFAULT_ALPHA: f64 = 0.7;

/// Which columns to draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlotColumns {
    /// Every column except `done`.
    All,
    /// The listed columns that exist in the table, in table order.
    List(Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesKind {
    Line,
    Scatter,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub column: String,
    pub kind: SeriesKind,
    /// Palette index, one per series.
    pub colour: usize,
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotSpec {
    pub x_label: String,
    pub alpha: f64,
    pub x: Vec<usize>,
    pub series: Vec<Series>,
}

impl PlotSpec {
    pub fn from_table(table: &Table, columns: &PlotColumns) -> Self {
        let selected: Vec<usize> = table
            .columns()
            .iter()
            .enumerate()
            .filter(|(_, name)| match columns {
                PlotColumns::All => name.as_str() != "done",
                PlotColumns::List(wanted) => wanted.contains(*name),
            })
            .map(|(i, _)| i)
            .collect();

        let series = selected
            .iter()
            .enumerate()
            .map(|(colour, &idx)| {
                let column = table.columns()[idx].clone();
                let kind = if column == "action" {
                    SeriesKind::Scatter
                } else {
                    SeriesKind::Line
                };
                Series {
                    column,
                    kind,
                    colour,
                    values: table.rows().iter().map(|r| r[idx].clone()).collect(),
                }
            })
            .collect();

        Self {
            x_label: "step".to_string(),
            alpha: DEFAULT_ALPHA,
            x: (0..table.len()).collect(),
            series,
        }
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha.clamp(0.0, 1.0);
        self
    }

    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> SimResult<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}
