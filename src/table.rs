// src/table.rs
//
// Flat row-per-step table produced from a History, plus its encoders.
//
// Cells are JSON values so one table can hold bool, integer, float, array and
// null cells side by side. Two encodings are provided:
// - columnar JSON (column names + one array per column), used for trajectories
// - CSV with a header row, used for summaries

use std::io::Write;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{SimError, SimResult};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

/// Column-major encoding of a [`Table`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnarTable {
    pub columns: Vec<String>,
    pub data: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row; its width must match the header.
    pub fn push_row(&mut self, row: Vec<Value>) -> SimResult<()> {
        if row.len() != self.columns.len() {
            return Err(SimError::InvalidParameter {
                name: "row".to_string(),
                reason: format!(
                    "row {} has {} cells, table has {} columns",
                    self.rows.len(),
                    row.len(),
                    self.columns.len()
                ),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// All cells of one column, top to bottom.
    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| &r[idx]).collect())
    }

    pub fn to_columnar(&self) -> ColumnarTable {
        let data = (0..self.columns.len())
            .map(|i| self.rows.iter().map(|r| r[i].clone()).collect())
            .collect();
        ColumnarTable {
            columns: self.columns.clone(),
            data,
        }
    }

    pub fn write_columnar_json<W: Write>(&self, writer: W) -> SimResult<()> {
        serde_json::to_writer_pretty(writer, &self.to_columnar())?;
        Ok(())
    }

    /// Write a header row and one line per row.
    pub fn write_csv<W: Write>(&self, mut writer: W) -> SimResult<()> {
        let header: Vec<String> = self.columns.iter().map(|c| csv_field(c)).collect();
        writeln!(writer, "{}", header.join(","))?;
        for row in &self.rows {
            let line: Vec<String> = row.iter().map(|v| csv_field(&csv_cell(v))).collect();
            writeln!(writer, "{}", line.join(","))?;
        }
        Ok(())
    }
}

impl From<ColumnarTable> for Table {
    fn from(columnar: ColumnarTable) -> Self {
        let n_rows = columnar.data.iter().map(Vec::len).max().unwrap_or(0);
        let rows = (0..n_rows)
            .map(|r| {
                columnar
                    .data
                    .iter()
                    .map(|col| col.get(r).cloned().unwrap_or(Value::Null))
                    .collect()
            })
            .collect();
        Self {
            columns: columnar.columns,
            rows,
        }
    }
}

fn csv_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn csv_field(raw: &str) -> String {
    if raw.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Table {
        let mut t = Table::new(vec!["action".into(), "reward".into(), "note".into()]);
        t.push_row(vec![Value::Null, Value::Null, json!("start")]).unwrap();
        t.push_row(vec![json!(1), json!(0.5), json!("a,b")]).unwrap();
        t.push_row(vec![json!([0, 2]), json!(1.0), json!("say \"hi\"")])
            .unwrap();
        t
    }

    #[test]
    fn test_push_row_checks_width() {
        let mut t = Table::new(vec!["a".into()]);
        assert!(t.push_row(vec![json!(1), json!(2)]).is_err());
        assert!(t.is_empty());
    }

    #[test]
    fn test_column_lookup() {
        let t = sample();
        let rewards = t.column("reward").unwrap();
        assert_eq!(rewards, vec![&Value::Null, &json!(0.5), &json!(1.0)]);
        assert!(t.column("missing").is_none());
    }

    #[test]
    fn test_columnar_layout() {
        let t = sample();
        let c = t.to_columnar();
        assert_eq!(c.columns, t.columns());
        assert_eq!(c.data.len(), 3);
        assert_eq!(c.data[0], vec![Value::Null, json!(1), json!([0, 2])]);
        assert_eq!(Table::from(c), t);
    }

    #[test]
    fn test_csv_quoting_and_nulls() {
        let mut buf = Vec::new();
        sample().write_csv(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "action,reward,note");
        assert_eq!(lines[1], ",,start");
        assert_eq!(lines[2], "1,0.5,\"a,b\"");
        assert_eq!(lines[3], "\"[0,2]\",1.0,\"say \"\"hi\"\"\"");
    }
}
