//! Row-major feature table handed to the scorer.

use crate::features::{Cell, FeatureVector, CANONICAL_FEATURES};

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl FeatureTable {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        debug_assert!(rows.iter().all(|r| r.len() == columns.len()));
        Self { columns, rows }
    }

    /// One row per vector, columns in canonical order.
    pub fn from_vectors(vectors: Vec<FeatureVector>) -> Self {
        let columns = CANONICAL_FEATURES.iter().map(|c| c.to_string()).collect();
        let rows = vectors.into_iter().map(FeatureVector::into_values).collect();
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub(crate) fn into_parts(self) -> (Vec<String>, Vec<Vec<Cell>>) {
        (self.columns, self.rows)
    }

    /// Flatten into a row-major `f32` buffer for numeric backends.
    ///
    /// [`Cell::Missing`] becomes `NaN`. Fails on the first text cell.
    pub fn to_f32_row_major(&self) -> anyhow::Result<Vec<f32>> {
        let mut out = Vec::with_capacity(self.n_rows() * self.n_cols());
        for (row_idx, row) in self.rows.iter().enumerate() {
            for (col_idx, cell) in row.iter().enumerate() {
                match cell {
                    Cell::Number(v) => out.push(*v as f32),
                    Cell::Missing => out.push(f32::NAN),
                    Cell::Text(_) => anyhow::bail!(
                        "non-numeric value {} in column '{}' (row {})",
                        cell,
                        self.columns[col_idx],
                        row_idx
                    ),
                }
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::encode_batch;
    use crate::features::tests::sample_record;
    use crate::features::ClientRecord;
    use serde_json::Value;

    fn table(rows: Vec<Vec<Cell>>) -> FeatureTable {
        FeatureTable::new(vec!["a".into(), "b".into()], rows)
    }

    #[test]
    fn numeric_table_flattens_row_major() {
        let t = table(vec![
            vec![Cell::Number(1.0), Cell::Number(2.0)],
            vec![Cell::Number(3.0), Cell::Number(4.0)],
        ]);
        assert_eq!(t.to_f32_row_major().unwrap(), vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(t.column_index("b"), Some(1));
    }

    #[test]
    fn text_cell_names_its_column() {
        let t = table(vec![vec![Cell::Number(1.0), Cell::Text("M".into())]]);
        let err = t.to_f32_row_major().unwrap_err().to_string();
        assert!(err.contains("column 'b'"), "{err}");
    }

    #[test]
    fn missing_cell_becomes_nan() {
        let t = table(vec![vec![Cell::Missing, Cell::Number(1.0)]]);
        let data = t.to_f32_row_major().unwrap();
        assert!(data[0].is_nan());
        assert_eq!(data[1], 1.0);
    }

    #[test]
    fn unmapped_gender_survives_numeric_conversion() {
        let mut known = sample_record().fields().clone();
        let mut unknown = known.clone();
        if let Some(Value::Object(personal)) = unknown.get_mut("personal") {
            personal.insert("gender".into(), "unknown".into());
        }
        if let Some(Value::Object(personal)) = known.get_mut("personal") {
            personal.insert("gender".into(), "F".into());
        }
        let vectors = [known, unknown]
            .into_iter()
            .map(|fields| FeatureVector::from_record(&ClientRecord::from_map(fields)).unwrap())
            .collect();
        let encoded = encode_batch(FeatureTable::from_vectors(vectors));
        assert_eq!(encoded.gaps.len(), 1);
        assert_eq!(encoded.gaps[0].row, 1);

        let data = encoded.table.to_f32_row_major().unwrap();
        let width = encoded.table.n_cols();
        let gender = encoded.table.column_index("gender").unwrap();
        assert_eq!(data.len(), 2 * width);
        assert_eq!(data[gender], 1.0);
        assert!(data[width + gender].is_nan());
    }
}
