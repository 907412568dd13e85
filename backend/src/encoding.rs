//! Categorical encoding applied to batch feature tables.
//!
//! Single-record prediction never encodes; see [`EncodingPolicy`].

use serde::{Deserialize, Serialize};

use crate::features::Cell;
use crate::table::FeatureTable;

/// Binary-coded category column.
pub const GENDER_COLUMN: &str = "gender";

/// Explicit code table for [`GENDER_COLUMN`].
pub const GENDER_CODES: [(&str, f64); 2] = [("M", 0.0), ("F", 1.0)];

/// Multi-valued category column, one-hot expanded.
pub const POSITION_COLUMN: &str = "dp_ewb_last_employment_position";

/// Closed vocabulary for [`POSITION_COLUMN`]; indicator columns follow this order.
pub const POSITION_VOCABULARY: [&str; 9] = [
    "accountant",
    "director",
    "driver",
    "engineer",
    "head",
    "manager",
    "sales",
    "specialist",
    "worker",
];

/// Whether a prediction path recodes categorical columns before scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingPolicy {
    /// Cells reach the scorer exactly as flattened.
    None,
    /// Gender is coded and the position column one-hot expanded.
    Batch,
}

/// A categorical value the encoder had no mapping for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodingGap {
    pub row: usize,
    pub column: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EncodedTable {
    pub table: FeatureTable,
    pub gaps: Vec<EncodingGap>,
}

impl EncodingPolicy {
    pub fn apply(self, table: FeatureTable) -> EncodedTable {
        match self {
            EncodingPolicy::None => EncodedTable {
                table,
                gaps: Vec::new(),
            },
            EncodingPolicy::Batch => encode_batch(table),
        }
    }
}

pub fn position_indicator_columns() -> Vec<String> {
    POSITION_VOCABULARY
        .iter()
        .map(|category| format!("{POSITION_COLUMN}_{category}"))
        .collect()
}

fn gender_code(label: &str) -> Option<f64> {
    let label = label.trim();
    GENDER_CODES
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(label))
        .map(|(_, code)| *code)
}

fn position_slot(label: &str) -> Option<usize> {
    let label = label.trim();
    POSITION_VOCABULARY
        .iter()
        .position(|known| known.eq_ignore_ascii_case(label))
}

/// Recode the categorical columns of a batch table.
///
/// The output column set depends only on the input column set, never on the
/// values observed in the batch. Unmapped values become [`Cell::Missing`]
/// (gender) or all-zero indicators (position) and are reported as gaps.
pub fn encode_batch(table: FeatureTable) -> EncodedTable {
    let gender_idx = table.column_index(GENDER_COLUMN);
    let position_idx = table.column_index(POSITION_COLUMN);
    let (columns, rows) = table.into_parts();
    let mut gaps = Vec::new();

    let mut out_columns = Vec::with_capacity(columns.len() + POSITION_VOCABULARY.len());
    for (idx, name) in columns.into_iter().enumerate() {
        if Some(idx) == position_idx {
            out_columns.extend(position_indicator_columns());
        } else {
            out_columns.push(name);
        }
    }

    let mut out_rows = Vec::with_capacity(rows.len());
    for (row_idx, row) in rows.into_iter().enumerate() {
        let mut out = Vec::with_capacity(out_columns.len());
        for (idx, cell) in row.into_iter().enumerate() {
            if Some(idx) == gender_idx {
                out.push(encode_gender(row_idx, cell, &mut gaps));
            } else if Some(idx) == position_idx {
                out.extend(encode_position(row_idx, cell, &mut gaps));
            } else {
                out.push(cell);
            }
        }
        out_rows.push(out);
    }

    if !gaps.is_empty() {
        log::warn!("{} categorical value(s) had no encoding", gaps.len());
    }

    EncodedTable {
        table: FeatureTable::new(out_columns, out_rows),
        gaps,
    }
}

fn encode_gender(row: usize, cell: Cell, gaps: &mut Vec<EncodingGap>) -> Cell {
    match cell {
        Cell::Text(label) => match gender_code(&label) {
            Some(code) => Cell::Number(code),
            None => {
                gaps.push(EncodingGap {
                    row,
                    column: GENDER_COLUMN.to_string(),
                    value: label,
                });
                Cell::Missing
            }
        },
        // already coded upstream
        other => other,
    }
}

fn encode_position(row: usize, cell: Cell, gaps: &mut Vec<EncodingGap>) -> Vec<Cell> {
    let mut indicators = vec![Cell::Number(0.0); POSITION_VOCABULARY.len()];
    let slot = match &cell {
        Cell::Text(label) => position_slot(label),
        _ => None,
    };
    match slot {
        Some(slot) => indicators[slot] = Cell::Number(1.0),
        None => gaps.push(EncodingGap {
            row,
            column: POSITION_COLUMN.to_string(),
            value: match cell {
                Cell::Text(label) => label,
                other => other.to_string(),
            },
        }),
    }
    indicators
}
