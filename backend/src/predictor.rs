//! Prediction dispatch: records in, income estimates out.

use std::sync::Arc;

use crate::encoding::{EncodingGap, EncodingPolicy};
use crate::error::PredictionError;
use crate::features::{ClientRecord, FeatureVector};
use crate::table::FeatureTable;

/// Placeholder income returned when no scorer is configured.
pub const DEFAULT_PLACEHOLDER_INCOME: f64 = 52.0;

/// What a scorer hands back for a table.
#[derive(Debug, Clone, PartialEq)]
pub enum ScorerOutput {
    Scalar(f64),
    Sequence(Vec<f64>),
}

/// A trained regression model.
///
/// Implementations must be side-effect free; one instance is shared by every
/// worker thread for the lifetime of the process.
pub trait Scorer: Send + Sync {
    fn predict(&self, table: &FeatureTable) -> anyhow::Result<ScorerOutput>;

    /// Short human readable description for the info endpoint.
    fn describe(&self) -> String {
        "custom scorer".to_string()
    }
}

impl<F> Scorer for F
where
    F: Fn(&FeatureTable) -> anyhow::Result<ScorerOutput> + Send + Sync,
{
    fn predict(&self, table: &FeatureTable) -> anyhow::Result<ScorerOutput> {
        self(table)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchPrediction {
    pub incomes: Vec<f64>,
    pub gaps: Vec<EncodingGap>,
}

impl BatchPrediction {
    pub fn total_count(&self) -> usize {
        self.incomes.len()
    }
}

#[derive(Clone)]
pub struct Predictor {
    scorer: Option<Arc<dyn Scorer>>,
    placeholder: f64,
}

impl Predictor {
    pub fn new(scorer: Option<Arc<dyn Scorer>>, placeholder: f64) -> Self {
        Self {
            scorer,
            placeholder,
        }
    }

    pub fn with_scorer(scorer: Arc<dyn Scorer>) -> Self {
        Self::new(Some(scorer), DEFAULT_PLACEHOLDER_INCOME)
    }

    pub fn placeholder_only(placeholder: f64) -> Self {
        Self::new(None, placeholder)
    }

    pub fn has_scorer(&self) -> bool {
        self.scorer.is_some()
    }

    pub fn placeholder(&self) -> f64 {
        self.placeholder
    }

    pub fn scorer_description(&self) -> Option<String> {
        self.scorer.as_ref().map(|s| s.describe())
    }

    /// Predict income for one client. No categorical encoding is applied.
    ///
    /// Category labels reach the scorer as text, so a numeric backend such as
    /// ONNX needs `gender` and the employment position sent as numeric codes here.
    pub fn predict(&self, record: &ClientRecord) -> Result<f64, PredictionError> {
        let vector = FeatureVector::from_record(record)?;
        let table = EncodingPolicy::None
            .apply(FeatureTable::from_vectors(vec![vector]))
            .table;

        let Some(scorer) = &self.scorer else {
            return Ok(self.placeholder);
        };

        let output = scorer
            .predict(&table)
            .map_err(|source| PredictionError::Scorer {
                context: "income prediction failed",
                source,
            })?;
        let income = match output {
            ScorerOutput::Scalar(v) => v,
            ScorerOutput::Sequence(values) => values.first().copied().ok_or_else(|| {
                PredictionError::InvalidOutput("scorer returned no values".to_string())
            })?,
        };
        ensure_finite(0, income)?;
        Ok(income)
    }

    /// Predict income for every client, in input order. All-or-nothing.
    pub fn predict_batch(&self, records: &[ClientRecord]) -> Result<BatchPrediction, PredictionError> {
        let vectors = records
            .iter()
            .map(FeatureVector::from_record)
            .collect::<Result<Vec<_>, _>>()?;
        if vectors.is_empty() {
            return Ok(BatchPrediction {
                incomes: Vec::new(),
                gaps: Vec::new(),
            });
        }

        let encoded = EncodingPolicy::Batch.apply(FeatureTable::from_vectors(vectors));

        let Some(scorer) = &self.scorer else {
            return Ok(BatchPrediction {
                incomes: vec![self.placeholder; records.len()],
                gaps: encoded.gaps,
            });
        };

        let output = scorer
            .predict(&encoded.table)
            .map_err(|source| PredictionError::Scorer {
                context: "batch income prediction failed",
                source,
            })?;
        let incomes = match output {
            ScorerOutput::Sequence(values) if values.len() == records.len() => values,
            ScorerOutput::Scalar(v) if records.len() == 1 => vec![v],
            ScorerOutput::Sequence(values) => {
                return Err(PredictionError::InvalidOutput(format!(
                    "scorer returned {} values for {} clients",
                    values.len(),
                    records.len()
                )))
            }
            ScorerOutput::Scalar(_) => {
                return Err(PredictionError::InvalidOutput(format!(
                    "scorer returned a single value for {} clients",
                    records.len()
                )))
            }
        };
        for (idx, income) in incomes.iter().enumerate() {
            ensure_finite(idx, *income)?;
        }

        Ok(BatchPrediction {
            incomes,
            gaps: encoded.gaps,
        })
    }
}

fn ensure_finite(idx: usize, value: f64) -> Result<(), PredictionError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(PredictionError::InvalidOutput(format!(
            "non-finite prediction {value} for client {idx}"
        )))
    }
}
