use std::path::{Path, PathBuf};

use ::anyhow::Context;
use tract_onnx::prelude::*;

use crate::predictor::{Scorer, ScorerOutput};
use crate::table::FeatureTable;

type OnnxPlan = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Regression model exported to ONNX, evaluated with tract.
pub struct OnnxScorer {
    model: OnnxPlan,
    path: PathBuf,
}

impl OnnxScorer {
    /// Load and optimise the model once. A missing file is a startup error.
    pub fn load<P: AsRef<Path>>(model_path: P) -> ::anyhow::Result<Self> {
        let path = model_path.as_ref().to_path_buf();
        if !path.is_file() {
            ::anyhow::bail!("model file not found: {}", path.display());
        }

        let model = tract_onnx::onnx()
            .model_for_path(&path)
            .with_context(|| format!("failed to read ONNX model {}", path.display()))?
            .into_optimized()?
            .into_runnable()?;

        Ok(Self { model, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Scorer for OnnxScorer {
    /// Runs the whole table as a single `[rows, cols]` f32 tensor.
    fn predict(&self, table: &FeatureTable) -> ::anyhow::Result<ScorerOutput> {
        let data = table.to_f32_row_major()?;
        let input = Tensor::from_shape(&[table.n_rows(), table.n_cols()], &data)?;
        let outputs = self.model.run(tvec!(input.into()))?;

        let first = outputs
            .first()
            .ok_or_else(|| ::anyhow::anyhow!("model produced no outputs"))?;
        let values: Vec<f64> = first
            .to_array_view::<f32>()?
            .iter()
            .map(|v| f64::from(*v))
            .collect();

        Ok(ScorerOutput::Sequence(values))
    }

    fn describe(&self) -> String {
        format!("onnx model at {}", self.path.display())
    }
}
