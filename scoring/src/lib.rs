//! Attaches evaluator scores to the children of corpus boards and streams them out as training records.

pub mod batch;
pub mod evaluator;
pub mod options;
pub mod pipeline;
pub mod record;

pub use batch::*;
pub use evaluator::*;
pub use options::*;
pub use pipeline::*;
pub use record::*;

use anyhow::{anyhow, Result};
use log::info;

/// Builds the configured evaluator and runs the scoring pipeline with it.
pub async fn run_score_children(options: &ScoreChildrenOptions) -> Result<ScoreSummary> {
    let pipeline_options = options.pipeline_options();

    info!(
        "Scoring {:?} into {:?} with the {:?} evaluator",
        options.input_file, options.output_file, options.evaluator
    );

    match options.evaluator {
        EvaluatorKind::Material => {
            score_children(
                &options.input_file,
                &options.output_file,
                MaterialEvaluator,
                &pipeline_options,
            )
            .await
        }
        EvaluatorKind::Http => {
            let url = options
                .evaluator_url
                .clone()
                .ok_or_else(|| anyhow!("The http evaluator requires evaluator_url"))?;
            let evaluator = HttpEvaluator::new(url, options.evaluator_timeout)?;

            score_children(
                &options.input_file,
                &options.output_file,
                evaluator,
                &pipeline_options,
            )
            .await
        }
    }
}
