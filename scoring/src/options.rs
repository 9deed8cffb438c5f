use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use common::{Config, ConfigLoader, Value};
use engine::FieldSelection;

use super::PipelineOptions;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EvaluatorKind {
    Material,
    Http,
}

impl FromStr for EvaluatorKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "material" => Ok(EvaluatorKind::Material),
            "http" => Ok(EvaluatorKind::Http),
            other => bail!("Unknown evaluator '{}', expected 'material' or 'http'", other),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ScoreChildrenOptions {
    pub input_file: PathBuf,
    pub output_file: PathBuf,
    pub fen_fields: FieldSelection,
    pub batch_size: usize,
    pub workers: usize,
    pub print_interval: usize,
    pub evaluator: EvaluatorKind,
    pub evaluator_url: Option<String>,
    /// `None` waits on the evaluator indefinitely.
    pub evaluator_timeout: Option<Duration>,
}

impl Config for ScoreChildrenOptions {
    fn load(config: &ConfigLoader) -> Result<Self> {
        let fen_fields = config.get_list_of("fen_fields", Value::as_string)?;
        let fen_fields = if fen_fields.is_empty() {
            FieldSelection::default()
        } else {
            FieldSelection::parse(&fen_fields)?
        };

        let evaluator = config
            .get("evaluator")
            .and_then(|v| v.as_string())
            .map(|v| v.parse::<EvaluatorKind>())
            .transpose()?
            .unwrap_or(EvaluatorKind::Material);

        let evaluator_url = config.get("evaluator_url").and_then(|v| v.as_string());
        if evaluator == EvaluatorKind::Http && evaluator_url.is_none() {
            bail!("The http evaluator requires evaluator_url");
        }

        let timeout_ms = usize_or(config, "evaluator_timeout_ms", 10_000)?;

        Ok(Self {
            input_file: config.get_relative_path("input_file")?,
            output_file: config.get_relative_path("output_file")?,
            fen_fields,
            batch_size: positive_usize_or(config, "batch_size", 200)?,
            workers: positive_usize_or(config, "workers", 5)?,
            print_interval: usize_or(config, "print_interval", 100)?,
            evaluator,
            evaluator_url,
            evaluator_timeout: (timeout_ms > 0).then(|| Duration::from_millis(timeout_ms as u64)),
        })
    }
}

fn usize_or(config: &ConfigLoader, name: &str, default: usize) -> Result<usize> {
    match config.get(name) {
        Some(value) => value
            .as_usize()
            .ok_or_else(|| anyhow!("Config value '{}' must be a non negative integer, found {:?}", name, value)),
        None => Ok(default),
    }
}

fn positive_usize_or(config: &ConfigLoader, name: &str, default: usize) -> Result<usize> {
    let value = usize_or(config, name, default)?;
    if value == 0 {
        bail!("Config value '{}' must be at least 1", name);
    }

    Ok(value)
}

impl ScoreChildrenOptions {
    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            fields: self.fen_fields.clone(),
            batch_size: self.batch_size,
            workers: self.workers,
            print_interval: self.print_interval,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(conf: &str) -> Result<ScoreChildrenOptions> {
        ConfigLoader::from_contents(conf, "score_children".to_string())?.load()
    }

    #[test]
    fn test_defaults() {
        let options = load(
            r#"
            score_children {
                input_file = "boards.csv"
                output_file = "scored.jsonl.gz"
            }
        "#,
        )
        .unwrap();

        assert_eq!(options.batch_size, 200);
        assert_eq!(options.workers, 5);
        assert_eq!(options.print_interval, 100);
        assert_eq!(options.evaluator, EvaluatorKind::Material);
        assert_eq!(options.evaluator_timeout, Some(Duration::from_secs(10)));
        assert_eq!(options.fen_fields, FieldSelection::default());
    }

    #[test]
    fn test_http_requires_url() {
        let conf = r#"
            score_children {
                input_file = "boards.csv"
                output_file = "scored.jsonl"
                evaluator = "http"
            }
        "#;

        assert!(load(conf).is_err());

        let options = load(&conf.replace(
            "evaluator = \"http\"",
            "evaluator = \"http\"\nevaluator_url = \"http://localhost:8501/v1/models/score:predict\"\nevaluator_timeout_ms = 0",
        ))
        .unwrap();

        assert_eq!(options.evaluator, EvaluatorKind::Http);
        assert_eq!(options.evaluator_timeout, None);
    }

    #[test]
    fn test_zero_workers_is_rejected() {
        let conf = r#"
            score_children {
                input_file = "boards.csv"
                output_file = "scored.jsonl"
                workers = 0
            }
        "#;

        assert!(load(conf).is_err());
    }
}
