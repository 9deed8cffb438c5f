use std::path::PathBuf;

use anyhow::{anyhow, bail, Result};
use common::{Config, ConfigLoader, Value};
use engine::FieldSelection;

use super::{
    parse_post_filter, parse_pre_filter, AggregationOptions, FilterChain, PostFilter, PreFilter, SplitPlan,
};

#[derive(Clone, Debug)]
pub struct CreateDatabaseOptions {
    pub pgn_files: Vec<PathBuf>,
    pub fen_fields: FieldSelection,
    pub mirror_black_to_move: bool,
    pub pre_filters: Vec<String>,
    pub post_filters: Vec<String>,
    pub output_files: Vec<PathBuf>,
    pub output_ratios: Vec<f64>,
    pub output_triplets: Vec<bool>,
    /// Zero leaves the number of negative moves per board unbounded.
    pub comparison_move_limit: usize,
    pub print_interval: usize,
    pub file_parallelism: usize,
}

impl Config for CreateDatabaseOptions {
    fn load(config: &ConfigLoader) -> Result<Self> {
        let fen_fields = config.get_list_of("fen_fields", Value::as_string)?;
        let fen_fields = if fen_fields.is_empty() {
            FieldSelection::default()
        } else {
            FieldSelection::parse(&fen_fields)?
        };

        let output_files = config.get_relative_paths("output_files")?;
        let output_triplets = match config.get("output_triplets") {
            Some(_) => config.get_list_of("output_triplets", Value::as_bool)?,
            None => vec![false; output_files.len()],
        };

        Ok(Self {
            pgn_files: config.get_relative_paths("pgn_files")?,
            fen_fields,
            mirror_black_to_move: config
                .get("mirror_black_to_move")
                .and_then(|v| v.as_bool())
                .unwrap_or(true),
            pre_filters: config.get_list_of("pre_filters", Value::as_string)?,
            post_filters: config.get_list_of("post_filters", Value::as_string)?,
            output_files,
            output_ratios: config.get_list_of("output_ratios", Value::as_f64)?,
            output_triplets,
            comparison_move_limit: usize_or(config, "comparison_move_limit", 0)?,
            print_interval: usize_or(config, "print_interval", 100_000)?,
            file_parallelism: usize_or(config, "file_parallelism", 1)?,
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

impl CreateDatabaseOptions {
    pub fn aggregation_options(&self) -> AggregationOptions {
        AggregationOptions {
            fields: self.fen_fields.clone(),
            mirror_black_to_move: self.mirror_black_to_move,
            file_parallelism: self.file_parallelism,
            print_interval: self.print_interval,
        }
    }

    pub fn pre_filter_chain(&self) -> Result<FilterChain<dyn PreFilter>> {
        let filters = self
            .pre_filters
            .iter()
            .map(|spec| parse_pre_filter(spec))
            .collect::<Result<Vec<_>>>()?;

        Ok(FilterChain::from(filters))
    }

    pub fn post_filter_chain(&self) -> Result<FilterChain<dyn PostFilter>> {
        let filters = self
            .post_filters
            .iter()
            .map(|spec| parse_post_filter(spec))
            .collect::<Result<Vec<_>>>()?;

        Ok(FilterChain::from(filters))
    }

    pub fn split_plan(&self) -> Result<SplitPlan> {
        if self.pgn_files.is_empty() {
            bail!("No PGN files were configured");
        }

        SplitPlan::new(
            self.output_files.clone(),
            self.output_ratios.clone(),
            self.output_triplets.clone(),
            &self.fen_fields,
        )
    }
}
