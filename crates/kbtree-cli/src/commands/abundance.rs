//! Abundance profile commands

use clap::builder::PossibleValuesParser;
use clap::Subcommand;
use kbtree_sdk::types::{
    AbundanceData, AbundanceParams, FilterParams, NORMALIZATION_POST_PROCESSES,
    NORMALIZATION_SCOPES, NORMALIZATION_TYPES,
};
use kbtree_sdk::TreeClient;
use std::path::PathBuf;

use crate::{output::Output, CliError};

/// Abundance subcommands
#[derive(Debug, Subcommand)]
pub enum AbundanceCommand {
    /// Map metagenomic reads onto the leaves of a reference tree
    Compute {
        /// Reference tree id
        #[arg(long)]
        tree_id: Option<String>,
        /// Protein family name, used when no tree id is given
        #[arg(long)]
        family_name: Option<String>,
        /// Protein family source, e.g. COG
        #[arg(long)]
        family_source: Option<String>,
        /// Metagenomic sample id
        #[arg(long)]
        sample_id: String,
        /// Minimum percent identity of a hit
        #[arg(long)]
        percent_identity: Option<String>,
        /// Minimum match length of a hit
        #[arg(long)]
        match_length: Option<String>,
        /// Auth key for private samples
        #[arg(long, env = "KB_MG_AUTH_KEY", hide_env_values = true)]
        mg_auth_key: Option<String>,
    },
    /// Normalize and filter abundance profiles read from a JSON file
    Filter {
        /// JSON file with profile name → (id → value)
        data: PathBuf,
        /// Drop values below this cutoff
        #[arg(long)]
        cutoff_value: Option<f64>,
        /// Keep only this many records per profile
        #[arg(long)]
        cutoff_records: Option<i64>,
        /// Normalization scope
        #[arg(long, value_parser = PossibleValuesParser::new(NORMALIZATION_SCOPES))]
        scope: Option<String>,
        /// Normalization type
        #[arg(long = "type", value_parser = PossibleValuesParser::new(NORMALIZATION_TYPES))]
        normalization_type: Option<String>,
        /// Post-processing applied after normalization
        #[arg(long, value_parser = PossibleValuesParser::new(NORMALIZATION_POST_PROCESSES))]
        post_process: Option<String>,
    },
}

impl AbundanceCommand {
    pub async fn execute(self, client: &TreeClient, json: bool) -> Result<(), CliError> {
        match self {
            AbundanceCommand::Compute {
                tree_id,
                family_name,
                family_source,
                sample_id,
                percent_identity,
                match_length,
                mg_auth_key,
            } => {
                if tree_id.is_none() && family_name.is_none() {
                    return Err(CliError::InvalidInput(
                        "either --tree-id or --family-name is required".to_string(),
                    ));
                }
                let params = AbundanceParams {
                    reference_tree_id: tree_id,
                    protein_family_name: family_name,
                    protein_family_source: family_source,
                    metagenomic_sample_id: Some(sample_id),
                    percent_identity_threshold: percent_identity,
                    match_length_threshold: match_length,
                    mg_auth_key,
                    ..Default::default()
                };
                let result = client.compute_abundance_profile(&params).await?;
                let abundances = result.abundances.clone().unwrap_or_default();
                let mut lines: Vec<String> = abundances
                    .iter()
                    .map(|(leaf, count)| format!("{}\t{}", leaf, count))
                    .collect();
                lines.push(format!(
                    "hits: {}, reads: {}",
                    result.n_hits.unwrap_or(0),
                    result.n_reads.unwrap_or(0)
                ));
                Output::new(json)
                    .field_value("abundances", &abundances)
                    .field_value("n_hits", result.n_hits)
                    .field_value("n_reads", result.n_reads)
                    .message(&lines.join("\n"))
                    .print();
            }
            AbundanceCommand::Filter {
                data,
                cutoff_value,
                cutoff_records,
                scope,
                normalization_type,
                post_process,
            } => {
                let content = std::fs::read_to_string(&data)?;
                let abundance_data: AbundanceData = serde_json::from_str(&content)?;
                let params = FilterParams {
                    cutoff_value,
                    use_cutoff_value: cutoff_value.map(|_| 1),
                    cutoff_number_of_records: cutoff_records,
                    use_cutoff_number_of_records: cutoff_records.map(|_| 1),
                    normalization_scope: scope,
                    normalization_type,
                    normalization_post_process: post_process,
                    ..Default::default()
                };
                let filtered = client.filter_abundance_profile(&abundance_data, &params).await?;
                Output::new(json)
                    .field_value("profiles", &filtered)
                    .message(&serde_json::to_string_pretty(&filtered)?)
                    .print();
            }
        }
        Ok(())
    }
}
