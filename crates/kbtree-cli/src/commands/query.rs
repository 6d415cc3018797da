//! Tree and alignment query commands

use clap::Subcommand;
use kbtree_sdk::types::{
    AlignmentOptions, NewickBootstrap, NewickDistance, NewickLabel, SequenceLabel, TreeOptions,
};
use kbtree_sdk::TreeClient;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::{output::Output, CliError};

/// Query subcommands
#[derive(Debug, Subcommand)]
pub enum QueryCommand {
    /// Fetch a tree in newick format (empty if it does not exist)
    GetTree {
        /// Tree id, e.g. kb|tree.1
        tree_id: String,
        /// Output format
        #[arg(long)]
        format: Option<String>,
        /// Leaf label: none, raw, feature_id, protein_sequence_id, ...
        #[arg(long)]
        label: Option<NewickLabel>,
        /// Bootstrap rendering: none, internal_node_labels
        #[arg(long)]
        bootstrap: Option<NewickBootstrap>,
        /// Distance rendering: none, raw
        #[arg(long)]
        distance: Option<NewickDistance>,
    },
    /// Fetch an alignment (empty if it does not exist)
    GetAlignment {
        /// Alignment id, e.g. kb|aln.1
        alignment_id: String,
        /// Output format
        #[arg(long)]
        format: Option<String>,
        /// Sequence label: none, raw, feature_id, ...
        #[arg(long)]
        label: Option<SequenceLabel>,
    },
    /// Meta data of trees
    TreeData {
        #[arg(required = true)]
        tree_ids: Vec<String>,
    },
    /// Meta data of alignments
    AlignmentData {
        #[arg(required = true)]
        alignment_ids: Vec<String>,
    },
    /// Trees containing any of the features
    TreesByFeature {
        #[arg(required = true)]
        feature_ids: Vec<String>,
    },
    /// Trees containing any of the protein sequences
    TreesByProtein {
        #[arg(required = true)]
        protein_sequence_ids: Vec<String>,
    },
    /// Alignments containing any of the features
    AlignmentsByFeature {
        #[arg(required = true)]
        feature_ids: Vec<String>,
    },
    /// Alignments containing any of the protein sequences
    AlignmentsByProtein {
        #[arg(required = true)]
        protein_sequence_ids: Vec<String>,
    },
    /// Trees whose source id matches a pattern (`*` any run, `.` one char)
    TreesByPattern {
        pattern: String,
    },
    /// Leaf name to protein sequence id map
    LeafToProtein {
        tree_id: String,
    },
    /// Leaf name to feature id map
    LeafToFeature {
        tree_id: String,
    },
}

impl QueryCommand {
    pub async fn execute(self, client: &TreeClient, json: bool) -> Result<(), CliError> {
        match self {
            QueryCommand::GetTree {
                tree_id,
                format,
                label,
                bootstrap,
                distance,
            } => {
                let mut options = TreeOptions::new();
                if let Some(format) = format {
                    options = options.format(format);
                }
                if let Some(label) = label {
                    options = options.label(label);
                }
                if let Some(bootstrap) = bootstrap {
                    options = options.bootstrap(bootstrap);
                }
                if let Some(distance) = distance {
                    options = options.distance(distance);
                }
                let tree = client.get_tree_with(&tree_id, &options).await?;
                Output::new(json)
                    .field("tree_id", &tree_id)
                    .field("tree", &tree)
                    .message(&tree)
                    .print();
            }
            QueryCommand::GetAlignment {
                alignment_id,
                format,
                label,
            } => {
                let mut options = AlignmentOptions::new();
                if let Some(format) = format {
                    options = options.format(format);
                }
                if let Some(label) = label {
                    options = options.label(label);
                }
                let alignment = client.get_alignment_with(&alignment_id, &options).await?;
                Output::new(json)
                    .field("alignment_id", &alignment_id)
                    .field("alignment", &alignment)
                    .message(&alignment)
                    .print();
            }
            QueryCommand::TreeData { tree_ids } => {
                let data = client.get_tree_data(&tree_ids).await?;
                print_records(&sorted(data), json)?;
            }
            QueryCommand::AlignmentData { alignment_ids } => {
                let data = client.get_alignment_data(&alignment_ids).await?;
                print_records(&sorted(data), json)?;
            }
            QueryCommand::TreesByFeature { feature_ids } => {
                let ids = client.get_tree_ids_by_feature(&feature_ids).await?;
                print_ids(&ids, json);
            }
            QueryCommand::TreesByProtein {
                protein_sequence_ids,
            } => {
                let ids = client
                    .get_tree_ids_by_protein_sequence(&protein_sequence_ids)
                    .await?;
                print_ids(&ids, json);
            }
            QueryCommand::AlignmentsByFeature { feature_ids } => {
                let ids = client.get_alignment_ids_by_feature(&feature_ids).await?;
                print_ids(&ids, json);
            }
            QueryCommand::AlignmentsByProtein {
                protein_sequence_ids,
            } => {
                let ids = client
                    .get_alignment_ids_by_protein_sequence(&protein_sequence_ids)
                    .await?;
                print_ids(&ids, json);
            }
            QueryCommand::TreesByPattern { pattern } => {
                let matches = client.get_tree_ids_by_source_id_pattern(&pattern).await?;
                let lines: Vec<String> = matches.iter().map(|m| m.join("\t")).collect();
                Output::new(json)
                    .field_value("matches", &matches)
                    .message(&lines.join("\n"))
                    .print();
            }
            QueryCommand::LeafToProtein { tree_id } => {
                let map = client.get_leaf_to_protein_map(&tree_id).await?;
                print_map(sorted(map), json);
            }
            QueryCommand::LeafToFeature { tree_id } => {
                let map = client.get_leaf_to_feature_map(&tree_id).await?;
                print_map(sorted(map), json);
            }
        }
        Ok(())
    }
}

fn sorted<V>(map: std::collections::HashMap<String, V>) -> BTreeMap<String, V> {
    map.into_iter().collect()
}

fn print_ids(ids: &[String], json: bool) {
    Output::new(json)
        .field_value("ids", ids)
        .message(&ids.join("\n"))
        .print();
}

fn print_map(map: BTreeMap<String, String>, json: bool) {
    let lines: Vec<String> = map.iter().map(|(k, v)| format!("{}\t{}", k, v)).collect();
    Output::new(json)
        .field_value("map", &map)
        .message(&lines.join("\n"))
        .print();
}

fn print_records<T: Serialize>(records: &BTreeMap<String, T>, json: bool) -> Result<(), CliError> {
    let pretty = serde_json::to_string_pretty(records)?;
    Output::new(json)
        .field_value("records", records)
        .message(&pretty)
        .print();
    Ok(())
}
