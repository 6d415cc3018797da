//! Newick tree manipulation commands

use clap::Subcommand;
use kbtree_sdk::TreeClient;

use super::{parse_pairs, read_tree};
use crate::{output::Output, CliError};

/// Tree subcommands
///
/// Every `TREE` argument is a newick string, `@path` to read it from a
/// file, or `-` for stdin.
#[derive(Debug, Subcommand)]
pub enum TreeCommand {
    /// Rename nodes
    ReplaceNames {
        /// Newick tree
        tree: String,
        /// Replacement as OLD=NEW, repeatable
        #[arg(long = "map", value_name = "OLD=NEW", required = true)]
        replacements: Vec<String>,
    },
    /// Remove nodes by name and simplify the tree
    RemoveNames {
        /// Newick tree
        tree: String,
        /// Names to remove
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Merge leaves that sit at zero distance
    MergeZero {
        /// Newick tree
        tree: String,
    },
    /// List leaf node names
    LeafNames {
        /// Newick tree
        tree: String,
    },
    /// List all node names
    NodeNames {
        /// Newick tree
        tree: String,
    },
    /// Count all nodes
    NodeCount {
        /// Newick tree
        tree: String,
    },
    /// Count leaf nodes
    LeafCount {
        /// Newick tree
        tree: String,
    },
    /// Render the tree as an HTML page
    DrawHtml {
        /// Newick tree
        tree: String,
        /// Display option as KEY=VALUE, repeatable
        #[arg(long = "option", value_name = "KEY=VALUE")]
        options: Vec<String>,
    },
}

impl TreeCommand {
    pub async fn execute(self, client: &TreeClient, json: bool) -> Result<(), CliError> {
        match self {
            TreeCommand::ReplaceNames { tree, replacements } => {
                let replacements = parse_pairs(&replacements)?;
                let tree = client.replace_node_names(&read_tree(&tree)?, &replacements).await?;
                print_tree(&tree, json);
            }
            TreeCommand::RemoveNames { tree, names } => {
                let tree = client
                    .remove_node_names_and_simplify(&read_tree(&tree)?, &names)
                    .await?;
                print_tree(&tree, json);
            }
            TreeCommand::MergeZero { tree } => {
                let tree = client.merge_zero_distance_leaves(&read_tree(&tree)?).await?;
                print_tree(&tree, json);
            }
            TreeCommand::LeafNames { tree } => {
                let names = client.extract_leaf_node_names(&read_tree(&tree)?).await?;
                print_names(&names, json);
            }
            TreeCommand::NodeNames { tree } => {
                let names = client.extract_node_names(&read_tree(&tree)?).await?;
                print_names(&names, json);
            }
            TreeCommand::NodeCount { tree } => {
                let count = client.get_node_count(&read_tree(&tree)?).await?;
                Output::new(json)
                    .field_i64("node_count", count)
                    .message(&count.to_string())
                    .print();
            }
            TreeCommand::LeafCount { tree } => {
                let count = client.get_leaf_count(&read_tree(&tree)?).await?;
                Output::new(json)
                    .field_i64("leaf_count", count)
                    .message(&count.to_string())
                    .print();
            }
            TreeCommand::DrawHtml { tree, options } => {
                let options = parse_pairs(&options)?;
                let html = client.draw_html_tree(&read_tree(&tree)?, &options).await?;
                Output::new(json).field("html", &html).message(&html).print();
            }
        }
        Ok(())
    }
}

fn print_tree(tree: &str, json: bool) {
    Output::new(json).field("tree", tree).message(tree).print();
}

fn print_names(names: &[String], json: bool) {
    Output::new(json)
        .field_value("names", names)
        .message(&names.join("\n"))
        .print();
}
