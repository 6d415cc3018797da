//! Shared helpers: drive every catalog method through one entry point

#![allow(dead_code)]

use kbtree_sdk::types::{AbundanceData, AbundanceParams, FilterParams};
use kbtree_sdk::{SdkError, TreeClient};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};

/// Every remote method with a well-formed result value of its declared shape
pub fn catalog() -> Vec<(&'static str, Value)> {
    vec![
        ("replace_node_names", json!("(X:1,B:2);")),
        ("remove_node_names_and_simplify", json!("(B:2);")),
        ("merge_zero_distance_leaves", json!("(A:1);")),
        ("extract_leaf_node_names", json!(["A", "B"])),
        ("extract_node_names", json!(["A", "B", "root"])),
        ("get_node_count", json!(3)),
        ("get_leaf_count", json!(2)),
        ("get_tree", json!("(A:1,B:2);")),
        ("get_alignment", json!(">A\nMKV\n>B\nMKI\n")),
        (
            "get_tree_data",
            json!({"kb|tree.1": {"alignment_id": "kb|aln.1", "leaf_count": 2}}),
        ),
        (
            "get_alignment_data",
            json!({"kb|aln.1": {"tree_ids": ["kb|tree.1"], "n_rows": 2}}),
        ),
        ("get_tree_ids_by_feature", json!(["kb|tree.1"])),
        ("get_tree_ids_by_protein_sequence", json!(["kb|tree.2"])),
        ("get_alignment_ids_by_feature", json!(["kb|aln.1"])),
        ("get_alignment_ids_by_protein_sequence", json!(["kb|aln.2"])),
        (
            "get_tree_ids_by_source_id_pattern",
            json!([["kb|tree.1", "COG0001"], ["kb|tree.2", "COG0002"]]),
        ),
        ("get_leaf_to_protein_map", json!({"A": "kb|prot.1"})),
        ("get_leaf_to_feature_map", json!({"A": "kb|g.0.peg.1"})),
        (
            "compute_abundance_profile",
            json!({"abundances": {"A": 3}, "n_hits": 3, "n_reads": 10}),
        ),
        ("filter_abundance_profile", json!({"sample": {"A": 1.5}})),
        ("draw_html_tree", json!("<html></html>")),
    ]
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Call `method` on `client` with representative arguments and re-encode the result
pub async fn invoke(client: &TreeClient, method: &str) -> Result<Value, SdkError> {
    let tree = "(A:1,B:2);";
    let options: HashMap<String, String> =
        HashMap::from([("newick_label".to_string(), "raw".to_string())]);

    let value = match method {
        "replace_node_names" => {
            let replacements = HashMap::from([("A".to_string(), "X".to_string())]);
            json!(client.replace_node_names(tree, &replacements).await?)
        }
        "remove_node_names_and_simplify" => {
            json!(client.remove_node_names_and_simplify(tree, &strings(&["A"])).await?)
        }
        "merge_zero_distance_leaves" => json!(client.merge_zero_distance_leaves(tree).await?),
        "extract_leaf_node_names" => json!(client.extract_leaf_node_names(tree).await?),
        "extract_node_names" => json!(client.extract_node_names(tree).await?),
        "get_node_count" => json!(client.get_node_count(tree).await?),
        "get_leaf_count" => json!(client.get_leaf_count(tree).await?),
        "get_tree" => json!(client.get_tree("kb|tree.1", &options).await?),
        "get_alignment" => json!(client.get_alignment("kb|aln.1", &HashMap::new()).await?),
        "get_tree_data" => json!(client.get_tree_data(&strings(&["kb|tree.1"])).await?),
        "get_alignment_data" => json!(client.get_alignment_data(&strings(&["kb|aln.1"])).await?),
        "get_tree_ids_by_feature" => {
            json!(client.get_tree_ids_by_feature(&strings(&["kb|g.0.peg.1"])).await?)
        }
        "get_tree_ids_by_protein_sequence" => {
            json!(client.get_tree_ids_by_protein_sequence(&strings(&["kb|prot.1"])).await?)
        }
        "get_alignment_ids_by_feature" => {
            json!(client.get_alignment_ids_by_feature(&strings(&["kb|g.0.peg.1"])).await?)
        }
        "get_alignment_ids_by_protein_sequence" => {
            json!(client.get_alignment_ids_by_protein_sequence(&strings(&["kb|prot.1"])).await?)
        }
        "get_tree_ids_by_source_id_pattern" => {
            json!(client.get_tree_ids_by_source_id_pattern("COG000*").await?)
        }
        "get_leaf_to_protein_map" => json!(client.get_leaf_to_protein_map("kb|tree.1").await?),
        "get_leaf_to_feature_map" => json!(client.get_leaf_to_feature_map("kb|tree.1").await?),
        "compute_abundance_profile" => {
            let params = AbundanceParams {
                reference_tree_id: Some("kb|tree.1".to_string()),
                metagenomic_sample_id: Some("mgm4440026.3".to_string()),
                ..Default::default()
            };
            json!(client.compute_abundance_profile(&params).await?)
        }
        "filter_abundance_profile" => {
            let data: AbundanceData = BTreeMap::from([(
                "sample".to_string(),
                BTreeMap::from([("A".to_string(), 1.5), ("B".to_string(), 0.1)]),
            )]);
            let params = FilterParams {
                cutoff_value: Some(1.0),
                use_cutoff_value: Some(1),
                ..Default::default()
            };
            json!(client.filter_abundance_profile(&data, &params).await?)
        }
        "draw_html_tree" => json!(client.draw_html_tree(tree, &HashMap::new()).await?),
        other => panic!("no invocation for {}", other),
    };
    Ok(value)
}
