//! TreeClient - typed wrappers over the Tree service methods

use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::auth::{AuthToken, IdentityProvider};
use crate::gateway::RpcGateway;
use crate::transport::{MockTransport, Transport};
use crate::types::{
    AbundanceData, AbundanceParams, AbundanceResult, AlignmentMetaData, AlignmentOptions,
    FilterParams, TreeMetaData, TreeOptions,
};
use crate::SdkError;

#[cfg(feature = "http")]
use crate::auth::HttpIdentityProvider;

/// Remote service name every method is qualified with
pub const SERVICE_NAME: &str = "Tree";

const MOCK_URL: &str = "https://localhost/services/trees";

/// Client for the phylogenetic tree and multiple sequence alignment service
pub struct TreeClient {
    gateway: RpcGateway,
}

impl TreeClient {
    /// Create a client without credentials
    #[cfg(feature = "http")]
    pub fn new(url: &str) -> Result<Self, SdkError> {
        Ok(Self::with_gateway(RpcGateway::new(url)?))
    }

    /// Create a client that sends `token` with every call
    #[cfg(feature = "http")]
    pub fn with_token(url: &str, token: AuthToken) -> Result<Self, SdkError> {
        Ok(Self::with_gateway(RpcGateway::with_token(url, token)?))
    }

    /// Log in against the default identity provider and create a client
    #[cfg(feature = "http")]
    pub async fn with_credentials(url: &str, user: &str, password: &str) -> Result<Self, SdkError> {
        let provider = HttpIdentityProvider::default();
        Self::with_credentials_via(url, user, password, &provider).await
    }

    /// Log in against `provider` and create a client
    #[cfg(feature = "http")]
    pub async fn with_credentials_via(
        url: &str,
        user: &str,
        password: &str,
        provider: &dyn IdentityProvider,
    ) -> Result<Self, SdkError> {
        let gateway = RpcGateway::with_credentials(url, user, password, provider).await?;
        Ok(Self::with_gateway(gateway))
    }

    /// Create a client on a custom transport
    pub fn with_transport(
        url: &str,
        token: Option<AuthToken>,
        transport: impl Transport + 'static,
    ) -> Result<Self, SdkError> {
        Ok(Self::with_gateway(RpcGateway::with_transport(
            url, token, transport,
        )?))
    }

    /// Create a client with a mock transport (for testing)
    ///
    /// The returned transport handle shares state with the client, so
    /// responses can be set and requests inspected after construction.
    pub fn new_mock() -> (Self, MockTransport) {
        let transport = MockTransport::new();
        let gateway = RpcGateway::from_parts(MOCK_URL, None, transport.clone());
        (Self::with_gateway(gateway), transport)
    }

    /// Wrap an existing gateway
    pub fn with_gateway(gateway: RpcGateway) -> Self {
        Self { gateway }
    }

    /// Underlying gateway
    pub fn gateway(&self) -> &RpcGateway {
        &self.gateway
    }

    /// Set the read timeout in milliseconds; `None` disables it
    pub fn set_read_timeout(&self, milliseconds: Option<u64>) {
        self.gateway.set_read_timeout(milliseconds);
    }

    /// Whether a credential may be sent over plaintext http
    pub fn is_auth_allowed_for_http(&self) -> bool {
        self.gateway.is_auth_allowed_for_http()
    }

    /// Allow or forbid sending a credential over plaintext http
    pub fn set_auth_allowed_for_http(&self, allowed: bool) {
        self.gateway.set_auth_allowed_for_http(allowed);
    }

    /// Read the next call's raw response from `path` (test hook)
    pub fn set_file_for_next_rpc_response(&self, path: impl Into<PathBuf>) {
        self.gateway.set_file_for_next_rpc_response(path);
    }

    async fn request<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<T, SdkError> {
        let qualified = format!("{}.{}", SERVICE_NAME, method);
        self.gateway.call(&qualified, params).await
    }

    // ==================== Tree Manipulation ====================

    /// Replace node names by exact match on the keys of `replacements`
    pub async fn replace_node_names(
        &self,
        tree: &str,
        replacements: &HashMap<String, String>,
    ) -> Result<String, SdkError> {
        self.request("replace_node_names", vec![json!(tree), json!(replacements)])
            .await
    }

    /// Remove the named nodes and collapse the internal nodes left with one child
    pub async fn remove_node_names_and_simplify(
        &self,
        tree: &str,
        removal_list: &[String],
    ) -> Result<String, SdkError> {
        self.request(
            "remove_node_names_and_simplify",
            vec![json!(tree), json!(removal_list)],
        )
        .await
    }

    /// Merge sibling leaves separated by zero distance
    pub async fn merge_zero_distance_leaves(&self, tree: &str) -> Result<String, SdkError> {
        self.request("merge_zero_distance_leaves", vec![json!(tree)])
            .await
    }

    // ==================== Tree Inspection ====================

    /// Names of the leaf nodes
    pub async fn extract_leaf_node_names(&self, tree: &str) -> Result<Vec<String>, SdkError> {
        self.request("extract_leaf_node_names", vec![json!(tree)])
            .await
    }

    /// Names of all nodes, internal ones included when they are named
    pub async fn extract_node_names(&self, tree: &str) -> Result<Vec<String>, SdkError> {
        self.request("extract_node_names", vec![json!(tree)]).await
    }

    /// Total number of nodes, including internal and root nodes
    pub async fn get_node_count(&self, tree: &str) -> Result<i64, SdkError> {
        self.request("get_node_count", vec![json!(tree)]).await
    }

    /// Number of leaf nodes
    pub async fn get_leaf_count(&self, tree: &str) -> Result<i64, SdkError> {
        self.request("get_leaf_count", vec![json!(tree)]).await
    }

    // ==================== Tree & Alignment Retrieval ====================

    /// Fetch a tree; an empty string means the tree does not exist
    ///
    /// Recognized options: `format`, `newick_label`, `newick_bootstrap`,
    /// `newick_distance`. See [`TreeOptions`] for a typed builder.
    pub async fn get_tree(
        &self,
        tree_id: &str,
        options: &HashMap<String, String>,
    ) -> Result<String, SdkError> {
        self.request("get_tree", vec![json!(tree_id), json!(options)])
            .await
    }

    /// [`get_tree`](Self::get_tree) with typed options
    pub async fn get_tree_with(&self, tree_id: &str, options: &TreeOptions) -> Result<String, SdkError> {
        self.get_tree(tree_id, &options.to_map()).await
    }

    /// Fetch an alignment; an empty string means the alignment does not exist
    ///
    /// Recognized options: `format`, `sequence_label`.
    pub async fn get_alignment(
        &self,
        alignment_id: &str,
        options: &HashMap<String, String>,
    ) -> Result<String, SdkError> {
        self.request("get_alignment", vec![json!(alignment_id), json!(options)])
            .await
    }

    /// [`get_alignment`](Self::get_alignment) with typed options
    pub async fn get_alignment_with(
        &self,
        alignment_id: &str,
        options: &AlignmentOptions,
    ) -> Result<String, SdkError> {
        self.get_alignment(alignment_id, &options.to_map()).await
    }

    /// Meta data of each tree; unknown ids are absent from the result
    pub async fn get_tree_data(
        &self,
        tree_ids: &[String],
    ) -> Result<HashMap<String, TreeMetaData>, SdkError> {
        self.request("get_tree_data", vec![json!(tree_ids)]).await
    }

    /// Meta data of each alignment; unknown ids are absent from the result
    pub async fn get_alignment_data(
        &self,
        alignment_ids: &[String],
    ) -> Result<HashMap<String, AlignmentMetaData>, SdkError> {
        self.request("get_alignment_data", vec![json!(alignment_ids)])
            .await
    }

    // ==================== Lookups ====================

    /// Trees that include any of the given features
    pub async fn get_tree_ids_by_feature(&self, feature_ids: &[String]) -> Result<Vec<String>, SdkError> {
        self.request("get_tree_ids_by_feature", vec![json!(feature_ids)])
            .await
    }

    /// Trees that include any of the given protein sequences
    pub async fn get_tree_ids_by_protein_sequence(
        &self,
        protein_sequence_ids: &[String],
    ) -> Result<Vec<String>, SdkError> {
        self.request(
            "get_tree_ids_by_protein_sequence",
            vec![json!(protein_sequence_ids)],
        )
        .await
    }

    /// Alignments that include any of the given features
    pub async fn get_alignment_ids_by_feature(
        &self,
        feature_ids: &[String],
    ) -> Result<Vec<String>, SdkError> {
        self.request("get_alignment_ids_by_feature", vec![json!(feature_ids)])
            .await
    }

    /// Alignments that include any of the given protein sequences
    pub async fn get_alignment_ids_by_protein_sequence(
        &self,
        protein_sequence_ids: &[String],
    ) -> Result<Vec<String>, SdkError> {
        self.request(
            "get_alignment_ids_by_protein_sequence",
            vec![json!(protein_sequence_ids)],
        )
        .await
    }

    /// Trees whose source id matches `pattern`
    ///
    /// `*` matches any run of characters, `.` exactly one; both can be
    /// escaped with a backslash. Matching happens on the server.
    pub async fn get_tree_ids_by_source_id_pattern(
        &self,
        pattern: &str,
    ) -> Result<Vec<Vec<String>>, SdkError> {
        self.request("get_tree_ids_by_source_id_pattern", vec![json!(pattern)])
            .await
    }

    /// Leaf node name → protein sequence id
    pub async fn get_leaf_to_protein_map(
        &self,
        tree_id: &str,
    ) -> Result<HashMap<String, String>, SdkError> {
        self.request("get_leaf_to_protein_map", vec![json!(tree_id)])
            .await
    }

    /// Leaf node name → feature id
    pub async fn get_leaf_to_feature_map(
        &self,
        tree_id: &str,
    ) -> Result<HashMap<String, String>, SdkError> {
        self.request("get_leaf_to_feature_map", vec![json!(tree_id)])
            .await
    }

    // ==================== Abundance Profiles ====================

    /// Map metagenomic reads onto the leaves of a reference tree
    pub async fn compute_abundance_profile(
        &self,
        params: &AbundanceParams,
    ) -> Result<AbundanceResult, SdkError> {
        self.request(
            "compute_abundance_profile",
            vec![serde_json::to_value(params)?],
        )
        .await
    }

    /// Normalize and filter abundance profiles
    pub async fn filter_abundance_profile(
        &self,
        abundance_data: &AbundanceData,
        filter_params: &FilterParams,
    ) -> Result<AbundanceData, SdkError> {
        self.request(
            "filter_abundance_profile",
            vec![
                serde_json::to_value(abundance_data)?,
                serde_json::to_value(filter_params)?,
            ],
        )
        .await
    }

    // ==================== Rendering ====================

    /// Render a newick tree as an HTML page
    pub async fn draw_html_tree(
        &self,
        tree: &str,
        display_options: &HashMap<String, String>,
    ) -> Result<String, SdkError> {
        self.request("draw_html_tree", vec![json!(tree), json!(display_options)])
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NewickLabel;

    #[tokio::test]
    async fn test_client_mock_node_count() {
        let (client, transport) = TreeClient::new_mock();
        transport.set_result("Tree.get_node_count", json!(9));
        assert_eq!(client.get_node_count("((A,B),(C,D));").await.unwrap(), 9);
    }

    #[tokio::test]
    async fn test_methods_are_qualified() {
        let (client, transport) = TreeClient::new_mock();
        transport.set_result("Tree.extract_node_names", json!(["A", "B"]));
        client.extract_node_names("(A,B);").await.unwrap();
        assert_eq!(
            transport.last_request_body().unwrap()["method"],
            "Tree.extract_node_names"
        );
    }

    #[tokio::test]
    async fn test_get_tree_with_options() {
        let (client, transport) = TreeClient::new_mock();
        transport.set_result("Tree.get_tree", json!("(A,B);"));

        let options = TreeOptions::new().label(NewickLabel::None);
        let tree = client.get_tree_with("kb|tree.9", &options).await.unwrap();
        assert_eq!(tree, "(A,B);");

        let body = transport.last_request_body().unwrap();
        assert_eq!(body["params"], json!(["kb|tree.9", {"newick_label": "none"}]));
    }

    #[tokio::test]
    async fn test_config_passthrough() {
        let (client, _) = TreeClient::new_mock();
        client.set_read_timeout(Some(10));
        client.set_auth_allowed_for_http(true);
        assert!(client.is_auth_allowed_for_http());
        assert_eq!(
            client.gateway().read_timeout(),
            Some(std::time::Duration::from_millis(10))
        );
    }
}
