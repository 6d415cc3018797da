//! Service record types and typed option builders

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use crate::SdkError;

/// Profile name → (id → abundance value)
pub type AbundanceData = BTreeMap<String, BTreeMap<String, f64>>;

/// Meta data about a tree, as returned by `get_tree_data`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TreeMetaData {
    /// Alignment the tree was built from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment_id: Option<String>,
    /// Tree type
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub tree_type: Option<String>,
    /// Status (e.g. "active")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Creation date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_created: Option<String>,
    /// Construction method; the wire name is misspelled by the service
    #[serde(
        default,
        rename = "tree_contruction_method",
        skip_serializing_if = "Option::is_none"
    )]
    pub tree_construction_method: Option<String>,
    /// Construction parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tree_construction_parameters: Option<String>,
    /// Protocol used to build the tree
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tree_protocol: Option<String>,
    /// Total node count
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_count: Option<i64>,
    /// Leaf node count
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leaf_count: Option<i64>,
    /// Source database
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_db: Option<String>,
    /// Id in the source database
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    /// Fields this client does not know about
    #[serde(flatten)]
    pub additional_properties: HashMap<String, Value>,
}

/// Meta data about an alignment, as returned by `get_alignment_data`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlignmentMetaData {
    /// Trees built from this alignment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tree_ids: Option<Vec<String>>,
    /// Status (e.g. "active")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Sequence type ("Protein", "DNA", ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_type: Option<String>,
    /// Whether the alignment concatenates several alignments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_concatenation: Option<String>,
    /// Creation timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Number of rows
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_rows: Option<i64>,
    /// Number of columns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_cols: Option<i64>,
    /// Construction method
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment_construction_method: Option<String>,
    /// Construction parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment_construction_parameters: Option<String>,
    /// Protocol used to build the alignment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment_protocol: Option<String>,
    /// Source database
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_db: Option<String>,
    /// Id in the source database
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    /// Fields this client does not know about
    #[serde(flatten)]
    pub additional_properties: HashMap<String, Value>,
}

/// Input of `compute_abundance_profile`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AbundanceParams {
    /// Tree whose leaves reads are mapped to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_tree_id: Option<String>,
    /// Protein family name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protein_family_name: Option<String>,
    /// Protein family source (e.g. "COG")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protein_family_source: Option<String>,
    /// Metagenomic sample id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metagenomic_sample_id: Option<String>,
    /// Minimum percent identity of a hit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent_identity_threshold: Option<String>,
    /// Minimum match length of a hit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_length_threshold: Option<String>,
    /// Auth key for the metagenomics service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mg_auth_key: Option<String>,
    /// Fields this client does not know about
    #[serde(flatten)]
    pub additional_properties: HashMap<String, Value>,
}

/// Output of `compute_abundance_profile`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AbundanceResult {
    /// Leaf name → number of matching reads
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abundances: Option<BTreeMap<String, i64>>,
    /// Total hits
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_hits: Option<i64>,
    /// Total reads examined
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_reads: Option<i64>,
    /// Fields this client does not know about
    #[serde(flatten)]
    pub additional_properties: HashMap<String, Value>,
}

/// Accepted `FilterParams::normalization_scope` values
pub const NORMALIZATION_SCOPES: &[&str] = &["none", "global", "per_column"];

/// Accepted `FilterParams::normalization_type` values
pub const NORMALIZATION_TYPES: &[&str] = &["none", "total", "mean", "max", "min"];

/// Accepted `FilterParams::normalization_post_process` values
pub const NORMALIZATION_POST_PROCESSES: &[&str] = &["none", "log10", "log2", "ln"];

/// Input of `filter_abundance_profile`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterParams {
    /// Threshold a value must exceed to be kept
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cutoff_value: Option<f64>,
    /// 1 to apply `cutoff_value`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_cutoff_value: Option<i64>,
    /// Keep only the top N records per column
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cutoff_number_of_records: Option<i64>,
    /// 1 to apply `cutoff_number_of_records`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_cutoff_number_of_records: Option<i64>,
    /// One of [`NORMALIZATION_SCOPES`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalization_scope: Option<String>,
    /// One of [`NORMALIZATION_TYPES`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalization_type: Option<String>,
    /// One of [`NORMALIZATION_POST_PROCESSES`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalization_post_process: Option<String>,
    /// Fields this client does not know about
    #[serde(flatten)]
    pub additional_properties: HashMap<String, Value>,
}

macro_rules! wire_enum {
    ($(#[$doc:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $(
                #[doc = concat!("`", $wire, "`")]
                $variant,
            )+
        }

        impl $name {
            /// Wire representation
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = SdkError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok($name::$variant),)+
                    other => Err(SdkError::Serialization(format!(
                        "unknown {} value: {}",
                        stringify!($name),
                        other
                    ))),
                }
            }
        }
    };
}

wire_enum!(
    /// Leaf label used by `get_tree` in newick output
    NewickLabel {
        None => "none",
        Raw => "raw",
        FeatureId => "feature_id",
        ProteinSequenceId => "protein_sequence_id",
        ContigSequenceId => "contig_sequence_id",
        BestFeatureId => "best_feature_id",
        BestGenomeId => "best_genome_id",
    }
);

wire_enum!(
    /// How bootstrap values are rendered
    NewickBootstrap {
        None => "none",
        InternalNodeLabels => "internal_node_labels",
    }
);

wire_enum!(
    /// Whether branch distances are rendered
    NewickDistance {
        None => "none",
        Raw => "raw",
    }
);

wire_enum!(
    /// Sequence label used by `get_alignment`
    SequenceLabel {
        None => "none",
        Raw => "raw",
        FeatureId => "feature_id",
        ProteinSequenceId => "protein_sequence_id",
        ContigSequenceId => "contig_sequence_id",
    }
);

/// Options for `get_tree`
///
/// Unset options are not sent, so the server defaults apply
/// (`raw` labels, bootstrap as internal node labels, `raw` distances).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeOptions {
    format: Option<String>,
    newick_label: Option<NewickLabel>,
    newick_bootstrap: Option<NewickBootstrap>,
    newick_distance: Option<NewickDistance>,
}

impl TreeOptions {
    /// Empty option set
    pub fn new() -> Self {
        Self::default()
    }

    /// Output format; only "newick" is supported by the service
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Leaf label
    pub fn label(mut self, label: NewickLabel) -> Self {
        self.newick_label = Some(label);
        self
    }

    /// Bootstrap rendering
    pub fn bootstrap(mut self, bootstrap: NewickBootstrap) -> Self {
        self.newick_bootstrap = Some(bootstrap);
        self
    }

    /// Distance rendering
    pub fn distance(mut self, distance: NewickDistance) -> Self {
        self.newick_distance = Some(distance);
        self
    }

    /// Wire form
    pub fn to_map(&self) -> HashMap<String, String> {
        let mut map = HashMap::new();
        if let Some(format) = &self.format {
            map.insert("format".to_string(), format.clone());
        }
        if let Some(label) = self.newick_label {
            map.insert("newick_label".to_string(), label.to_string());
        }
        if let Some(bootstrap) = self.newick_bootstrap {
            map.insert("newick_bootstrap".to_string(), bootstrap.to_string());
        }
        if let Some(distance) = self.newick_distance {
            map.insert("newick_distance".to_string(), distance.to_string());
        }
        map
    }
}

/// Options for `get_alignment`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlignmentOptions {
    format: Option<String>,
    sequence_label: Option<SequenceLabel>,
}

impl AlignmentOptions {
    /// Empty option set
    pub fn new() -> Self {
        Self::default()
    }

    /// Output format; only "fasta" is supported by the service
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Sequence label
    pub fn label(mut self, label: SequenceLabel) -> Self {
        self.sequence_label = Some(label);
        self
    }

    /// Wire form
    pub fn to_map(&self) -> HashMap<String, String> {
        let mut map = HashMap::new();
        if let Some(format) = &self.format {
            map.insert("format".to_string(), format.clone());
        }
        if let Some(label) = self.sequence_label {
            map.insert("sequence_label".to_string(), label.to_string());
        }
        map
    }
}
