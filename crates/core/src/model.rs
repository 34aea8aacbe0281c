#![forbid(unsafe_code)]

use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueType {
    String,
    Integer,
    Long,
    Boolean,
}

impl ValueType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Long => "long",
            Self::Boolean => "boolean",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "string" => Some(Self::String),
            "integer" => Some(Self::Integer),
            "long" => Some(Self::Long),
            "boolean" => Some(Self::Boolean),
            _ => None,
        }
    }
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TagValue {
    String(String),
    Integer(i32),
    Long(i64),
    Boolean(bool),
}

impl TagValue {
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::String(_) => ValueType::String,
            Self::Integer(_) => ValueType::Integer,
            Self::Long(_) => ValueType::Long,
            Self::Boolean(_) => ValueType::Boolean,
        }
    }
}

/// A typed key/value fact attached to an item or a rich version. The value
/// may be absent for marker tags, in which case no type is recorded either.
#[derive(Clone, Debug, PartialEq)]
pub struct Tag {
    pub owner_id: i64,
    pub key: String,
    pub value: Option<TagValue>,
}

impl Tag {
    pub fn new(owner_id: i64, key: impl Into<String>, value: Option<TagValue>) -> Self {
        Self {
            owner_id,
            key: key.into(),
            value,
        }
    }

    pub fn value_type(&self) -> Option<ValueType> {
        self.value.as_ref().map(TagValue::value_type)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemKind {
    Node,
    Edge,
    Graph,
    Structure,
    LineageEdge,
    LineageGraph,
}

impl ItemKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Edge => "edge",
            Self::Graph => "graph",
            Self::Structure => "structure",
            Self::LineageEdge => "lineage_edge",
            Self::LineageGraph => "lineage_graph",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "node" => Some(Self::Node),
            "edge" => Some(Self::Edge),
            "graph" => Some(Self::Graph),
            "structure" => Some(Self::Structure),
            "lineage_edge" => Some(Self::LineageEdge),
            "lineage_graph" => Some(Self::LineageGraph),
            _ => None,
        }
    }
}

/// A named, long-lived entity whose content evolves through versions linked
/// into a per-item history DAG. Tags are fixed at creation time.
#[derive(Clone, Debug, PartialEq)]
pub struct Item {
    pub id: i64,
    pub kind: ItemKind,
    pub name: String,
    pub source_key: String,
    pub tags: BTreeMap<String, Tag>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RichVersion {
    pub id: i64,
    pub tags: BTreeMap<String, Tag>,
    pub structure_version_id: Option<i64>,
    pub reference: Option<String>,
    pub reference_parameters: BTreeMap<String, String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StructureVersion {
    pub id: i64,
    pub structure_id: i64,
    pub attributes: BTreeMap<String, ValueType>,
}

/// A directed edge between two version ids. `from_id` may be the root
/// sentinel; `to_id` never is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VersionSuccessor {
    pub id: i64,
    pub from_id: i64,
    pub to_id: i64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeVersion {
    pub rich: RichVersion,
    pub node_id: i64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EdgeVersion {
    pub rich: RichVersion,
    pub edge_id: i64,
    pub from_node_version_id: i64,
    pub to_node_version_id: i64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GraphVersion {
    pub rich: RichVersion,
    pub graph_id: i64,
    pub edge_version_ids: Vec<i64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LineageEdgeVersion {
    pub rich: RichVersion,
    pub lineage_edge_id: i64,
    pub from_rich_version_id: i64,
    pub to_rich_version_id: i64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LineageGraphVersion {
    pub rich: RichVersion,
    pub lineage_graph_id: i64,
    pub lineage_edge_version_ids: Vec<i64>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConformanceError {
    NoTags,
    MissingKey { key: String },
    MissingValue { key: String },
    TypeMismatch {
        key: String,
        expected: ValueType,
        found: ValueType,
    },
}

impl std::fmt::Display for ConformanceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoTags => write!(f, "no tags were specified"),
            Self::MissingKey { key } => write!(f, "no tag with key {key} was specified"),
            Self::MissingValue { key } => write!(f, "tag with key {key} did not have a value"),
            Self::TypeMismatch {
                key,
                expected,
                found,
            } => write!(
                f,
                "tag with key {key} did not have a value of the correct type: expected [{expected}] but found [{found}]"
            ),
        }
    }
}

impl std::error::Error for ConformanceError {}

/// Check the given tags against a structure version's declared attributes.
///
/// The structure is a lower bound: every declared attribute must appear as a
/// tag with a value of the declared type, while tags the structure does not
/// mention are ignored. An empty tag map never conforms, even to a structure
/// that declares zero attributes.
pub fn check_structure_tags(
    structure: &StructureVersion,
    tags: &BTreeMap<String, Tag>,
) -> Result<(), ConformanceError> {
    if tags.is_empty() {
        return Err(ConformanceError::NoTags);
    }

    for (key, expected) in &structure.attributes {
        let Some(tag) = tags.get(key) else {
            return Err(ConformanceError::MissingKey { key: key.clone() });
        };
        let Some(found) = tag.value_type() else {
            return Err(ConformanceError::MissingValue { key: key.clone() });
        };
        if found != *expected {
            return Err(ConformanceError::TypeMismatch {
                key: key.clone(),
                expected: *expected,
                found,
            });
        }
    }

    Ok(())
}
