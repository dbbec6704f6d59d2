//! Data node types and structures.

use std::collections::BTreeMap;

/// Type of node in the NetCDF hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeType {
    /// Root node (file level).
    Root,
    /// Group node.
    Group,
    /// Variable node.
    Variable,
}

/// A node in the NetCDF data tree.
#[derive(Debug, Clone)]
pub struct DataNode {
    /// Node name.
    pub name: String,
    /// Full path to this node.
    pub path: String,
    /// Type of node.
    pub node_type: NodeType,
    /// Metadata key-value pairs.
    pub metadata: BTreeMap<String, String>,
    /// Child nodes.
    pub children: Vec<DataNode>,
    /// NetCDF attributes.
    pub attributes: BTreeMap<String, String>,
    /// Shape for variable nodes.
    pub shape: Option<Vec<usize>>,
    /// Data type for variable nodes.
    pub dtype: Option<String>,
}

impl DataNode {
    /// Create a new data node.
    pub fn new(name: String, path: String, node_type: NodeType) -> Self {
        Self {
            name,
            path,
            node_type,
            metadata: BTreeMap::new(),
            children: Vec::new(),
            attributes: BTreeMap::new(),
            shape: None,
            dtype: None,
        }
    }

    /// Check if this node is a variable.
    pub fn is_variable(&self) -> bool {
        self.node_type == NodeType::Variable
    }

    /// Add a child node.
    pub fn add_child(&mut self, child: DataNode) {
        self.children.push(child);
    }

    /// Get display name with dimension summary.
    pub fn display_name(&self) -> String {
        let suffix = match self.node_type {
            NodeType::Variable => {
                // Format: name(dim1=size1, dim2=size2) type
                let mut parts = Vec::new();

                if let (Some(dim_str), Some(shape)) = (self.metadata.get("dims"), &self.shape) {
                    let dim_info: Vec<String> = dim_str
                        .split(", ")
                        .filter(|d| !d.is_empty())
                        .zip(shape)
                        .map(|(name, size)| format!("{}={}", name, size))
                        .collect();
                    if !dim_info.is_empty() {
                        parts.push(format!("({})", dim_info.join(", ")));
                    }
                }

                if let Some(dtype) = &self.dtype {
                    parts.push(dtype.replace("NcVariableType::", "").to_lowercase());
                }

                if parts.is_empty() {
                    String::new()
                } else {
                    format!(" {}", parts.join(" "))
                }
            },
            NodeType::Group | NodeType::Root => format!(" ({})", self.children.len()),
        };

        format!("{}{}", self.name, suffix)
    }
}
