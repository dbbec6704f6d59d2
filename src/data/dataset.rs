//! Dataset handle.

use super::{DataNode, NodeType};
use crate::opener::Engine;
use std::path::PathBuf;

/// An opened dataset.
#[derive(Debug, Clone)]
pub struct DatasetHandle {
    /// Path to the source file.
    pub file_path: PathBuf,
    /// Engine the dataset was opened with.
    pub engine: Engine,
    /// Root node of the data tree.
    pub root_node: DataNode,
}

impl DatasetHandle {
    /// Create a new dataset handle.
    pub fn new(file_path: PathBuf, engine: Engine, root_node: DataNode) -> Self {
        Self {
            file_path,
            engine,
            root_node,
        }
    }

    /// Names of the variables at the root of the dataset.
    pub fn variable_names(&self) -> Vec<&str> {
        self.root_node
            .children
            .iter()
            .filter(|c| c.node_type == NodeType::Variable)
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Find a node by its full path (e.g. `/tas` or `/group/var`).
    pub fn find(&self, path: &str) -> Option<&DataNode> {
        fn walk<'a>(node: &'a DataNode, path: &str) -> Option<&'a DataNode> {
            if node.path == path {
                return Some(node);
            }
            node.children.iter().find_map(|c| walk(c, path))
        }
        walk(&self.root_node, path)
    }

    /// Length of a root dimension.
    pub fn dimension(&self, name: &str) -> Option<usize> {
        self.root_node
            .metadata
            .get(&format!("dim_{}", name))
            .and_then(|len| len.parse().ok())
    }

    /// Global attribute value.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.root_node.attributes.get(name).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DatasetHandle {
        let mut root = DataNode::new("foo.nc".into(), "/".into(), NodeType::Root);
        root.metadata.insert("dim_time".into(), "365".into());
        root.attributes.insert("title".into(), "sample".into());
        root.add_child(DataNode::new("tas".into(), "/tas".into(), NodeType::Variable));
        let mut group = DataNode::new("obs".into(), "/obs".into(), NodeType::Group);
        group.add_child(DataNode::new("pr".into(), "/obs/pr".into(), NodeType::Variable));
        root.add_child(group);
        DatasetHandle::new(PathBuf::from("foo.nc"), Engine::H5Netcdf, root)
    }

    #[test]
    fn test_variable_names_skip_groups() {
        assert_eq!(sample().variable_names(), vec!["tas"]);
    }

    #[test]
    fn test_find_nested() {
        let ds = sample();
        assert_eq!(ds.find("/obs/pr").map(|n| n.name.as_str()), Some("pr"));
        assert!(ds.find("/missing").is_none());
    }

    #[test]
    fn test_dimension_and_attribute() {
        let ds = sample();
        assert_eq!(ds.dimension("time"), Some(365));
        assert_eq!(ds.dimension("lat"), None);
        assert_eq!(ds.attribute("title"), Some("sample"));
    }
}
