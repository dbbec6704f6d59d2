//! NetCDF file reader.

use super::{DataNode, DatasetHandle, NodeType};
use crate::error::{Result, TestingError};
use crate::opener::Engine;
use std::path::Path;

/// NetCDF data reader.
#[derive(Debug)]
pub struct DataReader;

impl DataReader {
    /// Read the structure of a NetCDF file into a dataset handle.
    pub fn read_file(path: &Path, engine: Engine) -> Result<DatasetHandle> {
        if !path.is_file() {
            return Err(TestingError::file_open(
                path.to_path_buf(),
                std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
            ));
        }

        let file = netcdf::open(path)?;
        tracing::debug!("Reading {} with engine {}", path.display(), engine);

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "/".to_string());
        let mut root_node = DataNode::new(name, "/".to_string(), NodeType::Root);

        for attr in file.attributes() {
            root_node
                .attributes
                .insert(attr.name().to_string(), Self::attr_value_to_string(&attr));
        }

        // Dimensions are stored as metadata on the root node
        for dim in file.dimensions() {
            root_node
                .metadata
                .insert(format!("dim_{}", dim.name()), dim.len().to_string());
        }

        for var in file.variables() {
            root_node.add_child(Self::read_variable(&var, ""));
        }

        if let Ok(groups) = file.groups() {
            for group in groups {
                root_node.add_child(Self::read_group(&group, ""));
            }
        }

        Ok(DatasetHandle::new(path.to_path_buf(), engine, root_node))
    }

    fn read_group(group: &netcdf::Group<'_>, parent_path: &str) -> DataNode {
        let group_path = format!("{}/{}", parent_path, group.name());

        let mut group_node =
            DataNode::new(group.name().to_string(), group_path.clone(), NodeType::Group);

        for attr in group.attributes() {
            group_node
                .attributes
                .insert(attr.name().to_string(), Self::attr_value_to_string(&attr));
        }

        for dim in group.dimensions() {
            group_node
                .metadata
                .insert(format!("dim_{}", dim.name()), dim.len().to_string());
        }

        for var in group.variables() {
            group_node.add_child(Self::read_variable(&var, &group_path));
        }

        for child_group in group.groups() {
            group_node.add_child(Self::read_group(&child_group, &group_path));
        }

        group_node
    }

    fn read_variable(var: &netcdf::Variable<'_>, parent_path: &str) -> DataNode {
        let var_name = var.name();
        let mut var_node = DataNode::new(
            var_name.to_string(),
            format!("{}/{}", parent_path, var_name),
            NodeType::Variable,
        );

        var_node.shape = Some(var.dimensions().iter().map(|d| d.len()).collect());
        var_node.dtype = Some(format!("{:?}", var.vartype()));

        let dim_names: Vec<String> = var
            .dimensions()
            .iter()
            .map(|d| d.name().to_string())
            .collect();
        var_node
            .metadata
            .insert("dims".to_string(), dim_names.join(", "));

        for attr in var.attributes() {
            var_node
                .attributes
                .insert(attr.name().to_string(), Self::attr_value_to_string(&attr));
        }

        var_node
    }

    pub(crate) fn attr_value_to_string(attr: &netcdf::Attribute<'_>) -> String {
        use netcdf::AttributeValue;

        match attr.value() {
            Ok(AttributeValue::Uchar(v)) => format!("{}", v),
            Ok(AttributeValue::Schar(v)) => format!("{}", v),
            Ok(AttributeValue::Ushort(v)) => format!("{}", v),
            Ok(AttributeValue::Short(v)) => format!("{}", v),
            Ok(AttributeValue::Uint(v)) => format!("{}", v),
            Ok(AttributeValue::Int(v)) => format!("{}", v),
            Ok(AttributeValue::Ulonglong(v)) => format!("{}", v),
            Ok(AttributeValue::Longlong(v)) => format!("{}", v),
            Ok(AttributeValue::Float(v)) => format!("{}", v),
            Ok(AttributeValue::Double(v)) => format!("{}", v),
            Ok(AttributeValue::Str(v)) => v,
            Ok(AttributeValue::Uchars(v)) => format!("{:?}", v),
            Ok(AttributeValue::Schars(v)) => format!("{:?}", v),
            Ok(AttributeValue::Ushorts(v)) => format!("{:?}", v),
            Ok(AttributeValue::Shorts(v)) => format!("{:?}", v),
            Ok(AttributeValue::Uints(v)) => format!("{:?}", v),
            Ok(AttributeValue::Ints(v)) => format!("{:?}", v),
            Ok(AttributeValue::Ulonglongs(v)) => format!("{:?}", v),
            Ok(AttributeValue::Longlongs(v)) => format!("{:?}", v),
            Ok(AttributeValue::Floats(v)) => format!("{:?}", v),
            Ok(AttributeValue::Doubles(v)) => format!("{:?}", v),
            Ok(AttributeValue::Strs(v)) => v.join(", "),
            Err(_) => format!("{:?}", attr),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_file_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = DataReader::read_file(&dir.path().join("nope.nc"), Engine::Netcdf4).unwrap_err();
        assert!(matches!(err, TestingError::FileOpen { .. }));
    }

    #[test]
    fn test_reads_structure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("small.nc");
        {
            let mut file = netcdf::create(&path).unwrap();
            file.add_attribute("title", "small").unwrap();
            file.add_dimension("time", 4).unwrap();
            let mut var = file.add_variable::<f64>("tas", &["time"]).unwrap();
            var.put_attribute("units", "K").unwrap();
            var.put_values(&[270.0, 271.0, 272.0, 273.0], ..).unwrap();
        }

        let ds = DataReader::read_file(&path, Engine::H5Netcdf).unwrap();
        assert_eq!(ds.engine, Engine::H5Netcdf);
        assert_eq!(ds.attribute("title"), Some("small"));
        assert_eq!(ds.dimension("time"), Some(4));
        let tas = ds.find("/tas").unwrap();
        assert_eq!(tas.shape, Some(vec![4]));
        assert_eq!(tas.attributes.get("units").map(String::as_str), Some("K"));
    }
}
