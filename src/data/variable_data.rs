//! Variable data reading.

use crate::error::{Result, TestingError};
use ndarray::{ArrayD, IxDyn};
use netcdf::types::{FloatType, IntType, NcVariableType};
use std::collections::BTreeMap;
use std::path::Path;

/// Loaded variable with its data and metadata.
#[derive(Debug, Clone)]
pub struct LoadedVariable {
    /// Variable name.
    pub name: String,
    /// Shape of the data.
    pub shape: Vec<usize>,
    /// Dimension names.
    pub dim_names: Vec<String>,
    /// Variable attributes.
    pub attributes: BTreeMap<String, String>,
    /// Variable data type.
    pub dtype: String,
    /// The multi-dimensional data as f64, CF scaling applied.
    pub data: ArrayD<f64>,
    /// Minimum and maximum of the finite values.
    pub min_max: Option<(f64, f64)>,
    /// Mean of the finite values.
    pub mean: Option<f64>,
    /// Sample standard deviation of the finite values.
    pub std: Option<f64>,
    /// Count of valid (finite) values.
    pub valid_count: usize,
}

impl LoadedVariable {
    /// Units attribute, if any.
    pub fn units(&self) -> Option<&str> {
        self.attributes.get("units").map(String::as_str)
    }

    /// Get a 1D slice along a dimension, fixing all other dimensions.
    ///
    /// `fixed_indices` holds one index per dimension; the entry at `dim` is
    /// ignored. Returns an empty vector when `dim` is out of range or the
    /// index count does not match the variable's rank.
    pub fn get_1d_slice(&self, dim: usize, fixed_indices: &[usize]) -> Vec<f64> {
        let Some(&len) = self.shape.get(dim) else {
            return Vec::new();
        };
        if fixed_indices.len() != self.shape.len() {
            return Vec::new();
        }

        let mut idx = fixed_indices.to_vec();
        (0..len)
            .filter_map(|i| {
                idx[dim] = i;
                self.data.get(IxDyn(&idx)).copied()
            })
            .collect()
    }
}

/// Read variable data from a NetCDF file.
pub fn read_variable(file_path: &Path, var_path: &str) -> Result<LoadedVariable> {
    let file = netcdf::open(file_path)?;

    // Variables in groups are addressed without the leading slash
    let netcdf_path = var_path.trim_start_matches('/');
    let var_name = netcdf_path.rsplit('/').next().unwrap_or(netcdf_path);

    let var = file.variable(netcdf_path).ok_or_else(|| {
        TestingError::NetCDF(format!("Variable '{}' not found in {}", netcdf_path, file_path.display()))
    })?;

    let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
    let dim_names: Vec<String> = var.dimensions().iter().map(|d| d.name().to_string()).collect();

    let mut attributes = BTreeMap::new();
    for attr in var.attributes() {
        attributes.insert(
            attr.name().to_string(),
            crate::data::reader::DataReader::attr_value_to_string(&attr),
        );
    }

    // CF packing convention
    let scale_factor = attributes
        .get("scale_factor")
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(1.0);
    let add_offset = attributes
        .get("add_offset")
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(0.0);

    let dtype = format!("{:?}", var.vartype()).replace("NcVariableType::", "").to_lowercase();

    let mut data = read_variable_array(&var, &shape)?;
    if scale_factor != 1.0 || add_offset != 0.0 {
        data.mapv_inplace(|v| v * scale_factor + add_offset);
    }

    let finite: Vec<f64> = data.iter().copied().filter(|v| v.is_finite()).collect();
    let valid_count = finite.len();
    let min_max = finite.iter().fold(None, |acc: Option<(f64, f64)>, &v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    });
    let mean = (valid_count > 0).then(|| finite.iter().sum::<f64>() / valid_count as f64);
    let std = match mean {
        Some(m) if valid_count > 1 => {
            let ssd: f64 = finite.iter().map(|v| (v - m) * (v - m)).sum();
            Some((ssd / (valid_count - 1) as f64).sqrt())
        },
        _ => None,
    };

    Ok(LoadedVariable {
        name: var_name.to_string(),
        shape,
        dim_names,
        attributes,
        dtype,
        data,
        min_max,
        mean,
        std,
        valid_count,
    })
}

fn read_variable_array(var: &netcdf::Variable<'_>, shape: &[usize]) -> Result<ArrayD<f64>> {
    let from_vec = |v: Vec<f64>| -> Result<ArrayD<f64>> {
        ArrayD::from_shape_vec(IxDyn(shape), v)
            .map_err(|e| TestingError::NetCDF(format!("Invalid shape/data size: {}", e)))
    };

    match var.vartype() {
        NcVariableType::Float(FloatType::F64) => {
            let values: Vec<f64> = var.get_values(..)?;
            from_vec(values)
        },
        NcVariableType::Float(FloatType::F32) => {
            let values: Vec<f32> = var.get_values(..)?;
            from_vec(values.into_iter().map(f64::from).collect())
        },
        NcVariableType::Int(IntType::I64) => {
            let values: Vec<i64> = var.get_values(..)?;
            from_vec(values.into_iter().map(|x| x as f64).collect())
        },
        NcVariableType::Int(IntType::I32) => {
            let values: Vec<i32> = var.get_values(..)?;
            from_vec(values.into_iter().map(f64::from).collect())
        },
        NcVariableType::Int(IntType::I16) => {
            let values: Vec<i16> = var.get_values(..)?;
            from_vec(values.into_iter().map(f64::from).collect())
        },
        NcVariableType::Int(IntType::I8) => {
            let values: Vec<i8> = var.get_values(..)?;
            from_vec(values.into_iter().map(f64::from).collect())
        },
        other => Err(TestingError::NetCDF(format!(
            "Unsupported variable type: {:?}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_variable_applies_scaling() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("packed.nc");
        {
            let mut file = netcdf::create(&path).unwrap();
            file.add_dimension("time", 3).unwrap();
            let mut var = file.add_variable::<i16>("tas", &["time"]).unwrap();
            var.put_attribute("scale_factor", 0.5f64).unwrap();
            var.put_attribute("add_offset", 250.0f64).unwrap();
            var.put_attribute("units", "K").unwrap();
            var.put_values(&[0i16, 2, 4], ..).unwrap();
        }

        let var = read_variable(&path, "/tas").unwrap();
        assert_eq!(var.shape, vec![3]);
        assert_eq!(var.units(), Some("K"));
        assert_eq!(var.get_1d_slice(0, &[0]), vec![250.0, 251.0, 252.0]);
        assert_eq!(var.min_max, Some((250.0, 252.0)));
        assert_eq!(var.mean, Some(251.0));
        assert_eq!(var.valid_count, 3);
    }

    #[test]
    fn test_1d_slice_rejects_mismatched_indices() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grid.nc");
        {
            let mut file = netcdf::create(&path).unwrap();
            file.add_dimension("time", 2).unwrap();
            file.add_dimension("location", 3).unwrap();
            let mut var = file.add_variable::<f64>("tas", &["time", "location"]).unwrap();
            var.put_values(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], ..).unwrap();
        }

        let var = read_variable(&path, "tas").unwrap();
        assert_eq!(var.get_1d_slice(1, &[1, 0]), vec![4.0, 5.0, 6.0]);
        assert_eq!(var.get_1d_slice(0, &[0, 2]), vec![3.0, 6.0]);
        assert!(var.get_1d_slice(1, &[0]).is_empty());
        assert!(var.get_1d_slice(0, &[]).is_empty());
        assert!(var.get_1d_slice(2, &[0, 0]).is_empty());
    }

    #[test]
    fn test_missing_variable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.nc");
        netcdf::create(&path).unwrap();
        assert!(matches!(
            read_variable(&path, "/nope"),
            Err(TestingError::NetCDF(_))
        ));
    }
}
