//! Dataset handles and NetCDF reading.
//!
//! This module turns NetCDF files into the in-memory handles returned by
//! dataset openers, and loads individual variables as `ndarray` arrays.

mod dataset;
mod node;
mod reader;
mod variable_data;

pub use dataset::DatasetHandle;
pub use node::{DataNode, NodeType};
pub use reader::DataReader;
pub use variable_data::{read_variable, LoadedVariable};
