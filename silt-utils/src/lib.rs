//! Shared utilities for the Silt netlist toolchain.
mod errors;
mod id;
mod out_file;

pub use errors::{Error, SiltResult};
pub use id::{GetName, Id};
pub use out_file::OutputFile;
