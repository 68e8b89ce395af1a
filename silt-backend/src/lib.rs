//! Backends for the Silt netlist toolchain.
mod firrtl;
mod traits;

pub use firrtl::{write_firrtl, FirrtlBackend};
pub use traits::Backend;
