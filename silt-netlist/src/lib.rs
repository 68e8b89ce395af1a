//! In-memory form of an elaborated netlist design.
//!
//! A [`Design`] owns named [`Module`]s; a module owns [`Wire`]s, [`Cell`]s,
//! and ordered [`Connection`]s. Cells refer to wires through [`SigSpec`]s:
//! LSB-first concatenations of wire slices and literal [`Const`] chunks.
//! All collections preserve insertion order, which backends rely on for
//! deterministic output.
mod attributes;
mod design;
mod logic;
mod module;
mod sigspec;
mod validate;

pub use attributes::Attributes;
pub use design::Design;
pub use logic::{Const, State};
pub use module::{Cell, Connection, Module, PortDirection, Wire};
pub use sigspec::{SigBit, SigChunk, SigSpec};
pub use validate::validate;

pub use silt_utils::{GetName, Id};
