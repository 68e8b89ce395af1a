use crate::{Attributes, Const, SigSpec};
use linked_hash_map::LinkedHashMap;
use silt_utils::{Error, GetName, Id, SiltResult};

/// A named wire. Width is at least 1. A wire may be a module port; a wire
/// with both port flags set is representable but rejected by backends.
#[derive(Clone, Debug)]
pub struct Wire {
    pub name: Id,
    pub width: usize,
    pub port_input: bool,
    pub port_output: bool,
    pub attributes: Attributes,
}

impl Wire {
    pub fn new<N: Into<Id>>(name: N, width: usize) -> Self {
        Wire {
            name: name.into(),
            width,
            port_input: false,
            port_output: false,
            attributes: Attributes::default(),
        }
    }

    pub fn is_port(&self) -> bool {
        self.port_input || self.port_output
    }
}

impl GetName for Wire {
    fn name(&self) -> Id {
        self.name
    }
}

/// The direction of a module port, seen from outside the module.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PortDirection {
    Undirected,
    Input,
    Output,
    Inout,
}

/// A cell: a primitive operator (type tag starting with `$`) or an instance
/// of another module in the design. Ports connect to [`SigSpec`]s; behavior
/// is configured through constant parameters.
#[derive(Clone, Debug)]
pub struct Cell {
    pub name: Id,
    pub ty: Id,
    pub parameters: LinkedHashMap<Id, Const>,
    pub connections: LinkedHashMap<Id, SigSpec>,
    pub attributes: Attributes,
}

impl Cell {
    pub fn new<N: Into<Id>, T: Into<Id>>(name: N, ty: T) -> Self {
        Cell {
            name: name.into(),
            ty: ty.into(),
            parameters: LinkedHashMap::new(),
            connections: LinkedHashMap::new(),
            attributes: Attributes::default(),
        }
    }

    pub fn set_param<K: Into<Id>>(&mut self, key: K, value: Const) {
        self.parameters.insert(key.into(), value);
    }

    pub fn set_port<K: Into<Id>>(&mut self, key: K, sig: SigSpec) {
        self.connections.insert(key.into(), sig);
    }

    /// True for built-in operator cells, false for module instances.
    pub fn is_builtin(&self) -> bool {
        self.ty.as_str().starts_with('$')
    }

    /// A required parameter; absence is a structural error.
    pub fn param(&self, name: &str) -> SiltResult<&Const> {
        self.parameters.get(&Id::new(name)).ok_or_else(|| {
            Error::malformed_structure(format!(
                "Cell {} of type {} is missing parameter {}",
                self.name, self.ty, name
            ))
        })
    }

    /// A required integer parameter.
    pub fn int_param(&self, name: &str) -> SiltResult<usize> {
        let value = self.param(name)?;
        value
            .try_as_u64()
            .map(|v| v as usize)
            .ok_or_else(|| {
                Error::malformed_structure(format!(
                    "Parameter {} on cell {} is not a defined integer",
                    name, self.name
                ))
            })
    }

    /// A required boolean parameter.
    pub fn bool_param(&self, name: &str) -> SiltResult<bool> {
        Ok(self.param(name)?.as_bool())
    }

    /// A required port connection; absence is a structural error.
    pub fn port(&self, name: &str) -> SiltResult<&SigSpec> {
        self.connections.get(&Id::new(name)).ok_or_else(|| {
            Error::malformed_structure(format!(
                "Cell {} of type {} has no connection on port {}",
                self.name, self.ty, name
            ))
        })
    }
}

impl GetName for Cell {
    fn name(&self) -> Id {
        self.name
    }
}

/// A module-level continuous connection: `lhs` is driven by `rhs`.
#[derive(Clone, Debug)]
pub struct Connection {
    pub lhs: SigSpec,
    pub rhs: SigSpec,
}

/// A named module: wires and cells in insertion order plus an ordered list
/// of connections.
#[derive(Clone, Debug, Default)]
pub struct Module {
    pub name: Id,
    pub wires: LinkedHashMap<Id, Wire>,
    pub cells: LinkedHashMap<Id, Cell>,
    pub connections: Vec<Connection>,
    pub attributes: Attributes,
}

impl Module {
    pub fn new<N: Into<Id>>(name: N) -> Self {
        Module {
            name: name.into(),
            ..Module::default()
        }
    }

    pub fn add_wire(&mut self, wire: Wire) -> Id {
        let name = wire.name;
        self.wires.insert(name, wire);
        name
    }

    /// Add a plain (non-port) wire.
    pub fn wire<N: Into<Id>>(&mut self, name: N, width: usize) -> Id {
        self.add_wire(Wire::new(name, width))
    }

    pub fn input<N: Into<Id>>(&mut self, name: N, width: usize) -> Id {
        let mut wire = Wire::new(name, width);
        wire.port_input = true;
        self.add_wire(wire)
    }

    pub fn output<N: Into<Id>>(&mut self, name: N, width: usize) -> Id {
        let mut wire = Wire::new(name, width);
        wire.port_output = true;
        self.add_wire(wire)
    }

    pub fn add_cell(&mut self, cell: Cell) -> Id {
        let name = cell.name;
        self.cells.insert(name, cell);
        name
    }

    pub fn connect(&mut self, lhs: SigSpec, rhs: SigSpec) {
        self.connections.push(Connection { lhs, rhs });
    }

    pub fn get_wire(&self, name: Id) -> Option<&Wire> {
        self.wires.get(&name)
    }

    /// Direction of the named port with respect to this module. Names that
    /// are not ports (or not wires at all) read as `Undirected`.
    pub fn port_direction(&self, name: Id) -> PortDirection {
        match self.wires.get(&name) {
            Some(wire) => match (wire.port_input, wire.port_output) {
                (true, true) => PortDirection::Inout,
                (true, false) => PortDirection::Input,
                (false, true) => PortDirection::Output,
                (false, false) => PortDirection::Undirected,
            },
            None => PortDirection::Undirected,
        }
    }
}

impl GetName for Module {
    fn name(&self) -> Id {
        self.name
    }
}
