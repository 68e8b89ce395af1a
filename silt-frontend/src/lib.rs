//! Reader for the JSON netlist interchange format.
//!
//! The interchange format flattens every signal to a vector of design-global
//! net-bit indices. Rebuilding [`SigSpec`]s therefore needs a canonical owner
//! for every bit: the first wire (ports before plain nets) whose `bits`
//! vector mentions it. Cell connections resolve through that table, and a
//! wire whose own bits are canonically owned elsewhere becomes a module
//! connection driving it from its owner.
mod json;

use json::{JsonAttr, JsonBit, JsonCell, JsonDesign, JsonDirection, JsonModule};
use silt_netlist::{
    Attributes, Cell, Const, Design, Module, SigChunk, SigSpec, State, Wire,
};
use silt_utils::{Error, Id, SiltResult};
use std::collections::HashMap;
use std::io;

/// Read a design from a JSON stream.
pub fn read_design<R: io::Read>(reader: R) -> SiltResult<Design> {
    let json: JsonDesign = serde_json::from_reader(reader)
        .map_err(|err| Error::invalid_file(err.to_string()))?;
    build_design(json)
}

/// Read a design from JSON text.
pub fn parse_design(text: &str) -> SiltResult<Design> {
    let json: JsonDesign = serde_json::from_str(text)
        .map_err(|err| Error::invalid_file(err.to_string()))?;
    build_design(json)
}

fn build_design(json: JsonDesign) -> SiltResult<Design> {
    if let Some(creator) = &json.creator {
        log::debug!("Reading netlist written by {}", creator);
    }
    let mut design = Design::new();
    for (name, module) in &json.modules {
        let module = build_module(name, module)?;
        design.add_module(module);
    }
    Ok(design)
}

/// One bit of a signal after resolving it through the owner table.
#[derive(Clone, Copy, PartialEq, Eq)]
enum ResolvedBit {
    Const(State),
    Wire { wire: Id, index: usize },
}

fn build_module(name: &str, json: &JsonModule) -> SiltResult<Module> {
    let mut module = Module::new(name);
    module.attributes = convert_attributes(&json.attributes);

    // Wires come from ports first, then from nets not already named as
    // ports. The same order decides canonical bit ownership.
    let mut wire_bits: Vec<(Id, Vec<JsonBit>)> = Vec::new();
    for (port_name, port) in &json.ports {
        let mut wire = Wire::new(port_name.as_str(), port.bits.len());
        match port.direction {
            JsonDirection::Input => wire.port_input = true,
            JsonDirection::Output => wire.port_output = true,
            JsonDirection::Inout => {
                wire.port_input = true;
                wire.port_output = true;
            }
        }
        wire_bits.push((wire.name, port.bits.clone()));
        module.add_wire(wire);
    }
    for (net_name, net) in &json.netnames {
        let name = Id::new(net_name);
        if let Some(wire) = module.wires.get_mut(&name) {
            wire.attributes = convert_attributes(&net.attributes);
            continue;
        }
        if net.bits.is_empty() {
            log::warn!("Ignoring zero-width net {}.{}", module.name, net_name);
            continue;
        }
        let mut wire = Wire::new(name, net.bits.len());
        wire.attributes = convert_attributes(&net.attributes);
        wire_bits.push((wire.name, net.bits.clone()));
        module.add_wire(wire);
    }

    let mut owners: HashMap<u64, (Id, usize)> = HashMap::new();
    for (wire, bits) in &wire_bits {
        for (index, bit) in bits.iter().enumerate() {
            if let JsonBit::Index(net) = bit {
                owners.entry(*net).or_insert((*wire, index));
            }
        }
    }

    for (cell_name, cell) in &json.cells {
        let cell = build_cell(&module.name, cell_name, cell, &owners)?;
        module.add_cell(cell);
    }

    // Wires that are not the canonical owner of their bits are driven by
    // whoever is: emit one connection per maximal aliased run.
    let mut connections = Vec::new();
    for (wire, bits) in &wire_bits {
        let mut run_start = 0;
        let mut run: Vec<ResolvedBit> = Vec::new();
        for (index, bit) in bits.iter().enumerate() {
            let resolved = match bit {
                JsonBit::Index(net) => {
                    let &(owner, owner_index) = &owners[net];
                    if owner == *wire && owner_index == index {
                        if !run.is_empty() {
                            connections.push(alias_connection(
                                *wire, run_start, &run,
                            ));
                            run.clear();
                        }
                        continue;
                    }
                    ResolvedBit::Wire { wire: owner, index: owner_index }
                }
                JsonBit::Literal(text) => {
                    ResolvedBit::Const(literal_state(&module.name, text)?)
                }
            };
            if run.is_empty() {
                run_start = index;
            }
            run.push(resolved);
        }
        if !run.is_empty() {
            connections.push(alias_connection(*wire, run_start, &run));
        }
    }
    for (lhs, rhs) in connections {
        module.connect(lhs, rhs);
    }

    Ok(module)
}

fn alias_connection(
    wire: Id,
    start: usize,
    bits: &[ResolvedBit],
) -> (SigSpec, SigSpec) {
    let lhs = SigSpec::slice(wire, start, bits.len());
    (lhs, collect_chunks(bits))
}

fn build_cell(
    module: &Id,
    name: &str,
    json: &JsonCell,
    owners: &HashMap<u64, (Id, usize)>,
) -> SiltResult<Cell> {
    let mut cell = Cell::new(name, json.ty.as_str());
    cell.attributes = convert_attributes(&json.attributes);
    for (key, value) in &json.parameters {
        match attr_const(value) {
            Some(c) => cell.set_param(key.as_str(), c),
            None => {
                return Err(Error::invalid_file(format!(
                    "Parameter {} on cell {}.{} is not a number or bit string",
                    key, module, name
                )))
            }
        }
    }
    for (port, bits) in &json.connections {
        let mut resolved = Vec::with_capacity(bits.len());
        for bit in bits {
            resolved.push(match bit {
                JsonBit::Index(net) => {
                    let &(wire, index) = owners.get(net).ok_or_else(|| {
                        Error::invalid_file(format!(
                            "Net bit {} on port {} of cell {}.{} has no named wire",
                            net, port, module, name
                        ))
                    })?;
                    ResolvedBit::Wire { wire, index }
                }
                JsonBit::Literal(text) => {
                    ResolvedBit::Const(literal_state(module, text)?)
                }
            });
        }
        cell.set_port(port.as_str(), collect_chunks(&resolved));
    }
    Ok(cell)
}

/// Coalesce resolved bits into the fewest chunks: adjacent constant bits
/// merge, and adjacent bits of one wire at consecutive offsets merge.
fn collect_chunks(bits: &[ResolvedBit]) -> SigSpec {
    let mut chunks: Vec<SigChunk> = Vec::new();
    for bit in bits {
        let grown = match (bit, chunks.last_mut()) {
            (ResolvedBit::Const(state), Some(SigChunk::Const(c))) => {
                let mut wider = c.bits().to_vec();
                wider.push(*state);
                *c = Const::new(wider);
                true
            }
            (
                ResolvedBit::Wire { wire, index },
                Some(SigChunk::Slice { wire: w, offset, width }),
            ) if wire == w && *offset + *width == *index => {
                *width += 1;
                true
            }
            _ => false,
        };
        if !grown {
            chunks.push(match bit {
                ResolvedBit::Const(state) => {
                    SigChunk::Const(Const::new(vec![*state]))
                }
                ResolvedBit::Wire { wire, index } => SigChunk::Slice {
                    wire: *wire,
                    offset: *index,
                    width: 1,
                },
            });
        }
    }
    SigSpec::new(chunks)
}

fn literal_state(module: &Id, text: &str) -> SiltResult<State> {
    let mut chars = text.chars();
    match (chars.next().and_then(State::from_char), chars.next()) {
        (Some(state), None) => Ok(state),
        _ => Err(Error::invalid_file(format!(
            "Invalid constant bit \"{}\" in module {}",
            text, module
        ))),
    }
}

fn convert_attributes(
    attrs: &linked_hash_map::LinkedHashMap<String, JsonAttr>,
) -> Attributes {
    let mut out = Attributes::default();
    for (key, value) in attrs {
        match attr_const(value) {
            Some(c) => out.insert(key.as_str(), c),
            // Free-text annotations (source locations and the like) have no
            // constant form and nothing downstream reads them.
            None => log::debug!("Dropping non-constant attribute {}", key),
        }
    }
    out
}

fn attr_const(value: &JsonAttr) -> Option<Const> {
    match value {
        JsonAttr::Int(v) => Some(Const::from_u64(*v, 32)),
        JsonAttr::Str(s) => Const::from_bit_str(s),
    }
}
