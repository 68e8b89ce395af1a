//! Structural validation of a design.
//!
//! Checks the invariants every backend assumes: signal chunks slice wires
//! that exist and stay inside their bounds, and cells that declare operand
//! widths are connected to signals of those widths.
use crate::{Design, Module, SigChunk, SigSpec};
use silt_utils::{Error, Id, SiltResult};

/// Width-declaring parameters and the ports they constrain.
const WIDTH_PARAMS: [(&str, &str); 3] =
    [("A_WIDTH", "A"), ("B_WIDTH", "B"), ("Y_WIDTH", "Y")];

pub fn validate(design: &Design) -> SiltResult<()> {
    for module in design.modules() {
        validate_module(module)?;
    }
    Ok(())
}

fn validate_module(module: &Module) -> SiltResult<()> {
    for cell in module.cells.values() {
        for (port, sig) in &cell.connections {
            check_sig(module, sig).map_err(|msg| {
                Error::malformed_structure(format!(
                    "{} on port {} of cell {}.{}",
                    msg, port, module.name, cell.name
                ))
            })?;
        }
        for (param, port) in WIDTH_PARAMS {
            let Some(value) = cell.parameters.get(&Id::new(param)) else {
                continue;
            };
            let Some(sig) = cell.connections.get(&Id::new(port)) else {
                continue;
            };
            let declared = value.try_as_u64().ok_or_else(|| {
                Error::malformed_structure(format!(
                    "Parameter {} on cell {}.{} is not a defined integer",
                    param, module.name, cell.name
                ))
            })?;
            if declared as usize != sig.width() {
                return Err(Error::malformed_structure(format!(
                    "Cell {}.{} declares {}={} but connects {} bits to {}",
                    module.name,
                    cell.name,
                    param,
                    declared,
                    sig.width(),
                    port
                )));
            }
        }
    }
    for (index, conn) in module.connections.iter().enumerate() {
        for sig in [&conn.lhs, &conn.rhs] {
            check_sig(module, sig).map_err(|msg| {
                Error::malformed_structure(format!(
                    "{} in connection {} of module {}",
                    msg, index, module.name
                ))
            })?;
        }
    }
    Ok(())
}

fn check_sig(module: &Module, sig: &SigSpec) -> Result<(), String> {
    for chunk in sig.chunks() {
        if let SigChunk::Slice { wire, offset, width } = chunk {
            match module.wires.get(wire) {
                None => return Err(format!("Unknown wire {}", wire)),
                Some(w) if offset + width > w.width => {
                    return Err(format!(
                        "Slice [{}+:{}] exceeds wire {} of width {}",
                        offset, width, wire, w.width
                    ))
                }
                Some(_) => {}
            }
        }
    }
    Ok(())
}
