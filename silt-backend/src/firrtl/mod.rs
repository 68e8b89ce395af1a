//! FIRRTL backend.
//!
//! Walks every module of an elaborated design and emits an equivalent FIRRTL
//! circuit. Wires and ports are declared as `UInt`; signedness is applied at
//! use sites with `asSInt`/`asUInt` so that wire boundaries stay unsigned.
//! Cells that drive wire bits record their result expressions in a reverse
//! wire map, and each wire is reassembled from that map at the end of the
//! module, one `bits(...)` term per maximal contiguous run.
mod cells;
mod names;

use crate::traits::Backend;
use names::Namespace;
use silt_netlist::{
    Connection, Const, Design, Module, SigBit, SigChunk, SigSpec, State,
};
use silt_utils::{Error, Id, OutputFile, SiltResult};
use std::collections::HashMap;
use std::io::Write;
use std::time::Instant;

// For historic reasons, this is one greater than the maximum allowed
// dynamic left-shift amount width.
const FIRRTL_MAX_DSH_WIDTH_ERROR: usize = 20;

/// Implements the FIRRTL backend. The input must already be in mux-tree
/// form (priority muxes rewritten into balanced binary `$mux` trees);
/// `$pmux` cells that reach this backend are skipped with a warning.
#[derive(Default)]
pub struct FirrtlBackend;

impl Backend for FirrtlBackend {
    fn name(&self) -> &'static str {
        "firrtl"
    }

    fn validate(design: &Design) -> SiltResult<()> {
        if !design.is_fully_selected() {
            return Err(Error::misc(
                "This command only operates on fully selected designs",
            ));
        }
        silt_netlist::validate(design)
    }

    fn emit(design: &Design, file: &mut OutputFile) -> SiltResult<()> {
        let mut f = file.get_write()?;
        write_firrtl(design, &mut f)?;
        f.flush()?;
        Ok(())
    }
}

/// Emit the whole design as a FIRRTL circuit.
///
/// The circuit is named after the designated top module, or the first module
/// carrying a `top` attribute, or the last module as a fallback. Module and
/// port names are sanitized up front so that identifiers referenced across
/// modules stabilize before any cell-local name can shadow them.
pub fn write_firrtl<W: Write>(design: &Design, f: &mut W) -> SiltResult<()> {
    let mut ns = Namespace::new();

    let mut top = design.top_module();
    let mut last = None;
    for module in design.modules() {
        ns.sanitize(module.name);
        last = Some(module);
        if top.is_none() && module.attributes.get_bool("top") {
            top = Some(module);
        }
        for wire in module.wires.values() {
            if wire.is_port() {
                ns.sanitize(wire.name);
            }
        }
    }
    let top = match top.or(last) {
        Some(module) => module,
        None => return Err(Error::misc("Cannot emit an empty design")),
    };

    writeln!(f, "circuit {}:", ns.sanitize(top.name))?;

    for module in design.modules() {
        let time = Instant::now();
        FirrtlWorker::new(module, design, &mut ns).run(f)?;
        log::info!("Emitted `{}` in {:?}", module.name, time.elapsed());
    }
    Ok(())
}

/// Per-module emission state.
///
/// Output is collected into four buffers and flushed at the end so that
/// declarations always precede the statements that use them, whatever order
/// the cells are visited in.
pub(crate) struct FirrtlWorker<'a> {
    module: &'a Module,
    design: &'a Design,
    ns: &'a mut Namespace,
    /// Maps each driven wire bit to the emitted identifier and bit offset
    /// that computes it.
    reverse_wire_map: HashMap<SigBit, (String, usize)>,
    /// Shared 1-bit sentinel for undriven bits, allocated lazily.
    unconn_id: Option<String>,
    port_decls: Vec<String>,
    wire_decls: Vec<String>,
    cell_exprs: Vec<String>,
    wire_exprs: Vec<String>,
}

impl<'a> FirrtlWorker<'a> {
    fn new(module: &'a Module, design: &'a Design, ns: &'a mut Namespace) -> Self {
        FirrtlWorker {
            module,
            design,
            ns,
            reverse_wire_map: HashMap::new(),
            unconn_id: None,
            port_decls: Vec::new(),
            wire_decls: Vec::new(),
            cell_exprs: Vec::new(),
            wire_exprs: Vec::new(),
        }
    }

    /// Render a signal as an unsigned FIRRTL expression of its full width.
    ///
    /// Chunks are visited LSB first and folded with `cat(new, acc)`, leaving
    /// the highest-order chunk leftmost to match `cat(hi, lo)`.
    fn make_expr(&mut self, sig: &SigSpec) -> String {
        let mut expr = String::new();
        for chunk in sig.chunks() {
            let new_expr = match chunk {
                SigChunk::Const(value) => literal_expr(value),
                SigChunk::Slice { wire, offset, width } => {
                    let wire_id = self.ns.sanitize(*wire);
                    let full = self
                        .module
                        .get_wire(*wire)
                        .is_some_and(|w| *offset == 0 && *width == w.width);
                    if full {
                        wire_id
                    } else {
                        format!(
                            "bits({}, {}, {})",
                            wire_id,
                            offset + width - 1,
                            offset
                        )
                    }
                }
            };
            expr = if expr.is_empty() {
                new_expr
            } else {
                format!("cat({}, {})", new_expr, expr)
            };
        }
        expr
    }

    /// Record `id` as the driver of every wire bit of `sig`.
    fn register_reverse_wire_map(&mut self, id: &str, sig: &SigSpec) {
        for (index, bit) in sig.bits().enumerate() {
            if let SigBit::Wire { .. } = bit {
                self.reverse_wire_map.insert(bit, (id.to_string(), index));
            }
        }
    }

    /// Guard a dynamic left-shift amount against FIRRTL's width cap:
    /// amounts at least 20 bits wide are saturated at the widest
    /// representable shift.
    fn gen_dshl(&self, b_expr: &str, b_padded_width: usize) -> String {
        if b_padded_width >= FIRRTL_MAX_DSH_WIDTH_ERROR {
            let max_bits = FIRRTL_MAX_DSH_WIDTH_ERROR - 1;
            let max_shift =
                format!("UInt<{}>({})", max_bits, (1u32 << max_bits) - 1);
            format!(
                "mux(gt({b}, {max}), {max}, bits({b}, {hi}, 0))",
                b = b_expr,
                max = max_shift,
                hi = max_bits - 1
            )
        } else {
            b_expr.to_string()
        }
    }

    fn run<W: Write>(mut self, f: &mut W) -> SiltResult<()> {
        let module = self.module;
        writeln!(f, "  module {}:", self.ns.sanitize(module.name))?;

        for wire in module.wires.values() {
            let wire_name = self.ns.sanitize(wire.name);
            // FIRRTL has no initial values on wires; note and drop them.
            if let Some(init) = wire.attributes.get("init") {
                log::warn!(
                    "Initial value ({}) for ({}.{}) not supported",
                    init,
                    module.name,
                    wire.name
                );
            }
            if wire.is_port() {
                if wire.port_input && wire.port_output {
                    return Err(Error::malformed_structure(format!(
                        "Module port {}.{} is inout!",
                        module.name, wire.name
                    )));
                }
                self.port_decls.push(format!(
                    "    {} {}: UInt<{}>\n",
                    if wire.port_input { "input" } else { "output" },
                    wire_name,
                    wire.width
                ));
            } else {
                self.wire_decls.push(format!(
                    "    wire {}: UInt<{}>\n",
                    wire_name, wire.width
                ));
            }
        }

        for cell in module.cells.values() {
            self.emit_cell(cell)?;
        }

        for conn in &module.connections {
            self.emit_connection(conn);
        }

        for wire in module.wires.values() {
            if wire.port_input {
                continue;
            }
            self.reassemble_wire(wire.name, wire.width);
        }

        for decl in &self.port_decls {
            f.write_all(decl.as_bytes())?;
        }
        writeln!(f)?;
        for decl in &self.wire_decls {
            f.write_all(decl.as_bytes())?;
        }
        writeln!(f)?;
        for stmt in &self.cell_exprs {
            f.write_all(stmt.as_bytes())?;
        }
        writeln!(f)?;
        for stmt in &self.wire_exprs {
            f.write_all(stmt.as_bytes())?;
        }
        Ok(())
    }

    /// A module-level connection becomes an anonymous wire assigned from the
    /// right-hand side; the left-hand bits then pick it up through the
    /// reverse wire map like any cell result.
    fn emit_connection(&mut self, conn: &Connection) {
        let y_id = self.ns.fresh();
        let expr = self.make_expr(&conn.rhs);
        self.wire_decls.push(format!(
            "    wire {}: UInt<{}>\n",
            y_id,
            conn.lhs.width()
        ));
        self.cell_exprs.push(format!("    {} <= {}\n", y_id, expr));
        self.register_reverse_wire_map(&y_id, &conn.lhs);
    }

    /// Rebuild the expression driving `wire` from the reverse wire map,
    /// collapsing maximal runs of bits that are consecutive in one emitted
    /// id into single `bits(...)` terms. Undriven bits share one lazily
    /// allocated invalid sentinel; a wire with no driven bits at all is
    /// simply marked invalid.
    fn reassemble_wire(&mut self, name: Id, width: usize) {
        let mut expr = String::new();
        let mut cursor = 0;
        let mut is_valid = false;
        let mut made_unconn_id = false;

        while cursor < width {
            let mut chunk_width = 1;
            let start = SigBit::Wire { wire: name, index: cursor };
            let new_expr;

            if let Some(start_map) = self.reverse_wire_map.get(&start).cloned()
            {
                while cursor + chunk_width < width {
                    let stop = SigBit::Wire {
                        wire: name,
                        index: cursor + chunk_width,
                    };
                    match self.reverse_wire_map.get(&stop) {
                        Some((id, offset))
                            if *id == start_map.0
                                && *offset == start_map.1 + chunk_width =>
                        {
                            chunk_width += 1;
                        }
                        _ => break,
                    }
                }
                new_expr = format!(
                    "bits({}, {}, {})",
                    start_map.0,
                    start_map.1 + chunk_width - 1,
                    start_map.1
                );
                is_valid = true;
            } else {
                new_expr = match self.unconn_id.clone() {
                    Some(id) => id,
                    None => {
                        let id = self.ns.fresh();
                        made_unconn_id = true;
                        self.unconn_id = Some(id.clone());
                        id
                    }
                };
            }

            expr = if expr.is_empty() {
                new_expr
            } else {
                format!("cat({}, {})", new_expr, expr)
            };
            cursor += chunk_width;
        }

        if is_valid {
            if made_unconn_id {
                if let Some(unconn) = &self.unconn_id {
                    self.wire_decls
                        .push(format!("    wire {}: UInt<1>\n", unconn));
                    self.wire_decls
                        .push(format!("    {} is invalid\n", unconn));
                }
            }
            self.wire_exprs.push(format!(
                "    {} <= {}\n",
                self.ns.sanitize(name),
                expr
            ));
        } else {
            if made_unconn_id {
                // Nothing referenced the sentinel after all; let the next
                // wire allocate a new one.
                self.unconn_id = None;
            }
            self.wire_decls
                .push(format!("    {} is invalid\n", self.ns.sanitize(name)));
        }
    }
}

/// Render a constant as `UInt<W>("h...")`: the bit vector is zero-extended to
/// a whole number of nibbles and folded into lowercase hex, most significant
/// nibble first. Undefined bits read as zero.
fn literal_expr(value: &Const) -> String {
    let mut bits = value.bits().to_vec();
    let mut expr = format!("UInt<{}>(\"h", bits.len());
    while bits.len() % 4 != 0 {
        bits.push(State::S0);
    }
    for nibble in (0..bits.len() / 4).rev() {
        let mut val = 0u32;
        for (weight, bit) in bits[nibble * 4..nibble * 4 + 4].iter().enumerate()
        {
            if *bit == State::S1 {
                val += 1 << weight;
            }
        }
        expr.push(char::from_digit(val, 16).unwrap_or('0'));
    }
    expr.push_str("\")");
    expr
}
