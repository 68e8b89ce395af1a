//! Per-cell translation.
//!
//! Every `$`-prefixed cell type is a primitive with fixed semantics; all
//! other types, plus `$paramod` derivations, are instances of other modules
//! in the design. Primitive results are declared as unsigned wires of
//! `Y_WIDTH` and computed by a single primop expression; the semantic gap
//! between the source's fixed-width operators and FIRRTL's widening ones is
//! closed here, operator by operator.
use super::FirrtlWorker;
use silt_netlist::{Cell, PortDirection, SigSpec, State};
use silt_utils::{Error, SiltResult};

/// The unary operator cells.
const UNARY_TYPES: [&str; 8] = [
    "$not",
    "$logic_not",
    "$neg",
    "$reduce_and",
    "$reduce_or",
    "$reduce_xor",
    "$reduce_bool",
    "$reduce_xnor",
];

/// The binary operator cells.
const BINARY_TYPES: [&str; 22] = [
    "$add",
    "$sub",
    "$mul",
    "$div",
    "$mod",
    "$xor",
    "$and",
    "$or",
    "$eq",
    "$eqx",
    "$gt",
    "$ge",
    "$lt",
    "$le",
    "$ne",
    "$nex",
    "$shr",
    "$sshr",
    "$sshl",
    "$shl",
    "$logic_and",
    "$logic_or",
];

impl<'a> FirrtlWorker<'a> {
    pub(super) fn emit_cell(&mut self, cell: &'a Cell) -> SiltResult<()> {
        let ty = cell.ty.as_str();
        if !ty.starts_with('$') || ty.starts_with("$paramod") {
            return self.emit_instance(cell);
        }
        if UNARY_TYPES.contains(&ty) {
            return self.emit_unary(cell);
        }
        if BINARY_TYPES.contains(&ty) {
            return self.emit_binary(cell);
        }
        match ty {
            "$mux" => self.emit_mux(cell),
            "$mem" => self.emit_mem(cell),
            // Superseded by $mem after the memory collection passes.
            "$memwr" | "$memrd" => Ok(()),
            "$dff" => self.emit_dff(cell),
            "$shiftx" => self.emit_shiftx(cell),
            "$shift" => self.emit_shift(cell),
            _ => {
                log::warn!(
                    "Cell type not supported: {} ({}.{})",
                    cell.ty,
                    self.module.name,
                    cell.name
                );
                Ok(())
            }
        }
    }

    /// A cell whose type names another module. The instance's input ports
    /// are driven from the connected signals; output ports drive them.
    fn emit_instance(&mut self, cell: &'a Cell) -> SiltResult<()> {
        let design = self.design;
        let cell_type = self.ns.sanitize(cell.ty);
        // Parameterized derivations encode the parent module in the type;
        // their remaining sigil characters fold to underscores.
        let instance_of: String = if cell.ty.as_str().starts_with("$paramod") {
            cell_type
                .chars()
                .map(|ch| match ch {
                    '\\' | '=' | '\'' | '$' => '_',
                    _ => ch,
                })
                .collect()
        } else {
            cell_type.clone()
        };
        let cell_name = self.ns.sanitize(cell.name);

        let Some(inst_module) = design.module(cell.ty) else {
            log::warn!("No instance for {}.{}", cell_type, cell_name);
            return Ok(());
        };

        let mut block = format!("    inst {} of {}\n", cell_name, instance_of);
        for (port, sig) in &cell.connections {
            if sig.is_empty() {
                continue;
            }
            let first_name = format!("{}.{}", cell_name, self.ns.sanitize(*port));
            let second_name = self.make_expr(sig);
            let (source, sink) = match inst_module.port_direction(*port) {
                PortDirection::Inout => {
                    log::warn!(
                        "Instance port connection {}.{} is INOUT; treating as OUT",
                        cell_type,
                        port
                    );
                    (first_name, second_name)
                }
                PortDirection::Output => (first_name, second_name),
                PortDirection::Undirected => {
                    log::warn!(
                        "Instance port connection {}.{} is NODIRECTION; treating as IN",
                        cell_type,
                        port
                    );
                    (second_name, first_name)
                }
                PortDirection::Input => (second_name, first_name),
            };
            block.push_str(&format!("    {} <= {}\n", sink, source));
        }
        self.wire_exprs.push(block);
        Ok(())
    }

    fn emit_unary(&mut self, cell: &'a Cell) -> SiltResult<()> {
        let ty = cell.ty.as_str();
        let y_id = self.ns.sanitize(cell.name);
        let is_signed = cell.bool_param("A_SIGNED")?;
        let y_width = cell.int_param("Y_WIDTH")?;
        let mut a_expr = self.make_expr(cell.port("A")?);
        self.wire_decls
            .push(format!("    wire {}: UInt<{}>\n", y_id, y_width));

        if is_signed {
            a_expr = format!("asSInt({})", a_expr);
        }

        // A single-bit boolean result must not control padding.
        if !(matches!(ty, "$reduce_bool" | "$logic_not") && y_width == 1) {
            a_expr = format!("pad({}, {})", a_expr, y_width);
        }

        let (primop, args) = match ty {
            "$not" => ("not", a_expr),
            "$neg" => ("neg", a_expr),
            "$logic_not" => ("eq", format!("{}, UInt(0)", a_expr)),
            "$reduce_and" => ("andr", a_expr),
            "$reduce_or" => ("orr", a_expr),
            "$reduce_xor" => ("xorr", a_expr),
            "$reduce_xnor" => ("not", format!("xorr({})", a_expr)),
            "$reduce_bool" => {
                // The comparand takes A's own signedness and width.
                let a_width = cell.int_param("A_WIDTH")?;
                let sign = if is_signed { 'S' } else { 'U' };
                ("neq", format!("{}, {}Int<{}>(0)", a_expr, sign, a_width))
            }
            _ => unreachable!(),
        };

        let mut expr = format!("{}({})", primop, args);
        if is_signed {
            expr = format!("asUInt({})", expr);
        }

        self.cell_exprs.push(format!("    {} <= {}\n", y_id, expr));
        self.register_reverse_wire_map(&y_id, cell.port("Y")?);
        Ok(())
    }

    fn emit_binary(&mut self, cell: &'a Cell) -> SiltResult<()> {
        let ty = cell.ty.as_str();
        let y_id = self.ns.sanitize(cell.name);
        let is_signed = cell.bool_param("A_SIGNED")?;
        let b_signed = cell.bool_param("B_SIGNED")?;
        let y_width = cell.int_param("Y_WIDTH")?;
        let mut a_expr = self.make_expr(cell.port("A")?);
        let mut b_expr = self.make_expr(cell.port("B")?);
        let mut b_padded_width = cell.int_param("B_WIDTH")?;
        self.wire_decls
            .push(format!("    wire {}: UInt<{}>\n", y_id, y_width));

        let is_shift = matches!(ty, "$shr" | "$sshr" | "$shl" | "$sshl");
        let shift_left = matches!(ty, "$shl" | "$sshl");

        if is_signed {
            a_expr = format!("asSInt({})", a_expr);
        }
        // FIRRTL's left shift widens past A's width; shifting the operand
        // at result width first keeps the truncation below exact.
        if shift_left {
            a_expr = format!("pad({}, {})", a_expr, y_width);
        }
        // Shift amounts are always unsigned and keep their own width.
        if !is_shift {
            if b_signed {
                b_expr = format!("asSInt({})", b_expr);
            }
            if b_padded_width < y_width {
                b_padded_width = y_width;
            }
        }
        if is_signed && ty == "$shr" {
            a_expr = format!("asUInt({})", a_expr);
        }

        // FIRRTL shl/dshl widen the result by the shift amount; the source's
        // operators do not, so the primop result is cut back to Y_WIDTH.
        let mut extract_y_bits = false;
        let (primop, always_uint) = match ty {
            "$add" => ("add", false),
            "$sub" => ("sub", false),
            "$mul" => ("mul", false),
            "$div" => ("div", false),
            "$mod" => ("rem", false),
            "$and" => ("and", true),
            "$or" => ("or", true),
            "$xor" => ("xor", true),
            "$eq" | "$eqx" => ("eq", true),
            "$ne" | "$nex" => ("neq", true),
            "$gt" => ("gt", true),
            "$ge" => ("geq", true),
            "$lt" => ("lt", true),
            "$le" => ("leq", true),
            "$shl" | "$sshl" => {
                extract_y_bits = true;
                if cell.port("B")?.is_fully_const() {
                    ("shl", false)
                } else {
                    b_expr = self.gen_dshl(&b_expr, b_padded_width);
                    ("dshl", false)
                }
            }
            "$shr" | "$sshr" => {
                if cell.port("B")?.is_fully_const() {
                    ("shr", false)
                } else {
                    ("dshr", false)
                }
            }
            "$logic_and" | "$logic_or" => {
                a_expr = format!("neq({}, UInt(0))", a_expr);
                b_expr = format!("neq({}, UInt(0))", b_expr);
                (if ty == "$logic_and" { "and" } else { "or" }, true)
            }
            _ => unreachable!(),
        };

        if !is_shift && !b_signed {
            b_expr = format!("asUInt({})", b_expr);
        }

        let mut expr = format!("{}({}, {})", primop, a_expr, b_expr);

        if extract_y_bits {
            expr = format!("bits({}, {}, 0)", expr, y_width - 1);
        }

        // FIRRTL's sub returns signed regardless of its operands.
        if (is_signed && !always_uint) || ty == "$sub" {
            expr = format!("asUInt({})", expr);
        }

        self.cell_exprs.push(format!("    {} <= {}\n", y_id, expr));
        self.register_reverse_wire_map(&y_id, cell.port("Y")?);
        Ok(())
    }

    fn emit_mux(&mut self, cell: &'a Cell) -> SiltResult<()> {
        let y_id = self.ns.sanitize(cell.name);
        let width = cell.int_param("WIDTH")?;
        let a_expr = self.make_expr(cell.port("A")?);
        let b_expr = self.make_expr(cell.port("B")?);
        let s_expr = self.make_expr(cell.port("S")?);
        self.wire_decls
            .push(format!("    wire {}: UInt<{}>\n", y_id, width));

        // FIRRTL argument order is (cond, then, else): B is the then-value.
        let expr = format!("mux({}, {}, {})", s_expr, b_expr, a_expr);

        self.cell_exprs.push(format!("    {} <= {}\n", y_id, expr));
        self.register_reverse_wire_map(&y_id, cell.port("Y")?);
        Ok(())
    }

    fn emit_dff(&mut self, cell: &'a Cell) -> SiltResult<()> {
        let module_name = self.module.name;
        if !cell.bool_param("CLK_POLARITY")? {
            return Err(Error::unsupported(format!(
                "Negative edge clock on FF {}.{}.",
                module_name, cell.name
            )));
        }

        let q_id = self.ns.sanitize(cell.name);
        let width = cell.int_param("WIDTH")?;
        let expr = self.make_expr(cell.port("D")?);
        let clk_expr = format!("asClock({})", self.make_expr(cell.port("CLK")?));

        self.wire_decls.push(format!(
            "    reg {}: UInt<{}>, {}\n",
            q_id, width, clk_expr
        ));
        self.cell_exprs.push(format!("    {} <= {}\n", q_id, expr));
        self.register_reverse_wire_map(&q_id, cell.port("Q")?);
        Ok(())
    }

    fn emit_mem(&mut self, cell: &'a Cell) -> SiltResult<()> {
        let module_name = self.module.name;
        let mem_id = self.ns.sanitize(cell.name);
        let abits = cell.int_param("ABITS")?;
        let width = cell.int_param("WIDTH")?;
        let size = cell.int_param("SIZE")?;
        let rd_ports = cell.int_param("RD_PORTS")?;
        let wr_ports = cell.int_param("WR_PORTS")?;

        if cell
            .param("INIT")?
            .bits()
            .iter()
            .any(|bit| *bit != State::Sx)
        {
            return Err(Error::unsupported(format!(
                "Memory with initialization data: {}.{}",
                module_name, cell.name
            )));
        }

        let rd_clk_enable = cell.param("RD_CLK_ENABLE")?.clone();
        let wr_clk_enable = cell.param("WR_CLK_ENABLE")?.clone();
        let wr_clk_polarity = cell.param("WR_CLK_POLARITY")?.clone();

        if cell.int_param("OFFSET")? != 0 {
            return Err(Error::unsupported(format!(
                "Memory with nonzero offset: {}.{}",
                module_name, cell.name
            )));
        }

        self.cell_exprs.push(format!("    mem {}:\n", mem_id));
        self.cell_exprs
            .push(format!("      data-type => UInt<{}>\n", width));
        self.cell_exprs.push(format!("      depth => {}\n", size));
        for i in 0..rd_ports {
            self.cell_exprs.push(format!("      reader => r{}\n", i));
        }
        for i in 0..wr_ports {
            self.cell_exprs.push(format!("      writer => w{}\n", i));
        }
        self.cell_exprs.push("      read-latency => 0\n".to_string());
        self.cell_exprs.push("      write-latency => 1\n".to_string());
        self.cell_exprs
            .push("      read-under-write => undefined\n".to_string());

        for i in 0..rd_ports {
            if rd_clk_enable.get(i) != State::S0 {
                return Err(Error::unsupported(format!(
                    "Clocked read port {} on memory {}.{}.",
                    i, module_name, cell.name
                )));
            }

            let data_sig = cell.port("RD_DATA")?.extract(i * width, width);
            let addr_sig = cell.port("RD_ADDR")?.extract(i * abits, abits);
            let addr_expr = self.make_expr(&addr_sig);

            self.cell_exprs.push(format!(
                "    {}.r{}.addr <= {}\n",
                mem_id, i, addr_expr
            ));
            self.cell_exprs
                .push(format!("    {}.r{}.en <= UInt<1>(1)\n", mem_id, i));
            // With a read latency of zero the clock is never consulted.
            self.cell_exprs.push(format!(
                "    {}.r{}.clk <= asClock(UInt<1>(0))\n",
                mem_id, i
            ));

            self.register_reverse_wire_map(
                &format!("{}.r{}.data", mem_id, i),
                &data_sig,
            );
        }

        for i in 0..wr_ports {
            if wr_clk_enable.get(i) != State::S1 {
                return Err(Error::unsupported(format!(
                    "Unclocked write port {} on memory {}.{}.",
                    i, module_name, cell.name
                )));
            }
            if wr_clk_polarity.get(i) != State::S1 {
                return Err(Error::unsupported(format!(
                    "Negedge write port {} on memory {}.{}.",
                    i, module_name, cell.name
                )));
            }

            let addr_sig = cell.port("WR_ADDR")?.extract(i * abits, abits);
            let data_sig = cell.port("WR_DATA")?.extract(i * width, width);
            let clk_sig = cell.port("WR_CLK")?.extract(i, 1);
            let addr_expr = self.make_expr(&addr_sig);
            let data_expr = self.make_expr(&data_sig);
            let clk_expr = self.make_expr(&clk_sig);

            let wen_sig = cell.port("WR_EN")?.extract(i * width, width);
            for k in 1..wen_sig.width() {
                if wen_sig.bit(0) != wen_sig.bit(k) {
                    return Err(Error::unsupported(format!(
                        "Complex write enable on port {} on memory {}.{}.",
                        i, module_name, cell.name
                    )));
                }
            }
            let wen_bit = wen_sig.bit(0).ok_or_else(|| {
                Error::malformed_structure(format!(
                    "Missing write enable bits on memory {}.{}",
                    module_name, cell.name
                ))
            })?;
            let wen_expr = self.make_expr(&SigSpec::from(wen_bit));

            self.cell_exprs.push(format!(
                "    {}.w{}.addr <= {}\n",
                mem_id, i, addr_expr
            ));
            self.cell_exprs.push(format!(
                "    {}.w{}.data <= {}\n",
                mem_id, i, data_expr
            ));
            self.cell_exprs
                .push(format!("    {}.w{}.en <= {}\n", mem_id, i, wen_expr));
            self.cell_exprs
                .push(format!("    {}.w{}.mask <= UInt<1>(1)\n", mem_id, i));
            self.cell_exprs.push(format!(
                "    {}.w{}.clk <= asClock({})\n",
                mem_id, i, clk_expr
            ));
        }

        Ok(())
    }

    /// `$shiftx` extracts `Y_WIDTH` bits of A starting at index B; a
    /// negative signed index yields an invalid result.
    fn emit_shiftx(&mut self, cell: &'a Cell) -> SiltResult<()> {
        let y_id = self.ns.sanitize(cell.name);
        let y_width = cell.int_param("Y_WIDTH")?;
        let a_expr = self.make_expr(cell.port("A")?);
        let mut b_expr = self.make_expr(cell.port("B")?);
        self.wire_decls
            .push(format!("    wire {}: UInt<{}>\n", y_id, y_width));

        if cell.bool_param("B_SIGNED")? {
            let b_sign = cell.int_param("B_WIDTH")? - 1;
            b_expr = format!(
                "validif(not(bits({b}, {s}, {s})), {b})",
                b = b_expr,
                s = b_sign
            );
        }
        let expr = format!("dshr({}, {})", a_expr, b_expr);

        self.cell_exprs.push(format!("    {} <= {}\n", y_id, expr));
        self.register_reverse_wire_map(&y_id, cell.port("Y")?);
        Ok(())
    }

    /// `$shift` is a right shift whose amount may be negative, in which
    /// case it shifts left instead.
    fn emit_shift(&mut self, cell: &'a Cell) -> SiltResult<()> {
        let y_id = self.ns.sanitize(cell.name);
        let y_width = cell.int_param("Y_WIDTH")?;
        let a_expr = self.make_expr(cell.port("A")?);
        let b_expr = self.make_expr(cell.port("B")?);
        let b_padded_width = cell.int_param("B_WIDTH")?;
        self.wire_decls
            .push(format!("    wire {}: UInt<{}>\n", y_id, y_width));

        let expr = if cell.bool_param("B_SIGNED")? {
            let dshl = format!(
                "bits(dshl({}, {}), 0, {})",
                a_expr,
                self.gen_dshl(&b_expr, b_padded_width),
                y_width
            );
            let dshr = format!("dshr({}, {})", a_expr, b_expr);
            format!("mux({} < 0, {}, {})", b_expr, dshl, dshr)
        } else {
            format!("dshr({}, {})", a_expr, b_expr)
        };

        self.cell_exprs.push(format!("    {} <= {}\n", y_id, expr));
        self.register_reverse_wire_map(&y_id, cell.port("Y")?);
        Ok(())
    }
}
