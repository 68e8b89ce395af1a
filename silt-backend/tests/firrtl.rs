//! End-to-end tests for the FIRRTL backend: whole designs in, emitted text
//! out.
use silt_backend::{write_firrtl, Backend, FirrtlBackend};
use silt_netlist::{Cell, Const, Design, Module, SigChunk, SigSpec};
use silt_utils::{Id, OutputFile};

fn single(module: Module) -> Design {
    let mut design = Design::new();
    design.add_module(module);
    design
}

fn emit(design: &Design) -> String {
    let mut out = Vec::new();
    write_firrtl(design, &mut out).expect("emission should succeed");
    String::from_utf8(out).expect("emitted FIRRTL is UTF-8")
}

fn emit_err(design: &Design) -> silt_utils::Error {
    let mut out = Vec::new();
    write_firrtl(design, &mut out).expect_err("emission should fail")
}

/// A module holding one two-operand cell `a ⊕ b → y` with the usual width
/// and signedness parameters.
fn binary_module(
    ty: &str,
    (a_width, a_signed): (usize, bool),
    (b_width, b_signed): (usize, bool),
    y_width: usize,
) -> Module {
    let mut m = Module::new("m");
    let a = m.input("a", a_width);
    let b = m.input("b", b_width);
    let y = m.output("y", y_width);
    let mut cell = Cell::new(format!("{}0", &ty[1..]), ty);
    cell.set_param("A_SIGNED", Const::from(a_signed));
    cell.set_param("B_SIGNED", Const::from(b_signed));
    cell.set_param("A_WIDTH", Const::from_u64(a_width as u64, 32));
    cell.set_param("B_WIDTH", Const::from_u64(b_width as u64, 32));
    cell.set_param("Y_WIDTH", Const::from_u64(y_width as u64, 32));
    cell.set_port("A", SigSpec::wire(a, a_width));
    cell.set_port("B", SigSpec::wire(b, b_width));
    cell.set_port("Y", SigSpec::wire(y, y_width));
    m.add_cell(cell);
    m
}

#[test]
fn identity_wire_module() {
    let mut m = Module::new("m");
    let a = m.input("a", 4);
    let y = m.output("y", 4);
    m.connect(SigSpec::wire(y, 4), SigSpec::wire(a, 4));

    assert_eq!(
        emit(&single(m)),
        "circuit m:\n\
         \x20 module m:\n\
         \x20   input a: UInt<4>\n\
         \x20   output y: UInt<4>\n\
         \n\
         \x20   wire _0: UInt<4>\n\
         \n\
         \x20   _0 <= a\n\
         \n\
         \x20   y <= bits(_0, 3, 0)\n"
    );
}

#[test]
fn signed_add_wraps_operands_and_result() {
    let m = binary_module("$add", (8, true), (8, true), 8);
    let out = emit(&single(m));
    assert!(out.contains("add0 <= asUInt(add(asSInt(a), asSInt(b)))"));
    assert!(out.contains("    wire add0: UInt<8>\n"));
    assert!(out.contains("    y <= bits(add0, 7, 0)\n"));
}

#[test]
fn dynamic_left_shift_is_guarded_and_truncated() {
    let m = binary_module("$shl", (4, false), (32, false), 8);
    let out = emit(&single(m));
    assert!(out.contains(
        "shl0 <= bits(dshl(pad(a, 8), mux(gt(b, UInt<19>(524287)), \
         UInt<19>(524287), bits(b, 18, 0))), 7, 0)"
    ));
}

#[test]
fn narrow_dynamic_shift_amount_needs_no_guard() {
    let m = binary_module("$shl", (4, false), (8, false), 8);
    let out = emit(&single(m));
    assert!(out.contains("shl0 <= bits(dshl(pad(a, 8), b), 7, 0)"));
}

#[test]
fn constant_shift_amount_uses_static_form() {
    let mut m = Module::new("m");
    let a = m.input("a", 8);
    let y = m.output("y", 8);
    let mut cell = Cell::new("shl0", "$shl");
    cell.set_param("A_SIGNED", Const::from(false));
    cell.set_param("B_SIGNED", Const::from(false));
    cell.set_param("A_WIDTH", Const::from_u64(8, 32));
    cell.set_param("B_WIDTH", Const::from_u64(3, 32));
    cell.set_param("Y_WIDTH", Const::from_u64(8, 32));
    cell.set_port("A", SigSpec::wire(a, 8));
    cell.set_port("B", Const::from_u64(2, 3).into());
    cell.set_port("Y", SigSpec::wire(y, 8));
    m.add_cell(cell);

    let out = emit(&single(m));
    assert!(out.contains("shl0 <= bits(shl(pad(a, 8), UInt<3>(\"h2\")), 7, 0)"));
}

#[test]
fn signed_right_shift_reinterprets_a_unsigned() {
    let m = binary_module("$shr", (8, true), (3, false), 8);
    let out = emit(&single(m));
    assert!(out.contains("shr0 <= asUInt(dshr(asUInt(asSInt(a)), b))"));
}

#[test]
fn logical_and_booleanizes_both_operands() {
    let m = binary_module("$logic_and", (8, false), (4, false), 1);
    let out = emit(&single(m));
    assert!(out
        .contains("logic_and0 <= and(neq(a, UInt(0)), asUInt(neq(b, UInt(0))))"));
}

#[test]
fn subtraction_is_always_cast_back_to_unsigned() {
    let m = binary_module("$sub", (8, false), (8, false), 8);
    let out = emit(&single(m));
    assert!(out.contains("sub0 <= asUInt(sub(a, asUInt(b)))"));
}

#[test]
fn comparison_of_signed_operands_stays_unsigned() {
    let m = binary_module("$lt", (8, true), (8, true), 1);
    let out = emit(&single(m));
    // Comparisons produce UInt already; no outer asUInt.
    assert!(out.contains("lt0 <= lt(asSInt(a), asSInt(b))"));
}

#[test]
fn mux_selects_b_on_true() {
    let mut m = Module::new("m");
    let x = m.input("x", 1);
    let y = m.input("y", 1);
    let s = m.input("s", 1);
    let out_wire = m.output("out", 1);
    let mut cell = Cell::new("mux0", "$mux");
    cell.set_param("WIDTH", Const::from_u64(1, 32));
    cell.set_port("A", SigSpec::wire(x, 1));
    cell.set_port("B", SigSpec::wire(y, 1));
    cell.set_port("S", SigSpec::wire(s, 1));
    cell.set_port("Y", SigSpec::wire(out_wire, 1));
    m.add_cell(cell);

    let out = emit(&single(m));
    assert!(out.contains("mux0 <= mux(s, y, x)"));
    assert!(!out.contains("mux(s, x, y)"));
}

#[test]
fn unary_not_pads_to_result_width() {
    let mut m = Module::new("m");
    let a = m.input("a", 4);
    let y = m.output("y", 8);
    let mut cell = Cell::new("not0", "$not");
    cell.set_param("A_SIGNED", Const::from(true));
    cell.set_param("A_WIDTH", Const::from_u64(4, 32));
    cell.set_param("Y_WIDTH", Const::from_u64(8, 32));
    cell.set_port("A", SigSpec::wire(a, 4));
    cell.set_port("Y", SigSpec::wire(y, 8));
    m.add_cell(cell);

    let out = emit(&single(m));
    assert!(out.contains("not0 <= asUInt(not(pad(asSInt(a), 8)))"));
}

#[test]
fn reduce_bool_skips_padding_and_matches_operand_type() {
    let mut m = Module::new("m");
    let a = m.input("a", 8);
    let y = m.output("y", 1);
    let mut cell = Cell::new("red0", "$reduce_bool");
    cell.set_param("A_SIGNED", Const::from(true));
    cell.set_param("A_WIDTH", Const::from_u64(8, 32));
    cell.set_param("Y_WIDTH", Const::from_u64(1, 32));
    cell.set_port("A", SigSpec::wire(a, 8));
    cell.set_port("Y", SigSpec::wire(y, 1));
    m.add_cell(cell);

    let out = emit(&single(m));
    assert!(out.contains("red0 <= asUInt(neq(asSInt(a), SInt<8>(0)))"));
    assert!(!out.contains("pad("));
}

#[test]
fn reduce_xnor_nests_the_reduction() {
    let mut m = Module::new("m");
    let a = m.input("a", 4);
    let y = m.output("y", 1);
    let mut cell = Cell::new("red0", "$reduce_xnor");
    cell.set_param("A_SIGNED", Const::from(false));
    cell.set_param("A_WIDTH", Const::from_u64(4, 32));
    cell.set_param("Y_WIDTH", Const::from_u64(1, 32));
    cell.set_port("A", SigSpec::wire(a, 4));
    cell.set_port("Y", SigSpec::wire(y, 1));
    m.add_cell(cell);

    let out = emit(&single(m));
    assert!(out.contains("red0 <= not(xorr(pad(a, 1)))"));
}

#[test]
fn flip_flop_declares_a_clocked_reg() {
    let mut m = Module::new("m");
    let clk = m.input("clk", 1);
    let d = m.input("d", 8);
    let q = m.output("q", 8);
    let mut cell = Cell::new("ff0", "$dff");
    cell.set_param("CLK_POLARITY", Const::from(true));
    cell.set_param("WIDTH", Const::from_u64(8, 32));
    cell.set_port("CLK", SigSpec::wire(clk, 1));
    cell.set_port("D", SigSpec::wire(d, 8));
    cell.set_port("Q", SigSpec::wire(q, 8));
    m.add_cell(cell);

    let out = emit(&single(m));
    assert!(out.contains("    reg ff0: UInt<8>, asClock(clk)\n"));
    assert!(out.contains("    ff0 <= d\n"));
    assert!(out.contains("    q <= bits(ff0, 7, 0)\n"));
}

#[test]
fn negative_edge_flip_flop_is_rejected() {
    let mut m = Module::new("m");
    let clk = m.input("clk", 1);
    let d = m.input("d", 1);
    let q = m.output("q", 1);
    let mut cell = Cell::new("ff0", "$dff");
    cell.set_param("CLK_POLARITY", Const::from(false));
    cell.set_param("WIDTH", Const::from_u64(1, 32));
    cell.set_port("CLK", SigSpec::wire(clk, 1));
    cell.set_port("D", SigSpec::wire(d, 1));
    cell.set_port("Q", SigSpec::wire(q, 1));
    m.add_cell(cell);

    let err = emit_err(&single(m));
    assert_eq!(err.kind_str(), "unsupported");
    assert!(err.to_string().contains("Negative edge clock"));
}

fn memory_module(rd_clk_enable: Const) -> Module {
    let mut m = Module::new("m");
    let raddr = m.input("raddr", 4);
    let rdata = m.output("rdata", 8);
    let waddr = m.input("waddr", 4);
    let wdata = m.input("wdata", 8);
    let wclk = m.input("wclk", 1);
    let we = m.input("we", 1);
    let mut cell = Cell::new("ram", "$mem");
    cell.set_param("ABITS", Const::from_u64(4, 32));
    cell.set_param("WIDTH", Const::from_u64(8, 32));
    cell.set_param("SIZE", Const::from_u64(16, 32));
    cell.set_param("RD_PORTS", Const::from_u64(1, 32));
    cell.set_param("WR_PORTS", Const::from_u64(1, 32));
    cell.set_param("OFFSET", Const::from_u64(0, 32));
    cell.set_param("INIT", Const::from_bit_str("x").unwrap());
    cell.set_param("RD_CLK_ENABLE", rd_clk_enable);
    cell.set_param("WR_CLK_ENABLE", Const::from_u64(1, 1));
    cell.set_param("WR_CLK_POLARITY", Const::from_u64(1, 1));
    cell.set_port("RD_ADDR", SigSpec::wire(raddr, 4));
    cell.set_port("RD_DATA", SigSpec::wire(rdata, 8));
    cell.set_port("WR_ADDR", SigSpec::wire(waddr, 4));
    cell.set_port("WR_DATA", SigSpec::wire(wdata, 8));
    cell.set_port("WR_CLK", SigSpec::wire(wclk, 1));
    cell.set_port(
        "WR_EN",
        SigSpec::new(vec![
            SigChunk::Slice { wire: we, offset: 0, width: 1 };
            8
        ]),
    );
    m.add_cell(cell);
    m
}

#[test]
fn memory_emits_declaration_and_ports() {
    let out = emit(&single(memory_module(Const::from_u64(0, 1))));
    let decl = "    mem ram:\n\
                \x20     data-type => UInt<8>\n\
                \x20     depth => 16\n\
                \x20     reader => r0\n\
                \x20     writer => w0\n\
                \x20     read-latency => 0\n\
                \x20     write-latency => 1\n\
                \x20     read-under-write => undefined\n";
    assert!(out.contains(decl));
    assert!(out.contains("    ram.r0.addr <= raddr\n"));
    assert!(out.contains("    ram.r0.en <= UInt<1>(1)\n"));
    assert!(out.contains("    ram.r0.clk <= asClock(UInt<1>(0))\n"));
    assert!(out.contains("    ram.w0.addr <= waddr\n"));
    assert!(out.contains("    ram.w0.data <= wdata\n"));
    assert!(out.contains("    ram.w0.en <= we\n"));
    assert!(out.contains("    ram.w0.mask <= UInt<1>(1)\n"));
    assert!(out.contains("    ram.w0.clk <= asClock(wclk)\n"));
    assert!(out.contains("    rdata <= bits(ram.r0.data, 7, 0)\n"));
}

#[test]
fn clocked_read_port_is_rejected() {
    let err = emit_err(&single(memory_module(Const::from_u64(1, 1))));
    assert_eq!(err.kind_str(), "unsupported");
    assert!(err.to_string().contains("Clocked read port 0"));
}

#[test]
fn missing_instance_module_is_skipped() {
    let mut m = Module::new("m");
    let x = m.input("x", 4);
    let mut cell = Cell::new("U0", "foo_mod");
    cell.set_port("p", SigSpec::wire(x, 4));
    m.add_cell(cell);

    let mut out = Vec::new();
    assert!(write_firrtl(&single(m), &mut out).is_ok());
    let out = String::from_utf8(out).unwrap();
    assert!(!out.contains("inst"));
    assert!(out.contains("  module m:\n"));
}

#[test]
fn instance_ports_follow_callee_directions() {
    let mut sub = Module::new("sub");
    sub.input("p", 4);
    sub.output("q", 4);

    let mut top = Module::new("top");
    let x = top.input("x", 4);
    let z = top.output("z", 4);
    let mut cell = Cell::new("u0", "sub");
    cell.set_port("p", SigSpec::wire(x, 4));
    cell.set_port("q", SigSpec::wire(z, 4));
    top.add_cell(cell);

    let mut design = Design::new();
    design.add_module(sub);
    design.add_module(top);
    design.set_top(Id::new("top"));

    let out = emit(&design);
    assert!(out.starts_with("circuit top:\n"));
    assert!(out.contains("    inst u0 of sub\n"));
    assert!(out.contains("    u0.p <= x\n"));
    assert!(out.contains("    z <= u0.q\n"));
}

#[test]
fn inout_module_port_is_fatal() {
    let mut m = Module::new("m");
    let mut wire = silt_netlist::Wire::new("pad", 1);
    wire.port_input = true;
    wire.port_output = true;
    m.add_wire(wire);

    let err = emit_err(&single(m));
    assert_eq!(err.kind_str(), "malformed-structure");
    assert!(err.to_string().contains("is inout"));
}

#[test]
fn undriven_bits_share_one_invalid_sentinel() {
    let mut m = Module::new("m");
    let a = m.input("a", 2);
    let y = m.output("y", 4);
    m.connect(SigSpec::slice(y, 0, 2), SigSpec::wire(a, 2));

    let out = emit(&single(m));
    assert!(out.contains("    wire _1: UInt<1>\n"));
    assert!(out.contains("    _1 is invalid\n"));
    assert!(out.contains("    y <= cat(_1, cat(_1, bits(_0, 1, 0)))\n"));
}

#[test]
fn fully_undriven_wire_is_marked_invalid() {
    let mut m = Module::new("m");
    m.input("a", 1);
    m.wire("w", 4);
    m.output("y", 1);
    let y = Id::new("y");
    m.connect(SigSpec::wire(y, 1), SigSpec::wire(Id::new("a"), 1));

    let out = emit(&single(m));
    assert!(out.contains("    w is invalid\n"));
    assert!(!out.contains("w <="));
}

#[test]
fn shiftx_with_signed_index_guards_the_sign_bit() {
    let m = binary_module("$shiftx", (8, false), (4, true), 2);
    let out = emit(&single(m));
    assert!(out.contains(
        "shiftx0 <= dshr(a, validif(not(bits(b, 3, 3)), b))"
    ));
}

#[test]
fn shift_with_signed_amount_muxes_between_directions() {
    let m = binary_module("$shift", (8, false), (4, true), 8);
    let out = emit(&single(m));
    assert!(out.contains(
        "shift0 <= mux(b < 0, bits(dshl(a, b), 0, 8), dshr(a, b))"
    ));
}

#[test]
fn unknown_cell_type_is_skipped_with_output_intact() {
    let mut m = Module::new("m");
    let a = m.input("a", 1);
    let y = m.output("y", 1);
    let mut cell = Cell::new("weird", "$frobnicate");
    cell.set_port("A", SigSpec::wire(a, 1));
    cell.set_port("Y", SigSpec::wire(y, 1));
    m.add_cell(cell);

    let out = emit(&single(m));
    assert!(!out.contains("frobnicate"));
    assert!(out.contains("    y is invalid\n"));
}

#[test]
fn legacy_memory_port_cells_are_consumed_silently() {
    let mut m = Module::new("m");
    let a = m.input("a", 1);
    let mut cell = Cell::new("mr0", "$memrd");
    cell.set_port("ADDR", SigSpec::wire(a, 1));
    m.add_cell(cell);

    let out = emit(&single(m));
    assert!(!out.contains("mr0"));
}

#[test]
fn colliding_names_stay_distinct() {
    let mut m = Module::new("m");
    let a = m.input("data.q", 2);
    let b = m.input("data_q", 2);
    let y = m.output("y", 4);
    m.connect(
        SigSpec::wire(y, 4),
        SigSpec::new(vec![
            SigChunk::Slice { wire: a, offset: 0, width: 2 },
            SigChunk::Slice { wire: b, offset: 0, width: 2 },
        ]),
    );

    let out = emit(&single(m));
    assert!(out.contains("    input data_q: UInt<2>\n"));
    assert!(out.contains("    input data_q_: UInt<2>\n"));
}

#[test]
fn top_attribute_names_the_circuit() {
    let mut a = Module::new("a");
    a.input("x", 1);
    let mut b = Module::new("b");
    b.attributes.insert("top", Const::from_u64(1, 1));
    b.input("x", 1);

    let mut design = Design::new();
    design.add_module(a);
    design.add_module(b);
    assert!(emit(&design).starts_with("circuit b:\n"));
}

#[test]
fn last_module_is_the_fallback_top() {
    let mut design = Design::new();
    design.add_module(Module::new("first"));
    design.add_module(Module::new("second"));
    assert!(emit(&design).starts_with("circuit second:\n"));
}

#[test]
fn emission_is_idempotent() {
    let mut design = Design::new();
    design.add_module(binary_module("$add", (8, true), (8, true), 8));
    let mut mem = memory_module(Const::from_u64(0, 1));
    mem.name = Id::new("mems");
    design.add_module(mem);
    assert_eq!(emit(&design), emit(&design));
}

#[test]
fn emitted_identifiers_are_firrtl_legal() {
    let mut m = Module::new("top$mod");
    let a = m.input("1in[0]", 2);
    let y = m.output("out.q", 2);
    m.connect(SigSpec::wire(y, 2), SigSpec::wire(a, 2));

    let out = emit(&single(m));
    for token in out
        .split(|ch: char| !(ch.is_ascii_alphanumeric() || ch == '_'))
        .filter(|tok| !tok.is_empty())
    {
        // No identifier-position token may start with a digit unless it is
        // a pure number (widths, indices).
        if token.chars().next().is_some_and(|c| c.is_ascii_digit()) {
            assert!(
                token.chars().all(|c| c.is_ascii_digit() || c == 'h'),
                "illegal identifier {token} in output"
            );
        }
    }
    assert!(out.contains("circuit top_mod:\n"));
    assert!(out.contains("    input _in_0_: UInt<2>\n"));
    assert!(out.contains("    output out_q: UInt<2>\n"));
}

#[test]
fn backend_requires_full_selection() {
    let mut design = Design::new();
    design.add_module(Module::new("m"));
    design.select(std::collections::HashSet::new());

    let err = FirrtlBackend
        .run(&design, OutputFile::Null)
        .expect_err("partial selection must be rejected");
    assert!(err.to_string().contains("fully selected"));
}

#[test]
fn backend_run_validates_then_emits() {
    let mut design = Design::new();
    design.add_module(binary_module("$add", (4, false), (4, false), 4));
    assert!(FirrtlBackend.run(&design, OutputFile::Null).is_ok());
}
