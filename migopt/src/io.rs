//! Reading and writing combinational AIGER files.
//!
//! ASCII files (`aag`) are parsed with the `aiger` crate; binary files (`aig`) are decoded here. Both are first
//! turned into a [`Description`], which is then resolved into an [`Aig`] regardless of the order the gates were
//! written in.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::traits::{Builder, Network};
use crate::{Aig, Signal};

/// The contents of an AIGER file, as literals.
#[derive(Debug, Default)]
struct Description {
    max_variable: usize,
    inputs: Vec<usize>,
    outputs: Vec<usize>,
    ands: Vec<(usize, usize, usize)>,
    input_names: Vec<Option<String>>,
    output_names: Vec<Option<String>>,
}

/// Literals are 32-bit in AIGER tools, so no variable index may exceed this.
const MAX_VARIABLE: usize = (u32::MAX >> 1) as usize;

/// The numbers of a header line, checked for features this crate does not handle.
struct Header {
    binary: bool,
    max_variable: usize,
    inputs: usize,
    outputs: usize,
    ands: usize,
}

fn parse_number(token: &str, what: &str) -> Result<usize> {
    token.parse().map_err(|_| Error::parse(format!("expected {what}, found {token:?}")))
}

fn parse_header(line: &str) -> Result<Header> {
    let mut tokens = line.split_ascii_whitespace();
    let binary = match tokens.next() {
        Some("aag") => false,
        Some("aig") => true,
        other => return Err(Error::parse(format!("not an AIGER header: {other:?}"))),
    };

    let numbers = tokens.map(|token| parse_number(token, "a header field")).collect::<Result<Vec<_>>>()?;
    let [max_variable, inputs, latches, outputs, ands, extensions @ ..] = numbers.as_slice() else {
        return Err(Error::parse("header needs at least five fields"));
    };

    if *latches != 0 {
        return Err(Error::Unsupported(format!("{latches} latches")));
    }
    if extensions.len() > 4 {
        return Err(Error::parse("too many header fields"));
    }
    if let Some(position) = extensions.iter().position(|&count| count != 0) {
        let section =
            ["bad state properties", "invariant constraints", "justice properties", "fairness constraints"][position];
        return Err(Error::Unsupported(section.to_string()));
    }
    if [max_variable, inputs, outputs, ands].into_iter().any(|&count| count > MAX_VARIABLE) {
        return Err(Error::parse(format!("header field exceeds the largest literal ({MAX_VARIABLE})")));
    }

    Ok(Header { binary, max_variable: *max_variable, inputs: *inputs, outputs: *outputs, ands: *ands })
}

/// Parse an AIGER file held in memory.
///
/// # Errors
///
/// Returns [`Error::Parse`] if the file is malformed and [`Error::Unsupported`] if it has latches or AIGER 1.9
/// property sections.
pub fn parse_aiger(bytes: &[u8]) -> Result<Aig> {
    let header_end = bytes.iter().position(|&byte| byte == b'\n').unwrap_or(bytes.len());
    let header_line = std::str::from_utf8(&bytes[..header_end]).map_err(|_| Error::parse("header is not text"))?;
    let header = parse_header(header_line)?;

    let description = if header.binary {
        parse_binary(&header, &bytes[(header_end + 1).min(bytes.len())..])?
    } else {
        parse_ascii(&header, &bytes[(header_end + 1).min(bytes.len())..])?
    };

    if description.inputs.len() != header.inputs
        || description.outputs.len() != header.outputs
        || description.ands.len() != header.ands
    {
        return Err(Error::parse("section sizes do not match the header"));
    }

    build(&description)
}

/// Read an AIGER file, binary or ASCII.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be read, otherwise as [`parse_aiger`].
pub fn read_aiger(path: impl AsRef<Path>) -> Result<Aig> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| Error::Io { path: path.to_owned(), source })?;
    let aig = parse_aiger(&bytes)?;
    info!(
        path = %path.display(),
        inputs = aig.inputs().len(),
        outputs = aig.outputs().len(),
        gates = aig.gate_count(),
        "read AIGER file"
    );
    Ok(aig)
}

fn parse_ascii(header: &Header, body: &[u8]) -> Result<Description> {
    // The header was checked above, so hand the parser a plain five-field header and no comment section.
    let body = std::str::from_utf8(body).map_err(|_| Error::parse("ASCII AIGER file is not text"))?;
    let mut text = format!("aag {} {} 0 {} {}\n", header.max_variable, header.inputs, header.outputs, header.ands);
    for line in body.lines() {
        if line == "c" {
            break;
        }
        text.push_str(line);
        text.push('\n');
    }

    let reader = aiger::Reader::from_reader(text.as_bytes()).map_err(|e| Error::parse(format!("{e:?}")))?;
    let mut description = Description { max_variable: reader.header().m, ..Description::default() };

    macro_rules! literal {
        ($l:expr) => {
            2 * $l.variable() + usize::from($l.is_inverted())
        };
    }

    for record in reader.records() {
        match record.map_err(|e| Error::parse(format!("{e:?}")))? {
            aiger::Aiger::Input(l) => {
                description.inputs.push(literal!(l));
                description.input_names.push(None);
            }
            aiger::Aiger::Latch { .. } => {
                return Err(Error::Unsupported("latches".to_string()));
            }
            aiger::Aiger::Output(l) => {
                description.outputs.push(literal!(l));
                description.output_names.push(None);
            }
            aiger::Aiger::AndGate { output, inputs } => {
                description.ands.push((literal!(output), literal!(inputs[0]), literal!(inputs[1])));
            }
            aiger::Aiger::Symbol { type_spec, position, symbol } => {
                let names = match type_spec {
                    aiger::Symbol::Input => &mut description.input_names,
                    aiger::Symbol::Output => &mut description.output_names,
                    aiger::Symbol::Latch => return Err(Error::Unsupported("latch symbols".to_string())),
                };
                let slot = names
                    .get_mut(position)
                    .ok_or_else(|| Error::parse(format!("symbol for missing port {position}")))?;
                *slot = Some(symbol);
            }
        }
    }

    Ok(description)
}

/// A cursor over the body of a binary AIGER file.
struct Cursor<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> Cursor<'a> {
    fn line(&mut self) -> Option<&'a str> {
        if self.position >= self.bytes.len() {
            return None;
        }
        let rest = &self.bytes[self.position..];
        let end = rest.iter().position(|&byte| byte == b'\n').unwrap_or(rest.len());
        self.position += end + 1;
        std::str::from_utf8(&rest[..end]).ok()
    }

    fn unsigned(&mut self) -> Result<usize> {
        let mut value = 0usize;
        let mut shift = 0;
        loop {
            let byte = *self.bytes.get(self.position).ok_or_else(|| Error::parse("truncated AND gate section"))?;
            self.position += 1;
            if shift > 63 {
                return Err(Error::parse("AND gate delta does not fit in a word"));
            }
            value |= usize::from(byte & 0x7F) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
            shift += 7;
        }
    }
}

fn parse_symbols(cursor: &mut Cursor, description: &mut Description) -> Result<()> {
    while let Some(line) = cursor.line() {
        if line == "c" || line.is_empty() {
            break;
        }

        let mut chars = line.chars();
        let kind = chars.next();
        let (position, name) =
            chars.as_str().split_once(' ').ok_or_else(|| Error::parse(format!("malformed symbol {line:?}")))?;
        let position = parse_number(position, "a symbol position")?;
        let names = match kind {
            Some('i') => &mut description.input_names,
            Some('o') => &mut description.output_names,
            Some('l') => return Err(Error::Unsupported("latch symbols".to_string())),
            _ => return Err(Error::parse(format!("unknown symbol kind {kind:?}"))),
        };
        let slot =
            names.get_mut(position).ok_or_else(|| Error::parse(format!("symbol for missing port {position}")))?;
        *slot = Some(name.to_string());
    }
    Ok(())
}

fn parse_binary(header: &Header, body: &[u8]) -> Result<Description> {
    if header.inputs.checked_add(header.ands) != Some(header.max_variable) {
        return Err(Error::parse("binary header must have M = I + L + A"));
    }
    // Every output line and every AND gate takes at least two bytes.
    let smallest_body = header.outputs.checked_add(header.ands).and_then(|lines| lines.checked_mul(2));
    if smallest_body.map_or(true, |smallest| body.len() < smallest) {
        return Err(Error::parse("file is shorter than its header claims"));
    }

    let mut inputs = Vec::new();
    let mut input_names = Vec::new();
    inputs
        .try_reserve_exact(header.inputs)
        .and_then(|()| input_names.try_reserve_exact(header.inputs))
        .map_err(|_| Error::parse(format!("cannot hold {} inputs", header.inputs)))?;
    inputs.extend((1..=header.inputs).map(|variable| 2 * variable));
    input_names.resize(header.inputs, None);

    let mut description =
        Description { max_variable: header.max_variable, inputs, input_names, ..Description::default() };

    let mut cursor = Cursor { bytes: body, position: 0 };
    for _ in 0..header.outputs {
        let line = cursor.line().ok_or_else(|| Error::parse("truncated output section"))?;
        description.outputs.push(parse_number(line.trim(), "an output literal")?);
        description.output_names.push(None);
    }

    for gate in 0..header.ands {
        let lhs = 2 * (header.inputs + gate + 1);
        let delta0 = cursor.unsigned()?;
        let delta1 = cursor.unsigned()?;
        let bad_delta = || Error::parse(format!("bad delta for gate {lhs}"));
        let rhs0 = lhs.checked_sub(delta0).filter(|_| delta0 > 0).ok_or_else(bad_delta)?;
        let rhs1 = rhs0.checked_sub(delta1).ok_or_else(bad_delta)?;
        description.ands.push((lhs, rhs0, rhs1));
    }

    parse_symbols(&mut cursor, &mut description)?;

    Ok(description)
}

/// Resolve a description into an and-inverter graph, checking that it is a well-formed combinational circuit.
fn build(description: &Description) -> Result<Aig> {
    #[derive(Clone, Copy)]
    enum Definition {
        Undefined,
        Input(Signal),
        And(usize, usize),
    }

    let check = |literal: usize| {
        if literal / 2 <= description.max_variable {
            Ok(literal)
        } else {
            Err(Error::parse(format!("literal {literal} exceeds the maximum variable index")))
        }
    };

    // The tables only need to reach the largest literal the file actually uses, whatever M claims.
    let literals = || {
        let gates = description.ands.iter().flat_map(|&(lhs, rhs0, rhs1)| [lhs, rhs0, rhs1]);
        description.inputs.iter().chain(&description.outputs).copied().chain(gates)
    };
    for literal in literals() {
        check(literal)?;
    }
    let variables = literals().max().map_or(1, |literal| literal / 2 + 1);

    let mut aig = Aig::new();
    let mut definitions = vec![Definition::Undefined; variables];

    for (port, &literal) in description.inputs.iter().enumerate() {
        if literal < 2 || literal % 2 == 1 {
            return Err(Error::parse(format!("invalid input literal {literal}")));
        }
        if !matches!(definitions[literal / 2], Definition::Undefined) {
            return Err(Error::parse(format!("variable {} defined twice", literal / 2)));
        }
        definitions[literal / 2] = Definition::Input(aig.add_input(description.input_names[port].clone()));
    }

    for &(lhs, rhs0, rhs1) in &description.ands {
        if lhs < 2 || lhs % 2 == 1 {
            return Err(Error::parse(format!("invalid AND gate literal {lhs}")));
        }
        if !matches!(definitions[lhs / 2], Definition::Undefined) {
            return Err(Error::parse(format!("variable {} defined twice", lhs / 2)));
        }
        definitions[lhs / 2] = Definition::And(rhs0, rhs1);
    }

    // Resolve every AND gate in file order with an explicit stack, so gates may refer to later ones.
    let mut resolved: Vec<Option<Signal>> = vec![None; variables];
    resolved[0] = Some(Signal::FALSE);
    for (variable, definition) in definitions.iter().enumerate() {
        if let Definition::Input(signal) = definition {
            resolved[variable] = Some(*signal);
        }
    }

    let mut on_stack = vec![false; variables];
    let roots = description.ands.iter().map(|&(lhs, _, _)| lhs).chain(description.outputs.iter().copied());
    for root in roots {
        let root = root / 2;
        let mut stack = vec![root];

        while let Some(&variable) = stack.last() {
            if resolved[variable].is_some() {
                stack.pop();
                continue;
            }
            let Definition::And(rhs0, rhs1) = definitions[variable] else {
                return Err(Error::parse(format!("variable {variable} is used but never defined")));
            };

            let pending = [rhs0 / 2, rhs1 / 2].into_iter().find(|&fanin| resolved[fanin].is_none());
            match pending {
                Some(fanin) if on_stack[fanin] => {
                    return Err(Error::parse(format!("combinational cycle through variable {fanin}")));
                }
                Some(fanin) => {
                    on_stack[variable] = true;
                    stack.push(fanin);
                }
                None => {
                    let lookup =
                        |literal: usize| resolved[literal / 2].map(|signal| signal.complement_if(literal % 2 == 1));
                    let (Some(a), Some(b)) = (lookup(rhs0), lookup(rhs1)) else {
                        return Err(Error::parse(format!("variable {variable} could not be resolved")));
                    };
                    resolved[variable] = Some(aig.and(a, b));
                    on_stack[variable] = false;
                    stack.pop();
                }
            }
        }
    }

    for (port, &literal) in description.outputs.iter().enumerate() {
        let signal = resolved[literal / 2]
            .map(|signal| signal.complement_if(literal % 2 == 1))
            .ok_or_else(|| Error::parse(format!("output {port} is undefined")))?;
        aig.add_output(signal, description.output_names[port].clone());
    }

    debug!(variables, gates = aig.gate_count(), "resolved AIGER description");
    Ok(aig)
}

/// Renumber `aig` densely: inputs first, then gates in topological order. Returns the literal of every node.
fn literals(aig: &Aig) -> (Vec<usize>, Vec<usize>) {
    let mut literal = vec![0; aig.node_count()];
    let mut gates = Vec::new();
    for (port, &node) in aig.inputs().iter().enumerate() {
        literal[node] = 2 * (port + 1);
    }
    for node in (0..aig.node_count()).filter(|&node| aig.is_gate(node)) {
        literal[node] = 2 * (aig.inputs().len() + gates.len() + 1);
        gates.push(node);
    }
    (literal, gates)
}

fn signal_literal(literal: &[usize], signal: Signal) -> usize {
    literal[signal.node()] + usize::from(signal.is_complemented())
}

/// The fanin literals of a gate, larger first.
fn gate_literals(aig: &Aig, literal: &[usize], node: usize) -> (usize, usize) {
    let fanins = aig.fanins(node);
    let a = signal_literal(literal, fanins[0]);
    let b = signal_literal(literal, fanins[1]);
    (a.max(b), a.min(b))
}

fn write_symbols(aig: &Aig, writer: &mut impl Write) -> std::io::Result<()> {
    for port in 0..aig.inputs().len() {
        if let Some(name) = aig.input_name(port) {
            writeln!(writer, "i{port} {name}")?;
        }
    }
    for port in 0..aig.outputs().len() {
        if let Some(name) = aig.output_name(port) {
            writeln!(writer, "o{port} {name}")?;
        }
    }
    writeln!(writer, "c")?;
    writeln!(writer, "migopt")
}

fn write_leb128(writer: &mut impl Write, mut value: usize) -> std::io::Result<()> {
    while value > 0x7F {
        writer.write_all(&[(value & 0x7F) as u8 | 0x80])?;
        value >>= 7;
    }
    writer.write_all(&[value as u8])
}

/// Write `aig` in binary AIGER format.
///
/// # Errors
///
/// Returns any error from `writer`.
pub fn write_binary(aig: &Aig, writer: &mut impl Write) -> std::io::Result<()> {
    let (literal, gates) = literals(aig);
    let inputs = aig.inputs().len();

    writeln!(writer, "aig {} {} 0 {} {}", inputs + gates.len(), inputs, aig.outputs().len(), gates.len())?;
    for &output in aig.outputs() {
        writeln!(writer, "{}", signal_literal(&literal, output))?;
    }
    for &gate in &gates {
        let (rhs0, rhs1) = gate_literals(aig, &literal, gate);
        write_leb128(writer, literal[gate] - rhs0)?;
        write_leb128(writer, rhs0 - rhs1)?;
    }
    write_symbols(aig, writer)
}

/// Write `aig` in ASCII AIGER format.
///
/// # Errors
///
/// Returns any error from `writer`.
pub fn write_ascii(aig: &Aig, writer: &mut impl Write) -> std::io::Result<()> {
    let (literal, gates) = literals(aig);
    let inputs = aig.inputs().len();

    writeln!(writer, "aag {} {} 0 {} {}", inputs + gates.len(), inputs, aig.outputs().len(), gates.len())?;
    for &input in aig.inputs() {
        writeln!(writer, "{}", literal[input])?;
    }
    for &output in aig.outputs() {
        writeln!(writer, "{}", signal_literal(&literal, output))?;
    }
    for &gate in &gates {
        let (rhs0, rhs1) = gate_literals(aig, &literal, gate);
        writeln!(writer, "{} {rhs0} {rhs1}", literal[gate])?;
    }
    write_symbols(aig, writer)
}

/// Write `aig` to `path`: ASCII if the path ends in `.aag`, binary otherwise.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be created or written.
pub fn write_aiger(aig: &Aig, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let io_error = |source| Error::Io { path: path.to_owned(), source };

    let mut writer = BufWriter::new(File::create(path).map_err(io_error)?);
    if path.extension().is_some_and(|extension| extension == "aag") {
        write_ascii(aig, &mut writer).map_err(io_error)?;
    } else {
        write_binary(aig, &mut writer).map_err(io_error)?;
    }
    writer.flush().map_err(io_error)?;

    info!(path = %path.display(), gates = aig.gate_count(), "wrote AIGER file");
    Ok(())
}
