use crate::Bytecode;
use super::{constant, header, instruction::Instruction, Error, Header, Local, Proto, Reader, Result};

/// Deepest function nesting accepted below the main chunk, as `luac` enforces.
pub const MAX_NESTING: usize = 200;

fn count(reader: &mut Reader) -> Result<usize> {
	let n = reader.int()?;
	usize::try_from(n).map_err(|_| Error::InvalidCount(n))
}

fn load_vec<'a, V>(reader: &mut Reader<'a>, read: fn(&mut Reader<'a>) -> Result<V>) -> Result<Vec<V>> {
	let n = count(reader)?;
	let mut list: Vec<V> = vec![];
	for _ in 0..n {
		list.push(read(reader)?);
	}

	Ok(list)
}

fn chunk(reader: &mut Reader, depth: usize) -> Result<Proto> {
	if depth > MAX_NESTING {
		return Err(Error::NestingTooDeep(MAX_NESTING));
	}

	let source = reader.string()?;
	let line_defined = reader.int()?;
	let last_line_defined = reader.int()?;
	let nupvals = reader.byte()?;
	let nparams = reader.byte()?;
	let is_vararg_flag = reader.byte()?;
	let max_stack_size = reader.byte()?;

	// instructions
	let instructions = load_vec(reader, |reader| {
		let word = reader.uint(4)? as u32;
		Instruction::from_instr(word)
	})?;

	// constants
	let constants = load_vec(reader, constant::read)?;

	// prototypes
	let n = count(reader)?;
	let mut prototypes = vec![];
	for _ in 0..n {
		prototypes.push(chunk(reader, depth + 1)?);
	}

	// source lines
	let source_lines = load_vec(reader, |reader| reader.int())?;

	// local list
	let locals = load_vec(reader, |reader| {
		let name = reader.string()?;
		let start = reader.int()?;
		let end = reader.int()?;
		Ok(Local(name, start, end))
	})?;

	// upvalues list
	let upvals = load_vec(reader, |reader| reader.string())?;

	Ok(Proto {
		source,
		line_defined,
		last_line_defined,
		nupvals,
		nparams,
		is_vararg_flag,
		max_stack_size,
		instructions,
		constants,
		prototypes,
		source_lines,
		locals,
		upvals
	})
}

pub fn deserialize_bytecode(bytecode: &Bytecode) -> Result<(Header, Proto)> {
	let (mut reader, header_data) = header::negotiate(bytecode)?;
	let proto = chunk(&mut reader, 0)?;

	Ok((header_data, proto))
}
