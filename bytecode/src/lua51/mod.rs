mod reader;
mod writer;
mod error;
mod deserialize;
mod serialize;
pub mod header;
pub mod constant;
pub mod instruction;

pub use reader::Reader;
pub use writer::Writer;
pub use error::{Error, Result};
pub use deserialize::{deserialize_bytecode, MAX_NESTING};
pub use serialize::serialize_bytecode;

#[derive(Debug, PartialEq, Clone)]
pub enum Constant {
	Nil,
	Boolean(bool),
	Number(f64),
	String(String)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
	Big,
	Little
}

impl Endianness {
	// value of the header's endianness byte
	pub fn flag(self) -> u8 {
		match self {
			Self::Big => 0,
			Self::Little => 1
		}
	}
}

/// Widths and byte order negotiated from a chunk header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
	pub endianness: Endianness,
	pub int: u8,
	pub size_t: u8,
	pub instr: u8,
	pub lua_number: u8,
	pub integral: bool
}

impl Default for Header {
	fn default() -> Self {
		Self {
			endianness: Endianness::Little,
			int: 4,
			size_t: 4,
			instr: 4,
			lua_number: 8,
			integral: false
		}
	}
}

/// Local variable debug entry: name, start pc, end pc.
#[derive(Debug, Clone, PartialEq)]
pub struct Local(pub String, pub i64, pub i64);

#[derive(Debug, Clone, PartialEq)]
pub struct Proto {
	pub source: String,
	pub line_defined: i64,
	pub last_line_defined: i64,
	pub nupvals: u8,
	pub nparams: u8,
	pub is_vararg_flag: u8,
	pub max_stack_size: u8,
	pub instructions: Vec<instruction::Instruction>,
	pub constants: Vec<Constant>,
	pub prototypes: Vec<Self>,
	// debug tables, never consulted by the decompiler
	pub source_lines: Vec<i64>,
	pub locals: Vec<Local>,
	pub upvals: Vec<String>
}

impl Proto {
	pub fn is_vararg(&self) -> bool {
		self.is_vararg_flag & 0x2 != 0
	}
}

impl Default for Proto {
	fn default() -> Self {
		Self {
			source: String::new(),
			line_defined: 0,
			last_line_defined: 0,
			nupvals: 0,
			nparams: 0,
			is_vararg_flag: 2,
			max_stack_size: 2,
			instructions: vec![],
			constants: vec![],
			prototypes: vec![],
			source_lines: vec![],
			locals: vec![],
			upvals: vec![]
		}
	}
}
