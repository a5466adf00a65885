use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
	#[error("unexpected end of chunk: wanted {wanted} bytes at offset {offset}")]
	Eof { offset: usize, wanted: usize },

	#[error("invalid header signature")]
	InvalidSignature,

	#[error("invalid version number: 0x{0:02x}")]
	InvalidVersion(u8),

	#[error("unofficial bytecode format: {0}")]
	UnofficialFormat(u8),

	#[error("invalid endianness: header flag {flag} does not match the byte order in use")]
	InvalidEndianness { flag: u8 },

	#[error("unsupported {field} width: {width}")]
	InvalidWidth { field: &'static str, width: u8 },

	#[error("invalid count: {0}")]
	InvalidCount(i64),

	#[error("invalid opcode: {0}")]
	InvalidOpcode(u8),

	#[error("invalid constant type: {0}")]
	InvalidConstant(u8),

	#[error("functions nested deeper than {0} levels")]
	NestingTooDeep(usize),
}

impl Error {
	/// Whether the error came from the stream running dry rather than bad content.
	pub fn is_io(&self) -> bool {
		matches!(self, Self::Eof { .. })
	}
}

pub type Result<T> = std::result::Result<T, Error>;
