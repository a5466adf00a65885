use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecompileError {
	#[error(transparent)]
	Bytecode(#[from] bytecode::lua51::Error),

	#[error("constant index {index} out of range ({len} constants)")]
	ConstantOutOfRange { index: u32, len: usize },

	#[error("constant {index} names a global but is not a string")]
	NotAName { index: u32 },

	#[error("operands do not match {0}")]
	OperandMismatch(&'static str),

	#[error("closure index {index} out of range ({len} prototypes)")]
	ClosureOutOfRange { index: u32, len: usize },
}

pub type Result<T> = std::result::Result<T, DecompileError>;
