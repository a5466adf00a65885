use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

use super::{Error, Result};

pub const NUM_OPCODES: usize = 38;

// bias applied to the 18-bit sBx field
pub const MAXARG_SBX: i32 = 0x1ffff;
// RK operands at or above this value name a constant
pub const BITRK: u32 = 0x100;

#[derive(FromPrimitive, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
	Move = 0,
	LoadK,
	LoadBool,
	LoadNil,
	GetUpval,
	GetGlobal,
	GetTable,
	SetGlobal,
	SetUpval,
	SetTable,
	NewTable,
	Self_,
	Add,
	Sub,
	Mul,
	Div,
	Mod,
	Pow,
	Unm,
	Not,
	Len,
	Concat,
	Jump,
	Eq,
	Lt,
	Le,
	Test,
	TestSet,
	Call,
	TailCall,
	Return,
	ForLoop,
	ForPrep,
	TForLoop,
	SetList,
	Close,
	Closure,
	VarArg
}

const NAMES: [&str; NUM_OPCODES] = [
	"MOVE", "LOADK", "LOADBOOL", "LOADNIL", "GETUPVAL", "GETGLOBAL", "GETTABLE",
	"SETGLOBAL", "SETUPVAL", "SETTABLE", "NEWTABLE", "SELF", "ADD", "SUB", "MUL",
	"DIV", "MOD", "POW", "UNM", "NOT", "LEN", "CONCAT", "JMP", "EQ", "LT", "LE",
	"TEST", "TESTSET", "CALL", "TAILCALL", "RETURN", "FORLOOP", "FORPREP",
	"TFORLOOP", "SETLIST", "CLOSE", "CLOSURE", "VARARG"
];

#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
	iABC,
	iABx,
	iAsBx
}

impl Opcode {
	pub fn from_instr(instr: u32) -> Result<Self> {
		let op = (instr & 0x3f) as u8;
		Self::from_u8(op).ok_or(Error::InvalidOpcode(op))
	}

	pub fn to_instr(self) -> u32 {
		self as u32
	}

	pub fn encoding(self) -> Encoding {
		match self {
			Self::LoadK
			| Self::GetGlobal
			| Self::SetGlobal
			| Self::Closure => Encoding::iABx,
			Self::Jump
			| Self::ForLoop
			| Self::ForPrep => Encoding::iAsBx,
			_ => Encoding::iABC
		}
	}

	pub fn name(self) -> &'static str {
		NAMES[self as usize]
	}
}

/// Raw operand fields, shaped by the opcode's encoding.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opmode {
	iABC(u32, u32, u32),
	iABx(u32, u32),
	iAsBx(u32, i32)
}

impl Opmode {
	// A: bits 6..=13, C: bits 14..=22, B: bits 23..=31
	#[allow(non_snake_case)]
	fn ABC(instr: u32) -> Self {
		Self::iABC(
			(instr >> 6) & 0xff,
			(instr >> (6 + 8 + 9)) & 0x1ff,
			(instr >> (6 + 8)) & 0x1ff
		)
	}

	#[allow(non_snake_case)]
	fn ABx(instr: u32) -> Self {
		Self::iABx(
			(instr >> 6) & 0xff,
			(instr >> (6 + 8)) & 0x3ffff
		)
	}

	#[allow(non_snake_case)]
	fn AsBx(instr: u32) -> Self {
		Self::iAsBx(
			(instr >> 6) & 0xff,
			((instr >> (6 + 8)) & 0x3ffff) as i32 - MAXARG_SBX
		)
	}

	pub fn decode(encoding: Encoding, instr: u32) -> Self {
		match encoding {
			Encoding::iABC => Self::ABC(instr),
			Encoding::iABx => Self::ABx(instr),
			Encoding::iAsBx => Self::AsBx(instr)
		}
	}

	pub fn encode(&self) -> u32 {
		match *self {
			Self::iABC(a, b, c) => ((a & 0xff) << 6) | ((b & 0x1ff) << (6 + 8 + 9)) | ((c & 0x1ff) << (6 + 8)),
			Self::iABx(a, bx) => ((a & 0xff) << 6) | ((bx & 0x3ffff) << (6 + 8)),
			Self::iAsBx(a, sbx) => ((a & 0xff) << 6) | ((((sbx + MAXARG_SBX) as u32) & 0x3ffff) << (6 + 8))
		}
	}

	pub fn a(&self) -> u32 {
		match *self {
			Self::iABC(a, _, _) | Self::iABx(a, _) | Self::iAsBx(a, _) => a
		}
	}

	fn b(&self) -> u32 {
		if let Self::iABC(_, b, _) = *self { b } else { 0 }
	}

	fn c(&self) -> u32 {
		if let Self::iABC(_, _, c) = *self { c } else { 0 }
	}

	fn bx(&self) -> u32 {
		if let Self::iABx(_, bx) = *self { bx } else { 0 }
	}

	fn sbx(&self) -> i32 {
		if let Self::iAsBx(_, sbx) = *self { sbx } else { 0 }
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reg(pub u16);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Kst(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegKst {
	R(Reg), K(Kst)
}

impl RegKst {
	fn from_operand(v: u32) -> Self {
		if v & BITRK != 0 {
			Self::K(Kst(v & !BITRK))
		} else {
			Self::R(Reg(v as u16))
		}
	}
}

pub type Upvalue = u16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
	Add, Sub, Mul, Div, Mod, Pow
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
	Unm, Not, Len
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinCondOp {
	Eq, Lt, Le
}

/// Operands of an instruction, typed per opcode.
#[derive(Debug, Clone, PartialEq)]
pub enum Instr {
	Move(Reg, Reg),
	LoadK(Reg, Kst),
	LoadBool(Reg, bool, bool),
	LoadNil(Reg, Reg),
	GetUpval(Reg, Upvalue),
	GetGlobal(Reg, Kst),
	GetTable(Reg, Reg, RegKst),
	SetGlobal(Reg, Kst),
	SetUpval(Reg, Upvalue),
	SetTable(Reg, RegKst, RegKst),
	NewTable(Reg, u16, u16),
	Self_(Reg, Reg, RegKst),
	BinOp(Reg, RegKst, BinOp, RegKst),
	UnOp(Reg, UnOp, Reg),
	Concat(Reg, Reg, Reg),
	Jump(i32),
	BinCondOp(bool, RegKst, BinCondOp, RegKst),
	Test(Reg, bool),
	TestSet(Reg, Reg, bool),
	Call(Reg, u16, u16),
	TailCall(Reg, u16, u16),
	Return(Reg, u16),
	ForLoop(Reg, i32),
	ForPrep(Reg, i32),
	TForLoop(Reg, u16),
	SetList(Reg, u16, u16),
	Close(Reg),
	Closure(Reg, u32),
	VarArg(Reg, u16)
}

impl Instr {
	pub fn decode(op: Opcode, mode: &Opmode) -> Self {
		let a = Reg(mode.a() as u16);
		let b = mode.b();
		let c = mode.c();
		let reg_b = Reg(b as u16);
		let reg_c = Reg(c as u16);
		let rk_b = RegKst::from_operand(b);
		let rk_c = RegKst::from_operand(c);
		let kst = Kst(mode.bx());
		let sbx = mode.sbx();

		match op {
			Opcode::Move => Self::Move(a, reg_b),
			Opcode::LoadK => Self::LoadK(a, kst),
			Opcode::LoadBool => Self::LoadBool(a, b != 0, c != 0),
			Opcode::LoadNil => Self::LoadNil(a, reg_b),
			Opcode::GetUpval => Self::GetUpval(a, b as u16),
			Opcode::GetGlobal => Self::GetGlobal(a, kst),
			Opcode::GetTable => Self::GetTable(a, reg_b, rk_c),
			Opcode::SetGlobal => Self::SetGlobal(a, kst),
			Opcode::SetUpval => Self::SetUpval(a, b as u16),
			Opcode::SetTable => Self::SetTable(a, rk_b, rk_c),
			Opcode::NewTable => Self::NewTable(a, b as u16, c as u16),
			Opcode::Self_ => Self::Self_(a, reg_b, rk_c),
			Opcode::Add => Self::BinOp(a, rk_b, BinOp::Add, rk_c),
			Opcode::Sub => Self::BinOp(a, rk_b, BinOp::Sub, rk_c),
			Opcode::Mul => Self::BinOp(a, rk_b, BinOp::Mul, rk_c),
			Opcode::Div => Self::BinOp(a, rk_b, BinOp::Div, rk_c),
			Opcode::Mod => Self::BinOp(a, rk_b, BinOp::Mod, rk_c),
			Opcode::Pow => Self::BinOp(a, rk_b, BinOp::Pow, rk_c),
			Opcode::Unm => Self::UnOp(a, UnOp::Unm, reg_b),
			Opcode::Not => Self::UnOp(a, UnOp::Not, reg_b),
			Opcode::Len => Self::UnOp(a, UnOp::Len, reg_b),
			Opcode::Concat => Self::Concat(a, reg_b, reg_c),
			Opcode::Jump => Self::Jump(sbx),
			Opcode::Eq => Self::BinCondOp(a.0 != 0, rk_b, BinCondOp::Eq, rk_c),
			Opcode::Lt => Self::BinCondOp(a.0 != 0, rk_b, BinCondOp::Lt, rk_c),
			Opcode::Le => Self::BinCondOp(a.0 != 0, rk_b, BinCondOp::Le, rk_c),
			Opcode::Test => Self::Test(a, c != 0),
			Opcode::TestSet => Self::TestSet(a, reg_b, c != 0),
			Opcode::Call => Self::Call(a, b as u16, c as u16),
			Opcode::TailCall => Self::TailCall(a, b as u16, c as u16),
			Opcode::Return => Self::Return(a, b as u16),
			Opcode::ForLoop => Self::ForLoop(a, sbx),
			Opcode::ForPrep => Self::ForPrep(a, sbx),
			Opcode::TForLoop => Self::TForLoop(a, c as u16),
			// C == 0 means the block number sits in the following word
			Opcode::SetList => Self::SetList(a, b as u16, c as u16),
			Opcode::Close => Self::Close(a),
			Opcode::Closure => Self::Closure(a, mode.bx()),
			Opcode::VarArg => Self::VarArg(a, b as u16)
		}
	}
}

/// A decoded instruction word: opcode, typed operands and raw fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction(pub Opcode, pub Instr, pub Opmode);

impl Instruction {
	pub fn new(op: Opcode, mode: Opmode) -> Self {
		Self(op, Instr::decode(op, &mode), mode)
	}

	pub fn abc(op: Opcode, a: u32, b: u32, c: u32) -> Self {
		Self::new(op, Opmode::iABC(a, b, c))
	}

	pub fn abx(op: Opcode, a: u32, bx: u32) -> Self {
		Self::new(op, Opmode::iABx(a, bx))
	}

	pub fn asbx(op: Opcode, a: u32, sbx: i32) -> Self {
		Self::new(op, Opmode::iAsBx(a, sbx))
	}

	pub fn from_instr(instr: u32) -> Result<Self> {
		let op = Opcode::from_instr(instr)?;
		let mode = Opmode::decode(op.encoding(), instr);
		Ok(Self::new(op, mode))
	}

	pub fn serialize(&self) -> u32 {
		self.0.to_instr() | self.2.encode()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn all_opcodes() -> impl Iterator<Item = Opcode> {
		(0..NUM_OPCODES as u8).filter_map(Opcode::from_u8)
	}

	fn round_trip(op: Opcode, mode: Opmode) {
		let decoded = Instruction::from_instr(Instruction::new(op, mode).serialize()).unwrap();
		assert_eq!((decoded.0, decoded.2), (op, mode));
	}

	#[test]
	fn every_opcode_is_known() {
		assert_eq!(all_opcodes().count(), NUM_OPCODES);
		assert_eq!(Opcode::from_instr(38), Err(Error::InvalidOpcode(38)));
		assert_eq!(Opcode::from_instr(63), Err(Error::InvalidOpcode(63)));
		assert_eq!(Opcode::VarArg.name(), "VARARG");
	}

	// each field walks its whole range while the others sit at their bounds
	#[test]
	fn abc_round_trip() {
		for op in all_opcodes().filter(|op| op.encoding() == Encoding::iABC) {
			for x in [0, 511] {
				for y in [0, 511] {
					for a in 0..=255 {
						round_trip(op, Opmode::iABC(a, x, y));
					}
				}
			}
			for a in [0, 255] {
				for y in [0, 511] {
					for v in 0..=511 {
						round_trip(op, Opmode::iABC(a, v, y));
						round_trip(op, Opmode::iABC(a, y, v));
					}
				}
			}
		}
	}

	#[test]
	fn abx_round_trip() {
		for op in all_opcodes().filter(|op| op.encoding() == Encoding::iABx) {
			for bx in [0, 262143] {
				for a in 0..=255 {
					round_trip(op, Opmode::iABx(a, bx));
				}
			}
			for a in [0, 255] {
				for bx in 0..=262143 {
					round_trip(op, Opmode::iABx(a, bx));
				}
			}
		}
	}

	#[test]
	fn asbx_round_trip() {
		for op in all_opcodes().filter(|op| op.encoding() == Encoding::iAsBx) {
			for sbx in [-MAXARG_SBX, MAXARG_SBX + 1] {
				for a in 0..=255 {
					round_trip(op, Opmode::iAsBx(a, sbx));
				}
			}
			for a in [0, 255] {
				for sbx in -MAXARG_SBX..=MAXARG_SBX + 1 {
					round_trip(op, Opmode::iAsBx(a, sbx));
				}
			}
		}
	}

	#[test]
	fn b_and_c_bit_positions() {
		// B = 1 lives at bit 23, C = 1 at bit 14
		let word = Opcode::Call.to_instr() | (3 << 6) | (1 << 23) | (2 << 14);
		let decoded = Instruction::from_instr(word).unwrap();
		assert_eq!(decoded.1, Instr::Call(Reg(3), 1, 2));
	}

	#[test]
	fn sbx_bias() {
		let word = Opcode::Jump.to_instr() | (0x1ffff << 14);
		assert_eq!(Instruction::from_instr(word).unwrap().1, Instr::Jump(0));
		let word = Opcode::Jump.to_instr();
		assert_eq!(Instruction::from_instr(word).unwrap().1, Instr::Jump(-131071));
	}

	#[test]
	fn rk_operands() {
		let instr = Instruction::abc(Opcode::Add, 0, 1, BITRK | 4);
		assert_eq!(instr.1, Instr::BinOp(Reg(0), RegKst::R(Reg(1)), BinOp::Add, RegKst::K(Kst(4))));
	}
}
