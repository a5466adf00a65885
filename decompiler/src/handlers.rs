use bytecode::lua51::{Constant, Proto, instruction::{BinOp, Instr, Instruction, Kst, Opcode, Reg, RegKst, UnOp}};

use crate::context::{Context, NameKind};
use crate::error::{DecompileError, Result};

const KEYWORDS: [&str; 21] = [
	"and", "break", "do", "else", "elseif", "end", "false", "for", "function",
	"if", "in", "local", "nil", "not", "or", "repeat", "return", "then", "true",
	"until", "while"
];

/// One rendered line. `complete` is false when part of the statement could
/// not be recovered from the instruction alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
	pub line: String,
	pub complete: bool
}

impl Statement {
	fn done(line: String) -> Self {
		Self { line, complete: true }
	}

	fn partial(line: String) -> Self {
		Self { line, complete: false }
	}

	fn empty() -> Self {
		Self::done(String::new())
	}
}

pub type Handler = fn(&mut Context, &Proto, &Instruction) -> Result<Statement>;

/// Handler for `op`, or `None` for the jump-driven opcodes that need
/// control-flow recovery.
pub fn handler(op: Opcode) -> Option<Handler> {
	let handler: Handler = match op {
		Opcode::Move => op_move,
		Opcode::LoadK => op_loadk,
		Opcode::LoadBool => op_loadbool,
		Opcode::LoadNil => op_loadnil,
		Opcode::GetUpval => op_getupval,
		Opcode::GetGlobal => op_getglobal,
		Opcode::GetTable => op_gettable,
		Opcode::SetGlobal => op_setglobal,
		Opcode::SetUpval => op_setupval,
		Opcode::SetTable => op_settable,
		Opcode::NewTable => op_newtable,
		Opcode::Self_ => op_self,
		Opcode::Add
		| Opcode::Sub
		| Opcode::Mul
		| Opcode::Div
		| Opcode::Mod
		| Opcode::Pow => op_binop,
		Opcode::Unm
		| Opcode::Not
		| Opcode::Len => op_unop,
		Opcode::Concat => op_concat,
		Opcode::Call => op_call,
		Opcode::TailCall => op_tailcall,
		Opcode::Return => op_return,
		Opcode::Closure => op_closure,
		Opcode::VarArg => op_vararg,
		Opcode::Jump
		| Opcode::Eq
		| Opcode::Lt
		| Opcode::Le
		| Opcode::Test
		| Opcode::TestSet
		| Opcode::ForLoop
		| Opcode::ForPrep
		| Opcode::TForLoop
		| Opcode::SetList
		| Opcode::Close => return None
	};
	Some(handler)
}

/// Path of child `index` under the prototype at `path` ("" is the main chunk).
pub fn child_path(path: &str, index: usize) -> String {
	if path.is_empty() {
		index.to_string()
	} else {
		format!("{path}_{index}")
	}
}

pub fn function_name(path: &str) -> String {
	format!("function_{path}")
}

fn mismatch(instr: &Instruction) -> DecompileError {
	DecompileError::OperandMismatch(instr.0.name())
}

fn unresolved(what: &str) -> String {
	format!("--[[ unresolved: {what} ]]")
}

fn offset(reg: Reg, n: u16) -> Reg {
	Reg(reg.0 + n)
}

fn constant(proto: &Proto, kst: Kst) -> Result<&Constant> {
	proto.constants.get(kst.0 as usize)
		.ok_or(DecompileError::ConstantOutOfRange { index: kst.0, len: proto.constants.len() })
}

fn literal(constant: &Constant) -> String {
	match constant {
		Constant::Nil => "nil".to_string(),
		Constant::Boolean(b) => b.to_string(),
		Constant::Number(n) => number(*n),
		Constant::String(s) => quote(s)
	}
}

fn number(n: f64) -> String {
	if n.is_nan() {
		"0/0".to_string()
	} else if n.is_infinite() {
		let huge = if n > 0.0 { "math.huge" } else { "-math.huge" };
		huge.to_string()
	} else if n.fract() == 0.0 && n.abs() < 1e15 {
		format!("{}", n as i64)
	} else {
		format!("{n}")
	}
}

fn quote(s: &str) -> String {
	let mut out = String::with_capacity(s.len() + 2);
	out.push('"');
	for ch in s.chars() {
		match ch {
			'"' => out.push_str("\\\""),
			'\\' => out.push_str("\\\\"),
			'\n' => out.push_str("\\n"),
			'\r' => out.push_str("\\r"),
			'\t' => out.push_str("\\t"),
			c if c.is_ascii_control() => out.push_str(&format!("\\{:03}", c as u32)),
			c => out.push(c)
		}
	}
	out.push('"');
	out
}

fn is_identifier(s: &str) -> bool {
	let mut chars = s.chars();
	let starts_well = matches!(chars.next(), Some(c) if c == '_' || c.is_ascii_alphabetic());
	starts_well
		&& chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
		&& !KEYWORDS.contains(&s)
}

fn rk(ctx: &mut Context, proto: &Proto, operand: RegKst) -> Result<String> {
	match operand {
		RegKst::R(reg) => Ok(ctx.get(reg)),
		RegKst::K(kst) => Ok(literal(constant(proto, kst)?))
	}
}

// `table.key` when the key is a constant identifier, `table[key]` otherwise
fn index(ctx: &mut Context, proto: &Proto, table: &str, key: RegKst) -> Result<String> {
	if let RegKst::K(kst) = key {
		if let Constant::String(s) = constant(proto, kst)? {
			if is_identifier(s) {
				return Ok(format!("{table}.{s}"));
			}
		}
	}
	Ok(format!("{table}[{}]", rk(ctx, proto, key)?))
}

fn global_name(proto: &Proto, kst: Kst) -> Result<String> {
	match constant(proto, kst)? {
		Constant::String(s) => Ok(s.clone()),
		_ => Err(DecompileError::NotAName { index: kst.0 })
	}
}

fn declare_many(ctx: &mut Context, first: Reg, count: u16) -> Vec<String> {
	(0..count)
		.map(|i| {
			let name = ctx.fresh(NameKind::Var);
			ctx.bind(offset(first, i), name.clone());
			name
		})
		.collect()
}

// callee in `func`, `b - 1` arguments above it; b == 0 runs to the stack top
fn call_expr(ctx: &mut Context, func: Reg, b: u16) -> (String, bool) {
	let callee = ctx.get(func);
	if b == 0 {
		return (format!("{callee}({})", unresolved("arguments up to stack top")), false);
	}
	let args = (1..b)
		.map(|i| ctx.get(offset(func, i)))
		.collect::<Vec<String>>()
		.join(", ");
	(format!("{callee}({args})"), true)
}

fn op_move(ctx: &mut Context, _proto: &Proto, instr: &Instruction) -> Result<Statement> {
	let Instr::Move(a, b) = instr.1 else { return Err(mismatch(instr)) };
	let value = ctx.get(b);
	Ok(Statement::done(ctx.assign(a, &value)))
}

fn op_loadk(ctx: &mut Context, proto: &Proto, instr: &Instruction) -> Result<Statement> {
	let Instr::LoadK(a, kst) = instr.1 else { return Err(mismatch(instr)) };
	let value = literal(constant(proto, kst)?);
	Ok(Statement::done(ctx.declare(a, NameKind::Var, &value)))
}

fn op_loadbool(ctx: &mut Context, _proto: &Proto, instr: &Instruction) -> Result<Statement> {
	let Instr::LoadBool(a, value, skip) = instr.1 else { return Err(mismatch(instr)) };
	let line = ctx.declare(a, NameKind::Var, &value.to_string());
	if skip {
		return Ok(Statement::partial(format!("{line} {}", unresolved("skips the next instruction"))));
	}
	Ok(Statement::done(line))
}

fn op_loadnil(ctx: &mut Context, _proto: &Proto, instr: &Instruction) -> Result<Statement> {
	let Instr::LoadNil(a, b) = instr.1 else { return Err(mismatch(instr)) };
	let count = b.0.max(a.0) - a.0 + 1;
	let names = declare_many(ctx, a, count);
	Ok(Statement::done(format!("local {} = nil", names.join(", "))))
}

fn op_getupval(ctx: &mut Context, _proto: &Proto, instr: &Instruction) -> Result<Statement> {
	let Instr::GetUpval(a, upval) = instr.1 else { return Err(mismatch(instr)) };
	Ok(Statement::done(ctx.assign(a, &format!("upvalue{upval}"))))
}

fn op_getglobal(ctx: &mut Context, proto: &Proto, instr: &Instruction) -> Result<Statement> {
	let Instr::GetGlobal(a, kst) = instr.1 else { return Err(mismatch(instr)) };
	let name = global_name(proto, kst)?;
	Ok(Statement::done(ctx.declare(a, NameKind::Global, &name)))
}

fn op_gettable(ctx: &mut Context, proto: &Proto, instr: &Instruction) -> Result<Statement> {
	let Instr::GetTable(a, b, key) = instr.1 else { return Err(mismatch(instr)) };
	let table = ctx.get(b);
	let value = index(ctx, proto, &table, key)?;
	Ok(Statement::done(ctx.assign(a, &value)))
}

fn op_setglobal(ctx: &mut Context, proto: &Proto, instr: &Instruction) -> Result<Statement> {
	let Instr::SetGlobal(a, kst) = instr.1 else { return Err(mismatch(instr)) };
	let name = global_name(proto, kst)?;
	Ok(Statement::done(format!("{name} = {}", ctx.get(a))))
}

fn op_setupval(ctx: &mut Context, _proto: &Proto, instr: &Instruction) -> Result<Statement> {
	let Instr::SetUpval(a, upval) = instr.1 else { return Err(mismatch(instr)) };
	Ok(Statement::done(format!("upvalue{upval} = {}", ctx.get(a))))
}

fn op_settable(ctx: &mut Context, proto: &Proto, instr: &Instruction) -> Result<Statement> {
	let Instr::SetTable(a, key, value) = instr.1 else { return Err(mismatch(instr)) };
	let table = ctx.get(a);
	let target = index(ctx, proto, &table, key)?;
	let value = rk(ctx, proto, value)?;
	Ok(Statement::done(format!("{target} = {value}")))
}

fn op_newtable(ctx: &mut Context, _proto: &Proto, instr: &Instruction) -> Result<Statement> {
	let Instr::NewTable(a, _, _) = instr.1 else { return Err(mismatch(instr)) };
	Ok(Statement::done(ctx.declare(a, NameKind::Var, "{}")))
}

fn op_self(ctx: &mut Context, proto: &Proto, instr: &Instruction) -> Result<Statement> {
	let Instr::Self_(a, b, key) = instr.1 else { return Err(mismatch(instr)) };
	let object = ctx.get(b);
	let method = index(ctx, proto, &object, key)?;
	let line = ctx.assign(a, &method);
	ctx.bind(offset(a, 1), object);
	Ok(Statement::done(line))
}

fn op_binop(ctx: &mut Context, proto: &Proto, instr: &Instruction) -> Result<Statement> {
	let Instr::BinOp(a, lhs, op, rhs) = instr.1 else { return Err(mismatch(instr)) };
	let symbol = match op {
		BinOp::Add => "+",
		BinOp::Sub => "-",
		BinOp::Mul => "*",
		BinOp::Div => "/",
		BinOp::Mod => "%",
		BinOp::Pow => "^"
	};
	let lhs = rk(ctx, proto, lhs)?;
	let rhs = rk(ctx, proto, rhs)?;
	Ok(Statement::done(ctx.assign(a, &format!("{lhs} {symbol} {rhs}"))))
}

fn op_unop(ctx: &mut Context, _proto: &Proto, instr: &Instruction) -> Result<Statement> {
	let Instr::UnOp(a, op, b) = instr.1 else { return Err(mismatch(instr)) };
	let value = ctx.get(b);
	let expr = match op {
		UnOp::Unm => format!("-{value}"),
		UnOp::Not => format!("not {value}"),
		UnOp::Len => format!("#{value}")
	};
	Ok(Statement::done(ctx.assign(a, &expr)))
}

fn op_concat(ctx: &mut Context, _proto: &Proto, instr: &Instruction) -> Result<Statement> {
	let Instr::Concat(a, b, c) = instr.1 else { return Err(mismatch(instr)) };
	if c.0 < b.0 {
		return Err(mismatch(instr));
	}
	let parts = (b.0..=c.0)
		.map(|r| ctx.get(Reg(r)))
		.collect::<Vec<String>>()
		.join(" .. ");
	Ok(Statement::done(ctx.assign(a, &parts)))
}

fn op_call(ctx: &mut Context, _proto: &Proto, instr: &Instruction) -> Result<Statement> {
	let Instr::Call(a, b, c) = instr.1 else { return Err(mismatch(instr)) };
	// read callee and arguments before results land on top of them
	let (call, complete) = call_expr(ctx, a, b);
	ctx.clear_from(a);

	let statement = match c {
		0 => Statement::partial(format!("{call} {}", unresolved("all results"))),
		1 => Statement { line: call, complete },
		_ => {
			let names = declare_many(ctx, a, c - 1);
			Statement { line: format!("local {} = {call}", names.join(", ")), complete }
		}
	};
	Ok(statement)
}

fn op_tailcall(ctx: &mut Context, _proto: &Proto, instr: &Instruction) -> Result<Statement> {
	let Instr::TailCall(a, b, _) = instr.1 else { return Err(mismatch(instr)) };
	let (call, complete) = call_expr(ctx, a, b);
	ctx.clear_from(a);
	Ok(Statement { line: format!("return {call}"), complete })
}

fn op_return(ctx: &mut Context, _proto: &Proto, instr: &Instruction) -> Result<Statement> {
	let Instr::Return(a, b) = instr.1 else { return Err(mismatch(instr)) };
	let statement = match b {
		0 => Statement::partial(format!("return {}", unresolved(&format!("values from R{} to stack top", a.0)))),
		1 => Statement::done("return".to_string()),
		_ => {
			let values = (0..b - 1)
				.map(|i| ctx.get(offset(a, i)))
				.collect::<Vec<String>>()
				.join(", ");
			Statement::done(format!("return {values}"))
		}
	};
	Ok(statement)
}

fn op_closure(ctx: &mut Context, proto: &Proto, instr: &Instruction) -> Result<Statement> {
	let Instr::Closure(a, bx) = instr.1 else { return Err(mismatch(instr)) };
	let child = proto.prototypes.get(bx as usize)
		.ok_or(DecompileError::ClosureOutOfRange { index: bx, len: proto.prototypes.len() })?;
	// each upvalue is described by a MOVE/GETUPVAL that follows the CLOSURE
	ctx.pending_upvalues = child.nupvals as usize;
	let name = function_name(&child_path(ctx.path(), bx as usize));
	Ok(Statement::done(ctx.declare(a, NameKind::Var, &name)))
}

fn op_vararg(ctx: &mut Context, _proto: &Proto, instr: &Instruction) -> Result<Statement> {
	let Instr::VarArg(a, b) = instr.1 else { return Err(mismatch(instr)) };
	let statement = match b {
		0 => {
			ctx.clear_from(a);
			let line = ctx.declare(a, NameKind::Var, "...");
			Statement::partial(format!("{line} {}", unresolved("remaining values to stack top")))
		},
		1 => Statement::empty(),
		_ => {
			let names = declare_many(ctx, a, b - 1);
			Statement::done(format!("local {} = ...", names.join(", ")))
		}
	};
	Ok(statement)
}
