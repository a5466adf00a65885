use std::collections::BTreeMap;

use bytecode::lua51::instruction::Reg;

use crate::logger::Logger;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKind {
	Var,
	Global
}

impl NameKind {
	fn prefix(self) -> &'static str {
		match self {
			Self::Var => "var",
			Self::Global => "global"
		}
	}
}

/// Issues `var<N>` / `global<N>` identifiers. Both kinds draw from one
/// sequence, so no number is handed out twice.
#[derive(Debug, Default, Clone)]
pub struct Names {
	next: usize
}

impl Names {
	pub fn fresh(&mut self, kind: NameKind) -> String {
		let name = format!("{}{}", kind.prefix(), self.next);
		self.next += 1;
		name
	}
}

/// State of one prototype's decompilation pass: the register file, the name
/// sequence and the diagnostic sink.
pub struct Context<'a> {
	registers: BTreeMap<u16, String>,
	names: Names,
	path: String,
	logger: &'a mut Logger,
	// upvalue pseudo-instructions still owed to the last CLOSURE
	pub pending_upvalues: usize
}

impl<'a> Context<'a> {
	pub fn new(names: Names, path: String, logger: &'a mut Logger) -> Self {
		Self {
			registers: BTreeMap::new(),
			names,
			path,
			logger,
			pending_upvalues: 0
		}
	}

	pub fn into_names(self) -> Names {
		self.names
	}

	pub fn path(&self) -> &str {
		&self.path
	}

	pub fn logger(&mut self) -> &mut Logger {
		&mut *self.logger
	}

	pub fn is_bound(&self, reg: Reg) -> bool {
		self.registers.contains_key(&reg.0)
	}

	/// Name bound to `reg`, or `R<index>` when nothing has written it yet.
	pub fn get(&mut self, reg: Reg) -> String {
		match self.registers.get(&reg.0) {
			Some(name) => name.clone(),
			None => {
				let location = self.describe();
				self.logger.warn(format!("read of unbound register {} in {location}", reg.0));
				format!("R{}", reg.0)
			}
		}
	}

	pub fn bind(&mut self, reg: Reg, name: String) {
		self.registers.insert(reg.0, name);
	}

	/// Forgets every binding at or above `reg`.
	pub fn clear_from(&mut self, reg: Reg) {
		self.registers.split_off(&reg.0);
	}

	pub fn fresh(&mut self, kind: NameKind) -> String {
		self.names.fresh(kind)
	}

	/// Binds a fresh name of `kind` to `reg` and renders its declaration.
	pub fn declare(&mut self, reg: Reg, kind: NameKind, expr: &str) -> String {
		let name = self.fresh(kind);
		self.bind(reg, name.clone());
		format!("local {name} = {expr}")
	}

	/// Assigns to the name already held by `reg`, declaring a new local if
	/// the register is unbound.
	pub fn assign(&mut self, reg: Reg, expr: &str) -> String {
		match self.registers.get(&reg.0) {
			Some(name) => format!("{name} = {expr}"),
			None => self.declare(reg, NameKind::Var, expr)
		}
	}

	fn describe(&self) -> String {
		if self.path.is_empty() {
			"main chunk".to_string()
		} else {
			format!("function_{}", self.path)
		}
	}
}
