//! Pseudo-source recovery for stripped Lua 5.1 chunks.
//!
//! Each prototype is replayed instruction by instruction against a fresh
//! register file; every handled instruction becomes one line of output.
//! Branches and loops are not reconstructed.

pub mod context;
pub mod emitter;
pub mod error;
pub mod handlers;
pub mod logger;

use bytecode::lua51::{deserialize_bytecode, instruction::Reg, Error, Proto, MAX_NESTING};

use context::{Context, NameKind, Names};
use emitter::Emitter;
use logger::{Level, Logger};

pub use error::{DecompileError, Result};

/// How far the `var<N>` / `global<N>` sequence reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NameScope {
	/// Numbering restarts for every function.
	#[default]
	PerPrototype,
	/// One sequence for the whole chunk.
	Program
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
	pub name_scope: NameScope,
	pub log_level: Level,
	// mirror kept diagnostics to stderr
	pub echo: bool
}

impl Default for Options {
	fn default() -> Self {
		Self {
			name_scope: NameScope::PerPrototype,
			log_level: Level::Error,
			echo: false
		}
	}
}

pub struct Decompiler {
	options: Options,
	logger: Logger,
	emitter: Emitter,
	names: Names
}

impl Decompiler {
	pub fn new(options: Options) -> Self {
		Self {
			options,
			logger: Logger::new(options.log_level, options.echo),
			emitter: Emitter::new(),
			names: Names::default()
		}
	}

	pub fn logger(&self) -> &Logger {
		&self.logger
	}

	/// Parses `bytecode` and renders the whole prototype tree.
	pub fn decompile(&mut self, bytecode: &[u8]) -> Result<String> {
		let (header, proto) = match deserialize_bytecode(bytecode) {
			Ok(parsed) => parsed,
			Err(err) => {
				self.logger.error(err.to_string());
				return Err(err.into());
			}
		};
		self.logger.info(format!(
			"chunk: {:?} endian, int {}, size_t {}, lua_Number {}{}",
			header.endianness, header.int, header.size_t, header.lua_number,
			if header.integral { " (integral)" } else { "" }
		));

		self.decompile_proto(&proto)
	}

	/// Renders an already parsed prototype tree, parent before children.
	pub fn decompile_proto(&mut self, proto: &Proto) -> Result<String> {
		self.names = Names::default();
		self.emitter = Emitter::new();
		self.walk(proto, "", 0)?;
		Ok(std::mem::take(&mut self.emitter).finish())
	}

	fn walk(&mut self, proto: &Proto, path: &str, depth: usize) -> Result<()> {
		if depth > MAX_NESTING {
			let err = Error::NestingTooDeep(MAX_NESTING);
			self.logger.error(format!("function_{path}: {err}"));
			return Err(err.into());
		}

		let names = match self.options.name_scope {
			NameScope::PerPrototype => Names::default(),
			NameScope::Program => std::mem::take(&mut self.names)
		};
		let mut ctx = Context::new(names, path.to_string(), &mut self.logger);

		let is_main = path.is_empty();
		if !is_main {
			let mut params = (0..proto.nparams as u16)
				.map(|r| {
					let name = ctx.fresh(NameKind::Var);
					ctx.bind(Reg(r), name.clone());
					name
				})
				.collect::<Vec<String>>();
			if proto.is_vararg() {
				params.push("...".to_string());
			}
			self.emitter.line(&format!("function {}({})", handlers::function_name(path), params.join(", ")));
			self.emitter.indent();
		}

		for (pc, instruction) in proto.instructions.iter().enumerate() {
			let op = instruction.0;
			if ctx.pending_upvalues > 0 {
				ctx.pending_upvalues -= 1;
				continue;
			}

			let Some(handler) = handlers::handler(op) else {
				ctx.logger().warn(format!("unhandled opcode {} at pc {}, skipped", op.name(), pc + 1));
				continue;
			};
			let statement = match handler(&mut ctx, proto, instruction) {
				Ok(statement) => statement,
				Err(err) => {
					ctx.logger().error(format!("{} at pc {}: {err}", op.name(), pc + 1));
					return Err(err);
				}
			};

			if !statement.complete {
				ctx.logger().warn(format!("{} at pc {} only partially recovered", op.name(), pc + 1));
			}
			if !statement.line.is_empty() {
				self.emitter.line(&statement.line);
			}
		}

		let names = ctx.into_names();
		if self.options.name_scope == NameScope::Program {
			self.names = names;
		}

		for (index, child) in proto.prototypes.iter().enumerate() {
			self.walk(child, &handlers::child_path(path, index), depth + 1)?;
		}

		if !is_main {
			self.emitter.dedent();
			self.emitter.line("end");
		}
		Ok(())
	}
}

/// Decompiles a whole chunk with `options`.
pub fn decompile(bytecode: &[u8], options: Options) -> Result<String> {
	Decompiler::new(options).decompile(bytecode)
}
