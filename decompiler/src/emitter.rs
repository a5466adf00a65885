const INDENT: &str = "    ";

/// Append-only line buffer; every line is prefixed with four spaces per
/// indent level.
#[derive(Debug, Default)]
pub struct Emitter {
	lines: Vec<String>,
	indent: usize
}

impl Emitter {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn line(&mut self, line: &str) {
		self.lines.push(format!("{}{}", INDENT.repeat(self.indent), line));
	}

	pub fn indent(&mut self) {
		self.indent += 1;
	}

	pub fn dedent(&mut self) {
		self.indent = self.indent.saturating_sub(1);
	}

	pub fn finish(self) -> String {
		self.lines.iter().map(|line| format!("{line}\n")).collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn indents_by_four_spaces() {
		let mut emitter = Emitter::new();
		emitter.line("function f()");
		emitter.indent();
		emitter.line("return");
		emitter.dedent();
		emitter.dedent();
		emitter.line("end");
		assert_eq!(emitter.finish(), "function f()\n    return\nend\n");
	}
}
