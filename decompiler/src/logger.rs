use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
	Silent = 0,
	Info,
	Warning,
	Error
}

impl Level {
	pub fn from_u8(level: u8) -> Option<Self> {
		match level {
			0 => Some(Self::Silent),
			1 => Some(Self::Info),
			2 => Some(Self::Warning),
			3 => Some(Self::Error),
			_ => None
		}
	}
}

impl fmt::Display for Level {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::Silent => "None",
			Self::Info => "Info",
			Self::Warning => "Warning",
			Self::Error => "Error"
		})
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry(pub Level, pub String);

/// Leveled diagnostic sink. A message is kept when logging is not silenced
/// and its level does not exceed the configured one; kept messages are
/// optionally echoed to stderr.
#[derive(Debug)]
pub struct Logger {
	level: Level,
	echo: bool,
	log: Vec<Entry>
}

impl Logger {
	pub fn new(level: Level, echo: bool) -> Self {
		Self { level, echo, log: vec![] }
	}

	pub fn silent() -> Self {
		Self::new(Level::Silent, false)
	}

	pub fn level(&self) -> Level {
		self.level
	}

	pub fn set_level(&mut self, level: u8) {
		match Level::from_u8(level) {
			Some(level) => self.level = level,
			None => self.send(format!("invalid log level {level}"), Level::Warning)
		}
	}

	pub fn send(&mut self, message: impl Into<String>, level: Level) {
		if self.level == Level::Silent || level > self.level {
			return;
		}

		let message = message.into();
		if self.echo {
			eprintln!("[{level}] {message}");
		}
		self.log.push(Entry(level, message));
	}

	pub fn info(&mut self, message: impl Into<String>) {
		self.send(message, Level::Info)
	}

	pub fn warn(&mut self, message: impl Into<String>) {
		self.send(message, Level::Warning)
	}

	pub fn error(&mut self, message: impl Into<String>) {
		self.send(message, Level::Error)
	}

	pub fn entries(&self) -> &[Entry] {
		&self.log
	}

	pub fn view(&self) -> String {
		self.log.iter()
			.map(|Entry(level, message)| format!("[{level}] {message}\n"))
			.collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn filters_by_level() {
		let mut logger = Logger::new(Level::Warning, false);
		logger.info("chatty");
		logger.warn("careful");
		logger.error("broken");
		assert_eq!(logger.entries(), &[
			Entry(Level::Warning, "careful".to_string()),
			Entry(Level::Error, "broken".to_string())
		]);
		assert_eq!(logger.view(), "[Warning] careful\n[Error] broken\n");
	}

	#[test]
	fn silent_drops_everything() {
		let mut logger = Logger::silent();
		logger.error("broken");
		assert!(logger.entries().is_empty());
	}

	#[test]
	fn rejects_unknown_level() {
		let mut logger = Logger::new(Level::Warning, false);
		logger.set_level(7);
		assert_eq!(logger.level(), Level::Warning);
		assert_eq!(logger.entries().len(), 1);

		logger.set_level(3);
		assert_eq!(logger.level(), Level::Error);
	}
}
