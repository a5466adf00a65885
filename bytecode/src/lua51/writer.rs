use super::{Endianness, Header};

/// Inverse of [`super::Reader`]: writes values with the widths and byte
/// order of a negotiated header.
pub struct Writer {
	buffer: Vec<u8>,
	header: Header
}

impl Writer {
	pub fn new(header: Header) -> Self {
		Self { buffer: vec![], header }
	}

	pub fn into_bytes(self) -> Vec<u8> {
		self.buffer
	}

	#[inline]
	pub fn byte(&mut self, b: u8) {
		self.buffer.push(b);
	}

	#[inline]
	pub fn bytes(&mut self, bs: &[u8]) {
		self.buffer.extend_from_slice(bs);
	}

	#[inline]
	pub fn uint(&mut self, n: u64, s: u8) {
		let s = s as usize;
		let le = n.to_le_bytes();
		match self.header.endianness {
			Endianness::Little => self.buffer.extend_from_slice(&le[..s]),
			Endianness::Big => self.buffer.extend(le[..s].iter().rev())
		}
	}

	#[inline]
	pub fn int(&mut self, n: i64) {
		self.uint(n as u64, self.header.int);
	}

	#[inline]
	pub fn size(&mut self, n: u64) {
		self.uint(n, self.header.size_t);
	}

	#[inline]
	pub fn string(&mut self, str: &str) {
		if str.is_empty() {
			self.size(0);
			return;
		}
		self.size(str.len() as u64 + 1);
		self.bytes(str.as_bytes());
		self.byte(0);
	}

	#[inline]
	pub fn number(&mut self, n: f64) {
		let width = self.header.lua_number;
		let bits = if self.header.integral {
			n as i64 as u64
		} else if width == 4 {
			(n as f32).to_bits() as u64
		} else {
			n.to_bits()
		};
		self.uint(bits, width);
	}
}
