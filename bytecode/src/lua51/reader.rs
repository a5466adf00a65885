use super::{constant, Endianness, Error, Header, Result};

/// Forward-only cursor over a chunk. Integer, size and number reads use the
/// widths pushed in by [`Reader::configure`]; all default to the common
/// 32-bit layout until the header has been negotiated.
#[derive(Debug)]
pub struct Reader<'a> {
	buffer: &'a [u8],
	offset: usize,
	endianness: Endianness,
	int: u8,
	size_t: u8,
	lua_number: u8,
	integral: bool
}

impl<'a> Reader<'a> {
	pub fn new(buffer: &'a [u8], endianness: Endianness) -> Self {
		let header = Header::default();
		Self {
			buffer,
			offset: 0,
			endianness,
			int: header.int,
			size_t: header.size_t,
			lua_number: header.lua_number,
			integral: header.integral
		}
	}

	pub fn configure(&mut self, header: &Header) {
		self.int = header.int;
		self.size_t = header.size_t;
		self.lua_number = header.lua_number;
		self.integral = header.integral;
	}

	pub fn endianness(&self) -> Endianness {
		self.endianness
	}

	pub fn offset(&self) -> usize {
		self.offset
	}

	pub fn remaining(&self) -> usize {
		self.buffer.len() - self.offset
	}

	#[inline]
	pub fn byte(&mut self) -> Result<u8> {
		Ok(self.bytes(1)?[0])
	}

	#[inline]
	pub fn bytes(&mut self, n: usize) -> Result<&'a [u8]> {
		if n > self.remaining() {
			return Err(Error::Eof { offset: self.offset, wanted: n });
		}
		let v = &self.buffer[self.offset..self.offset + n];
		self.offset += n;
		Ok(v)
	}

	/// Reads an unsigned value `n` bytes wide (at most 8) in stream byte order.
	#[inline]
	pub fn uint(&mut self, n: usize) -> Result<u64> {
		let bytes = self.bytes(n)?;
		let mut sum: u64 = 0;
		match self.endianness {
			Endianness::Little => {
				for byte in bytes.iter().rev() {
					sum = (sum << 8) | *byte as u64;
				}
			},
			Endianness::Big => {
				for byte in bytes {
					sum = (sum << 8) | *byte as u64;
				}
			}
		}
		Ok(sum)
	}

	#[inline]
	pub fn int(&mut self) -> Result<i64> {
		let width = self.int as usize;
		Ok(sign_extend(self.uint(width)?, width))
	}

	#[inline]
	pub fn size(&mut self) -> Result<u64> {
		self.uint(self.size_t as usize)
	}

	pub fn number(&mut self) -> Result<f64> {
		let width = self.lua_number as usize;
		let bits = self.uint(width)?;

		if self.integral {
			return Ok(sign_extend(bits, width) as f64);
		}
		Ok(match width {
			4 => constant::single(bits as u32),
			_ => constant::double(bits)
		})
	}

	/// Size-prefixed string. The stored length counts the trailing NUL; a
	/// zero length stands for an absent string.
	pub fn string(&mut self) -> Result<String> {
		let size = self.size()?;
		let size = usize::try_from(size)
			.map_err(|_| Error::Eof { offset: self.offset, wanted: usize::MAX })?;
		let mut bytes = self.bytes(size)?;
		if let [rest @ .., 0] = bytes {
			bytes = rest;
		}
		Ok(String::from_utf8_lossy(bytes).into_owned())
	}
}

fn sign_extend(value: u64, width: usize) -> i64 {
	if width == 0 || width >= 8 {
		return value as i64;
	}
	let shift = 64 - width * 8;
	((value << shift) as i64) >> shift
}
