use super::{Endianness, Error, Header, Reader, Result};

// "\x1BLua" read as a little-endian integer
pub const SIGNATURE: u32 = 0x6175_4C1B;
pub const VERSION: u8 = 0x51;
pub const FORMAT: u8 = 0;

/// Validates the chunk header and returns a reader positioned on the main
/// prototype, configured with the negotiated widths.
///
/// The signature is probed little-endian first; if that fails the source is
/// reopened big-endian and probed once more.
pub fn negotiate(bytecode: &[u8]) -> Result<(Reader<'_>, Header)> {
	let mut reader = Reader::new(bytecode, Endianness::Little);
	if reader.uint(4)? as u32 != SIGNATURE {
		reader = Reader::new(bytecode, Endianness::Big);
		if reader.uint(4)? as u32 != SIGNATURE {
			return Err(Error::InvalidSignature);
		}
	}

	let version = reader.byte()?;
	if version != VERSION {
		return Err(Error::InvalidVersion(version));
	}
	let format = reader.byte()?;
	if format != FORMAT {
		return Err(Error::UnofficialFormat(format));
	}
	let flag = reader.byte()?;
	if flag != reader.endianness().flag() {
		return Err(Error::InvalidEndianness { flag });
	}

	let header = Header {
		endianness: reader.endianness(),
		int: reader.byte()?,
		size_t: reader.byte()?,
		instr: reader.byte()?,
		lua_number: reader.byte()?,
		integral: reader.byte()? != 0
	};
	validate(&header)?;

	reader.configure(&header);
	Ok((reader, header))
}

fn validate(header: &Header) -> Result<()> {
	let check = |field: &'static str, width: u8, ok: bool| {
		if ok { Ok(()) } else { Err(Error::InvalidWidth { field, width }) }
	};

	check("int", header.int, (1..=8).contains(&header.int))?;
	check("size_t", header.size_t, (1..=8).contains(&header.size_t))?;
	check("instruction", header.instr, header.instr == 4)?;
	let number_ok = if header.integral {
		(1..=8).contains(&header.lua_number)
	} else {
		header.lua_number == 4 || header.lua_number == 8
	};
	check("lua_Number", header.lua_number, number_ok)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn header_bytes(signature: &[u8], rest: &[u8]) -> Vec<u8> {
		let mut bytes = signature.to_vec();
		bytes.extend_from_slice(rest);
		bytes
	}

	#[test]
	fn accepts_little_endian_chunk() {
		let bytes = header_bytes(b"\x1BLua", &[0x51, 0, 1, 4, 8, 4, 8, 0]);
		let (reader, header) = negotiate(&bytes).unwrap();
		assert_eq!(header, Header { size_t: 8, ..Header::default() });
		assert_eq!(reader.offset(), 12);
	}

	#[test]
	fn falls_back_to_big_endian() {
		let bytes = header_bytes(b"auL\x1B", &[0x51, 0, 0, 4, 4, 4, 8, 0]);
		let (reader, header) = negotiate(&bytes).unwrap();
		assert_eq!(header.endianness, Endianness::Big);
		assert_eq!(reader.endianness(), Endianness::Big);
	}

	#[test]
	fn rejects_bad_signature() {
		let bytes = header_bytes(b"\x1BLuB", &[0x51, 0, 1, 4, 4, 4, 8, 0]);
		assert_eq!(negotiate(&bytes).err(), Some(Error::InvalidSignature));
	}

	#[test]
	fn rejects_wrong_version_and_format() {
		let bytes = header_bytes(b"\x1BLua", &[0x52, 0, 1, 4, 4, 4, 8, 0]);
		assert_eq!(negotiate(&bytes).err(), Some(Error::InvalidVersion(0x52)));

		let bytes = header_bytes(b"\x1BLua", &[0x51, 1, 1, 4, 4, 4, 8, 0]);
		assert_eq!(negotiate(&bytes).err(), Some(Error::UnofficialFormat(1)));
	}

	#[test]
	fn rejects_endianness_mismatch() {
		let bytes = header_bytes(b"\x1BLua", &[0x51, 0, 0, 4, 4, 4, 8, 0]);
		assert_eq!(negotiate(&bytes).err(), Some(Error::InvalidEndianness { flag: 0 }));

		let bytes = header_bytes(b"auL\x1B", &[0x51, 0, 1, 4, 4, 4, 8, 0]);
		assert_eq!(negotiate(&bytes).err(), Some(Error::InvalidEndianness { flag: 1 }));
	}

	#[test]
	fn rejects_unsupported_widths() {
		let bytes = header_bytes(b"\x1BLua", &[0x51, 0, 1, 4, 4, 8, 8, 0]);
		assert_eq!(negotiate(&bytes).err(), Some(Error::InvalidWidth { field: "instruction", width: 8 }));

		let bytes = header_bytes(b"\x1BLua", &[0x51, 0, 1, 4, 4, 4, 6, 0]);
		assert_eq!(negotiate(&bytes).err(), Some(Error::InvalidWidth { field: "lua_Number", width: 6 }));

		// integral numbers may use any integer width
		let bytes = header_bytes(b"\x1BLua", &[0x51, 0, 1, 4, 4, 4, 2, 1]);
		assert!(negotiate(&bytes).is_ok());
	}

	#[test]
	fn truncated_header_is_eof() {
		let bytes = header_bytes(b"\x1BLua", &[0x51, 0]);
		assert!(negotiate(&bytes).unwrap_err().is_io());
	}
}
