use super::{Constant, Error, Reader, Result};

pub const NIL: u8 = 0;
pub const BOOLEAN: u8 = 1;
pub const NUMBER: u8 = 3;
pub const STRING: u8 = 4;

pub fn read(reader: &mut Reader) -> Result<Constant> {
	let tag = reader.byte()?;
	Ok(match tag {
		NIL => Constant::Nil,
		BOOLEAN => Constant::Boolean(reader.byte()? != 0),
		NUMBER => Constant::Number(reader.number()?),
		STRING => Constant::String(reader.string()?),
		_ => return Err(Error::InvalidConstant(tag))
	})
}

pub fn tag(constant: &Constant) -> u8 {
	match constant {
		Constant::Nil => NIL,
		Constant::Boolean(_) => BOOLEAN,
		Constant::Number(_) => NUMBER,
		Constant::String(_) => STRING
	}
}

/// Rebuilds a double from its raw bits: sign at 63, exponent at 52..=62,
/// mantissa at 0..=51.
pub fn double(bits: u64) -> f64 {
	ieee754(bits, 11, 52)
}

/// Single-precision counterpart of [`double`], for 4-byte `lua_Number`.
pub fn single(bits: u32) -> f64 {
	ieee754(bits as u64, 8, 23)
}

// An all-ones exponent always yields an infinity of the encoded sign; chunks
// never carry NaN constants.
fn ieee754(bits: u64, exponent_bits: u32, mantissa_bits: u32) -> f64 {
	let sign = if (bits >> (exponent_bits + mantissa_bits)) & 1 == 1 { -1.0 } else { 1.0 };
	let max_exponent = (1u64 << exponent_bits) - 1;
	let exponent = (bits >> mantissa_bits) & max_exponent;
	let mantissa = bits & ((1u64 << mantissa_bits) - 1);
	let bias = (max_exponent >> 1) as i32;
	let fraction = mantissa as f64 / (1u64 << mantissa_bits) as f64;

	if exponent == max_exponent {
		sign * f64::INFINITY
	} else if exponent == 0 {
		sign * 2f64.powi(1 - bias) * fraction
	} else {
		sign * 2f64.powi(exponent as i32 - bias) * (1.0 + fraction)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::lua51::{Endianness, Header};

	#[test]
	fn infinities() {
		assert_eq!(double(0x7ff0_0000_0000_0000), f64::INFINITY);
		assert_eq!(double(0xfff0_0000_0000_0000), f64::NEG_INFINITY);
	}

	#[test]
	fn subnormal() {
		assert_eq!(double(1), f64::from_bits(1));
		assert_eq!(double(0x000f_ffff_ffff_ffff), f64::from_bits(0x000f_ffff_ffff_ffff));
	}

	#[test]
	fn normal_values() {
		assert!((double(3.14f64.to_bits()) - 3.14).abs() < 1e-12);
		assert_eq!(double((-2.5f64).to_bits()), -2.5);
		assert_eq!(double(0), 0.0);
	}

	#[test]
	fn single_precision() {
		assert_eq!(single(1.5f32.to_bits()), 1.5);
		assert_eq!(single(0xff80_0000), f64::NEG_INFINITY);
	}

	#[test]
	fn number_honours_byte_order() {
		let bits = 3.14f64.to_bits();
		let little = bits.to_le_bytes();
		let big = bits.to_be_bytes();

		let mut reader = Reader::new(&little, Endianness::Little);
		assert!((reader.number().unwrap() - 3.14).abs() < 1e-12);
		let mut reader = Reader::new(&big, Endianness::Big);
		assert!((reader.number().unwrap() - 3.14).abs() < 1e-12);
	}

	#[test]
	fn integral_numbers() {
		let data = (-7i32).to_le_bytes();
		let mut reader = Reader::new(&data, Endianness::Little);
		reader.configure(&Header { lua_number: 4, integral: true, ..Header::default() });
		assert_eq!(reader.number(), Ok(-7.0));
	}

	#[test]
	fn decodes_each_tag() {
		let data = [NIL, BOOLEAN, 1, STRING, 2, 0, 0, 0, b'x', 0];
		let mut reader = Reader::new(&data, Endianness::Little);
		assert_eq!(read(&mut reader), Ok(Constant::Nil));
		assert_eq!(read(&mut reader), Ok(Constant::Boolean(true)));
		assert_eq!(read(&mut reader), Ok(Constant::String("x".to_string())));
	}

	#[test]
	fn rejects_light_userdata() {
		let data = [2, 0];
		let mut reader = Reader::new(&data, Endianness::Little);
		assert_eq!(read(&mut reader), Err(Error::InvalidConstant(2)));
	}
}
