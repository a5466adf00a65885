use super::{constant, header, Writer, Header, Proto, Constant};

fn dump_header(writer: &mut Writer, header: &Header) {
	writer.uint(header::SIGNATURE as u64, 4);
	writer.byte(header::VERSION);
	writer.byte(header::FORMAT);
	writer.byte(header.endianness.flag());
	writer.byte(header.int);
	writer.byte(header.size_t);
	writer.byte(header.instr);
	writer.byte(header.lua_number);
	writer.byte(header.integral as u8);
}

fn dump_vector<T>(writer: &mut Writer, list: &[T], dump: fn(&mut Writer, &T)) {
	writer.int(list.len() as i64);
	list.iter().for_each(|v| dump(writer, v));
}

fn dump_chunk(writer: &mut Writer, proto: &Proto) {
	writer.string(&proto.source);
	writer.int(proto.line_defined);
	writer.int(proto.last_line_defined);
	writer.byte(proto.nupvals);
	writer.byte(proto.nparams);
	writer.byte(proto.is_vararg_flag);
	writer.byte(proto.max_stack_size);

	// instructions
	dump_vector(writer, &proto.instructions, |writer, instr| writer.uint(instr.serialize() as u64, 4));

	// constants
	dump_vector(writer, &proto.constants, |writer, kst| {
		writer.byte(constant::tag(kst));
		match kst {
			Constant::Nil => {},
			&Constant::Boolean(b) => writer.byte(b as u8),
			Constant::String(s) => writer.string(s),
			&Constant::Number(n) => writer.number(n)
		}
	});

	// protos
	dump_vector(writer, &proto.prototypes, dump_chunk);

	// source lines
	dump_vector(writer, &proto.source_lines, |writer, l| writer.int(*l));

	// locals
	dump_vector(writer, &proto.locals, |writer, local| {
		writer.string(&local.0);
		writer.int(local.1);
		writer.int(local.2);
	});

	// upvalues
	dump_vector(writer, &proto.upvals, |writer, upval| writer.string(upval));
}

pub fn serialize_bytecode(header: &Header, proto: &Proto) -> Vec<u8> {
	let mut writer = Writer::new(*header);

	dump_header(&mut writer, header);
	dump_chunk(&mut writer, proto);

	writer.into_bytes()
}
