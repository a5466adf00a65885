use {
	anyhow::{bail, Context},
	decompiler::{logger::Level, Decompiler, NameScope, Options},
	std::{env, fs},
};

const USAGE: &str = "usage: playground <chunk.out> [log level 0-3] [--program-names]";

fn main() -> anyhow::Result<()> {
	let args: Vec<String> = env::args().skip(1).collect();
	let Some(path) = args.first() else {
		bail!(USAGE);
	};

	let mut options = Options::default();
	for arg in &args[1..] {
		if arg == "--program-names" {
			options.name_scope = NameScope::Program;
			continue;
		}
		let level = arg.parse::<u8>().ok().and_then(Level::from_u8);
		match level {
			Some(level) => options.log_level = level,
			None => bail!("unexpected argument `{arg}`\n{USAGE}")
		}
	}

	let chunk = fs::read(path).with_context(|| format!("unable to read {path}"))?;
	let mut decompiler = Decompiler::new(options);
	let result = decompiler.decompile(&chunk);
	eprint!("{}", decompiler.logger().view());
	let source = result.with_context(|| format!("unable to decompile {path}"))?;
	print!("{source}");

	Ok(())
}
