pub type Bytecode = [u8];

pub mod lua51;
