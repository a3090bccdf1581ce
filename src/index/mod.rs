pub mod bitrank;
pub mod builder;
pub mod bwt;
pub mod fm;
pub mod huffwt;
pub mod intarray;
pub mod sa;
pub(crate) mod serial;
