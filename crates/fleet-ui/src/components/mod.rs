pub mod distribution;
pub mod header;
