pub mod cli;
pub mod impls;
pub mod preflight;
pub mod resolve;
pub mod structs;

pub use preflight::preflight;
pub use resolve::resolve_config;
pub use structs::*;
