mod bind_targets;
mod capabilities;
mod identity;
mod overlay_spec;

pub use bind_targets::*;
pub use capabilities::*;
pub use identity::*;
pub use overlay_spec::*;
