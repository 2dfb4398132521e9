mod access;
mod drop_privileges;
mod expand_tilde;
mod mkdir;
mod mount;
mod output;
mod remove_tree;
mod resolve_identity;

pub use access::*;
pub use drop_privileges::*;
pub use expand_tilde::*;
pub use mkdir::*;
pub use mount::*;
pub use output::*;
pub use remove_tree::*;
pub use resolve_identity::*;
