mod build;
mod cleanup;
mod enter;
mod jail_struct;
mod mirror;
mod overlay;
mod privilege;
mod run;
mod supervise;
mod tracker;

pub use jail_struct::*;
pub use run::run;
pub use supervise::Supervised;
pub use tracker::*;
