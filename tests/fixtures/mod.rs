mod fixture_jail;

pub use fixture_jail::*;
