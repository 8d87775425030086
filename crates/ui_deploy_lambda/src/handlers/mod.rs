pub mod deploy;
pub mod trigger;
