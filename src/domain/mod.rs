//! Domain Layer
//!
//! Core business entity definitions

pub mod command;
pub mod location;

pub use command::*;
pub use location::*;
