pub mod emitters;
pub mod error;
pub mod generator;
pub mod naming;
pub mod type_mapper;

pub use error::EmitError;
pub use generator::{RustGenerator, RustGeneratorConfig};
