//! Algorithms as dataflow units.
//!
//! - `model` describes algorithms, their functions and typed parameters, grouped into interfaces.
//! - `render` turns the model into C++ declarations.
//! - `driver` runs compiled algorithms as processes and moves data through pipes.

pub mod driver;
pub mod model;
pub mod render;
