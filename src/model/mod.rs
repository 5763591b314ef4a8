//! Model of the algorithms to generate code for.
//!
//! Entities are built once by a front-end, handed to `crate::render`,
//! and discarded afterwards.

mod algo;
mod err;
mod named;
mod ty;
mod var;

pub use algo::*;
pub use err::*;
pub use named::*;
pub use ty::*;
pub use var::*;
