//! Typed module - Operations on Values with specific schemas.
//!
//! This module pairs decoded documents with their merge strategy type and
//! computes two-way strategic merge patches between them.

mod two_way;
mod typed_value;

pub use typed_value::*;
