//! Fluent Bit configuration parsing

mod fluent_bit;

pub use fluent_bit::*;
