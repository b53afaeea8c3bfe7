//! Environment access and Rotel environment synthesis

mod store;
mod synthesizer;
pub mod vars;

pub use store::*;
pub use synthesizer::*;
