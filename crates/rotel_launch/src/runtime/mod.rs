//! Runtime components: launch sequence and process handoff

pub mod launcher;
pub mod process;

pub use launcher::*;
pub use process::*;
