//! Staging of remote log processors

mod reference;
pub mod s3;
mod stager;
mod store;

pub use reference::*;
pub use stager::*;
pub use store::*;
