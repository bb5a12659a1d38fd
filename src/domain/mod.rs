//! Domain value types shared by every layer.

pub mod types;

pub use types::{LoaderState, PageRequest, PageResult};
