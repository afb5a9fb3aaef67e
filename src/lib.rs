//! Force-directed layout and interaction engine for genome assembly graphs.

pub mod assembly;
pub mod engine;
pub mod settings;
pub mod util;
