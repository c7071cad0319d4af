#[macro_use]
mod macros;

pub mod analysis;
pub mod bind;
pub mod cancel;
pub mod cli;
pub mod diagnostic;
pub mod error;
pub mod fix;
pub mod linter;
pub mod logging;
pub mod model;
pub mod project;
pub mod range;
pub mod registry;
pub mod settings;
pub mod source_map;
pub mod syntax;
pub mod text_diff;
