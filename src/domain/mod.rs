mod search;
mod templates;
mod types;

pub use search::*;
pub use templates::*;
pub use types::*;
