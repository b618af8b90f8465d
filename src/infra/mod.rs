mod clipboard;
mod config;
mod editor;
mod frontmatter;
mod store;

pub use clipboard::*;
pub use config::*;
pub use editor::*;
pub use frontmatter::*;
pub use store::*;
