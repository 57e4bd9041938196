//! Text layer: escape-sequence parsing and the visitor interface.
//!
//! - [`reader`]: [`BookReader`], which walks a decoded stream
//! - [`hook`]: the [`Hook`] visitor trait
//! - [`plain_hook`]: [`PlainTextHook`], a plain-text renderer
//! - [`charset`]: character classification and decoding

pub mod charset;
mod escape;
pub mod hook;
pub mod plain_hook;
pub mod reader;

pub use hook::Hook;
pub use plain_hook::PlainTextHook;
pub use reader::BookReader;
