//! Tempo and year queries over a song collection stored in a red-black tree.

mod error;
mod library;
mod song;

pub use error::{Error, Result};
pub use library::Library;
pub use song::Song;
