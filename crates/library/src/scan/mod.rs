//! File discovery.
//!
//! Lists the regular files below a source folder, either just its immediate
//! children or the whole tree. Results come back in the order the filesystem
//! hands them out; nothing is sorted.

pub mod error;
mod stream;

pub use self::stream::{discover, scan};
