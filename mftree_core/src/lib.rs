//! # mftree Core
//!
//! Rebuilds a directory tree from a master file table: a flat binary stream
//! of inode records, each followed depth-first by its children.
//!
//! This library decodes the table into an owned tree of [`Entry`] values and
//! provides the operations that work on it: creating entries, finding a
//! child by name and kind, printing and releasing the tree.
//!
//! ## Features
//!
//! - Bounds-checked decoding that never reads past the input buffer
//! - Configurable reserved slot width and nesting limit
//! - Power-of-two child storage growth
//! - Directories-first tree printing
//! - Iterative release, printing and drop for arbitrarily deep trees
//!
//! ## Example
//!
//! ```no_run
//! use mftree_core::{DecodeOptions, EntryKind, Namespace, TreePrinter};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load and decode a table file
//! let mut ns = Namespace::open("master_file_table", DecodeOptions::default())?;
//!
//! // Create a file in the root directory
//! ns.create_at::<&str>(&[], "notes.txt", false, EntryKind::File)?;
//!
//! // Look it up again
//! let notes = ns.root().find(b"notes.txt", EntryKind::File)?;
//! println!("notes has id {:?}", notes.map(|e| e.id()));
//!
//! // Print the tree
//! for line in TreePrinter::new().lines(ns.root()) {
//!     println!("{}", line);
//! }
//!
//! // Release it
//! let stats = ns.release();
//! println!("Released {} entries", stats.names_released);
//! # Ok(())
//! # }
//! ```

mod children;
mod cursor;
mod decode;
mod encode;
mod entry;
mod error;
mod inspect;
mod namespace;
mod print;

pub use children::ChildStore;
pub use cursor::TableCursor;
pub use decode::{DEFAULT_MAX_DEPTH, DecodeOptions, DecodedTable, Decoder, PointerWidth};
pub use encode::encode_table;
pub use entry::{Entry, EntryId, EntryKind, UNSET_ID};
pub use error::{Error, Result};
pub use inspect::{TreeStats, duplicate_ids};
pub use namespace::{IdAllocator, Namespace, ReleaseStats};
pub use print::{DEFAULT_INDENT_WIDTH, MAX_INDENT_WIDTH, ROOT_NAME, TreePrinter};
