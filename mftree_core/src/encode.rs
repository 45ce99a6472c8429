//! Master file table encoding.
//!
//! Writes the layout read by [`crate::decode`]. Useful for building tables
//! from scratch; nothing here writes back to an existing table file.

use crate::decode::PointerWidth;
use crate::entry::Entry;
use crate::error::{Error, Result};

/// Encode a tree as a table, root record first, children depth-first.
///
/// Names get one terminator byte and reserved slots are zero-filled. Files
/// are written with a child count of zero.
pub fn encode_table(root: &Entry, pointer_width: PointerWidth) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut pending = vec![root];

    while let Some(entry) = pending.pop() {
        encode_record(entry, pointer_width, &mut buf)?;
        if entry.is_dir() {
            pending.extend(entry.children().iter().rev());
        }
    }

    Ok(buf)
}

fn encode_record(entry: &Entry, pointer_width: PointerWidth, buf: &mut Vec<u8>) -> Result<()> {
    let name_len = i32::try_from(entry.name().len() + 1).map_err(|_| {
        Error::invalid_name(format!("name too long to encode: {} bytes", entry.name().len()))
    })?;
    let child_count = if entry.is_dir() {
        i32::try_from(entry.child_count()).map_err(|_| {
            Error::malformed(buf.len(), format!("too many children: {}", entry.child_count()))
        })?
    } else {
        0
    };

    // Id (4 bytes, little-endian)
    buf.extend_from_slice(&entry.id().to_le_bytes());

    // Name length including terminator, then name and terminator
    buf.extend_from_slice(&name_len.to_le_bytes());
    buf.extend_from_slice(entry.name());
    buf.push(0);

    // Flags (1 byte each)
    buf.push(entry.kind().to_flag());
    buf.push(entry.is_readonly() as u8);

    // Raw size, kept even for directories
    buf.extend_from_slice(&entry.size.to_le_bytes());

    // Child count and reserved slots
    buf.extend_from_slice(&child_count.to_le_bytes());
    buf.resize(buf.len() + child_count as usize * pointer_width.bytes(), 0);

    Ok(())
}
