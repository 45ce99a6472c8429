//! Master file table decoding.
//!
//! A table is one record for the root entry, followed depth-first by the
//! records of its children. Each record is laid out without padding:
//!
//! ```text
//! 4   id (i32 LE)
//! 4   name_length (i32 LE), counting one trailing terminator byte
//! N   name bytes (name_length of them)
//! 1   is_directory (nonzero = directory)
//! 1   is_readonly (nonzero = readonly)
//! 4   size_bytes (i32 LE)
//! 4   child_count (i32 LE)
//! C   reserved slots (child_count * pointer width), ignored
//! ... child records, only present for directories
//! ```
//!
//! The reserved slots are skipped for files too, but a file's declared
//! children are never decoded.

use crate::cursor::TableCursor;
use crate::entry::{Entry, EntryId, EntryKind};
use crate::error::{Error, Result};
use crate::namespace::IdAllocator;
use log::{debug, trace};

/// Default limit on record nesting.
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Width of one reserved slot in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerWidth {
    /// Tables written on 32-bit hosts.
    Four,
    /// Tables written on 64-bit hosts.
    #[default]
    Eight,
}

impl PointerWidth {
    /// Slot width in bytes.
    pub fn bytes(self) -> usize {
        match self {
            PointerWidth::Four => 4,
            PointerWidth::Eight => 8,
        }
    }

    /// Parse a slot width in bytes.
    pub fn from_bytes(bytes: usize) -> Option<Self> {
        match bytes {
            4 => Some(PointerWidth::Four),
            8 => Some(PointerWidth::Eight),
            _ => None,
        }
    }
}

/// Decoder configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Width of each reserved slot.
    pub pointer_width: PointerWidth,
    /// Deepest nesting accepted; the root is depth 0.
    pub max_depth: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            pointer_width: PointerWidth::default(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl DecodeOptions {
    /// Set the reserved slot width.
    pub fn with_pointer_width(mut self, pointer_width: PointerWidth) -> Self {
        self.pointer_width = pointer_width;
        self
    }

    /// Set the nesting limit.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// Result of decoding a whole table.
#[derive(Debug)]
pub struct DecodedTable {
    /// Root of the decoded tree.
    pub root: Entry,
    /// Id counter seeded past the largest id in the table.
    pub ids: IdAllocator,
    /// Bytes consumed by the root record and its descendants.
    pub bytes_consumed: usize,
}

/// Recursive record decoder.
///
/// Tracks the largest id seen across every record it decodes, so one decoder
/// should be used per table.
#[derive(Debug, Clone)]
pub struct Decoder {
    options: DecodeOptions,
    max_id: Option<EntryId>,
}

impl Decoder {
    /// Create a decoder.
    pub fn new(options: DecodeOptions) -> Self {
        Self {
            options,
            max_id: None,
        }
    }

    /// Largest id decoded so far.
    pub fn max_id(&self) -> Option<EntryId> {
        self.max_id
    }

    /// Decode the subtree starting at the cursor.
    ///
    /// On success the cursor sits just past the last byte of the subtree.
    /// On error no partial tree is returned.
    pub fn decode(&mut self, cursor: &mut TableCursor<'_>) -> Result<Entry> {
        self.decode_entry(cursor, 0)
    }

    /// Decode a complete table held in `data`.
    pub fn decode_table(data: &[u8], options: DecodeOptions) -> Result<DecodedTable> {
        let mut decoder = Decoder::new(options);
        let mut cursor = TableCursor::new(data);
        let root = decoder.decode(&mut cursor)?;

        if cursor.remaining() > 0 {
            debug!(
                "{} trailing bytes after root record at offset {}",
                cursor.remaining(),
                cursor.position()
            );
        }

        let ids = match decoder.max_id {
            Some(max) => IdAllocator::after(max),
            None => IdAllocator::new(),
        };
        debug!(
            "Decoded table: {} bytes, root {:?}, next id {:?}",
            cursor.position(),
            root.name_lossy(),
            ids.peek()
        );

        Ok(DecodedTable {
            root,
            ids,
            bytes_consumed: cursor.position(),
        })
    }

    fn decode_entry(&mut self, cursor: &mut TableCursor<'_>, depth: usize) -> Result<Entry> {
        if depth > self.options.max_depth {
            return Err(Error::DepthLimitExceeded {
                limit: self.options.max_depth,
            });
        }

        let record_offset = cursor.position();
        let mut entry = Entry::empty();

        entry.id = cursor.read_i32()?;
        self.max_id = Some(self.max_id.map_or(entry.id, |max| max.max(entry.id)));

        let name_offset = cursor.position();
        let name_len = cursor.read_i32()?;
        if name_len < 1 {
            return Err(Error::malformed(
                name_offset,
                format!("name length {} is less than 1", name_len),
            ));
        }
        let raw_name = cursor.read_bytes(name_len as usize)?;
        // The terminator is counted but not trusted to be there.
        let end = raw_name
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(raw_name.len());
        if end == 0 {
            return Err(Error::malformed(name_offset, "empty name"));
        }
        entry.name = raw_name[..end].to_vec();

        entry.kind = EntryKind::from_flag(cursor.read_u8()?);
        entry.readonly = cursor.read_u8()? != 0;
        entry.size = cursor.read_i32()?;

        let count_offset = cursor.position();
        let child_count = cursor.read_i32()?;
        if child_count < 0 {
            return Err(Error::malformed(
                count_offset,
                format!("negative child count {}", child_count),
            ));
        }
        let child_count = child_count as usize;

        let reserved = child_count
            .checked_mul(self.options.pointer_width.bytes())
            .ok_or_else(|| Error::truncated(cursor.position(), usize::MAX, cursor.remaining()))?;
        cursor.skip(reserved)?;

        trace!(
            "Record at {}: id={} name={:?} kind={} children={}",
            record_offset,
            entry.id,
            entry.name_lossy(),
            entry.kind.as_str(),
            child_count
        );

        match entry.kind {
            EntryKind::Directory => {
                for _ in 0..child_count {
                    let child = self.decode_entry(cursor, depth + 1)?;
                    entry.children.append(child)?;
                }
            }
            EntryKind::File if child_count > 0 => {
                debug!(
                    "File {:?} at offset {} declares {} children; not decoding them",
                    entry.name_lossy(),
                    record_offset,
                    child_count
                );
            }
            EntryKind::File => {}
        }

        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::encode_table;

    /// Hand-assemble one record header (no children).
    fn record(
        id: i32,
        name: &[u8],
        dir: bool,
        readonly: bool,
        size: i32,
        children: i32,
        width: usize,
    ) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&id.to_le_bytes());
        buf.extend_from_slice(&(name.len() as i32 + 1).to_le_bytes());
        buf.extend_from_slice(name);
        buf.push(0);
        buf.push(dir as u8);
        buf.push(readonly as u8);
        buf.extend_from_slice(&size.to_le_bytes());
        buf.extend_from_slice(&children.to_le_bytes());
        buf.extend(std::iter::repeat_n(0xAA, children.max(0) as usize * width));
        buf
    }

    /// Root "/" with file "a.txt" (10 bytes) and readonly directory "b".
    fn sample_table() -> Vec<u8> {
        let mut buf = record(0, b"/", true, false, 0, 2, 8);
        buf.extend(record(1, b"a.txt", false, false, 10, 0, 8));
        buf.extend(record(2, b"b", true, true, 0, 0, 8));
        buf
    }

    fn decode(data: &[u8]) -> Result<DecodedTable> {
        Decoder::decode_table(data, DecodeOptions::default())
    }

    #[test]
    fn test_decode_sample_table() {
        let data = sample_table();
        let table = decode(&data).unwrap();
        let root = &table.root;

        assert_eq!(root.id(), 0);
        assert_eq!(root.name(), b"/");
        assert!(root.is_dir());
        assert!(!root.is_readonly());
        assert_eq!(root.child_count(), 2);

        let a = root.children().get(0).unwrap();
        assert_eq!(a.name(), b"a.txt");
        assert_eq!(a.kind(), EntryKind::File);
        assert_eq!(a.size_bytes(), 10);

        let b = root.children().get(1).unwrap();
        assert_eq!(b.name(), b"b");
        assert!(b.is_dir());
        assert!(b.is_readonly());

        assert_eq!(table.bytes_consumed, data.len());
        assert_eq!(table.ids.peek(), Some(3));
    }

    #[test]
    fn test_next_id_follows_largest_id_not_last() {
        let mut data = record(7, b"/", true, false, 0, 2, 8);
        data.extend(record(40, b"x", false, false, 0, 0, 8));
        data.extend(record(3, b"y", false, false, 0, 0, 8));

        let table = decode(&data).unwrap();
        assert_eq!(table.ids.peek(), Some(41));
    }

    #[test]
    fn test_file_children_are_skipped_but_slots_consumed() {
        // A file declaring 3 children: its slots are skipped, the 3 records are not read.
        let mut data = record(0, b"/", true, false, 0, 2, 8);
        data.extend(record(1, b"f", false, false, 5, 3, 8));
        data.extend(record(2, b"g", false, false, 6, 0, 8));

        let table = decode(&data).unwrap();
        let root = &table.root;
        assert_eq!(root.child_count(), 2);
        assert_eq!(root.children().get(0).unwrap().child_count(), 0);
        assert_eq!(root.children().get(1).unwrap().name(), b"g");
        assert_eq!(table.bytes_consumed, data.len());
    }

    #[test]
    fn test_pointer_width_four() {
        let mut data = record(0, b"/", true, false, 0, 1, 4);
        data.extend(record(1, b"x", false, false, 0, 0, 4));

        let options = DecodeOptions::default().with_pointer_width(PointerWidth::Four);
        let table = Decoder::decode_table(&data, options).unwrap();
        assert_eq!(table.root.child_count(), 1);
        assert_eq!(table.bytes_consumed, data.len());

        // The same bytes read with 8-byte slots run off the end.
        assert!(matches!(decode(&data), Err(Error::TruncatedInput { .. })));
    }

    #[test]
    fn test_name_without_terminator_is_bounded() {
        let mut data = Vec::new();
        data.extend_from_slice(&5i32.to_le_bytes());
        data.extend_from_slice(&3i32.to_le_bytes());
        data.extend_from_slice(b"abc"); // no terminator inside the span
        data.extend_from_slice(&[0, 0]);
        data.extend_from_slice(&0i32.to_le_bytes());
        data.extend_from_slice(&0i32.to_le_bytes());

        let table = decode(&data).unwrap();
        assert_eq!(table.root.name(), b"abc");
        assert_eq!(table.bytes_consumed, data.len());
    }

    #[test]
    fn test_name_stops_at_embedded_terminator() {
        let mut data = Vec::new();
        data.extend_from_slice(&1i32.to_le_bytes());
        data.extend_from_slice(&6i32.to_le_bytes());
        data.extend_from_slice(b"ab\0cd\0");
        data.extend_from_slice(&[0, 0]);
        data.extend_from_slice(&0i32.to_le_bytes());
        data.extend_from_slice(&0i32.to_le_bytes());

        let table = decode(&data).unwrap();
        assert_eq!(table.root.name(), b"ab");
        assert_eq!(table.bytes_consumed, data.len());
    }

    #[test]
    fn test_zero_name_length_is_malformed() {
        let mut data = Vec::new();
        data.extend_from_slice(&1i32.to_le_bytes());
        data.extend_from_slice(&0i32.to_le_bytes());
        data.extend_from_slice(&[0u8; 16]);

        match decode(&data) {
            Err(Error::MalformedRecord { offset, .. }) => assert_eq!(offset, 4),
            other => panic!("expected MalformedRecord, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_name_is_malformed() {
        let data = record(1, b"", false, false, 0, 0, 8);
        assert!(matches!(
            decode(&data),
            Err(Error::MalformedRecord { .. })
        ));
    }

    #[test]
    fn test_negative_child_count_is_malformed() {
        let data = record(0, b"/", true, false, 0, -1, 8);
        match decode(&data) {
            Err(Error::MalformedRecord { offset, reason }) => {
                assert_eq!(offset, 4 + 4 + 2 + 1 + 1 + 4);
                assert!(reason.contains("-1"));
            }
            other => panic!("expected MalformedRecord, got {:?}", other),
        }
    }

    #[test]
    fn test_huge_counts_are_truncation() {
        let data = record(0, b"/", true, false, 0, i32::MAX, 0);
        assert!(matches!(decode(&data), Err(Error::TruncatedInput { .. })));

        let mut data = Vec::new();
        data.extend_from_slice(&0i32.to_le_bytes());
        data.extend_from_slice(&i32::MAX.to_le_bytes());
        data.extend_from_slice(b"/\0");
        assert!(matches!(decode(&data), Err(Error::TruncatedInput { .. })));
    }

    #[test]
    fn test_every_truncation_fails_cleanly() {
        let data = sample_table();
        for len in 0..data.len() {
            match decode(&data[..len]) {
                Err(Error::TruncatedInput { .. }) => {}
                other => panic!("prefix of {} bytes: expected TruncatedInput, got {:?}", len, other),
            }
        }
    }

    #[test]
    fn test_depth_limit() {
        // A chain of nested directories, 10 deep.
        let mut data = Vec::new();
        for i in 0..10 {
            data.extend(record(i, b"d", true, false, 0, 1, 8));
        }
        data.extend(record(10, b"leaf", false, false, 0, 0, 8));

        let options = DecodeOptions::default().with_max_depth(10);
        assert!(Decoder::decode_table(&data, options).is_ok());

        let options = DecodeOptions::default().with_max_depth(9);
        assert!(matches!(
            Decoder::decode_table(&data, options),
            Err(Error::DepthLimitExceeded { limit: 9 })
        ));
    }

    #[test]
    fn test_decode_advances_shared_cursor() {
        let mut data = sample_table();
        data.extend(record(9, b"second", false, false, 1, 0, 8));

        let mut cursor = TableCursor::new(&data);
        let mut decoder = Decoder::new(DecodeOptions::default());
        let first = decoder.decode(&mut cursor).unwrap();
        let second = decoder.decode(&mut cursor).unwrap();

        assert_eq!(first.child_count(), 2);
        assert_eq!(second.name(), b"second");
        assert_eq!(cursor.remaining(), 0);
        assert_eq!(decoder.max_id(), Some(9));
    }

    #[test]
    fn test_trailing_bytes_are_not_consumed() {
        let mut data = sample_table();
        let len = data.len();
        data.extend_from_slice(&[1, 2, 3]);

        let table = decode(&data).unwrap();
        assert_eq!(table.bytes_consumed, len);
    }

    #[test]
    fn test_reencode_matches_table() {
        // Reserved slots are zero-filled on encode, so compare everything but them.
        let data = sample_table();
        let table = decode(&data).unwrap();
        let encoded = encode_table(&table.root, PointerWidth::Eight).unwrap();
        assert_eq!(encoded.len(), data.len());

        let reencoded = decode(&encoded).unwrap();
        assert_eq!(reencoded.root, table.root);
    }

    // Property-based tests
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 512,
            ..ProptestConfig::default()
        })]

        /// Arbitrary bytes never panic and never claim more than they were given.
        #[test]
        fn prop_arbitrary_bytes_never_panic(data in prop::collection::vec(any::<u8>(), 0..256)) {
            if let Ok(table) = decode(&data) {
                prop_assert!(table.bytes_consumed <= data.len());
            }
        }

        /// Corrupting one byte of a valid table never panics.
        #[test]
        fn prop_single_byte_corruption_never_panics(index in 0usize..64, value in any::<u8>()) {
            let mut data = sample_table();
            let index = index % data.len();
            data[index] = value;
            if let Ok(table) = decode(&data) {
                prop_assert!(table.bytes_consumed <= data.len());
            }
        }
    }
}
