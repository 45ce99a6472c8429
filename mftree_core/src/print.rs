//! Tree pretty-printing.
//!
//! Each directory lists its subdirectories first, each expanded in place,
//! then its files. Only the output is reordered; children keep their
//! insertion order in the tree.

use crate::entry::Entry;
use std::fmt;
use std::io::{self, Write};

/// Name printed bare even though it is a directory.
pub const ROOT_NAME: &[u8] = b"/";

/// Default spaces of indentation per nesting level.
pub const DEFAULT_INDENT_WIDTH: usize = 2;

/// Widest indentation per level a printer accepts.
pub const MAX_INDENT_WIDTH: usize = 64;

/// Renders a tree as lines of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreePrinter {
    indent_width: usize,
}

impl Default for TreePrinter {
    fn default() -> Self {
        Self {
            indent_width: DEFAULT_INDENT_WIDTH,
        }
    }
}

enum Pending<'a> {
    Dir(&'a Entry, usize),
    File(&'a Entry, usize),
}

impl TreePrinter {
    /// Printer with the default indentation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the spaces of indentation per level, capped at [`MAX_INDENT_WIDTH`].
    ///
    /// A width of 1 matches the classic one-space-per-level layout.
    pub fn with_indent_width(mut self, indent_width: usize) -> Self {
        self.indent_width = indent_width.min(MAX_INDENT_WIDTH);
        self
    }

    /// Render the tree under `root`, one string per line.
    pub fn lines(&self, root: &Entry) -> Vec<String> {
        let mut lines = Vec::new();
        self.visit(root, |line| lines.push(line));
        lines
    }

    /// Write the tree under `root`, newline-terminated.
    pub fn write_to<W: Write>(&self, root: &Entry, out: &mut W) -> io::Result<()> {
        let mut result = Ok(());
        self.visit(root, |line| {
            if result.is_ok() {
                result = writeln!(out, "{}", line);
            }
        });
        result
    }

    fn visit(&self, root: &Entry, mut emit: impl FnMut(String)) {
        if root.is_dir() && root.name() != ROOT_NAME {
            emit(format!("- {}/", root.name_lossy()));
        } else {
            emit(format!("- {}", root.name_lossy()));
        }
        if !root.is_dir() {
            return;
        }

        let mut pending = Vec::new();
        push_children(&mut pending, root, 1);

        while let Some(item) = pending.pop() {
            match item {
                Pending::Dir(dir, depth) => {
                    emit(format!("{}- {}/", self.indent(depth), dir.name_lossy()));
                    push_children(&mut pending, dir, depth + 1);
                }
                Pending::File(file, depth) => {
                    emit(format!("{}- {}", self.indent(depth), file.name_lossy()));
                }
            }
        }
    }

    fn indent(&self, depth: usize) -> String {
        " ".repeat(depth.saturating_mul(self.indent_width))
    }
}

// Pushed in reverse so they pop as: directories in order, then files in order.
fn push_children<'a>(pending: &mut Vec<Pending<'a>>, dir: &'a Entry, depth: usize) {
    let children = dir.children();
    pending.extend(
        children
            .iter()
            .rev()
            .filter(|child| !child.is_dir())
            .map(|child| Pending::File(child, depth)),
    );
    pending.extend(
        children
            .iter()
            .rev()
            .filter(|child| child.is_dir())
            .map(|child| Pending::Dir(child, depth)),
    );
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in TreePrinter::default().lines(self) {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::EntryKind;
    use crate::namespace::Namespace;

    fn sample() -> Namespace {
        let mut ns = Namespace::new("/").unwrap();
        ns.create_at::<&str>(&[], "a.txt", false, EntryKind::File)
            .unwrap();
        ns.create_at::<&str>(&[], "b", false, EntryKind::Directory)
            .unwrap();
        ns
    }

    #[test]
    fn test_directories_before_files() {
        let ns = sample();
        assert_eq!(TreePrinter::new().lines(ns.root()), vec!["- /", "  - b/", "  - a.txt"]);

        // The tree itself keeps insertion order.
        let names: Vec<&[u8]> = ns.root().children().iter().map(|e| e.name()).collect();
        assert_eq!(names, vec![&b"a.txt"[..], b"b"]);
    }

    #[test]
    fn test_nested_expansion() {
        let mut ns = Namespace::new("/").unwrap();
        ns.create_at::<&str>(&[], "top.txt", false, EntryKind::File).unwrap();
        ns.create_at::<&str>(&[], "usr", false, EntryKind::Directory).unwrap();
        ns.create_at(&["usr"], "readme", false, EntryKind::File).unwrap();
        ns.create_at(&["usr"], "bin", false, EntryKind::Directory).unwrap();
        ns.create_at(&["usr", "bin"], "ls", false, EntryKind::File).unwrap();
        ns.create_at::<&str>(&[], "etc", false, EntryKind::Directory).unwrap();

        let lines = TreePrinter::new().lines(ns.root());
        assert_eq!(
            lines,
            vec![
                "- /",
                "  - usr/",
                "    - bin/",
                "      - ls",
                "    - readme",
                "  - etc/",
                "  - top.txt",
            ]
        );
    }

    #[test]
    fn test_root_suffix_rules() {
        let ns = Namespace::new("home").unwrap();
        assert_eq!(TreePrinter::new().lines(ns.root()), vec!["- home/"]);

        let ns = Namespace::new("/").unwrap();
        assert_eq!(TreePrinter::new().lines(ns.root()), vec!["- /"]);
    }

    #[test]
    fn test_file_root() {
        let file = crate::entry::Entry::leaf(0, b"lonely".to_vec(), EntryKind::File, false);
        assert_eq!(TreePrinter::new().lines(&file), vec!["- lonely"]);
    }

    #[test]
    fn test_indent_width() {
        let ns = sample();
        let lines = TreePrinter::new().with_indent_width(1).lines(ns.root());
        assert_eq!(lines, vec!["- /", " - b/", " - a.txt"]);

        let lines = TreePrinter::new().with_indent_width(0).lines(ns.root());
        assert_eq!(lines, vec!["- /", "- b/", "- a.txt"]);
    }

    #[test]
    fn test_huge_indent_width_is_capped() {
        let ns = sample();
        let printer = TreePrinter::new().with_indent_width(usize::MAX);
        let lines = printer.lines(ns.root());
        assert_eq!(lines[1], format!("{}- b/", " ".repeat(MAX_INDENT_WIDTH)));
        assert_eq!(printer, TreePrinter::new().with_indent_width(MAX_INDENT_WIDTH));
    }

    #[test]
    fn test_write_to_and_display() {
        let ns = sample();
        let mut out = Vec::new();
        TreePrinter::new().write_to(ns.root(), &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "- /\n  - b/\n  - a.txt\n");
        assert_eq!(ns.root().to_string(), "- /\n  - b/\n  - a.txt\n");
    }

    #[test]
    fn test_decoded_example_table_display() {
        use crate::decode::{DecodeOptions, PointerWidth};
        use crate::encode::encode_table;

        // "/" holding file "a.txt" (10 bytes) then readonly directory "b".
        let mut root = Entry::leaf(0, b"/".to_vec(), EntryKind::Directory, false);
        let mut a = Entry::leaf(1, b"a.txt".to_vec(), EntryKind::File, false);
        a.size = 10;
        root.children.append(a).unwrap();
        root.children
            .append(Entry::leaf(2, b"b".to_vec(), EntryKind::Directory, true))
            .unwrap();
        let data = encode_table(&root, PointerWidth::Eight).unwrap();

        let mut ns = Namespace::from_table(&data, DecodeOptions::default()).unwrap();
        assert_eq!(ns.root().child_count(), 2);
        assert_eq!(ns.root().to_string(), "- /\n  - b/\n  - a.txt\n");

        ns.create_at::<&str>(&[], "c", false, EntryKind::File).unwrap();
        ns.create_at(&["b"], "d", false, EntryKind::File).unwrap();
        assert_eq!(ns.root().to_string(), "- /\n  - b/\n  - a.txt\n  - c\n");
    }
}
