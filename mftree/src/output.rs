//! Text and JSON rendering for mftree commands.
//!
//! Every command builds one serializable result. `--json` prints that
//! result as is; text mode prints the command's own listing instead.

use anyhow::Result;
use mftree_core::{Entry, EntryId, EntryKind, TreeStats};
use serde::Serialize;
use std::io::{self, Write};

/// Sends command results to stdout and failures to stderr.
pub struct OutputWriter {
    json: bool,
}

impl OutputWriter {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    /// Print `data` as JSON, or the listing `text` builds when not in JSON mode.
    pub fn write<T: Serialize>(&self, data: &T, text: impl FnOnce() -> String) -> Result<()> {
        let stdout = io::stdout();
        self.render(&mut stdout.lock(), data, text)
    }

    fn render<W: Write, T: Serialize>(
        &self,
        out: &mut W,
        data: &T,
        text: impl FnOnce() -> String,
    ) -> Result<()> {
        if self.json {
            serde_json::to_writer_pretty(&mut *out, data)?;
            writeln!(out)?;
        } else {
            out.write_all(text().as_bytes())?;
        }
        out.flush()?;
        Ok(())
    }

    /// Report a failed command on stderr along with its exit code.
    pub fn write_error(&self, error: &anyhow::Error, result_code: u8) {
        let stderr = io::stderr();
        let _ = self.render_error(&mut stderr.lock(), error, result_code);
    }

    fn render_error<W: Write>(
        &self,
        out: &mut W,
        error: &anyhow::Error,
        result_code: u8,
    ) -> io::Result<()> {
        if self.json {
            let failure = ErrorOutput {
                success: false,
                result_code,
                error: format!("{:#}", error),
            };
            serde_json::to_writer_pretty(&mut *out, &failure)?;
            writeln!(out)
        } else {
            writeln!(out, "Error: {:#}", error)
        }
    }
}

/// Join lines into newline-terminated text.
pub fn join_lines<S: AsRef<str>>(lines: &[S]) -> String {
    let mut text = String::new();
    for line in lines {
        text.push_str(line.as_ref());
        text.push('\n');
    }
    text
}

/// Body of a failed command in JSON mode.
#[derive(Debug, Serialize)]
pub struct ErrorOutput {
    pub success: bool,
    pub result_code: u8,
    pub error: String,
}

/// One entry as shown by `ls`, `find` and `create`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryInfo {
    pub id: EntryId,
    pub name: String,
    pub kind: EntryKind,
    pub readonly: bool,
    pub size_bytes: i32,
    pub children: usize,
}

impl From<&Entry> for EntryInfo {
    fn from(entry: &Entry) -> Self {
        Self {
            id: entry.id(),
            name: entry.name_lossy().into_owned(),
            kind: entry.kind(),
            readonly: entry.is_readonly(),
            size_bytes: entry.size_bytes(),
            children: entry.child_count(),
        }
    }
}

impl EntryInfo {
    /// One-line text form: kind, readonly marker, id, size and name.
    pub fn long_line(&self) -> String {
        let kind_char = match self.kind {
            EntryKind::Directory => 'd',
            EntryKind::File => 'f',
        };
        let ro_char = if self.readonly { 'r' } else { '-' };
        format!(
            "{}{} {:>6} {:>10} {}",
            kind_char, ro_char, self.id, self.size_bytes, self.name
        )
    }

    /// Name with a trailing `/` for directories.
    pub fn display_name(&self) -> String {
        match self.kind {
            EntryKind::Directory => format!("{}/", self.name),
            EntryKind::File => self.name.clone(),
        }
    }
}

/// Output for `print` command.
#[derive(Debug, Serialize)]
pub struct PrintOutput {
    pub success: bool,
    pub result_code: u8,
    pub lines: Vec<String>,
}

/// Output for `ls` command.
#[derive(Debug, Serialize)]
pub struct LsOutput {
    pub success: bool,
    pub result_code: u8,
    pub directory: EntryInfo,
    pub entries: Vec<EntryInfo>,
}

/// Output for `find` command.
#[derive(Debug, Serialize)]
pub struct FindOutput {
    pub success: bool,
    pub result_code: u8,
    pub name: String,
    pub kind: EntryKind,
    pub found: Option<EntryInfo>,
}

/// Output for `stat` command.
#[derive(Debug, Serialize)]
pub struct StatOutput {
    pub success: bool,
    pub result_code: u8,
    pub table: String,
    pub entries: usize,
    #[serde(flatten)]
    pub stats: TreeStats,
    pub next_id: Option<EntryId>,
    pub duplicate_ids: Vec<EntryId>,
}

/// Output for `create` command.
#[derive(Debug, Serialize)]
pub struct CreateOutput {
    pub success: bool,
    pub result_code: u8,
    /// False when the target directory was readonly.
    pub created: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<EntryInfo>,
    pub lines: Vec<String>,
}
