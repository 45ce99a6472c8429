mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use env_logger::Env;
use log::{LevelFilter, debug};
use mftree_core::{
    DEFAULT_INDENT_WIDTH, DEFAULT_MAX_DEPTH, DecodeOptions, EntryKind, MAX_INDENT_WIDTH, Namespace,
    PointerWidth, TreePrinter, TreeStats, duplicate_ids,
};
use output::{
    CreateOutput, EntryInfo, FindOutput, LsOutput, OutputWriter, PrintOutput, StatOutput,
    join_lines,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// mftree - explore a master file table
#[derive(Parser)]
#[command(name = "mftree")]
#[command(about = "Decode and explore a master file table", long_about = None)]
#[command(version)]
struct Cli {
    /// Table file (defaults to MFTREE_TABLE env var or ./master_file_table)
    #[arg(
        short,
        long,
        global = true,
        env = "MFTREE_TABLE",
        default_value = "master_file_table"
    )]
    table: PathBuf,

    /// Width in bytes of each reserved slot in the table (4 or 8)
    #[arg(long, global = true, default_value = "8", value_parser = parse_pointer_width)]
    pointer_width: PointerWidth,

    /// Deepest directory nesting accepted while decoding
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Spaces of indentation per level when printing (1 gives the classic layout)
    #[arg(
        long,
        global = true,
        default_value_t = DEFAULT_INDENT_WIDTH as u64,
        value_parser = clap::value_parser!(u64).range(0..=MAX_INDENT_WIDTH as u64)
    )]
    indent: u64,

    /// Output results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the whole tree, directories first (default)
    Print,

    /// List a directory's children in table order
    Ls {
        /// Directory components below the root
        components: Vec<String>,

        /// Show detailed information
        #[arg(short, long)]
        long: bool,
    },

    /// Look up a child of a directory by name and kind
    Find {
        /// Directory components below the root
        components: Vec<String>,

        /// Name to look for
        #[arg(long)]
        name: String,

        /// Look for a directory instead of a file
        #[arg(long)]
        dir: bool,
    },

    /// Show tree statistics and id consistency
    Stat,

    /// Create an entry in memory and print the resulting tree (the table file is not modified)
    Create {
        /// Directory components below the root
        components: Vec<String>,

        /// Name of the new entry
        #[arg(long)]
        name: String,

        /// Create a directory instead of a file
        #[arg(long)]
        dir: bool,

        /// Mark the new entry readonly
        #[arg(long)]
        readonly: bool,
    },
}

fn parse_pointer_width(value: &str) -> std::result::Result<PointerWidth, String> {
    let bytes: usize = value
        .parse()
        .map_err(|_| format!("invalid pointer width: {}", value))?;
    PointerWidth::from_bytes(bytes)
        .ok_or_else(|| format!("pointer width must be 4 or 8, got {}", bytes))
}

fn init_logging(verbose: bool) {
    let default_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    let mut builder =
        env_logger::Builder::from_env(Env::default().default_filter_or(default_level.as_str()));
    builder.format_timestamp_millis();
    let _ = builder.try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let out = OutputWriter::new(cli.json);
    let options = DecodeOptions::default()
        .with_pointer_width(cli.pointer_width)
        .with_max_depth(cli.max_depth);
    let printer = TreePrinter::new().with_indent_width(cli.indent as usize);
    let table = cli.table;

    let result = match cli.command.unwrap_or(Commands::Print) {
        Commands::Print => cmd_print(&out, &table, options, printer),
        Commands::Ls { components, long } => cmd_ls(&out, &table, options, &components, long),
        Commands::Find {
            components,
            name,
            dir,
        } => cmd_find(&out, &table, options, &components, &name, dir),
        Commands::Stat => cmd_stat(&out, &table, options),
        Commands::Create {
            components,
            name,
            dir,
            readonly,
        } => cmd_create(&out, &table, options, printer, &components, &name, dir, readonly),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let code = result_code(&err);
            out.write_error(&err, code);
            ExitCode::from(code)
        }
    }
}

/// Map an error to the process exit code.
fn result_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<mftree_core::Error>() {
        Some(e) if e.is_input_error() => 2,
        Some(mftree_core::Error::NotFound { .. } | mftree_core::Error::NotADirectory { .. }) => 3,
        Some(mftree_core::Error::Io { .. }) => 4,
        _ => 1,
    }
}

fn kind_for(dir: bool) -> EntryKind {
    if dir {
        EntryKind::Directory
    } else {
        EntryKind::File
    }
}

fn open_table(table: &Path, options: DecodeOptions) -> Result<Namespace> {
    let ns = Namespace::open(table, options)
        .with_context(|| format!("Failed to load table {}", table.display()))?;
    debug!(
        "Loaded {} (root {:?}, next id {:?})",
        table.display(),
        ns.root().name_lossy(),
        ns.next_id()
    );
    Ok(ns)
}

fn cmd_print(
    out: &OutputWriter,
    table: &Path,
    options: DecodeOptions,
    printer: TreePrinter,
) -> Result<()> {
    let ns = open_table(table, options)?;
    let lines = printer.lines(ns.root());

    let output = PrintOutput {
        success: true,
        result_code: 0,
        lines,
    };
    out.write(&output, || join_lines(&output.lines))?;

    let stats = ns.release();
    debug!("Released {} entries", stats.names_released);
    Ok(())
}

fn cmd_ls(
    out: &OutputWriter,
    table: &Path,
    options: DecodeOptions,
    components: &[String],
    long: bool,
) -> Result<()> {
    let ns = open_table(table, options)?;
    let dir = ns
        .lookup(components)
        .with_context(|| format!("Failed to resolve /{}", components.join("/")))?;

    let output = LsOutput {
        success: true,
        result_code: 0,
        directory: EntryInfo::from(dir),
        entries: dir.children().iter().map(EntryInfo::from).collect(),
    };
    out.write(&output, || {
        let lines: Vec<String> = output
            .entries
            .iter()
            .map(|e| if long { e.long_line() } else { e.display_name() })
            .collect();
        join_lines(&lines)
    })
}

fn cmd_find(
    out: &OutputWriter,
    table: &Path,
    options: DecodeOptions,
    components: &[String],
    name: &str,
    dir: bool,
) -> Result<()> {
    let ns = open_table(table, options)?;
    let kind = kind_for(dir);
    let parent = ns
        .lookup(components)
        .with_context(|| format!("Failed to resolve /{}", components.join("/")))?;
    let found = parent
        .find(name.as_bytes(), kind)
        .with_context(|| format!("Failed to search {}", parent.name_lossy()))?
        .map(EntryInfo::from);

    let output = FindOutput {
        success: true,
        result_code: 0,
        name: name.to_string(),
        kind,
        found,
    };
    out.write(&output, || match &output.found {
        Some(info) => format!("{}\n", info.long_line()),
        None => format!("No {} named {}\n", kind.as_str(), name),
    })
}

fn cmd_stat(out: &OutputWriter, table: &Path, options: DecodeOptions) -> Result<()> {
    let ns = open_table(table, options)?;
    let stats = TreeStats::collect(ns.root());
    let dups = duplicate_ids(ns.root());

    let output = StatOutput {
        success: true,
        result_code: 0,
        table: table.display().to_string(),
        entries: stats.entries(),
        stats,
        next_id: ns.next_id(),
        duplicate_ids: dups,
    };
    out.write(&output, || {
        let mut text = String::new();
        text.push_str(&format!("Table: {}\n", output.table));
        text.push_str(&format!("Entries: {}\n", output.entries));
        text.push_str(&format!("Directories: {}\n", output.stats.directories));
        text.push_str(&format!("Files: {}\n", output.stats.files));
        text.push_str(&format!("Readonly: {}\n", output.stats.readonly));
        text.push_str(&format!("Max depth: {}\n", output.stats.max_depth));
        text.push_str(&format!(
            "File bytes: {}\n",
            output.stats.total_file_bytes
        ));
        match output.next_id {
            Some(id) => text.push_str(&format!("Next id: {}\n", id)),
            None => text.push_str("Next id: exhausted\n"),
        }
        if output.duplicate_ids.is_empty() {
            text.push_str("Duplicate ids: none\n");
        } else {
            let ids: Vec<String> = output.duplicate_ids.iter().map(|id| id.to_string()).collect();
            text.push_str(&format!("Duplicate ids: {}\n", ids.join(", ")));
        }
        text
    })
}

#[allow(clippy::too_many_arguments)]
fn cmd_create(
    out: &OutputWriter,
    table: &Path,
    options: DecodeOptions,
    printer: TreePrinter,
    components: &[String],
    name: &str,
    dir: bool,
    readonly: bool,
) -> Result<()> {
    let mut ns = open_table(table, options)?;
    let kind = kind_for(dir);
    let before = ns
        .lookup(components)
        .with_context(|| format!("Failed to resolve /{}", components.join("/")))?
        .child_count();

    ns.create_at(components, name, readonly, kind)
        .with_context(|| format!("Failed to create {}", name))?;

    let parent = ns.lookup(components)?;
    let created = parent.child_count() > before;
    // The new entry is always last, so this skips any earlier entry of the same name.
    let entry = if created {
        parent.children().get(before).map(EntryInfo::from)
    } else {
        None
    };

    let output = CreateOutput {
        success: true,
        result_code: 0,
        created,
        entry,
        lines: printer.lines(ns.root()),
    };
    out.write(&output, || {
        let mut text = String::new();
        if !output.created {
            text.push_str(&format!(
                "Directory /{} is readonly; nothing created\n",
                components.join("/")
            ));
        }
        text.push_str(&join_lines(&output.lines));
        text
    })
}
