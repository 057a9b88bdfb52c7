use crate::registry::{SortKey, display_name};
use crate::storage::ShortcutsDocument;
use crate::value::{IntView, ValueKind};
use crate::{locate, statics};
use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "ssed", version, about = statics::EN_APP_TITLE)]
pub struct Cli {
    /// shortcuts.vdf to work on. Found under the usual Steam locations when omitted.
    #[arg(short, long, global = true, env = statics::ENV_SHORTCUTS_PATH)]
    pub file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List shortcuts as `index<TAB>name`
    List {
        #[arg(long, value_enum, default_value_t = SortArg::File)]
        sort: SortArg,
    },
    /// Show every field of one shortcut
    Show {
        index: String,
        /// Show integers as signed 32-bit instead of unsigned
        #[arg(long)]
        signed: bool,
    },
    /// Set one field from text and save. The field keeps the type it was loaded with
    /// when the text parses as that type.
    Set {
        index: String,
        key: String,
        #[arg(allow_hyphen_values = true)]
        text: String,
    },
    /// Delete one shortcut and save
    Delete {
        index: String,
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
    /// Decode the file and report anything unusual without changing it
    Check,
    /// Print every shortcuts.vdf found under the usual Steam locations
    Locate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortArg {
    File,
    Name,
}

impl From<SortArg> for SortKey {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::File => SortKey::FileOrder,
            SortArg::Name => SortKey::Name,
        }
    }
}

pub fn run_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Locate => {
            let found =
                locate::find_all_shortcuts_files(&home_dir()?, program_files_x86().as_deref());
            if found.is_empty() {
                println!("{}", statics::EN_NO_MATCHES);
            }
            for path in found {
                println!("{}", path.display());
            }
        }
        Command::List { sort } => {
            let (_, doc) = open(cli.file)?;
            for s in doc.registry.list_entries(sort.into()) {
                println!("{}\t{}", s.index, s.display_name);
            }
        }
        Command::Show { index, signed } => {
            let (_, doc) = open(cli.file)?;
            let view = if signed {
                IntView::Signed
            } else {
                IntView::Unsigned
            };
            for field in doc.registry.get_fields(&index)? {
                let text = field.display_text(view);
                match field.kind {
                    ValueKind::Object => {
                        println!("{} ({}):\n{text}", field.key, field.kind.type_name())
                    }
                    _ => println!("{} ({}): {text}", field.key, field.kind.type_name()),
                }
            }
        }
        Command::Set { index, key, text } => {
            let (path, mut doc) = open(cli.file)?;
            doc.registry.stage_field_edit(&index, &key, text)?;
            doc.save()?;
            println!("Saved {}", path.display());
        }
        Command::Delete { index, yes } => {
            if !yes {
                bail!(statics::EN_ERR_DELETE_NEEDS_CONFIRM);
            }
            let (path, mut doc) = open(cli.file)?;
            let removed = doc.registry.delete_entry(&index)?;
            doc.save()?;
            println!(
                "Deleted {index} ({}) from {}",
                display_name(&index, &removed),
                path.display()
            );
        }
        Command::Check => {
            let (path, doc) = open(cli.file)?;
            check(&path, &doc)?;
        }
    }
    Ok(())
}

fn open(file: Option<PathBuf>) -> anyhow::Result<(PathBuf, ShortcutsDocument)> {
    let path = resolve_path(file)?;
    let doc = ShortcutsDocument::load_path(&path)?;
    Ok((path, doc))
}

fn check(path: &Path, doc: &ShortcutsDocument) -> anyhow::Result<()> {
    let report = doc.registry.decode_report();
    println!("{}: {} shortcuts", path.display(), doc.registry.len());
    if report.trailing_bytes > 0 {
        println!(
            "  {} bytes after the root terminator at byte {} (dropped if saved with edits)",
            report.trailing_bytes, report.consumed
        );
    }
    if report.lossy_keys > 0 {
        println!("  {} keys are not valid UTF-8", report.lossy_keys);
    }

    let encoded = doc.registry.encode_current().context("re-encoding")?;
    if encoded[..] == doc.original_bytes[..report.consumed] {
        println!("  re-encodes byte-for-byte");
    } else {
        println!("  re-encoding differs from the file (duplicate or non-UTF-8 keys)");
    }
    Ok(())
}

fn resolve_path(file: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    if let Some(file) = file {
        return Ok(file);
    }
    locate::find_shortcuts_file(&home_dir()?, program_files_x86().as_deref())
        .context(statics::EN_NO_SHORTCUTS_FILE)
}

fn home_dir() -> anyhow::Result<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .context("neither HOME nor USERPROFILE is set")
}

fn program_files_x86() -> Option<PathBuf> {
    std::env::var_os(statics::ENV_PROGRAM_FILES_X86).map(PathBuf::from)
}
