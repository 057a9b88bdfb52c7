//! Core library for the Steam Shortcuts Editor (SSED).
//! Provides a lossless codec for the binary VDF format used by `shortcuts.vdf`, and an
//! editing model that turns text typed by a user back into correctly-typed fields.

mod cli;
pub mod codec;
pub mod locate;
pub mod registry;
pub mod statics;
pub mod storage;
mod value;

pub use cli::{Cli, Command, SortArg, run_cli};
pub use codec::{CodecError, DecodeReport, decode, decode_with_report, encode};
pub use registry::{FieldRef, RegistryError, ShortcutRegistry, ShortcutSummary, SortKey};
pub use storage::{ShortcutsDocument, StorageError};
pub use value::{IntView, PropertyMap, PropertyValue, ValueKind, int_from_text, int_to_text};
