// Central place for well-known keys, UI strings and other non-localized constants.
// Keep these out of registry.rs/cli.rs to reduce duplication and make tweaks safer.

// shortcuts.vdf structure keys (VDF_ prefix)
pub const VDF_SHORTCUTS: &str = "shortcuts";

// Known shortcut fields. Matched case-insensitively; producers disagree on casing.
pub const VDF_FIELD_APPNAME: &str = "appname";

// Steam install layout
pub const STEAM_USERDATA: &str = "userdata";
pub const STEAM_CONFIG_DIR: &str = "config";
pub const STEAM_SHORTCUTS_FILE: &str = "shortcuts.vdf";
pub const STEAM_DEFAULT_PROGRAM_FILES_X86: &str = "C:/Program Files (x86)";

// Environment variables read by the binary only.
pub const ENV_SHORTCUTS_PATH: &str = "SSED_SHORTCUTS";
pub const ENV_PROGRAM_FILES_X86: &str = "ProgramFiles(x86)";
pub const DEFAULT_LOG_FILTER: &str = "ssed=info";

// English UI strings (EN_ prefix to make future localization easier)
pub const EN_APP_TITLE: &str = "SSED: Steam Shortcuts Editor";
pub const EN_SHORTCUT_PLACEHOLDER_PREFIX: &str = "Shortcut ";

pub const EN_TYPE_TEXT: &str = "string";
pub const EN_TYPE_INTEGER: &str = "int32";
pub const EN_TYPE_OBJECT: &str = "object";

pub const EN_NO_SHORTCUTS_FILE: &str =
    "No shortcuts file given and none found under the usual Steam locations.";
pub const EN_ERR_DELETE_NEEDS_CONFIRM: &str = "Refusing to delete without --yes.";
pub const EN_NO_MATCHES: &str = "No shortcuts.vdf files found.";
