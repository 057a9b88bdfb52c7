mod common;

use common::VdfBuilder;
use pretty_assertions::assert_eq;
use ssed::{RegistryError, ShortcutRegistry, SortKey, ValueKind};

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

fn listed(reg: &ShortcutRegistry, sort: SortKey) -> Vec<(String, String)> {
    reg.list_entries(sort)
        .into_iter()
        .map(|s| (s.index, s.display_name))
        .collect()
}

#[test]
fn lists_in_file_order_with_lossy_names_and_placeholders() -> Result<()> {
    let reg = ShortcutRegistry::from_bytes(&common::library_shortcuts())?;
    assert_eq!(
        listed(&reg, SortKey::FileOrder),
        vec![
            ("0".to_string(), "Dolphin".to_string()),
            ("1".to_string(), "Café Racer".to_string()),
            ("3".to_string(), "Shortcut 3".to_string()),
            ("5".to_string(), "Anbernic \u{FFFD}".to_string()),
        ]
    );
    Ok(())
}

#[test]
fn name_sort_is_case_sensitive() -> Result<()> {
    let bytes = VdfBuilder::new()
        .open("shortcuts")
        .open("0")
        .text("AppName", b"zork")
        .close()
        .open("1")
        .text("AppName", b"Zelda")
        .close()
        .open("2")
        .text("AppName", b"anno")
        .close()
        .close()
        .finish();
    let reg = ShortcutRegistry::from_bytes(&bytes)?;
    let names: Vec<String> = listed(&reg, SortKey::Name).into_iter().map(|(_, n)| n).collect();
    assert_eq!(names, ["Zelda", "anno", "zork"]);
    Ok(())
}

#[test]
fn indices_need_not_be_sorted_or_contiguous() -> Result<()> {
    let bytes = VdfBuilder::new()
        .open("shortcuts")
        .open("10")
        .text("AppName", b"Ten")
        .close()
        .open("2")
        .text("AppName", b"Two")
        .close()
        .close()
        .finish();
    let reg = ShortcutRegistry::from_bytes(&bytes)?;
    let order: Vec<String> = reg.entries().map(|s| s.index).collect();
    assert_eq!(order, ["10", "2"]);
    Ok(())
}

#[test]
fn get_fields_matches_source_order_and_kinds() -> Result<()> {
    let reg = ShortcutRegistry::from_bytes(&common::library_shortcuts())?;
    let fields = reg.get_fields("0")?;
    let seen: Vec<(&str, ValueKind)> = fields.iter().map(|f| (f.key, f.kind)).collect();
    assert_eq!(
        seen,
        vec![
            ("appid", ValueKind::Integer),
            ("AppName", ValueKind::Text),
            ("Exe", ValueKind::Text),
            ("StartDir", ValueKind::Text),
            ("icon", ValueKind::Text),
            ("IsHidden", ValueKind::Integer),
            ("LastPlayTime", ValueKind::Integer),
            ("tags", ValueKind::Object),
        ]
    );

    let tags = fields.last().ok_or("no fields")?.value.as_object().ok_or("tags")?;
    let tag_keys: Vec<&str> = tags.keys().map(String::as_str).collect();
    assert_eq!(tag_keys, ["0", "1"]);
    Ok(())
}

#[test]
fn unknown_index_after_delete() -> Result<()> {
    let mut reg = ShortcutRegistry::from_bytes(&common::foo_shortcuts())?;
    reg.delete_entry("0")?;
    assert_eq!(
        reg.get_fields("0").unwrap_err(),
        RegistryError::UnknownIndex {
            index: "0".to_string()
        }
    );
    assert!(reg.is_empty());
    Ok(())
}

#[test]
fn file_without_shortcuts_object_is_rejected() {
    let bytes = VdfBuilder::new().text("shortcuts", b"oops").finish();
    assert_eq!(
        ShortcutRegistry::from_bytes(&bytes).unwrap_err(),
        RegistryError::MissingShortcuts
    );
}
