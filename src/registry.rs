use crate::codec::{self, CodecError, DecodeReport};
use crate::statics;
use crate::value::{IntView, PropertyMap, PropertyValue, ValueKind, int_from_text};
use indexmap::IndexMap;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("no shortcut with index {index:?}")]
    UnknownIndex { index: String },
    #[error("root object has no \"{}\" object", statics::VDF_SHORTCUTS)]
    MissingShortcuts,
    #[error(transparent)]
    Codec(#[from] CodecError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    FileOrder,
    /// Case-sensitive lexical order of display names. Ties keep file order.
    Name,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortcutSummary {
    pub index: String,
    pub display_name: String,
}

/// One field of a shortcut entry, borrowed from the working tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldRef<'a> {
    pub key: &'a str,
    pub value: &'a PropertyValue,
    pub kind: ValueKind,
}

impl FieldRef<'_> {
    pub fn display_text(&self, view: IntView) -> String {
        self.value.display_text(view)
    }
}

/// The shortcuts tree being edited, plus a frozen copy of what was loaded.
///
/// The frozen copy is only consulted to recover a field's type when a text edit is committed.
#[derive(Debug, Clone)]
pub struct ShortcutRegistry {
    current: PropertyValue,
    original: PropertyValue,
    shortcuts_key: String,
    staged: IndexMap<(String, String), String>,
    report: DecodeReport,
}

impl ShortcutRegistry {
    /// An empty `{"shortcuts": {}}` tree.
    pub fn empty() -> Self {
        let mut root = IndexMap::new();
        root.insert(
            statics::VDF_SHORTCUTS.to_string(),
            PropertyValue::Object(IndexMap::new()),
        );
        let root = PropertyValue::Object(root);
        Self {
            original: root.clone(),
            current: root,
            shortcuts_key: statics::VDF_SHORTCUTS.to_string(),
            staged: IndexMap::new(),
            report: DecodeReport::default(),
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RegistryError> {
        let (root, report) = codec::decode_with_report(bytes)?;
        Self::build(root, report)
    }

    pub fn from_root(root: PropertyValue) -> Result<Self, RegistryError> {
        Self::build(root, DecodeReport::default())
    }

    fn build(root: PropertyValue, report: DecodeReport) -> Result<Self, RegistryError> {
        let shortcuts_key = root
            .as_object()
            .and_then(|m| {
                m.iter()
                    .find(|(k, v)| {
                        k.eq_ignore_ascii_case(statics::VDF_SHORTCUTS)
                            && v.kind() == ValueKind::Object
                    })
                    .map(|(k, _)| k.clone())
            })
            .ok_or(RegistryError::MissingShortcuts)?;

        Ok(Self {
            original: root.clone(),
            current: root,
            shortcuts_key,
            staged: IndexMap::new(),
            report,
        })
    }

    /// Replace both trees from freshly read bytes. Staged edits are discarded.
    /// On failure the registry is left as it was.
    pub fn reload(&mut self, bytes: &[u8]) -> Result<(), RegistryError> {
        let fresh = Self::from_bytes(bytes)?;
        if !self.staged.is_empty() {
            debug!(count = self.staged.len(), "reload discards staged edits");
        }
        *self = fresh;
        Ok(())
    }

    pub fn root(&self) -> &PropertyValue {
        &self.current
    }

    pub fn original_root(&self) -> &PropertyValue {
        &self.original
    }

    pub fn decode_report(&self) -> &DecodeReport {
        &self.report
    }

    /// True when the working tree differs from the loaded one or edits are pending.
    pub fn is_modified(&self) -> bool {
        !self.staged.is_empty() || self.current != self.original
    }

    fn shortcuts(&self) -> &PropertyMap {
        shortcuts_of(&self.current, &self.shortcuts_key)
    }

    // Never `None` in practice: `build` only accepts a root whose shortcuts key holds an
    // object, and nothing replaces that value afterwards.
    fn shortcuts_mut(&mut self) -> Option<&mut PropertyMap> {
        self.current
            .get_mut(&self.shortcuts_key)
            .and_then(PropertyValue::as_object_mut)
    }

    pub fn len(&self) -> usize {
        self.shortcuts().len()
    }

    pub fn is_empty(&self) -> bool {
        self.shortcuts().is_empty()
    }

    pub fn contains(&self, index: &str) -> bool {
        self.shortcuts().contains_key(index)
    }

    /// Shortcuts in file order. Lazy; call again to restart.
    pub fn entries(&self) -> impl Iterator<Item = ShortcutSummary> + '_ {
        self.shortcuts().iter().map(|(index, entry)| ShortcutSummary {
            index: index.clone(),
            display_name: display_name(index, entry),
        })
    }

    pub fn list_entries(&self, sort: SortKey) -> Vec<ShortcutSummary> {
        let mut entries: Vec<ShortcutSummary> = self.entries().collect();
        if sort == SortKey::Name {
            entries.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        }
        entries
    }

    pub fn entry(&self, index: &str) -> Result<&PropertyMap, RegistryError> {
        self.shortcuts()
            .get(index)
            .and_then(PropertyValue::as_object)
            .ok_or_else(|| unknown_index(index))
    }

    pub fn get_fields(&self, index: &str) -> Result<Vec<FieldRef<'_>>, RegistryError> {
        Ok(self
            .entry(index)?
            .iter()
            .map(|(key, value)| FieldRef {
                key,
                value,
                kind: value.kind(),
            })
            .collect())
    }

    /// Record free-form text for `(index, key)`. Nothing in the tree changes until
    /// [`commit_staged_edits`](Self::commit_staged_edits). A later edit of the same
    /// field replaces an earlier one.
    pub fn stage_field_edit(
        &mut self,
        index: &str,
        key: &str,
        text: impl Into<String>,
    ) -> Result<(), RegistryError> {
        self.entry(index)?;
        self.staged
            .insert((index.to_string(), key.to_string()), text.into());
        Ok(())
    }

    pub fn staged_edits(&self) -> impl Iterator<Item = (&str, &str, &str)> + '_ {
        self.staged
            .iter()
            .map(|((index, key), text)| (index.as_str(), key.as_str(), text.as_str()))
    }

    pub fn has_staged_edits(&self) -> bool {
        !self.staged.is_empty()
    }

    pub fn discard_staged_edits(&mut self) {
        self.staged.clear();
    }

    /// Write staged edits into the working tree, typed after the loaded value of each field.
    ///
    /// - loaded as `Integer`: text must be a decimal in either view, else the edit is dropped
    /// - loaded as `Object`: text must parse as structured text, else it is stored as `Text`
    /// - loaded as `Text`, or not present at load: stored as `Text` verbatim
    ///
    /// Returns the number of fields written.
    pub fn commit_staged_edits(&mut self) -> usize {
        let staged = std::mem::take(&mut self.staged);
        let mut written = 0;
        for ((index, key), text) in staged {
            let Some(value) = self.typed_value_for_edit(&index, &key, text) else {
                continue;
            };
            let Some(entry) = self
                .shortcuts_mut()
                .and_then(|s| s.get_mut(&index))
                .and_then(PropertyValue::as_object_mut)
            else {
                warn!(%index, %key, "dropping edit for a shortcut that no longer exists");
                continue;
            };
            entry.insert(key, value);
            written += 1;
        }
        written
    }

    fn typed_value_for_edit(&self, index: &str, key: &str, text: String) -> Option<PropertyValue> {
        let loaded = shortcuts_of(&self.original, &self.shortcuts_key)
            .get(index)
            .and_then(|entry| entry.get(key));

        match loaded.map(PropertyValue::kind) {
            Some(ValueKind::Integer) => match int_from_text(&text) {
                Some(raw) => Some(PropertyValue::Integer(raw)),
                None => {
                    warn!(%index, %key, %text, "not a 32-bit integer; keeping previous value");
                    None
                }
            },
            Some(ValueKind::Object) => match PropertyValue::parse_structured_text(&text) {
                Ok(parsed) => Some(parsed),
                Err(e) => {
                    debug!(%index, %key, "storing unparsable structured edit as text: {e:#}");
                    Some(PropertyValue::Text(text.into_bytes()))
                }
            },
            Some(ValueKind::Text) | None => Some(PropertyValue::Text(text.into_bytes())),
        }
    }

    /// Remove a shortcut. Other indices are left as they are; gaps are allowed.
    pub fn delete_entry(&mut self, index: &str) -> Result<PropertyValue, RegistryError> {
        let removed = self
            .shortcuts_mut()
            .and_then(|s| s.shift_remove(index))
            .ok_or_else(|| unknown_index(index))?;
        self.staged.retain(|(i, _), _| i != index);
        Ok(removed)
    }

    /// Commit staged edits, then encode the working tree.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>, RegistryError> {
        self.commit_staged_edits();
        Ok(codec::encode(&self.current)?)
    }

    /// Encode the working tree as it is, ignoring staged edits.
    pub fn encode_current(&self) -> Result<Vec<u8>, RegistryError> {
        Ok(codec::encode(&self.current)?)
    }
}

fn shortcuts_of<'a>(root: &'a PropertyValue, key: &str) -> &'a PropertyMap {
    static EMPTY: std::sync::OnceLock<PropertyMap> = std::sync::OnceLock::new();
    root.get(key)
        .and_then(PropertyValue::as_object)
        .unwrap_or_else(|| EMPTY.get_or_init(IndexMap::new))
}

fn unknown_index(index: &str) -> RegistryError {
    RegistryError::UnknownIndex {
        index: index.to_string(),
    }
}

/// Value of the first field named `appname` in any casing, or a placeholder.
pub fn display_name(index: &str, entry: &PropertyValue) -> String {
    entry
        .as_object()
        .and_then(|fields| {
            fields
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(statics::VDF_FIELD_APPNAME))
        })
        .map(|(_, v)| v.display_text(IntView::Unsigned))
        .unwrap_or_else(|| format!("{}{index}", statics::EN_SHORTCUT_PLACEHOLDER_PREFIX))
}
