#![allow(dead_code)]

use ssed::codec::{TAG_END, TAG_INT32, TAG_OBJECT, TAG_STRING};

/// Hand-assembles binary VDF so tests don't depend on the encoder they check.
#[derive(Default)]
pub struct VdfBuilder {
    bytes: Vec<u8>,
}

impl VdfBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(mut self, key: &str) -> Self {
        self.bytes.push(TAG_OBJECT);
        self.cstr(key.as_bytes());
        self
    }

    pub fn text(mut self, key: &str, value: &[u8]) -> Self {
        self.bytes.push(TAG_STRING);
        self.cstr(key.as_bytes());
        self.cstr(value);
        self
    }

    pub fn int(mut self, key: &str, raw: u32) -> Self {
        self.bytes.push(TAG_INT32);
        self.cstr(key.as_bytes());
        self.bytes.extend_from_slice(&raw.to_le_bytes());
        self
    }

    pub fn close(mut self) -> Self {
        self.bytes.push(TAG_END);
        self
    }

    /// Closes the root object.
    pub fn finish(mut self) -> Vec<u8> {
        self.bytes.push(TAG_END);
        self.bytes
    }

    fn cstr(&mut self, s: &[u8]) {
        self.bytes.extend_from_slice(s);
        self.bytes.push(0);
    }
}

/// `{"shortcuts": {"0": {"AppName": "Foo", "Exe": "\"foo.exe\"", "icon": 0xFFFF0000}}}`
pub fn foo_shortcuts() -> Vec<u8> {
    VdfBuilder::new()
        .open("shortcuts")
        .open("0")
        .text("AppName", b"Foo")
        .text("Exe", b"\"foo.exe\"")
        .int("icon", 0xFFFF_0000)
        .close()
        .close()
        .finish()
}

/// A fuller file: non-contiguous indices, mixed casing, tags and signed integers.
pub fn library_shortcuts() -> Vec<u8> {
    VdfBuilder::new()
        .open("shortcuts")
        .open("0")
        .int("appid", 0x8F3A_21C7)
        .text("AppName", b"Dolphin")
        .text("Exe", b"\"/usr/bin/dolphin-emu\"")
        .text("StartDir", b"\"/usr/bin/\"")
        .text("icon", b"")
        .int("IsHidden", 0)
        .int("LastPlayTime", 0xFFFF_FFFF)
        .open("tags")
        .text("0", b"Emulators")
        .text("1", b"favorite")
        .close()
        .close()
        .open("1")
        .text("appname", b"Caf\xc3\xa9 Racer")
        .text("exe", b"racer.exe")
        .close()
        .open("3")
        .text("Exe", b"unnamed.exe")
        .open("tags")
        .close()
        .close()
        .open("5")
        .text("APPNAME", b"Anbernic \xff")
        .int("OpenVR", 1)
        .close()
        .close()
        .finish()
}
