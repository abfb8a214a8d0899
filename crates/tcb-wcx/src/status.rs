use std::fmt;

use serde::{Deserialize, Serialize};

use crate::abi::{PK_EXTRACT, PK_OM_EXTRACT, PK_OM_LIST, PK_SKIP, PK_TEST};

/// Result codes of the packer interface.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PackerStatus {
    Ok = 0,
    EndArchive = 10,
    NoMemory = 11,
    BadData = 12,
    BadArchive = 13,
    UnknownFormat = 14,
    ErrorOpen = 15,
    ErrorCreate = 16,
    ErrorClose = 17,
    ErrorRead = 18,
    ErrorWrite = 19,
    SmallBuffer = 20,
    Aborted = 21,
    NoFiles = 22,
    TooManyFiles = 23,
    NotSupported = 24,
}

impl PackerStatus {
    const ALL: [PackerStatus; 16] = [
        PackerStatus::Ok,
        PackerStatus::EndArchive,
        PackerStatus::NoMemory,
        PackerStatus::BadData,
        PackerStatus::BadArchive,
        PackerStatus::UnknownFormat,
        PackerStatus::ErrorOpen,
        PackerStatus::ErrorCreate,
        PackerStatus::ErrorClose,
        PackerStatus::ErrorRead,
        PackerStatus::ErrorWrite,
        PackerStatus::SmallBuffer,
        PackerStatus::Aborted,
        PackerStatus::NoFiles,
        PackerStatus::TooManyFiles,
        PackerStatus::NotSupported,
    ];

    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.code() == code)
    }

    pub fn is_ok(self) -> bool {
        self == PackerStatus::Ok
    }
}

impl fmt::Display for PackerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[repr(i32)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PackerCapability {
    New = 1 << 0,
    Modify = 1 << 1,
    Multiple = 1 << 2,
    Delete = 1 << 3,
    Options = 1 << 4,
    MemPack = 1 << 5,
    ByContent = 1 << 6,
    SearchText = 1 << 7,
    Hide = 1 << 8,
    Encrypt = 1 << 9,
}

impl PackerCapability {
    pub fn flag(self) -> i32 {
        self as i32
    }
}

/// Folds a capability list into the `GetPackerCaps` mask.
pub fn capability_flags(caps: &[PackerCapability]) -> i32 {
    caps.iter().fold(0, |mask, cap| mask | cap.flag())
}

#[repr(i32)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackgroundFlag {
    Unpack = 1,
    Pack = 2,
    MemPack = 4,
}

impl BackgroundFlag {
    pub fn flag(self) -> i32 {
        self as i32
    }
}

/// Folds background flags into the `GetBackgroundFlags` mask.
pub fn background_flags(flags: &[BackgroundFlag]) -> i32 {
    flags.iter().fold(0, |mask, flag| mask | flag.flag())
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpenMode {
    List,
    Extract,
}

impl OpenMode {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            PK_OM_LIST => Some(OpenMode::List),
            PK_OM_EXTRACT => Some(OpenMode::Extract),
            _ => None,
        }
    }
}

impl fmt::Display for OpenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessOperation {
    Skip,
    Test,
    Extract,
}

impl ProcessOperation {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            PK_SKIP => Some(ProcessOperation::Skip),
            PK_TEST => Some(ProcessOperation::Test),
            PK_EXTRACT => Some(ProcessOperation::Extract),
            _ => None,
        }
    }

    /// Status reported when the operation faults.
    pub fn failure(self) -> PackerStatus {
        match self {
            ProcessOperation::Extract => PackerStatus::ErrorWrite,
            ProcessOperation::Skip | ProcessOperation::Test => PackerStatus::ErrorRead,
        }
    }
}

impl fmt::Display for ProcessOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Flags word of `PackFiles`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PackFlags(pub i32);

impl PackFlags {
    pub const MOVE_FILES: i32 = 1;
    pub const SAVE_PATHS: i32 = 2;
    pub const ENCRYPT: i32 = 4;

    pub fn move_files(self) -> bool {
        self.0 & Self::MOVE_FILES != 0
    }

    pub fn save_paths(self) -> bool {
        self.0 & Self::SAVE_PATHS != 0
    }

    pub fn encrypt(self) -> bool {
        self.0 & Self::ENCRYPT != 0
    }
}

impl fmt::Display for PackFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = [
            (self.move_files(), "move"),
            (self.save_paths(), "paths"),
            (self.encrypt(), "encrypt"),
        ]
        .into_iter()
        .filter_map(|(set, name)| set.then_some(name))
        .collect();
        if names.is_empty() {
            f.write_str("none")
        } else {
            f.write_str(&names.join("|"))
        }
    }
}

/// Options word of `StartMemPack`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MemPackOptions(pub i32);

impl MemPackOptions {
    pub const WANT_HEADERS: i32 = 1;

    /// Whether the host wants archive headers in the output stream.
    pub fn want_headers(self) -> bool {
        self.0 & Self::WANT_HEADERS != 0
    }
}

impl fmt::Display for MemPackOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.want_headers() {
            f.write_str("headers")
        } else {
            f.write_str("raw")
        }
    }
}
