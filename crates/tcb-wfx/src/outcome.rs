//! Results that carry more than a status code.
//!
//! Each type maps to one integer answer plus an optional payload the
//! dispatcher writes back into host buffers.

use serde::{Deserialize, Serialize};

use crate::status::FsStatus;

/// Native `HICON` produced by the plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IconHandle(pub isize);

/// Native `HBITMAP` produced by the plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BitmapHandle(pub isize);

/// Answer of `FsGetFile` and `FsPutFile`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileTransfer {
    pub status: FsStatus,
    /// New name of the copied file when the plugin had to change it.
    pub renamed: Option<String>,
}

impl FileTransfer {
    pub fn ok() -> Self {
        Self {
            status: FsStatus::Ok,
            renamed: None,
        }
    }

    /// The copy succeeded under a different name or extension.
    pub fn renamed(name: impl Into<String>) -> Self {
        Self {
            status: FsStatus::Ok,
            renamed: Some(name.into()),
        }
    }

    pub fn failed(status: FsStatus) -> Self {
        Self {
            status,
            renamed: None,
        }
    }
}

impl From<FsStatus> for FileTransfer {
    fn from(status: FsStatus) -> Self {
        Self::failed(status)
    }
}

/// Answer of `FsExecuteFile`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecOutcome {
    Ok,
    Error,
    /// The host should download the file and run it locally.
    Yourself,
    /// The entry is a link; the host follows the target, which may be a
    /// local path.
    Symlink(String),
}

impl ExecOutcome {
    pub fn ok() -> Self {
        ExecOutcome::Ok
    }

    pub fn error() -> Self {
        ExecOutcome::Error
    }

    pub fn yourself() -> Self {
        ExecOutcome::Yourself
    }

    pub fn symlink(target: impl Into<String>) -> Self {
        ExecOutcome::Symlink(target.into())
    }

    pub fn code(&self) -> i32 {
        match self {
            ExecOutcome::Ok => 0,
            ExecOutcome::Error => 1,
            ExecOutcome::Yourself => -1,
            ExecOutcome::Symlink(_) => -2,
        }
    }
}

/// Answer of `FsExtractCustomIcon`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IconOutcome {
    UseDefault,
    /// The host must not free the icon.
    Extracted {
        icon: IconHandle,
        name: Option<String>,
    },
    /// The host destroys the icon after use.
    ExtractedDestroy {
        icon: IconHandle,
        name: Option<String>,
    },
    /// Show the default icon now and ask again from the background thread.
    Delayed,
}

impl IconOutcome {
    pub fn use_default() -> Self {
        IconOutcome::UseDefault
    }

    pub fn extracted(icon: IconHandle, name: Option<String>) -> Self {
        IconOutcome::Extracted { icon, name }
    }

    pub fn extracted_destroy(icon: IconHandle, name: Option<String>) -> Self {
        IconOutcome::ExtractedDestroy { icon, name }
    }

    pub fn delayed() -> Self {
        IconOutcome::Delayed
    }

    pub fn code(&self) -> i32 {
        match self {
            IconOutcome::UseDefault => 0,
            IconOutcome::Extracted { .. } => 1,
            IconOutcome::ExtractedDestroy { .. } => 2,
            IconOutcome::Delayed => 3,
        }
    }

    pub fn icon(&self) -> Option<IconHandle> {
        match self {
            IconOutcome::Extracted { icon, .. } | IconOutcome::ExtractedDestroy { icon, .. } => {
                Some(*icon)
            }
            IconOutcome::UseDefault | IconOutcome::Delayed => None,
        }
    }

    /// Cache key written back into the name buffer.
    pub fn name(&self) -> Option<&str> {
        match self {
            IconOutcome::Extracted { name, .. } | IconOutcome::ExtractedDestroy { name, .. } => {
                name.as_deref()
            }
            IconOutcome::UseDefault | IconOutcome::Delayed => None,
        }
    }
}

/// Answer of `FsGetPreviewBitmap`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BitmapOutcome {
    None,
    Extracted {
        bitmap: BitmapHandle,
        name: Option<String>,
        cache: bool,
    },
    /// The host loads the image from `path` itself.
    ExtractYourself { path: String, cache: bool },
    /// As [`BitmapOutcome::ExtractYourself`], then the host deletes the
    /// temporary file.
    ExtractYourselfAndDelete { path: String, cache: bool },
}

impl BitmapOutcome {
    /// Bit added to the answer when the host may cache the image.
    pub const CACHE: i32 = 256;

    pub fn none() -> Self {
        BitmapOutcome::None
    }

    pub fn extracted(bitmap: BitmapHandle, name: Option<String>, cache: bool) -> Self {
        BitmapOutcome::Extracted {
            bitmap,
            name,
            cache,
        }
    }

    pub fn extract_yourself(path: impl Into<String>, cache: bool) -> Self {
        BitmapOutcome::ExtractYourself {
            path: path.into(),
            cache,
        }
    }

    pub fn extract_yourself_and_delete(path: impl Into<String>, cache: bool) -> Self {
        BitmapOutcome::ExtractYourselfAndDelete {
            path: path.into(),
            cache,
        }
    }

    pub fn code(&self) -> i32 {
        let (base, cache) = match self {
            BitmapOutcome::None => (0, false),
            BitmapOutcome::Extracted { cache, .. } => (1, *cache),
            BitmapOutcome::ExtractYourself { cache, .. } => (2, *cache),
            BitmapOutcome::ExtractYourselfAndDelete { cache, .. } => (3, *cache),
        };
        if cache {
            base | Self::CACHE
        } else {
            base
        }
    }

    pub fn bitmap(&self) -> Option<BitmapHandle> {
        match self {
            BitmapOutcome::Extracted { bitmap, .. } => Some(*bitmap),
            _ => None,
        }
    }

    /// Text written back into the name buffer: the cache key or the image
    /// path.
    pub fn name(&self) -> Option<&str> {
        match self {
            BitmapOutcome::None => None,
            BitmapOutcome::Extracted { name, .. } => name.as_deref(),
            BitmapOutcome::ExtractYourself { path, .. }
            | BitmapOutcome::ExtractYourselfAndDelete { path, .. } => Some(path),
        }
    }
}
