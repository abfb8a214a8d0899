//! Native layouts and constants of the file-system plugin interface.

use tcb_core::callbacks::MAX_PATH;
use tcb_core::time::FileTime;

/// Failure value of `FsFindFirst`.
pub const INVALID_HANDLE_VALUE: isize = -1;

/// Last-error code set when a listing is empty.
pub const ERROR_NO_MORE_FILES: u32 = 18;
/// Last-error code set when a listing cannot be opened.
pub const ERROR_PATH_NOT_FOUND: u32 = 3;

/// `dwFileAttributes` bit of directories.
pub const FILE_ATTRIBUTE_DIRECTORY: u32 = 0x10;
/// `dwFileAttributes` bit announcing a Unix mode in `dwReserved0`.
pub const FILE_ATTRIBUTE_UNIX_MODE: u32 = 0x8000_0000;

/// Length of `cAlternateFileName`.
pub const ALTERNATE_NAME_LEN: usize = 14;

/// Host progress callback. Non-zero aborts.
pub type ProgressProcA = unsafe extern "system" fn(
    plugin_nr: i32,
    source_name: *mut u8,
    target_name: *mut u8,
    percent_done: i32,
) -> i32;
/// Wide form of [`ProgressProcA`].
pub type ProgressProcW = unsafe extern "system" fn(
    plugin_nr: i32,
    source_name: *mut u16,
    target_name: *mut u16,
    percent_done: i32,
) -> i32;
/// Host log window.
pub type LogProcA = unsafe extern "system" fn(plugin_nr: i32, msg_type: i32, log_string: *mut u8);
/// Wide form of [`LogProcA`].
pub type LogProcW = unsafe extern "system" fn(plugin_nr: i32, msg_type: i32, log_string: *mut u16);
/// Host prompt. Returns a `BOOL`: whether the user confirmed.
pub type RequestProcA = unsafe extern "system" fn(
    plugin_nr: i32,
    request_type: i32,
    custom_title: *mut u8,
    custom_text: *mut u8,
    returned_text: *mut u8,
    max_len: i32,
) -> i32;
/// Wide form of [`RequestProcA`].
pub type RequestProcW = unsafe extern "system" fn(
    plugin_nr: i32,
    request_type: i32,
    custom_title: *mut u16,
    custom_text: *mut u16,
    returned_text: *mut u16,
    max_len: i32,
) -> i32;
/// Host password store.
pub type FsCryptProcA = unsafe extern "system" fn(
    plugin_nr: i32,
    crypto_nr: i32,
    mode: i32,
    connection_name: *mut u8,
    password: *mut u8,
    max_len: i32,
) -> i32;
/// Wide form of [`FsCryptProcA`].
pub type FsCryptProcW = unsafe extern "system" fn(
    plugin_nr: i32,
    crypto_nr: i32,
    mode: i32,
    connection_name: *mut u16,
    password: *mut u16,
    max_len: i32,
) -> i32;

/// `WIN32_FIND_DATA`; `U` is the code unit of the export.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct Win32FindData<U> {
    pub file_attributes: u32,
    pub creation_time: FileTime,
    pub last_access_time: FileTime,
    pub last_write_time: FileTime,
    pub file_size_high: u32,
    pub file_size_low: u32,
    pub reserved0: u32,
    pub reserved1: u32,
    pub file_name: [U; MAX_PATH],
    pub alternate_file_name: [U; ALTERNATE_NAME_LEN],
}

impl<U: Copy + Default> Win32FindData<U> {
    /// Zeroed block.
    pub fn empty() -> Self {
        Self {
            file_attributes: 0,
            creation_time: FileTime::default(),
            last_access_time: FileTime::default(),
            last_write_time: FileTime::default(),
            file_size_high: 0,
            file_size_low: 0,
            reserved0: 0,
            reserved1: 0,
            file_name: [U::default(); MAX_PATH],
            alternate_file_name: [U::default(); ALTERNATE_NAME_LEN],
        }
    }
}

/// Details about the remote file passed to `FsGetFile` and `FsRenMovFile`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteInfoStruct {
    pub size_low: u32,
    pub size_high: u32,
    pub last_write_time: FileTime,
    pub attr: i32,
}

/// Sets the calling thread's last-error code. Does nothing off Windows.
pub fn set_last_error(code: u32) {
    #[cfg(windows)]
    {
        #[link(name = "kernel32")]
        extern "system" {
            fn SetLastError(code: u32);
        }
        unsafe { SetLastError(code) }
    }
    #[cfg(not(windows))]
    let _ = code;
}
