//! Native layouts and constants of the packer plugin interface.

/// `OpenArchive` mode: list the contents.
pub const PK_OM_LIST: i32 = 0;
/// `OpenArchive` mode: extract files.
pub const PK_OM_EXTRACT: i32 = 1;

/// `ProcessFile` operation: move to the next entry.
pub const PK_SKIP: i32 = 0;
/// `ProcessFile` operation: test the entry.
pub const PK_TEST: i32 = 1;
/// `ProcessFile` operation: extract the entry.
pub const PK_EXTRACT: i32 = 2;

/// Change-volume mode: ask for the next volume.
pub const PK_VOL_ASK: i32 = 0;
/// Change-volume mode: the next volume was found.
pub const PK_VOL_NOTIFY: i32 = 1;

/// `PackToMem` keeps going.
pub const MEMPACK_OK: i32 = 0;
/// `PackToMem` wrote everything.
pub const MEMPACK_DONE: i32 = 1;

/// Length of the path arrays of [`HeaderData`].
pub const HEADER_NAME_LEN: usize = 260;
/// Length of the path arrays of [`HeaderDataEx`].
pub const HEADER_EX_NAME_LEN: usize = 1024;

/// Host callback asking for (or announcing) the next volume. Zero aborts.
pub type ChangeVolProcA = unsafe extern "system" fn(arc_name: *mut u8, mode: i32) -> i32;
/// Wide form of [`ChangeVolProcA`].
pub type ChangeVolProcW = unsafe extern "system" fn(arc_name: *mut u16, mode: i32) -> i32;
/// Host progress callback. Zero aborts.
pub type ProcessDataProcA = unsafe extern "system" fn(file_name: *mut u8, size: i32) -> i32;
/// Wide form of [`ProcessDataProcA`].
pub type ProcessDataProcW = unsafe extern "system" fn(file_name: *mut u16, size: i32) -> i32;
/// Host password store.
pub type PkCryptProcA = unsafe extern "system" fn(
    crypto_nr: i32,
    mode: i32,
    archive_name: *mut u8,
    password: *mut u8,
    max_len: i32,
) -> i32;
/// Wide form of [`PkCryptProcA`].
pub type PkCryptProcW = unsafe extern "system" fn(
    crypto_nr: i32,
    mode: i32,
    archive_name: *mut u16,
    password: *mut u16,
    max_len: i32,
) -> i32;

/// In/out block of `OpenArchive`; `U` is the code unit of the export.
#[repr(C)]
#[derive(Debug)]
pub struct OpenArchiveData<U> {
    pub arc_name: *const U,
    pub open_mode: i32,
    pub open_result: i32,
    pub cmt_buf: *mut U,
    pub cmt_buf_size: i32,
    pub cmt_size: i32,
    pub cmt_state: i32,
}

impl<U> OpenArchiveData<U> {
    /// Block as the host fills it before the call.
    pub fn new(arc_name: *const U, open_mode: i32) -> Self {
        Self {
            arc_name,
            open_mode,
            open_result: 0,
            cmt_buf: std::ptr::null_mut(),
            cmt_buf_size: 0,
            cmt_size: 0,
            cmt_state: 0,
        }
    }
}

/// Entry block of `ReadHeader`.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct HeaderData {
    pub arc_name: [u8; HEADER_NAME_LEN],
    pub file_name: [u8; HEADER_NAME_LEN],
    pub flags: i32,
    pub pack_size: i32,
    pub unp_size: i32,
    pub host_os: i32,
    pub file_crc: i32,
    pub file_time: i32,
    pub unp_ver: i32,
    pub method: i32,
    pub file_attr: i32,
    pub cmt_buf: *mut u8,
    pub cmt_buf_size: i32,
    pub cmt_size: i32,
    pub cmt_state: i32,
}

impl HeaderData {
    /// Zeroed block.
    pub fn empty() -> Self {
        Self {
            arc_name: [0; HEADER_NAME_LEN],
            file_name: [0; HEADER_NAME_LEN],
            flags: 0,
            pack_size: 0,
            unp_size: 0,
            host_os: 0,
            file_crc: 0,
            file_time: 0,
            unp_ver: 0,
            method: 0,
            file_attr: 0,
            cmt_buf: std::ptr::null_mut(),
            cmt_buf_size: 0,
            cmt_size: 0,
            cmt_state: 0,
        }
    }
}

/// Entry block of `ReadHeaderEx`/`ReadHeaderExW` with 64-bit sizes.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct HeaderDataEx<U> {
    pub arc_name: [U; HEADER_EX_NAME_LEN],
    pub file_name: [U; HEADER_EX_NAME_LEN],
    pub flags: i32,
    pub pack_size: u32,
    pub pack_size_high: u32,
    pub unp_size: u32,
    pub unp_size_high: u32,
    pub host_os: i32,
    pub file_crc: i32,
    pub file_time: i32,
    pub unp_ver: i32,
    pub method: i32,
    pub file_attr: i32,
    pub cmt_buf: *mut u8,
    pub cmt_buf_size: i32,
    pub cmt_size: i32,
    pub cmt_state: i32,
    pub reserved: [u8; 1024],
}

impl<U: Copy + Default> HeaderDataEx<U> {
    /// Zeroed block.
    pub fn empty() -> Self {
        Self {
            arc_name: [U::default(); HEADER_EX_NAME_LEN],
            file_name: [U::default(); HEADER_EX_NAME_LEN],
            flags: 0,
            pack_size: 0,
            pack_size_high: 0,
            unp_size: 0,
            unp_size_high: 0,
            host_os: 0,
            file_crc: 0,
            file_time: 0,
            unp_ver: 0,
            method: 0,
            file_attr: 0,
            cmt_buf: std::ptr::null_mut(),
            cmt_buf_size: 0,
            cmt_size: 0,
            cmt_state: 0,
            reserved: [0; 1024],
        }
    }
}
