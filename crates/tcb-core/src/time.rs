//! Split 64-bit values and the two timestamp encodings used on the wire.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike, Utc};

/// Seconds between 1601-01-01 and 1970-01-01.
const FILETIME_UNIX_OFFSET_SECS: i64 = 11_644_473_600;
const TICKS_PER_SEC: i64 = 10_000_000;
const NANOS_PER_TICK: u32 = 100;

/// Splits a 64-bit value into its `(high, low)` halves.
pub fn split_u64(value: u64) -> (u32, u32) {
    ((value >> 32) as u32, (value & u64::from(u32::MAX)) as u32)
}

/// Recombines a `(high, low)` pair.
pub fn join_u64(high: u32, low: u32) -> u64 {
    (u64::from(high) << 32) | u64::from(low)
}

/// Host representation of a point in time: 100 ns ticks since 1601-01-01 UTC
/// split into two 32-bit words, low word first.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FileTime {
    /// Low 32 bits of the tick count.
    pub low: u32,
    /// High 32 bits of the tick count.
    pub high: u32,
}

impl FileTime {
    /// Sentinel meaning "no timestamp". Zero is a real instant (1601-01-01), so
    /// absence is spelled with a reserved pattern instead.
    pub const ABSENT: FileTime = FileTime {
        low: 0xFFFF_FFFE,
        high: 0xFFFF_FFFF,
    };

    /// Builds the split form of a raw tick count.
    pub fn from_ticks(ticks: u64) -> Self {
        let (high, low) = split_u64(ticks);
        Self { low, high }
    }

    /// Returns the raw tick count.
    pub fn ticks(self) -> u64 {
        join_u64(self.high, self.low)
    }

    /// Whether this is the absent sentinel.
    pub fn is_absent(self) -> bool {
        self == Self::ABSENT
    }
}

/// Encodes an optional instant. `None` and instants before 1601 become
/// [`FileTime::ABSENT`].
pub fn encode_file_time(value: Option<DateTime<Utc>>) -> FileTime {
    let Some(value) = value else {
        return FileTime::ABSENT;
    };
    let secs = value.timestamp() + FILETIME_UNIX_OFFSET_SECS;
    if secs < 0 {
        return FileTime::ABSENT;
    }
    // Leap seconds report up to 1_999_999_999 subsecond nanos.
    let nanos = value.timestamp_subsec_nanos() % 1_000_000_000;
    let ticks = secs
        .checked_mul(TICKS_PER_SEC)
        .and_then(|t| t.checked_add(i64::from(nanos / NANOS_PER_TICK)));
    match ticks {
        Some(ticks) => FileTime::from_ticks(ticks as u64),
        None => FileTime::ABSENT,
    }
}

/// Decodes a host timestamp. The sentinel and values chrono cannot represent
/// decode as `None`.
pub fn decode_file_time(value: FileTime) -> Option<DateTime<Utc>> {
    if value.is_absent() {
        return None;
    }
    let ticks = i64::try_from(value.ticks()).ok()?;
    let secs = ticks / TICKS_PER_SEC - FILETIME_UNIX_OFFSET_SECS;
    let nanos = (ticks % TICKS_PER_SEC) as u32 * NANOS_PER_TICK;
    DateTime::<Utc>::from_timestamp(secs, nanos)
}

/// Encodes a DOS packed date/time as used in archive headers.
///
/// Years outside 1980..=2100 and `None` encode as 0. Seconds lose their low
/// bit.
pub fn encode_dos_time(value: Option<NaiveDateTime>) -> u32 {
    let Some(value) = value else {
        return 0;
    };
    let year = value.year();
    if !(1980..=2100).contains(&year) {
        return 0;
    }
    ((year - 1980) as u32) << 25
        | value.month() << 21
        | value.day() << 16
        | value.hour() << 11
        | value.minute() << 5
        | value.second() / 2
}

/// Decodes a DOS packed date/time; 0 and impossible field values decode as
/// `None`.
pub fn decode_dos_time(packed: u32) -> Option<NaiveDateTime> {
    if packed == 0 {
        return None;
    }
    let year = 1980 + (packed >> 25) as i32;
    let month = (packed >> 21) & 0x0F;
    let day = (packed >> 16) & 0x1F;
    let hour = (packed >> 11) & 0x1F;
    let minute = (packed >> 5) & 0x3F;
    let second = (packed & 0x1F) * 2;
    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)
}
