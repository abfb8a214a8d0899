//! Narrow and wide string transfer across the host boundary.
//!
//! Every string-bearing export exists twice: once with 8-bit code units and
//! once with UTF-16 code units. [`HostEncoding`] captures the difference so
//! the adapters are written once and instantiated for [`Narrow`] and [`Wide`].
//!
//! Narrow strings are treated as ISO-8859-1: every byte maps to the scalar
//! value of the same number, and scalars above `0xFF` are written as `?`.
//! Decoding never fails; malformed UTF-16 is replaced lossily.

use std::fmt;
use std::mem::size_of;

use serde::{Deserialize, Serialize};

/// Which of the two string encodings a symbol or callback uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// 8-bit code units (the `A` family of exports).
    Narrow,
    /// 16-bit code units (the `W` family of exports).
    Wide,
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Encoding::Narrow => f.write_str("narrow"),
            Encoding::Wide => f.write_str("wide"),
        }
    }
}

/// Conversion between semantic strings and one family of code units.
pub trait HostEncoding: Send + Sync + 'static {
    /// Code unit stored in host buffers.
    type Unit: Copy + Default + Eq + fmt::Debug + Send + Sync + 'static;

    /// Runtime tag for this encoding.
    const ENCODING: Encoding;

    /// Encodes `text` without a terminator.
    fn encode(text: &str) -> Vec<Self::Unit>;

    /// Decodes exactly `units`; the slice must not contain the terminator.
    fn decode(units: &[Self::Unit]) -> String;

    /// Whether `unit` opens a pair that must not be separated from the next
    /// unit when a string is truncated.
    fn opens_pair(_unit: Self::Unit) -> bool {
        false
    }
}

/// Marker for 8-bit exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Narrow;

/// Marker for UTF-16 exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wide;

impl HostEncoding for Narrow {
    type Unit = u8;
    const ENCODING: Encoding = Encoding::Narrow;

    fn encode(text: &str) -> Vec<u8> {
        text.chars()
            .map(|ch| u8::try_from(u32::from(ch)).unwrap_or(b'?'))
            .collect()
    }

    fn decode(units: &[u8]) -> String {
        units.iter().copied().map(char::from).collect()
    }
}

impl HostEncoding for Wide {
    type Unit = u16;
    const ENCODING: Encoding = Encoding::Wide;

    fn encode(text: &str) -> Vec<u16> {
        text.encode_utf16().collect()
    }

    fn decode(units: &[u16]) -> String {
        String::from_utf16_lossy(units)
    }

    fn opens_pair(unit: u16) -> bool {
        (0xD800..=0xDBFF).contains(&unit)
    }
}

fn is_nul<U: Copy + Default + Eq>(unit: &U) -> bool {
    *unit == U::default()
}

/// Encodes `text` followed by a terminator.
pub fn encode_with_nul<E: HostEncoding>(text: &str) -> Vec<E::Unit> {
    let mut units = E::encode(text);
    units.push(E::Unit::default());
    units
}

/// Decodes the string at the start of `units`, stopping at the first
/// terminator or at the end of the slice.
pub fn decode_str<E: HostEncoding>(units: &[E::Unit]) -> String {
    let end = units.iter().position(is_nul).unwrap_or(units.len());
    E::decode(&units[..end])
}

/// Counts code units up to (not including) the terminator.
///
/// # Safety
///
/// `ptr` must be non-null and point to a terminated sequence.
unsafe fn terminated_len<U: Copy + Default + Eq>(ptr: *const U) -> usize {
    let mut len = 0;
    while !is_nul(&*ptr.add(len)) {
        len += 1;
    }
    len
}

/// Reads a terminated string from host memory. A null pointer yields `None`.
///
/// # Safety
///
/// A non-null `ptr` must point to a terminated sequence of `E::Unit`.
pub unsafe fn read_str<E: HostEncoding>(ptr: *const E::Unit) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    let len = terminated_len(ptr);
    Some(E::decode(std::slice::from_raw_parts(ptr, len)))
}

/// Reads a string from a fixed-size host buffer of `capacity` units.
///
/// Stops at the first terminator or after `capacity` units, whichever comes
/// first, so an unterminated buffer still yields its contents.
///
/// # Safety
///
/// A non-null `ptr` must be valid for reads of `capacity` units.
pub unsafe fn read_str_bounded<E: HostEncoding>(
    ptr: *const E::Unit,
    capacity: usize,
) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    Some(decode_str::<E>(std::slice::from_raw_parts(ptr, capacity)))
}

/// Encodes a list as consecutive terminated strings followed by an empty
/// string (the double terminator).
pub fn encode_string_list<E: HostEncoding, S: AsRef<str>>(items: &[S]) -> Vec<E::Unit> {
    let mut units = Vec::new();
    for item in items {
        units.extend(encode_with_nul::<E>(item.as_ref()));
    }
    units.push(E::Unit::default());
    units
}

/// Decodes a double-terminated string list held in a slice.
///
/// The first empty string ends the list and is not part of it. A trailing
/// fragment without its terminator is treated as truncated input and dropped.
pub fn decode_string_list<E: HostEncoding>(units: &[E::Unit]) -> Vec<String> {
    let mut items = Vec::new();
    let mut rest = units;
    while let Some(end) = rest.iter().position(is_nul) {
        if end == 0 {
            break;
        }
        items.push(E::decode(&rest[..end]));
        rest = &rest[end + 1..];
    }
    items
}

/// Reads a double-terminated string list from host memory. A null pointer is
/// an empty list.
///
/// # Safety
///
/// A non-null `ptr` must point to a sequence of terminated strings that ends
/// with an empty string.
pub unsafe fn read_string_list<E: HostEncoding>(ptr: *const E::Unit) -> Vec<String> {
    let mut items = Vec::new();
    if ptr.is_null() {
        return items;
    }
    let mut cursor = ptr;
    loop {
        let len = terminated_len(cursor);
        if len == 0 {
            break;
        }
        items.push(E::decode(std::slice::from_raw_parts(cursor, len)));
        cursor = cursor.add(len + 1);
    }
    items
}

/// Number of code units covered by a pointer-sized null written into a
/// buffer of `E::Unit`.
pub fn null_sentinel_units<E: HostEncoding>() -> usize {
    size_of::<usize>() / size_of::<E::Unit>()
}

/// Writes `text` into a fixed-size buffer and returns the number of units
/// written before the terminator.
///
/// At most `dst.len() - 1` units are copied and a terminator always follows.
/// A wide string is never cut between the halves of a surrogate pair. An
/// absent or empty `text` writes a pointer-sized null into the start of the
/// buffer (clamped to its length) instead of a lone terminator.
pub fn write_fixed<E: HostEncoding>(dst: &mut [E::Unit], text: Option<&str>) -> usize {
    if dst.is_empty() {
        return 0;
    }
    let text = match text {
        Some(text) if !text.is_empty() => text,
        _ => {
            let width = null_sentinel_units::<E>().min(dst.len());
            dst[..width].fill(E::Unit::default());
            return 0;
        }
    };
    let units = E::encode(text);
    let mut len = units.len().min(dst.len() - 1);
    if len < units.len() && len > 0 && E::opens_pair(units[len - 1]) {
        len -= 1;
    }
    dst[..len].copy_from_slice(&units[..len]);
    dst[len] = E::Unit::default();
    len
}

/// Raw-pointer form of [`write_fixed`]. A null `dst` or zero `capacity`
/// writes nothing.
///
/// # Safety
///
/// A non-null `dst` must be valid for writes of `capacity` units.
pub unsafe fn write_fixed_raw<E: HostEncoding>(
    dst: *mut E::Unit,
    capacity: usize,
    text: Option<&str>,
) -> usize {
    if dst.is_null() || capacity == 0 {
        return 0;
    }
    write_fixed::<E>(std::slice::from_raw_parts_mut(dst, capacity), text)
}
