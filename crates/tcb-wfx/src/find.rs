use tcb_core::strings::{write_fixed, HostEncoding};
use tcb_core::time::{encode_file_time, split_u64};

use crate::abi::{Win32FindData, FILE_ATTRIBUTE_UNIX_MODE};
use crate::plugin::FindEntry;

/// Writes `entry` into a host find-data block.
///
/// Sizes are split into high and low words, missing timestamps use the absent
/// sentinel and a Unix mode sets its attribute bit with the mode in
/// `dwReserved0`.
pub fn write_find_data<E: HostEncoding>(data: &mut Win32FindData<E::Unit>, entry: &FindEntry) {
    data.file_attributes = entry.attributes;
    data.reserved0 = 0;
    data.reserved1 = 0;
    if let Some(mode) = entry.unix_mode {
        data.file_attributes |= FILE_ATTRIBUTE_UNIX_MODE;
        data.reserved0 = mode;
    }
    data.creation_time = encode_file_time(entry.created);
    data.last_access_time = encode_file_time(entry.accessed);
    data.last_write_time = encode_file_time(entry.modified);
    (data.file_size_high, data.file_size_low) = split_u64(entry.size);
    write_fixed::<E>(&mut data.file_name, Some(&entry.name));
    let alternate = entry.alternate_name.as_deref();
    write_fixed::<E>(&mut data.alternate_file_name, alternate);
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use tcb_core::strings::{decode_str, Narrow, Wide};
    use tcb_core::time::FileTime;

    use super::*;

    #[test]
    fn unix_mode_sets_attribute_bit() {
        let mut entry = FindEntry::file("run.sh", 12);
        entry.unix_mode = Some(0o755);
        let mut data = Win32FindData::<u8>::empty();
        write_find_data::<Narrow>(&mut data, &entry);
        assert_eq!(data.file_attributes, FILE_ATTRIBUTE_UNIX_MODE);
        assert_eq!(data.reserved0, 0o755);
        assert_eq!(decode_str::<Narrow>(&data.file_name), "run.sh");
    }

    #[test]
    fn wide_block_splits_size_and_marks_missing_times() {
        let epoch = Utc.timestamp_opt(0, 0).single().expect("epoch");
        let mut entry = FindEntry::directory("photos").modified_at(epoch);
        entry.size = 0x2_0000_0001;
        let mut data = Win32FindData::<u16>::empty();
        write_find_data::<Wide>(&mut data, &entry);
        assert_eq!((data.file_size_high, data.file_size_low), (2, 1));
        assert_eq!(data.creation_time, FileTime::ABSENT);
        assert_eq!(data.last_write_time.ticks(), 116_444_736_000_000_000);
        assert_eq!(data.file_attributes, FindEntry::DIRECTORY);
    }
}
