use tcb_core::strings::{write_fixed, HostEncoding, Narrow, Wide};
use tcb_core::time::{encode_dos_time, split_u64};

use crate::abi::{HeaderData, HeaderDataEx};
use crate::plugin::ArchiveHeader;

/// A native header block that can receive an [`ArchiveHeader`].
pub trait HeaderSlot {
    fn fill(&mut self, header: &ArchiveHeader);
}

fn clamp_i32(value: u64) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

impl HeaderSlot for HeaderData {
    fn fill(&mut self, header: &ArchiveHeader) {
        write_fixed::<Narrow>(&mut self.arc_name, Some(&header.archive_name));
        write_fixed::<Narrow>(&mut self.file_name, Some(&header.file_name));
        self.flags = header.flags;
        self.pack_size = clamp_i32(header.pack_size);
        self.unp_size = clamp_i32(header.unpacked_size);
        self.host_os = header.host_os;
        self.file_crc = header.file_crc as i32;
        self.file_time = encode_dos_time(header.modified) as i32;
        self.unp_ver = header.unpack_version;
        self.method = header.method;
        self.file_attr = header.attributes as i32;
        self.cmt_size = 0;
        self.cmt_state = 0;
    }
}

fn fill_ex<E: HostEncoding>(slot: &mut HeaderDataEx<E::Unit>, header: &ArchiveHeader) {
    write_fixed::<E>(&mut slot.arc_name, Some(&header.archive_name));
    write_fixed::<E>(&mut slot.file_name, Some(&header.file_name));
    slot.flags = header.flags;
    (slot.pack_size_high, slot.pack_size) = split_u64(header.pack_size);
    (slot.unp_size_high, slot.unp_size) = split_u64(header.unpacked_size);
    slot.host_os = header.host_os;
    slot.file_crc = header.file_crc as i32;
    slot.file_time = encode_dos_time(header.modified) as i32;
    slot.unp_ver = header.unpack_version;
    slot.method = header.method;
    slot.file_attr = header.attributes as i32;
    slot.cmt_size = 0;
    slot.cmt_state = 0;
}

impl HeaderSlot for HeaderDataEx<u8> {
    fn fill(&mut self, header: &ArchiveHeader) {
        fill_ex::<Narrow>(self, header);
    }
}

impl HeaderSlot for HeaderDataEx<u16> {
    fn fill(&mut self, header: &ArchiveHeader) {
        fill_ex::<Wide>(self, header);
    }
}
