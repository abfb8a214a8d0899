/// Emits the complete packer export table for a [`PackerPlugin`](crate::PackerPlugin)
/// type, both string encodings included.
///
/// Use it once, in the `cdylib` crate of the plugin:
///
/// ```ignore
/// tcb_wcx::export_packer_plugin!(MyPacker);
/// ```
///
/// On Windows the expansion also defines `DllMain`, which tears the instance
/// down on `DLL_PROCESS_DETACH`.
#[macro_export]
macro_rules! export_packer_plugin {
    ($plugin:ty) => {
        static TCB_PACKER_INSTANCE: $crate::PackerInstance<$plugin> =
            $crate::PackerInstance::new();

        #[no_mangle]
        pub unsafe extern "system" fn OpenArchive(
            data: *mut $crate::abi::OpenArchiveData<u8>,
        ) -> isize {
            match TCB_PACKER_INSTANCE.runtime() {
                Some(rt) => {
                    $crate::dispatch::open_archive::<$plugin, $crate::tcb_core::Narrow>(&rt, data)
                }
                None => {
                    $crate::dispatch::refuse_open(data);
                    0
                }
            }
        }

        #[no_mangle]
        pub unsafe extern "system" fn OpenArchiveW(
            data: *mut $crate::abi::OpenArchiveData<u16>,
        ) -> isize {
            match TCB_PACKER_INSTANCE.runtime() {
                Some(rt) => {
                    $crate::dispatch::open_archive::<$plugin, $crate::tcb_core::Wide>(&rt, data)
                }
                None => {
                    $crate::dispatch::refuse_open(data);
                    0
                }
            }
        }

        #[no_mangle]
        pub unsafe extern "system" fn ReadHeader(
            archive: isize,
            header: *mut $crate::abi::HeaderData,
        ) -> i32 {
            TCB_PACKER_INSTANCE.enter(18, |rt| {
                $crate::dispatch::read_header(rt, "ReadHeader", archive, header)
            })
        }

        #[no_mangle]
        pub unsafe extern "system" fn ReadHeaderEx(
            archive: isize,
            header: *mut $crate::abi::HeaderDataEx<u8>,
        ) -> i32 {
            TCB_PACKER_INSTANCE.enter(18, |rt| {
                $crate::dispatch::read_header(rt, "ReadHeaderEx", archive, header)
            })
        }

        #[no_mangle]
        pub unsafe extern "system" fn ReadHeaderExW(
            archive: isize,
            header: *mut $crate::abi::HeaderDataEx<u16>,
        ) -> i32 {
            TCB_PACKER_INSTANCE.enter(18, |rt| {
                $crate::dispatch::read_header(rt, "ReadHeaderExW", archive, header)
            })
        }

        #[no_mangle]
        pub unsafe extern "system" fn ProcessFile(
            archive: isize,
            operation: i32,
            dest_path: *const u8,
            dest_name: *const u8,
        ) -> i32 {
            TCB_PACKER_INSTANCE.enter(18, |rt| {
                $crate::dispatch::process_file::<$plugin, $crate::tcb_core::Narrow>(
                    rt, archive, operation, dest_path, dest_name,
                )
            })
        }

        #[no_mangle]
        pub unsafe extern "system" fn ProcessFileW(
            archive: isize,
            operation: i32,
            dest_path: *const u16,
            dest_name: *const u16,
        ) -> i32 {
            TCB_PACKER_INSTANCE.enter(18, |rt| {
                $crate::dispatch::process_file::<$plugin, $crate::tcb_core::Wide>(
                    rt, archive, operation, dest_path, dest_name,
                )
            })
        }

        #[no_mangle]
        pub extern "system" fn CloseArchive(archive: isize) -> i32 {
            TCB_PACKER_INSTANCE.enter(17, |rt| $crate::dispatch::close_archive(rt, archive))
        }

        #[no_mangle]
        pub extern "system" fn SetChangeVolProc(
            archive: isize,
            proc: Option<$crate::abi::ChangeVolProcA>,
        ) {
            TCB_PACKER_INSTANCE.enter((), |rt| {
                $crate::dispatch::set_change_vol_proc(
                    rt,
                    "SetChangeVolProc",
                    archive,
                    proc.map($crate::tcb_core::HostProc::Narrow),
                )
            })
        }

        #[no_mangle]
        pub extern "system" fn SetChangeVolProcW(
            archive: isize,
            proc: Option<$crate::abi::ChangeVolProcW>,
        ) {
            TCB_PACKER_INSTANCE.enter((), |rt| {
                $crate::dispatch::set_change_vol_proc(
                    rt,
                    "SetChangeVolProcW",
                    archive,
                    proc.map($crate::tcb_core::HostProc::Wide),
                )
            })
        }

        #[no_mangle]
        pub extern "system" fn SetProcessDataProc(
            archive: isize,
            proc: Option<$crate::abi::ProcessDataProcA>,
        ) {
            TCB_PACKER_INSTANCE.enter((), |rt| {
                $crate::dispatch::set_process_data_proc(
                    rt,
                    "SetProcessDataProc",
                    archive,
                    proc.map($crate::tcb_core::HostProc::Narrow),
                )
            })
        }

        #[no_mangle]
        pub extern "system" fn SetProcessDataProcW(
            archive: isize,
            proc: Option<$crate::abi::ProcessDataProcW>,
        ) {
            TCB_PACKER_INSTANCE.enter((), |rt| {
                $crate::dispatch::set_process_data_proc(
                    rt,
                    "SetProcessDataProcW",
                    archive,
                    proc.map($crate::tcb_core::HostProc::Wide),
                )
            })
        }

        #[no_mangle]
        pub extern "system" fn PkSetCryptCallback(
            proc: Option<$crate::abi::PkCryptProcA>,
            crypto_number: i32,
            flags: i32,
        ) {
            TCB_PACKER_INSTANCE.enter((), |rt| {
                $crate::dispatch::set_crypt_callback(
                    rt,
                    "PkSetCryptCallback",
                    proc.map($crate::tcb_core::HostProc::Narrow),
                    crypto_number,
                    flags,
                )
            })
        }

        #[no_mangle]
        pub extern "system" fn PkSetCryptCallbackW(
            proc: Option<$crate::abi::PkCryptProcW>,
            crypto_number: i32,
            flags: i32,
        ) {
            TCB_PACKER_INSTANCE.enter((), |rt| {
                $crate::dispatch::set_crypt_callback(
                    rt,
                    "PkSetCryptCallbackW",
                    proc.map($crate::tcb_core::HostProc::Wide),
                    crypto_number,
                    flags,
                )
            })
        }

        #[no_mangle]
        pub unsafe extern "system" fn PackFiles(
            packed_file: *const u8,
            sub_path: *const u8,
            src_path: *const u8,
            add_list: *const u8,
            flags: i32,
        ) -> i32 {
            TCB_PACKER_INSTANCE.enter(19, |rt| {
                $crate::dispatch::pack_files::<$plugin, $crate::tcb_core::Narrow>(
                    rt,
                    packed_file,
                    sub_path,
                    src_path,
                    add_list,
                    flags,
                )
            })
        }

        #[no_mangle]
        pub unsafe extern "system" fn PackFilesW(
            packed_file: *const u16,
            sub_path: *const u16,
            src_path: *const u16,
            add_list: *const u16,
            flags: i32,
        ) -> i32 {
            TCB_PACKER_INSTANCE.enter(19, |rt| {
                $crate::dispatch::pack_files::<$plugin, $crate::tcb_core::Wide>(
                    rt,
                    packed_file,
                    sub_path,
                    src_path,
                    add_list,
                    flags,
                )
            })
        }

        #[no_mangle]
        pub unsafe extern "system" fn DeleteFiles(
            packed_file: *const u8,
            delete_list: *const u8,
        ) -> i32 {
            TCB_PACKER_INSTANCE.enter(19, |rt| {
                $crate::dispatch::delete_files::<$plugin, $crate::tcb_core::Narrow>(
                    rt,
                    packed_file,
                    delete_list,
                )
            })
        }

        #[no_mangle]
        pub unsafe extern "system" fn DeleteFilesW(
            packed_file: *const u16,
            delete_list: *const u16,
        ) -> i32 {
            TCB_PACKER_INSTANCE.enter(19, |rt| {
                $crate::dispatch::delete_files::<$plugin, $crate::tcb_core::Wide>(
                    rt,
                    packed_file,
                    delete_list,
                )
            })
        }

        #[no_mangle]
        pub extern "system" fn GetPackerCaps() -> i32 {
            TCB_PACKER_INSTANCE.enter(0, |rt| $crate::dispatch::get_packer_caps(rt))
        }

        #[no_mangle]
        pub extern "system" fn GetBackgroundFlags() -> i32 {
            TCB_PACKER_INSTANCE.enter(0, |rt| $crate::dispatch::get_background_flags(rt))
        }

        #[no_mangle]
        pub extern "system" fn ConfigurePacker(parent: isize, _dll_instance: isize) {
            TCB_PACKER_INSTANCE.enter((), |rt| $crate::dispatch::configure_packer(rt, parent))
        }

        #[no_mangle]
        pub unsafe extern "system" fn PackSetDefaultParams(
            params: *const $crate::tcb_core::DefaultParamStruct,
        ) {
            TCB_PACKER_INSTANCE.enter((), |rt| $crate::dispatch::set_default_params(rt, params))
        }

        #[no_mangle]
        pub unsafe extern "system" fn CanYouHandleThisFile(file_name: *const u8) -> i32 {
            TCB_PACKER_INSTANCE.enter(0, |rt| {
                $crate::dispatch::can_you_handle_this_file::<$plugin, $crate::tcb_core::Narrow>(
                    rt, file_name,
                )
            })
        }

        #[no_mangle]
        pub unsafe extern "system" fn CanYouHandleThisFileW(file_name: *const u16) -> i32 {
            TCB_PACKER_INSTANCE.enter(0, |rt| {
                $crate::dispatch::can_you_handle_this_file::<$plugin, $crate::tcb_core::Wide>(
                    rt, file_name,
                )
            })
        }

        #[no_mangle]
        pub unsafe extern "system" fn StartMemPack(options: i32, file_name: *const u8) -> isize {
            TCB_PACKER_INSTANCE.enter(0, |rt| {
                $crate::dispatch::start_mem_pack::<$plugin, $crate::tcb_core::Narrow>(
                    rt, options, file_name,
                )
            })
        }

        #[no_mangle]
        pub unsafe extern "system" fn StartMemPackW(options: i32, file_name: *const u16) -> isize {
            TCB_PACKER_INSTANCE.enter(0, |rt| {
                $crate::dispatch::start_mem_pack::<$plugin, $crate::tcb_core::Wide>(
                    rt, options, file_name,
                )
            })
        }

        #[no_mangle]
        #[allow(clippy::too_many_arguments)]
        pub unsafe extern "system" fn PackToMem(
            mem_pack: isize,
            buf_in: *const u8,
            in_len: i32,
            taken: *mut i32,
            buf_out: *mut u8,
            out_len: i32,
            written: *mut i32,
            seek_by: i32,
        ) -> i32 {
            TCB_PACKER_INSTANCE.enter(19, |rt| {
                $crate::dispatch::pack_to_mem(
                    rt, mem_pack, buf_in, in_len, taken, buf_out, out_len, written, seek_by,
                )
            })
        }

        #[no_mangle]
        pub extern "system" fn DoneMemPack(mem_pack: isize) -> i32 {
            TCB_PACKER_INSTANCE.enter(17, |rt| $crate::dispatch::done_mem_pack(rt, mem_pack))
        }

        #[cfg(windows)]
        #[no_mangle]
        pub extern "system" fn DllMain(
            _module: isize,
            reason: u32,
            _reserved: *mut ::core::ffi::c_void,
        ) -> i32 {
            const DLL_PROCESS_DETACH: u32 = 0;
            if reason == DLL_PROCESS_DETACH {
                TCB_PACKER_INSTANCE.teardown();
            }
            1
        }

        /// Releases the plugin instance; the `DllMain` hook does the same on
        /// Windows.
        pub fn tcb_packer_teardown() {
            TCB_PACKER_INSTANCE.teardown();
        }
    };
}
