/// Emits the complete file-system export table for an
/// [`FsPlugin`](crate::FsPlugin) type, both string encodings included.
///
/// ```ignore
/// tcb_wfx::export_fs_plugin!(MyFileSystem);
/// ```
///
/// `FsFindFirst` sets the thread's last-error code when it returns
/// `INVALID_HANDLE_VALUE`. On Windows the expansion also defines `DllMain`,
/// which tears the instance down on `DLL_PROCESS_DETACH`.
#[macro_export]
macro_rules! export_fs_plugin {
    ($plugin:ty) => {
        static TCB_FS_INSTANCE: $crate::FsInstance<$plugin> = $crate::FsInstance::new();

        #[no_mangle]
        pub extern "system" fn FsInit(
            plugin_nr: i32,
            progress: Option<$crate::abi::ProgressProcA>,
            log: Option<$crate::abi::LogProcA>,
            request: Option<$crate::abi::RequestProcA>,
        ) -> i32 {
            TCB_FS_INSTANCE.enter(-1, |rt| {
                $crate::dispatch::fs_init(
                    rt,
                    "FsInit",
                    plugin_nr,
                    progress.map($crate::tcb_core::HostProc::Narrow),
                    log.map($crate::tcb_core::HostProc::Narrow),
                    request.map($crate::tcb_core::HostProc::Narrow),
                )
            })
        }

        #[no_mangle]
        pub extern "system" fn FsInitW(
            plugin_nr: i32,
            progress: Option<$crate::abi::ProgressProcW>,
            log: Option<$crate::abi::LogProcW>,
            request: Option<$crate::abi::RequestProcW>,
        ) -> i32 {
            TCB_FS_INSTANCE.enter(-1, |rt| {
                $crate::dispatch::fs_init(
                    rt,
                    "FsInitW",
                    plugin_nr,
                    progress.map($crate::tcb_core::HostProc::Wide),
                    log.map($crate::tcb_core::HostProc::Wide),
                    request.map($crate::tcb_core::HostProc::Wide),
                )
            })
        }

        #[no_mangle]
        pub unsafe extern "system" fn FsFindFirst(
            path: *const u8,
            data: *mut $crate::abi::Win32FindData<u8>,
        ) -> isize {
            let invalid = $crate::dispatch::FindFirstAnswer::invalid(None);
            let answer = TCB_FS_INSTANCE.enter(invalid, |rt| {
                $crate::dispatch::find_first::<$plugin, $crate::tcb_core::Narrow>(rt, path, data)
            });
            if let Some(code) = answer.last_error {
                $crate::abi::set_last_error(code);
            }
            answer.handle
        }

        #[no_mangle]
        pub unsafe extern "system" fn FsFindFirstW(
            path: *const u16,
            data: *mut $crate::abi::Win32FindData<u16>,
        ) -> isize {
            let invalid = $crate::dispatch::FindFirstAnswer::invalid(None);
            let answer = TCB_FS_INSTANCE.enter(invalid, |rt| {
                $crate::dispatch::find_first::<$plugin, $crate::tcb_core::Wide>(rt, path, data)
            });
            if let Some(code) = answer.last_error {
                $crate::abi::set_last_error(code);
            }
            answer.handle
        }

        #[no_mangle]
        pub unsafe extern "system" fn FsFindNext(
            handle: isize,
            data: *mut $crate::abi::Win32FindData<u8>,
        ) -> i32 {
            TCB_FS_INSTANCE.enter(0, |rt| {
                $crate::dispatch::find_next::<$plugin, $crate::tcb_core::Narrow>(rt, handle, data)
            })
        }

        #[no_mangle]
        pub unsafe extern "system" fn FsFindNextW(
            handle: isize,
            data: *mut $crate::abi::Win32FindData<u16>,
        ) -> i32 {
            TCB_FS_INSTANCE.enter(0, |rt| {
                $crate::dispatch::find_next::<$plugin, $crate::tcb_core::Wide>(rt, handle, data)
            })
        }

        #[no_mangle]
        pub extern "system" fn FsFindClose(handle: isize) -> i32 {
            TCB_FS_INSTANCE.enter(0, |rt| $crate::dispatch::find_close(rt, handle))
        }

        #[no_mangle]
        pub unsafe extern "system" fn FsGetFile(
            remote_name: *const u8,
            local_name: *mut u8,
            copy_flags: i32,
            info: *const $crate::abi::RemoteInfoStruct,
        ) -> i32 {
            TCB_FS_INSTANCE.enter(3, |rt| {
                $crate::dispatch::get_file::<$plugin, $crate::tcb_core::Narrow>(
                    rt,
                    remote_name,
                    local_name,
                    copy_flags,
                    info,
                )
            })
        }

        #[no_mangle]
        pub unsafe extern "system" fn FsGetFileW(
            remote_name: *const u16,
            local_name: *mut u16,
            copy_flags: i32,
            info: *const $crate::abi::RemoteInfoStruct,
        ) -> i32 {
            TCB_FS_INSTANCE.enter(3, |rt| {
                $crate::dispatch::get_file::<$plugin, $crate::tcb_core::Wide>(
                    rt,
                    remote_name,
                    local_name,
                    copy_flags,
                    info,
                )
            })
        }

        #[no_mangle]
        pub unsafe extern "system" fn FsPutFile(
            local_name: *const u8,
            remote_name: *mut u8,
            copy_flags: i32,
        ) -> i32 {
            TCB_FS_INSTANCE.enter(4, |rt| {
                $crate::dispatch::put_file::<$plugin, $crate::tcb_core::Narrow>(
                    rt,
                    local_name,
                    remote_name,
                    copy_flags,
                )
            })
        }

        #[no_mangle]
        pub unsafe extern "system" fn FsPutFileW(
            local_name: *const u16,
            remote_name: *mut u16,
            copy_flags: i32,
        ) -> i32 {
            TCB_FS_INSTANCE.enter(4, |rt| {
                $crate::dispatch::put_file::<$plugin, $crate::tcb_core::Wide>(
                    rt,
                    local_name,
                    remote_name,
                    copy_flags,
                )
            })
        }

        #[no_mangle]
        pub unsafe extern "system" fn FsRenMovFile(
            old_name: *const u8,
            new_name: *const u8,
            move_file: i32,
            overwrite: i32,
            info: *const $crate::abi::RemoteInfoStruct,
        ) -> i32 {
            TCB_FS_INSTANCE.enter(4, |rt| {
                $crate::dispatch::ren_mov_file::<$plugin, $crate::tcb_core::Narrow>(
                    rt, old_name, new_name, move_file, overwrite, info,
                )
            })
        }

        #[no_mangle]
        pub unsafe extern "system" fn FsRenMovFileW(
            old_name: *const u16,
            new_name: *const u16,
            move_file: i32,
            overwrite: i32,
            info: *const $crate::abi::RemoteInfoStruct,
        ) -> i32 {
            TCB_FS_INSTANCE.enter(4, |rt| {
                $crate::dispatch::ren_mov_file::<$plugin, $crate::tcb_core::Wide>(
                    rt, old_name, new_name, move_file, overwrite, info,
                )
            })
        }

        #[no_mangle]
        pub unsafe extern "system" fn FsDeleteFile(remote_name: *const u8) -> i32 {
            TCB_FS_INSTANCE.enter(0, |rt| {
                $crate::dispatch::delete_file::<$plugin, $crate::tcb_core::Narrow>(rt, remote_name)
            })
        }

        #[no_mangle]
        pub unsafe extern "system" fn FsDeleteFileW(remote_name: *const u16) -> i32 {
            TCB_FS_INSTANCE.enter(0, |rt| {
                $crate::dispatch::delete_file::<$plugin, $crate::tcb_core::Wide>(rt, remote_name)
            })
        }

        #[no_mangle]
        pub unsafe extern "system" fn FsMkDir(path: *const u8) -> i32 {
            TCB_FS_INSTANCE.enter(0, |rt| {
                $crate::dispatch::mk_dir::<$plugin, $crate::tcb_core::Narrow>(rt, path)
            })
        }

        #[no_mangle]
        pub unsafe extern "system" fn FsMkDirW(path: *const u16) -> i32 {
            TCB_FS_INSTANCE.enter(0, |rt| {
                $crate::dispatch::mk_dir::<$plugin, $crate::tcb_core::Wide>(rt, path)
            })
        }

        #[no_mangle]
        pub unsafe extern "system" fn FsRemoveDir(remote_name: *const u8) -> i32 {
            TCB_FS_INSTANCE.enter(0, |rt| {
                $crate::dispatch::remove_dir::<$plugin, $crate::tcb_core::Narrow>(rt, remote_name)
            })
        }

        #[no_mangle]
        pub unsafe extern "system" fn FsRemoveDirW(remote_name: *const u16) -> i32 {
            TCB_FS_INSTANCE.enter(0, |rt| {
                $crate::dispatch::remove_dir::<$plugin, $crate::tcb_core::Wide>(rt, remote_name)
            })
        }

        #[no_mangle]
        pub unsafe extern "system" fn FsExecuteFile(
            main_win: isize,
            remote_name: *mut u8,
            verb: *const u8,
        ) -> i32 {
            TCB_FS_INSTANCE.enter(1, |rt| {
                $crate::dispatch::execute_file::<$plugin, $crate::tcb_core::Narrow>(
                    rt,
                    main_win,
                    remote_name,
                    verb,
                )
            })
        }

        #[no_mangle]
        pub unsafe extern "system" fn FsExecuteFileW(
            main_win: isize,
            remote_name: *mut u16,
            verb: *const u16,
        ) -> i32 {
            TCB_FS_INSTANCE.enter(1, |rt| {
                $crate::dispatch::execute_file::<$plugin, $crate::tcb_core::Wide>(
                    rt,
                    main_win,
                    remote_name,
                    verb,
                )
            })
        }

        #[no_mangle]
        pub unsafe extern "system" fn FsExtractCustomIcon(
            remote_name: *mut u8,
            extract_flags: i32,
            the_icon: *mut isize,
        ) -> i32 {
            TCB_FS_INSTANCE.enter(0, |rt| {
                $crate::dispatch::extract_custom_icon::<$plugin, $crate::tcb_core::Narrow>(
                    rt,
                    remote_name,
                    extract_flags,
                    the_icon,
                )
            })
        }

        #[no_mangle]
        pub unsafe extern "system" fn FsExtractCustomIconW(
            remote_name: *mut u16,
            extract_flags: i32,
            the_icon: *mut isize,
        ) -> i32 {
            TCB_FS_INSTANCE.enter(0, |rt| {
                $crate::dispatch::extract_custom_icon::<$plugin, $crate::tcb_core::Wide>(
                    rt,
                    remote_name,
                    extract_flags,
                    the_icon,
                )
            })
        }

        #[no_mangle]
        pub unsafe extern "system" fn FsGetPreviewBitmap(
            remote_name: *mut u8,
            width: i32,
            height: i32,
            bitmap: *mut isize,
        ) -> i32 {
            TCB_FS_INSTANCE.enter(0, |rt| {
                $crate::dispatch::get_preview_bitmap::<$plugin, $crate::tcb_core::Narrow>(
                    rt,
                    remote_name,
                    width,
                    height,
                    bitmap,
                )
            })
        }

        #[no_mangle]
        pub unsafe extern "system" fn FsGetPreviewBitmapW(
            remote_name: *mut u16,
            width: i32,
            height: i32,
            bitmap: *mut isize,
        ) -> i32 {
            TCB_FS_INSTANCE.enter(0, |rt| {
                $crate::dispatch::get_preview_bitmap::<$plugin, $crate::tcb_core::Wide>(
                    rt,
                    remote_name,
                    width,
                    height,
                    bitmap,
                )
            })
        }

        #[no_mangle]
        pub unsafe extern "system" fn FsStatusInfo(
            remote_dir: *const u8,
            start_end: i32,
            operation: i32,
        ) {
            TCB_FS_INSTANCE.enter((), |rt| {
                $crate::dispatch::status_info::<$plugin, $crate::tcb_core::Narrow>(
                    rt, remote_dir, start_end, operation,
                )
            })
        }

        #[no_mangle]
        pub unsafe extern "system" fn FsStatusInfoW(
            remote_dir: *const u16,
            start_end: i32,
            operation: i32,
        ) {
            TCB_FS_INSTANCE.enter((), |rt| {
                $crate::dispatch::status_info::<$plugin, $crate::tcb_core::Wide>(
                    rt, remote_dir, start_end, operation,
                )
            })
        }

        #[no_mangle]
        pub extern "system" fn FsSetCryptCallback(
            proc: Option<$crate::abi::FsCryptProcA>,
            crypto_number: i32,
            flags: i32,
        ) {
            TCB_FS_INSTANCE.enter((), |rt| {
                $crate::dispatch::set_crypt_callback(
                    rt,
                    "FsSetCryptCallback",
                    proc.map($crate::tcb_core::HostProc::Narrow),
                    crypto_number,
                    flags,
                )
            })
        }

        #[no_mangle]
        pub extern "system" fn FsSetCryptCallbackW(
            proc: Option<$crate::abi::FsCryptProcW>,
            crypto_number: i32,
            flags: i32,
        ) {
            TCB_FS_INSTANCE.enter((), |rt| {
                $crate::dispatch::set_crypt_callback(
                    rt,
                    "FsSetCryptCallbackW",
                    proc.map($crate::tcb_core::HostProc::Wide),
                    crypto_number,
                    flags,
                )
            })
        }

        #[no_mangle]
        pub extern "system" fn FsGetBackgroundFlags() -> i32 {
            TCB_FS_INSTANCE.enter(0, |rt| $crate::dispatch::get_background_flags(rt))
        }

        #[no_mangle]
        pub unsafe extern "system" fn FsSetDefaultParams(
            params: *const $crate::tcb_core::DefaultParamStruct,
        ) {
            TCB_FS_INSTANCE.enter((), |rt| $crate::dispatch::set_default_params(rt, params))
        }

        #[no_mangle]
        pub unsafe extern "system" fn FsGetDefRootName(name: *mut u8, len: i32) {
            TCB_FS_INSTANCE.enter((), |rt| $crate::dispatch::get_def_root_name(rt, name, len))
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
                TCB_FS_INSTANCE.teardown();
            }
            1
        }

        /// Releases the plugin instance; the `DllMain` hook does the same on
        /// Windows.
        pub fn tcb_fs_teardown() {
            TCB_FS_INSTANCE.teardown();
        }
    };
}
