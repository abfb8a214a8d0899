#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};
use tcb_core::callbacks::MAX_PATH;
use tcb_core::config::{BridgeConfig, DefaultParams};
use tcb_core::errors::BridgeError;
use tcb_core::strings::{write_fixed, HostEncoding};
use tcb_core::trace::{MemorySink, TraceLevel, TraceSink};
use tcb_wfx::{
    BitmapHandle, BitmapOutcome, ExecOutcome, ExecRequest, ExecVerb, FileTransfer, FindEntry,
    FindFirst, FsBackgroundFlag, FsCallbacks, FsPlugin, FsRuntime, FsStatus, GetFileRequest,
    IconFlags, IconHandle, IconOutcome, LogKind, PluginContext, PutFileRequest, RenMovRequest,
    StatusOperation, StatusPhase,
};

pub struct DemoListing {
    pub rest: VecDeque<FindEntry>,
}

/// A small fixed tree: `\` holds four entries, `\photos` is empty.
pub struct DemoFs {
    callbacks: Arc<FsCallbacks>,
    pub inits: Mutex<usize>,
    pub closed: Mutex<usize>,
    pub fetched: Mutex<Vec<GetFileRequest>>,
    pub stored: Mutex<Vec<PutFileRequest>>,
    pub moved: Mutex<Vec<RenMovRequest>>,
    pub created: Mutex<Vec<String>>,
    pub executed: Mutex<Vec<ExecRequest>>,
    pub statuses: Mutex<Vec<(String, StatusPhase, StatusOperation)>>,
    pub icons: Mutex<Vec<String>>,
    pub previews: Mutex<Vec<String>>,
    pub defaults: Mutex<Option<DefaultParams>>,
}

pub fn readme_modified() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2001, 2, 3, 4, 5, 6)
        .single()
        .expect("valid date")
}

pub fn root_entries() -> Vec<FindEntry> {
    let mut script = FindEntry::file("run.sh", 40);
    script.unix_mode = Some(0o755);
    vec![
        FindEntry::file("readme.txt", 12).modified_at(readme_modified()),
        FindEntry::directory("photos"),
        FindEntry::file("big.iso", 0x1_0000_0010),
        script,
    ]
}

impl FsPlugin for DemoFs {
    type Listing = DemoListing;

    fn create(context: PluginContext) -> Result<Self, BridgeError> {
        Ok(Self {
            callbacks: context.callbacks,
            inits: Mutex::new(0),
            closed: Mutex::new(0),
            fetched: Mutex::new(Vec::new()),
            stored: Mutex::new(Vec::new()),
            moved: Mutex::new(Vec::new()),
            created: Mutex::new(Vec::new()),
            executed: Mutex::new(Vec::new()),
            statuses: Mutex::new(Vec::new()),
            icons: Mutex::new(Vec::new()),
            previews: Mutex::new(Vec::new()),
            defaults: Mutex::new(None),
        })
    }

    fn init(&self) -> Result<(), BridgeError> {
        *self.inits.lock().expect("init counter") += 1;
        Ok(())
    }

    fn find_first(&self, path: &str) -> Result<FindFirst<DemoListing>, BridgeError> {
        match path {
            "\\" => {
                let mut rest: VecDeque<FindEntry> = root_entries().into();
                let first = rest.pop_front().expect("root is not empty");
                Ok(FindFirst::found(first, DemoListing { rest }))
            }
            "\\photos" => Ok(FindFirst::empty()),
            "\\boom" => panic!("listing exploded"),
            _ => Ok(FindFirst::not_found()),
        }
    }

    fn find_next(&self, listing: &mut DemoListing) -> Result<Option<FindEntry>, BridgeError> {
        Ok(listing.rest.pop_front())
    }

    fn find_close(&self, _listing: &mut DemoListing) -> Result<(), BridgeError> {
        *self.closed.lock().expect("close counter") += 1;
        Ok(())
    }

    fn get_file(&self, request: GetFileRequest) -> Result<FileTransfer, BridgeError> {
        let remote = request.remote_name.clone();
        let local = request.local_name.display().to_string();
        let flags = request.flags;
        self.fetched.lock().expect("fetch log").push(request);
        if !remote.ends_with(".txt") && !remote.ends_with(".iso") {
            return Ok(FileTransfer::failed(FsStatus::NotFound));
        }
        if flags.target_exists() && !flags.overwrite() {
            return Ok(FileTransfer::failed(FsStatus::Exists));
        }
        if self.callbacks.progress(&remote, &local, 100).is_abort() {
            return Ok(FileTransfer::failed(FsStatus::UserAbort));
        }
        if remote.ends_with(".iso") {
            return Ok(FileTransfer::renamed(format!("{local}.part")));
        }
        Ok(FileTransfer::ok())
    }

    fn put_file(&self, request: PutFileRequest) -> Result<FileTransfer, BridgeError> {
        let remote = request.remote_name.clone();
        self.stored.lock().expect("store log").push(request);
        if remote.contains(':') {
            return Ok(FileTransfer::renamed(remote.replace(':', "_")));
        }
        Ok(FileTransfer::ok())
    }

    fn rename_move(&self, request: RenMovRequest) -> Result<FsStatus, BridgeError> {
        let status = if request.old_name == request.new_name {
            FsStatus::Exists
        } else {
            FsStatus::Ok
        };
        self.moved.lock().expect("move log").push(request);
        Ok(status)
    }

    fn delete_file(&self, remote_name: &str) -> Result<bool, BridgeError> {
        Ok(remote_name == "\\readme.txt")
    }

    fn make_dir(&self, path: &str) -> Result<bool, BridgeError> {
        self.callbacks.log(LogKind::OperationComplete, &format!("mkdir {path}"));
        self.created.lock().expect("mkdir log").push(path.to_string());
        Ok(true)
    }

    fn remove_dir(&self, remote_name: &str) -> Result<bool, BridgeError> {
        Ok(remote_name == "\\photos")
    }

    fn execute(&self, request: ExecRequest) -> Result<ExecOutcome, BridgeError> {
        let outcome = match (&request.verb, request.remote_name.as_str()) {
            (ExecVerb::Open, "\\link") => ExecOutcome::symlink("\\photos"),
            (ExecVerb::Open, _) => ExecOutcome::yourself(),
            (ExecVerb::Properties, _) | (ExecVerb::Chmod(_), _) => ExecOutcome::ok(),
            (ExecVerb::Quote(_), _) | (ExecVerb::Other(_), _) => ExecOutcome::error(),
        };
        self.executed.lock().expect("exec log").push(request);
        Ok(outcome)
    }

    fn extract_icon(
        &self,
        remote_name: &str,
        flags: IconFlags,
    ) -> Result<IconOutcome, BridgeError> {
        self.icons
            .lock()
            .expect("icon log")
            .push(remote_name.to_string());
        Ok(match remote_name {
            "\\photos" if flags.small() => {
                IconOutcome::extracted(IconHandle(0x77), Some("folder-small".into()))
            }
            "\\photos" => IconOutcome::extracted_destroy(IconHandle(0x78), None),
            "\\slow" => IconOutcome::delayed(),
            _ => IconOutcome::use_default(),
        })
    }

    fn preview_bitmap(
        &self,
        remote_name: &str,
        width: i32,
        _height: i32,
    ) -> Result<BitmapOutcome, BridgeError> {
        self.previews
            .lock()
            .expect("preview log")
            .push(remote_name.to_string());
        Ok(match remote_name {
            "\\readme.txt" => BitmapOutcome::extract_yourself("C:\\cache\\readme.png", true),
            "\\photos" if width > 0 => {
                BitmapOutcome::extracted(BitmapHandle(0x99), Some("thumb".into()), false)
            }
            _ => BitmapOutcome::none(),
        })
    }

    fn status_info(
        &self,
        remote_dir: &str,
        phase: StatusPhase,
        operation: StatusOperation,
    ) -> Result<(), BridgeError> {
        self.statuses
            .lock()
            .expect("status log")
            .push((remote_dir.to_string(), phase, operation));
        Ok(())
    }

    fn background_flags(&self) -> Vec<FsBackgroundFlag> {
        vec![FsBackgroundFlag::Download, FsBackgroundFlag::AskUser]
    }

    fn set_default_params(&self, params: &DefaultParams) -> Result<(), BridgeError> {
        *self.defaults.lock().expect("defaults") = Some(params.clone());
        Ok(())
    }

    fn root_name(&self) -> Option<String> {
        Some("Demo FS".to_string())
    }
}

pub fn config() -> BridgeConfig {
    BridgeConfig {
        plugin_name: "demo".to_string(),
        trace_level: TraceLevel::Verbose,
        ..BridgeConfig::default()
    }
}

pub fn runtime<P: FsPlugin>() -> (FsRuntime<P>, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    let dyn_sink: Arc<dyn TraceSink> = sink.clone();
    let runtime = FsRuntime::with_sink(config(), dyn_sink).expect("runtime starts");
    (runtime, sink)
}

/// A `MAX_PATH` buffer pre-filled with `text`, as the host passes names it
/// allows the plugin to rewrite.
pub fn name_buffer<E: HostEncoding>(text: &str) -> Vec<E::Unit> {
    let mut buffer = vec![E::Unit::default(); MAX_PATH];
    write_fixed::<E>(&mut buffer, Some(text));
    buffer
}
