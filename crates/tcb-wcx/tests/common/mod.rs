#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use tcb_core::config::{BridgeConfig, DefaultParams};
use tcb_core::errors::BridgeError;
use tcb_core::strings::{encode_with_nul, HostEncoding};
use tcb_core::trace::{MemorySink, TraceLevel, TraceRecord, TraceSink};
use tcb_wcx::abi::OpenArchiveData;
use tcb_wcx::{
    ArchiveHeader, BackgroundFlag, DataProgress, DeleteRequest, MemPackOptions, MemPackStep,
    NextHeader, OpenRequest, Opened, PackRequest, PackerCallbacks, PackerCapability, PackerPlugin,
    PackerRuntime, PackerStatus, PluginContext, ProcessOperation,
};

/// Cursor over a fixed in-memory catalogue.
pub struct DemoArchive {
    pub entries: Vec<ArchiveHeader>,
    pub cursor: usize,
}

/// Identity "compressor": output mirrors input.
pub struct DemoMemPack {
    pub pending: Vec<u8>,
    pub finished: bool,
}

pub struct DemoPacker {
    callbacks: Arc<PackerCallbacks>,
    pub extracted: Mutex<Vec<(ProcessOperation, Option<PathBuf>)>>,
    pub packed: Mutex<Vec<PackRequest>>,
    pub deleted: Mutex<Vec<DeleteRequest>>,
    pub defaults: Mutex<Option<DefaultParams>>,
    pub closed: Mutex<usize>,
}

pub fn catalogue(arc_name: &str) -> Vec<ArchiveHeader> {
    let mut readme = ArchiveHeader::file("readme.txt", 3);
    readme.archive_name = arc_name.to_string();
    readme.modified = NaiveDate::from_ymd_opt(2000, 1, 1).and_then(|d| d.and_hms_opt(0, 0, 0));
    let mut docs = ArchiveHeader::directory("docs");
    docs.archive_name = arc_name.to_string();
    let mut big = ArchiveHeader::file("docs/big.iso", 0x1_2345_6789);
    big.archive_name = arc_name.to_string();
    vec![readme, docs, big]
}

impl PackerPlugin for DemoPacker {
    type Archive = DemoArchive;
    type MemPack = DemoMemPack;

    fn create(context: PluginContext) -> Result<Self, BridgeError> {
        Ok(Self {
            callbacks: context.callbacks,
            extracted: Mutex::new(Vec::new()),
            packed: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
            defaults: Mutex::new(None),
            closed: Mutex::new(0),
        })
    }

    fn capabilities(&self) -> Vec<PackerCapability> {
        vec![
            PackerCapability::New,
            PackerCapability::Multiple,
            PackerCapability::Delete,
            PackerCapability::MemPack,
        ]
    }

    fn open_archive(&self, request: OpenRequest) -> Result<Opened<DemoArchive>, BridgeError> {
        let name = request.arc_name.display().to_string();
        if name.contains("boom") {
            panic!("corrupt central directory");
        }
        if name.contains("missing") {
            return Ok(Opened::refused(PackerStatus::UnknownFormat));
        }
        Ok(Opened::archive(DemoArchive {
            entries: catalogue(&name),
            cursor: 0,
        }))
    }

    fn read_header(&self, archive: &mut DemoArchive) -> Result<NextHeader, BridgeError> {
        match archive.entries.get(archive.cursor) {
            Some(entry) => {
                archive.cursor += 1;
                Ok(NextHeader::entry(entry.clone()))
            }
            None => Ok(NextHeader::end()),
        }
    }

    fn process_file(
        &self,
        archive: &mut DemoArchive,
        operation: ProcessOperation,
        target: Option<PathBuf>,
    ) -> Result<PackerStatus, BridgeError> {
        let current = archive
            .cursor
            .checked_sub(1)
            .and_then(|index| archive.entries.get(index))
            .map(|entry| entry.file_name.clone())
            .unwrap_or_default();
        let progress = DataProgress::Bytes(3);
        if operation == ProcessOperation::Extract
            && self.callbacks.process_data(&current, progress).is_abort()
        {
            return Ok(PackerStatus::Aborted);
        }
        self.extracted
            .lock()
            .expect("extracted log")
            .push((operation, target));
        Ok(PackerStatus::Ok)
    }

    fn close_archive(&self, _archive: &mut DemoArchive) -> Result<PackerStatus, BridgeError> {
        *self.closed.lock().expect("close counter") += 1;
        Ok(PackerStatus::Ok)
    }

    fn pack_files(&self, request: PackRequest) -> Result<PackerStatus, BridgeError> {
        if request.files.is_empty() {
            return Ok(PackerStatus::NoFiles);
        }
        self.packed.lock().expect("pack log").push(request);
        Ok(PackerStatus::Ok)
    }

    fn delete_files(&self, request: DeleteRequest) -> Result<PackerStatus, BridgeError> {
        self.deleted.lock().expect("delete log").push(request);
        Ok(PackerStatus::Ok)
    }

    fn can_handle_file(&self, file_name: &Path) -> Result<bool, BridgeError> {
        Ok(file_name.extension().is_some_and(|ext| ext == "arc"))
    }

    fn start_mem_pack(
        &self,
        _options: MemPackOptions,
        file_name: &str,
    ) -> Result<Option<DemoMemPack>, BridgeError> {
        if file_name.is_empty() {
            return Ok(None);
        }
        Ok(Some(DemoMemPack {
            pending: Vec::new(),
            finished: false,
        }))
    }

    fn pack_to_mem(
        &self,
        session: &mut DemoMemPack,
        input: &[u8],
        output: &mut [u8],
        _seek_by: i32,
    ) -> Result<MemPackStep, BridgeError> {
        session.pending.extend_from_slice(input);
        let count = session.pending.len().min(output.len());
        output[..count].copy_from_slice(&session.pending[..count]);
        session.pending.drain(..count);
        if input.is_empty() && session.pending.is_empty() {
            session.finished = true;
            return Ok(MemPackStep::done(0, count));
        }
        Ok(MemPackStep::proceed(input.len(), count))
    }

    fn done_mem_pack(&self, session: &mut DemoMemPack) -> Result<PackerStatus, BridgeError> {
        Ok(if session.finished {
            PackerStatus::Ok
        } else {
            PackerStatus::ErrorWrite
        })
    }

    fn set_default_params(&self, params: &DefaultParams) -> Result<(), BridgeError> {
        *self.defaults.lock().expect("defaults") = Some(params.clone());
        Ok(())
    }

    fn background_flags(&self) -> Vec<BackgroundFlag> {
        vec![BackgroundFlag::Unpack, BackgroundFlag::Pack]
    }
}

pub fn config() -> BridgeConfig {
    BridgeConfig {
        plugin_name: "demo".to_string(),
        trace_level: TraceLevel::Verbose,
        ..BridgeConfig::default()
    }
}

pub fn fault_code(record: &TraceRecord) -> Option<&str> {
    record.fault.as_ref().map(|fault| fault.code())
}

pub fn runtime<P: PackerPlugin>() -> (PackerRuntime<P>, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    let dyn_sink: Arc<dyn TraceSink> = sink.clone();
    let runtime = PackerRuntime::with_sink(config(), dyn_sink).expect("runtime starts");
    (runtime, sink)
}

/// Owns the encoded archive name so the pointer in the block stays valid.
pub struct OpenBlock<E: HostEncoding> {
    pub name: Vec<E::Unit>,
    pub data: OpenArchiveData<E::Unit>,
}

impl<E: HostEncoding> OpenBlock<E> {
    pub fn new(arc_name: &str, mode: i32) -> Box<Self> {
        let name = encode_with_nul::<E>(arc_name);
        let mut block = Box::new(Self {
            data: OpenArchiveData::new(std::ptr::null(), mode),
            name,
        });
        block.data.arc_name = block.name.as_ptr();
        block
    }
}
