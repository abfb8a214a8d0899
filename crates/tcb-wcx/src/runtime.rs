use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tcb_core::config::BridgeConfig;
use tcb_core::errors::BridgeError;
use tcb_core::handles::{lock_for_release, Handle, HandleTable, Shared};
use tcb_core::instance::{BridgeRuntime, PluginInstance};
use tcb_core::trace::{Funnel, LogSink, Outcome, TraceLevel, TraceSink};

use crate::callbacks::PackerCallbacks;
use crate::plugin::{PackerPlugin, PluginContext};
use crate::status::PackerStatus;

/// Session object stored behind a packer handle.
pub enum PackerSession<P: PackerPlugin> {
    Archive(Shared<P::Archive>),
    MemPack(Shared<P::MemPack>),
}

impl<P: PackerPlugin> Clone for PackerSession<P> {
    fn clone(&self) -> Self {
        match self {
            PackerSession::Archive(archive) => PackerSession::Archive(Arc::clone(archive)),
            PackerSession::MemPack(session) => PackerSession::MemPack(Arc::clone(session)),
        }
    }
}

/// Everything a started packer plugin owns.
pub struct PackerRuntime<P: PackerPlugin> {
    plugin: P,
    sessions: HandleTable<PackerSession<P>>,
    callbacks: Arc<PackerCallbacks>,
    funnel: Funnel,
    config: BridgeConfig,
    closing: AtomicBool,
}

/// Static instance type used by [`export_packer_plugin!`](crate::export_packer_plugin).
pub type PackerInstance<P> = PluginInstance<PackerRuntime<P>>;

impl<P: PackerPlugin> PackerRuntime<P> {
    /// Creates the plugin and a funnel writing to `sink`.
    pub fn with_sink(config: BridgeConfig, sink: Arc<dyn TraceSink>) -> Result<Self, BridgeError> {
        let callbacks = Arc::new(PackerCallbacks::new());
        let plugin = P::create(PluginContext {
            config: config.clone(),
            callbacks: Arc::clone(&callbacks),
        })?;
        Ok(Self {
            plugin,
            sessions: HandleTable::new(),
            callbacks,
            funnel: Funnel::new(sink, config.trace_level),
            config,
            closing: AtomicBool::new(false),
        })
    }

    pub fn plugin(&self) -> &P {
        &self.plugin
    }

    pub fn callbacks(&self) -> &PackerCallbacks {
        &self.callbacks
    }

    pub fn funnel(&self) -> &Funnel {
        &self.funnel
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn live_sessions(&self) -> usize {
        self.sessions.len()
    }

    pub(crate) fn sessions(&self) -> &HandleTable<PackerSession<P>> {
        &self.sessions
    }

    /// Issues a handle for a freshly opened session. Once shutdown has begun
    /// the session is closed again and no handle is issued.
    pub(crate) fn admit(
        &self,
        operation: &str,
        session: PackerSession<P>,
    ) -> Result<Handle, BridgeError> {
        let handle = self.sessions.add(session);
        if !self.closing.load(Ordering::SeqCst) {
            return Ok(handle);
        }
        if let Some((session, _)) = self.sessions.take(handle) {
            self.release(session);
        }
        Err(BridgeError::shutting_down(operation))
    }

    fn release(&self, session: PackerSession<P>) {
        match session {
            PackerSession::Archive(archive) => {
                self.funnel.run(
                    "CloseArchive",
                    TraceLevel::Info,
                    PackerStatus::ErrorClose,
                    |_| {
                        let status = self.plugin.close_archive(&mut lock_for_release(&archive))?;
                        Ok(Outcome::with_detail(status, "released at unload"))
                    },
                );
            }
            PackerSession::MemPack(session) => {
                self.funnel.run(
                    "DoneMemPack",
                    TraceLevel::Info,
                    PackerStatus::ErrorClose,
                    |_| {
                        let status = self.plugin.done_mem_pack(&mut lock_for_release(&session))?;
                        Ok(Outcome::with_detail(status, "released at unload"))
                    },
                );
            }
        }
    }

    pub(crate) fn archive(&self, raw: isize) -> Option<(Handle, Shared<P::Archive>)> {
        let handle = Handle::from_isize(raw)?;
        match self.sessions.get(handle)? {
            PackerSession::Archive(archive) => Some((handle, archive)),
            PackerSession::MemPack(_) => None,
        }
    }

    pub(crate) fn mem_pack(&self, raw: isize) -> Option<(Handle, Shared<P::MemPack>)> {
        let handle = Handle::from_isize(raw)?;
        match self.sessions.get(handle)? {
            PackerSession::MemPack(session) => Some((handle, session)),
            PackerSession::Archive(_) => None,
        }
    }
}

impl<P: PackerPlugin> BridgeRuntime for PackerRuntime<P> {
    fn start(config: BridgeConfig) -> Result<Self, BridgeError> {
        Self::with_sink(config, Arc::new(LogSink))
    }

    /// Closes every session the host left open.
    fn shutdown(&self) {
        self.closing.store(true, Ordering::SeqCst);
        for session in self.sessions.drain() {
            self.release(session);
        }
    }
}
