use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tcb_core::config::BridgeConfig;
use tcb_core::errors::BridgeError;
use tcb_core::handles::{lock_for_release, Handle, HandleTable, Shared};
use tcb_core::instance::{BridgeRuntime, PluginInstance};
use tcb_core::trace::{Funnel, LogSink, Outcome, TraceLevel, TraceSink};

use crate::callbacks::FsCallbacks;
use crate::plugin::{FsPlugin, PluginContext};

/// Everything a started file-system plugin owns.
pub struct FsRuntime<P: FsPlugin> {
    plugin: P,
    listings: HandleTable<Shared<P::Listing>>,
    callbacks: Arc<FsCallbacks>,
    funnel: Funnel,
    config: BridgeConfig,
    closing: AtomicBool,
}

/// Static instance type used by [`export_fs_plugin!`](crate::export_fs_plugin).
pub type FsInstance<P> = PluginInstance<FsRuntime<P>>;

impl<P: FsPlugin> FsRuntime<P> {
    /// Creates the plugin and a funnel writing to `sink`.
    pub fn with_sink(config: BridgeConfig, sink: Arc<dyn TraceSink>) -> Result<Self, BridgeError> {
        let callbacks = Arc::new(FsCallbacks::new());
        let plugin = P::create(PluginContext {
            config: config.clone(),
            callbacks: Arc::clone(&callbacks),
        })?;
        Ok(Self {
            plugin,
            listings: HandleTable::new(),
            callbacks,
            funnel: Funnel::new(sink, config.trace_level),
            config,
            closing: AtomicBool::new(false),
        })
    }

    pub fn plugin(&self) -> &P {
        &self.plugin
    }

    pub fn callbacks(&self) -> &FsCallbacks {
        &self.callbacks
    }

    pub fn funnel(&self) -> &Funnel {
        &self.funnel
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn live_listings(&self) -> usize {
        self.listings.len()
    }

    pub(crate) fn listings(&self) -> &HandleTable<Shared<P::Listing>> {
        &self.listings
    }

    /// Issues a handle for a freshly opened listing. Once shutdown has begun
    /// the listing is closed again and no handle is issued.
    pub(crate) fn admit(&self, listing: Shared<P::Listing>) -> Result<Handle, BridgeError> {
        let handle = self.listings.add(listing);
        if !self.closing.load(Ordering::SeqCst) {
            return Ok(handle);
        }
        if let Some((listing, _)) = self.listings.take(handle) {
            self.release(listing);
        }
        Err(BridgeError::shutting_down("FsFindFirst"))
    }

    fn release(&self, listing: Shared<P::Listing>) {
        self.funnel.run("FsFindClose", TraceLevel::Info, (), |_| {
            self.plugin.find_close(&mut lock_for_release(&listing))?;
            Ok(Outcome::with_detail((), "released at unload"))
        });
    }

    pub(crate) fn listing(&self, raw: isize) -> Option<(Handle, Shared<P::Listing>)> {
        let handle = Handle::from_isize(raw)?;
        Some((handle, self.listings.get(handle)?))
    }
}

impl<P: FsPlugin> BridgeRuntime for FsRuntime<P> {
    fn start(config: BridgeConfig) -> Result<Self, BridgeError> {
        Self::with_sink(config, Arc::new(LogSink))
    }

    /// Closes every listing the host left open.
    fn shutdown(&self) {
        self.closing.store(true, Ordering::SeqCst);
        for listing in self.listings.drain() {
            self.release(listing);
        }
    }
}
