//! Export and import orchestration.
//!
//! A [`Bridge`] owns the configuration, the metadata store, the negotiator
//! and the interchange codec for one host session. Export and import run
//! synchronously to completion and always hand the host back with the
//! selection and mode it had before.

pub mod export;
pub mod guard;
pub mod import;

pub use export::ExportBatch;
pub use guard::SelectionGuard;
pub use import::{ImportFailure, ImportReport, ImportWarning, ObjectUpdate};

use crate::config::BridgeConfig;
use crate::interchange::{Interchange, JsonInterchange};
use crate::negotiator::{Launcher, Negotiator, ProcessLauncher};
use crate::storage::RecordStore;

/// Round-trip coordinator between a host and the external tool.
pub struct Bridge<S: RecordStore, L: Launcher = ProcessLauncher> {
    config: BridgeConfig,
    store: S,
    negotiator: Negotiator<L>,
    codec: Box<dyn Interchange>,
}

impl<S: RecordStore> Bridge<S> {
    /// Creates a bridge using the JSON interchange codec and real process
    /// launches.
    pub fn new(config: BridgeConfig, store: S) -> Self {
        let negotiator = Negotiator::new(&config);
        Self::with_negotiator(config, store, negotiator)
    }
}

impl<S: RecordStore, L: Launcher> Bridge<S, L> {
    /// Creates a bridge with a custom negotiator.
    pub fn with_negotiator(config: BridgeConfig, store: S, negotiator: Negotiator<L>) -> Self {
        Self {
            config,
            store,
            negotiator,
            codec: Box::new(JsonInterchange::new()),
        }
    }

    /// Replaces the interchange codec.
    #[must_use]
    pub fn with_codec(mut self, codec: Box<dyn Interchange>) -> Self {
        self.codec = codec;
        self
    }

    /// Configuration in use.
    pub const fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Metadata store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Mutable metadata store.
    pub const fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Negotiator in use.
    pub const fn negotiator(&self) -> &Negotiator<L> {
        &self.negotiator
    }
}
