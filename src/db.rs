//! LMDB environment handle and store construction.
//!
//! A [`StateEnv`] owns one LMDB environment plus the pair of lookup tables
//! shared by every schema store created from it. Stores are chosen at
//! construction time, one concrete store type per schema, and all of them
//! write through the same environment under LMDB's single-writer model:
//! at most one write transaction is open at a time, while readers observe
//! consistent MVCC snapshots.

use std::path::Path;

use heed::{Env, EnvOpenOptions, RoTxn, RwTxn};
use tracing::info;

use crate::codec::TimeCodec;
use crate::error::Result;
use crate::lookup::LookupTables;
use crate::schema::{
    RangeStateStore, RangeWidth, SessionStore, StateStore, TemporalRangeStateStore,
};
use crate::value::ValueCodec;

/// Hard maximum key length imposed by the engine. Every composed key must
/// fit; the value codec's hash threshold is derived from it.
pub const MAX_KEY_LENGTH: usize = 511;

/// Configuration for opening a state environment.
#[derive(Debug, Clone)]
pub struct StateEnvOptions {
    /// Maximum size of the LMDB memory map in bytes.
    pub map_size: usize,

    /// Maximum number of named databases. Each schema store uses one; the
    /// lookup tables use three.
    pub max_dbs: u32,
}

impl Default for StateEnvOptions {
    fn default() -> Self {
        Self {
            map_size: 256 * 1024 * 1024,
            max_dbs: 32,
        }
    }
}

/// The shared environment behind every schema store.
#[derive(Debug)]
pub struct StateEnv {
    env: Env,
    lookups: LookupTables,
}

impl StateEnv {
    /// Opens or creates the environment at `path` and its lookup tables.
    ///
    /// # Errors
    ///
    /// Any I/O or engine failure here is fatal; there is no partially opened
    /// environment.
    pub fn open(path: impl AsRef<Path>, options: StateEnvOptions) -> Result<Self> {
        let path = path.as_ref();
        std::fs::create_dir_all(path)?;

        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(options.map_size)
                .max_dbs(options.max_dbs)
                .open(path)?
        };

        let mut txn = env.write_txn()?;
        let lookups = LookupTables::open(&env, &mut txn)?;
        txn.commit()?;

        info!(path = %path.display(), "opened state environment");
        Ok(Self { env, lookups })
    }

    /// Begins a read transaction (an MVCC snapshot).
    pub fn read_txn(&self) -> Result<RoTxn<'_>> {
        Ok(self.env.read_txn()?)
    }

    /// Begins the write transaction. LMDB serializes writers, so this blocks
    /// while another write transaction is open.
    pub fn write_txn(&self) -> Result<RwTxn<'_>> {
        Ok(self.env.write_txn()?)
    }

    /// The lookup tables shared by all stores in this environment.
    pub fn lookups(&self) -> &LookupTables {
        &self.lookups
    }

    pub(crate) fn value_codec(&self) -> ValueCodec {
        ValueCodec::new(self.lookups.clone())
    }

    pub(crate) fn env(&self) -> &Env {
        &self.env
    }

    /// Creates or opens a plain key/value state store named `name`.
    pub fn state_store(&self, name: &str) -> Result<StateStore> {
        StateStore::open(self, name)
    }

    /// Creates or opens a range state store with the given key width.
    pub fn range_store(&self, name: &str, width: RangeWidth) -> Result<RangeStateStore> {
        RangeStateStore::open(self, name, width)
    }

    /// Creates or opens a temporal range state store. `time_codec` fixes the
    /// effective-time encoding for the lifetime of the table.
    pub fn temporal_store(
        &self,
        name: &str,
        width: RangeWidth,
        time_codec: TimeCodec,
    ) -> Result<TemporalRangeStateStore> {
        TemporalRangeStateStore::open(self, name, width, time_codec)
    }

    /// Creates or opens a session store. `time_codec` fixes the start/end
    /// encoding and therefore the maximum session key length.
    pub fn session_store(&self, name: &str, time_codec: TimeCodec) -> Result<SessionStore> {
        SessionStore::open(self, name, time_codec)
    }
}
