//! Wallet-to-profile identity resolution.
//!
//! Reconciles the connected wallet address, the local cache, and the remote
//! store into a single `(profiles, active profile)` view.  Resolution order:
//!
//! 1. No wallet: in-memory identity state is cleared; cached entries stay on
//!    disk but are not consulted.
//! 2. Fresh cache snapshot: used as-is, no store access.
//! 3. Otherwise: one store query, then the snapshot and the in-memory state
//!    are refreshed together.
//!
//! Store failures leave the previous in-memory state untouched and surface
//! as an error value; they never panic past this boundary.
//!
//! Every resolution bumps a generation counter, and deferred commits carry
//! the generation they started from.  A commit whose generation is stale, or
//! whose wallet is no longer the connected one, is dropped — an in-flight
//! fetch for a wallet that has since disconnected cannot repopulate state.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::cache::ProfileCache;
use crate::logging;
use crate::mlog;
use crate::profile::Profile;
use crate::store::{CommunityStore, StoreError};
use crate::wallet::{normalize_address, WalletConnector, WalletError};

/// Resolver policy knobs.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Whether an empty store result is cached.  Caching it avoids
    /// re-querying the store on every navigation for a wallet with no
    /// profiles yet, at the cost of a stale "no profiles" view for up to one
    /// TTL after the first profile is created elsewhere.
    pub cache_empty_results: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cache_empty_results: true,
        }
    }
}

#[derive(Debug)]
pub enum SessionError {
    Store(StoreError),
    Wallet(WalletError),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::Store(e) => write!(f, "store error: {e}"),
            SessionError::Wallet(e) => write!(f, "wallet error: {e}"),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<StoreError> for SessionError {
    fn from(e: StoreError) -> Self {
        SessionError::Store(e)
    }
}

/// Where a resolution's data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolveSource {
    Disconnected,
    Cache,
    Store,
}

/// Result of a settled resolution.
#[derive(Debug, Clone)]
pub struct ResolveOutcome {
    pub source: ResolveSource,
    pub profile_count: usize,
    pub active_profile_id: Option<String>,
}

/// Result of the cache-only resolution phase.
#[derive(Debug)]
pub enum CacheLookup {
    /// Resolution finished without touching the store.
    Settled(ResolveOutcome),
    /// The caller must fetch from the store and hand the result to
    /// [`Session::commit_profiles`] with this wallet and generation.
    NeedsFetch { wallet: String, generation: u64 },
}

/// Per-session identity state.  Single-writer: the embedding application
/// serializes access (the web layer holds it behind one mutex).
pub struct Session {
    config: SessionConfig,
    cache: ProfileCache,
    wallet: Option<String>,
    profiles: Vec<Profile>,
    active_id: Option<String>,
    generation: u64,
    loading: bool,
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

impl Session {
    pub fn new(cache: ProfileCache, config: SessionConfig) -> Self {
        Self {
            config,
            cache,
            wallet: None,
            profiles: Vec::new(),
            active_id: None,
            generation: 0,
            loading: false,
        }
    }

    pub fn wallet(&self) -> Option<&str> {
        self.wallet.as_deref()
    }

    pub fn profiles(&self) -> &[Profile] {
        &self.profiles
    }

    pub fn active_profile_id(&self) -> Option<&str> {
        self.active_id.as_deref()
    }

    /// The active profile, always a member of the current list.
    pub fn active_profile(&self) -> Option<&Profile> {
        self.active_id
            .as_deref()
            .and_then(|id| self.profiles.iter().find(|p| p.id == id))
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn outcome(&self, source: ResolveSource) -> ResolveOutcome {
        ResolveOutcome {
            source,
            profile_count: self.profiles.len(),
            active_profile_id: self.active_id.clone(),
        }
    }

    /// Install a profile list and pick the active entry: the persisted
    /// selection when still present in the list, else the first profile.
    fn install(&mut self, wallet: &str, profiles: Vec<Profile>) {
        self.profiles = profiles;
        let selected = self
            .cache
            .selected_profile(wallet)
            .ok()
            .flatten()
            .filter(|id| self.profiles.iter().any(|p| &p.id == id));
        self.active_id = selected.or_else(|| self.profiles.first().map(|p| p.id.clone()));
    }

    /// Cache-only resolution phase.  Bumps the generation, records the
    /// wallet, and either settles from the cache or asks the caller to
    /// fetch.  Cache read failures degrade to a miss.
    pub fn resolve_cached(&mut self, wallet: Option<&str>) -> CacheLookup {
        self.generation += 1;

        let Some(wallet) = wallet else {
            self.wallet = None;
            self.profiles.clear();
            self.active_id = None;
            self.loading = false;
            return CacheLookup::Settled(self.outcome(ResolveSource::Disconnected));
        };

        let wallet = normalize_address(wallet);
        self.wallet = Some(wallet.clone());

        let cached = match self.cache.fresh_profiles(&wallet, now_secs()) {
            Ok(hit) => hit,
            Err(e) => {
                mlog!("cache: read failed for {}: {}", logging::addr(&wallet), e);
                None
            }
        };

        match cached {
            Some(profiles) => {
                self.install(&wallet, profiles);
                self.loading = false;
                mlog!(
                    "resolve: cache hit for {} ({} profile(s))",
                    logging::addr(&wallet),
                    self.profiles.len()
                );
                CacheLookup::Settled(self.outcome(ResolveSource::Cache))
            }
            None => {
                self.loading = true;
                CacheLookup::NeedsFetch {
                    wallet,
                    generation: self.generation,
                }
            }
        }
    }

    /// Apply a fetched profile list.  Returns `None` and changes nothing
    /// when the result is stale: the generation moved on or the wallet is no
    /// longer the connected one.
    pub fn commit_profiles(
        &mut self,
        wallet: &str,
        generation: u64,
        profiles: Vec<Profile>,
    ) -> Option<ResolveOutcome> {
        if generation != self.generation || self.wallet.as_deref() != Some(wallet) {
            mlog!(
                "resolve: dropping stale store result for {} (generation {} != {})",
                logging::addr(wallet),
                generation,
                self.generation
            );
            return None;
        }

        if !profiles.is_empty() || self.config.cache_empty_results {
            if let Err(e) = self.cache.store_snapshot(wallet, &profiles, now_secs()) {
                mlog!("cache: write failed for {}: {}", logging::addr(wallet), e);
            }
        }

        self.install(wallet, profiles);
        self.loading = false;
        mlog!(
            "resolve: {} profile(s) from store for {}",
            self.profiles.len(),
            logging::addr(wallet)
        );
        Some(self.outcome(ResolveSource::Store))
    }

    /// Note a failed fetch.  In-memory state is left as it was; only the
    /// loading flag is cleared, and only when the fetch is still current.
    pub fn fetch_failed(&mut self, wallet: &str, generation: u64) {
        if generation == self.generation && self.wallet.as_deref() == Some(wallet) {
            self.loading = false;
        }
        mlog!("resolve: store fetch failed for {}", logging::addr(wallet));
    }

    /// One-call resolution: cache phase plus, on a miss, a blocking store
    /// fetch through the same commit path.
    pub fn resolve(
        &mut self,
        store: &dyn CommunityStore,
        wallet: Option<&str>,
    ) -> Result<ResolveOutcome, SessionError> {
        match self.resolve_cached(wallet) {
            CacheLookup::Settled(outcome) => Ok(outcome),
            CacheLookup::NeedsFetch { wallet, generation } => {
                match store.profiles_by_wallet(&wallet) {
                    Ok(profiles) => match self.commit_profiles(&wallet, generation, profiles) {
                        Some(outcome) => Ok(outcome),
                        // Nothing can interleave while we hold &mut self.
                        None => Ok(self.outcome(ResolveSource::Store)),
                    },
                    Err(e) => {
                        self.fetch_failed(&wallet, generation);
                        Err(SessionError::Store(e))
                    }
                }
            }
        }
    }

    /// Make `profile_id` the active profile and persist the choice for this
    /// wallet.  An id that is not in the current list is a logged no-op:
    /// a stale switch request must never corrupt state.
    pub fn switch_profile(&mut self, profile_id: &str) -> bool {
        if !self.profiles.iter().any(|p| p.id == profile_id) {
            mlog!(
                "switch: ignoring unknown profile {}",
                logging::item_id(profile_id)
            );
            return false;
        }
        self.active_id = Some(profile_id.to_string());
        if let Some(wallet) = self.wallet.clone() {
            if let Err(e) = self
                .cache
                .set_selected_profile(&wallet, profile_id, now_secs())
            {
                mlog!("cache: selection write failed for {}: {}", logging::addr(&wallet), e);
            }
        }
        mlog!("switch: active profile now {}", logging::item_id(profile_id));
        true
    }

    /// Full logout: every cached entry for every wallet is dropped, the
    /// in-memory identity resets, and the connector is asked to disconnect.
    /// Idempotent.
    pub fn logout(&mut self, connector: &mut dyn WalletConnector) -> Result<(), SessionError> {
        if let Err(e) = self.cache.clear_all() {
            mlog!("cache: clear failed during logout: {}", e);
        }
        self.generation += 1;
        self.wallet = None;
        self.profiles.clear();
        self.active_id = None;
        self.loading = false;
        connector.disconnect().map_err(SessionError::Wallet)?;
        mlog!("logout: session cleared");
        Ok(())
    }

    /// Drop the cached snapshot for a wallet so the next resolve refetches,
    /// e.g. right after a profile was created for it.
    pub fn invalidate_wallet(&mut self, wallet: &str) {
        let wallet = normalize_address(wallet);
        if let Err(e) = self.cache.invalidate_snapshot(&wallet) {
            mlog!("cache: invalidate failed for {}: {}", logging::addr(&wallet), e);
        }
    }
}
