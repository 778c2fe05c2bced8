//! Local profile cache.
//!
//! Persists a per-wallet snapshot of the profile list plus the user's last
//! active-profile selection, so a reconnect within the freshness window needs
//! no store round-trip.  The cache is advisory only: every consumer treats a
//! missing, expired, or malformed entry as a miss and falls back to the
//! store.

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension};

use crate::mlog;
use crate::profile::Profile;

/// Freshness window for cached snapshots (24 hours).
pub const DEFAULT_TTL_SECONDS: u64 = 24 * 60 * 60;

/// Path to the cache database inside a data directory.
pub fn cache_db_path(data_dir: &Path) -> PathBuf {
    data_dir.join("moonclub.db")
}

#[derive(Debug)]
pub enum CacheError {
    Sqlite(rusqlite::Error),
    Serde(serde_json::Error),
}

impl std::fmt::Display for CacheError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheError::Sqlite(e) => write!(f, "sqlite error: {e}"),
            CacheError::Serde(e) => write!(f, "serialization error: {e}"),
        }
    }
}

impl std::error::Error for CacheError {}

impl From<rusqlite::Error> for CacheError {
    fn from(e: rusqlite::Error) -> Self {
        CacheError::Sqlite(e)
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(e: serde_json::Error) -> Self {
        CacheError::Serde(e)
    }
}

/// Cache handle wrapping a SQLite connection.
pub struct ProfileCache {
    conn: Connection,
    ttl_seconds: u64,
}

impl ProfileCache {
    /// Open or create a cache database at the given path.
    pub fn open(path: &Path, ttl_seconds: u64) -> Result<Self, CacheError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        let cache = Self { conn, ttl_seconds };
        cache.create_schema()?;
        Ok(cache)
    }

    /// In-memory cache, used by tests and when no data directory is writable.
    pub fn open_in_memory(ttl_seconds: u64) -> Result<Self, CacheError> {
        let conn = Connection::open_in_memory()?;
        let cache = Self { conn, ttl_seconds };
        cache.create_schema()?;
        Ok(cache)
    }

    fn create_schema(&self) -> Result<(), CacheError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS profile_snapshots (
                wallet      TEXT PRIMARY KEY,
                profiles    TEXT NOT NULL,
                stored_at   INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS selected_profiles (
                wallet      TEXT PRIMARY KEY,
                profile_id  TEXT NOT NULL,
                updated_at  INTEGER NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    pub fn ttl_seconds(&self) -> u64 {
        self.ttl_seconds
    }

    /// The cached profile list for a wallet, or `None` when the entry is
    /// missing, older than the TTL, or fails to parse.
    pub fn fresh_profiles(
        &self,
        wallet: &str,
        now: u64,
    ) -> Result<Option<Vec<Profile>>, CacheError> {
        let row: Option<(String, u64)> = self
            .conn
            .query_row(
                "SELECT profiles, stored_at FROM profile_snapshots WHERE wallet = ?1",
                params![wallet],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((json, stored_at)) = row else {
            return Ok(None);
        };
        if now.saturating_sub(stored_at) > self.ttl_seconds {
            return Ok(None);
        }
        match serde_json::from_str(&json) {
            Ok(profiles) => Ok(Some(profiles)),
            Err(e) => {
                // Corrupt snapshot behaves as a miss.
                mlog!("cache: dropping unparsable snapshot for {}: {}", wallet, e);
                Ok(None)
            }
        }
    }

    /// Store a snapshot for a wallet, stamping it with `now`.
    pub fn store_snapshot(
        &self,
        wallet: &str,
        profiles: &[Profile],
        now: u64,
    ) -> Result<(), CacheError> {
        let json = serde_json::to_string(profiles)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO profile_snapshots (wallet, profiles, stored_at)
             VALUES (?1, ?2, ?3)",
            params![wallet, json, now],
        )?;
        Ok(())
    }

    /// The persisted active-profile selection for a wallet.
    pub fn selected_profile(&self, wallet: &str) -> Result<Option<String>, CacheError> {
        let id = self
            .conn
            .query_row(
                "SELECT profile_id FROM selected_profiles WHERE wallet = ?1",
                params![wallet],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    /// Persist an active-profile selection for a wallet.
    pub fn set_selected_profile(
        &self,
        wallet: &str,
        profile_id: &str,
        now: u64,
    ) -> Result<(), CacheError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO selected_profiles (wallet, profile_id, updated_at)
             VALUES (?1, ?2, ?3)",
            params![wallet, profile_id, now],
        )?;
        Ok(())
    }

    /// Drop a wallet's snapshot but keep its selection, so the next resolve
    /// refetches without forgetting which profile was active.
    pub fn invalidate_snapshot(&self, wallet: &str) -> Result<(), CacheError> {
        self.conn.execute(
            "DELETE FROM profile_snapshots WHERE wallet = ?1",
            params![wallet],
        )?;
        Ok(())
    }

    /// Remove everything cached for one wallet.
    pub fn clear_wallet(&self, wallet: &str) -> Result<(), CacheError> {
        self.conn.execute(
            "DELETE FROM profile_snapshots WHERE wallet = ?1",
            params![wallet],
        )?;
        self.conn.execute(
            "DELETE FROM selected_profiles WHERE wallet = ?1",
            params![wallet],
        )?;
        Ok(())
    }

    /// Remove all cached entries for all wallets.
    pub fn clear_all(&self) -> Result<(), CacheError> {
        self.conn.execute_batch(
            "DELETE FROM profile_snapshots;
             DELETE FROM selected_profiles;",
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{NewProfile, Profile, ProfileKind};

    const WALLET: &str = "0xde709f2102306220921060314715629080e2fb77";

    fn sample_profiles() -> Vec<Profile> {
        vec![Profile::from_new(
            NewProfile {
                display_name: "Mooner".to_string(),
                username: "mooner".to_string(),
                bio: None,
                avatar_url: None,
                banner_url: None,
                wallet_address: WALLET.to_string(),
                account_id: Some("acct-1".to_string()),
                kind: ProfileKind::Individual,
            },
            50,
        )
        .unwrap()]
    }

    #[test]
    fn hit_within_ttl() {
        let cache = ProfileCache::open_in_memory(100).unwrap();
        cache.store_snapshot(WALLET, &sample_profiles(), 1_000).unwrap();

        let hit = cache.fresh_profiles(WALLET, 1_050).unwrap();
        assert_eq!(hit.unwrap().len(), 1);

        // Exactly at the TTL boundary is still fresh.
        assert!(cache.fresh_profiles(WALLET, 1_100).unwrap().is_some());
    }

    #[test]
    fn expired_entry_is_a_miss() {
        let cache = ProfileCache::open_in_memory(100).unwrap();
        cache.store_snapshot(WALLET, &sample_profiles(), 1_000).unwrap();
        assert!(cache.fresh_profiles(WALLET, 1_101).unwrap().is_none());
    }

    #[test]
    fn missing_entry_is_a_miss() {
        let cache = ProfileCache::open_in_memory(100).unwrap();
        assert!(cache.fresh_profiles(WALLET, 0).unwrap().is_none());
    }

    #[test]
    fn corrupt_entry_is_a_miss() {
        let cache = ProfileCache::open_in_memory(100).unwrap();
        cache
            .conn
            .execute(
                "INSERT INTO profile_snapshots (wallet, profiles, stored_at)
                 VALUES (?1, 'not json', ?2)",
                params![WALLET, 1_000u64],
            )
            .unwrap();
        assert!(cache.fresh_profiles(WALLET, 1_001).unwrap().is_none());
    }

    #[test]
    fn empty_snapshot_roundtrips() {
        let cache = ProfileCache::open_in_memory(100).unwrap();
        cache.store_snapshot(WALLET, &[], 10).unwrap();
        let hit = cache.fresh_profiles(WALLET, 20).unwrap();
        assert_eq!(hit.unwrap().len(), 0);
    }

    #[test]
    fn selection_roundtrip_and_invalidate() {
        let cache = ProfileCache::open_in_memory(100).unwrap();
        cache.store_snapshot(WALLET, &sample_profiles(), 10).unwrap();
        cache.set_selected_profile(WALLET, "prof-x", 10).unwrap();

        assert_eq!(
            cache.selected_profile(WALLET).unwrap(),
            Some("prof-x".to_string())
        );

        // Snapshot invalidation keeps the selection.
        cache.invalidate_snapshot(WALLET).unwrap();
        assert!(cache.fresh_profiles(WALLET, 11).unwrap().is_none());
        assert_eq!(
            cache.selected_profile(WALLET).unwrap(),
            Some("prof-x".to_string())
        );
    }

    #[test]
    fn clear_all_removes_every_wallet() {
        let cache = ProfileCache::open_in_memory(100).unwrap();
        cache.store_snapshot(WALLET, &sample_profiles(), 10).unwrap();
        cache.set_selected_profile(WALLET, "prof-x", 10).unwrap();
        cache
            .store_snapshot("0x52908400098527886e0f7030069857d2e4169ee7", &[], 10)
            .unwrap();

        cache.clear_all().unwrap();
        assert!(cache.fresh_profiles(WALLET, 11).unwrap().is_none());
        assert!(cache.selected_profile(WALLET).unwrap().is_none());
        assert!(cache
            .fresh_profiles("0x52908400098527886e0f7030069857d2e4169ee7", 11)
            .unwrap()
            .is_none());
    }

    #[test]
    fn on_disk_cache_survives_reopen() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = cache_db_path(tmp.path());

        {
            let cache = ProfileCache::open(&path, DEFAULT_TTL_SECONDS).unwrap();
            cache.store_snapshot(WALLET, &sample_profiles(), 10).unwrap();
        }

        let cache = ProfileCache::open(&path, DEFAULT_TTL_SECONDS).unwrap();
        let hit = cache.fresh_profiles(WALLET, 20).unwrap();
        assert_eq!(hit.unwrap()[0].username, "mooner");
    }
}
