//! End-to-end tests for the identity resolution flow:
//!
//! - cache hits never touch the store; misses query it exactly once
//! - profile switches persist across a simulated reload
//! - disconnect and logout fully reset identity state

use moonclub::cache::{cache_db_path, ProfileCache, DEFAULT_TTL_SECONDS};
use moonclub::profile::{MembershipTier, Profile, ProfileKind, Role};
use moonclub::session::{ResolveSource, Session, SessionConfig};
use moonclub::store::MemoryStore;
use moonclub::wallet::{AnnouncedConnector, WalletConnector, DEFAULT_CHAIN_ID};

const WALLET_ABC: &str = "0xde709f2102306220921060314715629080e2fb77";
const WALLET_DEF: &str = "0x52908400098527886e0f7030069857d2e4169ee7";

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn profile(id: &str, wallet: &str, username: &str) -> Profile {
    Profile {
        id: id.to_string(),
        display_name: username.to_string(),
        username: username.to_string(),
        bio: None,
        avatar_url: None,
        banner_url: None,
        wallet_address: wallet.to_string(),
        account_id: "acct-1".to_string(),
        tier: MembershipTier::Basic,
        roles: vec![Role::Member],
        kind: ProfileKind::Individual,
        created_at: 1,
    }
}

fn memory_session() -> Session {
    Session::new(
        ProfileCache::open_in_memory(DEFAULT_TTL_SECONDS).unwrap(),
        SessionConfig::default(),
    )
}

// ---------------------------------------------------------------------------
// Cache behaviour
// ---------------------------------------------------------------------------

#[test]
fn cache_hit_skips_the_store() {
    let store = MemoryStore::new();
    store.seed_profile(profile("p1", WALLET_ABC, "alpha"));

    let mut session = memory_session();
    session.resolve(&store, Some(WALLET_ABC)).unwrap();
    assert_eq!(store.profile_query_count(), 1);

    // Every further resolve within the freshness window settles from cache.
    for _ in 0..3 {
        let outcome = session.resolve(&store, Some(WALLET_ABC)).unwrap();
        assert_eq!(outcome.source, ResolveSource::Cache);
    }
    assert_eq!(store.profile_query_count(), 1);
}

#[test]
fn cache_miss_queries_once_and_populates_a_fresh_entry() {
    let store = MemoryStore::new();
    store.seed_profile(profile("p1", WALLET_ABC, "alpha"));

    let mut session = memory_session();
    let outcome = session.resolve(&store, Some(WALLET_ABC)).unwrap();
    assert_eq!(outcome.source, ResolveSource::Store);
    assert_eq!(outcome.profile_count, 1);
    assert_eq!(store.profile_query_count(), 1);

    // The entry just written serves the next resolve.
    let outcome = session.resolve(&store, Some(WALLET_ABC)).unwrap();
    assert_eq!(outcome.source, ResolveSource::Cache);
    assert_eq!(store.profile_query_count(), 1);
}

#[test]
fn resolve_none_always_empties_state() {
    let store = MemoryStore::new();
    store.seed_profile(profile("p1", WALLET_ABC, "alpha"));

    let mut session = memory_session();
    session.resolve(&store, Some(WALLET_ABC)).unwrap();
    assert!(!session.profiles().is_empty());

    let outcome = session.resolve(&store, None).unwrap();
    assert_eq!(outcome.source, ResolveSource::Disconnected);
    assert_eq!(outcome.profile_count, 0);
    assert!(outcome.active_profile_id.is_none());
    assert!(session.profiles().is_empty());
    assert!(session.active_profile().is_none());
}

// ---------------------------------------------------------------------------
// Profile switching
// ---------------------------------------------------------------------------

#[test]
fn switch_to_unknown_id_leaves_active_unchanged() {
    let store = MemoryStore::new();
    store.seed_profile(profile("p1", WALLET_ABC, "alpha"));

    let mut session = memory_session();
    session.resolve(&store, Some(WALLET_ABC)).unwrap();
    assert_eq!(session.active_profile_id(), Some("p1"));

    assert!(!session.switch_profile("p99"));
    assert_eq!(session.active_profile_id(), Some("p1"));

    // No-op twice over.
    assert!(!session.switch_profile("p99"));
    assert_eq!(session.active_profile_id(), Some("p1"));
}

#[test]
fn two_profiles_switch_and_survive_reload() {
    let tmp = tempfile::TempDir::new().unwrap();
    let db = cache_db_path(tmp.path());

    let store = MemoryStore::new();
    store.seed_profile(profile("p1", WALLET_ABC, "alpha"));
    store.seed_profile(profile("p2", WALLET_ABC, "beta"));

    {
        let cache = ProfileCache::open(&db, DEFAULT_TTL_SECONDS).unwrap();
        let mut session = Session::new(cache, SessionConfig::default());

        let outcome = session.resolve(&store, Some(WALLET_ABC)).unwrap();
        assert_eq!(outcome.profile_count, 2);
        // First element is active by default.
        assert_eq!(session.active_profile_id(), Some("p1"));

        assert!(session.switch_profile("p2"));
        assert_eq!(session.active_profile().unwrap().username, "beta");
    }

    // Simulated reload: fresh session over the same cache database.  The
    // still-valid snapshot restores the switched selection without a store
    // round-trip.
    let cache = ProfileCache::open(&db, DEFAULT_TTL_SECONDS).unwrap();
    let mut session = Session::new(cache, SessionConfig::default());
    let outcome = session.resolve(&store, Some(WALLET_ABC)).unwrap();

    assert_eq!(outcome.source, ResolveSource::Cache);
    assert_eq!(session.active_profile_id(), Some("p2"));
    assert_eq!(store.profile_query_count(), 1);
}

// ---------------------------------------------------------------------------
// Disconnect / reconnect / logout
// ---------------------------------------------------------------------------

#[test]
fn reconnecting_to_a_profileless_wallet_yields_empty_identity() {
    let store = MemoryStore::new();
    store.seed_profile(profile("p1", WALLET_ABC, "alpha"));

    let mut session = memory_session();
    session.resolve(&store, Some(WALLET_ABC)).unwrap();
    session.resolve(&store, None).unwrap();

    let outcome = session.resolve(&store, Some(WALLET_DEF)).unwrap();
    assert_eq!(outcome.profile_count, 0);
    assert!(outcome.active_profile_id.is_none());
    assert!(session.profiles().is_empty());
    assert!(session.active_profile().is_none());
}

#[test]
fn logout_clears_cache_and_is_idempotent() {
    let store = MemoryStore::new();
    store.seed_profile(profile("p1", WALLET_ABC, "alpha"));

    let mut session = memory_session();
    let mut connector = AnnouncedConnector::new(DEFAULT_CHAIN_ID);
    connector.announce(WALLET_ABC);

    session.resolve(&store, Some(WALLET_ABC)).unwrap();
    assert_eq!(store.profile_query_count(), 1);

    session.logout(&mut connector).unwrap();
    session.logout(&mut connector).unwrap();

    assert!(session.wallet().is_none());
    assert!(session.profiles().is_empty());
    assert!(session.active_profile().is_none());
    assert!(connector.address().is_none());

    // All cached entries are gone, so resolving hits the store again.
    let outcome = session.resolve(&store, Some(WALLET_ABC)).unwrap();
    assert_eq!(outcome.source, ResolveSource::Store);
    assert_eq!(store.profile_query_count(), 2);
}

#[test]
fn selection_does_not_leak_across_wallets() {
    let store = MemoryStore::new();
    store.seed_profile(profile("p1", WALLET_ABC, "alpha"));
    store.seed_profile(profile("p2", WALLET_ABC, "beta"));
    store.seed_profile(profile("q1", WALLET_DEF, "gamma"));

    let mut session = memory_session();
    session.resolve(&store, Some(WALLET_ABC)).unwrap();
    session.switch_profile("p2");

    session.resolve(&store, Some(WALLET_DEF)).unwrap();
    assert_eq!(session.active_profile_id(), Some("q1"));

    // Back on the first wallet the earlier selection still applies.
    session.resolve(&store, Some(WALLET_ABC)).unwrap();
    assert_eq!(session.active_profile_id(), Some("p2"));
}
