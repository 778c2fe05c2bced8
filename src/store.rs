//! Remote community store access.
//!
//! The hosted store is a PostgREST-style HTTP API over the profiles, posts,
//! comments, and reactions tables.  The core flow only exercises equality
//! filters, inserts, and reaction deletes; there is no update surface.
//!
//! [`CommunityStore`] is the seam the rest of the crate programs against.
//! [`RestStore`] talks to the hosted API; [`MemoryStore`] is an in-process
//! implementation used by the test suites and for local development without
//! store credentials.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::feed::{Comment, Post, Reaction, ReactionKind};
use crate::profile::Profile;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum StoreError {
    /// Transport-level failure: DNS, refused connection, timeout.
    Http(String),
    /// The store answered with a non-success status.
    Status(u16, String),
    Decode(String),
    /// A uniqueness constraint was violated.
    Conflict(String),
    /// The store is switched off or unreachable by configuration.
    Unavailable(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Http(e) => write!(f, "http error: {e}"),
            StoreError::Status(code, body) => write!(f, "store returned {code}: {body}"),
            StoreError::Decode(e) => write!(f, "decode error: {e}"),
            StoreError::Conflict(what) => write!(f, "conflict: {what}"),
            StoreError::Unavailable(why) => write!(f, "store unavailable: {why}"),
        }
    }
}

impl std::error::Error for StoreError {}

// ---------------------------------------------------------------------------
// Store seam
// ---------------------------------------------------------------------------

/// The store surface exercised by the identity and feed flows: equality
/// selects, inserts, and reaction deletes.
pub trait CommunityStore: Send + Sync {
    /// All profiles linked to a wallet address, in retrieval order.
    fn profiles_by_wallet(&self, wallet: &str) -> Result<Vec<Profile>, StoreError>;

    /// Look up a username within an account (usernames are unique per
    /// account, not globally).
    fn profile_by_username(
        &self,
        account_id: &str,
        username: &str,
    ) -> Result<Option<Profile>, StoreError>;

    fn insert_profile(&self, profile: &Profile) -> Result<(), StoreError>;

    /// Most recent posts first.
    fn posts(&self, limit: u32) -> Result<Vec<Post>, StoreError>;

    fn post(&self, post_id: &str) -> Result<Option<Post>, StoreError>;

    fn insert_post(&self, post: &Post) -> Result<(), StoreError>;

    /// Comments for a post, oldest first.
    fn comments_for(&self, post_id: &str) -> Result<Vec<Comment>, StoreError>;

    fn insert_comment(&self, comment: &Comment) -> Result<(), StoreError>;

    fn reaction(
        &self,
        target_id: &str,
        profile_id: &str,
        kind: ReactionKind,
    ) -> Result<Option<Reaction>, StoreError>;

    /// Insert a reaction, replacing any existing row for the same
    /// `(target, profile, kind)`.
    fn insert_reaction(&self, reaction: &Reaction) -> Result<(), StoreError>;

    /// Returns whether a row was actually removed.
    fn delete_reaction(
        &self,
        target_id: &str,
        profile_id: &str,
        kind: ReactionKind,
    ) -> Result<bool, StoreError>;

    fn reactions_for(&self, target_id: &str) -> Result<Vec<Reaction>, StoreError>;
}

// ---------------------------------------------------------------------------
// Hosted REST store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RestConfig {
    base_url: String,
    api_key: String,
}

impl RestConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Blocking HTTP client for the hosted store.
pub struct RestStore {
    config: RestConfig,
}

impl RestStore {
    pub fn new(config: RestConfig) -> Self {
        Self { config }
    }

    fn endpoint(&self, table: &str, query: &str) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        if query.is_empty() {
            format!("{base}/rest/v1/{table}")
        } else {
            format!("{base}/rest/v1/{table}?{query}")
        }
    }

    fn authed(&self, req: ureq::Request) -> ureq::Request {
        req.set("apikey", &self.config.api_key)
            .set("Authorization", &format!("Bearer {}", self.config.api_key))
    }

    fn select<T: DeserializeOwned>(&self, table: &str, query: &str) -> Result<Vec<T>, StoreError> {
        let url = self.endpoint(table, query);
        let response = self
            .authed(ureq::get(&url))
            .call()
            .map_err(map_ureq_error)?;
        response
            .into_json()
            .map_err(|e| StoreError::Decode(e.to_string()))
    }

    fn insert<T: Serialize>(&self, table: &str, row: &T) -> Result<(), StoreError> {
        let url = self.endpoint(table, "");
        let json_val =
            serde_json::to_value(row).map_err(|e| StoreError::Decode(e.to_string()))?;
        self.authed(ureq::post(&url))
            .set("Prefer", "return=minimal")
            .send_json(json_val)
            .map_err(map_ureq_error)?;
        Ok(())
    }

    /// Delete matching rows, returning how many were removed.
    fn delete(&self, table: &str, query: &str) -> Result<usize, StoreError> {
        let url = self.endpoint(table, query);
        let response = self
            .authed(ureq::delete(&url))
            .set("Prefer", "return=representation")
            .call()
            .map_err(map_ureq_error)?;
        let removed: Vec<serde_json::Value> = response
            .into_json()
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        Ok(removed.len())
    }
}

fn map_ureq_error(e: ureq::Error) -> StoreError {
    match e {
        ureq::Error::Status(409, response) => {
            StoreError::Conflict(response.into_string().unwrap_or_default())
        }
        ureq::Error::Status(code, response) => {
            StoreError::Status(code, response.into_string().unwrap_or_default())
        }
        other => StoreError::Http(other.to_string()),
    }
}

impl CommunityStore for RestStore {
    fn profiles_by_wallet(&self, wallet: &str) -> Result<Vec<Profile>, StoreError> {
        self.select(
            "profiles",
            &format!("wallet_address=eq.{wallet}&order=created_at.asc"),
        )
    }

    fn profile_by_username(
        &self,
        account_id: &str,
        username: &str,
    ) -> Result<Option<Profile>, StoreError> {
        let rows: Vec<Profile> = self.select(
            "profiles",
            &format!("account_id=eq.{account_id}&username=eq.{username}&limit=1"),
        )?;
        Ok(rows.into_iter().next())
    }

    fn insert_profile(&self, profile: &Profile) -> Result<(), StoreError> {
        self.insert("profiles", profile)
    }

    fn posts(&self, limit: u32) -> Result<Vec<Post>, StoreError> {
        self.select("posts", &format!("order=created_at.desc&limit={limit}"))
    }

    fn post(&self, post_id: &str) -> Result<Option<Post>, StoreError> {
        let rows: Vec<Post> = self.select("posts", &format!("id=eq.{post_id}&limit=1"))?;
        Ok(rows.into_iter().next())
    }

    fn insert_post(&self, post: &Post) -> Result<(), StoreError> {
        self.insert("posts", post)
    }

    fn comments_for(&self, post_id: &str) -> Result<Vec<Comment>, StoreError> {
        self.select(
            "comments",
            &format!("post_id=eq.{post_id}&order=created_at.asc"),
        )
    }

    fn insert_comment(&self, comment: &Comment) -> Result<(), StoreError> {
        self.insert("comments", comment)
    }

    fn reaction(
        &self,
        target_id: &str,
        profile_id: &str,
        kind: ReactionKind,
    ) -> Result<Option<Reaction>, StoreError> {
        let rows: Vec<Reaction> = self.select(
            "reactions",
            &format!(
                "target_id=eq.{target_id}&profile_id=eq.{profile_id}&kind=eq.{}&limit=1",
                kind.as_str()
            ),
        )?;
        Ok(rows.into_iter().next())
    }

    fn insert_reaction(&self, reaction: &Reaction) -> Result<(), StoreError> {
        self.insert("reactions", reaction)
    }

    fn delete_reaction(
        &self,
        target_id: &str,
        profile_id: &str,
        kind: ReactionKind,
    ) -> Result<bool, StoreError> {
        let removed = self.delete(
            "reactions",
            &format!(
                "target_id=eq.{target_id}&profile_id=eq.{profile_id}&kind=eq.{}",
                kind.as_str()
            ),
        )?;
        Ok(removed > 0)
    }

    fn reactions_for(&self, target_id: &str) -> Result<Vec<Reaction>, StoreError> {
        self.select(
            "reactions",
            &format!("target_id=eq.{target_id}&order=created_at.asc"),
        )
    }
}

// ---------------------------------------------------------------------------
// In-process store
// ---------------------------------------------------------------------------

#[derive(Default)]
struct MemoryInner {
    profiles: Vec<Profile>,
    posts: Vec<Post>,
    comments: Vec<Comment>,
    reactions: Vec<Reaction>,
}

/// In-process [`CommunityStore`] used by the test suites and for running the
/// server without hosted-store credentials.  Tracks how many profile queries
/// it has served so tests can assert on cache behaviour.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
    profile_queries: AtomicUsize,
    profiles_unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_profile(&self, profile: Profile) {
        self.inner.lock().unwrap().profiles.push(profile);
    }

    /// Number of `profiles_by_wallet` calls served so far.
    pub fn profile_query_count(&self) -> usize {
        self.profile_queries.load(Ordering::Relaxed)
    }

    /// Make subsequent profile queries fail, simulating a store outage.
    pub fn set_profiles_unavailable(&self, unavailable: bool) {
        self.profiles_unavailable
            .store(unavailable, Ordering::Relaxed);
    }
}

impl CommunityStore for MemoryStore {
    fn profiles_by_wallet(&self, wallet: &str) -> Result<Vec<Profile>, StoreError> {
        self.profile_queries.fetch_add(1, Ordering::Relaxed);
        if self.profiles_unavailable.load(Ordering::Relaxed) {
            return Err(StoreError::Unavailable("simulated outage".to_string()));
        }
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .profiles
            .iter()
            .filter(|p| p.wallet_address == wallet)
            .cloned()
            .collect())
    }

    fn profile_by_username(
        &self,
        account_id: &str,
        username: &str,
    ) -> Result<Option<Profile>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .profiles
            .iter()
            .find(|p| p.account_id == account_id && p.username == username)
            .cloned())
    }

    fn insert_profile(&self, profile: &Profile) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if inner
            .profiles
            .iter()
            .any(|p| p.account_id == profile.account_id && p.username == profile.username)
        {
            return Err(StoreError::Conflict(format!(
                "username {} already taken in account {}",
                profile.username, profile.account_id
            )));
        }
        inner.profiles.push(profile.clone());
        Ok(())
    }

    fn posts(&self, limit: u32) -> Result<Vec<Post>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut posts = inner.posts.clone();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        posts.truncate(limit as usize);
        Ok(posts)
    }

    fn post(&self, post_id: &str) -> Result<Option<Post>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.posts.iter().find(|p| p.id == post_id).cloned())
    }

    fn insert_post(&self, post: &Post) -> Result<(), StoreError> {
        self.inner.lock().unwrap().posts.push(post.clone());
        Ok(())
    }

    fn comments_for(&self, post_id: &str) -> Result<Vec<Comment>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut comments: Vec<Comment> = inner
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect();
        comments.sort_by_key(|c| c.created_at);
        Ok(comments)
    }

    fn insert_comment(&self, comment: &Comment) -> Result<(), StoreError> {
        self.inner.lock().unwrap().comments.push(comment.clone());
        Ok(())
    }

    fn reaction(
        &self,
        target_id: &str,
        profile_id: &str,
        kind: ReactionKind,
    ) -> Result<Option<Reaction>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .reactions
            .iter()
            .find(|r| r.target_id == target_id && r.profile_id == profile_id && r.kind == kind)
            .cloned())
    }

    fn insert_reaction(&self, reaction: &Reaction) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.reactions.retain(|r| {
            !(r.target_id == reaction.target_id
                && r.profile_id == reaction.profile_id
                && r.kind == reaction.kind)
        });
        inner.reactions.push(reaction.clone());
        Ok(())
    }

    fn delete_reaction(
        &self,
        target_id: &str,
        profile_id: &str,
        kind: ReactionKind,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.reactions.len();
        inner.reactions.retain(|r| {
            !(r.target_id == target_id && r.profile_id == profile_id && r.kind == kind)
        });
        Ok(inner.reactions.len() < before)
    }

    fn reactions_for(&self, target_id: &str) -> Result<Vec<Reaction>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut reactions: Vec<Reaction> = inner
            .reactions
            .iter()
            .filter(|r| r.target_id == target_id)
            .cloned()
            .collect();
        reactions.sort_by_key(|r| r.created_at);
        Ok(reactions)
    }
}
