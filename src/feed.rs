//! Community feed: posts, comments, and reaction toggling.
//!
//! Reaction counts are always derived by counting reaction rows; no
//! delta-updated aggregate integers exist anywhere, so counts cannot drift
//! from the underlying reaction set.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::profile::mint_id;
use crate::store::{CommunityStore, StoreError};

pub const POST_MAX_LEN: usize = 2000;
pub const COMMENT_MAX_LEN: usize = 1000;

/// Reaction kinds a profile can toggle on a feed item.  Kinds are
/// independent per-kind toggles; one profile can hold at most one reaction
/// of each kind per item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionKind {
    Like,
    Dislike,
    Boost,
    Reshare,
}

impl ReactionKind {
    pub const ALL: [ReactionKind; 4] = [
        ReactionKind::Like,
        ReactionKind::Dislike,
        ReactionKind::Boost,
        ReactionKind::Reshare,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReactionKind::Like => "like",
            ReactionKind::Dislike => "dislike",
            ReactionKind::Boost => "boost",
            ReactionKind::Reshare => "reshare",
        }
    }
}

impl FromStr for ReactionKind {
    type Err = FeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(ReactionKind::Like),
            "dislike" => Ok(ReactionKind::Dislike),
            "boost" => Ok(ReactionKind::Boost),
            "reshare" => Ok(ReactionKind::Reshare),
            other => Err(FeedError::UnknownKind(other.to_string())),
        }
    }
}

impl std::fmt::Display for ReactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A feed post as stored in the remote store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub author_profile_id: String,
    pub body: String,
    pub created_at: u64,
}

/// A comment under a post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub post_id: String,
    pub author_profile_id: String,
    pub body: String,
    pub created_at: u64,
}

/// One reaction row.  At most one per `(target, profile, kind)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reaction {
    pub target_id: String,
    pub profile_id: String,
    pub kind: ReactionKind,
    pub created_at: u64,
}

/// Aggregate reaction counts for one feed item, derived from reaction rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReactionCounts {
    pub likes: u32,
    pub dislikes: u32,
    pub boosts: u32,
    pub reshares: u32,
}

impl ReactionCounts {
    /// Tally a reaction row set.
    pub fn tally(reactions: &[Reaction]) -> Self {
        let mut counts = Self::default();
        for r in reactions {
            match r.kind {
                ReactionKind::Like => counts.likes += 1,
                ReactionKind::Dislike => counts.dislikes += 1,
                ReactionKind::Boost => counts.boosts += 1,
                ReactionKind::Reshare => counts.reshares += 1,
            }
        }
        counts
    }
}

#[derive(Debug)]
pub enum FeedError {
    Store(StoreError),
    EmptyBody,
    BodyTooLong { len: usize, max: usize },
    UnknownKind(String),
}

impl std::fmt::Display for FeedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedError::Store(e) => write!(f, "store error: {e}"),
            FeedError::EmptyBody => write!(f, "body must not be empty"),
            FeedError::BodyTooLong { len, max } => {
                write!(f, "body too long: {len} chars (max {max})")
            }
            FeedError::UnknownKind(kind) => write!(f, "unknown reaction kind: {kind}"),
        }
    }
}

impl std::error::Error for FeedError {}

impl From<StoreError> for FeedError {
    fn from(e: StoreError) -> Self {
        FeedError::Store(e)
    }
}

fn validate_body(body: &str, max: usize) -> Result<(), FeedError> {
    if body.trim().is_empty() {
        return Err(FeedError::EmptyBody);
    }
    if body.len() > max {
        return Err(FeedError::BodyTooLong {
            len: body.len(),
            max,
        });
    }
    Ok(())
}

impl Post {
    pub fn new(
        author_profile_id: impl Into<String>,
        body: impl Into<String>,
        now: u64,
    ) -> Result<Self, FeedError> {
        let body = body.into();
        validate_body(&body, POST_MAX_LEN)?;
        Ok(Self {
            id: mint_id("post"),
            author_profile_id: author_profile_id.into(),
            body,
            created_at: now,
        })
    }
}

impl Comment {
    pub fn new(
        post_id: impl Into<String>,
        author_profile_id: impl Into<String>,
        body: impl Into<String>,
        now: u64,
    ) -> Result<Self, FeedError> {
        let body = body.into();
        validate_body(&body, COMMENT_MAX_LEN)?;
        Ok(Self {
            id: mint_id("cmnt"),
            post_id: post_id.into(),
            author_profile_id: author_profile_id.into(),
            body,
            created_at: now,
        })
    }
}

/// What a toggle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToggleOutcome {
    Added,
    Removed,
}

/// Toggle `profile_id`'s reaction of `kind` on `target_id`: a second toggle
/// of the same kind removes the first.
pub fn toggle_reaction(
    store: &dyn CommunityStore,
    target_id: &str,
    profile_id: &str,
    kind: ReactionKind,
    now: u64,
) -> Result<ToggleOutcome, FeedError> {
    if store.reaction(target_id, profile_id, kind)?.is_some() {
        store.delete_reaction(target_id, profile_id, kind)?;
        Ok(ToggleOutcome::Removed)
    } else {
        store.insert_reaction(&Reaction {
            target_id: target_id.to_string(),
            profile_id: profile_id.to_string(),
            kind,
            created_at: now,
        })?;
        Ok(ToggleOutcome::Added)
    }
}

/// Derived aggregate counts for one feed item.
pub fn reaction_counts(
    store: &dyn CommunityStore,
    target_id: &str,
) -> Result<ReactionCounts, FeedError> {
    let reactions = store.reactions_for(target_id)?;
    Ok(ReactionCounts::tally(&reactions))
}
