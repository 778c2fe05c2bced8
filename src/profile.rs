//! Profile data model and validation.
//!
//! A profile is one user-curated identity linked to a wallet address.  One
//! wallet can carry several profiles grouped under an account id; the session
//! layer decides which one is active.

use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::wallet::is_valid_address;

pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 32;
pub const DISPLAY_NAME_MAX_LEN: usize = 64;
pub const BIO_MAX_LEN: usize = 512;

/// Membership tier granted by the community.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipTier {
    #[default]
    Basic,
    Verified,
}

/// Community roles a profile can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Member,
    Contributor,
    Moderator,
    Ambassador,
}

/// What kind of entity the profile represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileKind {
    #[default]
    Individual,
    Group,
    Organization,
}

/// A profile row as stored in the remote store and cached locally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub display_name: String,
    /// Unique within the owning account.
    pub username: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub banner_url: Option<String>,
    pub wallet_address: String,
    pub account_id: String,
    #[serde(default)]
    pub tier: MembershipTier,
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default)]
    pub kind: ProfileKind,
    pub created_at: u64,
}

/// Submission from the profile creation form; everything the user supplies.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProfile {
    pub display_name: String,
    pub username: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub banner_url: Option<String>,
    pub wallet_address: String,
    /// Absent when the wallet has no profiles yet; a fresh account id is
    /// minted in that case.
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub kind: ProfileKind,
}

#[derive(Debug)]
pub enum ProfileError {
    InvalidAddress(String),
    InvalidUsername(String),
    InvalidDisplayName(String),
    BioTooLong(usize),
}

impl std::fmt::Display for ProfileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProfileError::InvalidAddress(a) => write!(f, "invalid wallet address: {a}"),
            ProfileError::InvalidUsername(u) => write!(f, "invalid username: {u}"),
            ProfileError::InvalidDisplayName(d) => write!(f, "invalid display name: {d}"),
            ProfileError::BioTooLong(len) => {
                write!(f, "bio too long: {len} chars (max {BIO_MAX_LEN})")
            }
        }
    }
}

impl std::error::Error for ProfileError {}

/// Mint an opaque id with the given prefix, e.g. `prof-9f2a…`.
pub(crate) fn mint_id(prefix: &str) -> String {
    let mut bytes = [0u8; 16];
    OsRng.fill_bytes(&mut bytes);
    let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    format!("{prefix}-{hex}")
}

/// Usernames are lowercase alphanumerics and underscores, 3-32 chars.
pub fn is_valid_username(username: &str) -> bool {
    (USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&username.len())
        && username
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
}

/// Validate a creation-form submission.
pub fn validate_new(new: &NewProfile) -> Result<(), ProfileError> {
    if !is_valid_address(&new.wallet_address) {
        return Err(ProfileError::InvalidAddress(new.wallet_address.clone()));
    }
    if !is_valid_username(&new.username) {
        return Err(ProfileError::InvalidUsername(new.username.clone()));
    }
    if new.display_name.is_empty() || new.display_name.len() > DISPLAY_NAME_MAX_LEN {
        return Err(ProfileError::InvalidDisplayName(new.display_name.clone()));
    }
    if let Some(ref bio) = new.bio {
        if bio.len() > BIO_MAX_LEN {
            return Err(ProfileError::BioTooLong(bio.len()));
        }
    }
    Ok(())
}

impl Profile {
    /// Build a storable profile from a validated submission.  Mints the
    /// profile id, and an account id when the submission carries none.
    pub fn from_new(new: NewProfile, now: u64) -> Result<Self, ProfileError> {
        validate_new(&new)?;
        let account_id = new.account_id.unwrap_or_else(|| mint_id("acct"));
        Ok(Self {
            id: mint_id("prof"),
            display_name: new.display_name,
            username: new.username,
            bio: new.bio,
            avatar_url: new.avatar_url,
            banner_url: new.banner_url,
            wallet_address: crate::wallet::normalize_address(&new.wallet_address),
            account_id,
            tier: MembershipTier::Basic,
            roles: vec![Role::Member],
            kind: new.kind,
            created_at: now,
        })
    }
}
