//! Profile record types for the `profiles` table.
//!
//! A profile is the mutable user-owned record, distinct from the
//! authentication identity. At most one profile exists per identity, and
//! a profile may be absent even when the user is authenticated (it has
//! simply not been created yet).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user's profile record, keyed by the owning identity's id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Always equal to the owning identity's id.
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub residential_address: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub zip_code: Option<String>,
    #[serde(default)]
    pub nationality: Option<String>,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub verification_submitted: bool,
    #[serde(default)]
    pub profile_completed: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Profile {
    /// Create an empty profile for the given identity id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: None,
            full_name: None,
            avatar_url: None,
            residential_address: None,
            date_of_birth: None,
            language: None,
            gender: None,
            country: None,
            state: None,
            zip_code: None,
            nationality: None,
            is_verified: false,
            verification_submitted: false,
            profile_completed: false,
            created_at: None,
            updated_at: None,
        }
    }
}

/// A partial profile update.
///
/// Only the fields that are `Some` are written; everything else keeps its
/// stored value. Serializes with absent fields omitted so an upsert never
/// nulls out columns the caller did not touch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfilePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub residential_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nationality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_verified: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_submitted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_completed: Option<bool>,
}

impl ProfilePatch {
    /// Patch with no fields set.
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Apply this patch on top of an existing profile record.
    ///
    /// Used by in-memory store implementations; the REST backend lets the
    /// database do the merge.
    pub fn apply_to(&self, profile: &mut Profile) {
        if let Some(v) = &self.full_name {
            profile.full_name = Some(v.clone());
        }
        if let Some(v) = &self.avatar_url {
            profile.avatar_url = Some(v.clone());
        }
        if let Some(v) = &self.residential_address {
            profile.residential_address = Some(v.clone());
        }
        if let Some(v) = &self.date_of_birth {
            profile.date_of_birth = Some(v.clone());
        }
        if let Some(v) = &self.language {
            profile.language = Some(v.clone());
        }
        if let Some(v) = &self.gender {
            profile.gender = Some(v.clone());
        }
        if let Some(v) = &self.country {
            profile.country = Some(v.clone());
        }
        if let Some(v) = &self.state {
            profile.state = Some(v.clone());
        }
        if let Some(v) = &self.zip_code {
            profile.zip_code = Some(v.clone());
        }
        if let Some(v) = &self.nationality {
            profile.nationality = Some(v.clone());
        }
        if let Some(v) = self.is_verified {
            profile.is_verified = v;
        }
        if let Some(v) = self.verification_submitted {
            profile.verification_submitted = v;
        }
        if let Some(v) = self.profile_completed {
            profile.profile_completed = v;
        }
    }
}

/// The record sent to the store on [`update_profile`].
///
/// Carries the identity id and the write timestamp alongside the patched
/// fields, matching the table's upsert shape.
///
/// [`update_profile`]: crate::sync::SessionSynchronizer::update_profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpsert {
    /// The owning identity's id. Never any other id.
    pub id: String,
    /// Set to the time of the write.
    pub updated_at: DateTime<Utc>,
    /// The fields being changed.
    #[serde(flatten)]
    pub fields: ProfilePatch,
}
