//! The persona record produced by one lookup.
//!
//! A [`Persona`] is built fresh per lookup by
//! [`normalize_reply`](crate::normalize::normalize_reply), handed to the
//! front-end read-only, and dropped on reset. Field names serialize in
//! camelCase so a serialized persona can be fed straight back through the
//! normalizer.

use serde::{Deserialize, Serialize};

use crate::Annotation;

/// Sentinel for free-text fields the model left empty.
pub const UNKNOWN: &str = "UNKNOWN";

/// Sentinel for a contact the model could not surface.
pub const HIDDEN: &str = "HIDDEN";

/// `realName` of the record returned when the reply could not be parsed.
pub const RUNTIME_ERROR: &str = "RUNTIME_ERROR";

/// Name of the platform every lookup nominally targets.
pub const PRIMARY_PLATFORM: &str = "TikTok";

/// Canonical profile URL on the primary platform for a sigil-less handle.
pub fn primary_profile_url(bare_handle: &str) -> String {
    format!("https://www.tiktok.com/@{bare_handle}")
}

/// Normalized result of one lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Persona {
    pub found: bool,
    pub handle: String,
    pub real_name: String,
    pub location: String,
    pub public_contact: String,
    pub bio: String,
    pub followers: String,
    pub risk_score: RiskScore,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technical: Option<Technical>,
    pub platforms: Vec<Platform>,
    pub analysis: String,
    #[serde(default)]
    pub sources: Vec<Source>,
}

impl Persona {
    /// Whether `publicContact` still holds a placeholder rather than a link.
    pub fn contact_is_sentinel(&self) -> bool {
        is_contact_sentinel(&self.public_contact)
    }
}

pub(crate) fn is_contact_sentinel(contact: &str) -> bool {
    contact.is_empty() || contact == UNKNOWN || contact == HIDDEN
}

/// Threat rating the model assigns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskScore {
    #[default]
    Low,
    Medium,
    High,
}

impl RiskScore {
    /// Case-insensitive parse. Anything unrecognized is `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LOW" => Some(Self::Low),
            "MEDIUM" => Some(Self::Medium),
            "HIGH" => Some(Self::High),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }
}

impl std::fmt::Display for RiskScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Account metadata the model may infer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Technical {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
}

impl Technical {
    pub fn is_empty(&self) -> bool {
        self.user_id.is_none()
            && self.region.is_none()
            && self.language.is_none()
            && self.created.is_none()
    }
}

/// Liveness of a platform entry. Only active entries survive normalization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PlatformStatus {
    #[default]
    Active,
}

/// One account on a social platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Platform {
    pub name: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub status: PlatformStatus,
}

impl Platform {
    pub fn active(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            username: None,
            status: PlatformStatus::Active,
        }
    }

    /// The synthesized primary-platform entry for a sigil-less handle.
    pub fn primary(bare_handle: &str) -> Self {
        Self::active(PRIMARY_PLATFORM, primary_profile_url(bare_handle))
    }
}

/// A provenance citation surfaced by the model's web search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub title: String,
    pub uri: String,
}

impl Source {
    pub fn new(title: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            uri: uri.into(),
        }
    }

    /// Collect `url_citation` annotations in order. The title falls back to
    /// the url.
    pub fn from_annotations(annotations: &[Annotation]) -> Vec<Source> {
        annotations
            .iter()
            .filter(|a| a.annotation_type.as_deref() == Some("url_citation"))
            .filter_map(|a| a.url_citation.as_ref())
            .map(|c| Source {
                title: c.title.clone().unwrap_or_else(|| c.url.clone()),
                uri: c.url.clone(),
            })
            .collect()
    }
}
