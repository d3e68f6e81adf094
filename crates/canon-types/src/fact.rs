use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::hash::ContentHash;

/// Category of the entity a fact describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FactType {
    Character,
    Location,
    Object,
    Event,
    Relation,
    WorldRule,
    Temporal,
    Meta,
}

impl FactType {
    pub const ALL: [FactType; 8] = [
        Self::Character,
        Self::Location,
        Self::Object,
        Self::Event,
        Self::Relation,
        Self::WorldRule,
        Self::Temporal,
        Self::Meta,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Character => "CHARACTER",
            Self::Location => "LOCATION",
            Self::Object => "OBJECT",
            Self::Event => "EVENT",
            Self::Relation => "RELATION",
            Self::WorldRule => "WORLD_RULE",
            Self::Temporal => "TEMPORAL",
            Self::Meta => "META",
        }
    }
}

/// Provenance of a fact.
///
/// Sources form a strict total order used to settle competing claims:
/// `User > Text > Imported > Inferred`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FactSource {
    User,
    Text,
    Imported,
    Inferred,
}

impl FactSource {
    pub const ALL: [FactSource; 4] = [Self::User, Self::Text, Self::Imported, Self::Inferred];

    /// Authority weight of the source. Higher wins.
    pub const fn priority(&self) -> u32 {
        match self {
            Self::User => 1000,
            Self::Text => 100,
            Self::Imported => 10,
            Self::Inferred => 1,
        }
    }

    /// Confidence assigned when the caller does not supply one.
    ///
    /// Monotonic with [`priority`](Self::priority).
    pub const fn default_confidence(&self) -> Confidence {
        match self {
            Self::User => Confidence::Absolute,
            Self::Text => Confidence::High,
            Self::Imported => Confidence::Medium,
            Self::Inferred => Confidence::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Text => "TEXT",
            Self::Imported => "IMPORTED",
            Self::Inferred => "INFERRED",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Confidence {
    Absolute,
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Absolute => "ABSOLUTE",
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        }
    }
}

/// Lifecycle state of a stored fact.
///
/// Status is the only field of a fact that changes after creation. It is not
/// part of the fact hash; transitions are recorded in the audit chain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FactStatus {
    #[default]
    Active,
    Archived,
    Deleted,
}

impl FactStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Archived => "ARCHIVED",
            Self::Deleted => "DELETED",
        }
    }
}

macro_rules! str_enum_impls {
    ($ty:ty, $what:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim().to_ascii_uppercase().replace('-', "_");
                serde_json::from_value(serde_json::Value::String(wanted))
                    .map_err(|_| format!("unknown {}: {s}", $what))
            }
        }
    };
}

str_enum_impls!(FactType, "fact type");
str_enum_impls!(FactSource, "fact source");
str_enum_impls!(Confidence, "confidence");
str_enum_impls!(FactStatus, "fact status");

/// Where in the source material a fact was found.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourcePosition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paragraph: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentence: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactMetadata {
    pub created_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_position: Option<SourcePosition>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Identity of a fact lineage: all versions of a claim share one key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FactKey {
    pub subject: String,
    pub predicate: String,
}

impl FactKey {
    pub fn new(subject: impl Into<String>, predicate: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
        }
    }
}

impl fmt::Display for FactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.subject, self.predicate)
    }
}

/// A stored assertion.
///
/// Facts are immutable once created except for [`status`](Self::status).
/// Superseding a fact creates a new record with `version + 1` and flips the
/// old record to [`FactStatus::Archived`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fact {
    pub id: String,
    #[serde(rename = "type")]
    pub fact_type: FactType,
    pub subject: String,
    pub predicate: String,
    pub value: String,
    pub source: FactSource,
    pub confidence: Confidence,
    pub status: FactStatus,
    pub version: u32,
    pub hash: ContentHash,
    /// Hash of the fact created immediately before this one, store-wide.
    pub previous_hash: ContentHash,
    pub metadata: FactMetadata,
    pub created_at: DateTime<Utc>,
}

/// The hashed view of a [`Fact`]: every field except `hash` and `status`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FactContent<'a> {
    pub id: &'a str,
    #[serde(rename = "type")]
    pub fact_type: FactType,
    pub subject: &'a str,
    pub predicate: &'a str,
    pub value: &'a str,
    pub source: FactSource,
    pub confidence: Confidence,
    pub version: u32,
    pub previous_hash: &'a ContentHash,
    pub metadata: &'a FactMetadata,
    pub created_at: &'a DateTime<Utc>,
}

impl Fact {
    pub fn key(&self) -> FactKey {
        FactKey::new(&self.subject, &self.predicate)
    }

    pub fn content(&self) -> FactContent<'_> {
        FactContent {
            id: &self.id,
            fact_type: self.fact_type,
            subject: &self.subject,
            predicate: &self.predicate,
            value: &self.value,
            source: self.source,
            confidence: self.confidence,
            version: self.version,
            previous_hash: &self.previous_hash,
            metadata: &self.metadata,
            created_at: &self.created_at,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == FactStatus::Active
    }

    pub fn priority(&self) -> u32 {
        self.source.priority()
    }
}

/// Caller-supplied description of a new claim.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactInput {
    #[serde(rename = "type")]
    pub fact_type: FactType,
    pub subject: String,
    pub predicate: String,
    pub value: String,
    pub source: FactSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Confidence>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_position: Option<SourcePosition>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl FactInput {
    pub fn new(
        fact_type: FactType,
        subject: impl Into<String>,
        predicate: impl Into<String>,
        value: impl Into<String>,
        source: FactSource,
    ) -> Self {
        Self {
            fact_type,
            subject: subject.into(),
            predicate: predicate.into(),
            value: value.into(),
            source,
            confidence: None,
            created_by: None,
            source_ref: None,
            source_position: None,
            tags: Vec::new(),
            notes: None,
        }
    }

    pub fn with_confidence(mut self, confidence: Confidence) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn created_by(mut self, actor: impl Into<String>) -> Self {
        self.created_by = Some(actor.into());
        self
    }

    pub fn with_source_ref(mut self, source_ref: impl Into<String>) -> Self {
        self.source_ref = Some(source_ref.into());
        self
    }

    pub fn with_position(mut self, position: SourcePosition) -> Self {
        self.source_position = Some(position);
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Explicit confidence, or the source default.
    pub fn effective_confidence(&self) -> Confidence {
        self.confidence
            .unwrap_or_else(|| self.source.default_confidence())
    }

    pub fn key(&self) -> FactKey {
        FactKey::new(&self.subject, &self.predicate)
    }
}

/// Changes applied by `update`. Unset fields carry over from the current fact.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactPatch {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<FactSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Confidence>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl FactPatch {
    pub fn value(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..Self::default()
        }
    }

    pub fn with_source(mut self, source: FactSource) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_confidence(mut self, confidence: Confidence) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn updated_by(mut self, actor: impl Into<String>) -> Self {
        self.updated_by = Some(actor.into());
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}
