#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

use crate::lenient;
use crate::{Validate, ValidationError};

pub const FIELD_FULL_NAME: &str = "fullName";
pub const FIELD_PURPOSE: &str = "purpose";
pub const FIELD_TERMS: &str = "terms";

/// Purposes offered by the registration form. The store keeps whatever string
/// the visitor sent; this enum only classifies the known ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisitorPurpose {
    Business,
    Personal,
    Guest,
    Other,
}

impl VisitorPurpose {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "business" => Some(Self::Business),
            "personal" => Some(Self::Personal),
            "guest" => Some(Self::Guest),
            "other" => Some(Self::Other),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Business => "business",
            Self::Personal => "personal",
            Self::Guest => "guest",
            Self::Other => "other",
        }
    }
}

/// Untrusted registration payload exactly as the form posts it. Field types are
/// decoded loosely so a mistyped optional field never sinks the submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitorSubmission {
    #[serde(rename = "fullName", default, deserialize_with = "lenient::optional_text")]
    pub full_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub purpose: Option<String>,
    #[serde(
        alias = "termsAccepted",
        default,
        deserialize_with = "lenient::optional_flag"
    )]
    pub terms: Option<bool>,
    #[serde(
        alias = "submittedAt",
        default,
        deserialize_with = "lenient::optional_text"
    )]
    pub timestamp: Option<String>,
}

impl VisitorSubmission {
    pub fn v1(full_name: &str, purpose: &str, terms: bool) -> Self {
        Self {
            full_name: Some(full_name.to_string()),
            purpose: Some(purpose.to_string()),
            terms: Some(terms),
            timestamp: None,
        }
    }

    pub fn into_entry(self) -> Result<VisitorEntry, ValidationError> {
        self.validate()?;
        Ok(VisitorEntry {
            full_name: self.full_name.unwrap_or_default(),
            purpose: self.purpose.unwrap_or_default(),
            submitted_at: self.timestamp.filter(|v| !v.trim().is_empty()),
        })
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map(str::trim).unwrap_or_default().is_empty()
}

impl Validate for VisitorSubmission {
    fn validate(&self) -> Result<(), ValidationError> {
        if is_blank(&self.full_name) {
            return Err(ValidationError::MissingField {
                field: FIELD_FULL_NAME,
            });
        }
        if is_blank(&self.purpose) {
            return Err(ValidationError::MissingField {
                field: FIELD_PURPOSE,
            });
        }
        if self.terms != Some(true) {
            return Err(ValidationError::MissingField { field: FIELD_TERMS });
        }
        Ok(())
    }
}

/// Validated logical fields of a registration. Only `VisitorSubmission::into_entry`
/// builds one, so nothing unvalidated can reach a visitor log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitorEntry {
    full_name: String,
    purpose: String,
    submitted_at: Option<String>,
}

impl VisitorEntry {
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn purpose(&self) -> &str {
        &self.purpose
    }

    pub fn known_purpose(&self) -> Option<VisitorPurpose> {
        VisitorPurpose::parse(&self.purpose)
    }

    pub fn submitted_at(&self) -> Option<&str> {
        self.submitted_at.as_deref()
    }

    pub fn into_record(self, origin: &RequestOrigin, server_timestamp: String) -> VisitorRecord {
        VisitorRecord {
            full_name: self.full_name,
            purpose: self.purpose,
            terms_accepted: true,
            submitted_at: self.submitted_at,
            server_timestamp,
            source_address: origin.source_address.clone(),
            user_agent: origin.user_agent.clone(),
        }
    }
}

/// Server-observed facts about the request that carried a submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOrigin {
    pub source_address: String,
    pub user_agent: String,
}

impl RequestOrigin {
    pub fn new(source_address: impl Into<String>, user_agent: Option<&str>) -> Self {
        Self {
            source_address: source_address.into(),
            user_agent: user_agent.unwrap_or_default().to_string(),
        }
    }
}

/// One row of the visitor log. Aliases accept the snake_case names older
/// `users.json` files were written with, and loose decoding keeps rows whose
/// values were stored with other JSON types (`"terms": "on"`) readable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitorRecord {
    #[serde(default, deserialize_with = "lenient::text")]
    pub full_name: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub purpose: String,
    #[serde(alias = "terms", default, deserialize_with = "lenient::flag")]
    pub terms_accepted: bool,
    #[serde(
        alias = "timestamp",
        default,
        deserialize_with = "lenient::optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub submitted_at: Option<String>,
    #[serde(alias = "server_timestamp", default, deserialize_with = "lenient::text")]
    pub server_timestamp: String,
    #[serde(alias = "ip_address", default, deserialize_with = "lenient::text")]
    pub source_address: String,
    #[serde(alias = "user_agent", default, deserialize_with = "lenient::text")]
    pub user_agent: String,
}
