use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::DomainError;

/// Conversation entry seeded into every newly created lead.
pub const CREATION_LOG_MESSAGE: &str = "Lead created";

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LeadId(pub Uuid);

impl LeadId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses an identifier from its text form. A malformed identifier is a
    /// client error, distinct from "not found".
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        Uuid::parse_str(raw.trim())
            .map(Self)
            .map_err(|_| DomainError::MalformedIdentifier { raw: raw.to_string() })
    }
}

impl std::fmt::Display for LeadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Known pipeline stages. Leads are persisted with the stage name as plain
/// text and values outside this vocabulary round-trip untouched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeadStatus {
    New,
    Contacted,
    Qualified,
    Negotiation,
    Closed,
    Lost,
}

impl LeadStatus {
    pub const ALL: [LeadStatus; 6] = [
        Self::New,
        Self::Contacted,
        Self::Qualified,
        Self::Negotiation,
        Self::Closed,
        Self::Lost,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "New",
            Self::Contacted => "Contacted",
            Self::Qualified => "Qualified",
            Self::Negotiation => "Negotiation",
            Self::Closed => "Closed",
            Self::Lost => "Lost",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str().eq_ignore_ascii_case(raw.trim()))
    }
}

impl Default for LeadStatus {
    fn default() -> Self {
        Self::New
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeadPriority {
    Low,
    Medium,
    High,
}

impl LeadPriority {
    pub const ALL: [LeadPriority; 3] = [Self::Low, Self::Medium, Self::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|priority| priority.as_str().eq_ignore_ascii_case(raw.trim()))
    }
}

impl Default for LeadPriority {
    fn default() -> Self {
        Self::Medium
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeadSource {
    Email,
    Phone,
    Website,
    SocialMedia,
    Other,
}

impl LeadSource {
    pub const ALL: [LeadSource; 5] =
        [Self::Email, Self::Phone, Self::Website, Self::SocialMedia, Self::Other];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "Email",
            Self::Phone => "Phone",
            Self::Website => "Website",
            Self::SocialMedia => "Social Media",
            Self::Other => "Other",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|source| source.as_str().eq_ignore_ascii_case(raw.trim()))
    }
}

impl Default for LeadSource {
    fn default() -> Self {
        Self::Other
    }
}

/// One timestamped free-text note in a lead's history. Entries are ordered
/// by append order, not necessarily by timestamp value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationEntry {
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// A sales prospect tracked through the pipeline. `status`, `priority`, and
/// `source` carry the stage name as text: defaults come from the typed
/// vocabularies above, but the store does not reject unknown values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: LeadId,
    pub name: String,
    pub company: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub status: String,
    pub priority: String,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub last_contact: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub conversation: Vec<ConversationEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_suggestion: Option<bool>,
}

impl Lead {
    /// Builds the full initial record for a single insert, including the
    /// seed conversation entry.
    pub fn create(id: LeadId, new: NewLead, now: DateTime<Utc>) -> Result<Self, DomainError> {
        new.validate()?;

        Ok(Self {
            id,
            name: new.name,
            company: new.company,
            email: new.email,
            phone: new.phone,
            status: new.status.unwrap_or_else(|| LeadStatus::default().as_str().to_string()),
            priority: new.priority.unwrap_or_else(|| LeadPriority::default().as_str().to_string()),
            source: new.source.unwrap_or_else(|| LeadSource::default().as_str().to_string()),
            website: new.website,
            address: new.address,
            notes: new.notes,
            last_contact: new.last_contact.unwrap_or(now),
            created_at: now,
            conversation: vec![ConversationEntry {
                message: CREATION_LOG_MESSAGE.to_string(),
                timestamp: now,
            }],
            ai_suggestion: None,
        })
    }
}

/// Create payload. Name, company, and email are required; everything else
/// falls back to the vocabulary defaults or the creation instant.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLead {
    pub name: String,
    pub company: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub last_contact: Option<DateTime<Utc>>,
}

impl NewLead {
    pub fn validate(&self) -> Result<(), DomainError> {
        for (field, value) in
            [("name", &self.name), ("company", &self.company), ("email", &self.email)]
        {
            if value.trim().is_empty() {
                return Err(DomainError::MissingRequiredField { field });
            }
        }
        Ok(())
    }
}

/// Sparse merge-update payload: every field optional, identifier excluded.
/// A merge changes only the supplied keys and leaves the rest untouched.
/// Conversation entries are appended through the dedicated store operation,
/// never through a patch.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub last_contact: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ai_suggestion: Option<bool>,
}

impl LeadPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.company.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.source.is_none()
            && self.website.is_none()
            && self.address.is_none()
            && self.notes.is_none()
            && self.last_contact.is_none()
            && self.ai_suggestion.is_none()
    }

    /// In-memory merge with last-write-wins semantics, mirroring what the
    /// SQL repository does with a sparse UPDATE.
    pub fn apply(&self, lead: &mut Lead) {
        if let Some(name) = &self.name {
            lead.name = name.clone();
        }
        if let Some(company) = &self.company {
            lead.company = company.clone();
        }
        if let Some(email) = &self.email {
            lead.email = email.clone();
        }
        if let Some(phone) = &self.phone {
            lead.phone = Some(phone.clone());
        }
        if let Some(status) = &self.status {
            lead.status = status.clone();
        }
        if let Some(priority) = &self.priority {
            lead.priority = priority.clone();
        }
        if let Some(source) = &self.source {
            lead.source = source.clone();
        }
        if let Some(website) = &self.website {
            lead.website = Some(website.clone());
        }
        if let Some(address) = &self.address {
            lead.address = Some(address.clone());
        }
        if let Some(notes) = &self.notes {
            lead.notes = Some(notes.clone());
        }
        if let Some(last_contact) = self.last_contact {
            lead.last_contact = last_contact;
        }
        if let Some(ai_suggestion) = self.ai_suggestion {
            lead.ai_suggestion = Some(ai_suggestion);
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{Lead, LeadId, LeadPatch, LeadPriority, LeadSource, LeadStatus, NewLead};

    fn new_lead() -> NewLead {
        NewLead {
            name: "Jane Doe".to_string(),
            company: "Acme".to_string(),
            email: "jane@acme.com".to_string(),
            ..NewLead::default()
        }
    }

    #[test]
    fn create_applies_defaults_and_seeds_conversation() {
        let now = Utc::now();
        let lead = Lead::create(LeadId::generate(), new_lead(), now).expect("create");

        assert_eq!(lead.status, "New");
        assert_eq!(lead.priority, "Medium");
        assert_eq!(lead.source, "Other");
        assert_eq!(lead.last_contact, now);
        assert_eq!(lead.created_at, now);
        assert_eq!(lead.conversation.len(), 1);
        assert_eq!(lead.conversation[0].message, "Lead created");
    }

    #[test]
    fn create_rejects_blank_required_fields() {
        let mut missing_email = new_lead();
        missing_email.email = "   ".to_string();

        let error = Lead::create(LeadId::generate(), missing_email, Utc::now())
            .expect_err("blank email should fail");
        assert!(error.to_string().contains("email"));
    }

    #[test]
    fn patch_merges_only_supplied_fields() {
        let mut lead = Lead::create(LeadId::generate(), new_lead(), Utc::now()).expect("create");
        let patch =
            LeadPatch { status: Some("Qualified".to_string()), ..LeadPatch::default() };

        patch.apply(&mut lead);

        assert_eq!(lead.status, "Qualified");
        assert_eq!(lead.name, "Jane Doe");
        assert_eq!(lead.company, "Acme");
        assert_eq!(lead.conversation.len(), 1);
    }

    #[test]
    fn empty_patch_is_detectable() {
        assert!(LeadPatch::default().is_empty());
        assert!(!LeadPatch { notes: Some("call back".to_string()), ..LeadPatch::default() }
            .is_empty());
    }

    #[test]
    fn unknown_status_text_is_carried_through() {
        let mut lead = Lead::create(LeadId::generate(), new_lead(), Utc::now()).expect("create");
        let patch = LeadPatch { status: Some("Archived".to_string()), ..LeadPatch::default() };

        patch.apply(&mut lead);

        assert_eq!(lead.status, "Archived");
        assert!(LeadStatus::parse(&lead.status).is_none());
    }

    #[test]
    fn vocabularies_parse_their_own_names() {
        for status in LeadStatus::ALL {
            assert_eq!(LeadStatus::parse(status.as_str()), Some(status));
        }
        for priority in LeadPriority::ALL {
            assert_eq!(LeadPriority::parse(priority.as_str()), Some(priority));
        }
        for source in LeadSource::ALL {
            assert_eq!(LeadSource::parse(source.as_str()), Some(source));
        }
        assert_eq!(LeadSource::parse("social media"), Some(LeadSource::SocialMedia));
    }

    #[test]
    fn malformed_identifier_is_a_distinct_error() {
        let error = LeadId::parse("not-a-uuid").expect_err("should fail");
        assert!(error.to_string().contains("malformed"));
    }
}
