use chrono::{Duration, Utc};
use uuid::{uuid, Uuid};

use leadflow_core::domain::lead::{ConversationEntry, Lead, LeadId, NewLead};

use crate::connection::DbPool;
use crate::repositories::{LeadRepository, RepositoryError, SqlLeadRepository};

/// Deterministic demo leads for local development and smoke testing. Each
/// fixture carries a fixed identifier so repeated seeding is idempotent.
struct SeedLeadContract {
    id: Uuid,
    name: &'static str,
    company: &'static str,
    email: &'static str,
    phone: Option<&'static str>,
    status: &'static str,
    priority: &'static str,
    source: &'static str,
    website: Option<&'static str>,
    notes: Option<&'static str>,
    last_contact_hours_ago: i64,
    log_message: Option<&'static str>,
}

const SEED_LEADS: &[SeedLeadContract] = &[
    SeedLeadContract {
        id: uuid!("3f9a1de2-7b44-4c0a-9a65-1f2a42de8a01"),
        name: "Sarah Johnson",
        company: "Acme Inc.",
        email: "sarah.j@acmeinc.com",
        phone: Some("+1 (555) 123-4567"),
        status: "New",
        priority: "High",
        source: "Website",
        website: Some("https://acmeinc.com"),
        notes: Some("Interested in the enterprise plan; needs to discuss with her team."),
        last_contact_hours_ago: 2,
        log_message: Some("Initial call went well, sending pricing details."),
    },
    SeedLeadContract {
        id: uuid!("8c2b6f10-05e9-4d7e-b430-6cb0f3f1be02"),
        name: "Michael Chen",
        company: "Globex Industries",
        email: "mchen@globex.io",
        phone: Some("+1 (555) 987-6543"),
        status: "Contacted",
        priority: "Medium",
        source: "Email",
        website: None,
        notes: Some("Asked for a comparison against their current vendor."),
        last_contact_hours_ago: 30,
        log_message: Some("Replied to intro email, wants a demo next week."),
    },
    SeedLeadContract {
        id: uuid!("d51e7c88-93aa-41f6-8e02-20b7f4a6cc03"),
        name: "Priya Patel",
        company: "Initech",
        email: "priya@initech.dev",
        phone: None,
        status: "Qualified",
        priority: "High",
        source: "Social Media",
        website: Some("https://initech.dev"),
        notes: None,
        last_contact_hours_ago: 72,
        log_message: None,
    },
];

#[derive(Clone, Debug)]
pub struct SeedLeadInfo {
    pub id: LeadId,
    pub name: String,
    pub status: String,
}

#[derive(Clone, Debug)]
pub struct SeedResult {
    pub leads_seeded: Vec<SeedLeadInfo>,
}

#[derive(Clone, Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}

pub struct SeedDataset;

impl SeedDataset {
    /// Inserts any fixture lead that is not already present. Existing rows
    /// are left untouched so a re-seed never clobbers local edits.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let repo = SqlLeadRepository::new(pool.clone());
        let now = Utc::now();
        let mut leads_seeded = Vec::new();

        for contract in SEED_LEADS {
            let id = LeadId(contract.id);
            if repo.find_by_id(&id).await?.is_some() {
                continue;
            }

            let created_at = now - Duration::hours(contract.last_contact_hours_ago);
            let mut lead = Lead::create(
                id,
                NewLead {
                    name: contract.name.to_string(),
                    company: contract.company.to_string(),
                    email: contract.email.to_string(),
                    phone: contract.phone.map(str::to_string),
                    status: Some(contract.status.to_string()),
                    priority: Some(contract.priority.to_string()),
                    source: Some(contract.source.to_string()),
                    website: contract.website.map(str::to_string),
                    notes: contract.notes.map(str::to_string),
                    ..NewLead::default()
                },
                created_at,
            )
            .map_err(|e| RepositoryError::Decode(format!("seed fixture invalid: {e}")))?;

            if let Some(message) = contract.log_message {
                lead.conversation.push(ConversationEntry {
                    message: message.to_string(),
                    timestamp: created_at + Duration::minutes(5),
                });
            }

            repo.create(lead).await?;
            leads_seeded.push(SeedLeadInfo {
                id,
                name: contract.name.to_string(),
                status: contract.status.to_string(),
            });
        }

        Ok(SeedResult { leads_seeded })
    }

    /// Confirms every fixture landed with its seed conversation entry.
    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let repo = SqlLeadRepository::new(pool.clone());
        let mut checks = Vec::new();

        for contract in SEED_LEADS {
            let lead = repo.find_by_id(&LeadId(contract.id)).await?;
            let present = lead.as_ref().map(|l| l.name == contract.name).unwrap_or(false);
            let logged = lead.map(|l| !l.conversation.is_empty()).unwrap_or(false);

            checks.push((contract.name, present && logged));
        }

        let all_present = checks.iter().all(|(_, passed)| *passed);
        Ok(VerificationResult { all_present, checks })
    }
}
