use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Row};
use uuid::Uuid;

use leadflow_core::domain::lead::{ConversationEntry, Lead, LeadId, LeadPatch};

use super::{LeadRepository, RepositoryError};
use crate::DbPool;

const LEAD_COLUMNS: &str = "id, name, company, email, phone, status, priority, source, \
     website, address, notes, last_contact, created_at, conversation, ai_suggestion";

pub struct SqlLeadRepository {
    pool: DbPool,
}

impl SqlLeadRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn parse_timestamp(raw: &str, column: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(format!("invalid timestamp in `{column}`: {e}")))
}

fn row_to_lead(row: &sqlx::sqlite::SqliteRow) -> Result<Lead, RepositoryError> {
    let id_text: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let id = Uuid::parse_str(&id_text)
        .map(LeadId)
        .map_err(|e| RepositoryError::Decode(format!("invalid lead id `{id_text}`: {e}")))?;

    let name: String = row.try_get("name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let company: String =
        row.try_get("company").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let email: String =
        row.try_get("email").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let phone: Option<String> =
        row.try_get("phone").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let status: String =
        row.try_get("status").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let priority: String =
        row.try_get("priority").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let source: String =
        row.try_get("source").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let website: Option<String> =
        row.try_get("website").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let address: Option<String> =
        row.try_get("address").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let notes: Option<String> =
        row.try_get("notes").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let last_contact_text: String =
        row.try_get("last_contact").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at_text: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let conversation_text: String =
        row.try_get("conversation").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let ai_suggestion: Option<bool> =
        row.try_get("ai_suggestion").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let conversation: Vec<ConversationEntry> = serde_json::from_str(&conversation_text)
        .map_err(|e| RepositoryError::Decode(format!("invalid conversation log: {e}")))?;

    Ok(Lead {
        id,
        name,
        company,
        email,
        phone,
        status,
        priority,
        source,
        website,
        address,
        notes,
        last_contact: parse_timestamp(&last_contact_text, "last_contact")?,
        created_at: parse_timestamp(&created_at_text, "created_at")?,
        conversation,
        ai_suggestion,
    })
}

#[async_trait::async_trait]
impl LeadRepository for SqlLeadRepository {
    async fn list(&self) -> Result<Vec<Lead>, RepositoryError> {
        let rows =
            sqlx::query(&format!("SELECT {LEAD_COLUMNS} FROM lead ORDER BY created_at DESC"))
                .fetch_all(&self.pool)
                .await?;

        rows.iter().map(row_to_lead).collect()
    }

    async fn find_by_id(&self, id: &LeadId) -> Result<Option<Lead>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {LEAD_COLUMNS} FROM lead WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_lead).transpose()
    }

    async fn create(&self, lead: Lead) -> Result<(), RepositoryError> {
        let conversation = serde_json::to_string(&lead.conversation)
            .map_err(|e| RepositoryError::Decode(format!("conversation encode failed: {e}")))?;

        sqlx::query(
            "INSERT INTO lead
                (id, name, company, email, phone, status, priority, source,
                 website, address, notes, last_contact, created_at, conversation, ai_suggestion)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(lead.id.to_string())
        .bind(&lead.name)
        .bind(&lead.company)
        .bind(&lead.email)
        .bind(&lead.phone)
        .bind(&lead.status)
        .bind(&lead.priority)
        .bind(&lead.source)
        .bind(&lead.website)
        .bind(&lead.address)
        .bind(&lead.notes)
        .bind(lead.last_contact.to_rfc3339())
        .bind(lead.created_at.to_rfc3339())
        .bind(conversation)
        .bind(lead.ai_suggestion)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update(
        &self,
        id: &LeadId,
        patch: &LeadPatch,
    ) -> Result<Option<Lead>, RepositoryError> {
        if patch.is_empty() {
            return self.find_by_id(id).await;
        }

        let mut builder = QueryBuilder::new("UPDATE lead SET ");
        {
            let mut assignments = builder.separated(", ");
            if let Some(name) = &patch.name {
                assignments.push("name = ").push_bind_unseparated(name.clone());
            }
            if let Some(company) = &patch.company {
                assignments.push("company = ").push_bind_unseparated(company.clone());
            }
            if let Some(email) = &patch.email {
                assignments.push("email = ").push_bind_unseparated(email.clone());
            }
            if let Some(phone) = &patch.phone {
                assignments.push("phone = ").push_bind_unseparated(phone.clone());
            }
            if let Some(status) = &patch.status {
                assignments.push("status = ").push_bind_unseparated(status.clone());
            }
            if let Some(priority) = &patch.priority {
                assignments.push("priority = ").push_bind_unseparated(priority.clone());
            }
            if let Some(source) = &patch.source {
                assignments.push("source = ").push_bind_unseparated(source.clone());
            }
            if let Some(website) = &patch.website {
                assignments.push("website = ").push_bind_unseparated(website.clone());
            }
            if let Some(address) = &patch.address {
                assignments.push("address = ").push_bind_unseparated(address.clone());
            }
            if let Some(notes) = &patch.notes {
                assignments.push("notes = ").push_bind_unseparated(notes.clone());
            }
            if let Some(last_contact) = patch.last_contact {
                assignments.push("last_contact = ").push_bind_unseparated(last_contact.to_rfc3339());
            }
            if let Some(ai_suggestion) = patch.ai_suggestion {
                assignments.push("ai_suggestion = ").push_bind_unseparated(ai_suggestion);
            }
        }
        builder.push(" WHERE id = ").push_bind(id.to_string());

        let result = builder.build().execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.find_by_id(id).await
    }

    async fn delete(&self, id: &LeadId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM lead WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn append_conversation(
        &self,
        id: &LeadId,
        entry: ConversationEntry,
    ) -> Result<Option<Lead>, RepositoryError> {
        let entry_json = serde_json::to_string(&entry)
            .map_err(|e| RepositoryError::Decode(format!("conversation encode failed: {e}")))?;

        // Single-statement JSON append: two concurrent log actions both land,
        // unlike a fetch-modify-write of the whole array.
        let result = sqlx::query(
            "UPDATE lead SET conversation = json_insert(conversation, '$[#]', json(?))
             WHERE id = ?",
        )
        .bind(entry_json)
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.find_by_id(id).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use leadflow_core::domain::lead::{ConversationEntry, Lead, LeadId, LeadPatch, NewLead};

    use super::SqlLeadRepository;
    use crate::repositories::LeadRepository;
    use crate::{connect_with_settings, migrations};

    async fn setup() -> SqlLeadRepository {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        SqlLeadRepository::new(pool)
    }

    fn sample_lead(name: &str, company: &str, email: &str) -> Lead {
        Lead::create(
            LeadId::generate(),
            NewLead {
                name: name.to_string(),
                company: company.to_string(),
                email: email.to_string(),
                ..NewLead::default()
            },
            Utc::now(),
        )
        .expect("create lead")
    }

    #[tokio::test]
    async fn create_then_fetch_round_trips_the_full_record() {
        let repo = setup().await;
        let lead = sample_lead("Jane Doe", "Acme", "jane@acme.com");
        let id = lead.id;

        repo.create(lead).await.expect("insert");

        let fetched = repo.find_by_id(&id).await.expect("fetch").expect("lead exists");
        assert_eq!(fetched.id, id);
        assert_eq!(fetched.name, "Jane Doe");
        assert_eq!(fetched.company, "Acme");
        assert_eq!(fetched.email, "jane@acme.com");
        assert_eq!(fetched.status, "New");
        assert_eq!(fetched.conversation.len(), 1);
        assert_eq!(fetched.conversation[0].message, "Lead created");
    }

    #[tokio::test]
    async fn sparse_update_changes_only_supplied_fields() {
        let repo = setup().await;
        let lead = sample_lead("Jane Doe", "Acme", "jane@acme.com");
        let id = lead.id;
        repo.create(lead).await.expect("insert");

        let patch = LeadPatch { status: Some("Qualified".to_string()), ..LeadPatch::default() };
        let updated = repo.update(&id, &patch).await.expect("update").expect("lead exists");

        assert_eq!(updated.status, "Qualified");
        assert_eq!(updated.name, "Jane Doe");
        assert_eq!(updated.company, "Acme");
        assert_eq!(updated.email, "jane@acme.com");
        assert_eq!(updated.conversation.len(), 1);
    }

    #[tokio::test]
    async fn empty_patch_is_a_no_op_that_still_resolves_the_lead() {
        let repo = setup().await;
        let lead = sample_lead("Jane Doe", "Acme", "jane@acme.com");
        let id = lead.id;
        repo.create(lead).await.expect("insert");

        let unchanged =
            repo.update(&id, &LeadPatch::default()).await.expect("update").expect("lead exists");
        assert_eq!(unchanged.name, "Jane Doe");
    }

    #[tokio::test]
    async fn update_of_missing_lead_reports_not_found() {
        let repo = setup().await;
        let patch = LeadPatch { status: Some("Qualified".to_string()), ..LeadPatch::default() };

        let missing = repo.update(&LeadId::generate(), &patch).await.expect("update");
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn delete_removes_the_record_once() {
        let repo = setup().await;
        let lead = sample_lead("Jane Doe", "Acme", "jane@acme.com");
        let id = lead.id;
        repo.create(lead).await.expect("insert");

        assert!(repo.delete(&id).await.expect("delete"));
        assert!(repo.find_by_id(&id).await.expect("fetch").is_none());
        assert!(!repo.delete(&id).await.expect("second delete"));
    }

    #[tokio::test]
    async fn conversation_append_adds_the_entry_last() {
        let repo = setup().await;
        let lead = sample_lead("Jane Doe", "Acme", "jane@acme.com");
        let id = lead.id;
        repo.create(lead).await.expect("insert");

        let entry = ConversationEntry {
            message: "Called, no answer".to_string(),
            timestamp: Utc::now(),
        };
        let updated =
            repo.append_conversation(&id, entry).await.expect("append").expect("lead exists");

        assert_eq!(updated.conversation.len(), 2);
        assert_eq!(updated.conversation[1].message, "Called, no answer");

        let missing = repo
            .append_conversation(
                &LeadId::generate(),
                ConversationEntry { message: "ghost".to_string(), timestamp: Utc::now() },
            )
            .await
            .expect("append");
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn list_returns_newest_created_first() {
        let repo = setup().await;

        let mut older = sample_lead("Older Lead", "Acme", "older@acme.com");
        older.created_at = Utc::now() - Duration::hours(2);
        let mut newer = sample_lead("Newer Lead", "Globex", "newer@globex.io");
        newer.created_at = Utc::now();

        repo.create(older).await.expect("insert older");
        repo.create(newer).await.expect("insert newer");

        let listed = repo.list().await.expect("list");
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].name, "Newer Lead");
        assert_eq!(listed[1].name, "Older Lead");
    }

    #[tokio::test]
    async fn unknown_status_text_survives_storage() {
        let repo = setup().await;
        let mut lead = sample_lead("Jane Doe", "Acme", "jane@acme.com");
        lead.status = "Archived".to_string();
        let id = lead.id;

        repo.create(lead).await.expect("insert");

        let fetched = repo.find_by_id(&id).await.expect("fetch").expect("lead exists");
        assert_eq!(fetched.status, "Archived");
    }
}
