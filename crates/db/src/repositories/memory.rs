use std::collections::HashMap;

use tokio::sync::RwLock;

use leadflow_core::domain::lead::{ConversationEntry, Lead, LeadId, LeadPatch};

use super::{LeadRepository, RepositoryError};

/// Map-backed repository for tests and handler exercises that do not need a
/// database. Semantics mirror the SQL implementation, including newest-first
/// listing and the atomic-append contract.
#[derive(Default)]
pub struct InMemoryLeadRepository {
    leads: RwLock<HashMap<LeadId, Lead>>,
}

impl InMemoryLeadRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl LeadRepository for InMemoryLeadRepository {
    async fn list(&self) -> Result<Vec<Lead>, RepositoryError> {
        let leads = self.leads.read().await;
        let mut listed: Vec<Lead> = leads.values().cloned().collect();
        listed.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(listed)
    }

    async fn find_by_id(&self, id: &LeadId) -> Result<Option<Lead>, RepositoryError> {
        let leads = self.leads.read().await;
        Ok(leads.get(id).cloned())
    }

    async fn create(&self, lead: Lead) -> Result<(), RepositoryError> {
        let mut leads = self.leads.write().await;
        leads.insert(lead.id, lead);
        Ok(())
    }

    async fn update(
        &self,
        id: &LeadId,
        patch: &LeadPatch,
    ) -> Result<Option<Lead>, RepositoryError> {
        let mut leads = self.leads.write().await;
        let Some(lead) = leads.get_mut(id) else {
            return Ok(None);
        };
        patch.apply(lead);
        Ok(Some(lead.clone()))
    }

    async fn delete(&self, id: &LeadId) -> Result<bool, RepositoryError> {
        let mut leads = self.leads.write().await;
        Ok(leads.remove(id).is_some())
    }

    async fn append_conversation(
        &self,
        id: &LeadId,
        entry: ConversationEntry,
    ) -> Result<Option<Lead>, RepositoryError> {
        let mut leads = self.leads.write().await;
        let Some(lead) = leads.get_mut(id) else {
            return Ok(None);
        };
        lead.conversation.push(entry);
        Ok(Some(lead.clone()))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use leadflow_core::domain::lead::{Lead, LeadId, LeadPatch, NewLead};

    use super::InMemoryLeadRepository;
    use crate::repositories::LeadRepository;

    fn lead(name: &str, created_offset_hours: i64) -> Lead {
        let now = Utc::now() - Duration::hours(created_offset_hours);
        Lead::create(
            LeadId::generate(),
            NewLead {
                name: name.to_string(),
                company: "Acme".to_string(),
                email: format!("{}@acme.com", name.to_lowercase().replace(' ', ".")),
                ..NewLead::default()
            },
            now,
        )
        .expect("create")
    }

    #[tokio::test]
    async fn mirrors_sql_listing_order() {
        let repo = InMemoryLeadRepository::new();
        repo.create(lead("Older Lead", 5)).await.expect("insert");
        repo.create(lead("Newer Lead", 0)).await.expect("insert");

        let listed = repo.list().await.expect("list");
        assert_eq!(listed[0].name, "Newer Lead");
        assert_eq!(listed[1].name, "Older Lead");
    }

    #[tokio::test]
    async fn update_and_delete_report_missing_leads() {
        let repo = InMemoryLeadRepository::new();
        let ghost = LeadId::generate();
        let patch = LeadPatch { notes: Some("call".to_string()), ..LeadPatch::default() };

        assert!(repo.update(&ghost, &patch).await.expect("update").is_none());
        assert!(!repo.delete(&ghost).await.expect("delete"));
    }
}
