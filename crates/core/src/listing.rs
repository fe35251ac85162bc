//! Pure list utilities behind the lead table and board views: free-text
//! filtering, multi-key sorting, selection-set toggles, and the owned
//! snapshot cache consumers refresh from the API.
//!
//! Everything here is side-effect free and total: no function returns an
//! error for well-typed input.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::domain::lead::{Lead, LeadId};

/// Rank of a status name in the pipeline ordering used for sorting. Ranks
/// are keyed by name text rather than the storage vocabulary so that board
/// labels outside the stored enumeration still order deterministically;
/// unmapped names rank after `Lost`.
fn status_rank(status: &str) -> u8 {
    match status {
        "New" => 0,
        "Contacted" => 1,
        "FollowUp" => 2,
        "Converted" => 3,
        "Lost" => 4,
        _ => 5,
    }
}

/// High urgency sorts first under the natural (ascending) direction.
fn priority_rank(priority: &str) -> u8 {
    match priority {
        "High" => 0,
        "Medium" => 1,
        "Low" => 2,
        _ => 3,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }
}

impl Default for SortDirection {
    fn default() -> Self {
        Self::Asc
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SortKey {
    Name,
    Company,
    Email,
    Status,
    Priority,
    LastContact,
}

impl SortKey {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "name" => Some(Self::Name),
            "company" => Some(Self::Company),
            "email" => Some(Self::Email),
            "status" => Some(Self::Status),
            "priority" => Some(Self::Priority),
            "lastContact" => Some(Self::LastContact),
            _ => None,
        }
    }
}

fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

fn compare_by(a: &Lead, b: &Lead, key: SortKey) -> Ordering {
    match key {
        SortKey::Name => compare_text(&a.name, &b.name),
        SortKey::Company => compare_text(&a.company, &b.company),
        SortKey::Email => compare_text(&a.email, &b.email),
        SortKey::Status => status_rank(&a.status).cmp(&status_rank(&b.status)),
        SortKey::Priority => priority_rank(&a.priority).cmp(&priority_rank(&b.priority)),
        SortKey::LastContact => a.last_contact.cmp(&b.last_contact),
    }
}

/// Case-insensitive substring filter over name, company, and email. The
/// empty query matches every lead; the result is always a subsequence of
/// the input.
pub fn filter_leads(leads: &[Lead], query: &str) -> Vec<Lead> {
    let needle = query.to_lowercase();
    leads
        .iter()
        .filter(|lead| {
            lead.name.to_lowercase().contains(&needle)
                || lead.company.to_lowercase().contains(&needle)
                || lead.email.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect()
}

/// Stable sort by a named key. An unknown key compares every pair as equal,
/// so the original relative order survives in both directions.
pub fn sort_leads(leads: &[Lead], key: &str, direction: SortDirection) -> Vec<Lead> {
    let mut sorted = leads.to_vec();
    let Some(key) = SortKey::parse(key) else {
        return sorted;
    };

    sorted.sort_by(|a, b| {
        let ordering = compare_by(a, b, key);
        match direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
    sorted
}

/// Removes `id` from the set if present, otherwise adds it. Applying the
/// toggle twice with the same id returns the original set.
pub fn toggle_selection(selected: &BTreeSet<LeadId>, id: LeadId) -> BTreeSet<LeadId> {
    let mut next = selected.clone();
    if !next.remove(&id) {
        next.insert(id);
    }
    next
}

/// Selects every visible id, unless the selection already equals the full
/// visible set, in which case it clears. Scoped to the ids passed in, not
/// to all leads.
pub fn toggle_select_all(selected: &BTreeSet<LeadId>, visible: &[LeadId]) -> BTreeSet<LeadId> {
    let visible_set: BTreeSet<LeadId> = visible.iter().copied().collect();
    if *selected == visible_set {
        BTreeSet::new()
    } else {
        visible_set
    }
}

/// Owned snapshot of the lead list. Consumers refresh it from the API and
/// merge individual edits locally instead of sharing ambient mutable state.
#[derive(Clone, Debug, Default)]
pub struct LeadCache {
    leads: Vec<Lead>,
}

impl LeadCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn leads(&self) -> &[Lead] {
        &self.leads
    }

    pub fn len(&self) -> usize {
        self.leads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leads.is_empty()
    }

    /// Replaces the snapshot wholesale with a freshly fetched list.
    pub fn refresh(&mut self, leads: Vec<Lead>) {
        self.leads = leads;
    }

    /// Replaces the record with the matching identifier in place. A record
    /// not present in the snapshot is ignored; the next refresh picks it up.
    pub fn merge_update(&mut self, updated: Lead) {
        if let Some(slot) = self.leads.iter_mut().find(|lead| lead.id == updated.id) {
            *slot = updated;
        }
    }

    pub fn remove(&mut self, id: &LeadId) {
        self.leads.retain(|lead| lead.id != *id);
    }
}
