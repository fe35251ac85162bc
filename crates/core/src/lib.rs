pub mod config;
pub mod domain;
pub mod errors;
pub mod listing;
pub mod timeago;

pub use domain::lead::{
    ConversationEntry, Lead, LeadId, LeadPatch, LeadPriority, LeadSource, LeadStatus, NewLead,
};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use listing::{
    filter_leads, sort_leads, toggle_select_all, toggle_selection, LeadCache, SortDirection,
};
pub use timeago::{time_ago, time_ago_at};
