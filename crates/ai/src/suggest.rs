use std::fmt::Write as _;
use std::sync::Arc;

use tracing::error;

use leadflow_core::domain::lead::Lead;

use crate::client::LlmClient;

/// Upper bound on parsed suggestion lines. The service is asked for three;
/// anything past this is noise.
const MAX_SUGGESTIONS: usize = 5;

/// How many trailing conversation entries are quoted into the prompt.
const RECENT_MESSAGE_WINDOW: usize = 5;

/// The single line returned when the external service fails. Callers always
/// receive something renderable; the error itself only reaches the log.
pub const FALLBACK_SUGGESTION: &str =
    "Could not generate suggestions right now. Please try again later.";

/// Builds the prompt for a lead snapshot. Deterministic: the same lead
/// produces the same text, so request behavior is reproducible in tests.
pub fn build_prompt(lead: &Lead) -> String {
    let mut prompt = String::new();

    prompt.push_str(
        "You are a sales assistant. Based on the following lead's details, suggest 3 short \
         and actionable follow-up steps to increase engagement and improve conversion.\n\n",
    );

    let _ = writeln!(prompt, "Lead details:");
    let _ = writeln!(prompt, "Name: {}", lead.name);
    let _ = writeln!(prompt, "Company: {}", lead.company);
    let _ = writeln!(prompt, "Status: {}", lead.status);
    let _ = writeln!(prompt, "Priority: {}", lead.priority);
    let _ = writeln!(prompt, "Source: {}", lead.source);
    let _ = writeln!(prompt, "Last contact: {}", lead.last_contact.to_rfc3339());
    let _ = writeln!(prompt, "Notes: {}", lead.notes.as_deref().unwrap_or("N/A"));

    let _ = writeln!(prompt, "\nRecent messages:");
    let recent_start = lead.conversation.len().saturating_sub(RECENT_MESSAGE_WINDOW);
    for entry in &lead.conversation[recent_start..] {
        let _ = writeln!(prompt, "- ({}): {}", entry.timestamp.to_rfc3339(), entry.message);
    }

    prompt.push_str(
        "\nReturn exactly three suggestions, one per line, each a single short sentence. \
         No numbering, no markup, no extra commentary.",
    );

    prompt
}

/// Splits a freeform reply into suggestion lines: leading enumeration
/// markers and bullet glyphs are stripped, blank lines dropped, and the
/// result capped. The count is advisory; callers must handle 0..N lines.
pub fn parse_suggestions(raw: &str) -> Vec<String> {
    raw.lines()
        .map(strip_marker)
        .filter(|line| !line.is_empty())
        .take(MAX_SUGGESTIONS)
        .map(str::to_string)
        .collect()
}

fn strip_marker(line: &str) -> &str {
    let trimmed = line.trim();

    for bullet in ["- ", "* ", "• "] {
        if let Some(rest) = trimmed.strip_prefix(bullet) {
            return rest.trim();
        }
    }
    if let Some(rest) = trimmed.strip_prefix(['-', '*', '•']) {
        return rest.trim();
    }

    let digits = trimmed.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 {
        let after_digits = &trimmed[digits..];
        if let Some(rest) = after_digits.strip_prefix(['.', ')']) {
            return rest.trim();
        }
    }

    trimmed
}

/// Produces follow-up suggestions for a lead. The only component in the
/// system allowed to fail outward, and it converts even that failure into a
/// renderable fallback line.
pub struct FollowUpSuggester {
    client: Arc<dyn LlmClient>,
}

impl FollowUpSuggester {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }

    pub async fn suggest(&self, lead: &Lead) -> Vec<String> {
        let prompt = build_prompt(lead);

        match self.client.complete(&prompt).await {
            Ok(text) => parse_suggestions(&text),
            Err(err) => {
                error!(
                    event_name = "ai.suggest.failed",
                    lead_id = %lead.id,
                    error = %err,
                    "suggestion request failed, returning fallback"
                );
                vec![FALLBACK_SUGGESTION.to_string()]
            }
        }
    }
}
