//! Parsing of the bulk session list pasted into the plan form.
//!
//! ```yaml
//! sessions:
//!   - order: 1
//!     description: Endurance ride
//!     date: 2025-03-03T18:00
//!     hfmax: "75%"
//! ```
//!
//! A bare top-level sequence of entries is accepted as well.

use serde::Deserialize;

use super::training_session::parse_schedule;
use super::{SessionDraft, WorkoutKind};

#[derive(Debug, Deserialize)]
struct SessionEntry {
    #[serde(default)]
    order: Option<i64>,
    #[serde(default)]
    description: Option<String>,
    date: String,
    #[serde(default, alias = "hf_max")]
    hfmax: Option<serde_yaml::Value>,
}

/// Heart-rate targets are free text ("75%", "140-150") but a bare number is
/// common enough to accept too.
fn hf_max_text(value: serde_yaml::Value) -> Result<Option<String>, String> {
    match value {
        serde_yaml::Value::Null => Ok(None),
        serde_yaml::Value::String(s) => Ok(Some(s)),
        serde_yaml::Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(format!("Invalid session list: unsupported hfmax value {:?}", other)),
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SessionList {
    Wrapped { sessions: Vec<SessionEntry> },
    Bare(Vec<SessionEntry>),
}

/// Parse a session list into drafts, in the order written.
///
/// A blank block yields no sessions. Any malformed entry fails the whole
/// list so nothing partial reaches the store.
pub fn parse_session_list(input: &str) -> Result<Vec<SessionDraft>, String> {
    if input.trim().is_empty() {
        return Ok(Vec::new());
    }

    let list: SessionList = serde_yaml::from_str(input)
        .map_err(|e| format!("Invalid session list: {}", e))?;

    let entries = match list {
        SessionList::Wrapped { sessions } => sessions,
        SessionList::Bare(sessions) => sessions,
    };

    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            let scheduled_at = parse_schedule(&entry.date).ok_or_else(|| {
                format!(
                    "Invalid session list: entry {} has an invalid date '{}'",
                    index + 1,
                    entry.date
                )
            })?;

            let hf_max = match entry.hfmax {
                Some(value) => hf_max_text(value)?,
                None => None,
            };

            Ok(SessionDraft {
                order: entry.order,
                description: entry.description.unwrap_or_default().trim().to_string(),
                scheduled_at,
                hf_max: hf_max
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty()),
            })
        })
        .collect()
}

/// Check every draft against the detail shape of `kind`, naming the first
/// entry that does not fit.
pub fn check_session_details(kind: WorkoutKind, drafts: &[SessionDraft]) -> Result<(), String> {
    for (index, draft) in drafts.iter().enumerate() {
        kind.detail(draft.hf_max.clone())
            .map_err(|e| format!("Invalid session list: entry {}: {}", index + 1, e))?;
    }
    Ok(())
}
