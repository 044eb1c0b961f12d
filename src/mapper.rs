//! Relational record → index document mapping.
//!
//! Mapping is total by design: absent or malformed fields degrade to
//! empty defaults instead of failing, so a partial source record never
//! aborts an indexing pipeline. The only "no document" case is an absent
//! record, which callers see as `Option::None` at the store boundary.
//!
//! Every document's `id` is the string form of the relational primary
//! key (or section position for learning content) and is the sole
//! identity used for insert-or-replace writes.

use serde::Serialize;
use serde_json::Value;

use crate::content::{LearningDocument, LearningSection};
use crate::sanitize::strip_markup;
use crate::store::{DiscussionRecord, ProjectRecord, TeamRecord};

/// Fixed category for every bundled learning-content section.
pub const LEARNING_CATEGORY: &str = "git_github";

/// Index document for one project.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectDoc {
    pub id: String,
    pub project_name: String,
    pub description: String,
    pub team_user_ids: Vec<String>,
}

/// Index document for one discussion.
#[derive(Debug, Clone, Serialize)]
pub struct DiscussionDoc {
    pub id: String,
    pub title: String,
    pub project_id: String,
    pub description: String,
    pub team_user_ids: Vec<String>,
}

/// Index document for one learning-content section.
#[derive(Debug, Clone, Serialize)]
pub struct LearningSectionDoc {
    pub id: String,
    pub title: String,
    pub content: String,
    pub category: String,
    pub slug: String,
}

/// Map one project record into its index document.
pub fn map_project(record: &ProjectRecord) -> ProjectDoc {
    ProjectDoc {
        id: record.id.to_string(),
        project_name: record.project_name.clone(),
        description: description_text(record.description.as_ref()),
        team_user_ids: flatten_member_ids(&record.teams),
    }
}

/// Map a batch of project records.
pub fn map_projects(records: &[ProjectRecord]) -> Vec<ProjectDoc> {
    records.iter().map(map_project).collect()
}

/// Map one discussion record into its index document.
pub fn map_discussion(record: &DiscussionRecord) -> DiscussionDoc {
    DiscussionDoc {
        id: record.id.to_string(),
        title: record.title.clone(),
        project_id: record
            .project_id
            .map(|id| id.to_string())
            .unwrap_or_default(),
        description: record
            .description
            .as_deref()
            .map(strip_markup)
            .unwrap_or_default(),
        team_user_ids: flatten_member_ids(&record.project_teams),
    }
}

/// Map a batch of discussion records.
pub fn map_discussions(records: &[DiscussionRecord]) -> Vec<DiscussionDoc> {
    records.iter().map(map_discussion).collect()
}

/// Map every section of the learning document, ids assigned by position.
pub fn map_learning_sections(document: &LearningDocument) -> Vec<LearningSectionDoc> {
    document
        .sections
        .iter()
        .enumerate()
        .map(|(index, section)| map_learning_section(index, section))
        .collect()
}

fn map_learning_section(index: usize, section: &LearningSection) -> LearningSectionDoc {
    LearningSectionDoc {
        id: index.to_string(),
        title: section.title.clone(),
        // Structured content is serialized, not sanitized
        content: section.content.to_string(),
        category: LEARNING_CATEGORY.to_string(),
        slug: slugify(&section.title),
    }
}

/// Normalize a rich-text description into sanitized plain text.
///
/// The source stores descriptions either as a plain string or as a
/// structured object with a `content` sub-field; both forms sanitize to
/// plain text, and anything else defaults to the empty string.
fn description_text(raw: Option<&Value>) -> String {
    match raw {
        Some(Value::String(s)) => strip_markup(s),
        Some(Value::Object(map)) => {
            let content = map.get("content").and_then(Value::as_str).unwrap_or("");
            strip_markup(content)
        }
        _ => String::new(),
    }
}

/// Flatten teams→members into a single list of principal identifiers.
///
/// No deduplication: a member on two teams appears twice. The field is
/// only ever used as a containment filter, so the duplicate changes
/// nothing observable.
pub fn flatten_member_ids(teams: &[TeamRecord]) -> Vec<String> {
    teams
        .iter()
        .flat_map(|team| team.members.iter().cloned())
        .collect()
}

/// Build a URL slug from a section title: lowercased, whitespace runs
/// collapsed to single hyphens, everything outside `[a-z0-9-]` removed.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut in_whitespace = false;

    for ch in title.chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                slug.push('-');
                in_whitespace = true;
            }
        } else {
            in_whitespace = false;
            for lowered in ch.to_lowercase() {
                slug.push(lowered);
            }
        }
    }

    slug.retain(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    slug
}
