use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Raw lesson record as served by the lessons endpoint. Field names follow
/// the endpoint's camelCase payload; anything missing deserializes to its
/// default so a sparse row never fails the whole load.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LessonRecord {
    pub lesson_title: String,
    pub original_author: String,
    pub revised_by: Option<String>,
    pub subject: String,
    pub grade: String,
    pub ct_concept: String,
    pub date_finalized: Option<String>,
    pub link_to_folder: Option<String>,
    pub ready_to_publish: bool,
}

/// In-memory lesson. Comma-joined source fields are decomposed into trimmed
/// token lists at load; display joins are re-derived at render time.
#[derive(Debug, Clone)]
pub struct Lesson {
    pub title: String,
    pub original_author: String,
    pub revised_by: Option<String>,
    pub grades: Vec<String>,
    pub subjects: Vec<String>,
    pub concepts: Vec<String>,
    pub date_finalized: Option<String>,
    pub link: String,
}

impl Lesson {
    pub fn grade_display(&self) -> String {
        self.grades.join(", ")
    }

    pub fn subject_display(&self) -> String {
        self.subjects.join(", ")
    }

    pub fn concept_display(&self) -> String {
        self.concepts.join(", ")
    }
}

/// The canonical browsable set for a session. Built once per load; the
/// publishable filter is never re-applied afterwards.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub lessons: Vec<Lesson>,
}

impl Catalog {
    pub fn from_records(records: Vec<LessonRecord>) -> Self {
        Self {
            lessons: records.into_iter().filter_map(publishable).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.lessons.len()
    }
}

/// Only records marked ready to publish with a non-blank folder link enter
/// the catalog.
fn publishable(rec: LessonRecord) -> Option<Lesson> {
    if !rec.ready_to_publish {
        return None;
    }
    let link = rec.link_to_folder?.trim().to_string();
    if link.is_empty() {
        return None;
    }
    Some(Lesson {
        title: rec.lesson_title,
        original_author: rec.original_author,
        revised_by: rec.revised_by.filter(|s| !s.trim().is_empty()),
        grades: split_tokens(&rec.grade),
        subjects: split_tokens(&rec.subject),
        concepts: split_tokens(&rec.ct_concept),
        date_finalized: rec.date_finalized.filter(|s| !s.trim().is_empty()),
        link,
    })
}

/// Split a comma-delimited field into trimmed, non-empty tokens. A malformed
/// or empty field yields zero tokens rather than an error.
pub fn split_tokens(field: &str) -> Vec<String> {
    field
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("lesson request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("lesson payload was not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Fetch the full lesson list from the configured endpoint. No pagination,
/// no retry; the caller surfaces failures to the UI.
pub async fn fetch_records(
    client: &reqwest::Client,
    endpoint: &str,
) -> Result<Vec<LessonRecord>, StoreError> {
    let resp = client.get(endpoint).send().await?.error_for_status()?;
    Ok(resp.json().await?)
}

/// Load lesson records from a local JSON file (offline/dev mode).
pub fn read_records(path: &Path) -> Result<Vec<LessonRecord>, StoreError> {
    let raw = std::fs::read_to_string(path).map_err(|source| StoreError::Read {
        path: path.display().to_string(),
        source,
    })?;
    Ok(serde_json::from_str(&raw)?)
}
