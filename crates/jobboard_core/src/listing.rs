use serde::{Deserialize, Deserializer, Serialize};

pub type ListingId = String;

pub const DEFAULT_JOB_TYPE: &str = "Full-time";
pub const DEFAULT_LOCATION: &str = "Remote";

/// One remote job posting.
///
/// Field names match the remote feed so a saved snapshot reads like the feed
/// it came from. Two listings denote the same posting when their `id`s match;
/// the derived `PartialEq` compares every field and is meant for tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobListing {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: ListingId,
    pub title: String,
    #[serde(default)]
    pub company_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_logo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate_required_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub url: String,
}

impl JobListing {
    /// Minimal listing with only the required fields set.
    pub fn new(id: impl Into<ListingId>, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            company_name: String::new(),
            company_logo: None,
            job_type: None,
            candidate_required_location: None,
            category: None,
            url: url.into(),
        }
    }

    pub fn with_company(mut self, company_name: impl Into<String>) -> Self {
        self.company_name = company_name.into();
        self
    }

    pub fn job_type_or_default(&self) -> &str {
        non_blank(self.job_type.as_deref()).unwrap_or(DEFAULT_JOB_TYPE)
    }

    pub fn location_or_default(&self) -> &str {
        non_blank(self.candidate_required_location.as_deref()).unwrap_or(DEFAULT_LOCATION)
    }

    /// Placeholder glyph shown when there is no usable logo.
    pub fn company_initial(&self) -> char {
        self.company_name
            .trim()
            .chars()
            .next()
            .and_then(|c| c.to_uppercase().next())
            .unwrap_or('C')
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Snapshots written by older clients stored numeric ids verbatim.
fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<ListingId, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Unsigned(u64),
        Signed(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(text) => text,
        RawId::Unsigned(n) => n.to_string(),
        RawId::Signed(n) => n.to_string(),
    })
}
