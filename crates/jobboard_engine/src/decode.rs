use jobboard_core::JobListing;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("feed body is not valid JSON: {0}")]
    Malformed(String),
    #[error("feed body has no `jobs` array")]
    MissingJobs,
    #[error("listing {index} is missing required field `{field}`")]
    MissingField { index: usize, field: &'static str },
    #[error("listing {index} has an id that is neither a string nor a number")]
    InvalidId { index: usize },
}

#[derive(Deserialize)]
struct FeedBody {
    #[serde(default)]
    jobs: Option<Vec<RawListing>>,
}

/// Listing as the remote feed sends it; every field may be absent or null.
#[derive(Deserialize)]
struct RawListing {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    company_name: Option<String>,
    #[serde(default)]
    company_logo: Option<String>,
    #[serde(default)]
    job_type: Option<String>,
    #[serde(default)]
    candidate_required_location: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

/// Decode a feed response body into validated listings.
///
/// Any listing without a usable `id`, `title` or `url` rejects the whole page.
pub fn decode_feed(bytes: &[u8]) -> Result<Vec<JobListing>, DecodeError> {
    let body: FeedBody =
        serde_json::from_slice(bytes).map_err(|err| DecodeError::Malformed(err.to_string()))?;
    let raw = body.jobs.ok_or(DecodeError::MissingJobs)?;

    raw.into_iter()
        .enumerate()
        .map(|(index, listing)| listing.validate(index))
        .collect()
}

impl RawListing {
    fn validate(self, index: usize) -> Result<JobListing, DecodeError> {
        let id = normalize_id(self.id, index)?;
        let title = required(self.title, index, "title")?;
        let url = required(self.url, index, "url")?;
        Ok(JobListing {
            id,
            title,
            company_name: self.company_name.unwrap_or_default(),
            company_logo: self.company_logo.filter(|logo| !logo.trim().is_empty()),
            job_type: self.job_type,
            candidate_required_location: self.candidate_required_location,
            category: self.category,
            url,
        })
    }
}

fn normalize_id(value: Option<Value>, index: usize) -> Result<String, DecodeError> {
    match value {
        None | Some(Value::Null) => Err(DecodeError::MissingField { index, field: "id" }),
        Some(Value::String(text)) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                Err(DecodeError::MissingField { index, field: "id" })
            } else {
                Ok(trimmed.to_string())
            }
        }
        Some(Value::Number(number)) => Ok(number.to_string()),
        Some(_) => Err(DecodeError::InvalidId { index }),
    }
}

fn required(value: Option<String>, index: usize, field: &'static str) -> Result<String, DecodeError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or(DecodeError::MissingField { index, field })
}
