use crate::{FeedSnapshot, JobListing, ListingId};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FeedView {
    pub cards: Vec<JobCardView>,
    pub requested_count: usize,
    pub loading_initial: bool,
    pub loading_more: bool,
    pub error: Option<String>,
    pub saved_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobCardView {
    pub id: ListingId,
    pub title: String,
    pub company: String,
    pub initial: char,
    pub tags: Vec<String>,
    pub saved: bool,
    pub apply_url: String,
}

impl FeedView {
    pub fn build(
        snapshot: &FeedSnapshot,
        saved_count: usize,
        is_saved: impl Fn(&str) -> bool,
    ) -> Self {
        Self {
            cards: snapshot
                .items
                .iter()
                .map(|listing| JobCardView::from_listing(listing, is_saved(&listing.id)))
                .collect(),
            requested_count: snapshot.requested_count,
            loading_initial: snapshot.loading_initial,
            loading_more: snapshot.loading_more,
            error: snapshot.error.clone(),
            saved_count,
        }
    }

    /// Nothing to show yet and a first page is still coming.
    pub fn is_blank_loading(&self) -> bool {
        self.loading_initial && self.cards.is_empty()
    }
}

impl JobCardView {
    pub fn from_listing(listing: &JobListing, saved: bool) -> Self {
        let mut tags = vec![
            listing.job_type_or_default().to_string(),
            listing.location_or_default().to_string(),
        ];
        if let Some(category) = listing.category.as_deref().filter(|c| !c.trim().is_empty()) {
            tags.push(category.to_string());
        }
        Self {
            id: listing.id.clone(),
            title: listing.title.clone(),
            company: listing.company_name.clone(),
            initial: listing.company_initial(),
            tags,
            saved,
            apply_url: listing.url.clone(),
        }
    }
}
