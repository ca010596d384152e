use std::collections::HashSet;

use crate::JobListing;

/// Saved listings in the order the user saved them. At most one entry per id.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectionSet {
    listings: Vec<JobListing>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from a persisted snapshot. Later repeats of an id are dropped.
    pub fn from_listings(listings: Vec<JobListing>) -> Self {
        let mut seen = HashSet::with_capacity(listings.len());
        let listings = listings
            .into_iter()
            .filter(|listing| seen.insert(listing.id.clone()))
            .collect();
        Self { listings }
    }

    /// Remove the listing if its id is present, append it otherwise.
    /// Returns whether the id is selected afterwards.
    pub fn toggle(&mut self, listing: &JobListing) -> bool {
        match self.position(&listing.id) {
            Some(index) => {
                self.listings.remove(index);
                false
            }
            None => {
                self.listings.push(listing.clone());
                true
            }
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    pub fn as_slice(&self) -> &[JobListing] {
        &self.listings
    }

    pub fn iter(&self) -> impl Iterator<Item = &JobListing> {
        self.listings.iter()
    }

    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }

    pub fn clear(&mut self) {
        self.listings.clear();
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.listings.iter().position(|listing| listing.id == id)
    }
}

impl<'a> IntoIterator for &'a SelectionSet {
    type Item = &'a JobListing;
    type IntoIter = std::slice::Iter<'a, JobListing>;

    fn into_iter(self) -> Self::IntoIter {
        self.listings.iter()
    }
}
