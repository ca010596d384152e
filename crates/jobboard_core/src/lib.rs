//! Job board core: listing model, saved-selection set and feed pagination state.
//!
//! Everything in here is pure. Storage and network IO live in `jobboard_engine`.
mod cursor;
mod listing;
mod selection;
mod view_model;

pub use cursor::{Completion, FeedCursor, FeedRequest, FeedSnapshot, RequestKind, DEFAULT_PAGE_SIZE};
pub use listing::{JobListing, ListingId, DEFAULT_JOB_TYPE, DEFAULT_LOCATION};
pub use selection::SelectionSet;
pub use view_model::{FeedView, JobCardView};
