//! Job board engine: storage, remote feed IO and the stateful components built on them.
mod decode;
mod feed;
mod fetch;
mod filename;
mod kv;
mod persist;
mod profile;
mod selection_store;
mod types;

pub use decode::{decode_feed, DecodeError};
pub use feed::{JobFeed, LoadMore};
pub use fetch::{FeedSettings, FeedSource, ReqwestFeedSource, DEFAULT_FEED_URL};
pub use filename::key_filename;
pub use kv::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore, StorageError};
pub use persist::{ensure_dir, AtomicFileWriter, PersistError};
pub use profile::{ProfileStore, PROFILE_IMAGE_KEY};
pub use selection_store::{
    CorruptStateError, SelectionStore, StorageWriteError, SELECTED_JOBS_KEY,
};
pub use types::{FailureKind, FeedError};
