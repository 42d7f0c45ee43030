// Stores layer - Data access and repository pattern
pub mod follow_store;
pub mod record_store;
pub mod user_store;
pub mod vocab_store;

pub use follow_store::{FollowStore, FollowerRecord};
pub use record_store::{partition, NewRecord, OwnedRecord, RecordStore, RecordUpdate};
pub use user_store::{ProfileUpdate, UserStore};
pub use vocab_store::VocabStore;
