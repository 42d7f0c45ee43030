use poem_openapi::Object;
use serde::{Deserialize, Serialize};

/// Request model for adding a record
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct AddRecordRequest {
    pub artist: String,
    pub title: String,
    pub year: i32,

    /// Record size in inches (7, 10 or 12)
    pub size: i32,

    /// Format name; defaults to vinyl
    pub format: Option<String>,

    pub color: Option<String>,
    pub notes: Option<String>,

    /// Whether the record is still in the mail
    pub incoming: bool,

    pub image_url: Option<String>,
}

/// Request model for editing a record
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct EditRecordRequest {
    pub artist: String,
    pub title: String,
    pub year: i32,
    pub size: i32,
    pub format: Option<String>,
    pub color: Option<String>,
    pub notes: Option<String>,
    pub incoming: bool,
    pub image_url: Option<String>,
}

/// One record as exposed to clients; the id is obfuscated
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct RecordResponse {
    /// Opaque record id for use in record-scoped endpoints
    pub id: String,

    pub artist: String,
    pub title: String,
    pub year: i32,
    pub size: i32,
    pub color: Option<String>,
    pub notes: Option<String>,
    pub incoming: bool,

    /// Unix timestamp of record creation
    pub timestamp: i64,
}

/// One (size, incoming) shelf of a user's collection
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct ShelfBucket {
    pub size: i32,
    pub incoming: bool,
    pub records: Vec<RecordResponse>,
}

/// A user's collection partitioned into shelves
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct ShelvesResponse {
    pub username: String,
    pub record_count: u64,
    pub shelves: Vec<ShelfBucket>,
}

/// One entry of the follower feed
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct FeedItem {
    /// Opaque record id
    pub id: String,

    pub artist: String,
    pub title: String,

    /// Owner's username, or "you" for the caller's own records
    pub user: String,

    pub timestamp: i64,
}

/// Directory entry for the all-users listing
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct UserSummary {
    pub username: String,
    pub member_since: i64,
}
