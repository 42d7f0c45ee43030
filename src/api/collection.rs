use poem_openapi::{param::Path, payload::Json, OpenApi, Tags};
use std::sync::Arc;

use crate::api::{authenticate, UserAuth};
use crate::app_data::AppData;
use crate::errors::ApiError;
use crate::stores::record_store::partition;
use crate::stores::{NewRecord, OwnedRecord, RecordUpdate};
use crate::types::dto::account::MessageResponse;
use crate::types::dto::collection::{
    AddRecordRequest, EditRecordRequest, FeedItem, RecordResponse, ShelfBucket, ShelvesResponse,
    UserSummary,
};

/// Collection and social graph endpoints
pub struct CollectionApi {
    data: Arc<AppData>,
}

#[derive(Tags)]
enum CollectionTags {
    /// Owned records
    Collection,
    /// Follow graph
    Social,
}

impl CollectionApi {
    pub fn new(data: Arc<AppData>) -> Self {
        Self { data }
    }

    fn decode_record_id(&self, encoded: &str) -> Result<i32, ApiError> {
        // A bad token is a plain 404; decoding internals stay invisible
        let id = self.data.codec.decode(encoded)?;
        i32::try_from(id).map_err(|_| ApiError::not_found())
    }

    fn encode_record_id(&self, id: i32) -> Result<String, ApiError> {
        self.data
            .codec
            .encode(i64::from(id))
            .map_err(|_| ApiError::internal())
    }

    fn owned_to_response(&self, record: OwnedRecord) -> Result<RecordResponse, ApiError> {
        Ok(RecordResponse {
            id: self.encode_record_id(record.id)?,
            artist: record.artist_name,
            title: record.name,
            year: record.year,
            size: record.size_name,
            color: record.color,
            notes: record.notes,
            incoming: record.mail,
            timestamp: record.timestamp,
        })
    }

    async fn resolve_size_and_format(
        &self,
        size: i32,
        format: Option<&str>,
    ) -> Result<(i32, i32), ApiError> {
        let size_id = self
            .data
            .vocab_store
            .size_id(size)
            .await?
            .ok_or_else(|| ApiError::constraint_violation("size", "Unknown size"))?;

        let format_name = format.unwrap_or("vinyl");
        let format_id = self
            .data
            .vocab_store
            .format_id(format_name)
            .await?
            .ok_or_else(|| ApiError::constraint_violation("format", "Unknown format"))?;

        Ok((size_id, format_id))
    }
}

#[OpenApi]
impl CollectionApi {
    /// List all users, ordered by username
    #[oai(path = "/users", method = "get", tag = "CollectionTags::Social")]
    async fn all_users(&self) -> Result<Json<Vec<UserSummary>>, ApiError> {
        let users = self.data.user_store.all_users().await?;

        Ok(Json(
            users
                .into_iter()
                .map(|u| UserSummary {
                    username: u.username,
                    member_since: u.member_since,
                })
                .collect(),
        ))
    }

    /// A user's collection, partitioned into (size, incoming) shelves
    #[oai(path = "/collections/:username", method = "get", tag = "CollectionTags::Collection")]
    async fn collection(&self, username: Path<String>) -> Result<Json<ShelvesResponse>, ApiError> {
        let user = self
            .data
            .user_store
            .find_by_username(&username.0)
            .await?
            .ok_or_else(ApiError::not_found)?;

        let records = self.data.record_store.records_owned_by(user.id).await?;
        let record_count = records.len() as u64;

        let mut shelves = Vec::new();
        for ((size, incoming), bucket) in partition(records) {
            let records = bucket
                .into_iter()
                .map(|r| self.owned_to_response(r))
                .collect::<Result<Vec<_>, _>>()?;
            shelves.push(ShelfBucket {
                size,
                incoming,
                records,
            });
        }

        Ok(Json(ShelvesResponse {
            username: user.username,
            record_count,
            shelves,
        }))
    }

    /// Export the caller's own collection, ordered by size, year, artist
    /// and title
    #[oai(path = "/collections/:username/export", method = "get", tag = "CollectionTags::Collection")]
    async fn export(
        &self,
        auth: UserAuth,
        username: Path<String>,
    ) -> Result<Json<Vec<RecordResponse>>, ApiError> {
        let caller = authenticate(&self.data, &auth).await?;

        if caller.username != username.0 {
            return Err(ApiError::forbidden("You can only export your own collection"));
        }

        let records = self.data.record_store.export_owned(caller.id).await?;
        let records = records
            .into_iter()
            .map(|r| self.owned_to_response(r))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Json(records))
    }

    /// Add a record to the caller's collection
    #[oai(path = "/records", method = "post", tag = "CollectionTags::Collection")]
    async fn add_record(
        &self,
        auth: UserAuth,
        body: Json<AddRecordRequest>,
    ) -> Result<Json<RecordResponse>, ApiError> {
        let caller = authenticate(&self.data, &auth).await?;
        let (size_id, format_id) = self
            .resolve_size_and_format(body.size, body.format.as_deref())
            .await?;

        let created = self
            .data
            .record_store
            .add_owned(
                caller.id,
                NewRecord {
                    artist: body.artist.clone(),
                    name: body.title.clone(),
                    year: body.year,
                    size_id,
                    format_id,
                    color: body.color.clone(),
                    notes: body.notes.clone(),
                    mail: body.incoming,
                    image_url: body.image_url.clone(),
                },
            )
            .await?;

        Ok(Json(RecordResponse {
            id: self.encode_record_id(created.id)?,
            artist: body.artist.clone(),
            title: created.name,
            year: created.year,
            size: body.size,
            color: created.color,
            notes: created.notes,
            incoming: created.mail,
            timestamp: created.timestamp,
        }))
    }

    /// Edit a record the caller owns
    #[oai(path = "/records/:encoded_id", method = "put", tag = "CollectionTags::Collection")]
    async fn edit_record(
        &self,
        auth: UserAuth,
        encoded_id: Path<String>,
        body: Json<EditRecordRequest>,
    ) -> Result<Json<RecordResponse>, ApiError> {
        let caller = authenticate(&self.data, &auth).await?;
        let record_id = self.decode_record_id(&encoded_id.0)?;
        let (size_id, format_id) = self
            .resolve_size_and_format(body.size, body.format.as_deref())
            .await?;

        let updated = self
            .data
            .record_store
            .reassign(
                record_id,
                caller.id,
                RecordUpdate {
                    artist: body.artist.clone(),
                    name: body.title.clone(),
                    year: body.year,
                    size_id,
                    format_id,
                    color: body.color.clone(),
                    notes: body.notes.clone(),
                    mail: body.incoming,
                    image_url: body.image_url.clone(),
                },
            )
            .await?;

        Ok(Json(RecordResponse {
            id: self.encode_record_id(updated.id)?,
            artist: body.artist.clone(),
            title: updated.name,
            year: updated.year,
            size: body.size,
            color: updated.color,
            notes: updated.notes,
            incoming: updated.mail,
            timestamp: updated.timestamp,
        }))
    }

    /// Mark an incoming record as arrived
    #[oai(path = "/records/:encoded_id/arrived", method = "post", tag = "CollectionTags::Collection")]
    async fn record_arrived(
        &self,
        auth: UserAuth,
        encoded_id: Path<String>,
    ) -> Result<Json<MessageResponse>, ApiError> {
        let caller = authenticate(&self.data, &auth).await?;
        let record_id = self.decode_record_id(&encoded_id.0)?;

        self.data
            .record_store
            .set_mail(record_id, caller.id, false)
            .await?;

        Ok(Json(MessageResponse {
            message: "Record marked as arrived".to_string(),
        }))
    }

    /// Delete a record the caller owns
    #[oai(path = "/records/:encoded_id", method = "delete", tag = "CollectionTags::Collection")]
    async fn delete_record(
        &self,
        auth: UserAuth,
        encoded_id: Path<String>,
    ) -> Result<Json<MessageResponse>, ApiError> {
        let caller = authenticate(&self.data, &auth).await?;
        let record_id = self.decode_record_id(&encoded_id.0)?;

        self.data
            .record_store
            .remove_owned(record_id, caller.id)
            .await?;

        Ok(Json(MessageResponse {
            message: "Record deleted".to_string(),
        }))
    }

    /// Follow a user
    #[oai(path = "/follow/:username", method = "post", tag = "CollectionTags::Social")]
    async fn follow(
        &self,
        auth: UserAuth,
        username: Path<String>,
    ) -> Result<Json<MessageResponse>, ApiError> {
        let caller = authenticate(&self.data, &auth).await?;
        let target = self
            .data
            .user_store
            .find_by_username(&username.0)
            .await?
            .ok_or_else(ApiError::not_found)?;

        self.data.follow_store.follow(caller.id, target.id).await?;

        Ok(Json(MessageResponse {
            message: format!("You are now following {}", target.username),
        }))
    }

    /// Unfollow a user
    ///
    /// The self-follow edge cannot be removed.
    #[oai(path = "/unfollow/:username", method = "post", tag = "CollectionTags::Social")]
    async fn unfollow(
        &self,
        auth: UserAuth,
        username: Path<String>,
    ) -> Result<Json<MessageResponse>, ApiError> {
        let caller = authenticate(&self.data, &auth).await?;
        let target = self
            .data
            .user_store
            .find_by_username(&username.0)
            .await?
            .ok_or_else(ApiError::not_found)?;

        self.data
            .follow_store
            .unfollow(caller.id, target.id)
            .await?;

        Ok(Json(MessageResponse {
            message: format!("You are not following {} anymore", target.username),
        }))
    }

    /// The caller's feed: latest records from the caller and everyone
    /// they follow
    #[oai(path = "/feed", method = "get", tag = "CollectionTags::Social")]
    async fn feed(&self, auth: UserAuth) -> Result<Json<Vec<FeedItem>>, ApiError> {
        let caller = authenticate(&self.data, &auth).await?;

        let records = self
            .data
            .follow_store
            .follower_records(caller.id, Some(10))
            .await?;

        let mut items = Vec::with_capacity(records.len());
        for record in records {
            items.push(FeedItem {
                id: self.encode_record_id(record.id)?,
                artist: record.artist_name,
                title: record.name,
                user: if record.owner_username == caller.username {
                    "you".to_string()
                } else {
                    record.owner_username
                },
                timestamp: record.timestamp,
            });
        }

        Ok(Json(items))
    }
}
