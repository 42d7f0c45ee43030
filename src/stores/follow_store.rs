use chrono::Utc;
use sea_orm::sea_query::{OnConflict, Query};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, JoinType, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Set,
};

use crate::errors::{DatabaseError, FollowError};
use crate::types::db::{artist, follow, title, user};

/// One row of the follower feed: a record joined with its owner and
/// artist, restricted to owners the querying user follows.
#[derive(FromQueryResult, Debug, Clone)]
pub struct FollowerRecord {
    pub id: i32,
    pub name: String,
    pub year: i32,
    pub color: Option<String>,
    pub notes: Option<String>,
    pub mail: bool,
    pub timestamp: i64,
    pub owner_id: i32,
    pub owner_email: String,
    pub owner_username: String,
    pub artist_name: String,
}

/// Directed follow edges over users.
///
/// Every user permanently follows themselves; that self-edge is what lets
/// the feed query return the caller's own records and followed users'
/// records in one pass. Follow and unfollow are idempotent, and racing
/// calls for the same pair resolve through the composite-key uniqueness
/// constraint rather than application-level locking.
pub struct FollowStore {
    db: DatabaseConnection,
}

impl FollowStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create the edge if absent. Calling twice has the same effect as
    /// calling once.
    pub async fn follow(&self, follower_id: i32, followed_id: i32) -> Result<(), FollowError> {
        let target = user::Entity::find_by_id(followed_id)
            .one(&self.db)
            .await
            .map_err(|e| DatabaseError::operation("follow", e))?;
        if target.is_none() {
            return Err(FollowError::UserNotFound {
                user_id: followed_id,
            });
        }

        self.insert_edge_if_absent(follower_id, followed_id).await?;
        Ok(())
    }

    /// Remove the edge if present. Refuses to touch the self-follow edge.
    pub async fn unfollow(&self, follower_id: i32, followed_id: i32) -> Result<(), FollowError> {
        if follower_id == followed_id {
            return Err(FollowError::SelfUnfollow {
                user_id: follower_id,
            });
        }

        follow::Entity::delete_many()
            .filter(follow::Column::FollowerId.eq(follower_id))
            .filter(follow::Column::FollowedId.eq(followed_id))
            .exec(&self.db)
            .await
            .map_err(|e| DatabaseError::operation("unfollow", e))?;

        Ok(())
    }

    pub async fn is_following(
        &self,
        follower_id: i32,
        followed_id: i32,
    ) -> Result<bool, FollowError> {
        let edge = follow::Entity::find_by_id((follower_id, followed_id))
            .one(&self.db)
            .await
            .map_err(|e| DatabaseError::operation("is_following", e))?;

        Ok(edge.is_some())
    }

    /// Ids of everyone following `user_id` (includes `user_id` itself via
    /// the self-edge).
    pub async fn followers(&self, user_id: i32) -> Result<Vec<i32>, FollowError> {
        let edges = follow::Entity::find()
            .filter(follow::Column::FollowedId.eq(user_id))
            .all(&self.db)
            .await
            .map_err(|e| DatabaseError::operation("followers", e))?;

        Ok(edges.into_iter().map(|e| e.follower_id).collect())
    }

    /// Ids of everyone `user_id` follows. Contains `user_id` itself;
    /// callers wanting "other users followed" filter it out.
    pub async fn followed(&self, user_id: i32) -> Result<Vec<i32>, FollowError> {
        let edges = follow::Entity::find()
            .filter(follow::Column::FollowerId.eq(user_id))
            .all(&self.db)
            .await
            .map_err(|e| DatabaseError::operation("followed", e))?;

        Ok(edges.into_iter().map(|e| e.followed_id).collect())
    }

    /// Make sure the self-follow edge exists. Safe to re-invoke.
    pub async fn ensure_self_follow(&self, user_id: i32) -> Result<(), FollowError> {
        self.insert_edge_if_absent(user_id, user_id).await?;
        Ok(())
    }

    /// Backfill self-follow edges across all users, returning how many
    /// were missing.
    pub async fn ensure_all_self_follows(&self) -> Result<u64, FollowError> {
        let users = user::Entity::find()
            .all(&self.db)
            .await
            .map_err(|e| DatabaseError::operation("ensure_all_self_follows", e))?;

        let mut repaired = 0;
        for user in users {
            repaired += self.insert_edge_if_absent(user.id, user.id).await?;
        }

        Ok(repaired)
    }

    /// The feed: records owned by anyone `user_id` follows (the caller's
    /// own records included, via the self-edge), newest first.
    ///
    /// Each call re-executes the query; no cursor state is retained.
    pub async fn follower_records(
        &self,
        user_id: i32,
        limit: Option<u64>,
    ) -> Result<Vec<FollowerRecord>, FollowError> {
        let followed_ids = Query::select()
            .column(follow::Column::FollowedId)
            .from(follow::Entity)
            .and_where(follow::Column::FollowerId.eq(user_id))
            .to_owned();

        let mut query = title::Entity::find()
            .join(JoinType::InnerJoin, title::Relation::Owner.def())
            .join(JoinType::InnerJoin, title::Relation::Artist.def())
            .column_as(user::Column::Email, "owner_email")
            .column_as(user::Column::Username, "owner_username")
            .column_as(artist::Column::Name, "artist_name")
            .filter(title::Column::OwnerId.in_subquery(followed_ids))
            .order_by_desc(title::Column::Timestamp)
            .order_by_desc(title::Column::Id);

        if let Some(limit) = limit {
            query = query.limit(limit);
        }

        query
            .into_model::<FollowerRecord>()
            .all(&self.db)
            .await
            .map_err(|e| DatabaseError::operation("follower_records", e).into())
    }

    /// Insert-or-ignore on the composite key; returns 1 if the edge was
    /// created, 0 if it already existed.
    async fn insert_edge_if_absent(
        &self,
        follower_id: i32,
        followed_id: i32,
    ) -> Result<u64, FollowError> {
        let edge = follow::ActiveModel {
            follower_id: Set(follower_id),
            followed_id: Set(followed_id),
            timestamp: Set(Utc::now().timestamp()),
        };

        let inserted = follow::Entity::insert(edge)
            .on_conflict(
                OnConflict::columns([follow::Column::FollowerId, follow::Column::FollowedId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await
            .map_err(|e| DatabaseError::operation("insert follow edge", e))?;

        Ok(inserted)
    }
}
