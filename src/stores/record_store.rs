use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    FromQueryResult, JoinType, NotSet, QueryFilter, QueryOrder, QuerySelect, RelationTrait,
    Select, Set, TransactionTrait,
};
use std::collections::BTreeMap;

use crate::errors::{DatabaseError, RecordError};
use crate::types::db::{artist, format, image, size, title};

/// A record joined with its reference vocabulary names, as consumed by
/// the view layer.
#[derive(FromQueryResult, Debug, Clone)]
pub struct OwnedRecord {
    pub id: i32,
    pub name: String,
    pub year: i32,
    pub color: Option<String>,
    pub notes: Option<String>,
    pub mail: bool,
    pub timestamp: i64,
    pub owner_id: i32,
    pub artist_name: String,
    pub size_name: i32,
    pub format_name: String,
}

/// Input for adding a record to a collection.
#[derive(Debug, Clone)]
pub struct NewRecord {
    pub artist: String,
    pub name: String,
    pub year: i32,
    pub size_id: i32,
    pub format_id: i32,
    pub color: Option<String>,
    pub notes: Option<String>,
    pub mail: bool,
    pub image_url: Option<String>,
}

/// Replacement attributes for an owner-initiated edit.
#[derive(Debug, Clone)]
pub struct RecordUpdate {
    pub artist: String,
    pub name: String,
    pub year: i32,
    pub size_id: i32,
    pub format_id: i32,
    pub color: Option<String>,
    pub notes: Option<String>,
    pub mail: bool,
    pub image_url: Option<String>,
}

/// Record-to-owner mapping and grouped retrieval.
///
/// Every record belongs to exactly one owner. Reads are filtered by exact
/// owner match server-side; mutations check the requesting user against
/// the stored owner here, not only at the view layer.
pub struct RecordStore {
    db: DatabaseConnection,
}

impl RecordStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// All records owned by `owner_id`, with artist, size and format
    /// names joined in.
    pub async fn records_owned_by(&self, owner_id: i32) -> Result<Vec<OwnedRecord>, RecordError> {
        self.owned_query(owner_id)
            .order_by_asc(title::Column::Id)
            .into_model::<OwnedRecord>()
            .all(&self.db)
            .await
            .map_err(|e| DatabaseError::operation("records_owned_by", e).into())
    }

    /// Owner's records ordered for export: size, then year, then artist,
    /// then name.
    pub async fn export_owned(&self, owner_id: i32) -> Result<Vec<OwnedRecord>, RecordError> {
        let mut records = self.records_owned_by(owner_id).await?;

        records.sort_by(|a, b| {
            a.size_name
                .cmp(&b.size_name)
                .then(a.year.cmp(&b.year))
                .then_with(|| a.artist_name.cmp(&b.artist_name))
                .then_with(|| a.name.cmp(&b.name))
        });

        Ok(records)
    }

    /// Add a record to `owner_id`'s collection.
    ///
    /// The artist is created on first use. If the same owner already has
    /// a record with identical (name, artist, year, format, size, color,
    /// notes), nothing is inserted and `RecordError::Duplicate` is
    /// returned.
    pub async fn add_owned(
        &self,
        owner_id: i32,
        new: NewRecord,
    ) -> Result<title::Model, RecordError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| DatabaseError::TransactionBegin { source: e })?;

        let artist_id = get_or_create_artist(&txn, &new.artist).await?;

        let duplicate = find_duplicate(
            &txn, owner_id, artist_id, &new.name, new.year, new.format_id, new.size_id,
            &new.color, &new.notes,
        )
        .await?;
        if duplicate.is_some() {
            return Err(RecordError::Duplicate);
        }

        let created = title::ActiveModel {
            id: NotSet,
            name: Set(new.name),
            artist_id: Set(artist_id),
            size_id: Set(new.size_id),
            format_id: Set(new.format_id),
            color: Set(new.color),
            year: Set(new.year),
            notes: Set(new.notes),
            owner_id: Set(owner_id),
            mail: Set(new.mail),
            timestamp: Set(Utc::now().timestamp()),
        }
        .insert(&txn)
        .await
        .map_err(|e| DatabaseError::operation("add_owned", e))?;

        if let Some(url) = new.image_url {
            image::ActiveModel {
                record_id: Set(created.id),
                image_url: Set(url),
            }
            .insert(&txn)
            .await
            .map_err(|e| DatabaseError::operation("add_owned", e))?;
        }

        txn.commit()
            .await
            .map_err(|e| DatabaseError::TransactionCommit { source: e })?;

        Ok(created)
    }

    /// Owner-initiated edit of a record's attributes, the mail flag
    /// included. Fails with `NotOwner` when the requesting user does not
    /// own the record.
    pub async fn reassign(
        &self,
        record_id: i32,
        requesting_user_id: i32,
        update: RecordUpdate,
    ) -> Result<title::Model, RecordError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| DatabaseError::TransactionBegin { source: e })?;

        let record = title::Entity::find_by_id(record_id)
            .one(&txn)
            .await
            .map_err(|e| DatabaseError::operation("reassign", e))?
            .ok_or(RecordError::NotFound { record_id })?;

        if record.owner_id != requesting_user_id {
            return Err(RecordError::NotOwner {
                record_id,
                user_id: requesting_user_id,
            });
        }

        let artist_id = get_or_create_artist(&txn, &update.artist).await?;

        let mut active: title::ActiveModel = record.into();
        active.name = Set(update.name);
        active.artist_id = Set(artist_id);
        active.size_id = Set(update.size_id);
        active.format_id = Set(update.format_id);
        active.color = Set(update.color);
        active.year = Set(update.year);
        active.notes = Set(update.notes);
        active.mail = Set(update.mail);

        let updated = active
            .update(&txn)
            .await
            .map_err(|e| DatabaseError::operation("reassign", e))?;

        if let Some(url) = update.image_url {
            let existing = image::Entity::find_by_id(record_id)
                .one(&txn)
                .await
                .map_err(|e| DatabaseError::operation("reassign", e))?;

            match existing {
                Some(existing) => {
                    let mut active: image::ActiveModel = existing.into();
                    active.image_url = Set(url);
                    active
                        .update(&txn)
                        .await
                        .map_err(|e| DatabaseError::operation("reassign", e))?;
                }
                None => {
                    image::ActiveModel {
                        record_id: Set(record_id),
                        image_url: Set(url),
                    }
                    .insert(&txn)
                    .await
                    .map_err(|e| DatabaseError::operation("reassign", e))?;
                }
            }
        }

        txn.commit()
            .await
            .map_err(|e| DatabaseError::TransactionCommit { source: e })?;

        Ok(updated)
    }

    /// Flip the mail ("incoming") flag. An attribute toggle, not a
    /// lifecycle state; the owner may flip it in either direction.
    pub async fn set_mail(
        &self,
        record_id: i32,
        requesting_user_id: i32,
        mail: bool,
    ) -> Result<title::Model, RecordError> {
        let record = title::Entity::find_by_id(record_id)
            .one(&self.db)
            .await
            .map_err(|e| DatabaseError::operation("set_mail", e))?
            .ok_or(RecordError::NotFound { record_id })?;

        if record.owner_id != requesting_user_id {
            return Err(RecordError::NotOwner {
                record_id,
                user_id: requesting_user_id,
            });
        }

        let mut active: title::ActiveModel = record.into();
        active.mail = Set(mail);

        active
            .update(&self.db)
            .await
            .map_err(|e| DatabaseError::operation("set_mail", e).into())
    }

    /// Delete a record and its auxiliary image reference. Fails with
    /// `NotOwner` when the requesting user does not own the record; the
    /// record is left untouched in that case.
    pub async fn remove_owned(
        &self,
        record_id: i32,
        requesting_user_id: i32,
    ) -> Result<(), RecordError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| DatabaseError::TransactionBegin { source: e })?;

        let record = title::Entity::find_by_id(record_id)
            .one(&txn)
            .await
            .map_err(|e| DatabaseError::operation("remove_owned", e))?
            .ok_or(RecordError::NotFound { record_id })?;

        if record.owner_id != requesting_user_id {
            return Err(RecordError::NotOwner {
                record_id,
                user_id: requesting_user_id,
            });
        }

        image::Entity::delete_many()
            .filter(image::Column::RecordId.eq(record_id))
            .exec(&txn)
            .await
            .map_err(|e| DatabaseError::operation("remove_owned", e))?;

        title::Entity::delete_by_id(record_id)
            .exec(&txn)
            .await
            .map_err(|e| DatabaseError::operation("remove_owned", e))?;

        txn.commit()
            .await
            .map_err(|e| DatabaseError::TransactionCommit { source: e })?;

        Ok(())
    }

    fn owned_query(&self, owner_id: i32) -> Select<title::Entity> {
        title::Entity::find()
            .join(JoinType::InnerJoin, title::Relation::Artist.def())
            .join(JoinType::InnerJoin, title::Relation::Size.def())
            .join(JoinType::InnerJoin, title::Relation::Format.def())
            .column_as(artist::Column::Name, "artist_name")
            .column_as(size::Column::Name, "size_name")
            .column_as(format::Column::Name, "format_name")
            .filter(title::Column::OwnerId.eq(owner_id))
    }
}

/// Group records into (size, mail-flag) buckets, each sorted by artist
/// name case-insensitively and then year.
///
/// The result is a BTreeMap so bucket iteration order, like the order
/// within each bucket, is deterministic for identical inputs.
pub fn partition(records: Vec<OwnedRecord>) -> BTreeMap<(i32, bool), Vec<OwnedRecord>> {
    let mut buckets: BTreeMap<(i32, bool), Vec<OwnedRecord>> = BTreeMap::new();

    for record in records {
        buckets
            .entry((record.size_name, record.mail))
            .or_default()
            .push(record);
    }

    for bucket in buckets.values_mut() {
        bucket.sort_by(|a, b| {
            a.artist_name
                .to_lowercase()
                .cmp(&b.artist_name.to_lowercase())
                .then(a.year.cmp(&b.year))
        });
    }

    buckets
}

async fn get_or_create_artist<C: ConnectionTrait>(
    conn: &C,
    name: &str,
) -> Result<i32, RecordError> {
    let existing = artist::Entity::find()
        .filter(artist::Column::Name.eq(name))
        .one(conn)
        .await
        .map_err(|e| DatabaseError::operation("get_or_create_artist", e))?;

    if let Some(artist) = existing {
        return Ok(artist.id);
    }

    // Insert-or-ignore so a racing insert of the same name is harmless,
    // then re-read for the id
    artist::Entity::insert(artist::ActiveModel {
        id: NotSet,
        name: Set(name.to_string()),
    })
    .on_conflict(
        OnConflict::column(artist::Column::Name)
            .do_nothing()
            .to_owned(),
    )
    .exec_without_returning(conn)
    .await
    .map_err(|e| DatabaseError::operation("get_or_create_artist", e))?;

    let created = artist::Entity::find()
        .filter(artist::Column::Name.eq(name))
        .one(conn)
        .await
        .map_err(|e| DatabaseError::operation("get_or_create_artist", e))?
        .ok_or_else(|| {
            DatabaseError::operation(
                "get_or_create_artist",
                sea_orm::DbErr::Custom("artist missing after insert".to_string()),
            )
        })?;

    Ok(created.id)
}

#[allow(clippy::too_many_arguments)]
async fn find_duplicate<C: ConnectionTrait>(
    conn: &C,
    owner_id: i32,
    artist_id: i32,
    name: &str,
    year: i32,
    format_id: i32,
    size_id: i32,
    color: &Option<String>,
    notes: &Option<String>,
) -> Result<Option<title::Model>, RecordError> {
    let mut query = title::Entity::find()
        .filter(title::Column::OwnerId.eq(owner_id))
        .filter(title::Column::ArtistId.eq(artist_id))
        .filter(title::Column::Name.eq(name))
        .filter(title::Column::Year.eq(year))
        .filter(title::Column::FormatId.eq(format_id))
        .filter(title::Column::SizeId.eq(size_id));

    // `= NULL` never matches in SQL, so null attributes need IS NULL
    query = match color {
        Some(color) => query.filter(title::Column::Color.eq(color.clone())),
        None => query.filter(title::Column::Color.is_null()),
    };
    query = match notes {
        Some(notes) => query.filter(title::Column::Notes.eq(notes.clone())),
        None => query.filter(title::Column::Notes.is_null()),
    };

    query
        .one(conn)
        .await
        .map_err(|e| DatabaseError::operation("find_duplicate", e).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(artist: &str, size: i32, mail: bool, year: i32) -> OwnedRecord {
        OwnedRecord {
            id: 0,
            name: format!("{} record", artist),
            year,
            color: None,
            notes: None,
            mail,
            timestamp: 0,
            owner_id: 1,
            artist_name: artist.to_string(),
            size_name: size,
            format_name: "vinyl".to_string(),
        }
    }

    #[test]
    fn test_partition_groups_by_size_and_mail() {
        let buckets = partition(vec![
            record("B", 10, false, 1970),
            record("A", 10, false, 1975),
            record("A", 10, true, 1980),
        ]);

        let shelf = buckets.get(&(10, false)).expect("size10/mail0 bucket");
        assert_eq!(shelf.len(), 2);
        assert_eq!(shelf[0].artist_name, "A");
        assert_eq!(shelf[1].artist_name, "B");

        let incoming = buckets.get(&(10, true)).expect("size10/mail1 bucket");
        assert_eq!(incoming.len(), 1);
        assert_eq!(incoming[0].artist_name, "A");
    }

    #[test]
    fn test_partition_sorts_artists_case_insensitively() {
        let buckets = partition(vec![
            record("black sabbath", 12, false, 1970),
            record("Budgie", 12, false, 1971),
            record("BLUE CHEER", 12, false, 1968),
        ]);

        let shelf = buckets.get(&(12, false)).unwrap();
        let order: Vec<&str> = shelf.iter().map(|r| r.artist_name.as_str()).collect();

        assert_eq!(order, vec!["black sabbath", "BLUE CHEER", "Budgie"]);
    }

    #[test]
    fn test_partition_breaks_artist_ties_by_year() {
        let buckets = partition(vec![
            record("Pentagram", 12, false, 1985),
            record("Pentagram", 12, false, 1973),
        ]);

        let shelf = buckets.get(&(12, false)).unwrap();

        assert_eq!(shelf[0].year, 1973);
        assert_eq!(shelf[1].year, 1985);
    }

    #[test]
    fn test_partition_of_nothing_is_empty() {
        assert!(partition(vec![]).is_empty());
    }

    #[test]
    fn test_partition_is_deterministic() {
        let records = || {
            vec![
                record("A", 7, false, 1970),
                record("B", 7, true, 1971),
                record("C", 12, false, 1972),
            ]
        };

        let first: Vec<_> = partition(records()).into_keys().collect();
        let second: Vec<_> = partition(records()).into_keys().collect();

        assert_eq!(first, second);
    }
}
