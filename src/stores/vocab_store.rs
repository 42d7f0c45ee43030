use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, NotSet, QueryFilter, Set,
};

use crate::errors::DatabaseError;
use crate::types::db::{format, role, size};
use crate::types::internal::permission;

/// Seeds and looks up the fixed reference vocabularies: roles, sizes and
/// formats. Seeding runs at bootstrap and is safe to re-run.
pub struct VocabStore {
    db: DatabaseConnection,
}

impl VocabStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Seed all vocabularies. Idempotent.
    pub async fn seed(&self) -> Result<(), DatabaseError> {
        self.insert_roles().await?;
        self.insert_sizes().await?;
        self.insert_formats().await?;
        Ok(())
    }

    /// Insert or refresh the role vocabulary. The "user" role is the
    /// single default; "admin" carries the ADMINISTER bit.
    pub async fn insert_roles(&self) -> Result<(), DatabaseError> {
        let roles = [
            ("user", permission::USE, true),
            ("admin", permission::ADMINISTER, false),
        ];

        for (name, permissions, is_default) in roles {
            let existing = role::Entity::find()
                .filter(role::Column::Name.eq(name))
                .one(&self.db)
                .await
                .map_err(|e| DatabaseError::operation("insert_roles", e))?;

            match existing {
                Some(existing) => {
                    let mut active: role::ActiveModel = existing.into();
                    active.permissions = Set(permissions);
                    active.is_default = Set(is_default);
                    active
                        .update(&self.db)
                        .await
                        .map_err(|e| DatabaseError::operation("insert_roles", e))?;
                }
                None => {
                    role::ActiveModel {
                        id: NotSet,
                        name: Set(name.to_string()),
                        is_default: Set(is_default),
                        permissions: Set(permissions),
                    }
                    .insert(&self.db)
                    .await
                    .map_err(|e| DatabaseError::operation("insert_roles", e))?;
                }
            }
        }

        Ok(())
    }

    /// Insert the size vocabulary: 7, 10 and 12 inches. Idempotent.
    pub async fn insert_sizes(&self) -> Result<(), DatabaseError> {
        for name in [7, 10, 12] {
            let existing = size::Entity::find()
                .filter(size::Column::Name.eq(name))
                .one(&self.db)
                .await
                .map_err(|e| DatabaseError::operation("insert_sizes", e))?;

            if existing.is_none() {
                size::ActiveModel {
                    id: NotSet,
                    name: Set(name),
                }
                .insert(&self.db)
                .await
                .map_err(|e| DatabaseError::operation("insert_sizes", e))?;
            }
        }

        Ok(())
    }

    /// Insert the format vocabulary. Idempotent.
    pub async fn insert_formats(&self) -> Result<(), DatabaseError> {
        for name in ["vinyl"] {
            let existing = format::Entity::find()
                .filter(format::Column::Name.eq(name))
                .one(&self.db)
                .await
                .map_err(|e| DatabaseError::operation("insert_formats", e))?;

            if existing.is_none() {
                format::ActiveModel {
                    id: NotSet,
                    name: Set(name.to_string()),
                }
                .insert(&self.db)
                .await
                .map_err(|e| DatabaseError::operation("insert_formats", e))?;
            }
        }

        Ok(())
    }

    /// Look up a size id by its inch name.
    pub async fn size_id(&self, name: i32) -> Result<Option<i32>, DatabaseError> {
        let size = size::Entity::find()
            .filter(size::Column::Name.eq(name))
            .one(&self.db)
            .await
            .map_err(|e| DatabaseError::operation("size_id", e))?;

        Ok(size.map(|s| s.id))
    }

    /// Look up a format id by name.
    pub async fn format_id(&self, name: &str) -> Result<Option<i32>, DatabaseError> {
        let format = format::Entity::find()
            .filter(format::Column::Name.eq(name))
            .one(&self.db)
            .await
            .map_err(|e| DatabaseError::operation("format_id", e))?;

        Ok(format.map(|f| f.id))
    }
}
