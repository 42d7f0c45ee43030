use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, NotSet, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};

use crate::errors::{DatabaseError, UserError};
use crate::types::db::{follow, role, user};
use crate::types::internal::Identity;

/// Profile fields a user may edit on their own account
#[derive(Debug, Default, Clone)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub location: Option<String>,
    pub about_me: Option<String>,
}

/// Identity records: registration, lookup, credential and account-state
/// mutations. Every multi-step mutation runs in a transaction so a
/// concurrent reader never observes a half-applied state.
pub struct UserStore {
    db: DatabaseConnection,
}

impl UserStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Register a new, unconfirmed user with the default role.
    ///
    /// The self-follow edge is created in the same transaction, so no
    /// user is ever visible without it.
    ///
    /// # Returns
    /// * `Ok(user::Model)` - The created user
    /// * `Err(UserError::DuplicateEmail | DuplicateUsername)` - Unique
    ///   field already registered
    pub async fn register(
        &self,
        email: &str,
        username: &str,
        password: &str,
    ) -> Result<user::Model, UserError> {
        let password_hash = hash_password(password)?;

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| DatabaseError::TransactionBegin { source: e })?;

        let email_taken = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&txn)
            .await
            .map_err(|e| DatabaseError::operation("register", e))?;
        if email_taken.is_some() {
            return Err(UserError::DuplicateEmail {
                email: email.to_string(),
            });
        }

        let username_taken = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&txn)
            .await
            .map_err(|e| DatabaseError::operation("register", e))?;
        if username_taken.is_some() {
            return Err(UserError::DuplicateUsername {
                username: username.to_string(),
            });
        }

        let default_role = role::Entity::find()
            .filter(role::Column::IsDefault.eq(true))
            .one(&txn)
            .await
            .map_err(|e| DatabaseError::operation("register", e))?
            .ok_or_else(|| {
                DatabaseError::operation(
                    "register",
                    sea_orm::DbErr::Custom("no default role seeded".to_string()),
                )
            })?;

        let now = Utc::now().timestamp();

        let created = user::ActiveModel {
            id: NotSet,
            email: Set(email.to_string()),
            username: Set(username.to_string()),
            password_hash: Set(password_hash),
            confirmed: Set(false),
            role_id: Set(default_role.id),
            name: Set(None),
            location: Set(None),
            about_me: Set(None),
            member_since: Set(now),
            last_seen: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| map_unique_violation(e, email, username))?;

        // Self-follow is created atomically with the user
        follow::ActiveModel {
            follower_id: Set(created.id),
            followed_id: Set(created.id),
            timestamp: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| DatabaseError::operation("register", e))?;

        txn.commit()
            .await
            .map_err(|e| DatabaseError::TransactionCommit { source: e })?;

        Ok(created)
    }

    /// Fetch a user by id.
    pub async fn get(&self, user_id: i32) -> Result<user::Model, UserError> {
        user::Entity::find_by_id(user_id)
            .one(&self.db)
            .await
            .map_err(|e| UserError::Database(DatabaseError::operation("get", e)))?
            .ok_or(UserError::NotFound { user_id })
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<user::Model>, DatabaseError> {
        user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(|e| DatabaseError::operation("find_by_email", e))
    }

    pub async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<user::Model>, DatabaseError> {
        user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(|e| DatabaseError::operation("find_by_username", e))
    }

    /// All users, ordered by username.
    pub async fn all_users(&self) -> Result<Vec<user::Model>, DatabaseError> {
        user::Entity::find()
            .order_by_asc(user::Column::Username)
            .all(&self.db)
            .await
            .map_err(|e| DatabaseError::operation("all_users", e))
    }

    /// Verify login credentials and return the user on success.
    ///
    /// A missing account and a wrong password are indistinguishable to
    /// the caller.
    pub async fn verify_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<user::Model, UserError> {
        let user = self
            .find_by_email(email)
            .await?
            .ok_or(UserError::InvalidCredentials)?;

        if !verify_hash(password, &user.password_hash) {
            return Err(UserError::InvalidCredentials);
        }

        Ok(user)
    }

    /// Mark an account as confirmed.
    pub async fn mark_confirmed(&self, user_id: i32) -> Result<(), UserError> {
        let user = self.get(user_id).await?;

        let mut active: user::ActiveModel = user.into();
        active.confirmed = Set(true);
        active
            .update(&self.db)
            .await
            .map_err(|e| UserError::Database(DatabaseError::operation("mark_confirmed", e)))?;

        Ok(())
    }

    /// Replace a user's password without checking the old one (password
    /// reset; the verified token is the authority).
    pub async fn set_password(&self, user_id: i32, new_password: &str) -> Result<(), UserError> {
        let user = self.get(user_id).await?;
        let password_hash = hash_password(new_password)?;

        let mut active: user::ActiveModel = user.into();
        active.password_hash = Set(password_hash);
        active
            .update(&self.db)
            .await
            .map_err(|e| UserError::Database(DatabaseError::operation("set_password", e)))?;

        Ok(())
    }

    /// Replace a user's password after checking the old one.
    pub async fn change_password(
        &self,
        user_id: i32,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), UserError> {
        let user = self.get(user_id).await?;

        if !verify_hash(old_password, &user.password_hash) {
            return Err(UserError::InvalidCredentials);
        }

        let password_hash = hash_password(new_password)?;
        let mut active: user::ActiveModel = user.into();
        active.password_hash = Set(password_hash);
        active
            .update(&self.db)
            .await
            .map_err(|e| UserError::Database(DatabaseError::operation("change_password", e)))?;

        Ok(())
    }

    /// Point an account at a new email address, enforcing uniqueness.
    pub async fn change_email(&self, user_id: i32, new_email: &str) -> Result<(), UserError> {
        let user = self.get(user_id).await?;

        let taken = self.find_by_email(new_email).await?;
        if taken.map(|u| u.id != user_id).unwrap_or(false) {
            return Err(UserError::DuplicateEmail {
                email: new_email.to_string(),
            });
        }

        let mut active: user::ActiveModel = user.into();
        active.email = Set(new_email.to_string());
        active
            .update(&self.db)
            .await
            .map_err(|e| map_unique_violation(e, new_email, ""))?;

        Ok(())
    }

    /// Bump last-seen to now.
    pub async fn ping(&self, user_id: i32) -> Result<(), UserError> {
        let user = self.get(user_id).await?;

        let mut active: user::ActiveModel = user.into();
        active.last_seen = Set(Utc::now().timestamp());
        active
            .update(&self.db)
            .await
            .map_err(|e| UserError::Database(DatabaseError::operation("ping", e)))?;

        Ok(())
    }

    /// Update a user's own profile fields.
    pub async fn update_profile(
        &self,
        user_id: i32,
        update: ProfileUpdate,
    ) -> Result<user::Model, UserError> {
        let user = self.get(user_id).await?;

        let mut active: user::ActiveModel = user.into();
        active.name = Set(update.name);
        active.location = Set(update.location);
        active.about_me = Set(update.about_me);

        active
            .update(&self.db)
            .await
            .map_err(|e| UserError::Database(DatabaseError::operation("update_profile", e)))
    }

    /// Administrator profile edit: may additionally reassign the role and
    /// flip the confirmed flag. The caller's capability is checked here,
    /// not only at the view layer.
    pub async fn admin_update_profile(
        &self,
        caller: &Identity,
        target_user_id: i32,
        update: ProfileUpdate,
        confirmed: bool,
        role_id: i32,
    ) -> Result<user::Model, UserError> {
        if !caller.is_administrator() {
            return Err(UserError::Forbidden);
        }

        let user = self.get(target_user_id).await?;

        let mut active: user::ActiveModel = user.into();
        active.name = Set(update.name);
        active.location = Set(update.location);
        active.about_me = Set(update.about_me);
        active.confirmed = Set(confirmed);
        active.role_id = Set(role_id);

        active
            .update(&self.db)
            .await
            .map_err(|e| UserError::Database(DatabaseError::operation("admin_update_profile", e)))
    }

    /// Resolve the capability set for a user: their id plus the
    /// permission bits of their role.
    pub async fn identity_for(&self, user_id: i32) -> Result<Identity, UserError> {
        let user = self.get(user_id).await?;

        let role = role::Entity::find_by_id(user.role_id)
            .one(&self.db)
            .await
            .map_err(|e| UserError::Database(DatabaseError::operation("identity_for", e)))?;

        Ok(Identity::Authenticated {
            id: user.id,
            permissions: role.map(|r| r.permissions).unwrap_or(0),
        })
    }
}

/// Map a unique-constraint violation raised by the database (a lost race
/// against the pre-checks) onto the per-field error.
fn map_unique_violation(e: sea_orm::DbErr, email: &str, username: &str) -> UserError {
    let message = e.to_string();
    if message.contains("users.email") {
        UserError::DuplicateEmail {
            email: email.to_string(),
        }
    } else if message.contains("users.username") {
        UserError::DuplicateUsername {
            username: username.to_string(),
        }
    } else {
        UserError::Database(DatabaseError::operation("insert user", e))
    }
}

fn hash_password(password: &str) -> Result<String, UserError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| UserError::PasswordHash {
            message: e.to_string(),
        })
}

fn verify_hash(password: &str, password_hash: &str) -> bool {
    PasswordHash::new(password_hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::VocabStore;
    use crate::types::internal::permission;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::Database;

    async fn setup() -> UserStore {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("Failed to create test database");

        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");

        VocabStore::new(db.clone())
            .seed()
            .await
            .expect("Failed to seed vocabularies");

        UserStore::new(db)
    }

    #[tokio::test]
    async fn test_register_creates_unconfirmed_user_with_default_role() {
        let store = setup().await;

        let user = store
            .register("john@example.com", "john", "yolo")
            .await
            .expect("Failed to register");

        assert!(!user.confirmed);
        assert_eq!(user.email, "john@example.com");
        assert_eq!(user.username, "john");

        let identity = store.identity_for(user.id).await.unwrap();
        assert!(identity.can(permission::USE));
        assert!(!identity.is_administrator());
    }

    #[tokio::test]
    async fn test_register_does_not_store_plaintext_password() {
        let store = setup().await;

        let user = store
            .register("john@example.com", "john", "yolo")
            .await
            .unwrap();

        assert_ne!(user.password_hash, "yolo");
        assert!(user.password_hash.starts_with("$argon2"));
    }

    #[tokio::test]
    async fn test_register_creates_self_follow() {
        let store = setup().await;

        let user = store
            .register("john@example.com", "john", "yolo")
            .await
            .unwrap();

        let edge = follow::Entity::find_by_id((user.id, user.id))
            .one(&store.db)
            .await
            .unwrap();

        assert!(edge.is_some());
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_email() {
        let store = setup().await;

        store
            .register("john@example.com", "john", "yolo")
            .await
            .unwrap();
        let result = store.register("john@example.com", "john2", "yolo").await;

        assert!(matches!(result, Err(UserError::DuplicateEmail { .. })));
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_username() {
        let store = setup().await;

        store
            .register("john@example.com", "john", "yolo")
            .await
            .unwrap();
        let result = store.register("john2@example.com", "john", "yolo").await;

        assert!(matches!(result, Err(UserError::DuplicateUsername { .. })));
    }

    #[tokio::test]
    async fn test_verify_password() {
        let store = setup().await;

        store
            .register("john@example.com", "john", "yolo")
            .await
            .unwrap();

        assert!(store.verify_password("john@example.com", "yolo").await.is_ok());
        assert!(matches!(
            store.verify_password("john@example.com", "wrong").await,
            Err(UserError::InvalidCredentials)
        ));
        assert!(matches!(
            store.verify_password("nobody@example.com", "yolo").await,
            Err(UserError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_change_password_requires_old_password() {
        let store = setup().await;

        let user = store
            .register("john@example.com", "john", "yolo")
            .await
            .unwrap();

        let result = store.change_password(user.id, "wrong", "new").await;
        assert!(matches!(result, Err(UserError::InvalidCredentials)));

        store.change_password(user.id, "yolo", "yolo1").await.unwrap();
        assert!(store
            .verify_password("john@example.com", "yolo1")
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_change_email_rejects_taken_address() {
        let store = setup().await;

        let user = store
            .register("john@example.com", "john", "yolo")
            .await
            .unwrap();
        store
            .register("jane@example.com", "jane", "yolo")
            .await
            .unwrap();

        let result = store.change_email(user.id, "jane@example.com").await;

        assert!(matches!(result, Err(UserError::DuplicateEmail { .. })));
    }

    #[tokio::test]
    async fn test_ping_bumps_last_seen() {
        let store = setup().await;

        let user = store
            .register("john@example.com", "john", "yolo")
            .await
            .unwrap();

        // Push last_seen into the past, then ping
        let mut active: user::ActiveModel = user.clone().into();
        active.last_seen = Set(user.last_seen - 600);
        active.update(&store.db).await.unwrap();

        store.ping(user.id).await.unwrap();

        let refreshed = store.get(user.id).await.unwrap();
        assert!(refreshed.last_seen >= user.last_seen);
    }

    #[tokio::test]
    async fn test_admin_update_requires_administer_bit() {
        let store = setup().await;

        let user = store
            .register("john@example.com", "john", "yolo")
            .await
            .unwrap();

        let plain = Identity::Authenticated {
            id: user.id,
            permissions: permission::USE,
        };
        let result = store
            .admin_update_profile(&plain, user.id, ProfileUpdate::default(), true, user.role_id)
            .await;
        assert!(matches!(result, Err(UserError::Forbidden)));

        let result = store
            .admin_update_profile(
                &Identity::Anonymous,
                user.id,
                ProfileUpdate::default(),
                true,
                user.role_id,
            )
            .await;
        assert!(matches!(result, Err(UserError::Forbidden)));

        let admin = Identity::Authenticated {
            id: 99,
            permissions: permission::ADMINISTER,
        };
        let updated = store
            .admin_update_profile(&admin, user.id, ProfileUpdate::default(), true, user.role_id)
            .await
            .unwrap();
        assert!(updated.confirmed);
    }
}
