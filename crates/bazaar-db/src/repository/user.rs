//! # User Repository
//!
//! Accounts, password hashing and the admin user list.
//!
//! Passwords are stored as argon2 PHC strings; the plain text never
//! reaches the database.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use bazaar_core::{Country, NewUser, User, UserPatch, UserRole};

const USER_COLUMNS: &str =
    "id, name, email, phone, age, password_hash, country, role, created_at";

/// Hashes a password with a fresh random salt.
pub fn hash_password(password: &str) -> DbResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| DbError::Internal(format!("Failed to hash password: {e}")))
}

/// Checks `password` against a stored hash. A malformed hash never matches.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Repository for user accounts.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Registers an account.
    ///
    /// `user` must already be validated; `country` is its parsed country.
    /// Fails with [`DbError::UniqueViolation`] when the email is taken.
    pub async fn create(&self, user: &NewUser, country: Country, role: UserRole) -> DbResult<User> {
        let email = user.email.trim();
        debug!(email = %email, role = ?role, "Creating user");

        if self.get_by_email(email).await?.is_some() {
            return Err(DbError::duplicate("email", email));
        }

        let password_hash = hash_password(&user.password)?;

        let result = sqlx::query(
            r#"
            INSERT INTO users (name, email, phone, age, password_hash, country, role, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(user.name.trim())
        .bind(email)
        .bind(&user.phone)
        .bind(user.age)
        .bind(&password_hash)
        .bind(country)
        .bind(role)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("User", id))
    }

    /// Gets a user by ID.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Gets a user by email (exact match).
    pub async fn get_by_email(&self, email: &str) -> DbResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Looks up the account and checks the password.
    ///
    /// ## Returns
    /// * `Ok(None)` - no account with this email
    /// * `Ok(Some((user, false)))` - wrong password
    /// * `Ok(Some((user, true)))` - authenticated
    pub async fn authenticate(&self, email: &str, password: &str) -> DbResult<Option<(User, bool)>> {
        debug!(email = %email.trim(), "Authenticating user");

        Ok(self.get_by_email(email).await?.map(|user| {
            let ok = verify_password(password, &user.password_hash);
            (user, ok)
        }))
    }

    /// All accounts, oldest first.
    pub async fn list(&self) -> DbResult<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY id");
        let users = sqlx::query_as::<_, User>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }

    /// Applies an admin edit and returns the updated account.
    pub async fn update(&self, id: i64, patch: &UserPatch) -> DbResult<User> {
        debug!(id = id, "Updating user");

        let mut user = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("User", id))?;

        if let Some(name) = &patch.name {
            user.name = name.trim().to_string();
        }
        if let Some(phone) = &patch.phone {
            user.phone = phone.clone();
        }
        if let Some(age) = patch.age {
            user.age = age;
        }
        if let Some(country) = patch.country {
            user.country = country;
        }
        if let Some(role) = patch.role {
            user.role = role;
        }

        sqlx::query(
            r#"
            UPDATE users
            SET name = ?1, phone = ?2, age = ?3, country = ?4, role = ?5
            WHERE id = ?6
            "#,
        )
        .bind(&user.name)
        .bind(&user.phone)
        .bind(user.age)
        .bind(user.country)
        .bind(user.role)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(user)
    }

    /// Deletes an account. Its cart entries go with it; orders stay.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        debug!(id = id, "Deleting user");

        let result = sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }
        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    fn registration(email: &str) -> NewUser {
        NewUser {
            name: "Priya Shah".to_string(),
            email: email.to_string(),
            phone: "9123456780".to_string(),
            age: 28,
            password: "Secur3!pass".to_string(),
            country: "India".to_string(),
        }
    }

    async fn setup() -> UserRepository {
        Database::new(DbConfig::in_memory()).await.unwrap().users()
    }

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("Secur3!pass").unwrap();

        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("Secur3!pass", &hash));
        assert!(!verify_password("wrong", &hash));
        assert!(!verify_password("Secur3!pass", "not-a-hash"));
    }

    #[tokio::test]
    async fn test_create_and_fetch() {
        let repo = setup().await;
        let user = repo
            .create(&registration("priya@example.com"), Country::India, UserRole::Customer)
            .await
            .unwrap();

        assert_eq!(user.email, "priya@example.com");
        assert_ne!(user.password_hash, "Secur3!pass");

        let fetched = repo.get_by_email("priya@example.com").await.unwrap().unwrap();
        assert_eq!(fetched.id, user.id);
        assert_eq!(fetched.country, Country::India);
        assert_eq!(fetched.role, UserRole::Customer);
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let repo = setup().await;
        repo.create(&registration("dup@example.com"), Country::Uk, UserRole::Customer)
            .await
            .unwrap();

        let err = repo
            .create(&registration("dup@example.com"), Country::Uk, UserRole::Admin)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_authenticate() {
        let repo = setup().await;
        repo.create(&registration("login@example.com"), Country::Usa, UserRole::Customer)
            .await
            .unwrap();

        assert!(repo.authenticate("nobody@example.com", "x").await.unwrap().is_none());

        let (_, ok) = repo
            .authenticate("login@example.com", "wrong")
            .await
            .unwrap()
            .unwrap();
        assert!(!ok);

        let (user, ok) = repo
            .authenticate("login@example.com", "Secur3!pass")
            .await
            .unwrap()
            .unwrap();
        assert!(ok);
        assert_eq!(user.country, Country::Usa);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let repo = setup().await;
        let user = repo
            .create(&registration("edit@example.com"), Country::India, UserRole::Customer)
            .await
            .unwrap();

        let patch = UserPatch {
            name: Some("Priya S Shah".to_string()),
            role: Some(UserRole::Admin),
            ..Default::default()
        };
        let updated = repo.update(user.id, &patch).await.unwrap();
        assert_eq!(updated.name, "Priya S Shah");
        assert!(updated.role.is_admin());
        assert_eq!(updated.phone, "9123456780");

        repo.delete(user.id).await.unwrap();
        assert!(repo.get_by_id(user.id).await.unwrap().is_none());
        assert!(repo.delete(user.id).await.unwrap_err().is_not_found());
    }
}
