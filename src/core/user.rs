//! User business logic.
//!
//! Authentication lives outside this crate; here a user is just the owner of
//! trips, favorites and collections.

use crate::{
    entities::{User, user},
    errors::{Error, Result},
};
use sea_orm::{Set, prelude::*};
use tracing::info;

/// Creates a user after checking the name and that the email is unused.
pub async fn create_user<C>(db: &C, name: &str, email: &str) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::validation("name", "User name cannot be empty"));
    }
    let email = email.trim().to_lowercase();
    if !email.contains('@') {
        return Err(Error::validation("email", format!("'{email}' is not an email")));
    }
    if get_user_by_email(db, &email).await?.is_some() {
        return Err(Error::validation("email", format!("{email} is already registered")));
    }

    let user = user::ActiveModel {
        name: Set(name.to_string()),
        email: Set(email),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;
    info!("Created user {}", user.id);
    Ok(user)
}

/// Finds a user by id.
///
/// # Errors
/// [`Error::NotFound`] if there is no such user.
pub async fn get_user<C>(db: &C, user_id: i64) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    User::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("User", user_id))
}

/// Finds a user by email, case-insensitively.
pub async fn get_user_by_email<C>(db: &C, email: &str) -> Result<Option<user::Model>>
where
    C: ConnectionTrait,
{
    User::find()
        .filter(user::Column::Email.eq(email.trim().to_lowercase()))
        .one(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::setup_test_db;

    #[tokio::test]
    async fn test_create_and_lookup() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_user(&db, " Ana ", "Ana@Example.com").await?;

        assert_eq!(user.name, "Ana");
        assert_eq!(user.email, "ana@example.com");
        assert_eq!(get_user(&db, user.id).await?, user);
        assert_eq!(get_user_by_email(&db, "ANA@example.com").await?, Some(user));
        Ok(())
    }

    #[tokio::test]
    async fn test_create_validation() -> Result<()> {
        let db = setup_test_db().await?;
        create_user(&db, "Ana", "ana@example.com").await?;

        let duplicate = create_user(&db, "Otra Ana", "ANA@example.com").await;
        assert!(matches!(duplicate, Err(Error::Validation { field: "email", .. })));

        let blank = create_user(&db, "", "x@example.com").await;
        assert!(matches!(blank, Err(Error::Validation { field: "name", .. })));

        let bad_email = create_user(&db, "X", "nope").await;
        assert!(matches!(bad_email, Err(Error::Validation { field: "email", .. })));

        assert!(matches!(get_user(&db, 99).await, Err(Error::NotFound { .. })));
        Ok(())
    }
}
