use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::RemoteError;
use crate::remote::{fetch_first, insert_row, Query, RemoteClient};
use crate::schema::{NewUser, Table, User};

impl User {
    /// Find a user by (already normalized) email.
    pub async fn find_by_email(
        remote: &dyn RemoteClient,
        email: &str,
    ) -> Result<Option<User>, RemoteError> {
        let q = Query::table(Table::Users).eq("email", email);
        fetch_first(remote, &q).await
    }

    pub async fn find_by_id(remote: &dyn RemoteClient, id: Uuid) -> Result<Option<User>, RemoteError> {
        let q = Query::table(Table::Users).eq("id", id);
        fetch_first(remote, &q).await
    }

    /// Create a new user with an already hashed password.
    pub async fn create(
        remote: &dyn RemoteClient,
        email: &str,
        name: Option<String>,
        password_hash: &str,
    ) -> Result<User, RemoteError> {
        let row = NewUser {
            id: Uuid::new_v4(),
            email: email.to_string(),
            name,
            password_hash: password_hash.to_string(),
            created_at: Some(OffsetDateTime::now_utc()),
        };
        insert_row(remote, Table::Users, &row).await
    }
}
