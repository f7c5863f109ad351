//! Row-Level Security (RLS) context management.
//!
//! The backend's policies resolve the caller through `request.jwt.claims`
//! and only apply to the `authenticated` role. Both settings are made
//! transaction-local, so every request gets its own context and nothing
//! leaks back into the pool.
//!
//! # Usage
//!
//! ```ignore
//! use khata_db::rls::RlsExt;
//!
//! let rls = db.with_rls(scope.user_id).await?;
//! let farmers = Farmers::find().all(rls.transaction()).await?;
//! rls.commit().await?;
//! ```

use sea_orm::{
    ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbBackend, DbErr, Statement,
    TransactionTrait,
};

use khata_shared::Claims;
use khata_shared::types::UserId;

/// Statement that installs the caller's claims and switches to the
/// `authenticated` role for the current transaction.
pub const SET_CONTEXT_SQL: &str =
    "SELECT set_config('request.jwt.claims', $1, true), set_config('role', 'authenticated', true)";

/// The claims document for `user`, in the shape the auth service issues.
#[must_use]
pub fn claims_json(user: UserId) -> String {
    serde_json::json!({
        "sub": user.into_inner(),
        "role": "authenticated",
    })
    .to_string()
}

/// A transaction running with a caller's RLS context.
pub struct RlsConnection {
    txn: DatabaseTransaction,
}

impl RlsConnection {
    /// Begins a transaction and installs the given claims document.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction cannot be started or the RLS
    /// context cannot be set.
    pub async fn begin(db: &DatabaseConnection, claims: String) -> Result<Self, DbErr> {
        let txn = db.begin().await?;
        set_rls_context(&txn, claims).await?;
        Ok(Self { txn })
    }

    /// Begins a transaction as `user`.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction cannot be started or the RLS
    /// context cannot be set.
    pub async fn for_user(db: &DatabaseConnection, user: UserId) -> Result<Self, DbErr> {
        Self::begin(db, claims_json(user)).await
    }

    /// Begins a transaction as the holder of `claims`.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction cannot be started or the RLS
    /// context cannot be set.
    pub async fn for_claims(db: &DatabaseConnection, claims: &Claims) -> Result<Self, DbErr> {
        Self::begin(db, claims.to_rls_json()).await
    }

    /// Returns a reference to the underlying transaction for executing queries.
    #[must_use]
    pub const fn transaction(&self) -> &DatabaseTransaction {
        &self.txn
    }

    /// Commits the transaction, persisting all changes.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit fails.
    pub async fn commit(self) -> Result<(), DbErr> {
        self.txn.commit().await
    }

    /// Rolls back the transaction, discarding all changes.
    ///
    /// # Errors
    ///
    /// Returns an error if the rollback fails.
    pub async fn rollback(self) -> Result<(), DbErr> {
        self.txn.rollback().await
    }
}

/// Extension trait for `DatabaseConnection` to easily create RLS-enabled connections.
#[async_trait::async_trait]
pub trait RlsExt {
    /// Begins an RLS transaction as `user`.
    ///
    /// # Errors
    ///
    /// Returns an error if the RLS connection cannot be created.
    async fn with_rls(&self, user: UserId) -> Result<RlsConnection, DbErr>;
}

#[async_trait::async_trait]
impl RlsExt for DatabaseConnection {
    async fn with_rls(&self, user: UserId) -> Result<RlsConnection, DbErr> {
        RlsConnection::for_user(self, user).await
    }
}

/// Installs an RLS context on an existing transaction.
///
/// # Errors
///
/// Returns an error if the RLS context cannot be set.
pub async fn set_rls_context(txn: &DatabaseTransaction, claims: String) -> Result<(), DbErr> {
    txn.execute(Statement::from_sql_and_values(
        DbBackend::Postgres,
        SET_CONTEXT_SQL,
        [claims.into()],
    ))
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{MockDatabase, MockExecResult, Transaction};
    use uuid::Uuid;

    #[test]
    fn test_claims_json_shape() {
        let user = UserId::from_uuid(
            Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap(),
        );
        let value: serde_json::Value = serde_json::from_str(&claims_json(user)).unwrap();
        assert_eq!(value["sub"], "550e8400-e29b-41d4-a716-446655440000");
        assert_eq!(value["role"], "authenticated");
    }

    #[tokio::test]
    async fn test_context_set_inside_transaction() {
        let user = UserId::new();
        let db = MockDatabase::new(DbBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        let rls = RlsConnection::for_user(&db, user).await.unwrap();
        rls.commit().await.unwrap();

        assert_eq!(
            db.into_transaction_log(),
            [Transaction::many([
                Statement::from_string(DbBackend::Postgres, "BEGIN"),
                Statement::from_sql_and_values(
                    DbBackend::Postgres,
                    SET_CONTEXT_SQL,
                    [claims_json(user).into()],
                ),
                Statement::from_string(DbBackend::Postgres, "COMMIT"),
            ])]
        );
    }
}
