//! Transaction helpers shared by the services.
//!
//! Every mutating operation opens exactly one transaction. Dropping a
//! [`PgTransaction`] without committing rolls it back, so early returns through
//! `?` leave no partial writes behind.

use sqlx::postgres::PgTransaction;
use sqlx::PgPool;

use crate::error::AppError;

pub async fn begin_transaction(db: &PgPool) -> Result<PgTransaction<'_>, AppError> {
    db.begin()
        .await
        .map_err(|e| AppError::InternalServerError(e.into()))
}

pub async fn commit_transaction(tx: PgTransaction<'_>) -> Result<(), AppError> {
    tx.commit()
        .await
        .map_err(|e| AppError::InternalServerError(e.into()))
}
