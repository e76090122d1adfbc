use deadpool_postgres::{Pool, Transaction};
use uuid::Uuid;

use crate::{error::Result, models::coach::Coach};

/// Finds a coach by their ID.
pub async fn find_by_id(pool: &Pool, coach_id: &Uuid) -> Result<Option<Coach>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            r#"
            SELECT *
            FROM coaches
            WHERE id = $1
            "#,
            &[coach_id],
        )
        .await?;
    Ok(row.as_ref().map(Coach::from))
}

/// Finds a coach profile by the user account behind it.
pub async fn find_by_user_id(pool: &Pool, user_id: &Uuid) -> Result<Option<Coach>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            r#"
            SELECT *
            FROM coaches
            WHERE user_id = $1
            "#,
            &[user_id],
        )
        .await?;
    Ok(row.as_ref().map(Coach::from))
}

/// Loads a coach inside a transaction, taking a row lock that serializes
/// calendar writes for this coach until the transaction ends.
pub async fn lock_by_id(tx: &Transaction<'_>, coach_id: &Uuid) -> Result<Option<Coach>> {
    let row = tx
        .query_opt(
            r#"
            SELECT *
            FROM coaches
            WHERE id = $1
            FOR UPDATE
            "#,
            &[coach_id],
        )
        .await?;
    Ok(row.as_ref().map(Coach::from))
}

/// Increments a coach's lifetime completed-session counter.
pub async fn increment_total_sessions(tx: &Transaction<'_>, coach_id: &Uuid) -> Result<()> {
    tx.execute(
        r#"
        UPDATE coaches
        SET total_sessions = total_sessions + 1
        WHERE id = $1
        "#,
        &[coach_id],
    )
    .await?;
    Ok(())
}
