use chrono::Utc;
use deadpool_postgres::Transaction;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::purchase::{PackagePurchase, PurchaseStatus},
};

/// Loads a purchase inside a transaction, locking the row so concurrent
/// consume/refund operations on the same ledger serialize.
pub async fn lock_by_id(tx: &Transaction<'_>, purchase_id: &Uuid) -> Result<Option<PackagePurchase>> {
    let row = tx
        .query_opt(
            r#"
            SELECT *
            FROM package_purchases
            WHERE id = $1
            FOR UPDATE
            "#,
            &[purchase_id],
        )
        .await?;
    Ok(row.as_ref().map(PackagePurchase::from))
}

/// Checks the preconditions for consuming one session from a purchase:
/// ownership, active status, remaining balance, and expiry, in that order.
pub fn check_consumable(purchase: &PackagePurchase, client_id: &Uuid) -> Result<()> {
    if purchase.client_id != *client_id {
        return Err(AppError::Unauthorized);
    }
    if purchase.status != PurchaseStatus::Active {
        return Err(AppError::PackageNotActive);
    }
    if purchase.sessions_remaining <= 0 {
        return Err(AppError::PackageDepleted);
    }
    if purchase.expiry_date < Utc::now().date_naive() {
        return Err(AppError::PackageExpired);
    }
    Ok(())
}

/// Atomically decrements a purchase's remaining-session counter.
///
/// The balance precondition is re-checked at execution time: an update that
/// matches no row means the last unit was consumed by a concurrent booking.
pub async fn consume(tx: &Transaction<'_>, purchase_id: &Uuid) -> Result<()> {
    let updated = tx
        .execute(
            r#"
            UPDATE package_purchases
            SET sessions_remaining = sessions_remaining - 1
            WHERE id = $1 AND sessions_remaining > 0
            "#,
            &[purchase_id],
        )
        .await?;
    if updated == 0 {
        return Err(AppError::PackageDepleted);
    }
    Ok(())
}

/// Atomically increments a purchase's remaining-session counter, capped at
/// the purchased total.
pub async fn refund(tx: &Transaction<'_>, purchase_id: &Uuid) -> Result<()> {
    tx.execute(
        r#"
        UPDATE package_purchases
        SET sessions_remaining = LEAST(sessions_remaining + 1, total_sessions)
        WHERE id = $1
        "#,
        &[purchase_id],
    )
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn purchase(status: PurchaseStatus, remaining: i32, expiry: NaiveDate) -> PackagePurchase {
        PackagePurchase {
            id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            package_name: "10-session pack".to_string(),
            total_sessions: 10,
            sessions_remaining: remaining,
            expiry_date: expiry,
            status,
            created_at: Utc::now(),
        }
    }

    fn next_month() -> NaiveDate {
        Utc::now().date_naive() + Duration::days(30)
    }

    #[test]
    fn consumable_purchase_passes_all_checks() {
        let p = purchase(PurchaseStatus::Active, 3, next_month());
        assert!(check_consumable(&p, &p.client_id).is_ok());
    }

    #[test]
    fn ownership_is_checked_first() {
        let p = purchase(PurchaseStatus::Pending, 0, next_month());
        let stranger = Uuid::new_v4();
        assert!(matches!(
            check_consumable(&p, &stranger),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn inactive_purchases_are_rejected() {
        for status in [PurchaseStatus::Pending, PurchaseStatus::Expired] {
            let p = purchase(status, 3, next_month());
            assert!(matches!(
                check_consumable(&p, &p.client_id),
                Err(AppError::PackageNotActive)
            ));
        }
    }

    #[test]
    fn depleted_purchases_are_rejected() {
        let p = purchase(PurchaseStatus::Active, 0, next_month());
        assert!(matches!(
            check_consumable(&p, &p.client_id),
            Err(AppError::PackageDepleted)
        ));
    }

    #[test]
    fn past_expiry_is_rejected_even_when_status_lags() {
        let yesterday = Utc::now().date_naive() - Duration::days(1);
        let p = purchase(PurchaseStatus::Active, 3, yesterday);
        assert!(matches!(
            check_consumable(&p, &p.client_id),
            Err(AppError::PackageExpired)
        ));
    }

    #[test]
    fn expiry_on_the_boundary_is_still_valid() {
        let today = Utc::now().date_naive();
        let p = purchase(PurchaseStatus::Active, 1, today);
        assert!(check_consumable(&p, &p.client_id).is_ok());
    }
}
