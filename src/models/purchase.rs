use chrono::{DateTime, NaiveDate, Utc};
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;
use uuid::Uuid;

/// The lifecycle status of a package purchase.
///
/// Purchases are created `pending` and activated when the payment
/// collaborator confirms; this core only reads the status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSql, FromSql)]
#[postgres(name = "purchase_status")]
#[serde(rename_all = "snake_case")]
pub enum PurchaseStatus {
    #[postgres(name = "pending")]
    Pending,
    #[postgres(name = "active")]
    Active,
    #[postgres(name = "expired")]
    Expired,
}

impl PurchaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseStatus::Pending => "pending",
            PurchaseStatus::Active => "active",
            PurchaseStatus::Expired => "expired",
        }
    }
}

/// A prepaid bundle of sessions with a remaining-count ledger and expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackagePurchase {
    /// The unique identifier for the purchase.
    pub id: Uuid,
    /// The ID of the client who owns the purchase.
    pub client_id: Uuid,
    /// The name of the purchased package.
    pub package_name: String,
    /// The total number of sessions granted.
    pub total_sessions: i32,
    /// The number of sessions remaining; 0 <= remaining <= total.
    pub sessions_remaining: i32,
    /// The date the purchase expires.
    pub expiry_date: NaiveDate,
    /// The lifecycle status.
    pub status: PurchaseStatus,
    /// The timestamp when the purchase was created.
    pub created_at: DateTime<Utc>,
}

impl From<&Row> for PackagePurchase {
    fn from(row: &Row) -> Self {
        Self {
            id: row.get("id"),
            client_id: row.get("client_id"),
            package_name: row.get("package_name"),
            total_sessions: row.get("total_sessions"),
            sessions_remaining: row.get("sessions_remaining"),
            expiry_date: row.get("expiry_date"),
            status: row.get("status"),
            created_at: row.get("created_at"),
        }
    }
}
