use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Rental status stored as a lowercase string in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum RentalStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "confirmed")]
    Confirmed,
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
    #[sea_orm(string_value = "overdue")]
    Overdue,
}

/// The assigned driver's answer for the current assignment cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum DriverDecision {
    #[sea_orm(string_value = "undecided")]
    Undecided,
    #[sea_orm(string_value = "accepted")]
    Accepted,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

/// SeaORM entity for the `rentals` table.
///
/// `estimated_driver_fee` and `actual_driver_fee` are per-day rates. The
/// driver cost of a rental is derived from them with
/// [`crate::pricing::fees::driver_fee`].
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "rentals")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub car_id: Uuid,
    pub customer_id: Uuid,
    pub start_date: DateTimeUtc,
    pub end_date: DateTimeUtc,
    pub status: RentalStatus,
    pub requires_driver: bool,
    pub driver_id: Option<Uuid>,
    pub driver_assigned_at: Option<DateTimeUtc>,
    pub driver_decision: DriverDecision,
    #[sea_orm(column_type = "Decimal(Some((16, 2)))", nullable)]
    pub estimated_driver_fee: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((16, 2)))", nullable)]
    pub actual_driver_fee: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub total_price: Decimal,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    /// Optimistic concurrency token, bumped by every write.
    pub version: i32,
    pub created_at: DateTimeUtc,
    pub updated_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::cars::Entity",
        from = "Column::CarId",
        to = "super::cars::Column::Id"
    )]
    Car,
    #[sea_orm(has_many = "super::payments::Entity")]
    Payments,
}

impl Related<super::cars::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Car.def()
    }
}

impl Related<super::payments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Append a line to the audit notes.
    pub fn with_note(&self, line: &str) -> String {
        match self.notes.as_deref() {
            Some(existing) if !existing.is_empty() => format!("{existing}\n{line}"),
            _ => line.to_string(),
        }
    }
}

// ── DTOs ──

/// Rental handed over by the booking flow.
#[derive(Debug, Clone, Deserialize)]
pub struct NewRental {
    pub car_id: Uuid,
    pub customer_id: Uuid,
    pub start_date: DateTimeUtc,
    pub end_date: DateTimeUtc,
    pub requires_driver: bool,
    pub estimated_driver_fee: Option<Decimal>,
    pub total_price: Decimal,
    /// A driver picked directly at booking time; they still have to accept.
    pub driver_id: Option<Uuid>,
}

/// Fulfillment step requested by `POST /api/rentals/{id}/status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusAction {
    Confirm,
    Activate,
    MarkOverdue,
    Complete,
    Cancel,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateRentalStatus {
    pub action: StatusAction,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RejectRental {
    pub reason: String,
}
