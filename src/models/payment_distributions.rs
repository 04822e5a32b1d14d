use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum RecipientType {
    #[sea_orm(string_value = "platform")]
    Platform,
    #[sea_orm(string_value = "car_owner")]
    CarOwner,
    #[sea_orm(string_value = "driver")]
    Driver,
}

impl RecipientType {
    /// Display order of a payment's rows.
    pub fn rank(self) -> u8 {
        match self {
            RecipientType::Platform => 0,
            RecipientType::CarOwner => 1,
            RecipientType::Driver => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum DistributionStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "processing")]
    Processing,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "failed")]
    Failed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl DistributionStatus {
    /// Whether a row may move from `self` to `next`.
    ///
    /// `Failed -> Pending` is the retry path used by the settlement process.
    pub fn can_transition_to(self, next: DistributionStatus) -> bool {
        use DistributionStatus::*;
        matches!(
            (self, next),
            (Pending, Processing)
                | (Processing, Completed)
                | (Pending | Processing, Failed)
                | (Pending | Processing, Cancelled)
                | (Failed, Pending)
        )
    }
}

/// SeaORM entity for the `payment_distributions` table.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payment_distributions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub payment_id: Uuid,
    pub recipient_id: Uuid,
    pub recipient_type: RecipientType,
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub amount: Decimal,
    pub status: DistributionStatus,
    pub transaction_reference: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub error_message: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::payments::Entity",
        from = "Column::PaymentId",
        to = "super::payments::Column::Id"
    )]
    Payment,
}

impl Related<super::payments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

// ── DTOs ──

/// Settlement step requested by `POST /api/distributions/{id}/{action}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementAction {
    Processing,
    Completed,
    Failed,
    Cancel,
    Requeue,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettlementUpdate {
    pub transaction_reference: Option<String>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DistributionListQuery {
    pub status: DistributionStatus,
}
