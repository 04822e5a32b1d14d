use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "failed")]
    Failed,
    #[sea_orm(string_value = "refunded")]
    Refunded,
}

/// SeaORM entity for the `payments` table.
///
/// The breakdown columns stay `NULL` until the payment is finalized.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub rental_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub amount: Decimal,
    pub status: PaymentStatus,
    #[sea_orm(column_type = "Decimal(Some((16, 2)))", nullable)]
    pub platform_fee: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((16, 2)))", nullable)]
    pub owner_revenue: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((16, 2)))", nullable)]
    pub driver_revenue: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((6, 4)))", nullable)]
    pub commission_rate: Option<Decimal>,
    pub created_at: DateTimeUtc,
    pub settled_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::rentals::Entity",
        from = "Column::RentalId",
        to = "super::rentals::Column::Id"
    )]
    Rental,
    #[sea_orm(has_many = "super::payment_distributions::Entity")]
    Distributions,
}

impl Related<super::rentals::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Rental.def()
    }
}

impl Related<super::payment_distributions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Distributions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

// ── DTOs ──

#[derive(Debug, Clone, Deserialize)]
pub struct RecordPayment {
    pub rental_id: Uuid,
    pub amount: Decimal,
}

/// Payment-finalization event from the checkout flow.
#[derive(Debug, Clone, Deserialize)]
pub struct FinalizePayment {
    pub amount: Decimal,
}
