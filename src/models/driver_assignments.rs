use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// SeaORM entity for the `driver_assignments` table.
///
/// A driver belongs to at most one active car-owner fleet at a time.
/// Revoked assignments are kept with `is_active = false`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "driver_assignments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub car_owner_id: Uuid,
    pub driver_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub daily_driver_fee: Decimal,
    pub is_active: bool,
    pub assigned_at: DateTimeUtc,
    pub revoked_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

// ── DTOs ──

/// Body of `POST /api/owner/drivers`, sent when an onboarding request is approved.
#[derive(Debug, Clone, Deserialize)]
pub struct ApproveAssignment {
    pub driver_id: Uuid,
    pub daily_driver_fee: Decimal,
}
