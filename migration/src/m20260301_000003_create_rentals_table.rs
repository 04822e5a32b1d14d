use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Identifiers for the `rentals` table and its columns.
#[derive(DeriveIden)]
enum Rentals {
    Table,
    Id,
    CarId,
    CustomerId,
    StartDate,
    EndDate,
    Status,
    RequiresDriver,
    DriverId,
    DriverAssignedAt,
    DriverDecision,
    EstimatedDriverFee,
    ActualDriverFee,
    TotalPrice,
    Notes,
    Version,
    CreatedAt,
    UpdatedAt,
}

/// Re-declare parent table identifiers for foreign-key references.
#[derive(DeriveIden)]
enum Cars {
    Table,
    Id,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Rentals::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Rentals::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Rentals::CarId).uuid().not_null())
                    .col(ColumnDef::new(Rentals::CustomerId).uuid().not_null())
                    .col(
                        ColumnDef::new(Rentals::StartDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Rentals::EndDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Rentals::Status).string().not_null())
                    .col(ColumnDef::new(Rentals::RequiresDriver).boolean().not_null())
                    .col(ColumnDef::new(Rentals::DriverId).uuid().null())
                    .col(
                        ColumnDef::new(Rentals::DriverAssignedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Rentals::DriverDecision).string().not_null())
                    .col(ColumnDef::new(Rentals::EstimatedDriverFee).decimal_len(16, 2).null())
                    .col(ColumnDef::new(Rentals::ActualDriverFee).decimal_len(16, 2).null())
                    .col(ColumnDef::new(Rentals::TotalPrice).decimal_len(16, 2).not_null())
                    .col(ColumnDef::new(Rentals::Notes).text().null())
                    .col(
                        ColumnDef::new(Rentals::Version)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Rentals::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Rentals::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rentals_car_id")
                            .from(Rentals::Table, Rentals::CarId)
                            .to(Cars::Table, Cars::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Rentals::Table).to_owned())
            .await
    }
}
