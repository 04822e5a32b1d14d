use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Identifiers for the `payments` table and its columns.
#[derive(DeriveIden)]
enum Payments {
    Table,
    Id,
    RentalId,
    Amount,
    Status,
    PlatformFee,
    OwnerRevenue,
    DriverRevenue,
    CommissionRate,
    CreatedAt,
    SettledAt,
}

#[derive(DeriveIden)]
enum Rentals {
    Table,
    Id,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Payments::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Payments::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Payments::RentalId).uuid().not_null())
                    .col(ColumnDef::new(Payments::Amount).decimal_len(16, 2).not_null())
                    .col(ColumnDef::new(Payments::Status).string().not_null())
                    .col(ColumnDef::new(Payments::PlatformFee).decimal_len(16, 2).null())
                    .col(ColumnDef::new(Payments::OwnerRevenue).decimal_len(16, 2).null())
                    .col(ColumnDef::new(Payments::DriverRevenue).decimal_len(16, 2).null())
                    .col(ColumnDef::new(Payments::CommissionRate).decimal_len(6, 4).null())
                    .col(
                        ColumnDef::new(Payments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Payments::SettledAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payments_rental_id")
                            .from(Payments::Table, Payments::RentalId)
                            .to(Rentals::Table, Rentals::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Payments::Table).to_owned())
            .await
    }
}
