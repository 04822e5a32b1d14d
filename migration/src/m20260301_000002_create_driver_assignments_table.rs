use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Identifiers for the `driver_assignments` table and its columns.
#[derive(DeriveIden)]
enum DriverAssignments {
    Table,
    Id,
    CarOwnerId,
    DriverId,
    DailyDriverFee,
    IsActive,
    AssignedAt,
    RevokedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DriverAssignments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DriverAssignments::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DriverAssignments::CarOwnerId).uuid().not_null())
                    .col(ColumnDef::new(DriverAssignments::DriverId).uuid().not_null())
                    .col(
                        ColumnDef::new(DriverAssignments::DailyDriverFee)
                            .decimal_len(16, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DriverAssignments::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(DriverAssignments::AssignedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DriverAssignments::RevokedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DriverAssignments::Table).to_owned())
            .await
    }
}
