use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Identifiers for the `payment_distributions` table and its columns.
#[derive(DeriveIden)]
enum PaymentDistributions {
    Table,
    Id,
    PaymentId,
    RecipientId,
    RecipientType,
    Amount,
    Status,
    TransactionReference,
    ErrorMessage,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Payments {
    Table,
    Id,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PaymentDistributions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PaymentDistributions::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PaymentDistributions::PaymentId).uuid().not_null())
                    .col(ColumnDef::new(PaymentDistributions::RecipientId).uuid().not_null())
                    .col(
                        ColumnDef::new(PaymentDistributions::RecipientType)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PaymentDistributions::Amount)
                            .decimal_len(16, 2)
                            .not_null(),
                    )
                    .col(ColumnDef::new(PaymentDistributions::Status).string().not_null())
                    .col(
                        ColumnDef::new(PaymentDistributions::TransactionReference)
                            .string()
                            .null(),
                    )
                    .col(ColumnDef::new(PaymentDistributions::ErrorMessage).text().null())
                    .col(
                        ColumnDef::new(PaymentDistributions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PaymentDistributions::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payment_distributions_payment_id")
                            .from(PaymentDistributions::Table, PaymentDistributions::PaymentId)
                            .to(Payments::Table, Payments::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PaymentDistributions::Table).to_owned())
            .await
    }
}
