use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Rentals {
    Table,
    DriverId,
    Status,
    CarId,
}

#[derive(DeriveIden)]
enum DriverAssignments {
    Table,
    DriverId,
    CarOwnerId,
}

#[derive(DeriveIden)]
enum Cars {
    Table,
    OwnerId,
}

#[derive(DeriveIden)]
enum PaymentDistributions {
    Table,
    PaymentId,
    RecipientType,
    Status,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Open-job pool lookups filter on status and the (null) driver column.
        manager
            .create_index(
                Index::create()
                    .name("idx_rentals_status_driver_id")
                    .table(Rentals::Table)
                    .col(Rentals::Status)
                    .col(Rentals::DriverId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_rentals_car_id")
                    .table(Rentals::Table)
                    .col(Rentals::CarId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_driver_assignments_driver_id")
                    .table(DriverAssignments::Table)
                    .col(DriverAssignments::DriverId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_driver_assignments_car_owner_id")
                    .table(DriverAssignments::Table)
                    .col(DriverAssignments::CarOwnerId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_cars_owner_id")
                    .table(Cars::Table)
                    .col(Cars::OwnerId)
                    .to_owned(),
            )
            .await?;

        // One row per recipient per payment.
        manager
            .create_index(
                Index::create()
                    .name("idx_payment_distributions_payment_recipient_unique")
                    .table(PaymentDistributions::Table)
                    .col(PaymentDistributions::PaymentId)
                    .col(PaymentDistributions::RecipientType)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_payment_distributions_status")
                    .table(PaymentDistributions::Table)
                    .col(PaymentDistributions::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_rentals_status_driver_id").to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_rentals_car_id").to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_driver_assignments_driver_id").to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_driver_assignments_car_owner_id").to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_cars_owner_id").to_owned())
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_payment_distributions_payment_recipient_unique")
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(Index::drop().name("idx_payment_distributions_status").to_owned())
            .await?;

        Ok(())
    }
}
