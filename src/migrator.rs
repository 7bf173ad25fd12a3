use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_catalog_tables::Migration),
            Box::new(m20240101_000002_create_beam_ledger_tables::Migration),
            Box::new(m20240101_000003_create_admin_users_table::Migration),
        ]
    }
}

mod m20240101_000001_create_catalog_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_catalog_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Customers::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Customers::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Customers::Name)
                                .string_len(200)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Customers::ContactPerson).string().null())
                        .col(ColumnDef::new(Customers::Phone).string_len(50).null())
                        .col(ColumnDef::new(Customers::Email).string().null())
                        .col(ColumnDef::new(Customers::Address).text().null())
                        .col(
                            ColumnDef::new(Customers::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Customers::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Customers::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Workshops::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Workshops::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Workshops::Name)
                                .string_len(200)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Workshops::Location).string().not_null())
                        .col(
                            ColumnDef::new(Workshops::MachineCount)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Workshops::WorkshopType)
                                .string_len(20)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Workshops::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Workshops::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Workshops::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Machines::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Machines::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Machines::WorkshopId).uuid().not_null())
                        .col(ColumnDef::new(Machines::MachineNumber).integer().not_null())
                        .col(ColumnDef::new(Machines::FabricType).string_len(20).not_null())
                        .col(
                            ColumnDef::new(Machines::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Machines::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Machines::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_machines_workshop_id")
                                .from(Machines::Table, Machines::WorkshopId)
                                .to(Workshops::Table, Workshops::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            // machine_number is unique within a workshop
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_machines_workshop_number")
                        .table(Machines::Table)
                        .col(Machines::WorkshopId)
                        .col(Machines::MachineNumber)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(DesignPresets::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(DesignPresets::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(DesignPresets::Label).string().not_null())
                        .col(
                            ColumnDef::new(DesignPresets::Price)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DesignPresets::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(DesignPresets::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(DesignPresets::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Machines::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Workshops::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Customers::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Customers {
        Table,
        Id,
        Name,
        ContactPerson,
        Phone,
        Email,
        Address,
        IsActive,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum Workshops {
        Table,
        Id,
        Name,
        Location,
        MachineCount,
        WorkshopType,
        IsActive,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum Machines {
        Table,
        Id,
        WorkshopId,
        MachineNumber,
        FabricType,
        IsActive,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum DesignPresets {
        Table,
        Id,
        Label,
        Price,
        IsActive,
        CreatedAt,
    }
}

mod m20240101_000002_create_beam_ledger_tables {

    use super::m20240101_000001_create_catalog_tables::{Customers, Machines, Workshops};
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_beam_ledger_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(BeamStarts::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(BeamStarts::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(BeamStarts::BeamNumber)
                                .string_len(100)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(BeamStarts::MachineId).uuid().not_null())
                        .col(ColumnDef::new(BeamStarts::WorkshopId).uuid().not_null())
                        .col(ColumnDef::new(BeamStarts::CustomerId).uuid().not_null())
                        .col(
                            ColumnDef::new(BeamStarts::FabricType)
                                .string_len(20)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(BeamStarts::TotalBeamMeters)
                                .decimal_len(14, 3)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(BeamStarts::MetersPerPiece)
                                .decimal_len(10, 3)
                                .not_null(),
                        )
                        .col(ColumnDef::new(BeamStarts::StartDate).date().not_null())
                        .col(ColumnDef::new(BeamStarts::EndDate).date().null())
                        .col(ColumnDef::new(BeamStarts::Status).string_len(20).not_null())
                        .col(ColumnDef::new(BeamStarts::Notes).text().null())
                        .col(
                            ColumnDef::new(BeamStarts::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(BeamStarts::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_beam_starts_machine_id")
                                .from(BeamStarts::Table, BeamStarts::MachineId)
                                .to(Machines::Table, Machines::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_beam_starts_workshop_id")
                                .from(BeamStarts::Table, BeamStarts::WorkshopId)
                                .to(Workshops::Table, Workshops::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_beam_starts_customer_id")
                                .from(BeamStarts::Table, BeamStarts::CustomerId)
                                .to(Customers::Table, Customers::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_beam_starts_status")
                        .table(BeamStarts::Table)
                        .col(BeamStarts::Status)
                        .to_owned(),
                )
                .await?;

            // At most one active beam per machine. Partial indexes are not
            // expressible through the index builder, so this one is raw SQL
            // (valid on both SQLite and PostgreSQL).
            manager
                .get_connection()
                .execute_unprepared(
                    "CREATE UNIQUE INDEX IF NOT EXISTS idx_beam_starts_active_machine \
                     ON beam_starts (machine_id) WHERE status = 'active'",
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Deliveries::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Deliveries::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Deliveries::BeamId).uuid().not_null())
                        .col(ColumnDef::new(Deliveries::DeliveryDate).date().not_null())
                        .col(ColumnDef::new(Deliveries::DesignName).string().not_null())
                        .col(
                            ColumnDef::new(Deliveries::PricePerPiece)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Deliveries::GoodPieces)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Deliveries::DamagedPieces)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Deliveries::MetersUsed)
                                .decimal_len(14, 3)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Deliveries::TotalAmount)
                                .decimal_len(14, 2)
                                .not_null(),
                        )
                        .col(ColumnDef::new(Deliveries::Notes).text().null())
                        .col(
                            ColumnDef::new(Deliveries::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_deliveries_beam_id")
                                .from(Deliveries::Table, Deliveries::BeamId)
                                .to(BeamStarts::Table, BeamStarts::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_deliveries_beam_id")
                        .table(Deliveries::Table)
                        .col(Deliveries::BeamId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_deliveries_delivery_date")
                        .table(Deliveries::Table)
                        .col(Deliveries::DeliveryDate)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Deliveries::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(BeamStarts::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum BeamStarts {
        Table,
        Id,
        BeamNumber,
        MachineId,
        WorkshopId,
        CustomerId,
        FabricType,
        TotalBeamMeters,
        MetersPerPiece,
        StartDate,
        EndDate,
        Status,
        Notes,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum Deliveries {
        Table,
        Id,
        BeamId,
        DeliveryDate,
        DesignName,
        PricePerPiece,
        GoodPieces,
        DamagedPieces,
        MetersUsed,
        TotalAmount,
        Notes,
        CreatedAt,
    }
}

mod m20240101_000003_create_admin_users_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_admin_users_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(AdminUsers::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(AdminUsers::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(AdminUsers::Username)
                                .string_len(100)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(AdminUsers::PasswordHash).string().not_null())
                        .col(ColumnDef::new(AdminUsers::Email).string().null())
                        .col(
                            ColumnDef::new(AdminUsers::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(AdminUsers::LastLogin)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(ColumnDef::new(AdminUsers::ResetToken).string().null())
                        .col(
                            ColumnDef::new(AdminUsers::ResetTokenExpires)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(AdminUsers::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(AdminUsers::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(AdminUsers::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum AdminUsers {
        Table,
        Id,
        Username,
        PasswordHash,
        Email,
        IsActive,
        LastLogin,
        ResetToken,
        ResetTokenExpires,
        CreatedAt,
        UpdatedAt,
    }
}
