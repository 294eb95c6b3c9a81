// `#[async_trait]` forces the trait-dictated `up`/`down` signatures to use an
// elided lifetime on `SchemaManager`; the crate-wide `deny(rust_2018_idioms)`
// cannot be satisfied here without breaking the late-bound lifetime, so the
// lint is relaxed for this module only.
#![allow(elided_lifetimes_in_paths)]

use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_units_table::Migration),
            Box::new(m20240101_000002_create_users_table::Migration),
            Box::new(m20240101_000003_create_dispense_types_table::Migration),
            Box::new(m20240101_000004_create_receipt_statuses_table::Migration),
            Box::new(m20240101_000005_create_fuel_operations_table::Migration),
            Box::new(m20240101_000006_create_activity_logs_table::Migration),
            Box::new(m20240101_000007_seed_reference_data::Migration),
        ]
    }
}

// Migration implementations

mod m20240101_000001_create_units_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_units_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Units::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Units::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(Units::Name)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Units::Code).string().null().unique_key())
                        .col(
                            ColumnDef::new(Units::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_units_active")
                        .table(Units::Table)
                        .col(Units::IsActive)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Units::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum Units {
        Table,
        Id,
        Name,
        Code,
        IsActive,
    }
}

mod m20240101_000002_create_users_table {
    use super::m20240101_000001_create_units_table::Units;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_users_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Users::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Users::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(Users::Username)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                        .col(ColumnDef::new(Users::Name).string().not_null())
                        .col(ColumnDef::new(Users::Role).string().not_null())
                        .col(ColumnDef::new(Users::UnitId).integer().null())
                        .col(
                            ColumnDef::new(Users::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Users::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_users_unit")
                                .from(Users::Table, Users::UnitId)
                                .to(Units::Table, Units::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_users_role")
                        .table(Users::Table)
                        .col(Users::Role)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_users_active")
                        .table(Users::Table)
                        .col(Users::IsActive)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Users::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum Users {
        Table,
        Id,
        Username,
        PasswordHash,
        Name,
        Role,
        UnitId,
        IsActive,
        CreatedAt,
    }
}

mod m20240101_000003_create_dispense_types_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_dispense_types_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(DispenseTypes::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(DispenseTypes::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(DispenseTypes::Name)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(DispenseTypes::Description).string().null())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(DispenseTypes::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum DispenseTypes {
        Table,
        Id,
        Name,
        Description,
    }
}

mod m20240101_000004_create_receipt_statuses_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_receipt_statuses_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ReceiptStatuses::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ReceiptStatuses::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(ReceiptStatuses::Name)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(ReceiptStatuses::ColorCode).string().null())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ReceiptStatuses::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum ReceiptStatuses {
        Table,
        Id,
        Name,
        ColorCode,
    }
}

mod m20240101_000005_create_fuel_operations_table {
    use super::m20240101_000001_create_units_table::Units;
    use super::m20240101_000002_create_users_table::Users;
    use super::m20240101_000003_create_dispense_types_table::DispenseTypes;
    use super::m20240101_000004_create_receipt_statuses_table::ReceiptStatuses;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000005_create_fuel_operations_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(FuelOperations::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(FuelOperations::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(FuelOperations::OperationDate)
                                .date()
                                .not_null(),
                        )
                        .col(ColumnDef::new(FuelOperations::UnitId).integer().null())
                        .col(ColumnDef::new(FuelOperations::DriverName).string().not_null())
                        .col(
                            ColumnDef::new(FuelOperations::VehicleType)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(FuelOperations::PetrolQuantity)
                                .double()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(FuelOperations::DieselQuantity)
                                .double()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(FuelOperations::OperationOfficer)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(FuelOperations::ReceiptStatusId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(FuelOperations::ReceiptNumber)
                                .big_integer()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(FuelOperations::DispenseTypeId)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(FuelOperations::Purpose).string().null())
                        .col(ColumnDef::new(FuelOperations::Month).string().not_null())
                        .col(ColumnDef::new(FuelOperations::Notes).string().null())
                        .col(
                            ColumnDef::new(FuelOperations::UserId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(FuelOperations::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(FuelOperations::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_fuel_ops_unit")
                                .from(FuelOperations::Table, FuelOperations::UnitId)
                                .to(Units::Table, Units::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_fuel_ops_status")
                                .from(FuelOperations::Table, FuelOperations::ReceiptStatusId)
                                .to(ReceiptStatuses::Table, ReceiptStatuses::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_fuel_ops_dispense_type")
                                .from(FuelOperations::Table, FuelOperations::DispenseTypeId)
                                .to(DispenseTypes::Table, DispenseTypes::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_fuel_ops_user")
                                .from(FuelOperations::Table, FuelOperations::UserId)
                                .to(Users::Table, Users::Id),
                        )
                        .to_owned(),
                )
                .await?;

            // Query paths: date windows, month/unit/status filters, creator scans
            for (name, col) in [
                ("idx_fuel_ops_date", FuelOperations::OperationDate),
                ("idx_fuel_ops_unit", FuelOperations::UnitId),
                ("idx_fuel_ops_month", FuelOperations::Month),
                ("idx_fuel_ops_status", FuelOperations::ReceiptStatusId),
                ("idx_fuel_ops_user", FuelOperations::UserId),
                ("idx_fuel_ops_driver", FuelOperations::DriverName),
            ] {
                manager
                    .create_index(
                        Index::create()
                            .name(name)
                            .table(FuelOperations::Table)
                            .col(col)
                            .to_owned(),
                    )
                    .await?;
            }

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(FuelOperations::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden, Clone, Copy)]
    pub enum FuelOperations {
        Table,
        Id,
        OperationDate,
        UnitId,
        DriverName,
        VehicleType,
        PetrolQuantity,
        DieselQuantity,
        OperationOfficer,
        ReceiptStatusId,
        ReceiptNumber,
        DispenseTypeId,
        Purpose,
        Month,
        Notes,
        UserId,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000006_create_activity_logs_table {
    use super::m20240101_000002_create_users_table::Users;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000006_create_activity_logs_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ActivityLogs::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ActivityLogs::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        // Null user_id records a failed/unauthenticated action
                        .col(ColumnDef::new(ActivityLogs::UserId).big_integer().null())
                        .col(ColumnDef::new(ActivityLogs::Action).string().not_null())
                        .col(ColumnDef::new(ActivityLogs::TableName).string().null())
                        .col(ColumnDef::new(ActivityLogs::RecordId).big_integer().null())
                        .col(ColumnDef::new(ActivityLogs::Details).text().null())
                        .col(ColumnDef::new(ActivityLogs::IpAddress).string().null())
                        .col(
                            ColumnDef::new(ActivityLogs::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_activity_logs_user")
                                .from(ActivityLogs::Table, ActivityLogs::UserId)
                                .to(Users::Table, Users::Id),
                        )
                        .to_owned(),
                )
                .await?;

            for (name, col) in [
                ("idx_logs_user", ActivityLogs::UserId),
                ("idx_logs_action", ActivityLogs::Action),
                ("idx_logs_table", ActivityLogs::TableName),
                ("idx_logs_created", ActivityLogs::CreatedAt),
            ] {
                manager
                    .create_index(
                        Index::create()
                            .name(name)
                            .table(ActivityLogs::Table)
                            .col(col)
                            .to_owned(),
                    )
                    .await?;
            }

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ActivityLogs::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden, Clone, Copy)]
    pub enum ActivityLogs {
        Table,
        Id,
        UserId,
        Action,
        TableName,
        RecordId,
        Details,
        IpAddress,
        CreatedAt,
    }
}

mod m20240101_000007_seed_reference_data {
    use super::m20240101_000003_create_dispense_types_table::DispenseTypes;
    use super::m20240101_000004_create_receipt_statuses_table::ReceiptStatuses;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000007_seed_reference_data"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // Insertion order fixes the ids on a fresh database. "dispensed"
            // must land on id 1: every status rule branches on that id.
            let statuses = [
                ("dispensed", "#4CAF50"),
                ("pending", "#F44336"),
                ("on hold", "#FF9800"),
                ("returned", "#2196F3"),
            ];
            for (name, color) in statuses {
                manager
                    .exec_stmt(
                        Query::insert()
                            .into_table(ReceiptStatuses::Table)
                            .columns([ReceiptStatuses::Name, ReceiptStatuses::ColorCode])
                            .values_panic([name.into(), color.into()])
                            .to_owned(),
                    )
                    .await?;
            }

            let dispense_types = [
                ("allocation", "regular allocated dispensing"),
                ("orders", "dispensing against standing orders"),
                ("tasks", "dispensing for specific tasks"),
                ("emergency", "emergency dispensing"),
                ("training", "dispensing for training activities"),
            ];
            for (name, description) in dispense_types {
                manager
                    .exec_stmt(
                        Query::insert()
                            .into_table(DispenseTypes::Table)
                            .columns([DispenseTypes::Name, DispenseTypes::Description])
                            .values_panic([name.into(), description.into()])
                            .to_owned(),
                    )
                    .await?;
            }

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .exec_stmt(Query::delete().from_table(DispenseTypes::Table).to_owned())
                .await?;
            manager
                .exec_stmt(Query::delete().from_table(ReceiptStatuses::Table).to_owned())
                .await?;
            Ok(())
        }
    }
}
