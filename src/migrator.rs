use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_tenancy_tables::Migration),
            Box::new(m20240301_000002_create_fleet_tables::Migration),
            Box::new(m20240301_000003_create_inventory_tables::Migration),
            Box::new(m20240301_000004_create_service_order_tables::Migration),
            Box::new(m20240301_000005_create_finance_tables::Migration),
        ]
    }
}

mod m20240301_000001_create_tenancy_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000001_create_tenancy_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Tenants::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Tenants::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Tenants::Name).string().not_null().unique_key())
                        .col(ColumnDef::new(Tenants::Document).string().null())
                        .col(ColumnDef::new(Tenants::Subdomain).string().null().unique_key())
                        .col(
                            ColumnDef::new(Tenants::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Tenants::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Users::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Users::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Users::TenantId).integer().not_null())
                        .col(ColumnDef::new(Users::Name).string().not_null())
                        .col(ColumnDef::new(Users::Email).string().not_null())
                        .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                        .col(ColumnDef::new(Users::Role).string_len(16).not_null())
                        .col(ColumnDef::new(Users::ClientId).integer().null())
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
                                .name("fk_users_tenant")
                                .from(Users::Table, Users::TenantId)
                                .to(Tenants::Table, Tenants::Id),
                        )
                        .to_owned(),
                )
                .await?;

            // Email is unique per tenant; the same address may exist in two shops.
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_users_tenant_email")
                        .table(Users::Table)
                        .col(Users::TenantId)
                        .col(Users::Email)
                        .unique()
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Users::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Tenants::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Tenants {
        Table,
        Id,
        Name,
        Document,
        Subdomain,
        IsActive,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum Users {
        Table,
        Id,
        TenantId,
        Name,
        Email,
        PasswordHash,
        Role,
        ClientId,
        IsActive,
        CreatedAt,
    }
}

mod m20240301_000002_create_fleet_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000002_create_fleet_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Clients::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Clients::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Clients::TenantId).integer().not_null())
                        .col(ColumnDef::new(Clients::Name).string().not_null())
                        .col(ColumnDef::new(Clients::Document).string().not_null())
                        .col(ColumnDef::new(Clients::Phone).string().null())
                        .col(ColumnDef::new(Clients::Email).string().null())
                        .col(ColumnDef::new(Clients::Address).string().null())
                        .col(ColumnDef::new(Clients::ClientType).string().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Marinas::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Marinas::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Marinas::TenantId).integer().not_null())
                        .col(ColumnDef::new(Marinas::Name).string().not_null())
                        .col(ColumnDef::new(Marinas::Address).string().null())
                        .col(ColumnDef::new(Marinas::ContactName).string().null())
                        .col(ColumnDef::new(Marinas::Phone).string().null())
                        .col(ColumnDef::new(Marinas::Coordinates).string().null())
                        .col(ColumnDef::new(Marinas::OperatingHours).string().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Boats::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Boats::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Boats::TenantId).integer().not_null())
                        .col(ColumnDef::new(Boats::ClientId).integer().not_null())
                        .col(ColumnDef::new(Boats::MarinaId).integer().null())
                        .col(ColumnDef::new(Boats::Name).string().not_null())
                        .col(ColumnDef::new(Boats::HullId).string().not_null())
                        .col(ColumnDef::new(Boats::UsageType).string().null())
                        .col(ColumnDef::new(Boats::Model).string().null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_boats_client")
                                .from(Boats::Table, Boats::ClientId)
                                .to(Clients::Table, Clients::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_boats_marina")
                                .from(Boats::Table, Boats::MarinaId)
                                .to(Marinas::Table, Marinas::Id)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Engines::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Engines::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Engines::TenantId).integer().not_null())
                        .col(ColumnDef::new(Engines::BoatId).integer().not_null())
                        .col(ColumnDef::new(Engines::SerialNumber).string().not_null())
                        .col(ColumnDef::new(Engines::MotorNumber).string().null())
                        .col(ColumnDef::new(Engines::Model).string().not_null())
                        .col(
                            ColumnDef::new(Engines::SaleDate)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(ColumnDef::new(Engines::WarrantyStatus).string().null())
                        .col(
                            ColumnDef::new(Engines::WarrantyValidity)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Engines::Hours)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Engines::Year).integer().null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_engines_boat")
                                .from(Engines::Table, Engines::BoatId)
                                .to(Boats::Table, Boats::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Manufacturers::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Manufacturers::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Manufacturers::TenantId).integer().not_null())
                        .col(ColumnDef::new(Manufacturers::Name).string().not_null())
                        .col(
                            ColumnDef::new(Manufacturers::ManufacturerType)
                                .string_len(16)
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ManufacturerModels::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ManufacturerModels::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(ManufacturerModels::ManufacturerId)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ManufacturerModels::Name).string().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_manufacturer_models_manufacturer")
                                .from(ManufacturerModels::Table, ManufacturerModels::ManufacturerId)
                                .to(Manufacturers::Table, Manufacturers::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_clients_tenant_id")
                        .table(Clients::Table)
                        .col(Clients::TenantId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_marinas_tenant_id")
                        .table(Marinas::Table)
                        .col(Marinas::TenantId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_boats_tenant_id")
                        .table(Boats::Table)
                        .col(Boats::TenantId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_boats_client_id")
                        .table(Boats::Table)
                        .col(Boats::ClientId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_engines_boat_id")
                        .table(Engines::Table)
                        .col(Engines::BoatId)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ManufacturerModels::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Manufacturers::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Engines::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Boats::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Marinas::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Clients::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Clients {
        Table,
        Id,
        TenantId,
        Name,
        Document,
        Phone,
        Email,
        Address,
        ClientType,
    }

    #[derive(DeriveIden)]
    enum Marinas {
        Table,
        Id,
        TenantId,
        Name,
        Address,
        ContactName,
        Phone,
        Coordinates,
        OperatingHours,
    }

    #[derive(DeriveIden)]
    pub(super) enum Boats {
        Table,
        Id,
        TenantId,
        ClientId,
        MarinaId,
        Name,
        HullId,
        UsageType,
        Model,
    }

    #[derive(DeriveIden)]
    enum Engines {
        Table,
        Id,
        TenantId,
        BoatId,
        SerialNumber,
        MotorNumber,
        Model,
        SaleDate,
        WarrantyStatus,
        WarrantyValidity,
        Hours,
        Year,
    }

    #[derive(DeriveIden)]
    enum Manufacturers {
        Table,
        Id,
        TenantId,
        Name,
        ManufacturerType,
    }

    #[derive(DeriveIden)]
    enum ManufacturerModels {
        Table,
        Id,
        ManufacturerId,
        Name,
    }
}

mod m20240301_000003_create_inventory_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000003_create_inventory_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Parts::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Parts::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Parts::TenantId).integer().not_null())
                        .col(ColumnDef::new(Parts::Sku).string().not_null())
                        .col(ColumnDef::new(Parts::Barcode).string().null())
                        .col(ColumnDef::new(Parts::Name).string().not_null())
                        .col(ColumnDef::new(Parts::Quantity).decimal().not_null().default(0))
                        .col(ColumnDef::new(Parts::Cost).decimal().not_null().default(0))
                        .col(ColumnDef::new(Parts::Price).decimal().not_null().default(0))
                        .col(ColumnDef::new(Parts::MinStock).decimal().not_null().default(0))
                        .col(ColumnDef::new(Parts::Location).string().null())
                        .col(
                            ColumnDef::new(Parts::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Parts::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_parts_tenant_sku")
                        .table(Parts::Table)
                        .col(Parts::TenantId)
                        .col(Parts::Sku)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(StockMovements::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockMovements::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(StockMovements::TenantId).integer().not_null())
                        .col(ColumnDef::new(StockMovements::PartId).integer().not_null())
                        .col(
                            ColumnDef::new(StockMovements::MovementType)
                                .string_len(32)
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockMovements::Quantity).decimal().not_null())
                        .col(
                            ColumnDef::new(StockMovements::Date)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockMovements::Description).string().not_null())
                        .col(ColumnDef::new(StockMovements::ReferenceId).string().null())
                        .col(ColumnDef::new(StockMovements::Actor).string().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_stock_movements_part")
                                .from(StockMovements::Table, StockMovements::PartId)
                                .to(Parts::Table, Parts::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_movements_part_id")
                        .table(StockMovements::Table)
                        .col(StockMovements::PartId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Invoices::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Invoices::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Invoices::TenantId).integer().not_null())
                        .col(ColumnDef::new(Invoices::Number).string().not_null())
                        .col(ColumnDef::new(Invoices::Supplier).string().not_null())
                        .col(
                            ColumnDef::new(Invoices::Date)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Invoices::TotalValue).decimal().not_null())
                        .col(ColumnDef::new(Invoices::XmlKey).string().null())
                        .col(
                            ColumnDef::new(Invoices::ImportedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Invoices::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(StockMovements::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Parts::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Parts {
        Table,
        Id,
        TenantId,
        Sku,
        Barcode,
        Name,
        Quantity,
        Cost,
        Price,
        MinStock,
        Location,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum StockMovements {
        Table,
        Id,
        TenantId,
        PartId,
        MovementType,
        Quantity,
        Date,
        Description,
        ReferenceId,
        Actor,
    }

    #[derive(DeriveIden)]
    enum Invoices {
        Table,
        Id,
        TenantId,
        Number,
        Supplier,
        Date,
        TotalValue,
        XmlKey,
        ImportedAt,
    }
}

mod m20240301_000004_create_service_order_tables {
    use super::m20240301_000002_create_fleet_tables::Boats;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000004_create_service_order_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ServiceOrders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ServiceOrders::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(ServiceOrders::TenantId).integer().not_null())
                        .col(ColumnDef::new(ServiceOrders::BoatId).integer().not_null())
                        .col(ColumnDef::new(ServiceOrders::EngineId).integer().null())
                        .col(ColumnDef::new(ServiceOrders::Description).text().not_null())
                        .col(ColumnDef::new(ServiceOrders::Diagnosis).text().null())
                        .col(
                            ColumnDef::new(ServiceOrders::Status)
                                .string_len(32)
                                .not_null()
                                .default("PENDING"),
                        )
                        .col(
                            ColumnDef::new(ServiceOrders::TotalValue)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(ServiceOrders::Requester).string().null())
                        .col(ColumnDef::new(ServiceOrders::TechnicianName).string().null())
                        .col(
                            ColumnDef::new(ServiceOrders::ScheduledAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(ColumnDef::new(ServiceOrders::EstimatedDuration).integer().null())
                        .col(
                            ColumnDef::new(ServiceOrders::CompletedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ServiceOrders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ServiceOrders::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_service_orders_boat")
                                .from(ServiceOrders::Table, ServiceOrders::BoatId)
                                .to(Boats::Table, Boats::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_service_orders_tenant_status")
                        .table(ServiceOrders::Table)
                        .col(ServiceOrders::TenantId)
                        .col(ServiceOrders::Status)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ServiceItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ServiceItems::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(ServiceItems::OrderId).integer().not_null())
                        .col(ColumnDef::new(ServiceItems::ItemType).string_len(16).not_null())
                        .col(ColumnDef::new(ServiceItems::Description).string().not_null())
                        .col(ColumnDef::new(ServiceItems::PartId).integer().null())
                        .col(ColumnDef::new(ServiceItems::Quantity).decimal().not_null())
                        .col(
                            ColumnDef::new(ServiceItems::UnitCost)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(ServiceItems::UnitPrice).decimal().not_null())
                        .col(ColumnDef::new(ServiceItems::Total).decimal().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_service_items_order")
                                .from(ServiceItems::Table, ServiceItems::OrderId)
                                .to(ServiceOrders::Table, ServiceOrders::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_service_items_order_id")
                        .table(ServiceItems::Table)
                        .col(ServiceItems::OrderId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(OrderNotes::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(OrderNotes::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(OrderNotes::OrderId).integer().not_null())
                        .col(ColumnDef::new(OrderNotes::Text).text().not_null())
                        .col(ColumnDef::new(OrderNotes::UserName).string().null())
                        .col(
                            ColumnDef::new(OrderNotes::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_order_notes_order")
                                .from(OrderNotes::Table, OrderNotes::OrderId)
                                .to(ServiceOrders::Table, ServiceOrders::Id),
                        )
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(OrderNotes::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(ServiceItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(ServiceOrders::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum ServiceOrders {
        Table,
        Id,
        TenantId,
        BoatId,
        EngineId,
        Description,
        Diagnosis,
        Status,
        TotalValue,
        Requester,
        TechnicianName,
        ScheduledAt,
        EstimatedDuration,
        CompletedAt,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum ServiceItems {
        Table,
        Id,
        OrderId,
        ItemType,
        Description,
        PartId,
        Quantity,
        UnitCost,
        UnitPrice,
        Total,
    }

    #[derive(DeriveIden)]
    enum OrderNotes {
        Table,
        Id,
        OrderId,
        Text,
        UserName,
        CreatedAt,
    }
}

mod m20240301_000005_create_finance_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000005_create_finance_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Transactions::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Transactions::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Transactions::TenantId).integer().not_null())
                        .col(
                            ColumnDef::new(Transactions::TransactionType)
                                .string_len(16)
                                .not_null(),
                        )
                        .col(ColumnDef::new(Transactions::Category).string().not_null())
                        .col(ColumnDef::new(Transactions::Description).string().not_null())
                        .col(ColumnDef::new(Transactions::Amount).decimal().not_null())
                        .col(
                            ColumnDef::new(Transactions::Date)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Transactions::Status)
                                .string_len(16)
                                .not_null()
                                .default("PENDING"),
                        )
                        // Soft reference, survives order deletion
                        .col(ColumnDef::new(Transactions::OrderId).integer().null())
                        .col(ColumnDef::new(Transactions::DocumentNumber).string().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_transactions_tenant_order")
                        .table(Transactions::Table)
                        .col(Transactions::TenantId)
                        .col(Transactions::OrderId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(CompanyInfo::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(CompanyInfo::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(CompanyInfo::TenantId)
                                .integer()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(CompanyInfo::CompanyName).string().not_null())
                        .col(ColumnDef::new(CompanyInfo::TradeName).string().null())
                        .col(ColumnDef::new(CompanyInfo::Cnpj).string().null())
                        .col(ColumnDef::new(CompanyInfo::Ie).string().null())
                        .col(ColumnDef::new(CompanyInfo::Street).string().null())
                        .col(ColumnDef::new(CompanyInfo::Number).string().null())
                        .col(ColumnDef::new(CompanyInfo::Neighborhood).string().null())
                        .col(ColumnDef::new(CompanyInfo::City).string().null())
                        .col(ColumnDef::new(CompanyInfo::State).string().null())
                        .col(ColumnDef::new(CompanyInfo::ZipCode).string().null())
                        .col(ColumnDef::new(CompanyInfo::Crt).string().null())
                        .col(
                            ColumnDef::new(CompanyInfo::Environment)
                                .string()
                                .not_null()
                                .default("homologation"),
                        )
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(CompanyInfo::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Transactions::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Transactions {
        Table,
        Id,
        TenantId,
        TransactionType,
        Category,
        Description,
        Amount,
        Date,
        Status,
        OrderId,
        DocumentNumber,
    }

    #[derive(DeriveIden)]
    enum CompanyInfo {
        Table,
        Id,
        TenantId,
        CompanyName,
        TradeName,
        Cnpj,
        Ie,
        Street,
        Number,
        Neighborhood,
        City,
        State,
        ZipCode,
        Crt,
        Environment,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{ConnectOptions, Database};

    #[tokio::test]
    async fn migrations_apply_on_sqlite_and_can_be_rolled_back() {
        let mut opt = ConnectOptions::new("sqlite::memory:");
        opt.max_connections(1).min_connections(1);
        let db = Database::connect(opt).await.unwrap();
        Migrator::up(&db, None).await.unwrap();

        let manager = SchemaManager::new(&db);
        for table in [
            "tenants",
            "users",
            "boats",
            "engines",
            "parts",
            "stock_movements",
            "service_orders",
            "service_items",
            "order_notes",
            "transactions",
            "company_info",
        ] {
            assert!(manager.has_table(table).await.unwrap(), "missing {table}");
        }

        Migrator::down(&db, None).await.unwrap();
        assert!(!manager.has_table("service_orders").await.unwrap());
    }
}
