use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_catalog_tables::Migration),
            Box::new(m20240101_000002_create_order_tables::Migration),
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
                        .table(Products::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Products::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Products::Title).string().not_null())
                        .col(ColumnDef::new(Products::Description).text())
                        .col(
                            ColumnDef::new(Products::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Products::UpdatedAt).timestamp_with_time_zone())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Preorders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Preorders::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Preorders::Title).string().not_null())
                        .col(ColumnDef::new(Preorders::Status).string().not_null())
                        .col(ColumnDef::new(Preorders::ExpectedArrival).string())
                        .col(
                            ColumnDef::new(Preorders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Preorders::UpdatedAt).timestamp_with_time_zone())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Publications::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Publications::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Publications::Link)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Publications::PreorderId).uuid())
                        .col(
                            ColumnDef::new(Publications::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Publications::UpdatedAt).timestamp_with_time_zone())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_publications_preorder")
                                .from(Publications::Table, Publications::PreorderId)
                                .to(Preorders::Table, Preorders::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(CreditPlans::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(CreditPlans::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CreditPlans::Title)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(CreditPlans::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(CreditPlans::UpdatedAt).timestamp_with_time_zone())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(CreditParts::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(CreditParts::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(CreditParts::CreditPlanId).uuid().not_null())
                        .col(ColumnDef::new(CreditParts::PartIndex).integer().not_null())
                        .col(ColumnDef::new(CreditParts::Sum).big_integer().not_null())
                        .col(ColumnDef::new(CreditParts::Deadline).date().not_null())
                        .col(
                            ColumnDef::new(CreditParts::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(CreditParts::UpdatedAt).timestamp_with_time_zone())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_credit_parts_plan")
                                .from(CreditParts::Table, CreditParts::CreditPlanId)
                                .to(CreditPlans::Table, CreditPlans::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_credit_parts_plan")
                        .table(CreditParts::Table)
                        .col(CreditParts::CreditPlanId)
                        .to_owned(),
                )
                .await?;

            // The CHECK on ordered_quantity is the oversell authority:
            // reservation relies on it rather than pre-checking in code.
            manager
                .create_table(
                    Table::create()
                        .table(CatalogItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(CatalogItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CatalogItems::PublicationId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(CatalogItems::ProductId).uuid().not_null())
                        .col(ColumnDef::new(CatalogItems::CreditPlanId).uuid())
                        .col(ColumnDef::new(CatalogItems::Price).big_integer().not_null())
                        .col(ColumnDef::new(CatalogItems::IsActive).boolean().not_null())
                        .col(ColumnDef::new(CatalogItems::Quantity).big_integer())
                        .col(
                            ColumnDef::new(CatalogItems::OrderedQuantity)
                                .big_integer()
                                .not_null()
                                .default(0)
                                .check(
                                    Expr::col(CatalogItems::Quantity).is_null().or(Expr::col(
                                        CatalogItems::OrderedQuantity,
                                    )
                                    .lte(Expr::col(CatalogItems::Quantity))),
                                ),
                        )
                        .col(
                            ColumnDef::new(CatalogItems::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(CatalogItems::UpdatedAt).timestamp_with_time_zone())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_catalog_items_publication")
                                .from(CatalogItems::Table, CatalogItems::PublicationId)
                                .to(Publications::Table, Publications::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_catalog_items_product")
                                .from(CatalogItems::Table, CatalogItems::ProductId)
                                .to(Products::Table, Products::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_catalog_items_credit_plan")
                                .from(CatalogItems::Table, CatalogItems::CreditPlanId)
                                .to(CreditPlans::Table, CreditPlans::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_catalog_items_publication")
                        .table(CatalogItems::Table)
                        .col(CatalogItems::PublicationId)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(CatalogItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(CreditParts::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(CreditPlans::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Publications::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Preorders::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await?;
            Ok(())
        }
    }

    #[derive(Iden)]
    pub(super) enum Products {
        Table,
        Id,
        Title,
        Description,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    pub(super) enum Preorders {
        Table,
        Id,
        Title,
        Status,
        ExpectedArrival,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    pub(super) enum Publications {
        Table,
        Id,
        Link,
        PreorderId,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    pub(super) enum CreditPlans {
        Table,
        Id,
        Title,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    pub(super) enum CreditParts {
        Table,
        Id,
        CreditPlanId,
        PartIndex,
        Sum,
        Deadline,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    pub(super) enum CatalogItems {
        Table,
        Id,
        PublicationId,
        ProductId,
        CreditPlanId,
        Price,
        IsActive,
        Quantity,
        OrderedQuantity,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000002_create_order_tables {
    use sea_orm_migration::prelude::*;

    use super::m20240101_000001_create_catalog_tables::{CatalogItems, Preorders};

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_order_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Deliveries::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Deliveries::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Deliveries::Service).string().not_null())
                        .col(ColumnDef::new(Deliveries::Address).text().not_null())
                        .col(ColumnDef::new(Deliveries::AddressIdentifier).string())
                        .col(ColumnDef::new(Deliveries::RecipientName).string())
                        .col(ColumnDef::new(Deliveries::RecipientPhone).string())
                        .col(ColumnDef::new(Deliveries::TrackCode).string())
                        .col(
                            ColumnDef::new(Deliveries::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Deliveries::UpdatedAt).timestamp_with_time_zone())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Orders::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Orders::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Orders::UserId).uuid().not_null())
                        .col(ColumnDef::new(Orders::PreorderId).uuid())
                        .col(ColumnDef::new(Orders::DeliveryId).uuid())
                        .col(ColumnDef::new(Orders::Status).string().not_null())
                        .col(
                            ColumnDef::new(Orders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Orders::UpdatedAt).timestamp_with_time_zone())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_orders_delivery")
                                .from(Orders::Table, Orders::DeliveryId)
                                .to(Deliveries::Table, Deliveries::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_orders_preorder")
                                .from(Orders::Table, Orders::PreorderId)
                                .to(Preorders::Table, Preorders::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_orders_user")
                        .table(Orders::Table)
                        .col(Orders::UserId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(OrderItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(OrderItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrderItems::OrderId).uuid().not_null())
                        .col(ColumnDef::new(OrderItems::ItemId).uuid().not_null())
                        .col(
                            ColumnDef::new(OrderItems::Quantity)
                                .big_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrderItems::Price).big_integer().not_null())
                        .col(ColumnDef::new(OrderItems::ByCredit).boolean().not_null())
                        .col(
                            ColumnDef::new(OrderItems::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrderItems::UpdatedAt).timestamp_with_time_zone())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_order_items_order")
                                .from(OrderItems::Table, OrderItems::OrderId)
                                .to(Orders::Table, Orders::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_order_items_catalog_item")
                                .from(OrderItems::Table, OrderItems::ItemId)
                                .to(CatalogItems::Table, CatalogItems::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_order_items_order")
                        .table(OrderItems::Table)
                        .col(OrderItems::OrderId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Invoices::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Invoices::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Invoices::OrderId).uuid().not_null())
                        .col(ColumnDef::new(Invoices::OrderItemId).uuid())
                        .col(ColumnDef::new(Invoices::Title).string().not_null())
                        .col(ColumnDef::new(Invoices::InvoiceType).string().not_null())
                        .col(ColumnDef::new(Invoices::CreditPartIndex).integer())
                        .col(ColumnDef::new(Invoices::Amount).big_integer().not_null())
                        .col(ColumnDef::new(Invoices::Status).string().not_null())
                        .col(
                            ColumnDef::new(Invoices::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Invoices::UpdatedAt).timestamp_with_time_zone())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_invoices_order")
                                .from(Invoices::Table, Invoices::OrderId)
                                .to(Orders::Table, Orders::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_invoices_order_item")
                                .from(Invoices::Table, Invoices::OrderItemId)
                                .to(OrderItems::Table, OrderItems::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_invoices_order")
                        .table(Invoices::Table)
                        .col(Invoices::OrderId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Payments::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Payments::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Payments::InvoiceId).uuid().not_null())
                        .col(
                            ColumnDef::new(Payments::ExternalId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Payments::Url).string().not_null())
                        .col(ColumnDef::new(Payments::Status).string().not_null())
                        .col(ColumnDef::new(Payments::DueAt).timestamp_with_time_zone())
                        .col(
                            ColumnDef::new(Payments::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Payments::UpdatedAt).timestamp_with_time_zone())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_payments_invoice")
                                .from(Payments::Table, Payments::InvoiceId)
                                .to(Invoices::Table, Invoices::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_payments_invoice")
                        .table(Payments::Table)
                        .col(Payments::InvoiceId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_payments_external")
                        .table(Payments::Table)
                        .col(Payments::ExternalId)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Payments::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Invoices::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(OrderItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Orders::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Deliveries::Table).to_owned())
                .await?;
            Ok(())
        }
    }

    #[derive(Iden)]
    enum Deliveries {
        Table,
        Id,
        Service,
        Address,
        AddressIdentifier,
        RecipientName,
        RecipientPhone,
        TrackCode,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum Orders {
        Table,
        Id,
        UserId,
        PreorderId,
        DeliveryId,
        Status,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum OrderItems {
        Table,
        Id,
        OrderId,
        ItemId,
        Quantity,
        Price,
        ByCredit,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum Invoices {
        Table,
        Id,
        OrderId,
        OrderItemId,
        Title,
        InvoiceType,
        CreditPartIndex,
        Amount,
        Status,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum Payments {
        Table,
        Id,
        InvoiceId,
        ExternalId,
        Url,
        Status,
        DueAt,
        CreatedAt,
        UpdatedAt,
    }
}
