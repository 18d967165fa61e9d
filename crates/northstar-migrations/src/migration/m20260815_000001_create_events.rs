use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ========================================
        // EVENTS TABLE
        // ========================================
        manager
            .create_table(
                Table::create()
                    .table(Events::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Events::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Events::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Events::EventName).string().not_null())
                    .col(
                        ColumnDef::new(Events::EventTimestamp)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Events::Platform).string().null())
                    .to_owned(),
            )
            .await?;

        // Composite index for ordered per-user scans
        manager
            .create_index(
                Index::create()
                    .name("idx_events_user_time")
                    .table(Events::Table)
                    .col(Events::UserId)
                    .col(Events::EventTimestamp)
                    .to_owned(),
            )
            .await?;

        // Single-column index for milestone filters
        manager
            .create_index(
                Index::create()
                    .name("idx_events_name")
                    .table(Events::Table)
                    .col(Events::EventName)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Events::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Events {
    Table,
    Id,
    UserId,
    EventName,
    EventTimestamp,
    Platform,
}
