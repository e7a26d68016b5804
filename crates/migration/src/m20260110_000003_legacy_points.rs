use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Pre-consolidation point rows, kept verbatim for aggregation.
        // The engine never writes here.
        manager
            .create_table(
                Table::create()
                    .table(LegacyPoints::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LegacyPoints::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LegacyPoints::ChildKey).string().not_null())
                    .col(
                        ColumnDef::new(LegacyPoints::Points)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(LegacyPoints::Note).string().not_null())
                    .col(
                        ColumnDef::new(LegacyPoints::AwardedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-legacy_points-child_key")
                    .table(LegacyPoints::Table)
                    .col(LegacyPoints::ChildKey)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(LegacyPoints::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum LegacyPoints {
    Table,
    Id,
    ChildKey,
    Points,
    Note,
    AwardedAt,
}
