use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UsageEvents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UsageEvents::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UsageEvents::SubjectId).string().not_null())
                    .col(ColumnDef::new(UsageEvents::ActionKind).string().not_null())
                    .col(
                        ColumnDef::new(UsageEvents::OccurredAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-usage_events-subject_id-action_kind-occurred_at")
                    .table(UsageEvents::Table)
                    .col(UsageEvents::SubjectId)
                    .col(UsageEvents::ActionKind)
                    .col(UsageEvents::OccurredAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UsageEvents::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum UsageEvents {
    Table,
    Id,
    SubjectId,
    ActionKind,
    OccurredAt,
}
