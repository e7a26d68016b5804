use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(LedgerEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LedgerEntries::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LedgerEntries::SubjectId).string().not_null())
                    .col(
                        ColumnDef::new(LedgerEntries::Amount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(LedgerEntries::Reason).string().not_null())
                    .col(
                        ColumnDef::new(LedgerEntries::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LedgerEntries::EvidenceCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(LedgerEntries::SourceKey).string())
                    .to_owned(),
            )
            .await?;

        // Idempotency is enforced here, not by application-level
        // check-then-insert: at most one row per (subject, source_key).
        manager
            .create_index(
                Index::create()
                    .name("uidx-ledger_entries-subject_id-source_key")
                    .table(LedgerEntries::Table)
                    .col(LedgerEntries::SubjectId)
                    .col(LedgerEntries::SourceKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-ledger_entries-subject_id-created_at")
                    .table(LedgerEntries::Table)
                    .col(LedgerEntries::SubjectId)
                    .col(LedgerEntries::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(LedgerEntries::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum LedgerEntries {
    Table,
    Id,
    SubjectId,
    Amount,
    Reason,
    CreatedAt,
    EvidenceCount,
    SourceKey,
}
