use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RedemptionRequests::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RedemptionRequests::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(RedemptionRequests::SubjectId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RedemptionRequests::RequestedPoints)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RedemptionRequests::RatePerPointMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(RedemptionRequests::Note).string())
                    .col(ColumnDef::new(RedemptionRequests::Status).string().not_null())
                    .col(
                        ColumnDef::new(RedemptionRequests::RequestedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RedemptionRequests::DecidedAt)
                            .timestamp_with_time_zone(),
                    )
                    .col(
                        ColumnDef::new(RedemptionRequests::AcceptedAt)
                            .timestamp_with_time_zone(),
                    )
                    .col(
                        ColumnDef::new(RedemptionRequests::FulfilledAt)
                            .timestamp_with_time_zone(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-redemption_requests-subject_id-status")
                    .table(RedemptionRequests::Table)
                    .col(RedemptionRequests::SubjectId)
                    .col(RedemptionRequests::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RedemptionRequests::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum RedemptionRequests {
    Table,
    Id,
    SubjectId,
    RequestedPoints,
    RatePerPointMinor,
    Note,
    Status,
    RequestedAt,
    DecidedAt,
    AcceptedAt,
    FulfilledAt,
}
