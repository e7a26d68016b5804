use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SubjectAliases::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SubjectAliases::Alias)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SubjectAliases::CanonicalId)
                            .string()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-subject_aliases-canonical_id")
                    .table(SubjectAliases::Table)
                    .col(SubjectAliases::CanonicalId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SubjectAliases::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum SubjectAliases {
    Table,
    Alias,
    CanonicalId,
}
