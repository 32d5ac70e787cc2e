use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Upvotes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Upvotes::Id)
                            .uuid()
                            .not_null()
                            .primary_key()
                            .extra("DEFAULT gen_random_uuid()".to_string()),
                    )
                    .col(ColumnDef::new(Upvotes::IncidentId).uuid().not_null())
                    .col(ColumnDef::new(Upvotes::ActorKey).string().not_null())
                    .col(ColumnDef::new(Upvotes::CreatedAt).timestamp().not_null().extra("DEFAULT CURRENT_TIMESTAMP".to_string()))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_upvotes_incident_id")
                            .from(Upvotes::Table, Upvotes::IncidentId)
                            .to(Incidents::Table, Incidents::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_upvotes_incident_actor")
                    .table(Upvotes::Table)
                    .col(Upvotes::IncidentId)
                    .col(Upvotes::ActorKey)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Upvotes::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Upvotes {
    Table,
    Id,
    IncidentId,
    ActorKey,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Incidents {
    Table,
    Id,
}
