use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CitizenSubscriptions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CitizenSubscriptions::Id)
                            .uuid()
                            .not_null()
                            .primary_key()
                            .extra("DEFAULT gen_random_uuid()".to_string()),
                    )
                    .col(ColumnDef::new(CitizenSubscriptions::IncidentId).uuid().not_null())
                    .col(ColumnDef::new(CitizenSubscriptions::PushToken).string())
                    .col(ColumnDef::new(CitizenSubscriptions::Email).string())
                    .col(ColumnDef::new(CitizenSubscriptions::Phone).string())
                    .col(ColumnDef::new(CitizenSubscriptions::PrefPush).boolean().not_null().default(false))
                    .col(ColumnDef::new(CitizenSubscriptions::PrefEmail).boolean().not_null().default(false))
                    .col(ColumnDef::new(CitizenSubscriptions::PrefSms).boolean().not_null().default(false))
                    .col(ColumnDef::new(CitizenSubscriptions::IsActive).boolean().not_null().default(true))
                    .col(ColumnDef::new(CitizenSubscriptions::CreatedAt).timestamp().not_null().extra("DEFAULT CURRENT_TIMESTAMP".to_string()))
                    .col(ColumnDef::new(CitizenSubscriptions::UpdatedAt).timestamp().not_null().extra("DEFAULT CURRENT_TIMESTAMP".to_string()))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_citizen_subscriptions_incident_id")
                            .from(CitizenSubscriptions::Table, CitizenSubscriptions::IncidentId)
                            .to(Incidents::Table, Incidents::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_citizen_subscriptions_incident_id")
                    .table(CitizenSubscriptions::Table)
                    .col(CitizenSubscriptions::IncidentId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_citizen_subscriptions_push_token")
                    .table(CitizenSubscriptions::Table)
                    .col(CitizenSubscriptions::PushToken)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CitizenSubscriptions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum CitizenSubscriptions {
    Table,
    Id,
    IncidentId,
    PushToken,
    Email,
    Phone,
    PrefPush,
    PrefEmail,
    PrefSms,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Incidents {
    Table,
    Id,
}
