use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Incidents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Incidents::Id)
                            .uuid()
                            .not_null()
                            .primary_key()
                            .extra("DEFAULT gen_random_uuid()".to_string()),
                    )
                    .col(ColumnDef::new(Incidents::Title).string().not_null())
                    .col(ColumnDef::new(Incidents::Description).text().not_null())
                    .col(ColumnDef::new(Incidents::IncidentType).string().not_null())
                    .col(ColumnDef::new(Incidents::Priority).string().not_null().default("medium"))
                    .col(ColumnDef::new(Incidents::Status).string().not_null().default("reported"))
                    .col(ColumnDef::new(Incidents::LocationLat).double())
                    .col(ColumnDef::new(Incidents::LocationLng).double())
                    .col(ColumnDef::new(Incidents::LocationAddress).string())
                    .col(ColumnDef::new(Incidents::StationId).uuid())
                    .col(ColumnDef::new(Incidents::OrganisationId).uuid())
                    .col(ColumnDef::new(Incidents::ReportedById).uuid().not_null())
                    .col(ColumnDef::new(Incidents::ReporterEmail).string())
                    .col(ColumnDef::new(Incidents::ReporterPhone).string())
                    .col(ColumnDef::new(Incidents::AssignedTo).uuid())
                    .col(ColumnDef::new(Incidents::AssignedBy).uuid())
                    .col(ColumnDef::new(Incidents::AssignedAt).timestamp())
                    .col(ColumnDef::new(Incidents::ResolvedBy).uuid())
                    .col(ColumnDef::new(Incidents::ResolvedAt).timestamp())
                    .col(ColumnDef::new(Incidents::Resolution).text())
                    .col(ColumnDef::new(Incidents::EscalationLevel).integer().not_null().default(0))
                    .col(ColumnDef::new(Incidents::EscalatedBy).uuid())
                    .col(ColumnDef::new(Incidents::EscalatedAt).timestamp())
                    .col(ColumnDef::new(Incidents::EscalationReason).text())
                    .col(ColumnDef::new(Incidents::StatusUpdatedAt).timestamp())
                    .col(ColumnDef::new(Incidents::UpvoteCount).integer().not_null().default(0))
                    .col(ColumnDef::new(Incidents::CreatedAt).timestamp().not_null().extra("DEFAULT CURRENT_TIMESTAMP".to_string()))
                    .col(ColumnDef::new(Incidents::UpdatedAt).timestamp().not_null().extra("DEFAULT CURRENT_TIMESTAMP".to_string()))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_incidents_station_id")
                            .from(Incidents::Table, Incidents::StationId)
                            .to(Stations::Table, Stations::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_incidents_organisation_id")
                            .from(Incidents::Table, Incidents::OrganisationId)
                            .to(Organizations::Table, Organizations::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        for (name, col) in [
            ("idx_incidents_status", Incidents::Status),
            ("idx_incidents_priority", Incidents::Priority),
            ("idx_incidents_station_id", Incidents::StationId),
            ("idx_incidents_organisation_id", Incidents::OrganisationId),
            ("idx_incidents_reported_by_id", Incidents::ReportedById),
            ("idx_incidents_created_at", Incidents::CreatedAt),
        ] {
            manager
                .create_index(Index::create().name(name).table(Incidents::Table).col(col).to_owned())
                .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Incidents::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Incidents {
    Table,
    Id,
    Title,
    Description,
    IncidentType,
    Priority,
    Status,
    LocationLat,
    LocationLng,
    LocationAddress,
    StationId,
    OrganisationId,
    ReportedById,
    ReporterEmail,
    ReporterPhone,
    AssignedTo,
    AssignedBy,
    AssignedAt,
    ResolvedBy,
    ResolvedAt,
    Resolution,
    EscalationLevel,
    EscalatedBy,
    EscalatedAt,
    EscalationReason,
    StatusUpdatedAt,
    UpvoteCount,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Stations {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Organizations {
    Table,
    Id,
}
