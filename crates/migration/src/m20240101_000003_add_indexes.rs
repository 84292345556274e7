use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // PhoneNumber: lookups and cascades go through contact_id
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_phone_number_contact")
                    .table(PhoneNumber::Table)
                    .col(PhoneNumber::ContactId)
                    .to_owned(),
            )
            .await?;

        // Contact: list/search results are ordered by id, name is filtered on
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_contact_name")
                    .table(Contact::Table)
                    .col(Contact::Name)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_phone_number_contact").table(PhoneNumber::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_contact_name").table(Contact::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum PhoneNumber { Table, ContactId }

#[derive(DeriveIden)]
enum Contact { Table, Name }
