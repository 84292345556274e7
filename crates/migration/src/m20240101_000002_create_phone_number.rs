//! Create `phone_number` table.
//! Each row belongs to exactly one contact and goes away with it.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PhoneNumber::Table)
                    .if_not_exists()
                    .col(integer(PhoneNumber::Id).auto_increment().primary_key())
                    .col(string_len(PhoneNumber::Number, 64).not_null())
                    .col(integer(PhoneNumber::ContactId).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_phone_number_contact")
                            .from(PhoneNumber::Table, PhoneNumber::ContactId)
                            .to(Contact::Table, Contact::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(PhoneNumber::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum PhoneNumber {
    Table,
    Id,
    Number,
    ContactId,
}

#[derive(DeriveIden)]
enum Contact { Table, Id }
