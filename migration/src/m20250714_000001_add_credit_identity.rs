use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// A person can hold several distinct roles on one movie (actor and director,
// two characters). What must never repeat is the full identity of a credit.
// character_name and job hold empty strings rather than NULL, otherwise
// null-distinct rows would slip past this index.
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for suffix in ["", "_pending"] {
            manager
                .create_index(
                    Index::create()
                        .name(format!("idx_credits{suffix}_identity"))
                        .table(Alias::new(format!("credits{suffix}")))
                        .col(Credits::MovieId)
                        .col(Credits::PersonId)
                        .col(Credits::CreditType)
                        .col(Credits::CharacterName)
                        .col(Credits::Job)
                        .unique()
                        .to_owned(),
                )
                .await?;
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for suffix in ["", "_pending"] {
            manager
                .drop_index(
                    Index::drop()
                        .name(format!("idx_credits{suffix}_identity"))
                        .table(Alias::new(format!("credits{suffix}")))
                        .to_owned(),
                )
                .await?;
        }
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Credits {
    MovieId,
    PersonId,
    CreditType,
    CharacterName,
    Job,
}
