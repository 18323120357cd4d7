use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

// Production tables use the bare name, staged rows live in a structurally
// identical twin with the _pending suffix.
const SET_SUFFIXES: [&str; 2] = ["", "_pending"];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for suffix in SET_SUFFIXES {
            create_movies(manager, suffix).await?;
            create_people(manager, suffix).await?;
            create_credits(manager, suffix).await?;
            create_genres(manager, suffix).await?;
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for suffix in SET_SUFFIXES {
            for base in ["credits", "genres", "people", "movies"] {
                manager
                    .drop_table(
                        Table::drop()
                            .table(Alias::new(format!("{base}{suffix}")))
                            .if_exists()
                            .to_owned(),
                    )
                    .await?;
            }
        }
        Ok(())
    }
}

async fn create_movies(manager: &SchemaManager<'_>, suffix: &str) -> Result<(), DbErr> {
    let table = Alias::new(format!("movies{suffix}"));

    manager
        .create_table(
            Table::create()
                .table(table.clone())
                .if_not_exists()
                .col(integer(Movies::Id).primary_key())
                .col(string(Movies::Title))
                .col(string_null(Movies::OriginalTitle))
                .col(text_null(Movies::Overview))
                .col(string_null(Movies::ReleaseDate))
                .col(integer_null(Movies::Runtime))
                .col(string_null(Movies::Status))
                .col(text_null(Movies::Tagline))
                .col(double_null(Movies::VoteAverage))
                .col(integer_null(Movies::VoteCount))
                .col(double_null(Movies::Popularity))
                .col(string_null(Movies::PosterPath))
                .col(string_null(Movies::BackdropPath))
                .col(big_integer_null(Movies::Budget))
                .col(big_integer_null(Movies::Revenue))
                .col(string_null(Movies::ImdbId))
                .col(string_null(Movies::OriginalLanguage))
                .col(string_null(Movies::OriginCountry))
                .col(string_null(Movies::EnglishName))
                .col(string_null(Movies::SpokenLanguageCodes))
                .col(big_integer(Movies::CreatedAt))
                .col(big_integer(Movies::UpdatedAt))
                .to_owned(),
        )
        .await?;

    manager
        .create_index(
            Index::create()
                .name(format!("idx_movies{suffix}_release_date"))
                .table(table.clone())
                .col(Movies::ReleaseDate)
                .to_owned(),
        )
        .await?;

    manager
        .create_index(
            Index::create()
                .name(format!("idx_movies{suffix}_title"))
                .table(table)
                .col(Movies::Title)
                .to_owned(),
        )
        .await?;

    Ok(())
}

async fn create_people(manager: &SchemaManager<'_>, suffix: &str) -> Result<(), DbErr> {
    let table = Alias::new(format!("people{suffix}"));

    manager
        .create_table(
            Table::create()
                .table(table.clone())
                .if_not_exists()
                .col(integer(People::Id).primary_key())
                .col(string(People::Name))
                .col(string_null(People::ProfilePath))
                .col(integer_null(People::Gender))
                .col(string_null(People::KnownForDepartment))
                .col(big_integer(People::CreatedAt))
                .col(big_integer(People::UpdatedAt))
                .to_owned(),
        )
        .await?;

    manager
        .create_index(
            Index::create()
                .name(format!("idx_people{suffix}_name"))
                .table(table)
                .col(People::Name)
                .to_owned(),
        )
        .await?;

    Ok(())
}

async fn create_credits(manager: &SchemaManager<'_>, suffix: &str) -> Result<(), DbErr> {
    let table = Alias::new(format!("credits{suffix}"));

    manager
        .create_table(
            Table::create()
                .table(table.clone())
                .if_not_exists()
                .col(pk_auto(Credits::Id))
                .col(integer(Credits::MovieId))
                .col(integer(Credits::PersonId))
                .col(string(Credits::CreditType))
                .col(string(Credits::CharacterName).default(""))
                .col(integer_null(Credits::CreditOrder))
                .col(string_null(Credits::Department))
                .col(string(Credits::Job).default(""))
                .col(big_integer(Credits::CreatedAt))
                .to_owned(),
        )
        .await?;

    manager
        .create_index(
            Index::create()
                .name(format!("idx_credits{suffix}_movie_id"))
                .table(table.clone())
                .col(Credits::MovieId)
                .to_owned(),
        )
        .await?;

    manager
        .create_index(
            Index::create()
                .name(format!("idx_credits{suffix}_person_id"))
                .table(table)
                .col(Credits::PersonId)
                .to_owned(),
        )
        .await?;

    Ok(())
}

async fn create_genres(manager: &SchemaManager<'_>, suffix: &str) -> Result<(), DbErr> {
    manager
        .create_table(
            Table::create()
                .table(Alias::new(format!("genres{suffix}")))
                .if_not_exists()
                .col(integer(Genres::MovieId))
                .col(string(Genres::GenreName))
                .col(big_integer(Genres::CreatedAt))
                .primary_key(Index::create().col(Genres::MovieId).col(Genres::GenreName))
                .to_owned(),
        )
        .await?;

    Ok(())
}

#[derive(DeriveIden)]
enum Movies {
    Id,
    Title,
    OriginalTitle,
    Overview,
    ReleaseDate,
    Runtime,
    Status,
    Tagline,
    VoteAverage,
    VoteCount,
    Popularity,
    PosterPath,
    BackdropPath,
    Budget,
    Revenue,
    ImdbId,
    OriginalLanguage,
    OriginCountry,
    EnglishName,
    SpokenLanguageCodes,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum People {
    Id,
    Name,
    ProfilePath,
    Gender,
    KnownForDepartment,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Credits {
    Id,
    MovieId,
    PersonId,
    CreditType,
    CharacterName,
    CreditOrder,
    Department,
    Job,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Genres {
    MovieId,
    GenreName,
    CreatedAt,
}
