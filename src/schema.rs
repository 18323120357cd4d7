use sea_orm::{DeriveIden, sea_query::Alias};

/// Selects between the live tables and their `_pending` twins. The two sets
/// share column layouts, so every gateway query is written once against the
/// column idens below and pointed at a set at runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TableSet {
    Production,
    Pending,
}

impl TableSet {
    fn suffix(self) -> &'static str {
        match self {
            TableSet::Production => "",
            TableSet::Pending => "_pending",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TableSet::Production => "production",
            TableSet::Pending => "pending",
        }
    }

    pub fn movies(self) -> Alias {
        Alias::new(format!("movies{}", self.suffix()))
    }

    pub fn people(self) -> Alias {
        Alias::new(format!("people{}", self.suffix()))
    }

    pub fn credits(self) -> Alias {
        Alias::new(format!("credits{}", self.suffix()))
    }

    pub fn genres(self) -> Alias {
        Alias::new(format!("genres{}", self.suffix()))
    }
}

#[derive(DeriveIden)]
pub enum Movies {
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
pub enum People {
    Id,
    Name,
    ProfilePath,
    Gender,
    KnownForDepartment,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum Credits {
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
pub enum Genres {
    MovieId,
    GenreName,
    CreatedAt,
}

#[cfg(test)]
mod tests {
    use sea_orm::sea_query::Iden;

    use super::*;

    #[test]
    fn table_names_carry_the_set_suffix() {
        assert_eq!(TableSet::Production.movies().to_string(), "movies");
        assert_eq!(TableSet::Pending.movies().to_string(), "movies_pending");
        assert_eq!(TableSet::Pending.genres().to_string(), "genres_pending");
        assert_eq!(TableSet::Production.credits().to_string(), "credits");
    }
}
