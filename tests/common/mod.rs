use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database};

use backlot::{
    models::{CreditKind, CreditRecord, MovieRecord, PersonRecord},
    store::Store,
};

/// Fresh in-memory store with the full schema. The pool is pinned to one
/// connection because every sqlite memory connection is its own database.
pub async fn memory_store() -> Store {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1);
    let db = Database::connect(options).await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    Store::new(db)
}

pub fn person(id: i32, name: &str) -> PersonRecord {
    PersonRecord {
        id,
        name: name.to_string(),
        profile_path: None,
        gender: Some(2),
        known_for_department: Some("Acting".to_string()),
    }
}

pub fn cast_credit(person_id: i32, character: &str, order: i32) -> CreditRecord {
    CreditRecord {
        person_id,
        kind: CreditKind::Cast,
        character_name: Some(character.to_string()),
        credit_order: Some(order),
        department: None,
        job: None,
    }
}

pub fn director_credit(person_id: i32) -> CreditRecord {
    CreditRecord {
        person_id,
        kind: CreditKind::Crew,
        character_name: None,
        credit_order: None,
        department: Some("Directing".to_string()),
        job: Some("Director".to_string()),
    }
}

/// Complete movie with two credited people. Person ids derive from the
/// movie id so fixtures do not collide unless a test shares them on
/// purpose.
pub fn movie(id: i32, title: &str, release_date: &str) -> MovieRecord {
    MovieRecord {
        id,
        title: title.to_string(),
        original_title: None,
        overview: Some(format!("{title} overview")),
        release_date: release_date.parse().ok(),
        runtime: Some(120),
        status: Some("Released".to_string()),
        tagline: None,
        vote_average: Some(7.0),
        vote_count: Some(100),
        popularity: Some(10.0),
        poster_path: None,
        backdrop_path: None,
        budget: None,
        revenue: None,
        imdb_id: None,
        original_language: Some("en".to_string()),
        origin_country: Some("[\"US\"]".to_string()),
        english_name: Some("English".to_string()),
        spoken_language_codes: Some("en".to_string()),
        adult: false,
        people: vec![person(id * 10 + 1, "Lead Actor"), person(id * 10 + 2, "The Director")],
        credits: vec![cast_credit(id * 10 + 1, "Lead", 0), director_credit(id * 10 + 2)],
        genres: vec!["Drama".to_string()],
    }
}
