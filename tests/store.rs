mod common;

use backlot::{error::AppError, schema::TableSet};
use sea_orm::{ConnectionTrait, Statement};

use crate::common::{cast_credit, director_credit, memory_store, movie, person};

#[tokio::test]
async fn roundtrip_preserves_content() {
    let store = memory_store().await;
    let mut staged = movie(550, "Fight Club", "1999-10-15");
    staged.genres = vec!["Thriller".to_string(), "Drama".to_string()];
    store.insert_movie(TableSet::Production, &staged).await.unwrap();

    let loaded = store.get_movie(TableSet::Production, 550).await.unwrap().unwrap();
    assert!(loaded.same_content(&staged));
    assert_eq!(loaded.title, "Fight Club");
    assert_eq!(loaded.director_names(), vec!["The Director"]);
    assert_eq!(loaded.genres, vec!["Drama", "Thriller"]);

    let counts = store.table_counts(TableSet::Production).await.unwrap();
    assert_eq!(counts.movies, 1);
    assert_eq!(counts.people, 2);
    assert_eq!(counts.credits, 2);
    assert_eq!(counts.genres, 2);
}

#[tokio::test]
async fn duplicate_insert_surfaces_conflict() {
    let store = memory_store().await;
    let staged = movie(550, "Fight Club", "1999-10-15");
    store.insert_movie(TableSet::Pending, &staged).await.unwrap();

    let err = store.insert_movie(TableSet::Pending, &staged).await.unwrap_err();
    assert!(matches!(err, AppError::StorageConflict(_)), "got {err:?}");
    assert_eq!(store.table_counts(TableSet::Pending).await.unwrap().movies, 1);
}

#[tokio::test]
async fn stage_then_approve_moves_the_movie() {
    let store = memory_store().await;
    let staged = movie(27205, "Inception", "2010-07-15");
    store.insert_movie(TableSet::Pending, &staged).await.unwrap();
    assert_eq!(store.table_counts(TableSet::Production).await.unwrap().movies, 0);

    assert!(store.promote(27205).await.unwrap());

    let promoted = store.get_movie(TableSet::Production, 27205).await.unwrap().unwrap();
    assert!(promoted.same_content(&staged));

    let pending = store.table_counts(TableSet::Pending).await.unwrap();
    assert_eq!(pending.movies, 0);
    assert_eq!(pending.people, 0);
    assert_eq!(pending.credits, 0);
    assert_eq!(pending.genres, 0);

    let production_ids = store.movie_ids(TableSet::Production).await.unwrap();
    let pending_ids = store.movie_ids(TableSet::Pending).await.unwrap();
    assert!(production_ids.is_disjoint(&pending_ids));
}

#[tokio::test]
async fn promote_returns_false_for_unknown_id() {
    let store = memory_store().await;
    assert!(!store.promote(424242).await.unwrap());
}

#[tokio::test]
async fn promotion_conflict_rolls_everything_back() {
    let store = memory_store().await;
    let mut staged = movie(31337, "The Matrix", "1999-03-31");
    staged.people = vec![person(9, "Keanu Reeves")];
    staged.credits = vec![cast_credit(9, "Neo", 0)];
    store.insert_movie(TableSet::Pending, &staged).await.unwrap();

    // A production credit with the same identity makes the copy step
    // collide after the movie row has already been copied.
    let db = store.connection();
    db.execute(Statement::from_string(
        db.get_database_backend(),
        "INSERT INTO credits (movie_id, person_id, credit_type, character_name, credit_order, \
         department, job, created_at) VALUES (31337, 9, 'cast', 'Neo', 0, NULL, '', 0)"
            .to_string(),
    ))
    .await
    .unwrap();

    let err = store.promote(31337).await.unwrap_err();
    assert!(matches!(err, AppError::StorageConflict(_)), "got {err:?}");

    assert!(store.get_movie(TableSet::Production, 31337).await.unwrap().is_none());
    let pending = store.get_movie(TableSet::Pending, 31337).await.unwrap().unwrap();
    assert!(pending.same_content(&staged));
    assert_eq!(store.table_counts(TableSet::Production).await.unwrap().credits, 1);
}

#[tokio::test]
async fn reject_deletes_the_staged_movie() {
    let store = memory_store().await;
    store.insert_movie(TableSet::Pending, &movie(99999, "Mistake", "2024-01-01")).await.unwrap();

    assert!(store.delete_pending(99999).await.unwrap());

    for set in [TableSet::Production, TableSet::Pending] {
        let counts = store.table_counts(set).await.unwrap();
        assert_eq!(counts.movies, 0, "{} movies", set.label());
        assert_eq!(counts.people, 0, "{} people", set.label());
        assert_eq!(counts.credits, 0, "{} credits", set.label());
    }
    assert!(!store.delete_pending(99999).await.unwrap());
}

#[tokio::test]
async fn update_in_place_skips_identical_content() {
    let store = memory_store().await;
    let record = movie(550, "Fight Club", "1999-10-15");
    store.insert_movie(TableSet::Production, &record).await.unwrap();
    let markers_before = store.production_sync_markers().await.unwrap();

    assert!(!store.update_movie_in_place(&record).await.unwrap());

    let markers_after = store.production_sync_markers().await.unwrap();
    assert_eq!(markers_before, markers_after);
}

#[tokio::test]
async fn update_in_place_rewrites_changed_content() {
    let store = memory_store().await;
    store.insert_movie(TableSet::Production, &movie(550, "Fight Club", "1999-10-15")).await.unwrap();

    let mut fresh = movie(550, "Fight Club", "1999-10-15");
    fresh.overview = Some("Rewritten synopsis".to_string());
    fresh.genres = vec!["Drama".to_string(), "Thriller".to_string()];
    fresh.credits.push(cast_credit(5506, "Marla Singer", 1));
    fresh.people.push(person(5506, "Helena Bonham Carter"));

    assert!(store.update_movie_in_place(&fresh).await.unwrap());

    let loaded = store.get_movie(TableSet::Production, 550).await.unwrap().unwrap();
    assert!(loaded.same_content(&fresh));
    assert_eq!(loaded.overview.as_deref(), Some("Rewritten synopsis"));
    assert_eq!(loaded.credits.len(), 3);

    // Unknown ids are a no-op, not an insert.
    assert!(!store.update_movie_in_place(&movie(603, "The Matrix", "1999-03-31")).await.unwrap());
    assert!(store.get_movie(TableSet::Production, 603).await.unwrap().is_none());
}

#[tokio::test]
async fn pruning_keeps_people_still_referenced() {
    let store = memory_store().await;
    let shared = person(777, "Busy Actor");

    let mut first = movie(100, "First", "2020-01-01");
    first.people = vec![shared.clone(), person(1001, "Only In First")];
    first.credits = vec![cast_credit(777, "Hero", 0), director_credit(1001)];
    let mut second = movie(200, "Second", "2021-01-01");
    second.people = vec![shared];
    second.credits = vec![cast_credit(777, "Villain", 0)];

    store.insert_movie(TableSet::Pending, &first).await.unwrap();
    store.insert_movie(TableSet::Pending, &second).await.unwrap();

    assert!(store.promote(100).await.unwrap());

    // 777 stays staged for the second movie, 1001 was only held for the
    // promoted one.
    let pending = store.get_movie(TableSet::Pending, 200).await.unwrap().unwrap();
    assert_eq!(pending.people.len(), 1);
    assert_eq!(pending.people[0].id, 777);
    assert_eq!(store.table_counts(TableSet::Pending).await.unwrap().people, 1);

    let promoted = store.get_movie(TableSet::Production, 100).await.unwrap().unwrap();
    let mut promoted_people: Vec<i32> = promoted.people.iter().map(|p| p.id).collect();
    promoted_people.sort_unstable();
    assert_eq!(promoted_people, vec![777, 1001]);
}

#[tokio::test]
async fn clear_requires_confirmation() {
    let store = memory_store().await;
    store.insert_movie(TableSet::Pending, &movie(1, "Kept", "2020-01-01")).await.unwrap();

    let err = store.clear(true, true, false).await.unwrap_err();
    assert!(matches!(err, AppError::Guardrail(_)), "got {err:?}");
    assert_eq!(store.table_counts(TableSet::Pending).await.unwrap().movies, 1);
}

#[tokio::test]
async fn clear_scopes_to_one_set() {
    let store = memory_store().await;
    store.insert_movie(TableSet::Production, &movie(1, "Live", "2020-01-01")).await.unwrap();
    store.insert_movie(TableSet::Pending, &movie(2, "Staged", "2021-01-01")).await.unwrap();

    store.clear(false, true, true).await.unwrap();

    assert_eq!(store.table_counts(TableSet::Pending).await.unwrap().movies, 0);
    assert_eq!(store.table_counts(TableSet::Production).await.unwrap().movies, 1);
}

#[tokio::test]
async fn pending_overview_is_oldest_first() {
    let store = memory_store().await;
    store.insert_movie(TableSet::Pending, &movie(3, "Newest", "2024-06-01")).await.unwrap();
    store.insert_movie(TableSet::Pending, &movie(1, "Oldest", "1980-01-01")).await.unwrap();
    store.insert_movie(TableSet::Pending, &movie(2, "Middle", "2002-05-01")).await.unwrap();

    let (total, rows) = store.pending_overview(2).await.unwrap();
    assert_eq!(total, 3);
    let titles: Vec<&str> = rows.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["Oldest", "Middle"]);

    assert_eq!(store.pending_ids_ordered().await.unwrap(), vec![1, 2, 3]);
}

#[tokio::test]
async fn search_pending_matches_titles() {
    let store = memory_store().await;
    let mut popular = movie(10, "Alien", "1979-05-25");
    popular.popularity = Some(80.0);
    let mut sequel = movie(11, "Aliens", "1986-07-18");
    sequel.popularity = Some(60.0);
    store.insert_movie(TableSet::Pending, &popular).await.unwrap();
    store.insert_movie(TableSet::Pending, &sequel).await.unwrap();
    store.insert_movie(TableSet::Pending, &movie(12, "Heat", "1995-12-15")).await.unwrap();

    let hits = store.search_pending("Alien", 20).await.unwrap();
    let ids: Vec<i32> = hits.iter().map(|h| h.id).collect();
    assert_eq!(ids, vec![10, 11]);
    assert!(store.search_pending("Blade", 20).await.unwrap().is_empty());
}

#[tokio::test]
async fn latest_release_date_tracks_each_set() {
    let store = memory_store().await;
    assert!(store.latest_release_date(TableSet::Production).await.unwrap().is_none());

    store.insert_movie(TableSet::Production, &movie(1, "Older", "1999-10-15")).await.unwrap();
    store.insert_movie(TableSet::Production, &movie(2, "Newer", "2010-07-15")).await.unwrap();
    store.insert_movie(TableSet::Pending, &movie(3, "Staged", "2024-02-29")).await.unwrap();

    let latest = store.latest_release_date(TableSet::Production).await.unwrap().unwrap();
    assert_eq!(latest.to_string(), "2010-07-15");
    let staged = store.latest_release_date(TableSet::Pending).await.unwrap().unwrap();
    assert_eq!(staged.to_string(), "2024-02-29");
}
