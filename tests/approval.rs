mod common;

use std::collections::VecDeque;

use backlot::{
    approval::{approve_all, review_session, Decision, DecisionSource, ReviewFilter},
    error::AppResult,
    models::{ExitReason, MovieRecord},
    schema::TableSet,
};

use crate::common::{memory_store, movie};

/// Replays a fixed decision script, quitting once it runs dry.
struct Scripted(VecDeque<Decision>);

impl Scripted {
    fn new(decisions: &[Decision]) -> Self {
        Self(decisions.iter().copied().collect())
    }
}

impl DecisionSource for Scripted {
    fn next(&mut self, _movie: &MovieRecord, _position: usize, _total: usize) -> AppResult<Decision> {
        Ok(self.0.pop_front().unwrap_or(Decision::Quit))
    }
}

#[tokio::test]
async fn review_walks_pending_oldest_first() {
    let store = memory_store().await;
    store.insert_movie(TableSet::Pending, &movie(3, "Newest", "2024-05-01")).await.unwrap();
    store.insert_movie(TableSet::Pending, &movie(1, "Oldest", "1980-01-01")).await.unwrap();
    store.insert_movie(TableSet::Pending, &movie(2, "Middle", "2002-06-15")).await.unwrap();

    let mut script = Scripted::new(&[Decision::Approve, Decision::Reject, Decision::Skip]);
    let stats =
        review_session(&store, &mut script, &ReviewFilter::default()).await.unwrap();

    assert_eq!(stats.reviewed, 3);
    assert_eq!(stats.approved, 1);
    assert_eq!(stats.rejected, 1);
    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.remaining_pending, 1);
    assert_eq!(stats.exit_reason, ExitReason::Completed);

    // Oldest release got the approval, the middle one was rejected.
    assert!(store.movie_exists(TableSet::Production, 1).await.unwrap());
    assert!(!store.movie_exists(TableSet::Pending, 1).await.unwrap());
    assert!(!store.movie_exists(TableSet::Pending, 2).await.unwrap());
    assert!(!store.movie_exists(TableSet::Production, 2).await.unwrap());
    assert!(store.movie_exists(TableSet::Pending, 3).await.unwrap());
}

#[tokio::test]
async fn quit_leaves_the_rest_untouched() {
    let store = memory_store().await;
    store.insert_movie(TableSet::Pending, &movie(1, "First", "1990-01-01")).await.unwrap();
    store.insert_movie(TableSet::Pending, &movie(2, "Second", "1991-01-01")).await.unwrap();
    store.insert_movie(TableSet::Pending, &movie(3, "Third", "1992-01-01")).await.unwrap();

    let mut script = Scripted::new(&[Decision::Approve, Decision::Quit]);
    let stats =
        review_session(&store, &mut script, &ReviewFilter::default()).await.unwrap();

    assert_eq!(stats.reviewed, 1);
    assert_eq!(stats.approved, 1);
    assert_eq!(stats.exit_reason, ExitReason::Quit);
    assert_eq!(stats.remaining_pending, 2);
}

#[tokio::test]
async fn limit_caps_the_session() {
    let store = memory_store().await;
    store.insert_movie(TableSet::Pending, &movie(1, "First", "1990-01-01")).await.unwrap();
    store.insert_movie(TableSet::Pending, &movie(2, "Second", "1991-01-01")).await.unwrap();

    let filter = ReviewFilter { limit: Some(1), ..ReviewFilter::default() };
    let mut script = Scripted::new(&[Decision::Approve, Decision::Approve]);
    let stats = review_session(&store, &mut script, &filter).await.unwrap();

    assert_eq!(stats.reviewed, 1);
    assert_eq!(stats.exit_reason, ExitReason::LimitReached);
    assert_eq!(stats.remaining_pending, 1);
}

#[tokio::test]
async fn movie_id_filter_reviews_a_single_title() {
    let store = memory_store().await;
    store.insert_movie(TableSet::Pending, &movie(1, "First", "1990-01-01")).await.unwrap();
    store.insert_movie(TableSet::Pending, &movie(2, "Second", "1991-01-01")).await.unwrap();

    let filter = ReviewFilter { movie_id: Some(2), ..ReviewFilter::default() };
    let mut script = Scripted::new(&[Decision::Approve]);
    let stats = review_session(&store, &mut script, &filter).await.unwrap();

    assert_eq!(stats.reviewed, 1);
    assert_eq!(stats.approved, 1);
    assert!(store.movie_exists(TableSet::Production, 2).await.unwrap());
    assert!(store.movie_exists(TableSet::Pending, 1).await.unwrap());
}

#[tokio::test]
async fn unknown_movie_id_reviews_nothing() {
    let store = memory_store().await;
    store.insert_movie(TableSet::Pending, &movie(1, "First", "1990-01-01")).await.unwrap();

    let filter = ReviewFilter { movie_id: Some(31337), ..ReviewFilter::default() };
    let mut script = Scripted::new(&[Decision::Approve]);
    let stats = review_session(&store, &mut script, &filter).await.unwrap();

    assert_eq!(stats.reviewed, 0);
    assert_eq!(stats.remaining_pending, 1);
}

#[tokio::test]
async fn search_filter_narrows_the_queue() {
    let store = memory_store().await;
    store.insert_movie(TableSet::Pending, &movie(10, "Alien", "1979-05-25")).await.unwrap();
    store.insert_movie(TableSet::Pending, &movie(11, "Aliens", "1986-07-18")).await.unwrap();
    store.insert_movie(TableSet::Pending, &movie(12, "Heat", "1995-12-15")).await.unwrap();

    let filter =
        ReviewFilter { search: Some("Alien".to_string()), ..ReviewFilter::default() };
    let mut script = Scripted::new(&[Decision::Approve, Decision::Approve]);
    let stats = review_session(&store, &mut script, &filter).await.unwrap();

    assert_eq!(stats.reviewed, 2);
    assert_eq!(stats.approved, 2);
    assert!(store.movie_exists(TableSet::Pending, 12).await.unwrap());
    assert_eq!(stats.remaining_pending, 1);
}

#[tokio::test]
async fn approve_all_promotes_the_whole_queue() {
    let store = memory_store().await;
    store.insert_movie(TableSet::Pending, &movie(1, "First", "1990-01-01")).await.unwrap();
    store.insert_movie(TableSet::Pending, &movie(2, "Second", "1991-01-01")).await.unwrap();

    let stats = approve_all(&store).await.unwrap();

    assert_eq!(stats.reviewed, 2);
    assert_eq!(stats.approved, 2);
    assert_eq!(stats.remaining_pending, 0);
    assert!(store.movie_exists(TableSet::Production, 1).await.unwrap());
    assert!(store.movie_exists(TableSet::Production, 2).await.unwrap());
}

#[tokio::test]
async fn approve_all_leaves_conflicts_pending() {
    let store = memory_store().await;
    store.insert_movie(TableSet::Production, &movie(1, "Already Live", "1990-01-01")).await.unwrap();
    store.insert_movie(TableSet::Pending, &movie(1, "Already Live", "1990-01-01")).await.unwrap();
    store.insert_movie(TableSet::Pending, &movie(2, "Fresh", "1991-01-01")).await.unwrap();

    let stats = approve_all(&store).await.unwrap();

    assert_eq!(stats.approved, 1);
    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.remaining_pending, 1);
    assert!(store.movie_exists(TableSet::Pending, 1).await.unwrap());
    assert!(store.movie_exists(TableSet::Production, 2).await.unwrap());
}
