use std::io::{self, Write};

use tracing::{info, warn};

use crate::{
    error::{AppError, AppResult},
    models::{ExitReason, MovieRecord, ReviewStats},
    schema::TableSet,
    store::Store,
};

const SEARCH_LIMIT: u64 = 20;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Decision {
    Approve,
    Reject,
    Skip,
    Quit,
}

/// Where review decisions come from. The console implementation asks a
/// human, tests script the sequence.
pub trait DecisionSource {
    fn next(&mut self, movie: &MovieRecord, position: usize, total: usize) -> AppResult<Decision>;
}

/// Interactive review: prints the movie banner and reads one command per
/// record, re-prompting until it gets one it knows.
#[derive(Default)]
pub struct ConsoleDecisions;

impl DecisionSource for ConsoleDecisions {
    fn next(&mut self, movie: &MovieRecord, position: usize, total: usize) -> AppResult<Decision> {
        println!("\n[{position}/{total}]");
        println!("{}", movie.summary());
        loop {
            print!("approve / reject / skip / quit [s]: ");
            io::stdout().flush()?;
            let mut line = String::new();
            io::stdin().read_line(&mut line)?;
            match line.trim().to_lowercase().as_str() {
                "a" | "approve" => return Ok(Decision::Approve),
                "r" | "reject" | "d" | "delete" => return Ok(Decision::Reject),
                "" | "s" | "skip" => return Ok(Decision::Skip),
                "q" | "quit" => return Ok(Decision::Quit),
                other => println!("did not catch {other:?}"),
            }
        }
    }
}

/// Narrows which pending records a session walks.
#[derive(Clone, Debug, Default)]
pub struct ReviewFilter {
    pub limit: Option<u64>,
    pub search: Option<String>,
    pub movie_id: Option<i32>,
}

/// Walks pending records oldest-first and applies one decision per record.
/// Every decision commits before the next prompt, so quitting or being
/// interrupted loses nothing.
pub async fn review_session(
    store: &Store,
    source: &mut dyn DecisionSource,
    filter: &ReviewFilter,
) -> AppResult<ReviewStats> {
    let queue: Vec<i32> = if let Some(id) = filter.movie_id {
        if store.movie_exists(TableSet::Pending, id).await? {
            vec![id]
        } else {
            warn!(movie_id = id, "nothing pending under that id");
            Vec::new()
        }
    } else if let Some(query) = &filter.search {
        store.search_pending(query, SEARCH_LIMIT).await?.into_iter().map(|p| p.id).collect()
    } else {
        store.pending_ids_ordered().await?
    };

    let total = queue.len();
    let mut stats = ReviewStats::default();
    for (index, id) in queue.into_iter().enumerate() {
        if filter.limit.is_some_and(|limit| stats.reviewed >= limit) {
            stats.exit_reason = ExitReason::LimitReached;
            break;
        }
        // Another session may have resolved this id after the queue was
        // built.
        let Some(movie) = store.get_movie(TableSet::Pending, id).await? else {
            continue;
        };
        match source.next(&movie, index + 1, total)? {
            Decision::Approve => {
                stats.reviewed += 1;
                match store.promote(id).await {
                    Ok(true) => {
                        info!(movie_id = id, title = %movie.title, "approved");
                        stats.approved += 1;
                    },
                    Ok(false) => {
                        warn!(movie_id = id, "gone from pending, nothing promoted");
                    },
                    Err(AppError::StorageConflict(msg)) => {
                        warn!(movie_id = id, error = %msg, "already in production, left pending");
                    },
                    Err(err) => return Err(err),
                }
            },
            Decision::Reject => {
                stats.reviewed += 1;
                if store.delete_pending(id).await? {
                    info!(movie_id = id, title = %movie.title, "rejected");
                    stats.rejected += 1;
                }
            },
            Decision::Skip => {
                stats.reviewed += 1;
                stats.skipped += 1;
            },
            Decision::Quit => {
                stats.exit_reason = ExitReason::Quit;
                break;
            },
        }
    }

    stats.remaining_pending = store.table_counts(TableSet::Pending).await?.movies.max(0) as u64;
    Ok(stats)
}

/// Promotes every pending record without prompting. The caller collects the
/// typed confirmation before this runs.
pub async fn approve_all(store: &Store) -> AppResult<ReviewStats> {
    let queue = store.pending_ids_ordered().await?;
    let mut stats = ReviewStats::default();
    for id in queue {
        stats.reviewed += 1;
        match store.promote(id).await {
            Ok(true) => stats.approved += 1,
            Ok(false) => {},
            Err(AppError::StorageConflict(msg)) => {
                warn!(movie_id = id, error = %msg, "already in production, left pending");
                stats.skipped += 1;
            },
            Err(err) => return Err(err),
        }
    }
    stats.remaining_pending = store.table_counts(TableSet::Pending).await?.movies.max(0) as u64;
    Ok(stats)
}
