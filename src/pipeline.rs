use std::{collections::HashSet, fmt};

use futures::{StreamExt, stream};
use jiff::{Span, civil::Date};
use tracing::{debug, info, warn};

use crate::{
    error::{AppError, AppResult},
    exports::{self, ExportEntry},
    models::{IngestStats, MovieRecord, SearchHit, VerifyReport},
    planner::{self, KnownRecords, PlanMode},
    schema::TableSet,
    store::Store,
    tmdb::{Catalog, IdPage},
};

// The changes feed refuses windows past two weeks.
const CHANGES_WINDOW_DAYS: i64 = 14;
const EXPORT_CHUNK: usize = 100;

/// Immutable per-run settings, built once by the CLI layer.
#[derive(Clone, Copy, Debug)]
pub struct RunConfig {
    pub test_limit: Option<u64>,
    pub force: bool,
    pub days_back: i64,
    pub min_popularity: f64,
    pub start_year: Option<i16>,
    pub end_year: Option<i16>,
    pub max_concurrent: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            test_limit: None,
            force: false,
            days_back: CHANGES_WINDOW_DAYS,
            min_popularity: 1.0,
            start_year: None,
            end_year: None,
            max_concurrent: 8,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RunPhase {
    PendingStart,
    Fetching,
    Normalizing,
    Planning,
    Writing,
    Completed,
    PartialFailure,
}

/// Last fully processed page, reported so an aborted run tells the operator
/// where it stopped. Resume itself is existence-based, not checkpoint-based.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Checkpoint {
    pub year: Option<i16>,
    pub page: u32,
}

impl fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.year {
            Some(year) => write!(f, "year {year}, page {}", self.page),
            None => write!(f, "page {}", self.page),
        }
    }
}

#[derive(Debug)]
pub struct RunReport {
    pub phase: RunPhase,
    pub stats: IngestStats,
    pub checkpoint: Checkpoint,
    pub failure: Option<String>,
}

impl RunReport {
    fn start() -> Self {
        Self {
            phase: RunPhase::PendingStart,
            stats: IngestStats::default(),
            checkpoint: Checkpoint::default(),
            failure: None,
        }
    }

    fn advance(&mut self, phase: RunPhase) {
        if self.phase != phase {
            debug!(from = ?self.phase, to = ?phase, "run phase");
            self.phase = phase;
        }
    }

    fn finish(&mut self) {
        if self.phase != RunPhase::PartialFailure {
            self.phase = RunPhase::Completed;
        }
    }

    fn fail(&mut self, err: &AppError) {
        warn!(error = %err, checkpoint = %self.checkpoint, "run aborted");
        self.failure = Some(err.to_string());
        self.phase = RunPhase::PartialFailure;
    }
}

/// Outcome of staging one movie by explicit id.
#[derive(Debug, Eq, PartialEq)]
pub enum AddOutcome {
    Staged(String),
    AlreadyProduction,
    AlreadyPending,
    NotFound,
    AdultContent,
}

#[derive(Clone, Copy, Debug)]
enum Feed {
    Year(i16),
    Since(Date),
    Range(Date, Date),
    Changes(Date, Date),
}

impl Feed {
    fn year(self) -> Option<i16> {
        match self {
            Feed::Year(year) => Some(year),
            Feed::Range(start, _) => Some(start.year()),
            _ => None,
        }
    }
}

/// Drives catalog pages through plan, fetch, and write for every ingestion
/// mode. Holds no mutable state of its own; progress lives in the store and
/// in the report handed back to the caller.
pub struct Pipeline<'a, C: Catalog> {
    catalog: &'a C,
    store: &'a Store,
    run: RunConfig,
}

impl<'a, C: Catalog> Pipeline<'a, C> {
    pub fn new(catalog: &'a C, store: &'a Store, run: RunConfig) -> Self {
        Self { catalog, store, run }
    }

    /// Bulk load into production, newest year first. Refuses a non-empty
    /// production set unless forced.
    pub async fn initial_load(&self) -> AppResult<RunReport> {
        let movies = self.store.table_counts(TableSet::Production).await?.movies;
        if movies > 0 && !self.run.force {
            return Err(AppError::Guardrail(format!(
                "production already contains {movies} movies, pass --force to load anyway"
            )));
        }
        let pending = self.store.table_counts(TableSet::Pending).await?.movies;
        if pending > 0 {
            warn!(
                pending = pending,
                "pending movies exist, initial load writes straight to production"
            );
        }

        let today: Date = jiff::Zoned::now().into();
        let start = self.run.start_year.unwrap_or_else(|| today.year());
        let end = match self.run.end_year {
            Some(year) => year,
            None => self.catalog.earliest_year().await?,
        };
        info!(start = start, end = end, "initial load");

        let mut report = RunReport::start();
        let mut known = self.load_known().await?;
        match self.run_years(start, end, &mut known, &mut report).await {
            Ok(_) => report.finish(),
            Err(err) => report.fail(&err),
        }
        Ok(report)
    }

    async fn run_years(
        &self,
        start: i16,
        end: i16,
        known: &mut KnownRecords,
        report: &mut RunReport,
    ) -> AppResult<bool> {
        for year in (end..=start).rev() {
            info!(year = year, "loading year");
            let feed = Feed::Year(year);
            if !self.walk_feed(feed, TableSet::Production, PlanMode::Add, known, report).await? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Stages releases newer than the latest date the store has heard of.
    /// The pending set is the preferred watermark source so un-reviewed
    /// movies do not get re-discovered.
    pub async fn add_new(&self) -> AppResult<RunReport> {
        let watermark = match self.store.latest_release_date(TableSet::Pending).await? {
            Some(date) => date,
            None => match self.store.latest_release_date(TableSet::Production).await? {
                Some(date) => date,
                None => {
                    return Err(AppError::Guardrail(
                        "no movies in store yet, run initial first".to_string(),
                    ));
                },
            },
        };
        let since = watermark.checked_add(Span::new().days(1))?;
        info!(since = %since, "staging new releases");

        let mut report = RunReport::start();
        let mut known = self.load_known().await?;
        let feed = Feed::Since(since);
        match self.walk_feed(feed, TableSet::Pending, PlanMode::Add, &mut known, &mut report).await
        {
            Ok(_) => report.finish(),
            Err(err) => report.fail(&err),
        }
        Ok(report)
    }

    /// Refreshes production rows the source reports changed inside the
    /// trailing window. Ids we do not hold are ignored, staged ids stay
    /// shielded until review.
    pub async fn update(&self) -> AppResult<RunReport> {
        let mut days = self.run.days_back.max(1);
        if days > CHANGES_WINDOW_DAYS {
            warn!(days_back = days, "changes feed only covers {CHANGES_WINDOW_DAYS} days, clamping");
            days = CHANGES_WINDOW_DAYS;
        }
        let today: Date = jiff::Zoned::now().into();
        let start = today.checked_sub(Span::new().days(days))?;
        info!(start = %start, end = %today, "updating changed movies");

        let mut report = RunReport::start();
        let mut known = self.load_known().await?;
        let feed = Feed::Changes(start, today);
        match self
            .walk_feed(feed, TableSet::Production, PlanMode::Update, &mut known, &mut report)
            .await
        {
            Ok(_) => report.finish(),
            Err(err) => report.fail(&err),
        }
        Ok(report)
    }

    /// Free-text or numeric-id lookup, each hit flagged with where it
    /// already lives locally.
    pub async fn search(&self, query: &str) -> AppResult<Vec<SearchHit>> {
        let mut hits = if let Ok(id) = query.trim().parse::<i32>() {
            match self.catalog.movie_with_credits(id).await? {
                Some(record) => vec![SearchHit {
                    id: record.id,
                    title: record.title,
                    year: record.release_date.map(|d| d.year()),
                    in_production: false,
                    in_pending: false,
                }],
                None => Vec::new(),
            }
        } else {
            self.catalog.search(query).await?
        };
        for hit in &mut hits {
            hit.in_production = self.store.movie_exists(TableSet::Production, hit.id).await?;
            hit.in_pending = self.store.movie_exists(TableSet::Pending, hit.id).await?;
        }
        Ok(hits)
    }

    pub async fn add_by_id(&self, id: i32) -> AppResult<AddOutcome> {
        if self.store.movie_exists(TableSet::Production, id).await? {
            return Ok(AddOutcome::AlreadyProduction);
        }
        if self.store.movie_exists(TableSet::Pending, id).await? {
            return Ok(AddOutcome::AlreadyPending);
        }
        let Some(record) = self.catalog.movie_with_credits(id).await? else {
            return Ok(AddOutcome::NotFound);
        };
        if record.adult {
            return Ok(AddOutcome::AdultContent);
        }
        match self.store.insert_movie(TableSet::Pending, &record).await {
            Ok(()) => Ok(AddOutcome::Staged(record.title)),
            // Lost a race with another invocation, same answer either way.
            Err(AppError::StorageConflict(_)) => Ok(AddOutcome::AlreadyPending),
            Err(err) => Err(err),
        }
    }

    /// Stages export ids missing locally, most popular first, so review
    /// effort lands on titles people actually look up.
    pub async fn backfill(&self) -> AppResult<RunReport> {
        let (day, entries) = self.latest_export().await?;
        info!(export = %day, entries = entries.len(), "export downloaded");

        let mut report = RunReport::start();
        let mut known = self.load_known().await?;

        let candidates = exports::by_popularity(entries, self.run.min_popularity);
        let missing: Vec<i32> =
            candidates.iter().map(|e| e.id).filter(|&id| !known.holds(id)).collect();
        info!(
            above_threshold = candidates.len(),
            missing = missing.len(),
            min_popularity = self.run.min_popularity,
            "backfill candidates"
        );

        match self.ingest_chunks(&missing, &mut known, &mut report).await {
            Ok(_) => report.finish(),
            Err(err) => report.fail(&err),
        }
        Ok(report)
    }

    async fn ingest_chunks(
        &self,
        ids: &[i32],
        known: &mut KnownRecords,
        report: &mut RunReport,
    ) -> AppResult<bool> {
        for (index, chunk) in ids.chunks(EXPORT_CHUNK).enumerate() {
            if !self.ingest_page(chunk, TableSet::Pending, PlanMode::Add, known, report).await? {
                return Ok(false);
            }
            report.checkpoint = Checkpoint { year: None, page: index as u32 + 1 };
        }
        Ok(true)
    }

    /// Compares the daily export against both sets.
    pub async fn verify(&self, by_popularity: bool) -> AppResult<VerifyReport> {
        let (day, entries) = self.latest_export().await?;
        let production = self.store.movie_ids(TableSet::Production).await?;
        let pending = self.store.movie_ids(TableSet::Pending).await?;

        let export_ids: HashSet<i32> = entries.iter().map(|e| e.id).collect();
        let mut missing: Vec<i32> = export_ids
            .iter()
            .copied()
            .filter(|id| !production.contains(id) && !pending.contains(id))
            .collect();
        missing.sort_unstable();
        let mut extra_local: Vec<i32> = production
            .iter()
            .chain(pending.iter())
            .copied()
            .filter(|id| !export_ids.contains(id))
            .collect();
        extra_local.sort_unstable();

        let tiers = by_popularity.then(|| {
            let missing_set: HashSet<i32> = missing.iter().copied().collect();
            exports::tier_gaps(&entries, &missing_set)
        });

        Ok(VerifyReport {
            export_date: day,
            export_count: export_ids.len(),
            production_count: production.len(),
            pending_count: pending.len(),
            missing,
            extra_local,
            tiers,
        })
    }

    /// Re-walks one year in month windows, which keeps every discover query
    /// under the source's result cap, staging whatever the original pass
    /// missed.
    pub async fn reingest_year(&self, year: i16) -> AppResult<RunReport> {
        info!(year = year, "re-walking year in month windows");
        let mut report = RunReport::start();
        let mut known = self.load_known().await?;
        match self.run_months(year, &mut known, &mut report).await {
            Ok(_) => report.finish(),
            Err(err) => report.fail(&err),
        }
        Ok(report)
    }

    async fn run_months(
        &self,
        year: i16,
        known: &mut KnownRecords,
        report: &mut RunReport,
    ) -> AppResult<bool> {
        for month in 1..=12i8 {
            let start = jiff::civil::date(year, month, 1);
            let end = start.last_of_month();
            debug!(start = %start, end = %end, "month window");
            let feed = Feed::Range(start, end);
            if !self.walk_feed(feed, TableSet::Pending, PlanMode::Add, known, report).await? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    async fn load_known(&self) -> AppResult<KnownRecords> {
        Ok(KnownRecords {
            production: self.store.movie_ids(TableSet::Production).await?,
            pending: self.store.movie_ids(TableSet::Pending).await?,
            production_synced: self.store.production_sync_markers().await?,
        })
    }

    async fn fetch_feed_page(&self, feed: Feed, page: u32) -> AppResult<IdPage> {
        match feed {
            Feed::Year(year) => self.catalog.discover_year_page(year, page).await,
            Feed::Since(since) => self.catalog.discover_since_page(since, page).await,
            Feed::Range(start, end) => self.catalog.discover_range_page(start, end, page).await,
            Feed::Changes(start, end) => self.catalog.changed_since_page(start, end, page).await,
        }
    }

    /// Pages through one feed until it ends. Returns false when the test
    /// limit cut the walk short.
    async fn walk_feed(
        &self,
        feed: Feed,
        target: TableSet,
        mode: PlanMode,
        known: &mut KnownRecords,
        report: &mut RunReport,
    ) -> AppResult<bool> {
        let mut page = 1u32;
        loop {
            report.advance(RunPhase::Fetching);
            let id_page = self.fetch_feed_page(feed, page).await?;
            debug!(page = page, total = id_page.total_pages, ids = id_page.ids.len(), "page");
            let keep_going = self.ingest_page(&id_page.ids, target, mode, known, report).await?;
            report.checkpoint = Checkpoint { year: feed.year(), page };
            if !keep_going {
                return Ok(false);
            }
            if page >= id_page.total_pages {
                return Ok(true);
            }
            page += 1;
        }
    }

    /// One page end to end: plan, fetch details concurrently, write
    /// sequentially. Returns false when the test limit was reached.
    async fn ingest_page(
        &self,
        ids: &[i32],
        target: TableSet,
        mode: PlanMode,
        known: &mut KnownRecords,
        report: &mut RunReport,
    ) -> AppResult<bool> {
        report.advance(RunPhase::Planning);
        let plan = planner::plan_page(ids, mode, known);
        report.stats.skipped_pending += plan.skipped_pending;
        report.stats.skipped_production += plan.skipped_production;
        if plan.fetch.is_empty() {
            return Ok(true);
        }

        report.advance(RunPhase::Fetching);
        let catalog = self.catalog;
        let fetched: Vec<(i32, AppResult<Option<MovieRecord>>)> =
            stream::iter(plan.fetch.iter().copied())
                .map(|id| async move { (id, catalog.movie_with_credits(id).await) })
                .buffer_unordered(self.run.max_concurrent.max(1))
                .collect()
                .await;

        report.advance(RunPhase::Normalizing);
        let mut records: Vec<(i32, Option<MovieRecord>)> = Vec::with_capacity(fetched.len());
        for (id, result) in fetched {
            match result {
                Ok(record) => records.push((id, record)),
                Err(AppError::SchemaMismatch(msg)) => {
                    warn!(movie_id = id, error = %msg, "undecodable record skipped");
                    report.stats.errors += 1;
                },
                Err(err) => return Err(err),
            }
        }
        // Fetches land in completion order; write in id order so an
        // interrupted page cuts off at a predictable point.
        records.sort_by_key(|(id, _)| *id);

        report.advance(RunPhase::Writing);
        for (id, record) in records {
            report.stats.processed += 1;
            let Some(record) = record else {
                if planner::classify_missing(id, known).is_some() {
                    info!(movie_id = id, "held movie vanished upstream, leaving local row");
                    report.stats.vanished += 1;
                }
                continue;
            };
            if record.adult {
                report.stats.skipped_adult += 1;
                continue;
            }
            match mode {
                PlanMode::Add => {
                    if record.release_date.is_none() {
                        report.stats.skipped_no_date += 1;
                        continue;
                    }
                    match self.store.insert_movie(target, &record).await {
                        Ok(()) => {
                            report.stats.inserted += 1;
                            note_insert(target, record.id, known);
                        },
                        Err(AppError::StorageConflict(msg)) => {
                            warn!(
                                movie_id = record.id,
                                set = target.label(),
                                error = %msg,
                                "row already present"
                            );
                            report.stats.conflicts += 1;
                            note_insert(target, record.id, known);
                        },
                        Err(err) => return Err(err),
                    }
                },
                PlanMode::Update => match self.store.update_movie_in_place(&record).await {
                    Ok(true) => report.stats.updated += 1,
                    Ok(false) => {},
                    Err(AppError::StorageConflict(msg)) => {
                        warn!(movie_id = record.id, error = %msg, "update conflict");
                        report.stats.conflicts += 1;
                    },
                    Err(err) => return Err(err),
                },
            }
            if self.limit_reached(report) {
                info!(limit = ?self.run.test_limit, "test limit reached, stopping");
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn limit_reached(&self, report: &RunReport) -> bool {
        self.run
            .test_limit
            .is_some_and(|limit| report.stats.inserted + report.stats.updated >= limit)
    }

    /// Yesterday's export, falling back one more day while the new file is
    /// still publishing.
    async fn latest_export(&self) -> AppResult<(Date, Vec<ExportEntry>)> {
        let today: Date = jiff::Zoned::now().into();
        for days_ago in 1..=2 {
            let day = today.checked_sub(Span::new().days(days_ago))?;
            if let Some(entries) = self.catalog.export_entries(day).await? {
                return Ok((day, entries));
            }
        }
        Err(AppError::TransientNetwork("no recent id export is available".to_string()))
    }
}

fn note_insert(target: TableSet, id: i32, known: &mut KnownRecords) {
    match target {
        TableSet::Production => {
            known.production.insert(id);
        },
        TableSet::Pending => {
            known.pending.insert(id);
        },
    }
}
