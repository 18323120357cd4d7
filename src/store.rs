use std::collections::{HashMap, HashSet};

use jiff::{Timestamp, civil::Date};
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DatabaseTransaction, FromQueryResult, Statement,
    StatementBuilder, TransactionTrait,
    sea_query::{Alias, Expr, Func, IntoIden, OnConflict, Order, Query},
};

use crate::{
    error::{AppError, AppResult},
    models::{
        CreditKind, CreditRecord, MovieRecord, PendingSummary, PersonRecord, StoreStatus,
        TableCounts,
    },
    schema::{Credits, Genres, Movies, People, TableSet},
};

const MOVIE_COLS: [Movies; 22] = [
    Movies::Id,
    Movies::Title,
    Movies::OriginalTitle,
    Movies::Overview,
    Movies::ReleaseDate,
    Movies::Runtime,
    Movies::Status,
    Movies::Tagline,
    Movies::VoteAverage,
    Movies::VoteCount,
    Movies::Popularity,
    Movies::PosterPath,
    Movies::BackdropPath,
    Movies::Budget,
    Movies::Revenue,
    Movies::ImdbId,
    Movies::OriginalLanguage,
    Movies::OriginCountry,
    Movies::EnglishName,
    Movies::SpokenLanguageCodes,
    Movies::CreatedAt,
    Movies::UpdatedAt,
];

const PERSON_COLS: [People; 7] = [
    People::Id,
    People::Name,
    People::ProfilePath,
    People::Gender,
    People::KnownForDepartment,
    People::CreatedAt,
    People::UpdatedAt,
];

// Credit rows are copied without their autoincrement id.
const CREDIT_COPY_COLS: [Credits; 8] = [
    Credits::MovieId,
    Credits::PersonId,
    Credits::CreditType,
    Credits::CharacterName,
    Credits::CreditOrder,
    Credits::Department,
    Credits::Job,
    Credits::CreatedAt,
];

const GENRE_COLS: [Genres; 3] = [Genres::MovieId, Genres::GenreName, Genres::CreatedAt];

/// Gateway over the production and pending table sets. Every write that spans
/// tables runs in one transaction, so approval and rejection either land
/// whole or not at all.
pub struct Store {
    db: DatabaseConnection,
}

impl Store {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    fn stmt<S: StatementBuilder>(&self, stmt: &S) -> Statement {
        self.db.get_database_backend().build(stmt)
    }

    pub async fn movie_exists(&self, set: TableSet, id: i32) -> AppResult<bool> {
        let mut select = Query::select();
        select.column(Movies::Id).from(set.movies()).and_where(Expr::col(Movies::Id).eq(id));
        Ok(IdRow::find_by_statement(self.stmt(&select)).one(&self.db).await?.is_some())
    }

    pub async fn movie_ids(&self, set: TableSet) -> AppResult<HashSet<i32>> {
        let mut select = Query::select();
        select.column(Movies::Id).from(set.movies());
        let rows = IdRow::find_by_statement(self.stmt(&select)).all(&self.db).await?;
        Ok(rows.into_iter().map(|r| r.id).collect())
    }

    /// Production ids with the second their row last converged, used to
    /// decide whether an upstream change notice is stale.
    pub async fn production_sync_markers(&self) -> AppResult<HashMap<i32, i64>> {
        let mut select = Query::select();
        select.columns([Movies::Id, Movies::UpdatedAt]).from(TableSet::Production.movies());
        let rows = MarkerRow::find_by_statement(self.stmt(&select)).all(&self.db).await?;
        Ok(rows.into_iter().map(|r| (r.id, r.updated_at)).collect())
    }

    pub async fn table_counts(&self, set: TableSet) -> AppResult<TableCounts> {
        Ok(TableCounts {
            movies: self.count_rows(set.movies(), Movies::Id).await?,
            people: self.count_rows(set.people(), People::Id).await?,
            credits: self.count_rows(set.credits(), Credits::Id).await?,
            genres: self.count_rows(set.genres(), Genres::MovieId).await?,
        })
    }

    async fn count_rows(&self, table: Alias, column: impl IntoIden + 'static) -> AppResult<i64> {
        let mut select = Query::select();
        select.expr_as(Func::count(Expr::col(column)), Alias::new("count")).from(table);
        let row = CountRow::find_by_statement(self.stmt(&select)).one(&self.db).await?;
        Ok(row.map(|r| r.count).unwrap_or(0))
    }

    pub async fn latest_release_date(&self, set: TableSet) -> AppResult<Option<Date>> {
        let mut select = Query::select();
        select
            .expr_as(Func::max(Expr::col(Movies::ReleaseDate)), Alias::new("latest"))
            .from(set.movies());
        let row = LatestRow::find_by_statement(self.stmt(&select)).one(&self.db).await?;
        Ok(row.and_then(|r| r.latest).and_then(|s| s.parse().ok()))
    }

    pub async fn status(&self) -> AppResult<StoreStatus> {
        Ok(StoreStatus {
            production: self.table_counts(TableSet::Production).await?,
            pending: self.table_counts(TableSet::Pending).await?,
            latest_production_release: self.latest_release_date(TableSet::Production).await?,
            latest_pending_release: self.latest_release_date(TableSet::Pending).await?,
        })
    }

    /// Writes a movie with its people, credits, and genres into one set. A
    /// movie id already present surfaces as [`AppError::StorageConflict`] and
    /// nothing lands.
    pub async fn insert_movie(&self, set: TableSet, record: &MovieRecord) -> AppResult<()> {
        let now = Timestamp::now().as_second();
        let txn = self.db.begin().await?;

        let mut movie = Query::insert();
        movie.into_table(set.movies()).columns(MOVIE_COLS).values_panic([
            record.id.into(),
            record.title.clone().into(),
            record.original_title.clone().into(),
            record.overview.clone().into(),
            record.release_date.map(|d| d.to_string()).into(),
            record.runtime.into(),
            record.status.clone().into(),
            record.tagline.clone().into(),
            record.vote_average.into(),
            record.vote_count.into(),
            record.popularity.into(),
            record.poster_path.clone().into(),
            record.backdrop_path.clone().into(),
            record.budget.into(),
            record.revenue.into(),
            record.imdb_id.clone().into(),
            record.original_language.clone().into(),
            record.origin_country.clone().into(),
            record.english_name.clone().into(),
            record.spoken_language_codes.clone().into(),
            now.into(),
            now.into(),
        ]);
        txn.execute(self.stmt(&movie)).await?;

        self.upsert_people(&txn, set, &record.people, now).await?;
        self.insert_credits(&txn, set, record.id, &record.credits, now).await?;
        self.insert_genres(&txn, set, record.id, &record.genres, now).await?;

        txn.commit().await?;
        Ok(())
    }

    /// Converges an existing production movie on a re-fetched record.
    /// Returns false without touching the row when the id is absent or the
    /// content already matches, so the sync marker only moves on real change.
    pub async fn update_movie_in_place(&self, record: &MovieRecord) -> AppResult<bool> {
        let Some(current) = self.get_movie(TableSet::Production, record.id).await? else {
            return Ok(false);
        };
        if current.same_content(record) {
            return Ok(false);
        }

        let set = TableSet::Production;
        let now = Timestamp::now().as_second();
        let txn = self.db.begin().await?;

        let mut update = Query::update();
        update
            .table(set.movies())
            .value(Movies::Title, record.title.clone())
            .value(Movies::OriginalTitle, record.original_title.clone())
            .value(Movies::Overview, record.overview.clone())
            .value(Movies::ReleaseDate, record.release_date.map(|d| d.to_string()))
            .value(Movies::Runtime, record.runtime)
            .value(Movies::Status, record.status.clone())
            .value(Movies::Tagline, record.tagline.clone())
            .value(Movies::VoteAverage, record.vote_average)
            .value(Movies::VoteCount, record.vote_count)
            .value(Movies::Popularity, record.popularity)
            .value(Movies::PosterPath, record.poster_path.clone())
            .value(Movies::BackdropPath, record.backdrop_path.clone())
            .value(Movies::Budget, record.budget)
            .value(Movies::Revenue, record.revenue)
            .value(Movies::ImdbId, record.imdb_id.clone())
            .value(Movies::OriginalLanguage, record.original_language.clone())
            .value(Movies::OriginCountry, record.origin_country.clone())
            .value(Movies::EnglishName, record.english_name.clone())
            .value(Movies::SpokenLanguageCodes, record.spoken_language_codes.clone())
            .value(Movies::UpdatedAt, now)
            .and_where(Expr::col(Movies::Id).eq(record.id));
        txn.execute(self.stmt(&update)).await?;

        // Credits and genres are replaced wholesale rather than diffed.
        let mut del_credits = Query::delete();
        del_credits.from_table(set.credits()).and_where(Expr::col(Credits::MovieId).eq(record.id));
        txn.execute(self.stmt(&del_credits)).await?;

        let mut del_genres = Query::delete();
        del_genres.from_table(set.genres()).and_where(Expr::col(Genres::MovieId).eq(record.id));
        txn.execute(self.stmt(&del_genres)).await?;

        self.upsert_people(&txn, set, &record.people, now).await?;
        self.insert_credits(&txn, set, record.id, &record.credits, now).await?;
        self.insert_genres(&txn, set, record.id, &record.genres, now).await?;

        txn.commit().await?;
        Ok(true)
    }

    pub async fn get_movie(&self, set: TableSet, id: i32) -> AppResult<Option<MovieRecord>> {
        let mut select = Query::select();
        select.columns(MOVIE_COLS).from(set.movies()).and_where(Expr::col(Movies::Id).eq(id));
        let Some(row) = MovieRow::find_by_statement(self.stmt(&select)).one(&self.db).await? else {
            return Ok(None);
        };

        let mut genre_select = Query::select();
        genre_select
            .column(Genres::GenreName)
            .from(set.genres())
            .and_where(Expr::col(Genres::MovieId).eq(id))
            .order_by(Genres::GenreName, Order::Asc);
        let genre_rows =
            GenreRow::find_by_statement(self.stmt(&genre_select)).all(&self.db).await?;

        let credits_table = set.credits();
        let people_table = set.people();
        let mut credit_select = Query::select();
        credit_select
            .columns([
                (credits_table.clone(), Credits::PersonId),
                (credits_table.clone(), Credits::CreditType),
                (credits_table.clone(), Credits::CharacterName),
                (credits_table.clone(), Credits::CreditOrder),
                (credits_table.clone(), Credits::Department),
                (credits_table.clone(), Credits::Job),
            ])
            .columns([
                (people_table.clone(), People::Name),
                (people_table.clone(), People::ProfilePath),
                (people_table.clone(), People::Gender),
                (people_table.clone(), People::KnownForDepartment),
            ])
            .from(credits_table.clone())
            .inner_join(
                people_table.clone(),
                Expr::col((credits_table.clone(), Credits::PersonId))
                    .equals((people_table, People::Id)),
            )
            .and_where(Expr::col((credits_table.clone(), Credits::MovieId)).eq(id))
            .order_by((credits_table, Credits::Id), Order::Asc);
        let credit_rows =
            CreditJoinRow::find_by_statement(self.stmt(&credit_select)).all(&self.db).await?;

        let mut people = Vec::new();
        let mut seen = HashSet::new();
        let mut credits = Vec::new();
        for credit in credit_rows {
            // Unknown credit type codes mean a newer writer touched this
            // row, skip rather than guess.
            let Some(kind) = CreditKind::from_db_code(&credit.credit_type) else {
                continue;
            };
            if seen.insert(credit.person_id) {
                people.push(PersonRecord {
                    id: credit.person_id,
                    name: credit.name.clone(),
                    profile_path: credit.profile_path.clone(),
                    gender: credit.gender,
                    known_for_department: credit.known_for_department.clone(),
                });
            }
            credits.push(CreditRecord {
                person_id: credit.person_id,
                kind,
                character_name: none_if_empty(credit.character_name),
                credit_order: credit.credit_order,
                department: credit.department,
                job: none_if_empty(credit.job),
            });
        }

        Ok(Some(MovieRecord {
            id: row.id,
            title: row.title,
            original_title: row.original_title,
            overview: row.overview,
            release_date: row.release_date.as_deref().and_then(|s| s.parse().ok()),
            runtime: row.runtime,
            status: row.status,
            tagline: row.tagline,
            vote_average: row.vote_average,
            vote_count: row.vote_count,
            popularity: row.popularity,
            poster_path: row.poster_path,
            backdrop_path: row.backdrop_path,
            budget: row.budget,
            revenue: row.revenue,
            imdb_id: row.imdb_id,
            original_language: row.original_language,
            origin_country: row.origin_country,
            english_name: row.english_name,
            spoken_language_codes: row.spoken_language_codes,
            // Adult titles are filtered before they reach the store.
            adult: false,
            people,
            credits,
            genres: genre_rows.into_iter().map(|g| g.genre_name).collect(),
        }))
    }

    /// Pending ids in review order, oldest release first with the id as a
    /// tiebreak so the order is stable across sessions.
    pub async fn pending_ids_ordered(&self) -> AppResult<Vec<i32>> {
        let mut select = Query::select();
        select
            .column(Movies::Id)
            .from(TableSet::Pending.movies())
            .order_by(Movies::ReleaseDate, Order::Asc)
            .order_by(Movies::Id, Order::Asc);
        let rows = IdRow::find_by_statement(self.stmt(&select)).all(&self.db).await?;
        Ok(rows.into_iter().map(|r| r.id).collect())
    }

    pub async fn pending_overview(&self, limit: u64) -> AppResult<(i64, Vec<PendingSummary>)> {
        let total = self.count_rows(TableSet::Pending.movies(), Movies::Id).await?;
        let mut select = Query::select();
        select
            .columns([Movies::Id, Movies::Title, Movies::ReleaseDate, Movies::Popularity])
            .from(TableSet::Pending.movies())
            .order_by(Movies::ReleaseDate, Order::Asc)
            .order_by(Movies::Id, Order::Asc)
            .limit(limit);
        let rows = PendingRow::find_by_statement(self.stmt(&select)).all(&self.db).await?;
        Ok((total, rows.into_iter().map(PendingRow::into_summary).collect()))
    }

    pub async fn search_pending(&self, query: &str, limit: u64) -> AppResult<Vec<PendingSummary>> {
        let mut select = Query::select();
        select
            .columns([Movies::Id, Movies::Title, Movies::ReleaseDate, Movies::Popularity])
            .from(TableSet::Pending.movies())
            .and_where(Expr::col(Movies::Title).like(format!("%{query}%")))
            .order_by(Movies::Popularity, Order::Desc)
            .limit(limit);
        let rows = PendingRow::find_by_statement(self.stmt(&select)).all(&self.db).await?;
        Ok(rows.into_iter().map(PendingRow::into_summary).collect())
    }

    /// Moves one staged movie into production: copy the movie, its people,
    /// credits, and genres across, then delete the staged rows, all in one
    /// transaction. Returns false when nothing is staged under the id. A
    /// production row already holding the id rolls the whole promotion back
    /// as [`AppError::StorageConflict`].
    pub async fn promote(&self, id: i32) -> AppResult<bool> {
        let txn = self.db.begin().await?;

        let mut movie_select = Query::select();
        movie_select
            .columns(MOVIE_COLS)
            .from(TableSet::Pending.movies())
            .and_where(Expr::col(Movies::Id).eq(id));
        let mut copy_movie = Query::insert();
        copy_movie
            .into_table(TableSet::Production.movies())
            .columns(MOVIE_COLS)
            .select_from(movie_select)
            .map_err(|e| anyhow::anyhow!("movie copy shape: {e}"))?;
        let copied = txn.execute(self.stmt(&copy_movie)).await?;
        if copied.rows_affected() == 0 {
            txn.rollback().await?;
            return Ok(false);
        }

        let mut person_select = Query::select();
        person_select.columns(PERSON_COLS).from(TableSet::Pending.people()).and_where(
            Expr::col(People::Id).in_subquery(
                Query::select()
                    .column(Credits::PersonId)
                    .from(TableSet::Pending.credits())
                    .and_where(Expr::col(Credits::MovieId).eq(id))
                    .to_owned(),
            ),
        );
        let mut copy_people = Query::insert();
        copy_people
            .into_table(TableSet::Production.people())
            .columns(PERSON_COLS)
            .select_from(person_select)
            .map_err(|e| anyhow::anyhow!("people copy shape: {e}"))?
            .on_conflict(OnConflict::column(People::Id).do_nothing().to_owned());
        txn.execute(self.stmt(&copy_people)).await?;

        // No conflict clause here: a colliding credit identity must fail the
        // transaction, not half-promote.
        let mut credit_select = Query::select();
        credit_select
            .columns(CREDIT_COPY_COLS)
            .from(TableSet::Pending.credits())
            .and_where(Expr::col(Credits::MovieId).eq(id));
        let mut copy_credits = Query::insert();
        copy_credits
            .into_table(TableSet::Production.credits())
            .columns(CREDIT_COPY_COLS)
            .select_from(credit_select)
            .map_err(|e| anyhow::anyhow!("credits copy shape: {e}"))?;
        txn.execute(self.stmt(&copy_credits)).await?;

        let mut genre_select = Query::select();
        genre_select
            .columns(GENRE_COLS)
            .from(TableSet::Pending.genres())
            .and_where(Expr::col(Genres::MovieId).eq(id));
        let mut copy_genres = Query::insert();
        copy_genres
            .into_table(TableSet::Production.genres())
            .columns(GENRE_COLS)
            .select_from(genre_select)
            .map_err(|e| anyhow::anyhow!("genres copy shape: {e}"))?
            .on_conflict(
                OnConflict::columns([Genres::MovieId, Genres::GenreName]).do_nothing().to_owned(),
            );
        txn.execute(self.stmt(&copy_genres)).await?;

        self.delete_staged_rows(&txn, id).await?;
        self.prune_staged_people(&txn).await?;

        txn.commit().await?;
        Ok(true)
    }

    /// Drops one staged movie without touching production. Returns false
    /// when nothing is staged under the id.
    pub async fn delete_pending(&self, id: i32) -> AppResult<bool> {
        let txn = self.db.begin().await?;

        let mut movie_check = Query::select();
        movie_check
            .column(Movies::Id)
            .from(TableSet::Pending.movies())
            .and_where(Expr::col(Movies::Id).eq(id));
        if IdRow::find_by_statement(self.stmt(&movie_check)).one(&txn).await?.is_none() {
            txn.rollback().await?;
            return Ok(false);
        }

        self.delete_staged_rows(&txn, id).await?;
        self.prune_staged_people(&txn).await?;

        txn.commit().await?;
        Ok(true)
    }

    /// Empties the selected sets. Meant for the drop command, which collects
    /// its own typed confirmation before calling in.
    pub async fn clear(&self, production: bool, pending: bool, confirmed: bool) -> AppResult<()> {
        if !confirmed {
            return Err(AppError::Guardrail(
                "refusing to clear tables without confirmation".to_string(),
            ));
        }
        let txn = self.db.begin().await?;
        if pending {
            self.clear_set(&txn, TableSet::Pending).await?;
        }
        if production {
            self.clear_set(&txn, TableSet::Production).await?;
        }
        txn.commit().await?;
        Ok(())
    }

    async fn clear_set(&self, txn: &DatabaseTransaction, set: TableSet) -> AppResult<()> {
        for table in [set.credits(), set.genres(), set.people(), set.movies()] {
            let mut delete = Query::delete();
            delete.from_table(table);
            txn.execute(self.stmt(&delete)).await?;
        }
        Ok(())
    }

    async fn delete_staged_rows(&self, txn: &DatabaseTransaction, id: i32) -> AppResult<()> {
        let mut del_credits = Query::delete();
        del_credits
            .from_table(TableSet::Pending.credits())
            .and_where(Expr::col(Credits::MovieId).eq(id));
        txn.execute(self.stmt(&del_credits)).await?;

        let mut del_genres = Query::delete();
        del_genres
            .from_table(TableSet::Pending.genres())
            .and_where(Expr::col(Genres::MovieId).eq(id));
        txn.execute(self.stmt(&del_genres)).await?;

        let mut del_movie = Query::delete();
        del_movie
            .from_table(TableSet::Pending.movies())
            .and_where(Expr::col(Movies::Id).eq(id));
        txn.execute(self.stmt(&del_movie)).await?;
        Ok(())
    }

    /// Staged people are kept only while a staged credit still references
    /// them, since the same person often appears across several staged
    /// movies.
    async fn prune_staged_people(&self, txn: &DatabaseTransaction) -> AppResult<()> {
        let mut prune = Query::delete();
        prune.from_table(TableSet::Pending.people()).and_where(
            Expr::col(People::Id).not_in_subquery(
                Query::select()
                    .column(Credits::PersonId)
                    .from(TableSet::Pending.credits())
                    .to_owned(),
            ),
        );
        txn.execute(self.stmt(&prune)).await?;
        Ok(())
    }

    async fn upsert_people(
        &self,
        txn: &DatabaseTransaction,
        set: TableSet,
        people: &[PersonRecord],
        now: i64,
    ) -> AppResult<()> {
        if people.is_empty() {
            return Ok(());
        }
        let mut insert = Query::insert();
        insert
            .into_table(set.people())
            .columns(PERSON_COLS)
            .on_conflict(OnConflict::column(People::Id).do_nothing().to_owned());
        for person in people {
            insert.values_panic([
                person.id.into(),
                person.name.clone().into(),
                person.profile_path.clone().into(),
                person.gender.into(),
                person.known_for_department.clone().into(),
                now.into(),
                now.into(),
            ]);
        }
        txn.execute(self.stmt(&insert)).await?;
        Ok(())
    }

    async fn insert_credits(
        &self,
        txn: &DatabaseTransaction,
        set: TableSet,
        movie_id: i32,
        credits: &[CreditRecord],
        now: i64,
    ) -> AppResult<()> {
        if credits.is_empty() {
            return Ok(());
        }
        let mut insert = Query::insert();
        insert.into_table(set.credits()).columns(CREDIT_COPY_COLS);
        for credit in credits {
            // Role fields are stored as empty strings, never NULL, so the
            // identity index can compare them.
            insert.values_panic([
                movie_id.into(),
                credit.person_id.into(),
                credit.kind.as_db_code().into(),
                credit.character_name.clone().unwrap_or_default().into(),
                credit.credit_order.into(),
                credit.department.clone().into(),
                credit.job.clone().unwrap_or_default().into(),
                now.into(),
            ]);
        }
        txn.execute(self.stmt(&insert)).await?;
        Ok(())
    }

    async fn insert_genres(
        &self,
        txn: &DatabaseTransaction,
        set: TableSet,
        movie_id: i32,
        genres: &[String],
        now: i64,
    ) -> AppResult<()> {
        if genres.is_empty() {
            return Ok(());
        }
        let mut insert = Query::insert();
        insert.into_table(set.genres()).columns(GENRE_COLS).on_conflict(
            OnConflict::columns([Genres::MovieId, Genres::GenreName]).do_nothing().to_owned(),
        );
        for genre in genres {
            insert.values_panic([movie_id.into(), genre.clone().into(), now.into()]);
        }
        txn.execute(self.stmt(&insert)).await?;
        Ok(())
    }
}

fn none_if_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

#[derive(FromQueryResult)]
struct IdRow {
    id: i32,
}

#[derive(FromQueryResult)]
struct MarkerRow {
    id: i32,
    updated_at: i64,
}

#[derive(FromQueryResult)]
struct CountRow {
    count: i64,
}

#[derive(FromQueryResult)]
struct LatestRow {
    latest: Option<String>,
}

#[derive(FromQueryResult)]
struct GenreRow {
    genre_name: String,
}

#[derive(FromQueryResult)]
struct MovieRow {
    id: i32,
    title: String,
    original_title: Option<String>,
    overview: Option<String>,
    release_date: Option<String>,
    runtime: Option<i32>,
    status: Option<String>,
    tagline: Option<String>,
    vote_average: Option<f64>,
    vote_count: Option<i32>,
    popularity: Option<f64>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    budget: Option<i64>,
    revenue: Option<i64>,
    imdb_id: Option<String>,
    original_language: Option<String>,
    origin_country: Option<String>,
    english_name: Option<String>,
    spoken_language_codes: Option<String>,
}

#[derive(FromQueryResult)]
struct CreditJoinRow {
    person_id: i32,
    credit_type: String,
    character_name: String,
    credit_order: Option<i32>,
    department: Option<String>,
    job: String,
    name: String,
    profile_path: Option<String>,
    gender: Option<i32>,
    known_for_department: Option<String>,
}

#[derive(FromQueryResult)]
struct PendingRow {
    id: i32,
    title: String,
    release_date: Option<String>,
    popularity: Option<f64>,
}

impl PendingRow {
    fn into_summary(self) -> PendingSummary {
        PendingSummary {
            id: self.id,
            title: self.title,
            release_date: self.release_date.as_deref().and_then(|s| s.parse().ok()),
            popularity: self.popularity,
        }
    }
}
