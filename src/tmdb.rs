use std::{collections::HashSet, num::NonZeroU32, sync::Arc, time::Duration};

use async_trait::async_trait;
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use jiff::civil::Date;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::{
    config::Config,
    error::{AppError, AppResult},
    exports::{self, ExportEntry},
    models::{CreditKind, CreditRecord, MovieRecord, PersonRecord, SearchHit},
    retry::RetryPolicy,
};

// Discover queries reject pages past 500 regardless of total_results.
const MAX_DISCOVER_PAGES: u32 = 500;
const EARLIEST_YEAR_FALLBACK: i16 = 1900;

/// One page of candidate ids from a listing endpoint.
#[derive(Clone, Debug, Default)]
pub struct IdPage {
    pub ids: Vec<i32>,
    pub total_pages: u32,
}

impl IdPage {
    fn from_discover(resp: DiscoverResponse) -> Self {
        Self {
            ids: resp.results.iter().filter(|m| !m.adult).map(|m| m.id).collect(),
            total_pages: resp.total_pages.min(MAX_DISCOVER_PAGES),
        }
    }

    fn from_changes(resp: ChangesResponse) -> Self {
        Self {
            ids: resp.results.iter().filter(|m| m.adult != Some(true)).map(|m| m.id).collect(),
            total_pages: resp.total_pages,
        }
    }
}

/// Everything the orchestrator needs from the catalog, so runs can be driven
/// by a scripted stand-in under test.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Detail plus credits in one round trip. `None` when the catalog does
    /// not know the id.
    async fn movie_with_credits(&self, id: i32) -> AppResult<Option<MovieRecord>>;

    async fn discover_year_page(&self, year: i16, page: u32) -> AppResult<IdPage>;

    async fn discover_since_page(&self, since: Date, page: u32) -> AppResult<IdPage>;

    async fn discover_range_page(&self, start: Date, end: Date, page: u32) -> AppResult<IdPage>;

    async fn changed_since_page(&self, start: Date, end: Date, page: u32) -> AppResult<IdPage>;

    async fn search(&self, query: &str) -> AppResult<Vec<SearchHit>>;

    async fn earliest_year(&self) -> AppResult<i16>;

    async fn ping(&self) -> AppResult<String>;

    /// Daily id export, `None` when that day's file is not published yet.
    async fn export_entries(&self, day: Date) -> AppResult<Option<Vec<ExportEntry>>>;
}

pub struct TmdbClient {
    client: reqwest::Client,
    access_token: String,
    base_url: String,
    export_base_url: String,
    limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
    policy: RetryPolicy,
    max_cast: usize,
}

impl TmdbClient {
    pub fn new(client: reqwest::Client, config: &Config, policy: RetryPolicy, slow_mode: bool) -> Self {
        if config.tmdb_access_token.trim().is_empty() {
            warn!("TMDB_ACCESS_TOKEN is empty, catalog requests will fail authentication");
        }

        let rps = config.rps(slow_mode);
        if slow_mode {
            info!(rps = rps, "slow mode enabled");
        }
        let limiter =
            Arc::new(RateLimiter::direct(Quota::per_second(NonZeroU32::new(rps.max(1)).unwrap())));

        Self {
            client,
            access_token: config.tmdb_access_token.clone(),
            base_url: config.tmdb_base_url.clone(),
            export_base_url: config.tmdb_export_base_url.clone(),
            limiter,
            policy,
            max_cast: config.max_cast_members,
        }
    }

    /// Sends one GET with the rate limiter and retry policy applied.
    /// `Ok(None)` is a definitive "the resource does not exist"; transient
    /// failures only surface after the retry budget is spent.
    async fn get_raw(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> AppResult<Option<reqwest::Response>> {
        let mut attempt = 0u32;
        loop {
            self.limiter.until_ready().await;

            let resp = match self
                .client
                .get(url)
                .bearer_auth(&self.access_token)
                .query(query)
                .send()
                .await
            {
                Ok(resp) => resp,
                Err(err) if err.is_timeout() || err.is_connect() => {
                    attempt += 1;
                    if attempt >= self.policy.max_attempts {
                        return Err(AppError::TransientNetwork(format!("{url}: {err}")));
                    }
                    let delay = self.policy.backoff(attempt);
                    warn!(
                        url = %url,
                        attempt = attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "request failed, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    continue;
                },
                Err(err) => return Err(err.into()),
            };

            let status = resp.status();
            if status == StatusCode::NOT_FOUND {
                return Ok(None);
            }
            if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                return Err(AppError::Authentication(format!("{status} from {url}")));
            }
            if status == StatusCode::TOO_MANY_REQUESTS {
                attempt += 1;
                if attempt >= self.policy.max_attempts {
                    return Err(AppError::TransientNetwork(format!(
                        "rate limited past the retry budget: {url}"
                    )));
                }
                let hinted = resp
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .map(Duration::from_secs);
                let delay = self.policy.retry_after(hinted);
                warn!(url = %url, delay_ms = delay.as_millis() as u64, "rate limited, waiting");
                tokio::time::sleep(delay).await;
                continue;
            }
            if status.is_server_error() {
                attempt += 1;
                if attempt >= self.policy.max_attempts {
                    return Err(AppError::TransientNetwork(format!("{status} from {url}")));
                }
                let delay = self.policy.backoff(attempt);
                warn!(url = %url, status = %status, attempt = attempt, "server error, backing off");
                tokio::time::sleep(delay).await;
                continue;
            }
            if !status.is_success() {
                debug!(url = %url, status = %status, "treating unexpected client error as absent");
                return Ok(None);
            }
            return Ok(Some(resp));
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> AppResult<Option<T>> {
        let url = format!("{}{}", self.base_url.trim_end_matches('/'), path);
        let Some(resp) = self.get_raw(&url, query).await? else {
            return Ok(None);
        };
        match resp.json::<T>().await {
            Ok(body) => Ok(Some(body)),
            Err(err) => Err(AppError::SchemaMismatch(format!("{url}: {err}"))),
        }
    }
}

#[async_trait]
impl Catalog for TmdbClient {
    async fn movie_with_credits(&self, id: i32) -> AppResult<Option<MovieRecord>> {
        let query = [("append_to_response", "credits".to_string())];
        let detail: Option<MovieDetail> = self.get_json(&format!("/movie/{id}"), &query).await?;
        Ok(detail.map(|d| d.into_record(self.max_cast)))
    }

    async fn discover_year_page(&self, year: i16, page: u32) -> AppResult<IdPage> {
        let query = [
            ("primary_release_year", year.to_string()),
            // A stable sort key, so an interrupted load can re-walk the year
            // and skip what it already has.
            ("sort_by", "primary_release_date.desc".to_string()),
            ("include_adult", "false".to_string()),
            ("page", page.to_string()),
        ];
        let resp: Option<DiscoverResponse> = self.get_json("/discover/movie", &query).await?;
        Ok(resp.map(IdPage::from_discover).unwrap_or_default())
    }

    async fn discover_since_page(&self, since: Date, page: u32) -> AppResult<IdPage> {
        let query = [
            ("primary_release_date.gte", since.to_string()),
            ("sort_by", "primary_release_date.asc".to_string()),
            ("include_adult", "false".to_string()),
            ("page", page.to_string()),
        ];
        let resp: Option<DiscoverResponse> = self.get_json("/discover/movie", &query).await?;
        Ok(resp.map(IdPage::from_discover).unwrap_or_default())
    }

    async fn discover_range_page(&self, start: Date, end: Date, page: u32) -> AppResult<IdPage> {
        let query = [
            ("primary_release_date.gte", start.to_string()),
            ("primary_release_date.lte", end.to_string()),
            ("sort_by", "primary_release_date.asc".to_string()),
            ("include_adult", "false".to_string()),
            ("page", page.to_string()),
        ];
        let resp: Option<DiscoverResponse> = self.get_json("/discover/movie", &query).await?;
        Ok(resp.map(IdPage::from_discover).unwrap_or_default())
    }

    async fn changed_since_page(&self, start: Date, end: Date, page: u32) -> AppResult<IdPage> {
        let query = [
            ("start_date", start.to_string()),
            ("end_date", end.to_string()),
            ("page", page.to_string()),
        ];
        let resp: Option<ChangesResponse> = self.get_json("/movie/changes", &query).await?;
        Ok(resp.map(IdPage::from_changes).unwrap_or_default())
    }

    async fn search(&self, query_text: &str) -> AppResult<Vec<SearchHit>> {
        let query =
            [("query", query_text.to_string()), ("include_adult", "false".to_string())];
        let resp: Option<SearchResponse> = self.get_json("/search/movie", &query).await?;
        let Some(resp) = resp else {
            return Ok(Vec::new());
        };
        let hits = resp
            .results
            .into_iter()
            .filter(|m| !m.adult)
            .map(|m| SearchHit {
                id: m.id,
                title: m.title.unwrap_or_else(|| "Unknown".to_string()),
                year: m
                    .release_date
                    .as_deref()
                    .and_then(|s| s.parse::<Date>().ok())
                    .map(|d| d.year()),
                in_production: false,
                in_pending: false,
            })
            .collect();
        Ok(hits)
    }

    async fn earliest_year(&self) -> AppResult<i16> {
        let query = [
            ("sort_by", "primary_release_date.asc".to_string()),
            ("include_adult", "false".to_string()),
            ("page", "1".to_string()),
        ];
        let resp: Option<DiscoverResponse> = self.get_json("/discover/movie", &query).await?;
        let year = resp
            .and_then(|r| r.results.into_iter().find_map(|m| m.release_date))
            .and_then(|s| s.parse::<Date>().ok())
            .map(|d| d.year())
            .unwrap_or(EARLIEST_YEAR_FALLBACK);
        Ok(year)
    }

    async fn ping(&self) -> AppResult<String> {
        let detail: Option<MovieDetail> = self.get_json("/movie/550", &[]).await?;
        match detail.and_then(|d| d.title) {
            Some(title) => Ok(title),
            None => {
                Err(AppError::SchemaMismatch("reference movie 550 came back empty".to_string()))
            },
        }
    }

    async fn export_entries(&self, day: Date) -> AppResult<Option<Vec<ExportEntry>>> {
        let url = exports::export_url(&self.export_base_url, day)?;
        let Some(resp) = self.get_raw(&url, &[]).await? else {
            debug!(url = %url, "no export published for that day");
            return Ok(None);
        };
        let bytes = resp.bytes().await?;
        Ok(Some(exports::parse_export(&bytes)?))
    }
}

#[derive(Debug, Deserialize)]
struct MovieDetail {
    id: i32,
    title: Option<String>,
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
    #[serde(default)]
    origin_country: Vec<String>,
    #[serde(default)]
    spoken_languages: Vec<SpokenLanguage>,
    #[serde(default)]
    genres: Vec<GenreEntry>,
    #[serde(default)]
    adult: bool,
    credits: Option<CreditsBlock>,
}

impl MovieDetail {
    /// Normalizes a wire payload into the internal record shape: cast capped
    /// in listing order, crew reduced to directors, identical credits
    /// collapsed so the store's identity index never trips on clean input.
    fn into_record(self, max_cast: usize) -> MovieRecord {
        let title =
            self.title.filter(|t| !t.trim().is_empty()).unwrap_or_else(|| "Unknown".to_string());
        let release_date = self.release_date.as_deref().and_then(|s| s.parse::<Date>().ok());
        let genres: Vec<String> = self.genres.into_iter().filter_map(|g| g.name).collect();
        let origin_country = if self.origin_country.is_empty() {
            None
        } else {
            serde_json::to_string(&self.origin_country).ok()
        };
        let spoken_codes: Vec<&str> = self
            .spoken_languages
            .iter()
            .filter_map(|l| l.iso_639_1.as_deref())
            .filter(|c| !c.is_empty())
            .collect();
        let spoken_language_codes =
            if spoken_codes.is_empty() { None } else { Some(spoken_codes.join(",")) };
        let english_name = self
            .spoken_languages
            .iter()
            .find(|l| l.iso_639_1.as_deref() == Some("en"))
            .and_then(|l| l.english_name.clone());

        let mut people: Vec<PersonRecord> = Vec::new();
        let mut people_seen: HashSet<i32> = HashSet::new();
        let mut credits: Vec<CreditRecord> = Vec::new();
        let mut credit_seen: HashSet<(i32, CreditKind, String, String)> = HashSet::new();

        if let Some(block) = self.credits {
            for (order, member) in block.cast.into_iter().take(max_cast).enumerate() {
                let Some(name) = member.name.filter(|n| !n.is_empty()) else { continue };
                let identity = (
                    member.id,
                    CreditKind::Cast,
                    member.character.clone().unwrap_or_default(),
                    String::new(),
                );
                if !credit_seen.insert(identity) {
                    continue;
                }
                if people_seen.insert(member.id) {
                    people.push(PersonRecord {
                        id: member.id,
                        name,
                        profile_path: member.profile_path,
                        gender: member.gender,
                        known_for_department: member.known_for_department,
                    });
                }
                credits.push(CreditRecord {
                    person_id: member.id,
                    kind: CreditKind::Cast,
                    character_name: member.character,
                    credit_order: Some(order as i32),
                    department: None,
                    job: None,
                });
            }

            for member in block.crew {
                if member.job.as_deref() != Some("Director") {
                    continue;
                }
                let Some(name) = member.name.filter(|n| !n.is_empty()) else { continue };
                let identity =
                    (member.id, CreditKind::Crew, String::new(), "Director".to_string());
                if !credit_seen.insert(identity) {
                    continue;
                }
                if people_seen.insert(member.id) {
                    people.push(PersonRecord {
                        id: member.id,
                        name,
                        profile_path: member.profile_path,
                        gender: member.gender,
                        known_for_department: member.known_for_department,
                    });
                }
                credits.push(CreditRecord {
                    person_id: member.id,
                    kind: CreditKind::Crew,
                    character_name: None,
                    credit_order: None,
                    department: member.department,
                    job: member.job,
                });
            }
        }

        MovieRecord {
            id: self.id,
            title,
            original_title: self.original_title,
            overview: self.overview,
            release_date,
            runtime: self.runtime,
            status: self.status,
            tagline: self.tagline,
            vote_average: self.vote_average,
            vote_count: self.vote_count,
            popularity: self.popularity,
            poster_path: self.poster_path,
            backdrop_path: self.backdrop_path,
            budget: self.budget,
            revenue: self.revenue,
            imdb_id: self.imdb_id,
            original_language: self.original_language,
            origin_country,
            english_name,
            spoken_language_codes,
            adult: self.adult,
            people,
            credits,
            genres,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SpokenLanguage {
    iso_639_1: Option<String>,
    english_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenreEntry {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreditsBlock {
    #[serde(default)]
    cast: Vec<CastEntry>,
    #[serde(default)]
    crew: Vec<CrewEntry>,
}

#[derive(Debug, Deserialize)]
struct CastEntry {
    id: i32,
    name: Option<String>,
    character: Option<String>,
    profile_path: Option<String>,
    gender: Option<i32>,
    known_for_department: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CrewEntry {
    id: i32,
    name: Option<String>,
    job: Option<String>,
    department: Option<String>,
    profile_path: Option<String>,
    gender: Option<i32>,
    known_for_department: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DiscoverResponse {
    #[serde(default)]
    results: Vec<DiscoverMovie>,
    #[serde(default)]
    total_pages: u32,
}

#[derive(Debug, Deserialize)]
struct DiscoverMovie {
    id: i32,
    release_date: Option<String>,
    #[serde(default)]
    adult: bool,
}

#[derive(Debug, Deserialize)]
struct ChangesResponse {
    #[serde(default)]
    results: Vec<ChangedMovie>,
    #[serde(default)]
    total_pages: u32,
}

#[derive(Debug, Deserialize)]
struct ChangedMovie {
    id: i32,
    adult: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchMovie>,
}

#[derive(Debug, Deserialize)]
struct SearchMovie {
    id: i32,
    title: Option<String>,
    release_date: Option<String>,
    #[serde(default)]
    adult: bool,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn detail(value: serde_json::Value) -> MovieDetail {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn full_payload_normalizes() {
        let record = detail(json!({
            "id": 550,
            "title": "Fight Club",
            "original_title": "Fight Club",
            "overview": "An insomniac office worker.",
            "release_date": "1999-10-15",
            "runtime": 139,
            "status": "Released",
            "vote_average": 8.4,
            "vote_count": 26280,
            "popularity": 61.4,
            "imdb_id": "tt0137523",
            "original_language": "en",
            "origin_country": ["US"],
            "spoken_languages": [
                {"iso_639_1": "en", "english_name": "English"},
                {"iso_639_1": "de", "english_name": "German"}
            ],
            "genres": [{"id": 18, "name": "Drama"}],
            "credits": {
                "cast": [
                    {"id": 819, "name": "Edward Norton", "character": "The Narrator", "gender": 2},
                    {"id": 287, "name": "Brad Pitt", "character": "Tyler Durden", "gender": 2}
                ],
                "crew": [
                    {"id": 7467, "name": "David Fincher", "job": "Director", "department": "Directing"},
                    {"id": 7469, "name": "Jim Uhls", "job": "Screenplay", "department": "Writing"}
                ]
            }
        }))
        .into_record(8);

        assert_eq!(record.title, "Fight Club");
        assert_eq!(record.year(), Some(1999));
        assert_eq!(record.genres, vec!["Drama"]);
        assert_eq!(record.origin_country.as_deref(), Some(r#"["US"]"#));
        assert_eq!(record.spoken_language_codes.as_deref(), Some("en,de"));
        assert_eq!(record.english_name.as_deref(), Some("English"));
        assert_eq!(record.people.len(), 3);
        assert_eq!(record.credits.len(), 3);
        assert_eq!(record.director_names(), vec!["David Fincher"]);
    }

    #[test]
    fn minimal_payload_gets_defaults() {
        let record = detail(json!({"id": 99999})).into_record(8);
        assert_eq!(record.title, "Unknown");
        assert!(record.release_date.is_none());
        assert!(record.genres.is_empty());
        assert!(record.people.is_empty());
        assert!(record.credits.is_empty());
        assert!(record.origin_country.is_none());
    }

    #[test]
    fn unparseable_release_dates_become_none() {
        for bad in ["", "1999", "not-a-date"] {
            let record = detail(json!({"id": 1, "release_date": bad})).into_record(8);
            assert!(record.release_date.is_none(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn cast_is_capped_in_listing_order() {
        let cast: Vec<_> = (0..10)
            .map(|i| json!({"id": i + 100, "name": format!("Actor {i}"), "character": format!("Role {i}")}))
            .collect();
        let record =
            detail(json!({"id": 1, "credits": {"cast": cast, "crew": []}})).into_record(3);

        assert_eq!(record.credits.len(), 3);
        let orders: Vec<Option<i32>> = record.credits.iter().map(|c| c.credit_order).collect();
        assert_eq!(orders, vec![Some(0), Some(1), Some(2)]);
        assert_eq!(record.credits[0].person_id, 100);
    }

    #[test]
    fn crew_keeps_directors_only() {
        let record = detail(json!({
            "id": 1,
            "credits": {
                "cast": [],
                "crew": [
                    {"id": 1, "name": "A Director", "job": "Director", "department": "Directing"},
                    {"id": 2, "name": "A Writer", "job": "Writer", "department": "Writing"},
                    {"id": 3, "name": "A Composer", "job": "Original Music Composer", "department": "Sound"}
                ]
            }
        }))
        .into_record(8);

        assert_eq!(record.credits.len(), 1);
        assert_eq!(record.credits[0].kind, CreditKind::Crew);
        assert_eq!(record.credits[0].job.as_deref(), Some("Director"));
    }

    #[test]
    fn duplicate_credits_collapse() {
        let record = detail(json!({
            "id": 1,
            "credits": {
                "cast": [
                    {"id": 5, "name": "Twin", "character": "Both of them"},
                    {"id": 5, "name": "Twin", "character": "Both of them"}
                ],
                "crew": [
                    {"id": 9, "name": "Helmer", "job": "Director", "department": "Directing"},
                    {"id": 9, "name": "Helmer", "job": "Director", "department": "Directing"}
                ]
            }
        }))
        .into_record(8);

        assert_eq!(record.credits.len(), 2);
        assert_eq!(record.people.len(), 2);
    }

    #[test]
    fn nameless_members_are_dropped() {
        let record = detail(json!({
            "id": 1,
            "credits": {"cast": [{"id": 5, "character": "Ghost"}], "crew": []}
        }))
        .into_record(8);
        assert!(record.credits.is_empty());
        assert!(record.people.is_empty());
    }

    #[test]
    fn discover_pages_clamp_to_the_api_limit() {
        let page = IdPage::from_discover(
            serde_json::from_value(json!({
                "results": [
                    {"id": 1, "release_date": "2001-01-01", "adult": false},
                    {"id": 2, "release_date": "2001-02-01", "adult": true}
                ],
                "total_pages": 1200
            }))
            .unwrap(),
        );
        assert_eq!(page.ids, vec![1]);
        assert_eq!(page.total_pages, 500);
    }
}
