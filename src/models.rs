use std::fmt;

use jiff::civil::Date;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum CreditKind {
    Cast,
    Crew,
}

impl CreditKind {
    pub fn as_db_code(self) -> &'static str {
        match self {
            CreditKind::Cast => "cast",
            CreditKind::Crew => "crew",
        }
    }

    pub fn from_db_code(code: &str) -> Option<Self> {
        match code {
            "cast" => Some(CreditKind::Cast),
            "crew" => Some(CreditKind::Crew),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PersonRecord {
    pub id: i32,
    pub name: String,
    pub profile_path: Option<String>,
    pub gender: Option<i32>,
    pub known_for_department: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CreditRecord {
    pub person_id: i32,
    pub kind: CreditKind,
    pub character_name: Option<String>,
    pub credit_order: Option<i32>,
    pub department: Option<String>,
    pub job: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MovieRecord {
    pub id: i32,
    pub title: String,
    pub original_title: Option<String>,
    pub overview: Option<String>,
    pub release_date: Option<Date>,
    pub runtime: Option<i32>,
    pub status: Option<String>,
    pub tagline: Option<String>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<i32>,
    pub popularity: Option<f64>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub budget: Option<i64>,
    pub revenue: Option<i64>,
    pub imdb_id: Option<String>,
    pub original_language: Option<String>,
    pub origin_country: Option<String>,
    pub english_name: Option<String>,
    pub spoken_language_codes: Option<String>,
    // Carried for filtering decisions, never written to the store.
    pub adult: bool,
    pub people: Vec<PersonRecord>,
    pub credits: Vec<CreditRecord>,
    pub genres: Vec<String>,
}

impl MovieRecord {
    pub fn year(&self) -> Option<i16> {
        self.release_date.map(|d| d.year())
    }

    pub fn director_names(&self) -> Vec<&str> {
        self.credits
            .iter()
            .filter(|c| c.kind == CreditKind::Crew && c.job.as_deref() == Some("Director"))
            .filter_map(|c| self.person_name(c.person_id))
            .collect()
    }

    fn person_name(&self, id: i32) -> Option<&str> {
        self.people.iter().find(|p| p.id == id).map(|p| p.name.as_str())
    }

    /// True when a re-fetched record carries nothing the store does not
    /// already hold. Credit and genre order is irrelevant, and person rows
    /// are identified through their credits, so repeated update runs over an
    /// unchanged catalog stay write-free.
    pub fn same_content(&self, other: &MovieRecord) -> bool {
        let scalars_match = self.id == other.id
            && self.title == other.title
            && self.original_title == other.original_title
            && self.overview == other.overview
            && self.release_date == other.release_date
            && self.runtime == other.runtime
            && self.status == other.status
            && self.tagline == other.tagline
            && self.vote_average == other.vote_average
            && self.vote_count == other.vote_count
            && self.popularity == other.popularity
            && self.poster_path == other.poster_path
            && self.backdrop_path == other.backdrop_path
            && self.budget == other.budget
            && self.revenue == other.revenue
            && self.imdb_id == other.imdb_id
            && self.original_language == other.original_language
            && self.origin_country == other.origin_country
            && self.english_name == other.english_name
            && self.spoken_language_codes == other.spoken_language_codes;
        if !scalars_match {
            return false;
        }

        let mut mine: Vec<&str> = self.genres.iter().map(String::as_str).collect();
        let mut theirs: Vec<&str> = other.genres.iter().map(String::as_str).collect();
        mine.sort_unstable();
        theirs.sort_unstable();
        if mine != theirs {
            return false;
        }

        credit_keys(&self.credits) == credit_keys(&other.credits)
    }

    pub fn summary(&self) -> String {
        use fmt::Write as _;

        let mut out = String::new();
        let rule = "=".repeat(60);
        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out, "TITLE: {}", self.title);
        if let Some(original) = &self.original_title {
            if *original != self.title {
                let _ = writeln!(out, "ORIGINAL TITLE: {original}");
            }
        }
        if let Some(date) = self.release_date {
            let _ = writeln!(out, "RELEASE DATE: {date}");
        }
        let _ = writeln!(out, "TMDB ID: {}", self.id);
        if let Some(imdb_id) = &self.imdb_id {
            let _ = writeln!(out, "IMDB ID: {imdb_id}");
        }
        if let Some(overview) = &self.overview {
            let text: String = overview.chars().take(300).collect();
            let ellipsis = if overview.chars().count() > 300 { "..." } else { "" };
            let _ = writeln!(out, "OVERVIEW:\n{text}{ellipsis}");
        }
        if !self.genres.is_empty() {
            let _ = writeln!(out, "GENRES: {}", self.genres.join(", "));
        }
        let directors = self.director_names();
        if !directors.is_empty() {
            let _ = writeln!(out, "DIRECTOR: {}", directors.join(", "));
        }
        let mut cast: Vec<&CreditRecord> =
            self.credits.iter().filter(|c| c.kind == CreditKind::Cast).collect();
        cast.sort_by_key(|c| c.credit_order.unwrap_or(i32::MAX));
        if !cast.is_empty() {
            let _ = writeln!(out, "CAST:");
            for credit in cast.iter().take(5) {
                let Some(name) = self.person_name(credit.person_id) else { continue };
                match credit.character_name.as_deref().filter(|c| !c.is_empty()) {
                    Some(character) => {
                        let _ = writeln!(out, "  - {name} as {character}");
                    },
                    None => {
                        let _ = writeln!(out, "  - {name}");
                    },
                }
            }
        }
        if let Some(runtime) = self.runtime {
            let _ = writeln!(out, "RUNTIME: {runtime} min");
        }
        if let Some(rating) = self.vote_average {
            let votes = self.vote_count.unwrap_or(0);
            let _ = writeln!(out, "RATING: {rating}/10 ({votes} votes)");
        }
        if let Some(popularity) = self.popularity {
            let _ = writeln!(out, "POPULARITY: {popularity:.1}");
        }
        let _ = write!(out, "{rule}");
        out
    }
}

type CreditKey<'a> = (i32, &'static str, &'a str, Option<i32>, &'a str, &'a str);

fn credit_keys(credits: &[CreditRecord]) -> Vec<CreditKey<'_>> {
    let mut keys: Vec<CreditKey<'_>> = credits
        .iter()
        .map(|c| {
            (
                c.person_id,
                c.kind.as_db_code(),
                c.character_name.as_deref().unwrap_or(""),
                c.credit_order,
                c.department.as_deref().unwrap_or(""),
                c.job.as_deref().unwrap_or(""),
            )
        })
        .collect();
    keys.sort_unstable();
    keys
}

#[derive(Clone, Debug)]
pub struct SearchHit {
    pub id: i32,
    pub title: String,
    pub year: Option<i16>,
    pub in_production: bool,
    pub in_pending: bool,
}

impl SearchHit {
    pub fn display_line(&self, index: usize) -> String {
        let year = self.year.map(|y| y.to_string()).unwrap_or_else(|| "????".to_string());
        let status = if self.in_production {
            " [IN DB]"
        } else if self.in_pending {
            " [PENDING]"
        } else {
            ""
        };
        format!("  [{index}] {} ({year}) - ID: {}{status}", self.title, self.id)
    }
}

#[derive(Clone, Debug)]
pub struct PendingSummary {
    pub id: i32,
    pub title: String,
    pub release_date: Option<Date>,
    pub popularity: Option<f64>,
}

impl PendingSummary {
    pub fn display_line(&self, index: usize) -> String {
        let year =
            self.release_date.map(|d| d.year().to_string()).unwrap_or_else(|| "????".to_string());
        format!("  [{index}] {} ({year}) - ID: {}", self.title, self.id)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TableCounts {
    pub movies: i64,
    pub people: i64,
    pub credits: i64,
    pub genres: i64,
}

#[derive(Clone, Debug)]
pub struct StoreStatus {
    pub production: TableCounts,
    pub pending: TableCounts,
    pub latest_production_release: Option<Date>,
    pub latest_pending_release: Option<Date>,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct IngestStats {
    pub processed: u64,
    pub inserted: u64,
    pub updated: u64,
    pub skipped_pending: u64,
    pub skipped_production: u64,
    pub skipped_adult: u64,
    pub skipped_no_date: u64,
    pub vanished: u64,
    pub conflicts: u64,
    pub errors: u64,
}

impl fmt::Display for IngestStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  processed: {}", self.processed)?;
        let lines = [
            ("inserted", self.inserted),
            ("updated", self.updated),
            ("skipped (already pending)", self.skipped_pending),
            ("skipped (in production)", self.skipped_production),
            ("skipped (adult)", self.skipped_adult),
            ("skipped (no release date)", self.skipped_no_date),
            ("vanished upstream", self.vanished),
            ("storage conflicts", self.conflicts),
            ("errors", self.errors),
        ];
        for (label, value) in lines {
            if value > 0 {
                writeln!(f, "  {label}: {value}")?;
            }
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ExitReason {
    #[default]
    Completed,
    Quit,
    LimitReached,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ExitReason::Completed => "completed",
            ExitReason::Quit => "quit",
            ExitReason::LimitReached => "limit reached",
        };
        f.write_str(text)
    }
}

#[derive(Clone, Debug, Default)]
pub struct ReviewStats {
    pub reviewed: u64,
    pub approved: u64,
    pub rejected: u64,
    pub skipped: u64,
    pub remaining_pending: u64,
    pub exit_reason: ExitReason,
}

impl fmt::Display for ReviewStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  reviewed: {}", self.reviewed)?;
        let lines =
            [("approved", self.approved), ("rejected", self.rejected), ("skipped", self.skipped)];
        for (label, value) in lines {
            if value > 0 {
                writeln!(f, "  {label}: {value}")?;
            }
        }
        writeln!(f, "  still pending: {}", self.remaining_pending)?;
        write!(f, "  session: {}", self.exit_reason)
    }
}

#[derive(Clone, Debug)]
pub struct TierGap {
    pub label: &'static str,
    pub missing: usize,
    pub total: usize,
}

#[derive(Clone, Debug)]
pub struct VerifyReport {
    pub export_date: Date,
    pub export_count: usize,
    pub production_count: usize,
    pub pending_count: usize,
    pub missing: Vec<i32>,
    pub extra_local: Vec<i32>,
    pub tiers: Option<Vec<TierGap>>,
}

impl VerifyReport {
    pub fn coverage_percent(&self) -> f64 {
        if self.export_count == 0 {
            return 100.0;
        }
        let covered =
            (self.production_count + self.pending_count).saturating_sub(self.extra_local.len());
        covered as f64 / self.export_count as f64 * 100.0
    }

    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

impl fmt::Display for VerifyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Export date:        {}", self.export_date)?;
        writeln!(f, "Export movies:      {}", self.export_count)?;
        writeln!(f, "Production movies:  {}", self.production_count)?;
        writeln!(f, "Pending movies:     {}", self.pending_count)?;
        writeln!(f, "Missing locally:    {}", self.missing.len())?;
        writeln!(f, "Extra local ids:    {}", self.extra_local.len())?;
        writeln!(f, "Coverage:           {:.1}%", self.coverage_percent())?;
        let status = if self.is_complete() { "complete" } else { "incomplete" };
        write!(f, "Status:             {status}")?;
        if let Some(tiers) = &self.tiers {
            write!(f, "\nMissing by popularity:")?;
            for tier in tiers {
                let label = format!("{}:", tier.label);
                write!(f, "\n  {label:<18} {} of {}", tier.missing, tier.total)?;
            }
        }
        Ok(())
    }
}
