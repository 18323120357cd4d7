use std::collections::{HashMap, HashSet};

/// Whether a run stages new records or refreshes existing production rows.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PlanMode {
    Add,
    Update,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Classification {
    /// Absent from both sets, eligible for insertion.
    New,
    /// Already staged. Never re-staged, and in update mode the staged copy
    /// shields the production row until a human decides.
    DuplicatePending,
    /// Already live and not worth refetching.
    DuplicateProduction,
    /// Live but possibly behind the source, refetch and let the gateway's
    /// content comparison decide whether anything is written.
    Stale,
    /// Held locally while the source no longer knows the id. The local row
    /// stays, removal is a human decision.
    Vanished,
}

/// Id snapshot of both sets, loaded once per run. The run keeps it current
/// as it inserts so later pages classify against what earlier pages wrote.
#[derive(Debug, Default)]
pub struct KnownRecords {
    pub production: HashSet<i32>,
    pub pending: HashSet<i32>,
    pub production_synced: HashMap<i32, i64>,
}

impl KnownRecords {
    pub fn holds(&self, id: i32) -> bool {
        self.pending.contains(&id) || self.production.contains(&id)
    }
}

pub fn classify(
    id: i32,
    changed_at: Option<i64>,
    mode: PlanMode,
    known: &KnownRecords,
) -> Classification {
    if known.pending.contains(&id) {
        return Classification::DuplicatePending;
    }
    if known.production.contains(&id) {
        return match mode {
            PlanMode::Add => Classification::DuplicateProduction,
            PlanMode::Update => {
                match (changed_at, known.production_synced.get(&id)) {
                    // The change notice predates our last sync, nothing new
                    // upstream.
                    (Some(changed), Some(&synced)) if changed <= synced => {
                        Classification::DuplicateProduction
                    },
                    _ => Classification::Stale,
                }
            },
        };
    }
    Classification::New
}

/// A held id whose detail fetch came back not-found.
pub fn classify_missing(id: i32, known: &KnownRecords) -> Option<Classification> {
    known.holds(id).then_some(Classification::Vanished)
}

/// What one page of candidate ids should turn into.
#[derive(Debug, Default, Eq, PartialEq)]
pub struct PagePlan {
    pub fetch: Vec<i32>,
    pub skipped_pending: u64,
    pub skipped_production: u64,
}

pub fn plan_page(ids: &[i32], mode: PlanMode, known: &KnownRecords) -> PagePlan {
    let mut plan = PagePlan::default();
    let mut seen = HashSet::new();
    for &id in ids {
        if !seen.insert(id) {
            continue;
        }
        match classify(id, None, mode, known) {
            Classification::New => match mode {
                PlanMode::Add => plan.fetch.push(id),
                // The changes feed covers the whole catalog; ids we never
                // held are not ours to refresh.
                PlanMode::Update => {},
            },
            Classification::Stale => plan.fetch.push(id),
            Classification::DuplicatePending => plan.skipped_pending += 1,
            Classification::DuplicateProduction => plan.skipped_production += 1,
            Classification::Vanished => {},
        }
    }
    plan
}

#[cfg(test)]
mod tests {
    use super::*;

    fn known() -> KnownRecords {
        KnownRecords {
            production: HashSet::from([550, 603]),
            pending: HashSet::from([27205]),
            production_synced: HashMap::from([(550, 1_700_000_000)]),
        }
    }

    #[test]
    fn unknown_ids_are_new() {
        assert_eq!(classify(99999, None, PlanMode::Add, &known()), Classification::New);
        assert_eq!(classify(99999, None, PlanMode::Update, &known()), Classification::New);
    }

    #[test]
    fn pending_wins_over_production_in_every_mode() {
        let mut state = known();
        state.production.insert(27205);
        assert_eq!(
            classify(27205, None, PlanMode::Add, &state),
            Classification::DuplicatePending
        );
        assert_eq!(
            classify(27205, Some(i64::MAX), PlanMode::Update, &state),
            Classification::DuplicatePending
        );
    }

    #[test]
    fn production_ids_are_duplicates_in_add_mode() {
        assert_eq!(
            classify(550, None, PlanMode::Add, &known()),
            Classification::DuplicateProduction
        );
    }

    #[test]
    fn update_mode_marks_production_ids_stale() {
        assert_eq!(classify(550, None, PlanMode::Update, &known()), Classification::Stale);
        assert_eq!(
            classify(550, Some(1_800_000_000), PlanMode::Update, &known()),
            Classification::Stale
        );
    }

    #[test]
    fn update_mode_skips_changes_older_than_the_sync_marker() {
        assert_eq!(
            classify(550, Some(1_600_000_000), PlanMode::Update, &known()),
            Classification::DuplicateProduction
        );
        // No marker recorded, cannot prove the change is old.
        assert_eq!(
            classify(603, Some(1_600_000_000), PlanMode::Update, &known()),
            Classification::Stale
        );
    }

    #[test]
    fn missing_ids_vanish_only_when_held() {
        assert_eq!(classify_missing(550, &known()), Some(Classification::Vanished));
        assert_eq!(classify_missing(27205, &known()), Some(Classification::Vanished));
        assert_eq!(classify_missing(99999, &known()), None);
    }

    #[test]
    fn add_page_plan_fetches_new_and_counts_skips() {
        let plan = plan_page(&[550, 27205, 99999, 99999, 88888], PlanMode::Add, &known());
        assert_eq!(plan.fetch, vec![99999, 88888]);
        assert_eq!(plan.skipped_pending, 1);
        assert_eq!(plan.skipped_production, 1);
    }

    #[test]
    fn update_page_plan_ignores_unknown_ids() {
        let plan = plan_page(&[550, 27205, 99999], PlanMode::Update, &known());
        assert_eq!(plan.fetch, vec![550]);
        assert_eq!(plan.skipped_pending, 1);
        assert_eq!(plan.skipped_production, 0);
    }
}
