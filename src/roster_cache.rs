use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::debug;

use crate::errors::EngineError;
use crate::provider::{DataProvider, RawRow};

/// Primary key column shared by the roster and crosswalk tables.
pub const CANONICAL_ID_COLUMN: &str = "gsis_id";

/// Suffix applied to crosswalk columns that collide with roster columns in
/// the combined view.
pub const CROSSWALK_SUFFIX: &str = "_alt";

/// Lazily loads and memoizes the roster and identifier-crosswalk tables for
/// the process lifetime.
///
/// Each table is computed at most once: the cells provide the single-flight
/// guarantee, so concurrent first calls block on one load instead of racing
/// into N redundant provider hits. A failed load leaves its cell empty and
/// the next call retries.
pub struct RosterCache {
    provider: Arc<dyn DataProvider>,
    roster: OnceCell<Arc<Vec<RawRow>>>,
    crosswalk: OnceCell<Arc<Vec<RawRow>>>,
    combined: OnceCell<Arc<Vec<RawRow>>>,
}

impl RosterCache {
    pub fn new(provider: Arc<dyn DataProvider>) -> Self {
        Self {
            provider,
            roster: OnceCell::new(),
            crosswalk: OnceCell::new(),
            combined: OnceCell::new(),
        }
    }

    /// Roster table with `full_name` synthesized from first/last when the
    /// provider omits it.
    pub fn roster(&self) -> Result<Arc<Vec<RawRow>>, EngineError> {
        self.roster
            .get_or_try_init(|| -> Result<Arc<Vec<RawRow>>, EngineError> {
                let mut rows = self.provider.load_roster()?;
                for row in &mut rows {
                    synthesize_full_name(row);
                }
                debug!(rows = rows.len(), "roster table loaded");
                Ok(Arc::new(rows))
            })
            .map(Arc::clone)
    }

    /// Cross-platform identifier table keyed by the canonical id.
    pub fn id_crosswalk(&self) -> Result<Arc<Vec<RawRow>>, EngineError> {
        self.crosswalk
            .get_or_try_init(|| -> Result<Arc<Vec<RawRow>>, EngineError> {
                let rows = self.provider.load_id_crosswalk()?;
                debug!(rows = rows.len(), "id crosswalk loaded");
                Ok(Arc::new(rows))
            })
            .map(Arc::clone)
    }

    /// Left join of roster onto crosswalk on the canonical id. A roster row
    /// with several crosswalk rows yields several combined rows; downstream
    /// consumers deduplicate by canonical id.
    pub fn combined(&self) -> Result<Arc<Vec<RawRow>>, EngineError> {
        if let Some(hit) = self.combined.get() {
            return Ok(Arc::clone(hit));
        }
        let roster = self.roster()?;
        let crosswalk = self.id_crosswalk()?;
        self.combined
            .get_or_try_init(|| -> Result<Arc<Vec<RawRow>>, EngineError> {
                let mut by_id: HashMap<&str, Vec<&RawRow>> = HashMap::new();
                for row in crosswalk.iter() {
                    if let Some(id) = row.text(CANONICAL_ID_COLUMN) {
                        by_id.entry(id).or_default().push(row);
                    }
                }

                let mut out = Vec::with_capacity(roster.len());
                for row in roster.iter() {
                    let matches = row
                        .text(CANONICAL_ID_COLUMN)
                        .and_then(|id| by_id.get(id));
                    match matches {
                        Some(xrows) => {
                            for xrow in xrows {
                                let mut joined = row.clone();
                                joined.merge_suffixed(xrow, CROSSWALK_SUFFIX);
                                out.push(joined);
                            }
                        }
                        None => out.push(row.clone()),
                    }
                }
                debug!(rows = out.len(), "combined roster view built");
                Ok(Arc::new(out))
            })
            .map(Arc::clone)
    }
}

fn synthesize_full_name(row: &mut RawRow) {
    if row.text("full_name").is_some() {
        return;
    }
    let first = row.text("first_name").unwrap_or_default();
    let last = row.text("last_name").unwrap_or_default();
    let joined = format!("{first} {last}");
    let joined = joined.trim();
    if !joined.is_empty() {
        row.set("full_name", joined);
    }
}
