use crate::obs::sink::{CacheOutcome, MetricsEvent};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::{
    cmp::Ordering,
    collections::BTreeMap,
    sync::LazyLock,
    time::{SystemTime, UNIX_EPOCH},
};

///
/// EventState
/// Ephemeral, in-memory counters and simple perf totals.
///

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct EventState {
    pub ops: EventOps,
    pub perf: EventPerf,
    pub elements: BTreeMap<String, ElementCounters>,
    pub since_ms: u64,
}

impl Default for EventState {
    fn default() -> Self {
        Self {
            ops: EventOps::default(),
            perf: EventPerf::default(),
            elements: BTreeMap::new(),
            since_ms: now_millis(),
        }
    }
}

impl EventState {
    /// Fold one event into the counters.
    pub fn apply(&mut self, event: MetricsEvent) {
        match event {
            MetricsEvent::PlanCache { outcome } => {
                let counter = match outcome {
                    CacheOutcome::Hit => &mut self.ops.cache_hits,
                    CacheOutcome::Miss => &mut self.ops.cache_misses,
                    CacheOutcome::Discarded => &mut self.ops.cache_discarded,
                    CacheOutcome::Bypassed => &mut self.ops.cache_bypassed,
                };
                *counter = counter.saturating_add(1);
            }

            MetricsEvent::PlanCacheTruncated { entries } => {
                self.ops.cache_truncated = self.ops.cache_truncated.saturating_add(entries);
            }

            MetricsEvent::PlanCompiled { element } => {
                self.ops.plans_compiled = self.ops.plans_compiled.saturating_add(1);
                let entry = self.elements.entry(element.to_string()).or_default();
                entry.plans_compiled = entry.plans_compiled.saturating_add(1);
            }

            MetricsEvent::CompileFailed => {
                self.ops.compile_failures = self.ops.compile_failures.saturating_add(1);
            }

            MetricsEvent::ExecStart { element } => {
                self.ops.queries = self.ops.queries.saturating_add(1);
                let entry = self.elements.entry(element.to_string()).or_default();
                entry.queries = entry.queries.saturating_add(1);
            }

            MetricsEvent::ExecFinish {
                element,
                rows,
                elapsed_us,
            } => {
                self.ops.rows_read = self.ops.rows_read.saturating_add(rows);
                add_elapsed(
                    &mut self.perf.exec_us_total,
                    &mut self.perf.exec_us_max,
                    elapsed_us,
                );
                let entry = self.elements.entry(element.to_string()).or_default();
                entry.rows_read = entry.rows_read.saturating_add(rows);
            }
        }
    }
}

///
/// EventOps
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventOps {
    // Plan cache
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_discarded: u64,
    pub cache_bypassed: u64,
    pub cache_truncated: u64,

    // Compilation
    pub plans_compiled: u64,
    pub compile_failures: u64,

    // Execution
    pub queries: u64,
    pub rows_read: u64,
}

///
/// ElementCounters
/// Counters keyed by query element type.
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ElementCounters {
    pub plans_compiled: u64,
    pub queries: u64,
    pub rows_read: u64,
}

///
/// EventPerf
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventPerf {
    /// Wall-clock microseconds spent enumerating results.
    pub exec_us_total: u128,
    pub exec_us_max: u64,
}

static EVENT_STATE: LazyLock<Mutex<EventState>> =
    LazyLock::new(|| Mutex::new(EventState::default()));

/// Borrow metrics immutably.
pub(crate) fn with_state<R>(f: impl FnOnce(&EventState) -> R) -> R {
    f(&EVENT_STATE.lock())
}

/// Borrow metrics mutably.
pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut EventState) -> R) -> R {
    f(&mut EVENT_STATE.lock())
}

/// Reset all counters and restart the window.
pub(crate) fn reset_all() {
    with_state_mut(|m| *m = EventState::default());
}

/// Accumulate a duration and track a max.
pub(crate) fn add_elapsed(total: &mut u128, max: &mut u64, delta: u64) {
    *total = total.saturating_add(u128::from(delta));
    if delta > *max {
        *max = delta;
    }
}

pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
        })
}

///
/// EventReport
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventReport {
    /// Ephemeral runtime counters since `since_ms`.
    pub counters: Option<EventState>,
    /// Cache hit ratio over all lookups, if any lookups happened.
    pub cache_hit_ratio: Option<f64>,
    /// Per-element counters and averages.
    pub element_counters: Vec<ElementSummary>,
}

///
/// ElementSummary
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ElementSummary {
    pub element: String,
    pub plans_compiled: u64,
    pub queries: u64,
    pub rows_read: u64,
    pub avg_rows_per_query: f64,
}

/// Build a report from the global counters.
#[must_use]
pub(crate) fn report() -> EventReport {
    build_report(with_state(Clone::clone))
}

/// Build a report from a counter snapshot.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub(crate) fn build_report(snap: EventState) -> EventReport {
    let lookups = snap.ops.cache_hits.saturating_add(snap.ops.cache_misses);
    let cache_hit_ratio = (lookups > 0).then(|| snap.ops.cache_hits as f64 / lookups as f64);

    let mut element_counters: Vec<ElementSummary> = snap
        .elements
        .iter()
        .map(|(element, counters)| ElementSummary {
            element: element.clone(),
            plans_compiled: counters.plans_compiled,
            queries: counters.queries,
            rows_read: counters.rows_read,
            avg_rows_per_query: if counters.queries > 0 {
                counters.rows_read as f64 / counters.queries as f64
            } else {
                0.0
            },
        })
        .collect();

    element_counters.sort_by(|a, b| {
        match b
            .avg_rows_per_query
            .partial_cmp(&a.avg_rows_per_query)
            .unwrap_or(Ordering::Equal)
        {
            Ordering::Equal => match b.rows_read.cmp(&a.rows_read) {
                Ordering::Equal => a.element.cmp(&b.element),
                other => other,
            },
            other => other,
        }
    });

    EventReport {
        counters: Some(snap),
        cache_hit_ratio,
        element_counters,
    }
}

///
/// TESTS
///

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn apply_counts_cache_outcomes() {
        let mut state = EventState::default();
        state.apply(MetricsEvent::PlanCache {
            outcome: CacheOutcome::Hit,
        });
        state.apply(MetricsEvent::PlanCache {
            outcome: CacheOutcome::Hit,
        });
        state.apply(MetricsEvent::PlanCache {
            outcome: CacheOutcome::Miss,
        });
        state.apply(MetricsEvent::PlanCache {
            outcome: CacheOutcome::Discarded,
        });
        state.apply(MetricsEvent::PlanCacheTruncated { entries: 4 });

        assert_eq!(state.ops.cache_hits, 2);
        assert_eq!(state.ops.cache_misses, 1);
        assert_eq!(state.ops.cache_discarded, 1);
        assert_eq!(state.ops.cache_truncated, 4);

        let report = build_report(state);
        let ratio = report.cache_hit_ratio.expect("lookups happened");
        assert!((ratio - 2.0 / 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn apply_tracks_exec_perf_and_rows() {
        let mut state = EventState::default();
        state.apply(MetricsEvent::ExecStart { element: "alpha" });
        state.apply(MetricsEvent::ExecFinish {
            element: "alpha",
            rows: 3,
            elapsed_us: 40,
        });
        state.apply(MetricsEvent::ExecStart { element: "alpha" });
        state.apply(MetricsEvent::ExecFinish {
            element: "alpha",
            rows: 1,
            elapsed_us: 10,
        });

        assert_eq!(state.ops.queries, 2);
        assert_eq!(state.ops.rows_read, 4);
        assert_eq!(state.perf.exec_us_total, 50);
        assert_eq!(state.perf.exec_us_max, 40);
        assert_eq!(state.elements["alpha"].rows_read, 4);
    }

    #[test]
    fn report_sorts_elements_by_average_rows() {
        let mut state = EventState::default();
        for (element, queries, rows) in [("alpha", 2, 6), ("beta", 1, 5), ("gamma", 2, 6)] {
            state.elements.insert(
                element.to_string(),
                ElementCounters {
                    queries,
                    rows_read: rows,
                    ..Default::default()
                },
            );
        }

        let report = build_report(state);
        let elements: Vec<_> = report
            .element_counters
            .iter()
            .map(|e| e.element.as_str())
            .collect();

        // Average rows per query desc, then rows read desc, then name asc.
        assert_eq!(elements, ["beta", "alpha", "gamma"]);
        assert_eq!(report.element_counters[0].avg_rows_per_query, 5.0);
        assert_eq!(report.element_counters[1].avg_rows_per_query, 3.0);
        assert!(report.cache_hit_ratio.is_none());
    }

    #[test]
    fn report_round_trips_through_json() {
        let mut state = EventState::default();
        state.apply(MetricsEvent::PlanCompiled { element: "alpha" });

        let report = build_report(state);
        let json = serde_json::to_string(&report).expect("serialize report");
        let decoded: EventReport = serde_json::from_str(&json).expect("deserialize report");

        let counters = decoded.counters.expect("counters present");
        assert_eq!(counters.ops.plans_compiled, 1);
        assert_eq!(counters.elements["alpha"].plans_compiled, 1);
    }
}
