//! Compiled-plan cache keyed by structural template matching.
//!
//! Plans live in an index-addressed doubly linked list ordered by recency
//! (head = most recently used). Lookup walks from the head comparing schema
//! identity first and then template structure, so the cost of a lookup is
//! bounded by `depth` template comparisons.
//!
//! Compilation never runs under the lock. A miss compiles unlocked and then
//! searches again under the write lock before inserting; if another thread won
//! the race its plan is returned and ours is dropped.

use crate::{
    config::{ConfigError, PlanCacheConfig},
    expr::{Expr, expr_matches},
    model::SchemaId,
    obs::sink::{self, CacheOutcome, MetricsEvent},
    plan::CompiledPlan,
};
use parking_lot::RwLock;
use std::sync::{
    Arc, OnceLock,
    atomic::{AtomicU64, Ordering},
};

static GLOBAL: OnceLock<Arc<PlanCache>> = OnceLock::new();

///
/// CacheStats
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Compiles whose result lost the insertion race.
    pub discarded: u64,
    /// Entries dropped for exceeding the depth bound.
    pub truncated: u64,
    pub size: usize,
}

///
/// PlanCache
///

pub struct PlanCache {
    enabled: bool,
    depth: usize,
    state: RwLock<CacheState>,

    // Stats are best-effort only; relaxed atomics are sufficient.
    hits: AtomicU64,
    misses: AtomicU64,
    discarded: AtomicU64,
    truncated: AtomicU64,
}

impl PlanCache {
    pub fn new(config: &PlanCacheConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self::from_valid(config))
    }

    // Callers have validated `config`.
    fn from_valid(config: &PlanCacheConfig) -> Self {
        Self {
            enabled: config.enabled,
            depth: config.depth,
            state: RwLock::new(CacheState::default()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            discarded: AtomicU64::new(0),
            truncated: AtomicU64::new(0),
        }
    }

    /// Process-wide cache built from the default configuration.
    #[must_use]
    pub fn global() -> Arc<Self> {
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(Self::default())))
    }

    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Return the cached plan matching `template` under `schema`, compiling
    /// and inserting one on a miss. A failed compile leaves the cache as it was.
    pub fn get_or_compile<E>(
        &self,
        schema: SchemaId,
        template: &Expr,
        compile: impl FnOnce() -> Result<CompiledPlan, E>,
    ) -> Result<Arc<CompiledPlan>, E> {
        if !self.enabled {
            sink::record(MetricsEvent::PlanCache {
                outcome: CacheOutcome::Bypassed,
            });
            return compile().map(Arc::new);
        }

        let cached = self.state.read().find(schema, template, self.depth);
        if let Some((index, plan)) = cached {
            self.promote(index, &plan);
            self.record_hit();
            tracing::trace!(%schema, slot = index, "plan cache hit");

            return Ok(plan);
        }

        self.record_miss();
        tracing::debug!(%schema, "plan cache miss");

        let compiled = Arc::new(compile()?);

        let mut state = self.state.write();
        if let Some((index, plan)) = state.find(schema, template, self.depth) {
            state.move_to_front(index);
            drop(state);

            self.discarded.fetch_add(1, Ordering::Relaxed);
            sink::record(MetricsEvent::PlanCache {
                outcome: CacheOutcome::Discarded,
            });
            tracing::trace!(%schema, "concurrent compile won; discarding ours");

            return Ok(plan);
        }

        let dropped = state.truncate(self.depth - 1);
        state.push_front(Arc::clone(&compiled));
        drop(state);

        if dropped > 0 {
            let dropped = dropped as u64;
            self.truncated.fetch_add(dropped, Ordering::Relaxed);
            sink::record(MetricsEvent::PlanCacheTruncated { entries: dropped });
            tracing::debug!(%schema, dropped, "plan cache truncated");
        }

        Ok(compiled)
    }

    /// Look up without compiling or promoting.
    #[must_use]
    pub fn peek(&self, schema: SchemaId, template: &Expr) -> Option<Arc<CompiledPlan>> {
        self.state
            .read()
            .find(schema, template, self.depth)
            .map(|(_, plan)| plan)
    }

    /// Drop every cached plan. Stats are kept.
    pub fn clear(&self) {
        *self.state.write() = CacheState::default();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Plans from most to least recently used.
    #[must_use]
    pub fn plans(&self) -> Vec<Arc<CompiledPlan>> {
        let state = self.state.read();

        state.iter().map(|(_, slot)| Arc::clone(&slot.plan)).collect()
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
            truncated: self.truncated.load(Ordering::Relaxed),
            size: self.len(),
        }
    }

    // Relink a hit at the head, unless the slot changed since the shared scan.
    fn promote(&self, index: usize, plan: &Arc<CompiledPlan>) {
        if self.state.read().head == Some(index) {
            return;
        }

        let mut state = self.state.write();
        let current = state.slot(index).map(|slot| &slot.plan);
        if current.is_some_and(|current| Arc::ptr_eq(current, plan)) {
            state.move_to_front(index);
        }
    }

    fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
        sink::record(MetricsEvent::PlanCache {
            outcome: CacheOutcome::Hit,
        });
    }

    fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
        sink::record(MetricsEvent::PlanCache {
            outcome: CacheOutcome::Miss,
        });
    }
}

impl Default for PlanCache {
    fn default() -> Self {
        Self::from_valid(&PlanCacheConfig::default())
    }
}

///
/// Slot
///

struct Slot {
    plan: Arc<CompiledPlan>,
    prev: Option<usize>,
    next: Option<usize>,
}

///
/// CacheState
///
/// Recency list over an arena of slots. Freed slots are recycled through
/// `free`, so indices stay stable while an entry is linked.
///

#[derive(Default)]
struct CacheState {
    slots: Vec<Option<Slot>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl CacheState {
    fn slot(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    fn slot_mut(&mut self, index: usize) -> Option<&mut Slot> {
        self.slots.get_mut(index).and_then(Option::as_mut)
    }

    fn iter(&self) -> SlotIter<'_> {
        SlotIter {
            state: self,
            next: self.head,
        }
    }

    // Scan at most `depth` entries from the head.
    fn find(
        &self,
        schema: SchemaId,
        template: &Expr,
        depth: usize,
    ) -> Option<(usize, Arc<CompiledPlan>)> {
        self.iter()
            .take(depth)
            .find(|(_, slot)| {
                slot.plan.schema() == schema && expr_matches(slot.plan.template(), template)
            })
            .map(|(index, slot)| (index, Arc::clone(&slot.plan)))
    }

    fn push_front(&mut self, plan: Arc<CompiledPlan>) {
        let slot = Slot {
            plan,
            prev: None,
            next: self.head,
        };

        let index = if let Some(index) = self.free.pop() {
            self.slots[index] = Some(slot);
            index
        } else {
            self.slots.push(Some(slot));
            self.slots.len() - 1
        };

        if let Some(old_head) = self.head.and_then(|head| self.slot_mut(head)) {
            old_head.prev = Some(index);
        }
        self.head = Some(index);
        if self.tail.is_none() {
            self.tail = Some(index);
        }
        self.len += 1;
    }

    fn move_to_front(&mut self, index: usize) {
        if self.head == Some(index) || self.slot(index).is_none() {
            return;
        }

        self.unlink(index);

        let old_head = self.head;
        if let Some(slot) = self.slot_mut(index) {
            slot.prev = None;
            slot.next = old_head;
        }
        if let Some(head) = old_head.and_then(|head| self.slot_mut(head)) {
            head.prev = Some(index);
        }
        self.head = Some(index);
        if self.tail.is_none() {
            self.tail = Some(index);
        }
    }

    fn unlink(&mut self, index: usize) {
        let Some((prev, next)) = self.slot(index).map(|slot| (slot.prev, slot.next)) else {
            return;
        };

        match prev.and_then(|prev| self.slot_mut(prev)) {
            Some(prev_slot) => prev_slot.next = next,
            None => self.head = next,
        }
        match next.and_then(|next| self.slot_mut(next)) {
            Some(next_slot) => next_slot.prev = prev,
            None => self.tail = prev,
        }
    }

    // Keep the first `keep` entries and free the rest; returns how many went.
    fn truncate(&mut self, keep: usize) -> usize {
        let mut dropped = 0;
        while self.len > keep {
            let Some(tail) = self.tail else {
                break;
            };

            self.unlink(tail);
            self.slots[tail] = None;
            self.free.push(tail);
            self.len -= 1;
            dropped += 1;
        }

        dropped
    }
}

struct SlotIter<'a> {
    state: &'a CacheState,
    next: Option<usize>,
}

impl<'a> Iterator for SlotIter<'a> {
    type Item = (usize, &'a Slot);

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.next?;
        let slot = self.state.slot(index)?;
        self.next = slot.next;

        Some((index, slot))
    }
}
