//! Per-stream fetch bookkeeping with key-based supersession.
//!
//! Each remote stream (dataset list, table page, chart projection) owns one
//! `FetchSlot`. A slot is a tagged state over the request key: the key is
//! the slice of view state that determines the request's parameters, and
//! two fetches are the same request iff their keys compare equal. A
//! completion may commit only while its key is still the slot's current
//! key; anything else was superseded by a later `ensure` and is dropped
//! without touching state. That single rule is what keeps a slow stale
//! response from overwriting a newer one.

/// Tagged per-stream state. `Ready` and `Failed` remember the key they
/// were produced under so `ensure` can tell a repeat request from a new one.
/// `Loading` carries the last committed value forward so the read model
/// keeps serving it until the replacement lands.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchSlot<K, T, E> {
    Idle,
    Loading(K, Option<T>),
    Ready(K, T),
    Failed(K, E),
}

impl<K: PartialEq + Clone, T, E> FetchSlot<K, T, E> {
    /// Decide whether `key` needs a fetch. When the slot already holds this
    /// key (in flight, resolved, or failed) nothing happens and `false` is
    /// returned. Otherwise the slot becomes `Loading(key)` and the caller
    /// must issue the fetch. A committed value survives into `Loading` so
    /// `value()` stays populated during the refetch; a committed error does
    /// not.
    ///
    /// A `Failed` slot under the same key stays failed: retry is driven by
    /// `retry()` or by a state change that produces a new key, never by a
    /// redundant `ensure`.
    pub fn ensure(&mut self, key: K) -> bool {
        if self.key() == Some(&key) {
            return false;
        }
        let prev = match std::mem::replace(self, Self::Idle) {
            Self::Ready(_, v) => Some(v),
            Self::Loading(_, v) => v,
            Self::Idle | Self::Failed(..) => None,
        };
        *self = Self::Loading(key, prev);
        true
    }

    /// Commit a completion issued under `key`. Returns `true` when the
    /// result was accepted; a completion for a superseded key is discarded
    /// silently and the slot is left untouched.
    pub fn resolve(&mut self, key: K, outcome: Result<T, E>) -> bool {
        if !matches!(self, Self::Loading(k, _) if *k == key) {
            return false;
        }
        *self = match outcome {
            Ok(value) => Self::Ready(key, value),
            Err(error) => Self::Failed(key, error),
        };
        true
    }

    /// Forget a failure so the next `ensure` with the same key refetches.
    /// No-op unless the slot is `Failed`.
    pub fn retry(&mut self) {
        if matches!(self, Self::Failed(..)) {
            *self = Self::Idle;
        }
    }

    /// Drop everything (e.g. when no dataset is selected anymore). An
    /// in-flight completion for the old key will find no matching key and
    /// be discarded.
    pub fn clear(&mut self) {
        *self = Self::Idle;
    }

    /// The key this slot is currently bound to, in any non-idle state.
    pub fn key(&self) -> Option<&K> {
        match self {
            Self::Idle => None,
            Self::Loading(k, _) | Self::Ready(k, _) | Self::Failed(k, _) => Some(k),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading(..))
    }

    /// The last committed value: the resolved one, or the one carried
    /// through an in-flight refetch.
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Ready(_, v) | Self::Loading(_, Some(v)) => Some(v),
            _ => None,
        }
    }

    /// The committed error, when failed.
    pub fn error(&self) -> Option<&E> {
        match self {
            Self::Failed(_, e) => Some(e),
            _ => None,
        }
    }
}

impl<K, T, E> Default for FetchSlot<K, T, E> {
    fn default() -> Self {
        Self::Idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Slot = FetchSlot<u32, &'static str, &'static str>;

    #[test]
    fn ensure_issues_once_per_key() {
        let mut slot = Slot::Idle;
        assert!(slot.ensure(1));
        assert!(!slot.ensure(1), "same key in flight must not re-issue");
        assert!(slot.ensure(2), "new key supersedes");
        assert_eq!(slot.key(), Some(&2));
    }

    #[test]
    fn ensure_no_ops_on_resolved_key() {
        let mut slot = Slot::Idle;
        slot.ensure(1);
        assert!(slot.resolve(1, Ok("a")));
        assert!(!slot.ensure(1), "already resolved for this key");
        assert_eq!(slot.value(), Some(&"a"));
    }

    #[test]
    fn stale_result_is_discarded() {
        let mut slot = Slot::Idle;
        slot.ensure(1);
        slot.ensure(2);
        // The fetch for key 1 finishes late.
        assert!(!slot.resolve(1, Ok("stale")));
        assert!(slot.is_loading());
        assert!(slot.resolve(2, Ok("fresh")));
        assert_eq!(slot.value(), Some(&"fresh"));
        // And an even later duplicate for key 1 still changes nothing.
        assert!(!slot.resolve(1, Ok("stale")));
        assert_eq!(slot.value(), Some(&"fresh"));
    }

    #[test]
    fn slow_old_response_cannot_overwrite_committed_newer_one() {
        // Issue K1, switch to K2, K2 commits first, K1 arrives afterwards.
        let mut slot = Slot::Idle;
        slot.ensure(1);
        slot.ensure(2);
        assert!(slot.resolve(2, Ok("k2")));
        assert!(!slot.resolve(1, Ok("k1")));
        assert_eq!(slot.value(), Some(&"k2"));
    }

    #[test]
    fn stale_failure_is_discarded() {
        let mut slot = Slot::Idle;
        slot.ensure(1);
        slot.ensure(2);
        assert!(!slot.resolve(1, Err("boom")));
        assert!(slot.error().is_none());
        assert!(slot.resolve(2, Err("later")));
        assert_eq!(slot.error(), Some(&"later"));
    }

    #[test]
    fn failure_commits_for_current_key_and_sticks_until_retry() {
        let mut slot = Slot::Idle;
        slot.ensure(1);
        assert!(slot.resolve(1, Err("boom")));
        assert!(!slot.is_loading());
        // Same key does not silently refetch a failure.
        assert!(!slot.ensure(1));
        slot.retry();
        assert!(slot.ensure(1));
    }

    #[test]
    fn refetch_keeps_serving_the_last_committed_value() {
        let mut slot = Slot::Idle;
        slot.ensure(1);
        assert!(slot.resolve(1, Ok("one")));
        // A new key starts a fetch but the old value remains readable.
        assert!(slot.ensure(2));
        assert!(slot.is_loading());
        assert_eq!(slot.value(), Some(&"one"));
        // Another supersession carries it along again.
        assert!(slot.ensure(3));
        assert_eq!(slot.value(), Some(&"one"));
        assert!(slot.resolve(3, Ok("three")));
        assert_eq!(slot.value(), Some(&"three"));
    }

    #[test]
    fn failure_replaces_the_carried_value() {
        let mut slot = Slot::Idle;
        slot.ensure(1);
        slot.resolve(1, Ok("one"));
        slot.ensure(2);
        assert!(slot.resolve(2, Err("boom")));
        assert_eq!(slot.value(), None);
        assert_eq!(slot.error(), Some(&"boom"));
        // And a fetch issued out of `Failed` starts with no stale value.
        slot.retry();
        slot.ensure(2);
        assert_eq!(slot.value(), None);
    }

    #[test]
    fn clear_drops_state_and_orphans_in_flight_completions() {
        let mut slot = Slot::Idle;
        slot.ensure(1);
        slot.clear();
        assert!(!slot.resolve(1, Ok("orphan")));
        assert_eq!(slot, Slot::Idle);
    }
}
