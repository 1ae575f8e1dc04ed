//! Ephemeral per-node UI state: collapse flags and the deep-link highlight.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// How long a deep-linked block stays highlighted.
pub const HIGHLIGHT_DURATION: Duration = Duration::from_secs(1);

/// Expanded/collapsed state of one node.
///
/// Starts from the parent-provided `expanded` prop and follows user toggles.
/// It is reset to the prop only when the prop itself changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpandState {
    prop: bool,
    expanded: bool,
}

impl ExpandState {
    pub fn new(prop: bool) -> Self {
        Self {
            prop,
            expanded: prop,
        }
    }

    pub fn expanded(&self) -> bool {
        self.expanded
    }

    pub fn toggle(&mut self) -> bool {
        self.expanded = !self.expanded;
        self.expanded
    }

    pub fn sync(&mut self, prop: bool) {
        if prop != self.prop {
            self.prop = prop;
            self.expanded = prop;
        }
    }
}

/// Expand states keyed by node key (see [`node_key`]).
#[derive(Debug, Default)]
pub struct NodeStates {
    states: HashMap<String, ExpandState>,
}

impl NodeStates {
    /// State for `key`, created from `prop` on first sight and re-synced
    /// on every later visit.
    pub fn visit(&mut self, key: &str, prop: bool) -> bool {
        let state = self
            .states
            .entry(key.to_string())
            .or_insert_with(|| ExpandState::new(prop));
        state.sync(prop);
        state.expanded()
    }

    pub fn get(&self, key: &str) -> Option<ExpandState> {
        self.states.get(key).copied()
    }

    pub fn toggle(&mut self, key: &str) -> Option<bool> {
        self.states.get_mut(key).map(ExpandState::toggle)
    }

    pub fn clear(&mut self) {
        self.states.clear();
    }
}

/// Key of a node inside a view. Blocks rendered inside embeds are scoped
/// by the chain of embed block ids, so the same block shown twice keeps
/// two independent states.
pub fn node_key(scope: &[String], block_id: &str) -> String {
    if scope.is_empty() {
        return block_id.to_string();
    }
    format!("{}/{block_id}", scope.join("/"))
}

/// One highlight activation. Each activation owns its own timer; firing a
/// timer from an older activation does nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightTimer {
    pub block_id: String,
    pub deadline: Instant,
    generation: u64,
}

/// Scroll request emitted when a block becomes highlighted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollRequest {
    pub block_id: String,
    pub behavior: &'static str,
    pub block: &'static str,
}

impl ScrollRequest {
    fn smooth_start(block_id: &str) -> Self {
        Self {
            block_id: block_id.to_string(),
            behavior: "smooth",
            block: "start",
        }
    }
}

#[derive(Debug, Default)]
pub struct Highlighter {
    active: Option<HighlightTimer>,
    generation: u64,
}

impl Highlighter {
    /// Highlight `block_id` until `now + HIGHLIGHT_DURATION`, replacing any
    /// previous activation.
    pub fn activate(&mut self, block_id: &str, now: Instant) -> (HighlightTimer, ScrollRequest) {
        self.generation += 1;
        let timer = HighlightTimer {
            block_id: block_id.to_string(),
            deadline: now + HIGHLIGHT_DURATION,
            generation: self.generation,
        };
        tracing::debug!(block = block_id, generation = self.generation, "highlight activated");
        self.active = Some(timer.clone());
        (timer, ScrollRequest::smooth_start(block_id))
    }

    pub fn clear(&mut self) {
        self.active = None;
    }

    /// Fire `timer`. Returns true when it cleared the current highlight.
    pub fn fire(&mut self, timer: &HighlightTimer) -> bool {
        if self.active.as_ref() == Some(timer) {
            self.active = None;
            true
        } else {
            tracing::debug!(block = %timer.block_id, "ignoring stale highlight timer");
            false
        }
    }

    /// Fire the active timer if its deadline has passed.
    pub fn tick(&mut self, now: Instant) -> bool {
        match &self.active {
            Some(timer) if timer.deadline <= now => {
                self.active = None;
                true
            }
            _ => false,
        }
    }

    pub fn highlighted(&self) -> Option<&str> {
        self.active.as_ref().map(|timer| timer.block_id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_state_toggle_and_sync() {
        let mut state = ExpandState::new(true);
        assert!(state.expanded());
        assert!(!state.toggle());

        // same prop does not reset a user toggle
        state.sync(true);
        assert!(!state.expanded());

        // a changed prop does
        state.sync(false);
        assert!(!state.expanded());
        state.toggle();
        state.sync(true);
        assert!(state.expanded());
    }

    #[test]
    fn test_node_states_visit() {
        let mut states = NodeStates::default();
        assert!(states.visit("a", true));
        assert_eq!(states.toggle("a"), Some(false));
        assert!(!states.visit("a", true));
        assert!(!states.visit("a", false));
        assert!(states.visit("a", true));
        assert_eq!(states.toggle("missing"), None);
    }

    #[test]
    fn test_node_key_scoping() {
        assert_eq!(node_key(&[], "b1"), "b1");
        assert_eq!(node_key(&["e1".to_string(), "e2".to_string()], "b1"), "e1/e2/b1");
    }

    #[test]
    fn test_highlight_clears_after_deadline() {
        let start = Instant::now();
        let mut highlighter = Highlighter::default();
        let (timer, scroll) = highlighter.activate("a", start);
        assert_eq!(scroll.behavior, "smooth");
        assert_eq!(scroll.block, "start");
        assert_eq!(highlighter.highlighted(), Some("a"));

        assert!(!highlighter.tick(start + Duration::from_millis(999)));
        assert_eq!(highlighter.highlighted(), Some("a"));
        assert!(highlighter.tick(timer.deadline));
        assert_eq!(highlighter.highlighted(), None);
    }

    #[test]
    fn test_stale_timer_does_not_clear_newer_highlight() {
        let start = Instant::now();
        let mut highlighter = Highlighter::default();
        let (timer_a, _) = highlighter.activate("a", start);
        let (timer_b, _) = highlighter.activate("b", start + Duration::from_millis(500));

        assert!(!highlighter.fire(&timer_a));
        assert_eq!(highlighter.highlighted(), Some("b"));

        assert!(!highlighter.tick(start + Duration::from_secs(1)));
        assert_eq!(highlighter.highlighted(), Some("b"));

        assert!(highlighter.fire(&timer_b));
        assert_eq!(highlighter.highlighted(), None);
    }

    #[test]
    fn test_reactivating_same_block_gets_new_timer() {
        let start = Instant::now();
        let mut highlighter = Highlighter::default();
        let (first, _) = highlighter.activate("a", start);
        let (second, _) = highlighter.activate("a", start + Duration::from_millis(300));
        assert_ne!(first, second);
        assert!(!highlighter.fire(&first));
        assert_eq!(highlighter.highlighted(), Some("a"));
        assert!(highlighter.fire(&second));
    }
}
