use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

pub mod policy;
pub mod stopping;
pub mod table;
pub mod td;

pub use policy::EpsilonGreedy;
pub use stopping::{Progress, StoppingRule, WindowSummary};
pub use table::ValueTable;
pub use td::QLearning;

// A finite set of actions available in every state.
pub trait Actions: Copy + Debug + Eq + Hash + 'static {
    // All actions, in tie-break precedence order: when estimates are equal,
    // the action listed first wins. Must not be empty.
    fn all() -> &'static [Self];
}

// Result of taking an action: where we ended up and what it paid.
// The next state is kept even for terminal steps so that it is recorded in the value table.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition<S> {
    pub next_state: S,
    pub reward: f64,
    pub terminal: bool,
}

// Picks the action with the strictly greatest value, earlier actions win ties.
// Actions missing from the map count as 0.
fn greedy_action<A: Actions>(values: &HashMap<A, f64>) -> A {
    let all = A::all();
    let mut best = all[0];
    let mut best_value = f64::NEG_INFINITY;
    for action in all {
        let value = values.get(action).copied().unwrap_or(0.0);
        if value > best_value {
            best = *action;
            best_value = value;
        }
    }
    best
}
