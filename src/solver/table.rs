use std::collections::hash_map;

use crate::solver::*;

// Action value estimates Q(S, A) keyed by state.
// States are created lazily with every action at 0 the first time they are read or written,
// and are never removed.
#[derive(Clone, Debug)]
pub struct ValueTable<S: Eq + Hash, A: Actions> {
    values: HashMap<S, HashMap<A, f64>>,
}

impl<S: Eq + Hash, A: Actions> Default for ValueTable<S, A> {
    fn default() -> ValueTable<S, A> {
        ValueTable {
            values: HashMap::new(),
        }
    }
}

impl<S: Eq + Hash + Clone, A: Actions> ValueTable<S, A> {
    pub fn new() -> Self {
        Self::default()
    }

    // Returns action values for the state, creating the default ones if needed.
    fn state_values(&mut self, state: &S) -> &mut HashMap<A, f64> {
        self.values
            .entry(state.clone())
            .or_insert_with(|| A::all().iter().map(|a| (*a, 0.0)).collect())
    }

    pub fn value_of(&mut self, state: &S, action: A) -> f64 {
        *self.state_values(state).entry(action).or_insert(0.0)
    }

    pub fn set_value(&mut self, state: &S, action: A, value: f64) {
        self.state_values(state).insert(action, value);
    }

    // Maximum over actions of Q(state, a).
    pub fn max_value(&mut self, state: &S) -> f64 {
        let values = self.state_values(state);
        A::all()
            .iter()
            .map(|a| values.get(a).copied().unwrap_or(0.0))
            .fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn best_action(&mut self, state: &S) -> A {
        greedy_action(self.state_values(state))
    }

    // Marks the state as seen without reading any particular action.
    pub fn touch(&mut self, state: &S) {
        self.state_values(state);
    }

    // Read-only view: None for states never seen.
    #[cfg(test)]
    pub fn get(&self, state: &S) -> Option<&HashMap<A, f64>> {
        self.values.get(state)
    }

    // Read-only greedy action: None for states never seen.
    #[cfg(test)]
    pub fn greedy(&self, state: &S) -> Option<A> {
        self.values.get(state).map(greedy_action)
    }

    #[cfg(test)]
    pub fn contains(&self, state: &S) -> bool {
        self.values.contains_key(state)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> hash_map::Iter<'_, S, HashMap<A, f64>> {
        self.values.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
    enum Move {
        Up,
        Down,
    }

    impl Actions for Move {
        fn all() -> &'static [Move] {
            &[Move::Down, Move::Up]
        }
    }

    #[test]
    fn lazy_initialization_test() {
        let mut table: ValueTable<u32, Move> = ValueTable::new();
        assert!(table.is_empty());

        assert_eq!(table.value_of(&7, Move::Up), 0.0);
        assert!(table.contains(&7));
        let values = table.get(&7).unwrap();
        assert_eq!(values.len(), 2);
        assert_eq!(values[&Move::Up], 0.0);
        assert_eq!(values[&Move::Down], 0.0);

        assert_eq!(table.max_value(&8), 0.0);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn unseen_state_best_action_test() {
        let mut table: ValueTable<u32, Move> = ValueTable::new();
        assert_eq!(table.greedy(&1), None);

        // Ties resolve to the first action in precedence order.
        assert_eq!(table.best_action(&1), Move::Down);
        assert_eq!(table.greedy(&1), Some(Move::Down));
        assert!(table.contains(&1));
    }

    #[test]
    fn best_action_test() {
        let mut table: ValueTable<u32, Move> = ValueTable::new();
        table.set_value(&1, Move::Up, 0.25);
        assert_eq!(table.best_action(&1), Move::Up);
        assert_eq!(table.max_value(&1), 0.25);

        table.set_value(&1, Move::Down, 0.25);
        assert_eq!(table.best_action(&1), Move::Down);

        table.set_value(&2, Move::Up, -0.5);
        table.set_value(&2, Move::Down, -0.75);
        assert_eq!(table.best_action(&2), Move::Up);
        assert_eq!(table.max_value(&2), -0.5);
    }
}
