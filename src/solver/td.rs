use crate::solver::*;

// One-step Q-learning update with a constant step size.
#[derive(Clone, Copy, Debug)]
pub struct QLearning {
    alpha: f64,
    discount: f64,
}

impl QLearning {
    pub fn new(alpha: f64, discount: f64) -> Self {
        QLearning { alpha, discount }
    }

    // Updates the state action value Q(S, A):
    //   Q(S, A) ← Q(S, A) + α∙[R + γ∙max Q(S₊₁, a) - Q(S, A)].
    // If S₊₁ is final, then the formula above simplifies to:
    //   Q(S, A) ← Q(S, A) + α∙[R - Q(S, A)].
    // Both S and S₊₁ are recorded in the table. Returns the applied change.
    pub fn update<S, A>(
        &self,
        table: &mut ValueTable<S, A>,
        state: &S,
        action: A,
        transition: &Transition<S>,
    ) -> f64
    where
        S: Eq + Hash + Clone,
        A: Actions,
    {
        let state_action_value = table.value_of(state, action);
        let returns = table.max_value(&transition.next_state);

        let target = if transition.terminal {
            transition.reward
        } else {
            transition.reward + self.discount * returns
        };

        let delta = self.alpha * (target - state_action_value);
        table.set_value(state, action, state_action_value + delta);
        delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
    enum RandomWalkState {
        A,
        B,
        C,
        D,
        E,
    }

    #[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
    enum RandomWalkAction {
        Left,
        Right,
    }

    impl Actions for RandomWalkAction {
        fn all() -> &'static [RandomWalkAction] {
            &[RandomWalkAction::Left, RandomWalkAction::Right]
        }
    }

    fn random_walk_next_state(
        state: RandomWalkState,
        action: RandomWalkAction,
    ) -> Transition<RandomWalkState> {
        use RandomWalkAction as A;
        use RandomWalkState as S;

        let (next_state, reward, terminal) = match (action, state) {
            (A::Left, S::A) => (S::A, 0.0, true),
            (A::Left, S::B) => (S::A, 0.0, false),
            (A::Left, S::C) => (S::B, 0.0, false),
            (A::Left, S::D) => (S::C, 0.0, false),
            (A::Left, S::E) => (S::D, 0.0, false),
            (A::Right, S::A) => (S::B, 0.0, false),
            (A::Right, S::B) => (S::C, 0.0, false),
            (A::Right, S::C) => (S::D, 0.0, false),
            (A::Right, S::D) => (S::E, 0.0, false),
            (A::Right, S::E) => (S::E, 1.0, true),
        };
        Transition {
            next_state,
            reward,
            terminal,
        }
    }

    #[test]
    fn terminal_update_test() {
        let mut table: ValueTable<u8, RandomWalkAction> = ValueTable::new();
        let updater = QLearning::new(0.1, 0.9);
        let transition = Transition {
            next_state: 2,
            reward: -1.0,
            terminal: true,
        };

        let delta = updater.update(&mut table, &1, RandomWalkAction::Left, &transition);

        assert!((delta + 0.1).abs() < 1e-12);
        assert!((table.value_of(&1, RandomWalkAction::Left) + 0.1).abs() < 1e-12);
        assert_eq!(table.value_of(&1, RandomWalkAction::Right), 0.0);
        assert!(table.contains(&2));
    }

    #[test]
    fn bootstrapped_update_test() {
        let mut table: ValueTable<u8, RandomWalkAction> = ValueTable::new();
        table.set_value(&2, RandomWalkAction::Left, 0.2);
        table.set_value(&2, RandomWalkAction::Right, 0.5);

        let updater = QLearning::new(0.1, 0.9);
        let transition = Transition {
            next_state: 2,
            reward: 0.25,
            terminal: false,
        };
        updater.update(&mut table, &1, RandomWalkAction::Right, &transition);

        let expected = 0.1 * (0.25 + 0.9 * 0.5);
        assert!((table.value_of(&1, RandomWalkAction::Right) - expected).abs() < 1e-12);

        // Successor values are read, not written.
        assert_eq!(table.value_of(&2, RandomWalkAction::Right), 0.5);
    }

    #[test]
    fn q_learning_random_walk_test() {
        use RandomWalkAction as A;
        use RandomWalkState as S;

        let mut rng = StdRng::seed_from_u64(42);
        let mut table = ValueTable::new();
        let policy = EpsilonGreedy::new(1.0); // Make it a random behaviour policy.
        let updater = QLearning::new(0.1, 0.9);

        for _ in 0..10000 {
            // Generate a single episode.
            let mut state = S::C;
            loop {
                let action = policy.choose(&mut table, &state, &mut rng);
                let transition = random_walk_next_state(state, action);
                updater.update(&mut table, &state, action, &transition);
                if transition.terminal {
                    break;
                }
                state = transition.next_state;
            }
        }

        // Q-learning is off-policy: despite random behaviour it learns the values of always
        // going right, i.e. γ^k for a state k steps away from E.
        let expected_right_values = [
            (S::A, 0.6561),
            (S::B, 0.729),
            (S::C, 0.81),
            (S::D, 0.9),
            (S::E, 1.0),
        ];
        for (state, expected) in expected_right_values.iter() {
            let right = table.value_of(state, A::Right);
            println!("State {:?} R: {:.03} (expected {:.03})", state, right, expected);
            assert!((right - expected).abs() < 1e-2);
            assert_eq!(table.best_action(state), A::Right);
        }
        assert_eq!(table.value_of(&S::A, A::Left), 0.0);
    }
}
