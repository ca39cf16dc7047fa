use rand::Rng;

use crate::solver::*;

// ε-greedy behaviour policy over a value table.
#[derive(Clone, Copy, Debug)]
pub struct EpsilonGreedy {
    exploration_fraction: f64,
}

impl EpsilonGreedy {
    pub fn new(exploration_fraction: f64) -> Self {
        EpsilonGreedy {
            exploration_fraction,
        }
    }

    // With probability ε picks an action uniformly at random, otherwise the greedy one.
    // Either way the state ends up in the table.
    pub fn choose<S, A, R>(&self, table: &mut ValueTable<S, A>, state: &S, rng: &mut R) -> A
    where
        S: Eq + Hash + Clone,
        A: Actions,
        R: Rng,
    {
        if rng.gen::<f64>() < self.exploration_fraction {
            table.touch(state);
            let all = A::all();
            all[rng.gen_range(0..all.len())]
        } else {
            table.best_action(state)
        }
    }
}
