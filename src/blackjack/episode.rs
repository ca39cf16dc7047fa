use rand::prelude::*;

use crate::blackjack::*;
use crate::config::TrainingConfig;
use crate::solver::*;

// Cards on the table right after the deal.
#[derive(Clone, Debug)]
pub struct Deal {
    pub player: Hand,
    pub dealer: Hand,
    // First dealer card; stays the same for the whole hand.
    pub upcard: Card,
}

#[derive(Clone, Debug, PartialEq)]
enum Phase {
    PlayerTurn(StateKey),
    Bust,
    Resolved(f64),
}

// What a single training hand produced.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EpisodeOutcome {
    pub reward: f64,
    pub updates: u64,
    // Sum of absolute changes applied to the table.
    pub delta: f64,
}

// The learner: value table plus the behaviour and update rules applied to it.
pub struct Agent {
    table: ValueTable<StateKey, Action>,
    policy: EpsilonGreedy,
    updater: QLearning,
}

// A finished training run.
pub struct Training {
    pub table: ValueTable<StateKey, Action>,
    pub curve: Vec<WindowSummary>,
    pub episodes: u64,
}

// Two cards each, player first.
pub fn deal<D: CardSource>(deck: &mut D) -> Deal {
    let player = Hand::from_cards(&[deck.draw(), deck.draw()]);
    let upcard = deck.draw();
    let dealer = Hand::from_cards(&[upcard, deck.draw()]);
    Deal {
        player,
        dealer,
        upcard,
    }
}

impl Agent {
    pub fn new(policy: EpsilonGreedy, updater: QLearning) -> Self {
        Agent {
            table: ValueTable::new(),
            policy,
            updater,
        }
    }

    pub fn from_config(config: &TrainingConfig) -> Self {
        Self::new(
            EpsilonGreedy::new(config.epsilon),
            QLearning::new(config.alpha, config.discount),
        )
    }

    pub fn table(&self) -> &ValueTable<StateKey, Action> {
        &self.table
    }

    #[cfg(test)]
    pub fn table_mut(&mut self) -> &mut ValueTable<StateKey, Action> {
        &mut self.table
    }

    pub fn into_table(self) -> ValueTable<StateKey, Action> {
        self.table
    }

    // Plays one hand from the deal to its reward, learning after every step.
    // The deck deals the cards, the rng drives exploration.
    pub fn play_episode<D: CardSource, R: Rng>(
        &mut self,
        deck: &mut D,
        rng: &mut R,
    ) -> EpisodeOutcome {
        let mut outcome = EpisodeOutcome::default();

        // Start: deal and observe the first state.
        let Deal {
            mut player,
            mut dealer,
            upcard,
        } = deal(deck);
        let mut phase = Phase::PlayerTurn(StateKey::new(&player, upcard));

        loop {
            phase = match phase {
                Phase::PlayerTurn(state) => {
                    let action = self.policy.choose(&mut self.table, &state, rng);
                    let (transition, next_phase) = match action {
                        Action::Hit => {
                            player.add_random_card(deck);
                            let next_state = StateKey::new(&player, upcard);
                            if player.is_bust() {
                                (
                                    Transition {
                                        next_state,
                                        reward: -1.0,
                                        terminal: true,
                                    },
                                    Phase::Bust,
                                )
                            } else {
                                (
                                    Transition {
                                        next_state,
                                        reward: 0.0,
                                        terminal: false,
                                    },
                                    Phase::PlayerTurn(next_state),
                                )
                            }
                        }
                        Action::Stand => {
                            dealer_play(&mut dealer, deck);
                            let r = reward(player.total(), dealer.total());
                            (
                                Transition {
                                    next_state: state,
                                    reward: r,
                                    terminal: true,
                                },
                                Phase::Resolved(r),
                            )
                        }
                    };

                    let delta = self
                        .updater
                        .update(&mut self.table, &state, action, &transition);
                    outcome.updates += 1;
                    outcome.delta += delta.abs();
                    next_phase
                }
                Phase::Bust => {
                    outcome.reward = -1.0;
                    break;
                }
                Phase::Resolved(r) => {
                    outcome.reward = r;
                    break;
                }
            };
        }

        outcome
    }
}

// Runs episodes until the configured stopping rule fires.
pub fn train(config: &TrainingConfig) -> Training {
    let (mut deck, mut rng) = match config.seed {
        Some(seed) => (
            InfiniteDeck::new(StdRng::seed_from_u64(seed)),
            StdRng::seed_from_u64(seed.wrapping_add(1)),
        ),
        None => (
            InfiniteDeck::new(StdRng::from_entropy()),
            StdRng::from_entropy(),
        ),
    };

    log::info!(
        "training up to {} episodes (α = {}, γ = {}, ε = {}, stopping: {:?})",
        config.episodes,
        config.alpha,
        config.discount,
        config.epsilon,
        config.stopping
    );

    let mut agent = Agent::from_config(config);
    let mut progress = Progress::new(config.report_every);
    let mut curve = Vec::new();

    while !config.stopping.should_stop(&progress, config.episodes) {
        let outcome = agent.play_episode(&mut deck, &mut rng);
        if let Some(window) = progress.record(outcome.reward, outcome.delta, outcome.updates) {
            log::info!(
                "episode {:>10} complete  mean reward {:+.4}  mean |Δ| {:.6}  states {}",
                window.episodes,
                window.mean_reward,
                window.mean_delta,
                agent.table().len()
            );
            curve.push(window);
        }
    }

    log::info!(
        "training finished after {} episodes in {:.1?}",
        progress.episodes(),
        progress.elapsed()
    );

    Training {
        table: agent.into_table(),
        curve,
        episodes: progress.episodes(),
    }
}

// Plays one hand under a fixed policy without learning and returns its reward.
pub fn run_simulation<D, P>(policy: &P, deck: &mut D) -> f64
where
    D: CardSource,
    P: Fn(&StateKey) -> Action,
{
    let Deal {
        mut player,
        mut dealer,
        upcard,
    } = deal(deck);

    loop {
        match policy(&StateKey::new(&player, upcard)) {
            Action::Hit => {
                player.add_random_card(deck);
                if player.is_bust() {
                    return -1.0;
                }
            }
            Action::Stand => {
                dealer_play(&mut dealer, deck);
                return reward(player.total(), dealer.total());
            }
        }
    }
}

// Average reward of a fixed policy over the given number of hands.
pub fn evaluate<D, P>(policy: &P, deck: &mut D, hands: u64) -> f64
where
    D: CardSource,
    P: Fn(&StateKey) -> Action,
{
    if hands == 0 {
        return 0.0;
    }
    let total: f64 = (0..hands).map(|_| run_simulation(policy, deck)).sum();
    total / hands as f64
}

// A policy that only sticks on 20 or higher.
pub fn stick_at_20_policy(state: &StateKey) -> Action {
    if state.player_total < 20 {
        Action::Hit
    } else {
        Action::Stand
    }
}
