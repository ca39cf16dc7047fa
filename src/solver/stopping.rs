use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

// When a training run ends. Every rule is additionally capped by the configured episode count.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum StoppingRule {
    // Run exactly up to the episode cap.
    Episodes,
    // Stop after a reporting window whose mean absolute update falls below `threshold`.
    Converged { threshold: f64 },
    // Stop once `seconds` of wall-clock time have passed.
    Budget { seconds: u64 },
}

impl Default for StoppingRule {
    fn default() -> Self {
        StoppingRule::Episodes
    }
}

impl StoppingRule {
    pub fn should_stop(&self, progress: &Progress, max_episodes: u64) -> bool {
        if progress.episodes() >= max_episodes {
            return true;
        }
        match self {
            StoppingRule::Episodes => false,
            StoppingRule::Converged { threshold } => progress
                .last_window()
                .map_or(false, |window| window.mean_delta < *threshold),
            StoppingRule::Budget { seconds } => {
                progress.elapsed() >= Duration::from_secs(*seconds)
            }
        }
    }
}

// Statistics over one completed reporting window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WindowSummary {
    // Episodes completed at the end of the window.
    pub episodes: u64,
    pub mean_reward: f64,
    // Mean absolute change applied per update.
    pub mean_delta: f64,
}

// Running account of a training loop, aggregated in fixed-size windows of episodes.
#[derive(Clone, Debug)]
pub struct Progress {
    started: Instant,
    window: u64,
    episodes: u64,
    reward_sum: f64,
    delta_sum: f64,
    updates: u64,
    last_window: Option<WindowSummary>,
}

impl Progress {
    pub fn new(window: u64) -> Self {
        Progress {
            started: Instant::now(),
            window: window.max(1),
            episodes: 0,
            reward_sum: 0.0,
            delta_sum: 0.0,
            updates: 0,
            last_window: None,
        }
    }

    // Accounts for one finished episode. Returns the window summary when this episode closes one.
    pub fn record(&mut self, reward: f64, delta_sum: f64, updates: u64) -> Option<WindowSummary> {
        self.episodes += 1;
        self.reward_sum += reward;
        self.delta_sum += delta_sum;
        self.updates += updates;

        if self.episodes % self.window != 0 {
            return None;
        }

        let summary = WindowSummary {
            episodes: self.episodes,
            mean_reward: self.reward_sum / self.window as f64,
            mean_delta: if self.updates == 0 {
                0.0
            } else {
                self.delta_sum / self.updates as f64
            },
        };
        self.reward_sum = 0.0;
        self.delta_sum = 0.0;
        self.updates = 0;
        self.last_window = Some(summary);
        Some(summary)
    }

    pub fn episodes(&self) -> u64 {
        self.episodes
    }

    pub fn last_window(&self) -> Option<WindowSummary> {
        self.last_window
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}
