mod blackjack;
mod config;
mod error;
mod solver;

use std::io;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rand::prelude::*;

use blackjack::episode::{evaluate, stick_at_20_policy, train};
use blackjack::play::{drill, versus};
use blackjack::render::{print_learning_curve, print_policy};
use blackjack::strategy::Strategy;
use blackjack::{Action, Card, InfiniteDeck, StateKey};
use config::TrainingConfig;
use error::Error;

/// Learns when to hit and when to stand in Blackjack with tabular Q-learning.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Train a strategy and save it (the default)
    Train {
        /// JSON file with training settings
        #[arg(long)]
        config: Option<PathBuf>,
        /// Override the episode cap
        #[arg(long)]
        episodes: Option<u64>,
        /// Override where the strategy is written
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print the policy grid of a saved strategy
    Show {
        #[arg(default_value = "q_table.json")]
        path: PathBuf,
    },
    /// Recommend an action for one hand
    Advise {
        /// Player total
        total: u32,
        /// Dealer upcard, 1 for an Ace
        dealer: u8,
        /// The player holds an Ace counted as 11
        #[arg(long)]
        soft: bool,
        #[arg(long, default_value = "q_table.json")]
        path: PathBuf,
    },
    /// Practice decisions: answer hit or stand and get graded against a saved strategy
    Drill {
        #[arg(long, default_value = "q_table.json")]
        path: PathBuf,
        /// Seed for dealing; entropy when absent
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Play hands against the dealer
    Versus {
        /// Saved strategy whose advice is shown before every decision
        #[arg(long)]
        advisor: Option<PathBuf>,
        /// Seed for dealing; entropy when absent
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn seeded_deck(seed: Option<u64>) -> InfiniteDeck<StdRng> {
    InfiniteDeck::new(match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    })
}

fn run_training(
    config: Option<PathBuf>,
    episodes: Option<u64>,
    output: Option<PathBuf>,
) -> Result<(), Error> {
    let mut config = match config {
        Some(path) => TrainingConfig::load(path)?,
        None => TrainingConfig::default(),
    };
    if let Some(episodes) = episodes {
        config.episodes = episodes;
    }
    if let Some(output) = output {
        config.output = output;
    }
    config.validate()?;

    let training = train(&config);
    let strategy = Strategy::from(&training.table);
    log::info!(
        "learned {} states over {} episodes",
        strategy.len(),
        training.episodes
    );
    strategy.save(&config.output)?;

    // Compare the learned policy against the naive one.
    let mut deck = seeded_deck(config.seed.map(|seed| seed.wrapping_add(2)));
    let learned_policy = |state: &StateKey| strategy.best_action(state).unwrap_or(Action::Stand);
    let optimal_returns = evaluate(&learned_policy, &mut deck, config.evaluation_hands);
    let naive_returns = evaluate(&stick_at_20_policy, &mut deck, config.evaluation_hands);
    log::info!("Average naive returns: {:+.4}", naive_returns);
    log::info!("Average optimal returns: {:+.4}", optimal_returns);

    print_policy(&strategy);
    print_learning_curve(&training.curve)
}

fn run_advise(total: u32, dealer: u8, soft: bool, path: PathBuf) -> Result<(), Error> {
    let strategy = Strategy::load(path)?;
    let state = StateKey {
        player_total: total,
        dealer_upcard: Card::try_from(dealer)?,
        usable_ace: soft,
    };
    match strategy.get(&state) {
        Some(values) => {
            log::info!("{}: hit {:+.4}, stand {:+.4}", state, values.hit, values.stand);
            println!("{}", values.best());
        }
        None => println!("Unknown"),
    }
    Ok(())
}

fn run_drill(path: PathBuf, seed: Option<u64>) -> Result<(), Error> {
    let strategy = Strategy::load(path)?;
    let score = drill(
        &strategy,
        &mut seeded_deck(seed),
        &mut io::stdin().lock(),
        &mut io::stdout(),
    )?;
    log::info!(
        "drill finished: {} correct, {} wrong, {} without an entry",
        score.correct,
        score.wrong,
        score.unknown
    );
    Ok(())
}

fn run_versus(advisor: Option<PathBuf>, seed: Option<u64>) -> Result<(), Error> {
    let strategy = advisor.map(Strategy::load).transpose()?;
    let score = versus(
        strategy.as_ref(),
        &mut seeded_deck(seed),
        &mut io::stdin().lock(),
        &mut io::stdout(),
    )?;
    log::info!(
        "played {} hands, net result {:+}",
        score.rounds,
        score.total_reward
    );
    Ok(())
}

fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command.unwrap_or(Command::Train {
        config: None,
        episodes: None,
        output: None,
    }) {
        Command::Train {
            config,
            episodes,
            output,
        } => run_training(config, episodes, output),
        Command::Show { path } => {
            let strategy = Strategy::load(path)?;
            if strategy.is_empty() {
                log::warn!("strategy has no states");
            }
            print_policy(&strategy);
            Ok(())
        }
        Command::Advise {
            total,
            dealer,
            soft,
            path,
        } => run_advise(total, dealer, soft, path),
        Command::Drill { path, seed } => run_drill(path, seed),
        Command::Versus { advisor, seed } => run_versus(advisor, seed),
    }
}
