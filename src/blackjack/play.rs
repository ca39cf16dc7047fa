use std::fmt;
use std::io::{BufRead, Write};

use crate::blackjack::episode::{deal, Deal};
use crate::blackjack::strategy::Strategy;
use crate::blackjack::*;
use crate::error::Error;

// How a drill answer compares with the saved strategy.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Grade {
    Correct(Action),
    Wrong(Action),
    Unknown,
}

// How a hand against the dealer ended.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RoundResult {
    Blackjack,
    PlayerBust,
    DealerBust,
    PlayerWins,
    DealerWins,
    Tie,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct DrillScore {
    pub correct: u32,
    pub wrong: u32,
    pub unknown: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct VersusScore {
    pub rounds: u32,
    pub total_reward: f64,
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Grade::Correct(best) => write!(f, "Correct! Optimal is: {}", best),
            Grade::Wrong(best) => write!(f, "Wrong! Optimal is: {}", best),
            Grade::Unknown => write!(f, "No Q-table entry for this state."),
        }
    }
}

impl fmt::Display for RoundResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            RoundResult::Blackjack => "Blackjack! You win.",
            RoundResult::PlayerBust => "You busted! Dealer wins.",
            RoundResult::DealerBust => "Dealer busted! You win.",
            RoundResult::PlayerWins => "You win!",
            RoundResult::DealerWins => "Dealer wins.",
            RoundResult::Tie => "It's a tie!",
        };
        write!(f, "{}", text)
    }
}

impl RoundResult {
    pub fn reward(&self) -> f64 {
        match self {
            RoundResult::Blackjack | RoundResult::DealerBust | RoundResult::PlayerWins => 1.0,
            RoundResult::Tie => 0.0,
            RoundResult::PlayerBust | RoundResult::DealerWins => -1.0,
        }
    }
}

// Compares an answer with the strategy's choice for the dealt state.
pub fn grade(strategy: &Strategy, state: &StateKey, answer: Action) -> Grade {
    match strategy.best_action(state) {
        None => Grade::Unknown,
        Some(best) if best == answer => Grade::Correct(best),
        Some(best) => Grade::Wrong(best),
    }
}

// Outcome once both hands are finished.
pub fn settle(player: &Hand, dealer: &Hand) -> RoundResult {
    let (p, d) = (player.total(), dealer.total());
    if player.is_bust() {
        RoundResult::PlayerBust
    } else if dealer.is_bust() {
        RoundResult::DealerBust
    } else if p > d {
        RoundResult::PlayerWins
    } else if d > p {
        RoundResult::DealerWins
    } else {
        RoundResult::Tie
    }
}

pub fn parse_answer(input: &str) -> Option<Action> {
    match input.trim().to_lowercase().as_str() {
        "h" | "hit" => Some(Action::Hit),
        "s" | "stand" => Some(Action::Stand),
        _ => None,
    }
}

// "A 6 (soft 17)"
pub fn describe(hand: &Hand) -> String {
    let cards: Vec<String> = hand.cards().iter().map(Card::to_string).collect();
    let kind = if hand.usable_ace() { "soft" } else { "hard" };
    format!("{} ({} {})", cards.join(" "), kind, hand.total())
}

// One line of input, or None at end of input or on "q".
fn read_line<B: BufRead, W: Write>(
    prompt: &str,
    input: &mut B,
    output: &mut W,
) -> Result<Option<String>, Error> {
    write!(output, "{}", prompt)?;
    output.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 || matches!(line.trim(), "q" | "quit") {
        return Ok(None);
    }
    Ok(Some(line))
}

// Waits for the player to ask for the next deal.
fn next_round<B: BufRead, W: Write>(input: &mut B, output: &mut W) -> Result<bool, Error> {
    Ok(read_line("Press enter to deal, q to quit: ", input, output)?.is_some())
}

// Prompts until a valid answer arrives.
fn read_action<B: BufRead, W: Write>(
    input: &mut B,
    output: &mut W,
) -> Result<Option<Action>, Error> {
    loop {
        let line = match read_line("[h]it or [s]tand? ", input, output)? {
            Some(line) => line,
            None => return Ok(None),
        };
        match parse_answer(&line) {
            Some(action) => return Ok(Some(action)),
            None => writeln!(output, "Please answer h or s (q to quit).")?,
        }
    }
}

// Deals one hand and grades the first decision. None when the player quits.
pub fn drill_round<D, B, W>(
    strategy: &Strategy,
    deck: &mut D,
    input: &mut B,
    output: &mut W,
) -> Result<Option<Grade>, Error>
where
    D: CardSource,
    B: BufRead,
    W: Write,
{
    let Deal {
        player,
        dealer,
        upcard,
    } = deal(deck);
    let state = StateKey::new(&player, upcard);

    writeln!(output, "Your hand:   {}", describe(&player))?;
    writeln!(output, "Dealer shows: {}", upcard)?;
    let answer = match read_action(input, output)? {
        Some(answer) => answer,
        None => return Ok(None),
    };

    let grade = grade(strategy, &state, answer);
    writeln!(output, "{}", grade)?;
    writeln!(output, "Dealer had:  {}", describe(&dealer))?;
    writeln!(output)?;
    Ok(Some(grade))
}

// Repeats drill rounds until the player quits.
pub fn drill<D, B, W>(
    strategy: &Strategy,
    deck: &mut D,
    input: &mut B,
    output: &mut W,
) -> Result<DrillScore, Error>
where
    D: CardSource,
    B: BufRead,
    W: Write,
{
    let mut score = DrillScore::default();
    while next_round(input, output)? {
        let grade = match drill_round(strategy, deck, input, output)? {
            Some(grade) => grade,
            None => break,
        };
        match grade {
            Grade::Correct(_) => score.correct += 1,
            Grade::Wrong(_) => score.wrong += 1,
            Grade::Unknown => score.unknown += 1,
        }
    }
    Ok(score)
}

// Plays one full hand against the dealer. When a strategy is given its advice is shown
// before every decision. None when the player quits mid-hand.
pub fn versus_round<D, B, W>(
    strategy: Option<&Strategy>,
    deck: &mut D,
    input: &mut B,
    output: &mut W,
) -> Result<Option<RoundResult>, Error>
where
    D: CardSource,
    B: BufRead,
    W: Write,
{
    let Deal {
        mut player,
        mut dealer,
        upcard,
    } = deal(deck);
    writeln!(output, "Dealer shows: {}", upcard)?;

    let result = loop {
        writeln!(output, "Your hand:   {}", describe(&player))?;
        if player.total() == BLACKJACK && player.cards().len() == 2 {
            break RoundResult::Blackjack;
        }
        if player.is_bust() {
            break RoundResult::PlayerBust;
        }
        let state = StateKey::new(&player, upcard);
        if let Some(best) = strategy.and_then(|s| s.best_action(&state)) {
            writeln!(output, "Advisor says: {}", best)?;
        }
        match read_action(input, output)? {
            None => return Ok(None),
            Some(Action::Hit) => player.add_random_card(deck),
            Some(Action::Stand) => {
                dealer_play(&mut dealer, deck);
                break settle(&player, &dealer);
            }
        }
    };

    writeln!(output, "Dealer had:  {}", describe(&dealer))?;
    writeln!(output, "{}", result)?;
    writeln!(output)?;
    Ok(Some(result))
}

pub fn versus<D, B, W>(
    strategy: Option<&Strategy>,
    deck: &mut D,
    input: &mut B,
    output: &mut W,
) -> Result<VersusScore, Error>
where
    D: CardSource,
    B: BufRead,
    W: Write,
{
    let mut score = VersusScore::default();
    while next_round(input, output)? {
        let result = match versus_round(strategy, deck, input, output)? {
            Some(result) => result,
            None => break,
        };
        score.rounds += 1;
        score.total_reward += result.reward();
    }
    Ok(score)
}
