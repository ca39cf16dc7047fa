use std::fmt;
use std::str::FromStr;

use rand::prelude::*;

use crate::error::Error;
use crate::solver::Actions;

pub mod episode;
pub mod play;
pub mod render;
pub mod strategy;

// Card values in a single pack: an Ace counts as 1 and the four ten-valued ranks as 10.
const RANKS: [u8; 13] = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 10, 10, 10];

// Dealer draws until reaching this total.
const DEALER_STANDS_AT: u32 = 17;

const BLACKJACK: u32 = 21;

// A card value in 1..=10, where 1 is an Ace and 10 is any ten-valued card.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Card(u8);

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Action {
    Hit,
    Stand,
}

// The cards of one participant, in the order they were dealt.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Hand {
    cards: Vec<Card>,
}

// What the learner sees: player total, dealer's upcard and whether an Ace counts as 11.
// Hands with different cards but the same key are indistinguishable.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct StateKey {
    pub player_total: u32,
    pub dealer_upcard: Card,
    pub usable_ace: bool,
}

// Something cards can be drawn from.
pub trait CardSource {
    fn draw(&mut self) -> Card;
}

// An effectively infinite deck: every draw is independent, with a ten-valued card four times as
// likely as any other value.
pub struct InfiniteDeck<R: Rng> {
    rng: R,
}

impl Card {
    pub const ACE: Card = Card(1);

    pub fn value(&self) -> u32 {
        self.0 as u32
    }

    pub fn is_ace(&self) -> bool {
        self.0 == 1
    }
}

impl TryFrom<u8> for Card {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1..=10 => Ok(Card(value)),
            _ => Err(Error::Card(value)),
        }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            1 => write!(f, "A"),
            v => write!(f, "{}", v),
        }
    }
}

impl Actions for Action {
    // Stand wins exact ties, so unseen states default to standing.
    fn all() -> &'static [Action] {
        &[Action::Stand, Action::Hit]
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Hit => write!(f, "Hit"),
            Action::Stand => write!(f, "Stand"),
        }
    }
}

impl Hand {
    pub fn from_cards(cards: &[Card]) -> Hand {
        Hand {
            cards: cards.to_vec(),
        }
    }

    pub fn add_card(&mut self, card: Card) {
        self.cards.push(card);
    }

    pub fn add_random_card<D: CardSource>(&mut self, deck: &mut D) {
        self.add_card(deck.draw());
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    // Hard sum, every Ace counted as 1.
    pub fn sum(&self) -> u32 {
        self.cards.iter().map(Card::value).sum()
    }

    pub fn usable_ace(&self) -> bool {
        self.cards.iter().any(Card::is_ace) && self.sum() + 10 <= BLACKJACK
    }

    // Soft total if an Ace can count as 11, hard total otherwise.
    pub fn total(&self) -> u32 {
        if self.usable_ace() {
            self.sum() + 10
        } else {
            self.sum()
        }
    }

    pub fn is_bust(&self) -> bool {
        self.total() > BLACKJACK
    }
}

impl StateKey {
    pub fn new(player: &Hand, dealer_upcard: Card) -> StateKey {
        StateKey {
            player_total: player.total(),
            dealer_upcard,
            usable_ace: player.usable_ace(),
        }
    }
}

// Renders as "(20, 5, False)", the key format of persisted strategies.
impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {})",
            self.player_total,
            self.dealer_upcard.value(),
            if self.usable_ace { "True" } else { "False" }
        )
    }
}

impl FromStr for StateKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::StateKey(s.to_string());

        let inner = s
            .trim()
            .strip_prefix('(')
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(invalid)?;
        let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
        if parts.len() != 3 {
            return Err(invalid());
        }

        let player_total = digits::<u32>(parts[0]).ok_or_else(invalid)?;
        let dealer_upcard = digits::<u8>(parts[1])
            .and_then(|v| Card::try_from(v).ok())
            .ok_or_else(invalid)?;
        let usable_ace = match parts[2] {
            "True" | "true" => true,
            "False" | "false" => false,
            _ => return Err(invalid()),
        };

        Ok(StateKey {
            player_total,
            dealer_upcard,
            usable_ace,
        })
    }
}

// Plain decimal digits only; `str::parse` would also take a leading '+'.
fn digits<T: FromStr>(s: &str) -> Option<T> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

impl<R: Rng> InfiniteDeck<R> {
    pub fn new(rng: R) -> Self {
        InfiniteDeck { rng }
    }
}

impl<R: Rng> CardSource for InfiniteDeck<R> {
    fn draw(&mut self) -> Card {
        Card(RANKS[self.rng.gen_range(0..RANKS.len())])
    }
}

// Dealer takes cards until reaching 17 (soft or hard), bust or not.
pub fn dealer_play<D: CardSource>(dealer: &mut Hand, deck: &mut D) {
    while dealer.total() < DEALER_STANDS_AT {
        dealer.add_random_card(deck);
    }
}

// Reward of a finished hand from the player's point of view.
pub fn reward(player_total: u32, dealer_total: u32) -> f64 {
    if player_total > BLACKJACK {
        -1.0
    } else if dealer_total > BLACKJACK || player_total > dealer_total {
        1.0
    } else if player_total == dealer_total {
        0.0
    } else {
        -1.0
    }
}
