use std::ops::RangeInclusive;

use plotlib::{
    page::Page,
    repr::Plot,
    style::{PointMarker, PointStyle},
    view::ContinuousView,
};
use prettytable::{Cell, Row, Table};

use crate::blackjack::strategy::Strategy;
use crate::blackjack::{Action, Card, StateKey};
use crate::error::Error;
use crate::solver::WindowSummary;

pub const HARD_TOTALS: RangeInclusive<u32> = 3..=21;
pub const SOFT_TOTALS: RangeInclusive<u32> = 12..=21;

const MISSING: &str = "-";

// Dealer upcards in display order; the Ace goes last, in the place of an 11.
pub fn dealer_columns() -> Vec<Card> {
    (2..=10)
        .map(Card)
        .chain(std::iter::once(Card::ACE))
        .collect()
}

// Best action for every (player total, dealer upcard) pair, None where the strategy has no data.
pub fn policy_grid(
    strategy: &Strategy,
    usable_ace: bool,
    totals: RangeInclusive<u32>,
) -> Vec<(u32, Vec<Option<Action>>)> {
    let columns = dealer_columns();
    totals
        .map(|player_total| {
            let row = columns
                .iter()
                .map(|dealer_upcard| {
                    strategy.best_action(&StateKey {
                        player_total,
                        dealer_upcard: *dealer_upcard,
                        usable_ace,
                    })
                })
                .collect();
            (player_total, row)
        })
        .collect()
}

fn action_cell(action: Option<Action>) -> Cell {
    match action {
        Some(Action::Hit) => Cell::new("H").style_spec("Fr"),
        Some(Action::Stand) => Cell::new("S").style_spec("Fg"),
        None => Cell::new(MISSING),
    }
}

pub fn policy_table(strategy: &Strategy, usable_ace: bool) -> Table {
    let totals = if usable_ace { SOFT_TOTALS } else { HARD_TOTALS };

    let mut table = Table::new();

    // Print header.
    let mut header = Vec::new();
    header.push(Cell::new(""));
    header.push(Cell::new("Ace?"));
    for dealer_card in dealer_columns().iter() {
        header.push(Cell::new(&dealer_card.to_string()));
    }
    table.add_row(Row::new(header));

    for (player_total, actions) in policy_grid(strategy, usable_ace, totals) {
        let mut cells = Vec::new();
        cells.push(Cell::new(&format!("{}", player_total)));
        cells.push(Cell::new(match usable_ace {
            true => "Y",
            false => "N",
        }));
        cells.extend(actions.into_iter().map(action_cell));
        table.add_row(Row::new(cells));
    }
    table
}

pub fn print_policy(strategy: &Strategy) {
    println!("Hard totals (H = hit, S = stand, {} = no data)", MISSING);
    policy_table(strategy, false).printstd();
    println!("Soft totals");
    policy_table(strategy, true).printstd();
}

// Mean reward per reporting window as a text plot.
pub fn print_learning_curve(curve: &[WindowSummary]) -> Result<(), Error> {
    if curve.is_empty() {
        return Ok(());
    }

    let values: Vec<(f64, f64)> = curve
        .iter()
        .map(|w| (w.episodes as f64, w.mean_reward))
        .collect();
    let s1 = Plot::new(values).point_style(PointStyle::new().marker(PointMarker::Circle));
    let v = ContinuousView::new()
        .add(s1)
        .x_label("Episodes")
        .y_label("Mean reward");
    let text = Page::single(&v)
        .dimensions(100, 30)
        .to_text()
        .map_err(|e| Error::Plot(e.to_string()))?;
    println!("{}", text);
    Ok(())
}
