// The learned value table frozen into a persisted strategy. On disk it is one JSON object:
// { "(20, 5, False)": { "hit": -0.71, "stand": 0.66 }, ... }

use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::blackjack::{Action, StateKey};
use crate::error::Error;
use crate::solver::ValueTable;

// Estimates of both actions in one state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionValues {
    pub hit: f64,
    pub stand: f64,
}

impl ActionValues {
    // Hit only when it is strictly better.
    pub fn best(&self) -> Action {
        if self.hit > self.stand {
            Action::Hit
        } else {
            Action::Stand
        }
    }
}

// Read-only action values for every state seen in training, ordered by state.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Strategy {
    entries: BTreeMap<StateKey, ActionValues>,
}

impl From<&ValueTable<StateKey, Action>> for Strategy {
    fn from(table: &ValueTable<StateKey, Action>) -> Self {
        let entries = table
            .iter()
            .map(|(state, values)| {
                let value = |action: Action| values.get(&action).copied().unwrap_or(0.0);
                (
                    *state,
                    ActionValues {
                        hit: value(Action::Hit),
                        stand: value(Action::Stand),
                    },
                )
            })
            .collect();
        Strategy { entries }
    }
}

impl Strategy {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, state: &StateKey) -> Option<&ActionValues> {
        self.entries.get(state)
    }

    // Recommended action, or None when the state was never seen.
    pub fn best_action(&self, state: &StateKey) -> Option<Action> {
        self.entries.get(state).map(ActionValues::best)
    }

    pub fn to_writer<W: Write>(&self, writer: W) -> Result<(), Error> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, Error> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let path = path.as_ref();
        log::info!("{:<32}{:<32}", "saving strategy", path.display());
        let mut writer = BufWriter::new(File::create(path)?);
        self.to_writer(&mut writer)?;
        writer.flush()?;
        log::info!("{:<32}{:<32}", "saved states", self.len());
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        log::info!("{:<32}{:<32}", "loading strategy", path.display());
        let strategy = Self::from_reader(BufReader::new(File::open(path)?))?;
        log::info!("{:<32}{:<32}", "loaded states", strategy.len());
        Ok(strategy)
    }
}

impl Serialize for Strategy {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries.iter().map(|(k, v)| (k.to_string(), v)))
    }
}

impl<'de> Deserialize<'de> for Strategy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(StrategyVisitor)
    }
}

struct StrategyVisitor;

impl<'de> Visitor<'de> for StrategyVisitor {
    type Value = Strategy;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "a map from state keys to hit/stand values")
    }

    // Two spellings of one state, e.g. "(20,5,false)" and "(20, 5, False)", are an error.
    fn visit_map<M: MapAccess<'de>>(self, mut map: M) -> Result<Strategy, M::Error> {
        let mut entries = BTreeMap::new();
        while let Some((key, values)) = map.next_entry::<String, ActionValues>()? {
            let state = key.parse::<StateKey>().map_err(<M::Error as de::Error>::custom)?;
            if entries.insert(state, values).is_some() {
                return Err(<M::Error as de::Error>::custom(format!(
                    "duplicate state key {:?} (same state as {})",
                    key, state
                )));
            }
        }
        Ok(Strategy { entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::blackjack::episode::Agent;
    use crate::blackjack::tests::card;
    use crate::blackjack::InfiniteDeck;
    use crate::config::TrainingConfig;

    fn key(player_total: u32, dealer_upcard: u8, usable_ace: bool) -> StateKey {
        StateKey {
            player_total,
            dealer_upcard: card(dealer_upcard),
            usable_ace,
        }
    }

    fn trained_table() -> ValueTable<StateKey, Action> {
        let mut agent = Agent::from_config(&TrainingConfig::default());
        let mut deck = InfiniteDeck::new(StdRng::seed_from_u64(9));
        let mut rng = StdRng::seed_from_u64(10);
        for _ in 0..20000 {
            agent.play_episode(&mut deck, &mut rng);
        }
        agent.into_table()
    }

    #[test]
    fn export_test() {
        let mut table = ValueTable::new();
        table.set_value(&key(20, 5, false), Action::Stand, 0.5);
        table.touch(&key(13, 1, true));

        let strategy = Strategy::from(&table);
        assert_eq!(strategy.len(), 2);
        assert_eq!(
            strategy.get(&key(20, 5, false)),
            Some(&ActionValues {
                hit: 0.0,
                stand: 0.5
            })
        );
        assert_eq!(
            strategy.get(&key(13, 1, true)),
            Some(&ActionValues::default())
        );
    }

    #[test]
    fn json_format_test() {
        let mut table = ValueTable::new();
        table.set_value(&key(20, 5, false), Action::Hit, -0.5);
        table.set_value(&key(20, 5, false), Action::Stand, 0.25);

        let mut buffer = Vec::new();
        Strategy::from(&table).to_writer(&mut buffer).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&buffer).unwrap();

        assert_eq!(json["(20, 5, False)"]["hit"], -0.5);
        assert_eq!(json["(20, 5, False)"]["stand"], 0.25);
        assert_eq!(json.as_object().unwrap().len(), 1);
    }

    #[test]
    fn reads_tuple_key_format_test() {
        let json = r#"{
            "(18, 10, True)": {"hit": 0.125, "stand": -0.0625},
            "(12, 1, False)": {"hit": -0.3, "stand": -0.3}
        }"#;
        let strategy = Strategy::from_reader(json.as_bytes()).unwrap();

        assert_eq!(strategy.len(), 2);
        assert_eq!(strategy.best_action(&key(18, 10, true)), Some(Action::Hit));
        // Ties go to Stand.
        assert_eq!(strategy.best_action(&key(12, 1, false)), Some(Action::Stand));
        assert_eq!(strategy.best_action(&key(12, 2, false)), None);
    }

    #[test]
    fn rejects_malformed_key_test() {
        let json = r#"{"(18, 11, True)": {"hit": 0.1, "stand": 0.2}}"#;
        assert!(Strategy::from_reader(json.as_bytes()).is_err());

        let json = r#"{"(18, 10, True)": {"hit": 0.1}}"#;
        assert!(Strategy::from_reader(json.as_bytes()).is_err());
    }

    #[test]
    fn rejects_duplicate_key_test() {
        let json = r#"{
            "(20, 5, False)": {"hit": 0.9, "stand": 0.0},
            "(20,5,false)": {"hit": 0.0, "stand": 0.9}
        }"#;
        let err = Strategy::from_reader(json.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("duplicate state key"), "{}", err);

        let json = r#"{
            "(13, 1, True)": {"hit": 0.1, "stand": 0.2},
            "(13, 1, True)": {"hit": 0.3, "stand": 0.4}
        }"#;
        assert!(Strategy::from_reader(json.as_bytes()).is_err());
    }

    #[test]
    fn round_trip_test() {
        let table = trained_table();
        let strategy = Strategy::from(&table);
        assert_eq!(strategy.len(), table.len());

        let mut buffer = Vec::new();
        strategy.to_writer(&mut buffer).unwrap();
        let loaded = Strategy::from_reader(buffer.as_slice()).unwrap();
        assert_eq!(loaded, strategy);

        let mut again = Vec::new();
        loaded.to_writer(&mut again).unwrap();
        assert_eq!(again, buffer);
    }

    #[test]
    fn matches_table_greedy_action_test() {
        let table = trained_table();
        let strategy = Strategy::from(&table);
        for (state, _) in table.iter() {
            assert_eq!(strategy.best_action(state), table.greedy(state));
        }
    }

    #[test]
    fn save_and_load_test() {
        let path = std::env::temp_dir().join(format!("blackjack_q_{}.json", std::process::id()));
        let strategy = Strategy::from(&trained_table());

        strategy.save(&path).unwrap();
        let loaded = Strategy::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(loaded, strategy);
    }
}
