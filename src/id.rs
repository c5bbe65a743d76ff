//! Code for handling IDs
use std::cmp::Ordering;

macro_rules! define_id_type {
    ($name:ident) => {
        #[derive(
            Clone, std::hash::Hash, PartialEq, Eq, serde::Deserialize, Debug, serde::Serialize,
        )]
        /// An ID type (e.g. `ScenarioID`)
        pub struct $name(pub std::rc::Rc<str>);

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                $name(std::rc::Rc::from(s))
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                $name(std::rc::Rc::from(s))
            }
        }

        impl $name {
            /// Create a new ID from a string slice
            pub fn new(id: &str) -> Self {
                $name(std::rc::Rc::from(id))
            }
        }
    };
}

define_id_type!(ScenarioID);

impl Ord for ScenarioID {
    /// Numeric IDs sort numerically and before any non-numeric IDs, which sort lexically
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.0.parse::<u64>(), other.0.parse::<u64>()) {
            (Ok(a), Ok(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Ok(_), Err(_)) => Ordering::Less,
            (Err(_), Ok(_)) => Ordering::Greater,
            (Err(_), Err(_)) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for ScenarioID {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::Itertools;

    #[test]
    fn test_scenario_id_ordering() {
        let ids = ["10", "b", "2", "a", "1"]
            .into_iter()
            .map(ScenarioID::from)
            .sorted()
            .collect_vec();
        let ids = ids.iter().map(ToString::to_string).collect_vec();
        assert_eq!(ids, ["1", "2", "10", "a", "b"]);
    }

    #[test]
    fn test_scenario_id_leading_zeros() {
        // Distinct IDs never compare equal, even if their numeric values match
        let a = ScenarioID::from("01");
        let b = ScenarioID::from("1");
        assert_ne!(a.cmp(&b), Ordering::Equal);
    }
}
