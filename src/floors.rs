//! Floor labels: tag tokens, physical rank and ordering.
//!
//! Floor names are free text ("Térreo", "3º Andar", "2º Subsolo", "Cobertura").
//! Lexicographic order puts "10º Andar" before "2º Andar", so listings sort by
//! a derived signed rank instead: ground floor is 0, numbered floors are
//! positive and basements negative.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use crate::text::{fold, normalize};

/// Token emitted for the ground floor.
pub const DEFAULT_GROUND_FLOOR_TOKEN: &str = "T";
/// Length of the token used when a floor name carries no number.
pub const DEFAULT_FLOOR_FALLBACK_LEN: usize = 3;

/// Folded labels recognised as the ground floor.
const GROUND_FLOOR_LABELS: &[&str] = &[
    "TERREO",
    "PAVIMENTO-TERREO",
    "PISO-TERREO",
    "GROUND",
    "GROUND-FLOOR",
];

/// Folded words marking a level below ground.
const BASEMENT_MARKERS: &[&str] = &["SUBSOLO", "BASEMENT"];

/// A leading minus only counts as a sign at the start of the label or after
/// whitespace; in "Bloco A-3º Andar" the hyphen is a separator.
static STANDALONE_LEVEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|\s)(-?\d+)").expect("standalone level pattern is valid"));

static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("digits pattern is valid"));

/// Signed physical level of a floor. Derived on demand, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FloorRank(i32);

impl FloorRank {
    pub const GROUND: FloorRank = FloorRank(0);

    pub fn new(level: i32) -> Self {
        Self(level)
    }

    pub fn value(self) -> i32 {
        self.0
    }
}

impl fmt::Display for FloorRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Direction used when listing the floors of one building.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FloorOrder {
    /// Highest floor first, basements last.
    #[default]
    TopDown,
    /// Deepest basement first.
    BottomUp,
}

/// Returns true when the label names the ground floor.
pub fn is_ground_floor(label: &str) -> bool {
    let folded = fold(label);
    GROUND_FLOOR_LABELS.contains(&folded.as_str())
}

fn is_basement_label(folded: &str) -> bool {
    folded
        .split(crate::text::SEPARATOR)
        .any(|word| BASEMENT_MARKERS.contains(&word))
}

/// Derives the physical rank of a floor label, or `None` when the label
/// carries neither a number nor a ground-floor name.
///
/// "2º Subsolo" and "-2" both rank as -2; "12º Andar" ranks as 12.
pub fn floor_rank(label: &str) -> Option<FloorRank> {
    if is_ground_floor(label) {
        return Some(FloorRank::GROUND);
    }

    let digits = match STANDALONE_LEVEL.captures(label).and_then(|caps| caps.get(1)) {
        Some(level) => level.as_str(),
        None => DIGITS.find(label)?.as_str(),
    };
    let level: i32 = digits.parse().ok()?;
    if level > 0 && is_basement_label(&fold(label)) {
        Some(FloorRank(-level))
    } else {
        Some(FloorRank(level))
    }
}

/// Rules for turning a floor name into the floor segment of an asset tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FloorTokenRules {
    pub ground_token: String,
    pub fallback_len: usize,
}

impl Default for FloorTokenRules {
    fn default() -> Self {
        Self {
            ground_token: DEFAULT_GROUND_FLOOR_TOKEN.to_string(),
            fallback_len: DEFAULT_FLOOR_FALLBACK_LEN,
        }
    }
}

impl FloorTokenRules {
    /// Ground floor maps to the fixed token, numbered floors to their signed
    /// level and anything else to the first normalized characters of the name.
    pub fn token(&self, floor_name: &str) -> String {
        if is_ground_floor(floor_name) {
            return self.ground_token.clone();
        }
        match floor_rank(floor_name) {
            Some(rank) => rank.to_string(),
            None => normalize(floor_name, self.fallback_len),
        }
    }
}

/// Floor token with the default rules.
pub fn floor_token(floor_name: &str) -> String {
    FloorTokenRules::default().token(floor_name)
}

fn compare_ranks(a: Option<FloorRank>, b: Option<FloorRank>, order: FloorOrder) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => match order {
            FloorOrder::TopDown => b.cmp(&a),
            FloorOrder::BottomUp => a.cmp(&b),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Top-down comparator over floor labels.
///
/// Unparseable labels compare greater than every ranked label and equal to
/// each other, so a stable sort keeps them last in input order.
pub fn compare_floors(a: &str, b: &str) -> Ordering {
    compare_floors_in(FloorOrder::TopDown, a, b)
}

/// Comparator for an explicit direction. Unranked labels stay last either way.
pub fn compare_floors_in(order: FloorOrder, a: &str, b: &str) -> Ordering {
    compare_ranks(floor_rank(a), floor_rank(b), order)
}

/// Stable in-place sort of floor-bearing items. Ranks are computed once per item.
pub fn sort_floors_by<T, F>(items: &mut [T], order: FloorOrder, label: F)
where
    F: Fn(&T) -> &str,
{
    items.sort_by_cached_key(|item| {
        let rank = floor_rank(label(item));
        let position = rank.map(|rank| match order {
            FloorOrder::TopDown => -i64::from(rank.value()),
            FloorOrder::BottomUp => i64::from(rank.value()),
        });
        (position.is_none(), position.unwrap_or_default())
    });
}

/// Convenience wrapper returning a sorted copy of plain labels.
pub fn sorted_floors<S: AsRef<str> + Clone>(labels: &[S], order: FloorOrder) -> Vec<S> {
    let mut sorted = labels.to_vec();
    sort_floors_by(&mut sorted, order, |label| label.as_ref());
    sorted
}
