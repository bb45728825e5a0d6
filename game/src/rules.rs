use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Choice {
    Rock,
    Paper,
    Scissors,
    Lizard,
    Spock,
}

impl Choice {
    /// Every choice in button order.
    pub const ALL: [Self; 5] = [
        Self::Rock,
        Self::Paper,
        Self::Scissors,
        Self::Lizard,
        Self::Spock,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn random(rng: &mut impl Rng) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Rock => "Rock",
            Self::Paper => "Paper",
            Self::Scissors => "Scissors",
            Self::Lizard => "Lizard",
            Self::Spock => "Spock",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Win,
    Tie,
    Loss,
}

impl Outcome {
    /// 1 for a win, 0 for a tie, -1 for a loss.
    pub const fn score(self) -> i8 {
        match self {
            Self::Win => 1,
            Self::Tie => 0,
            Self::Loss => -1,
        }
    }

    /// The same round seen from the other side.
    pub const fn reversed(self) -> Self {
        match self {
            Self::Win => Self::Loss,
            Self::Tie => Self::Tie,
            Self::Loss => Self::Win,
        }
    }
}

// Row: first player, column: second player, in `Choice::ALL` order.
const TABLE: [[i8; 5]; 5] = [
    [0, -1, 1, 1, -1],
    [1, 0, -1, -1, 1],
    [-1, 1, 0, 1, -1],
    [-1, 1, -1, 0, 1],
    [1, -1, 1, -1, 0],
];

/// Result of a round for the player who picked `first`.
pub const fn outcome(first: Choice, second: Choice) -> Outcome {
    match TABLE[first.index()][second.index()] {
        1 => Outcome::Win,
        0 => Outcome::Tie,
        _ => Outcome::Loss,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn table_is_antisymmetric() {
        for a in Choice::ALL {
            for b in Choice::ALL {
                assert_eq!(outcome(a, b), outcome(b, a).reversed(), "{a} vs {b}");
            }
        }
    }

    #[test]
    fn every_choice_beats_two_others() {
        for a in Choice::ALL {
            let wins = Choice::ALL
                .iter()
                .filter(|b| outcome(a, **b) == Outcome::Win)
                .count();
            assert_eq!(wins, 2, "{a}");
            assert_eq!(outcome(a, a), Outcome::Tie);
        }
    }

    #[test]
    fn classic_rules() {
        use Choice::{Lizard, Paper, Rock, Scissors, Spock};
        // scissors cuts paper, paper covers rock, rock crushes lizard,
        // lizard poisons Spock, Spock smashes scissors, scissors decapitates
        // lizard, lizard eats paper, paper disproves Spock, Spock vaporizes
        // rock, rock crushes scissors
        let wins = [
            (Scissors, Paper),
            (Paper, Rock),
            (Rock, Lizard),
            (Lizard, Spock),
            (Spock, Scissors),
            (Scissors, Lizard),
            (Lizard, Paper),
            (Paper, Spock),
            (Spock, Rock),
            (Rock, Scissors),
        ];
        for (winner, loser) in wins {
            assert_eq!(outcome(winner, loser), Outcome::Win);
        }
    }

    #[test]
    fn index_round_trip_and_random() {
        for choice in Choice::ALL {
            assert_eq!(Choice::from_index(choice.index()), Some(choice));
        }
        assert_eq!(Choice::from_index(5), None);

        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let choice = Choice::random(&mut rng);
            assert!(Choice::ALL.contains(&choice));
        }
    }
}
