//! Data models for the vocabulary quiz.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ranks present in the catalog, lowest first.
pub const RANKS: [u8; 4] = [1, 2, 3, 4];

/// Highest memory level a word can reach.
pub const MAX_LEVEL: u8 = 3;

/// A vocabulary word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyEntry {
    /// The word itself. Identifies the entry.
    pub word: String,
    /// Meaning shown as an answer option.
    pub meaning: String,
    /// Difficulty tier, 1 to 4.
    pub rank: u8,
}

impl VocabularyEntry {
    /// Create a new entry.
    pub fn new(word: impl Into<String>, meaning: impl Into<String>, rank: u8) -> Self {
        Self {
            word: word.into(),
            meaning: meaning.into(),
            rank,
        }
    }

    /// Whether both entries name the same word.
    pub fn same_word(&self, other: &VocabularyEntry) -> bool {
        self.word == other.word
    }
}

/// Rank restriction for a session or a word list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawRank", into = "RawRank")]
pub enum RankFilter {
    /// No restriction.
    All,
    /// Only words of this rank.
    Rank(u8),
}

impl RankFilter {
    /// Filters offered on the home screen.
    pub fn choices() -> Vec<RankFilter> {
        let mut choices = vec![RankFilter::All];
        choices.extend(RANKS.iter().map(|r| RankFilter::Rank(*r)));
        choices
    }

    /// Whether an entry passes the filter.
    pub fn matches(&self, entry: &VocabularyEntry) -> bool {
        match self {
            Self::All => true,
            Self::Rank(rank) => entry.rank == *rank,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    /// Label used in lists and titles.
    pub fn label(&self) -> String {
        match self {
            Self::All => "All Ranks".to_string(),
            Self::Rank(rank) => format!("Rank {}", rank),
        }
    }
}

impl fmt::Display for RankFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Rank(rank) => write!(f, "{}", rank),
        }
    }
}

impl FromStr for RankFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        s.parse::<u8>()
            .map(Self::Rank)
            .map_err(|_| format!("invalid rank filter: {}", s))
    }
}

/// Persisted shape of a rank filter: the string "all" or a bare integer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawRank {
    Number(u8),
    Text(String),
}

impl TryFrom<RawRank> for RankFilter {
    type Error = String;

    fn try_from(raw: RawRank) -> Result<Self, Self::Error> {
        match raw {
            RawRank::Number(rank) => Ok(RankFilter::Rank(rank)),
            RawRank::Text(text) => text.parse(),
        }
    }
}

impl From<RankFilter> for RawRank {
    fn from(filter: RankFilter) -> Self {
        match filter {
            RankFilter::All => RawRank::Text("all".to_string()),
            RankFilter::Rank(rank) => RawRank::Number(rank),
        }
    }
}

/// Outcome of one finished session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionResult {
    /// When the session finished.
    pub date: DateTime<Utc>,
    /// Filter the session ran with.
    pub rank: RankFilter,
    /// Correct answers.
    pub score: u32,
    /// Questions in the session.
    pub total: u32,
}

impl SessionResult {
    /// Result stamped with the current time, at millisecond precision.
    pub fn new(rank: RankFilter, score: u32, total: u32) -> Self {
        Self {
            date: Utc::now().trunc_subsecs(3),
            rank,
            score,
            total,
        }
    }

    pub fn is_perfect(&self) -> bool {
        self.score == self.total
    }
}

/// A question answered incorrectly, kept for the review list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrongAnswer {
    pub word: String,
    pub meaning: String,
}

impl From<&VocabularyEntry> for WrongAnswer {
    fn from(entry: &VocabularyEntry) -> Self {
        Self {
            word: entry.word.clone(),
            meaning: entry.meaning.clone(),
        }
    }
}

/// Mastery summary for one rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RankStats {
    pub rank: u8,
    /// Words of this rank in the catalog.
    pub total: usize,
    /// Words at the maximum memory level.
    pub mastered: usize,
    /// Rounded share of mastered words, 0 to 100.
    pub percentage: u32,
}
