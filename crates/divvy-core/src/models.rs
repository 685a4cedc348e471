//! Domain models for Divvy

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A person who shares costs. Members are global: the same member may
/// belong to any number of groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: String,
    pub name: String,
    pub email: String,
}

/// Coarse category tag on an expense group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GroupCategory {
    Dining,
    Transport,
    Household,
    Travel,
    #[default]
    Other,
}

impl GroupCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dining => "dining",
            Self::Transport => "transport",
            Self::Household => "household",
            Self::Travel => "travel",
            Self::Other => "other",
        }
    }
}

impl std::str::FromStr for GroupCategory {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dining" => Ok(Self::Dining),
            "transport" => Ok(Self::Transport),
            "household" => Ok(Self::Household),
            "travel" => Ok(Self::Travel),
            "other" => Ok(Self::Other),
            _ => Err(format!("Unknown group category: {}", s)),
        }
    }
}

impl std::fmt::Display for GroupCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Matching signal attached to a group: keywords, known merchants, and known
/// locations. Advisory only - never enforced as a constraint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchContext {
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub merchants: Vec<String>,
    #[serde(default)]
    pub locations: Vec<String>,
}

impl MatchContext {
    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty() && self.merchants.is_empty() && self.locations.is_empty()
    }
}

/// A named bucket of people who share certain costs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseGroup {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: GroupCategory,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub members: Vec<Member>,
    /// Stored matching context; filled from the category default table when
    /// empty (see `context::build_contexts`).
    #[serde(default)]
    pub context: MatchContext,
}

/// Optional location on a transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub city: String,
    #[serde(default)]
    pub region: Option<String>,
}

/// A single financial movement in canonical shape.
///
/// Negative amount = money out. Immutable once fetched; the engine only
/// reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub description: String,
    pub amount: f64,
    #[serde(default)]
    pub merchant: Option<String>,
    /// Ordered coarse-to-fine category tags
    #[serde(default)]
    pub categories: Vec<String>,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub location: Option<Location>,
}

/// How a suggested split allocates the total
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitType {
    Equal,
    Custom,
    Percentage,
}

impl SplitType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equal => "equal",
            Self::Custom => "custom",
            Self::Percentage => "percentage",
        }
    }
}

impl std::str::FromStr for SplitType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "equal" => Ok(Self::Equal),
            "custom" => Ok(Self::Custom),
            "percentage" => Ok(Self::Percentage),
            _ => Err(format!("Unknown split type: {}", s)),
        }
    }
}

impl std::fmt::Display for SplitType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One ranked group match inside a suggestion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSuggestion {
    pub group: ExpenseGroup,
    pub confidence: f64,
    pub reasoning: String,
    #[serde(default)]
    pub matching_factors: Vec<String>,
}

/// One suggested participant inside a suggestion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantSuggestion {
    pub id: String,
    pub name: String,
    pub confidence: f64,
    pub reason: String,
}

/// The engine's output for one transaction.
///
/// Invariant: the values in `amounts` sum to the absolute transaction amount
/// within one cent. `parsing::reconcile_amounts` repairs any drift before a
/// suggestion leaves the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitSuggestion {
    pub confidence: f64,
    pub split_type: SplitType,
    pub reasoning: String,
    pub suggested_participants: Vec<ParticipantSuggestion>,
    /// Member id -> non-negative dollars owed
    pub amounts: BTreeMap<String, f64>,
    pub matched_group: ExpenseGroup,
    pub group_suggestions: Vec<GroupSuggestion>,
    #[serde(default)]
    pub categories: Vec<String>,
}

/// One previously accepted split, used as a recency hint in the prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentSplit {
    pub participant_ids: Vec<String>,
    pub merchant: String,
    pub category: String,
}

/// An active trip window. A transaction dated inside the window, in one of
/// the trip locations, should bias strongly toward the trip's group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripWindow {
    pub name: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    #[serde(default)]
    pub locations: Vec<String>,
    #[serde(default)]
    pub participant_ids: Vec<String>,
}

impl TripWindow {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// Optional context passed alongside a suggestion request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionHints {
    #[serde(default)]
    pub recent_splits: Vec<RecentSplit>,
    #[serde(default)]
    pub active_trip: Option<TripWindow>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_category_round_trip() {
        for cat in [
            GroupCategory::Dining,
            GroupCategory::Transport,
            GroupCategory::Household,
            GroupCategory::Travel,
            GroupCategory::Other,
        ] {
            assert_eq!(cat.as_str().parse::<GroupCategory>().unwrap(), cat);
        }
        assert!("brunch".parse::<GroupCategory>().is_err());
    }

    #[test]
    fn test_split_type_serde_is_lowercase() {
        let json = serde_json::to_string(&SplitType::Percentage).unwrap();
        assert_eq!(json, r#""percentage""#);
        let back: SplitType = serde_json::from_str(r#""equal""#).unwrap();
        assert_eq!(back, SplitType::Equal);
    }

    #[test]
    fn test_suggestion_wire_keys_are_camel_case() {
        let group = ExpenseGroup {
            id: "g1".into(),
            name: "Roommates".into(),
            description: String::new(),
            category: GroupCategory::Household,
            color: "#00aa88".into(),
            members: vec![],
            context: MatchContext::default(),
        };
        let suggestion = SplitSuggestion {
            confidence: 0.9,
            split_type: SplitType::Equal,
            reasoning: "test".into(),
            suggested_participants: vec![],
            amounts: BTreeMap::new(),
            matched_group: group.clone(),
            group_suggestions: vec![GroupSuggestion {
                group,
                confidence: 0.9,
                reasoning: "test".into(),
                matching_factors: vec!["category".into()],
            }],
            categories: vec!["dining".into()],
        };

        let json = serde_json::to_value(&suggestion).unwrap();
        assert!(json.get("splitType").is_some());
        assert!(json.get("suggestedParticipants").is_some());
        assert!(json.get("matchedGroup").is_some());
        assert!(json.get("groupSuggestions").is_some());
        assert!(json["groupSuggestions"][0].get("matchingFactors").is_some());
        assert!(json.get("amounts").is_some());
        assert!(json.get("categories").is_some());
    }

    #[test]
    fn test_trip_window_contains() {
        let trip = TripWindow {
            name: "Tahoe".into(),
            start: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 3, 8).unwrap(),
            locations: vec!["South Lake Tahoe".into()],
            participant_ids: vec!["m1".into()],
        };
        assert!(trip.contains(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()));
        assert!(trip.contains(NaiveDate::from_ymd_opt(2024, 3, 8).unwrap()));
        assert!(!trip.contains(NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()));
    }
}
