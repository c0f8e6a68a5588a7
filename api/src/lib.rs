pub mod client;
pub mod proxy;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

const SCORES_SITE: &str = "https://www.365scores.com/he/football";

// ---------------------------------------------------------------------------
// Records the upstream service hands back through the proxy routes
// ---------------------------------------------------------------------------

/// One upcoming game with its assigned users, as served by `/api/assignments`.
///
/// Only the fields the front-end renders are typed here. The proxy forwards the
/// upstream JSON untouched, so the many `has*` capability flags survive the hop
/// even though nothing below reads them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub competition_id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub competition_display_name: String,
    pub home_competitor: Competitor,
    pub away_competitor: Competitor,
    /// RFC 3339 timestamp, kept as the wire string and parsed on demand.
    pub start_time: String,
    #[serde(default)]
    pub status_text: Option<String>,
    #[serde(default)]
    pub odds: Option<Odds>,
    #[serde(rename = "assigned_user_names", default, deserialize_with = "null_as_default")]
    pub assigned_user_names: Vec<String>,
}

impl GameRecord {
    pub fn starts_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.start_time)
    }

    pub fn assigned_label(&self) -> String {
        if self.assigned_user_names.is_empty() {
            "No assignments".to_string()
        } else {
            self.assigned_user_names.join(", ")
        }
    }

    pub fn match_page_url(&self) -> String {
        format!(
            "{SCORES_SITE}/match/premier-league-{}/{}-{}-{}-{}-{}#id={}",
            self.competition_id,
            self.away_competitor.name_for_url,
            self.home_competitor.name_for_url,
            self.away_competitor.id,
            self.home_competitor.id,
            self.id,
            self.id
        )
    }

    pub fn standings_url(&self) -> String {
        format!(
            "{SCORES_SITE}/league/premier-league-{}/standings",
            self.competition_id
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Competitor {
    pub id: i64,
    pub name: String,
    /// Negative until the game has a score.
    #[serde(default = "no_score", deserialize_with = "null_as_no_score")]
    pub score: f64,
    #[serde(rename = "nameForURL", default, deserialize_with = "null_as_default")]
    pub name_for_url: String,
}

impl Default for Competitor {
    fn default() -> Self {
        Self {
            id: 0,
            name: String::new(),
            score: no_score(),
            name_for_url: String::new(),
        }
    }
}

fn no_score() -> f64 {
    -1.0
}

fn null_as_no_score<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    Option::<f64>::deserialize(d).map(|score| score.unwrap_or_else(no_score))
}

/// Upstream rows come from outer joins, so an explicit `null` means "absent".
fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(d).map(Option::unwrap_or_default)
}

impl Competitor {
    pub fn score_label(&self) -> String {
        if self.score >= 0.0 {
            format!("{}", self.score)
        } else {
            "-".to_string()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Odds {
    #[serde(default, deserialize_with = "null_as_default")]
    pub options: Vec<OddsOption>,
}

impl Odds {
    /// The first three decimal rates, reversed, with two decimals each.
    pub fn headline_rates(&self) -> Vec<String> {
        let mut rates: Vec<String> = self
            .options
            .iter()
            .take(3)
            .filter_map(|o| o.rate.as_ref())
            .map(|r| format!("{:.2}", r.decimal))
            .collect();
        rates.reverse();
        rates
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OddsOption {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub rate: Option<Rate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rate {
    pub decimal: f64,
}

/// One row of `/api/assignments-list`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssignmentRecord {
    pub id: i64,
    pub user_id: i64,
    pub user_name: String,
    pub game_id: i64,
    pub home_competitor_name: String,
    pub away_competitor_name: String,
    pub start_time: String,
    pub assigned_at: String,
    /// Free-form; only used to pick a color and an icon.
    pub status: String,
}

impl AssignmentRecord {
    pub fn status_kind(&self) -> AssignmentStatus {
        match self.status.to_lowercase().as_str() {
            "assigned" => AssignmentStatus::Assigned,
            "completed" => AssignmentStatus::Completed,
            "cancelled" => AssignmentStatus::Cancelled,
            _ => AssignmentStatus::Other,
        }
    }

    pub fn game_url(&self) -> String {
        format!("{SCORES_SITE}/match/{}", self.game_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentStatus {
    Assigned,
    Completed,
    Cancelled,
    Other,
}

impl AssignmentStatus {
    pub fn icon(&self) -> &'static str {
        match self {
            AssignmentStatus::Assigned => "📋",
            AssignmentStatus::Completed => "✅",
            AssignmentStatus::Cancelled => "❌",
            AssignmentStatus::Other => "❓",
        }
    }
}

/// One row of `/api/users`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub is_active: bool,
    #[serde(default)]
    pub last_assigned_at: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_games_assigned: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_games_completed: u32,
}

impl UserRecord {
    /// Rounded completion percentage, 0 when nothing has been assigned.
    pub fn completion_percent(&self) -> u32 {
        if self.total_games_assigned == 0 {
            return 0;
        }
        (f64::from(self.total_games_completed) / f64::from(self.total_games_assigned) * 100.0)
            .round() as u32
    }

    /// Same ratio clamped to `0.0..=1.0` for progress bars.
    pub fn completion_ratio(&self) -> f64 {
        if self.total_games_assigned == 0 {
            return 0.0;
        }
        (f64::from(self.total_games_completed) / f64::from(self.total_games_assigned))
            .clamp(0.0, 1.0)
    }

    pub fn initial(&self) -> String {
        self.name
            .chars()
            .next()
            .map(|c| c.to_uppercase().collect())
            .unwrap_or_default()
    }
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
