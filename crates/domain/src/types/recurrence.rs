//! Recurrence rule vocabulary.
//!
//! A rule is owned by exactly one root task and serialized as JSON in the
//! store. `weeklyByWeekNumber` and `dailyOnDays` are declared frequencies
//! the expander does not generate occurrences for; see DESIGN.md.

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, TaskBridgeError};

/// Recurrence frequency family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Frequency {
    Daily,
    Weekly,
    WeeklyByWeekNumber,
    DailyOnDays,
}

/// Weekday token for `by_day` restrictions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleDay {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl RuleDay {
    /// Days since Monday, 0-based.
    pub fn days_from_monday(self) -> u32 {
        match self {
            RuleDay::Mon => 0,
            RuleDay::Tue => 1,
            RuleDay::Wed => 2,
            RuleDay::Thu => 3,
            RuleDay::Fri => 4,
            RuleDay::Sat => 5,
            RuleDay::Sun => 6,
        }
    }

    pub fn from_weekday(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Mon => RuleDay::Mon,
            Weekday::Tue => RuleDay::Tue,
            Weekday::Wed => RuleDay::Wed,
            Weekday::Thu => RuleDay::Thu,
            Weekday::Fri => RuleDay::Fri,
            Weekday::Sat => RuleDay::Sat,
            Weekday::Sun => RuleDay::Sun,
        }
    }
}

fn default_interval() -> u32 {
    1
}

/// Declarative expansion instruction owned by a root task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurrenceRule {
    pub freq: Frequency,

    /// Step between occurrences, in days or weeks depending on `freq`
    #[serde(default = "default_interval")]
    pub interval: u32,

    /// Cap on total instances, root included
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,

    /// Absolute cutoff instant for generated starts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub until: Option<chrono::DateTime<chrono::Utc>>,

    /// Weekday restriction for weekly expansion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub by_day: Option<Vec<RuleDay>>,
}

impl RecurrenceRule {
    /// Structural validation of a caller-supplied rule.
    pub fn validate(&self) -> Result<()> {
        if self.interval == 0 {
            return Err(TaskBridgeError::InvalidInput(
                "recurrence interval must be a positive integer".into(),
            ));
        }
        if self.count == Some(0) {
            return Err(TaskBridgeError::InvalidInput(
                "recurrence count must be at least 1 when present".into(),
            ));
        }
        if let Some(days) = &self.by_day {
            if days.is_empty() {
                return Err(TaskBridgeError::InvalidInput(
                    "byDay must name at least one weekday when present".into(),
                ));
            }
        }
        Ok(())
    }

    /// Serialize for storage.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| TaskBridgeError::Internal(format!("failed to serialize rule: {e}")))
    }

    /// Deserialize from the stored representation.
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw)
            .map_err(|e| TaskBridgeError::InvalidInput(format!("malformed recurrence rule: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frequency_serializes_with_camel_case_tokens() {
        let json = serde_json::to_string(&Frequency::WeeklyByWeekNumber).unwrap();
        assert_eq!(json, "\"weeklyByWeekNumber\"");
        let json = serde_json::to_string(&Frequency::DailyOnDays).unwrap();
        assert_eq!(json, "\"dailyOnDays\"");
    }

    #[test]
    fn interval_defaults_to_one() {
        let rule: RecurrenceRule = serde_json::from_str(r#"{"freq":"daily"}"#).unwrap();
        assert_eq!(rule.interval, 1);
        assert!(rule.count.is_none());
        assert!(rule.until.is_none());
    }

    #[test]
    fn zero_interval_is_rejected() {
        let rule = RecurrenceRule {
            freq: Frequency::Daily,
            interval: 0,
            count: None,
            until: None,
            by_day: None,
        };
        assert!(rule.validate().is_err());
    }

    #[test]
    fn empty_by_day_is_rejected() {
        let rule = RecurrenceRule {
            freq: Frequency::Weekly,
            interval: 1,
            count: None,
            until: None,
            by_day: Some(vec![]),
        };
        assert!(rule.validate().is_err());
    }

    #[test]
    fn rule_round_trips_through_storage_json() {
        let rule = RecurrenceRule {
            freq: Frequency::Weekly,
            interval: 2,
            count: Some(5),
            until: None,
            by_day: Some(vec![RuleDay::Mon, RuleDay::Fri]),
        };
        let restored = RecurrenceRule::from_json(&rule.to_json().unwrap()).unwrap();
        assert_eq!(restored, rule);
    }
}
