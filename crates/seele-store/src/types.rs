use serde::{Deserialize, Serialize};

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Lifecycle state of a conversation session.
///
/// At most one session is `active` at any instant; `/new` archives it,
/// `/reset` deletes it outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Archived,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Archived => write!(f, "archived"),
        }
    }
}

impl std::str::FromStr for SessionStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "archived" => Ok(Self::Archived),
            other => Err(format!("unknown session status: {other}")),
        }
    }
}

/// A contiguous conversation period bounded by `/new` or `/reset`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub session_id: i64,
    /// UTC epoch seconds.
    pub start_ts: i64,
    /// Set when the session is archived.
    pub end_ts: Option<i64>,
    pub status: SessionStatus,
}

/// A single user or assistant utterance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub turn_id: i64,
    pub session_id: i64,
    /// UTC epoch seconds.
    pub ts: i64,
    pub role: Role,
    pub text: String,
}

/// An LLM-produced condensation of a contiguous slice of turns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    pub summary_id: i64,
    pub session_id: i64,
    pub text: String,
    /// UTC epoch seconds of the first / last condensed turn.
    pub first_ts: i64,
    pub last_ts: i64,
    /// Highest turn id the summary covers. Turns above this bound form the
    /// session's live tail.
    pub last_turn_id: i64,
}

/// Lifecycle state of a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Active,
    Paused,
    Completed,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Paused => write!(f, "paused"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "paused" => Ok(Self::Paused),
            "completed" => Ok(Self::Completed),
            other => Err(format!("unknown task status: {other}")),
        }
    }
}

/// When a task fires.
///
/// Serialised into the `trigger_config` column as `{"timestamp": N}` for
/// one-shot tasks or `{"interval": N}` (seconds) for recurring ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TriggerConfig {
    Once { timestamp: i64 },
    Interval { interval: u64 },
}

impl TriggerConfig {
    /// Column value for `trigger_type`.
    pub fn trigger_type(&self) -> &'static str {
        match self {
            Self::Once { .. } => "once",
            Self::Interval { .. } => "interval",
        }
    }

    /// First firing instant for a task created at `created_at`.
    pub fn initial_next_run(&self, created_at: i64) -> i64 {
        match self {
            Self::Once { timestamp } => *timestamp,
            Self::Interval { interval } => created_at + *interval as i64,
        }
    }
}

/// A persistent timer whose firing synthesises a prompt for the agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledTask {
    /// Opaque id (UUID v4 string).
    pub task_id: String,
    pub name: String,
    pub trigger: TriggerConfig,
    /// Briefing handed to the LLM when the task fires.
    pub message: String,
    pub created_at: i64,
    pub next_run_at: i64,
    pub last_run_at: Option<i64>,
    pub status: TaskStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_config_wire_shape() {
        let once = TriggerConfig::Once {
            timestamp: 1_700_000_000,
        };
        assert_eq!(
            serde_json::to_string(&once).unwrap(),
            r#"{"timestamp":1700000000}"#
        );

        let every = TriggerConfig::Interval { interval: 300 };
        assert_eq!(serde_json::to_string(&every).unwrap(), r#"{"interval":300}"#);

        let parsed: TriggerConfig = serde_json::from_str(r#"{"interval":60}"#).unwrap();
        assert_eq!(parsed, TriggerConfig::Interval { interval: 60 });
    }

    #[test]
    fn initial_next_run_per_trigger() {
        let once = TriggerConfig::Once { timestamp: 500 };
        assert_eq!(once.initial_next_run(100), 500);
        let every = TriggerConfig::Interval { interval: 30 };
        assert_eq!(every.initial_next_run(100), 130);
    }

    #[test]
    fn role_round_trip() {
        assert_eq!("user".parse::<Role>().unwrap(), Role::User);
        assert_eq!(Role::Assistant.to_string(), "assistant");
        assert!("system".parse::<Role>().is_err());
    }
}
