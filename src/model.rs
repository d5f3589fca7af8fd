use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Pipeline stages, in funnel order. Advancing past the last stage wraps
/// back to the first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    InitialContact,
    Interested,
    DemoScheduled,
    ProposalSent,
    Converted,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::InitialContact,
        Stage::Interested,
        Stage::DemoScheduled,
        Stage::ProposalSent,
        Stage::Converted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::InitialContact => "initial_contact",
            Stage::Interested => "interested",
            Stage::DemoScheduled => "demo_scheduled",
            Stage::ProposalSent => "proposal_sent",
            Stage::Converted => "converted",
        }
    }

    /// Cyclic successor: converted wraps to initial_contact.
    pub fn next(self) -> Stage {
        let idx = Stage::ALL.iter().position(|s| *s == self).unwrap_or(0);
        Stage::ALL[(idx + 1) % Stage::ALL.len()]
    }

    /// ANSI color for badges and chart segments, keyed by stage identity so
    /// a reordered or extended stage set keeps stable colors.
    pub fn color(&self) -> &'static str {
        match self {
            Stage::InitialContact => "\x1b[34m", // blue
            Stage::Interested => "\x1b[36m",     // cyan
            Stage::DemoScheduled => "\x1b[33m",  // yellow
            Stage::ProposalSent => "\x1b[35m",   // magenta
            Stage::Converted => "\x1b[32m",      // green
        }
    }
}

impl std::str::FromStr for Stage {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stage::ALL
            .iter()
            .copied()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("unknown stage: {}", s))
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A prospect as served by `GET /api/prospects`. Owned by the backend; the
/// client keeps it only for the current render and for computing stage
/// transitions.
#[derive(Debug, Clone, Deserialize)]
pub struct Prospect {
    pub email: String,
    pub current_stage: Stage,
    #[serde(default)]
    pub response_rate: f64,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

/// One slice of the stage distribution.
#[derive(Debug, Clone, Deserialize)]
pub struct StageCount {
    pub current_stage: Stage,
    pub count: u64,
}

/// Backend-authored activity log entry. Tagged on `type`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Activity {
    Email {
        from_email: String,
        to_email: String,
        action: String,
        subject: String,
        timestamp: String,
    },
    Stage {
        email: String,
        action: String,
        timestamp: String,
    },
}

/// Point-in-time aggregate from `GET /api/metrics`. Recomputed fresh by the
/// backend on every poll, never cached client-side.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsSnapshot {
    pub total_prospects: u64,
    pub response_rate: f64,
    pub conversion_rate: f64,
    pub demo_scheduled: u64,
    #[serde(default)]
    pub stage_distribution: Vec<StageCount>,
    #[serde(default)]
    pub recent_activity: Vec<Activity>,
}

/// Format a backend timestamp for display in the viewer's local time.
/// Accepts RFC3339 or the SQLite `datetime('now')` shape; anything else is
/// shown verbatim rather than dropped.
pub fn fmt_timestamp(raw: &str) -> String {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string();
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        let utc = Utc.from_utc_datetime(&naive);
        return utc.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string();
    }
    raw.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn stage_next_is_cyclic() {
        assert_eq!(Stage::InitialContact.next(), Stage::Interested);
        assert_eq!(Stage::Interested.next(), Stage::DemoScheduled);
        assert_eq!(Stage::DemoScheduled.next(), Stage::ProposalSent);
        assert_eq!(Stage::ProposalSent.next(), Stage::Converted);
        // wrap-around
        assert_eq!(Stage::Converted.next(), Stage::InitialContact);
    }

    #[test]
    fn stage_next_visits_every_stage_once() {
        let mut seen = vec![Stage::InitialContact];
        let mut cur = Stage::InitialContact;
        for _ in 0..Stage::ALL.len() - 1 {
            cur = cur.next();
            assert!(!seen.contains(&cur));
            seen.push(cur);
        }
        assert_eq!(cur.next(), Stage::InitialContact);
    }

    #[test]
    fn stage_roundtrips_through_str() {
        for stage in Stage::ALL {
            assert_eq!(Stage::from_str(stage.as_str()).unwrap(), stage);
        }
        assert!(Stage::from_str("closed_won").is_err());
    }

    #[test]
    fn stage_serde_uses_snake_case() {
        let json = serde_json::to_string(&Stage::DemoScheduled).unwrap();
        assert_eq!(json, "\"demo_scheduled\"");
        let back: Stage = serde_json::from_str("\"proposal_sent\"").unwrap();
        assert_eq!(back, Stage::ProposalSent);
    }

    #[test]
    fn activity_deserializes_by_tag() {
        let email: Activity = serde_json::from_str(
            r#"{"type":"email","from_email":"me@co.com","to_email":"a@x.com",
                "action":"sent","subject":"intro","timestamp":"2025-01-01 10:00:00"}"#,
        )
        .unwrap();
        assert!(matches!(email, Activity::Email { .. }));

        let stage: Activity = serde_json::from_str(
            r#"{"type":"stage","email":"a@x.com",
                "action":"moved from interested to demo_scheduled",
                "timestamp":"2025-01-01 11:00:00"}"#,
        )
        .unwrap();
        assert!(matches!(stage, Activity::Stage { .. }));
    }

    #[test]
    fn metrics_snapshot_tolerates_missing_sequences() {
        let m: MetricsSnapshot = serde_json::from_str(
            r#"{"total_prospects":3,"response_rate":12.5,
                "conversion_rate":0.0,"demo_scheduled":1}"#,
        )
        .unwrap();
        assert!(m.stage_distribution.is_empty());
        assert!(m.recent_activity.is_empty());
    }

    #[test]
    fn fmt_timestamp_falls_back_to_raw() {
        assert_eq!(fmt_timestamp("not a date"), "not a date");
        // SQLite shape parses
        assert_ne!(fmt_timestamp("2025-03-01 09:30:00"), "");
    }
}
