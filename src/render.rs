//! The four view renderers plus the detail view. Each renderer takes the
//! fetched data and writes screen regions; nothing here issues requests.

use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{anyhow, Result};

use crate::model::{fmt_timestamp, Activity, MetricsSnapshot, Prospect, StageCount};
use crate::screen::{colors, regions, Screen};

/// Summary metrics: counts as text, rates as text plus bar width.
pub fn render_metrics(screen: &mut Screen, metrics: &MetricsSnapshot) -> Result<()> {
    screen.set_text(regions::TOTAL_PROSPECTS, metrics.total_prospects.to_string())?;
    screen.set_text(regions::RESPONSE_RATE, format!("{}%", metrics.response_rate))?;
    screen.set_bar(regions::RESPONSE_RATE_BAR, metrics.response_rate)?;
    screen.set_text(regions::DEMO_SCHEDULED, metrics.demo_scheduled.to_string())?;
    screen.set_text(regions::CONVERSION_RATE, format!("{}%", metrics.conversion_rate))?;
    screen.set_bar(regions::CONVERSION_RATE_BAR, metrics.conversion_rate)?;
    Ok(())
}

/// Full table rebuild, one row per prospect. No diffing: prospect counts
/// are small and a consistent frame beats render efficiency.
pub fn render_prospects(screen: &mut Screen, prospects: &[Prospect]) -> Result<()> {
    let rows = prospects
        .iter()
        .map(|p| {
            format!(
                "{:<32} {}{:<16}{} {:<20} {}●{} {}  {}view {} | advance {}{}",
                p.email,
                p.current_stage.color(),
                p.current_stage.as_str(),
                colors::RESET,
                fmt_timestamp(&p.updated_at),
                p.current_stage.color(),
                colors::RESET,
                p.current_stage.as_str(),
                colors::MUTED,
                p.email,
                p.email,
                colors::RESET,
            )
        })
        .collect();
    screen.set_block(regions::PROSPECTS_TABLE, rows)
}

/// Feed entries, newest first as the backend serves them. Presentation
/// branches on the activity tag.
pub fn render_activity(screen: &mut Screen, activity: &[Activity], limit: usize) -> Result<()> {
    let lines = activity
        .iter()
        .take(limit)
        .map(|a| match a {
            Activity::Email {
                from_email,
                to_email,
                action,
                subject,
                timestamp,
            } => format!(
                "✉ {} {} to {} · {}  {}{}{}",
                from_email,
                action,
                to_email,
                subject,
                colors::MUTED,
                fmt_timestamp(timestamp),
                colors::RESET,
            ),
            Activity::Stage {
                email,
                action,
                timestamp,
            } => format!(
                "→ {} {}  {}{}{}",
                email,
                action,
                colors::MUTED,
                fmt_timestamp(timestamp),
                colors::RESET,
            ),
        })
        .collect();
    screen.set_block(regions::RECENT_ACTIVITY, lines)
}

static NEXT_CHART_ID: AtomicU64 = AtomicU64::new(1);

/// Persistent ring-chart state. Constructed once per slot; later renders
/// mutate labels and data in place rather than rebuilding the instance.
pub struct ChartInstance {
    id: u64,
    segments: Vec<StageCount>,
    updates: u64,
}

impl ChartInstance {
    fn new() -> Self {
        Self {
            id: NEXT_CHART_ID.fetch_add(1, Ordering::SeqCst),
            segments: Vec::new(),
            updates: 0,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn updates(&self) -> u64 {
        self.updates
    }

    pub fn segments(&self) -> &[StageCount] {
        &self.segments
    }

    fn apply(&mut self, distribution: &[StageCount]) {
        self.segments.clear();
        self.segments.extend_from_slice(distribution);
        self.updates += 1;
    }
}

/// Render the stage distribution into the chart region. The instance lives
/// in a caller-owned slot; the first call fills the slot, every later call
/// updates the same instance. Errors (no chart region) are the caller's to
/// log, never to surface.
pub fn update_stage_chart(
    slot: &mut Option<ChartInstance>,
    screen: &mut Screen,
    distribution: &[StageCount],
    width: usize,
) -> Result<()> {
    if !screen.has_region(regions::STAGE_CHART) {
        return Err(anyhow!("missing render target: {}", regions::STAGE_CHART));
    }

    let chart = slot.get_or_insert_with(ChartInstance::new);
    chart.apply(distribution);

    let total: u64 = chart.segments.iter().map(|s| s.count).sum();
    let mut lines = Vec::with_capacity(chart.segments.len() + 1);

    if total > 0 {
        // Proportional segment bar standing in for the doughnut ring.
        let mut ring = String::new();
        for seg in &chart.segments {
            let cells =
                ((seg.count as f64 / total as f64) * width as f64).round() as usize;
            ring.push_str(seg.current_stage.color());
            ring.push_str(&"█".repeat(cells.max(1)));
        }
        ring.push_str(colors::RESET);
        lines.push(ring);
    }

    for seg in &chart.segments {
        let pct = if total > 0 {
            seg.count as f64 / total as f64 * 100.0
        } else {
            0.0
        };
        lines.push(format!(
            "{}●{} {:<16} {:>4}  {:>5.1}%",
            seg.current_stage.color(),
            colors::RESET,
            seg.current_stage.as_str(),
            seg.count,
            pct,
        ));
    }

    screen.set_block(regions::STAGE_CHART, lines)
}

/// Detail view. A missing prospect renders an explicit not-found line
/// instead of leaving the region stale.
pub fn render_prospect_details(
    screen: &mut Screen,
    email: &str,
    prospect: Option<&Prospect>,
) -> Result<()> {
    let lines = match prospect {
        Some(p) => vec![
            format!("email:          {}", p.email),
            format!(
                "current stage:  {}{}{}",
                p.current_stage.color(),
                p.current_stage.as_str(),
                colors::RESET,
            ),
            format!("response rate:  {}%", p.response_rate),
            format!("last updated:   {}", fmt_timestamp(&p.updated_at)),
            format!("created at:     {}", fmt_timestamp(&p.created_at)),
        ],
        None => vec![format!("no prospect found for {}", email)],
    };
    screen.set_block(regions::PROSPECT_DETAILS, lines)
}
