//! Terminal render surface. The dashboard draws into named regions, the
//! way the original markup addressed elements by id; renderers write
//! regions and `render` paints the whole frame.

use std::collections::HashMap;

use anyhow::{anyhow, Result};

/// Region identifiers: the stable render-target contract.
pub mod regions {
    pub const TOTAL_PROSPECTS: &str = "totalProspects";
    pub const RESPONSE_RATE: &str = "responseRate";
    pub const RESPONSE_RATE_BAR: &str = "responseRateBar";
    pub const DEMO_SCHEDULED: &str = "demoScheduled";
    pub const CONVERSION_RATE: &str = "conversionRate";
    pub const CONVERSION_RATE_BAR: &str = "conversionRateBar";
    pub const PROSPECTS_TABLE: &str = "prospectsTable";
    pub const STAGE_CHART: &str = "stageChart";
    pub const RECENT_ACTIVITY: &str = "recentActivity";
    pub const PROSPECT_DETAILS: &str = "prospectDetails";
    pub const LAST_UPDATE: &str = "lastUpdate";
    pub const ALERT: &str = "alertBox";
}

/// ANSI codes for the frame. Standard 16-color palette so the output
/// follows the terminal theme.
pub mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GREEN: &str = "\x1b[32m";
    pub const RED: &str = "\x1b[31m";

    pub const BORDER: &str = CYAN;
    pub const HEADER: &str = BOLD;
    pub const VALUE: &str = GREEN;
    pub const ERROR: &str = RED;
    pub const MUTED: &str = DIM;
}

const BAR_CELLS: usize = 30;

#[derive(Debug, Clone, PartialEq)]
enum Region {
    Text(String),
    Bar(f64),
    Block(Vec<String>),
}

pub struct Screen {
    regions: HashMap<&'static str, Region>,
}

impl Screen {
    /// The full dashboard layout. Every region the renderers target exists
    /// from the start; a write to anything else is a bug, not a no-op.
    pub fn new() -> Self {
        Self::with_regions(&[
            (regions::TOTAL_PROSPECTS, RegionKind::Text),
            (regions::RESPONSE_RATE, RegionKind::Text),
            (regions::RESPONSE_RATE_BAR, RegionKind::Bar),
            (regions::DEMO_SCHEDULED, RegionKind::Text),
            (regions::CONVERSION_RATE, RegionKind::Text),
            (regions::CONVERSION_RATE_BAR, RegionKind::Bar),
            (regions::PROSPECTS_TABLE, RegionKind::Block),
            (regions::STAGE_CHART, RegionKind::Block),
            (regions::RECENT_ACTIVITY, RegionKind::Block),
            (regions::PROSPECT_DETAILS, RegionKind::Block),
            (regions::LAST_UPDATE, RegionKind::Text),
            (regions::ALERT, RegionKind::Text),
        ])
    }

    pub fn with_regions(layout: &[(&'static str, RegionKind)]) -> Self {
        let regions = layout
            .iter()
            .map(|(id, kind)| {
                let region = match kind {
                    RegionKind::Text => Region::Text(String::new()),
                    RegionKind::Bar => Region::Bar(0.0),
                    RegionKind::Block => Region::Block(Vec::new()),
                };
                (*id, region)
            })
            .collect();
        Self { regions }
    }

    pub fn has_region(&self, id: &str) -> bool {
        self.regions.contains_key(id)
    }

    pub fn set_text(&mut self, id: &str, value: impl Into<String>) -> Result<()> {
        match self.regions.get_mut(id) {
            Some(Region::Text(text)) => {
                *text = value.into();
                Ok(())
            }
            Some(_) => Err(anyhow!("region {} is not a text region", id)),
            None => Err(anyhow!("missing render target: {}", id)),
        }
    }

    /// Bar widths track their percentage exactly, clamped to [0,100].
    pub fn set_bar(&mut self, id: &str, pct: f64) -> Result<()> {
        match self.regions.get_mut(id) {
            Some(Region::Bar(width)) => {
                *width = pct.clamp(0.0, 100.0);
                Ok(())
            }
            Some(_) => Err(anyhow!("region {} is not a bar region", id)),
            None => Err(anyhow!("missing render target: {}", id)),
        }
    }

    pub fn set_block(&mut self, id: &str, lines: Vec<String>) -> Result<()> {
        match self.regions.get_mut(id) {
            Some(Region::Block(block)) => {
                *block = lines;
                Ok(())
            }
            Some(_) => Err(anyhow!("region {} is not a block region", id)),
            None => Err(anyhow!("missing render target: {}", id)),
        }
    }

    pub fn text(&self, id: &str) -> Option<&str> {
        match self.regions.get(id) {
            Some(Region::Text(text)) => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn bar_pct(&self, id: &str) -> Option<f64> {
        match self.regions.get(id) {
            Some(Region::Bar(width)) => Some(*width),
            _ => None,
        }
    }

    pub fn block(&self, id: &str) -> Option<&[String]> {
        match self.regions.get(id) {
            Some(Region::Block(lines)) => Some(lines.as_slice()),
            _ => None,
        }
    }

    fn paint_bar(pct: f64) -> String {
        let filled = ((pct / 100.0) * BAR_CELLS as f64).round() as usize;
        let filled = filled.min(BAR_CELLS);
        format!(
            "{}{}{}{}",
            colors::VALUE,
            "█".repeat(filled),
            "░".repeat(BAR_CELLS - filled),
            colors::RESET,
        )
    }

    /// Paint the full frame as one string, ready for a single terminal
    /// write. Empty optional regions (details, alert) are omitted.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let rule = format!("{}{}{}\n", colors::BORDER, "─".repeat(72), colors::RESET);

        out.push_str(&rule);
        let last_update = self
            .text(regions::LAST_UPDATE)
            .filter(|t| !t.is_empty())
            .unwrap_or("never");
        out.push_str(&format!(
            "{}PROSPECT DASHBOARD{}   last update: {}\n",
            colors::HEADER,
            colors::RESET,
            last_update,
        ));
        if let Some(alert) = self.text(regions::ALERT) {
            if !alert.is_empty() {
                out.push_str(&format!("{}! {}{}\n", colors::ERROR, alert, colors::RESET));
            }
        }
        out.push_str(&rule);

        out.push_str(&format!(
            "prospects: {}{}{}   demos scheduled: {}{}{}\n",
            colors::VALUE,
            self.text(regions::TOTAL_PROSPECTS).unwrap_or("-"),
            colors::RESET,
            colors::VALUE,
            self.text(regions::DEMO_SCHEDULED).unwrap_or("-"),
            colors::RESET,
        ));
        out.push_str(&format!(
            "response rate:   {} {}\n",
            Self::paint_bar(self.bar_pct(regions::RESPONSE_RATE_BAR).unwrap_or(0.0)),
            self.text(regions::RESPONSE_RATE).unwrap_or("-"),
        ));
        out.push_str(&format!(
            "conversion rate: {} {}\n",
            Self::paint_bar(self.bar_pct(regions::CONVERSION_RATE_BAR).unwrap_or(0.0)),
            self.text(regions::CONVERSION_RATE).unwrap_or("-"),
        ));

        for (title, id) in [
            ("PROSPECTS", regions::PROSPECTS_TABLE),
            ("STAGE DISTRIBUTION", regions::STAGE_CHART),
            ("RECENT ACTIVITY", regions::RECENT_ACTIVITY),
        ] {
            if let Some(lines) = self.block(id) {
                out.push_str(&rule);
                out.push_str(&format!("{}{}{}\n", colors::HEADER, title, colors::RESET));
                if lines.is_empty() {
                    out.push_str(&format!("{}(none){}\n", colors::MUTED, colors::RESET));
                }
                for line in lines {
                    out.push_str(line);
                    out.push('\n');
                }
            }
        }

        if let Some(lines) = self.block(regions::PROSPECT_DETAILS) {
            if !lines.is_empty() {
                out.push_str(&rule);
                out.push_str(&format!("{}PROSPECT DETAILS{}\n", colors::HEADER, colors::RESET));
                for line in lines {
                    out.push_str(line);
                    out.push('\n');
                }
            }
        }
        out.push_str(&rule);
        out
    }
}

impl Default for Screen {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy)]
pub enum RegionKind {
    Text,
    Bar,
    Block,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bar_width_equals_percentage() {
        let mut screen = Screen::new();
        screen.set_bar(regions::RESPONSE_RATE_BAR, 40.0).unwrap();
        assert_eq!(screen.bar_pct(regions::RESPONSE_RATE_BAR), Some(40.0));
    }

    #[test]
    fn bar_width_clamps_to_unit_range() {
        let mut screen = Screen::new();
        screen.set_bar(regions::RESPONSE_RATE_BAR, 140.0).unwrap();
        assert_eq!(screen.bar_pct(regions::RESPONSE_RATE_BAR), Some(100.0));
        screen.set_bar(regions::RESPONSE_RATE_BAR, -5.0).unwrap();
        assert_eq!(screen.bar_pct(regions::RESPONSE_RATE_BAR), Some(0.0));
    }

    #[test]
    fn missing_region_is_an_error() {
        let mut screen = Screen::with_regions(&[(regions::LAST_UPDATE, RegionKind::Text)]);
        assert!(screen.set_text("noSuchRegion", "x").is_err());
        assert!(screen.set_block(regions::STAGE_CHART, vec![]).is_err());
        assert!(!screen.has_region(regions::STAGE_CHART));
    }

    #[test]
    fn kind_mismatch_is_an_error() {
        let mut screen = Screen::new();
        assert!(screen.set_bar(regions::TOTAL_PROSPECTS, 10.0).is_err());
        assert!(screen.set_text(regions::RESPONSE_RATE_BAR, "40").is_err());
    }

    #[test]
    fn render_includes_written_values() {
        let mut screen = Screen::new();
        screen.set_text(regions::TOTAL_PROSPECTS, "10").unwrap();
        screen.set_text(regions::RESPONSE_RATE, "40%").unwrap();
        let frame = screen.render();
        assert!(frame.contains("prospects: "));
        assert!(frame.contains("10"));
        assert!(frame.contains("40%"));
    }

    #[test]
    fn render_omits_empty_details_and_alert() {
        let screen = Screen::new();
        let frame = screen.render();
        assert!(!frame.contains("PROSPECT DETAILS"));
        assert!(!frame.contains("! "));
    }
}
