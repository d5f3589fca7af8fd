//! Dashboard controller: the periodic refresh orchestrator plus the
//! user-initiated actions (detail lookup, stage advancement, search).

use std::cell::{Cell, Ref, RefCell};
use std::rc::Rc;

use anyhow::Result;
use chrono::Local;
use url::Url;

use crate::api::{search_url, ProspectApi};
use crate::logging::{json_log, log_error, obj, v_num, v_str, Domain, Level};
use crate::render;
use crate::render::ChartInstance;
use crate::screen::{regions, Screen};
use crate::state::{Config, DashboardModel};

pub struct DashboardController {
    api: Rc<dyn ProspectApi>,
    cfg: Config,
    screen: RefCell<Screen>,
    // The one persistent chart handle, owned here and handed to the
    // renderer on every cycle.
    chart: RefCell<Option<ChartInstance>>,
    model: RefCell<DashboardModel>,
    in_flight: Cell<bool>,
}

impl DashboardController {
    pub fn new(api: Rc<dyn ProspectApi>, cfg: Config) -> Self {
        Self {
            api,
            cfg,
            screen: RefCell::new(Screen::new()),
            chart: RefCell::new(None),
            model: RefCell::new(DashboardModel::new()),
            in_flight: Cell::new(false),
        }
    }

    pub fn screen(&self) -> Ref<'_, Screen> {
        self.screen.borrow()
    }

    pub fn chart(&self) -> Ref<'_, Option<ChartInstance>> {
        self.chart.borrow()
    }

    pub fn model(&self) -> Ref<'_, DashboardModel> {
        self.model.borrow()
    }

    /// One refresh cycle: the four fetch-and-render operations run
    /// concurrently and independently; a failure in one is logged and never
    /// blocks the others. One user-visible alert per failed cycle. A tick
    /// that fires while the previous cycle is unresolved is skipped so a
    /// slow backend cannot stack unbounded requests.
    pub async fn refresh_cycle(&self) {
        if self.in_flight.get() {
            json_log(
                Domain::Controller,
                "refresh_skipped",
                obj(&[("reason", v_str("previous_cycle_in_flight"))]),
            );
            return;
        }
        self.in_flight.set(true);

        let (metrics, prospects, chart, activity) = tokio::join!(
            self.update_metrics(),
            self.update_prospects(),
            self.update_stage_chart(),
            self.update_recent_activity(),
        );

        let mut failed = 0u32;
        for (op, result) in [
            ("metrics", metrics),
            ("prospects", prospects),
            ("stage_chart", chart),
            ("recent_activity", activity),
        ] {
            if let Err(err) = result {
                failed += 1;
                log_error(Domain::Controller, op, &err);
            }
        }

        {
            let mut screen = self.screen.borrow_mut();
            if failed > 0 {
                let _ = screen.set_text(regions::ALERT, "Failed to refresh dashboard data");
            } else {
                let _ = screen.set_text(regions::ALERT, "");
                let now = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
                let _ = screen.set_text(regions::LAST_UPDATE, now.clone());
                self.model.borrow_mut().mark_refreshed(now);
            }
        }
        json_log(
            Domain::Controller,
            "refresh_cycle",
            obj(&[
                ("failed_ops", v_num(failed as f64)),
                ("prospects", v_num(self.model.borrow().len() as f64)),
            ]),
        );

        self.in_flight.set(false);
    }

    async fn update_metrics(&self) -> Result<()> {
        let metrics = self.api.fetch_metrics().await?;
        render::render_metrics(&mut self.screen.borrow_mut(), &metrics)
    }

    async fn update_prospects(&self) -> Result<()> {
        let prospects = self.api.fetch_prospects(None).await?;
        self.model.borrow_mut().replace_prospects(&prospects);
        render::render_prospects(&mut self.screen.borrow_mut(), &prospects)
    }

    async fn update_stage_chart(&self) -> Result<()> {
        let metrics = self.api.fetch_metrics().await?;
        let counted: u64 = metrics.stage_distribution.iter().map(|s| s.count).sum();
        if counted != metrics.total_prospects {
            crate::logging::log(
                Level::Warn,
                Domain::Render,
                "stage_distribution_mismatch",
                obj(&[
                    ("counted", v_num(counted as f64)),
                    ("total_prospects", v_num(metrics.total_prospects as f64)),
                ]),
            );
        }
        render::update_stage_chart(
            &mut self.chart.borrow_mut(),
            &mut self.screen.borrow_mut(),
            &metrics.stage_distribution,
            self.cfg.chart_width,
        )
    }

    async fn update_recent_activity(&self) -> Result<()> {
        let metrics = self.api.fetch_metrics().await?;
        render::render_activity(
            &mut self.screen.borrow_mut(),
            &metrics.recent_activity,
            self.cfg.activity_limit,
        )
    }

    /// Detail lookup: filtered query, first match fills the detail view.
    /// Zero matches render an explicit not-found line.
    pub async fn view_prospect(&self, email: &str) -> Result<()> {
        let matches = self.api.fetch_prospects(Some(email)).await?;
        json_log(
            Domain::Controller,
            "view_prospect",
            obj(&[
                ("email", v_str(email)),
                ("matches", v_num(matches.len() as f64)),
            ]),
        );
        render::render_prospect_details(&mut self.screen.borrow_mut(), email, matches.first())
    }

    /// Advance a prospect to the cyclic successor of its current stage. The
    /// current stage comes from the client-side model, not from rendered
    /// output. Success triggers a full refresh cycle; failure is logged
    /// only, with no alert and no retry.
    pub async fn advance_stage(&self, email: &str) {
        let current = self.model.borrow().stage_of(email);
        let Some(current) = current else {
            json_log(
                Domain::Controller,
                "advance_unknown_prospect",
                obj(&[("email", v_str(email))]),
            );
            return;
        };
        let target = current.next();

        match self.api.update_stage(email, target).await {
            Ok(()) => {
                json_log(
                    Domain::Controller,
                    "stage_advanced",
                    obj(&[
                        ("email", v_str(email)),
                        ("from", v_str(current.as_str())),
                        ("to", v_str(target.as_str())),
                    ]),
                );
                self.refresh_cycle().await;
            }
            Err(err) => log_error(Domain::Controller, "advance_stage", &err),
        }
    }

    /// Search is a navigation action: build the server-rendered results
    /// location with the query URL-encoded. No client-side filtering.
    pub fn search(&self, query: &str) -> Result<Url> {
        let url = search_url(&self.cfg.api_base, query)?;
        json_log(
            Domain::Controller,
            "navigate",
            obj(&[("url", v_str(url.as_str()))]),
        );
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MetricsSnapshot, Prospect, Stage};
    use anyhow::anyhow;
    use async_trait::async_trait;

    /// Records every call; metrics/prospect payloads are fixed.
    struct RecordingApi {
        calls: RefCell<Vec<String>>,
        fail_stage_update: bool,
    }

    impl RecordingApi {
        fn new(fail_stage_update: bool) -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                fail_stage_update,
            }
        }
    }

    #[async_trait(?Send)]
    impl ProspectApi for RecordingApi {
        async fn fetch_metrics(&self) -> Result<MetricsSnapshot> {
            self.calls.borrow_mut().push("metrics".to_string());
            Ok(MetricsSnapshot {
                total_prospects: 1,
                response_rate: 0.0,
                conversion_rate: 0.0,
                demo_scheduled: 0,
                stage_distribution: vec![],
                recent_activity: vec![],
            })
        }

        async fn fetch_prospects(&self, q: Option<&str>) -> Result<Vec<Prospect>> {
            self.calls
                .borrow_mut()
                .push(format!("prospects q={:?}", q));
            Ok(vec![Prospect {
                email: "a@x.com".to_string(),
                current_stage: Stage::ProposalSent,
                response_rate: 50.0,
                created_at: String::new(),
                updated_at: String::new(),
            }])
        }

        async fn update_stage(&self, email: &str, stage: Stage) -> Result<()> {
            self.calls
                .borrow_mut()
                .push(format!("put {} {}", email, stage.as_str()));
            if self.fail_stage_update {
                Err(anyhow!("503 backend down"))
            } else {
                Ok(())
            }
        }
    }

    fn controller(api: Rc<RecordingApi>) -> DashboardController {
        let cfg = Config {
            api_base: "http://localhost:5000".to_string(),
            api_token: "t".to_string(),
            poll_secs: 30,
            activity_limit: 10,
            chart_width: 40,
        };
        DashboardController::new(api, cfg)
    }

    #[tokio::test]
    async fn advance_without_model_entry_issues_no_request() {
        let api = Rc::new(RecordingApi::new(false));
        let ctl = controller(api.clone());
        ctl.advance_stage("ghost@x.com").await;
        assert!(api.calls.borrow().is_empty());
    }

    #[tokio::test]
    async fn advance_uses_model_stage_and_refreshes() {
        let api = Rc::new(RecordingApi::new(false));
        let ctl = controller(api.clone());
        ctl.refresh_cycle().await;
        api.calls.borrow_mut().clear();

        ctl.advance_stage("a@x.com").await;
        let calls = api.calls.borrow();
        // cyclic successor of proposal_sent
        assert_eq!(calls[0], "put a@x.com converted");
        // success triggers a full refresh cycle
        assert!(calls.iter().any(|c| c == "metrics"));
    }

    #[tokio::test]
    async fn advance_failure_is_logged_only() {
        let api = Rc::new(RecordingApi::new(true));
        let ctl = controller(api.clone());
        ctl.refresh_cycle().await;
        api.calls.borrow_mut().clear();

        ctl.advance_stage("a@x.com").await;
        let calls = api.calls.borrow();
        // the PUT happened, but no refresh followed and no alert was raised
        assert_eq!(calls.len(), 1);
        drop(calls);
        assert_eq!(ctl.screen().text(regions::ALERT), Some(""));
    }

    #[tokio::test]
    async fn view_prospect_queries_by_email() {
        let api = Rc::new(RecordingApi::new(false));
        let ctl = controller(api.clone());
        ctl.view_prospect("a@x.com").await.unwrap();
        assert_eq!(api.calls.borrow()[0], "prospects q=Some(\"a@x.com\")");
        let screen = ctl.screen();
        let details = screen.block(regions::PROSPECT_DETAILS).unwrap();
        assert!(details.iter().any(|l| l.contains("a@x.com")));
    }

    #[test]
    fn search_builds_encoded_navigation_target() {
        let api = Rc::new(RecordingApi::new(false));
        let ctl = controller(api);
        let url = ctl.search("acme corp").unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/search?q=acme+corp");
    }
}
