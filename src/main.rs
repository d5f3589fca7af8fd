use std::rc::Rc;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::LocalSet;
use tokio::time::{interval, Duration, MissedTickBehavior};

use prospectdash::api::HttpApi;
use prospectdash::controller::DashboardController;
use prospectdash::input::{parse_command, Command};
use prospectdash::logging::{json_log, log_error, obj, v_num, v_str, Domain};
use prospectdash::state::Config;

const HELP: &str = "commands: view <email> | advance <email> | search <query> | refresh | quit";

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // One logical thread: refresh cycles run as local tasks so input stays
    // responsive while requests are in flight.
    LocalSet::new().run_until(run()).await
}

async fn run() -> Result<()> {
    let cfg = Config::from_env();
    json_log(
        Domain::System,
        "startup",
        obj(&[
            ("api_base", v_str(&cfg.api_base)),
            ("poll_secs", v_num(cfg.poll_secs as f64)),
        ]),
    );

    let api = Rc::new(HttpApi::new(&cfg));
    let controller = Rc::new(DashboardController::new(api, cfg.clone()));

    // First tick fires immediately: refresh at startup, then every interval.
    let mut ticker = interval(Duration::from_secs(cfg.poll_secs.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("{}", HELP);

    loop {
        tokio::select! {
            _ = ticker.tick() => spawn_refresh(&controller),
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_command(&line) {
                    Some(Command::View(email)) => {
                        let ctl = controller.clone();
                        tokio::task::spawn_local(async move {
                            if let Err(err) = ctl.view_prospect(&email).await {
                                log_error(Domain::Controller, "view_prospect", &err);
                            }
                            print!("{}", ctl.screen().render());
                        });
                    }
                    Some(Command::Advance(email)) => {
                        let ctl = controller.clone();
                        tokio::task::spawn_local(async move {
                            ctl.advance_stage(&email).await;
                            print!("{}", ctl.screen().render());
                        });
                    }
                    Some(Command::Search(query)) => match controller.search(&query) {
                        Ok(url) => println!("open {}", url),
                        Err(err) => log_error(Domain::Controller, "search", &err),
                    },
                    Some(Command::Refresh) => spawn_refresh(&controller),
                    Some(Command::Quit) => break,
                    None => println!("{}", HELP),
                }
            }
        }
    }

    json_log(Domain::System, "shutdown", obj(&[]));
    Ok(())
}

fn spawn_refresh(controller: &Rc<DashboardController>) {
    let ctl = controller.clone();
    tokio::task::spawn_local(async move {
        ctl.refresh_cycle().await;
        print!("{}", ctl.screen().render());
    });
}
