use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Local;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracker_core::{update, AppState, AppViewModel, Msg, NoticeLevel};
use tracker_engine::{ChannelProgressSink, EngineEvent, ProgressSink, ReqwestApi};
use tracker_logging::{tracker_error, tracker_info, tracker_warn};

use super::config::{AppConfig, ViewKind};
use super::effects::{map_event, EffectRunner};
use super::ui::input::{parse_command, Command, HELP};
use super::ui::render;

pub async fn run_app(config: AppConfig) -> Result<()> {
    let api = ReqwestApi::new(config.api_settings())
        .with_context(|| format!("cannot use backend url {:?}", config.base_url))?;
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<EngineEvent>();
    let sink: Arc<dyn ProgressSink> = Arc::new(ChannelProgressSink::new(event_tx));

    let policy = config.policy();
    let mut app = App {
        state: AppState::new(policy),
        runner: EffectRunner::new(Arc::new(api), sink, policy),
        view: config.view,
    };
    tracker_info!(
        "Tracker started view={:?} base_url={} interval={:?}",
        config.view,
        config.base_url,
        policy.interval
    );
    println!("type `help` for commands");

    app.dispatch(Msg::Mounted);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            result = &mut ctrl_c => {
                if let Err(err) = result {
                    tracker_error!("Failed to listen for ctrl-c: {}", err);
                }
                break;
            }
            Some(event) = event_rx.recv() => {
                app.dispatch(map_event(event));
            }
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => {
                    if !app.handle_line(&line) {
                        break;
                    }
                }
                Ok(None) => {
                    // Keep following jobs when started without a terminal.
                    tracker_info!("stdin closed; commands disabled");
                    stdin_open = false;
                }
                Err(err) => {
                    tracker_warn!("Failed to read stdin: {}", err);
                    stdin_open = false;
                }
            },
        }
    }

    app.dispatch(Msg::Unmounted);
    tracker_info!(
        "Tracker stopped with {} stream(s) open",
        app.runner.open_streams()
    );
    Ok(())
}

struct App {
    state: AppState,
    runner: EffectRunner,
    view: ViewKind,
}

impl App {
    fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        let view = state.consume_dirty().then(|| state.view());
        self.state = state;

        self.runner.run(effects);
        if let Some(view) = view {
            self.render(&view);
        }
    }

    /// Returns `false` when the operator asked to quit.
    fn handle_line(&mut self, line: &str) -> bool {
        let command = match parse_command(line) {
            Ok(Some(command)) => command,
            Ok(None) => return true,
            Err(err) => {
                println!("{}", render::format_notice(NoticeLevel::Error, &err.to_string()));
                return true;
            }
        };

        match command {
            Command::Add { code, kind } => {
                self.dispatch(Msg::RegisterRequested { input: code, kind })
            }
            Command::Retry { key } => self.dispatch(Msg::RetryRequested { key }),
            Command::Remove { key } => self.dispatch(Msg::RemoveRequested { key }),
            Command::List => {
                let view = self.state.view();
                self.render(&view);
            }
            Command::Help => println!("{HELP}"),
            Command::Quit => return false,
        }
        true
    }

    fn render(&self, view: &AppViewModel) {
        let clock = Local::now().format("%H:%M:%S").to_string();
        for line in render::render(view, self.view, &clock) {
            println!("{line}");
        }
    }
}

