use std::collections::VecDeque;
use std::io::{self, BufRead};
use std::sync::mpsc;
use std::thread;

use anyhow::Context;
use clap::Parser;
use engine_logging::{engine_debug, engine_info, LogDestination};
use log::LevelFilter;
use transcript_core::{update, AppState, Location, Msg};

use super::cli::{parse_location, Cli};
use super::config::SiteConfig;
use super::effects::EffectRunner;
use super::render::TerminalRenderer;

/// Everything the event loop reacts to.
pub enum HostEvent {
    Msg(Msg),
    Line(String),
    InputClosed,
}

pub fn run_app() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    let config = SiteConfig::load(cli.config.as_deref())?;
    let url = parse_location(&cli.location)?;
    let total_pages = cli
        .total_pages
        .or(config.total_pages)
        .context("page count unknown; pass --total-pages or set total_pages in the config")?;
    engine_info!("Searching {} ({} pages)", url, total_pages);

    let (host_tx, host_rx) = mpsc::channel::<HostEvent>();
    let engine_config = config.engine_config(url.clone(), total_pages);
    let runner = EffectRunner::new(engine_config, host_tx.clone())
        .context("failed to start search engine")?;

    if cli.interactive {
        spawn_stdin_reader(host_tx);
    }

    let mut pending = VecDeque::from([Msg::PageLoaded]);
    if let Some(query) = cli.query.clone() {
        pending.push_back(Msg::SearchInputChanged(query));
        pending.push_back(Msg::SearchSubmitted);
    }

    let mut host = Host {
        runner,
        renderer: TerminalRenderer::new(cli.format),
    };
    let mut state = AppState::new(Location::new(url), total_pages);
    let mut input_open = cli.interactive;

    loop {
        while let Some(msg) = pending.pop_front() {
            state = host.dispatch(state, msg)?;
        }
        if !input_open && !state.session().is_running() {
            break;
        }

        match host_rx.recv() {
            Ok(HostEvent::Msg(msg)) => pending.push_back(msg),
            Ok(HostEvent::Line(line)) => pending.extend(line_messages(&state, &line)),
            Ok(HostEvent::InputClosed) => input_open = false,
            Err(_) => break,
        }
    }

    engine_debug!("Event loop finished");
    Ok(())
}

fn init_logging(cli: &Cli) {
    let (destination, level) = match (&cli.log_file, cli.verbose) {
        (Some(path), true) => (LogDestination::Both(path.clone()), LevelFilter::Debug),
        (Some(path), false) => (LogDestination::File(path.clone()), LevelFilter::Info),
        (None, true) => (LogDestination::Terminal, LevelFilter::Debug),
        (None, false) => (LogDestination::Terminal, LevelFilter::Warn),
    };
    engine_logging::initialize(destination, level);
}

fn spawn_stdin_reader(host_tx: mpsc::Sender<HostEvent>) {
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if host_tx.send(HostEvent::Line(line)).is_err() {
                return;
            }
        }
        let _ = host_tx.send(HostEvent::InputClosed);
    });
}

/// Maps one line of interactive input to the user actions it stands for.
fn line_messages(state: &AppState, line: &str) -> Vec<Msg> {
    match line.trim_end_matches(['\r', '\n']) {
        ":close" => vec![Msg::CloseClicked],
        ":open" => vec![Msg::SearchSubmitted],
        text if state.is_modal_open() => vec![
            Msg::ModalInputChanged(text.to_string()),
            Msg::ModalSearchSubmitted,
        ],
        text => vec![
            Msg::SearchInputChanged(text.to_string()),
            Msg::SearchSubmitted,
        ],
    }
}

struct Host {
    runner: EffectRunner,
    renderer: TerminalRenderer,
}

impl Host {
    fn dispatch(&mut self, state: AppState, msg: Msg) -> io::Result<AppState> {
        let (mut state, effects) = update(state, msg);
        self.runner.enqueue(effects);

        if state.consume_dirty() {
            self.renderer.render(
                &state.view(),
                &mut io::stdout().lock(),
                &mut io::stderr().lock(),
            )?;
        }
        Ok(state)
    }
}
