use std::{
    io::Write as _,
    path::PathBuf,
    sync::Arc,
};

use anyhow::Result;
use log::info;
use tokio::io::{AsyncBufReadExt, BufReader};

use pomotick::{
    timer::TimerEvent, DesktopNotifier, SettingsStore, TimerController, TimerSnapshot,
};

fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".local/share/pomotick/settings.json")
}

fn render(snapshot: &TimerSnapshot) {
    print!(
        "\r[{}] {}:{}   ",
        snapshot.phase_label, snapshot.minutes_text, snapshot.seconds_text
    );
    let _ = std::io::stdout().flush();
}

fn print_controls(snapshot: &TimerSnapshot) {
    let start = if snapshot.start_enabled { "start" } else { "(start)" };
    let pause = if snapshot.pause_enabled { "pause" } else { "(pause)" };
    println!("commands: {start} | {pause} | reset | set <work> <break> | status | quit");
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let path = settings_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let settings = Arc::new(SettingsStore::new(path));
    let durations = settings.durations();
    info!(
        "Pomotick starting: {}min work / {}min break",
        durations.work_minutes, durations.break_minutes
    );

    let controller = TimerController::new(settings, Arc::new(DesktopNotifier));

    // Display task: repaint the countdown line on every event and drop to a
    // fresh line when the phase flips.
    let mut events = controller.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                TimerEvent::StateChanged { snapshot } => render(&snapshot),
                TimerEvent::PhaseSwitched { snapshot, .. } => {
                    println!();
                    println!("== {} ==", snapshot.phase_label);
                    render(&snapshot);
                }
            }
        }
    });

    let snapshot = controller.snapshot().await;
    println!("Pomotick - work/break interval timer");
    print_controls(&snapshot);
    render(&snapshot);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("start") => {
                let snapshot = controller.start().await;
                render(&snapshot);
            }
            Some("pause") => {
                let snapshot = controller.pause().await;
                render(&snapshot);
            }
            Some("reset") => {
                let snapshot = controller.reset().await;
                render(&snapshot);
            }
            Some("set") => {
                let work = parts.next().map(str::parse::<u32>);
                let brk = parts.next().map(str::parse::<u32>);
                match (work, brk) {
                    (Some(Ok(work)), Some(Ok(brk))) => {
                        match controller.apply_settings(work, brk).await {
                            Ok(snapshot) => render(&snapshot),
                            Err(err) => println!("error: {err}"),
                        }
                    }
                    _ => println!("usage: set <work-minutes> <break-minutes>"),
                }
            }
            Some("status") => {
                let snapshot = controller.snapshot().await;
                println!(
                    "[{}] {}:{} ({})",
                    snapshot.phase_label,
                    snapshot.minutes_text,
                    snapshot.seconds_text,
                    if snapshot.running { "running" } else { "paused" }
                );
                print_controls(&snapshot);
            }
            Some("quit") | Some("exit") => break,
            Some(other) => println!("unknown command: {other}"),
            None => {}
        }
    }

    controller.pause().await;
    info!("Pomotick shutting down");
    Ok(())
}
