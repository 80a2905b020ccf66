use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use log::{error, info, warn};
use screenmark::annotation::{Point, RasterCanvas, Tool};
use screenmark::configuration::Config;
use screenmark::error_handling::types::SessionError;
use screenmark::host::{HeadlessDocument, SyntheticCapture, SyntheticRecorderService};
use screenmark::listener_registry::{ElementId, EventKind};
use screenmark::recording::{DownloadReceipt, FileDownloader};
use screenmark::session_management::{HostServices, Session, SessionController, SessionStatus};
use serde::Serialize;

const VIEWPORT: (u32, u32) = (1280, 720);
const FRAGMENT_PERIOD: Duration = Duration::from_millis(100);
const FRAGMENT_SIZE: usize = 4096;

#[derive(Parser, Debug)]
#[command(name = "screenmark")]
#[command(version = "0.1.0")]
#[command(about = "Screen capture with a live annotation overlay and local recording")]
struct Args {
    /// TOML configuration file; defaults apply when omitted
    config_file: Option<PathBuf>,

    /// How long the demo session records
    #[arg(long, default_value_t = 1000)]
    record_ms: u64,

    /// Video tracks in the synthetic capture stream
    #[arg(long, default_value_t = 1)]
    tracks: usize,

    /// Refuse the capture permission, as a user dismissing the prompt would
    #[arg(long)]
    deny: bool,

    /// Where the recording is saved
    #[arg(long, env = "SCREENMARK_DOWNLOAD_DIR")]
    download_dir: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

/// What the scripted session did.
#[derive(Debug, Serialize)]
struct SessionReport {
    final_status: SessionStatus,
    session: Option<Session>,
    pointer_events: usize,
    recorded_chunks: usize,
    recording: Option<DownloadReceipt>,
    listeners_after_stop: usize,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_target(false)
        .init();

    let args = Args::parse();

    info!("Importing configuration");
    let mut config = match &args.config_file {
        Some(path) => Config::from_file(path).unwrap_or_else(|e| {
            error!("Unable to import configuration from file: {}", e);
            std::process::exit(1);
        }),
        None => {
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };
    if let Some(dir) = &args.download_dir {
        config.recording.download_dir = dir.clone();
    }
    info!("Configuration imported successfully");

    let report = match run(&config, &args).await {
        Ok(report) => report,
        Err(e) => {
            error!("Demo session failed: {}", e);
            std::process::exit(1);
        }
    };

    if args.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                error!("Unable to serialise the report: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        print_report(&report);
    }
}

/// Drives one session against the headless host: start, draw with every
/// tool, record for `record_ms`, stop.
async fn run(config: &Config, args: &Args) -> Result<SessionReport, SessionError> {
    let capture = SyntheticCapture::new(args.tracks);
    if args.deny {
        capture.deny_next("permission dismissed");
    }
    let recorders = SyntheticRecorderService::ticking(FRAGMENT_PERIOD, FRAGMENT_SIZE);

    let elements = &config.elements;
    let page = HeadlessDocument::new(VIEWPORT.0, VIEWPORT.1)
        .with_element(elements.start_button.as_str())
        .with_element(elements.stop_button.as_str())
        .with_element(elements.record_button.as_str())
        .with_element(elements.canvas.as_str());
    for tool in Tool::ALL {
        page.add_element(elements.tool_selector(tool));
    }

    let downloads = FileDownloader::new(&config.recording.download_dir)?;
    let controller = SessionController::new(
        config,
        HostServices {
            capture: Box::new(capture),
            recorders: Box::new(recorders),
            document: Box::new(page.clone()),
            canvas: Box::new(RasterCanvas::new(VIEWPORT.0, VIEWPORT.1)),
            downloads: Box::new(downloads),
        },
    )?;
    controller.on_start(|| info!("Sharing started"));
    controller.on_stop(|| info!("Sharing stopped"));
    controller.on_recording_change(|recording| info!("Recording: {}", recording));

    let start = ElementId::new(elements.start_button.as_str());
    let stop = ElementId::new(elements.stop_button.as_str());
    let record = ElementId::new(elements.record_button.as_str());
    let canvas = ElementId::new(elements.canvas.as_str());

    controller.dispatch(&start, EventKind::Click, None).await;
    if controller.status() != SessionStatus::Sharing {
        warn!("Session did not start, nothing to record");
        let report = SessionReport {
            final_status: controller.status(),
            session: None,
            pointer_events: 0,
            recorded_chunks: 0,
            recording: None,
            listeners_after_stop: page.listener_count(&canvas),
        };
        controller.shutdown().await;
        return Ok(report);
    }

    let mut pointer_events = 0;
    for (i, tool) in Tool::ALL.iter().enumerate() {
        controller
            .dispatch(&elements.tool_selector(*tool), EventKind::Click, None)
            .await;
        let origin = Point::new(120.0 + 260.0 * i as f64, 240.0);
        let mut handled = vec![
            controller
                .dispatch(&canvas, EventKind::PointerDown, Some(origin))
                .await,
        ];
        for step in 1..=4 {
            let to = Point::new(origin.x + 40.0 * step as f64, origin.y + 25.0 * step as f64);
            handled.push(controller.dispatch(&canvas, EventKind::PointerMove, Some(to)).await);
        }
        handled.push(controller.dispatch(&canvas, EventKind::PointerUp, None).await);
        pointer_events += handled.into_iter().filter(|h| *h).count();
    }

    controller.dispatch(&record, EventKind::Click, None).await;
    tokio::time::sleep(Duration::from_millis(args.record_ms)).await;
    let recorded_chunks = controller.recorded_chunk_count();
    let session = controller.session();

    controller.dispatch(&stop, EventKind::Click, None).await;
    let report = SessionReport {
        final_status: controller.status(),
        session: controller.last_session().or(session),
        pointer_events,
        recorded_chunks,
        recording: controller.last_recording().and_then(|outcome| outcome.download),
        listeners_after_stop: page.listener_count(&canvas),
    };
    controller.shutdown().await;
    Ok(report)
}

fn print_report(report: &SessionReport) {
    println!("status:            {}", report.final_status);
    if let Some(session) = &report.session {
        println!("session:           {}", session.id);
        println!("started:           {}", session.start_time.to_rfc3339());
        println!("recordings:        {}", session.recordings);
    }
    println!("pointer events:    {}", report.pointer_events);
    println!("recorded chunks:   {}", report.recorded_chunks);
    match &report.recording {
        Some(receipt) => {
            let location = receipt
                .location
                .as_ref()
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| receipt.url.to_string());
            println!(
                "recording:         {} ({} bytes, {})",
                location, receipt.bytes, receipt.mime_type
            );
        }
        None => println!("recording:         none"),
    }
    println!("canvas listeners:  {}", report.listeners_after_stop);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["screenmark"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn arguments_have_demo_defaults() {
        let parsed = args(&["--json", "--tracks", "2"]);
        assert!(parsed.config_file.is_none());
        assert_eq!(parsed.record_ms, 1000);
        assert_eq!(parsed.tracks, 2);
        assert!(parsed.json);
        assert!(!parsed.deny);
    }

    #[tokio::test(start_paused = true)]
    async fn scripted_session_saves_one_recording() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.recording.download_dir = dir.path().to_path_buf();

        let report = run(&config, &args(&["--record-ms", "450"])).await.unwrap();

        assert_eq!(report.final_status, SessionStatus::Idle);
        assert_eq!(report.pointer_events, 24);
        assert_eq!(report.recorded_chunks, 4);
        assert_eq!(report.listeners_after_stop, 0);
        let receipt = report.recording.unwrap();
        assert_eq!(receipt.bytes, 4 * FRAGMENT_SIZE);
        assert!(receipt.location.unwrap().starts_with(dir.path()));
    }

    #[tokio::test]
    async fn denied_capture_reports_an_idle_session() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.recording.download_dir = dir.path().to_path_buf();

        let report = run(&config, &args(&["--deny"])).await.unwrap();

        assert_eq!(report.final_status, SessionStatus::Idle);
        assert!(report.session.is_none());
        assert!(report.recording.is_none());
    }
}
