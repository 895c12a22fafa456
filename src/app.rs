use crate::cli::{Cli, Commands};
use ffpress::config::Config;
use ffpress::controller::JobController;
use ffpress::engine::{self, FfmpegRunner, JobOutcome, JobRunner, SessionCallbacks};
use ffpress::ui::{UiAction, ui_channel};
use std::io::Write;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing::debug;

pub fn run(cli: Cli) {
    // The codec picker list and the policy table must agree before any
    // job is accepted
    if let Err(e) = engine::validate_labels(engine::known_labels()) {
        eprintln!("Error: codec table is inconsistent: {e}");
        process::exit(1);
    }

    let config = Config::load().unwrap_or_default();

    match cli.command {
        Commands::Transcode { input, codec } => handle_transcode(&config, input, codec),
        Commands::Exec { command, probe } => handle_exec(&config, command, probe),
        Commands::Probe { file } => handle_probe(&config, file),
        Commands::ListCodecs => handle_list_codecs(),
        Commands::CheckFfmpeg => handle_check_ffmpeg(&config),
        Commands::InitConfig => handle_init_config(),
    }
}

/// Run one transcode job to completion, draining the UI queue on this
/// thread - the designated consumer thread for all UI state.
fn handle_transcode(config: &Config, input: PathBuf, codec: Option<String>) {
    let label = codec.unwrap_or_else(|| config.defaults.codec.clone());

    let output_dir = match config.output_dir() {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(1);
        }
    };
    if let Err(e) = std::fs::create_dir_all(&output_dir) {
        eprintln!(
            "Error: failed to create output directory {}: {e}",
            output_dir.display()
        );
        process::exit(1);
    }

    let (ui, rx) = ui_channel();
    let runner = Arc::new(FfmpegRunner::new(config.engine.clone()));
    let controller = JobController::new(
        runner,
        ui,
        config.defaults.expected_duration_millis,
        output_dir,
    );

    let handle = match controller.start_transcode(&input, &label) {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };
    debug!(session = %handle.session_id, "waiting for transcode to finish");

    while let Some(action) = rx.next() {
        match action {
            UiAction::ShowProgress => println!("Encoding video ({label})..."),
            UiAction::ProgressUpdated(percent) => {
                print!("\rEncoding video: {percent}%");
                std::io::stdout().flush().ok();
            }
            UiAction::HideProgress => println!(),
            UiAction::PlaybackRequested(path) => {
                println!("Playing {}", path.display());
                break;
            }
            UiAction::TranscodeFailed(message) => {
                eprintln!("{message}");
                process::exit(1);
            }
            UiAction::OutputAppended(_) | UiAction::CommandFinished { .. } => {}
        }
    }
}

/// Run a raw engine command, echoing its output line by line.
fn handle_exec(config: &Config, command: String, probe: bool) {
    let args = match shlex::split(&command) {
        Some(args) if !args.is_empty() => args,
        _ => {
            eprintln!("Error: could not parse command string");
            process::exit(1);
        }
    };

    let (ui, rx) = ui_channel();
    let runner = FfmpegRunner::new(config.engine.clone());

    let log_ui = ui.clone();
    let done_ui = ui;
    let callbacks = SessionCallbacks {
        on_progress: None,
        on_log: Some(Arc::new(move |line| {
            log_ui.post(UiAction::OutputAppended(line));
        })),
        on_complete: Box::new(move |outcome| {
            let (success, message) = match outcome {
                JobOutcome::Success { duration_millis } => {
                    (true, format!("Command completed in {duration_millis} ms."))
                }
                JobOutcome::Failure {
                    state_description,
                    fail_trace,
                } => {
                    let mut message = format!("Command failed with state {state_description}.");
                    if let Some(trace) = fail_trace {
                        message.push('\n');
                        message.push_str(&trace);
                    }
                    (false, message)
                }
            };
            done_ui.post(UiAction::CommandFinished { success, message });
        }),
    };

    let handle = if probe {
        runner.submit_probe(args, callbacks)
    } else {
        runner.submit(args, callbacks)
    };
    debug!(session = %handle.session_id, probe, "command session started");

    let mut failed = false;
    while let Some(action) = rx.next() {
        match action {
            UiAction::OutputAppended(line) => println!("{line}"),
            UiAction::CommandFinished { success, message } => {
                if success {
                    println!("{message}");
                } else {
                    eprintln!("Command failed. Please check output for the details.");
                    eprintln!("{message}");
                    failed = true;
                }
                break;
            }
            _ => {}
        }
    }

    for session in runner.list_sessions() {
        debug!(
            id = %session.id,
            kind = ?session.kind,
            started_at = %session.started_at,
            state = ?session.state,
            return_code = ?session.return_code,
            "session"
        );
    }

    if failed {
        process::exit(1);
    }
}

fn handle_probe(config: &Config, file: PathBuf) {
    match engine::probe_duration(&config.engine, &file) {
        Ok(duration) => {
            println!("Duration: {duration:.2} seconds");
        }
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(1);
        }
    }
}

fn handle_list_codecs() {
    for policy in engine::codec::POLICIES {
        let extras = if policy.extra_args.is_empty() {
            String::from("-")
        } else {
            policy.extra_args.join(" ")
        };
        println!(
            "{:<16} encoder={:<16} pix_fmt={:<12} extras={:<28} container={}",
            policy.label, policy.encoder, policy.pixel_format, extras, policy.extension
        );
    }
}

fn handle_check_ffmpeg(config: &Config) {
    match engine::ffmpeg_version(&config.engine) {
        Ok(version) => {
            println!("ffmpeg found: {version}");
            match engine::ffprobe_version(&config.engine) {
                Ok(probe_version) => {
                    println!("ffprobe found: {probe_version}");
                }
                Err(e) => {
                    eprintln!("Error: {e:#}");
                    process::exit(1);
                }
            }
        }
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(1);
        }
    }
}

fn handle_init_config() {
    match Config::config_path() {
        Ok(path) if path.exists() => {
            println!("Config already exists at {}", path.display());
        }
        Ok(path) => {
            let config = Config::default();
            if let Err(e) = config.save() {
                eprintln!("Failed to save default config: {e:#}");
                process::exit(1);
            }
            println!("Default config saved to {}", path.display());
        }
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(1);
        }
    }
}
