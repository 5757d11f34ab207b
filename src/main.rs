use std::fs::OpenOptions;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use clap::error::ErrorKind;

use crate::utilities::config::{Cli, FILE_FORMAT_HELP, Timing};
use crate::utilities::error::TimerError;
use crate::utilities::intervals::IntervalSet;
use crate::utilities::session::{Outcome, Sequencer, Session, SystemClock};
use crate::utilities::sound::Speaker;
use crate::utilities::terminal::Terminal;

mod utilities;

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            return match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                    let _ = err.print();
                    ExitCode::SUCCESS
                }
                _ => {
                    println!("{}", err.render());
                    println!("{FILE_FORMAT_HELP}");
                    ExitCode::FAILURE
                }
            };
        }
    };

    init_logging(&cli);

    match run(&cli) {
        Ok((outcome, session)) => {
            println!("\n{}", farewell(outcome, &session));
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("{err}");
            println!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn farewell(outcome: Outcome, session: &Session) -> String {
    match outcome {
        Outcome::Completed => "Interval training completed!".to_string(),
        Outcome::Quit => format!(
            "Interval training stopped after {} of {} intervals.",
            session.current_index,
            session.intervals().len()
        ),
    }
}

fn init_logging(cli: &Cli) {
    let path = cli.log_path();
    // The terminal belongs to the timer screen, so logs go to a file.
    let log_file = match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(file) => file,
        Err(err) => {
            println!("Warning: cannot open log file {}: {err}", path.display());
            return;
        }
    };

    let _ = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(cli.log_level.as_str()),
    )
    .target(env_logger::Target::Pipe(Box::new(log_file)))
    .try_init();
}

fn run(cli: &Cli) -> Result<(Outcome, Session), TimerError> {
    let intervals = IntervalSet::load(&cli.interval_file, cli.max_intervals)?;
    log::info!(
        "loaded {} intervals from {}",
        intervals.len(),
        cli.interval_file.display()
    );

    let stop = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&stop);
    if let Err(err) = ctrlc::set_handler(move || handler_flag.store(true, Ordering::SeqCst)) {
        log::warn!("cannot install termination handler: {err}");
    }

    let mut terminal = Terminal::open()?;
    let mut speaker = if cli.mute {
        Speaker::muted(cli.beep_settings())
    } else {
        Speaker::open(cli.beep_settings())
    };

    let mut sequencer = Sequencer::new(
        Session::new(intervals),
        Timing::default().fit_beeps(&cli.beep_settings()),
        SystemClock,
        stop,
    );
    let outcome = sequencer.run(&mut terminal, &mut speaker)?;
    Ok((outcome, sequencer.session().clone()))
}
