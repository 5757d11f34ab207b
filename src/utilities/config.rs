use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::utilities::intervals::DEFAULT_MAX_INTERVALS;

pub const FILE_FORMAT_HELP: &str = "\
Interval file format:
label duration_seconds
Example:
Warmup 300
Sprint 30
Rest 60";

#[derive(Parser, Debug)]
#[command(
    name = "interval-timer",
    version,
    about = "Full-screen countdown timer for interval training",
    after_help = FILE_FORMAT_HELP
)]
pub struct Cli {
    /// File with one `<label> <seconds>` pair per line
    pub interval_file: PathBuf,

    /// Stop reading the file after this many intervals
    #[arg(long, default_value_t = DEFAULT_MAX_INTERVALS)]
    pub max_intervals: usize,

    /// Number of beeps played when an interval ends
    #[arg(long, default_value_t = 3)]
    pub beeps: u32,

    /// Disable audio
    #[arg(long)]
    pub mute: bool,

    /// Where log output goes (defaults to interval-timer.log in the temp dir)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Log level when RUST_LOG is unset
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

impl Cli {
    pub fn log_path(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("interval-timer.log"))
    }

    pub fn beep_settings(&self) -> BeepSettings {
        BeepSettings {
            count: self.beeps,
            ..BeepSettings::default()
        }
    }
}

/// Fixed waits used by the playback loop.
#[derive(Clone, Copy, Debug)]
pub struct Timing {
    pub tick: Duration,
    pub flash_hold: Duration,
    pub flash_repeats: u32,
    pub completion_pause: Duration,
}

impl Timing {
    /// Stretches the completion pause so a long beep sequence is not cut off
    /// by the next interval's audio reset.
    pub fn fit_beeps(self, beeps: &BeepSettings) -> Self {
        Self {
            completion_pause: self.completion_pause.max(beeps.sequence_duration()),
            ..self
        }
    }
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            tick: Duration::from_secs(1),
            flash_hold: Duration::from_millis(200),
            flash_repeats: 3,
            completion_pause: Duration::from_secs(2),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct BeepSettings {
    pub count: u32,
    pub frequency: f32,
    pub duration: Duration,
    pub gap: Duration,
    /// Peak amplitude in the 0.0..=1.0 range.
    pub amplitude: f32,
    pub sample_rate: u32,
}

impl BeepSettings {
    /// Playing time of all beeps including the gaps after them.
    pub fn sequence_duration(&self) -> Duration {
        (self.duration + self.gap) * self.count
    }
}

impl Default for BeepSettings {
    fn default() -> Self {
        Self {
            count: 3,
            frequency: 800.0,
            duration: Duration::from_millis(100),
            gap: Duration::from_millis(120),
            amplitude: 8000.0 / i16::MAX as f32,
            sample_rate: 44100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_behavior() {
        let cli = Cli::try_parse_from(["interval-timer", "plan.txt"]).unwrap();
        assert_eq!(cli.interval_file, PathBuf::from("plan.txt"));
        assert_eq!(cli.max_intervals, 100);
        assert_eq!(cli.beep_settings().count, 3);
        assert!(!cli.mute);
        assert!(cli.log_path().ends_with("interval-timer.log"));
    }

    #[test]
    fn pause_covers_long_beep_sequences() {
        let default = Timing::default().fit_beeps(&BeepSettings::default());
        assert_eq!(default.completion_pause, Duration::from_secs(2));

        let ten = BeepSettings {
            count: 10,
            ..BeepSettings::default()
        };
        assert_eq!(ten.sequence_duration(), Duration::from_millis(2200));
        assert_eq!(
            Timing::default().fit_beeps(&ten).completion_pause,
            Duration::from_millis(2200)
        );
    }

    #[test]
    fn missing_or_extra_arguments_are_usage_errors() {
        assert!(Cli::try_parse_from(["interval-timer"]).is_err());
        assert!(Cli::try_parse_from(["interval-timer", "a.txt", "b.txt"]).is_err());
    }

    #[test]
    fn overrides_are_applied() {
        let cli = Cli::try_parse_from([
            "interval-timer",
            "plan.txt",
            "--max-intervals",
            "5",
            "--beeps",
            "1",
            "--mute",
        ])
        .unwrap();
        assert_eq!(cli.max_intervals, 5);
        assert_eq!(cli.beep_settings().count, 1);
        assert!(cli.mute);
    }
}
