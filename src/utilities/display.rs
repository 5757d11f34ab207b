use crossterm::{
    cursor, queue,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor},
    terminal::{Clear, ClearType},
};

use std::io::Write;
use std::time::Duration;

use unicode_width::UnicodeWidthStr;

use crate::utilities::session::{FlashColor, Session};

const TITLE: &str = "INTERVAL TIMER";
const INSTRUCTIONS: [&str; 2] = ["Press 'S' to skip interval", "Press 'Q' or 'ESC' to quit"];

const TITLE_ROW: u16 = 1;
const LABEL_ROW: u16 = 3;
const DIGIT_ROWS: u16 = 5;
const BAR_MAX_WIDTH: usize = 80;

const FILLED: char = '█';
const EMPTY: char = '░';
const TICK: char = '┃';

/// Everything needed to draw one countdown screen.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub label: String,
    pub countdown: String,
    pub overall_progress: f64,
    pub current_progress: f64,
    pub boundaries: Vec<f64>,
    pub overall_caption: String,
    pub current_caption: String,
    pub preview: Option<String>,
}

impl Frame {
    pub fn compose(session: &Session) -> Self {
        let intervals = session.intervals();
        let label = session
            .current()
            .map(|i| i.label.clone())
            .unwrap_or_default();
        let overall_progress = session.overall_progress();
        let current_progress = session.current_progress();

        Self {
            label,
            countdown: format_clock(session.time_remaining as u64),
            overall_progress,
            current_progress,
            boundaries: intervals.boundary_fractions(),
            overall_caption: format!(
                "Training {:3.0}%   {} / {}",
                overall_progress * 100.0,
                format_clock(session.elapsed_total),
                format_clock(intervals.total_duration()),
            ),
            current_caption: format!(
                "Interval {} of {}   {:3.0}%",
                session.current_index + 1,
                intervals.len(),
                current_progress * 100.0,
            ),
            preview: session
                .preview()
                .map(|next| format!("NEXT: {} ({})", next.label, format_clock(next.duration as u64))),
        }
    }
}

/// `MM:SS`; minutes keep growing past 99.
pub fn format_clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

pub fn flash_color(color: FlashColor) -> Color {
    match color {
        FlashColor::Bright => Color::White,
        FlashColor::Accent => Color::Red,
    }
}

/// Columns of the boundary ticks on a bar `width` cells wide.
pub fn tick_columns(boundaries: &[f64], width: usize) -> Vec<usize> {
    if width == 0 {
        return Vec::new();
    }
    boundaries
        .iter()
        .map(|fraction| ((fraction * width as f64) as usize).min(width - 1))
        .collect()
}

pub fn create_progress_bar(progress: f64, width: usize, ticks: &[usize]) -> String {
    let filled_width = (progress.clamp(0.0, 1.0) * width as f64) as usize;
    let mut bar = String::with_capacity(width * 3);

    for i in 0..width {
        if ticks.contains(&i) {
            bar.push(TICK);
        } else if i < filled_width {
            bar.push(FILLED);
        } else {
            bar.push(EMPTY);
        }
    }
    bar
}

fn glyph(c: char) -> [&'static str; 5] {
    match c {
        '0' => ["█████", "█   █", "█   █", "█   █", "█████"],
        '1' => ["  █  ", " ██  ", "  █  ", "  █  ", " ███ "],
        '2' => ["█████", "    █", "█████", "█    ", "█████"],
        '3' => ["█████", "    █", "█████", "    █", "█████"],
        '4' => ["█   █", "█   █", "█████", "    █", "    █"],
        '5' => ["█████", "█    ", "█████", "    █", "█████"],
        '6' => ["█████", "█    ", "█████", "█   █", "█████"],
        '7' => ["█████", "    █", "    █", "    █", "    █"],
        '8' => ["█████", "█   █", "█████", "█   █", "█████"],
        '9' => ["█████", "█   █", "█████", "    █", "█████"],
        ':' => ["   ", " █ ", "   ", " █ ", "   "],
        _ => ["     "; 5],
    }
}

/// Renders `text` in the block font, one string per row.
pub fn big_text(text: &str) -> Vec<String> {
    (0..DIGIT_ROWS as usize)
        .map(|row| {
            text.chars()
                .map(|c| glyph(c)[row])
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}

/// Left column that centres `text`, measured in terminal cells.
fn centered(cols: u16, text: &str) -> u16 {
    let width = u16::try_from(text.width()).unwrap_or(u16::MAX);
    cols.saturating_sub(width) / 2
}

fn print_centered<W: Write>(out: &mut W, cols: u16, row: u16, text: &str) -> std::io::Result<()> {
    queue!(out, cursor::MoveTo(centered(cols, text), row), Print(text))
}

fn clear_to<W: Write>(out: &mut W, background: Color) -> std::io::Result<()> {
    queue!(
        out,
        ResetColor,
        SetBackgroundColor(background),
        Clear(ClearType::All),
        cursor::MoveTo(0, 0),
    )
}

pub fn paint_frame<W: Write>(out: &mut W, frame: &Frame, (cols, rows): (u16, u16)) -> std::io::Result<()> {
    clear_to(out, Color::Black)?;

    queue!(out, SetAttribute(Attribute::Bold), SetForegroundColor(Color::White))?;
    print_centered(out, cols, TITLE_ROW, TITLE)?;

    queue!(out, SetForegroundColor(Color::Cyan))?;
    print_centered(out, cols, LABEL_ROW, &frame.label)?;

    let digits_top = (rows / 2).saturating_sub(DIGIT_ROWS + 1).max(LABEL_ROW + 2);
    queue!(out, SetForegroundColor(Color::White))?;
    for (i, line) in big_text(&frame.countdown).iter().enumerate() {
        print_centered(out, cols, digits_top + i as u16, line)?;
    }
    queue!(out, SetAttribute(Attribute::Reset), SetBackgroundColor(Color::Black))?;

    let bar_width = (cols as usize * 7 / 10).min(BAR_MAX_WIDTH);
    let overall_top = digits_top + DIGIT_ROWS + 2;

    queue!(out, SetForegroundColor(Color::Grey))?;
    print_centered(out, cols, overall_top, &frame.overall_caption)?;
    let overall = create_progress_bar(
        frame.overall_progress,
        bar_width,
        &tick_columns(&frame.boundaries, bar_width),
    );
    queue!(out, SetForegroundColor(Color::Green))?;
    print_centered(out, cols, overall_top + 1, &overall)?;

    queue!(out, SetForegroundColor(Color::Grey))?;
    print_centered(out, cols, overall_top + 3, &frame.current_caption)?;
    let current = create_progress_bar(frame.current_progress, bar_width, &[]);
    queue!(out, SetForegroundColor(Color::Cyan))?;
    print_centered(out, cols, overall_top + 4, &current)?;

    if let Some(preview) = &frame.preview {
        queue!(
            out,
            SetAttribute(Attribute::Bold),
            SetForegroundColor(Color::Black),
            SetBackgroundColor(Color::Yellow),
        )?;
        print_centered(out, cols, overall_top + 6, &format!(" {preview} "))?;
        queue!(out, SetAttribute(Attribute::Reset), SetBackgroundColor(Color::Black))?;
    }

    queue!(out, SetForegroundColor(Color::DarkGrey))?;
    for (i, line) in INSTRUCTIONS.iter().enumerate() {
        let row = rows.saturating_sub(INSTRUCTIONS.len() as u16 + 1) + i as u16;
        print_centered(out, cols, row, line)?;
    }

    queue!(out, ResetColor)?;
    out.flush()
}

pub fn paint_fill<W: Write>(out: &mut W, color: FlashColor) -> std::io::Result<()> {
    clear_to(out, flash_color(color))?;
    out.flush()
}

pub fn paint_completion<W: Write>(
    out: &mut W,
    label: &str,
    pause: Duration,
    (cols, rows): (u16, u16),
) -> std::io::Result<()> {
    clear_to(out, Color::Black)?;
    let middle = rows / 2;

    queue!(out, SetAttribute(Attribute::Bold), SetForegroundColor(Color::White))?;
    print_centered(out, cols, middle.saturating_sub(3), "INTERVAL COMPLETE!")?;

    queue!(out, SetForegroundColor(Color::Cyan))?;
    print_centered(out, cols, middle, label)?;

    queue!(out, SetAttribute(Attribute::Reset), SetBackgroundColor(Color::Black), SetForegroundColor(Color::Grey))?;
    let seconds = pause.as_millis().div_ceil(1000);
    let unit = if seconds == 1 { "second" } else { "seconds" };
    print_centered(
        out,
        cols,
        middle + 3,
        &format!("Continuing automatically in {seconds} {unit}..."),
    )?;

    queue!(out, ResetColor)?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utilities::intervals::{Interval, IntervalSet};

    fn session() -> Session {
        Session::new(IntervalSet::new(vec![
            Interval { label: "Warmup".into(), duration: 300 },
            Interval { label: "Sprint".into(), duration: 30 },
            Interval { label: "Rest".into(), duration: 60 },
        ]))
    }

    #[test]
    fn composes_countdown_and_captions() {
        let mut session = session();
        session.time_remaining = 125;
        session.elapsed_total = 175;

        let frame = Frame::compose(&session);
        assert_eq!(frame.label, "Warmup");
        assert_eq!(frame.countdown, "02:05");
        assert_eq!(frame.boundaries.len(), 2);
        assert!(frame.overall_caption.ends_with("02:55 / 06:30"));
        assert!(frame.current_caption.starts_with("Interval 1 of 3"));
        assert_eq!(frame.preview, None);
    }

    #[test]
    fn preview_shows_next_interval_near_the_end() {
        let mut session = session();
        session.time_remaining = 30;
        let frame = Frame::compose(&session);
        assert_eq!(frame.preview.as_deref(), Some("NEXT: Sprint (00:30)"));
    }

    #[test]
    fn clock_keeps_counting_minutes() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(59), "00:59");
        assert_eq!(format_clock(6000), "100:00");
    }

    #[test]
    fn ticks_land_on_boundaries() {
        assert_eq!(tick_columns(&[0.25, 0.5], 40), [10, 20]);
        assert_eq!(tick_columns(&[0.9999], 10), [9]);
        assert!(tick_columns(&[0.5], 0).is_empty());
    }

    #[test]
    fn progress_bar_fills_and_marks_ticks() {
        let bar = create_progress_bar(0.5, 10, &[2, 7]);
        assert_eq!(bar, "██┃██░░┃░░");
        assert_eq!(create_progress_bar(2.0, 4, &[]), "████");
    }

    #[test]
    fn centres_by_display_width() {
        assert_eq!(centered(10, "abcd"), 3);
        assert_eq!(centered(10, "日本"), 3);
        assert_eq!(centered(10, "█████"), 2);
        assert_eq!(centered(4, "far too wide"), 0);
    }

    #[test]
    fn big_text_has_even_rows() {
        let rows = big_text("12:34");
        assert_eq!(rows.len(), 5);
        let width = rows[0].chars().count();
        assert!(rows.iter().all(|r| r.chars().count() == width));
        assert_eq!(width, 4 * 5 + 3 + 4);
    }

    #[test]
    fn painted_frame_contains_text() {
        let mut session = session();
        session.time_remaining = 20;
        let mut out = Vec::new();
        paint_frame(&mut out, &Frame::compose(&session), (100, 40)).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains(TITLE));
        assert!(text.contains("Warmup"));
        assert!(text.contains("NEXT: Sprint (00:30)"));
        assert!(text.contains(INSTRUCTIONS[1]));
    }

    #[test]
    fn completion_mentions_pause() {
        let mut out = Vec::new();
        paint_completion(&mut out, "Sprint", Duration::from_secs(2), (80, 24)).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("INTERVAL COMPLETE!"));
        assert!(text.contains("Continuing automatically in 2 seconds..."));

        let mut out = Vec::new();
        paint_completion(&mut out, "Sprint", Duration::from_millis(2200), (80, 24)).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Continuing automatically in 3 seconds..."));
    }
}
