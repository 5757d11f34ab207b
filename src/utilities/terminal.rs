use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    style::ResetColor,
    terminal::{
        self, disable_raw_mode, enable_raw_mode, Clear, ClearType, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};

use std::io::{self, BufWriter, IsTerminal, Stdout};
use std::process::Command;
use std::time::Duration;

use crate::utilities::display::{paint_completion, paint_fill, paint_frame, Frame};
use crate::utilities::error::TimerError;
use crate::utilities::session::{Action, FlashColor, Frontend};

pub fn classify_key(key: &KeyEvent) -> Action {
    if key.kind != KeyEventKind::Press {
        return Action::None;
    }
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Action::Quit,
        KeyCode::Char('q' | 'Q') | KeyCode::Esc => Action::Quit,
        KeyCode::Char('s' | 'S') => Action::Skip,
        _ => Action::None,
    }
}

/// Keeps the X display from blanking while the timer runs.
pub struct ScreenSaver {
    inhibited: bool,
}

impl ScreenSaver {
    pub fn inhibit() -> Self {
        if std::env::var_os("DISPLAY").is_none() {
            log::debug!("no X display, leaving screen power management alone");
            return Self { inhibited: false };
        }
        let inhibited = run_xset("-dpms");
        Self { inhibited }
    }

    pub fn restore(&mut self) {
        if std::mem::take(&mut self.inhibited) {
            run_xset("+dpms");
        }
    }
}

impl Drop for ScreenSaver {
    fn drop(&mut self) {
        self.restore();
    }
}

fn run_xset(flag: &str) -> bool {
    match Command::new("xset").arg(flag).status() {
        Ok(status) if status.success() => true,
        Ok(status) => {
            log::warn!("xset {flag} exited with {status}");
            false
        }
        Err(err) => {
            log::warn!("cannot run xset {flag}: {err}");
            false
        }
    }
}

/// Full-screen frontend on the terminal's alternate screen.
pub struct Terminal {
    out: BufWriter<Stdout>,
    screen_saver: ScreenSaver,
    active: bool,
}

impl Terminal {
    pub fn open() -> Result<Self, TimerError> {
        if !io::stdout().is_terminal() {
            return Err(TimerError::NotATerminal);
        }
        terminal::size()?;

        enable_raw_mode()?;
        let mut out = BufWriter::new(io::stdout());
        if let Err(err) = execute!(out, EnterAlternateScreen, cursor::Hide, Clear(ClearType::All)) {
            let _ = disable_raw_mode();
            return Err(err.into());
        }

        Ok(Self {
            out,
            screen_saver: ScreenSaver::inhibit(),
            active: true,
        })
    }

    fn size(&self) -> io::Result<(u16, u16)> {
        terminal::size()
    }
}

impl Frontend for Terminal {
    fn draw(&mut self, frame: &Frame) -> io::Result<()> {
        let size = self.size()?;
        paint_frame(&mut self.out, frame, size)
    }

    fn fill(&mut self, color: FlashColor) -> io::Result<()> {
        paint_fill(&mut self.out, color)
    }

    fn draw_completion(&mut self, label: &str, pause: Duration) -> io::Result<()> {
        let size = self.size()?;
        paint_completion(&mut self.out, label, pause, size)
    }

    fn poll_action(&mut self) -> io::Result<Action> {
        let mut action = Action::None;
        while event::poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()? {
                action = action.merge(classify_key(&key));
            }
        }
        Ok(action)
    }

    fn release(&mut self) -> io::Result<()> {
        if !std::mem::take(&mut self.active) {
            return Ok(());
        }
        self.screen_saver.restore();
        let shown = execute!(self.out, ResetColor, cursor::Show, LeaveAlternateScreen);
        disable_raw_mode()?;
        shown
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        let _ = self.release();
    }
}
