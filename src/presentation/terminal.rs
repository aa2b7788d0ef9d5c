use std::io::Write;

use ansi_term::{Colour, Style};
use anyhow::Result;

use crate::utils::{clock::Clock, percentage::Percentage};

use super::{Navigator, Notification, NotificationKind, Presenter, WarningDialog};

const PROGRESS_WIDTH: usize = 30;

/// Renders the dialog and toasts as coloured text. The progress bar is redrawn in place.
pub struct TerminalPresenter<W: Write> {
    out: W,
    clock: Box<dyn Clock>,
    visible: Option<&'static str>,
    colored: bool,
}

impl<W: Write> TerminalPresenter<W> {
    pub fn new(out: W, clock: Box<dyn Clock>, colored: bool) -> Self {
        Self {
            out,
            clock,
            visible: None,
            colored,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn paint(&self, style: Style, text: &str) -> String {
        if self.colored {
            style.paint(text).to_string()
        } else {
            text.to_string()
        }
    }

    fn timestamp(&self) -> String {
        self.clock.time().format("%H:%M:%S").to_string()
    }
}

fn kind_style(kind: NotificationKind) -> Style {
    match kind {
        NotificationKind::Success => Colour::Green.normal(),
        NotificationKind::Warning => Colour::Yellow.bold(),
    }
}

fn progress_bar(progress: Percentage) -> String {
    let filled = ((*progress / 100.) * PROGRESS_WIDTH as f64).round() as usize;
    let filled = filled.min(PROGRESS_WIDTH);
    format!(
        "[{}{}] {progress}",
        "#".repeat(filled),
        "-".repeat(PROGRESS_WIDTH - filled)
    )
}

impl<W: Write> Presenter for TerminalPresenter<W> {
    fn show_warning(&mut self, dialog: &WarningDialog) -> Result<()> {
        let title = self.paint(Colour::Yellow.bold(), &format!("! {}", dialog.title));
        let actions = format!(
            "[c] {}   [q] {}",
            dialog.continue_label, dialog.logout_label
        );
        writeln!(self.out, "\n[{}] {title}", self.timestamp())?;
        writeln!(self.out, "  {}", dialog.body)?;
        writeln!(self.out, "  {}", self.paint(Style::new().dimmed(), &actions))?;
        write!(self.out, "  {}", progress_bar(Percentage::ZERO))?;
        self.out.flush()?;
        self.visible = Some(dialog.id);
        Ok(())
    }

    fn warning_visible(&self, id: &str) -> bool {
        self.visible == Some(id)
    }

    fn hide_warning(&mut self, id: &str) -> Result<()> {
        if !self.warning_visible(id) {
            return Ok(());
        }
        writeln!(self.out)?;
        self.out.flush()?;
        self.visible = None;
        Ok(())
    }

    fn update_progress(&mut self, id: &str, progress: Percentage) -> Result<()> {
        if !self.warning_visible(id) {
            return Ok(());
        }
        write!(self.out, "\r  {}", progress_bar(progress))?;
        self.out.flush()?;
        Ok(())
    }

    fn notify(&mut self, notification: &Notification) -> Result<()> {
        let message = self.paint(kind_style(notification.kind), &notification.message);
        // A toast appearing under an open progress bar needs its own line.
        let separator = if self.visible.is_some() { "\n" } else { "" };
        writeln!(self.out, "{separator}[{}] {message}", self.timestamp())?;
        self.out.flush()?;
        Ok(())
    }
}

/// "Navigates" by announcing the destination. The process ends right after.
pub struct TerminalNavigator<W: Write> {
    out: W,
}

impl<W: Write> TerminalNavigator<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Navigator for TerminalNavigator<W> {
    fn navigate(&mut self, destination: &str) -> Result<()> {
        writeln!(self.out, "-> {destination}")?;
        self.out.flush()?;
        Ok(())
    }
}
