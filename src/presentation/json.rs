use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::utils::{clock::Clock, percentage::Percentage};

use super::{Navigator, Notification, Presenter, WarningDialog};

/// One line of output. Meant for a front end that renders the dialog itself.
#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PresentationEvent<'a> {
    WarningShown {
        at: DateTime<Utc>,
        dialog: &'a WarningDialog,
    },
    WarningHidden {
        at: DateTime<Utc>,
        id: &'a str,
    },
    Progress {
        at: DateTime<Utc>,
        id: &'a str,
        percent: f64,
    },
    Notification {
        at: DateTime<Utc>,
        #[serde(flatten)]
        notification: &'a Notification,
    },
    Navigation {
        at: DateTime<Utc>,
        destination: &'a str,
    },
}

fn write_event(out: &mut impl Write, event: &PresentationEvent) -> Result<()> {
    serde_json::to_writer(&mut *out, event)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

pub struct JsonLinesPresenter<W: Write> {
    out: W,
    clock: Box<dyn Clock>,
    visible: Option<&'static str>,
}

impl<W: Write> JsonLinesPresenter<W> {
    pub fn new(out: W, clock: Box<dyn Clock>) -> Self {
        Self {
            out,
            clock,
            visible: None,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Presenter for JsonLinesPresenter<W> {
    fn show_warning(&mut self, dialog: &WarningDialog) -> Result<()> {
        let at = self.clock.time();
        write_event(&mut self.out, &PresentationEvent::WarningShown { at, dialog })?;
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
        self.visible = None;
        let at = self.clock.time();
        write_event(&mut self.out, &PresentationEvent::WarningHidden { at, id })
    }

    fn update_progress(&mut self, id: &str, progress: Percentage) -> Result<()> {
        let at = self.clock.time();
        write_event(
            &mut self.out,
            &PresentationEvent::Progress {
                at,
                id,
                percent: *progress,
            },
        )
    }

    fn notify(&mut self, notification: &Notification) -> Result<()> {
        let at = self.clock.time();
        write_event(
            &mut self.out,
            &PresentationEvent::Notification { at, notification },
        )
    }
}

pub struct JsonLinesNavigator<W: Write> {
    out: W,
    clock: Box<dyn Clock>,
}

impl<W: Write> JsonLinesNavigator<W> {
    pub fn new(out: W, clock: Box<dyn Clock>) -> Self {
        Self { out, clock }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Navigator for JsonLinesNavigator<W> {
    fn navigate(&mut self, destination: &str) -> Result<()> {
        let at = self.clock.time();
        write_event(&mut self.out, &PresentationEvent::Navigation { at, destination })
    }
}
