//! Render sinks - platform side of the board

use std::io::{self, Write};
use tokio::sync::watch;

use crate::render::BoardView;

/// Consumes rendered boards
pub trait RenderSink: Send {
    fn render(&mut self, board: &BoardView);
}

/// Publishes every board on a watch channel (latest wins)
#[derive(Debug)]
pub struct WatchSink {
    tx: watch::Sender<Option<BoardView>>,
}

impl WatchSink {
    pub fn channel() -> (Self, watch::Receiver<Option<BoardView>>) {
        let (tx, rx) = watch::channel(None);
        (Self { tx }, rx)
    }
}

impl RenderSink for WatchSink {
    fn render(&mut self, board: &BoardView) {
        self.tx.send_replace(Some(board.clone()));
    }
}

/// Draws the board as text
///
/// Each render clears the screen and redraws everything.
#[derive(Debug)]
pub struct TerminalSink<W: Write> {
    out: W,
    clear: bool,
}

impl TerminalSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout(), true)
    }
}

impl<W: Write> TerminalSink<W> {
    pub fn new(out: W, clear: bool) -> Self {
        Self { out, clear }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn draw(&mut self, board: &BoardView) -> io::Result<()> {
        if self.clear {
            // Move cursor to top-left and clear screen
            write!(self.out, "\x1B[H\x1B[0J")?;
        }

        writeln!(self.out, "{}", board.updated_at)?;
        writeln!(self.out)?;

        if let Some(empty) = &board.empty_text {
            writeln!(self.out, "{}", empty)?;
        }

        for card in &board.cards {
            let mut flags = Vec::new();
            if card.is_new {
                flags.push("NEW");
            }
            if card.is_ready {
                flags.push("READY");
            }
            if card.action.processing {
                flags.push("processing");
            }

            writeln!(
                self.out,
                "{} | {} | {}{}",
                card.label,
                card.table_pill,
                card.service_pill,
                if flags.is_empty() {
                    String::new()
                } else {
                    format!(" [{}]", flags.join(", "))
                }
            )?;
            for line in &card.lines {
                writeln!(self.out, "  {}", line)?;
            }
            if let Some(notes) = &card.notes {
                writeln!(self.out, "  {}", notes)?;
            }
            if !card.meta.is_empty() {
                writeln!(self.out, "  {}", card.meta)?;
            }
            writeln!(self.out, "  id: {}", card.id)?;
            writeln!(self.out, "{}", "-".repeat(32))?;
        }

        self.out.flush()
    }
}

impl<W: Write + Send> RenderSink for TerminalSink<W> {
    fn render(&mut self, board: &BoardView) {
        if let Err(e) = self.draw(board) {
            tracing::warn!(error = %e, "Failed to draw board");
        }
    }
}
