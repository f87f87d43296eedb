//! Queued console output.
//!
//! # Responsibilities
//! - Accept lines from any pipeline execution without blocking it
//! - Drain lines in strict enqueue order on a single consumer task
//! - Decode embedded color directives and render them via crossterm
//!
//! # Design Decisions
//! - Multi-producer, single-consumer: the terminal is a shared resource,
//!   and one writer keeps interleaving impossible
//! - The consumer blocks on the channel instead of sleep-polling; the
//!   drain barrier waits on a Notify instead of re-checking on a timer
//! - A render failure is reported through tracing, never back to the
//!   producer: losing a console line must not fail a request

use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crossterm::style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor};
use crossterm::queue;
use tokio::sync::mpsc;
use tokio::sync::Notify;

use crate::events::style::{self, Segment};

enum ConsoleMessage {
    Line(String),
    Shutdown,
}

/// Handle to the console queue. Cloning produces another producer; the
/// single consumer task is spawned by [`ConsoleSink::start`].
#[derive(Clone)]
pub struct ConsoleSink {
    tx: mpsc::UnboundedSender<ConsoleMessage>,
    pending: Arc<AtomicUsize>,
    drained: Arc<Notify>,
    running: Arc<AtomicBool>,
}

impl ConsoleSink {
    /// Spawn the consumer task and return the producer handle.
    pub fn start() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let pending = Arc::new(AtomicUsize::new(0));
        let drained = Arc::new(Notify::new());
        let running = Arc::new(AtomicBool::new(true));

        tokio::spawn(service(
            rx,
            Arc::clone(&pending),
            Arc::clone(&drained),
            Arc::clone(&running),
        ));

        Self {
            tx,
            pending,
            drained,
            running,
        }
    }

    /// Queue one line for output. Never blocks; lines sent after the sink
    /// stopped are dropped.
    pub fn write_line(&self, line: impl Into<String>) {
        if !self.running.load(Ordering::SeqCst) {
            return;
        }
        self.pending.fetch_add(1, Ordering::SeqCst);
        if self.tx.send(ConsoleMessage::Line(line.into())).is_err() {
            self.pending.fetch_sub(1, Ordering::SeqCst);
        }
    }

    /// Drain barrier: wait until every queued line has been rendered.
    /// Returns early if the sink has been stopped.
    pub async fn wait_empty(&self) {
        loop {
            let notified = self.drained.notified();
            if !self.running.load(Ordering::SeqCst) || self.pending.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }

    /// Stop the consumer after the lines already queued ahead of the stop
    /// marker have been rendered.
    pub fn stop(&self) {
        let _ = self.tx.send(ConsoleMessage::Shutdown);
    }

    /// Whether the consumer is still accepting lines.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

async fn service(
    mut rx: mpsc::UnboundedReceiver<ConsoleMessage>,
    pending: Arc<AtomicUsize>,
    drained: Arc<Notify>,
    running: Arc<AtomicBool>,
) {
    let mut out = std::io::stdout();
    while let Some(message) = rx.recv().await {
        match message {
            ConsoleMessage::Line(line) => {
                if let Err(error) = render_line(&mut out, &line) {
                    tracing::warn!(%error, "console render failed");
                }
                if pending.fetch_sub(1, Ordering::SeqCst) == 1 {
                    drained.notify_waiters();
                }
            }
            ConsoleMessage::Shutdown => break,
        }
    }
    running.store(false, Ordering::SeqCst);
    let mut out = std::io::stdout();
    let _ = queue!(out, ResetColor);
    let _ = out.flush();
    drained.notify_waiters();
}

fn render_line(out: &mut impl Write, line: &str) -> std::io::Result<()> {
    for segment in style::decode(line) {
        match segment {
            Segment::Literal(text) => queue!(out, Print(text))?,
            Segment::SetForeground(index) => queue!(out, SetForegroundColor(palette(index)))?,
            Segment::SetBackground(index) => queue!(out, SetBackgroundColor(palette(index)))?,
        }
    }
    queue!(out, Print("\n"))?;
    out.flush()
}

/// Map a 0–15 palette index to its crossterm color, in the legacy console
/// color order.
fn palette(index: u8) -> Color {
    match index {
        0 => Color::Black,
        1 => Color::DarkBlue,
        2 => Color::DarkGreen,
        3 => Color::DarkCyan,
        4 => Color::DarkRed,
        5 => Color::DarkMagenta,
        6 => Color::DarkYellow,
        7 => Color::Grey,
        8 => Color::DarkGrey,
        9 => Color::Blue,
        10 => Color::Green,
        11 => Color::Cyan,
        12 => Color::Red,
        13 => Color::Magenta,
        14 => Color::Yellow,
        _ => Color::White,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::style::Tint;

    #[tokio::test]
    async fn drains_queued_lines_in_order() {
        let sink = ConsoleSink::start();
        for i in 0..32 {
            sink.write_line(format!("line {}", i));
        }
        sink.wait_empty().await;
        assert_eq!(sink.pending.load(Ordering::SeqCst), 0);
        assert!(sink.is_running());
    }

    #[tokio::test]
    async fn wait_empty_returns_after_stop() {
        let sink = ConsoleSink::start();
        sink.write_line(style::encode(&[
            Tint::Cyan.fg(),
            Segment::Literal("bye".to_string()),
        ]));
        sink.stop();
        sink.wait_empty().await;
        assert!(!sink.is_running());
    }

    #[tokio::test]
    async fn lines_after_stop_are_dropped() {
        let sink = ConsoleSink::start();
        sink.stop();
        while sink.is_running() {
            tokio::task::yield_now().await;
        }
        sink.write_line("ignored");
        assert_eq!(sink.pending.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn render_writes_ansi_and_text() {
        let mut buffer = Vec::new();
        let line = style::encode(&[
            Tint::Green.fg(),
            Segment::Literal("[200 - OK]".to_string()),
            Tint::White.fg(),
        ]);
        render_line(&mut buffer, &line).unwrap();
        let rendered = String::from_utf8(buffer).unwrap();
        assert!(rendered.contains("[200 - OK]"));
        assert!(rendered.ends_with('\n'));
    }
}
