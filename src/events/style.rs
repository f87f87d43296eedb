//! The inline color-directive mini-language carried by console lines.
//!
//! # Responsibilities
//! - Define the closed set of line segments: literal text, set-foreground,
//!   set-background
//! - Encode segments into a plain `String` (the queue's wire form) and
//!   decode them back for rendering
//!
//! # Design Decisions
//! - A directive is exactly four characters: `¬`, a channel selector
//!   (`F` or `B`), and two decimal digits forming a 0–15 color index
//! - Producers decide *what* to say; the console sink alone decides *how*
//!   to render, so the queue can stay a queue of plain strings
//! - The escape character restarts a sequence wherever it appears, and it
//!   is scrubbed from literal text at encode time, so a literal can never
//!   smuggle a directive

/// Escape character introducing a color directive.
pub const ESCAPE: char = '¬';

/// One decoded piece of a console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    /// Foreground color index, 0–15.
    SetForeground(u8),
    /// Background color index, 0–15.
    SetBackground(u8),
}

/// The sixteen legacy console colors, in palette-index order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Tint {
    Black = 0,
    DarkBlue = 1,
    DarkGreen = 2,
    DarkCyan = 3,
    DarkRed = 4,
    DarkMagenta = 5,
    DarkYellow = 6,
    Grey = 7,
    DarkGrey = 8,
    Blue = 9,
    Green = 10,
    Cyan = 11,
    Red = 12,
    Magenta = 13,
    Yellow = 14,
    White = 15,
}

impl Tint {
    pub fn fg(self) -> Segment {
        Segment::SetForeground(self as u8)
    }

    pub fn bg(self) -> Segment {
        Segment::SetBackground(self as u8)
    }
}

/// Encode segments into the wire form queued for the console sink.
pub fn encode(segments: &[Segment]) -> String {
    let mut line = String::new();
    for segment in segments {
        match segment {
            Segment::Literal(text) => {
                for c in text.chars() {
                    line.push(if c == ESCAPE { ' ' } else { c });
                }
            }
            Segment::SetForeground(index) => {
                line.push(ESCAPE);
                line.push('F');
                line.push_str(&format!("{:02}", index));
            }
            Segment::SetBackground(index) => {
                line.push(ESCAPE);
                line.push('B');
                line.push_str(&format!("{:02}", index));
            }
        }
    }
    line
}

#[derive(Debug, Clone, Copy)]
enum Channel {
    Foreground,
    Background,
}

#[derive(Debug, Clone, Copy)]
enum DecodeState {
    Literal,
    SawEscape,
    SawChannel(Channel),
    SawTens(Channel, u8),
}

/// Decode a queued line back into segments.
///
/// Malformed sequences (a non-`F`/`B` selector, a non-digit where a digit
/// belongs, or an index above 15) produce no directive; scanning resumes
/// in literal state. A trailing partial sequence is dropped.
pub fn decode(line: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut state = DecodeState::Literal;

    for c in line.chars() {
        if c == ESCAPE {
            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }
            state = DecodeState::SawEscape;
            continue;
        }
        state = match state {
            DecodeState::Literal => {
                literal.push(c);
                DecodeState::Literal
            }
            DecodeState::SawEscape => match c {
                'F' => DecodeState::SawChannel(Channel::Foreground),
                'B' => DecodeState::SawChannel(Channel::Background),
                _ => DecodeState::Literal,
            },
            DecodeState::SawChannel(channel) => match c.to_digit(10) {
                Some(tens) => DecodeState::SawTens(channel, tens as u8),
                None => DecodeState::Literal,
            },
            DecodeState::SawTens(channel, tens) => {
                if let Some(units) = c.to_digit(10) {
                    let index = tens * 10 + units as u8;
                    if index <= 15 {
                        segments.push(match channel {
                            Channel::Foreground => Segment::SetForeground(index),
                            Channel::Background => Segment::SetBackground(index),
                        });
                    }
                }
                DecodeState::Literal
            }
        };
    }
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    segments
}
