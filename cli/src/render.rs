//! Terminal rendering for the chat transcript.
//!
//! Every function returns a `String` so output can be asserted in tests;
//! `main` decides where it goes.

use nu_ansi_term::{Color, Style};
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

use crate::prompts::SUGGESTED_PROMPTS;
use crate::session::{ChatMessage, Role};

pub const TITLE: &str = "AI Assistant";
pub const EMPTY_HEADLINE: &str = "How can I help you today?";
pub const EMPTY_SUBTITLE: &str = "Ask me anything or try one of these suggestions";
pub const THINKING: &str = "AI is thinking...";
pub const DISCLAIMER: &str = "AI can make mistakes. Consider checking important information.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    #[must_use]
    pub fn from_dark(dark: bool) -> Self {
        if dark { Self::Dark } else { Self::Light }
    }

    #[must_use]
    pub fn is_dark(self) -> bool {
        self == Self::Dark
    }

    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    fn palette(self) -> Palette {
        match self {
            Self::Light => Palette {
                accent: Style::new().fg(Color::Blue).bold(),
                user: Style::new().fg(Color::Blue),
                assistant: Style::new().fg(Color::Black),
                muted: Style::new().fg(Color::DarkGray),
                success: Style::new().fg(Color::Green),
            },
            Self::Dark => Palette {
                accent: Style::new().fg(Color::LightBlue).bold(),
                user: Style::new().fg(Color::LightBlue),
                assistant: Style::new().fg(Color::LightGray),
                muted: Style::new().fg(Color::DarkGray),
                success: Style::new().fg(Color::LightGreen),
            },
        }
    }
}

struct Palette {
    accent: Style,
    user: Style,
    assistant: Style,
    muted: Style,
    success: Style,
}

/// Format a timestamp as 12-hour `hh:mm AM` in the given offset. A missing
/// timestamp renders as an empty string.
#[must_use]
pub fn format_time(timestamp: Option<OffsetDateTime>, offset: UtcOffset) -> String {
    let Some(ts) = timestamp else {
        return String::new();
    };
    ts.to_offset(offset)
        .format(format_description!("[hour repr:12]:[minute] [period]"))
        .unwrap_or_default()
}

pub struct Renderer {
    pub theme: Theme,
    offset: UtcOffset,
    powered_by: String,
}

impl Renderer {
    #[must_use]
    pub fn new(theme: Theme, offset: UtcOffset, powered_by: &str) -> Self {
        Self { theme, offset, powered_by: powered_by.to_owned() }
    }

    #[must_use]
    pub fn header(&self) -> String {
        let p = self.theme.palette();
        let mode = if self.theme.is_dark() { "dark" } else { "light" };
        format!(
            "{}  {}\n{}\n",
            p.accent.paint(TITLE),
            p.muted.paint(format!("Powered by {}", self.powered_by)),
            p.muted.paint(format!("{mode} mode · /help for commands")),
        )
    }

    #[must_use]
    pub fn empty_state(&self) -> String {
        let p = self.theme.palette();
        let mut out = format!("\n{}\n{}\n\n", p.accent.paint(EMPTY_HEADLINE), p.muted.paint(EMPTY_SUBTITLE));
        for (i, prompt) in SUGGESTED_PROMPTS.iter().enumerate() {
            out.push_str(&format!(
                "  /{}  {}  {}\n",
                i + 1,
                p.muted.paint(format!("[{}]", prompt.category)),
                prompt.text
            ));
        }
        out
    }

    /// Render one transcript entry. `number` is the 1-based position used
    /// by `/copy`.
    #[must_use]
    pub fn message(&self, number: usize, message: &ChatMessage, copied: bool) -> String {
        let p = self.theme.palette();
        let (label, body_style) = match message.role {
            Role::User => ("You", p.user),
            Role::Assistant => ("Assistant", p.assistant),
        };
        let time = format_time(message.timestamp, self.offset);
        let marker = if copied { format!("  {}", p.success.paint("✓ Copied")) } else { String::new() };

        let mut out = format!(
            "\n{} {}  {}{}\n",
            p.muted.paint(format!("#{number}")),
            p.accent.paint(label),
            p.muted.paint(time),
            marker
        );
        for line in message.content.lines() {
            out.push_str(&format!("  {}\n", body_style.paint(line)));
        }
        out
    }

    /// Render the whole transcript, or the empty state when there is none.
    #[must_use]
    pub fn transcript(&self, messages: &[ChatMessage], copied: Option<usize>) -> String {
        if messages.is_empty() {
            return self.empty_state();
        }
        messages
            .iter()
            .enumerate()
            .map(|(i, m)| self.message(i + 1, m, copied == Some(i)))
            .collect()
    }

    #[must_use]
    pub fn thinking(&self) -> String {
        format!("{}\n", self.theme.palette().muted.paint(THINKING))
    }

    #[must_use]
    pub fn footer(&self) -> String {
        format!("{}\n", self.theme.palette().muted.paint(DISCLAIMER))
    }

    #[must_use]
    pub fn notice(&self, text: &str) -> String {
        format!("{}\n", self.theme.palette().muted.paint(text))
    }

    #[must_use]
    pub fn copied_notice(&self, number: usize) -> String {
        format!("{}\n", self.theme.palette().success.paint(format!("✓ Copied message #{number}")))
    }

    #[must_use]
    pub fn prompt(&self) -> String {
        format!("{} ", self.theme.palette().accent.paint(">"))
    }

    #[must_use]
    pub fn help(&self) -> String {
        let lines = [
            "/help         show this help",
            "/prompts      show suggested prompts",
            "/1 .. /4      send a suggested prompt",
            "/copy [n]     copy message n (default: latest reply)",
            "/dark         toggle dark mode",
            "/clear        clear the conversation",
            "/quit         exit",
            "//text        send a message starting with /",
        ];
        let p = self.theme.palette();
        lines.iter().map(|l| format!("  {}\n", p.muted.paint(*l))).collect()
    }
}

#[cfg(test)]
#[path = "render_test.rs"]
mod tests;
