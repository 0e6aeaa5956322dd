use owo_colors::{OwoColorize, Style};
use parser::{EventSink, LogEvent, ParseError};
use std::fmt::Write as _;
use std::io::Write;

fn status_emoji(status: u64) -> &'static str {
    match status {
        200 => "🎉",
        201 => "🔨",
        301 | 302 => "👉",
        400 => "👎",
        401 => "✋",
        404 => "🤷",
        500 => "😱",
        504 => "⌛",
        _ => "🤷",
    }
}

fn status_style(status: u64) -> Style {
    let badge = Style::new().white().bold();
    match status {
        200 | 201 => badge.on_bright_green(),
        301 => badge.on_bright_cyan(),
        302 | 400 | 401 | 404 => badge.on_bright_yellow(),
        500 | 504 => badge.on_bright_red(),
        _ => badge.on_yellow(),
    }
}

/// Human-oriented, emoji-decorated rendering, one block per event.
pub struct PrettySink<W: Write> {
    out: W,
    color: bool,
    time_format: String,
}

impl<W: Write> PrettySink<W> {
    pub fn new(out: W, color: bool, time_format: impl Into<String>) -> Self {
        Self {
            out,
            color,
            time_format: time_format.into(),
        }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn paint(&self, text: &str, style: Style) -> String {
        if self.color {
            text.style(style).to_string()
        } else {
            text.to_string()
        }
    }

    fn format_time(&self, event: &LogEvent) -> Result<String, ParseError> {
        let Some(time) = event.time else {
            return Ok("-".to_string());
        };

        let mut formatted = String::new();
        write!(formatted, "{}", time.format(&self.time_format))
            .map_err(|_| format!("invalid time format: {}", self.time_format))?;
        Ok(formatted)
    }
}

impl<W: Write> EventSink for PrettySink<W> {
    fn emit(&mut self, event: &LogEvent) -> Result<(), ParseError> {
        let time = self.format_time(event)?;
        let mut block = format!(
            "{}\n🤡  {}\n{}  {}  {}  {}\n",
            self.paint(&time, Style::new().bright_black()),
            self.paint(&event.client_id, Style::new().yellow()),
            status_emoji(event.status),
            self.paint(&format!(" {} ", event.status), status_style(event.status)),
            self.paint(&event.method, Style::new().bright_cyan().bold()),
            self.paint(&event.url, Style::new().white()),
        );

        if let Some(ua) = &event.user_agent {
            block.push_str(&format!(
                "🌎  {} {}  🖥️  {}\n",
                self.paint(&ua.browser, Style::new().magenta().bold()),
                self.paint(&format!("({})", ua.browser_version), Style::new().bright_black()),
                self.paint(&ua.os_name, Style::new().magenta().bold()),
            ));
        }

        if let Some(message) = &event.error_message {
            block.push_str(&format!("📩  {}\n", self.paint(message, Style::new().red())));
        }

        block.push('\n');
        self.out.write_all(block.as_bytes())?;
        self.out.flush()?;
        Ok(())
    }
}
