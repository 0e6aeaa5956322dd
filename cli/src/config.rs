use anyhow::bail;
use chrono::format::{Item, StrftimeItems};
use clap::{Parser, ValueEnum};
use parser::ACCESS_LOG_FORMAT;

pub const DEFAULT_TIME_FORMAT: &str = "%d %B %Y, %I:%M:%S %p";

/// Pretty-print reverse-proxy access logs piped on stdin.
#[derive(Debug, Parser)]
#[command(name = "logpretty", version)]
pub struct Config {
    /// Access log template, written with nginx variable names
    #[arg(long, env = "LOGPRETTY_FORMAT", default_value = ACCESS_LOG_FORMAT)]
    pub format: String,

    #[arg(short, long, env = "LOGPRETTY_OUTPUT", value_enum, default_value_t = OutputMode::Pretty)]
    pub output: OutputMode,

    #[arg(long, env = "LOGPRETTY_COLOR", value_enum, default_value_t = ColorMode::Auto)]
    pub color: ColorMode,

    /// strftime layout for timestamps in pretty output
    #[arg(long, env = "LOGPRETTY_TIME_FORMAT", default_value = DEFAULT_TIME_FORMAT)]
    pub time_format: String,

    /// Skip browser and OS detection
    #[arg(long)]
    pub no_user_agent: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    Pretty,
    Json,
    Csv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

impl ColorMode {
    pub fn enabled(self, stdout_is_terminal: bool, no_color: bool) -> bool {
        match self {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => stdout_is_terminal && !no_color,
        }
    }
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if StrftimeItems::new(&self.time_format).any(|item| matches!(item, Item::Error)) {
            bail!("invalid --time-format: {}", self.time_format);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_command_is_well_formed() {
        Config::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let config = Config::try_parse_from(["logpretty"]).unwrap();
        assert_eq!(config.format, ACCESS_LOG_FORMAT);
        assert_eq!(config.output, OutputMode::Pretty);
        assert_eq!(config.color, ColorMode::Auto);
        assert_eq!(config.time_format, DEFAULT_TIME_FORMAT);
        assert!(!config.no_user_agent);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_flags() {
        let config = Config::try_parse_from([
            "logpretty",
            "-o",
            "csv",
            "--color",
            "never",
            "--format",
            "$status $upstream_addr",
            "--no-user-agent",
        ])
        .unwrap();

        assert_eq!(config.output, OutputMode::Csv);
        assert_eq!(config.color, ColorMode::Never);
        assert_eq!(config.format, "$status $upstream_addr");
        assert!(config.no_user_agent);
    }

    #[test]
    fn test_rejects_unknown_output() {
        assert!(Config::try_parse_from(["logpretty", "--output", "xml"]).is_err());
    }

    #[test]
    fn test_invalid_time_format() {
        let config = Config::try_parse_from(["logpretty", "--time-format", "%Q"]).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_color_mode() {
        assert!(ColorMode::Always.enabled(false, true));
        assert!(!ColorMode::Never.enabled(true, false));
        assert!(ColorMode::Auto.enabled(true, false));
        assert!(!ColorMode::Auto.enabled(true, true));
        assert!(!ColorMode::Auto.enabled(false, false));
    }
}
