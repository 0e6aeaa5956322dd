mod config;
mod render;

use anyhow::Context;
use clap::Parser as _;
use config::{Config, OutputMode};
use parser::{
    AccessPattern, CsvSink, EventAssembler, EventSink, JsonLinesSink, NoopDecoder, ParseError,
    UserAgentDecoder, WootheeDecoder,
};
use render::PrettySink;
use std::io::{self, IsTerminal};
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    // Logs go to stderr, stdout carries the rendered events
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "logpretty=warn,parser=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let config = Config::parse();
    run(config)
}

fn run(config: Config) -> anyhow::Result<()> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        println!("The command is intended to work with pipes.");
        return Ok(());
    }

    config.validate()?;
    let pattern = AccessPattern::compile(&config.format).context("invalid --format template")?;
    debug!(
        "Access pattern: {} (fields: {:?})",
        pattern.as_str(),
        pattern.fields().collect::<Vec<_>>()
    );

    let decoder: Box<dyn UserAgentDecoder> = if config.no_user_agent {
        Box::new(NoopDecoder)
    } else {
        Box::new(WootheeDecoder::new())
    };
    let mut assembler = EventAssembler::new(stdin.lock(), pattern, decoder)?;

    let stdout = io::stdout();
    let color = config
        .color
        .enabled(stdout.is_terminal(), std::env::var_os("NO_COLOR").is_some());
    let out = stdout.lock();
    let mut sink: Box<dyn EventSink> = match config.output {
        OutputMode::Pretty => Box::new(PrettySink::new(out, color, config.time_format)),
        OutputMode::Json => Box::new(JsonLinesSink::new(out)),
        OutputMode::Csv => Box::new(CsvSink::new(out)),
    };

    match parser::pipe(&mut assembler, &mut sink) {
        Ok(_) => {}
        Err(ParseError::Io(e)) if e.kind() == io::ErrorKind::BrokenPipe => {
            debug!("stdout closed, stopping");
        }
        Err(e) => return Err(e).context("failed to process log stream"),
    }

    let stats = assembler.stats();
    if stats.unmatched > 0 {
        warn!("{} of {} lines did not match the access pattern", stats.unmatched, stats.lines);
    }
    info!(
        "Read {} lines: {} events, {} error annotations, {} orphaned",
        stats.lines, stats.events, stats.error_annotations, stats.orphaned
    );

    Ok(())
}
