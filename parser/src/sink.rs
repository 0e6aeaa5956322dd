use crate::types::{LogEvent, ParseError};
use serde::Serialize;
use std::io::Write;
use tracing::info;

/// Consumer of assembled events.
///
/// Receives each event exactly once, in input order, and must not keep it
/// past the call.
pub trait EventSink {
    fn emit(&mut self, event: &LogEvent) -> Result<(), ParseError>;

    /// Called once after the last event.
    fn finish(&mut self) -> Result<(), ParseError> {
        Ok(())
    }
}

impl<S: EventSink + ?Sized> EventSink for Box<S> {
    fn emit(&mut self, event: &LogEvent) -> Result<(), ParseError> {
        (**self).emit(event)
    }

    fn finish(&mut self) -> Result<(), ParseError> {
        (**self).finish()
    }
}

/// Feed every event into `sink`, stopping at the first error from either
/// side. Returns the number of events emitted.
pub fn pipe<I, S>(events: I, sink: &mut S) -> Result<u64, ParseError>
where
    I: IntoIterator<Item = Result<LogEvent, ParseError>>,
    S: EventSink + ?Sized,
{
    let mut emitted = 0;
    for event in events {
        sink.emit(&event?)?;
        emitted += 1;
    }
    sink.finish()?;

    info!("Emitted {} events", emitted);
    Ok(emitted)
}

/// One JSON object per line.
pub struct JsonLinesSink<W: Write> {
    out: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> EventSink for JsonLinesSink<W> {
    fn emit(&mut self, event: &LogEvent) -> Result<(), ParseError> {
        serde_json::to_writer(&mut self.out, event)?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        Ok(())
    }
}

/// Flat row written by `CsvSink`; nested user-agent data is spread into
/// its own columns.
#[derive(Debug, Serialize)]
struct CsvRecord<'a> {
    time: String,
    client_id: &'a str,
    status: u64,
    method: &'a str,
    url: &'a str,
    protocol_version: &'a str,
    upstream_addr: &'a str,
    user_agent: &'a str,
    browser: &'a str,
    browser_version: &'a str,
    os_name: &'a str,
    error_message: &'a str,
}

impl<'a> From<&'a LogEvent> for CsvRecord<'a> {
    fn from(event: &'a LogEvent) -> Self {
        let ua = event.user_agent.as_ref();
        Self {
            time: event.time.map(|t| t.to_rfc3339()).unwrap_or_default(),
            client_id: &event.client_id,
            status: event.status,
            method: &event.method,
            url: &event.url,
            protocol_version: &event.protocol_version,
            upstream_addr: &event.upstream_addr,
            user_agent: &event.user_agent_raw,
            browser: ua.map(|u| u.browser.as_str()).unwrap_or_default(),
            browser_version: ua.map(|u| u.browser_version.as_str()).unwrap_or_default(),
            os_name: ua.map(|u| u.os_name.as_str()).unwrap_or_default(),
            error_message: event.error_message.as_deref().unwrap_or_default(),
        }
    }
}

/// CSV with a header row ahead of the first event.
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> CsvSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(out),
        }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> Result<W, ParseError> {
        self.writer
            .into_inner()
            .map_err(|e| ParseError::Io(e.into_error()))
    }
}

impl<W: Write> EventSink for CsvSink<W> {
    fn emit(&mut self, event: &LogEvent) -> Result<(), ParseError> {
        self.writer.serialize(CsvRecord::from(event))?;
        self.writer.flush()?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), ParseError> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UserAgentInfo;
    use chrono::DateTime;

    fn sample_event() -> LogEvent {
        LogEvent {
            time: Some(DateTime::parse_from_rfc3339("2023-01-02T03:04:05+02:00").unwrap()),
            client_id: "alice".to_string(),
            status: 200,
            method: "GET".to_string(),
            url: "/x".to_string(),
            protocol_version: "1.1".to_string(),
            upstream_addr: "10.0.0.1".to_string(),
            user_agent_raw: "Mozilla/5.0".to_string(),
            user_agent: Some(UserAgentInfo {
                browser: "Firefox".to_string(),
                browser_version: "115.0".to_string(),
                os_name: "Linux".to_string(),
            }),
            error_message: Some("connect() failed".to_string()),
        }
    }

    #[test]
    fn test_json_lines_sink() {
        let mut sink = JsonLinesSink::new(Vec::new());
        sink.emit(&sample_event()).unwrap();
        sink.emit(&LogEvent::default()).unwrap();

        let out = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["status"], 200);
        assert_eq!(first["time"], "2023-01-02T03:04:05+02:00");
        assert_eq!(first["user_agent"]["browser"], "Firefox");
        assert_eq!(first["error_message"], "connect() failed");

        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["status"], 0);
        assert!(second["time"].is_null());
        assert!(second.get("error_message").is_none());
    }

    #[test]
    fn test_csv_sink() {
        let mut sink = CsvSink::new(Vec::new());
        sink.emit(&sample_event()).unwrap();
        sink.emit(&LogEvent::default()).unwrap();
        sink.finish().unwrap();

        let out = String::from_utf8(sink.into_inner().unwrap()).unwrap();
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "time,client_id,status,method,url,protocol_version,upstream_addr,user_agent,browser,browser_version,os_name,error_message"
        );
        assert_eq!(
            lines[1],
            "2023-01-02T03:04:05+02:00,alice,200,GET,/x,1.1,10.0.0.1,Mozilla/5.0,Firefox,115.0,Linux,connect() failed"
        );
        assert_eq!(lines[2], ",,0,,,,,,,,,");
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::ErrorKind::BrokenPipe.into())
        }
    }

    fn is_broken_pipe(result: Result<(), ParseError>) -> bool {
        matches!(result, Err(ParseError::Io(e)) if e.kind() == std::io::ErrorKind::BrokenPipe)
    }

    #[test]
    fn test_json_sink_reports_closed_output_as_io() {
        let mut sink = JsonLinesSink::new(ClosedPipe);
        assert!(is_broken_pipe(sink.emit(&sample_event())));
    }

    #[test]
    fn test_csv_sink_reports_closed_output_as_io() {
        let mut sink = CsvSink::new(ClosedPipe);
        assert!(is_broken_pipe(sink.emit(&sample_event())));
    }

    #[test]
    fn test_csv_sink_spilling_buffer_reports_io() {
        let mut event = sample_event();
        event.url = "/".repeat(64 * 1024);
        let mut sink = CsvSink::new(ClosedPipe);
        assert!(is_broken_pipe(sink.emit(&event)));
    }

    struct Collect(Vec<LogEvent>, bool);

    impl EventSink for Collect {
        fn emit(&mut self, event: &LogEvent) -> Result<(), ParseError> {
            self.0.push(event.clone());
            Ok(())
        }

        fn finish(&mut self) -> Result<(), ParseError> {
            self.1 = true;
            Ok(())
        }
    }

    #[test]
    fn test_pipe_preserves_order_and_finishes() {
        let first = sample_event();
        let second = LogEvent::default();
        let mut sink = Collect(Vec::new(), false);

        let emitted = pipe(vec![Ok(first.clone()), Ok(second.clone())], &mut sink).unwrap();

        assert_eq!(emitted, 2);
        assert_eq!(sink.0, vec![first, second]);
        assert!(sink.1);
    }

    #[test]
    fn test_pipe_stops_at_error() {
        let mut sink = Collect(Vec::new(), false);
        let events = vec![
            Ok(LogEvent::default()),
            Err(ParseError::from("read failed")),
            Ok(sample_event()),
        ];

        assert!(pipe(events, &mut sink).is_err());
        assert_eq!(sink.0.len(), 1);
        assert!(!sink.1);
    }
}
