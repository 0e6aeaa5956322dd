// Parser crate for reverse-proxy access and error logs
// Turns raw log lines into LogEvent records, one per access line

pub mod types;
pub mod pattern_compiler;
pub mod error_prefix;
pub mod field_coercion;
pub mod event_assembler;
pub mod user_agent;
pub mod sink;

// Re-export main types
pub use types::*;
pub use pattern_compiler::{compile_template, AccessPattern, ACCESS_LOG_FORMAT, ACCESS_PLACEHOLDERS};
pub use error_prefix::{ErrorPrefixDetector, ERROR_MARKER};
pub use field_coercion::AccessField;
pub use event_assembler::{AssemblerStats, EventAssembler};
pub use user_agent::{NoopDecoder, UserAgentDecoder, WootheeDecoder};
pub use sink::{pipe, CsvSink, EventSink, JsonLinesSink};
