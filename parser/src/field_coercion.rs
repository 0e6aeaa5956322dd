use crate::types::LogEvent;
use crate::user_agent::UserAgentDecoder;
use chrono::DateTime;

/// The named capture groups an access pattern may produce.
///
/// Each variant knows its group name and how to coerce a raw capture into
/// the matching `LogEvent` attribute, so an unrecognised or misspelled group
/// name can never silently write to the wrong field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessField {
    Time,
    ClientId,
    Status,
    Method,
    Url,
    ProtocolVersion,
    UpstreamAddr,
    UserAgent,
}

impl AccessField {
    pub const ALL: [AccessField; 8] = [
        AccessField::Time,
        AccessField::ClientId,
        AccessField::Status,
        AccessField::Method,
        AccessField::Url,
        AccessField::ProtocolVersion,
        AccessField::UpstreamAddr,
        AccessField::UserAgent,
    ];

    pub fn group_name(self) -> &'static str {
        match self {
            AccessField::Time => "time",
            AccessField::ClientId => "client_id",
            AccessField::Status => "status",
            AccessField::Method => "method",
            AccessField::Url => "url",
            AccessField::ProtocolVersion => "protocol_version",
            AccessField::UpstreamAddr => "upstream_addr",
            AccessField::UserAgent => "user_agent",
        }
    }

    pub fn from_group_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.group_name() == name)
    }

    /// Coerce `raw` into this field of `event`.
    ///
    /// Never fails: a status that is not a base-10 `u64` becomes `0`, and a
    /// timestamp that is not RFC 3339 leaves `time` unset.
    pub fn apply<D>(self, event: &mut LogEvent, raw: &str, decoder: &D)
    where
        D: UserAgentDecoder + ?Sized,
    {
        match self {
            AccessField::Time => event.time = DateTime::parse_from_rfc3339(raw).ok(),
            AccessField::Status => event.status = raw.parse().unwrap_or(0),
            AccessField::UserAgent => {
                event.user_agent_raw = raw.to_string();
                event.user_agent = decoder.decode(raw);
            }
            AccessField::ClientId => event.client_id = raw.to_string(),
            AccessField::Method => event.method = raw.to_string(),
            AccessField::Url => event.url = raw.to_string(),
            AccessField::ProtocolVersion => event.protocol_version = raw.to_string(),
            AccessField::UpstreamAddr => event.upstream_addr = raw.to_string(),
        }
    }
}
