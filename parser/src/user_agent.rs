use crate::types::UserAgentInfo;
use woothee::parser::Parser;

/// Turns a raw `User-Agent` header into browser and OS names.
///
/// Returning `None` is the absence signal: decoding was not attempted or
/// produced nothing usable. Sinks must cope with it.
pub trait UserAgentDecoder {
    fn decode(&self, raw: &str) -> Option<UserAgentInfo>;
}

impl<D: UserAgentDecoder + ?Sized> UserAgentDecoder for Box<D> {
    fn decode(&self, raw: &str) -> Option<UserAgentInfo> {
        (**self).decode(raw)
    }
}

pub struct WootheeDecoder {
    parser: Parser,
}

impl WootheeDecoder {
    pub fn new() -> Self {
        Self {
            parser: Parser::new(),
        }
    }
}

impl Default for WootheeDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl UserAgentDecoder for WootheeDecoder {
    fn decode(&self, raw: &str) -> Option<UserAgentInfo> {
        // nginx writes "-" when the header was missing
        if raw.is_empty() || raw == "-" {
            return None;
        }

        let result = self.parser.parse(raw)?;

        Some(UserAgentInfo {
            browser: result.name.to_string(),
            browser_version: result.version.to_string(),
            os_name: result.os.to_string(),
        })
    }
}

/// Never decodes anything.
pub struct NoopDecoder;

impl UserAgentDecoder for NoopDecoder {
    fn decode(&self, _raw: &str) -> Option<UserAgentInfo> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_woothee_decodes_firefox() {
        let decoder = WootheeDecoder::new();
        let info = decoder
            .decode("Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:109.0) Gecko/20100101 Firefox/115.0")
            .unwrap();

        assert_eq!(info.browser, "Firefox");
        assert_eq!(info.browser_version, "115.0");
        assert!(info.os_name.starts_with("Windows"));
    }

    #[test]
    fn test_woothee_skips_missing_header() {
        let decoder = WootheeDecoder::new();
        assert!(decoder.decode("-").is_none());
        assert!(decoder.decode("").is_none());
    }

    #[test]
    fn test_boxed_decoder() {
        let decoder: Box<dyn UserAgentDecoder> = Box::new(NoopDecoder);
        assert!(decoder.decode("Mozilla/5.0").is_none());
    }
}
