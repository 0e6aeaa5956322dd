use crate::field_coercion::AccessField;
use crate::types::ParseError;
use regex::Regex;
use tracing::{debug, warn};

/// Default access log template, written with nginx variable names.
pub const ACCESS_LOG_FORMAT: &str =
    r#"[$time_iso8601] $http_x_username $status "$request" $upstream_addr "$http_user_agent""#;

/// Placeholder token to pattern replacement, tried in this order at every
/// position of the template. Tokens sharing a prefix must list the longer
/// one first.
///
/// `$request` expands into three groups so the request line arrives
/// already split into method, URL and protocol version. Digits are spelled
/// `[0-9]` because `\d` would also accept non-ASCII digits.
pub const ACCESS_PLACEHOLDERS: &[(&str, &str)] = &[
    ("$time_iso8601", r"(?P<time>.*)"),
    ("$http_x_username", r"(?P<client_id>.*)"),
    ("$status", r"(?P<status>[0-9]+)"),
    ("$upstream_addr", r"(?P<upstream_addr>.*)"),
    ("$http_user_agent", r"(?P<user_agent>.*)"),
    (
        "$request",
        r"(?P<method>.*) (?P<url>.*) HTTP/(?P<protocol_version>[0-9](?:\.[0-9])?)",
    ),
    ("[", r"\["),
    ("]", r"\]"),
];

/// Rewrite `template` into a regular expression.
///
/// Single left-to-right pass: at each position the first entry of
/// `placeholders` whose token starts there is substituted and scanning
/// resumes after the token. Replacement text is never rescanned. The result
/// is anchored at the end of the line only.
pub fn compile_template(template: &str, placeholders: &[(&str, &str)]) -> String {
    let mut pattern = String::with_capacity(template.len() * 2);
    let mut rest = template;

    'scan: while !rest.is_empty() {
        for (token, replacement) in placeholders {
            if !token.is_empty() && rest.starts_with(token) {
                pattern.push_str(replacement);
                rest = &rest[token.len()..];
                continue 'scan;
            }
        }

        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            pattern.push(c);
        }
        rest = chars.as_str();
    }

    pattern.push('$');
    pattern
}

/// A compiled access line pattern with its groups resolved to fields.
#[derive(Debug, Clone)]
pub struct AccessPattern {
    regex: Regex,
    fields: Vec<(usize, AccessField)>,
}

impl AccessPattern {
    /// Compile `template` using the fixed `ACCESS_PLACEHOLDERS` table.
    ///
    /// Fails when the resulting expression is invalid, which includes a
    /// placeholder appearing twice, or when no placeholder was recognised.
    pub fn compile(template: &str) -> Result<Self, ParseError> {
        let source = compile_template(template, ACCESS_PLACEHOLDERS);
        debug!("Compiled access template into pattern: {}", source);

        let regex = Regex::new(&source)?;

        let mut fields = Vec::new();
        for (index, name) in regex.capture_names().enumerate() {
            let Some(name) = name else { continue };
            match AccessField::from_group_name(name) {
                Some(field) => fields.push((index, field)),
                None => warn!("Ignoring unknown capture group '{}' in access template", name),
            }
        }

        if fields.is_empty() {
            return Err(format!("access template has no recognised placeholders: {template}").into());
        }

        Ok(Self { regex, fields })
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    pub fn fields(&self) -> impl Iterator<Item = AccessField> + '_ {
        self.fields.iter().map(|(_, field)| *field)
    }

    /// Match `line` and return the raw capture for every field that took
    /// part in the match. `None` when the line does not match at all.
    pub fn captures<'l>(&self, line: &'l str) -> Option<Vec<(AccessField, &'l str)>> {
        let caps = self.regex.captures(line)?;

        Some(
            self.fields
                .iter()
                .filter_map(|(index, field)| caps.get(*index).map(|m| (*field, m.as_str())))
                .collect(),
        )
    }
}
