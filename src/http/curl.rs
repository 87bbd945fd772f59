//! Best-effort import of a pasted cURL command.
//!
//! The parser understands the handful of flags a request builder cares about
//! (`-X`, `-H`, `-d` and their long forms) and silently ignores everything
//! else. It never fails: whatever could be recovered is returned, together
//! with the tokens that were not understood.

use std::collections::BTreeMap;

use log::debug;
use serde::Serialize;
use serde_json::Value;

const QUOTES: [char; 2] = ['"', '\''];

/// Payload recovered from a `--data*` flag.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CurlBody {
    Json(Value),
    Raw(String),
}

impl CurlBody {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            CurlBody::Json(value) => Some(value),
            CurlBody::Raw(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedCurlRequest {
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub headers: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<CurlBody>,
    /// Tokens the scan skipped or could not use, in input order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ignored: Vec<String>,
}

impl Default for ParsedCurlRequest {
    fn default() -> Self {
        Self {
            method: "GET".to_string(),
            url: None,
            headers: BTreeMap::new(),
            body: None,
            ignored: Vec::new(),
        }
    }
}

pub fn parse_curl(input: &str) -> ParsedCurlRequest {
    let joined = join_continuations(input);
    let tokens = tokenize(&joined);

    let mut method: Option<String> = None;
    let mut url: Option<String> = None;
    let mut headers = BTreeMap::new();
    let mut body = None;
    let mut ignored = Vec::new();

    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();
        let next = tokens.get(i + 1).map(String::as_str);

        if token == "curl" {
            i += 1;
            continue;
        }

        if url.is_none() {
            let candidate = token.trim_matches(QUOTES);
            if candidate.starts_with("http") {
                url = Some(candidate.to_string());
                i += 1;
                continue;
            }
        }

        match token {
            "-X" | "--request" => {
                let value = next.unwrap_or("GET").trim_matches(QUOTES).to_uppercase();
                method = Some(value);
                i += 2;
            }
            "-H" | "--header" => {
                let raw = next.unwrap_or_default();
                match split_header(strip_one_quote(raw)) {
                    Some((name, value)) => {
                        headers.insert(name.to_string(), value.to_string());
                    }
                    None => ignored.push(raw.to_string()),
                }
                i += 2;
            }
            "--data" | "--data-raw" | "--data-binary" | "-d" => {
                let cleaned = strip_one_quote(next.unwrap_or_default());
                body = Some(match serde_json::from_str::<Value>(cleaned) {
                    Ok(value) => CurlBody::Json(value),
                    Err(_) => CurlBody::Raw(cleaned.to_string()),
                });
                if method.is_none() {
                    method = Some("POST".to_string());
                }
                i += 2;
            }
            _ => {
                ignored.push(token.to_string());
                i += 1;
            }
        }
    }

    let parsed = ParsedCurlRequest {
        method: method.unwrap_or_else(|| "GET".to_string()),
        url,
        headers,
        body,
        ignored,
    };
    debug!(
        "parsed curl: {} {:?}, {} header(s), {} ignored token(s)",
        parsed.method,
        parsed.url,
        parsed.headers.len(),
        parsed.ignored.len()
    );
    parsed
}

/// Replaces each backslash-newline continuation (optionally `\r\n`) with a space.
fn join_continuations(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.peek() {
                Some('\n') => {
                    chars.next();
                    out.push(' ');
                    continue;
                }
                Some('\r') => {
                    let mut lookahead = chars.clone();
                    lookahead.next();
                    if lookahead.peek() == Some(&'\n') {
                        chars.next();
                        chars.next();
                        out.push(' ');
                        continue;
                    }
                }
                _ => {}
            }
        }
        out.push(c);
    }
    out
}

/// Splits on whitespace runs, except inside single or double quotes. The
/// quote characters stay in the token so each flag can strip them itself.
/// An unterminated quote swallows the rest of the input.
fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for c in input.chars() {
        match quote {
            Some(open) => {
                current.push(c);
                if c == open {
                    quote = None;
                }
            }
            None if c.is_whitespace() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            None => {
                if QUOTES.contains(&c) {
                    quote = Some(c);
                }
                current.push(c);
            }
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Drops at most one leading and one trailing quote character.
fn strip_one_quote(value: &str) -> &str {
    let value = value.strip_prefix(QUOTES).unwrap_or(value);
    value.strip_suffix(QUOTES).unwrap_or(value)
}

fn split_header(raw: &str) -> Option<(&str, &str)> {
    let (name, value) = raw.split_once(':')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name, value.trim()))
}
