//! Web fetch tool.
//!
//! Performs an HTTP GET and, for HTML responses, reduces the page to its
//! readable text so the model isn't fed markup.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::debug;
use yaa_core::error::ToolError;
use yaa_core::tool::ToolDefinition;

pub const NAME: &str = "fetch";

#[derive(Debug, Deserialize, JsonSchema)]
pub struct FetchInput {
    /// The URL of the webpage to fetch.
    pub url: String,
}

/// Build the fetch tool, sending `user_agent` with every request when set.
pub fn definition(user_agent: Option<String>) -> ToolDefinition {
    let client = reqwest::Client::new();
    let user_agent: Option<Arc<str>> = user_agent.filter(|ua| !ua.is_empty()).map(Arc::from);

    ToolDefinition::new(
        NAME,
        "Fetch the contents of a given webpage URL.",
        move |input: FetchInput| {
            let client = client.clone();
            let user_agent = user_agent.clone();
            async move { fetch(&client, user_agent.as_deref(), input).await }
        },
    )
}

async fn fetch(
    client: &reqwest::Client,
    user_agent: Option<&str>,
    input: FetchInput,
) -> Result<String, ToolError> {
    let mut request = client.get(&input.url);
    if let Some(ua) = user_agent {
        request = request.header(USER_AGENT, ua);
    }

    let response = request
        .send()
        .await
        .map_err(|e| ToolError::failed(NAME, e))?;

    let status = response.status();
    let is_html = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains("text/html"));

    let body = response
        .bytes()
        .await
        .map_err(|e| ToolError::failed(NAME, e))?;

    debug!(url = %input.url, %status, bytes = body.len(), is_html, "Fetched URL");

    let text = String::from_utf8_lossy(&body);
    if is_html {
        Ok(html_to_text(&text))
    } else {
        Ok(text.into_owned())
    }
}

static SCRIPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b.*?</script\s*>").unwrap());
static STYLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style\b.*?</style\s*>").unwrap());
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());

/// Reduce an HTML document to its visible text.
///
/// Script and style contents are dropped, tags act as word separators,
/// entities are decoded, and whitespace runs collapse to one space.
pub fn html_to_text(html: &str) -> String {
    let text = SCRIPT_RE.replace_all(html, " ");
    let text = STYLE_RE.replace_all(&text, " ");
    let text = TAG_RE.replace_all(&text, " ");
    let text = decode_entities(&text);

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

static ENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z][a-zA-Z0-9]{1,7});").unwrap()
});

/// Decode character references in one pass, so "&amp;lt;" becomes "&lt;".
///
/// Unknown named references are left as written.
fn decode_entities(text: &str) -> String {
    ENTITY_RE
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let reference = &caps[1];
            let decoded = match reference.strip_prefix('#') {
                Some(numeric) => Some(numeric_reference(numeric)),
                None => named_reference(reference),
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}

fn numeric_reference(numeric: &str) -> char {
    let code = match numeric.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => numeric.parse(),
    };
    code.ok()
        .filter(|c| *c != 0)
        .and_then(char::from_u32)
        .unwrap_or(char::REPLACEMENT_CHARACTER)
}

fn named_reference(name: &str) -> Option<char> {
    let c = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => ' ',
        "copy" => '\u{a9}',
        "reg" => '\u{ae}',
        "trade" => '\u{2122}',
        "deg" => '\u{b0}',
        "sect" => '\u{a7}',
        "para" => '\u{b6}',
        "middot" => '\u{b7}',
        "bull" => '\u{2022}',
        "hellip" => '\u{2026}',
        "ndash" => '\u{2013}',
        "mdash" => '\u{2014}',
        "lsquo" => '\u{2018}',
        "rsquo" => '\u{2019}',
        "ldquo" => '\u{201c}',
        "rdquo" => '\u{201d}',
        "laquo" => '\u{ab}',
        "raquo" => '\u{bb}',
        "times" => '\u{d7}',
        "divide" => '\u{f7}',
        "plusmn" => '\u{b1}',
        "cent" => '\u{a2}',
        "pound" => '\u{a3}',
        "yen" => '\u{a5}',
        "euro" => '\u{20ac}',
        _ => return None,
    };
    Some(c)
}
