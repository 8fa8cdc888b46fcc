//! Decoders turning raw tool output into line comments.
//!
//! Each external tool speaks its own format. A decoder either produces the
//! complete list of findings or reports that the output was not in the
//! expected shape, in which case the caller treats the run as clean.

use critic_core::LineComment;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use serde::Deserialize;
use std::collections::BTreeMap;

/// Fallback text for a cppcheck record without a `msg` attribute.
const DEFAULT_CPPCHECK_MESSAGE: &str = "Issue found";

/// Output formats understood by the tool-backed analyzers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputDecoder {
    /// cppcheck `--xml`: `<error msg="..">` records, the line taken from the
    /// record itself or from its first `<location line="..">`.
    CppcheckXml,
    /// Line-oriented `path:line:col: message` text (checkstyle `-f plain`).
    ColonDelimited,
    /// eslint `--format json`: file records each holding a `messages` list.
    EslintJson,
    /// flake8 `--format=json`, falling back to `path:line:col:message` text.
    Flake8Json,
}

#[derive(Debug)]
pub struct DecodeError(pub String);

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl OutputDecoder {
    /// Decode combined tool output.
    pub fn decode(&self, output: &str) -> Result<Vec<LineComment>, DecodeError> {
        match self {
            Self::CppcheckXml => decode_cppcheck_xml(output),
            Self::ColonDelimited => Ok(decode_colon_delimited(output)),
            Self::EslintJson => decode_eslint_json(output),
            Self::Flake8Json => {
                decode_flake8_json(output).or_else(|_| Ok(decode_flake8_text(output)))
            }
        }
    }
}

fn parse_line(value: &str) -> u32 {
    value.trim().parse::<u32>().unwrap_or(LineComment::UNKNOWN_LINE)
}

// =============================================================================
// cppcheck
// =============================================================================

#[derive(Default)]
struct PendingError {
    line: Option<u32>,
    message: Option<String>,
}

impl PendingError {
    fn from_element(e: &BytesStart<'_>) -> Result<Self, DecodeError> {
        let mut pending = Self::default();
        for attr in e.attributes() {
            let attr = attr.map_err(|e| DecodeError(format!("bad attribute: {e}")))?;
            let value = attr
                .unescape_value()
                .map_err(|e| DecodeError(format!("bad attribute value: {e}")))?;
            match attr.key.as_ref() {
                b"line" => pending.line = Some(parse_line(&value)).filter(|n| *n > 0),
                b"msg" => pending.message = Some(value.into_owned()),
                _ => {}
            }
        }
        Ok(pending)
    }

    fn take_location(&mut self, e: &BytesStart<'_>) {
        if self.line.is_some() {
            return;
        }
        for attr in e.attributes().flatten() {
            if attr.key.as_ref() == b"line"
                && let Ok(value) = attr.unescape_value()
            {
                self.line = Some(parse_line(&value)).filter(|n| *n > 0);
            }
        }
    }

    fn finish(self) -> LineComment {
        LineComment {
            line: self.line.unwrap_or(LineComment::UNKNOWN_LINE),
            comment: self
                .message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| DEFAULT_CPPCHECK_MESSAGE.to_string()),
        }
    }
}

fn decode_cppcheck_xml(output: &str) -> Result<Vec<LineComment>, DecodeError> {
    // Progress lines precede the XML document in combined output.
    let start = output
        .find("<?xml")
        .or_else(|| output.find('<'))
        .ok_or_else(|| DecodeError("no XML document in output".to_string()))?;

    let mut reader = Reader::from_str(&output[start..]);
    let mut buf = Vec::new();
    let mut comments = Vec::new();
    let mut current: Option<PendingError> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"error" => current = Some(PendingError::from_element(&e)?),
                b"location" => {
                    if let Some(pending) = current.as_mut() {
                        pending.take_location(&e);
                    }
                }
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"error" => comments.push(PendingError::from_element(&e)?.finish()),
                b"location" => {
                    if let Some(pending) = current.as_mut() {
                        pending.take_location(&e);
                    }
                }
                _ => {}
            },
            Ok(Event::End(e)) => {
                if e.name().as_ref() == b"error"
                    && let Some(pending) = current.take()
                {
                    comments.push(pending.finish());
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(DecodeError(format!(
                    "XML parse error at position {}: {e}",
                    reader.buffer_position()
                )));
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(comments)
}

// =============================================================================
// checkstyle
// =============================================================================

fn decode_colon_delimited(output: &str) -> Vec<LineComment> {
    output
        .lines()
        .filter_map(|line| {
            let parts: Vec<&str> = line.split(':').collect();
            if parts.len() < 3 {
                return None;
            }
            Some(LineComment {
                line: parse_line(parts[1]),
                comment: parts[2..].join(":").trim().to_string(),
            })
        })
        .collect()
}

// =============================================================================
// eslint
// =============================================================================

#[derive(Deserialize)]
struct EslintFile {
    #[serde(default)]
    messages: Vec<EslintMessage>,
}

#[derive(Deserialize)]
struct EslintMessage {
    #[serde(default)]
    line: Option<u32>,
    message: String,
}

fn decode_eslint_json(output: &str) -> Result<Vec<LineComment>, DecodeError> {
    let files: Vec<EslintFile> =
        serde_json::from_str(output.trim()).map_err(|e| DecodeError(e.to_string()))?;

    Ok(files
        .into_iter()
        .flat_map(|file| file.messages)
        .map(|msg| LineComment {
            line: msg.line.unwrap_or(LineComment::UNKNOWN_LINE),
            comment: msg.message,
        })
        .collect())
}

// =============================================================================
// flake8
// =============================================================================

#[derive(Deserialize)]
struct Flake8Record {
    #[serde(default)]
    line_number: Option<u32>,
    code: String,
    text: String,
}

/// flake8 emits either a bare record list or records grouped by file path.
#[derive(Deserialize)]
#[serde(untagged)]
enum Flake8Output {
    List(Vec<Flake8Record>),
    ByPath(BTreeMap<String, Vec<Flake8Record>>),
}

fn decode_flake8_json(output: &str) -> Result<Vec<LineComment>, DecodeError> {
    let parsed: Flake8Output =
        serde_json::from_str(output.trim()).map_err(|e| DecodeError(e.to_string()))?;

    let records: Vec<Flake8Record> = match parsed {
        Flake8Output::List(records) => records,
        Flake8Output::ByPath(by_path) => by_path.into_values().flatten().collect(),
    };

    Ok(records
        .into_iter()
        .map(|r| LineComment {
            line: r.line_number.unwrap_or(LineComment::UNKNOWN_LINE),
            comment: format!("{}: {}", r.code, r.text),
        })
        .collect())
}

fn decode_flake8_text(output: &str) -> Vec<LineComment> {
    output
        .lines()
        .filter_map(|line| {
            let parts: Vec<&str> = line.splitn(4, ':').collect();
            if parts.len() < 3 {
                return None;
            }
            Some(LineComment {
                line: parse_line(parts[1]),
                comment: parts.get(3).map(|m| m.trim()).unwrap_or_default().to_string(),
            })
        })
        .collect()
}
