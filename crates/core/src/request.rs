//! Service request parsing.
//!
//! The submitted batch file carries one entry per line:
//!
//! ```text
//! # Date: 16 February 2026
//! 313|Opening|
//! 236|ThanksGiving|
//! 420|Offertory|
//! Message
//! 211|Confession|
//! 171|Communion|
//! |Closing|yeshuveppole aakuvaan
//! ```
//!
//! An empty identifier marks a title-only entry (title required). A bare
//! `Message` line is shorthand for a message-only slide. Anything malformed
//! is a fatal configuration error naming the offending line — the request is
//! never partially executed.

use crate::error::{Error, Result};
use crate::types::{HymnIdentifier, RequestEntry, SectionLabel};

/// A parsed service request: ordered entries plus the optional service date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRequest {
    pub entries: Vec<RequestEntry>,
    /// Free text from the `# Date:` directive, not yet normalized.
    pub service_date: Option<String>,
}

impl ServiceRequest {
    /// Parse the textual request format.
    ///
    /// Validation is strict up front: every line is checked before any
    /// composition starts, so a bad line can never leave a half-built deck.
    pub fn parse(text: &str) -> Result<ServiceRequest> {
        let mut entries = Vec::new();
        let mut service_date = None;

        for (idx, raw_line) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw_line.trim();
            if line.is_empty() {
                continue;
            }

            // `# Date:` directive; all other comment lines are skipped.
            if let Some(rest) = strip_date_directive(line) {
                service_date = Some(rest.to_string());
                continue;
            }
            if line.starts_with('#') {
                continue;
            }

            if line.eq_ignore_ascii_case("message") {
                entries.push(RequestEntry {
                    identifier: None,
                    section: SectionLabel::Message,
                    explicit_title: None,
                });
                continue;
            }

            entries.push(parse_entry_line(line, line_no)?);
        }

        Ok(ServiceRequest {
            entries,
            service_date,
        })
    }
}

/// Strip a `# Date:` / `Date:` prefix, case-insensitively.
fn strip_date_directive(line: &str) -> Option<&str> {
    let lower = line.to_lowercase();
    for prefix in ["# date:", "#date:", "date:"] {
        if lower.starts_with(prefix) {
            return Some(line[prefix.len()..].trim());
        }
    }
    None
}

fn parse_entry_line(line: &str, line_no: usize) -> Result<RequestEntry> {
    let mut parts = line.splitn(3, '|');
    let id_part = parts.next().unwrap_or("").trim();
    let section_part = match parts.next() {
        Some(s) => s.trim(),
        None => {
            return Err(Error::config_at(
                line_no,
                format!("malformed entry '{line}': expected identifier|SectionLabel|optionalTitle"),
            ))
        }
    };
    let title_part = parts.next().map(str::trim).unwrap_or("");

    let section: SectionLabel = section_part.parse().map_err(|_| {
        Error::config_at(
            line_no,
            format!("unrecognized section label '{section_part}' in '{line}'"),
        )
    })?;

    let explicit_title = if title_part.is_empty() {
        None
    } else {
        Some(title_part.to_string())
    };

    let identifier = if id_part.is_empty() {
        if section != SectionLabel::Message && explicit_title.is_none() {
            return Err(Error::config_at(
                line_no,
                format!("entry '{line}' has neither a hymn number nor a title"),
            ));
        }
        // Title-only entries resolve through the normalized title key.
        explicit_title
            .as_deref()
            .filter(|_| section != SectionLabel::Message)
            .map(HymnIdentifier::from_title)
    } else {
        let number: u32 = id_part.parse().map_err(|_| {
            Error::config_at(
                line_no,
                format!("'{id_part}' is not a valid hymn number in '{line}'"),
            )
        })?;
        if number == 0 {
            return Err(Error::config_at(
                line_no,
                format!("hymn number must be positive in '{line}'"),
            ));
        }
        Some(HymnIdentifier::Number(number))
    };

    Ok(RequestEntry {
        identifier,
        section,
        explicit_title,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_request() {
        let text = "# Date: 16 February 2026\n\
                    313|Opening|\n\
                    236|ThanksGiving|\n\
                    Message\n\
                    |Closing|yeshuveppole aakuvaan\n";
        let req = ServiceRequest::parse(text).unwrap();
        assert_eq!(req.service_date.as_deref(), Some("16 February 2026"));
        assert_eq!(req.entries.len(), 4);
        assert_eq!(
            req.entries[0].identifier,
            Some(HymnIdentifier::Number(313))
        );
        assert_eq!(req.entries[0].section, SectionLabel::Opening);
        assert!(req.entries[2].is_message());
        assert_eq!(
            req.entries[3].explicit_title.as_deref(),
            Some("yeshuveppole aakuvaan")
        );
        assert_eq!(
            req.entries[3].identifier,
            Some(HymnIdentifier::from_title("yeshuveppole aakuvaan"))
        );
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let text = "# just a comment\n\n313|Opening|\n";
        let req = ServiceRequest::parse(text).unwrap();
        assert_eq!(req.entries.len(), 1);
        assert!(req.service_date.is_none());
    }

    #[test]
    fn unknown_section_is_fatal_and_names_the_line() {
        let err = ServiceRequest::parse("abc|UnknownSection|x").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("line 1"), "{msg}");
        assert!(msg.contains("UnknownSection"), "{msg}");
    }

    #[test]
    fn non_numeric_identifier_is_fatal() {
        let err = ServiceRequest::parse("abc|Opening|").unwrap_err();
        assert!(err.to_string().contains("abc"));
    }

    #[test]
    fn missing_separator_is_fatal() {
        let err = ServiceRequest::parse("just some words").unwrap_err();
        assert!(err.to_string().contains("just some words"));
    }

    #[test]
    fn title_only_entry_requires_title() {
        let err = ServiceRequest::parse("|Closing|").unwrap_err();
        assert!(err.to_string().contains("neither"));
    }

    #[test]
    fn zero_hymn_number_is_rejected() {
        assert!(ServiceRequest::parse("0|Opening|").is_err());
    }

    #[test]
    fn message_section_line_with_pipes_parses() {
        let req = ServiceRequest::parse("|Message|").unwrap();
        assert!(req.entries[0].is_message());
        assert!(req.entries[0].identifier.is_none());
    }

    #[test]
    fn section_labels_are_case_sensitive() {
        assert!(ServiceRequest::parse("313|opening|").is_err());
    }
}
