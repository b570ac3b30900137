//! Roster file format
//!
//! Rows are `;`-separated UTF-8 text. A row whose only non-empty field is
//! the first one opens a section; other rows are entity rows:
//!
//! ```text
//! Ain;;;
//! Radio A;https://a.example.org;contact@a.example.org, studio@a.example.org;
//! Radio B;https://b.example.org;;desk@elsewhere.net
//! ```
//!
//! An entity row needs a site or an address: a lone name reads as a section
//! header. Fields containing `;`, `"` or a line break are double-quoted, with
//! inner quotes doubled.

use crate::store::error::{StoreError, StoreResult};
use crate::store::roster::{normalize_email, EntityRecord, Roster};
use std::collections::BTreeSet;

const DELIMITER: char = ';';
const EMAIL_SEPARATOR: &str = ", ";
const FIELD_COUNT: usize = 4;

/// Parses a whole roster file
pub fn parse_roster(text: &str) -> StoreResult<Roster> {
    let mut roster = Roster::new();
    let mut current_section: Option<String> = None;

    for (line, fields) in split_rows(text)? {
        if fields.len() > FIELD_COUNT {
            return Err(StoreError::format(
                line,
                format!("expected at most {} fields, got {}", FIELD_COUNT, fields.len()),
            ));
        }

        let non_empty = fields.iter().filter(|f| !f.trim().is_empty()).count();
        if non_empty == 0 {
            continue;
        }

        let name = fields[0].trim();
        if name.is_empty() {
            return Err(StoreError::format(line, "entity row without a name"));
        }

        if non_empty == 1 {
            roster.section_mut(name);
            current_section = Some(name.to_string());
            continue;
        }

        let section = current_section
            .as_deref()
            .ok_or_else(|| StoreError::format(line, "entity row before any section header"))?;

        let mut entity = EntityRecord::new(name, field(&fields, 1).trim());
        entity.domain_emails = parse_emails(line, field(&fields, 2))?;
        entity.unsure_emails = parse_emails(line, field(&fields, 3))?;

        roster.section_mut(section).entities.push(entity);
    }

    Ok(roster)
}

/// Serializes a roster, omitting entities without any address
pub fn write_roster(roster: &Roster) -> String {
    write_roster_where(roster, |_, entity| entity.has_mail())
}

/// Serializes a roster, writing only the entities `keep` accepts
///
/// `keep` receives the section name and the entity. Section headers are
/// always written.
pub fn write_roster_where<F>(roster: &Roster, keep: F) -> String
where
    F: Fn(&str, &EntityRecord) -> bool,
{
    let mut out = String::new();

    for section in roster.sections() {
        push_row(&mut out, &[section.name.as_str(), "", "", ""]);

        for entity in section.entities.iter().filter(|e| keep(&section.name, e)) {
            let domain = join_emails(&entity.domain_emails);
            let unsure = join_emails(&entity.unsure_emails);
            push_row(
                &mut out,
                &[
                    entity.name.as_str(),
                    entity.site_url.as_str(),
                    domain.as_str(),
                    unsure.as_str(),
                ],
            );
        }
    }

    out
}

fn field<'a>(fields: &'a [String], index: usize) -> &'a str {
    fields.get(index).map(String::as_str).unwrap_or_default()
}

fn parse_emails(line: usize, value: &str) -> StoreResult<BTreeSet<String>> {
    let mut emails = BTreeSet::new();
    for email in value.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        if !email.contains('@') {
            return Err(StoreError::format(
                line,
                format!("'{}' is not an email address", email),
            ));
        }
        emails.insert(normalize_email(email));
    }
    Ok(emails)
}

fn join_emails(emails: &BTreeSet<String>) -> String {
    emails
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(EMAIL_SEPARATOR)
}

fn push_row(out: &mut String, fields: &[&str]) {
    let row = fields
        .iter()
        .map(|f| quote_field(f))
        .collect::<Vec<_>>()
        .join(&DELIMITER.to_string());
    out.push_str(&row);
    out.push('\n');
}

fn quote_field(field: &str) -> String {
    if field.contains([DELIMITER, '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Splits text into rows of fields, honouring quotes
///
/// Each row is paired with the 1-based line number it starts on.
fn split_rows(text: &str) -> StoreResult<Vec<(usize, Vec<String>)>> {
    let mut rows = Vec::new();
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut row_line = 1;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    current.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    current.push(c);
                }
                _ => current.push(c),
            }
            continue;
        }

        match c {
            '"' if current.is_empty() => in_quotes = true,
            DELIMITER => fields.push(std::mem::take(&mut current)),
            '\r' => {}
            '\n' => {
                fields.push(std::mem::take(&mut current));
                rows.push((row_line, std::mem::take(&mut fields)));
                line += 1;
                row_line = line;
            }
            _ => current.push(c),
        }
    }

    if in_quotes {
        return Err(StoreError::format(row_line, "unterminated quoted field"));
    }

    if !current.is_empty() || !fields.is_empty() {
        fields.push(current);
        rows.push((row_line, fields));
    }

    Ok(rows)
}
