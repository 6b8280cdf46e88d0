//! Post-processing for the duplication report.
//!
//! The duplicate detector has no exclusion support of its own, so entries
//! whose file references all live under excluded paths are stripped from
//! the report after the fact. The file is then rewritten with an explicit
//! UTF-8 declaration; the CI dashboard's parser rejects anything else.

use crate::exclusions::ExclusionSet;
use crate::PipelineError;
use quick_xml::events::{BytesDecl, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use regex::Regex;
use std::fs;
use std::path::Path;

/// Remove every duplication entry whose file references are all under an
/// excluded prefix. Entries with at least one surviving file are kept
/// untouched, excluded references included. Returns the number of entries
/// removed.
pub fn filter_excluded(
    report: &Path,
    exclusions: &ExclusionSet,
    workdir: &Path,
) -> Result<usize, PipelineError> {
    if exclusions.is_empty() {
        return Ok(0);
    }
    let pattern = combined_pattern(&exclusions.absolute_prefixes(workdir));
    let content = fs::read_to_string(report)?;
    let (filtered, removed) = filter_content(&content, &pattern)?;
    fs::write(report, filtered)?;
    Ok(removed)
}

/// Rewrite the report declaring UTF-8 content, decoding whatever bytes the
/// duplicate detector emitted. Runs after the filter pass, on its output.
pub fn normalize_encoding(report: &Path) -> Result<(), PipelineError> {
    let raw = fs::read(report)?;
    let content = String::from_utf8_lossy(&raw);

    let mut reader = Reader::from_str(&content);
    let mut writer = Writer::new(Vec::new());
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml_error)?;
    writer
        .write_event(Event::Text(BytesText::new("\n")))
        .map_err(xml_error)?;

    let mut buf = Vec::new();
    loop {
        let event = reader.read_event_into(&mut buf).map_err(xml_error)?;
        match event {
            Event::Eof => break,
            Event::Decl(_) => {}
            other => writer.write_event(other).map_err(xml_error)?,
        }
        buf.clear();
    }

    fs::write(report, writer.into_inner())?;
    Ok(())
}

/// One alternation over all absolute exclusion prefixes.
fn combined_pattern(prefixes: &[String]) -> Regex {
    let alternation = prefixes
        .iter()
        .map(|prefix| regex::escape(prefix))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!("({})", alternation)).unwrap()
}

fn filter_content(content: &str, pattern: &Regex) -> Result<(Vec<u8>, usize), PipelineError> {
    let mut reader = Reader::from_str(content);
    let mut writer = Writer::new(Vec::new());
    let mut buf = Vec::new();

    // Events of the duplication entry currently being scanned; flushed or
    // dropped once its end tag closes.
    let mut pending: Vec<Event<'static>> = Vec::new();
    let mut in_entry = false;
    let mut depth = 0usize;
    let mut all_excluded = true;
    let mut removed = 0usize;

    loop {
        let event = reader.read_event_into(&mut buf).map_err(xml_error)?;
        match event {
            Event::Eof => break,

            Event::Start(ref element) if !in_entry && element.name().as_ref() == b"duplication" => {
                in_entry = true;
                depth = 1;
                all_excluded = true;
                pending.push(event.into_owned());
            }

            // A childless entry references no files; nothing in it can
            // survive exclusion.
            Event::Empty(ref element) if !in_entry && element.name().as_ref() == b"duplication" => {
                removed += 1;
            }

            Event::Start(ref element) if in_entry => {
                depth += 1;
                if element.name().as_ref() == b"file" && !file_is_excluded(element, pattern) {
                    all_excluded = false;
                }
                pending.push(event.into_owned());
            }

            Event::Empty(ref element) if in_entry => {
                if element.name().as_ref() == b"file" && !file_is_excluded(element, pattern) {
                    all_excluded = false;
                }
                pending.push(event.into_owned());
            }

            Event::End(_) if in_entry => {
                depth -= 1;
                pending.push(event.into_owned());
                if depth == 0 {
                    in_entry = false;
                    if all_excluded {
                        removed += 1;
                        pending.clear();
                    } else {
                        for held in pending.drain(..) {
                            writer.write_event(held).map_err(xml_error)?;
                        }
                    }
                }
            }

            other if in_entry => pending.push(other.into_owned()),

            other => writer.write_event(other).map_err(xml_error)?,
        }
        buf.clear();
    }

    Ok((writer.into_inner(), removed))
}

/// A file reference with no `path` attribute counts as non-excluded.
fn file_is_excluded(element: &BytesStart, pattern: &Regex) -> bool {
    for attr in element.attributes().flatten() {
        if attr.key.as_ref() == b"path" {
            let path = String::from_utf8_lossy(&attr.value);
            return pattern.is_match(&path);
        }
    }
    false
}

fn xml_error<E: std::fmt::Display>(error: E) -> PipelineError {
    PipelineError::ReportParse(error.to_string())
}
