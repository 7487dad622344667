//! On-disk encoding of decision tables
//!
//! A config document is a JSON object holding a single `CGEdges` array:
//!
//! ```json
//! { "CGEdges": [
//!     { "caller": "f", "callee": "g", "location": [[10, 3]], "decision": true }
//! ] }
//! ```
//!
//! Field names and ordering are part of the format. Documents recorded by one
//! session must load unchanged in every later replay session.

use serde::{Deserialize, Serialize};
use std::io::{self, Read, Write};
use std::path::Path;

use crate::error::{AdvisorError, Result};
use crate::key::{CallEdgeKey, SourceLoc};
use crate::record::DecisionRecord;

/// Path standing for stdin when loading and stdout when storing.
pub const STDIO_PATH: &str = "-";

pub fn is_stdio(path: &Path) -> bool {
    path.as_os_str() == STDIO_PATH
}

/// Structured form of a config document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigDocument {
    #[serde(rename = "CGEdges")]
    pub edges: Vec<EdgeEntry>,
}

/// One `CGEdges` entry. Field order here is the emitted field order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeEntry {
    pub caller: String,
    pub callee: String,
    pub location: Vec<SourceLoc>,
    pub decision: bool,
}

/// Encode records into a document, one entry per record, in order.
pub fn encode(records: &[DecisionRecord]) -> ConfigDocument {
    let edges = records
        .iter()
        .map(|record| EdgeEntry {
            caller: record.edge.caller_name().to_string(),
            callee: record.edge.callee_name().to_string(),
            location: record.edge.location_chain().to_vec(),
            decision: record.decision,
        })
        .collect();

    ConfigDocument { edges }
}

/// Decode a document back into records.
///
/// Either every entry decodes or the whole document is rejected. Names are
/// not validated here; an empty caller is still a well-formed entry.
pub fn decode(document: ConfigDocument) -> Result<Vec<DecisionRecord>> {
    if let Some((idx, entry)) = document
        .edges
        .iter()
        .enumerate()
        .find(|(_, entry)| entry.location.is_empty())
    {
        return Err(AdvisorError::malformed(format!(
            "entry {idx} ({} -> {}) has an empty location array",
            entry.caller, entry.callee
        )));
    }

    Ok(document
        .edges
        .into_iter()
        .map(|entry| {
            let edge =
                CallEdgeKey::from_descriptor_fields(entry.caller, entry.callee, entry.location);
            DecisionRecord::new(edge, entry.decision)
        })
        .collect())
}

/// Parse and decode a document from its text form.
pub fn decode_str(text: &str) -> Result<Vec<DecisionRecord>> {
    let document: ConfigDocument =
        serde_json::from_str(text).map_err(|err| AdvisorError::malformed(err.to_string()))?;
    decode(document)
}

/// Parse and decode a document from a reader.
pub fn read_records<R: Read>(reader: R) -> Result<Vec<DecisionRecord>> {
    let document: ConfigDocument = serde_json::from_reader(io::BufReader::new(reader))
        .map_err(|err| AdvisorError::malformed(err.to_string()))?;
    decode(document)
}

/// Encode `records` and write them to `writer`, flushing it afterwards.
///
/// Compact output matches what earlier recorders produced; `pretty` puts one
/// field per line, which diffs better.
pub fn write_records<W: Write>(mut writer: W, records: &[DecisionRecord], pretty: bool) -> io::Result<()> {
    let document = encode(records);
    if pretty {
        serde_json::to_writer_pretty(&mut writer, &document)?;
    } else {
        serde_json::to_writer(&mut writer, &document)?;
    }
    writer.write_all(b"\n")?;
    writer.flush()
}

/// Text form of `records`.
pub fn encode_string(records: &[DecisionRecord], pretty: bool) -> serde_json::Result<String> {
    let document = encode(records);
    if pretty {
        serde_json::to_string_pretty(&document)
    } else {
        serde_json::to_string(&document)
    }
}
