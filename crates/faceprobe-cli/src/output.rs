//! JSON rendering for stdout and report files. Non-ASCII text is written literally.

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Indentation of JSON printed to stdout.
pub const STDOUT_INDENT: &[u8] = b"  ";
/// Indentation of JSON report files.
pub const REPORT_INDENT: &[u8] = b"    ";

/// Serialize `value` as indented JSON into `writer`.
pub fn write_json<W: Write, T: Serialize + ?Sized>(
    writer: W,
    value: &T,
    indent: &[u8],
) -> Result<(), serde_json::Error> {
    let mut ser = serde_json::Serializer::with_formatter(writer, PrettyFormatter::with_indent(indent));
    value.serialize(&mut ser)
}

/// Write `value` to `path` as a JSON report, replacing any existing content.
pub fn write_report<T: Serialize + ?Sized>(path: &Path, value: &T) -> std::io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_json(&mut writer, value, REPORT_INDENT)?;
    writer.flush()
}
