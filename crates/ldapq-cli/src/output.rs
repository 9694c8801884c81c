//! Record printing.

use std::collections::BTreeMap;
use std::io::{self, Write};

use ldapq_directory::DirectoryRecord;

/// Writes each attribute name followed by its values, one per line.
///
/// ```text
/// cn:
///     Jane Doe
/// memberOf:
///     CN=Admins,OU=Groups,DC=corp,DC=example
/// ```
pub fn write_record(out: &mut impl Write, record: &DirectoryRecord) -> io::Result<()> {
    for (name, values) in record.sorted() {
        writeln!(out, "{name}:")?;
        for value in values {
            writeln!(out, "    {value}")?;
        }
    }
    Ok(())
}

/// Writes the record as a pretty-printed JSON object with sorted keys.
pub fn write_json(out: &mut impl Write, record: &DirectoryRecord) -> anyhow::Result<()> {
    let sorted = record.iter().collect::<BTreeMap<_, _>>();
    serde_json::to_writer_pretty(&mut *out, &sorted)?;
    writeln!(out)?;
    Ok(())
}
