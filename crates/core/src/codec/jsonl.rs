use std::fs;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::codec::{decode_line, encode, CodecError, CodecResult, EncodeOptions};
use crate::model::Ir;

fn io_error(path: &Path, source: std::io::Error) -> CodecError {
    CodecError::Io { path: path.to_path_buf(), source }
}

/// Write IR records to `writer`, one compact JSON object per line.
///
/// Records are independent; nothing is shared or sorted across lines.
pub fn write_jsonl<'a, W, I>(writer: &mut W, irs: I, canonical: bool) -> CodecResult<()>
where
    W: Write,
    I: IntoIterator<Item = &'a Ir>,
{
    let options = EncodeOptions { canonical, pretty: false };
    for ir in irs {
        let line = encode(ir, options)?;
        writer
            .write_all(line.as_bytes())
            .and_then(|_| writer.write_all(b"\n"))
            .map_err(|e| io_error(Path::new("<writer>"), e))?;
    }
    Ok(())
}

/// Write a single IR to a JSONL file, creating parent directories.
pub fn dump_jsonl(ir: &Ir, path: &Path, canonical: bool) -> CodecResult<()> {
    batch_dump_jsonl(std::slice::from_ref(ir), path, canonical)
}

/// Write several IRs to one JSONL file, creating parent directories.
pub fn batch_dump_jsonl(irs: &[Ir], path: &Path, canonical: bool) -> CodecResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
    }
    let file = fs::File::create(path).map_err(|e| io_error(path, e))?;
    let mut writer = BufWriter::new(file);
    write_jsonl(&mut writer, irs, canonical).map_err(|err| match err {
        CodecError::Io { source, .. } => io_error(path, source),
        other => other,
    })?;
    writer.flush().map_err(|e| io_error(path, e))?;
    tracing::debug!(path = %path.display(), records = irs.len(), "wrote IR jsonl");
    Ok(())
}

/// Decode every non-blank line from `reader`. Line numbers are 1-based and
/// count blank lines too.
pub fn read_jsonl<R: BufRead>(reader: R) -> CodecResult<Vec<Ir>> {
    let mut irs = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.map_err(|e| CodecError::Decode { line: line_no, message: e.to_string() })?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        irs.push(decode_line(trimmed, line_no)?);
    }
    Ok(irs)
}

/// Load every IR stored in a JSONL file.
pub fn load_jsonl(path: &Path) -> CodecResult<Vec<Ir>> {
    if !path.exists() {
        return Err(CodecError::NotFound(path.to_path_buf()));
    }
    let file = fs::File::open(path).map_err(|e| io_error(path, e))?;
    let irs = read_jsonl(BufReader::new(file))?;
    tracing::debug!(path = %path.display(), records = irs.len(), "loaded IR jsonl");
    Ok(irs)
}
