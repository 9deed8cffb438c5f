use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

pub trait FsExt {
    // Converts the provided relative path to be based from the path of the currently working directory.
    // If the path is absolute, then it returns the absolute path.
    fn relative_to_cwd(&self) -> Result<PathBuf>
    where
        Self: AsRef<Path>,
    {
        let cwd_dir = std::env::current_dir()?;

        Ok(cwd_dir.join(self))
    }
}

impl FsExt for String {}

impl FsExt for &str {}

impl FsExt for PathBuf {}

fn is_gzip(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "gz")
}

/// Opens a file for buffered reading, decompressing it when the path ends in `.gz`.
pub fn open_reader(path: impl AsRef<Path>) -> Result<Box<dyn BufRead + Send>> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;

    let reader: Box<dyn Read + Send> = if is_gzip(path) {
        Box::new(MultiGzDecoder::new(file))
    } else {
        Box::new(file)
    };

    Ok(Box::new(BufReader::new(reader)))
}

enum Output {
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
}

/// A buffered output file, gzip-compressed when its path ends in `.gz`.
///
/// Call `finish` once everything is written. Dropping the writer instead completes the gzip
/// stream without reporting errors.
pub struct OutputWriter {
    output: Output,
}

impl OutputWriter {
    /// Writes the gzip trailer if there is one and flushes everything to the file.
    pub fn finish(self) -> std::io::Result<()> {
        let mut file = match self.output {
            Output::Plain(file) => file,
            Output::Gzip(encoder) => encoder.finish()?,
        };

        file.flush()
    }
}

impl Write for OutputWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.output {
            Output::Plain(file) => file.write(buf),
            Output::Gzip(encoder) => encoder.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.output {
            Output::Plain(file) => file.flush(),
            Output::Gzip(encoder) => encoder.flush(),
        }
    }
}

/// Creates (or truncates) a file for buffered writing, compressing it when the path ends in `.gz`.
pub fn create_writer(path: impl AsRef<Path>) -> Result<OutputWriter> {
    let path = path.as_ref();
    let file = BufWriter::new(File::create(path).with_context(|| format!("Failed to create {:?}", path))?);

    let output = if is_gzip(path) {
        Output::Gzip(GzEncoder::new(file, Compression::default()))
    } else {
        Output::Plain(file)
    };

    Ok(OutputWriter { output })
}

pub fn count_lines(path: impl AsRef<Path>) -> Result<usize> {
    let path = path.as_ref();
    let mut reader = open_reader(path)?;
    let mut buf = Vec::with_capacity(4096);
    let mut count = 0;

    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .with_context(|| format!("Failed to read {:?}", path))?;

        if read == 0 {
            break;
        }

        count += 1;
    }

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gzip_round_trip_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lines.txt.gz");

        {
            let mut writer = create_writer(&path).unwrap();
            writeln!(writer, "first").unwrap();
            writeln!(writer, "second").unwrap();
            writer.finish().unwrap();
        }

        let lines: Vec<String> = open_reader(&path)
            .unwrap()
            .lines()
            .map(|l| l.unwrap())
            .collect();

        assert_eq!(lines, vec!["first".to_string(), "second".to_string()]);
        assert_eq!(count_lines(&path).unwrap(), 2);
    }

    #[test]
    fn test_finished_gzip_has_a_complete_trailer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lines.txt.gz");

        let mut writer = create_writer(&path).unwrap();
        writeln!(writer, "only").unwrap();
        writer.finish().unwrap();

        // The last eight bytes of a gzip member are the CRC and the uncompressed size.
        let bytes = std::fs::read(&path).unwrap();
        let size = u32::from_le_bytes(bytes[bytes.len() - 4..].try_into().unwrap());
        assert_eq!(size, "only\n".len() as u32);
    }

    #[test]
    fn test_plain_output_is_complete_after_finish() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lines.txt");

        let mut writer = create_writer(&path).unwrap();
        write!(writer, "a\nb\n").unwrap();
        writer.finish().unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a\nb\n");
    }

    #[test]
    fn test_count_lines_without_trailing_newline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lines.txt");
        std::fs::write(&path, "a\nb\nc").unwrap();

        assert_eq!(count_lines(&path).unwrap(), 3);
    }

    #[test]
    fn test_open_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();

        assert!(open_reader(dir.path().join("missing.pgn")).is_err());
    }
}
