//! Text-encoding detection and a streaming decoder for snapshot files.
//!
//! FAA snapshot files are not guaranteed to be clean UTF-8. The encoding is
//! picked once from a short prefix of the file; the rest of the file is then
//! decoded incrementally, substituting U+FFFD for any malformed sequence
//! instead of failing the whole file.

use anyhow::{Context, Result};
use encoding_rs::{CoderResult, Decoder, DecoderResult, Encoding, UTF_8, WINDOWS_1252};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use tracing::debug;

/// Number of leading bytes inspected when picking an encoding.
pub const DETECTION_PREFIX_LEN: usize = 1024;

const INPUT_CHUNK: usize = 64 * 1024;

/// Candidate encodings, most specific first. Windows-1252 maps every byte, so
/// it doubles as the permissive fallback.
pub fn encoding_priority() -> [&'static Encoding; 2] {
    [UTF_8, WINDOWS_1252]
}

/// Pick the encoding for a file prefix: a byte-order mark wins outright,
/// otherwise the first candidate that decodes the prefix without error.
pub fn detect_encoding_from_prefix(prefix: &[u8]) -> &'static Encoding {
    if let Some((encoding, _bom_len)) = Encoding::for_bom(prefix) {
        return encoding;
    }

    encoding_priority()
        .into_iter()
        .find(|encoding| decodes_cleanly(*encoding, prefix))
        .unwrap_or(WINDOWS_1252)
}

pub fn detect_encoding(path: &Path) -> Result<&'static Encoding> {
    let file = File::open(path).with_context(|| format!("Opening {:?}", path))?;
    let mut prefix = Vec::with_capacity(DETECTION_PREFIX_LEN);
    file.take(DETECTION_PREFIX_LEN as u64)
        .read_to_end(&mut prefix)
        .with_context(|| format!("Reading {:?}", path))?;

    let encoding = detect_encoding_from_prefix(&prefix);
    debug!("Detected encoding {} for {:?}", encoding.name(), path);
    Ok(encoding)
}

fn decodes_cleanly(encoding: &'static Encoding, prefix: &[u8]) -> bool {
    let mut decoder = encoding.new_decoder_without_bom_handling();
    let capacity = decoder
        .max_utf8_buffer_length_without_replacement(prefix.len())
        .unwrap_or(prefix.len() * 3 + 16);
    let mut out = String::with_capacity(capacity);

    // `last = false`: a multi-byte sequence cut by the prefix boundary is not an error
    let (result, _read) = decoder.decode_to_string_without_replacement(prefix, &mut out, false);
    matches!(result, DecoderResult::InputEmpty)
}

/// Open a file and wrap it in a decoder for its detected encoding.
pub fn open_decoded(path: &Path) -> Result<(DecodingReader<File>, &'static Encoding)> {
    let encoding = detect_encoding(path)?;
    let file = File::open(path).with_context(|| format!("Opening {:?}", path))?;
    Ok((DecodingReader::new(file, encoding), encoding))
}

/// Read a whole (small) file as UTF-8 text using the detected encoding.
pub fn read_to_string_decoded(path: &Path) -> Result<String> {
    let (mut reader, _) = open_decoded(path)?;
    let mut text = String::new();
    reader
        .read_to_string(&mut text)
        .with_context(|| format!("Reading {:?}", path))?;
    Ok(text)
}

/// `Read` adapter yielding UTF-8 bytes decoded from `inner`.
pub struct DecodingReader<R> {
    inner: R,
    decoder: Decoder,
    input: Vec<u8>,
    output: Vec<u8>,
    pos: usize,
    eof: bool,
}

impl<R: Read> DecodingReader<R> {
    pub fn new(inner: R, encoding: &'static Encoding) -> Self {
        Self {
            inner,
            decoder: encoding.new_decoder_with_bom_removal(),
            input: vec![0; INPUT_CHUNK],
            output: Vec::new(),
            pos: 0,
            eof: false,
        }
    }

    pub fn encoding(&self) -> &'static Encoding {
        self.decoder.encoding()
    }

    fn refill(&mut self) -> io::Result<()> {
        while self.pos >= self.output.len() && !self.eof {
            let n = match self.inner.read(&mut self.input) {
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            let last = n == 0;

            let capacity = self
                .decoder
                .max_utf8_buffer_length(n)
                .unwrap_or(n * 3 + 16);
            self.output.clear();
            self.output.resize(capacity, 0);
            self.pos = 0;

            let mut consumed = 0;
            let mut written = 0;
            loop {
                let (result, read, wrote, _had_errors) = self.decoder.decode_to_utf8(
                    &self.input[consumed..n],
                    &mut self.output[written..],
                    last,
                );
                consumed += read;
                written += wrote;
                match result {
                    CoderResult::InputEmpty => break,
                    CoderResult::OutputFull => {
                        let grow = self.output.len().max(64);
                        self.output.resize(self.output.len() + grow, 0);
                    }
                }
            }
            self.output.truncate(written);

            if last {
                self.eof = true;
            }
        }
        Ok(())
    }
}

impl<R: Read> Read for DecodingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pos >= self.output.len() {
            self.refill()?;
        }
        let available = &self.output[self.pos..];
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.pos += n;
        Ok(n)
    }
}
