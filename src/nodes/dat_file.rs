//! DAT file source
//!
//! Provides `DatFileSource` - a pull-based reader that decodes one channel of an
//! interleaved `.dat` recording and yields it one `Sample` at a time.
//!
//! Frames are pulled from the file in bulk (`chunk_frames` at a time) into a
//! single reusable buffer, and the selected channel is read out of it with a
//! fixed stride. Memory use is one chunk regardless of file size.

use super::config::{BYTES_PER_VALUE, DatConfig};
use crate::Result;
use crate::runtime::sample::{Sample, timestamp_for_index};
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;
use tracing::{debug, trace, warn};

/// Source that decodes one channel of an interleaved `.dat` recording
///
/// The first bulk read happens on the first pull, not at construction.
/// When the reader is exhausted the source drops it and returns the
/// end-of-stream sentinel (or `None` through `Iterator`) on every later call.
///
/// # Example
/// ```no_run
/// use dat_sync::{DatConfig, DatFileSource};
///
/// let config = DatConfig::from_sample_rate(0, 64, 32_000.0);
/// let source = DatFileSource::open("NlxCSG.dat", config)?;
/// for sample in source.take(10) {
///     println!("{}", sample);
/// }
/// # Ok::<(), dat_sync::DatError>(())
/// ```
pub struct DatFileSource<R: Read = File> {
    reader: Option<R>,
    config: DatConfig,

    /// Raw little-endian bytes of the current chunk
    buffer: Vec<u8>,
    /// Complete frames held in `buffer`
    frames_in_buffer: usize,
    /// Next frame of `buffer` to decode
    cursor: usize,

    /// Running ordinal of the next sample; never reset across refills
    sample_index: u64,
    max_samples: Option<u64>,
    chunks_read: u64,
}

/// Alias naming the source after its buffering strategy
pub type ChunkedSampleSource<R = File> = DatFileSource<R>;

impl DatFileSource<File> {
    /// Open a `.dat` file for decoding
    pub fn open<P: AsRef<Path>>(path: P, config: DatConfig) -> Result<Self> {
        config.validate()?;
        let file = File::open(path)?;
        Self::from_reader(file, config)
    }

    /// Open a `.dat` file, treating a missing or unreadable file as empty.
    ///
    /// The config is still checked; only the open failure is swallowed.
    pub fn open_or_empty<P: AsRef<Path>>(path: P, config: DatConfig) -> Result<Self> {
        config.validate()?;
        let path = path.as_ref();
        match File::open(path) {
            Ok(file) => Self::from_reader(file, config),
            Err(e) => {
                warn!("Cannot open {}: {}, treating as empty", path.display(), e);
                Ok(Self::empty(config))
            }
        }
    }
}

impl<R: Read> DatFileSource<R> {
    /// Decode samples from any byte reader
    pub fn from_reader(reader: R, config: DatConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            reader: Some(reader),
            config,
            buffer: Vec::new(),
            frames_in_buffer: 0,
            cursor: 0,
            sample_index: 0,
            max_samples: None,
            chunks_read: 0,
        })
    }

    /// An already exhausted source
    fn empty(config: DatConfig) -> Self {
        Self {
            reader: None,
            config,
            buffer: Vec::new(),
            frames_in_buffer: 0,
            cursor: 0,
            sample_index: 0,
            max_samples: None,
            chunks_read: 0,
        }
    }

    /// Set maximum number of samples to read from file (for benchmarking)
    pub fn with_max_samples(mut self, max_samples: Option<u64>) -> Self {
        self.max_samples = max_samples;
        self
    }

    pub fn config(&self) -> &DatConfig {
        &self.config
    }

    /// Number of samples handed out so far
    pub fn samples_read(&self) -> u64 {
        self.sample_index
    }

    /// Number of bulk reads that returned data
    pub fn chunks_read(&self) -> u64 {
        self.chunks_read
    }

    /// True once the underlying reader has been released
    pub fn is_exhausted(&self) -> bool {
        self.reader.is_none() && self.cursor >= self.frames_in_buffer
    }

    /// Pull the next sample, or the end-of-stream sentinel.
    pub fn next_sample(&mut self) -> Sample {
        self.next().unwrap_or_else(Sample::end_of_stream)
    }

    /// Refill `buffer` with the next chunk. Returns false at end of stream.
    fn refill(&mut self) -> bool {
        let Some(reader) = self.reader.as_mut() else {
            self.release_buffer();
            return false;
        };

        let chunk_bytes = self.config.chunk_bytes();
        if self.buffer.len() != chunk_bytes {
            self.buffer.resize(chunk_bytes, 0);
        }

        let (filled, error) = fill_buffer(reader, &mut self.buffer);
        if let Some(e) = error {
            warn!(
                "Read failed after {} samples, ending stream after {} buffered bytes: {}",
                self.sample_index, filled, e
            );
        }

        let frame_bytes = self.config.frame_bytes();
        self.frames_in_buffer = filled / frame_bytes;
        self.cursor = 0;

        // A short fill only happens at EOF or on a read error, either way it is the last one
        if filled < chunk_bytes {
            let dropped = filled % frame_bytes;
            if dropped > 0 {
                debug!("Discarding {} bytes of truncated trailing frame", dropped);
            }
            debug!(
                "Reached end of input after {} chunks ({} samples)",
                self.chunks_read + u64::from(self.frames_in_buffer > 0),
                self.sample_index + self.frames_in_buffer as u64
            );
            self.reader = None;
        }

        if self.frames_in_buffer == 0 {
            self.release_buffer();
            return false;
        }

        self.chunks_read += 1;
        trace!(
            "Chunk {}: {} frames starting at sample {}",
            self.chunks_read, self.frames_in_buffer, self.sample_index
        );
        true
    }

    /// Free the chunk buffer once nothing more will be decoded from it
    fn release_buffer(&mut self) {
        self.buffer = Vec::new();
        self.frames_in_buffer = 0;
        self.cursor = 0;
    }

    /// Decode the selected channel of frame `frame` in the current buffer
    #[inline]
    fn value_at(&self, frame: usize) -> i16 {
        let offset = (frame * self.config.num_channels + self.config.channel_index) * BYTES_PER_VALUE;
        i16::from_le_bytes([self.buffer[offset], self.buffer[offset + 1]])
    }
}

impl<R: Read> Iterator for DatFileSource<R> {
    type Item = Sample;

    fn next(&mut self) -> Option<Sample> {
        if let Some(max) = self.max_samples
            && self.sample_index >= max
        {
            self.reader = None;
            self.release_buffer();
            return None;
        }

        if self.cursor >= self.frames_in_buffer && !self.refill() {
            return None;
        }

        let value = self.value_at(self.cursor);
        let timestamp = timestamp_for_index(self.sample_index, self.config.time_per_sample);
        self.cursor += 1;
        self.sample_index += 1;
        Some(Sample::new(timestamp, value))
    }
}

/// Read until `buf` is full, the reader reports EOF, or a read fails.
///
/// Returns the bytes read so far together with the error that stopped the
/// fill, if any, so data read before a failure is not lost.
fn fill_buffer<R: Read>(reader: &mut R, buf: &mut [u8]) -> (usize, Option<std::io::Error>) {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return (filled, Some(e)),
        }
    }
    (filled, None)
}

/// Decode the selected channel from a complete in-memory copy of a recording.
///
/// Frames are cut straight out of `bytes` without any chunking; a trailing
/// partial frame is ignored.
pub fn samples_from_bytes(bytes: &[u8], config: &DatConfig) -> Result<Vec<Sample>> {
    config.validate()?;
    let start = config.channel_index * BYTES_PER_VALUE;
    Ok(bytes
        .chunks_exact(config.frame_bytes())
        .enumerate()
        .map(|(index, frame)| {
            let value = i16::from_le_bytes([frame[start], frame[start + 1]]);
            Sample::new(timestamp_for_index(index as u64, config.time_per_sample), value)
        })
        .collect())
}

/// Decode every sample of the selected channel into memory.
///
/// A missing file gives an empty vector.
pub fn read_samples<P: AsRef<Path>>(path: P, config: DatConfig) -> Result<Vec<Sample>> {
    Ok(DatFileSource::open_or_empty(path, config)?.collect())
}

/// Encode interleaved values the way the recorder writes them
#[cfg(test)]
pub(crate) fn encode_frames(values: &[i16]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}
