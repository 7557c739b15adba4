//! Transition extraction from `.dat` recordings
//!
//! [`TransitionExtractor`] wires a [`DatFileSource`] into an [`EdgeDetector`].
//! [`TransitionExtractor::transitions`] pulls one edge at a time;
//! [`TransitionExtractor::extract`] drains the same iterator into a vector.

use crate::Result;
use crate::nodes::{DatConfig, DatFileSource, EdgeDetector, samples_from_bytes};
use crate::runtime::Transition;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

/// Lazy stream of transitions from one channel
///
/// Holds one chunk of the file, the previous sample and the detector phase,
/// nothing more.
pub struct Transitions<R: Read = File> {
    source: DatFileSource<R>,
    detector: EdgeDetector,
}

impl<R: Read> Transitions<R> {
    pub fn new(source: DatFileSource<R>) -> Self {
        let detector = EdgeDetector::new().with_channel(source.config().channel_index);
        Self { source, detector }
    }

    /// Samples consumed so far
    pub fn samples_read(&self) -> u64 {
        self.source.samples_read()
    }
}

impl<R: Read> Iterator for Transitions<R> {
    type Item = Transition;

    fn next(&mut self) -> Option<Transition> {
        loop {
            let sample = self.source.next()?;
            if let Some(transition) = self.detector.push(sample) {
                return Some(transition);
            }
        }
    }
}

/// Result of checking the streaming extractor against a full in-memory scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EquivalenceReport {
    /// Transitions found by the streaming pass
    pub streamed: usize,
    /// Transitions found by the in-memory pass
    pub batch: usize,
    /// Index of the first pair that differs in polarity or time
    pub first_mismatch: Option<usize>,
}

impl EquivalenceReport {
    fn compare(streamed: &[Transition], batch: &[Transition]) -> Self {
        let first_mismatch = streamed
            .iter()
            .zip(batch)
            .position(|(a, b)| !a.same_edge(b))
            .or_else(|| (streamed.len() != batch.len()).then(|| streamed.len().min(batch.len())));

        Self {
            streamed: streamed.len(),
            batch: batch.len(),
            first_mismatch,
        }
    }

    pub fn is_equal(&self) -> bool {
        self.first_mismatch.is_none()
    }
}

/// Extracts sync transitions from one channel of a recording
///
/// # Example
/// ```no_run
/// use dat_sync::{DatConfig, TransitionExtractor};
///
/// let extractor = TransitionExtractor::new(DatConfig::from_sample_rate(0, 64, 32_000.0))?;
/// for transition in extractor.transitions("NlxCSG.dat")? {
///     println!("{}", transition);
/// }
/// # Ok::<(), dat_sync::DatError>(())
/// ```
#[derive(Debug, Clone)]
pub struct TransitionExtractor {
    config: DatConfig,
    max_samples: Option<u64>,
}

impl TransitionExtractor {
    pub fn new(config: DatConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            max_samples: None,
        })
    }

    /// Set maximum number of samples to read from file (for benchmarking)
    pub fn with_max_samples(mut self, max_samples: Option<u64>) -> Self {
        self.max_samples = max_samples;
        self
    }

    pub fn config(&self) -> &DatConfig {
        &self.config
    }

    /// Stream transitions from a file. A missing file yields nothing.
    pub fn transitions<P: AsRef<Path>>(&self, path: P) -> Result<Transitions<File>> {
        let source = DatFileSource::open_or_empty(path, self.config)?;
        Ok(Transitions::new(source.with_max_samples(self.max_samples)))
    }

    /// Stream transitions from any byte reader
    pub fn transitions_from_reader<R: Read>(&self, reader: R) -> Result<Transitions<R>> {
        let source = DatFileSource::from_reader(reader, self.config)?;
        Ok(Transitions::new(source.with_max_samples(self.max_samples)))
    }

    /// Collect every transition of a file. A missing file gives an empty vector.
    pub fn extract<P: AsRef<Path>>(&self, path: P) -> Result<Vec<Transition>> {
        let path = path.as_ref();
        let mut stream = self.transitions(path)?;
        let transitions: Vec<_> = stream.by_ref().collect();
        info!(
            "Extracted {} transitions from {} samples of {}",
            transitions.len(),
            stream.samples_read(),
            path.display()
        );
        Ok(transitions)
    }

    /// Collect every transition from a byte reader
    pub fn extract_from_reader<R: Read>(&self, reader: R) -> Result<Vec<Transition>> {
        Ok(self.transitions_from_reader(reader)?.collect())
    }

    /// Compare the streaming pass with a scan over the fully loaded sample array.
    ///
    /// The in-memory side reads the whole file in one go and cuts frames
    /// straight out of it, so a chunk-refill fault in the streaming source
    /// cannot show up on both sides. It holds the entire file, so this is meant
    /// for validation runs rather than routine extraction.
    pub fn verify_equivalence<P: AsRef<Path>>(&self, path: P) -> Result<EquivalenceReport> {
        let path = path.as_ref();
        let streamed = self.extract(path)?;

        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Cannot read {}: {}, treating as empty", path.display(), e);
                Vec::new()
            }
        };
        self.compare_in_memory(&streamed, &bytes)
    }

    /// Check streamed transitions against an unchunked decode of `bytes`
    pub fn compare_in_memory(
        &self,
        streamed: &[Transition],
        bytes: &[u8],
    ) -> Result<EquivalenceReport> {
        let mut samples = samples_from_bytes(bytes, &self.config)?;
        if let Some(max) = self.max_samples {
            samples.truncate(usize::try_from(max).unwrap_or(usize::MAX));
        }
        debug!("Decoded {} samples for in-memory scan", samples.len());
        let batch = EdgeDetector::new()
            .with_channel(self.config.channel_index)
            .detect(&samples);

        let report = EquivalenceReport::compare(streamed, &batch);
        match report.first_mismatch {
            None => info!("Streaming and in-memory passes agree ({} transitions)", report.streamed),
            Some(i) => warn!(
                "Passes differ at transition {} (streamed {}, in-memory {})",
                i, report.streamed, report.batch
            ),
        }
        Ok(report)
    }
}

/// Extract all transitions of one channel of a `.dat` file.
///
/// Returns an empty vector if the file does not exist.
pub fn extract<P: AsRef<Path>>(
    path: P,
    channel_index: usize,
    num_channels: usize,
    time_per_sample: f64,
) -> Result<Vec<Transition>> {
    TransitionExtractor::new(DatConfig::new(channel_index, num_channels, time_per_sample))?
        .extract(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DatError;
    use crate::nodes::encode_frames;
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;

    fn edges(transitions: &[Transition]) -> Vec<(bool, u64)> {
        transitions.iter().map(|t| (t.is_on, t.timestamp)).collect()
    }

    fn write_dat(values: &[i16]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&encode_frames(values)).unwrap();
        file.flush().unwrap();
        file
    }

    /// Sync-like waveform with some jitter around the zero crossings
    fn waveform(len: usize) -> Vec<i16> {
        (0..len)
            .map(|i| {
                let phase = (i % 37) as f64 / 37.0 * std::f64::consts::TAU;
                let jitter = ((i * 7919) % 5) as f64 - 2.0;
                (phase.sin() * 1000.0 + jitter) as i16
            })
            .collect()
    }

    #[test]
    fn test_missing_file_is_empty() {
        let result = extract("/nonexistent", 0, 1, 1.0);
        assert!(result.is_ok());
        assert!(result.unwrap().is_empty());
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        assert!(matches!(
            extract("/nonexistent", 2, 2, 1.0),
            Err(DatError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_single_channel_sanity() {
        let file = write_dat(&[0, 5, 3, -1, -4, 2]);
        let transitions = extract(file.path(), 0, 1, 1.0).unwrap();
        assert_eq!(edges(&transitions), vec![(true, 1), (false, 4)]);
        assert!(transitions.iter().all(|t| t.channel == 0));
    }

    #[test]
    fn test_fractional_time_per_sample() {
        let file = write_dat(&[0, 5, 3, -1, -4, 2]);
        let transitions = extract(file.path(), 0, 1, 31.25).unwrap();
        assert_eq!(edges(&transitions), vec![(true, 31), (false, 125)]);
    }

    #[test]
    fn test_chunk_edge_boundary() {
        let values = [1, -1, 2, -2, 3, -3];
        let config = DatConfig::new(0, 1, 1.0).with_chunk_frames(4);
        let extractor = TransitionExtractor::new(config).unwrap();
        let streamed = extractor.extract_from_reader(Cursor::new(encode_frames(&values))).unwrap();

        let samples: Vec<_> = values
            .iter()
            .enumerate()
            .map(|(i, &v)| crate::Sample::new(i as u64, v))
            .collect();
        let reference = EdgeDetector::new().detect(&samples);
        assert_eq!(streamed, reference);
    }

    #[test]
    fn test_equivalent_across_chunk_sizes() {
        let values = waveform(1003);
        let data = encode_frames(&values);
        let reference = TransitionExtractor::new(DatConfig::new(0, 1, 3.5))
            .unwrap()
            .extract_from_reader(Cursor::new(data.clone()))
            .unwrap();
        assert!(reference.len() > 20);

        for chunk_frames in [1, 2, 3, 7, 36, 37, 64, 1000, 1003, 5000] {
            let config = DatConfig::new(0, 1, 3.5).with_chunk_frames(chunk_frames);
            let extractor = TransitionExtractor::new(config).unwrap();
            let streamed = extractor.extract_from_reader(Cursor::new(data.clone())).unwrap();
            assert_eq!(streamed, reference, "chunk_frames={}", chunk_frames);
        }
    }

    #[test]
    fn test_lazy_and_eager_agree() {
        let file = write_dat(&waveform(500));
        let config = DatConfig::new(0, 1, 1.0).with_chunk_frames(13);
        let extractor = TransitionExtractor::new(config).unwrap();

        let eager = extractor.extract(file.path()).unwrap();
        let mut lazy = Vec::new();
        let mut stream = extractor.transitions(file.path()).unwrap();
        for t in stream.by_ref() {
            lazy.push(t);
        }
        assert_eq!(eager, lazy);
        assert_eq!(stream.samples_read(), 500);
    }

    #[test]
    fn test_deterministic_and_monotonic() {
        let file = write_dat(&waveform(2000));
        let extractor = TransitionExtractor::new(DatConfig::new(0, 1, 2.0)).unwrap();
        let first = extractor.extract(file.path()).unwrap();
        let second = extractor.extract(file.path()).unwrap();
        assert_eq!(first, second);
        assert!(first.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    }

    #[test]
    fn test_multi_channel_deinterleave() {
        let c0 = waveform(300);
        let c1: Vec<i16> = waveform(311).into_iter().skip(11).map(|v| -v).collect();
        let interleaved: Vec<i16> = c0.iter().zip(&c1).flat_map(|(&a, &b)| [a, b]).collect();

        let config = DatConfig::new(1, 2, 1.0).with_chunk_frames(16);
        let from_pair = TransitionExtractor::new(config)
            .unwrap()
            .extract_from_reader(Cursor::new(encode_frames(&interleaved)))
            .unwrap();
        let alone = TransitionExtractor::new(DatConfig::new(0, 1, 1.0))
            .unwrap()
            .extract_from_reader(Cursor::new(encode_frames(&c1)))
            .unwrap();

        assert!(!alone.is_empty());
        assert_eq!(edges(&from_pair), edges(&alone));
        assert!(from_pair.iter().all(|t| t.channel == 1));
    }

    #[test]
    fn test_max_samples_limits_stream() {
        let values = [0, 5, 3, -1, -4, 2];
        let extractor = TransitionExtractor::new(DatConfig::new(0, 1, 1.0))
            .unwrap()
            .with_max_samples(Some(5));
        let transitions = extractor.extract_from_reader(Cursor::new(encode_frames(&values))).unwrap();
        assert_eq!(edges(&transitions), vec![(true, 1)]);
    }

    #[test]
    fn test_verify_equivalence() {
        let file = write_dat(&waveform(777));
        let extractor = TransitionExtractor::new(DatConfig::new(0, 1, 1.0).with_chunk_frames(50)).unwrap();
        let report = extractor.verify_equivalence(file.path()).unwrap();
        assert!(report.is_equal());
        assert_eq!(report.streamed, report.batch);
        assert!(report.streamed > 0);
    }

    #[test]
    fn test_in_memory_check_catches_lost_frame() {
        let data = encode_frames(&waveform(400));
        let config = DatConfig::new(0, 1, 1.0).with_chunk_frames(50);
        let extractor = TransitionExtractor::new(config).unwrap();

        let intact = extractor.extract_from_reader(Cursor::new(data.clone())).unwrap();
        assert!(extractor.compare_in_memory(&intact, &data).unwrap().is_equal());

        // Stream a copy that lost the first frame of the second chunk
        let mut damaged = data.clone();
        damaged.drain(100..102);
        let streamed = extractor.extract_from_reader(Cursor::new(damaged)).unwrap();
        let report = extractor.compare_in_memory(&streamed, &data).unwrap();
        assert!(!report.is_equal());
        assert!(report.first_mismatch.unwrap() > 0);
    }

    #[test]
    fn test_verify_missing_file() {
        let extractor = TransitionExtractor::new(DatConfig::new(0, 1, 1.0)).unwrap();
        let report = extractor.verify_equivalence("/nonexistent").unwrap();
        assert!(report.is_equal());
        assert_eq!(report.streamed, 0);
    }

    #[test]
    fn test_report_detects_mismatch() {
        let a = [Transition::new(true, 1, 0, 2), Transition::new(false, 4, 0, 5)];
        let b = [Transition::new(true, 1, 0, 2), Transition::new(true, 4, 0, 5)];
        assert_eq!(EquivalenceReport::compare(&a, &b).first_mismatch, Some(1));
        assert_eq!(EquivalenceReport::compare(&a, &a[..1]).first_mismatch, Some(1));
        assert!(EquivalenceReport::compare(&a, &a).is_equal());
        assert!(EquivalenceReport::compare(&[], &[]).is_equal());
    }
}
