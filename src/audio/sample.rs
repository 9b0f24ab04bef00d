use hound::{SampleFormat, WavSpec, WavWriter};
use std::io::Cursor;

/// Errors that can occur while assembling the audio sample.
#[derive(Debug, Clone)]
pub enum AudioError {
    NoChunks,
    EncodeFailed(String),
}

impl std::fmt::Display for AudioError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AudioError::NoChunks => write!(f, "No audio was captured"),
            AudioError::EncodeFailed(e) => write!(f, "Failed to encode WAV: {}", e),
        }
    }
}

impl std::error::Error for AudioError {}

/// The completed voice sample: a single WAV payload plus its duration.
#[derive(Debug, Clone)]
pub struct AudioSample {
    pub wav_bytes: Vec<u8>,
    pub duration_secs: u64,
    pub sample_rate: u32,
}

/// Accumulates PCM chunks while recording and combines them into one WAV
/// payload when the recording stops.
#[derive(Debug)]
pub struct SampleBuilder {
    sample_rate: u32,
    chunks: Vec<Vec<i16>>,
}

impl SampleBuilder {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            chunks: Vec::new(),
        }
    }

    pub fn push_chunk(&mut self, chunk: Vec<i16>) {
        self.chunks.push(chunk);
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Combine the accumulated chunks into a single mono 16-bit WAV.
    /// `duration_secs` comes from the recording timer, not the sample count,
    /// so the stored duration always matches what the user was shown.
    pub fn finalize(self, duration_secs: u64) -> Result<AudioSample, AudioError> {
        if self.chunks.is_empty() {
            return Err(AudioError::NoChunks);
        }

        let spec = WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };

        let mut wav_bytes = Vec::new();
        {
            let cursor = Cursor::new(&mut wav_bytes);
            let mut writer = WavWriter::new(cursor, spec)
                .map_err(|e| AudioError::EncodeFailed(e.to_string()))?;
            for chunk in &self.chunks {
                for &sample in chunk {
                    writer
                        .write_sample(sample)
                        .map_err(|e| AudioError::EncodeFailed(e.to_string()))?;
                }
            }
            writer
                .finalize()
                .map_err(|e| AudioError::EncodeFailed(e.to_string()))?;
        }

        Ok(AudioSample {
            wav_bytes,
            duration_secs,
            sample_rate: self.sample_rate,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finalize_without_chunks_is_an_error() {
        let builder = SampleBuilder::new(16_000);
        assert!(matches!(builder.finalize(0), Err(AudioError::NoChunks)));
    }

    #[test]
    fn finalize_produces_riff_wav() {
        let mut builder = SampleBuilder::new(16_000);
        builder.push_chunk(vec![0i16; 16_000]);
        builder.push_chunk(vec![100i16; 16_000]);

        let sample = builder.finalize(2).unwrap();
        assert_eq!(sample.duration_secs, 2);
        assert_eq!(&sample.wav_bytes[..4], b"RIFF");
        assert_eq!(&sample.wav_bytes[8..12], b"WAVE");
    }

    #[test]
    fn wav_payload_round_trips_through_hound() {
        let mut builder = SampleBuilder::new(16_000);
        builder.push_chunk(vec![42i16; 1_000]);
        let sample = builder.finalize(1).unwrap();

        let reader = hound::WavReader::new(Cursor::new(&sample.wav_bytes)).unwrap();
        assert_eq!(reader.spec().sample_rate, 16_000);
        assert_eq!(reader.len(), 1_000);
    }
}
