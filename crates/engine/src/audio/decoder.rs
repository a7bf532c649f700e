// crates/engine/src/audio/decoder.rs
//! mp3 decoding for verse audio
//!
//! Verse blobs are single-track mp3, either a cached file or bytes fetched
//! moments ago. Everything is decoded to interleaved f32.

use crate::error::{EngineError, EngineResult};
use crate::pipeline::MediaSource;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{Decoder, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader, SeekMode, SeekTo};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

pub(crate) struct VerseDecoder {
    reader: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    sample_rate: u32,
    channels: usize,
    duration: Option<f64>,
}

impl VerseDecoder {
    pub(crate) fn new(source: MediaSource) -> EngineResult<Self> {
        let mss = match source {
            MediaSource::File(path) => {
                let file = std::fs::File::open(&path).map_err(|e| {
                    EngineError::Decode(format!("Failed to open {}: {}", path.display(), e))
                })?;
                MediaSourceStream::new(Box::new(file), Default::default())
            }
            MediaSource::Memory(bytes) => {
                MediaSourceStream::new(Box::new(std::io::Cursor::new(bytes)), Default::default())
            }
        };

        let mut hint = Hint::new();
        hint.with_extension("mp3");

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| EngineError::Decode(format!("Failed to probe format: {}", e)))?;

        let reader = probed.format;
        let track = reader
            .default_track()
            .ok_or_else(|| EngineError::Decode("No audio track found".to_string()))?;

        let track_id = track.id;
        let codec_params = track.codec_params.clone();
        let sample_rate = codec_params.sample_rate.unwrap_or(44100);
        let channels = codec_params
            .channels
            .map(|c| c.count())
            .unwrap_or(2)
            .max(1);
        let duration = codec_params
            .n_frames
            .map(|frames| frames as f64 / sample_rate as f64);

        let decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| EngineError::Decode(format!("Failed to create decoder: {}", e)))?;

        Ok(Self {
            reader,
            decoder,
            track_id,
            sample_rate,
            channels,
            duration,
        })
    }

    /// Decodes the next packet to interleaved f32 samples. `None` at end of
    /// track.
    pub(crate) fn decode_next(&mut self) -> EngineResult<Option<Vec<f32>>> {
        loop {
            let packet = match self.reader.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    return Ok(None);
                }
                Err(e) => {
                    return Err(EngineError::Decode(format!("Failed to read packet: {}", e)));
                }
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            let decoded = match self.decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(SymphoniaError::DecodeError(e)) => {
                    log::warn!("Decode error, skipping packet: {}", e);
                    continue;
                }
                Err(e) => {
                    return Err(EngineError::Decode(format!(
                        "Failed to decode packet: {}",
                        e
                    )));
                }
            };

            let mut sample_buf =
                SampleBuffer::<f32>::new(decoded.capacity() as u64, *decoded.spec());
            sample_buf.copy_interleaved_ref(decoded);
            return Ok(Some(sample_buf.samples().to_vec()));
        }
    }

    pub(crate) fn seek(&mut self, time_secs: f64) -> EngineResult<()> {
        let timestamp = (time_secs.max(0.0) * self.sample_rate as f64) as u64;
        self.reader
            .seek(
                SeekMode::Accurate,
                SeekTo::TimeStamp {
                    ts: timestamp,
                    track_id: self.track_id,
                },
            )
            .map_err(|e| EngineError::Seek(format!("Failed to seek: {}", e)))?;
        self.decoder.reset();
        Ok(())
    }

    pub(crate) fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub(crate) fn channels(&self) -> usize {
        self.channels
    }

    pub(crate) fn duration(&self) -> Option<f64> {
        self.duration
    }
}
