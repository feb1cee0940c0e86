//! Audio decoding using Symphonia
//!
//! Any container/codec combination enabled in the `symphonia` default
//! registry is accepted; the first decodable track is used and its native
//! sample rate and channel layout are preserved.

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::sample_buffer::AudioBuffer;
use crate::error::EngineError;

/// Decode an audio file to an interleaved [`AudioBuffer`]
///
/// # Arguments
///
/// * `path` - Path to audio file
///
/// # Errors
///
/// Returns `EngineError::IoError` if the file cannot be opened and
/// `EngineError::DecodingError` if no decodable track is found or the
/// stream yields no audio.
pub fn decode_audio<P: AsRef<Path>>(path: P) -> Result<AudioBuffer, EngineError> {
    let path = path.as_ref();
    log::debug!("Decoding audio file: {}", path.display());

    let src = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(src), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| EngineError::DecodingError(format!("{}: {}", path.display(), e)))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| {
            EngineError::DecodingError(format!("{}: no supported audio tracks", path.display()))
        })?;

    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate.unwrap_or(0);
    let mut channels = track
        .codec_params
        .channels
        .map(|c| c.count() as u16)
        .unwrap_or(0);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| EngineError::DecodingError(e.to_string()))?;

    let mut samples: Vec<f32> = Vec::new();
    let mut skipped_packets = 0usize;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(EngineError::DecodingError(e.to_string())),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                sample_rate = spec.rate;
                channels = spec.channels.count() as u16;

                let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                buf.copy_interleaved_ref(decoded);
                samples.extend_from_slice(buf.samples());
            }
            Err(SymphoniaError::DecodeError(_)) => {
                // Corrupt packets are skipped
                skipped_packets += 1;
                continue;
            }
            Err(e) => return Err(EngineError::DecodingError(e.to_string())),
        }
    }

    if skipped_packets > 0 {
        log::warn!(
            "{}: skipped {} undecodable packets",
            path.display(),
            skipped_packets
        );
    }

    if samples.is_empty() {
        return Err(EngineError::DecodingError(format!(
            "{}: stream contains no audio",
            path.display()
        )));
    }

    log::debug!(
        "Decoded {} samples ({} ch @ {} Hz)",
        samples.len(),
        channels,
        sample_rate
    );

    AudioBuffer::new(samples, sample_rate, channels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_io_error() {
        let result = decode_audio("/definitely/not/here.mp3");
        assert!(matches!(result, Err(EngineError::IoError(_))));
    }

    #[test]
    fn test_decodes_wav_written_by_hound() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for i in 0..800 {
            let v = ((i as f32 * 0.05).sin() * 10000.0) as i16;
            writer.write_sample(v).unwrap();
            writer.write_sample(-v).unwrap();
        }
        writer.finalize().unwrap();

        let buffer = decode_audio(&path).unwrap();
        assert_eq!(buffer.sample_rate(), 8000);
        assert_eq!(buffer.channels(), 2);
        assert_eq!(buffer.frames(), 800);
    }
}
