//! WAV reading and 16-bit PCM writing using hound

use std::path::Path;

use super::sample_buffer::AudioBuffer;
use crate::error::EngineError;

/// Read a WAV file (integer or float) into an [`AudioBuffer`]
pub fn read_wav<P: AsRef<Path>>(path: P) -> Result<AudioBuffer, EngineError> {
    let mut reader = hound::WavReader::open(path.as_ref())?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<Vec<_>, _>>()?,
        hound::SampleFormat::Int => {
            let max_value = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|s| s as f32 / max_value))
                .collect::<Result<Vec<_>, _>>()?
        }
    };

    AudioBuffer::new(samples, spec.sample_rate, spec.channels)
}

/// Convert a float sample in [-1, 1] to 16-bit PCM, clamping out-of-range values
pub fn f32_to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16
}

/// Write a buffer as 16-bit PCM WAV
pub fn write_wav_pcm16<P: AsRef<Path>>(path: P, buffer: &AudioBuffer) -> Result<(), EngineError> {
    let spec = hound::WavSpec {
        channels: buffer.channels(),
        sample_rate: buffer.sample_rate(),
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path.as_ref(), spec)?;
    for &sample in buffer.samples() {
        writer.write_sample(f32_to_i16(sample))?;
    }
    writer.finalize()?;
    Ok(())
}

/// Write a buffer as 32-bit float WAV
///
/// Used to hand audio to external processors without quantisation.
pub fn write_wav_f32<P: AsRef<Path>>(path: P, buffer: &AudioBuffer) -> Result<(), EngineError> {
    let spec = hound::WavSpec {
        channels: buffer.channels(),
        sample_rate: buffer.sample_rate(),
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(path.as_ref(), spec)?;
    for &sample in buffer.samples() {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pcm16_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.wav");
        let buffer = AudioBuffer::new(vec![0.5, -0.5, 1.0, -1.0], 44100, 2).unwrap();

        write_wav_pcm16(&path, &buffer).unwrap();
        let back = read_wav(&path).unwrap();

        assert_eq!(back.channels(), 2);
        assert_eq!(back.sample_rate(), 44100);
        for (a, b) in buffer.samples().iter().zip(back.samples()) {
            assert!((a - b).abs() < 1e-3, "{} vs {}", a, b);
        }
    }

    #[test]
    fn test_f32_to_i16_clamps() {
        assert_eq!(f32_to_i16(2.0), i16::MAX);
        assert_eq!(f32_to_i16(-2.0), -i16::MAX);
        assert_eq!(f32_to_i16(0.0), 0);
    }
}
