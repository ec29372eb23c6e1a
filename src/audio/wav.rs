//! WAV file I/O for unit recordings and the synthesised waveform
//!
//! Reading accepts canonical RIFF/WAVE 16-bit PCM, mono or multi-channel
//! (channels are averaged to mono); unknown chunks and oversized `fmt `
//! chunks are handled by hound. Writing always emits mono 16-bit PCM.

use std::path::Path;

use crate::core::error::{Result, TtsError};

fn read_error(path: &Path, err: hound::Error) -> TtsError {
    match err {
        hound::Error::IoError(io) => TtsError::from_read_error(path.to_path_buf(), io),
        other => TtsError::InvalidWav {
            path: path.to_path_buf(),
            reason: other.to_string(),
        },
    }
}

fn write_error(path: &Path, err: hound::Error) -> TtsError {
    match err {
        hound::Error::IoError(io) => TtsError::FileWrite {
            path: path.to_path_buf(),
            source: io,
        },
        other => TtsError::FileWrite {
            path: path.to_path_buf(),
            source: std::io::Error::other(other.to_string()),
        },
    }
}

/// Read a 16-bit PCM WAV file as mono samples
///
/// Multi-channel recordings are averaged per frame, widening to `i32` so
/// near-full-scale stereo cannot overflow.
pub fn read_wav_mono(path: impl AsRef<Path>) -> Result<Vec<i16>> {
    let path = path.as_ref();
    let reader = hound::WavReader::open(path).map_err(|e| read_error(path, e))?;
    let spec = reader.spec();

    if spec.sample_format != hound::SampleFormat::Int || spec.bits_per_sample != 16 {
        return Err(TtsError::InvalidWav {
            path: path.to_path_buf(),
            reason: format!(
                "expected 16-bit PCM, got {}-bit {:?}",
                spec.bits_per_sample, spec.sample_format
            ),
        });
    }
    let channels = spec.channels as usize;
    if channels == 0 {
        return Err(TtsError::InvalidWav {
            path: path.to_path_buf(),
            reason: "zero channels".into(),
        });
    }

    let samples: Vec<i16> = reader
        .into_samples::<i16>()
        .collect::<std::result::Result<_, _>>()
        .map_err(|e| read_error(path, e))?;

    if channels == 1 {
        return Ok(samples);
    }
    Ok(samples
        .chunks_exact(channels)
        .map(|frame| {
            let sum: i32 = frame.iter().map(|&s| s as i32).sum();
            (sum / channels as i32) as i16
        })
        .collect())
}

/// Write mono 16-bit PCM samples to a WAV file
pub fn write_wav_mono(path: impl AsRef<Path>, samples: &[i16], sample_rate: u32) -> Result<()> {
    let path = path.as_ref();
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec).map_err(|e| write_error(path, e))?;
    for &sample in samples {
        writer.write_sample(sample).map_err(|e| write_error(path, e))?;
    }
    writer.finalize().map_err(|e| write_error(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mono_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("unit.wav");
        let samples: Vec<i16> = (0..500).map(|i| (i * 37 % 2001 - 1000) as i16).collect();

        write_wav_mono(&path, &samples, 22_050).unwrap();
        assert_eq!(read_wav_mono(&path).unwrap(), samples);
    }

    #[test]
    fn test_stereo_averages_to_mono() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 22_050,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        // Near-full-scale frames exercise the widening average
        for frame in [(30_000i16, 30_000i16), (-30_000, -30_000), (100, 300)] {
            writer.write_sample(frame.0).unwrap();
            writer.write_sample(frame.1).unwrap();
        }
        writer.finalize().unwrap();

        assert_eq!(read_wav_mono(&path).unwrap(), vec![30_000, -30_000, 200]);
    }

    #[test]
    fn test_rejects_non_pcm() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("float.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 22_050,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        writer.write_sample(0.5f32).unwrap();
        writer.finalize().unwrap();

        assert!(matches!(
            read_wav_mono(&path),
            Err(TtsError::InvalidWav { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            read_wav_mono("/nonexistent/unit.wav"),
            Err(TtsError::FileNotFound { .. })
        ));
    }
}
