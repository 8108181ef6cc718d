use std::io::Cursor;
use voxchat_core::{AudioChunk, AudioError};

/// Encode f32 samples as a 16-bit PCM WAV file in memory.
pub fn encode_wav(samples: &[f32], sample_rate: u32, channels: u16) -> Result<Vec<u8>, AudioError> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    let mut writer =
        hound::WavWriter::new(&mut cursor, spec).map_err(|e| AudioError::Encode(e.to_string()))?;
    for &s in samples {
        let clamped = s.clamp(-1.0, 1.0);
        let value = (clamped * i16::MAX as f32) as i16;
        writer
            .write_sample(value)
            .map_err(|e| AudioError::Encode(e.to_string()))?;
    }
    writer
        .finalize()
        .map_err(|e| AudioError::Encode(e.to_string()))?;
    Ok(cursor.into_inner())
}

/// Decode a WAV file into f32 samples. Accepts 16-bit integer and 32-bit
/// float sample formats.
pub fn decode_wav(bytes: &[u8]) -> Result<AudioChunk, AudioError> {
    let mut reader =
        hound::WavReader::new(Cursor::new(bytes)).map_err(|e| AudioError::Decode(e.to_string()))?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(|e| AudioError::Decode(e.to_string()))?,
        hound::SampleFormat::Int => reader
            .samples::<i16>()
            .map(|s| s.map(|v| v as f32 / i16::MAX as f32))
            .collect::<Result<_, _>>()
            .map_err(|e| AudioError::Decode(e.to_string()))?,
    };

    Ok(AudioChunk {
        samples,
        sample_rate: spec.sample_rate,
        channels: spec.channels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_produces_riff_header() {
        let samples = vec![0.0f32; 160];
        let bytes = encode_wav(&samples, 16000, 1).unwrap();
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WAVE");
    }

    #[test]
    fn test_encode_then_decode_preserves_shape() {
        let samples: Vec<f32> = (0..480).map(|i| (i as f32 * 0.02).sin() * 0.5).collect();
        let bytes = encode_wav(&samples, 16000, 1).unwrap();
        let chunk = decode_wav(&bytes).unwrap();
        assert_eq!(chunk.sample_rate, 16000);
        assert_eq!(chunk.channels, 1);
        assert_eq!(chunk.samples.len(), samples.len());
        // 16-bit quantization keeps samples within one LSB
        for (a, b) in samples.iter().zip(chunk.samples.iter()) {
            assert!((a - b).abs() < 1.0 / i16::MAX as f32 * 2.0);
        }
    }

    #[test]
    fn test_encode_clamps_out_of_range_samples() {
        let samples = vec![2.0f32, -2.0];
        let bytes = encode_wav(&samples, 16000, 1).unwrap();
        let chunk = decode_wav(&bytes).unwrap();
        assert!((chunk.samples[0] - 1.0).abs() < 1e-3);
        assert!((chunk.samples[1] + 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_encode_empty_samples() {
        let bytes = encode_wav(&[], 16000, 1).unwrap();
        let chunk = decode_wav(&bytes).unwrap();
        assert!(chunk.samples.is_empty());
    }

    #[test]
    fn test_decode_garbage_is_error() {
        let result = decode_wav(b"definitely not a wav file");
        assert!(result.is_err());
    }
}
