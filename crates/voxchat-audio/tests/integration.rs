use voxchat_audio::{decode_wav, encode_wav, scale_from_bins, Amplitude, AmplitudeAnalyzer, FFT_SIZE};
use voxchat_core::AMPLITUDE_IDLE;

#[test]
fn test_capture_to_wav_pipeline() {
    // Simulate a short recording accumulated from capture chunks
    let mut samples = Vec::new();
    for block in 0..10 {
        let chunk: Vec<f32> = (0..480)
            .map(|i| ((block * 480 + i) as f32 * 0.01).sin() * 0.3)
            .collect();
        samples.extend_from_slice(&chunk);
    }

    let wav = encode_wav(&samples, 16000, 1).unwrap();
    let decoded = decode_wav(&wav).unwrap();

    assert_eq!(decoded.sample_rate, 16000);
    assert_eq!(decoded.samples.len(), samples.len());
}

#[test]
fn test_playback_amplitude_follows_signal_then_resets() {
    let amplitude = Amplitude::new();
    let mut analyzer = AmplitudeAnalyzer::new(amplitude.clone());

    // Loud tone raises the scale above baseline
    let tone: Vec<f32> = (0..FFT_SIZE * 4)
        .map(|i| (i as f32 * std::f32::consts::TAU * 440.0 / 16000.0).sin())
        .collect();
    analyzer.feed(&tone);
    let during = amplitude.get();
    assert!(during > AMPLITUDE_IDLE);
    assert!(during <= AMPLITUDE_IDLE + 0.25);

    // End of playback resets to exactly the baseline
    amplitude.reset();
    assert_eq!(amplitude.get(), 0.9);
}

#[test]
fn test_scale_range_bounds() {
    assert_eq!(scale_from_bins(&[0u8; 128]), 0.9);
    let max = scale_from_bins(&[255u8; 128]);
    assert!((max - 1.15).abs() < 1e-6);
}
