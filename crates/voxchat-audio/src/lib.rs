pub mod amplitude;
pub mod capture;
pub mod device;
pub mod playback;
pub mod wav;

pub use amplitude::{scale_from_bins, Amplitude, AmplitudeAnalyzer, AMPLITUDE_SPAN, FFT_SIZE};
pub use capture::{CaptureStatus, MicSource};
pub use device::DeviceManager;
pub use playback::{PlaybackHandle, Player};
pub use wav::{decode_wav, encode_wav};
