pub mod client;

pub use client::{ProcessedReply, SpeechClient, UploadReply};
