use base64::Engine as _;
use serde::{Deserialize, Serialize};
use voxchat_core::ClientError;

#[derive(Debug, Deserialize)]
struct SpeechApiResponse {
    success: bool,
    #[serde(rename = "aiResponse")]
    ai_response: Option<String>,
    #[serde(rename = "audioUrl")]
    audio_url: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct TtsRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct TtsResponse {
    #[serde(rename = "audioUrl")]
    audio_url: Option<String>,
}

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    response: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    question: String,
    llm_response: String,
    audio_content: String,
}

/// The backend's answer to a processed recording.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedReply {
    pub text: Option<String>,
    pub audio_url: Option<String>,
}

/// The backend's answer to a raw audio upload, with the TTS clip inline.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadReply {
    pub question: String,
    pub llm_response: String,
    pub audio: Vec<u8>,
}

/// HTTP client for the voice chat backend. All failures come back as
/// [`ClientError`] values; nothing here panics or propagates past the
/// call boundary.
pub struct SpeechClient {
    client: reqwest::Client,
    base_url: String,
}

impl SpeechClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve a possibly-relative URL against the backend base.
    fn resolve(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!("{}/{}", self.base_url, url.trim_start_matches('/'))
        }
    }

    /// Upload a recording with its transcript for processing.
    pub async fn process_audio(
        &self,
        wav: Vec<u8>,
        transcript: &str,
    ) -> Result<ProcessedReply, ClientError> {
        tracing::debug!(
            audio_bytes = wav.len(),
            transcript_len = transcript.len(),
            "posting recording for processing"
        );

        let form = reqwest::multipart::Form::new()
            .part(
                "audio",
                reqwest::multipart::Part::bytes(wav)
                    .file_name("recording.wav")
                    .mime_str("audio/wav")
                    .map_err(|e| ClientError::Request(e.to_string()))?,
            )
            .text("transcript", transcript.to_string());

        let response = self
            .client
            .post(format!("{}/api/speech", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "speech request failed");
                ClientError::Request(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "speech endpoint error");
            return Err(ClientError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let reply: SpeechApiResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))?;

        if !reply.success {
            let msg = reply
                .error
                .unwrap_or_else(|| "Failed to process audio".to_string());
            tracing::warn!(error = %msg, "backend reported processing failure");
            return Err(ClientError::Backend(msg));
        }

        Ok(ProcessedReply {
            text: reply.ai_response,
            audio_url: reply.audio_url,
        })
    }

    /// Request synthesized speech for a text. Degrades to `None` on any
    /// failure so the chat flow is never blocked by TTS.
    pub async fn generate_tts(&self, text: &str) -> Option<String> {
        let result = self
            .client
            .post(format!("{}/api/tts", self.base_url))
            .json(&TtsRequest { text })
            .send()
            .await;

        let response = match result {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                tracing::warn!(status = %r.status(), "tts endpoint error");
                return None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "tts request failed");
                return None;
            }
        };

        match response.json::<TtsResponse>().await {
            Ok(reply) => reply.audio_url,
            Err(e) => {
                tracing::warn!(error = %e, "failed to parse tts response");
                None
            }
        }
    }

    /// Download an audio clip by URL (absolute or server-relative).
    pub async fn fetch_audio(&self, url: &str) -> Result<Vec<u8>, ClientError> {
        let response = self
            .client
            .get(self.resolve(url))
            .send()
            .await
            .map_err(|e| ClientError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    /// Text-only chat turn.
    pub async fn query(&self, prompt: &str) -> Result<String, ClientError> {
        let response = self
            .client
            .post(format!("{}/api/query", self.base_url))
            .json(&QueryRequest { prompt })
            .send()
            .await
            .map_err(|e| ClientError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let reply: QueryResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))?;
        Ok(reply.response)
    }

    /// Upload a raw recording; the backend transcribes, answers, and
    /// returns the spoken answer inline as base64.
    pub async fn upload(&self, wav: Vec<u8>) -> Result<UploadReply, ClientError> {
        let form = reqwest::multipart::Form::new().part(
            "file",
            reqwest::multipart::Part::bytes(wav)
                .file_name("recording.wav")
                .mime_str("audio/wav")
                .map_err(|e| ClientError::Request(e.to_string()))?,
        );

        let response = self
            .client
            .post(format!("{}/api/upload", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| ClientError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let reply: UploadResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))?;

        let audio = base64::engine::general_purpose::STANDARD
            .decode(&reply.audio_content)
            .map_err(|e| ClientError::Decode(format!("invalid base64 audio: {e}")))?;

        Ok(UploadReply {
            question: reply.question,
            llm_response: reply.llm_response,
            audio,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = SpeechClient::new("http://localhost:8000/");
        assert_eq!(client.base_url(), "http://localhost:8000");
    }

    #[test]
    fn test_resolve_relative_url() {
        let client = SpeechClient::new("http://localhost:8000");
        assert_eq!(
            client.resolve("/audio/reply.wav"),
            "http://localhost:8000/audio/reply.wav"
        );
        assert_eq!(
            client.resolve("audio/reply.wav"),
            "http://localhost:8000/audio/reply.wav"
        );
    }

    #[test]
    fn test_resolve_absolute_url_unchanged() {
        let client = SpeechClient::new("http://localhost:8000");
        assert_eq!(
            client.resolve("https://cdn.example.com/a.wav"),
            "https://cdn.example.com/a.wav"
        );
    }

    #[test]
    fn test_speech_response_field_names() {
        let json = r#"{"success":true,"aiResponse":"hi","audioUrl":"/a.wav"}"#;
        let reply: SpeechApiResponse = serde_json::from_str(json).unwrap();
        assert!(reply.success);
        assert_eq!(reply.ai_response.as_deref(), Some("hi"));
        assert_eq!(reply.audio_url.as_deref(), Some("/a.wav"));
        assert!(reply.error.is_none());
    }

    #[test]
    fn test_speech_response_null_audio_url() {
        let json = r#"{"success":true,"aiResponse":"hi","audioUrl":null}"#;
        let reply: SpeechApiResponse = serde_json::from_str(json).unwrap();
        assert!(reply.audio_url.is_none());
    }
}
