//! HTTP clients for the language-model and OCR services.

use anyhow::{Context, Result, anyhow};
use reqwest::{Client, multipart};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use swiftleaf_core::config::AppConfig;
use swiftleaf_core::ocr::{OcrResult, OcrWord};
use swiftleaf_core::services::{LanguageModel, OcrEngine, OcrRequest, ResponseFormat, Unavailable};
use tracing::{debug, info};

fn build_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs.max(1)))
        .user_agent(concat!("swiftleaf/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to build HTTP client")
}

/// OpenAI-compatible `/chat/completions` client.
#[derive(Debug, Clone)]
pub struct HttpLanguageModel {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<JsonMode>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct JsonMode {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

impl HttpLanguageModel {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let api_key = std::env::var(&config.service_api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty());
        if api_key.is_none() {
            debug!(
                var = %config.service_api_key_env,
                "No API key in environment; sending unauthenticated requests"
            );
        }
        Ok(Self {
            client: build_client(config.service_timeout_secs)?,
            endpoint: chat_endpoint(&config.service_base_url),
            model: config.service_model.clone(),
            api_key,
        })
    }

    fn request_body<'a>(&'a self, prompt: &'a str, format: ResponseFormat) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            response_format: (format == ResponseFormat::Json).then_some(JsonMode {
                kind: "json_object",
            }),
        }
    }
}

fn chat_endpoint(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim().trim_end_matches('/'))
}

impl LanguageModel for HttpLanguageModel {
    async fn complete(&self, prompt: &str, format: ResponseFormat) -> Result<String> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&self.request_body(prompt, format));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .context("language model request failed")?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(anyhow!("language model returned {status}: {message}"));
        }

        let reply: ChatResponse = response
            .json()
            .await
            .context("language model reply was not valid JSON")?;
        reply
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| anyhow!("language model reply had no content"))
    }
}

/// Configured language model, or none.
#[derive(Debug, Clone)]
pub enum ModelBackend {
    Http(HttpLanguageModel),
    Offline,
}

impl ModelBackend {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        if !config.has_language_model() {
            info!("No language model configured; using local chunking");
            return Ok(Self::Offline);
        }
        info!(
            url = %config.service_base_url,
            model = %config.service_model,
            "Using language model service"
        );
        Ok(Self::Http(HttpLanguageModel::from_config(config)?))
    }
}

impl LanguageModel for ModelBackend {
    fn is_available(&self) -> bool {
        matches!(self, Self::Http(_))
    }

    async fn complete(&self, prompt: &str, format: ResponseFormat) -> Result<String> {
        match self {
            Self::Http(model) => model.complete(prompt, format).await,
            Self::Offline => Unavailable.complete(prompt, format).await,
        }
    }
}

/// Multipart upload to an OCR endpoint answering `{text, confidence, words}`.
#[derive(Debug, Clone)]
pub struct HttpOcrEngine {
    client: Client,
    endpoint: String,
}

#[derive(Deserialize)]
struct OcrReply {
    #[serde(default)]
    text: String,
    #[serde(default)]
    confidence: Option<f32>,
    #[serde(default)]
    words: Vec<OcrWord>,
}

impl OcrReply {
    fn into_result(self) -> OcrResult {
        match self.confidence {
            Some(confidence) => OcrResult {
                text: self.text,
                confidence,
                words: self.words,
            },
            None => OcrResult::from_words(self.text, self.words),
        }
    }
}

impl HttpOcrEngine {
    pub fn from_config(config: &AppConfig) -> Result<Option<Self>> {
        if !config.has_ocr() {
            return Ok(None);
        }
        Ok(Some(Self {
            client: build_client(config.service_timeout_secs)?,
            endpoint: config.ocr_endpoint.trim().to_string(),
        }))
    }
}

/// MIME type for the supported upload formats.
pub fn image_mime(bytes: &[u8]) -> Result<&'static str> {
    let format = image::guess_format(bytes).context("unrecognized image data")?;
    match format {
        image::ImageFormat::Png | image::ImageFormat::Jpeg | image::ImageFormat::WebP => {
            Ok(format.to_mime_type())
        }
        other => Err(anyhow!("unsupported image format {other:?}")),
    }
}

impl OcrEngine for HttpOcrEngine {
    async fn recognize(
        &self,
        request: OcrRequest,
        progress: &(dyn Fn(f32) + Send + Sync),
    ) -> Result<OcrResult> {
        progress(0.0);
        let mime = image_mime(&request.image)?;
        let size = request.image.len();
        let part = multipart::Part::bytes(request.image)
            .file_name("upload")
            .mime_str(mime)
            .context("invalid image MIME type")?;
        let form = multipart::Form::new()
            .text("language", request.language)
            .part("image", part);
        debug!(bytes = size, mime, "Uploading image for recognition");
        progress(0.1);

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .context("OCR request failed")?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(anyhow!("OCR service returned {status}: {message}"));
        }
        progress(0.9);

        let reply: OcrReply = response
            .json()
            .await
            .context("OCR reply was not valid JSON")?;
        progress(1.0);
        Ok(reply.into_result())
    }
}
