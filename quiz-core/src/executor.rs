//! HTTPS client issuing quiz generation requests
//!
//! One call per attempt; the raw body is returned unparsed so that callers can
//! tell a network failure apart from unusable content.

use crate::config::QuizConfig;
use crate::protocol::{GenerateRequest, GenerationConfig};
use crate::{Error, Result};
use reqwest::{Client, ClientBuilder};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

/// Outcome of one network attempt: raw body or the reason it failed
pub type RequestOutcome = Result<String>;

/// Something that can ask a provider for a quiz on a topic
pub trait Transport: Send + Sync {
    /// Issue a single request, without retrying
    fn execute(&self, topic: &str) -> impl Future<Output = RequestOutcome> + Send;
}

/// Configuration for the HTTP executor
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Provider endpoint, without credentials
    pub endpoint: String,
    /// Provider credential
    pub api_key: Option<String>,
    /// Transport-level request timeout
    pub timeout: Duration,
    /// Sampling parameters sent with every request
    pub generation: GenerationConfig,
}

impl From<&QuizConfig> for ExecutorConfig {
    fn from(config: &QuizConfig) -> Self {
        Self {
            endpoint: config.api_endpoint.clone(),
            api_key: config.api_key().map(str::to_owned),
            timeout: config.request_timeout(),
            generation: GenerationConfig::from(config),
        }
    }
}

/// HTTP client for the generative AI provider
#[derive(Debug, Clone)]
pub struct HttpExecutor {
    client: Client,
    config: ExecutorConfig,
}

impl HttpExecutor {
    /// Create a new executor with configuration
    pub fn new(config: ExecutorConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(config.timeout)
            .pool_max_idle_per_host(crate::MAX_CONCURRENT_REQUESTS)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .use_rustls_tls()
            .build()
            .map_err(Error::Network)?;

        Ok(Self { client, config })
    }

    /// Endpoint URL with the key appended as a query parameter
    fn build_request_url(&self, api_key: &str) -> Result<Url> {
        let mut url = Url::parse(&self.config.endpoint).map_err(|e| {
            Error::Config(format!("Invalid endpoint '{}': {}", self.config.endpoint, e))
        })?;

        url.query_pairs_mut().append_pair("key", api_key);

        Ok(url)
    }
}

impl Transport for HttpExecutor {
    #[instrument(skip(self), fields(endpoint = %self.config.endpoint))]
    async fn execute(&self, topic: &str) -> RequestOutcome {
        let api_key = match self.config.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => key,
            _ => {
                warn!("API key missing, request not sent");
                return Err(Error::MissingApiKey);
            }
        };

        let url = self.build_request_url(api_key)?;
        let body = GenerateRequest::from_prompt(build_prompt(topic), self.config.generation);

        debug!("Sending quiz request for topic '{}'", topic);

        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                // The URL carries the key
                let e = e.without_url();
                warn!("Quiz request failed: {}", e);
                Error::Network(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("HTTP error {}: {}", status, body);
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| Error::Network(e.without_url()))?;

        debug!("Received {} byte response", text.len());
        Ok(text)
    }
}

/// Prompt sent to the model for `topic`
///
/// Asks for exactly one question, four options and one correct label, as bare
/// JSON using the same field names as the local dataset.
pub fn build_prompt(topic: &str) -> String {
    let mut prompt = String::with_capacity(1024);

    prompt.push_str("Anda adalah asisten pembuat kuis keamanan siber untuk sebuah game edukasi AR.\n");
    prompt.push_str("Tugas Anda adalah membuat 1 pertanyaan kuis pilihan ganda tentang keamanan siber.\n\n");
    prompt.push_str(&format!("TOPIK: {}\n\n", topic.trim()));
    prompt.push_str("PERSYARATAN:\n");
    prompt.push_str("- Pertanyaan harus edukatif dan sesuai untuk pemain umum\n");
    prompt.push_str("- Gunakan bahasa Indonesia yang baik dan benar\n");
    prompt.push_str("- Tepat 4 pilihan jawaban (A, B, C, D) dan hanya 1 jawaban yang benar\n");
    prompt.push_str("- Hindari pertanyaan yang terlalu teknis\n\n");
    prompt.push_str("FORMAT OUTPUT: Berikan HANYA JSON dalam format berikut (tanpa markdown, tanpa backticks):\n");
    prompt.push_str("{\n");
    prompt.push_str("  \"pertanyaan\": \"teks pertanyaan di sini\",\n");
    prompt.push_str("  \"pilihan_a\": \"teks pilihan A\",\n");
    prompt.push_str("  \"pilihan_b\": \"teks pilihan B\",\n");
    prompt.push_str("  \"pilihan_c\": \"teks pilihan C\",\n");
    prompt.push_str("  \"pilihan_d\": \"teks pilihan D\",\n");
    prompt.push_str("  \"jawaban_benar\": \"A atau B atau C atau D\"\n");
    prompt.push_str("}\n");

    prompt
}
