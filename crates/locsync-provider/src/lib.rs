//! Machine translation behind a small [`Translator`] seam.
//!
//! The engine only ever calls [`Translator::translate`]; [`HttpTranslator`]
//! is the production implementation for OpenAI-compatible chat endpoints.

use std::fmt;
use std::thread;
use std::time::Duration;

use locsync_config::SyncConfig;
use locsync_core::{Result, SyncError};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

pub const OPENAI_PROVIDER: &str = "openai";
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
/// Environment variables consulted, in order, when the config has no key.
pub const API_KEY_ENV_VARS: [&str; 2] = ["LOCSYNC_API_KEY", "OPENAI_API_KEY"];

pub trait Translator: Send + Sync {
    /// Translate `text` from language `from` into language `to`.
    fn translate(&self, text: &str, from: &str, to: &str) -> Result<String>;
}

/// Stand-in for runs that never translate; every call fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledTranslator;

impl Translator for DisabledTranslator {
    fn translate(&self, _text: &str, _from: &str, _to: &str) -> Result<String> {
        Err(SyncError::ProviderDisabled)
    }
}

/// Provider settings after every precondition has been checked.
#[derive(Clone)]
pub struct ProviderSettings {
    pub provider: String,
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_backoff: Duration,
}

impl fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("provider", &self.provider)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff", &self.retry_backoff)
            .finish()
    }
}

/// Check that translation is enabled, the provider is known and a credential
/// is available. Reads the process environment for the key fallback.
pub fn ensure_ready(config: &SyncConfig) -> Result<ProviderSettings> {
    ensure_ready_with(config, |name| std::env::var(name).ok())
}

/// [`ensure_ready`] with an injectable environment lookup.
pub fn ensure_ready_with(
    config: &SyncConfig,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ProviderSettings> {
    let ai = match &config.ai_translation {
        Some(ai) if ai.enabled => ai,
        _ => return Err(SyncError::ProviderDisabled),
    };
    if ai.provider != OPENAI_PROVIDER {
        return Err(SyncError::config(format!(
            "unknown translation provider `{}` (supported: {OPENAI_PROVIDER})",
            ai.provider
        )));
    }
    let api_key = ai
        .api_key
        .clone()
        .or_else(|| {
            API_KEY_ENV_VARS
                .iter()
                .filter_map(|name| env(name))
                .find(|v| !v.trim().is_empty())
        })
        .ok_or_else(|| SyncError::MissingCredential {
            provider: ai.provider.clone(),
        })?;

    Ok(ProviderSettings {
        provider: ai.provider.clone(),
        api_key,
        model: ai.model.clone(),
        base_url: ai
            .base_url
            .clone()
            .unwrap_or_else(|| OPENAI_BASE_URL.to_string()),
        timeout: ai.timeout(),
        max_retries: ai.max_retries,
        retry_backoff: Duration::from_millis(ai.retry_backoff_ms),
    })
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
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
    content: Option<String>,
}

enum Attempt {
    Retry(String),
    Fatal(String),
}

fn system_prompt(from: &str, to: &str) -> String {
    format!(
        "You translate user interface strings from the language with code `{from}` \
         into the language with code `{to}`. Reply with the translated string only, \
         without quotes or commentary. Keep placeholders such as {{name}}, {{{{name}}}}, \
         %s, %d and $1 exactly as they appear, and keep surrounding whitespace."
    )
}

/// Chat-completions client with a per-request timeout and linear backoff
/// between retries of transient failures (timeouts, connection errors,
/// HTTP 429 and 5xx).
pub struct HttpTranslator {
    client: Client,
    settings: ProviderSettings,
    endpoint: String,
}

impl HttpTranslator {
    pub fn new(settings: ProviderSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .user_agent(concat!("locsync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SyncError::config(format!("cannot build HTTP client: {e}")))?;
        let endpoint = format!(
            "{}/chat/completions",
            settings.base_url.trim_end_matches('/')
        );
        Ok(Self {
            client,
            settings,
            endpoint,
        })
    }

    pub fn from_config(config: &SyncConfig) -> Result<Self> {
        Self::new(ensure_ready(config)?)
    }

    pub fn settings(&self) -> &ProviderSettings {
        &self.settings
    }

    fn attempt(&self, text: &str, from: &str, to: &str) -> std::result::Result<String, Attempt> {
        let prompt = system_prompt(from, to);
        let body = ChatRequest {
            model: &self.settings.model,
            temperature: 0.0,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &prompt,
                },
                ChatMessage {
                    role: "user",
                    content: text,
                },
            ],
        };
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.settings.api_key)
            .json(&body)
            .send()
            .map_err(classify_transport)?;

        let status = response.status();
        let raw = response.text().map_err(classify_transport)?;
        if !status.is_success() {
            let message = format!("HTTP {}: {}", status.as_u16(), snippet(&raw));
            return Err(if is_transient(status) {
                Attempt::Retry(message)
            } else {
                Attempt::Fatal(message)
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&raw)
            .map_err(|e| Attempt::Fatal(format!("malformed response: {e}")))?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Attempt::Fatal("response has no message content".to_string()))?;
        let translated = content.trim();
        if translated.is_empty() && !text.trim().is_empty() {
            return Err(Attempt::Fatal("provider returned an empty translation".to_string()));
        }
        Ok(translated.to_string())
    }
}

impl Translator for HttpTranslator {
    fn translate(&self, text: &str, from: &str, to: &str) -> Result<String> {
        let attempts = self.settings.max_retries + 1;
        let mut last = String::new();
        for attempt in 1..=attempts {
            match self.attempt(text, from, to) {
                Ok(translated) => {
                    tracing::debug!(event = "provider_translated", from = from, to = to, attempt = attempt);
                    return Ok(translated);
                }
                Err(Attempt::Fatal(message)) => {
                    tracing::warn!(event = "provider_failed", to = to, error = %message);
                    return Err(SyncError::ProviderRequest(message));
                }
                Err(Attempt::Retry(message)) => {
                    tracing::warn!(
                        event = "provider_retry",
                        to = to,
                        attempt = attempt,
                        of = attempts,
                        error = %message
                    );
                    last = message;
                    if attempt < attempts {
                        thread::sleep(self.settings.retry_backoff * attempt);
                    }
                }
            }
        }
        Err(SyncError::ProviderRequest(format!(
            "{last} (gave up after {attempts} attempt(s))"
        )))
    }
}

fn classify_transport(err: reqwest::Error) -> Attempt {
    if err.is_timeout() || err.is_connect() {
        Attempt::Retry(err.to_string())
    } else {
        Attempt::Fatal(err.to_string())
    }
}

fn is_transient(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn snippet(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(200) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use locsync_config::AiTranslationConfig;
    use std::io::Read;
    use std::path::PathBuf;
    use tiny_http::{Header, Response, Server};

    fn config(ai: Option<AiTranslationConfig>) -> SyncConfig {
        SyncConfig {
            root: PathBuf::from("."),
            default_language: "en".into(),
            languages: vec!["en".into(), "fr".into()],
            translation_file_path: "locales/{language}.json".into(),
            source_patterns: vec!["src/**/*.js".into()],
            ignore_patterns: vec![],
            key_pattern: None,
            concurrency: 1,
            dry_run: false,
            ai_translation: ai,
        }
    }

    fn ai(enabled: bool, provider: &str, api_key: Option<&str>) -> AiTranslationConfig {
        AiTranslationConfig {
            enabled,
            provider: provider.into(),
            api_key: api_key.map(str::to_string),
            model: "gpt-4o-mini".into(),
            base_url: None,
            timeout_ms: 1_000,
            max_retries: 0,
            retry_backoff_ms: 10,
        }
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn settings(base_url: &str, max_retries: u32, timeout_ms: u64) -> ProviderSettings {
        ProviderSettings {
            provider: OPENAI_PROVIDER.into(),
            api_key: "sk-test".into(),
            model: "gpt-4o-mini".into(),
            base_url: base_url.into(),
            timeout: Duration::from_millis(timeout_ms),
            max_retries,
            retry_backoff: Duration::from_millis(10),
        }
    }

    /// Answers one request per canned `(status, body)` and returns the
    /// request bodies it saw.
    fn serve(replies: Vec<(u16, String)>) -> (String, thread::JoinHandle<Vec<String>>) {
        let server = Server::http("127.0.0.1:0").unwrap();
        let base = format!("http://{}/v1", server.server_addr().to_ip().unwrap());
        let handle = thread::spawn(move || {
            let mut seen = Vec::new();
            for (status, body) in replies {
                let mut request = server.recv().unwrap();
                let mut received = String::new();
                request.as_reader().read_to_string(&mut received).unwrap();
                seen.push(received);
                let header =
                    Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]).unwrap();
                let response = Response::from_string(body)
                    .with_status_code(status)
                    .with_header(header);
                request.respond(response).unwrap();
            }
            seen
        });
        (base, handle)
    }

    fn reply(content: &str) -> String {
        serde_json::json!({"choices": [{"message": {"role": "assistant", "content": content}}]})
            .to_string()
    }

    #[test]
    fn disabled_or_absent_translation_is_rejected() {
        let err = ensure_ready_with(&config(None), no_env).unwrap_err();
        assert!(matches!(err, SyncError::ProviderDisabled));
        let err = ensure_ready_with(&config(Some(ai(false, "openai", Some("k")))), no_env).unwrap_err();
        assert!(matches!(err, SyncError::ProviderDisabled));
    }

    #[test]
    fn missing_credential_is_rejected() {
        let err = ensure_ready_with(&config(Some(ai(true, "openai", None))), no_env).unwrap_err();
        assert!(matches!(err, SyncError::MissingCredential { .. }));
    }

    #[test]
    fn credential_falls_back_to_environment_in_order() {
        let cfg = config(Some(ai(true, "openai", None)));
        let ready = ensure_ready_with(&cfg, |name| match name {
            "LOCSYNC_API_KEY" => Some("  ".into()),
            "OPENAI_API_KEY" => Some("sk-env".into()),
            _ => None,
        })
        .unwrap();
        assert_eq!(ready.api_key, "sk-env");
        assert_eq!(ready.base_url, OPENAI_BASE_URL);

        let cfg = config(Some(ai(true, "openai", Some("sk-config"))));
        let ready = ensure_ready_with(&cfg, |_| Some("sk-env".into())).unwrap();
        assert_eq!(ready.api_key, "sk-config");
        assert!(!format!("{ready:?}").contains("sk-config"));
    }

    #[test]
    fn unknown_provider_is_a_configuration_error() {
        let err = ensure_ready_with(&config(Some(ai(true, "deepl", Some("k")))), no_env).unwrap_err();
        assert!(matches!(err, SyncError::Config(_)));
    }

    #[test]
    fn translates_through_chat_completions() {
        let (base, handle) = serve(vec![(200, reply(" Bonjour \n"))]);
        let translator = HttpTranslator::new(settings(&base, 0, 2_000)).unwrap();
        let out = translator.translate("Hello", "en", "fr").unwrap();
        assert_eq!(out, "Bonjour");

        let seen = handle.join().unwrap();
        let body: serde_json::Value = serde_json::from_str(&seen[0]).unwrap();
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][1]["content"], "Hello");
        assert!(body["messages"][0]["content"]
            .as_str()
            .unwrap()
            .contains("`fr`"));
    }

    #[test]
    fn transient_failures_are_retried() {
        let (base, handle) = serve(vec![
            (503, "overloaded".into()),
            (429, "slow down".into()),
            (200, reply("Hallo")),
        ]);
        let translator = HttpTranslator::new(settings(&base, 2, 2_000)).unwrap();
        assert_eq!(translator.translate("Hello", "en", "de").unwrap(), "Hallo");
        assert_eq!(handle.join().unwrap().len(), 3);
    }

    #[test]
    fn exhausted_retries_surface_as_request_error() {
        let (base, handle) = serve(vec![(500, "boom".into()), (500, "boom".into())]);
        let translator = HttpTranslator::new(settings(&base, 1, 2_000)).unwrap();
        let err = translator.translate("Hello", "en", "fr").unwrap_err();
        assert!(matches!(err, SyncError::ProviderRequest(ref m) if m.contains("HTTP 500")));
        assert_eq!(handle.join().unwrap().len(), 2);
    }

    #[test]
    fn client_errors_and_malformed_bodies_are_not_retried() {
        let (base, handle) = serve(vec![(401, r#"{"error":"bad key"}"#.into())]);
        let translator = HttpTranslator::new(settings(&base, 3, 2_000)).unwrap();
        assert!(translator.translate("Hello", "en", "fr").is_err());
        assert_eq!(handle.join().unwrap().len(), 1);

        let (base, handle) = serve(vec![(200, "not json".into())]);
        let translator = HttpTranslator::new(settings(&base, 3, 2_000)).unwrap();
        let err = translator.translate("Hello", "en", "fr").unwrap_err();
        assert!(matches!(err, SyncError::ProviderRequest(ref m) if m.contains("malformed")));
        assert_eq!(handle.join().unwrap().len(), 1);
    }

    #[test]
    fn timeout_becomes_request_error() {
        let server = Server::http("127.0.0.1:0").unwrap();
        let base = format!("http://{}/v1", server.server_addr().to_ip().unwrap());
        let handle = thread::spawn(move || {
            if let Ok(request) = server.recv() {
                thread::sleep(Duration::from_millis(800));
                let _ = request.respond(Response::from_string(reply("late")));
            }
        });
        let translator = HttpTranslator::new(settings(&base, 0, 150)).unwrap();
        let err = translator.translate("Hello", "en", "fr").unwrap_err();
        assert!(matches!(err, SyncError::ProviderRequest(_)));
        handle.join().unwrap();
    }
}
