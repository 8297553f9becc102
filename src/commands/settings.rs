//! Effective run settings.
//!
//! Merges CLI flags (which already include their env vars) over the config
//! file over built-in defaults. The result is immutable for the whole run.

use std::time::Duration;

use crate::inference::config::DEFAULT_SERVER_URL;
use crate::inference::{ClientConfig, FileConfig, SamplingParams};

use super::args::{Cli, Mode};

/// System prompt used when neither the flag nor the config file sets one.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    pub mode: Mode,
    pub client: ClientConfig,
    pub prompt: Option<String>,
    pub system_prompt: String,
    pub sampling: SamplingParams,
    pub stream: bool,
    pub interactive: bool,
}

impl RunSettings {
    pub fn resolve(cli: Cli, file: FileConfig) -> Self {
        let defaults = SamplingParams::default();

        let server = cli
            .server
            .or(file.server)
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());
        let client = ClientConfig::new(server)
            .with_request_timeout(file.request_timeout_secs.map(Duration::from_secs));

        Self {
            mode: cli.mode,
            client,
            prompt: cli.prompt,
            system_prompt: cli
                .system
                .or(file.system_prompt)
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            sampling: SamplingParams {
                temperature: cli
                    .temperature
                    .or(file.temperature)
                    .unwrap_or(defaults.temperature),
                max_tokens: cli
                    .max_tokens
                    .or(file.max_tokens)
                    .unwrap_or(defaults.max_tokens),
            },
            stream: cli.stream,
            interactive: cli.interactive,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_defaults() {
        let settings = RunSettings::resolve(Cli::default(), FileConfig::default());
        assert_eq!(settings.client.base_url, DEFAULT_SERVER_URL);
        assert_eq!(settings.system_prompt, DEFAULT_SYSTEM_PROMPT);
        assert_eq!(settings.sampling, SamplingParams::default());
        assert!(settings.client.request_timeout.is_none());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let file = FileConfig {
            server: Some("http://gpu-box:8080/".into()),
            system_prompt: Some("Be terse.".into()),
            temperature: Some(0.1),
            max_tokens: Some(32),
            request_timeout_secs: Some(120),
        };
        let settings = RunSettings::resolve(Cli::default(), file);
        assert_eq!(settings.client.base_url, "http://gpu-box:8080");
        assert_eq!(settings.system_prompt, "Be terse.");
        assert_eq!(settings.sampling.max_tokens, 32);
        assert_eq!(
            settings.client.request_timeout,
            Some(Duration::from_secs(120))
        );
    }

    #[test]
    fn test_cli_overrides_file() {
        let cli = Cli {
            server: Some("http://cli:1234".into()),
            max_tokens: Some(8),
            ..Cli::default()
        };
        let file = FileConfig {
            server: Some("http://file:8080".into()),
            max_tokens: Some(32),
            temperature: Some(1.5),
            ..FileConfig::default()
        };
        let settings = RunSettings::resolve(cli, file);
        assert_eq!(settings.client.base_url, "http://cli:1234");
        assert_eq!(settings.sampling.max_tokens, 8);
        assert!((settings.sampling.temperature - 1.5).abs() < f32::EPSILON);
    }
}
