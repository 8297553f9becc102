//! Command-line surface.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Operation selected with `--mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Mode {
    #[default]
    Chat,
    Completion,
    Health,
    Models,
}

/// Client for a llama.cpp server (OpenAI-compatible API).
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "llama-client", version, about)]
pub struct Cli {
    /// Server URL [default: http://localhost:8080]
    #[arg(long, env = "LLAMA_SERVER_URL")]
    pub server: Option<String>,

    /// Operation mode
    #[arg(long, value_enum, default_value_t = Mode::Chat)]
    pub mode: Mode,

    /// Prompt text
    #[arg(short, long)]
    pub prompt: Option<String>,

    /// System prompt for chat mode [default: "You are a helpful assistant."]
    #[arg(short, long)]
    pub system: Option<String>,

    /// Sampling temperature [default: 0.7]
    #[arg(short, long)]
    pub temperature: Option<f32>,

    /// Maximum tokens to generate [default: 512]
    #[arg(short, long)]
    pub max_tokens: Option<u32>,

    /// Stream the response
    #[arg(long)]
    pub stream: bool,

    /// Interactive chat mode
    #[arg(short, long)]
    pub interactive: bool,

    /// Config file (YAML); overrides LLAMA_CLIENT_CONFIG and the default location
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON lines on stderr
    #[arg(long)]
    pub log_json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["llama-client"]).unwrap();
        assert_eq!(cli.mode, Mode::Chat);
        assert!(cli.prompt.is_none());
        assert!(!cli.stream);
        assert!(!cli.interactive);
    }

    #[test]
    fn test_short_flags() {
        let cli = Cli::try_parse_from([
            "llama-client",
            "--mode",
            "completion",
            "-p",
            "2+2=",
            "-s",
            "terse",
            "-t",
            "0.1",
            "-m",
            "16",
            "-i",
            "--stream",
        ])
        .unwrap();
        assert_eq!(cli.mode, Mode::Completion);
        assert_eq!(cli.prompt.as_deref(), Some("2+2="));
        assert_eq!(cli.system.as_deref(), Some("terse"));
        assert_eq!(cli.temperature, Some(0.1));
        assert_eq!(cli.max_tokens, Some(16));
        assert!(cli.interactive);
        assert!(cli.stream);
    }

    #[test]
    fn test_server_from_env() {
        std::env::set_var("LLAMA_SERVER_URL", "http://gpu-box:8080");
        let from_env = Cli::try_parse_from(["llama-client"]).unwrap();
        let from_flag =
            Cli::try_parse_from(["llama-client", "--server", "http://other:9000"]).unwrap();
        std::env::remove_var("LLAMA_SERVER_URL");

        assert_eq!(from_env.server.as_deref(), Some("http://gpu-box:8080"));
        assert_eq!(from_flag.server.as_deref(), Some("http://other:9000"));
    }

    #[test]
    fn test_unknown_mode_rejected() {
        assert!(Cli::try_parse_from(["llama-client", "--mode", "embed"]).is_err());
    }
}
