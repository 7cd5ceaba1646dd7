//! Command-line configuration.

use clap::{ArgAction, Parser};
use ideaink_ai::GeneratorConfig;
use ideaink_core::SessionConfig;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "ideaink",
    about = "Replay whiteboard sessions and grow mind maps with a text model."
)]
pub struct AppConfig {
    /// Directory holding saved workspaces. Defaults to the user data directory.
    #[arg(long = "storage-dir", env = "IDEAINK_STORAGE_DIR")]
    pub storage_dir: Option<PathBuf>,

    /// Workspace to open, created on first save.
    #[arg(short = 'w', long = "workspace", default_value = "default")]
    pub workspace: String,

    /// Display name for a new workspace.
    #[arg(short = 'n', long = "name")]
    pub name: Option<String>,

    /// Event script to replay (JSON array or JSON lines). Use '-' for stdin.
    #[arg(short = 's', long = "script")]
    pub script: Option<String>,

    /// Generation endpoint.
    #[arg(long = "ai-url", env = "IDEAINK_AI_URL")]
    pub ai_url: Option<String>,

    /// Bearer token for the generation endpoint.
    #[arg(long = "ai-key", env = "IDEAINK_AI_KEY", hide_env_values = true)]
    pub ai_key: Option<String>,

    /// Model name sent with each request.
    #[arg(long = "ai-model", env = "IDEAINK_AI_MODEL")]
    pub ai_model: Option<String>,

    /// Request timeout in seconds.
    #[arg(long = "ai-timeout", env = "IDEAINK_AI_TIMEOUT_SECS")]
    pub ai_timeout: Option<u64>,

    /// Answer generation requests locally instead of calling the endpoint.
    #[arg(long = "offline", action = ArgAction::SetTrue)]
    pub offline: bool,

    /// Allow several requests on the same node at once.
    #[arg(long = "concurrent-requests", action = ArgAction::SetTrue)]
    pub concurrent_requests: bool,

    /// Viewport width in screen pixels.
    #[arg(long = "width", default_value_t = 800.0)]
    pub width: f64,

    /// Viewport height in screen pixels.
    #[arg(long = "height", default_value_t = 600.0)]
    pub height: f64,

    /// Leave the stored workspace untouched.
    #[arg(long = "no-save", action = ArgAction::SetTrue)]
    pub no_save: bool,

    /// Print the mind-map outline when done.
    #[arg(long = "outline", action = ArgAction::SetTrue)]
    pub outline: bool,
}

impl AppConfig {
    /// Endpoint settings: command-line values over the environment.
    pub fn generator_config(&self) -> GeneratorConfig {
        let mut config = GeneratorConfig::from_env();
        if let Some(url) = &self.ai_url {
            config.url = url.clone();
        }
        if let Some(key) = self.ai_key.as_ref().filter(|k| !k.trim().is_empty()) {
            config.api_key = Some(key.clone());
        }
        if let Some(model) = &self.ai_model {
            config.model = Some(model.clone());
        }
        if let Some(secs) = self.ai_timeout {
            config.timeout = Duration::from_secs(secs);
        }
        config
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            exclusive_per_node: !self.concurrent_requests,
            ..SessionConfig::default()
        }
    }

    pub fn workspace_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.workspace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::parse_from(["ideaink", "--offline"]);
        assert_eq!(config.workspace, "default");
        assert_eq!(config.workspace_name(), "default");
        assert!(config.offline);
        assert!(config.session_config().exclusive_per_node);
        assert_eq!(config.width, 800.0);
    }

    #[test]
    fn test_generator_overrides() {
        let config = AppConfig::parse_from([
            "ideaink",
            "--ai-url",
            "http://example.test/gen",
            "--ai-model",
            "small",
            "--ai-timeout",
            "5",
            "--concurrent-requests",
        ]);
        let generator = config.generator_config();
        assert_eq!(generator.url, "http://example.test/gen");
        assert_eq!(generator.model.as_deref(), Some("small"));
        assert_eq!(generator.timeout, Duration::from_secs(5));
        assert!(!config.session_config().exclusive_per_node);
    }
}
