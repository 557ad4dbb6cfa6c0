//! Configuration and CLI argument handling

use clap::{Parser, ValueEnum};

use crate::services::GeneratorConfig;
use crate::timer::engine::{TABATA_REST_SECONDS, TABATA_WORK_SECONDS};

/// Where timer cues are sent
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CueBackend {
    /// Drop every cue
    Silent,
    /// Write cues to the debug log
    Log,
    /// Play cues on the default output device
    Speaker,
}

/// CLI argument parsing structure
#[derive(Debug, Parser)]
#[command(name = "wod-coach")]
#[command(about = "A workout interval timer service with generated workouts")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Cue output backend
    #[arg(long, value_enum, default_value = "log")]
    pub cues: CueBackend,

    /// Tabata work interval in seconds
    #[arg(long, default_value_t = TABATA_WORK_SECONDS)]
    pub tabata_work: u32,

    /// Tabata rest interval in seconds
    #[arg(long, default_value_t = TABATA_REST_SECONDS)]
    pub tabata_rest: u32,

    /// Azure OpenAI resource endpoint
    #[arg(long, env = "AZURE_OPENAI_ENDPOINT")]
    pub azure_endpoint: Option<String>,

    /// Azure OpenAI API key
    #[arg(long, env = "AZURE_OPENAI_API_KEY", hide_env_values = true)]
    pub azure_api_key: Option<String>,

    /// Azure OpenAI chat deployment name
    #[arg(long, env = "AZURE_OPENAI_DEPLOYMENT_NAME")]
    pub azure_deployment: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    /// Generator settings, if all three Azure values are present
    pub fn generator(&self) -> Option<GeneratorConfig> {
        match (&self.azure_endpoint, &self.azure_api_key, &self.azure_deployment) {
            (Some(endpoint), Some(api_key), Some(deployment))
                if !endpoint.is_empty() && !api_key.is_empty() && !deployment.is_empty() =>
            {
                Some(GeneratorConfig {
                    endpoint: endpoint.clone(),
                    api_key: api_key.clone(),
                    deployment: deployment.clone(),
                })
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::try_parse_from(["wod-coach"]).unwrap();
        assert_eq!(config.address(), "127.0.0.1:20554");
        assert_eq!(config.cues, CueBackend::Log);
        assert_eq!(config.tabata_work, 20);
        assert_eq!(config.tabata_rest, 10);
        assert_eq!(config.log_level(), "info");
    }

    #[test]
    fn generator_needs_all_azure_values() {
        let partial = Config::try_parse_from([
            "wod-coach",
            "--azure-endpoint",
            "https://example.openai.azure.com",
            "--azure-api-key",
            "secret",
            "--azure-deployment",
            "",
        ])
        .unwrap();
        assert!(partial.generator().is_none());

        let full = Config::try_parse_from([
            "wod-coach",
            "--azure-endpoint",
            "https://example.openai.azure.com",
            "--azure-api-key",
            "secret",
            "--azure-deployment",
            "coach",
            "--cues",
            "silent",
            "-v",
        ])
        .unwrap();
        assert_eq!(full.generator().unwrap().deployment, "coach");
        assert_eq!(full.cues, CueBackend::Silent);
        assert_eq!(full.log_level(), "debug");
    }
}
