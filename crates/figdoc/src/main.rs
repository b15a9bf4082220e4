use std::time::Duration;

use crate::prelude::*;
use clap::Parser;

mod diagram;
mod error;
mod figma;
mod generate;
mod pipeline;
mod prelude;
mod report;
mod server;
mod store;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Turn a Figma design link into an architecture PDF report"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Figma personal access token
    #[clap(long, env = "FIGMA_TOKEN", global = true, hide_env_values = true)]
    figma_token: Option<String>,

    /// Figma REST API base URL
    #[clap(
        long,
        env = "FIGMA_API_URL",
        global = true,
        default_value = figma::DEFAULT_API_URL
    )]
    figma_api_url: String,

    /// Figma request timeout, in seconds
    #[clap(long, env = "FIGMA_TIMEOUT", global = true, default_value = "30")]
    figma_timeout: u64,

    /// Whether to display additional information.
    #[clap(long, env = "FIGDOC_VERBOSE", global = true, default_value = "false")]
    verbose: bool,
}

impl Global {
    pub fn figma_config(&self) -> figma::FigmaConfig {
        figma::FigmaConfig {
            api_url: self.figma_api_url.trim_end_matches('/').to_string(),
            token: self.figma_token.clone().filter(|t| !t.trim().is_empty()),
            timeout: Duration::from_secs(self.figma_timeout),
        }
    }
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Run the HTTP service
    Serve(crate::server::ServeOptions),

    /// Generate one report from the command line
    Generate(crate::generate::GenerateOptions),
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let app = App::parse();

    match app.command {
        SubCommands::Serve(options) => crate::server::run(options, app.global).await,
        SubCommands::Generate(options) => crate::generate::run(options, app.global).await,
    }
    .map_err(|err: color_eyre::eyre::Report| eyre!(err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let app = App::try_parse_from(["figdoc", "serve"]).unwrap();
        let config = app.global.figma_config();

        assert_eq!(config.timeout, Duration::from_secs(30));
        match app.command {
            SubCommands::Serve(options) => {
                assert_eq!(options.port, 8002);
                assert_eq!(options.max_upload_bytes, 10 * 1024 * 1024);
                assert_eq!(options.retention_secs, 900);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_figma_config_drops_blank_token() {
        let app = App::try_parse_from([
            "figdoc",
            "--figma-token",
            " ",
            "--figma-api-url",
            "http://localhost:9000/",
            "generate",
            "https://figma.com/file/abc/x",
        ])
        .unwrap();
        let config = app.global.figma_config();

        assert_eq!(config.token, None);
        assert_eq!(config.api_url, "http://localhost:9000");
    }
}
