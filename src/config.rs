use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::render::{CommandRenderer, DEFAULT_TIMEOUT, Renderer};

/// Live preview server: reads document updates on stdin and serves them
/// over HTTP.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    pub bind: String,

    /// Port to bind; 0 picks a free one
    #[arg(long, default_value_t = 0)]
    pub port: u16,

    /// Static page served on `GET /` instead of the rendered document
    #[arg(long, value_name = "FILE")]
    pub shell: Option<PathBuf>,

    /// External converter that reads the document on stdin and writes HTML
    #[arg(long, value_name = "PROGRAM")]
    pub renderer: Option<String>,

    /// Argument passed to the converter (repeatable)
    #[arg(long = "renderer-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub renderer_args: Vec<String>,

    /// Seconds a single conversion may take
    #[arg(long, value_name = "SECONDS", default_value_t = DEFAULT_TIMEOUT.as_secs())]
    pub render_timeout: u64,

    /// Log filter, e.g. `warn` or `livepeek=debug`
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind: String,
    pub port: u16,
    pub shell: Option<PathBuf>,
    pub renderer: Renderer,
    pub log_level: String,
}

impl Config {
    /// Parse the process arguments. Exits with usage on error.
    pub fn load() -> Self {
        Self::from_args(Args::parse())
    }

    pub fn from_args(args: Args) -> Self {
        let renderer = match args.renderer {
            Some(program) => Renderer::Command(CommandRenderer::new(
                program,
                args.renderer_args,
                Duration::from_secs(args.render_timeout),
            )),
            None => Renderer::Identity,
        };

        Self {
            bind: args.bind,
            port: args.port,
            shell: args.shell,
            renderer,
            log_level: args.log_level,
        }
    }
}
