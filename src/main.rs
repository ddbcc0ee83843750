use chat_relay_rs::completion::DEFAULT_API_BASE;
use chat_relay_rs::relay_state::{RelayConfig, RuntimeMode};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "chat-relay")]
#[command(about = "Relay chat messages to an OpenAI-compatible completion API")]
struct CliArgs {
    /// Host address to bind the server
    #[arg(long, env = "CHAT_RELAY_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server
    #[arg(long, env = "CHAT_RELAY_PORT", default_value_t = 3000)]
    port: u16,

    /// Credential for the completion API
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Base URL of the completion API
    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_API_BASE)]
    api_base: String,

    /// Upstream request timeout in seconds
    #[arg(long, env = "CHAT_RELAY_TIMEOUT", default_value_t = 600)]
    timeout: u64,

    /// Runtime mode; development exposes raw error text in responses
    #[arg(long = "env", env = "CHAT_RELAY_ENV", value_enum, default_value_t = RuntimeMode::Production)]
    mode: RuntimeMode,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, env = "CHAT_RELAY_LOG_LEVEL", default_value = "info", value_parser = parse_log_level)]
    log_level: log::LevelFilter,
}

fn parse_log_level(s: &str) -> Result<log::LevelFilter, String> {
    s.parse()
        .map_err(|_| format!("invalid log level '{}'", s))
}

impl From<CliArgs> for RelayConfig {
    fn from(args: CliArgs) -> Self {
        RelayConfig {
            host: args.host,
            port: args.port,
            api_key: args.api_key,
            api_base: args.api_base,
            timeout: args.timeout,
            mode: args.mode,
            log_level: args.log_level,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    chat_relay_rs::run(args.into())
}
