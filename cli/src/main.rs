//! `rtm` — command-line harness for the Remember The Milk client.
//!
//! - **`login`** — run the frob → approval → token handshake and print the
//!   token to keep for later runs.
//! - **`echo`** — unauthenticated round-trip, useful to check credentials.
//! - **`check-token`**, **`whoami`**, **`timeline`** — session calls using a
//!   previously obtained token.
//!
//! Logging goes to stderr and is controlled by `RUST_LOG` (default `warn`).

mod config;

use std::path::PathBuf;
use std::process;
use std::time::Duration;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use rtm_core::{BrowserLauncher, Context, ManualApproval, Perms, RetryPolicy, SystemBrowser};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::Settings;

/// rtm — Remember The Milk API client
#[derive(Parser)]
#[command(name = "rtm", version, about, long_about = None)]
struct Cli {
    /// API key issued by Remember The Milk.
    #[arg(long, env = "RTM_API_KEY", global = true, hide_env_values = true)]
    api_key: Option<String>,

    /// Shared secret issued with the API key.
    #[arg(long, env = "RTM_SHARED_SECRET", global = true, hide_env_values = true)]
    secret: Option<String>,

    /// JSON file with `api_key` and `secret`; flags take precedence.
    #[arg(long, value_name = "FILE", global = true)]
    secrets: Option<PathBuf>,

    /// Override the REST endpoint.
    #[arg(long, env = "RTM_REST_URL", global = true)]
    rest_url: Option<String>,

    /// Override the authorization page endpoint.
    #[arg(long, env = "RTM_AUTH_URL", global = true)]
    auth_url: Option<String>,

    /// Per-command deadline in seconds. `login` adds the retry schedule on
    /// top of this while it waits for approval.
    #[arg(long, value_name = "SECS", default_value_t = 30, global = true)]
    timeout: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Authorize this application and print the resulting auth token.
    ///
    /// Opens the authorization page in a browser (or prints it with
    /// `--no-browser`), then polls until the page has been approved.
    Login {
        /// Permission level to request: read, write or delete.
        #[arg(long, default_value = "delete")]
        perms: Perms,

        /// Print the authorization URL instead of opening a browser.
        #[arg(long)]
        no_browser: bool,

        /// Maximum token requests before giving up.
        #[arg(long, default_value_t = 10)]
        attempts: u32,
    },

    /// Call rtm.test.echo.
    Echo {
        #[arg(long, default_value = "pong")]
        ping: String,
    },

    /// Call rtm.auth.checkToken.
    CheckToken {
        #[arg(long, env = "RTM_TOKEN", hide_env_values = true)]
        token: String,
    },

    /// Call rtm.test.login.
    Whoami {
        #[arg(long, env = "RTM_TOKEN", hide_env_values = true)]
        token: String,
    },

    /// Create a timeline and print its id.
    Timeline {
        #[arg(long, env = "RTM_TOKEN", hide_env_values = true)]
        token: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(Cli::parse()) {
        eprintln!("error: {err:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let settings = Settings::resolve(
        cli.api_key,
        cli.secret,
        cli.secrets.as_deref(),
        cli.rest_url,
        cli.auth_url,
    )?;
    let client = settings.client()?;
    let per_command = Duration::from_secs(cli.timeout);
    let ctx = Context::with_timeout(per_command);

    match cli.command {
        Command::Login {
            perms,
            no_browser,
            attempts,
        } => {
            let pending = client.begin_auth(&ctx, perms).context("requesting frob")?;
            info!(frob = pending.frob(), %perms, "frob issued");
            if no_browser {
                println!("Visit the following URL to authorize this application:");
                println!("{}", pending.url());
                ManualApproval.open(pending.url())?;
            } else if let Err(err) = SystemBrowser.open(pending.url()) {
                warn!(%err, "could not open a browser");
                println!("Visit the following URL to authorize this application:");
                println!("{}", pending.url());
            } else {
                info!(url = %pending.url(), "opened authorization page");
            }

            let policy = RetryPolicy {
                max_attempts: attempts,
                ..RetryPolicy::default()
            };
            let exchange = approval_context(per_command, &policy);
            info!(attempts, budget = ?policy.total_backoff(), "waiting for approval");
            let session = pending
                .complete(&client, &exchange, &policy)
                .context("exchanging frob for token")?;
            println!("{}", session.token());
        }
        Command::Echo { ping } => {
            let echo = client.echo(&ctx, &ping)?;
            println!("{}", echo.ping);
        }
        Command::CheckToken { token } => {
            let info = client.resume_session(token).check_token(&ctx)?;
            let perms = info.auth.perms.map(|p| p.to_string()).unwrap_or_default();
            println!("valid: user {} ({perms})", info.auth.user.username);
        }
        Command::Whoami { token } => {
            let login = client.resume_session(token).login(&ctx)?;
            println!("{} (id {})", login.user.username, login.user.id);
        }
        Command::Timeline { token } => {
            let timeline = client.resume_session(token).create_timeline(&ctx)?;
            println!("{}", timeline.id());
        }
    }
    Ok(())
}

/// Deadline for the token exchange. The user gets the whole retry schedule
/// to approve; `per_request` only bounds the requests themselves.
fn approval_context(per_request: Duration, policy: &RetryPolicy) -> Context {
    Context::with_timeout(per_request + policy.total_backoff())
}
