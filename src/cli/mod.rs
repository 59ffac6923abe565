//! CLI entry point for Ignite Gym.

pub mod auth;
pub mod workout;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::api::GymApi;
use crate::auth::FileTokenStore;
use crate::client::{ApiClient, InterceptorHandle};
use crate::config::ClientConfig;
use crate::error::GymError;
use crate::session::{FileUserStore, Session};

/// Ignite Gym CLI
#[derive(Parser, Debug)]
#[command(name = "ignite-gym", version, about = "Ignite Gym workout log client")]
pub struct Cli {
    /// Backend origin (overrides IGNITE_GYM_BASE_URL)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Account and session management
    Auth(AuthArgs),
    /// List muscle groups
    Groups,
    /// List the exercises of a muscle group
    Exercises { group: String },
    /// Show one exercise
    Exercise { id: i64 },
    /// Show the workout history
    History,
    /// Record an exercise as done
    Log { exercise_id: i64 },
    /// Update the profile
    Profile(ProfileArgs),
}

/// Arguments for the `auth` subcommand group.
#[derive(Parser, Debug)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommands,
}

/// Auth subcommands.
#[derive(Subcommand, Debug)]
pub enum AuthCommands {
    /// Sign in with email and password
    Login(LoginArgs),
    /// Create an account and sign in
    Signup(SignupArgs),
    /// Show who is signed in
    Status,
    /// Sign out and forget stored tokens
    Logout,
}

#[derive(Parser, Debug)]
pub struct LoginArgs {
    #[arg(short, long)]
    pub email: String,
    #[arg(short, long)]
    pub password: String,
}

#[derive(Parser, Debug)]
pub struct SignupArgs {
    #[arg(short, long)]
    pub name: String,
    #[arg(short, long)]
    pub email: String,
    #[arg(short, long)]
    pub password: String,
}

/// Arguments for `ignite-gym profile`.
#[derive(Parser, Debug)]
pub struct ProfileArgs {
    #[arg(short, long)]
    pub name: String,
    /// Current password, required when setting a new one
    #[arg(long, requires = "password")]
    pub old_password: Option<String>,
    /// New password
    #[arg(long, requires = "old_password")]
    pub password: Option<String>,
}

/// Everything a command handler needs.
pub struct Context {
    pub session: Arc<Session>,
    pub api: GymApi,
    _interceptor: InterceptorHandle,
}

impl Context {
    /// Build the client on file-backed stores and restore any saved session.
    pub async fn load(base_url: Option<String>) -> Result<Self, GymError> {
        let mut config = ClientConfig::from_env()?;
        if let Some(url) = base_url {
            config = config.with_base_url(url);
        }
        let tokens = Arc::new(FileTokenStore::new(config.data_dir.clone()));
        let users = Arc::new(FileUserStore::new(config.data_dir.clone()));
        let client = ApiClient::new(config, tokens)?;
        let session = Arc::new(Session::new(client.clone(), users));
        let interceptor = session.attach();
        session.restore().await?;
        Ok(Self {
            session,
            api: GymApi::new(client),
            _interceptor: interceptor,
        })
    }
}

/// Install the tracing subscriber (`RUST_LOG`, default `warn`).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Run a parsed command.
pub async fn run(cli: Cli) -> Result<(), GymError> {
    let ctx = Context::load(cli.base_url).await?;
    match cli.command {
        Commands::Auth(args) => match args.command {
            AuthCommands::Login(args) => auth::handle_login(&ctx, &args).await,
            AuthCommands::Signup(args) => auth::handle_signup(&ctx, &args).await,
            AuthCommands::Status => auth::handle_status(&ctx),
            AuthCommands::Logout => auth::handle_logout(&ctx).await,
        },
        Commands::Groups => workout::handle_groups(&ctx).await,
        Commands::Exercises { group } => workout::handle_exercises(&ctx, &group).await,
        Commands::Exercise { id } => workout::handle_exercise(&ctx, id).await,
        Commands::History => workout::handle_history(&ctx).await,
        Commands::Log { exercise_id } => workout::handle_log(&ctx, exercise_id).await,
        Commands::Profile(args) => workout::handle_profile(&ctx, &args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parse_auth_login() {
        let cli = Cli::try_parse_from([
            "ignite-gym",
            "auth",
            "login",
            "-e",
            "ana@example.com",
            "-p",
            "123456",
        ])
        .unwrap();
        match cli.command {
            Commands::Auth(auth) => match auth.command {
                AuthCommands::Login(args) => {
                    assert_eq!(args.email, "ana@example.com");
                    assert_eq!(args.password, "123456");
                }
                other => panic!("expected Login, got {other:?}"),
            },
            other => panic!("expected Auth, got {other:?}"),
        }
    }

    #[test]
    fn parse_global_base_url_after_subcommand() {
        let cli = Cli::try_parse_from([
            "ignite-gym",
            "groups",
            "--base-url",
            "http://10.0.0.2:3333",
        ])
        .unwrap();
        assert_eq!(cli.base_url.as_deref(), Some("http://10.0.0.2:3333"));
        assert!(matches!(cli.command, Commands::Groups));
    }

    #[test]
    fn parse_exercises_with_group() {
        let cli = Cli::try_parse_from(["ignite-gym", "exercises", "costas"]).unwrap();
        match cli.command {
            Commands::Exercises { group } => assert_eq!(group, "costas"),
            other => panic!("expected Exercises, got {other:?}"),
        }
    }

    #[test]
    fn parse_log_requires_numeric_id() {
        assert!(Cli::try_parse_from(["ignite-gym", "log", "abc"]).is_err());
        let cli = Cli::try_parse_from(["ignite-gym", "log", "7"]).unwrap();
        assert!(matches!(cli.command, Commands::Log { exercise_id: 7 }));
    }

    #[test]
    fn parse_profile_password_needs_old_password() {
        assert!(Cli::try_parse_from([
            "ignite-gym",
            "profile",
            "-n",
            "Ana",
            "--password",
            "new"
        ])
        .is_err());
        let cli = Cli::try_parse_from([
            "ignite-gym",
            "profile",
            "-n",
            "Ana",
            "--password",
            "new",
            "--old-password",
            "old",
        ])
        .unwrap();
        match cli.command {
            Commands::Profile(args) => {
                assert_eq!(args.password.as_deref(), Some("new"));
                assert_eq!(args.old_password.as_deref(), Some("old"));
            }
            other => panic!("expected Profile, got {other:?}"),
        }
    }

    #[test]
    fn parse_missing_subcommand_is_error() {
        assert!(Cli::try_parse_from(["ignite-gym"]).is_err());
    }
}
