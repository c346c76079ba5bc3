//! Regionlore CLI - regional history summaries
//!
//! The application logic is contained in lib.rs, and this file is responsible
//! for parsing arguments and handling top-level errors.

use clap::{Parser, Subcommand};
use colored::Colorize;
use dialoguer::Password;
use regionlore::auth::SignUpOutcome;
use regionlore::{generate_history, AuthService, Config, Credentials, SupabaseAuth};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "regionlore")]
#[command(author, version, about = "Regional history summaries from Gemini", long_about = None)]
struct Cli {
    /// Path to a regionlore.toml config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarise the history of a region
    History {
        /// Region name, passed to the model as written
        region: String,
    },
    /// Sign in with email and password
    Login {
        #[arg(long)]
        email: String,
        /// Prompted for when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Create an account
    Signup {
        #[arg(long)]
        email: String,
        /// Prompted for when omitted
        #[arg(long)]
        password: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Commands::History { region } => {
            eprintln!("Requesting history for {}...", region.bold());
            match generate_history(&region, &config).await {
                Ok(text) => println!("{}", text),
                Err(e) => anyhow::bail!("Gemini API Error: {}", e),
            }
        }
        Commands::Login { email, password } => {
            let credentials = read_credentials(&email, password)?;
            let service = auth_service(&config)?;
            let mut subscription = service.subscribe();

            match service.sign_in(&credentials).await {
                Ok(_) => {
                    if let Some(Some(session)) = subscription.next().await {
                        println!(
                            "{} Signed in as {} (session valid until {})",
                            "✓".green(),
                            session.user.email.as_deref().unwrap_or(&session.user.id),
                            session.expires_at.format("%Y-%m-%d %H:%M")
                        );
                    }
                }
                Err(e) => anyhow::bail!("Login failed: {}", e),
            }
        }
        Commands::Signup { email, password } => {
            let credentials = read_credentials(&email, password)?;
            let service = auth_service(&config)?;

            match service.sign_up(&credentials).await {
                Ok(SignUpOutcome::SignedIn(session)) => println!(
                    "{} Signed up and signed in as {}",
                    "✓".green(),
                    session.user.email.as_deref().unwrap_or(&session.user.id)
                ),
                Ok(SignUpOutcome::ConfirmationPending { email }) => println!(
                    "{} Sign-up succeeded. Check {} to confirm your account.",
                    "✓".green(),
                    email.bold()
                ),
                Err(e) => anyhow::bail!("Sign-up failed: {}", e),
            }
        }
    }

    Ok(())
}

fn auth_service(config: &Config) -> anyhow::Result<AuthService<SupabaseAuth>> {
    let (url, anon_key) = config.auth_settings()?;
    Ok(AuthService::new(SupabaseAuth::new(url, anon_key)?))
}

/// Use the given password or ask for one without echoing it
fn read_credentials(email: &str, password: Option<String>) -> anyhow::Result<Credentials> {
    let password = match password {
        Some(password) => password,
        None => Password::new().with_prompt("Password").interact()?,
    };
    Ok(Credentials::new(email, &password)?)
}
