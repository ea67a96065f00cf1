// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! S2 rewards command-line client.
//!
//! # Usage
//!
//! ```bash
//! # Create an account (a wallet is provisioned and its key exported)
//! FIREBASE_API_KEY=... FIREBASE_PROJECT_ID=... \
//! S2_PASSWORD=secret1 s2-rewards signup --email neo@example.com --username neo
//!
//! # Log in (sends the welcome bonus on the first verified login)
//! S2_PASSWORD=secret1 s2-rewards login --email neo@example.com
//!
//! # Transfer tokens
//! S2_PASSWORD=secret1 s2-rewards send --email neo@example.com --to 0x... --amount 2.5
//!
//! # Local store instead of Firestore, JSON logs
//! s2-rewards --store redb --data-dir /tmp/s2 --log-format json login --email ...
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use s2_rewards_client::auth::OAuthCredential;
use s2_rewards_client::blockchain::{Erc20LedgerFactory, NetworkConfig, RandomWalletGenerator};
use s2_rewards_client::bonus::{BonusService, BonusStatus};
use s2_rewards_client::config::{AppConfig, StoreBackend};
use s2_rewards_client::cooldown::{format_cooldown_time, GameCooldown};
use s2_rewards_client::earnings::{Earnings, GameEarnings};
use s2_rewards_client::error::AppError;
use s2_rewards_client::export::{export_private_key, key_backup_notice};
use s2_rewards_client::flows::{
    self, EmailSignup, GoogleSignupOutcome, LoggedIn, LoginOutcome, LoginRequest, ResendOutcome,
    TransferProgress, TransferRequest, VerificationResend,
};
use s2_rewards_client::logging::{init_logging, LogFormat};
use s2_rewards_client::models::ProvisionedWallet;
use s2_rewards_client::providers::{
    http_client, FirebaseAuthClient, FirestoreUserStore, HttpBonusService, IdTokenCell,
    UnconfiguredBonusService,
};
use s2_rewards_client::state::AppState;
use s2_rewards_client::storage::{
    JsonFileKeyValueStore, MemoryUserStore, RedbUserStore, StorageError, UserStore,
};
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(name = "s2-rewards", version, about = "S2 rewards client")]
struct Cli {
    /// User store backend (overrides STORE_BACKEND)
    #[arg(long, value_enum, global = true)]
    store: Option<StoreBackend>,

    /// Local data directory (overrides DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Log output format (overrides LOG_FORMAT)
    #[arg(long, value_enum, global = true)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct Credentials {
    #[arg(long)]
    email: String,

    #[arg(long, env = "S2_PASSWORD", hide_env_values = true)]
    password: String,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create an email/password account
    Signup {
        #[command(flatten)]
        credentials: Credentials,

        /// Defaults to the part of the email before `@`
        #[arg(long, default_value = "")]
        username: String,
    },
    /// Create an account from a Google ID token
    GoogleSignup {
        #[arg(long, env = "S2_GOOGLE_ID_TOKEN", hide_env_values = true)]
        id_token: String,
    },
    /// Log in with email and password
    Login {
        #[command(flatten)]
        credentials: Credentials,

        /// Resend the verification email if the address is unverified
        #[arg(long)]
        resend_verification: bool,
    },
    /// Log in with a Google ID token
    GoogleLogin {
        #[arg(long, env = "S2_GOOGLE_ID_TOKEN", hide_env_values = true)]
        id_token: String,
    },
    /// Send a password reset email
    ResetPassword {
        #[arg(long)]
        email: String,
    },
    /// Send a new verification email
    ResendVerification {
        #[command(flatten)]
        credentials: Credentials,
    },
    /// Transfer tokens to another address
    Send {
        #[command(flatten)]
        credentials: Credentials,

        #[arg(long)]
        to: String,

        /// Human-readable amount, e.g. 2.5
        #[arg(long)]
        amount: String,
    },
    /// Show game earnings
    Earnings {
        #[command(flatten)]
        credentials: Credentials,

        /// Only this game's counter
        #[arg(long)]
        game: Option<String>,
    },
    /// Add coins to a game's counter
    AddCoins {
        #[command(flatten)]
        credentials: Credentials,

        #[arg(long)]
        game: String,

        #[arg(long)]
        amount: u64,
    },
    /// Manage local action cooldowns
    Cooldown {
        #[command(subcommand)]
        action: CooldownCommand,
    },
}

#[derive(Debug, Subcommand)]
enum CooldownCommand {
    /// Start a cooldown
    Set {
        action: String,

        #[arg(long)]
        minutes: u32,
    },
    /// Show the remaining time
    Status { action: String },
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    App(#[from] AppError),

    #[error("HTTP client setup failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Email address is not verified")]
    Unverified,
}

impl CliError {
    fn user_message(&self) -> String {
        match self {
            CliError::App(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}

impl From<StorageError> for CliError {
    fn from(e: StorageError) -> Self {
        CliError::App(e.into())
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(store) = cli.store {
        config.store_backend = store;
    }
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }

    init_logging(config.log_format);

    match run(cli.command, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("{}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, config: &AppConfig) -> Result<(), CliError> {
    if let Command::Cooldown { action } = command {
        return run_cooldown(action, config);
    }

    let network = NetworkConfig::sepolia(config.rpc_url.as_str());
    let state = build_state(config, &network)?;

    match command {
        Command::Signup {
            credentials,
            username,
        } => {
            let outcome = flows::sign_up_with_email(
                &state,
                &EmailSignup {
                    email: &credentials.email,
                    password: &credentials.password,
                    username: &username,
                },
            )
            .await?;
            save_key(config, &outcome.wallet, &outcome.email);
            println!("Account created. Wallet: {}", outcome.wallet.wallet_address);
            match outcome.verification_error {
                None => println!(
                    "A verification email was sent to {}. Verify it, then log in.",
                    outcome.email
                ),
                Some(failure) => println!(
                    "Could not send the verification email: {}",
                    failure.message
                ),
            }
        }
        Command::GoogleSignup { id_token } => {
            let outcome =
                flows::sign_up_with_google(&state, &OAuthCredential::Google { id_token }).await?;
            match outcome {
                GoogleSignupOutcome::Created { session, wallet } => {
                    save_key(config, &wallet, session.email());
                    println!("Account created. Wallet: {}", wallet.wallet_address);
                }
                GoogleSignupOutcome::AlreadyRegistered { session } => {
                    println!("{} is already registered. Please log in.", session.email());
                }
            }
        }
        Command::Login {
            credentials,
            resend_verification,
        } => {
            let logged_in = email_login(&state, &credentials, resend_verification).await?;
            report_login(config, *logged_in).await;
        }
        Command::GoogleLogin { id_token } => {
            let logged_in =
                flows::login_with_google(&state, &OAuthCredential::Google { id_token }).await?;
            report_login(config, logged_in).await;
        }
        Command::ResetPassword { email } => {
            flows::send_password_reset(&state, &email).await?;
            println!("Password reset email sent to {}.", email.trim());
        }
        Command::ResendVerification { credentials } => {
            match flows::resend_verification(&state, &credentials.email, &credentials.password)
                .await?
            {
                ResendOutcome::Sent => println!("Verification email sent."),
                ResendOutcome::AlreadyVerified => println!("Email is already verified."),
            }
        }
        Command::Send {
            credentials,
            to,
            amount,
        } => {
            let logged_in = email_login(&state, &credentials, false).await?;
            let receipt = flows::send_tokens(
                &state,
                &logged_in.session,
                &TransferRequest {
                    to: &to,
                    amount: &amount,
                },
                |progress| match progress {
                    TransferProgress::Submitted { tx_hash } => {
                        println!("Submitted: {}", network.tx_url(&tx_hash.to_string()));
                    }
                },
            )
            .await?;
            println!(
                "Sent {} {} to {} in block {}",
                receipt.amount, receipt.symbol, receipt.to, receipt.block_number
            );
            finish_bonus(logged_in.bonus).await;
        }
        Command::Earnings { credentials, game } => {
            let logged_in = email_login(&state, &credentials, false).await?;
            let earnings = GameEarnings::new(state.store.clone());
            match earnings
                .get_earnings(&logged_in.session, game.as_deref())
                .await?
            {
                Earnings::Game(coins) => println!("{coins}"),
                Earnings::All(map) => {
                    for (game, coins) in &map {
                        println!("{game}: {coins}");
                    }
                    println!(
                        "total: {}",
                        earnings.get_total_earnings(&logged_in.session).await
                    );
                }
            }
            finish_bonus(logged_in.bonus).await;
        }
        Command::AddCoins {
            credentials,
            game,
            amount,
        } => {
            let logged_in = email_login(&state, &credentials, false).await?;
            GameEarnings::new(state.store.clone())
                .add_coins(&logged_in.session, &game, amount)
                .await?;
            println!("Added {amount} coins to {game}.");
            finish_bonus(logged_in.bonus).await;
        }
        Command::Cooldown { .. } => {}
    }

    Ok(())
}

fn run_cooldown(command: CooldownCommand, config: &AppConfig) -> Result<(), CliError> {
    let cooldown = GameCooldown::new(Arc::new(JsonFileKeyValueStore::new(
        config.local_state_path(),
    )));
    match command {
        CooldownCommand::Set { action, minutes } => {
            cooldown.set_cooldown(&action, minutes)?;
            println!("{action} is on cooldown for {minutes}m.");
        }
        CooldownCommand::Status { action } => {
            let remaining = cooldown.get_cooldown_remaining(&action);
            if remaining > 0 {
                println!("{action}: {} left", format_cooldown_time(remaining));
            } else {
                println!("{action}: ready");
            }
        }
    }
    Ok(())
}

fn build_state(config: &AppConfig, network: &NetworkConfig) -> Result<AppState, CliError> {
    let http = http_client(config.http_timeout)?;
    let token = IdTokenCell::new();
    let api_key = config.require_api_key().map_err(AppError::from)?;

    let store: Arc<dyn UserStore> = match config.store_backend {
        StoreBackend::Firestore => {
            let project_id = config.require_project_id().map_err(AppError::from)?;
            Arc::new(FirestoreUserStore::new(
                project_id,
                api_key,
                http.clone(),
                token.clone(),
            ))
        }
        StoreBackend::Redb => {
            std::fs::create_dir_all(&config.data_dir).map_err(StorageError::from)?;
            Arc::new(RedbUserStore::open(&config.user_db_path())?)
        }
        StoreBackend::Memory => Arc::new(MemoryUserStore::new()),
    };

    let bonus: Arc<dyn BonusService> = match &config.bonus_url {
        Some(url) => Arc::new(HttpBonusService::new(url.as_str(), http.clone())),
        None => Arc::new(UnconfiguredBonusService),
    };

    info!(
        store = ?config.store_backend,
        network = %network.name,
        token = %config.token.symbol,
        "Client configured"
    );

    Ok(AppState {
        identity: Arc::new(FirebaseAuthClient::new(api_key, http, token)),
        store,
        wallets: Arc::new(RandomWalletGenerator),
        bonus,
        ledgers: Arc::new(Erc20LedgerFactory::new(
            network.clone(),
            config.token.clone(),
        )),
        token: config.token.clone(),
    })
}

async fn email_login(
    state: &AppState,
    credentials: &Credentials,
    resend_verification: bool,
) -> Result<Box<LoggedIn>, CliError> {
    let outcome = flows::login(
        state,
        &LoginRequest {
            email: &credentials.email,
            password: &credentials.password,
            resend_verification,
        },
    )
    .await?;

    match outcome {
        LoginOutcome::LoggedIn(logged_in) => Ok(logged_in),
        LoginOutcome::EmailUnverified { email, resend, .. } => {
            println!("Please verify your email ({email}) before logging in.");
            match resend {
                Some(VerificationResend::Sent) => println!("A new verification email was sent."),
                Some(VerificationResend::Failed(failure)) => {
                    println!("Could not resend the verification email: {}", failure.message)
                }
                None => println!("Run `resend-verification` to get a new link."),
            }
            Err(CliError::Unverified)
        }
    }
}

async fn report_login(config: &AppConfig, logged_in: LoggedIn) {
    if let Some(wallet) = &logged_in.provisioned {
        save_key(config, wallet, &logged_in.record.email);
    }
    println!(
        "Logged in as {}. Wallet: {}",
        logged_in.record.username, logged_in.record.wallet_address
    );
    finish_bonus(logged_in.bonus).await;
}

async fn finish_bonus(bonus: BonusStatus) {
    if let BonusStatus::Pending(handle) = bonus {
        println!("{}", handle.outcome().await.user_message());
    }
}

fn save_key(config: &AppConfig, wallet: &ProvisionedWallet, email: &str) {
    match export_private_key(&config.key_export_dir, wallet, email) {
        Ok(path) => println!("Private key saved to {}. KEEP THIS FILE SAFE!", path.display()),
        Err(e) => {
            error!(error = %e, "Private key export failed");
            println!("Could not save the private key file: {}", e.user_message());
            println!("{}", key_backup_notice(wallet));
        }
    }
}
