use anyhow::Context;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use uuid::Uuid;

use estate_gate::config::routes_from_env;
use estate_gate::gate::{evaluate, Decision, RouteCategory};
use estate_gate::jwt::JwtConfig;
use estate_gate::models::claim::{IdentityClaim, Role, VerificationStatus};

#[derive(Parser, Debug)]
#[command(author, version, about = "estate-gate operator tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Sign an access token with JWT_SECRET (local testing only)
    MintToken {
        /// admin or owner
        #[arg(long)]
        role: Role,
        /// Owner verification status, e.g. pending-approval
        #[arg(long)]
        status: Option<VerificationStatus>,
        /// Subject id; random when omitted
        #[arg(long)]
        sub: Option<String>,
        /// Lifetime in hours, overrides JWT_EXP_HOURS
        #[arg(long)]
        hours: Option<i64>,
    },
    /// Print the gate decision for a page path
    Decide {
        #[arg(long)]
        path: String,
        /// Access token; anonymous when omitted
        #[arg(long)]
        token: Option<String>,
    },
    /// List every configured prefix with its category
    Routes,
    /// Print the category of a single path
    Classify { path: String },
}

fn main() -> anyhow::Result<()> {
    // Try to load env from CWD first, then the crate-local `.env`.
    if dotenv().is_err() {
        let crate_env = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
        let _ = dotenvy::from_path(crate_env);
    }

    let cli = Cli::parse();

    match cli.command {
        Commands::MintToken { role, status, sub, hours } => {
            let mut jwt = JwtConfig::from_env()?;
            if let Some(hours) = hours {
                jwt.exp_hours = hours;
            }

            let sub = sub.unwrap_or_else(|| Uuid::new_v4().to_string());
            let claim = match role {
                Role::Admin => IdentityClaim::admin(),
                Role::Owner => IdentityClaim::owner(status.unwrap_or(VerificationStatus::PendingDocuments)),
            }
            .with_sub(sub);

            let token = jwt.encode(&claim).context("failed to sign token")?;
            println!("{}", token);
        }
        Commands::Decide { path, token } => {
            anyhow::ensure!(path.starts_with('/'), "path must start with '/': {}", path);

            let jwt = JwtConfig::from_env()?;
            let routes = routes_from_env()?;
            let claim = jwt.claim_state(token.as_deref());

            let category = routes.classify(&path);
            match evaluate(&routes, &path, &claim) {
                Decision::Allow => println!("{:<10} {:<18} allow", claim.label(), category.as_str()),
                Decision::Redirect(target) => println!(
                    "{:<10} {:<18} redirect {}",
                    claim.label(),
                    category.as_str(),
                    target.location()
                ),
            }
        }
        Commands::Routes => {
            let routes = routes_from_env()?;

            println!("{:<18} {}", "Category", "Prefix");
            for (prefix, category) in routes.entries() {
                println!("{:<18} {}", category.as_str(), prefix);
            }
            println!("{:<18} {}", RouteCategory::Protected.as_str(), "(everything else)");
            for prefix in routes.asset_prefixes() {
                println!("{:<18} {}", "asset (ungated)", prefix);
            }
        }
        Commands::Classify { path } => {
            let routes = routes_from_env()?;
            if routes.is_asset(&path) {
                println!("asset (ungated)");
            } else {
                println!("{}", routes.classify(&path).as_str());
            }
        }
    }

    Ok(())
}
