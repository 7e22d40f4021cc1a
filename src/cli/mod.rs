//! `giftcard-admin`: operator commands that the public API cannot perform,
//! such as minting the first administrator.

use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};
use serde_json::{Map, Value};

use crate::auth::{hash_password, Role};
use crate::config::DatabaseConfig;
use crate::database::models::{NewUser, UserPatch};
use crate::database::{PgStore, StoreError, UserRepository};
use crate::middleware::Validate;

#[derive(Parser)]
#[command(name = "giftcard-admin")]
#[command(about = "Administrative commands for the gift card API database")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Create a user with the admin role")]
    CreateAdmin {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },

    #[command(about = "Grant the admin role to an existing user")]
    Promote {
        #[arg(help = "Email of the user to promote")]
        email: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    let config = DatabaseConfig::from_env()?;
    if config.is_memory() {
        bail!("DATABASE_URL=memory has nothing to administer; point it at Postgres");
    }

    let store = PgStore::connect(&config).await.context("failed to open the database")?;
    store.migrate().await?;

    let user = match cli.command {
        Commands::CreateAdmin { name, email, password } => {
            create_admin(&store, name, email, password).await?
        }
        Commands::Promote { email } => promote(&store, &email).await?,
    };

    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&user)?),
        OutputFormat::Text => println!(
            "{} <{}> is now {} (id {})",
            user["name"].as_str().unwrap_or_default(),
            user["email"].as_str().unwrap_or_default(),
            user["role"].as_str().unwrap_or_default(),
            user["id"].as_str().unwrap_or_default(),
        ),
    }

    Ok(())
}

/// Apply the registration rules to CLI input
fn check_registration(name: &str, email: &str, password: &str) -> anyhow::Result<()> {
    let mut body = Map::new();
    body.insert("name".to_string(), Value::from(name));
    body.insert("email".to_string(), Value::from(email));
    body.insert("password".to_string(), Value::from(password));

    let errors = Validate::user_register().errors(&body);
    if errors.is_empty() {
        return Ok(());
    }

    let messages: Vec<_> = errors.into_iter().map(|e| e.message).collect();
    Err(anyhow!(messages.join("; ")))
}

async fn create_admin(
    store: &impl UserRepository,
    name: String,
    email: String,
    password: String,
) -> anyhow::Result<Value> {
    check_registration(&name, &email, &password)?;

    let digest = hash_password(&password)?;
    let user = NewUser::new(name, email, digest).with_role(Role::Admin);

    match store.create_user(user).await {
        Ok(user) => Ok(user.public_view()),
        Err(StoreError::Duplicate(email)) => {
            bail!("{} is already registered; use `promote` instead", email)
        }
        Err(e) => Err(e.into()),
    }
}

async fn promote(store: &impl UserRepository, email: &str) -> anyhow::Result<Value> {
    let user = store
        .find_user_by_email(email)
        .await?
        .ok_or_else(|| anyhow!("no user registered with {}", email))?;

    let patch = UserPatch {
        role: Some(Role::Admin),
        ..Default::default()
    };

    let updated = store
        .update_user(user.id, patch)
        .await?
        .ok_or_else(|| anyhow!("user {} disappeared during update", user.id))?;

    Ok(updated.public_view())
}
