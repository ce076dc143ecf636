use anyhow::Context;
use anyhow::Result;
use anyhow::anyhow;
use anyhow::bail;
use prospector_backend_client::get_auth_file;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;

use crate::context::CliContext;

const LOGIN_FAILED: &str = "Login failed";
const REGISTER_FAILED: &str = "Registration failed";

#[derive(Debug, clap::Parser)]
pub struct LoginArgs {
    #[arg(long)]
    pub email: String,

    /// Read from stdin when neither the flag nor the variable is set.
    #[arg(long, env = "PROSPECTOR_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(Debug, clap::Parser)]
pub struct RegisterArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub email: String,

    #[arg(long, env = "PROSPECTOR_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

pub(crate) async fn run_login(context: &CliContext, args: LoginArgs) -> Result<()> {
    let LoginArgs { email, password } = args;
    let password = resolve_password(password).await?;

    if let Err(err) = context.client.login(&email, &password).await {
        tracing::debug!("login rejected: {err}");
        bail!(err.validation_message(LOGIN_FAILED));
    }
    println!("Logged in as {email}.");
    Ok(())
}

pub(crate) async fn run_register(context: &CliContext, args: RegisterArgs) -> Result<()> {
    let RegisterArgs {
        name,
        email,
        password,
    } = args;
    let password = resolve_password(password).await?;

    let response = context
        .client
        .register(&name, &email, &password)
        .await
        .map_err(|err| anyhow!(err.validation_message(REGISTER_FAILED)))?;
    match response.msg {
        Some(msg) => println!("{msg}"),
        None => println!("Registered {email}. Run `prospector login` to sign in."),
    }
    Ok(())
}

pub(crate) async fn run_logout(context: &CliContext) -> Result<()> {
    if context.client.tokens().get().is_empty() {
        println!("Not logged in.");
        return Ok(());
    }
    context.client.logout().await.with_context(|| {
        format!(
            "failed to remove {}",
            get_auth_file(&context.home).display()
        )
    })?;
    println!("Logged out.");
    Ok(())
}

pub(crate) async fn run_whoami(context: &CliContext) -> Result<()> {
    context.require_session()?;
    let profile = context
        .client
        .me()
        .await
        .map_err(|err| anyhow!(err.user_message("Failed to load profile")))?;
    if profile.name.is_empty() {
        println!("{}", profile.email);
    } else {
        println!("{} <{}>", profile.name, profile.email);
    }
    Ok(())
}

async fn resolve_password(password: Option<String>) -> Result<String> {
    if let Some(password) = password {
        return Ok(password);
    }
    eprint!("Password: ");
    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .context("failed to read password from stdin")?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        bail!("a password is required");
    }
    Ok(password)
}
