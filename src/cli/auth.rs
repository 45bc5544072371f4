//! CLI auth command handlers for login, status, and logout.

use std::sync::Arc;

use crate::auth::{CredentialManager, CredentialStore, FileCredentialStore};
use crate::config::DEFAULT_REDIRECT_URI;

/// Handle `ampgate auth login`.
///
/// Prints the consent URL, waits for the pasted redirect code, and
/// stores the resulting credential.
pub async fn handle_login() -> Result<(), Box<dyn std::error::Error>> {
    let manager = manager_from_env()?;

    println!("🔗 Visit: {}", manager.authorize_url()?);
    println!("📋 After authorizing, paste the `code` value from the redirect URL below:");
    print!("> ");
    use std::io::Write;
    std::io::stdout().flush()?;

    let mut code = String::new();
    std::io::stdin().read_line(&mut code)?;
    let code = code.trim();

    if code.is_empty() {
        eprintln!("❌ No code provided.");
        std::process::exit(1);
    }

    manager.exchange_authorization_code(code).await?;
    println!("✅ Spotify login successful!");
    Ok(())
}

/// Handle `ampgate auth status`.
pub async fn handle_status() -> Result<(), Box<dyn std::error::Error>> {
    let store = store_from_env();

    println!("🔐 Authentication Status\n");

    match store.load() {
        Ok(Some(credential)) => {
            let status = match credential.remaining_secs_at(chrono::Utc::now()) {
                Some(secs) if secs > 0 => {
                    format!("✅ Logged in (access token valid for {secs}s)")
                }
                Some(_) => "⚠️  Access token expired (will refresh on next run)".to_string(),
                None => "✅ Logged in".to_string(),
            };
            println!("  Spotify: {status}");
            if credential.refresh_token.is_none() {
                println!("  ⚠️  No refresh token stored; run `ampgate auth login` again.");
            }
        }
        Ok(None) => println!("  Spotify: ❌ Not logged in"),
        Err(e) => println!("  Spotify: ⚠️  Error: {e}"),
    }
    println!("\n📌 Credential file: {}", store.path().display());

    Ok(())
}

/// Handle `ampgate auth logout`.
pub async fn handle_logout() -> Result<(), Box<dyn std::error::Error>> {
    let store = store_from_env();
    store.clear()?;
    println!("✅ Logged out; credential removed.");
    Ok(())
}

/// Build a manager from the OAuth application settings in the
/// environment. Device addresses are not needed here, so this reads
/// the auth variables directly rather than the full config.
fn manager_from_env() -> Result<CredentialManager, Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();

    let client_id = non_empty_var("SPOTIFY_CLIENT_ID")?;
    let client_secret = non_empty_var("SPOTIFY_CLIENT_SECRET")?;
    let redirect_uri = std::env::var("SPOTIFY_REDIRECT_URI")
        .unwrap_or_else(|_| DEFAULT_REDIRECT_URI.to_string());

    let store = Arc::new(store_from_env());
    Ok(CredentialManager::new(
        store,
        client_id,
        client_secret,
        redirect_uri,
    ))
}

fn store_from_env() -> FileCredentialStore {
    match std::env::var("AMPGATE_CREDENTIAL_PATH") {
        Ok(path) if !path.is_empty() => FileCredentialStore::new(path.into()),
        _ => FileCredentialStore::new_default(),
    }
}

fn non_empty_var(name: &str) -> Result<String, Box<dyn std::error::Error>> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(format!("{name} is not set; add it to the environment or .env").into()),
    }
}
