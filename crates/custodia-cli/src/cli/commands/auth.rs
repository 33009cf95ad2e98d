//! Login/logout/status handlers.

use anyhow::Result;
use custodia_client::queries::Queries;
use custodia_client::session::mask_token;

use super::prompt_line;

pub async fn login(queries: &Queries, email: &str, password: Option<&str>) -> Result<()> {
    let password = match password {
        Some(p) => p.to_string(),
        None => prompt_line("Password: ")?,
    };
    if password.is_empty() {
        anyhow::bail!("Password must not be empty");
    }

    let user = queries
        .login(email, &password)
        .await
        .map_err(|e| anyhow::anyhow!("Login failed: {e}"))?;

    println!("Logged in as {} (wallet {})", email, user.wallet_address);
    Ok(())
}

pub fn logout(queries: &Queries) -> Result<()> {
    if !queries.client().session().is_authenticated() {
        println!("Not logged in.");
        return Ok(());
    }
    queries.logout();
    println!("Logged out, stored credentials removed.");
    Ok(())
}

pub fn status(queries: &Queries) -> Result<()> {
    let session = queries.client().session().snapshot();
    match (&session.user, &session.access_token) {
        (Some(user), Some(token)) => {
            println!("Logged in:");
            println!("  wallet: {}", user.wallet_address);
            if let Some(email) = &user.email {
                println!("  email:  {email}");
            }
            println!("  token:  {}", mask_token(token));
        }
        _ => println!("Not logged in."),
    }
    Ok(())
}
