use std::io::{BufRead, Write};

use strava_bulk_client::{Config, Credentials};

/// Credentials from `STRAVA_EMAIL`/`STRAVA_PASSWORD`, or asked for on the terminal.
pub fn credentials(config: &Config) -> anyhow::Result<Credentials> {
    if let Some(creds) = config.credentials() {
        tracing::debug!("using credentials from the environment");
        return Ok(creds);
    }
    prompt_credentials()
}

fn prompt_credentials() -> anyhow::Result<Credentials> {
    let email = {
        let mut stdout = std::io::stdout();
        write!(stdout, "Enter Strava email: ")?;
        stdout.flush()?;
        read_email(&mut std::io::stdin().lock())?
    };
    let password = rpassword::prompt_password("Enter Strava password: ")
        .map_err(|e| anyhow::anyhow!("Please enter a valid password ({e})"))?;
    Ok(Credentials::new(&email, &password))
}

fn read_email(input: &mut impl BufRead) -> anyhow::Result<String> {
    let mut line = String::new();
    input.read_line(&mut line)?;
    let email = line.trim().to_string();
    if email.is_empty() {
        anyhow::bail!("Please enter a valid email address.");
    }
    Ok(email)
}
