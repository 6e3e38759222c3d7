use crate::StravaError;
use secrecy::SecretString;

pub const DEFAULT_BASE_URL: &str = "https://www.strava.com";

#[derive(Clone, Debug)]
pub struct Config {
    pub base_url: String,
    pub email: Option<String>,
    pub password: Option<SecretString>,
}

impl Config {
    pub fn from_env() -> Result<Self, StravaError> {
        Self::from_env_with(|k| std::env::var(k).ok())
    }

    /// Testable helper that reads configuration values using the provided
    /// function instead of the process environment.
    pub fn from_env_with<F>(mut get: F) -> Result<Self, StravaError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let base_url = non_empty(get("STRAVA_BASE_URL"))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(StravaError::Config(format!(
                "STRAVA_BASE_URL must be an http(s) URL, got {base_url:?}"
            )));
        }
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            email: non_empty(get("STRAVA_EMAIL")),
            password: non_empty(get("STRAVA_PASSWORD")).map(|p| SecretString::new(p.into())),
        })
    }

    /// Credentials from the environment, when both halves are present.
    pub fn credentials(&self) -> Option<Credentials> {
        match (&self.email, &self.password) {
            (Some(email), Some(password)) => Some(Credentials {
                email: email.clone(),
                password: password.clone(),
            }),
            _ => None,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Login credentials, whitespace already trimmed.
#[derive(Clone, Debug)]
pub struct Credentials {
    pub email: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(email: &str, password: &str) -> Self {
        Self {
            email: email.trim().to_string(),
            password: SecretString::new(password.trim().into()),
        }
    }
}
