// Copyright 2025 Remi Bernotavicius

use std::{env, fmt::Display, path::PathBuf, str::FromStr};
use tracing::{info, warn};

pub struct Config {
    pub port: u16,
    pub database_path: PathBuf,
    pub jwt_secret: String,
    pub access_token_minutes: i64,
    pub refresh_token_days: i64,
}

impl Config {
    pub fn load() -> crate::Result<Self> {
        let database_path = match env::var("DATABASE_PATH") {
            Ok(path) => PathBuf::from(path),
            Err(_) => data_path()?.join("data.sqlite"),
        };
        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            warn!("JWT_SECRET not set, tokens are signed with an insecure default");
            "insecure-dev-secret".into()
        });
        Ok(Self {
            port: try_load("PORT", "8000"),
            database_path,
            jwt_secret,
            access_token_minutes: try_load("ACCESS_TOKEN_MINUTES", "60"),
            refresh_token_days: try_load("REFRESH_TOKEN_DAYS", "7"),
        })
    }
}

/// This is where the database lives on-disk when `DATABASE_PATH` does not say
/// otherwise. On Linux it should be like: `~/.local/share/recipe_share/`
fn data_path() -> crate::Result<PathBuf> {
    let dirs = directories::BaseDirs::new().expect("failed to get user home directory");
    let path = dirs.data_dir().join("recipe_share");
    std::fs::create_dir_all(&path)?;
    Ok(path)
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    env::var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
        })
        .expect("Environment misconfigured!")
}
