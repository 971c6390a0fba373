use config::ConfigError;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    pub jwt: JwtSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
    /// Mark auth cookies `Secure` (disable only for plain-HTTP development)
    pub secure_cookies: bool,
}

#[derive(serde::Deserialize, Clone)]
pub struct DatabaseSettings {
    /// Full connection string; takes precedence over the individual parts
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub port: Option<u16>,
    pub host: Option<String>,
    pub database_name: Option<String>,
    pub max_connections: u32,
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> Result<String, ConfigError> {
        if let Some(url) = self.url.as_deref().filter(|url| !url.trim().is_empty()) {
            return Ok(url.to_string());
        }

        match (
            &self.username,
            &self.password,
            &self.host,
            self.port,
            &self.database_name,
        ) {
            (Some(username), Some(password), Some(host), Some(port), Some(database_name)) => {
                Ok(format!(
                    "postgres://{}:{}@{}:{}/{}",
                    username, password, host, port, database_name
                ))
            }
            _ => Err(ConfigError::Message(
                "database.url or all of database.{username,password,host,port,database_name} must be set"
                    .to_string(),
            )),
        }
    }
}

/// JWT authentication settings
#[derive(serde::Deserialize, Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub access_token_expiry: i64,  // seconds (900 = 15 minutes)
    pub refresh_token_expiry: i64, // seconds (2592000 = 30 days)
}

impl Settings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.secret.trim().is_empty() {
            return Err(ConfigError::Message("jwt.secret must be set".to_string()));
        }
        if self.jwt.access_token_expiry <= 0 || self.jwt.refresh_token_expiry <= 0 {
            return Err(ConfigError::Message(
                "jwt token expiries must be positive".to_string(),
            ));
        }
        self.database.connection_string()?;
        Ok(())
    }
}

/// Load settings from `configuration.{yaml,toml,json}` (optional) overlaid
/// with `APP_`-prefixed environment variables, e.g. `APP_JWT__SECRET`.
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .set_default("application.host", "127.0.0.1")?
        .set_default("application.port", 8000)?
        .set_default("application.secure_cookies", true)?
        .set_default("database.max_connections", 5)?
        .set_default("jwt.secret", "")?
        .set_default("jwt.access_token_expiry", 900)?
        .set_default("jwt.refresh_token_expiry", 2_592_000)?
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    let settings = settings.try_deserialize::<Settings>()?;
    settings.validate()?;
    Ok(settings)
}
