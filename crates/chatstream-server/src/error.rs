use thiserror::Error;

pub const ENV_PREFIX: &str = "CHATSTREAM";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {env_var}")]
    MissingEnvVar { env_var: String },

    #[error("Configuration error: {0}")]
    Other(#[from] config::ConfigError),
}

/// Map a configuration key to the environment variable that sets it
///
/// Unqualified keys come from serde's missing field errors, which are always provider fields
/// since every server field has a default.
pub fn to_env_var(field: &str) -> String {
    let key = if field.contains('.') {
        field.replace('.', "__")
    } else {
        format!("provider__{}", field)
    };
    format!("{}_{}", ENV_PREFIX, key.to_uppercase())
}
