use thiserror::Error;

pub mod manifest;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error reading manifest toml: {0}")]
    IO(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Missing TOML key `{0}` while parsing")]
    MissingKey(String),
    #[error("Missing url component `{0}` in string `{1}`")]
    MissingUrlComponent(String, String),
    #[error("Invalid protocol: {0}")]
    InvalidProtocol(String),
    #[error("Invalid revision `{0}`: expected 7 to 40 hex characters")]
    InvalidRevision(String),
}
