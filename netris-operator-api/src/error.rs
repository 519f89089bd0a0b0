use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("couldn't parse '{}' as a controller address", .0)]
    InvalidAddress(String),
    #[error("couldn't reach the controller! Reason: {}", .0)]
    Http(#[from] reqwest::Error),
    #[error("controller rejected the credentials for '{}'!", .0)]
    AuthRejected(String),
    #[error("controller replied with an error: {}", .0)]
    Api(String),
    #[error("couldn't decode the controller reply! Reason: {}", .0)]
    Decode(#[from] serde_json::Error),
}
