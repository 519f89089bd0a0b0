use std::borrow::Cow;

use netris_operator_api::ApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconcilerError {
    #[error("Object is missing metadata!")]
    MissingObjectMetadata,
    #[error("Couldn't access the cluster! Reason: {}", .0)]
    KubeApiError(anyhow::Error),
    #[error("The Netris controller rejected the request! Reason: {}", .0)]
    ControllerApiError(#[from] ApiError),
    // resolution messages land in resource statuses verbatim
    #[error("{}", .0)]
    TranslateError(Cow<'static, str>),
}
