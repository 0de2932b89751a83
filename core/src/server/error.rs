use crate::error::DicomcatError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::{error, warn};

impl DicomcatError {
    /// HTTP status reported for this error
    ///
    /// Faults in the request or the uploaded file are 4xx, faults in the
    /// environment are 5xx.
    pub fn status_code(&self) -> StatusCode {
        match self {
            DicomcatError::InvalidAddressFormat(_)
            | DicomcatError::TagNotFound(_)
            | DicomcatError::DecodeError(_)
            | DicomcatError::EmptyUpload
            | DicomcatError::MalformedUpload(_)
            | DicomcatError::MissingField(_)
            | DicomcatError::InvalidFileName(_) => StatusCode::BAD_REQUEST,
            DicomcatError::FileNotFound(_) => StatusCode::NOT_FOUND,
            DicomcatError::NoPixelData
            | DicomcatError::NoFrames
            | DicomcatError::FrameDecode { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            DicomcatError::StorageFailure(_)
            | DicomcatError::ArchiveError(_)
            | DicomcatError::EncodeError(_)
            | DicomcatError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for DicomcatError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        } else {
            warn!("Request rejected: {}", self);
        }
        let body = match self {
            DicomcatError::Internal(_) => "Internal server error\n".to_string(),
            other => format!("{}\n", other),
        };
        (status, body).into_response()
    }
}
