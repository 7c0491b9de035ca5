use ipp::attribute::IppAttribute;
use ipp::model::StatusCode;
use thiserror::Error;

/// A single IPP status/message pair, as raised by the wire layer.
#[derive(Error, Debug, Clone)]
#[error("{code} {msg:?}")]
pub struct IppError {
    pub code: StatusCode,
    pub msg: String,
}

impl IppError {
    pub fn new(code: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            code,
            msg: msg.into(),
        }
    }

    pub fn from_code(code: StatusCode) -> Self {
        Self {
            msg: code.to_string(),
            code,
        }
    }
}

/// The core's internal error type. Every operation handler returns
/// `Result<_, AppError>`; the HTTP layer maps it to an IPP response via
/// [`AppError::status_code`].
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Ipp(IppError),
    #[error("job #{0} not found")]
    JobNotFound(i32),
    #[error("printer {0:?} not found")]
    PrinterNotFound(String),
    #[error("one or more attributes are not supported")]
    AttributesNotSupported(Vec<IppAttribute>),
    #[error("printer is busy processing another job")]
    PrinterBusy,
    #[error("not possible in the job's current state")]
    NotPossible,
    #[error("operation requires authorization")]
    Forbidden,
    #[error("document format {0:?} is not supported")]
    DocumentFormatNotSupported(String),
    #[error("compression {0:?} is not supported")]
    CompressionNotSupported(String),
    #[error("system is shutting down")]
    ShuttingDown,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Ipp(e) => e.code,
            AppError::JobNotFound(_) | AppError::PrinterNotFound(_) => {
                StatusCode::ClientErrorNotFound
            }
            AppError::AttributesNotSupported(_) => {
                StatusCode::ClientErrorAttributesOrValuesNotSupported
            }
            AppError::PrinterBusy => StatusCode::ServerErrorBusy,
            AppError::NotPossible => StatusCode::ClientErrorNotPossible,
            AppError::Forbidden => StatusCode::ClientErrorForbidden,
            AppError::DocumentFormatNotSupported(_) => {
                StatusCode::ClientErrorDocumentFormatNotSupported
            }
            AppError::CompressionNotSupported(_) => StatusCode::ClientErrorCompressionNotSupported,
            AppError::ShuttingDown => StatusCode::ServerErrorNotAcceptingJobs,
            AppError::BadRequest(_) => StatusCode::ClientErrorBadRequest,
            AppError::Internal(_) => StatusCode::ServerErrorInternalError,
        }
    }

    pub fn message(&self) -> String {
        self.to_string()
    }

    pub fn unsupported_attributes(&self) -> Option<&[IppAttribute]> {
        match self {
            AppError::AttributesNotSupported(attrs) => Some(attrs),
            _ => None,
        }
    }
}

impl From<IppError> for AppError {
    fn from(e: IppError) -> Self {
        AppError::Ipp(e)
    }
}
