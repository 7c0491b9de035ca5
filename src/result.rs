use crate::error::AppError;
use ipp::request::IppRequestResponse;

/// Result type returned by every IPP operation handler.
pub type IppResult = Result<IppRequestResponse, AppError>;
