//! Gateway types module

pub mod response;

pub use response::{
    ApiError, ApiResponse, ApiResult, CreateTransferBody, CreateTransferResponseData,
    HealthResponse, error_codes,
};
