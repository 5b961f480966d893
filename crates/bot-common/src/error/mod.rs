//! Error taxonomy shared by the REST, service and gateway layers

mod app_error;

pub use app_error::{AppError, AppResult};
