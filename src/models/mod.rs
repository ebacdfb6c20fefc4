pub mod app_log;
pub mod appointment;
pub mod enums;
pub mod expense;
pub mod service;
pub mod user;

pub use app_log::*;
pub use appointment::*;
pub use expense::*;
pub use service::*;
pub use user::*;
