pub mod email;
pub mod jwt;
pub mod otp;
pub mod password;
pub mod phone;

pub use email::*;
pub use jwt::*;
pub use otp::*;
pub use password::*;
pub use phone::*;
