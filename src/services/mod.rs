pub mod auth_service;
pub mod bank_partner_service;
pub mod cash_lending_service;
pub mod content_service;
pub mod enquiry_service;
pub mod loan_lifecycle;
pub mod loan_service;
pub mod membership_service;
pub mod notification_service;
pub mod report_service;
pub mod user_service;

pub use auth_service::*;
pub use bank_partner_service::*;
pub use cash_lending_service::*;
pub use content_service::*;
pub use enquiry_service::*;
pub use loan_lifecycle::*;
pub use loan_service::*;
pub use membership_service::*;
pub use notification_service::*;
pub use report_service::*;
pub use user_service::*;
