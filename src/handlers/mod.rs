pub mod admin;
pub mod auth;
pub mod bank_partner;
pub mod cash_lending;
pub mod content;
pub mod enquiry;
pub mod health;
pub mod loan;
pub mod membership;
pub mod user;

pub use admin::admin_config;
pub use auth::auth_config;
pub use bank_partner::bank_partner_config;
pub use cash_lending::cash_lending_config;
pub use content::content_config;
pub use enquiry::enquiry_config;
pub use health::health_config;
pub use loan::loan_config;
pub use membership::membership_config;
pub use user::user_config;
