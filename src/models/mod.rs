pub mod cash_lending;
pub mod common;
pub mod loan_application;
pub mod membership;
pub mod pagination;
pub mod reference;
pub mod report;
pub mod user;

pub use cash_lending::*;
pub use common::*;
pub use loan_application::*;
pub use membership::*;
pub use pagination::*;
pub use reference::*;
pub use report::*;
pub use user::*;
