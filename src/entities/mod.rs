pub mod bank_partners;
pub mod cash_lending_plans;
pub mod cash_lending_subscriptions;
pub mod enquiries;
pub mod loan_applications;
pub mod membership_card_types;
pub mod membership_cards;
pub mod static_contents;
pub mod users;

pub use bank_partners as bank_partner_entity;
pub use cash_lending_plans as cash_lending_plan_entity;
pub use cash_lending_subscriptions as cash_lending_subscription_entity;
pub use enquiries as enquiry_entity;
pub use loan_applications as loan_application_entity;
pub use membership_card_types as membership_card_type_entity;
pub use membership_cards as membership_card_entity;
pub use static_contents as static_content_entity;
pub use users as user_entity;

pub use cash_lending_subscriptions::SubscriptionStatus;
pub use enquiries::EnquiryStatus;
pub use loan_applications::{LoanStatus, LoanType};
pub use membership_card_types::LoanSupport;
pub use membership_cards::MembershipCardStatus;
pub use users::{UserStatus, UserType};
