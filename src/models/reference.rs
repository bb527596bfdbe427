//! Requests for the simple lookup records: bank partners, static content and
//! enquiries.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::entities::EnquiryStatus;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BankPartnerRequest {
    pub name: String,
    pub logo_url: Option<String>,
    pub website: Option<String>,
    pub description: Option<String>,
    pub min_interest_bps: Option<i32>,
    pub max_interest_bps: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpsertContentRequest {
    pub title: String,
    pub body: String,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateEnquiryRequest {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateEnquiryStatusRequest {
    pub status: EnquiryStatus,
    pub admin_notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EnquiryQuery {
    pub status: Option<EnquiryStatus>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}
