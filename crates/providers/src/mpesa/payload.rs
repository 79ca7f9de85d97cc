//! Daraja request and response bodies.

use serde::{Deserialize, Serialize};

/// OAuth token response.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
}

/// Lipa Na M-Pesa Online (STK push) request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct StkPushRequest {
    pub business_short_code: String,
    pub password: String,
    pub timestamp: String,
    pub transaction_type: &'static str,
    pub amount: u64,
    pub party_a: String,
    pub party_b: String,
    pub phone_number: String,
    #[serde(rename = "CallBackURL")]
    pub call_back_url: String,
    pub account_reference: String,
    pub transaction_desc: String,
}

/// STK push acknowledgment.
#[derive(Debug, Deserialize)]
pub(crate) struct StkPushResponse {
    #[serde(rename = "CheckoutRequestID")]
    pub checkout_request_id: String,
    #[serde(rename = "ResponseCode", default)]
    pub response_code: Option<String>,
    #[serde(rename = "ResponseDescription", default)]
    pub response_description: Option<String>,
    #[serde(rename = "CustomerMessage", default)]
    pub customer_message: Option<String>,
}

/// B2C payment request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct B2cRequest {
    pub initiator_name: String,
    pub security_credential: String,
    #[serde(rename = "CommandID")]
    pub command_id: &'static str,
    pub amount: u64,
    pub party_a: String,
    pub party_b: String,
    pub remarks: String,
    #[serde(rename = "QueueTimeOutURL")]
    pub queue_time_out_url: String,
    #[serde(rename = "ResultURL")]
    pub result_url: String,
    pub occassion: String,
}

/// B2C acknowledgment.
#[derive(Debug, Deserialize)]
pub(crate) struct B2cResponse {
    #[serde(rename = "ConversationID")]
    pub conversation_id: String,
    #[serde(rename = "ResponseCode", default)]
    pub response_code: Option<String>,
    #[serde(rename = "ResponseDescription", default)]
    pub response_description: Option<String>,
}

/// Daraja acknowledges with `ResponseCode` "0"; anything else was refused.
pub(crate) fn accepted(response_code: Option<&str>) -> bool {
    response_code.is_none_or(|code| code.trim() == "0")
}
