//! Daraja HTTP client.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::Utc;
use forwardsflow_core::payment::{
    CollectionRequest, DisbursementRequest, GatewayError, PaymentAck, PaymentGateway,
};
use forwardsflow_shared::MpesaConfig;
use forwardsflow_shared::types::round_to_shillings;
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::payload::{
    B2cRequest, B2cResponse, StkPushRequest, StkPushResponse, TokenResponse, accepted,
};
use super::phone::normalize_msisdn;
use super::token::TokenCache;
use crate::transport_error;

const TOKEN_PATH: &str = "/oauth/v1/generate?grant_type=client_credentials";
const STK_PUSH_PATH: &str = "/mpesa/stkpush/v1/processrequest";
const B2C_PATH: &str = "/mpesa/b2c/v1/paymentrequest";

/// [`PaymentGateway`] backed by the Daraja REST API.
pub struct MpesaGateway {
    config: MpesaConfig,
    http: Client,
    tokens: TokenCache,
}

impl MpesaGateway {
    /// Builds a gateway with a shared HTTP client using the configured timeout.
    pub fn new(config: MpesaConfig) -> Result<Self, GatewayError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| GatewayError::Network(e.to_string()))?;
        let tokens = TokenCache::new(Duration::from_secs(config.token_ttl_secs));
        Ok(Self {
            config,
            http,
            tokens,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url.trim_end_matches('/'))
    }

    fn msisdn(&self, phone: &str) -> String {
        normalize_msisdn(phone, &self.config.country_code)
    }

    /// STK push password: base64 of shortcode, passkey and timestamp.
    fn stk_password(&self, timestamp: &str) -> String {
        STANDARD.encode(format!(
            "{}{}{timestamp}",
            self.config.shortcode, self.config.passkey
        ))
    }

    async fn access_token(&self) -> Result<String, GatewayError> {
        self.tokens.get_or_fetch(self.fetch_token()).await
    }

    async fn fetch_token(&self) -> Result<String, GatewayError> {
        debug!("Fetching Daraja access token");
        let response = self
            .http
            .get(self.url(TOKEN_PATH))
            .basic_auth(&self.config.consumer_key, Some(&self.config.consumer_secret))
            .send()
            .await
            .map_err(|e| transport_error(&e, self.config.request_timeout_secs))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| transport_error(&e, self.config.request_timeout_secs))?;
        if !status.is_success() {
            return Err(GatewayError::Auth(format!("status {}: {body}", status.as_u16())));
        }

        serde_json::from_str::<TokenResponse>(&body)
            .map(|token| token.access_token)
            .map_err(|e| GatewayError::Auth(format!("unreadable token response: {e}")))
    }

    /// Posts an authenticated JSON request and decodes the acknowledgment.
    async fn post<Req, Resp>(&self, path: &str, request: &Req) -> Result<Resp, GatewayError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let token = self.access_token().await?;
        let response = self
            .http
            .post(self.url(path))
            .bearer_auth(token)
            .json(request)
            .send()
            .await
            .map_err(|e| transport_error(&e, self.config.request_timeout_secs))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| transport_error(&e, self.config.request_timeout_secs))?;

        if status == StatusCode::UNAUTHORIZED {
            self.tokens.invalidate().await;
        }
        if !status.is_success() {
            warn!(path, status = status.as_u16(), body = %body, "Daraja rejected request");
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body)
            .map_err(|e| GatewayError::InvalidResponse(format!("{e}: {body}")))
    }
}

/// Daraja amounts are whole shillings.
fn whole_shillings(amount: Decimal) -> Result<u64, GatewayError> {
    round_to_shillings(amount)
        .to_u64()
        .filter(|units| *units > 0)
        .ok_or_else(|| GatewayError::InvalidRequest(format!("amount {amount} is not payable")))
}

#[async_trait]
impl PaymentGateway for MpesaGateway {
    async fn disburse(&self, request: DisbursementRequest) -> Result<PaymentAck, GatewayError> {
        let loan_id = request.loan_id;
        let body = B2cRequest {
            initiator_name: self.config.initiator_name.clone(),
            security_credential: self.config.security_credential.clone(),
            command_id: "BusinessPayment",
            amount: whole_shillings(request.amount)?,
            party_a: self.config.shortcode.clone(),
            party_b: self.msisdn(&request.phone_number),
            remarks: format!("Loan Disbursement - {loan_id}"),
            queue_time_out_url: format!("{}/timeout", self.config.callback_url),
            result_url: format!("{}/result", self.config.callback_url),
            occassion: format!("ForwardsFlow Loan {loan_id}"),
        };

        let ack: B2cResponse = self.post(B2C_PATH, &body).await?;
        if !accepted(ack.response_code.as_deref()) {
            return Err(GatewayError::Rejected {
                status: StatusCode::OK.as_u16(),
                body: ack.response_description.unwrap_or_default(),
            });
        }

        debug!(loan_id = %loan_id, provider_reference = %ack.conversation_id, "B2C accepted");
        Ok(PaymentAck {
            provider_reference: ack.conversation_id,
            description: ack.response_description.unwrap_or_default(),
        })
    }

    async fn collect(&self, request: CollectionRequest) -> Result<PaymentAck, GatewayError> {
        let loan_id = request.loan_id;
        let timestamp = Utc::now().format("%Y%m%d%H%M%S").to_string();
        let msisdn = self.msisdn(&request.phone_number);
        let body = StkPushRequest {
            business_short_code: self.config.shortcode.clone(),
            password: self.stk_password(&timestamp),
            timestamp,
            transaction_type: "CustomerPayBillOnline",
            amount: whole_shillings(request.amount)?,
            party_a: msisdn.clone(),
            party_b: self.config.shortcode.clone(),
            phone_number: msisdn,
            call_back_url: self.config.callback_url.clone(),
            account_reference: format!("LOAN-{loan_id}"),
            transaction_desc: format!("Loan Repayment - {loan_id}"),
        };

        let ack: StkPushResponse = self.post(STK_PUSH_PATH, &body).await?;
        if !accepted(ack.response_code.as_deref()) {
            return Err(GatewayError::Rejected {
                status: StatusCode::OK.as_u16(),
                body: ack.response_description.unwrap_or_default(),
            });
        }

        debug!(
            loan_id = %loan_id,
            provider_reference = %ack.checkout_request_id,
            "STK push accepted"
        );
        Ok(PaymentAck {
            provider_reference: ack.checkout_request_id,
            description: ack
                .customer_message
                .or(ack.response_description)
                .unwrap_or_default(),
        })
    }
}
