//! Daraja callback parsing.
//!
//! Two payload shapes arrive on the callback endpoints:
//!
//! - STK push (collection): `{ "Body": { "stkCallback": { ... } } }`
//! - B2C result (disbursement): `{ "Result": { ... } }`
//!
//! Both are flattened into a [`CallbackResult`]. Numeric fields are accepted
//! either as JSON numbers or as strings. An STK callback may omit its
//! checkout id when it carries a `LOAN-{id}` account reference; the loan's
//! open collection is then settled instead.

use forwardsflow_shared::types::LoanId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

use super::error::CallbackError;
use crate::ledger::types::PaymentKind;

/// Prefix of the account reference sent with every collection.
pub const ACCOUNT_REFERENCE_PREFIX: &str = "LOAN-";

/// Provider callback reduced to the fields the ledger needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackResult {
    /// Direction inferred from the payload shape.
    pub kind: PaymentKind,
    /// Provider reference correlating the callback to its request. Absent
    /// on STK callbacks that identify the loan only by account reference.
    pub provider_reference: Option<String>,
    /// Zero on success.
    pub result_code: i64,
    /// Provider's description of the result.
    pub result_desc: Option<String>,
    /// Confirmed amount, when reported.
    pub amount: Option<Decimal>,
    /// Account reference echoed back by the provider.
    pub account_reference: Option<String>,
    /// Provider receipt number.
    pub receipt_number: Option<String>,
}

impl CallbackResult {
    /// Returns true if the provider reported success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.result_code == 0
    }

    /// Loan id encoded in the account reference (`LOAN-{id}`).
    #[must_use]
    pub fn account_loan_id(&self) -> Option<LoanId> {
        self.account_reference
            .as_deref()
            .and_then(|reference| reference.strip_prefix(ACCOUNT_REFERENCE_PREFIX))
            .filter(|id| !id.is_empty())
            .map(LoanId::from)
    }
}

/// Parses either callback shape.
pub fn parse_callback(payload: &Value) -> Result<CallbackResult, CallbackError> {
    if let Some(stk) = payload.pointer("/Body/stkCallback") {
        parse_stk(stk)
    } else if let Some(result) = payload.get("Result") {
        parse_b2c(result)
    } else {
        Err(CallbackError::Malformed(
            "expected Body.stkCallback or Result".to_string(),
        ))
    }
}

fn parse_stk(stk: &Value) -> Result<CallbackResult, CallbackError> {
    let provider_reference = string_field(stk, "CheckoutRequestID")
        .or_else(|| string_field(stk, "MerchantRequestID"));
    let result_code = integer_field(stk, "ResultCode")
        .ok_or_else(|| missing("stkCallback.ResultCode"))?;

    let items = stk
        .pointer("/CallbackMetadata/Item")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    let item = |name: &str| named_value(items, "Name", name);

    let amount = item("Amount").and_then(decimal_value);
    let receipt_number = item("MpesaReceiptNumber")
        .and_then(text_value)
        .or_else(|| string_field(stk, "MpesaReceiptNumber"));
    let account_reference = string_field(stk, "AccountReference")
        .or_else(|| item("AccountReference").and_then(text_value));

    let result = CallbackResult {
        kind: PaymentKind::Collection,
        provider_reference,
        result_code,
        result_desc: string_field(stk, "ResultDesc"),
        amount,
        account_reference,
        receipt_number,
    };

    if result.provider_reference.is_none() && result.account_loan_id().is_none() {
        return Err(missing("stkCallback.CheckoutRequestID or AccountReference"));
    }
    if result.is_success() {
        if result.amount.is_none() {
            return Err(missing("CallbackMetadata Amount"));
        }
        if result.account_loan_id().is_none() {
            return Err(missing("AccountReference"));
        }
    }

    Ok(result)
}

fn parse_b2c(result: &Value) -> Result<CallbackResult, CallbackError> {
    let provider_reference = string_field(result, "ConversationID")
        .or_else(|| string_field(result, "OriginatorConversationID"))
        .ok_or_else(|| missing("Result.ConversationID"))?;
    let result_code =
        integer_field(result, "ResultCode").ok_or_else(|| missing("Result.ResultCode"))?;

    // Daraja sends a single parameter as an object rather than a one-element array
    let parameters = match result.pointer("/ResultParameters/ResultParameter") {
        Some(Value::Array(items)) => items.clone(),
        Some(item @ Value::Object(_)) => vec![item.clone()],
        _ => Vec::new(),
    };
    let parameter = |key: &str| named_value(&parameters, "Key", key);

    Ok(CallbackResult {
        kind: PaymentKind::Disbursement,
        provider_reference: Some(provider_reference),
        result_code,
        result_desc: string_field(result, "ResultDesc"),
        amount: parameter("TransactionAmount").and_then(decimal_value),
        account_reference: None,
        receipt_number: string_field(result, "TransactionID")
            .or_else(|| parameter("TransactionReceipt").and_then(text_value)),
    })
}

fn missing(field: &str) -> CallbackError {
    CallbackError::Malformed(format!("missing {field}"))
}

fn named_value<'a>(items: &'a [Value], label: &str, name: &str) -> Option<&'a Value> {
    items
        .iter()
        .find(|item| item.get(label).and_then(Value::as_str) == Some(name))
        .and_then(|item| item.get("Value"))
}

fn string_field(object: &Value, key: &str) -> Option<String> {
    object.get(key).and_then(text_value)
}

fn integer_field(object: &Value, key: &str) -> Option<i64> {
    match object.get(key)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn text_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn decimal_value(value: &Value) -> Option<Decimal> {
    let raw = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return None,
    };
    Decimal::from_str(&raw)
        .or_else(|_| Decimal::from_scientific(&raw))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn stk_success() -> Value {
        json!({
            "Body": {
                "stkCallback": {
                    "MerchantRequestID": "29115-34620561-1",
                    "CheckoutRequestID": "ws_CO_191220191020363925",
                    "ResultCode": 0,
                    "ResultDesc": "The service request is processed successfully.",
                    "AccountReference": "LOAN-abc123",
                    "CallbackMetadata": {
                        "Item": [
                            { "Name": "Amount", "Value": 5000 },
                            { "Name": "MpesaReceiptNumber", "Value": "NLJ7RT61SV" },
                            { "Name": "PhoneNumber", "Value": 254_708_374_149_u64 }
                        ]
                    }
                }
            }
        })
    }

    #[test]
    fn test_parse_stk_success() {
        let result = parse_callback(&stk_success()).unwrap();
        assert_eq!(result.kind, PaymentKind::Collection);
        assert_eq!(
            result.provider_reference.as_deref(),
            Some("ws_CO_191220191020363925")
        );
        assert!(result.is_success());
        assert_eq!(result.amount, Some(dec!(5000)));
        assert_eq!(result.receipt_number.as_deref(), Some("NLJ7RT61SV"));
        assert_eq!(result.account_loan_id(), Some(LoanId::new("abc123")));
    }

    #[test]
    fn test_parse_stk_missing_account_reference_is_malformed() {
        let mut payload = stk_success();
        payload["Body"]["stkCallback"]
            .as_object_mut()
            .unwrap()
            .remove("AccountReference");
        let err = parse_callback(&payload).unwrap_err();
        assert_eq!(err, CallbackError::Malformed("missing AccountReference".into()));
    }

    #[test]
    fn test_parse_stk_account_reference_from_metadata() {
        let mut payload = stk_success();
        let stk = payload["Body"]["stkCallback"].as_object_mut().unwrap();
        stk.remove("AccountReference");
        stk["CallbackMetadata"]["Item"]
            .as_array_mut()
            .unwrap()
            .push(json!({ "Name": "AccountReference", "Value": "LOAN-abc123" }));
        let result = parse_callback(&payload).unwrap();
        assert_eq!(result.account_loan_id(), Some(LoanId::new("abc123")));
    }

    #[test]
    fn test_parse_stk_without_checkout_id_uses_account_reference() {
        let payload = json!({
            "Body": {
                "stkCallback": {
                    "ResultCode": 0,
                    "CallbackMetadata": { "Item": [{ "Name": "Amount", "Value": 5000 }] },
                    "AccountReference": "LOAN-abc123",
                    "MpesaReceiptNumber": "NLJ7RT61SV"
                }
            }
        });
        let result = parse_callback(&payload).unwrap();
        assert_eq!(result.provider_reference, None);
        assert_eq!(result.account_loan_id(), Some(LoanId::new("abc123")));
        assert_eq!(result.amount, Some(dec!(5000)));
        assert_eq!(result.receipt_number.as_deref(), Some("NLJ7RT61SV"));
    }

    #[test]
    fn test_parse_stk_without_any_reference_is_malformed() {
        let payload = json!({
            "Body": { "stkCallback": { "ResultCode": 1032, "ResultDesc": "Cancelled" } }
        });
        let err = parse_callback(&payload).unwrap_err();
        assert_eq!(
            err,
            CallbackError::Malformed(
                "missing stkCallback.CheckoutRequestID or AccountReference".into()
            )
        );
    }

    #[test]
    fn test_parse_stk_missing_amount_is_malformed() {
        let mut payload = stk_success();
        payload["Body"]["stkCallback"]["CallbackMetadata"]["Item"] = json!([]);
        assert!(parse_callback(&payload).is_err());
    }

    #[test]
    fn test_parse_stk_failure_needs_no_metadata() {
        let payload = json!({
            "Body": {
                "stkCallback": {
                    "CheckoutRequestID": "ws_CO_1",
                    "ResultCode": "1032",
                    "ResultDesc": "Request cancelled by user"
                }
            }
        });
        let result = parse_callback(&payload).unwrap();
        assert_eq!(result.result_code, 1032);
        assert!(!result.is_success());
        assert_eq!(result.amount, None);
    }

    #[test]
    fn test_parse_b2c_result() {
        let payload = json!({
            "Result": {
                "ResultType": 0,
                "ResultCode": 0,
                "ResultDesc": "The service request is processed successfully.",
                "OriginatorConversationID": "10571-7910404-1",
                "ConversationID": "AG_20191219_00004e48cf7e3533f581",
                "TransactionID": "NLJ41HAY6Q",
                "ResultParameters": {
                    "ResultParameter": [
                        { "Key": "TransactionAmount", "Value": 10 },
                        { "Key": "TransactionReceipt", "Value": "NLJ41HAY6Q" }
                    ]
                }
            }
        });
        let result = parse_callback(&payload).unwrap();
        assert_eq!(result.kind, PaymentKind::Disbursement);
        assert_eq!(
            result.provider_reference.as_deref(),
            Some("AG_20191219_00004e48cf7e3533f581")
        );
        assert_eq!(result.amount, Some(dec!(10)));
        assert_eq!(result.receipt_number.as_deref(), Some("NLJ41HAY6Q"));
    }

    #[test]
    fn test_parse_b2c_single_parameter_object() {
        let payload = json!({
            "Result": {
                "ResultCode": 2001,
                "ConversationID": "AG_1",
                "ResultParameters": {
                    "ResultParameter": { "Key": "TransactionAmount", "Value": "250.50" }
                }
            }
        });
        let result = parse_callback(&payload).unwrap();
        assert_eq!(result.amount, Some(dec!(250.50)));
        assert!(!result.is_success());
    }

    #[test]
    fn test_parse_unknown_shape() {
        assert!(parse_callback(&json!({ "hello": "world" })).is_err());
        assert!(parse_callback(&json!({ "Result": { "ResultCode": 0 } })).is_err());
    }

    #[test]
    fn test_account_loan_id_requires_prefix() {
        let mut result = parse_callback(&stk_success()).unwrap();
        result.account_reference = Some("abc123".into());
        assert_eq!(result.account_loan_id(), None);
        result.account_reference = Some("LOAN-".into());
        assert_eq!(result.account_loan_id(), None);
    }
}
