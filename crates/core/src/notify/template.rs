//! Message templates.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Placeholder values substituted into a template.
pub type NotificationParams = BTreeMap<&'static str, String>;

/// Messages the lending core sends to borrowers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationTemplate {
    /// Loan approved. Params: `amount`.
    LoanApproved,
    /// Loan rejected. Params: `amount`.
    LoanRejected,
    /// Disbursement confirmed. Params: `amount`, `loan_id`, `outstanding`.
    DisbursementSent,
    /// Repayment confirmed. Params: `amount`, `outstanding`.
    RepaymentReceived,
    /// Final repayment confirmed. Params: `loan_id`.
    LoanClosed,
    /// Provider reported failure. Params: `kind`, `amount`, `loan_id`.
    PaymentFailed,
}

impl NotificationTemplate {
    /// Raw template text with `{name}` placeholders.
    #[must_use]
    pub const fn text(&self) -> &'static str {
        match self {
            Self::LoanApproved => {
                "Great news! Your loan of KES {amount} has been approved. \
                 The money will be sent to your MPESA shortly."
            }
            Self::LoanRejected => {
                "We're sorry, but your loan application for KES {amount} could not be \
                 approved at this time. Please try again with a smaller amount."
            }
            Self::DisbursementSent => {
                "KES {amount} for loan {loan_id} has been sent to your MPESA. \
                 Total to repay: KES {outstanding}."
            }
            Self::RepaymentReceived => {
                "We have received your repayment of KES {amount}. \
                 Outstanding balance: KES {outstanding}."
            }
            Self::LoanClosed => "Your loan {loan_id} is fully repaid. Thank you!",
            Self::PaymentFailed => {
                "Your {kind} of KES {amount} for loan {loan_id} could not be completed. \
                 Please try again or contact support."
            }
        }
    }

    /// Substitutes every `{name}` placeholder that has a value in `params`.
    ///
    /// Placeholders without a value are left untouched.
    #[must_use]
    pub fn render(&self, params: &NotificationParams) -> String {
        params
            .iter()
            .fold(self.text().to_string(), |body, (name, value)| {
                body.replace(&format!("{{{name}}}"), value)
            })
    }
}
