use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Booking;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChargeStatus {
    Succeeded,
    Declined,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeReceipt {
    pub provider: String,
    pub provider_payment_id: String,
    pub amount: Decimal,
    pub currency: String,
    pub status: ChargeStatus,
    pub reason: Option<String>,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Charge the booking's total fare
    async fn charge(
        &self,
        booking: &Booking,
        currency: &str,
    ) -> Result<ChargeReceipt, Box<dyn std::error::Error + Send + Sync>>;

    /// Return `amount` against an earlier charge
    async fn refund(
        &self,
        provider_payment_id: &str,
        amount: Decimal,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Auto-approving stand-in for a real processor.
pub struct SimulatedGateway {
    decline: bool,
}

impl SimulatedGateway {
    pub const PROVIDER: &'static str = "TEST";

    pub fn approving() -> Self {
        Self { decline: false }
    }

    /// Declines every charge; used to exercise rollback paths.
    pub fn declining() -> Self {
        Self { decline: true }
    }
}

impl Default for SimulatedGateway {
    fn default() -> Self {
        Self::approving()
    }
}

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    async fn charge(
        &self,
        booking: &Booking,
        currency: &str,
    ) -> Result<ChargeReceipt, Box<dyn std::error::Error + Send + Sync>> {
        let (status, reason) = if self.decline {
            (ChargeStatus::Declined, Some("Simulated decline".to_string()))
        } else {
            (ChargeStatus::Succeeded, None)
        };

        tracing::debug!("Simulated charge for {}: {:?}", booking.pnr, status);

        Ok(ChargeReceipt {
            provider: Self::PROVIDER.to_string(),
            provider_payment_id: Uuid::new_v4().to_string(),
            amount: booking.total_fare,
            currency: currency.to_string(),
            status,
            reason,
        })
    }

    async fn refund(
        &self,
        provider_payment_id: &str,
        amount: Decimal,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        tracing::debug!("Simulated refund of {} on {}", amount, provider_payment_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LedgerKey;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn booking() -> Booking {
        let key = LedgerKey::new(2, NaiveDate::from_ymd_opt(2026, 11, 1).unwrap(), "Sleeper");
        Booking::new("ZXCVB12345".into(), "user-9".into(), &key, 3, dec!(1200.00), dec!(3600.00))
    }

    #[tokio::test]
    async fn test_simulated_gateway_approves_full_fare() {
        let receipt = SimulatedGateway::approving().charge(&booking(), "INR").await.unwrap();
        assert_eq!(receipt.status, ChargeStatus::Succeeded);
        assert_eq!(receipt.amount, dec!(3600.00));
        assert_eq!(receipt.provider, "TEST");
        assert!(receipt.reason.is_none());
    }

    #[tokio::test]
    async fn test_declining_gateway() {
        let receipt = SimulatedGateway::declining().charge(&booking(), "INR").await.unwrap();
        assert_eq!(receipt.status, ChargeStatus::Declined);
        assert!(receipt.reason.is_some());
    }
}
