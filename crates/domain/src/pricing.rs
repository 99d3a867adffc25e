//! Order pricing seam.

use common::{Cart, CheckoutParameters, DeliveryType, Money};

use crate::error::{DomainError, Result};

/// Price of an order being created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    /// Grand total, delivery included.
    pub total: Money,
    /// Present only for mail delivery.
    pub delivery_price: Option<Money>,
}

/// Computes the total and delivery price of a cart.
///
/// Prices come from the client, so implementations reject amounts that are
/// negative or overflow instead of trusting them.
pub trait PriceCalculator: Send + Sync {
    fn quote(&self, cart: &Cart, params: &CheckoutParameters) -> Result<Quote>;
}

/// Sums line totals and adds a fixed fee for mail delivery.
#[derive(Debug, Clone, Copy)]
pub struct FlatRatePricing {
    pub mail_delivery: Money,
}

impl FlatRatePricing {
    pub fn new(mail_delivery: Money) -> Self {
        Self { mail_delivery }
    }
}

impl Default for FlatRatePricing {
    fn default() -> Self {
        Self::new(Money::from_cents(500))
    }
}

impl PriceCalculator for FlatRatePricing {
    fn quote(&self, cart: &Cart, params: &CheckoutParameters) -> Result<Quote> {
        let overflow = || DomainError::InvalidPrice("order total is too large".to_string());

        let mut total = Money::zero();
        for item in &cart.items {
            if item.unit_price < Money::zero() {
                return Err(DomainError::InvalidPrice(format!(
                    "negative unit price for variant {}",
                    item.variant_id
                )));
            }
            let line = item.line_total().ok_or_else(overflow)?;
            total = total.checked_add(line).ok_or_else(overflow)?;
        }

        let delivery_price = match params.delivery_type {
            DeliveryType::Mail => Some(self.mail_delivery),
            DeliveryType::SelfPickup => None,
        };
        if let Some(fee) = delivery_price {
            total = total.checked_add(fee).ok_or_else(overflow)?;
        }

        Ok(Quote {
            total,
            delivery_price,
        })
    }
}
