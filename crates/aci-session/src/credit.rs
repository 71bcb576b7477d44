// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Data credit accounting.
//!
//! `SendData` and `RequestData` each cost one credit regardless of payload
//! size. The peer returns credits with `DataCredit` events.

use log::warn;

use crate::error::{SessionError, SessionResult};

/// Result of applying a `DataCredit` event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CreditEvent {
    /// Credits added
    Granted {
        /// Credits now available
        available: u8,
    },
    /// The peer returned more than it was owed; `available` was clamped to `total`
    Overflow {
        /// Credits reported by the event
        reported: u8,
        /// Amount discarded by the clamp
        excess: u8,
    },
}

/// Available and total data credits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CreditState {
    available: u8,
    total: u8,
}

impl CreditState {
    /// Full budget of `total` credits
    pub const fn new(total: u8) -> Self {
        Self {
            available: total,
            total,
        }
    }

    /// Credits that can still be spent
    pub fn available(&self) -> u8 {
        self.available
    }

    /// Credits granted at start-up
    pub fn total(&self) -> u8 {
        self.total
    }

    /// True when a credit-consuming send must be held back
    pub fn is_exhausted(&self) -> bool {
        self.available == 0
    }

    /// Spend one credit
    pub fn consume(&mut self) -> SessionResult<()> {
        if self.available == 0 {
            return Err(SessionError::CreditExhausted);
        }
        self.available -= 1;
        Ok(())
    }

    /// Add returned credits, never beyond `total`
    pub fn grant(&mut self, credit: u8) -> CreditEvent {
        let sum = self.available as u16 + credit as u16;
        if sum > self.total as u16 {
            let excess = (sum - self.total as u16).min(u8::MAX as u16) as u8;
            warn!(
                "peer returned {} credits with {}/{} available, clamping",
                credit, self.available, self.total
            );
            self.available = self.total;
            return CreditEvent::Overflow {
                reported: credit,
                excess,
            };
        }
        self.available = sum as u8;
        CreditEvent::Granted {
            available: self.available,
        }
    }

    /// Back to the full budget
    pub fn restore(&mut self) {
        self.available = self.total;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consume_then_grant() {
        let mut credit = CreditState::new(2);
        credit.consume().unwrap();
        credit.consume().unwrap();
        assert!(credit.is_exhausted());
        assert_eq!(credit.consume(), Err(SessionError::CreditExhausted));
        assert_eq!(credit.grant(2), CreditEvent::Granted { available: 2 });
    }

    #[test]
    fn test_grant_clamps_at_total() {
        let mut credit = CreditState::new(2);
        credit.consume().unwrap();
        assert_eq!(
            credit.grant(3),
            CreditEvent::Overflow {
                reported: 3,
                excess: 2
            }
        );
        assert_eq!(credit.available(), 2);
    }

    #[test]
    fn test_conservation() {
        let mut credit = CreditState::new(5);
        let mut sent = 0u8;
        let mut returned = 0u8;
        for step in 0..20u8 {
            if step % 3 == 2 && credit.available() < credit.total() {
                credit.grant(1);
                returned += 1;
            } else if credit.consume().is_ok() {
                sent += 1;
            }
            assert_eq!(credit.available(), 5 + returned - sent);
        }
    }
}
