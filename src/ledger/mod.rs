// src/ledger/mod.rs

use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::models::{ Asset, Triangle };

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("{name} must be in [0, 1), got {value}")] InvalidRate {
        name: &'static str,
        value: Decimal,
    },
}

/// A debit that drove a balance below zero. The debit is still applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Overdraft {
    pub asset: Asset,
    pub balance_before: Decimal,
    pub amount: Decimal,
}

impl Overdraft {
    /// How far below zero the balance ended up
    #[inline]
    pub fn shortfall(&self) -> Decimal {
        self.amount - self.balance_before
    }
}

/// Read-only copy of the three balances
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Balances {
    pub a: Decimal,
    pub b: Decimal,
    pub c: Decimal,
}

impl Balances {
    #[inline]
    pub fn get(&self, asset: Asset) -> Decimal {
        match asset {
            Asset::A => self.a,
            Asset::B => self.b,
            Asset::C => self.c,
        }
    }

    /// Human readable form using the triangle's ticker names
    pub fn display<'a>(&'a self, triangle: &'a Triangle) -> BalancesDisplay<'a> {
        BalancesDisplay { balances: self, triangle }
    }
}

pub struct BalancesDisplay<'a> {
    balances: &'a Balances,
    triangle: &'a Triangle,
}

impl fmt::Display for BalancesDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}={:.2}, {}={:.2}, {}={:.2}",
            self.triangle.asset_name(Asset::A),
            self.balances.a,
            self.triangle.asset_name(Asset::B),
            self.balances.b,
            self.triangle.asset_name(Asset::C),
            self.balances.c
        )
    }
}

/// Simulated holdings of the three assets plus the execution cost model.
///
/// Balances are not clamped: a debit larger than the balance is applied and
/// reported as an [`Overdraft`].
#[derive(Debug, Clone)]
pub struct Ledger {
    balances: [Decimal; 3],
    fee_rate: Decimal,
    slippage_rate: Decimal,
    overdrafts: u64,
}

impl Ledger {
    pub fn new(
        initial: Balances,
        fee_rate: Decimal,
        slippage_rate: Decimal
    ) -> Result<Self, LedgerError> {
        check_rate("fee_rate", fee_rate)?;
        check_rate("slippage_rate", slippage_rate)?;

        Ok(Self {
            balances: [initial.a, initial.b, initial.c],
            fee_rate,
            slippage_rate,
            overdrafts: 0,
        })
    }

    #[inline]
    pub fn fee_rate(&self) -> Decimal {
        self.fee_rate
    }

    #[inline]
    pub fn slippage_rate(&self) -> Decimal {
        self.slippage_rate
    }

    #[inline]
    pub fn balance(&self, asset: Asset) -> Decimal {
        self.balances[asset.index()]
    }

    pub fn balances(&self) -> Balances {
        Balances {
            a: self.balances[Asset::A.index()],
            b: self.balances[Asset::B.index()],
            c: self.balances[Asset::C.index()],
        }
    }

    /// Number of debits so far that left a balance negative
    #[inline]
    pub fn overdrafts(&self) -> u64 {
        self.overdrafts
    }

    /// Remove `amount` from `asset`, returning the overdraft if the balance goes negative
    pub fn debit(&mut self, asset: Asset, amount: Decimal) -> Option<Overdraft> {
        let balance = &mut self.balances[asset.index()];
        let balance_before = *balance;
        *balance -= amount;

        if *balance < Decimal::ZERO {
            self.overdrafts += 1;
            warn!(
                asset = ?asset,
                balance_before = %balance_before,
                amount = %amount,
                "Debit overdraws balance"
            );
            return Some(Overdraft { asset, balance_before, amount });
        }

        None
    }

    #[inline]
    pub fn credit(&mut self, asset: Asset, amount: Decimal) {
        self.balances[asset.index()] += amount;
    }
}

fn check_rate(name: &'static str, value: Decimal) -> Result<(), LedgerError> {
    if value < Decimal::ZERO || value >= Decimal::ONE {
        return Err(LedgerError::InvalidRate { name, value });
    }
    Ok(())
}
