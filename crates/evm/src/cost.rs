// Copyright 2015-2020 Parity Technologies (UK) Ltd.
// This file is part of OpenEthereum.

// OpenEthereum is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// OpenEthereum is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with OpenEthereum.  If not, see <http://www.gnu.org/licenses/>.

//! Abstraction over the gas counter's integer width, so the interpreter can
//! run cheaply on `u64` while still being able to represent the full `U256`
//! range a caller might pass as `gas`.

use ethereum_types::U256;
use std::fmt;
use std::ops::{Add, Div, Mul, Sub};

/// An integer type usable as a gas counter.
pub trait CostType:
    Sized
    + Copy
    + Send
    + fmt::Debug
    + Ord
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
{
    /// Convert to `U256`.
    fn as_u256(&self) -> U256;
    /// Convert from `U256`; fails if it does not fit.
    fn from_u256(val: U256) -> Result<Self, vm::Error>;
    /// Add, saturating at the type's maximum instead of overflowing.
    fn overflow_add(self, other: Self) -> (Self, bool);
    /// Multiply, saturating at the type's maximum instead of overflowing.
    fn overflow_mul(self, other: Self) -> (Self, bool);
    /// Multiply two factors and add a third, saturating on overflow.
    fn overflow_mul_add(self, a: Self, b: Self) -> (Self, bool) {
        let (mul, overflow) = self.overflow_mul(a);
        if overflow {
            return (mul, true);
        }
        let (sum, overflow2) = mul.overflow_add(b);
        (sum, overflow || overflow2)
    }
}

impl CostType for U256 {
    fn as_u256(&self) -> U256 {
        *self
    }

    fn from_u256(val: U256) -> Result<Self, vm::Error> {
        Ok(val)
    }

    fn overflow_add(self, other: Self) -> (Self, bool) {
        self.overflowing_add(other)
    }

    fn overflow_mul(self, other: Self) -> (Self, bool) {
        self.overflowing_mul(other)
    }
}

impl CostType for u64 {
    fn as_u256(&self) -> U256 {
        U256::from(*self)
    }

    fn from_u256(val: U256) -> Result<Self, vm::Error> {
        if val <= U256::from(u64::max_value()) {
            Ok(val.low_u64())
        } else {
            Err(vm::Error::OutOfGas)
        }
    }

    fn overflow_add(self, other: Self) -> (Self, bool) {
        self.overflowing_add(other)
    }

    fn overflow_mul(self, other: Self) -> (Self, bool) {
        self.overflowing_mul(other)
    }
}
