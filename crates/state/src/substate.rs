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

//! Per-frame accumulator for logs, self-destructs and gas refunds, grounded
//! on the `Substate` referenced throughout `externalities.rs` and the
//! `Store` struct in the citahub-cita-vm `executive.rs` reference file.

use ethereum_types::{Address, H256};
use std::collections::HashSet;

/// One emitted event (§3 LogEntry).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Address of the account that logged the event.
    pub address: Address,
    /// Up to four indexed topics.
    pub topics: Vec<H256>,
    /// Unindexed payload.
    pub data: Vec<u8>,
}

/// Side effects of one call frame that only take effect if the frame (and
/// all its ancestors up to the transaction) succeeds: logs are appended
/// only on the successful path and a reverted frame discards its logs and
/// gas refund (§3 Lifecycles).
#[derive(Debug, Default, Clone)]
pub struct Substate {
    /// Logs emitted by LOG0..LOG4, in emission order.
    pub logs: Vec<LogEntry>,
    /// Accounts marked for destruction, each paired with its refund beneficiary.
    pub suicides: HashSet<Address>,
    /// Gas refund accumulated from SSTORE clears and SELFDESTRUCT.
    pub sstore_clears_refund: i128,
    /// Addresses touched during this frame (used for EIP-161-style empty
    /// account pruning, tracked for forward compatibility even though
    /// `kill_empty` is disabled in the Homestead schedule).
    pub touched: HashSet<Address>,
}

impl Substate {
    /// An empty accumulator, as created at the start of every frame.
    pub fn new() -> Self {
        Substate::default()
    }

    /// Merge a successfully completed child frame's substate into this one.
    pub fn accrue(&mut self, child: Substate) {
        self.logs.extend(child.logs);
        self.suicides.extend(child.suicides);
        self.sstore_clears_refund += child.sstore_clears_refund;
        self.touched.extend(child.touched);
    }
}
