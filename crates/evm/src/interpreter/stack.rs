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

//! The 1024-word operand stack (§4.1 Stack).

/// Operand stack, parameterized so the interpreter could in principle run
/// over any `Copy` word type.
pub trait Stack<T> {
    /// Topmost element, without popping.
    fn peek(&self, no_from_top: usize) -> &T;
    /// Topmost `count` elements, without popping, bottom-first.
    fn peek_top(&self, count: usize) -> &[T];
    /// Number of elements on the stack.
    fn size(&self) -> usize;
    /// Whether at least `no_of_elems` elements are present.
    fn has(&self, no_of_elems: usize) -> bool {
        self.size() >= no_of_elems
    }
    /// Pop the top element.
    fn pop_back(&mut self) -> T;
    /// Pop the top `size` elements, bottom-first.
    fn pop_n(&mut self, size: usize) -> &[T];
    /// Push `elem` onto the stack.
    fn push(&mut self, elem: T);
    /// Swap the top element with the one `position` deep.
    fn swap_with_top(&mut self, position: usize);
    /// Duplicate the element `position` deep onto the top.
    fn dup(&mut self, position: usize);
}

/// A `Vec`-backed `Stack`, pre-allocated to the schedule's `stack_limit`
/// (§4.1 invariant: stack depth never exceeds 1024).
pub struct VecStack<S> {
    data: Vec<S>,
    /// Scratch buffer so `pop_n` can hand back a borrowed slice.
    popped: Vec<S>,
}

impl<S: Copy> VecStack<S> {
    pub fn with_capacity(capacity: usize, _zero: S) -> Self {
        VecStack {
            data: Vec::with_capacity(capacity),
            popped: Vec::new(),
        }
    }
}

impl<S: Copy + fmt::Debug> Stack<S> for VecStack<S> {
    fn peek(&self, no_from_top: usize) -> &S {
        &self.data[self.data.len() - no_from_top - 1]
    }

    fn peek_top(&self, count: usize) -> &[S] {
        &self.data[self.data.len() - count..]
    }

    fn size(&self) -> usize {
        self.data.len()
    }

    fn pop_back(&mut self) -> S {
        self.data
            .pop()
            .expect("stack underflow checked by verify_instruction before every pop; qed")
    }

    fn pop_n(&mut self, size: usize) -> &[S] {
        let new_len = self.data.len() - size;
        // SAFETY-free equivalent: `drain` would also work but this matches
        // the slice-return signature used by callers below.
        self.popped.clear();
        self.popped.extend(self.data.drain(new_len..));
        &self.popped
    }

    fn push(&mut self, elem: S) {
        self.data.push(elem);
    }

    fn swap_with_top(&mut self, position: usize) {
        let len = self.data.len();
        self.data.swap(len - 1, len - position - 1);
    }

    fn dup(&mut self, position: usize) {
        let len = self.data.len();
        let val = self.data[len - position - 1];
        self.data.push(val);
    }
}

use std::fmt;
