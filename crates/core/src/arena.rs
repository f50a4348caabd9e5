// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Handle arena: strong references held on behalf of native callbacks
//!
//! A `HandleArena` owns values and hands out opaque `Token`s for them. A
//! token stays valid from `retain` until `release` (or a bulk `clear`).
//! Released slots are recycled, but every release bumps the slot's
//! generation, so a stale token never resolves to a newer value.

use std::fmt;
use thiserror::Error;

/// Opaque reference to a value held by a [`HandleArena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Token {
    index: u32,
    generation: u32,
}

impl Token {
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// Errors from arena operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArenaError {
    #[error("failed to allocate arena slot")]
    Exhausted,
}

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Collection of strongly-held values addressed by generational tokens
#[derive(Debug)]
pub struct HandleArena<T> {
    slots: Vec<Slot<T>>,
    /// Recycled slot indices.
    free: Vec<u32>,
    len: usize,
}

impl<T> HandleArena<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Reserve room for `additional` values so the next `additional`
    /// retains cannot fail.
    pub fn try_reserve(&mut self, additional: usize) -> Result<(), ArenaError> {
        let recycled = self.free.len();
        let fresh = additional.saturating_sub(recycled);
        if self.slots.len().saturating_add(fresh) > u32::MAX as usize {
            return Err(ArenaError::Exhausted);
        }
        self.slots
            .try_reserve(fresh)
            .map_err(|_| ArenaError::Exhausted)?;
        // Keep the free list large enough that release never reallocates
        let free_needed = (self.slots.len() + fresh).saturating_sub(self.free.len());
        self.free
            .try_reserve(free_needed)
            .map_err(|_| ArenaError::Exhausted)
    }

    /// Take a strong reference to `value`.
    ///
    /// On allocation failure no reference is taken and the value is dropped.
    pub fn try_retain(&mut self, value: T) -> Result<Token, ArenaError> {
        self.try_reserve(1)?;
        Ok(self.retain(value))
    }

    /// Take a strong reference to `value`, growing the arena as needed.
    pub fn retain(&mut self, value: T) -> Token {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            self.len += 1;
            return Token {
                index,
                generation: slot.generation,
            };
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
        });
        self.len += 1;
        Token {
            index,
            generation: 0,
        }
    }

    /// Reserve the slot the next retain will use without storing anything yet.
    ///
    /// Dropping the returned entry leaves the arena unchanged.
    pub fn try_vacant(&mut self) -> Result<VacantSlot<'_, T>, ArenaError> {
        self.try_reserve(1)?;
        let token = match self.free.last() {
            Some(&index) => Token {
                index,
                generation: self.slots[index as usize].generation,
            },
            None => Token {
                index: self.slots.len() as u32,
                generation: 0,
            },
        };
        Ok(VacantSlot { arena: self, token })
    }

    /// Drop the reference behind `token`, returning the value.
    ///
    /// Unknown or stale tokens are ignored.
    pub fn release(&mut self, token: Token) -> Option<T> {
        let slot = self.slots.get_mut(token.index as usize)?;
        if slot.generation != token.generation {
            return None;
        }
        let value = slot.value.take()?;
        self.len -= 1;
        // A slot whose generation would wrap is retired instead of reused
        if let Some(next) = slot.generation.checked_add(1) {
            slot.generation = next;
            self.free.push(token.index);
        }
        Some(value)
    }

    pub fn get(&self, token: Token) -> Option<&T> {
        let slot = self.slots.get(token.index as usize)?;
        if slot.generation != token.generation {
            return None;
        }
        slot.value.as_ref()
    }

    pub fn get_mut(&mut self, token: Token) -> Option<&mut T> {
        let slot = self.slots.get_mut(token.index as usize)?;
        if slot.generation != token.generation {
            return None;
        }
        slot.value.as_mut()
    }

    pub fn contains(&self, token: Token) -> bool {
        self.get(token).is_some()
    }

    /// Find the first held value satisfying `predicate` (linear scan)
    pub fn find(&self, mut predicate: impl FnMut(&T) -> bool) -> Option<Token> {
        self.iter()
            .find(|(_, value)| predicate(value))
            .map(|(token, _)| token)
    }

    /// Iterate over held values in slot order
    pub fn iter(&self) -> impl Iterator<Item = (Token, &T)> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.value.as_ref().map(|value| {
                (
                    Token {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    value,
                )
            })
        })
    }

    pub fn tokens(&self) -> Vec<Token> {
        self.iter().map(|(token, _)| token).collect()
    }

    /// Start a cursor that allows erasing the current element mid-iteration
    pub fn cursor(&self) -> Cursor {
        Cursor {
            current: None,
            next: 0,
        }
    }

    /// Release every value, handing each one to `finalizer` as it goes
    pub fn clear(&mut self, mut finalizer: impl FnMut(Token, T)) {
        let mut cursor = self.cursor();
        while let Some(token) = cursor.advance(self) {
            if let Some(value) = cursor.erase(self) {
                finalizer(token, value);
            }
        }
    }

    fn occupied_from(&self, start: usize) -> Option<Token> {
        self.slots
            .iter()
            .enumerate()
            .skip(start)
            .find(|(_, slot)| slot.value.is_some())
            .map(|(index, slot)| Token {
                index: index as u32,
                generation: slot.generation,
            })
    }
}

impl<T> Default for HandleArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A reserved slot; see [`HandleArena::try_vacant`]
pub struct VacantSlot<'a, T> {
    arena: &'a mut HandleArena<T>,
    token: Token,
}

impl<T> VacantSlot<'_, T> {
    /// The token the value will be stored under
    pub fn token(&self) -> Token {
        self.token
    }

    pub fn insert(self, value: T) -> Token {
        // Capacity was reserved by try_vacant and nothing else has touched
        // the arena since, so retain lands on the predicted slot.
        self.arena.retain(value)
    }
}

/// Forward cursor over a [`HandleArena`]
///
/// The cursor does not borrow the arena, so the current element can be
/// erased (or other elements released) between steps. The next position is
/// computed before the current element is handed out.
#[derive(Debug, Clone)]
pub struct Cursor {
    current: Option<Token>,
    next: usize,
}

impl Cursor {
    /// Move to the next held element
    pub fn advance<T>(&mut self, arena: &HandleArena<T>) -> Option<Token> {
        let token = arena.occupied_from(self.next);
        self.next = token.map_or(usize::MAX, |t| t.index as usize + 1);
        self.current = token;
        token
    }

    pub fn current(&self) -> Option<Token> {
        self.current
    }

    /// Release the current element; the cursor stays positioned so the next
    /// `advance` continues with the following element.
    pub fn erase<T>(&mut self, arena: &mut HandleArena<T>) -> Option<T> {
        let token = self.current.take()?;
        arena.release(token)
    }
}

#[cfg(test)]
#[path = "arena_tests.rs"]
mod tests;
