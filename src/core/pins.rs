//! The pin-definition table: logical hardware names mapped to the physical
//! pin tokens of an external hardware-definition library.
//!
//! The table is the contract the rest of the crate is built around: each
//! logical name maps to exactly one physical pin, order is preserved, and a
//! conflicting redefinition is rejected at build time.

use crate::core::error::PindefsError;
use crate::core::ident;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Human-readable name for a hardware signal/connector/LED, e.g. `Timer_WAKE`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogicalName(String);

/// Microcontroller-specific pin token, e.g. `PD4` or `GND`. Owned and
/// defined by an external hardware library; opaque here beyond C lexing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhysicalPin(String);

impl LogicalName {
    pub fn new(raw: &str) -> Result<Self, PindefsError> {
        if !ident::is_c_identifier(raw) {
            return Err(PindefsError::InvalidIdentifier(format!(
                "logical name `{}` is not a valid C identifier",
                raw
            )));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PhysicalPin {
    pub fn new(raw: &str) -> Result<Self, PindefsError> {
        if !ident::is_c_identifier(raw) {
            return Err(PindefsError::InvalidIdentifier(format!(
                "physical pin `{}` is not a valid C identifier",
                raw
            )));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LogicalName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for PhysicalPin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered table of `(LogicalName, PhysicalPin)` pairs with a hash index by
/// logical name. Fixed once built; there is no mutation surface beyond
/// [`PinDefs::insert`] during construction.
#[derive(Debug, Clone, Default)]
pub struct PinDefs {
    entries: Vec<(LogicalName, PhysicalPin)>,
    index: FxHashMap<String, usize>,
}

impl PinDefs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a definition. An identical pair already present is an idempotent
    /// no-op (the C preprocessor permits identical redefinition); the same
    /// logical name with a different physical pin is a conflict.
    pub fn insert(
        &mut self,
        logical: LogicalName,
        physical: PhysicalPin,
    ) -> Result<(), PindefsError> {
        if let Some(&at) = self.index.get(logical.as_str()) {
            let existing = &self.entries[at].1;
            if *existing == physical {
                return Ok(());
            }
            return Err(PindefsError::ConflictingDefinition {
                logical: logical.as_str().to_string(),
                existing: existing.as_str().to_string(),
                proposed: physical.as_str().to_string(),
            });
        }
        self.index.insert(logical.as_str().to_string(), self.entries.len());
        self.entries.push((logical, physical));
        Ok(())
    }

    pub fn lookup(&self, logical: &str) -> Option<&PhysicalPin> {
        self.index.get(logical).map(|&at| &self.entries[at].1)
    }

    /// Every logical name that resolves to `physical`, in table order.
    /// Several logical names may intentionally share a physical pin.
    pub fn logicals_for(&self, physical: &str) -> Vec<&LogicalName> {
        self.entries
            .iter()
            .filter(|(_, p)| p.as_str() == physical)
            .map(|(l, _)| l)
            .collect()
    }

    /// Insertion-order iteration.
    pub fn iter(&self) -> impl Iterator<Item = (&LogicalName, &PhysicalPin)> {
        self.entries.iter().map(|(l, p)| (l, p))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PartialEq for PinDefs {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Eq for PinDefs {}
