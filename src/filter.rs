use embedded_can::Id;
use heapless::Vec;

use crate::frame::{IdExt, IdKind};

/// Mask requiring every identifier bit to match
pub const EXACT_MASK: u32 = 0x1FFF_FFFF;

/// A single acceptance rule. An identifier passes when the bits selected by
/// `mask` equal those of `id`, and both are of the same kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FilterRule {
    #[cfg_attr(feature = "defmt", defmt(Debug2Format))]
    id: Id,
    mask: u32,
}

impl FilterRule {
    pub fn new(id: impl Into<Id>, mask: u32) -> Self {
        Self {
            id: id.into(),
            mask,
        }
    }

    /// Accepts only `id` itself
    pub fn exact(id: impl Into<Id>) -> Self {
        Self::new(id, EXACT_MASK)
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn mask(&self) -> u32 {
        self.mask
    }

    pub fn matches(&self, id: Id) -> bool {
        id.kind() == self.id.kind() && (id.raw() & self.mask) == (self.id.raw() & self.mask)
    }
}

/// A set of up to `N` acceptance rules. An empty filter accepts every
/// identifier, otherwise an identifier must match at least one rule.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AcceptanceFilter<const N: usize> {
    rules: Vec<FilterRule, N>,
}

impl<const N: usize> AcceptanceFilter<N> {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Builds a filter accepting exactly the given identifiers
    pub fn from_ids(ids: &[Id]) -> Result<Self, FilterError> {
        let mut filter = Self::new();

        for id in ids {
            filter.push(FilterRule::exact(*id))?;
        }

        Ok(filter)
    }

    pub fn push(&mut self, rule: FilterRule) -> Result<(), FilterError> {
        self.rules
            .push(rule)
            .map_err(|_| FilterError::TooManyRules(N))
    }

    pub fn rules(&self) -> &[FilterRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn accepts(&self, id: Id) -> bool {
        self.rules.is_empty() || self.rules.iter().any(|rule| rule.matches(id))
    }

    /// Whether any rule targets extended identifiers
    pub fn has_extended(&self) -> bool {
        self.rules
            .iter()
            .any(|rule| rule.id.kind() == IdKind::Extended)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FilterError {
    #[error("Tried to install more than ({0:?}) filter rules")]
    TooManyRules(usize),
}
