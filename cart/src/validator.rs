//! Quantity input validation and the per-row quantity editor.
//!
//! Typing is kept apart from confirming: every keystroke goes through
//! [`QuantityEdit::on_input`], which only updates transient editor state.
//! Nothing here touches the cart store or the network; the editor merely
//! decides whether the confirm affordance is available.

use std::num::NonZeroU32;
use thiserror::Error;

/// Why a quantity string was rejected.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StockInputError {
    /// Nothing was entered.
    #[error("Quantity is required")]
    Empty,

    /// Input contains something other than digits.
    #[error("Quantity must be a whole number")]
    NotANumber,

    /// Zero or negative.
    #[error("Quantity must be at least 1")]
    NonPositive,

    /// Digits only, but beyond the representable range.
    #[error("Quantity is too large")]
    TooLarge,
}

/// Parse raw quantity input.
///
/// Surrounding whitespace is ignored and leading zeros are accepted.
///
/// # Errors
///
/// Returns the [`StockInputError`] describing why the input is not a positive integer.
///
/// # Example
///
/// ```
/// use storefront_cart::validator::{validate, StockInputError};
///
/// assert_eq!(validate("12").map(|n| n.get()), Ok(12));
/// assert_eq!(validate(""), Err(StockInputError::Empty));
/// assert_eq!(validate("0"), Err(StockInputError::NonPositive));
/// assert_eq!(validate("-5"), Err(StockInputError::NonPositive));
/// assert_eq!(validate("abc"), Err(StockInputError::NotANumber));
/// ```
pub fn validate(raw: &str) -> Result<NonZeroU32, StockInputError> {
    let input = raw.trim();
    if input.is_empty() {
        return Err(StockInputError::Empty);
    }

    let (negative, digits) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input),
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(StockInputError::NotANumber);
    }

    if negative || digits.bytes().all(|b| b == b'0') {
        return Err(StockInputError::NonPositive);
    }

    // Digits only and not all zeros: parsing can only fail on overflow
    let value: u32 = digits.parse().map_err(|_| StockInputError::TooLarge)?;
    NonZeroU32::new(value).ok_or(StockInputError::NonPositive)
}

/// Where a row's quantity editor is in its lifecycle.
///
/// ```text
/// Idle → Editing ⇄ Confirmable → Confirming → Idle            (confirmed)
///                                           → Editing + error (failed, reverted)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuantityPhase {
    /// Showing the committed quantity; no pending edit.
    #[default]
    Idle,
    /// Last input was invalid, or the last confirm failed.
    Editing,
    /// Last input is valid and not yet sent.
    Confirmable,
    /// A confirm is in flight.
    Confirming,
}

/// Transient quantity editing state for one row.
///
/// Holds the text as typed, the latest validation result, and the phase.
/// A candidate survives a failed confirm so the user can re-trigger it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QuantityEdit {
    input: String,
    error: Option<StockInputError>,
    candidate: Option<NonZeroU32>,
    phase: QuantityPhase,
}

impl QuantityEdit {
    /// Editor showing a committed quantity.
    #[must_use]
    pub fn new(committed: NonZeroU32) -> Self {
        Self {
            input: committed.to_string(),
            error: None,
            candidate: Some(committed),
            phase: QuantityPhase::Idle,
        }
    }

    /// Text as typed.
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Validation failure for the current text.
    #[must_use]
    pub const fn error(&self) -> Option<StockInputError> {
        self.error
    }

    /// Validation message to show under the input, if any.
    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        self.error.map(|e| e.to_string())
    }

    /// Validated quantity for the current text.
    #[must_use]
    pub const fn candidate(&self) -> Option<NonZeroU32> {
        self.candidate
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> QuantityPhase {
        self.phase
    }

    /// Whether a confirm would be accepted now.
    #[must_use]
    pub fn can_confirm(&self) -> bool {
        matches!(self.phase, QuantityPhase::Editing | QuantityPhase::Confirmable)
            && self.candidate.is_some()
    }

    /// Whether the confirm control (or its loading indicator) is shown.
    #[must_use]
    pub fn confirm_visible(&self) -> bool {
        self.is_loading() || self.can_confirm()
    }

    /// Whether a confirm is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.phase == QuantityPhase::Confirming
    }

    /// Handle one keystroke.
    ///
    /// The text stays editable while confirming, but the phase is left alone
    /// until the in-flight confirm resolves.
    pub fn on_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
        let result = validate(&self.input);
        self.error = result.err();
        self.candidate = result.ok();

        if self.phase != QuantityPhase::Confirming {
            self.phase = if self.candidate.is_some() {
                QuantityPhase::Confirmable
            } else {
                QuantityPhase::Editing
            };
        }
    }

    /// Enter `Confirming`, returning the quantity to send.
    pub(crate) fn begin_confirm(&mut self) -> Option<NonZeroU32> {
        if !self.can_confirm() {
            return None;
        }
        self.phase = QuantityPhase::Confirming;
        self.candidate
    }

    /// The confirm resolved and `committed` is now final.
    ///
    /// Text typed while confirming is re-validated against the new value.
    pub(crate) fn confirmed(&mut self, committed: NonZeroU32) {
        self.phase = QuantityPhase::Idle;
        if validate(&self.input) != Ok(committed) {
            let input = std::mem::take(&mut self.input);
            self.on_input(input);
        }
    }

    /// The confirm failed and the committed value was restored.
    pub(crate) fn failed(&mut self) {
        self.phase = QuantityPhase::Editing;
    }

    /// Drop any pending edit and show `committed`.
    pub(crate) fn reset(&mut self, committed: NonZeroU32) {
        *self = Self::new(committed);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn qty(n: u32) -> NonZeroU32 {
        NonZeroU32::new(n).unwrap()
    }

    #[test]
    fn test_invalid_inputs_have_distinct_reasons() {
        assert_eq!(validate(""), Err(StockInputError::Empty));
        assert_eq!(validate("   "), Err(StockInputError::Empty));
        assert_eq!(validate("0"), Err(StockInputError::NonPositive));
        assert_eq!(validate("000"), Err(StockInputError::NonPositive));
        assert_eq!(validate("-5"), Err(StockInputError::NonPositive));
        assert_eq!(validate("-0"), Err(StockInputError::NonPositive));
        assert_eq!(validate("abc"), Err(StockInputError::NotANumber));
        assert_eq!(validate("-"), Err(StockInputError::NotANumber));
        assert_eq!(validate("+3"), Err(StockInputError::NotANumber));
        assert_eq!(validate("1.5"), Err(StockInputError::NotANumber));
        assert_eq!(validate("-x"), Err(StockInputError::NotANumber));
        assert_eq!(validate("4294967296"), Err(StockInputError::TooLarge));
    }

    #[test]
    fn test_lenient_forms() {
        assert_eq!(validate(" 3 "), Ok(qty(3)));
        assert_eq!(validate("007"), Ok(qty(7)));
        assert_eq!(validate("4294967295"), Ok(qty(u32::MAX)));
    }

    #[test]
    fn test_typing_zero_never_offers_confirm() {
        let mut edit = QuantityEdit::new(qty(1));
        assert!(!edit.confirm_visible());

        edit.on_input("0");

        assert_eq!(edit.phase(), QuantityPhase::Editing);
        assert_eq!(edit.error(), Some(StockInputError::NonPositive));
        assert_eq!(edit.error_message().as_deref(), Some("Quantity must be at least 1"));
        assert!(!edit.can_confirm());
        assert!(!edit.confirm_visible());
        assert_eq!(edit.begin_confirm(), None);
    }

    #[test]
    fn test_confirm_cycle() {
        let mut edit = QuantityEdit::new(qty(1));
        edit.on_input("4");
        assert_eq!(edit.phase(), QuantityPhase::Confirmable);
        assert!(edit.can_confirm());

        assert_eq!(edit.begin_confirm(), Some(qty(4)));
        assert!(edit.is_loading());
        assert!(edit.confirm_visible());
        assert!(!edit.can_confirm());

        edit.confirmed(qty(4));
        assert_eq!(edit.phase(), QuantityPhase::Idle);
        assert!(!edit.confirm_visible());
        assert_eq!(edit.input(), "4");
    }

    #[test]
    fn test_typing_while_confirming_keeps_phase_then_revalidates() {
        let mut edit = QuantityEdit::new(qty(1));
        edit.on_input("4");
        edit.begin_confirm();

        edit.on_input("");
        assert_eq!(edit.phase(), QuantityPhase::Confirming);
        assert_eq!(edit.input(), "");

        edit.confirmed(qty(4));
        assert_eq!(edit.phase(), QuantityPhase::Editing);
        assert_eq!(edit.error(), Some(StockInputError::Empty));
    }

    #[test]
    fn test_failed_confirm_can_be_retriggered() {
        let mut edit = QuantityEdit::new(qty(1));
        edit.on_input("9");
        edit.begin_confirm();
        edit.failed();

        assert_eq!(edit.phase(), QuantityPhase::Editing);
        assert_eq!(edit.input(), "9");
        assert!(edit.can_confirm());
        assert_eq!(edit.begin_confirm(), Some(qty(9)));
    }

    proptest! {
        #[test]
        fn prop_valid_strings_parse_to_their_value(n in 1u32..=u32::MAX) {
            prop_assert_eq!(validate(&n.to_string()), Ok(qty(n)));
        }

        #[test]
        fn prop_negative_numbers_are_non_positive(n in 0u32..=u32::MAX) {
            prop_assert_eq!(validate(&format!("-{n}")), Err(StockInputError::NonPositive));
        }

        #[test]
        fn prop_non_digit_text_never_yields_a_value(s in "[a-zA-Z.,+ ]*[a-zA-Z.,+][a-zA-Z.,+ ]*") {
            let result = validate(&s);
            prop_assert!(result.is_err());
        }
    }
}
