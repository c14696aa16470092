//! Token budget accounting for layered tool results.
//!
//! The budget is a soft cap on the estimated serialized size of a result set.
//! Layer 1 tools are charged unconditionally (they are always returned);
//! Layer 2 candidates are admitted greedily in rank order and skipped when
//! they would overflow what is left.

/// Running token budget for one result set.
#[derive(Debug, Clone)]
pub struct TokenBudget {
    /// Total token budget for this result set.
    limit: usize,
    /// Tokens charged so far.
    used: usize,
}

impl TokenBudget {
    /// Create an empty budget with the given limit.
    pub fn new(limit: usize) -> Self {
        Self { limit, used: 0 }
    }

    /// Tokens still available.
    pub fn available(&self) -> usize {
        self.limit.saturating_sub(self.used)
    }

    /// Tokens charged so far.
    pub fn used(&self) -> usize {
        self.used
    }

    /// Total budget.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Charge `tokens` regardless of the remaining budget.
    ///
    /// Used for Layer 1, which is never trimmed. The budget may end up
    /// overdrawn, in which case nothing else fits.
    pub fn charge(&mut self, tokens: usize) {
        self.used = self.used.saturating_add(tokens);
    }

    /// Charge `tokens` only if they fit.
    ///
    /// Returns `true` if the tokens were charged, `false` if they didn't fit.
    pub fn try_charge(&mut self, tokens: usize) -> bool {
        if tokens <= self.available() {
            self.used += tokens;
            true
        } else {
            false
        }
    }

    /// Estimate the token count for a string (~4 chars per token).
    pub fn estimate_tokens(text: &str) -> usize {
        // Rough approximation: 1 token ≈ 4 characters
        text.len().div_ceil(4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_budget() {
        let budget = TokenBudget::new(4000);
        assert_eq!(budget.available(), 4000);
        assert_eq!(budget.used(), 0);
        assert_eq!(budget.limit(), 4000);
    }

    #[test]
    fn test_try_charge_fits() {
        let mut budget = TokenBudget::new(100);
        assert!(budget.try_charge(60));
        assert_eq!(budget.used(), 60);
        assert_eq!(budget.available(), 40);
    }

    #[test]
    fn test_try_charge_exact_fit() {
        let mut budget = TokenBudget::new(100);
        assert!(budget.try_charge(100));
        assert_eq!(budget.available(), 0);
        assert!(budget.try_charge(0));
    }

    #[test]
    fn test_try_charge_overflow_rejected() {
        let mut budget = TokenBudget::new(100);
        assert!(budget.try_charge(70));
        assert!(!budget.try_charge(40)); // doesn't fit
        assert_eq!(budget.used(), 70);
        // A smaller item still fits after a rejection.
        assert!(budget.try_charge(30));
    }

    #[test]
    fn test_charge_can_overdraw() {
        let mut budget = TokenBudget::new(10);
        budget.charge(25);
        assert_eq!(budget.used(), 25);
        assert_eq!(budget.available(), 0);
        assert!(!budget.try_charge(1));
    }

    #[test]
    fn test_token_estimation() {
        // "hello world" = 11 chars ≈ 3 tokens
        assert_eq!(TokenBudget::estimate_tokens("hello world"), 3);
        // Empty string = 0 tokens
        assert_eq!(TokenBudget::estimate_tokens(""), 0);
        // 100 chars ≈ 25 tokens
        assert_eq!(TokenBudget::estimate_tokens(&"x".repeat(100)), 25);
    }
}
