//! Property-based test generators using proptest.
//!
//! Provides strategies for generating keys, records and operation
//! sequences that respect the key codec's alphabet.

use ledgerbook_core::records::{Category, Enrollment};
use ledgerbook_core::Points;
use proptest::prelude::*;

/// Strategy for attribute values the key codec accepts (no separator, no
/// range sentinel, possibly empty).
pub fn attribute_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[^\\x00\\x{10FFFF}]{0,12}").expect("Invalid regex")
}

/// Strategy for attribute tuples of up to `max_len` values.
pub fn attribute_tuple_strategy(max_len: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(attribute_strategy(), 0..=max_len)
}

/// Strategy for index names shaped like `field~kind`.
pub fn index_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z]{1,8}~[a-z]{1,8}").expect("Invalid regex")
}

/// Strategy for lower-case user identities drawn from a small pool, so
/// sequences revisit the same records.
pub fn user_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["alice", "bob", "carol"]).prop_map(str::to_string)
}

/// Strategy for loyalty categories.
pub fn category_strategy() -> impl Strategy<Value = Category> {
    prop::sample::select(Category::ALL.to_vec())
}

/// Strategy for non-negative point amounts.
pub fn points_strategy() -> impl Strategy<Value = Points> {
    (0i64..10_000).prop_map(Points::new)
}

/// One loyalty contract invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoyaltyOp {
    /// Open a balance.
    Init {
        /// Owner.
        user: String,
        /// Category.
        category: Category,
        /// Opening balance.
        count: Points,
    },
    /// Add points to a balance.
    Add {
        /// Owner.
        user: String,
        /// Category.
        category: Category,
        /// Points added.
        amount: Points,
    },
    /// Convert points between two categories.
    Convert {
        /// Owner.
        user: String,
        /// Source category.
        from: Category,
        /// Target category.
        to: Category,
        /// Points taken from the source.
        amount: Points,
    },
}

impl LoyaltyOp {
    /// Returns the contract function and arguments for this operation.
    pub fn invocation(&self) -> (&'static str, Vec<String>) {
        match self {
            Self::Init {
                user,
                category,
                count,
            } => (
                "initIntegral",
                vec![user.clone(), category.to_string(), count.to_string(), String::new()],
            ),
            Self::Add {
                user,
                category,
                amount,
            } => (
                "addIntegral",
                vec![user.clone(), category.to_string(), amount.to_string()],
            ),
            Self::Convert {
                user,
                from,
                to,
                amount,
            } => (
                "convertIntegral",
                vec![user.clone(), from.to_string(), to.to_string(), amount.to_string()],
            ),
        }
    }
}

/// Strategy for a single loyalty operation.
pub fn loyalty_op_strategy() -> impl Strategy<Value = LoyaltyOp> {
    prop_oneof![
        (user_strategy(), category_strategy(), points_strategy())
            .prop_map(|(user, category, count)| LoyaltyOp::Init { user, category, count }),
        (user_strategy(), category_strategy(), points_strategy())
            .prop_map(|(user, category, amount)| LoyaltyOp::Add { user, category, amount }),
        (user_strategy(), category_strategy(), category_strategy(), points_strategy()).prop_map(
            |(user, from, to, amount)| LoyaltyOp::Convert {
                user,
                from,
                to,
                amount,
            }
        ),
    ]
}

/// Strategy for a sequence of loyalty operations.
pub fn loyalty_ops_strategy(max_ops: usize) -> impl Strategy<Value = Vec<LoyaltyOp>> {
    prop::collection::vec(loyalty_op_strategy(), 1..=max_ops)
}

/// Strategy for enrollments over a small pool of users and IDs.
pub fn enrollment_strategy() -> impl Strategy<Value = Enrollment> {
    (
        0u8..6,
        prop::sample::select(vec!["7", "8", "9"]),
        0u8..3,
        prop::sample::select(vec!["open", "done"]),
        attribute_strategy(),
        0u32..100,
    )
        .prop_map(|(id, user, match_id, status, result, score)| Enrollment {
            user_enter_id: format!("e{id}"),
            user_id: user.to_string(),
            match_id: format!("m{match_id}"),
            status: status.to_string(),
            match_result: result,
            score: score.to_string(),
        })
}
