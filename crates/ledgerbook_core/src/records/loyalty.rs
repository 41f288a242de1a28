//! Loyalty point balances.
//!
//! A user holds one balance per category, keyed `<user>-<category>`.
//! Points move between categories at fixed exchange rates:
//!
//! | category | rate |
//! |---|---|
//! | `bank` | 1 |
//! | `telecom` | 2 |
//! | `shopping_mall` | 4 |
//!
//! Converting `n` points from `a` to `b` yields `n * rate(b) / rate(a)`,
//! computed as an exact multiplication when `b` is the cheaper unit and as
//! truncating division otherwise. Balances may go negative; overdrafts are
//! accepted and logged.

use crate::error::{CoreError, CoreResult};
use crate::index::Index;
use crate::query::IndexProjection;
use crate::record::Record;
use crate::store::RecordStore;
use crate::types::{IndexDef, Points};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

/// Balances by user.
pub const BALANCE_BY_USER: IndexDef =
    IndexDef::new("username~all", &["userName", "enterpriseName", "integralCount"]);

/// Loyalty program category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Bank points.
    Bank,
    /// Telecom points.
    Telecom,
    /// Shopping mall points.
    ShoppingMall,
}

impl Category {
    /// Every category.
    pub const ALL: [Self; 3] = [Self::Bank, Self::Telecom, Self::ShoppingMall];

    /// Returns the category name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bank => "bank",
            Self::Telecom => "telecom",
            Self::ShoppingMall => "shopping_mall",
        }
    }

    /// Returns the exchange rate against bank points.
    #[must_use]
    pub const fn rate(self) -> i64 {
        match self {
            Self::Bank => 1,
            Self::Telecom => 2,
            Self::ShoppingMall => 4,
        }
    }
}

impl FromStr for Category {
    type Err = CoreError;

    fn from_str(name: &str) -> CoreResult<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == name)
            .ok_or_else(|| CoreError::InvalidCategory {
                name: name.to_string(),
            })
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Converts `amount` points of `from` into points of `to`.
///
/// # Errors
///
/// Returns [`CoreError::InvalidFieldValue`] on overflow.
pub fn convert(amount: Points, from: Category, to: Category) -> CoreResult<Points> {
    let (from_rate, to_rate) = (from.rate(), to.rate());
    if to_rate >= from_rate {
        amount
            .as_i64()
            .checked_mul(to_rate / from_rate)
            .map(Points::new)
            .ok_or_else(|| CoreError::invalid_field("integralCount", "conversion overflow"))
    } else {
        Ok(Points::new(amount.as_i64() / (from_rate / to_rate)))
    }
}

/// One user's balance in one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Balance {
    /// Owner, lower-cased.
    pub user_name: String,
    /// Category of the balance.
    pub enterprise_name: Category,
    /// Current point count.
    pub integral_count: Points,
    /// Note describing the last change.
    pub add_note: String,
}

impl Balance {
    /// Returns the primary key of `user`'s balance in `category`.
    pub fn key_for(user: &str, category: Category) -> String {
        format!("{user}-{category}")
    }
}

impl Record for Balance {
    const KIND: &'static str = "Balance";

    fn primary_key(&self) -> String {
        Self::key_for(&self.user_name, self.enterprise_name)
    }

    fn indexes() -> &'static [IndexDef] {
        &[BALANCE_BY_USER]
    }

    fn projection(&self, _index: &IndexDef) -> Vec<String> {
        vec![
            self.user_name.clone(),
            self.enterprise_name.to_string(),
            self.integral_count.to_string(),
        ]
    }
}

/// Balance row answered from the user index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceRow {
    /// Owner.
    pub user_name: String,
    /// Category name.
    pub enterprise_name: String,
    /// Point count, as decimal text.
    pub integral_count: String,
}

impl IndexProjection for BalanceRow {
    const INDEX: IndexDef = BALANCE_BY_USER;

    fn from_attributes(attributes: Vec<String>) -> CoreResult<Self> {
        let [user_name, enterprise_name, integral_count] =
            <[String; 3]>::try_from(attributes).map_err(|v| {
                CoreError::decoding(format!("balance entry carries {} attributes", v.len()))
            })?;
        let integral_count = Points::parse("integralCount", &integral_count)
            .map_err(|e| CoreError::decoding(e.to_string()))?
            .to_string();
        Ok(Self {
            user_name,
            enterprise_name,
            integral_count,
        })
    }
}

/// Outcome of a transfer between two categories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    /// Source balance after the debit.
    pub source: Balance,
    /// Target balance after the credit.
    pub target: Balance,
    /// Points credited to the target.
    pub credited: Points,
}

fn note_time<I: Index>(store: &RecordStore<'_, I>) -> CoreResult<String> {
    Ok(store.tx_timestamp()?.to_second_precision())
}

/// Opens a balance. A missing or empty `note` is replaced by an init note.
///
/// # Errors
///
/// Returns [`CoreError::AlreadyExists`] if the balance is already open.
pub fn open<I: Index>(
    store: &mut RecordStore<'_, I>,
    user: &str,
    category: Category,
    count: Points,
    note: Option<&str>,
) -> CoreResult<Balance> {
    let add_note = match note {
        Some(note) if !note.is_empty() => note.to_string(),
        _ => format!("[{}] <init> {count} integral", note_time(store)?),
    };
    let balance = Balance {
        user_name: user.to_string(),
        enterprise_name: category,
        integral_count: count,
        add_note,
    };
    store.create(&balance)?;
    Ok(balance)
}

/// Adds `amount` points to an existing balance.
///
/// # Errors
///
/// Returns [`CoreError::NotFound`] if the balance does not exist.
pub fn credit<I: Index>(
    store: &mut RecordStore<'_, I>,
    user: &str,
    category: Category,
    amount: Points,
) -> CoreResult<Balance> {
    let note = format!("[{}] <add> {amount} integral", note_time(store)?);
    store.update(&Balance::key_for(user, category), |mut balance: Balance| {
        balance.integral_count = balance.integral_count.checked_add(amount)?;
        balance.add_note = note;
        Ok(balance)
    })
}

/// Moves `amount` points of `from` into `to`, converting at the category
/// rates. The target balance is opened if needed.
///
/// # Errors
///
/// - [`CoreError::DomainConstraint`] if `from == to`
/// - [`CoreError::SourceNotFound`] if the user has no `from` balance
pub fn transfer<I: Index>(
    store: &mut RecordStore<'_, I>,
    user: &str,
    from: Category,
    to: Category,
    amount: Points,
) -> CoreResult<Transfer> {
    if from == to {
        return Err(CoreError::domain_constraint(format!(
            "cannot transfer {from} points to {to}"
        )));
    }
    let source_key = Balance::key_for(user, from);
    if !store.exists(&source_key)? {
        return Err(CoreError::SourceNotFound { key: source_key });
    }
    let credited = convert(amount, from, to)?;
    let ts = note_time(store)?;

    let debit_note = format!("[{ts}] <convert> reduce {amount} integral");
    let source = store.update(&source_key, |mut balance: Balance| {
        balance.integral_count = balance.integral_count.checked_sub(amount)?;
        balance.add_note = debit_note;
        Ok(balance)
    })?;
    if source.integral_count.is_negative() {
        warn!(
            key = %source_key,
            balance = source.integral_count.as_i64(),
            "transfer left a negative balance"
        );
    }

    let credit_note = format!("[{ts}] <convert> add {credited} integral");
    let target_key = Balance::key_for(user, to);
    let target = store.upsert(
        &target_key,
        || {
            Ok(Balance {
                user_name: user.to_string(),
                enterprise_name: to,
                integral_count: credited,
                add_note: credit_note.clone(),
            })
        },
        |mut balance: Balance| {
            balance.integral_count = balance.integral_count.checked_add(credited)?;
            balance.add_note = credit_note.clone();
            Ok(balance)
        },
    )?;

    info!(user, %from, %to, %amount, %credited, "points transferred");
    Ok(Transfer {
        source,
        target,
        credited,
    })
}
