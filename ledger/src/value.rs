//! Multi-asset values
//!
//! A [`Value`] carries the base coin quantity plus arbitrary `(policy,
//! token-name)` assets; a [`MintValue`] carries signed quantities for
//! minting (positive) and burning (negative) under the minting policies a
//! transaction runs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Identifier of a monetary policy (hash of the policy script)
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PolicyId(pub [u8; 32]);

impl std::fmt::Debug for PolicyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PolicyId").field(&hex::encode(&self.0[..8])).finish()
    }
}

/// Name of a token under a policy
///
/// Participation tokens use the blake3 hash of the owning participant's
/// verification key, so any script can recompute a participant's token name
/// without a lookup table.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TokenName(pub [u8; 32]);

impl std::fmt::Debug for TokenName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("TokenName").field(&hex::encode(&self.0[..8])).finish()
    }
}

/// A fully-qualified asset: `(policyId, tokenName)`
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AssetId {
    pub policy: PolicyId,
    pub name: TokenName,
}

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}.{}",
            hex::encode(&self.policy.0[..8]),
            hex::encode(&self.name.0[..8])
        )
    }
}

/// A ledger value: base coin plus optional assets
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Value {
    /// Base coin quantity
    pub coin: u64,
    /// Non-zero asset quantities
    pub assets: BTreeMap<AssetId, u64>,
}

impl Value {
    /// A pure coin value
    pub fn coin(coin: u64) -> Self {
        Self {
            coin,
            assets: BTreeMap::new(),
        }
    }

    /// The zero value
    pub fn zero() -> Self {
        Self::default()
    }

    /// True when both coin and all asset quantities are zero
    pub fn is_zero(&self) -> bool {
        self.coin == 0 && self.assets.values().all(|q| *q == 0)
    }

    /// Add an asset quantity, returning the updated value
    pub fn with_asset(mut self, asset: AssetId, quantity: u64) -> Self {
        if quantity > 0 {
            *self.assets.entry(asset).or_insert(0) += quantity;
        }
        self
    }

    /// Quantity of a specific asset
    pub fn asset_quantity(&self, asset: &AssetId) -> u64 {
        self.assets.get(asset).copied().unwrap_or(0)
    }

    /// Component-wise sum of two values
    pub fn add(&self, other: &Value) -> Value {
        let mut assets = self.assets.clone();
        for (asset, quantity) in &other.assets {
            *assets.entry(*asset).or_insert(0) += quantity;
        }
        assets.retain(|_, q| *q > 0);
        Value {
            coin: self.coin + other.coin,
            assets,
        }
    }

    /// Sum an iterator of values
    pub fn sum<'a, I: IntoIterator<Item = &'a Value>>(values: I) -> Value {
        values
            .into_iter()
            .fold(Value::zero(), |acc, v| acc.add(v))
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} coin", self.coin)?;
        for (asset, quantity) in &self.assets {
            write!(f, " + {} {}", quantity, asset)?;
        }
        Ok(())
    }
}

/// Signed asset quantities minted (positive) or burned (negative) by a
/// transaction
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintValue(pub BTreeMap<AssetId, i64>);

impl MintValue {
    /// Empty mint (the common case)
    pub fn none() -> Self {
        Self::default()
    }

    /// True when nothing is minted or burned
    pub fn is_empty(&self) -> bool {
        self.0.values().all(|q| *q == 0)
    }

    /// Record a signed quantity for an asset
    pub fn with(mut self, asset: AssetId, quantity: i64) -> Self {
        if quantity != 0 {
            *self.0.entry(asset).or_insert(0) += quantity;
        }
        self
    }

    /// Signed quantity for an asset (0 when untouched)
    pub fn quantity(&self, asset: &AssetId) -> i64 {
        self.0.get(asset).copied().unwrap_or(0)
    }

    /// All non-zero entries under one policy
    pub fn under_policy(&self, policy: &PolicyId) -> impl Iterator<Item = (&AssetId, i64)> + '_ {
        let policy = *policy;
        self.0
            .iter()
            .filter(move |(asset, q)| asset.policy == policy && **q != 0)
            .map(|(asset, q)| (asset, *q))
    }
}
