//! The "as known at T" snapshot shared by both resolvers.

use std::{cmp::Reverse, collections::BTreeMap};

use crate::{fact::FactVersion, time::TransactionTime};

/// Precedence among versions sharing a partition: the latest transaction
/// time wins, and on an exact tie the first inserted wins.
fn precedence(v: &FactVersion) -> (TransactionTime, Reverse<u64>) {
  (v.transaction_time, Reverse(v.sequence))
}

/// Keep versions recorded at or before `as_of`, then reduce each partition
/// (as named by `key`) to its single representative.
///
/// An empty result means nothing was visible at `as_of`.
pub(crate) fn visible_as_of<'a, K, I, F>(
  versions: I,
  as_of: TransactionTime,
  key: F,
) -> BTreeMap<K, &'a FactVersion>
where
  K: Ord,
  I: IntoIterator<Item = &'a FactVersion>,
  F: Fn(&FactVersion) -> K,
{
  let mut representatives: BTreeMap<K, &'a FactVersion> = BTreeMap::new();

  for version in versions
    .into_iter()
    .filter(|v| v.transaction_time <= as_of)
  {
    representatives
      .entry(key(version))
      .and_modify(|current| {
        if precedence(version) > precedence(current) {
          *current = version;
        }
      })
      .or_insert(version);
  }

  representatives
}
