//! Typed view of the persisted projection state.
//!
//! Layout: one `o_<object>` key per retained object, holding its quantity
//! as a decimal string, plus a single `version` key holding the
//! last-applied log version. An object key exists iff its quantity is ≥ 1;
//! absence means zero. Both are written inside the same transaction as the
//! apply that produced them.

use core::ops::ControlFlow;

use stockpile_core::Version;
use stockpile_store::{StoreError, StoreTx};

const OBJECT_PREFIX: &str = "o_";
const VERSION_KEY: &str = "version";

fn object_key(object: &str) -> String {
    format!("{OBJECT_PREFIX}{object}")
}

/// Stored quantity of `object`; 0 when the entry is absent.
pub fn quantity(tx: &dyn StoreTx, object: &str) -> Result<i64, StoreError> {
    match tx.get(&object_key(object))? {
        None => Ok(0),
        Some(raw) => raw.parse().map_err(|_| {
            StoreError::Corrupt(format!("quantity of {object:?}: {raw:?}"))
        }),
    }
}

pub fn set_quantity(tx: &mut dyn StoreTx, object: &str, quantity: i64) -> Result<(), StoreError> {
    tx.set(&object_key(object), &quantity.to_string())
}

pub fn delete_object(tx: &mut dyn StoreTx, object: &str) -> Result<(), StoreError> {
    tx.delete(&object_key(object))
}

/// Last-applied version, `None` when this projection never synchronized.
pub fn version(tx: &dyn StoreTx) -> Result<Option<Version>, StoreError> {
    match tx.get(VERSION_KEY)? {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| StoreError::Corrupt(format!("version marker: {raw:?}"))),
    }
}

pub fn set_version(tx: &mut dyn StoreTx, version: Version) -> Result<(), StoreError> {
    tx.set(VERSION_KEY, &version.to_string())
}

/// Visit every `(object, quantity)` pair, in object order.
pub fn scan_objects(
    tx: &dyn StoreTx,
    on_object: &mut dyn FnMut(&str, i64) -> ControlFlow<()>,
) -> Result<(), StoreError> {
    tx.scan_prefix(OBJECT_PREFIX, &mut |key, value| {
        let quantity = value
            .parse()
            .map_err(|_| StoreError::Corrupt(format!("scanned quantity: {value:?}")))?;
        Ok(on_object(&key[OBJECT_PREFIX.len()..], quantity))
    })
}
