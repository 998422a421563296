// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use alloc::collections::BTreeMap;
use alloc::string::String;

use lazy_static::lazy_static;
use spin::RwLock;

use super::catalog::IntrinsicCatalog;
use super::spec::{IntrinsicSpec, IntrinsicTableError};

const DEFAULT_INTRINSICS_JSON: &str = include_str!("./intrinsics.json");

#[derive(Default)]
pub(super) struct IntrinsicTable {
    entries: BTreeMap<String, IntrinsicSpec>,
}

impl IntrinsicTable {
    fn from_json(json: &str) -> Result<Self, IntrinsicTableError> {
        let catalog: IntrinsicCatalog = serde_json::from_str(json)?;

        let mut entries = BTreeMap::new();
        for intrinsic in catalog.intrinsics.iter() {
            let spec = IntrinsicSpec::from_config(intrinsic)?;
            if entries.insert(intrinsic.name.clone(), spec).is_some() {
                return Err(IntrinsicTableError::DuplicateIntrinsic(
                    intrinsic.name.clone(),
                ));
            }
        }

        Ok(IntrinsicTable { entries })
    }

    fn lookup(&self, name: &str) -> Option<IntrinsicSpec> {
        self.entries.get(name).cloned()
    }
}

lazy_static! {
    static ref DEFAULT_TABLE: IntrinsicTable = IntrinsicTable::from_json(DEFAULT_INTRINSICS_JSON)
        .expect("failed to load default intrinsic specifications");
}

/// Replacement table installed by `override_intrinsic_table`. Lookups hold
/// the read lock only while copying a spec out.
static CUSTOM_TABLE: RwLock<Option<IntrinsicTable>> = RwLock::new(None);

/// Replaces the built-in intrinsic table with one parsed from `json`.
///
/// The table is process-wide; a rejected `json` leaves the active table
/// unchanged.
pub fn override_intrinsic_table(json: &str) -> Result<(), IntrinsicTableError> {
    let table = IntrinsicTable::from_json(json)?;
    *CUSTOM_TABLE.write() = Some(table);
    Ok(())
}

pub fn reset_intrinsic_table() {
    *CUSTOM_TABLE.write() = None;
}

/// Intrinsic names are matched case-insensitively.
pub fn lookup(name: &str) -> Option<IntrinsicSpec> {
    let custom = CUSTOM_TABLE.read();
    let table = custom.as_ref().unwrap_or(&*DEFAULT_TABLE);
    table
        .lookup(name)
        .or_else(|| table.lookup(&name.to_ascii_lowercase()))
}
