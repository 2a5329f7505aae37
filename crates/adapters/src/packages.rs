// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Package database interface.
//!
//! The package database proper lives outside the master core; blame
//! attribution only needs to commit fault records and resolve which package
//! a secured slave hosts.

use lwm_core::SlaveId;
use std::collections::HashMap;
use thiserror::Error;

/// A committed fault record for a package.
#[derive(Debug, Clone, PartialEq)]
pub struct FaultRecord {
    pub timestamp: f64,
    pub filename: String,
    pub funcname: String,
}

impl FaultRecord {
    /// Record with no file/function evidence.
    pub fn bare(timestamp: f64) -> Self {
        Self {
            timestamp,
            filename: String::new(),
            funcname: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PackageError {
    #[error("package not found: {0}")]
    NotExist(String),
    #[error("package store rejected the fault record")]
    Fault,
}

/// The package database consulted during blame attribution.
pub trait PackageStore {
    /// Commit a fault record against `pkgname`.
    fn set_fault(&mut self, pkgname: &str, record: &FaultRecord) -> Result<(), PackageError>;

    /// The single package hosted by a secured slave, if any.
    fn find_by_secured_slave(&self, slave: SlaveId) -> Option<String>;
}

/// In-memory store for the daemon and tests.
#[derive(Debug, Default)]
pub struct MemoryPackageStore {
    packages: HashMap<String, Option<FaultRecord>>,
    secured_hosts: HashMap<SlaveId, String>,
}

impl MemoryPackageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a known package.
    pub fn insert(&mut self, pkgname: &str) {
        self.packages.entry(pkgname.to_string()).or_insert(None);
    }

    /// Record that a secured slave hosts `pkgname`.
    pub fn assign_secured(&mut self, slave: SlaveId, pkgname: &str) {
        self.insert(pkgname);
        self.secured_hosts.insert(slave, pkgname.to_string());
    }

    /// Drop the secured-host assignment for `slave`.
    pub fn clear_secured(&mut self, slave: SlaveId) {
        self.secured_hosts.remove(&slave);
    }

    /// The last committed fault for `pkgname`, if any.
    pub fn fault_of(&self, pkgname: &str) -> Option<&FaultRecord> {
        self.packages.get(pkgname).and_then(|f| f.as_ref())
    }
}

impl PackageStore for MemoryPackageStore {
    fn set_fault(&mut self, pkgname: &str, record: &FaultRecord) -> Result<(), PackageError> {
        match self.packages.get_mut(pkgname) {
            Some(slot) => {
                *slot = Some(record.clone());
                Ok(())
            }
            None => Err(PackageError::NotExist(pkgname.to_string())),
        }
    }

    fn find_by_secured_slave(&self, slave: SlaveId) -> Option<String> {
        self.secured_hosts.get(&slave).cloned()
    }
}

#[cfg(test)]
#[path = "packages_tests.rs"]
mod tests;
