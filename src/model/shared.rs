// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Thread-safe handle around a [`Model`].
//!
//! Allocation and every parameter write take the write lock, so concurrent
//! readers never see a half-written vector.
//!
//! # Example
//!
//! ```ignore
//! let shared = SharedModel::new(standard::xyi_model(&config)?);
//! let worker = shared.clone();
//! std::thread::spawn(move || worker.from_vector(&params));
//! let n = shared.num_params();
//! ```

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use super::Model;
use crate::error::Result;

/// Cloneable, lock-protected model.
#[derive(Debug, Clone)]
pub struct SharedModel {
    inner: Arc<RwLock<Model>>,
}

impl SharedModel {
    pub fn new(model: Model) -> Self {
        Self {
            inner: Arc::new(RwLock::new(model)),
        }
    }

    /// Run `f` under the read lock.
    pub fn read<R>(&self, f: impl FnOnce(&Model) -> R) -> R {
        f(&self.inner.read())
    }

    /// Run `f` under the write lock.
    pub fn write<R>(&self, f: impl FnOnce(&mut Model) -> R) -> R {
        f(&mut self.inner.write())
    }

    /// Total parameter count, allocating under the write lock if needed.
    pub fn num_params(&self) -> usize {
        {
            let model = self.inner.read();
            if model.is_allocated() {
                if let Ok(v) = model.to_vector() {
                    return v.len();
                }
            }
        }
        debug!("Allocating shared model");
        self.inner.write().num_params()
    }

    /// Whole-model vector, allocating first if needed.
    pub fn to_vector(&self) -> Result<Vec<f64>> {
        let mut model = self.inner.write();
        model.allocate();
        model.to_vector()
    }

    /// Overwrite the whole-model vector, allocating first if needed.
    pub fn from_vector(&self, v: &[f64]) -> Result<()> {
        let mut model = self.inner.write();
        model.allocate();
        model.from_vector(v)
    }
}
