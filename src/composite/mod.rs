// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Composite operators built from other model members.
//!
//! Composites hold [`MemberId`](crate::model::MemberId) handles into a
//! [`Model`](crate::model::Model) arena. Their parameters are the union of
//! their leaves' parameters and are only meaningful once the model has
//! allocated the global vector.

pub mod composed;
pub mod embedded;
pub mod state_space;

pub use composed::ComposedOp;
pub use embedded::EmbeddedOp;
pub use state_space::{Representation, StateSpace};
