// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Aggregating container that owns members and the global parameter vector.
//!
//! Members live in an arena and refer to each other by [`MemberId`]. A
//! member's children must already be in the arena when it is inserted, so
//! the member graph is acyclic. Labelled entries are kept in registration
//! order.
//!
//! # Allocation
//!
//! [`Model::num_params`] walks every registered entry depth first and gives
//! each distinct leaf one contiguous range of the global vector. A leaf
//! reached again through another entry keeps its first range, so shared
//! leaves contribute their parameters once. Any structural change drops the
//! allocation; composite and whole-model parameter access then fails with
//! [`Error::StaleAllocation`] until the next allocation.
//!
//! # Lindblad members
//!
//! A Lindblad generator is a leaf of its own. Lindblad operators, vectors
//! and POVMs refer to it by id, so one generator can sit behind several of
//! them. Writes are staged first: new leaf values and the dense-storage
//! caches derived from them are computed on copies and committed together.
//!
//! # Example
//!
//! ```ignore
//! let mut model = Model::new(4);
//! let gx = model.register_new("Gx", DenseOp::from_unitary(&u, &basis, ParamPolicy::TracePreserving)?)?;
//! let layer = model.insert(ComposedOp::new(4, vec![gx, gx]))?;
//! model.register("Gxx", layer)?;
//! assert_eq!(model.num_params(), 12);
//! ```

pub mod arena;
pub mod label;
pub mod shared;
pub mod standard;

pub use arena::{Member, MemberId, MemberKind};
pub use label::Label;
pub use shared::SharedModel;

use std::collections::{HashMap, HashSet};
use std::ops::Range;
use std::sync::Arc;

use indexmap::IndexMap;
use ndarray::Array2;
use tracing::{debug, info};

use crate::basis::Basis;
use crate::composite::embedded::check_base_dim;
use crate::error::{Error, Result};
use crate::lindblad::{error_map, CoeffDict, LindbladErrorgen, LindbladOp, Storage};
use crate::linalg::{DenseMatrix, DenseVector};
use crate::member::{LinearOperator, ModelMember, Role, SpamVector};
use crate::validation::validate_param_vector;

#[derive(Debug, Clone)]
struct Allocation {
    ranges: HashMap<MemberId, Range<usize>>,
    order: Vec<MemberId>,
    vector: Vec<f64>,
}

/// Updated leaves and cached maps, built before anything is written.
struct Staged {
    leaves: Vec<(MemberId, Member)>,
    maps: Vec<(usize, Array2<f64>)>,
}

/// A model: member arena, labelled entries and the shared parameter vector.
#[derive(Debug, Clone)]
pub struct Model {
    dim: usize,
    members: Vec<Member>,
    entries: IndexMap<Label, MemberId>,
    allocation: Option<Allocation>,
}

impl Model {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            members: Vec::new(),
            entries: IndexMap::new(),
            allocation: None,
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of members in the arena.
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn member(&self, id: MemberId) -> Result<&Member> {
        self.members
            .get(id.index())
            .ok_or_else(|| Error::NotFound(format!("member {}", id)))
    }

    /// Registered labels in registration order.
    pub fn labels(&self) -> impl Iterator<Item = &Label> {
        self.entries.keys()
    }

    /// Registered entries in registration order.
    pub fn entries(&self) -> impl Iterator<Item = (&Label, MemberId)> {
        self.entries.iter().map(|(l, id)| (l, *id))
    }

    pub fn get(&self, label: &str) -> Result<MemberId> {
        let label: Label = label.parse()?;
        self.entries
            .get(&label)
            .copied()
            .ok_or_else(|| Error::NotFound(format!("label '{}'", label)))
    }

    pub fn is_allocated(&self) -> bool {
        self.allocation.is_some()
    }

    fn invalidate(&mut self, reason: &str) {
        if self.allocation.take().is_some() {
            debug!(reason, "Parameter allocation invalidated");
        }
    }

    /// Add a member to the arena. Its children must already exist.
    pub fn insert(&mut self, member: impl Into<Member>) -> Result<MemberId> {
        let mut member = member.into();
        self.check_children(&member)?;
        let cached = match member.lindblad_map() {
            Some(map) if map.storage() == Storage::Dense => {
                Some(map.compute(self.errorgen(map.errorgen())?)?)
            }
            _ => None,
        };
        if let (Some(value), Some(map)) = (cached, member.lindblad_map_mut()) {
            map.set_cached(value);
        }
        let id = MemberId::from_raw(self.members.len());
        debug!(id = %id, kind = member.type_name(), dim = member.dim(), "Inserted member");
        self.members.push(member);
        self.invalidate("member inserted");
        Ok(id)
    }

    fn check_children(&self, member: &Member) -> Result<()> {
        match member {
            Member::Composed(c) => {
                for f in c.factors() {
                    let factor = self.expect_kind(*f, MemberKind::Operator)?;
                    if factor.dim() != c.dim() {
                        return Err(Error::dimension(
                            format!("composition factor {}", f),
                            c.dim(),
                            factor.dim(),
                        ));
                    }
                }
            }
            Member::Embedded(e) => {
                let base = self.expect_kind(e.base(), MemberKind::Operator)?;
                check_base_dim(e, base.dim())?;
            }
            Member::Povm(p) => {
                for (label, id) in p.effects() {
                    let effect = self.expect_kind(*id, MemberKind::Vector)?;
                    if effect.role() != Some(Role::Effect) {
                        return Err(Error::Constraint(format!(
                            "POVM effect '{}' ({}) is not an effect vector",
                            label, id
                        )));
                    }
                    if effect.dim() != p.dim() {
                        return Err(Error::dimension(
                            format!("POVM effect '{}'", label),
                            p.dim(),
                            effect.dim(),
                        ));
                    }
                }
            }
            Member::LindbladOp(_) | Member::LindbladVec(_) | Member::LindbladPovm(_) => {
                if let Some(map) = member.lindblad_map() {
                    let gen = self.expect_kind(map.errorgen(), MemberKind::Errorgen)?;
                    if gen.dim() != map.dim() {
                        return Err(Error::dimension(
                            format!("Lindblad generator {}", map.errorgen()),
                            map.dim(),
                            gen.dim(),
                        ));
                    }
                }
            }
            Member::DenseOp(_) | Member::DenseVec(_) | Member::Errorgen(_) => {}
        }
        Ok(())
    }

    fn expect_kind(&self, id: MemberId, kind: MemberKind) -> Result<&Member> {
        let member = self.member(id)?;
        if member.kind() != kind {
            return Err(Error::Constraint(format!(
                "{} is a {}, expected a {}",
                id,
                member.kind(),
                kind
            )));
        }
        Ok(member)
    }

    /// Add or replace a labelled entry.
    pub fn register(&mut self, label: &str, id: MemberId) -> Result<()> {
        let label: Label = label.parse()?;
        let dim = self.member(id)?.dim();
        if dim != self.dim {
            return Err(Error::dimension(format!("entry '{}'", label), self.dim, dim));
        }
        info!(label = %label, id = %id, "Registering member");
        if let Some(previous) = self.entries.insert(label.clone(), id) {
            debug!(label = %label, previous = %previous, "Replaced existing entry");
        }
        self.invalidate("entry registered");
        Ok(())
    }

    /// Insert a member and register it under `label`.
    pub fn register_new(&mut self, label: &str, member: impl Into<Member>) -> Result<MemberId> {
        let member = member.into();
        let label_parsed: Label = label.parse()?;
        if member.dim() != self.dim {
            return Err(Error::dimension(
                format!("entry '{}'", label_parsed),
                self.dim,
                member.dim(),
            ));
        }
        let id = self.insert(member)?;
        self.register(label, id)?;
        Ok(id)
    }

    /// Remove a labelled entry. The member stays in the arena.
    pub fn remove(&mut self, label: &str) -> Result<MemberId> {
        let label: Label = label.parse()?;
        let id = self
            .entries
            .shift_remove(&label)
            .ok_or_else(|| Error::NotFound(format!("label '{}'", label)))?;
        info!(label = %label, id = %id, "Removed entry");
        self.invalidate("entry removed");
        Ok(id)
    }

    /// Allocate the global parameter vector.
    ///
    /// Idempotent while the allocation is current. Returns the total count.
    pub fn allocate(&mut self) -> usize {
        if let Some(a) = &self.allocation {
            return a.vector.len();
        }

        let mut ranges = HashMap::new();
        let mut order = Vec::new();
        let mut vector = Vec::new();
        for id in self.entries.values() {
            self.walk(*id, &mut |leaf_id, leaf| {
                if ranges.contains_key(&leaf_id) {
                    return;
                }
                let start = vector.len();
                vector.extend(leaf.to_vector());
                ranges.insert(leaf_id, start..vector.len());
                order.push(leaf_id);
            });
        }

        info!(
            entries = self.entries.len(),
            leaves = order.len(),
            num_params = vector.len(),
            "Allocated parameter vector"
        );
        let total = vector.len();
        self.allocation = Some(Allocation {
            ranges,
            order,
            vector,
        });
        total
    }

    /// Total parameter count, allocating if needed.
    pub fn num_params(&mut self) -> usize {
        self.allocate()
    }

    /// Visit the leaves under `id` depth first, including repeats.
    fn walk<F>(&self, id: MemberId, visit: &mut F)
    where
        F: FnMut(MemberId, &dyn ModelMember),
    {
        let member = &self.members[id.index()];
        match member.as_leaf() {
            Some(leaf) => visit(id, leaf),
            None => {
                for child in member.children() {
                    self.walk(child, visit);
                }
            }
        }
    }

    /// Distinct leaves under `id` in first-visit order.
    fn distinct_leaves(&self, id: MemberId) -> Result<Vec<MemberId>> {
        self.member(id)?;
        let mut seen = HashSet::new();
        let mut leaves = Vec::new();
        self.walk(id, &mut |leaf_id, _| {
            if seen.insert(leaf_id) {
                leaves.push(leaf_id);
            }
        });
        Ok(leaves)
    }

    fn current(&self, what: &str) -> Result<&Allocation> {
        self.allocation
            .as_ref()
            .ok_or_else(|| Error::StaleAllocation(format!("{} needs a current allocation", what)))
    }

    /// The whole-model parameter vector.
    pub fn to_vector(&self) -> Result<Vec<f64>> {
        Ok(self.current("model vector")?.vector.clone())
    }

    /// Overwrite the whole-model parameter vector and every leaf.
    ///
    /// Leaves and cached error maps are rebuilt first; nothing changes if
    /// any of them fails.
    pub fn from_vector(&mut self, v: &[f64]) -> Result<()> {
        let alloc = self.current("model vector")?;
        validate_param_vector(v, alloc.vector.len())?;
        let updates: Vec<_> = alloc
            .order
            .iter()
            .filter_map(|id| alloc.ranges.get(id).map(|r| (*id, &v[r.clone()])))
            .collect();
        let staged = self.stage(updates)?;
        self.commit(staged);
        if let Some(a) = self.allocation.as_mut() {
            a.vector.copy_from_slice(v);
        }
        Ok(())
    }

    /// Apply `updates` to copies of the leaves and recompute the cached
    /// maps that depend on them.
    fn stage(&self, updates: Vec<(MemberId, &[f64])>) -> Result<Staged> {
        let mut leaves = Vec::with_capacity(updates.len());
        let mut maps = Vec::new();
        for (id, values) in updates {
            let mut member = self.member(id)?.clone();
            if let Some(leaf) = member.as_leaf_mut() {
                leaf.from_vector(values)?;
            }
            if let Some(gen) = member.errorgen() {
                maps.extend(self.dependent_maps(id, gen)?);
            }
            leaves.push((id, member));
        }
        Ok(Staged { leaves, maps })
    }

    fn commit(&mut self, staged: Staged) {
        for (id, member) in staged.leaves {
            self.members[id.index()] = member;
        }
        self.store_maps(staged.maps);
    }

    /// Fresh cached values of the dense-storage members driven by the
    /// generator `id`, computed from `gen`.
    fn dependent_maps(
        &self,
        id: MemberId,
        gen: &LindbladErrorgen,
    ) -> Result<Vec<(usize, Array2<f64>)>> {
        let mut exp_l = None;
        let mut maps = Vec::new();
        for (k, member) in self.members.iter().enumerate() {
            let Some(map) = member.lindblad_map() else {
                continue;
            };
            if map.errorgen() != id || map.storage() != Storage::Dense {
                continue;
            }
            let value = match &exp_l {
                Some(e) => map.apply(Array2::clone(e)),
                None => {
                    let e = error_map(gen)?;
                    let value = map.apply(e.clone());
                    exp_l = Some(e);
                    value
                }
            };
            maps.push((k, value));
        }
        Ok(maps)
    }

    fn store_maps(&mut self, maps: Vec<(usize, Array2<f64>)>) {
        if maps.is_empty() {
            return;
        }
        debug!(count = maps.len(), "Refreshed cached Lindblad maps");
        for (k, value) in maps {
            if let Some(map) = self.members[k].lindblad_map_mut() {
                map.set_cached(value);
            }
        }
    }

    /// Parameter count of a member.
    ///
    /// Composites report the per-leaf sum with repeats before allocation and
    /// the count of distinct leaf parameters after.
    pub fn member_num_params(&self, id: MemberId) -> Result<usize> {
        if self.allocation.is_none() {
            return self.naive_num_params(id);
        }
        let leaves = self.distinct_leaves(id)?;
        Ok(leaves
            .iter()
            .filter_map(|l| self.members[l.index()].as_leaf())
            .map(|l| l.num_params())
            .sum())
    }

    /// Per-leaf parameter sum counting repeated leaves each time.
    pub fn naive_num_params(&self, id: MemberId) -> Result<usize> {
        self.member(id)?;
        let mut total = 0;
        self.walk(id, &mut |_, leaf| total += leaf.num_params());
        Ok(total)
    }

    /// Global indices of a member's parameters, in its parameter order.
    pub fn member_indices(&self, id: MemberId) -> Result<Vec<usize>> {
        let leaves = self.distinct_leaves(id)?;
        let alloc = self.current("member parameters")?;
        let mut indices = Vec::new();
        for leaf in leaves {
            let range = alloc.ranges.get(&leaf).ok_or_else(|| {
                Error::StaleAllocation(format!(
                    "{} is not reachable from a registered entry",
                    leaf
                ))
            })?;
            indices.extend(range.clone());
        }
        Ok(indices)
    }

    /// A member's parameters.
    ///
    /// Leaves always answer; composites need a current allocation.
    pub fn member_vector(&self, id: MemberId) -> Result<Vec<f64>> {
        let member = self.member(id)?;
        if let Some(leaf) = member.as_leaf() {
            if let Some(range) = self.allocation.as_ref().and_then(|a| a.ranges.get(&id)) {
                let alloc = self.current("member parameters")?;
                return Ok(alloc.vector[range.clone()].to_vec());
            }
            return Ok(leaf.to_vector());
        }
        let indices = self.member_indices(id)?;
        let alloc = self.current("member parameters")?;
        Ok(indices.iter().map(|i| alloc.vector[*i]).collect())
    }

    /// Write a member's parameters through the global vector.
    pub fn set_member_vector(&mut self, id: MemberId, v: &[f64]) -> Result<()> {
        if self.member(id)?.is_leaf() {
            let staged = self.stage(vec![(id, v)])?;
            self.commit(staged);
            let range = self.allocation.as_ref().and_then(|a| a.ranges.get(&id)).cloned();
            if let (Some(range), Some(alloc)) = (range, self.allocation.as_mut()) {
                alloc.vector[range].copy_from_slice(v);
            }
            return Ok(());
        }

        let indices = self.member_indices(id)?;
        validate_param_vector(v, indices.len())?;
        let leaves = self.distinct_leaves(id)?;
        let alloc = self.current("member parameters")?;
        let mut vector = alloc.vector.clone();
        for (i, value) in indices.iter().zip(v) {
            vector[*i] = *value;
        }
        let updates: Vec<_> = leaves
            .iter()
            .filter_map(|l| alloc.ranges.get(l).map(|r| (*l, &vector[r.clone()])))
            .collect();
        let staged = self.stage(updates)?;
        self.commit(staged);
        if let Some(alloc) = self.allocation.as_mut() {
            alloc.vector = vector;
        }
        Ok(())
    }

    /// Run `f` on a leaf, then resynchronize the global vector.
    ///
    /// The member is restored if `f` fails or turns it into something that
    /// is not a leaf of the same kind and dimension.
    pub fn modify<R, F>(&mut self, id: MemberId, f: F) -> Result<R>
    where
        F: FnOnce(&mut Member) -> Result<R>,
    {
        let member = self.member(id)?;
        if !member.is_leaf() {
            return Err(Error::Constraint(format!(
                "{} is a {}; only leaf members can be modified",
                id,
                member.type_name()
            )));
        }
        let snapshot = member.clone();
        let (kind, dim) = (snapshot.kind(), snapshot.dim());

        let slot = &mut self.members[id.index()];
        let result = match f(slot) {
            Ok(r) => r,
            Err(e) => {
                *slot = snapshot;
                return Err(e);
            }
        };
        if !slot.is_leaf() || slot.kind() != kind || slot.dim() != dim {
            *slot = snapshot;
            return Err(Error::Constraint(format!(
                "modification changed the kind or dimension of {}",
                id
            )));
        }

        let maps = match self.members[id.index()].errorgen() {
            Some(gen) => self.dependent_maps(id, gen),
            None => Ok(Vec::new()),
        };
        match maps {
            Ok(maps) => self.store_maps(maps),
            Err(e) => {
                self.members[id.index()] = snapshot;
                return Err(e);
            }
        }

        let slot = &self.members[id.index()];
        let values = slot.as_leaf().map(|l| l.to_vector()).unwrap_or_default();
        let range = self.allocation.as_ref().and_then(|a| a.ranges.get(&id)).cloned();
        if let Some(range) = range {
            if range.len() == values.len() {
                if let Some(alloc) = self.allocation.as_mut() {
                    alloc.vector[range].copy_from_slice(&values);
                }
            } else {
                self.invalidate("leaf parameter count changed");
            }
        }
        Ok(result)
    }

    /// The generator behind `id`: `id` itself when it is a generator, or
    /// the generator a Lindblad member exponentiates.
    pub fn errorgen_id(&self, id: MemberId) -> Result<MemberId> {
        let member = self.member(id)?;
        if member.errorgen().is_some() {
            return Ok(id);
        }
        member
            .lindblad_map()
            .map(LindbladOp::errorgen)
            .ok_or_else(|| not_a(id, member, MemberKind::Errorgen))
    }

    pub fn errorgen(&self, id: MemberId) -> Result<&LindbladErrorgen> {
        let gen = self.errorgen_id(id)?;
        let member = self.member(gen)?;
        member
            .errorgen()
            .ok_or_else(|| not_a(gen, member, MemberKind::Errorgen))
    }

    pub fn errgen_coeffs(
        &self,
        id: MemberId,
        return_basis: bool,
    ) -> Result<(CoeffDict, Option<Arc<Basis>>)> {
        Ok(self.errorgen(id)?.errgen_coeffs(return_basis))
    }

    pub fn error_rates(&self, id: MemberId) -> Result<CoeffDict> {
        Ok(self.errorgen(id)?.error_rates())
    }

    /// Replace the coefficients of the generator behind `id`.
    pub fn set_errgen_coeffs(&mut self, id: MemberId, dict: &CoeffDict, basis: &Basis) -> Result<()> {
        self.modify_errorgen(id, |g| g.set_errgen_coeffs(dict, basis))
    }

    pub fn update_errgen_coeffs(
        &mut self,
        id: MemberId,
        dict: &CoeffDict,
        basis: &Basis,
    ) -> Result<()> {
        self.modify_errorgen(id, |g| g.update_errgen_coeffs(dict, basis))
    }

    pub fn set_error_rates(&mut self, id: MemberId, rates: &CoeffDict, basis: &Basis) -> Result<()> {
        self.modify_errorgen(id, |g| g.set_error_rates(rates, basis))
    }

    fn modify_errorgen<F>(&mut self, id: MemberId, f: F) -> Result<()>
    where
        F: FnOnce(&mut LindbladErrorgen) -> Result<()>,
    {
        let gen = self.errorgen_id(id)?;
        self.modify(gen, |m| match m.errorgen_mut() {
            Some(g) => f(g),
            None => Err(Error::Constraint(format!("{} is not an error generator", gen))),
        })
    }

    /// `exp(L)·base` of a Lindblad map, from its cache when stored.
    fn map_value(&self, map: &LindbladOp) -> Result<Array2<f64>> {
        map.matrix(self.errorgen(map.errorgen())?)
    }

    /// Dense matrix of an operator member.
    pub fn todense_op(&self, id: MemberId) -> Result<DenseMatrix> {
        match self.member(id)? {
            Member::DenseOp(op) => Ok(op.todense()),
            Member::LindbladOp(op) => Ok(DenseMatrix::Real(self.map_value(op)?)),
            Member::Composed(c) => {
                let factors = c
                    .factors()
                    .iter()
                    .map(|f| self.todense_op(*f))
                    .collect::<Result<Vec<_>>>()?;
                Ok(c.product(factors))
            }
            Member::Embedded(e) => e.embed(&self.todense_op(e.base())?),
            other => Err(not_a(id, other, MemberKind::Operator)),
        }
    }

    /// Dense vector of a vector member.
    pub fn todense_vec(&self, id: MemberId) -> Result<DenseVector> {
        match self.member(id)? {
            Member::DenseVec(v) => Ok(v.todense()),
            Member::LindbladVec(v) => Ok(v.apply(&self.map_value(v.map())?)),
            other => Err(not_a(id, other, MemberKind::Vector)),
        }
    }

    /// Dense effects of a POVM member, in label order.
    pub fn povm_effects(&self, id: MemberId) -> Result<IndexMap<String, DenseVector>> {
        match self.member(id)? {
            Member::Povm(p) => {
                let values = p
                    .effects()
                    .values()
                    .map(|e| self.todense_vec(*e))
                    .collect::<Result<Vec<_>>>()?;
                p.assemble(values)
            }
            Member::LindbladPovm(p) => Ok(p.dense_effects(&self.map_value(p.map())?)),
            other => Err(not_a(id, other, MemberKind::Povm)),
        }
    }
}

fn not_a(id: MemberId, member: &Member, expected: MemberKind) -> Error {
    Error::Constraint(format!(
        "{} is a {} ({}), not a {}",
        id,
        member.kind(),
        member.type_name(),
        expected
    ))
}
