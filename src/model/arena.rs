// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Member handles and the tagged member type stored in a model arena.

use std::fmt;

use crate::composite::{ComposedOp, EmbeddedOp};
use crate::lindblad::{LindbladErrorgen, LindbladOp, LindbladSpamVec};
use crate::member::{DenseOp, DenseVec, ModelMember, Role, SpamVector};
use crate::povm::{LindbladPovm, Povm};

/// Handle to a member in a [`Model`](super::Model) arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemberId(usize);

impl MemberId {
    /// Handle from a raw arena index.
    pub fn from_raw(index: usize) -> Self {
        Self(index)
    }

    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a member materializes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Operator,
    Vector,
    Povm,
    /// A Lindblad generator that Lindblad members exponentiate
    Errorgen,
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberKind::Operator => f.write_str("operator"),
            MemberKind::Vector => f.write_str("vector"),
            MemberKind::Povm => f.write_str("POVM"),
            MemberKind::Errorgen => f.write_str("error generator"),
        }
    }
}

/// Any model member.
#[derive(Debug, Clone)]
pub enum Member {
    DenseOp(DenseOp),
    DenseVec(DenseVec),
    Errorgen(LindbladErrorgen),
    LindbladOp(LindbladOp),
    LindbladVec(LindbladSpamVec),
    LindbladPovm(LindbladPovm),
    Composed(ComposedOp),
    Embedded(EmbeddedOp),
    Povm(Povm),
}

impl Member {
    pub fn kind(&self) -> MemberKind {
        match self {
            Member::DenseOp(_) | Member::LindbladOp(_) | Member::Composed(_) | Member::Embedded(_) => {
                MemberKind::Operator
            }
            Member::DenseVec(_) | Member::LindbladVec(_) => MemberKind::Vector,
            Member::LindbladPovm(_) | Member::Povm(_) => MemberKind::Povm,
            Member::Errorgen(_) => MemberKind::Errorgen,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Member::DenseOp(_) => "DenseOp",
            Member::DenseVec(_) => "DenseVec",
            Member::Errorgen(_) => "LindbladErrorgen",
            Member::LindbladOp(_) => "LindbladOp",
            Member::LindbladVec(_) => "LindbladSpamVec",
            Member::LindbladPovm(_) => "LindbladPovm",
            Member::Composed(_) => "ComposedOp",
            Member::Embedded(_) => "EmbeddedOp",
            Member::Povm(_) => "Povm",
        }
    }

    pub fn dim(&self) -> usize {
        match self {
            Member::LindbladOp(op) => op.dim(),
            Member::LindbladVec(v) => v.dim(),
            Member::LindbladPovm(p) => p.dim(),
            Member::Composed(c) => c.dim(),
            Member::Embedded(e) => e.dim(),
            Member::Povm(p) => p.dim(),
            leaf => leaf.as_leaf().map_or(0, |m| m.dim()),
        }
    }

    /// Vector role, for vector members.
    pub fn role(&self) -> Option<Role> {
        match self {
            Member::DenseVec(v) => Some(v.role()),
            Member::LindbladVec(v) => Some(v.role()),
            _ => None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.as_leaf().is_some()
    }

    /// The parameter protocol of a leaf; `None` for composites.
    pub fn as_leaf(&self) -> Option<&dyn ModelMember> {
        match self {
            Member::DenseOp(m) => Some(m),
            Member::DenseVec(m) => Some(m),
            Member::Errorgen(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_leaf_mut(&mut self) -> Option<&mut dyn ModelMember> {
        match self {
            Member::DenseOp(m) => Some(m),
            Member::DenseVec(m) => Some(m),
            Member::Errorgen(m) => Some(m),
            _ => None,
        }
    }

    /// Direct children, in parameter order.
    pub fn children(&self) -> Vec<MemberId> {
        match self {
            Member::Composed(c) => c.factors().to_vec(),
            Member::Embedded(e) => vec![e.base()],
            Member::Povm(p) => p.effects().values().copied().collect(),
            lindblad => lindblad
                .lindblad_map()
                .map(|m| vec![m.errorgen()])
                .unwrap_or_default(),
        }
    }

    pub fn errorgen(&self) -> Option<&LindbladErrorgen> {
        match self {
            Member::Errorgen(g) => Some(g),
            _ => None,
        }
    }

    pub fn errorgen_mut(&mut self) -> Option<&mut LindbladErrorgen> {
        match self {
            Member::Errorgen(g) => Some(g),
            _ => None,
        }
    }

    /// The error map of a Lindblad member, if any.
    pub fn lindblad_map(&self) -> Option<&LindbladOp> {
        match self {
            Member::LindbladOp(op) => Some(op),
            Member::LindbladVec(v) => Some(v.map()),
            Member::LindbladPovm(p) => Some(p.map()),
            _ => None,
        }
    }

    pub(crate) fn lindblad_map_mut(&mut self) -> Option<&mut LindbladOp> {
        match self {
            Member::LindbladOp(op) => Some(op),
            Member::LindbladVec(v) => Some(v.map_mut()),
            Member::LindbladPovm(p) => Some(p.map_mut()),
            _ => None,
        }
    }
}

macro_rules! impl_from_member {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for Member {
                fn from(m: $ty) -> Self {
                    Member::$variant(m)
                }
            }
        )*
    };
}

impl_from_member!(
    DenseOp(DenseOp),
    DenseVec(DenseVec),
    Errorgen(LindbladErrorgen),
    LindbladOp(LindbladOp),
    LindbladVec(LindbladSpamVec),
    LindbladPovm(LindbladPovm),
    Composed(ComposedOp),
    Embedded(EmbeddedOp),
    Povm(Povm),
);
