// ============================================================
// Layer 5 - Weight Decay Grouping
// ============================================================
// Splits a model's trainable parameters into two groups:
//
//   decay     (rate 0.01) - weight matrices and embedding tables
//   no_decay  (rate 0.0)  - bias vectors and LayerNorm gamma/beta
//
// The assignment is structural and fixed once, right after the
// model is built: parameters of tensor rank >= 2 decay, rank-1
// parameters do not. In this architecture rank-1 parameters are
// exactly the bias and normalization terms, so no name matching
// is involved. Every parameter lands in exactly one group.
//
// Decay itself is applied decoupled from the gradient: right
// before each optimizer step, every decay-group parameter is
// scaled by (1 - lr * rate), the optimizer then applies the pure
// Adam update on top.

use std::collections::HashSet;
use std::marker::PhantomData;

use burn::module::{Module, ModuleMapper, ModuleVisitor, ParamId};
use burn::prelude::*;

/// Decay rate applied to the weight-matrix group.
pub const DECAY_RATE: f64 = 0.01;

/// Disjoint parameter-id sets covering the whole model.
#[derive(Debug, Clone)]
pub struct ParamGroups {
    decay:             HashSet<ParamId>,
    no_decay:          HashSet<ParamId>,
    decay_elements:    usize,
    no_decay_elements: usize,
}

impl ParamGroups {
    /// Classify every trainable parameter of `module` by rank.
    pub fn from_module<B: Backend, M: Module<B>>(module: &M) -> Self {
        let mut collector = GroupCollector::<B> {
            groups: ParamGroups {
                decay:             HashSet::new(),
                no_decay:          HashSet::new(),
                decay_elements:    0,
                no_decay_elements: 0,
            },
            _backend: PhantomData,
        };
        module.visit(&mut collector);
        collector.groups
    }

    /// Parameter tensors in the decay group.
    pub fn decay_count(&self) -> usize {
        self.decay.len()
    }

    pub fn no_decay_count(&self) -> usize {
        self.no_decay.len()
    }

    /// Scalar elements across both groups; must equal the model's
    /// total trainable parameter count.
    pub fn total_elements(&self) -> usize {
        self.decay_elements + self.no_decay_elements
    }

    pub fn decay_elements(&self) -> usize {
        self.decay_elements
    }

    pub fn no_decay_elements(&self) -> usize {
        self.no_decay_elements
    }
}

struct GroupCollector<B: Backend> {
    groups:   ParamGroups,
    _backend: PhantomData<B>,
}

impl<B: Backend> ModuleVisitor<B> for GroupCollector<B> {
    fn visit_float<const D: usize>(&mut self, id: ParamId, tensor: &Tensor<B, D>) {
        let elements = tensor.shape().num_elements();
        if D >= 2 {
            self.groups.decay.insert(id);
            self.groups.decay_elements += elements;
        } else {
            self.groups.no_decay.insert(id);
            self.groups.no_decay_elements += elements;
        }
    }
}

struct DecayMapper<'a, B: Backend> {
    factor:   f64,
    decay:    &'a HashSet<ParamId>,
    _backend: PhantomData<B>,
}

impl<B: Backend> ModuleMapper<B> for DecayMapper<'_, B> {
    fn map_float<const D: usize>(&mut self, id: ParamId, tensor: Tensor<B, D>) -> Tensor<B, D> {
        if self.decay.contains(&id) {
            // Re-register as a leaf so the next backward pass still
            // reaches this parameter.
            tensor.mul_scalar(self.factor).detach().require_grad()
        } else {
            tensor
        }
    }
}

/// Scale every decay-group parameter by (1 - lr * DECAY_RATE).
/// Called once per optimizer step, before the Adam update.
pub fn apply_weight_decay<B: Backend, M: Module<B>>(
    module: M,
    groups: &ParamGroups,
    lr:     f64,
) -> M {
    let mut mapper = DecayMapper::<B> {
        factor:   1.0 - lr * DECAY_RATE,
        decay:    &groups.decay,
        _backend: PhantomData,
    };
    module.map(&mut mapper)
}
