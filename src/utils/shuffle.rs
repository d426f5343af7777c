// src/utils/shuffle.rs

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::error::AppError;

/// Display order over a canonical question sequence.
///
/// `order[display] = canonical`. The canonical sequence itself is never
/// reordered; answers and scoring always index through it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permutation {
    order: Vec<usize>,
}

impl Permutation {
    pub fn identity(len: usize) -> Self {
        Self {
            order: (0..len).collect(),
        }
    }

    /// Fisher–Yates shuffle. A fixed seed gives a reproducible order.
    pub fn shuffled(len: usize, seed: Option<u64>) -> Self {
        let mut order: Vec<usize> = (0..len).collect();
        match seed {
            Some(seed) => order.shuffle(&mut StdRng::seed_from_u64(seed)),
            None => order.shuffle(&mut rand::thread_rng()),
        }
        Self { order }
    }

    /// Accepts an explicit order, rejecting anything that is not a permutation.
    pub fn from_order(order: Vec<usize>) -> Result<Self, AppError> {
        let mut seen = vec![false; order.len()];
        for &idx in &order {
            if idx >= order.len() || seen[idx] {
                return Err(AppError::InvalidQuiz(format!(
                    "{:?} is not a permutation",
                    order
                )));
            }
            seen[idx] = true;
        }
        Ok(Self { order })
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Canonical index shown at `display`.
    pub fn canonical(&self, display: usize) -> Option<usize> {
        self.order.get(display).copied()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.order
    }
}
