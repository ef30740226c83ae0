//! CART random forest for regression (MSE) and classification (Gini).
//!
//! Trees are grown in parallel with rayon. Tree `t` draws its bootstrap
//! sample and split candidates from `StdRng::seed_from_u64(seed + t)`, so a
//! forest is fully determined by its seed.

use super::{check_prediction_input, check_training_input, class_count};
use crate::config::ForestParams;
use crate::core::error::Result;
use crate::core::traits::{ModelAdapter, TrainedModel};
use crate::core::types::*;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

/// What a tree predicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Task {
    Regression,
    Classification { num_classes: usize },
}

impl Task {
    fn output_len(&self) -> usize {
        match self {
            Task::Regression => 1,
            Task::Classification { num_classes } => *num_classes,
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    /// Mean target (regression) or class proportions (classification)
    Leaf { output: Vec<f64> },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    fn depth(&self) -> usize {
        match self {
            Node::Leaf { .. } => 0,
            Node::Split { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    fn num_leaves(&self) -> usize {
        match self {
            Node::Leaf { .. } => 1,
            Node::Split { left, right, .. } => left.num_leaves() + right.num_leaves(),
        }
    }
}

/// Running impurity statistics for one side of a candidate split.
#[derive(Debug, Clone)]
enum Accumulator {
    Regression { count: f64, sum: f64, sum_sq: f64 },
    Classification { count: f64, counts: Vec<f64> },
}

impl Accumulator {
    fn empty(task: Task) -> Self {
        match task {
            Task::Regression => Accumulator::Regression {
                count: 0.0,
                sum: 0.0,
                sum_sq: 0.0,
            },
            Task::Classification { num_classes } => Accumulator::Classification {
                count: 0.0,
                counts: vec![0.0; num_classes],
            },
        }
    }

    fn add(&mut self, y: f64, sign: f64) {
        match self {
            Accumulator::Regression { count, sum, sum_sq } => {
                *count += sign;
                *sum += sign * y;
                *sum_sq += sign * y * y;
            }
            Accumulator::Classification { count, counts } => {
                *count += sign;
                counts[y as usize] += sign;
            }
        }
    }

    fn count(&self) -> f64 {
        match self {
            Accumulator::Regression { count, .. } | Accumulator::Classification { count, .. } => *count,
        }
    }

    /// Variance (regression) or Gini impurity (classification).
    fn impurity(&self) -> f64 {
        let n = self.count();
        if n <= 0.0 {
            return 0.0;
        }
        match self {
            Accumulator::Regression { sum, sum_sq, .. } => {
                let mean = sum / n;
                (sum_sq / n - mean * mean).max(0.0)
            }
            Accumulator::Classification { counts, .. } => {
                1.0 - counts.iter().map(|c| (c / n).powi(2)).sum::<f64>()
            }
        }
    }

    fn output(&self) -> Vec<f64> {
        let n = self.count().max(1.0);
        match self {
            Accumulator::Regression { sum, .. } => vec![sum / n],
            Accumulator::Classification { counts, .. } => counts.iter().map(|c| c / n).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Split {
    feature: usize,
    threshold: f64,
}

struct TreeBuilder<'x, 'y, 'p> {
    x: ArrayView2<'x, f64>,
    y: ArrayView1<'y, f64>,
    task: Task,
    params: &'p ForestParams,
    max_features: usize,
}

impl TreeBuilder<'_, '_, '_> {
    fn stats(&self, indices: &[usize]) -> Accumulator {
        let mut acc = Accumulator::empty(self.task);
        for &i in indices {
            acc.add(self.y[i], 1.0);
        }
        acc
    }

    fn build(&self, indices: &mut [usize], depth: usize, rng: &mut StdRng) -> Node {
        let stats = self.stats(indices);
        let min_leaf = self.params.min_samples_leaf.max(1);
        let output = stats.output();

        if depth >= self.params.max_depth || indices.len() < 2 * min_leaf || stats.impurity() <= 0.0 {
            return Node::Leaf { output };
        }

        let Some(split) = self.best_split(indices, &stats, min_leaf, rng) else {
            return Node::Leaf { output };
        };

        let mut mid = 0;
        for k in 0..indices.len() {
            if self.x[[indices[k], split.feature]] <= split.threshold {
                indices.swap(k, mid);
                mid += 1;
            }
        }
        let (left, right) = indices.split_at_mut(mid);

        Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left: Box::new(self.build(left, depth + 1, rng)),
            right: Box::new(self.build(right, depth + 1, rng)),
        }
    }

    fn best_split(&self, indices: &[usize], parent: &Accumulator, min_leaf: usize, rng: &mut StdRng) -> Option<Split> {
        let n_features = self.x.ncols();
        if n_features == 0 || self.max_features == 0 {
            return None;
        }
        // Features are visited in random order; past `max_features` the
        // search only continues while no valid split has been found.
        let order = rand::seq::index::sample(rng, n_features, n_features);

        let n = indices.len() as f64;
        let parent_impurity = parent.impurity();
        let mut best_gain = self.params.min_info_gain;
        let mut best: Option<Split> = None;
        let mut sorted = indices.to_vec();

        for (visited, feature) in order.iter().enumerate() {
            if visited >= self.max_features && best.is_some() {
                break;
            }
            sorted.sort_by(|&a, &b| self.x[[a, feature]].total_cmp(&self.x[[b, feature]]));

            let mut left = Accumulator::empty(self.task);
            let mut right = parent.clone();
            for k in 0..sorted.len() - 1 {
                let y = self.y[sorted[k]];
                left.add(y, 1.0);
                right.add(y, -1.0);

                let left_n = k + 1;
                let right_n = sorted.len() - left_n;
                let value = self.x[[sorted[k], feature]];
                let next = self.x[[sorted[k + 1], feature]];
                if left_n < min_leaf || right_n < min_leaf || value == next {
                    continue;
                }

                let weighted = (left_n as f64 / n) * left.impurity() + (right_n as f64 / n) * right.impurity();
                let gain = parent_impurity - weighted;
                if gain > best_gain {
                    best_gain = gain;
                    best = Some(Split {
                        feature,
                        threshold: value + (next - value) / 2.0,
                    });
                }
            }
        }

        best
    }
}

/// A single CART tree.
#[derive(Debug, Clone)]
pub struct DecisionTree {
    root: Node,
}

impl DecisionTree {
    fn fit(builder: &TreeBuilder<'_, '_, '_>, indices: &mut [usize], rng: &mut StdRng) -> Self {
        DecisionTree {
            root: builder.build(indices, 0, rng),
        }
    }

    fn predict_row(&self, row: ArrayView1<'_, f64>) -> &[f64] {
        let mut node = &self.root;
        loop {
            match node {
                Node::Leaf { output } => return output,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature] <= *threshold { left } else { right };
                }
            }
        }
    }

    /// Number of split levels below the root
    pub fn depth(&self) -> usize {
        self.root.depth()
    }

    /// Number of leaves
    pub fn num_leaves(&self) -> usize {
        self.root.num_leaves()
    }
}

/// Random-forest binding for one column type.
#[derive(Debug, Clone)]
pub struct RandomForest {
    params: ForestParams,
    column_type: ColumnType,
    seed: u64,
}

impl RandomForest {
    /// Create a forest binding
    pub fn new(params: ForestParams, column_type: ColumnType, seed: u64) -> Self {
        Self {
            params,
            column_type,
            seed,
        }
    }

    /// Train and return the concrete model type
    pub fn fit(&self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>) -> Result<RandomForestModel> {
        check_training_input(&x, &y)?;

        let task = match self.column_type {
            ColumnType::Regression => Task::Regression,
            ColumnType::Classification => Task::Classification {
                num_classes: class_count(&y)?,
            },
        };
        let num_features = x.ncols();
        let builder = TreeBuilder {
            x,
            y,
            task,
            params: &self.params,
            max_features: self.params.max_features.resolve(num_features, self.column_type),
        };
        let n_rows = x.nrows();

        let trees: Vec<DecisionTree> = (0..self.params.n_estimators)
            .into_par_iter()
            .map(|t| {
                let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(t as u64));
                let mut indices: Vec<usize> = if self.params.bootstrap {
                    (0..n_rows).map(|_| rng.gen_range(0..n_rows)).collect()
                } else {
                    (0..n_rows).collect()
                };
                DecisionTree::fit(&builder, &mut indices, &mut rng)
            })
            .collect();

        log::debug!(
            "trained {} trees on {} rows x {} predictors",
            trees.len(),
            n_rows,
            num_features
        );

        Ok(RandomForestModel {
            trees,
            task,
            num_features,
        })
    }
}

impl ModelAdapter for RandomForest {
    fn train(&self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>) -> Result<Box<dyn TrainedModel>> {
        Ok(Box::new(self.fit(x, y)?))
    }

    fn name(&self) -> &'static str {
        match self.column_type {
            ColumnType::Regression => "random_forest_regressor",
            ColumnType::Classification => "random_forest_classifier",
        }
    }
}

/// A trained forest.
#[derive(Debug, Clone)]
pub struct RandomForestModel {
    trees: Vec<DecisionTree>,
    task: Task,
    num_features: usize,
}

impl RandomForestModel {
    /// Tree outputs averaged over the forest, rows × output width
    fn averaged(&self, x: ArrayView2<'_, f64>) -> Array2<f64> {
        let width = self.task.output_len();
        let mut out = Array2::zeros((x.nrows(), width));
        if self.trees.is_empty() {
            return out;
        }
        for (row, mut target) in x.outer_iter().zip(out.outer_iter_mut()) {
            for tree in &self.trees {
                for (acc, v) in target.iter_mut().zip(tree.predict_row(row)) {
                    *acc += v;
                }
            }
            target.mapv_inplace(|v| v / self.trees.len() as f64);
        }
        out
    }

    /// The trees of the forest
    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }
}

impl TrainedModel for RandomForestModel {
    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>> {
        check_prediction_input(&x, self.num_features)?;
        let averaged = self.averaged(x);
        Ok(match self.task {
            Task::Regression => averaged.column(0).to_owned(),
            Task::Classification { .. } => averaged
                .outer_iter()
                .map(|row| argmax(row.iter().copied()) as f64)
                .collect(),
        })
    }

    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Option<Array2<f64>>> {
        check_prediction_input(&x, self.num_features)?;
        Ok(match self.task {
            Task::Regression => None,
            Task::Classification { .. } => Some(self.averaged(x)),
        })
    }

    fn num_features(&self) -> usize {
        self.num_features
    }
}

/// Index of the largest value; the lowest index wins ties.
pub(crate) fn argmax<I: Iterator<Item = f64>>(values: I) -> usize {
    let mut best = 0;
    let mut best_value = f64::NEG_INFINITY;
    for (i, v) in values.enumerate() {
        if v > best_value {
            best = i;
            best_value = v;
        }
    }
    best
}
