//! Decision tree: induction, inference, and reversible pruning.
//!
//! The tree stores its nodes in a contiguous arena (index 0 is the root).
//! Training and pruning walk the arena with explicit stacks, so very deep
//! trees never exhaust the call stack.

use crate::core::error::{ForestError, Result};
use crate::core::traits::{Classifier, FeatureRow};
use crate::core::types::{Class, NodeIndex};
use crate::dataset::{validate_pair, DataSet, SampleWeights};
use crate::ensure;
use crate::io::tree_format;
use crate::tree::node::{ClassCounts, Node, NodeKind, Split};
use crate::tree::split::{SplitFinder, SplitFinderConfig};
use ndarray::{Array1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{Read, Write};

/// A trained signal/background decision tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    /// Node arena (index 0 is always the root)
    nodes: Vec<Node>,
    /// Minimum feature vector length needed to route a row
    num_features: usize,
}

/// Pending pruning work.
enum PruneFrame {
    Enter {
        node: NodeIndex,
        signal: Vec<usize>,
        background: Vec<usize>,
    },
    Exit {
        node: NodeIndex,
        signal: Vec<usize>,
        background: Vec<usize>,
    },
}

fn class_counts(signal: usize, background: usize) -> Result<Option<ClassCounts>> {
    let signal = u32::try_from(signal)
        .map_err(|_| ForestError::training(format!("{} signal points exceed u32", signal)))?;
    let background = u32::try_from(background).map_err(|_| {
        ForestError::training(format!("{} background points exceed u32", background))
    })?;
    Ok(ClassCounts::new(signal, background))
}

impl Tree {
    /// Grows a tree on the two corpora using `weights` for split scoring.
    ///
    /// Fails when the corpora disagree on feature count, when `weights`
    /// does not line up with them, or when both corpora are empty.
    pub fn train(
        signal: &DataSet,
        background: &DataSet,
        weights: &SampleWeights,
        config: SplitFinderConfig,
    ) -> Result<Tree> {
        let num_features = validate_pair(signal, background)?;
        weights.check_matches(signal, background)?;
        let root_counts =
            class_counts(signal.len(), background.len())?.ok_or(ForestError::EmptyTrainingData)?;

        let finder = SplitFinder::new(signal, background, weights, config);
        let mut nodes = vec![Node::terminal(root_counts)];
        let mut stack: Vec<(NodeIndex, Vec<usize>, Vec<usize>)> = vec![(
            0,
            (0..signal.len()).collect(),
            (0..background.len()).collect(),
        )];

        while let Some((index, signal_idx, background_idx)) = stack.pop() {
            let Some(candidate) = finder.choose_split(&signal_idx, &background_idx) else {
                continue;
            };
            let split = candidate.split();

            let (signal_low, signal_high) =
                signal.partition(&signal_idx, split.feature, split.threshold);
            let (background_low, background_high) =
                background.partition(&background_idx, split.feature, split.threshold);

            let low_counts = class_counts(signal_low.len(), background_low.len())?;
            let high_counts = class_counts(signal_high.len(), background_high.len())?;
            let (Some(low_counts), Some(high_counts)) = (low_counts, high_counts) else {
                // Scoring uses `< t` but routing uses `<= t`; a split can
                // still leave one side empty.
                log::debug!(
                    "Discarding split x[{}] <= {}: one side is empty",
                    split.feature,
                    split.threshold
                );
                continue;
            };

            let low = nodes.len();
            nodes.push(Node::terminal(low_counts));
            let high = nodes.len();
            nodes.push(Node::terminal(high_counts));
            let counts = nodes[index].counts;
            nodes[index] = Node::branch(counts, split, low, high);

            stack.push((high, signal_high, background_high));
            stack.push((low, signal_low, background_low));
        }

        let tree = Tree {
            nodes,
            num_features,
        };
        log::debug!(
            "Trained tree with {} nodes, {} terminals, depth {}",
            tree.num_nodes(),
            tree.num_terminals(),
            tree.depth()
        );
        Ok(tree)
    }

    /// Grows a tree with each point's initial weight and the default grid.
    pub fn train_with_defaults(signal: &DataSet, background: &DataSet) -> Result<Tree> {
        let weights = SampleWeights::from_datasets(signal, background);
        Self::train(signal, background, &weights, SplitFinderConfig::default())
    }

    /// Builds a tree from an arena, checking that every child index points
    /// forward into the arena and that each node has exactly one parent.
    pub(crate) fn from_nodes(nodes: Vec<Node>) -> Result<Tree> {
        ensure!(
            !nodes.is_empty(),
            ForestError::serialization("tree has no nodes")
        );

        let mut has_parent = vec![false; nodes.len()];
        let mut num_features = 0;
        for (index, node) in nodes.iter().enumerate() {
            if let NodeKind::Branch { split, low, high, .. } = node.kind {
                for child in [low, high] {
                    ensure!(
                        child > index && child < nodes.len() && !has_parent[child],
                        ForestError::serialization(format!(
                            "node {} has invalid child {}",
                            index, child
                        ))
                    );
                    has_parent[child] = true;
                }
                num_features = num_features.max(split.feature + 1);
            }
        }

        Ok(Tree {
            nodes,
            num_features,
        })
    }

    /// Purity of the node reached by `row`, honoring suppression.
    pub fn run_data_point<R: FeatureRow + ?Sized>(&self, row: &R) -> f64 {
        self.run_from(0, row)
    }

    /// Like [`run_data_point`](Self::run_data_point) but starts at `node`.
    pub fn run_from<R: FeatureRow + ?Sized>(&self, mut node: NodeIndex, row: &R) -> f64 {
        loop {
            let current = &self.nodes[node];
            match current.active_split() {
                Some((split, low, high)) => {
                    node = if split.goes_low(row) { low } else { high };
                }
                None => return current.purity(),
            }
        }
    }

    /// Predicts every row of a feature matrix.
    pub fn predict_batch(&self, features: ArrayView2<'_, f64>) -> Result<Array1<f64>> {
        ensure!(
            features.ncols() >= self.num_features,
            ForestError::prediction(format!(
                "rows have {} features, tree needs {}",
                features.ncols(),
                self.num_features
            ))
        );
        Ok(features
            .axis_iter(Axis(0))
            .map(|row| self.run_data_point(&row))
            .collect())
    }

    /// Cost-complexity pruning against the given corpora.
    ///
    /// Walks the tree bottom-up. A branch is kept when
    /// `error + alpha * terminals(children) < purity + alpha`, where `error`
    /// is the fraction of the points reaching the branch that its current
    /// output misclassifies; otherwise it is suppressed. Suppressed branches
    /// count as one terminal and are not revisited. Returns the number of
    /// effective terminals.
    pub fn prune(&mut self, signal: &DataSet, background: &DataSet, alpha: f64) -> Result<usize> {
        ensure!(
            alpha.is_finite(),
            ForestError::invalid_parameter("alpha", alpha.to_string(), "must be finite")
        );
        let num_features = validate_pair(signal, background)?;
        ensure!(
            num_features >= self.num_features || (signal.is_empty() && background.is_empty()),
            ForestError::dataset(format!(
                "corpora have {} features, tree needs {}",
                num_features, self.num_features
            ))
        );

        let mut terminals = vec![0usize; self.nodes.len()];
        let mut stack = vec![PruneFrame::Enter {
            node: 0,
            signal: (0..signal.len()).collect(),
            background: (0..background.len()).collect(),
        }];

        while let Some(frame) = stack.pop() {
            match frame {
                PruneFrame::Enter {
                    node,
                    signal: signal_idx,
                    background: background_idx,
                } => match self.nodes[node].active_split() {
                    None => terminals[node] = 1,
                    Some((split, low, high)) => {
                        let (signal_low, signal_high) =
                            signal.partition(&signal_idx, split.feature, split.threshold);
                        let (background_low, background_high) =
                            background.partition(&background_idx, split.feature, split.threshold);
                        stack.push(PruneFrame::Exit {
                            node,
                            signal: signal_idx,
                            background: background_idx,
                        });
                        stack.push(PruneFrame::Enter {
                            node: high,
                            signal: signal_high,
                            background: background_high,
                        });
                        stack.push(PruneFrame::Enter {
                            node: low,
                            signal: signal_low,
                            background: background_low,
                        });
                    }
                },
                PruneFrame::Exit {
                    node,
                    signal: signal_idx,
                    background: background_idx,
                } => {
                    let Some((low, high)) = self.nodes[node].children() else {
                        continue;
                    };
                    let subtree = terminals[low] + terminals[high];
                    let error =
                        self.error_fraction(node, signal, background, &signal_idx, &background_idx);
                    let cost = error + alpha * subtree as f64;
                    let budget = self.nodes[node].purity() + alpha;

                    if cost < budget {
                        terminals[node] = subtree;
                    } else {
                        self.nodes[node].set_suppressed(true);
                        terminals[node] = 1;
                    }
                }
            }
        }

        log::debug!(
            "Pruned tree with alpha {}: {} terminals, {} suppressed branches",
            alpha,
            terminals[0],
            self.num_suppressed()
        );
        Ok(terminals[0])
    }

    /// Fraction of the given points misclassified by the subtree at `node`.
    fn error_fraction(
        &self,
        node: NodeIndex,
        signal: &DataSet,
        background: &DataSet,
        signal_idx: &[usize],
        background_idx: &[usize],
    ) -> f64 {
        let total = signal_idx.len() + background_idx.len();
        if total == 0 {
            return 0.0;
        }

        let wrong_signal = signal_idx
            .iter()
            .filter(|&&i| !Class::from_purity(self.run_from(node, &signal.points()[i])).is_signal())
            .count();
        let wrong_background = background_idx
            .iter()
            .filter(|&&i| {
                Class::from_purity(self.run_from(node, &background.points()[i])).is_signal()
            })
            .count();

        (wrong_signal + wrong_background) as f64 / total as f64
    }

    /// Clears every suppression flag, restoring the fully grown tree.
    pub fn reset_suppression(&mut self) {
        for node in &mut self.nodes {
            node.set_suppressed(false);
        }
    }

    /// Suppression flag of every node in arena order (false for terminals).
    pub fn suppression_state(&self) -> Vec<bool> {
        self.nodes.iter().map(Node::is_suppressed).collect()
    }

    /// Returns the number of nodes in the arena, suppressed subtrees included.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Terminals reachable from the root, counting suppressed branches as one.
    pub fn num_terminals(&self) -> usize {
        self.effective_walk()
            .filter(|&(node, _)| self.nodes[node].is_effectively_terminal())
            .count()
    }

    /// Number of suppressed branches anywhere in the arena.
    pub fn num_suppressed(&self) -> usize {
        self.nodes.iter().filter(|node| node.is_suppressed()).count()
    }

    /// Longest root-to-terminal path in edges, honoring suppression.
    pub fn depth(&self) -> usize {
        self.effective_walk().map(|(_, depth)| depth).max().unwrap_or(0)
    }

    /// Training purity of the root.
    pub fn purity(&self) -> f64 {
        self.root().purity()
    }

    pub fn root(&self) -> &Node {
        &self.nodes[0]
    }

    pub fn node(&self, index: NodeIndex) -> Option<&Node> {
        self.nodes.get(index)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Minimum feature vector length needed to route a row.
    pub fn num_features(&self) -> usize {
        self.num_features
    }

    /// Number of active splits on each feature.
    pub fn feature_usage(&self) -> Array1<usize> {
        let mut usage = Array1::zeros(self.num_features);
        for (node, _) in self.effective_walk() {
            if let Some((split, _, _)) = self.nodes[node].active_split() {
                usage[split.feature] += 1;
            }
        }
        usage
    }

    /// Active splits in preorder.
    pub fn splits(&self) -> Vec<Split> {
        self.effective_walk()
            .filter_map(|(node, _)| self.nodes[node].active_split().map(|(split, _, _)| split))
            .collect()
    }

    /// Visits reachable nodes in preorder with their depth, stopping at
    /// suppressed branches.
    fn effective_walk(&self) -> impl Iterator<Item = (NodeIndex, usize)> + '_ {
        let mut stack = vec![(0, 0)];
        std::iter::from_fn(move || {
            let (node, depth) = stack.pop()?;
            if let Some((_, low, high)) = self.nodes[node].active_split() {
                stack.push((high, depth + 1));
                stack.push((low, depth + 1));
            }
            Some((node, depth))
        })
    }

    /// Writes the fully grown tree in the binary record format.
    pub fn export<W: Write>(&self, writer: &mut W) -> Result<()> {
        tree_format::write_tree(self, writer)
    }

    /// Reads a tree written by [`Tree::export`]; nothing is suppressed.
    pub fn import<R: Read>(reader: &mut R) -> Result<Tree> {
        tree_format::read_tree(reader)
    }

    /// Snapshot of the whole arena (suppression included) as JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let tree: Tree = serde_json::from_str(json)?;
        let num_features = tree.num_features;
        let mut checked = Self::from_nodes(tree.nodes)?;
        checked.num_features = checked.num_features.max(num_features);
        Ok(checked)
    }
}

impl Classifier for Tree {
    fn run_data_point<R: FeatureRow + ?Sized>(&self, row: &R) -> f64 {
        Tree::run_data_point(self, row)
    }

    fn num_features(&self) -> usize {
        Tree::num_features(self)
    }

    fn name(&self) -> &'static str {
        "tree"
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Tree ({} nodes, {} terminals, depth {}):",
            self.num_nodes(),
            self.num_terminals(),
            self.depth()
        )?;

        let mut stack = vec![(0, 0)];
        while let Some((node, depth)) = stack.pop() {
            writeln!(f, "{:indent$}{}", "", self.nodes[node], indent = depth * 2)?;
            if let Some((low, high)) = self.nodes[node].children() {
                stack.push((high, depth + 1));
                stack.push((low, depth + 1));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::DataPoint;
    use approx::assert_abs_diff_eq;

    fn corpus(rows: Vec<Vec<f64>>) -> DataSet {
        let names = (0..rows.first().map_or(1, Vec::len))
            .map(|i| format!("x{}", i))
            .collect();
        DataSet::from_points(names, rows.into_iter().map(DataPoint::new).collect()).unwrap()
    }

    fn separable() -> (DataSet, DataSet) {
        let signal = corpus((0..50).map(|i| vec![5.0, i as f64]).collect());
        let background = corpus((0..60).map(|k| vec![5.0, 100.0 - 0.5 * k as f64]).collect());
        (signal, background)
    }

    /// Hand-built tree: root splits x0 <= 0, its high child splits x0 <= 1.
    fn hand_built() -> Tree {
        let counts = |s, b| ClassCounts::new(s, b).unwrap();
        Tree::from_nodes(vec![
            Node::branch(counts(6, 4), Split::new(0, 0.0), 1, 2),
            Node::terminal(counts(4, 1)),
            Node::branch(counts(2, 3), Split::new(0, 1.0), 3, 4),
            Node::terminal(counts(2, 0)),
            Node::terminal(counts(0, 3)),
        ])
        .unwrap()
    }

    #[test]
    fn test_count_floor_keeps_single_terminal() {
        let signal = corpus(vec![vec![1.0], vec![2.0], vec![3.0]]);
        let background = corpus(vec![vec![10.0], vec![11.0], vec![12.0]]);
        let tree = Tree::train_with_defaults(&signal, &background).unwrap();

        assert_eq!(tree.num_nodes(), 1);
        assert!(tree.root().is_terminal());
        assert_abs_diff_eq!(tree.purity(), 0.5);
        assert_abs_diff_eq!(tree.run_data_point(&[2.0][..]), 0.5);
    }

    #[test]
    fn test_separable_data_trains_single_split() {
        let (signal, background) = separable();
        let tree = Tree::train_with_defaults(&signal, &background).unwrap();

        assert_eq!(tree.num_nodes(), 3);
        assert_eq!(tree.splits(), vec![Split::new(1, 49.0)]);
        for point in signal.points() {
            assert_abs_diff_eq!(tree.run_data_point(point), 1.0);
        }
        for point in background.points() {
            assert_abs_diff_eq!(tree.run_data_point(point), 0.0);
        }
        assert_eq!(tree.feature_usage().to_vec(), vec![0, 1]);
    }

    #[test]
    fn test_empty_training_data() {
        let signal = DataSet::new(vec!["x".to_string()]);
        let background = DataSet::new(vec!["x".to_string()]);
        let err = Tree::train_with_defaults(&signal, &background).unwrap_err();
        assert!(matches!(err, ForestError::EmptyTrainingData));
    }

    #[test]
    fn test_single_class_stays_terminal() {
        let signal = corpus((0..100).map(|i| vec![i as f64]).collect());
        let background = DataSet::new(vec!["x0".to_string()]);
        let tree = Tree::train_with_defaults(&signal, &background).unwrap();
        assert_eq!(tree.num_nodes(), 1);
        assert_abs_diff_eq!(tree.purity(), 1.0);
    }

    #[test]
    fn test_mismatched_feature_counts_fail_fast() {
        let signal = corpus(vec![vec![1.0, 2.0]]);
        let mut background = DataSet::new(vec!["x0".to_string(), "x1".to_string()]);
        background.add_data_point(DataPoint::new(vec![1.0]));
        let err = Tree::train_with_defaults(&signal, &background).unwrap_err();
        assert!(matches!(err, ForestError::FeatureCountMismatch { .. }));
    }

    #[test]
    fn test_mismatched_weights_fail() {
        let (signal, background) = separable();
        let weights = SampleWeights::uniform(1, 1);
        assert!(Tree::train(&signal, &background, &weights, SplitFinderConfig::default()).is_err());
    }

    #[test]
    fn test_prune_suppresses_bottom_up() {
        let mut tree = hand_built();
        let signal = corpus(vec![vec![-1.0], vec![0.5]]);
        let background = corpus(vec![vec![2.0]]);

        // Node 2: error 0, cost 0 + 0.5 * 2 = 1.0, budget 0.4 + 0.5 = 0.9.
        // Root then sees node 2 as a terminal with purity 0.4, misclassifies
        // the signal at 0.5, and pays 1/3 + 0.5 * 2 against 0.6 + 0.5.
        let terminals = tree.prune(&signal, &background, 0.5).unwrap();

        assert_eq!(terminals, 1);
        assert!(tree.nodes()[2].is_suppressed());
        assert!(tree.root().is_suppressed());
        assert_eq!(tree.suppression_state(), vec![true, false, true, false, false]);
        assert_eq!(tree.num_terminals(), 1);
    }

    #[test]
    fn test_prune_keeps_useful_split_and_is_idempotent() {
        let (signal, background) = separable();
        let mut tree = Tree::train_with_defaults(&signal, &background).unwrap();

        assert_eq!(tree.prune(&signal, &background, 0.01).unwrap(), 2);
        let state = tree.suppression_state();
        assert_eq!(tree.prune(&signal, &background, 0.01).unwrap(), 2);
        assert_eq!(tree.suppression_state(), state);
    }

    #[test]
    fn test_large_alpha_suppresses_root_and_reset_restores() {
        let (signal, background) = separable();
        let mut tree = Tree::train_with_defaults(&signal, &background).unwrap();
        let before: Vec<f64> = signal.points().iter().map(|p| tree.run_data_point(p)).collect();

        assert_eq!(tree.prune(&signal, &background, 1.0).unwrap(), 1);
        assert!(tree.root().is_suppressed());
        assert_eq!(tree.num_terminals(), 1);
        assert_eq!(tree.depth(), 0);
        assert_abs_diff_eq!(tree.run_data_point(signal.point(0).unwrap()), 50.0 / 110.0);

        tree.reset_suppression();
        assert_eq!(tree.num_suppressed(), 0);
        let after: Vec<f64> = signal.points().iter().map(|p| tree.run_data_point(p)).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_prune_on_empty_subsets() {
        let mut tree = hand_built();
        let signal = DataSet::new(vec!["x0".to_string()]);
        let background = DataSet::new(vec!["x0".to_string()]);
        // Zero error everywhere: branches survive while 2 * alpha < purity.
        assert_eq!(tree.prune(&signal, &background, 0.01).unwrap(), 3);
        assert_eq!(tree.num_suppressed(), 0);
    }

    #[test]
    fn test_prune_rejects_non_finite_alpha() {
        let mut tree = hand_built();
        let signal = DataSet::new(vec!["x0".to_string()]);
        assert!(tree.prune(&signal, &signal, f64::NAN).is_err());
    }

    #[test]
    fn test_from_nodes_rejects_bad_children() {
        let counts = ClassCounts::new(1, 1).unwrap();
        let nodes = vec![Node::branch(counts, Split::new(0, 0.0), 1, 1), Node::terminal(counts)];
        assert!(Tree::from_nodes(nodes).is_err());
        assert!(Tree::from_nodes(Vec::new()).is_err());
    }

    #[test]
    fn test_predict_batch() {
        let tree = hand_built();
        let rows = ndarray::array![[-1.0], [0.5], [3.0]];
        let predictions = tree.predict_batch(rows.view()).unwrap();
        assert_abs_diff_eq!(predictions[0], 0.8);
        assert_abs_diff_eq!(predictions[1], 1.0);
        assert_abs_diff_eq!(predictions[2], 0.0);

        let empty_cols = ndarray::Array2::<f64>::zeros((2, 0));
        assert!(tree.predict_batch(empty_cols.view()).is_err());
    }

    #[test]
    fn test_json_keeps_suppression() {
        let mut tree = hand_built();
        tree.nodes[2].set_suppressed(true);
        let restored = Tree::from_json(&tree.to_json().unwrap()).unwrap();
        assert_eq!(restored, tree);
    }

    #[test]
    fn test_display_lists_every_node() {
        let text = hand_built().to_string();
        assert!(text.starts_with("Tree (5 nodes, 3 terminals, depth 2)"));
        assert_eq!(text.lines().count(), 6);
    }
}
