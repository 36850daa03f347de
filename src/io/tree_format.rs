//! Binary tree format.
//!
//! A tree is written as a preorder stream of fixed-size records with no
//! header:
//!
//! | field            | type          |
//! |------------------|---------------|
//! | feature index    | `i32`         |
//! | threshold        | `f64`         |
//! | signal count     | `i32`         |
//! | background count | `i32`         |
//! | is terminal      | `bool` (1 B)  |
//!
//! All values are little-endian. A branch record is followed by its low
//! subtree and then its high subtree. Terminal records carry feature `-1`
//! and threshold `0.0`. Suppression flags are not stored, so a tree read
//! back is always fully grown.

use crate::core::constants::TERMINAL_FEATURE_INDEX;
use crate::core::error::{ForestError, Result};
use crate::core::types::NodeIndex;
use crate::serialization_error;
use crate::tree::{ClassCounts, Node, NodeKind, Split, Tree};
use bincode::Options;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

/// One node on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct NodeRecord(i32, f64, i32, i32, bool);

/// Size of one encoded record in bytes.
pub const NODE_RECORD_SIZE: usize = 4 + 8 + 4 + 4 + 1;

fn record_options() -> impl Options + Copy {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
}

fn to_i32(value: usize, what: &str) -> Result<i32> {
    i32::try_from(value).map_err(|_| serialization_error!("{} {} does not fit in i32", what, value))
}

impl NodeRecord {
    fn from_node(node: &Node) -> Result<Self> {
        let signal = to_i32(node.counts.signal() as usize, "signal count")?;
        let background = to_i32(node.counts.background() as usize, "background count")?;
        Ok(match node.kind {
            NodeKind::Terminal => {
                NodeRecord(TERMINAL_FEATURE_INDEX, 0.0, signal, background, true)
            }
            NodeKind::Branch { split, .. } => NodeRecord(
                to_i32(split.feature, "feature index")?,
                split.threshold,
                signal,
                background,
                false,
            ),
        })
    }

    fn into_node(self, position: usize) -> Result<Node> {
        let NodeRecord(feature, threshold, signal, background, terminal) = self;
        let signal = u32::try_from(signal).map_err(|_| {
            serialization_error!("record {} has negative signal count {}", position, signal)
        })?;
        let background = u32::try_from(background).map_err(|_| {
            serialization_error!(
                "record {} has negative background count {}",
                position,
                background
            )
        })?;
        let counts = ClassCounts::new(signal, background)
            .ok_or_else(|| serialization_error!("record {} has no training points", position))?;

        if terminal {
            return Ok(Node::terminal(counts));
        }

        let feature = usize::try_from(feature).map_err(|_| {
            serialization_error!("branch record {} has feature index {}", position, feature)
        })?;
        // Children are linked once their records are read.
        Ok(Node::branch(counts, Split::new(feature, threshold), 0, 0))
    }
}

/// Writes `tree` in preorder, including suppressed subtrees.
pub fn write_tree<W: Write>(tree: &Tree, writer: &mut W) -> Result<()> {
    let options = record_options();
    let mut stack = vec![0];
    while let Some(index) = stack.pop() {
        let node = &tree.nodes()[index];
        options.serialize_into(&mut *writer, &NodeRecord::from_node(node)?)?;
        if let Some((low, high)) = node.children() {
            stack.push(high);
            stack.push(low);
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy)]
enum Side {
    Low,
    High,
}

/// Reads one tree, consuming exactly its records from `reader`.
pub fn read_tree<R: Read>(reader: &mut R) -> Result<Tree> {
    let options = record_options();
    let mut nodes: Vec<Node> = Vec::new();
    // Slots still waiting for a record, as (parent, side); `None` is the root.
    let mut pending: Vec<Option<(NodeIndex, Side)>> = vec![None];

    while let Some(slot) = pending.pop() {
        let position = nodes.len();
        let record: NodeRecord = options
            .deserialize_from(&mut *reader)
            .map_err(|e| serialization_error!("cannot read node record {}: {}", position, e))?;
        let node = record.into_node(position)?;
        let is_branch = !node.is_terminal();
        nodes.push(node);

        if let Some((parent, side)) = slot {
            if let NodeKind::Branch { low, high, .. } = &mut nodes[parent].kind {
                match side {
                    Side::Low => *low = position,
                    Side::High => *high = position,
                }
            }
        }

        if is_branch {
            pending.push(Some((position, Side::High)));
            pending.push(Some((position, Side::Low)));
        }
    }

    Tree::from_nodes(nodes)
}

/// Encodes a tree into a byte vector.
pub fn tree_to_bytes(tree: &Tree) -> Result<Vec<u8>> {
    let mut bytes = Vec::with_capacity(tree.num_nodes() * NODE_RECORD_SIZE);
    write_tree(tree, &mut bytes)?;
    Ok(bytes)
}

/// Decodes a tree and rejects trailing bytes.
pub fn tree_from_bytes(bytes: &[u8]) -> Result<Tree> {
    let mut cursor = bytes;
    let tree = read_tree(&mut cursor)?;
    if !cursor.is_empty() {
        return Err(ForestError::serialization(format!(
            "{} trailing bytes after tree",
            cursor.len()
        )));
    }
    Ok(tree)
}
