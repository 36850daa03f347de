//! Model files for trees and forests.
//!
//! A forest file starts with the member count as a little-endian `i32`,
//! followed by each member's `f64` vote weight and its tree in the format of
//! [`tree_format`](crate::io::tree_format).

use crate::boosting::{Forest, ForestMember};
use crate::core::error::{ForestError, Result};
use crate::io::tree_format::{read_tree, write_tree};
use crate::serialization_error;
use crate::tree::Tree;
use bincode::Options;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

fn header_options() -> impl Options + Copy {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
}

/// Writes every member of `forest`.
pub fn write_forest<W: Write>(forest: &Forest, writer: &mut W) -> Result<()> {
    let options = header_options();
    let count = i32::try_from(forest.len())
        .map_err(|_| serialization_error!("{} trees do not fit in i32", forest.len()))?;
    options.serialize_into(&mut *writer, &count)?;
    for member in forest.members() {
        options.serialize_into(&mut *writer, &member.weight)?;
        write_tree(&member.tree, writer)?;
    }
    Ok(())
}

/// Reads a forest written by [`write_forest`].
pub fn read_forest<R: Read>(reader: &mut R) -> Result<Forest> {
    let options = header_options();
    let count: i32 = options
        .deserialize_from(&mut *reader)
        .map_err(|e| serialization_error!("cannot read tree count: {}", e))?;
    let count = usize::try_from(count)
        .map_err(|_| serialization_error!("negative tree count {}", count))?;

    let mut members = Vec::with_capacity(count.min(1024));
    for index in 0..count {
        let weight: f64 = options
            .deserialize_from(&mut *reader)
            .map_err(|e| serialization_error!("cannot read weight of tree {}: {}", index, e))?;
        let tree = read_tree(reader)?;
        members.push(ForestMember { tree, weight });
    }
    Ok(Forest::from_members(members))
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).map_err(|e| {
        ForestError::serialization(format!("cannot create {}: {}", path.display(), e))
    })?;
    Ok(BufWriter::new(file))
}

fn open(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).map_err(|e| {
        ForestError::serialization(format!("cannot open {}: {}", path.display(), e))
    })?;
    Ok(BufReader::new(file))
}

pub fn save_tree<P: AsRef<Path>>(tree: &Tree, path: P) -> Result<()> {
    let mut writer = create(path.as_ref())?;
    write_tree(tree, &mut writer)?;
    writer.flush()?;
    log::info!("Saved tree ({} nodes) to {}", tree.num_nodes(), path.as_ref().display());
    Ok(())
}

pub fn load_tree<P: AsRef<Path>>(path: P) -> Result<Tree> {
    read_tree(&mut open(path.as_ref())?)
}

pub fn save_forest<P: AsRef<Path>>(forest: &Forest, path: P) -> Result<()> {
    let mut writer = create(path.as_ref())?;
    write_forest(forest, &mut writer)?;
    writer.flush()?;
    log::info!("Saved forest ({} trees) to {}", forest.len(), path.as_ref().display());
    Ok(())
}

pub fn load_forest<P: AsRef<Path>>(path: P) -> Result<Forest> {
    let forest = read_forest(&mut open(path.as_ref())?)?;
    log::info!("Loaded forest ({} trees) from {}", forest.len(), path.as_ref().display());
    Ok(forest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{ClassCounts, Node, Split};
    use tempfile::TempDir;

    fn stump_tree(threshold: f64) -> Tree {
        let counts = |s, b| ClassCounts::new(s, b).unwrap();
        Tree::from_nodes(vec![
            Node::branch(counts(3, 3), Split::new(0, threshold), 1, 2),
            Node::terminal(counts(3, 1)),
            Node::terminal(counts(0, 2)),
        ])
        .unwrap()
    }

    fn forest() -> Forest {
        Forest::from_members(vec![
            ForestMember {
                tree: stump_tree(0.5),
                weight: 0.75,
            },
            ForestMember {
                tree: stump_tree(-1.0),
                weight: -0.25,
            },
        ])
    }

    #[test]
    fn test_forest_layout() {
        let mut bytes = Vec::new();
        write_forest(&forest(), &mut bytes).unwrap();
        assert_eq!(&bytes[0..4], &2i32.to_le_bytes());
        assert_eq!(&bytes[4..12], &0.75f64.to_le_bytes());
        assert_eq!(bytes.len(), 4 + 2 * (8 + 3 * crate::io::tree_format::NODE_RECORD_SIZE));
    }

    #[test]
    fn test_forest_round_trip() {
        let original = forest();
        let mut bytes = Vec::new();
        write_forest(&original, &mut bytes).unwrap();
        let restored = read_forest(&mut bytes.as_slice()).unwrap();

        assert_eq!(restored.members(), original.members());
        for x in [-2.0, 0.0, 1.0] {
            assert_eq!(restored.run_data_point(&[x][..]), original.run_data_point(&[x][..]));
        }
    }

    #[test]
    fn test_rejects_negative_count_and_truncation() {
        let negative = (-1i32).to_le_bytes();
        assert!(read_forest(&mut &negative[..]).is_err());

        let mut bytes = Vec::new();
        write_forest(&forest(), &mut bytes).unwrap();
        bytes.truncate(bytes.len() - 1);
        assert!(read_forest(&mut bytes.as_slice()).is_err());
    }

    #[test]
    fn test_files() {
        let dir = TempDir::new().unwrap();
        let tree_path = dir.path().join("tree.bin");
        let forest_path = dir.path().join("forest.bin");

        save_tree(&stump_tree(0.5), &tree_path).unwrap();
        assert_eq!(load_tree(&tree_path).unwrap(), stump_tree(0.5));

        save_forest(&forest(), &forest_path).unwrap();
        assert_eq!(load_forest(&forest_path).unwrap().len(), 2);

        assert!(load_forest(dir.path().join("missing.bin")).is_err());
    }
}
