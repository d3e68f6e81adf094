use canon_types::ContentHash;
use serde::{Deserialize, Serialize};

/// Which side of the running hash a proof sibling sits on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

/// Merkle root over `hashes`, in the order given.
///
/// Empty input yields the genesis hash and a single hash is its own root.
/// Parents are `sha256(left_hex + right_hex)`; the last node of an odd level
/// is paired with itself. Permuting the input changes the root.
pub fn compute_merkle_root(hashes: &[ContentHash]) -> ContentHash {
    MerkleTree::from_leaves(hashes.to_vec()).root()
}

/// Every level of a Merkle tree, kept so inclusion proofs can be cut from it.
#[derive(Clone, Debug)]
pub struct MerkleTree {
    root: ContentHash,
    /// Leaves first, root level last.
    levels: Vec<Vec<ContentHash>>,
}

impl MerkleTree {
    pub fn from_leaves(leaves: Vec<ContentHash>) -> Self {
        if leaves.is_empty() {
            return Self {
                root: ContentHash::genesis(),
                levels: vec![],
            };
        }

        let mut levels: Vec<Vec<ContentHash>> = vec![leaves];
        while let Some(current) = levels.last().filter(|level| level.len() > 1) {
            let next: Vec<ContentHash> = current
                .chunks(2)
                .map(|pair| hash_pair(&pair[0], pair.get(1).unwrap_or(&pair[0])))
                .collect();
            levels.push(next);
        }

        let root = levels
            .last()
            .and_then(|level| level.first())
            .cloned()
            .unwrap_or_else(ContentHash::genesis);
        Self { root, levels }
    }

    pub fn root(&self) -> ContentHash {
        self.root.clone()
    }

    pub fn leaf_count(&self) -> usize {
        self.levels.first().map_or(0, Vec::len)
    }

    /// Position of `leaf` among the leaves, if present.
    pub fn position(&self, leaf: &ContentHash) -> Option<usize> {
        self.levels.first()?.iter().position(|l| l == leaf)
    }

    /// Sibling path from the leaf at `index` up to the root.
    pub fn proof(&self, index: usize) -> Option<MerkleProof> {
        let leaves = self.levels.first()?;
        let leaf = leaves.get(index)?.clone();

        let mut path = Vec::new();
        let mut idx = index;

        for level in &self.levels[..self.levels.len() - 1] {
            let sibling_idx = if idx % 2 == 0 { idx + 1 } else { idx - 1 };
            // Odd level: the last node is paired with itself.
            let sibling = level.get(sibling_idx).unwrap_or(&level[idx]).clone();
            let side = if idx % 2 == 0 { Side::Right } else { Side::Left };
            path.push((sibling, side));
            idx /= 2;
        }

        Some(MerkleProof {
            leaf,
            path,
            root: self.root.clone(),
        })
    }
}

/// Evidence that one leaf hash is committed by a root.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    pub leaf: ContentHash,
    /// Siblings from the bottom level upwards.
    pub path: Vec<(ContentHash, Side)>,
    pub root: ContentHash,
}

impl MerkleProof {
    /// Fold the path over the leaf and compare with `root`.
    pub fn verify(&self) -> bool {
        let mut current = self.leaf.clone();
        for (sibling, side) in &self.path {
            current = match side {
                Side::Left => hash_pair(sibling, &current),
                Side::Right => hash_pair(&current, sibling),
            };
        }
        current == self.root
    }
}

fn hash_pair(left: &ContentHash, right: &ContentHash) -> ContentHash {
    let mut joined = String::with_capacity(128);
    joined.push_str(left.as_str());
    joined.push_str(right.as_str());
    ContentHash::of(joined.as_bytes())
}
