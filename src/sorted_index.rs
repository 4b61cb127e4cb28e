//! Display-order index over the playlist.
//!
//! An unbalanced binary search tree of sequence handles keyed by a
//! [`KeySelector`]. Keys that compare equal descend right, so every node
//! satisfies `left < node <= right`. Depth is `O(n)` when songs arrive already
//! sorted by the selected field; playlists are small enough that this is
//! accepted.
//!
//! The tree caches each song's key at insertion time. When a song is edited
//! in a way that changes its key, or the selector changes, the owner rebuilds
//! the whole tree with [`SortedIndex::rebuild`].

use crate::model::{SortField, Song, TitleSortPolicy};
use crate::sequence::NodeId;
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortKey {
    Number(i64),
    Text(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeySelector {
    pub field: SortField,
    pub title_policy: TitleSortPolicy,
}

impl KeySelector {
    pub fn new(field: SortField, title_policy: TitleSortPolicy) -> Self {
        Self {
            field,
            title_policy,
        }
    }

    pub fn key(&self, song: &Song) -> SortKey {
        match self.field {
            SortField::AddedAt => SortKey::Number(song.added_at_ms),
            SortField::Artist => SortKey::Text(song.artist.to_lowercase()),
            SortField::Title => match self.title_policy {
                TitleSortPolicy::Full => SortKey::Text(song.title.to_lowercase()),
                TitleSortPolicy::FirstLetter => SortKey::Text(
                    song.title
                        .chars()
                        .next()
                        .map(|ch| ch.to_lowercase().collect())
                        .unwrap_or_default(),
                ),
            },
        }
    }
}

impl Default for KeySelector {
    fn default() -> Self {
        Self::new(SortField::Title, TitleSortPolicy::Full)
    }
}

#[derive(Debug)]
struct TreeNode {
    key: SortKey,
    id: NodeId,
    left: Option<Box<TreeNode>>,
    right: Option<Box<TreeNode>>,
}

#[derive(Debug, Default)]
pub struct SortedIndex {
    root: Option<Box<TreeNode>>,
    selector: KeySelector,
    len: usize,
}

impl SortedIndex {
    pub fn new(selector: KeySelector) -> Self {
        Self {
            root: None,
            selector,
            len: 0,
        }
    }

    pub fn selector(&self) -> KeySelector {
        self.selector
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn key_for(&self, song: &Song) -> SortKey {
        self.selector.key(song)
    }

    pub fn insert(&mut self, id: NodeId, song: &Song) {
        let key = self.selector.key(song);
        let mut slot = &mut self.root;
        loop {
            match slot {
                Some(node) => {
                    slot = if key < node.key {
                        &mut node.left
                    } else {
                        &mut node.right
                    };
                }
                None => {
                    *slot = Some(Box::new(TreeNode {
                        key,
                        id,
                        left: None,
                        right: None,
                    }));
                    self.len += 1;
                    return;
                }
            }
        }
    }

    /// Removes one node whose key equals `key`, the first met on the search
    /// path.
    pub fn delete(&mut self, key: &SortKey) -> Option<NodeId> {
        let mut removed = None;
        self.root = delete_node(self.root.take(), key, None, &mut removed);
        if removed.is_some() {
            self.len -= 1;
        }
        removed
    }

    /// Removes the node holding `id` under `key`. Needed when several songs
    /// share a key and a specific one has to go.
    pub fn remove_entry(&mut self, key: &SortKey, id: NodeId) -> bool {
        let mut removed = None;
        self.root = delete_node(self.root.take(), key, Some(id), &mut removed);
        if removed.is_some() {
            self.len -= 1;
        }
        removed.is_some()
    }

    pub fn search(&self, key: &SortKey) -> Option<NodeId> {
        let mut cursor = self.root.as_deref();
        while let Some(node) = cursor {
            cursor = match key.cmp(&node.key) {
                Ordering::Less => node.left.as_deref(),
                Ordering::Greater => node.right.as_deref(),
                Ordering::Equal => return Some(node.id),
            };
        }
        None
    }

    pub fn in_order(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.len);
        let mut stack: Vec<&TreeNode> = Vec::new();
        let mut cursor = self.root.as_deref();
        while cursor.is_some() || !stack.is_empty() {
            while let Some(node) = cursor {
                stack.push(node);
                cursor = node.left.as_deref();
            }
            if let Some(node) = stack.pop() {
                out.push(node.id);
                cursor = node.right.as_deref();
            }
        }
        out
    }

    pub fn clear(&mut self) {
        self.root = None;
        self.len = 0;
    }

    /// Discards the tree and inserts every song again, optionally under a new
    /// selector.
    pub fn rebuild<'a>(
        &mut self,
        selector: KeySelector,
        songs: impl IntoIterator<Item = (NodeId, &'a Song)>,
    ) {
        self.clear();
        self.selector = selector;
        for (id, song) in songs {
            self.insert(id, song);
        }
    }

    pub fn height(&self) -> usize {
        let mut deepest = 0;
        let mut stack: Vec<(&TreeNode, usize)> = Vec::new();
        if let Some(root) = self.root.as_deref() {
            stack.push((root, 1));
        }
        while let Some((node, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            if let Some(left) = node.left.as_deref() {
                stack.push((left, depth + 1));
            }
            if let Some(right) = node.right.as_deref() {
                stack.push((right, depth + 1));
            }
        }
        deepest
    }
}

fn delete_node(
    node: Option<Box<TreeNode>>,
    key: &SortKey,
    target: Option<NodeId>,
    removed: &mut Option<NodeId>,
) -> Option<Box<TreeNode>> {
    let mut node = node?;
    match key.cmp(&node.key) {
        Ordering::Less => {
            node.left = delete_node(node.left.take(), key, target, removed);
            Some(node)
        }
        Ordering::Greater => {
            node.right = delete_node(node.right.take(), key, target, removed);
            Some(node)
        }
        Ordering::Equal if target.is_some_and(|id| id != node.id) => {
            node.right = delete_node(node.right.take(), key, target, removed);
            Some(node)
        }
        Ordering::Equal => {
            *removed = Some(node.id);
            match (node.left.take(), node.right.take()) {
                (None, None) => None,
                (Some(left), None) => Some(left),
                (None, Some(right)) => Some(right),
                (Some(left), Some(right)) => {
                    let (rest, mut successor) = take_min(right);
                    successor.left = Some(left);
                    successor.right = rest;
                    Some(successor)
                }
            }
        }
    }
}

/// Detaches the minimum node of a subtree, returning what remains and the
/// detached node.
fn take_min(mut node: Box<TreeNode>) -> (Option<Box<TreeNode>>, Box<TreeNode>) {
    match node.left.take() {
        None => {
            let rest = node.right.take();
            (rest, node)
        }
        Some(left) => {
            let (rest, min) = take_min(left);
            node.left = rest;
            (Some(node), min)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::OrderedSequence;

    fn build(titles: &[&str]) -> (OrderedSequence, SortedIndex) {
        let mut sequence = OrderedSequence::new();
        for title in titles {
            sequence.push_back(Song::new(*title, "artist"));
        }
        let mut index = SortedIndex::new(KeySelector::default());
        index.rebuild(KeySelector::default(), sequence.iter());
        (sequence, index)
    }

    fn sorted_titles(sequence: &OrderedSequence, index: &SortedIndex) -> Vec<String> {
        index
            .in_order()
            .into_iter()
            .filter_map(|id| sequence.get(id))
            .map(|song| song.title.clone())
            .collect()
    }

    fn text(value: &str) -> SortKey {
        SortKey::Text(value.to_string())
    }

    #[test]
    fn in_order_is_ascending() {
        let (sequence, index) = build(&["mike", "alpha", "zulu", "echo"]);
        assert_eq!(
            sorted_titles(&sequence, &index),
            vec!["alpha", "echo", "mike", "zulu"]
        );
        assert_eq!(index.len(), 4);
    }

    #[test]
    fn equal_keys_keep_insertion_order() {
        let mut sequence = OrderedSequence::new();
        let first = sequence.push_back(Song::new("same", "a"));
        let second = sequence.push_back(Song::new("same", "b"));
        let mut index = SortedIndex::new(KeySelector::default());
        index.rebuild(KeySelector::default(), sequence.iter());
        assert_eq!(index.in_order(), vec![first, second]);
    }

    #[test]
    fn delete_handles_leaf_single_child_and_two_children() {
        let (sequence, mut index) = build(&["m", "f", "t", "a", "h", "z"]);
        assert!(index.delete(&text("a")).is_some());
        assert!(index.delete(&text("t")).is_some());
        assert!(index.delete(&text("m")).is_some());
        assert_eq!(sorted_titles(&sequence, &index), vec!["f", "h", "z"]);
        assert_eq!(index.len(), 3);
        assert!(index.delete(&text("missing")).is_none());
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn remove_entry_picks_the_right_duplicate() {
        let mut sequence = OrderedSequence::new();
        let a = sequence.push_back(Song::new("dup", "a"));
        let b = sequence.push_back(Song::new("dup", "b"));
        let c = sequence.push_back(Song::new("dup", "c"));
        let mut index = SortedIndex::new(KeySelector::default());
        index.rebuild(KeySelector::default(), sequence.iter());

        assert!(index.remove_entry(&text("dup"), b));
        assert_eq!(index.in_order(), vec![a, c]);
        assert!(!index.remove_entry(&text("dup"), b));
    }

    #[test]
    fn search_finds_exact_keys_only() {
        let (sequence, index) = build(&["beta", "alpha", "gamma"]);
        let hit = index.search(&text("gamma")).expect("hit");
        assert_eq!(sequence.get(hit).map(|song| song.title.as_str()), Some("gamma"));
        assert_eq!(index.search(&text("gam")), None);
    }

    #[test]
    fn sorted_input_degenerates_into_a_chain() {
        let (_, index) = build(&["a", "b", "c", "d", "e"]);
        assert_eq!(index.height(), 5);
    }

    #[test]
    fn first_letter_policy_buckets_titles() {
        let selector = KeySelector::new(SortField::Title, TitleSortPolicy::FirstLetter);
        assert_eq!(selector.key(&Song::new("Apple", "x")), text("a"));
        assert_eq!(selector.key(&Song::new("avocado", "y")), text("a"));
        assert_eq!(selector.key(&Song::new("", "y")), text(""));
    }

    proptest::proptest! {
        #[test]
        fn tree_matches_sorted_multiset_after_deletes(
            titles in proptest::collection::vec("[a-e]{1,2}", 1..40),
            deletes in proptest::collection::vec(0usize..40, 0..20),
        ) {
            let mut sequence = OrderedSequence::new();
            let ids: Vec<NodeId> = titles
                .iter()
                .map(|title| sequence.push_back(Song::new(title.clone(), "artist")))
                .collect();
            let mut index = SortedIndex::new(KeySelector::default());
            index.rebuild(KeySelector::default(), sequence.iter());

            let mut alive = ids.clone();
            for pick in deletes {
                if alive.is_empty() {
                    break;
                }
                let id = alive.remove(pick % alive.len());
                let key = sequence.get(id).map(|song| index.key_for(song)).expect("song");
                proptest::prop_assert!(index.remove_entry(&key, id));
            }

            let mut expected: Vec<String> = alive
                .iter()
                .filter_map(|id| sequence.get(*id))
                .map(|song| song.title.clone())
                .collect();
            expected.sort();
            let actual: Vec<String> = index
                .in_order()
                .into_iter()
                .filter_map(|id| sequence.get(id))
                .map(|song| song.title.clone())
                .collect();
            proptest::prop_assert_eq!(actual, expected);
            proptest::prop_assert_eq!(index.len(), alive.len());
        }
    }
}
