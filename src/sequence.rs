//! Playback order for the playlist.
//!
//! A doubly-linked list whose nodes live in a slot arena. Links are slot
//! indices, and callers hold [`NodeId`] handles that pair a slot with a stamp
//! that is never reused, so a handle to a removed node (or to anything from
//! before a [`OrderedSequence::clear`]) resolves to nothing instead of
//! aliasing whatever now occupies the slot.

use crate::model::{Direction, Song};
use rand::RngExt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    slot: u32,
    stamp: u64,
}

#[derive(Debug)]
struct Node {
    stamp: u64,
    song: Song,
    prev: Option<u32>,
    next: Option<u32>,
}

#[derive(Debug, Default)]
pub struct OrderedSequence {
    slots: Vec<Option<Node>>,
    free: Vec<u32>,
    head: Option<u32>,
    tail: Option<u32>,
    len: usize,
    next_stamp: u64,
}

impl OrderedSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    pub fn get(&self, id: NodeId) -> Option<&Song> {
        self.node(id).map(|node| &node.song)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Song> {
        self.node_mut(id).map(|node| &mut node.song)
    }

    pub fn front(&self) -> Option<NodeId> {
        self.head.map(|slot| self.id_at(slot))
    }

    pub fn back(&self) -> Option<NodeId> {
        self.tail.map(|slot| self.id_at(slot))
    }

    /// Appends at the tail and returns the new node's handle.
    pub fn push_back(&mut self, song: Song) -> NodeId {
        let stamp = self.next_stamp;
        self.next_stamp += 1;

        let node = Node {
            stamp,
            song,
            prev: self.tail,
            next: None,
        };
        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot as usize] = Some(node);
                slot
            }
            None => {
                self.slots.push(Some(node));
                (self.slots.len() - 1) as u32
            }
        };

        match self.tail {
            Some(tail) => {
                if let Some(tail_node) = self.slots[tail as usize].as_mut() {
                    tail_node.next = Some(slot);
                }
            }
            None => self.head = Some(slot),
        }
        self.tail = Some(slot);
        self.len += 1;
        NodeId { slot, stamp }
    }

    /// Unlinks the node and hands back its song. A detached handle is a no-op.
    pub fn remove(&mut self, id: NodeId) -> Option<Song> {
        let (prev, next) = {
            let node = self.node(id)?;
            (node.prev, node.next)
        };

        match prev {
            Some(prev) => {
                if let Some(prev_node) = self.slots[prev as usize].as_mut() {
                    prev_node.next = next;
                }
            }
            None => self.head = next,
        }
        match next {
            Some(next) => {
                if let Some(next_node) = self.slots[next as usize].as_mut() {
                    next_node.prev = prev;
                }
            }
            None => self.tail = prev,
        }

        let node = self.slots[id.slot as usize].take()?;
        self.free.push(id.slot);
        self.len -= 1;
        Some(node.song)
    }

    /// Linear-scan removal of the first song matching `predicate`.
    pub fn remove_where(&mut self, mut predicate: impl FnMut(&Song) -> bool) -> Option<Song> {
        let id = self
            .iter()
            .find(|(_, song)| predicate(song))
            .map(|(id, _)| id)?;
        self.remove(id)
    }

    /// Wrapping neighbor of `id`. `None` when the sequence is empty or the
    /// handle is detached.
    pub fn neighbor(&self, id: NodeId, direction: Direction) -> Option<NodeId> {
        let node = self.node(id)?;
        let slot = match direction {
            Direction::Next => node.next.or(self.head),
            Direction::Prev => node.prev.or(self.tail),
        }?;
        Some(self.id_at(slot))
    }

    /// Non-wrapping successor.
    pub fn next_of(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.next.map(|slot| self.id_at(slot))
    }

    /// Non-wrapping predecessor.
    pub fn prev_of(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.prev.map(|slot| self.id_at(slot))
    }

    /// Drops every node. Handles issued before the call never resolve again.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
        self.len = 0;
    }

    pub fn to_vec(&self) -> Vec<Song> {
        self.iter().map(|(_, song)| song.clone()).collect()
    }

    pub fn ids(&self) -> Vec<NodeId> {
        self.iter().map(|(id, _)| id).collect()
    }

    pub fn random_node<R: RngExt>(&self, rng: &mut R) -> Option<NodeId> {
        let ids = self.ids();
        if ids.is_empty() {
            return None;
        }
        ids.get(rng.random_range(0..ids.len())).copied()
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter {
            sequence: self,
            cursor: self.head,
            remaining: self.len,
            reverse: false,
        }
    }

    pub fn iter_rev(&self) -> Iter<'_> {
        Iter {
            sequence: self,
            cursor: self.tail,
            remaining: self.len,
            reverse: true,
        }
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.slot as usize)?
            .as_ref()
            .filter(|node| node.stamp == id.stamp)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.slot as usize)?
            .as_mut()
            .filter(|node| node.stamp == id.stamp)
    }

    fn id_at(&self, slot: u32) -> NodeId {
        let stamp = self.slots[slot as usize]
            .as_ref()
            .map(|node| node.stamp)
            .unwrap_or(u64::MAX);
        NodeId { slot, stamp }
    }
}

pub struct Iter<'a> {
    sequence: &'a OrderedSequence,
    cursor: Option<u32>,
    remaining: usize,
    reverse: bool,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (NodeId, &'a Song);

    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.cursor?;
        let node = self.sequence.slots.get(slot as usize)?.as_ref()?;
        self.cursor = if self.reverse { node.prev } else { node.next };
        self.remaining = self.remaining.saturating_sub(1);
        Some((
            NodeId {
                slot,
                stamp: node.stamp,
            },
            &node.song,
        ))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}
