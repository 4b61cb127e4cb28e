/// Ring-buffer FIFO used for the up-next schedule and play history.
///
/// Without a limit the buffer doubles when full. With a limit, pushing onto a
/// full queue evicts the oldest entry.
#[derive(Debug, Clone)]
pub struct BoundedQueue<T> {
    items: Vec<Option<T>>,
    head: usize,
    len: usize,
    limit: Option<usize>,
}

const INITIAL_CAPACITY: usize = 16;

impl<T> Default for BoundedQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> BoundedQueue<T> {
    pub fn new() -> Self {
        Self::with_capacity(INITIAL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: empty_slots(capacity.max(1)),
            head: 0,
            len: 0,
            limit: None,
        }
    }

    pub fn bounded(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            items: empty_slots(limit),
            head: 0,
            len: 0,
            limit: Some(limit),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.items.len()
    }

    /// Pushes at the back. Returns the evicted front entry when a bounded
    /// queue was already full.
    pub fn enqueue(&mut self, item: T) -> Option<T> {
        let mut evicted = None;
        if self.len == self.items.len() {
            match self.limit {
                Some(_) => evicted = self.dequeue(),
                None => self.resize(self.items.len() * 2),
            }
        }
        let tail = (self.head + self.len) % self.items.len();
        self.items[tail] = Some(item);
        self.len += 1;
        evicted
    }

    pub fn dequeue(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        let item = self.items[self.head].take();
        self.head = (self.head + 1) % self.items.len();
        self.len -= 1;
        item
    }

    pub fn front(&self) -> Option<&T> {
        if self.len == 0 {
            return None;
        }
        self.items[self.head].as_ref()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        (0..self.len).filter_map(move |offset| {
            self.items[(self.head + offset) % self.items.len()].as_ref()
        })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.items.iter_mut().filter_map(Option::as_mut)
    }

    pub fn clear(&mut self) {
        for slot in &mut self.items {
            *slot = None;
        }
        self.head = 0;
        self.len = 0;
    }

    /// Keeps only entries matching `keep`, preserving order.
    pub fn retain(&mut self, mut keep: impl FnMut(&T) -> bool) {
        let mut kept = Vec::with_capacity(self.len);
        while let Some(item) = self.dequeue() {
            if keep(&item) {
                kept.push(item);
            }
        }
        self.head = 0;
        for item in kept {
            self.enqueue(item);
        }
    }

    fn resize(&mut self, capacity: usize) {
        let mut items = empty_slots(capacity);
        for (offset, slot) in items.iter_mut().enumerate().take(self.len) {
            let index = (self.head + offset) % self.items.len();
            *slot = self.items[index].take();
        }
        self.items = items;
        self.head = 0;
    }
}

impl<T: Clone> BoundedQueue<T> {
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }
}

fn empty_slots<T>(capacity: usize) -> Vec<Option<T>> {
    std::iter::repeat_with(|| None).take(capacity).collect()
}
