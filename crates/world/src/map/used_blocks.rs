/// Handle to a registration in [`UsedBlocks`]. Stale handles are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueHandle {
    slot: u32,
    generation: u32,
}

#[derive(Debug)]
struct QueueNode {
    block: usize,
    generation: u32,
    linked: bool,
    prev: Option<u32>,
    next: Option<u32>,
}

/// FIFO of resident block numbers in registration order, with O(1) removal
/// through handles.
#[derive(Debug, Default)]
pub(crate) struct UsedBlocks {
    nodes: Vec<QueueNode>,
    free: Vec<u32>,
    head: Option<u32>,
    tail: Option<u32>,
    len: usize,
}

impl UsedBlocks {
    pub(crate) fn push_back(&mut self, block: usize) -> QueueHandle {
        let slot = match self.free.pop() {
            Some(slot) => {
                let node = &mut self.nodes[slot as usize];
                node.block = block;
                node.linked = true;
                node.prev = self.tail;
                node.next = None;
                slot
            }
            None => {
                self.nodes.push(QueueNode {
                    block,
                    generation: 0,
                    linked: true,
                    prev: self.tail,
                    next: None,
                });
                (self.nodes.len() - 1) as u32
            }
        };

        match self.tail {
            Some(tail) => self.nodes[tail as usize].next = Some(slot),
            None => self.head = Some(slot),
        }
        self.tail = Some(slot);
        self.len += 1;

        QueueHandle {
            slot,
            generation: self.nodes[slot as usize].generation,
        }
    }

    pub(crate) fn remove(&mut self, handle: QueueHandle) -> bool {
        if !self.is_linked(handle) {
            return false;
        }

        let node = &mut self.nodes[handle.slot as usize];
        let (prev, next) = (node.prev, node.next);
        node.linked = false;
        node.prev = None;
        node.next = None;
        node.generation = node.generation.wrapping_add(1);

        match prev {
            Some(prev) => self.nodes[prev as usize].next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => self.nodes[next as usize].prev = prev,
            None => self.tail = prev,
        }

        self.free.push(handle.slot);
        self.len -= 1;
        true
    }

    pub(crate) fn is_linked(&self, handle: QueueHandle) -> bool {
        self.nodes
            .get(handle.slot as usize)
            .is_some_and(|node| node.linked && node.generation == handle.generation)
    }

    pub(crate) fn front(&self) -> Option<QueueHandle> {
        self.head.map(|slot| self.handle_of(slot))
    }

    pub(crate) fn next(&self, handle: QueueHandle) -> Option<QueueHandle> {
        if !self.is_linked(handle) {
            return None;
        }
        self.nodes[handle.slot as usize]
            .next
            .map(|slot| self.handle_of(slot))
    }

    pub(crate) fn block(&self, handle: QueueHandle) -> Option<usize> {
        self.is_linked(handle)
            .then(|| self.nodes[handle.slot as usize].block)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        let mut cursor = self.head;
        std::iter::from_fn(move || {
            let node = &self.nodes[cursor? as usize];
            cursor = node.next;
            Some(node.block)
        })
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
        self.len = 0;
    }

    fn handle_of(&self, slot: u32) -> QueueHandle {
        QueueHandle {
            slot,
            generation: self.nodes[slot as usize].generation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_registration_order() {
        let mut queue = UsedBlocks::default();
        for block in [7, 3, 9] {
            queue.push_back(block);
        }
        assert_eq!(queue.iter().collect::<Vec<_>>(), vec![7, 3, 9]);
        assert_eq!(queue.len(), 3);
    }

    #[test]
    fn removal_from_middle_and_ends_relinks() {
        let mut queue = UsedBlocks::default();
        let a = queue.push_back(1);
        let b = queue.push_back(2);
        let c = queue.push_back(3);

        assert!(queue.remove(b));
        assert_eq!(queue.iter().collect::<Vec<_>>(), vec![1, 3]);
        assert!(queue.remove(a));
        assert!(queue.remove(c));
        assert_eq!(queue.len(), 0);
        assert!(queue.front().is_none());
    }

    #[test]
    fn stale_handle_does_not_remove_reused_slot() {
        let mut queue = UsedBlocks::default();
        let old = queue.push_back(1);
        assert!(queue.remove(old));
        let fresh = queue.push_back(2);

        assert!(!queue.remove(old));
        assert!(queue.is_linked(fresh));
        assert_eq!(queue.iter().collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn next_survives_removal_of_current() {
        let mut queue = UsedBlocks::default();
        let a = queue.push_back(10);
        queue.push_back(20);

        let next = queue.next(a).expect("next");
        assert!(queue.remove(a));
        assert_eq!(queue.block(next), Some(20));
        assert_eq!(queue.front(), Some(next));
    }
}
