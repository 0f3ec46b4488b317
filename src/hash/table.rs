// Landmark table for origin-block lookup.
//
// Two flat arrays:
//   - `landmark[bucket]`: most recently indexed block whose hash falls in
//     `bucket`
//   - `collide[block]`: the block indexed into the same bucket before it
//
// Together they form singly-linked chains, most-recent first, without any
// per-bucket allocation.  Entries are stored as `block + CKOFFSET` so that a
// stored 0 means "empty" and the arrays can be reset with a plain fill.

/// Offset added to stored block indices; 0 marks an empty slot.
const CKOFFSET: u32 = 1;

/// Hash-bucket arena built from one origin.
///
/// `reset` reuses the existing allocation, so one table can index many
/// origins in turn.
#[derive(Debug, Clone, Default)]
pub struct LandmarkTable {
    landmark: Vec<u32>,
    collide: Vec<u32>,
}

impl LandmarkTable {
    /// Empty table.  Call [`reset`](Self::reset) before inserting.
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepare for an origin with `n_blocks` indexed blocks.
    ///
    /// The bucket count equals the block count, so chains stay short on
    /// average regardless of origin size.
    pub fn reset(&mut self, n_blocks: usize) {
        self.landmark.clear();
        self.landmark.resize(n_blocks, 0);
        self.collide.clear();
        self.collide.resize(n_blocks, 0);
    }

    /// Number of buckets (and of block slots).
    #[inline]
    pub fn n_hash(&self) -> usize {
        self.landmark.len()
    }

    #[inline]
    fn bucket(&self, hash: u32) -> usize {
        hash as usize % self.landmark.len()
    }

    /// Push `block` onto the chain for `hash`.
    ///
    /// # Panics
    /// If the table is empty or `block` is not below `n_hash()`.
    #[inline]
    pub fn insert(&mut self, hash: u32, block: usize) {
        let bucket = self.bucket(hash);
        self.collide[block] = self.landmark[bucket];
        self.landmark[bucket] = block as u32 + CKOFFSET;
    }

    /// Most recently inserted block for `hash`, if any.
    #[inline]
    pub fn head(&self, hash: u32) -> Option<usize> {
        if self.landmark.is_empty() {
            return None;
        }
        decode(self.landmark[self.bucket(hash)])
    }

    /// Block indexed into the same bucket before `block`, if any.
    #[inline]
    pub fn next(&self, block: usize) -> Option<usize> {
        decode(self.collide[block])
    }

    /// Walk the full chain for `hash`, most-recent first.
    pub fn chain(&self, hash: u32) -> Chain<'_> {
        Chain {
            table: self,
            cur: self.head(hash),
        }
    }
}

#[inline]
fn decode(stored: u32) -> Option<usize> {
    stored.checked_sub(CKOFFSET).map(|b| b as usize)
}

/// Iterator over one collision chain.
#[derive(Debug, Clone)]
pub struct Chain<'t> {
    table: &'t LandmarkTable,
    cur: Option<usize>,
}

impl Iterator for Chain<'_> {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        let block = self.cur?;
        self.cur = self.table.next(block);
        Some(block)
    }
}
