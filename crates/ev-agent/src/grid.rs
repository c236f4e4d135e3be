//! Hashed uniform grid over agent positions.
//!
//! Cells are square in the `(x, z)` plane.  With a cell edge of twice the
//! collision safe distance, every agent within `2 × safe` of a query point
//! lies in the 3 × 3 block of cells around it.  Distinct cells may share a
//! bucket, so callers filter candidates by real distance.

use ev_core::Vec2;

/// Minimum bucket count; keeps small populations from colliding into a
/// handful of buckets.
const MIN_TABLE_SIZE: usize = 64;

pub struct AgentGrid {
    cell_size:     f32,
    inv_cell_size: f32,
    table_size:    usize,
    /// Each bucket holds agent indices.  Cleared on rebuild, allocation kept.
    buckets:       Vec<Vec<u32>>,
    /// Cell each agent is currently filed under, `None` if not inserted.
    cells:         Vec<Option<(i32, i32)>>,
}

impl AgentGrid {
    /// `cell_size` must be positive; `capacity` sizes the bucket table.
    pub fn new(cell_size: f32, capacity: usize) -> Self {
        let cell_size = cell_size.max(f32::EPSILON);
        let table_size = (capacity * 2).next_power_of_two().max(MIN_TABLE_SIZE);
        let mut buckets = Vec::with_capacity(table_size);
        for _ in 0..table_size {
            buckets.push(Vec::with_capacity(4));
        }
        Self {
            cell_size,
            inv_cell_size: 1.0 / cell_size,
            table_size,
            buckets,
            cells: vec![None; capacity],
        }
    }

    #[inline]
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Switch to a new cell edge.  Empties the grid if the edge changed.
    pub fn set_cell_size(&mut self, cell_size: f32) {
        let cell_size = cell_size.max(f32::EPSILON);
        if cell_size != self.cell_size {
            self.cell_size = cell_size;
            self.inv_cell_size = 1.0 / cell_size;
            self.clear();
        }
    }

    /// Remove every agent.
    pub fn clear(&mut self) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
        self.cells.iter_mut().for_each(|c| *c = None);
    }

    /// File agent `index` under the cell containing `pos`.
    pub fn insert(&mut self, index: usize, pos: Vec2) {
        if index >= self.cells.len() {
            self.cells.resize(index + 1, None);
        }
        if self.cells[index].is_some() {
            self.remove(index);
        }
        let cell = self.cell_coords(pos);
        let hash = self.hash_cell(cell.0, cell.1);
        self.buckets[hash].push(index as u32);
        self.cells[index] = Some(cell);
    }

    /// Drop agent `index` from the grid.  No-op if it was never inserted.
    pub fn remove(&mut self, index: usize) {
        let Some(cell) = self.cells.get_mut(index).and_then(Option::take) else {
            return;
        };
        let hash = self.hash_cell(cell.0, cell.1);
        let bucket = &mut self.buckets[hash];
        if let Some(slot) = bucket.iter().position(|&i| i as usize == index) {
            bucket.swap_remove(slot);
        }
    }

    /// Move agent `index` to `pos`, touching buckets only when its cell changed.
    pub fn relocate(&mut self, index: usize, pos: Vec2) {
        let cell = self.cell_coords(pos);
        if self.cells.get(index).copied().flatten() == Some(cell) {
            return;
        }
        self.insert(index, pos);
    }

    /// Call `callback` for every agent filed in the 3 × 3 cells around `pos`.
    /// An index may be reported more than once when cells share a bucket.
    pub fn query_neighbors(&self, pos: Vec2, mut callback: impl FnMut(usize)) {
        let (cx, cy) = self.cell_coords(pos);
        for dy in -1i32..=1 {
            for dx in -1i32..=1 {
                let hash = self.hash_cell(cx.wrapping_add(dx), cy.wrapping_add(dy));
                for &index in &self.buckets[hash] {
                    callback(index as usize);
                }
            }
        }
    }

    fn cell_coords(&self, pos: Vec2) -> (i32, i32) {
        let cx = (pos.x * self.inv_cell_size).floor() as i32;
        let cy = (pos.y * self.inv_cell_size).floor() as i32;
        (cx, cy)
    }

    fn hash_cell(&self, cx: i32, cy: i32) -> usize {
        let h = (cx as u32).wrapping_mul(73856093) ^ (cy as u32).wrapping_mul(19349663);
        (h as usize) % self.table_size
    }
}
