//! Workpiece registry owned by the mode machine.

use sorter_common::workpiece::Workpiece;

/// Workpieces on the belts, in creation order. Ids are sequential from 1.
#[derive(Debug, Clone)]
pub struct WorkpieceRegistry {
    next_id: u32,
    items: Vec<Workpiece>,
}

impl Default for WorkpieceRegistry {
    fn default() -> Self {
        Self {
            next_id: 1,
            items: Vec::new(),
        }
    }
}

impl WorkpieceRegistry {
    /// Create a record for a workpiece entering the belt.
    pub fn create(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        self.items.push(Workpiece::new(id));
        id
    }

    pub fn get(&self, id: u32) -> Option<&Workpiece> {
        self.items.iter().find(|wp| wp.id == id)
    }

    pub fn get_mut(&mut self, id: u32) -> Option<&mut Workpiece> {
        self.items.iter_mut().find(|wp| wp.id == id)
    }

    /// Remove a workpiece that left the machine.
    pub fn remove(&mut self, id: u32) -> Option<Workpiece> {
        let pos = self.items.iter().position(|wp| wp.id == id)?;
        Some(self.items.remove(pos))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Workpiece> {
        self.items.iter()
    }
}
