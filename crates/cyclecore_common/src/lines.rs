use std::collections::VecDeque;

/// Level of an input/interrupt line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LineState {
    #[default]
    Clear,
    Assert,
}

impl LineState {
    #[inline]
    pub fn is_asserted(self) -> bool {
        self == LineState::Assert
    }
}

impl From<bool> for LineState {
    fn from(asserted: bool) -> Self {
        if asserted {
            LineState::Assert
        } else {
            LineState::Clear
        }
    }
}

/// Ordered record of line changes produced by one device and consumed by
/// another at its next instruction boundary.
#[derive(Clone, Debug, Default)]
pub struct LineQueue {
    changes: VecDeque<(u8, LineState)>,
}

impl LineQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, line: u8, state: LineState) {
        self.changes.push_back((line, state));
    }

    pub fn pop(&mut self) -> Option<(u8, LineState)> {
        self.changes.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn clear(&mut self) {
        self.changes.clear();
    }
}
