//! Depth tracking state machine
//!
//! Given the caller's frame identities at each log call, [`DepthTracker`]
//! decides where the new entry sits relative to the previously logged one:
//! a new root, a child, a sibling, or a return to an ancestor. It owns the
//! stack of open nesting levels plus the manual increases that are waiting
//! for their next log call.
//!
//! The tracker never looks at the real call stack, which keeps it fully
//! deterministic: the same sequence of `decide` calls on a fresh tracker
//! always yields the same decisions.

use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::frame::FrameIdentity;

/// Manual nesting directive attached to a log call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ManualDepth {
    Decrease,
    #[default]
    None,
    Increase,
}

impl ManualDepth {
    pub fn value(&self) -> i8 {
        match self {
            ManualDepth::Decrease => -1,
            ManualDepth::None => 0,
            ManualDepth::Increase => 1,
        }
    }
}

/// One open nesting level
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepthRecord {
    /// Frame that owns this level
    pub frame: FrameIdentity,
    /// +1 when pushed by a manual increase, 0 for a natural call-depth level
    pub manual_delta: i8,
    /// Manual increases still open for `frame`, counting this one
    pub cumulative_manual_depth: u32,
}

impl DepthRecord {
    fn natural(frame: FrameIdentity) -> Self {
        Self {
            frame,
            manual_delta: 0,
            cumulative_manual_depth: 0,
        }
    }

    fn manual(frame: FrameIdentity, cumulative_manual_depth: u32) -> Self {
        Self {
            frame,
            manual_delta: 1,
            cumulative_manual_depth,
        }
    }

    fn is_manual_increase_of(&self, frame: &FrameIdentity) -> bool {
        self.frame == *frame && self.manual_delta == 1
    }
}

/// Structural relationship of a new entry to the previously logged one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Root,
    Child,
    SiblingOrManual,
    AncestorReturn,
}

/// Outcome of [`DepthTracker::decide`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub transition: Transition,
    /// Depth the entry is rendered at
    pub depth: usize,
    /// The entry opens a `children` block under the previously emitted entry
    pub nested: bool,
}

#[derive(Debug, Default)]
pub struct DepthTracker {
    current_depth: usize,
    depth_stack: Vec<DepthRecord>,
    pending_increases: HashSet<FrameIdentity>,
    last_emitted_depth: Option<usize>,
}

impl DepthTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.current_depth
    }

    pub fn stack(&self) -> &[DepthRecord] {
        &self.depth_stack
    }

    /// Whether an `increase_depth` from `frame` is waiting for its next log call
    pub fn has_pending_increase(&self, frame: &FrameIdentity) -> bool {
        self.pending_increases.contains(frame)
    }

    /// Classify a log call made with the given frames (nearest caller first)
    pub fn decide(&mut self, frames: &[FrameIdentity], manual: ManualDepth) -> Result<Decision> {
        let current = frames
            .first()
            .ok_or_else(|| Error::internal("depth decision requested with an empty frame list"))?;
        let manual = self.resolve_manual(current, manual);

        let transition = match self.depth_stack.last() {
            None => {
                self.depth_stack.push(DepthRecord::natural(current.clone()));
                Transition::Root
            }
            Some(top) => {
                let expected_parent = top.frame.clone();
                if frames[1..].contains(&expected_parent) {
                    self.depth_stack.push(DepthRecord::natural(current.clone()));
                    self.current_depth += 1;
                    Transition::Child
                } else if expected_parent == *current {
                    if self.apply_manual(current, manual) {
                        Transition::Child
                    } else {
                        Transition::SiblingOrManual
                    }
                } else {
                    self.return_to_ancestor(frames, manual);
                    Transition::AncestorReturn
                }
            }
        };

        let nested = self
            .last_emitted_depth
            .is_some_and(|previous| self.current_depth > previous);
        self.last_emitted_depth = Some(self.current_depth);

        Ok(Decision {
            transition,
            depth: self.current_depth,
            nested,
        })
    }

    /// Make the next log call from `frame` nest one level deeper
    pub fn increase_depth(&mut self, frame: FrameIdentity) {
        self.pending_increases.insert(frame);
    }

    /// Undo up to `level` manual increases opened by `frame`
    ///
    /// An increase still pending for `frame` is cancelled first. Natural
    /// call-depth levels are never removed.
    pub fn decrease_depth(&mut self, frame: &FrameIdentity, level: usize) {
        if level < 1 {
            return;
        }

        let mut remaining = level;
        if self.pending_increases.remove(frame) {
            remaining -= 1;
        }

        let mut idx = self.depth_stack.len();
        while remaining > 0 && idx > 0 {
            idx -= 1;
            if self.depth_stack[idx].is_manual_increase_of(frame) {
                self.depth_stack.remove(idx);
                self.current_depth = self.current_depth.saturating_sub(1);
                remaining -= 1;
            }
        }
    }

    /// Forget all nesting state; the next entry is a new root
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn resolve_manual(&mut self, frame: &FrameIdentity, manual: ManualDepth) -> ManualDepth {
        if manual == ManualDepth::None && self.pending_increases.remove(frame) {
            ManualDepth::Increase
        } else {
            manual
        }
    }

    /// Apply a manual directive for `frame`, returning true if it nested deeper
    fn apply_manual(&mut self, frame: &FrameIdentity, manual: ManualDepth) -> bool {
        match manual {
            ManualDepth::Increase => {
                let cumulative = self
                    .latest_record_for(frame)
                    .map(|record| record.cumulative_manual_depth)
                    .unwrap_or(0);
                self.depth_stack
                    .push(DepthRecord::manual(frame.clone(), cumulative + 1));
                self.current_depth += 1;
                true
            }
            ManualDepth::Decrease => {
                let open = self.depth_stack.iter().rposition(|record| {
                    record.is_manual_increase_of(frame) && record.cumulative_manual_depth > 0
                });
                if let Some(idx) = open {
                    self.depth_stack.remove(idx);
                    self.current_depth = self.current_depth.saturating_sub(1);
                }
                false
            }
            ManualDepth::None => false,
        }
    }

    fn return_to_ancestor(&mut self, frames: &[FrameIdentity], manual: ManualDepth) {
        let current = &frames[0];
        let mut reverse_depth: i64 = 0;
        let mut ancestor = None;

        for (idx, record) in self.depth_stack.iter().enumerate().rev() {
            if frames.contains(&record.frame) {
                ancestor = Some(idx);
                break;
            }
            reverse_depth += i64::from(record.manual_delta) + 1;
        }

        match ancestor {
            Some(idx) => {
                let depth = self.current_depth as i64 - reverse_depth;
                self.current_depth = depth.max(0) as usize;
                self.depth_stack.truncate(idx + 1);
            }
            None => {
                crate::diag_warn!(
                    "no logged ancestor of [{}] on the call stack, nesting restarts at a new root",
                    current
                );
                self.depth_stack.clear();
                self.current_depth = 0;
            }
        }

        if ancestor.is_none() || manual == ManualDepth::None {
            self.depth_stack.push(DepthRecord::natural(current.clone()));
        }
        self.apply_manual(current, manual);
    }

    fn latest_record_for(&self, frame: &FrameIdentity) -> Option<&DepthRecord> {
        self.depth_stack.iter().rev().find(|record| record.frame == *frame)
    }
}
