//! Caller-side command buffer.

use super::{Command, Instruction, RawCommand};
use crate::{
    dispatch::{finish_command_list, flush_segment},
    error::DispatchError,
    pipeline::Pipeline,
};

use std::{fmt, marker::PhantomData, mem::take};

use itertools::Itertools;
use log::debug;

/// Closure run between two commands while flushing.
pub type DeferredAction<'a> = Box<dyn FnMut() -> anyhow::Result<()> + 'a>;

/// Index of a NoOperation placeholder to be filled later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReservedSlot(usize);

impl ReservedSlot {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Ordered render commands plus deferred actions interleaved between them.
///
/// Everything a queued command points at is borrowed for `'a`, so the records
/// stay valid until the queue is flushed or dropped.
pub struct CommandQueue<'a> {
    commands: Vec<RawCommand>,
    reserved: Vec<usize>,
    actions: Vec<(usize, DeferredAction<'a>)>,
    borrowed: PhantomData<Command<'a>>,
}

impl<'a> CommandQueue<'a> {
    pub fn new() -> CommandQueue<'a> {
        CommandQueue::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> CommandQueue<'a> {
        CommandQueue {
            commands: Vec::with_capacity(capacity),
            reserved: vec![],
            actions: vec![],
            borrowed: PhantomData,
        }
    }

    /// Validates and appends a command.
    pub fn push(&mut self, command: Command<'a>) -> Result<(), DispatchError> {
        let raw = command.encode()?;
        self.commands.push(raw);
        Ok(())
    }

    /// Appends a NoOperation placeholder.
    pub fn reserve_slot(&mut self) -> ReservedSlot {
        let index = self.commands.len();
        self.commands.push(RawCommand::no_operation());
        self.reserved.push(index);
        ReservedSlot(index)
    }

    /// Replaces a reserved placeholder. Each slot can be filled once.
    pub fn fill_slot(&mut self, slot: ReservedSlot, command: Command<'a>) -> Result<(), DispatchError> {
        let position = self
            .reserved
            .iter()
            .position(|&index| index == slot.0)
            .ok_or_else(|| {
                DispatchError::invalid(format!("Command #{} is not a reserved slot.", slot.0))
            })?;

        self.commands[slot.0] = command.encode()?;
        self.reserved.swap_remove(position);
        Ok(())
    }

    /// Queues `action` to run after every command pushed so far has been
    /// issued, and before any command pushed afterwards.
    pub fn queue_action(&mut self, action: impl FnMut() -> anyhow::Result<()> + 'a) {
        self.actions.push((self.commands.len(), Box::new(action)));
    }

    /// Number of queued commands, reserved placeholders included.
    pub fn command_count(&self) -> usize {
        self.commands.len()
    }

    pub fn action_count(&self) -> usize {
        self.actions.len()
    }

    /// True when there is neither a command nor an action to run.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty() && self.actions.is_empty()
    }

    /// The queued records, in order.
    pub fn as_raw(&self) -> &[RawCommand] {
        &self.commands
    }

    /// Comma-separated instruction names of the queued commands.
    pub fn instruction_breakdown(&self) -> String {
        self.commands
            .iter()
            .map(|raw| match raw.instruction() {
                Ok(instruction) => instruction.to_string(),
                Err(value) => format!("<{}>", value),
            })
            .join(", ")
    }

    /// Counts of each instruction in the queue, in wire order.
    pub fn instruction_counts(&self) -> Vec<(Instruction, usize)> {
        self.commands
            .iter()
            .filter_map(|raw| raw.instruction().ok())
            .sorted_by_key(|instruction| instruction.to_raw())
            .group_by(|&instruction| instruction)
            .into_iter()
            .map(|(instruction, group)| (instruction, group.count()))
            .collect()
    }

    /// Issues every command and runs every action in queued order.
    ///
    /// On success the queue is emptied. On failure nothing is removed.
    ///
    /// # Safety
    /// Every non-null handle in the queued commands must be valid for
    /// `pipeline` as required by [`crate::dispatch::execute`].
    pub unsafe fn flush<P: Pipeline + ?Sized>(&mut self, pipeline: &mut P) -> Result<(), DispatchError> {
        self.issue(pipeline)?;
        self.clear();
        Ok(())
    }

    /// Flushes onto a deferred context and finishes its command list.
    ///
    /// The list is finished as if a `FinishCommandList` followed the last
    /// queued command, and failures are reported at that position. On success
    /// the queue is emptied and the caller owns the list. On failure nothing
    /// is removed.
    ///
    /// # Safety
    /// Same as [`CommandQueue::flush`].
    pub unsafe fn flush_deferred<P: Pipeline + ?Sized>(
        &mut self,
        deferred: &mut P,
    ) -> Result<P::CommandList, DispatchError> {
        self.issue(deferred)?;
        let list = finish_command_list(deferred)
            .map_err(|e| e.at(self.commands.len(), Instruction::FinishCommandList))?;
        self.clear();
        Ok(list)
    }

    unsafe fn issue<P: Pipeline + ?Sized>(&mut self, pipeline: &mut P) -> Result<(), DispatchError> {
        debug!(
            "Flushing queue of {} commands and {} actions",
            self.commands.len(),
            self.actions.len()
        );

        let mut start = 0;
        for (position, action) in self.actions.iter_mut() {
            let position = *position;
            flush_segment(pipeline, &self.commands[start..position], start)?;
            action().map_err(DispatchError::DeferredAction)?;
            start = position;
        }
        flush_segment(pipeline, &self.commands[start..], start)
    }

    /// Drops every queued command and action.
    pub fn clear(&mut self) {
        self.commands.clear();
        self.reserved.clear();
        self.actions.clear();
    }

    /// Empties the queue and reuses its allocation for commands borrowing for `'b`.
    pub fn recycle<'b>(mut self) -> CommandQueue<'b> {
        self.clear();
        CommandQueue {
            commands: take(&mut self.commands),
            reserved: take(&mut self.reserved),
            actions: vec![],
            borrowed: PhantomData,
        }
    }
}

impl Default for CommandQueue<'_> {
    fn default() -> Self {
        CommandQueue::new()
    }
}

impl fmt::Debug for CommandQueue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandQueue")
            .field("commands", &self.instruction_breakdown())
            .field("actions", &self.actions.len())
            .finish()
    }
}
