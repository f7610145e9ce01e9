//! Aggregate counters derived from current state.
//!
//! None of these values is ever stored. Handlers load the board's tasks fresh
//! on each request and tally them here.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Board, Comment, Priority, Task, TaskStatus};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardCounts {
    pub member_count: usize,
    pub ticket_count: usize,
    pub tasks_to_do_count: usize,
    pub tasks_high_prio_count: usize,
}

impl BoardCounts {
    /// Tallies `tasks`, ignoring any that belong to a different board.
    pub fn tally(board: &Board, tasks: &[Task]) -> Self {
        Self {
            member_count: member_count(board),
            ticket_count: ticket_count(board.id, tasks),
            tasks_to_do_count: tasks_with_status(board.id, tasks, TaskStatus::Todo),
            tasks_high_prio_count: tasks_with_priority(board.id, tasks, Priority::High),
        }
    }
}

pub fn member_count(board: &Board) -> usize {
    board.members.len()
}

pub fn ticket_count(board_id: Uuid, tasks: &[Task]) -> usize {
    tasks.iter().filter(|t| t.board_id == board_id).count()
}

pub fn tasks_with_status(board_id: Uuid, tasks: &[Task], status: TaskStatus) -> usize {
    tasks
        .iter()
        .filter(|t| t.board_id == board_id && t.status == status)
        .count()
}

pub fn tasks_with_priority(board_id: Uuid, tasks: &[Task], priority: Priority) -> usize {
    tasks
        .iter()
        .filter(|t| t.board_id == board_id && t.priority == priority)
        .count()
}

pub fn comments_count(task_id: Uuid, comments: &[Comment]) -> usize {
    comments.iter().filter(|c| c.task_id == task_id).count()
}
