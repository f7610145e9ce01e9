//! Access decisions for boards, tasks and comments.
//!
//! Every function here is pure: it takes the acting user's id, an explicit
//! [`Action`] and the already-loaded resources, and returns a [`Decision`].
//! Nothing is looked up and nothing fails; callers turn a [`Decision`] into a
//! response with [`Decision::into_result`].
//!
//! Visibility always flows through the board: a task or comment is visible to
//! exactly the board's owner and members. When the caller cannot see a
//! resource the decision is [`Decision::Conceal`], which is reported the same
//! way as a missing resource so that existence is not leaked.

use uuid::Uuid;

use crate::models::{Board, Comment, Task};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    /// The caller can see the resource but may not perform the action.
    Deny,
    /// The resource is absent or invisible to the caller.
    Conceal,
}

/// Why a decision did not allow the action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Denial {
    #[error("permission denied")]
    Forbidden,
    #[error("not found")]
    NotFound,
}

impl Decision {
    pub fn into_result(self) -> Result<(), Denial> {
        match self {
            Self::Allow => Ok(()),
            Self::Deny => Err(Denial::Forbidden),
            Self::Conceal => Err(Denial::NotFound),
        }
    }

    fn allow_if(condition: bool, otherwise: Self) -> Self {
        if condition {
            Self::Allow
        } else {
            otherwise
        }
    }
}

/// The board a new task points at, as far as the payload and the store know.
#[derive(Debug, Clone, Copy)]
pub enum ParentBoard<'a> {
    /// The payload carried no board reference.
    Missing,
    /// The payload referenced a board id that does not exist.
    Unknown,
    Found(&'a Board),
}

/// Board rules: anyone may create, participants read and update, only the
/// owner deletes.
///
/// `target` is ignored for [`Action::Create`]; for every other action a
/// `None` target is concealed.
pub fn board(actor: Uuid, action: Action, target: Option<&Board>) -> Decision {
    if action == Action::Create {
        return Decision::Allow;
    }
    let Some(board) = target else {
        return Decision::Conceal;
    };
    if !board.is_participant(actor) {
        return Decision::Conceal;
    }
    match action {
        Action::Create | Action::Read | Action::Update => Decision::Allow,
        Action::Delete => Decision::allow_if(board.is_owner(actor), Decision::Deny),
    }
}

/// Gate for creating a task on `parent`. A missing board reference is always
/// denied; an unknown one is concealed.
pub fn task_create(actor: Uuid, parent: ParentBoard<'_>) -> Decision {
    match parent {
        ParentBoard::Missing => Decision::Deny,
        ParentBoard::Unknown => Decision::Conceal,
        ParentBoard::Found(board) => {
            Decision::allow_if(board.is_participant(actor), Decision::Deny)
        }
    }
}

/// Object-level task rules. Participants of the task's board read and update;
/// only the task's creator or the board owner delete.
///
/// The creator keeps the delete right after leaving the board, in which case
/// the task is otherwise invisible to them.
pub fn task(actor: Uuid, action: Action, task: &Task, board: &Board) -> Decision {
    debug_assert_eq!(task.board_id, board.id);
    match action {
        Action::Create => task_create(actor, ParentBoard::Found(board)),
        Action::Read | Action::Update => {
            Decision::allow_if(board.is_participant(actor), Decision::Conceal)
        }
        Action::Delete if task.is_creator(actor) || board.is_owner(actor) => Decision::Allow,
        Action::Delete => deny_or_conceal(actor, board),
    }
}

/// Collection-level comment rules for the comments of a task on `board`:
/// participants may list and post.
pub fn comments(actor: Uuid, action: Action, board: &Board) -> Decision {
    match action {
        Action::Create | Action::Read => {
            Decision::allow_if(board.is_participant(actor), Decision::Conceal)
        }
        Action::Update | Action::Delete => deny_or_conceal(actor, board),
    }
}

/// Object-level comment rules. Comments are never edited and only their
/// author deletes them, whatever the author's standing on the board.
pub fn comment(actor: Uuid, action: Action, comment: &Comment, board: &Board) -> Decision {
    match action {
        Action::Create | Action::Read => comments(actor, action, board),
        Action::Update => deny_or_conceal(actor, board),
        Action::Delete if comment.is_author(actor) => Decision::Allow,
        Action::Delete => deny_or_conceal(actor, board),
    }
}

fn deny_or_conceal(actor: Uuid, board: &Board) -> Decision {
    if board.is_participant(actor) {
        Decision::Deny
    } else {
        Decision::Conceal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Priority, TaskStatus};
    use chrono::Utc;
    use rstest::{fixture, rstest};

    struct Cast {
        owner: Uuid,
        member: Uuid,
        other_member: Uuid,
        outsider: Uuid,
        board: Board,
    }

    #[fixture]
    fn cast() -> Cast {
        let owner = Uuid::new_v4();
        let member = Uuid::new_v4();
        let other_member = Uuid::new_v4();
        let board = Board {
            id: Uuid::new_v4(),
            title: "Sprint1".to_string(),
            owner_id: owner,
            members: vec![member, other_member],
            created_at: Utc::now(),
        };
        Cast {
            owner,
            member,
            other_member,
            outsider: Uuid::new_v4(),
            board,
        }
    }

    fn task_on(board: &Board, created_by: Uuid) -> Task {
        Task {
            id: Uuid::new_v4(),
            board_id: board.id,
            title: "Fix bug".to_string(),
            description: String::new(),
            created_by,
            assignee_id: None,
            reviewer_id: None,
            due_date: None,
            status: TaskStatus::Review,
            priority: Priority::Medium,
            created_at: Utc::now(),
        }
    }

    fn comment_on(task: &Task, author_id: Uuid) -> Comment {
        Comment {
            id: Uuid::new_v4(),
            task_id: task.id,
            author_id,
            content: "looks good".to_string(),
            created_at: Utc::now(),
        }
    }

    #[rstest]
    fn anyone_may_create_a_board(cast: Cast) {
        assert_eq!(board(cast.outsider, Action::Create, None), Decision::Allow);
    }

    #[rstest]
    #[case(Action::Read)]
    #[case(Action::Update)]
    fn participants_read_and_update_boards(cast: Cast, #[case] action: Action) {
        assert_eq!(board(cast.owner, action, Some(&cast.board)), Decision::Allow);
        assert_eq!(board(cast.member, action, Some(&cast.board)), Decision::Allow);
        assert_eq!(board(cast.outsider, action, Some(&cast.board)), Decision::Conceal);
    }

    #[rstest]
    fn only_owner_deletes_board(cast: Cast) {
        assert_eq!(board(cast.owner, Action::Delete, Some(&cast.board)), Decision::Allow);
        assert_eq!(board(cast.member, Action::Delete, Some(&cast.board)), Decision::Deny);
        assert_eq!(board(cast.outsider, Action::Delete, Some(&cast.board)), Decision::Conceal);
    }

    #[rstest]
    fn owner_outside_member_list_keeps_full_rights(cast: Cast) {
        assert!(!cast.board.is_member(cast.owner));
        for action in [Action::Read, Action::Update, Action::Delete] {
            assert_eq!(board(cast.owner, action, Some(&cast.board)), Decision::Allow);
        }
    }

    #[rstest]
    fn missing_board_is_concealed(cast: Cast) {
        assert_eq!(board(cast.owner, Action::Read, None), Decision::Conceal);
    }

    #[rstest]
    fn task_creation_requires_participation(cast: Cast) {
        assert_eq!(task_create(cast.member, ParentBoard::Found(&cast.board)), Decision::Allow);
        assert_eq!(task_create(cast.owner, ParentBoard::Found(&cast.board)), Decision::Allow);
        assert_eq!(task_create(cast.outsider, ParentBoard::Found(&cast.board)), Decision::Deny);
        assert_eq!(task_create(cast.owner, ParentBoard::Missing), Decision::Deny);
        assert_eq!(task_create(cast.owner, ParentBoard::Unknown), Decision::Conceal);
    }

    #[rstest]
    #[case(Action::Read)]
    #[case(Action::Update)]
    fn task_visibility_follows_board(cast: Cast, #[case] action: Action) {
        let t = task_on(&cast.board, cast.owner);
        assert_eq!(task(cast.member, action, &t, &cast.board), Decision::Allow);
        assert_eq!(task(cast.outsider, action, &t, &cast.board), Decision::Conceal);
    }

    #[rstest]
    fn task_delete_is_creator_or_owner(cast: Cast) {
        let t = task_on(&cast.board, cast.member);
        assert_eq!(task(cast.member, Action::Delete, &t, &cast.board), Decision::Allow);
        assert_eq!(task(cast.owner, Action::Delete, &t, &cast.board), Decision::Allow);
        assert_eq!(task(cast.other_member, Action::Delete, &t, &cast.board), Decision::Deny);
        assert_eq!(task(cast.outsider, Action::Delete, &t, &cast.board), Decision::Conceal);
    }

    #[rstest]
    fn former_member_still_deletes_own_task(mut cast: Cast) {
        let t = task_on(&cast.board, cast.member);
        cast.board.members.retain(|id| *id != cast.member);
        assert_eq!(task(cast.member, Action::Read, &t, &cast.board), Decision::Conceal);
        assert_eq!(task(cast.member, Action::Delete, &t, &cast.board), Decision::Allow);
    }

    #[rstest]
    fn comment_collection_is_for_participants(cast: Cast) {
        for action in [Action::Read, Action::Create] {
            assert_eq!(comments(cast.member, action, &cast.board), Decision::Allow);
            assert_eq!(comments(cast.owner, action, &cast.board), Decision::Allow);
            assert_eq!(comments(cast.outsider, action, &cast.board), Decision::Conceal);
        }
    }

    #[rstest]
    fn only_author_deletes_comment(cast: Cast) {
        let t = task_on(&cast.board, cast.owner);
        let c = comment_on(&t, cast.member);
        assert_eq!(comment(cast.member, Action::Delete, &c, &cast.board), Decision::Allow);
        assert_eq!(comment(cast.owner, Action::Delete, &c, &cast.board), Decision::Deny);
        assert_eq!(comment(cast.other_member, Action::Delete, &c, &cast.board), Decision::Deny);
        assert_eq!(comment(cast.outsider, Action::Delete, &c, &cast.board), Decision::Conceal);
    }

    #[rstest]
    fn comments_are_never_updated(cast: Cast) {
        let t = task_on(&cast.board, cast.owner);
        let c = comment_on(&t, cast.member);
        assert_eq!(comment(cast.member, Action::Update, &c, &cast.board), Decision::Deny);
        assert_eq!(comment(cast.owner, Action::Update, &c, &cast.board), Decision::Deny);
        assert_eq!(comment(cast.outsider, Action::Update, &c, &cast.board), Decision::Conceal);
    }

    #[test]
    fn decisions_map_to_denials() {
        assert_eq!(Decision::Allow.into_result(), Ok(()));
        assert_eq!(Decision::Deny.into_result(), Err(Denial::Forbidden));
        assert_eq!(Decision::Conceal.into_result(), Err(Denial::NotFound));
    }
}
