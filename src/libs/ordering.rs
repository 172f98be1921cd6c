//! Display order of tasks.
//!
//! Rules, applied until one discriminates:
//! 1. not-done before done
//! 2. higher priority score first (see [`Quadrant::priority_score`])
//! 3. newer `created_at` first
//! 4. id, so the order is total
//!
//! Manual "move up / move down" swaps `created_at` between neighbours, which
//! only changes the visible order inside a tie-group of rules 1 and 2.
//!
//! [`Quadrant::priority_score`]: super::quadrant::Quadrant::priority_score

use super::task::Task;
use std::cmp::Ordering;

pub fn priority_score(task: &Task) -> u8 {
    task.quadrant().priority_score()
}

/// Display order of two tasks.
///
/// Open before done, then higher priority score first, then newer
/// `created_at` first. The id breaks remaining ties so the order is total.
///
/// # Example
///
/// ```rust
/// use eisen::libs::ordering::compare;
/// use eisen::libs::quadrant::Quadrant;
/// use eisen::libs::task::Task;
/// use std::cmp::Ordering;
///
/// let urgent = Task::new("Fix leak", Quadrant::ImportantUrgent, "inbox");
/// let mut done = Task::new("Old chore", Quadrant::ImportantUrgent, "inbox");
/// done.done = true;
/// assert_eq!(compare(&urgent, &done), Ordering::Less);
/// ```
pub fn compare(a: &Task, b: &Task) -> Ordering {
    a.done
        .cmp(&b.done)
        .then_with(|| priority_score(b).cmp(&priority_score(a)))
        .then_with(|| b.created_at.cmp(&a.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

pub fn sort_tasks(tasks: &mut [Task]) {
    tasks.sort_by(compare);
}

/// Direction of a manual move inside a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// Finds the neighbour a task swaps `created_at` with. `scope` must already
/// be sorted by [`compare`]. Returns `None` at the edges or when the task is
/// not in the scope.
pub fn neighbour<'a>(scope: &'a [Task], id: &str, direction: Direction) -> Option<(&'a Task, &'a Task)> {
    let idx = scope.iter().position(|t| t.id == id)?;
    let other = match direction {
        Direction::Up => idx.checked_sub(1)?,
        Direction::Down => idx + 1,
    };
    Some((&scope[idx], scope.get(other)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::quadrant::Quadrant;
    use chrono::{Duration, TimeZone, Utc};

    fn task(id: &str, quadrant: Quadrant, minutes: i64) -> Task {
        let mut t = Task::new(id, quadrant, "inbox");
        t.id = id.to_string();
        t.created_at = Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap() + Duration::minutes(minutes);
        t
    }

    fn ids(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn priority_then_recency() {
        let mut tasks = vec![
            task("d", Quadrant::Neither, 3),
            task("b", Quadrant::Important, 1),
            task("a", Quadrant::ImportantUrgent, 0),
            task("c", Quadrant::Urgent, 2),
        ];
        sort_tasks(&mut tasks);
        // b and c tie on score 1, c is newer
        assert_eq!(ids(&tasks), vec!["a", "c", "b", "d"]);
    }

    #[test]
    fn done_tasks_sink_regardless_of_priority() {
        let mut tasks = vec![
            task("a", Quadrant::ImportantUrgent, 0),
            task("b", Quadrant::Important, 1),
            task("d", Quadrant::Neither, 3),
        ];
        tasks[0].done = true;
        sort_tasks(&mut tasks);
        assert_eq!(ids(&tasks), vec!["b", "d", "a"]);
    }

    #[test]
    fn swapping_created_at_reverses_a_tie_group() {
        let mut x = task("x", Quadrant::Urgent, 1);
        let mut y = task("y", Quadrant::Important, 2);
        assert_eq!(compare(&y, &x), Ordering::Less);
        std::mem::swap(&mut x.created_at, &mut y.created_at);
        assert_eq!(compare(&x, &y), Ordering::Less);
    }

    #[test]
    fn swapping_across_buckets_has_no_visible_effect() {
        let mut hi = task("hi", Quadrant::ImportantUrgent, 1);
        let mut lo = task("lo", Quadrant::Neither, 2);
        assert_eq!(compare(&hi, &lo), Ordering::Less);
        std::mem::swap(&mut hi.created_at, &mut lo.created_at);
        assert_eq!(compare(&hi, &lo), Ordering::Less);
    }

    #[test]
    fn neighbour_respects_edges() {
        let mut tasks = vec![task("a", Quadrant::Neither, 2), task("b", Quadrant::Neither, 1)];
        sort_tasks(&mut tasks);
        assert!(neighbour(&tasks, "a", Direction::Up).is_none());
        assert!(neighbour(&tasks, "b", Direction::Down).is_none());
        assert!(neighbour(&tasks, "missing", Direction::Up).is_none());
        let (me, other) = neighbour(&tasks, "a", Direction::Down).unwrap();
        assert_eq!((me.id.as_str(), other.id.as_str()), ("a", "b"));
    }
}
