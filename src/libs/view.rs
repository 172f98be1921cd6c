use super::quadrant::Quadrant;
use super::store::StoreState;
use super::task::{Task, ALL_PROJECT_ID};
use prettytable::{row, Table};

pub struct View {}

impl View {
    fn mark(task: &Task) -> &'static str {
        if task.done {
            "✔"
        } else {
            " "
        }
    }

    fn badge(state: &StoreState, task: &Task) -> String {
        state.project_badge(task).map(|p| p.display_name()).unwrap_or_default()
    }

    /// Numbered list of the visible tasks. The numbers are what commands
    /// accept as task references.
    pub fn task_table(state: &StoreState) -> Table {
        let mut table = Table::new();
        let show_project = state.selected_project_id == ALL_PROJECT_ID;

        if state.compact_mode {
            table.add_row(row!["#", "", "TITLE"]);
        } else if show_project {
            table.add_row(row!["#", "", "TITLE", "QUADRANT", "PROJECT", "CREATED"]);
        } else {
            table.add_row(row!["#", "", "TITLE", "QUADRANT", "CREATED"]);
        }

        for (idx, task) in state.visible_tasks().iter().enumerate() {
            let num = idx + 1;
            if state.compact_mode {
                table.add_row(row![num, Self::mark(task), task.title]);
            } else if show_project {
                table.add_row(row![
                    num,
                    Self::mark(task),
                    task.title,
                    task.quadrant().label(),
                    Self::badge(state, task),
                    task.created_at.format("%Y-%m-%d %H:%M")
                ]);
            } else {
                table.add_row(row![
                    num,
                    Self::mark(task),
                    task.title,
                    task.quadrant().label(),
                    task.created_at.format("%Y-%m-%d %H:%M")
                ]);
            }
        }
        table
    }

    /// One table per quadrant. Numbering continues across quadrants in the
    /// same order as the list view uses.
    pub fn matrix_tables(state: &StoreState) -> Vec<(Quadrant, Table)> {
        let visible = state.visible_tasks();
        let grouped = state.grouped();
        grouped
            .iter()
            .map(|(quadrant, tasks)| {
                let mut table = Table::new();
                table.set_titles(row![format!("{} [{}]", quadrant.label(), quadrant.key())]);
                for task in tasks {
                    let num = visible.iter().position(|t| t.id == task.id).map(|i| i + 1).unwrap_or(0);
                    if state.compact_mode {
                        table.add_row(row![num, Self::mark(task), task.title]);
                    } else {
                        table.add_row(row![num, Self::mark(task), task.title, Self::badge(state, task)]);
                    }
                }
                (quadrant, table)
            })
            .collect()
    }

    pub fn project_table(state: &StoreState) -> Table {
        let mut table = Table::new();
        table.add_row(row!["", "ID", "NAME", "TASKS"]);
        for project in &state.projects {
            let selected = if project.id == state.selected_project_id { "▶" } else { "" };
            let count = if project.id == ALL_PROJECT_ID {
                state.tasks.len()
            } else {
                state.tasks.iter().filter(|t| t.project_id == project.id).count()
            };
            table.add_row(row![selected, project.id, project.display_name(), count]);
        }
        table
    }

    pub fn tasks(state: &StoreState) {
        Self::task_table(state).printstd();
    }

    pub fn matrix(state: &StoreState) {
        for (_, table) in Self::matrix_tables(state) {
            table.printstd();
        }
    }

    pub fn projects(state: &StoreState) {
        Self::project_table(state).printstd();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::store::{AddTaskOptions, TaskStore};

    #[test]
    fn compact_mode_drops_columns() {
        let mut store = TaskStore::new(false);
        store.add_task("Pay rent", AddTaskOptions::quadrant(Quadrant::ImportantUrgent));
        let wide = View::task_table(&store.snapshot());
        assert_eq!(wide.len(), 2);
        assert_eq!(wide.get_row(0).map(|r| r.len()), Some(6));

        store.set_compact_mode(true);
        let compact = View::task_table(&store.snapshot());
        assert_eq!(compact.get_row(1).map(|r| r.len()), Some(3));
    }

    #[test]
    fn matrix_has_four_groups() {
        let mut store = TaskStore::new(false);
        store.add_task("a", AddTaskOptions::quadrant(Quadrant::Urgent));
        let tables = View::matrix_tables(&store.snapshot());
        assert_eq!(tables.len(), 4);
        assert_eq!(tables[2].1.len(), 1);
        assert!(tables[0].1.is_empty());
    }
}
