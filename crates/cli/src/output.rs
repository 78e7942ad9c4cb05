//! Plain-text rendering for list commands

use taskdeck_core::category::Category;
use taskdeck_core::task::Task;

pub fn task_line(task: &Task, categories: &[Category]) -> String {
    let mark = if task.completed { "x" } else { " " };
    let category = categories
        .iter()
        .find(|c| c.id == task.category_id)
        .map(|c| c.name.as_str())
        .unwrap_or("?");

    let mut line = format!(
        "[{}] {} {:<6} {} ({})",
        mark,
        task.id,
        task.priority.as_str(),
        task.title,
        category
    );
    if let Some(due) = task.due_date {
        line.push_str(&format!(" due {}", due.format("%Y-%m-%d")));
    }
    line
}

pub fn category_line(category: &Category, tasks: usize) -> String {
    format!(
        "{} {} {} {} ({} tasks)",
        category.id, category.name, category.color, category.icon, tasks
    )
}
