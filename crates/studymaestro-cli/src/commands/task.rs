use chrono::{NaiveDate, TimeZone, Utc};
use clap::{Subcommand, ValueEnum};
use studymaestro_core::metrics::{format_date, partition_tasks};
use studymaestro_core::{DashboardEvent, DashboardModel, Priority, TaskEvent, TaskModel, TaskRepository};

use super::{print_json, report, CliResult, Context};

#[derive(Clone, Copy, ValueEnum)]
pub enum PriorityArg {
    Low,
    Medium,
    High,
}

impl From<PriorityArg> for Priority {
    fn from(arg: PriorityArg) -> Self {
        match arg {
            PriorityArg::Low => Priority::Low,
            PriorityArg::Medium => Priority::Medium,
            PriorityArg::High => Priority::High,
        }
    }
}

#[derive(Subcommand)]
pub enum TaskAction {
    /// Create a task for a subject
    Add {
        /// Task title (4 to 30 characters)
        title: String,
        /// Subject the task belongs to
        #[arg(long)]
        subject: i64,
        #[arg(long, default_value = "")]
        description: String,
        /// Due date as YYYY-MM-DD (defaults to today)
        #[arg(long)]
        due: Option<String>,
        #[arg(long, value_enum, default_value = "low")]
        priority: PriorityArg,
    },
    /// List tasks, upcoming first
    List {
        /// Only tasks of this subject
        #[arg(long)]
        subject: Option<i64>,
        #[arg(long)]
        json: bool,
    },
    /// Flip a task between upcoming and completed
    Toggle { id: i64 },
    /// Delete a task
    Delete { id: i64 },
}

fn parse_due(text: &str) -> CliResult<i64> {
    let date = NaiveDate::parse_from_str(text, "%Y-%m-%d")?;
    let midnight = date.and_hms_opt(0, 0, 0).ok_or("invalid date")?;
    Ok(Utc.from_utc_datetime(&midnight).timestamp_millis())
}

pub async fn run(action: TaskAction) -> CliResult {
    let ctx = Context::open()?;
    match action {
        TaskAction::Add {
            title,
            subject,
            description,
            due,
            priority,
        } => {
            let due_date = due.as_deref().map(parse_due).transpose()?;
            let model = TaskModel::new(ctx.store(), &ctx.settings);
            let mut events = model.events();
            model.load(None, Some(subject)).await;
            model.on_event(TaskEvent::TitleChanged(title)).await;
            model.on_event(TaskEvent::DescriptionChanged(description)).await;
            model.on_event(TaskEvent::DueDateChanged(due_date)).await;
            model.on_event(TaskEvent::PriorityChanged(priority.into())).await;
            model.on_event(TaskEvent::SaveTask).await;
            report(&mut events, &["Task Saved Successfully."])?;
        }
        TaskAction::List { subject, json } => {
            let query = match subject {
                Some(id) => ctx.db.tasks_for_subject(id),
                None => ctx.db.all_tasks(),
            };
            let (upcoming, completed) = partition_tasks(query.fetch_async().await?);
            if json {
                print_json(&serde_json::json!({
                    "upcoming": upcoming,
                    "completed": completed,
                }))?;
                return Ok(());
            }
            for task in upcoming.iter().chain(&completed) {
                println!(
                    "{} {:>4}  {:<30} due {}  {:<6}  {}",
                    if task.is_complete { "[x]" } else { "[ ]" },
                    task.id.unwrap_or_default(),
                    task.title,
                    format_date(Some(task.due_date)),
                    task.priority,
                    task.related_to_subject
                );
            }
        }
        TaskAction::Toggle { id } => {
            let task = ctx.db.task_by_id(id)?.ok_or_else(|| format!("task {id} not found"))?;
            let model = DashboardModel::new(ctx.store(), &ctx.settings);
            let mut events = model.events();
            model.on_event(DashboardEvent::TaskCompletionToggled(task)).await;
            report(
                &mut events,
                &["Saved in upcoming tasks.", "Saved in Completed tasks."],
            )?;
        }
        TaskAction::Delete { id } => {
            let model = TaskModel::new(ctx.store(), &ctx.settings);
            let mut events = model.events();
            model.load(Some(id), None).await;
            model.on_event(TaskEvent::DeleteTask).await;
            report(&mut events, &["Task deleted successfully."])?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn due_date_is_utc_midnight() {
        assert_eq!(parse_due("2024-03-05").unwrap(), 1_709_596_800_000);
        assert!(parse_due("05/03/2024").is_err());
    }
}
