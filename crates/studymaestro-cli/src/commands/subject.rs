use clap::Subcommand;
use serde_json::json;
use studymaestro_core::metrics::format_date;
use studymaestro_core::{DashboardEvent, DashboardModel, SubjectEvent, SubjectModel};

use super::{first_snapshot, print_json, report, CliResult, Context};

#[derive(Subcommand)]
pub enum SubjectAction {
    /// Create a subject
    Add {
        /// Subject name
        name: String,
        /// Study goal in hours
        #[arg(long, default_value = "1")]
        goal: String,
    },
    /// List all subjects
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a subject with its progress, tasks and recent sessions
    Show {
        id: i64,
        #[arg(long)]
        json: bool,
    },
    /// Rename a subject or change its goal
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        goal: Option<String>,
    },
    /// Delete a subject with its tasks and sessions
    Delete { id: i64 },
}

pub async fn run(action: SubjectAction) -> CliResult {
    let ctx = Context::open()?;
    match action {
        SubjectAction::Add { name, goal } => {
            let model = DashboardModel::new(ctx.store(), &ctx.settings);
            let mut events = model.events();
            model.on_event(DashboardEvent::SubjectNameChanged(name)).await;
            model.on_event(DashboardEvent::GoalHoursChanged(goal)).await;
            model.on_event(DashboardEvent::SaveSubject).await;
            report(&mut events, &["Subject Saved Successfully."])?;
        }
        SubjectAction::List { json } => {
            let model = DashboardModel::new(ctx.store(), &ctx.settings);
            let mut sub = model.subscribe();
            let snap = first_snapshot(&mut sub).await?;
            if json {
                print_json(&snap.subjects)?;
            } else if snap.subjects.is_empty() {
                println!("No subjects yet.");
            } else {
                for subject in &snap.subjects {
                    println!(
                        "{:>4}  {:<24} goal {}h",
                        subject.id.unwrap_or_default(),
                        subject.name,
                        subject.goal_hours
                    );
                }
            }
        }
        SubjectAction::Show { id, json } => {
            let model = SubjectModel::new(ctx.store(), id, &ctx.settings);
            let mut events = model.events();
            model.load().await;
            if model.aggregator().draft().current_subject_id.is_none() {
                return report(&mut events, &[]);
            }
            let mut sub = model.subscribe();
            let snap = first_snapshot(&mut sub).await?;
            if json {
                print_json(&json!({
                    "id": snap.current_subject_id,
                    "name": snap.subject_name,
                    "goal_hours": snap.goal_hours,
                    "studied_hours": snap.studied_hours,
                    "progress": snap.progress,
                    "upcoming_tasks": snap.upcoming_tasks,
                    "completed_tasks": snap.completed_tasks,
                    "recent_sessions": snap.recent_sessions,
                }))?;
                return Ok(());
            }
            println!("{} (#{id})", snap.subject_name);
            println!(
                "studied {:.2}h of {}h  [{:.0}%]",
                snap.studied_hours,
                snap.goal_hours,
                snap.progress * 100.0
            );
            println!("upcoming tasks:");
            for task in &snap.upcoming_tasks {
                println!(
                    "  [ ] {:>4}  {}  due {}  {}",
                    task.id.unwrap_or_default(),
                    task.title,
                    format_date(Some(task.due_date)),
                    task.priority
                );
            }
            println!("completed tasks:");
            for task in &snap.completed_tasks {
                println!("  [x] {:>4}  {}", task.id.unwrap_or_default(), task.title);
            }
            println!("recent sessions:");
            for session in &snap.recent_sessions {
                println!(
                    "  {:>4}  {}  {}s",
                    session.id.unwrap_or_default(),
                    format_date(Some(session.date)),
                    session.duration
                );
            }
        }
        SubjectAction::Update { id, name, goal } => {
            let model = SubjectModel::new(ctx.store(), id, &ctx.settings);
            let mut events = model.events();
            model.load().await;
            if model.aggregator().draft().current_subject_id.is_none() {
                return report(&mut events, &[]);
            }
            if let Some(name) = name {
                model.on_event(SubjectEvent::NameChanged(name)).await;
            }
            if let Some(goal) = goal {
                model.on_event(SubjectEvent::GoalHoursChanged(goal)).await;
            }
            model.on_event(SubjectEvent::UpdateSubject).await;
            report(&mut events, &["Subject updated successfully."])?;
        }
        SubjectAction::Delete { id } => {
            let model = SubjectModel::new(ctx.store(), id, &ctx.settings);
            let mut events = model.events();
            model.load().await;
            model.on_event(SubjectEvent::DeleteSubject).await;
            report(&mut events, &["Subject deleted successfully"])?;
        }
    }
    Ok(())
}
