use serde_json::json;
use studymaestro_core::metrics::format_date;
use studymaestro_core::DashboardModel;

use super::{first_snapshot, print_json, CliResult, Context};

pub async fn run(json: bool) -> CliResult {
    let ctx = Context::open()?;
    let model = DashboardModel::new(ctx.store(), &ctx.settings);
    let mut sub = model.subscribe();
    let snap = first_snapshot(&mut sub).await?;

    if json {
        return print_json(&json!({
            "subject_count": snap.total_subject_count,
            "studied_hours": snap.total_studied_hours,
            "goal_hours": snap.total_goal_hours,
            "subjects": snap.subjects,
            "upcoming_tasks": snap.upcoming_tasks,
            "recent_sessions": snap.recent_sessions,
        }));
    }

    println!("subjects:       {}", snap.total_subject_count);
    println!("studied hours:  {}", snap.total_studied_hours);
    println!("goal hours:     {}", snap.total_goal_hours);
    println!();
    println!("upcoming tasks:");
    if snap.upcoming_tasks.is_empty() {
        println!("  none");
    }
    for task in &snap.upcoming_tasks {
        println!(
            "  {:>4}  {}  due {}  ({})",
            task.id.unwrap_or_default(),
            task.title,
            format_date(Some(task.due_date)),
            task.related_to_subject
        );
    }
    println!("recent sessions:");
    if snap.recent_sessions.is_empty() {
        println!("  none");
    }
    for session in &snap.recent_sessions {
        println!(
            "  {:>4}  {}  {}s  ({})",
            session.id.unwrap_or_default(),
            format_date(Some(session.date)),
            session.duration,
            session.related_to_subject
        );
    }
    Ok(())
}
