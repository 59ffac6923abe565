//! CLI handlers for browsing exercises and logging workouts.

use super::{Context, ProfileArgs};
use crate::error::GymError;
use crate::types::ProfileUpdate;

pub async fn handle_groups(ctx: &Context) -> Result<(), GymError> {
    for group in ctx.api.groups().await? {
        println!("{group}");
    }
    Ok(())
}

pub async fn handle_exercises(ctx: &Context, group: &str) -> Result<(), GymError> {
    let exercises = ctx.api.exercises_by_group(group).await?;
    if exercises.is_empty() {
        println!("No exercises in {group}");
    }
    for exercise in exercises {
        println!(
            "{:>4}  {}  ({} x {})",
            exercise.id, exercise.name, exercise.series, exercise.repetitions
        );
    }
    Ok(())
}

pub async fn handle_exercise(ctx: &Context, id: i64) -> Result<(), GymError> {
    let exercise = ctx.api.exercise(id).await?;
    println!("{} ({})", exercise.name, exercise.group);
    println!("   {} series x {} repetitions", exercise.series, exercise.repetitions);
    println!("   Demo: {}", ctx.api.exercise_demo_url(&exercise.demo)?);
    Ok(())
}

pub async fn handle_history(ctx: &Context) -> Result<(), GymError> {
    let days = ctx.api.history().await?;
    if days.is_empty() {
        println!("No exercises logged yet");
    }
    for day in days {
        println!("{}", day.title);
        for entry in day.data {
            println!("   {}  {} ({})", entry.hour, entry.name, entry.group);
        }
    }
    Ok(())
}

pub async fn handle_log(ctx: &Context, exercise_id: i64) -> Result<(), GymError> {
    ctx.api.register_history(exercise_id).await?;
    println!("✅ Exercise {exercise_id} logged");
    Ok(())
}

pub async fn handle_profile(ctx: &Context, args: &ProfileArgs) -> Result<(), GymError> {
    let mut update = ProfileUpdate::rename(args.name.clone());
    if let (Some(old), Some(new)) = (&args.old_password, &args.password) {
        update = update.with_password_change(old.clone(), new.clone());
    }
    ctx.api.update_profile(&update).await?;
    println!("✅ Profile updated");
    Ok(())
}
