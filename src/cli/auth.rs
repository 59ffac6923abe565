//! CLI handlers for sign-in, sign-up, status and sign-out.

use super::{Context, LoginArgs, SignupArgs};
use crate::error::GymError;

/// Handle `ignite-gym auth login`.
pub async fn handle_login(ctx: &Context, args: &LoginArgs) -> Result<(), GymError> {
    let user = ctx.session.sign_in(&args.email, &args.password).await?;
    println!("✅ Signed in as {} <{}>", user.name, user.email);
    Ok(())
}

/// Handle `ignite-gym auth signup`.
pub async fn handle_signup(ctx: &Context, args: &SignupArgs) -> Result<(), GymError> {
    let user = ctx
        .session
        .sign_up(&args.name, &args.email, &args.password)
        .await?;
    println!("✅ Account created; signed in as {} <{}>", user.name, user.email);
    Ok(())
}

/// Handle `ignite-gym auth status`.
pub fn handle_status(ctx: &Context) -> Result<(), GymError> {
    match ctx.session.current_user() {
        Some(user) => {
            println!("Signed in as {} <{}>", user.name, user.email);
            let token = if ctx.session.client().access_token().is_some() {
                "stored"
            } else {
                "missing"
            };
            println!("   Access token: {token}");
        }
        None => println!("Not signed in"),
    }
    Ok(())
}

/// Handle `ignite-gym auth logout`.
pub async fn handle_logout(ctx: &Context) -> Result<(), GymError> {
    ctx.session.sign_out().await?;
    println!("✅ Signed out");
    Ok(())
}
