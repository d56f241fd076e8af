use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, bail};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::debug;

use charitable_api::{DonationApi, FeedPager, HttpApi};
use charitable_checkout::{CheckoutOutcome, DonationCheckoutFlow, DonationRequest};
use charitable_identity::{GuestIdentity, SqliteStore};
use charitable_reactions::ReactionController;
use charitable_types::api::DonorDetails;
use charitable_types::events::{ClientEvent, EventBus};
use charitable_types::ids::{NonprofitId, PostId, SessionId};
use charitable_types::models::{Nonprofit, Post};
use charitable_types::money::format_cents;

use crate::browser::TerminalBrowser;

pub struct Context {
    pub api: HttpApi,
    pub identity: Arc<GuestIdentity<SqliteStore>>,
    pub timeout: Duration,
}

fn print_post(post: &Post) {
    let progress = match post.progress_percent() {
        Some(p) => format!("{p:.0}% of {}", format_cents(post.goal_amount.unwrap_or(0))),
        None => "no goal".to_string(),
    };
    println!(
        "  [{}] {} | {} likes | {}",
        post.id,
        post.title,
        post.likes(),
        progress
    );
}

fn print_nonprofit(np: &Nonprofit) {
    let badge = if np.verified() { " (verified)" } else { "" };
    println!(
        "  [{}] {}{} | {} | {} raised",
        np.id,
        np.name,
        badge,
        np.category.label(),
        format_cents(np.total_raised_cents())
    );
}

pub async fn feed(ctx: &Context, limit: u32, pages: usize) -> anyhow::Result<()> {
    let guest = ctx.identity.get_or_create().await?;
    let mut pager = FeedPager::new(ctx.api.clone(), limit).with_viewer(guest);

    for _ in 0..pages {
        let Some(items) = pager.next_page().await? else {
            println!("(end of feed)");
            break;
        };
        for item in &items {
            print_post(&item.post);
            let liked = if item.has_reacted == Some(true) { ", liked" } else { "" };
            println!("      by {}{}", item.nonprofit.name, liked);
        }
    }

    debug!(seen = pager.seen_count(), "feed walk finished");
    Ok(())
}

pub async fn nonprofits(ctx: &Context) -> anyhow::Result<()> {
    for np in ctx.api.get_nonprofits().await? {
        print_nonprofit(&np);
    }
    Ok(())
}

pub async fn nonprofit(ctx: &Context, slug: &str) -> anyhow::Result<()> {
    let np = match ctx.api.get_nonprofit_by_slug(slug).await {
        Ok(np) => np,
        Err(e) if e.is_not_found() => bail!("no nonprofit with slug '{slug}'"),
        Err(e) => return Err(e.into()),
    };

    print_nonprofit(&np);
    println!("\n{}", np.mission);
    if let Some(description) = &np.description {
        println!("\n{description}");
    }
    Ok(())
}

pub async fn posts(ctx: &Context, nonprofit_id: NonprofitId) -> anyhow::Result<()> {
    let posts = ctx.api.get_posts_by_nonprofit(&nonprofit_id).await?;
    if posts.is_empty() {
        println!("(no posts)");
    }
    for post in &posts {
        print_post(post);
    }
    Ok(())
}

pub async fn like(ctx: &Context, post_id: PostId) -> anyhow::Result<()> {
    let post = ctx.api.get_post(&post_id).await?;

    let events = EventBus::new();
    let mut hints = events.subscribe();
    let controller = ReactionController::new(ctx.api.clone(), ctx.identity.clone(), events);

    let mut view = controller.mount(post_id.clone(), post.likes());
    let wait = ctx.timeout + Duration::from_secs(5);

    tokio::time::timeout(wait, view.wait_for(|v| v.liked.is_some()))
        .await
        .context("timed out reading like state")?
        .context("reaction state went away")?;

    controller.tap(&post_id);

    let (liked, count) = tokio::time::timeout(wait, await_reaction(&mut hints, &post_id))
        .await
        .context("timed out waiting for the server")?
        .map_err(|message| anyhow::anyhow!("like failed: {message}"))?;

    let verb = if liked { "Liked" } else { "Unliked" };
    println!("{verb} '{}' ({count} likes)", post.title);
    Ok(())
}

/// Wait for this post's toggle to settle or roll back.
async fn await_reaction(
    hints: &mut broadcast::Receiver<ClientEvent>,
    post_id: &PostId,
) -> Result<(bool, u64), String> {
    loop {
        match hints.recv().await {
            Ok(ClientEvent::ReactionSettled {
                post_id: id,
                liked,
                count,
            }) if id == *post_id => return Ok((liked, count)),
            Ok(ClientEvent::ReactionRolledBack { post_id: id, message }) if id == *post_id => {
                return Err(message);
            }
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => debug!(skipped, "reaction hints lagged"),
            Err(RecvError::Closed) => return Err("event bus closed".into()),
        }
    }
}

pub async fn donate(
    ctx: &Context,
    nonprofit_id: NonprofitId,
    cents: u64,
    post_id: Option<PostId>,
    donor: DonorDetails,
) -> anyhow::Result<()> {
    let mut req = DonationRequest::new(nonprofit_id, cents).with_donor(donor);
    if let Some(post_id) = post_id {
        req = req.for_post(post_id);
    }

    let flow = DonationCheckoutFlow::new(ctx.api.clone(), TerminalBrowser, EventBus::new());
    match flow.start(&req).await? {
        CheckoutOutcome::Returned { session_id } => {
            println!(
                "Returned from checkout. Run `charitable verify {session_id}` to confirm the payment."
            );
        }
        CheckoutOutcome::Cancelled { .. } => println!("Donation cancelled."),
    }
    Ok(())
}

pub async fn verify(ctx: &Context, session_id: SessionId) -> anyhow::Result<()> {
    let resp = ctx.api.verify_donation(&session_id).await?;
    match resp.donation {
        Some(d) => println!(
            "{} to {}: {:?}{}",
            format_cents(d.amount),
            d.nonprofit_id,
            d.status,
            if d.status.is_settled() { " (settled)" } else { "" }
        ),
        None if resp.success => println!("Payment confirmed."),
        None => println!("Payment not confirmed."),
    }
    Ok(())
}

pub async fn whoami(ctx: &Context, state: &Path) -> anyhow::Result<()> {
    let guest = ctx.identity.get_or_create().await?;
    println!("{guest}  ({})", state.display());
    Ok(())
}
