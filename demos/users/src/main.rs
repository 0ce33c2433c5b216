//! Command-line walk through the users example.
//!
//! Uses the Loopback API named by `CRUD_STORE_API_URL` when set, otherwise an
//! in-process database. Set `RUST_LOG=debug` to watch the lifecycle events.

use crud_store_core::actions::{CallOptions, CreateConfig, DeleteConfig, UpdateConfig};
use crud_store_core::filter::LoopbackFilter;
use crud_store_core::lifecycle::{ActionKind, Phase};
use crud_store_core::record::PartialRecord;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use users_demo::{AppAction, AppState, AutoConfirm, Backend, Post, Resources, User, app_store};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let backend = Backend::from_env()?;
    println!("=== Users Example ({backend}) ===\n");

    let store = app_store()?;
    let resources = Resources::new(&backend, Arc::new(AutoConfirm))?;
    let users = store.dispatcher::<User>();
    let posts = store.dispatcher::<Post>();

    println!("Creating users...");
    let create = CreateConfig::new().with_redirect("/users/:id");
    let mut created = Vec::new();
    for (name, email) in [
        ("Grace", "grace@example.com"),
        ("Ada", "ada@example.com"),
        ("Linus", "linus@example.com"),
    ] {
        if let Some(user) = resources
            .users
            .create(&users, &create, User::new(name, email), CallOptions::new())
            .await?
        {
            created.push(user);
        }
    }

    let Some(ada) = created.iter().find(|u| u.name == "Ada").cloned() else {
        anyhow::bail!("Ada was not created");
    };
    resources
        .posts
        .create(
            &posts,
            &CreateConfig::new(),
            Post::new("Notes on the Analytical Engine", ada.id.clone()),
            CallOptions::new(),
        )
        .await?;

    let by_name = LoopbackFilter::new().with_order("name ASC");
    list_users(&store, &resources, &by_name).await?;

    println!("\nPromoting Ada to admin...");
    let mut patch = PartialRecord::new();
    patch.insert("admin".into(), json!(true));
    if let Some(id) = ada.id.clone() {
        resources
            .users
            .update(&users, &UpdateConfig::new(), id, patch, CallOptions::new().skip_redirect())
            .await?;
    }
    let model = store.state(|s: &AppState| s.users.model.data.clone()).await;
    println!("  model: {} (admin: {})", model.name, model.admin);

    if let Some(linus) = created.iter().find(|u| u.name == "Linus") {
        if let Some(id) = linus.id.clone() {
            println!("\nDeleting Linus...");
            let delete = DeleteConfig::new()
                .with_confirmation("Delete Linus?")
                .with_refresh(Some(by_name.clone()));
            let counted = store.wait_for(
                |a| matches!(a, AppAction::Users(e) if e.is(ActionKind::Count, Phase::Success)),
                Duration::from_secs(5),
            );
            resources.users.delete(&users, &delete, id, CallOptions::new()).await?;
            counted.await?;
            print_users(&store.state(Clone::clone).await);
        }
    }

    let post_count = store.state(|s: &AppState| s.posts.list.count).await;
    println!("\nPosts counted so far: {post_count}");
    println!("\n=== Demo Complete ===");
    Ok(())
}

async fn list_users(
    store: &users_demo::AppStore,
    resources: &Resources,
    filter: &LoopbackFilter,
) -> anyhow::Result<()> {
    let counted = store.wait_for(
        |a| matches!(a, AppAction::Users(e) if e.is(ActionKind::Count, Phase::Success)),
        Duration::from_secs(5),
    );
    resources
        .users
        .list_and_count(&store.dispatcher::<User>(), Some(filter.clone()))
        .await?;
    counted.await?;

    print_users(&store.state(Clone::clone).await);
    Ok(())
}

fn print_users(state: &AppState) {
    println!("\nUsers ({} total):", state.users.list.count);
    for user in &state.users.list.data {
        let marker = if user.admin { "*" } else { " " };
        println!("  [{marker}] {} <{}>", user.name, user.email);
    }
}
