//! Log in, browse and publish against a running Blogsite backend
//!
//! Usage:
//!   BLOGSITE_USER=alice BLOGSITE_PASSWORD=secret123 cargo run --example blog_session

use blogsite_client::{AuthClient, AuthClientConfig, BlogSearch, FileStorage};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = AuthClientConfig::from_env()?;
    let username = std::env::var("BLOGSITE_USER").unwrap_or_else(|_| "alice".to_string());
    let password = std::env::var("BLOGSITE_PASSWORD").unwrap_or_else(|_| "secret123".to_string());
    let storage_path = std::env::var("BLOGSITE_STORAGE").unwrap_or_else(|_| ".blogsite-session.json".to_string());

    println!("=== Blogsite Client Example ===");
    println!("Backend: {}", config.base_url);
    println!("Session file: {}", storage_path);
    println!();

    let client = AuthClient::builder(config)
        .storage(Arc::new(FileStorage::open(&storage_path)?))
        .navigator(Arc::new(|path: &str| println!("! Session expired, please log in again ({path})")))
        .build()?;

    match client.session() {
        Some(session) => println!("✓ Resuming session for {}", session.username),
        None => {
            println!("Logging in as {}...", username);
            let login = client.login(&username, &password).await?;
            println!("✓ Logged in with roles {:?}", login.roles);
        }
    }
    println!();

    let categories = client.category_names().await?;
    println!("Categories: {}", categories.join(", "));

    let category = categories.first().cloned().unwrap_or_default();
    match client.search_blogs(&category, None, None).await? {
        BlogSearch::Blogs(blogs) => {
            println!("{} blog(s) in {:?}:", blogs.len(), category);
            for blog in blogs {
                println!("  - [{}] {} by {}", blog.id, blog.blog_name, blog.author_name.as_deref().unwrap_or("unknown"));
                println!("    {}", blog.excerpt(80));
            }
        }
        BlogSearch::Summary(summary) => {
            println!("{} blog(s) in {:?}", summary.total_count, summary.category);
        }
    }
    println!();

    if std::env::var("BLOGSITE_LOGOUT").is_ok() {
        client.logout().await?;
        println!("✓ Logged out");
    }

    Ok(())
}
