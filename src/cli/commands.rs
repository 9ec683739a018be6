use std::time::Duration;

use tracing::debug;

use crate::app::{AppContext, Result};
use crate::domain::{CachedItem, ContentItem, QuoteCache, SourceKind};

/// How long `show` lets a background refill run before the process exits.
const REFILL_DRAIN: Duration = Duration::from_secs(15);

pub async fn show(ctx: &AppContext, refresh: bool) -> Result<()> {
    let item = ctx.provider.get_dynamic_content(refresh).await;
    println!("{}", render(&item));

    let kind = ctx.provider.content_source();
    if !ctx.provider.refiller().wait_idle(kind, REFILL_DRAIN).await {
        debug!("Leaving {} refill unfinished after {:?}", kind, REFILL_DRAIN);
    }
    Ok(())
}

pub fn source(ctx: &AppContext, kind: Option<SourceKind>) -> Result<()> {
    match kind {
        Some(kind) => {
            if ctx.provider.set_content_source(kind) {
                println!("Content source set to {} ({})", kind, kind.label());
            } else {
                eprintln!("Could not save content source {}", kind);
            }
        }
        None => {
            let kind = ctx.provider.content_source();
            println!("{} ({})", kind, kind.label());
        }
    }
    Ok(())
}

pub async fn refill(ctx: &AppContext, kind: SourceKind) -> Result<()> {
    if kind != SourceKind::Quote {
        println!("Only the quote source keeps a pool; {} is fetched once per day", kind);
        return Ok(());
    }

    if ctx.provider.cache_record(kind).is_none() {
        // Seed the pool so there is something to append to. This also
        // starts a background refill, which we wait out below.
        ctx.provider.strategy(kind).serve(false, chrono::Local::now()).await;
    }

    let refiller = ctx.provider.refiller();
    refiller.wait_idle(kind, REFILL_DRAIN).await;
    let added = refiller.run(kind).await;

    let size = ctx
        .storage
        .get::<CachedItem<QuoteCache>>(&kind.cache_key(), false)
        .map(|c| c.data.items.len())
        .unwrap_or(0);
    println!(
        "{}",
        refill_summary(kind, added, size, ctx.config.pool.capacity)
    );
    Ok(())
}

fn refill_summary(kind: SourceKind, added: Option<usize>, size: usize, capacity: usize) -> String {
    match added {
        Some(added) => format!(
            "Added {} items; {} pool holds {}/{} items",
            added, kind, size, capacity
        ),
        None => format!(
            "Another {} refill is still running; pool holds {}/{} items",
            kind, size, capacity
        ),
    }
}

pub fn cache(ctx: &AppContext, kind: SourceKind, clear: bool) -> Result<()> {
    if clear {
        if ctx.provider.clear_cache(kind) {
            println!("Cleared {} cache", kind);
        } else {
            println!("No {} cache to clear", kind);
        }
        return Ok(());
    }

    match ctx.provider.cache_record(kind) {
        Some(raw) => {
            let pretty = serde_json::from_str::<serde_json::Value>(&raw)
                .and_then(|v| serde_json::to_string_pretty(&v))
                .unwrap_or(raw);
            println!("{}", pretty);
        }
        None => println!("No {} cache", kind),
    }
    Ok(())
}

/// Plain-text rendering of an item for the terminal.
pub fn render(item: &ContentItem) -> String {
    let mut out = String::new();
    if let Some(icon) = &item.icon {
        out.push_str(&format!("[{}] ", icon));
    }
    out.push_str(&item.title);
    out.push('\n');
    out.push_str(&item.content);
    if let Some(sub) = &item.sub_content {
        out.push('\n');
        out.push_str(sub);
    }
    out.push_str(&format!("\n—— {}", item.source));
    out
}
