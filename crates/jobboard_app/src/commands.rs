use std::sync::Arc;

use anyhow::{bail, Context};
use jobboard_core::{FeedView, JobCardView, JobListing};
use jobboard_engine::{JobFeed, KeyValueStore, ProfileStore, ReqwestFeedSource, SelectionStore};
use jobboard_logging::{board_info, board_warn};

use crate::config::AppConfig;

pub const USAGE: &str = "\
Usage: jobboard <command>

Commands:
  feed [--pages N]          Show the latest openings, N pages deep (default 1)
  save <id> [--pages N]     Save or unsave the listing with <id> from the feed
  saved                     List saved jobs
  clear                     Remove all saved jobs
  profile-image [URI]       Show or set the profile image
  help                      Show this message";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Feed { pages: usize },
    Toggle { id: String, pages: usize },
    Saved,
    Clear,
    ProfileImage(Option<String>),
    Help,
}

pub fn parse_args<I>(args: I) -> anyhow::Result<Command>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let Some(name) = args.next() else {
        return Ok(Command::Help);
    };
    let rest: Vec<String> = args.collect();

    let command = match name.as_str() {
        "feed" => Command::Feed {
            pages: parse_pages(&rest)?,
        },
        "save" => {
            let Some(id) = rest.first().filter(|id| !id.starts_with("--")) else {
                bail!("save needs a listing id");
            };
            Command::Toggle {
                id: id.clone(),
                pages: parse_pages(&rest[1..])?,
            }
        }
        "saved" => Command::Saved,
        "clear" => Command::Clear,
        "profile-image" => Command::ProfileImage(rest.first().cloned()),
        "help" | "--help" | "-h" => Command::Help,
        other => bail!("unknown command `{other}`\n\n{USAGE}"),
    };
    Ok(command)
}

fn parse_pages(args: &[String]) -> anyhow::Result<usize> {
    match args {
        [] => Ok(1),
        [flag, value] if flag == "--pages" => {
            let pages: usize = value
                .parse()
                .with_context(|| format!("--pages expects a number, got `{value}`"))?;
            if pages == 0 {
                bail!("--pages must be at least 1");
            }
            Ok(pages)
        }
        other => bail!("unexpected arguments: {}", other.join(" ")),
    }
}

pub async fn run(
    command: Command,
    config: &AppConfig,
    storage: Arc<dyn KeyValueStore>,
) -> anyhow::Result<()> {
    match command {
        Command::Feed { pages } => {
            let selection = open_selection(storage).await;
            let feed = load_feed(config, pages).await?;
            print_feed(&feed.view(selection.len(), |id| selection.is_selected(id)));
        }
        Command::Toggle { id, pages } => {
            let selection = open_selection(storage).await;
            let listing = match selection.list().into_iter().find(|l| l.id == id) {
                Some(saved) => saved,
                None => find_in_feed(config, &id, pages).await?,
            };
            let saved = selection.toggle(&listing);
            selection.flush().await;
            println!(
                "{} {}: {}",
                if saved { "Saved" } else { "Removed" },
                listing.id,
                listing.title
            );
        }
        Command::Saved => {
            let selection = open_selection(storage).await;
            print_saved(&selection.list());
        }
        Command::Clear => {
            let selection = open_selection(storage).await;
            let count = selection.len();
            selection.clear();
            selection.flush().await;
            println!("Removed {count} saved jobs");
        }
        Command::ProfileImage(uri) => {
            let profile = ProfileStore::new(storage);
            match uri {
                Some(uri) => {
                    profile.save_image(&uri).await?;
                    println!("Profile image set to {}", uri.trim());
                }
                None => match profile.load_image().await {
                    Some(uri) => println!("{uri}"),
                    None => println!("No profile image set"),
                },
            }
        }
        Command::Help => println!("{USAGE}"),
    }
    Ok(())
}

async fn open_selection(storage: Arc<dyn KeyValueStore>) -> SelectionStore {
    let (selection, corrupt) = SelectionStore::initialize(storage).await;
    if let Some(err) = corrupt {
        board_warn!("Saved jobs were reset: {}", err);
    }
    selection
}

async fn load_feed(config: &AppConfig, pages: usize) -> anyhow::Result<JobFeed> {
    let source = ReqwestFeedSource::new(config.feed_settings())?;
    let feed = JobFeed::new(Arc::new(source), config.page_size);
    feed.fetch_initial().await?;
    for _ in 1..pages {
        let before = feed.snapshot().items.len();
        let after = feed.load_more().await?.snapshot().items.len();
        if after == before {
            board_info!("Feed exhausted at {} listings", after);
            break;
        }
    }
    Ok(feed)
}

async fn find_in_feed(config: &AppConfig, id: &str, pages: usize) -> anyhow::Result<JobListing> {
    let feed = load_feed(config, pages).await?;
    match feed.snapshot().items.into_iter().find(|l| l.id == id) {
        Some(listing) => Ok(listing),
        None => bail!("no listing with id {id} in the first {} jobs", feed.snapshot().requested_count),
    }
}

fn print_feed(view: &FeedView) {
    println!(
        "Latest openings ({} shown, {} saved)",
        view.cards.len(),
        view.saved_count
    );
    for card in &view.cards {
        print_card(card);
    }
}

fn print_saved(saved: &[JobListing]) {
    if saved.is_empty() {
        println!("No saved jobs yet");
        return;
    }
    println!("Saved jobs ({})", saved.len());
    for listing in saved {
        print_card(&JobCardView::from_listing(listing, true));
    }
}

fn print_card(card: &JobCardView) {
    let marker = if card.saved { "*" } else { " " };
    println!(
        "{marker} [{}] {} | {} ({})",
        card.id,
        card.title,
        if card.company.is_empty() { card.initial.to_string() } else { card.company.clone() },
        card.tags.join(", ")
    );
    println!("      {}", card.apply_url);
}
