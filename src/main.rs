use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::LocalSet;
use tracing::{error, info, warn};

use feedwatch::{App, Config, Dispatcher, I18n, PostId, StateStore, TextRenderer, Translator};

/// RSS subscription and polling engine.
#[derive(Parser, Debug)]
#[command(name = "feedwatch", version)]
#[command(about = "Subscribe to RSS feeds and watch them for new posts")]
struct Args {
    /// Configuration file
    #[arg(short, long, value_name = "PATH", default_value = "config.toml")]
    config: PathBuf,

    /// Feed URLs to subscribe to at startup
    #[arg(value_name = "URL")]
    urls: Vec<String>,
}

fn main() {
    let args = Args::parse();

    // Load configuration
    let config = match Config::load_with_env(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {}: {e}", args.config.display());
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    // Initialize logging
    if let Err(e) = feedwatch::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        feedwatch::logging::init_console_only(&config.logging.level);
    }

    if let Err(e) = config.validate() {
        error!("{e}");
        std::process::exit(1);
    }

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to start runtime: {e}");
            std::process::exit(1);
        }
    };

    let local = LocalSet::new();
    if let Err(e) = local.block_on(&runtime, run(config, args.urls)) {
        error!("{e}");
        std::process::exit(1);
    }
}

async fn run(config: Config, extra_urls: Vec<String>) -> feedwatch::Result<()> {
    let translator: Rc<dyn Translator> = Rc::new(I18n::from_config(&config.locale)?);
    let store = Rc::new(RefCell::new(StateStore::new()));
    let renderer = Rc::new(RefCell::new(TextRenderer::new(std::io::stdout())));
    let _dispatcher = Dispatcher::attach(&mut store.borrow_mut(), renderer, translator)?;

    let mut app = App::from_config(&config, Rc::clone(&store))?;
    info!(
        "feedwatch started, polling every {} ms",
        config.poll.interval_ms
    );

    for url in config.feeds.urls.iter().chain(extra_urls.iter()) {
        submit(&mut app, url).await;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        if !stdin_open {
            tokio::signal::ctrl_c().await?;
            info!("Interrupted");
            break;
        }

        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result?;
                info!("Interrupted");
                break;
            }
            line = lines.next_line() => match line? {
                Some(line) => {
                    if !handle_line(&mut app, line.trim()).await {
                        break;
                    }
                }
                None => {
                    info!("Input closed, polling until interrupted");
                    stdin_open = false;
                }
            }
        }
    }

    app.shutdown();
    Ok(())
}

/// Handle one input line. Returns `false` when the user asked to quit.
async fn handle_line(app: &mut App, line: &str) -> bool {
    let (command, argument) = line.split_once(' ').unwrap_or((line, ""));

    match command {
        ":quit" | ":q" => return false,
        ":open" => {
            if let Some(post_id) = post_at(app, argument) {
                report(app.open_post(post_id));
            }
        }
        ":read" => {
            if let Some(post_id) = post_at(app, argument) {
                report(app.mark_post_read(post_id));
            }
        }
        ":close" => report(app.close_post()),
        ":stats" => {
            let feeds = app.store().borrow().state().data.feeds.clone();
            for feed in feeds {
                if let Some(stats) = app.poll_stats(feed.id) {
                    info!(
                        "{}: {} cycle(s), {} failure(s), {} new post(s)",
                        feed.url, stats.cycles, stats.failures, stats.new_posts
                    );
                }
            }
        }
        _ => submit(app, line).await,
    }
    true
}

async fn submit(app: &mut App, url: &str) {
    match app.submit(url).await {
        Ok(outcome) => info!("{}: {}", url, outcome.feedback_key()),
        Err(e) => error!("Subscribing to {} failed: {}", url, e),
    }
}

/// The post at a 1-based position of the displayed list.
fn post_at(app: &App, position: &str) -> Option<PostId> {
    let index = match position.trim().parse::<usize>() {
        Ok(n) if n > 0 => n - 1,
        _ => {
            warn!("Expected a post number, got {:?}", position);
            return None;
        }
    };
    let post_id = app
        .store()
        .borrow()
        .state()
        .data
        .posts
        .get(index)
        .map(|post| post.id);
    if post_id.is_none() {
        warn!("No post number {}", index + 1);
    }
    post_id
}

fn report(result: feedwatch::Result<()>) {
    if let Err(e) = result {
        warn!("{e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Args::try_parse_from(["feedwatch"]).unwrap();
        assert_eq!(args.config, PathBuf::from("config.toml"));
        assert!(args.urls.is_empty());
    }

    #[test]
    fn test_args_config_and_urls() {
        let args = Args::try_parse_from([
            "feedwatch",
            "-c",
            "/etc/feedwatch.toml",
            "https://a.example/rss",
            "https://b.example/rss",
        ])
        .unwrap();
        assert_eq!(args.config, PathBuf::from("/etc/feedwatch.toml"));
        assert_eq!(args.urls, vec!["https://a.example/rss", "https://b.example/rss"]);
    }

    #[test]
    fn test_args_config_requires_value() {
        let err = Args::try_parse_from(["feedwatch", "--config"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }

    #[test]
    fn test_args_unknown_flag_is_rejected() {
        let err = Args::try_parse_from(["feedwatch", "-v", "https://a.example/rss"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }
}
