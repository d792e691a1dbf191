//! `reelsyncctl`: command-line front end for the reelsync catalog cache.

mod cli;
mod session_file;

use anyhow::{Context, bail};
use clap::Parser;
use futures::StreamExt;
use reelsync_core::{CatalogContext, ClientConfig};
use reelsync_model::{ItemId, MediaItem, MediaItemQuery, MediaStream, SourceId};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Command};
use session_file::{SavedSession, SessionFile};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    "warn,reelsync_core=info,reelsyncctl=info".into()
                }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = ClientConfig::load();
    let ctx = CatalogContext::open(config)
        .await
        .context("failed to open the catalog")?;
    let session_file = SessionFile::in_dir(&ctx.config.data_dir());
    let saved = session_file.restore_into(&ctx.session);

    let out = Output { json: cli.json };
    let result = run(&ctx, &session_file, saved, cli.command, out).await;
    ctx.store.close().await;
    result
}

async fn run(
    ctx: &CatalogContext,
    session_file: &SessionFile,
    saved: Option<SavedSession>,
    command: Command,
    out: Output,
) -> anyhow::Result<()> {
    match command {
        Command::Login {
            server,
            username,
            password,
        } => {
            let user = ctx
                .auth
                .login(&server, &username, &password)
                .await
                .context("login failed")?;
            session_file.save(&SavedSession::from(&user))?;
            info!(server = %user.server_url, "Session saved");
            println!("Logged in to {} as {}", user.server_url, user.user_name);
        }
        Command::Logout => {
            ctx.auth.logout();
            session_file.remove()?;
            ctx.repository
                .clear()
                .await
                .context("failed to clear the local catalog")?;
            println!("Logged out");
        }
        Command::Status => {
            print_status(ctx, saved.as_ref(), session_file, out)?
        }
        Command::List { cache_key, refresh } => {
            let query = parse_query(&cache_key)?;
            if refresh {
                refresh_list(ctx, &query).await?;
            }
            // Subscribe after the refresh so the first read sees its write
            let items = ctx
                .repository
                .observe_list(&query)
                .next()
                .await
                .unwrap_or_default();
            out.items(&items)?;
        }
        Command::Item { id, refresh } => {
            let id = ItemId::from(id);
            if refresh {
                require_login(ctx)?;
                ctx.repository
                    .refresh_item(&id)
                    .await
                    .with_context(|| format!("failed to refresh item {id}"))?;
            }
            let Some(item) =
                ctx.repository.observe_item(&id).next().await.flatten()
            else {
                bail!("item {id} is not cached; try --refresh");
            };
            out.items(std::slice::from_ref(&item))?;

            let sources = ctx.store.sources_for_item(&id).await;
            for source in sources {
                if let Some(source) =
                    ctx.repository.get_source(&SourceId::from(source.id)).await
                {
                    out.source(
                        &source.id,
                        source.container.container.as_deref(),
                        &source.streams,
                    )?;
                }
            }
        }
        Command::Streams { id } => {
            let id = ItemId::from(id);
            let options = ctx
                .repository
                .observe_stream_options(&id)
                .next()
                .await
                .flatten();
            match options {
                Some(options) => out.json_or(&options, || {
                    println!("source\t{}", options.source_id);
                    for stream in options
                        .video
                        .iter()
                        .chain(&options.audio)
                        .chain(&options.subtitles)
                    {
                        println!("{}", describe_stream(stream));
                    }
                    println!(
                        "default audio\t{}",
                        display_index(options.default_audio_index)
                    );
                    println!(
                        "default subtitle\t{}",
                        display_index(options.default_subtitle_index)
                    );
                })?,
                None => bail!(
                    "no primary source cached for {id}; \
                     try `item {id} --refresh`"
                ),
            }
        }
        Command::SelectSource { item, source } => {
            let item = ItemId::from(item);
            let source = SourceId::from(source);
            if !ctx.repository.select_primary_source(&item, &source).await {
                bail!("{source} is not a cached source of {item}");
            }
            println!("Primary source of {item} is now {source}");
        }
        Command::Watch { cache_key, refresh } => {
            let query = parse_query(&cache_key)?;
            let mut list = ctx.repository.observe_list(&query);
            if refresh {
                refresh_list(ctx, &query).await?;
            }
            loop {
                tokio::select! {
                    next = list.next() => match next {
                        Some(items) => out.items(&items)?,
                        None => break,
                    },
                    _ = tokio::signal::ctrl_c() => break,
                }
            }
        }
    }
    Ok(())
}

fn parse_query(cache_key: &str) -> anyhow::Result<MediaItemQuery> {
    MediaItemQuery::from_cache_key(cache_key)
        .with_context(|| format!("unrecognized cache key {cache_key:?}"))
}

fn require_login(ctx: &CatalogContext) -> anyhow::Result<()> {
    if !ctx.session.is_logged_in() {
        bail!("not logged in; run `reelsyncctl login` first");
    }
    Ok(())
}

async fn refresh_list(
    ctx: &CatalogContext,
    query: &MediaItemQuery,
) -> anyhow::Result<()> {
    require_login(ctx)?;
    if let Err(err) = ctx.repository.refresh_list(query).await {
        // Cached data is still worth printing
        warn!(query = %query, "Refresh failed: {err}");
        eprintln!("refresh failed: {err}");
    }
    Ok(())
}

fn print_status(
    ctx: &CatalogContext,
    saved: Option<&SavedSession>,
    session_file: &SessionFile,
    out: Output,
) -> anyhow::Result<()> {
    #[derive(Serialize)]
    struct Status<'a> {
        logged_in: bool,
        server_url: Option<&'a str>,
        user_name: Option<&'a str>,
        saved_at: Option<String>,
        database: String,
        session_file: String,
    }

    let session = ctx.session.current();
    let status = Status {
        logged_in: session.is_logged_in(),
        server_url: session.server_url(),
        user_name: saved.map(|s| s.user_name.as_str()),
        saved_at: saved.map(|s| s.saved_at.to_rfc3339()),
        database: ctx.config.database_path.display().to_string(),
        session_file: session_file.path().display().to_string(),
    };

    out.json_or(&status, || {
        match (status.server_url, status.user_name) {
            (Some(server), Some(user)) => {
                println!("Logged in to {server} as {user}")
            }
            (Some(server), None) => println!("Logged in to {server}"),
            _ => println!("Logged out"),
        }
        println!("database\t{}", status.database);
        println!("session\t{}", status.session_file);
    })
}

fn describe_stream(stream: &MediaStream) -> String {
    let mut parts = vec![
        stream.index.to_string(),
        stream.kind.as_str().to_string(),
        stream.codec.clone().unwrap_or_default(),
        stream.language.clone().unwrap_or_default(),
        stream.title.clone().unwrap_or_default(),
    ];
    if let (Some(w), Some(h)) = (stream.width, stream.height) {
        parts.push(format!("{w}x{h}"));
    }
    if let Some(channels) = stream.channels {
        parts.push(format!("{channels}ch"));
    }
    if stream.is_default {
        parts.push("default".into());
    }
    if stream.is_forced {
        parts.push("forced".into());
    }
    parts.join("\t")
}

fn display_index(index: Option<i64>) -> String {
    index.map(|i| i.to_string()).unwrap_or_else(|| "-".into())
}

#[derive(Debug, Clone, Copy)]
struct Output {
    json: bool,
}

impl Output {
    fn json_or<T: Serialize>(
        &self,
        value: &T,
        text: impl FnOnce(),
    ) -> anyhow::Result<()> {

        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            text();
        }
        Ok(())
    }

    fn items(&self, items: &[MediaItem]) -> anyhow::Result<()> {
        self.json_or(&items, || {
            for item in items {
                let year = item
                    .metadata
                    .production_year
                    .map(|y| y.to_string())
                    .unwrap_or_default();
                println!(
                    "{}\t{}\t{}\t{}\t{:?}",
                    item.id,
                    item.kind,
                    item.name,
                    year,
                    item.play_action()
                );
            }
        })
    }

    fn source(
        &self,
        id: &SourceId,
        container: Option<&str>,
        streams: &[MediaStream],
    ) -> anyhow::Result<()> {
        self.json_or(&streams, || {
            println!("source\t{id}\t{}", container.unwrap_or("-"));
            for stream in streams {
                println!("  {}", describe_stream(stream));
            }
        })
    }
}
