//! CLI command handlers
//!
//! Each handler loads the application configuration, applies the relevant
//! CLI overrides, and drives the reader façade.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::info;

use crate::app::{
    generate_callback_id, ExtractionSpec, FetchRequest, HttpReader, ProxyDescriptor, ProxySetting,
    Reader,
};
use crate::config::AppConfig;

use super::args::{CacheAction, CacheArgs, FetchArgs, GlobalArgs};

/// Handle the fetch command
pub async fn handle_fetch(global: &GlobalArgs, args: FetchArgs) -> anyhow::Result<()> {
    let mut config = AppConfig::load(global.config.clone())
        .await
        .context("Failed to load configuration")?;

    if let Some(data_dir) = &global.data_dir {
        config.data_dir = Some(data_dir.clone());
    }
    if args.no_store {
        config.no_store = true;
    }
    if let Some(days) = args.max_age {
        config.max_age_days = Some(days);
    }

    let mut reader_config = config.to_reader_config();
    if let Some(proxy) = &args.proxy {
        reader_config.client.session.proxy = parse_proxy_flag(proxy);
    }

    let cache_path = args
        .out
        .as_ref()
        .map(|out| resolve_cache_path(&reader_config.data_dir, out));

    let mut reader =
        HttpReader::new(reader_config).context("Failed to initialize the reader")?;

    let mut request = FetchRequest::new(&args.url).force_refresh(args.force);
    if let Some(path) = &cache_path {
        request = request.cache_path(path);
    }
    if let Some(variable) = &args.var {
        let spec = match (&args.callback, args.jsonp) {
            (Some(callback), _) => ExtractionSpec::with_callback(variable, callback),
            (None, true) => ExtractionSpec::with_callback(variable, generate_callback_id()),
            (None, false) => ExtractionSpec::new(variable),
        };
        request = request.extraction(spec);
    }

    let payload = reader
        .fetch(request)
        .await
        .with_context(|| format!("Fetch failed for {}", args.url))?;

    match payload {
        Some(payload) => {
            info!("Fetched {} bytes", payload.len());
            if args.print {
                std::io::stdout().write_all(payload.as_bytes())?;
            } else if let Some(path) = &cache_path {
                println!("Saved {} bytes to {}", payload.len(), path.display());
            } else {
                println!("Fetched {} bytes (not stored)", payload.len());
            }
        }
        None => {
            println!("Document at {} does not contain the requested data", args.url);
        }
    }

    Ok(())
}

/// Handle the cache command
pub async fn handle_cache(global: &GlobalArgs, args: CacheArgs) -> anyhow::Result<()> {
    let mut config = AppConfig::load(global.config.clone())
        .await
        .context("Failed to load configuration")?;
    if let Some(data_dir) = &global.data_dir {
        config.data_dir = Some(data_dir.clone());
    }
    let data_dir = config.data_dir();

    match args.action {
        CacheAction::Info => {
            println!("Cache directory: {}", data_dir.display());
            if !data_dir.exists() {
                println!("  (not created yet)");
                return Ok(());
            }
            let (files, bytes) = directory_summary(&data_dir)?;
            println!("  {files} files, {bytes} bytes");
        }
        CacheAction::Clear { yes } => {
            if !data_dir.exists() {
                println!("Nothing to clear: {}", data_dir.display());
                return Ok(());
            }
            if !yes {
                anyhow::bail!(
                    "Refusing to delete {} without --yes",
                    data_dir.display()
                );
            }
            std::fs::remove_dir_all(&data_dir)
                .with_context(|| format!("Failed to clear {}", data_dir.display()))?;
            println!("Cleared {}", data_dir.display());
        }
    }

    Ok(())
}

/// "tor" resolves to the well-known local SOCKS proxy; anything else is a
/// proxy URL applied to both schemes
fn parse_proxy_flag(proxy: &str) -> ProxySetting {
    if proxy.eq_ignore_ascii_case("tor") {
        ProxySetting::Tor
    } else {
        ProxySetting::Fixed(ProxyDescriptor::all(proxy))
    }
}

/// Relative cache paths land under the data directory
fn resolve_cache_path(data_dir: &Path, out: &Path) -> PathBuf {
    if out.is_absolute() {
        out.to_path_buf()
    } else {
        data_dir.join(out)
    }
}

/// Recursive file count and byte total for a directory
fn directory_summary(dir: &Path) -> std::io::Result<(usize, u64)> {
    let mut files = 0;
    let mut bytes = 0;
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let metadata = entry.metadata()?;
        if metadata.is_dir() {
            let (f, b) = directory_summary(&entry.path())?;
            files += f;
            bytes += b;
        } else {
            files += 1;
            bytes += metadata.len();
        }
    }
    Ok((files, bytes))
}
