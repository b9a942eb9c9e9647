//! Subcommand handlers. Each writes its report to `out`.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use rand::SeedableRng;
use rand::rngs::StdRng;
use xunsearch_client::{SearchCandidates, resolve_search_with};
use xunsearch_core::config::{KEY_DEFAULT_CHARSET, KEY_PROJECT_NAME, KEY_SERVER_INDEX, KEY_SERVER_SEARCH};
use xunsearch_core::{CacheStore, CachedConfigLoader, FieldScheme, FileSource, MemoryCacheStore};
use xunsearch_redis::RedisCacheStore;

/// Load, validate and describe a project ini.
pub fn check(ini: &Path, redis: Option<&str>, out: &mut impl Write) -> Result<()> {
    let store: Arc<dyn CacheStore> = match redis {
        Some(url) => Arc::new(RedisCacheStore::open(url)?),
        None => Arc::new(MemoryCacheStore::new()),
    };
    let loader = CachedConfigLoader::new(store);
    let config = loader
        .load(&FileSource::new(ini))
        .with_context(|| format!("loading {}", ini.display()))?;
    let scheme = FieldScheme::from_config(&config)
        .with_context(|| format!("validating {}", ini.display()))?;

    let scalar = |key: &str| config.scalar(key).unwrap_or("-");
    writeln!(out, "project:  {}", scalar(KEY_PROJECT_NAME))?;
    writeln!(out, "charset:  {}", scalar(KEY_DEFAULT_CHARSET))?;
    writeln!(out, "index:    {}", scalar(KEY_SERVER_INDEX))?;
    writeln!(out, "search:   {}", scalar(KEY_SERVER_SEARCH))?;
    writeln!(out, "fields:   {}", scheme.len())?;

    for field in scheme.fields() {
        writeln!(
            out,
            "  {:>2}  {:<16} {:<8} {:<10} index={:?} weight={} tokenizer={}",
            field.vno(),
            field.name(),
            field.role().to_string(),
            format!("{:?}", field.field_type()).to_lowercase(),
            field.index_mode(),
            field.weight(),
            field.tokenizer(),
        )?;
    }
    Ok(())
}

/// Print the primary and shard targets of an index connection value.
pub fn resolve_index(value: Option<&str>, out: &mut impl Write) -> Result<()> {
    let targets = xunsearch_client::resolve_index(value);
    writeln!(out, "primary: {}", targets.primary())?;
    for shard in targets.shards() {
        writeln!(out, "shard:   {shard}")?;
    }
    Ok(())
}

/// Print search candidates in the order they would be tried.
pub fn resolve_search(value: Option<&str>, seed: Option<u64>, out: &mut impl Write) -> Result<()> {
    let candidates: SearchCandidates = match seed {
        Some(seed) => resolve_search_with(value, &mut StdRng::seed_from_u64(seed)),
        None => resolve_search_with(value, &mut rand::rng()),
    };
    for (i, target) in candidates.targets().iter().enumerate() {
        writeln!(out, "{}. {target}", i + 1)?;
    }
    Ok(())
}

/// Print the approximate distance between two points.
pub fn geo(lon1: f64, lat1: f64, lon2: f64, lat2: f64, out: &mut impl Write) -> Result<()> {
    let meters = xunsearch_core::geo_distance(lon1, lat1, lon2, lat2);
    writeln!(out, "{meters:.2} m")?;
    Ok(())
}
