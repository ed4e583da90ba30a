use std::env;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use log::info;

use proton_runtime::{
    AssetArchive, CacheConfig, DiskFiles, FailurePolicy, FileSource, Handle, HeadlessGpu,
    LoadStatus, ResourceCache, Texture, UnloadOutcome,
};

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = CliOptions::parse(env::args().skip(1))?;
    let files = open_source(&options.root)?;
    let gpu = HeadlessGpu::new();
    let config = CacheConfig::default().with_failure_policy(options.failure_policy);
    let mut cache = ResourceCache::new(files, gpu.clone()).with_config(config);

    let mut loaded: Vec<Handle<Texture>> = Vec::new();
    let mut failures = 0usize;
    for asset in &options.assets {
        for _ in 0..options.repeat {
            match cache.load::<Texture>(asset, options.lock, 0) {
                Ok(handle) => {
                    report_load(&cache, asset, handle);
                    loaded.push(handle);
                }
                Err(err) => {
                    println!("Failed {asset}: {err}");
                    failures += 1;
                    break;
                }
            }
        }
    }

    println!(
        "Cached {} resource(s), {} GPU texture(s)",
        cache.count(),
        gpu.live_textures()
    );
    print_usage(&cache);

    if options.release {
        for handle in loaded {
            let name = cache
                .info(handle)
                .map(|info| info.filename().to_string())
                .unwrap_or_default();
            match cache.unload(handle)? {
                UnloadOutcome::Released { remaining } => {
                    println!("Released {name} ({remaining} left)")
                }
                UnloadOutcome::Retained => println!("Retained {name} (locked)"),
                UnloadOutcome::Destroyed => println!("Destroyed {name}"),
            }
        }
        println!("Remaining {} resource(s)", cache.count());
    }

    cache.display_usage();
    if failures > 0 {
        info!("{failures} asset(s) failed to load");
    }
    Ok(())
}

fn open_source(root: &str) -> Result<Box<dyn FileSource>> {
    let path = Path::new(root);
    if path.is_file() {
        let archive = AssetArchive::open(path)
            .with_context(|| format!("failed to open archive {root}"))?;
        println!("Opened archive with {} file(s)", archive.files().len());
        Ok(Box::new(archive))
    } else if path.is_dir() {
        Ok(Box::new(DiskFiles::new(path)))
    } else {
        Err(anyhow!("asset root {root} does not exist"))
    }
}

fn report_load(cache: &ResourceCache, asset: &str, handle: Handle<Texture>) {
    let (Some(info), Some(texture)) = (cache.info(handle), cache.get(handle)) else {
        return;
    };
    let status = match info.status() {
        LoadStatus::Loaded => "",
        LoadStatus::Failed => " [failed]",
    };
    println!(
        "Loaded {asset} -> {} {}x{} alpha={} refs={}{status}",
        info.filename(),
        texture.width(),
        texture.height(),
        texture.has_alpha(),
        info.ref_count()
    );
}

fn print_usage(cache: &ResourceCache) {
    println!("Resource usage:");
    for entry in cache.usage() {
        println!(
            " [{:02}] {} ({}) refs={} locked={} size={}",
            entry.bucket, entry.path, entry.type_name, entry.ref_count, entry.locked, entry.size
        );
    }
}

#[derive(Debug, PartialEq)]
struct CliOptions {
    root: String,
    assets: Vec<String>,
    lock: bool,
    release: bool,
    repeat: usize,
    failure_policy: FailurePolicy,
}

const USAGE: &str = "Usage: proton-runtime <asset-dir|archive> <asset>... [--lock] [--release] [--repeat N] [--strict|--keep-inert]";

impl CliOptions {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self> {
        let Some(root) = args.next() else {
            return Err(anyhow!(USAGE));
        };
        let mut options = CliOptions {
            root,
            assets: Vec::new(),
            lock: false,
            release: false,
            repeat: 1,
            failure_policy: FailurePolicy::Strict,
        };
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--lock" => options.lock = true,
                "--release" => options.release = true,
                "--strict" => options.failure_policy = FailurePolicy::Strict,
                "--keep-inert" => options.failure_policy = FailurePolicy::KeepInert,
                "--repeat" => {
                    let value = args
                        .next()
                        .ok_or_else(|| anyhow!("--repeat expects a count"))?;
                    options.repeat = value
                        .parse::<usize>()
                        .ok()
                        .filter(|count| *count > 0)
                        .ok_or_else(|| anyhow!("invalid repeat count: {value}"))?;
                }
                other if other.starts_with("--") => {
                    return Err(anyhow!("Unknown argument: {other}. {USAGE}"));
                }
                _ => options.assets.push(arg),
            }
        }
        if options.assets.is_empty() {
            return Err(anyhow!(USAGE));
        }
        Ok(options)
    }
}
