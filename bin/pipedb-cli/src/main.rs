//! PipeDB CLI - Command Line Interface
//!
//! This binary operates a block repository stored in a data directory and
//! manages PipeDB settings files.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use pipedb_common::{InputBlock, Key, OutputBlock, Return};
use pipedb_settings::{Settings, SettingsReloader};
use pipedb_store::{BackendKind, BlockRepository, RepositoryConfig, create_repository};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "pipedb")]
#[command(about = "PipeDB repository CLI")]
#[command(version)]
struct Args {
    /// Data directory of the repository
    #[arg(short, long, env = "PIPEDB_DATA_DIR", default_value = "pipedb-data")]
    data_dir: PathBuf,

    /// Storage backend (memory, redb); a memory repository lives only
    /// for the duration of one command
    #[arg(short, long, default_value = "redb")]
    backend: BackendKind,

    /// Settings file selecting backend and data directory; overrides
    /// --backend and --data-dir
    #[arg(short, long, env = "PIPEDB_SETTINGS")]
    settings: Option<PathBuf>,

    /// Treat keys and values as hex strings
    #[arg(long)]
    hex: bool,

    /// Log level
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Store a value under a key
    Put { key: String, value: String },
    /// Print the value stored under a key
    Get { key: String },
    /// Remove a key
    Drop { key: String },
    /// Report whether a key is stored
    Contains { key: String },
    /// Destroy the repository
    Erase,
    /// Show the partition indices and lookup hash of a key
    Inspect {
        key: String,
        /// Number of partitions
        #[arg(short, long, default_value_t = 16)]
        partitions: usize,
    },
    /// Settings file operations
    Settings {
        #[command(subcommand)]
        action: SettingsCommands,
    },
    /// Watch a settings file and report reloads
    Watch {
        /// Settings file path
        config: PathBuf,
        /// How long to watch
        #[arg(long, default_value_t = 10)]
        seconds: u64,
        /// Polling interval in milliseconds
        #[arg(long, default_value_t = 1000)]
        interval_ms: u64,
    },
}

#[derive(Subcommand, Debug)]
enum SettingsCommands {
    /// Write a new settings file
    Init {
        /// Settings file path
        config: PathBuf,
        /// Backend type code (0 = memory, 1 = redb)
        #[arg(long, default_value_t = 1)]
        backend_type: u8,
        /// Temporary directory
        #[arg(long, default_value = "/tmp/pipedb")]
        temporary_directory: PathBuf,
        /// Persistence directory (repeatable)
        #[arg(long = "persist")]
        persistence_directories: Vec<PathBuf>,
    },
    /// Print a settings file
    Show {
        /// Settings file path
        config: PathBuf,
    },
}

fn decode(input: &str, hex: bool) -> Result<Vec<u8>> {
    if hex {
        hex::decode(input).with_context(|| format!("invalid hex: {input}"))
    } else {
        Ok(input.as_bytes().to_vec())
    }
}

/// Fail unless `accept` holds for `status`
fn check(status: Return, accept: fn(Return) -> bool, what: &str) -> Result<()> {
    if accept(status) {
        Ok(())
    } else {
        bail!("{what} failed: {status}")
    }
}

/// Backend and data directory, taken from the settings file when one is given
fn resolve_backend(args: &Args) -> Result<(BackendKind, PathBuf)> {
    Ok(match &args.settings {
        Some(path) => {
            let settings = Settings::new(path);
            settings
                .load()
                .with_context(|| format!("Failed to load settings {}", path.display()))?;
            let kind = BackendKind::from_code(settings.backend_type())?;
            let data_dir = settings
                .persistence_directories()
                .into_iter()
                .next()
                .unwrap_or_else(|| args.data_dir.clone());
            (kind, data_dir)
        }
        None => (args.backend, args.data_dir.clone()),
    })
}

fn repository_for(args: &Args) -> Result<Box<dyn BlockRepository>> {
    let (kind, data_dir) = resolve_backend(args)?;
    debug!(backend = %kind, data_dir = %data_dir.display(), "using repository");
    Ok(create_repository(
        kind,
        RepositoryConfig::with_data_dir(data_dir),
    ))
}

fn open(args: &Args) -> Result<Box<dyn BlockRepository>> {
    let repo = repository_for(args)?;
    check(repo.open(), Return::success, "open")?;
    Ok(repo)
}

fn inspect(key: &Key<'_>, partitions: usize) {
    println!("Key:         {}", key.copy_as_string());
    println!("Size:        {} bytes", key.size());
    println!("Lookup hash: {:#010x}", key.lookup_hash());
    let indices = [
        ("8-bit", key.to_8bit_index(partitions).map(u64::from)),
        ("16-bit", key.to_16bit_index(partitions).map(u64::from)),
        ("32-bit", key.to_32bit_index(partitions).map(u64::from)),
        ("64-bit", key.to_64bit_index(partitions)),
    ];
    for (width, index) in indices {
        match index {
            Ok(i) => println!("{width:<7} partition {i} of {partitions}"),
            Err(e) => println!("{width:<7} partition -: {e}"),
        }
    }
}

/// Report reloads of `config` for `duration`; returns the number of reloads
fn watch(config: PathBuf, duration: Duration, interval: Duration) -> u64 {
    let reloader = SettingsReloader::with_interval(config, interval);
    reloader.start();
    info!(
        "Watching {} for {:?}",
        reloader.settings().path().display(),
        duration
    );

    let deadline = Instant::now() + duration;
    let mut seen = 0;
    while Instant::now() < deadline {
        let count = reloader.reload_count();
        if count != seen {
            seen = count;
            println!("reload #{count}: {:?}", reloader.settings().values());
        }
        thread::sleep(interval.min(Duration::from_millis(100)));
    }
    reloader.stop();
    let total = reloader.reload_count();
    println!("{total} reload(s)");
    total
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match &args.command {
        Commands::Put { key, value } => {
            let key = decode(key, args.hex)?;
            let value = decode(value, args.hex)?;
            let repo = open(&args)?;
            let status = repo.put(Key::from(&key), InputBlock::from(&value));
            let _ = repo.close();
            check(status, Return::key_is_present, "put")?;
            if status.success() {
                println!("Stored");
            } else {
                println!("Replaced existing value");
            }
        }
        Commands::Get { key } => {
            let key = decode(key, args.hex)?;
            let repo = open(&args)?;
            let mut out = OutputBlock::new();
            let status = repo.get(Key::from(&key), &mut out);
            let _ = repo.close();
            if status.key_not_present() {
                bail!("Key not found");
            }
            check(status, Return::success, "get")?;
            if args.hex {
                println!("{}", hex::encode(out.data()));
            } else {
                println!("{}", out.copy_as_string());
            }
        }
        Commands::Drop { key } => {
            let key = decode(key, args.hex)?;
            let repo = open(&args)?;
            let status = repo.drop_key(Key::from(&key));
            let _ = repo.close();
            check(status, Return::success, "drop")?;
            println!("Dropped");
        }
        Commands::Contains { key } => {
            let key = decode(key, args.hex)?;
            let repo = open(&args)?;
            let included = repo.included(Key::from(&key));
            let _ = repo.close();
            println!("{included}");
        }
        Commands::Erase => {
            let repo = repository_for(&args)?;
            check(repo.erase(), Return::success, "erase")?;
            println!("Repository erased");
        }
        Commands::Inspect { key, partitions } => {
            let key = decode(key, args.hex)?;
            inspect(&Key::from(&key), *partitions);
        }
        Commands::Settings { action } => match action {
            SettingsCommands::Init {
                config,
                backend_type,
                temporary_directory,
                persistence_directories,
            } => {
                BackendKind::from_code(*backend_type)?;
                let settings = Settings::new(config);
                settings.set_backend_type(*backend_type);
                settings.set_temporary_directory(temporary_directory);
                settings.set_persistence_directories(persistence_directories.clone());
                settings
                    .save()
                    .with_context(|| format!("Failed to write {}", config.display()))?;
                println!("Settings written to {}", config.display());
            }
            SettingsCommands::Show { config } => {
                let settings = Settings::new(config);
                settings
                    .load()
                    .with_context(|| format!("Failed to load {}", config.display()))?;
                let values = settings.values();
                let backend = BackendKind::from_code(values.backend_type)
                    .map_or_else(|_| "unknown".to_string(), |k| k.to_string());
                println!("Settings: {}", config.display());
                println!("  backend_type:          {} ({backend})", values.backend_type);
                println!(
                    "  temporary_directory:   {}",
                    values.temporary_directory.display()
                );
                for dir in &values.persistence_directories {
                    println!("  persistence_directory: {}", dir.display());
                }
                if let Some(crc) = settings.checksum() {
                    println!("  checksum:              {crc:08x}");
                }
            }
        },
        Commands::Watch {
            config,
            seconds,
            interval_ms,
        } => {
            watch(
                config.clone(),
                Duration::from_secs(*seconds),
                Duration::from_millis(*interval_ms),
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipedb_store::MemoryRepository;
    use std::path::Path;
    use tempfile::tempdir;

    #[test]
    fn test_decode() {
        assert_eq!(decode("abc", false).unwrap(), b"abc".to_vec());
        assert_eq!(decode("00ff", true).unwrap(), vec![0x00, 0xff]);
        assert!(decode("zz", true).is_err());
    }

    #[test]
    fn test_check() {
        assert!(check(Return::Ok, Return::success, "get").is_ok());
        assert!(check(Return::KeyHeretoforeIncluded, Return::key_is_present, "put").is_ok());
        assert!(check(Return::KeyHeretoforeIncluded, Return::success, "open").is_err());
        let err = check(Return::BackendError, Return::key_is_present, "put").unwrap_err();
        assert_eq!(err.to_string(), "put failed: BACKEND_ERROR");
    }

    #[test]
    fn test_overwriting_put_is_accepted() {
        let repo = MemoryRepository::new();
        assert_eq!(repo.open(), Return::Ok);
        let first = repo.put(Key::from("k"), InputBlock::from("one"));
        let second = repo.put(Key::from("k"), InputBlock::from("two"));
        assert!(check(first, Return::key_is_present, "put").is_ok());
        assert!(check(second, Return::key_is_present, "put").is_ok());
        assert!(!second.success());
    }

    fn write_settings(path: &Path, backend_type: u8, dirs: &[&str]) {
        let settings = Settings::new(path);
        settings.set_backend_type(backend_type);
        settings.set_temporary_directory("/tmp/pipedb");
        settings.set_persistence_directories(dirs.iter().map(PathBuf::from).collect());
        settings.save().unwrap();
    }

    fn args_with_settings(path: &Path) -> Args {
        Args::try_parse_from([
            "pipedb",
            "--backend",
            "memory",
            "--settings",
            path.to_str().unwrap(),
            "erase",
        ])
        .unwrap()
    }

    #[test]
    fn test_settings_select_backend_and_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pipedb.toml");
        write_settings(&path, 1, &["/data/z", "/data/a"]);

        let (kind, data_dir) = resolve_backend(&args_with_settings(&path)).unwrap();
        assert_eq!(kind, BackendKind::Redb);
        assert_eq!(data_dir, PathBuf::from("/data/a"));
    }

    #[test]
    fn test_settings_without_directories_fall_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pipedb.toml");
        write_settings(&path, 0, &[]);

        let (kind, data_dir) = resolve_backend(&args_with_settings(&path)).unwrap();
        assert_eq!(kind, BackendKind::Memory);
        assert_eq!(data_dir, PathBuf::from("pipedb-data"));
    }

    #[test]
    fn test_settings_reject_unknown_backend() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pipedb.toml");
        write_settings(&path, 9, &["/data/a"]);

        let err = resolve_backend(&args_with_settings(&path)).unwrap_err();
        assert!(err.to_string().contains("unknown backend: 9"));
        assert!(repository_for(&args_with_settings(&path)).is_err());
    }

    #[test]
    fn test_missing_settings_file_is_an_error() {
        let dir = tempdir().unwrap();
        let args = args_with_settings(&dir.path().join("absent.toml"));
        assert!(resolve_backend(&args).is_err());
    }

    #[test]
    fn test_without_settings_uses_arguments() {
        let args =
            Args::try_parse_from(["pipedb", "--data-dir", "/srv/blocks", "get", "k"]).unwrap();
        let (kind, data_dir) = resolve_backend(&args).unwrap();
        assert_eq!(kind, BackendKind::Redb);
        assert_eq!(data_dir, PathBuf::from("/srv/blocks"));
    }

    #[test]
    fn test_watch_reports_initial_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pipedb.toml");
        write_settings(&path, 1, &["/data/a"]);

        let reloads = watch(path, Duration::from_millis(500), Duration::from_millis(10));
        assert_eq!(reloads, 1);
    }

    #[test]
    fn test_watch_missing_file_reports_nothing() {
        let dir = tempdir().unwrap();
        let reloads = watch(
            dir.path().join("absent.toml"),
            Duration::from_millis(100),
            Duration::from_millis(10),
        );
        assert_eq!(reloads, 0);
    }

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from(["pipedb", "--backend", "memory", "put", "k", "v"]).unwrap();
        assert_eq!(args.backend, BackendKind::Memory);
        assert!(matches!(args.command, Commands::Put { .. }));
        assert!(Args::try_parse_from(["pipedb", "--backend", "leveldb", "erase"]).is_err());
    }

    #[test]
    fn test_backend_help_mentions_memory_lifetime() {
        use clap::CommandFactory;
        let help = Args::command().render_long_help().to_string();
        assert!(help.contains("lives only"));
        assert!(help.contains("one command"));
    }
}
