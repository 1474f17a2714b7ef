//! CLI command implementations
//!
//! Thin front end over `StorageEngine`: argument plumbing, input file and
//! directory handling, output formatting. No storage logic lives here.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::identifier::RecordId;
use crate::observability::{Logger, Severity};
use crate::storage::{StorageEngine, StorageError};

use super::args::{Cli, Command, StorageCommand};
use super::errors::{CliError, CliResult};
use super::io::{write_ancestry, write_ids, write_json, write_metadata};

/// Main CLI entry point
///
/// Parses arguments, loads configuration and dispatches. This is the only
/// function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    let config = configure(cli.config.as_deref(), cli.verbose)?;

    let engine = StorageEngine::from_config(&config);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run_command(&engine, cli.command, &mut out)
}

/// Loads configuration and applies its log level
///
/// The level is set before `CONFIG_LOADED` is emitted, so a config asking
/// for trace output sees its own load event.
pub fn configure(config_path: Option<&Path>, verbose: bool) -> CliResult<Config> {
    let path = Config::locate(config_path);
    let config = match &path {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let severity = if verbose {
        Severity::Trace
    } else {
        config.log_severity()?
    };
    Logger::set_min_severity(severity);

    if let Some(path) = &path {
        config.log_loaded(path);
    }
    Ok(config)
}

/// Run the appropriate command based on CLI args
pub fn run_command<W: Write>(engine: &StorageEngine, cmd: Command, out: &mut W) -> CliResult<()> {
    match cmd {
        Command::Storage { action } => run_storage_command(engine, action, out),
    }
}

/// Run one `lt storage ...` subcommand
pub fn run_storage_command<W: Write>(
    engine: &StorageEngine,
    cmd: StorageCommand,
    out: &mut W,
) -> CliResult<()> {
    match cmd {
        StorageCommand::Create { name } => create(engine, &name, out),
        StorageCommand::Add { name, path, parent } => {
            add(engine, &name, &path, parent.as_deref(), out)
        }
        StorageCommand::Get { name, id, output } => get(engine, &name, &id, &output, out),
        StorageCommand::Describe {
            name,
            id,
            ancestry,
            format,
        } => match id {
            Some(id) => describe_item(engine, &name, &id, ancestry, format.json, out),
            None => describe(engine, &name, format.json, out),
        },
        StorageCommand::List {
            name,
            page,
            page_size,
            format,
        } => list(engine, &name, page, page_size, format.json, out),
    }
}

fn parse_id(id: &str) -> CliResult<RecordId> {
    // An unparsable identifier cannot be in any index.
    id.parse()
        .map_err(|_| CliError::from(StorageError::not_found(id)))
}

/// Create an empty storage
pub fn create<W: Write>(engine: &StorageEngine, name: &str, out: &mut W) -> CliResult<()> {
    engine.create_container(name)?;
    writeln!(out, "Storage '{}' created.", name)?;
    Ok(())
}

/// Collects the files an `add` call covers, in lexicographic order.
///
/// A directory contributes its regular `*.wav` entries; a file is taken as
/// given regardless of extension.
pub fn collect_inputs(path: &Path) -> CliResult<Vec<PathBuf>> {
    let meta = fs::metadata(path).map_err(|e| CliError::io_error_on("Failed to stat", path, e))?;

    if !meta.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = Vec::new();
    let entries =
        fs::read_dir(path).map_err(|e| CliError::io_error_on("Failed to read directory", path, e))?;
    for entry in entries {
        let entry =
            entry.map_err(|e| CliError::io_error_on("Failed to read directory", path, e))?;
        let entry_path = entry.path();
        let is_file = entry
            .file_type()
            .map_err(|e| CliError::io_error_on("Failed to stat", &entry_path, e))?
            .is_file();
        let is_wav = entry_path.extension().map_or(false, |ext| ext == "wav");
        if is_file && is_wav {
            files.push(entry_path);
        }
    }
    files.sort();
    Ok(files)
}

/// Add one file or every `.wav` of a directory; prints one identifier per item
pub fn add<W: Write>(
    engine: &StorageEngine,
    name: &str,
    path: &Path,
    parent: Option<&str>,
    out: &mut W,
) -> CliResult<()> {
    let files = collect_inputs(path)?;
    if files.is_empty() {
        writeln!(out, "No .wav files found to add.")?;
        return Ok(());
    }

    for file in files {
        let data = fs::read(&file).map_err(|e| CliError::io_error_on("Failed to read", &file, e))?;
        let id = engine.insert(name, &data, parent).map_err(|e| {
            let e = CliError::from(e);
            CliError::new(
                e.code().clone(),
                format!("failed to add {}: {}", file.display(), e.message()),
            )
        })?;
        writeln!(out, "{}", id)?;
    }
    out.flush()?;
    Ok(())
}

/// Write a stored item to `output`
pub fn get<W: Write>(
    engine: &StorageEngine,
    name: &str,
    id: &str,
    output: &Path,
    out: &mut W,
) -> CliResult<()> {
    let id = parse_id(id)?;
    let data = engine.retrieve(name, &id)?;
    fs::write(output, data).map_err(|e| CliError::io_error_on("Failed to write", output, e))?;
    writeln!(out, "File retrieved to {}", output.display())?;
    Ok(())
}

/// Print the number of items in a storage
pub fn describe<W: Write>(
    engine: &StorageEngine,
    name: &str,
    json: bool,
    out: &mut W,
) -> CliResult<()> {
    let count = engine.describe(name)?;
    if json {
        write_json(out, &serde_json::json!({ "storage": name, "items": count }))
    } else {
        writeln!(out, "Stored audio files: {}", count)?;
        Ok(())
    }
}

/// Print one item's metadata, optionally followed by its ancestry
///
/// A broken chain is printed as far as it goes and then reported as an
/// error.
pub fn describe_item<W: Write>(
    engine: &StorageEngine,
    name: &str,
    id: &str,
    with_ancestry: bool,
    json: bool,
    out: &mut W,
) -> CliResult<()> {
    let id = parse_id(id)?;

    if !with_ancestry {
        let meta = engine.describe_one(name, &id)?;
        return if json {
            write_json(out, &meta)
        } else {
            write_metadata(out, &meta)
        };
    }

    let ancestry = engine.ancestry(name, &id)?;
    if json {
        write_json(out, &ancestry)?;
    } else {
        if let Some(first) = ancestry.entries.first() {
            write_metadata(out, first)?;
        }
        write_ancestry(out, &ancestry)?;
    }

    match ancestry.break_error() {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

/// Print identifiers, all of them or one page
pub fn list<W: Write>(
    engine: &StorageEngine,
    name: &str,
    page: Option<usize>,
    page_size: usize,
    json: bool,
    out: &mut W,
) -> CliResult<()> {
    match page {
        Some(page) => {
            let page = engine.list_page(name, page, page_size)?;
            if json {
                write_json(out, &page)
            } else {
                write_ids(out, &page.items)
            }
        }
        None => {
            let ids = engine.list(name)?;
            if json {
                write_json(out, &ids)
            } else {
                write_ids(out, &ids)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, StorageEngine) {
        let temp_dir = TempDir::new().unwrap();
        let storage_dir = temp_dir.path().join("store");
        fs::create_dir_all(&storage_dir).unwrap();
        let engine = StorageEngine::from_config(&Config {
            storage_dir,
            sync_writes: false,
            ..Config::default()
        });
        (temp_dir, engine)
    }

    fn output_of(
        engine: &StorageEngine,
        cmd: StorageCommand,
    ) -> (CliResult<()>, String) {
        let mut out = Vec::new();
        let result = run_storage_command(engine, cmd, &mut out);
        (result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_create_reports_and_rejects_duplicate() {
        let (_dir, engine) = setup();

        let (result, text) = output_of(&engine, StorageCommand::Create { name: "demo".into() });
        result.unwrap();
        assert_eq!(text, "Storage 'demo' created.\n");

        let (result, _) = output_of(&engine, StorageCommand::Create { name: "demo".into() });
        assert_eq!(result.unwrap_err().code_str(), "LASAGNA_ALREADY_EXISTS");
    }

    #[test]
    fn test_add_directory_in_sorted_order() {
        let (dir, engine) = setup();
        engine.create_container("demo").unwrap();

        let clips = dir.path().join("clips");
        fs::create_dir(&clips).unwrap();
        fs::write(clips.join("b.wav"), b"second").unwrap();
        fs::write(clips.join("a.wav"), b"first").unwrap();
        fs::write(clips.join("notes.txt"), b"skip me").unwrap();
        fs::create_dir(clips.join("nested.wav")).unwrap();

        let (result, text) = output_of(
            &engine,
            StorageCommand::Add {
                name: "demo".into(),
                path: clips,
                parent: None,
            },
        );
        result.unwrap();

        let ids: Vec<RecordId> = text.lines().map(|l| l.parse().unwrap()).collect();
        assert_eq!(ids.len(), 2);
        assert_eq!(engine.retrieve("demo", &ids[0]).unwrap(), b"first");
        assert_eq!(engine.retrieve("demo", &ids[1]).unwrap(), b"second");
    }

    #[test]
    fn test_add_empty_directory() {
        let (dir, engine) = setup();
        engine.create_container("demo").unwrap();
        let empty = dir.path().join("empty");
        fs::create_dir(&empty).unwrap();

        let (result, text) = output_of(
            &engine,
            StorageCommand::Add {
                name: "demo".into(),
                path: empty,
                parent: None,
            },
        );
        result.unwrap();
        assert_eq!(text, "No .wav files found to add.\n");
    }

    #[test]
    fn test_add_with_bad_parent_names_file() {
        let (dir, engine) = setup();
        engine.create_container("demo").unwrap();
        let clip = dir.path().join("clip.wav");
        fs::write(&clip, b"data").unwrap();

        let (result, _) = output_of(
            &engine,
            StorageCommand::Add {
                name: "demo".into(),
                path: clip,
                parent: Some("nope".into()),
            },
        );
        let err = result.unwrap_err();
        assert_eq!(err.code_str(), "LASAGNA_INVALID_PARENT");
        assert!(err.message().contains("clip.wav"));
    }

    #[test]
    fn test_get_writes_output_file() {
        let (dir, engine) = setup();
        engine.create_container("demo").unwrap();
        let id = engine.insert("demo", b"RIFF....WAVE", None).unwrap();
        let target = dir.path().join("out.wav");

        let (result, text) = output_of(
            &engine,
            StorageCommand::Get {
                name: "demo".into(),
                id: id.to_string(),
                output: target.clone(),
            },
        );
        result.unwrap();
        assert!(text.starts_with("File retrieved to"));
        assert_eq!(fs::read(&target).unwrap(), b"RIFF....WAVE");
    }

    #[test]
    fn test_get_unparsable_id_is_not_found() {
        let (dir, engine) = setup();
        engine.create_container("demo").unwrap();

        let (result, _) = output_of(
            &engine,
            StorageCommand::Get {
                name: "demo".into(),
                id: "zzz".into(),
                output: dir.path().join("out.wav"),
            },
        );
        assert_eq!(result.unwrap_err().code_str(), "LASAGNA_NOT_FOUND");
    }

    #[test]
    fn test_describe_count_and_json() {
        let (_dir, engine) = setup();
        engine.create_container("demo").unwrap();
        engine.insert("demo", b"a", None).unwrap();

        let (result, text) = output_of(
            &engine,
            StorageCommand::Describe {
                name: "demo".into(),
                id: None,
                ancestry: false,
                format: Default::default(),
            },
        );
        result.unwrap();
        assert_eq!(text, "Stored audio files: 1\n");

        let (result, text) = output_of(
            &engine,
            StorageCommand::Describe {
                name: "demo".into(),
                id: None,
                ancestry: false,
                format: crate::cli::OutputFormat { json: true },
            },
        );
        result.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["items"], 1);
    }

    #[test]
    fn test_describe_ancestry_tree() {
        let (_dir, engine) = setup();
        engine.create_container("demo").unwrap();
        let root = engine.insert("demo", b"root", None).unwrap();
        let child = engine
            .insert("demo", b"child", Some(root.to_string().as_str()))
            .unwrap();

        let (result, text) = output_of(
            &engine,
            StorageCommand::Describe {
                name: "demo".into(),
                id: Some(child.to_string()),
                ancestry: true,
                format: Default::default(),
            },
        );
        result.unwrap();
        assert!(text.contains(&format!("UUID: {}", child)));
        assert!(text.contains(&format!("1. {} (Parent: {})", child, root)));
        assert!(text.contains(&format!("2. {} (Parent: None)", root)));
    }

    #[test]
    fn test_describe_broken_ancestry_prints_then_fails() {
        let (_dir, engine) = setup();
        engine.create_container("demo").unwrap();
        let ghost = RecordId::mint().unwrap();
        let child = engine
            .insert("demo", b"child", Some(ghost.to_string().as_str()))
            .unwrap();

        let (result, text) = output_of(
            &engine,
            StorageCommand::Describe {
                name: "demo".into(),
                id: Some(child.to_string()),
                ancestry: true,
                format: Default::default(),
            },
        );
        assert!(text.contains(&format!("1. {} (Parent: {})", child, ghost)));
        let err = result.unwrap_err();
        assert_eq!(err.code_str(), "LASAGNA_NOT_FOUND");
        assert!(err.message().contains(&ghost.to_string()));
    }

    #[test]
    fn test_list_all_and_paged() {
        let (_dir, engine) = setup();
        engine.create_container("demo").unwrap();
        let ids: Vec<RecordId> = (0..3u8)
            .map(|i| engine.insert("demo", &[i], None).unwrap())
            .collect();

        let (result, text) = output_of(
            &engine,
            StorageCommand::List {
                name: "demo".into(),
                page: None,
                page_size: 50,
                format: Default::default(),
            },
        );
        result.unwrap();
        let listed: Vec<RecordId> = text.lines().map(|l| l.parse().unwrap()).collect();
        assert_eq!(listed, ids);

        let (result, text) = output_of(
            &engine,
            StorageCommand::List {
                name: "demo".into(),
                page: Some(2),
                page_size: 2,
                format: crate::cli::OutputFormat { json: true },
            },
        );
        result.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["total"], 3);
        assert_eq!(parsed["items"][0], ids[2].to_string());
    }

    #[test]
    fn test_configure_applies_level_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("lasagna.json");
        fs::write(&path, r#"{"log_level": "trace", "sync_writes": false}"#).unwrap();

        let config = configure(Some(&path), false).unwrap();
        let applied = Logger::min_severity();
        Logger::set_min_severity(Severity::Warn);

        assert!(!config.sync_writes);
        assert_eq!(applied, Severity::Trace);
    }

    #[test]
    fn test_configure_rejects_bad_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("lasagna.json");
        fs::write(&path, r#"{"log_level": "fatal"}"#).unwrap();

        let err = configure(Some(&path), false).unwrap_err();
        assert_eq!(err.code_str(), "LASAGNA_CLI_CONFIG_ERROR");
    }
}
