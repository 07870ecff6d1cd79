//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use xsecdb_core::{
    Curator, ItemKey, PathStep, ReactionTypeTag, Reversible, SearchTemplate, SetKey,
    SetSubmission, StatePath, XsecError,
};

use super::TemplateArgs;

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum file size for submissions (100 MB).
///
/// This prevents memory exhaustion from malicious or accidental large files.
const MAX_SUBMISSION_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), XsecError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| XsecError::IoError(format!("Cannot read file metadata: {e}")))?;

    if metadata.len() > max_size {
        return Err(XsecError::SerializationError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Validate an input file path.
///
/// Canonicalizes the path to resolve symlinks and "..", ensures it
/// exists and is a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, XsecError> {
    let canonical = path
        .canonicalize()
        .map_err(|e| XsecError::IoError(format!("Invalid file path '{}': {e}", path.display())))?;

    if !canonical.is_file() {
        return Err(XsecError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Validate an output path: the parent directory must exist.
fn validate_output_path(path: &Path) -> Result<PathBuf, XsecError> {
    let parent = path.parent().unwrap_or(Path::new("."));

    let canonical_parent = parent.canonicalize().map_err(|e| {
        XsecError::IoError(format!(
            "Invalid output directory '{}': {e}",
            parent.display()
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(XsecError::IoError(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| XsecError::IoError("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

fn read_submission(path: &Path) -> Result<SetSubmission, XsecError> {
    let canonical = validate_file_path(path)?;
    validate_file_size(&canonical, MAX_SUBMISSION_FILE_SIZE)?;
    let text =
        std::fs::read_to_string(&canonical).map_err(|e| XsecError::IoError(e.to_string()))?;
    serde_json::from_str(&text).map_err(|e| {
        XsecError::SerializationError(format!("invalid submission file: {e}"))
    })
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show catalog status.
pub fn cmd_status(db_path: &Path, json_mode: bool) -> Result<(), XsecError> {
    let curator = Curator::open(db_path)?;
    let (species, reactions, items, sets) = curator.catalog().stats();

    if json_mode {
        let output = serde_json::json!({
            "database": db_path.to_string_lossy(),
            "species": species,
            "reactions": reactions,
            "items": items,
            "sets": sets,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!("xsecdb Catalog Status");
    println!("=====================");
    println!("Database:  {}", db_path.display());
    println!();
    println!("Species:   {species}");
    println!("Reactions: {reactions}");
    println!("Items:     {items}");
    println!("Sets:      {sets}");

    Ok(())
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Initialize a new empty database.
pub fn cmd_init(db_path: &Path, force: bool) -> Result<(), XsecError> {
    if db_path.exists() {
        if !force {
            return Err(XsecError::IoError(format!(
                "Database '{}' already exists (use --force to overwrite)",
                db_path.display()
            )));
        }
        std::fs::remove_file(db_path).map_err(|e| XsecError::IoError(e.to_string()))?;
    }
    Curator::open(db_path)?;
    println!("Initialized empty database at {}", db_path.display());
    Ok(())
}

// =============================================================================
// WRITE COMMANDS
// =============================================================================

/// Fill in the configured default organization for submissions that
/// leave the contributor empty.
fn apply_default_org(submission: &mut SetSubmission, default_org: Option<&str>) {
    if submission.contributor.is_empty() {
        if let Some(org) = default_org {
            submission.contributor = org.to_string();
        }
    }
}

/// Create a draft set from a submission file.
pub fn cmd_import(
    db_path: &Path,
    json_mode: bool,
    file: &Path,
    default_org: Option<&str>,
) -> Result<(), XsecError> {
    let mut submission = read_submission(file)?;
    apply_default_org(&mut submission, default_org);
    let mut curator = Curator::open(db_path)?;
    let key = curator.create_set(&submission)?;
    tracing::info!(set = key.0, name = %submission.name, "created draft set");

    if json_mode {
        println!("{}", serde_json::json!({ "set": key.0 }));
    } else {
        println!("Created draft set {} ('{}')", key, submission.name);
    }
    Ok(())
}

/// Edit a set from a submission file.
pub fn cmd_update(
    db_path: &Path,
    json_mode: bool,
    set: u64,
    file: &Path,
    default_org: Option<&str>,
) -> Result<(), XsecError> {
    let mut submission = read_submission(file)?;
    apply_default_org(&mut submission, default_org);
    let mut curator = Curator::open(db_path)?;
    let key = curator.update_set(SetKey(set), &submission)?;
    tracing::info!(set = key.0, "updated set");

    if json_mode {
        println!("{}", serde_json::json!({ "set": key.0 }));
    } else if key.0 == set {
        println!("Updated draft set {key}");
    } else {
        println!("Created draft set {key} from published set {set}");
    }
    Ok(())
}

/// Publish a draft set and its draft members.
pub fn cmd_publish(db_path: &Path, set: u64) -> Result<(), XsecError> {
    let mut curator = Curator::open(db_path)?;
    curator.publish_set(SetKey(set))?;
    tracing::info!(set, "published set");
    println!("Published set {set}");
    Ok(())
}

/// Delete a draft set or retract a published one.
pub fn cmd_delete(db_path: &Path, set: u64, message: Option<&str>) -> Result<(), XsecError> {
    let mut curator = Curator::open(db_path)?;
    curator.delete_set(SetKey(set), message)?;
    tracing::info!(set, "deleted set");
    println!("Deleted set {set}");
    Ok(())
}

// =============================================================================
// READ COMMANDS
// =============================================================================

/// Show the version history of a set or an item.
pub fn cmd_history(
    db_path: &Path,
    json_mode: bool,
    set: Option<u64>,
    item: Option<u64>,
) -> Result<(), XsecError> {
    let curator = Curator::open(db_path)?;

    let entries: Vec<serde_json::Value> = match (set, item) {
        (Some(set), _) => curator
            .set_history(SetKey(set))?
            .into_iter()
            .map(|entry| serde_json::to_value(&entry).unwrap_or_default())
            .collect(),
        (None, Some(item)) => curator
            .item_history(ItemKey(item))?
            .into_iter()
            .map(|entry| serde_json::to_value(&entry).unwrap_or_default())
            .collect(),
        (None, None) => {
            return Err(XsecError::InvalidSubmission(
                "pass --set or --item".to_string(),
            ));
        }
    };

    if json_mode {
        println!(
            "{}",
            serde_json::to_string_pretty(&entries).unwrap_or_default()
        );
        return Ok(());
    }

    println!("Version History");
    println!("===============");
    for entry in entries {
        let key = entry.get("key").cloned().unwrap_or_default();
        let version = entry
            .get("version")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        let status = entry
            .get("status")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        let created = entry
            .get("created_on")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        println!("  v{version}  {status:<10}  key {key}  {created}");
    }
    Ok(())
}

/// Export a resolved set to JSON.
pub fn cmd_export(db_path: &Path, set: u64, output: &Path) -> Result<(), XsecError> {
    let curator = Curator::open(db_path)?;
    let view = curator.set_view(SetKey(set))?;
    let output = validate_output_path(output)?;
    let text = serde_json::to_string_pretty(&view)
        .map_err(|e| XsecError::SerializationError(e.to_string()))?;
    std::fs::write(&output, text).map_err(|e| XsecError::IoError(e.to_string()))?;
    println!("Exported set {set} to {}", output.display());
    Ok(())
}

/// Search published items.
pub fn cmd_search(db_path: &Path, json_mode: bool, args: &TemplateArgs) -> Result<(), XsecError> {
    let curator = Curator::open(db_path)?;
    let template = parse_template(args)?;
    let matches = curator.search(&template);

    if json_mode {
        let keys: Vec<u64> = matches.iter().map(|key| key.0).collect();
        println!("{}", serde_json::json!({ "matches": keys }));
        return Ok(());
    }

    println!("Matches: {}", matches.len());
    for key in matches {
        let view = curator.item_view(key)?;
        println!("  [{key}] {}", view.reaction.summary);
    }
    Ok(())
}

/// Show remaining search options per dimension.
pub fn cmd_facets(db_path: &Path, json_mode: bool, args: &TemplateArgs) -> Result<(), XsecError> {
    let curator = Curator::open(db_path)?;
    let template = parse_template(args)?;
    let facets = curator.search_facets(&template);

    if json_mode {
        println!(
            "{}",
            serde_json::to_string_pretty(&facets).unwrap_or_default()
        );
        return Ok(());
    }

    println!("Remaining Options");
    println!("=================");
    println!("Consumes:");
    for choice in &facets.consumes {
        println!("  {}", choice.serialized);
    }
    println!("Produces:");
    for choice in &facets.produces {
        println!("  {}", choice.serialized);
    }
    println!("Type tags:");
    for tag in &facets.type_tags {
        println!("  {tag}");
    }
    println!("Sets:");
    for group in &facets.sets {
        println!("  {}:", group.organization);
        for (key, name) in &group.sets {
            println!("    [{key}] {name}");
        }
    }
    Ok(())
}

// =============================================================================
// TEMPLATE PARSING
// =============================================================================

fn parse_template(args: &TemplateArgs) -> Result<SearchTemplate, XsecError> {
    let reversible = match args.reversible.to_ascii_lowercase().as_str() {
        "true" => Reversible::True,
        "false" => Reversible::False,
        "both" => Reversible::Both,
        other => {
            return Err(XsecError::InvalidSubmission(format!(
                "unknown reversibility filter '{other}' (expected true, false, or both)"
            )));
        }
    };

    let type_tags = match &args.tags {
        Some(tags) => tags
            .split(',')
            .filter(|tag| !tag.is_empty())
            .map(ReactionTypeTag::from_str)
            .collect::<Result<Vec<_>, _>>()?,
        None => vec![],
    };

    let sets = match &args.sets {
        Some(sets) => sets
            .split(',')
            .filter(|key| !key.is_empty())
            .map(|key| {
                key.parse::<u64>().map(SetKey).map_err(|_| {
                    XsecError::InvalidSubmission(format!("invalid set key '{key}'"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?,
        None => vec![],
    };

    Ok(SearchTemplate {
        consumes: parse_paths(args.consumes.as_deref()),
        produces: parse_paths(args.produces.as_deref()),
        type_tags,
        reversible,
        sets,
    })
}

/// Parse comma-separated state summaries; a trailing `!` pins the
/// summary to the named level without its substates.
fn parse_paths(arg: Option<&str>) -> Vec<StatePath> {
    let Some(arg) = arg else {
        return vec![];
    };
    arg.split(',')
        .filter(|summary| !summary.is_empty())
        .map(|summary| {
            let mut steps = Vec::with_capacity(2);
            if let Some(pinned) = summary.strip_suffix('!') {
                steps.push(PathStep::Summary(pinned.to_string()));
                steps.push(PathStep::Omit);
            } else {
                steps.push(PathStep::Summary(summary.to_string()));
            }
            StatePath { steps }
        })
        .collect()
}

// =============================================================================
// TESTS
// =============================================================================
