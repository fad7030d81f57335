//! Writing the visualization to disk.
//!
//! An output directory holds a copy of the static front end plus the two
//! chart specifications it loads.

use crate::error::{RrvError, Result};
use crate::plot::ChartSpec;
use include_dir::{include_dir, Dir, DirEntry};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Page that loads both plots.
pub const ENTRY_POINT: &str = "index.html";
pub const RANK_PLOT_FILE: &str = "rank_plot.json";
pub const SAMPLE_PLOT_FILE: &str = "sample_plot.json";

static BUNDLED: Dir<'static> = include_dir!("$CARGO_MANIFEST_DIR/support_files");

/// Source of the front-end files copied next to the plots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupportFiles<'a> {
    /// The files compiled into this crate.
    Bundled,
    /// A directory on disk, copied recursively.
    Directory(&'a Path),
}

impl SupportFiles<'_> {
    fn location(&self) -> String {
        match self {
            SupportFiles::Bundled => "<bundled support files>".to_string(),
            SupportFiles::Directory(dir) => dir.display().to_string(),
        }
    }
}

/// One entry of the front end, relative to its root.
#[derive(Debug)]
enum Asset {
    Dir(PathBuf),
    Embedded(PathBuf, &'static [u8]),
    Copy(PathBuf, PathBuf),
}

impl Asset {
    fn is_entry_point(&self) -> bool {
        match self {
            Asset::Dir(_) => false,
            Asset::Embedded(rel, _) | Asset::Copy(rel, _) => rel.as_path() == Path::new(ENTRY_POINT),
        }
    }

    fn write_into(&self, output_dir: &Path) -> Result<()> {
        match self {
            Asset::Dir(rel) => fs::create_dir_all(output_dir.join(rel))?,
            Asset::Embedded(rel, contents) => fs::write(output_dir.join(rel), contents)?,
            Asset::Copy(rel, src) => {
                fs::copy(src, output_dir.join(rel))?;
            }
        }
        Ok(())
    }
}

/// Operating system metadata files that should never be copied.
fn is_os_artifact(name: &str) -> bool {
    name == ".DS_Store" || name.starts_with("._")
}

fn embedded_assets(dir: &'static Dir<'static>, assets: &mut Vec<Asset>) {
    for entry in dir.entries() {
        let skip = entry
            .path()
            .file_name()
            .is_some_and(|name| is_os_artifact(&name.to_string_lossy()));
        if skip {
            continue;
        }
        match entry {
            DirEntry::Dir(sub) => {
                assets.push(Asset::Dir(sub.path().to_path_buf()));
                embedded_assets(sub, assets);
            }
            DirEntry::File(file) => {
                assets.push(Asset::Embedded(file.path().to_path_buf(), file.contents()))
            }
        }
    }
}

fn disk_assets(root: &Path) -> Result<Vec<Asset>> {
    let mut assets = Vec::new();
    let walker = WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_os_artifact(&e.file_name().to_string_lossy()));
    for entry in walker {
        let entry = entry.map_err(std::io::Error::from)?;
        let Ok(rel) = entry.path().strip_prefix(root) else {
            continue;
        };
        let rel = rel.to_path_buf();
        if entry.file_type().is_dir() {
            assets.push(Asset::Dir(rel));
        } else {
            assets.push(Asset::Copy(rel, entry.path().to_path_buf()));
        }
    }
    Ok(assets)
}

/// Resolve the front end into an ordered list of entries, parents first.
fn collect_assets(support: SupportFiles<'_>) -> Result<Vec<Asset>> {
    let assets = match support {
        SupportFiles::Bundled => {
            let mut assets = Vec::new();
            embedded_assets(&BUNDLED, &mut assets);
            assets
        }
        SupportFiles::Directory(dir) if dir.is_dir() => disk_assets(dir)?,
        SupportFiles::Directory(_) => Vec::new(),
    };
    if !assets.iter().any(Asset::is_entry_point) {
        return Err(RrvError::MissingAsset {
            entry_point: ENTRY_POINT.to_string(),
            location: support.location(),
        });
    }
    Ok(assets)
}

/// Stage `contents` in a hidden file inside `dir` so it can be moved into
/// place in one step.
fn stage(dir: &Path, name: &str, contents: &str) -> Result<tempfile::NamedTempFile> {
    let mut staged = tempfile::Builder::new()
        .prefix(&format!(".{}", name))
        .suffix(".partial")
        .tempfile_in(dir)?;
    staged.write_all(contents.as_bytes())?;
    staged.flush()?;
    Ok(staged)
}

/// Write both specifications, leaving neither behind unless both land.
fn write_specs(output_dir: &Path, rank_json: &str, sample_json: &str) -> Result<()> {
    let rank = stage(output_dir, RANK_PLOT_FILE, rank_json)?;
    let sample = stage(output_dir, SAMPLE_PLOT_FILE, sample_json)?;

    let rank_path = output_dir.join(RANK_PLOT_FILE);
    rank.persist(&rank_path).map_err(std::io::Error::from)?;
    if let Err(e) = sample.persist(output_dir.join(SAMPLE_PLOT_FILE)) {
        if let Err(cleanup) = fs::remove_file(&rank_path) {
            log::warn!("Could not remove {}: {}", rank_path.display(), cleanup);
        }
        return Err(std::io::Error::from(e).into());
    }
    Ok(())
}

/// Write a visualization to `output_dir` and return the path of its entry
/// point.
///
/// The front end must contain `index.html` at its top level. Both
/// specifications are serialized before anything is written, so a failure
/// there leaves `output_dir` untouched.
pub fn write_visualization(
    rank_plot: &ChartSpec,
    sample_plot: &ChartSpec,
    support: SupportFiles<'_>,
    output_dir: &Path,
) -> Result<PathBuf> {
    let assets = collect_assets(support)?;

    let rank_json = rank_plot.to_json()?;
    let sample_json = sample_plot.to_json()?;

    fs::create_dir_all(output_dir)?;
    for asset in &assets {
        asset.write_into(output_dir)?;
    }
    log::debug!("Copied {} support entries from {}", assets.len(), support.location());
    write_specs(output_dir, &rank_json, &sample_json)?;

    let index_path = output_dir.join(ENTRY_POINT);
    let index_path = fs::canonicalize(&index_path).unwrap_or(index_path);
    log::info!("Wrote visualization to {}", output_dir.display());
    Ok(index_path)
}

/// Write a visualization using the bundled front end.
pub fn emit(rank_plot: &ChartSpec, sample_plot: &ChartSpec, output_dir: &Path) -> Result<PathBuf> {
    write_visualization(rank_plot, sample_plot, SupportFiles::Bundled, output_dir)
}
