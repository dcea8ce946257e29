use log::{debug, info};

use crate::{
    fetch,
    flock::FileLock,
    git::source::GitSource,
    model::manifest::Manifest,
};
use std::{error::Error, path::Path};

const LOCK_FILE_NAME: &str = ".depfetch.lock";

/// Handler to fetch command
pub fn do_fetch(
    source: &GitSource,
    root: &Path,
    manifest_file_name: &Path,
    dest_directory_name: &Path,
) -> Result<(), Box<dyn Error>> {
    let manifest = load_manifest(root, manifest_file_name)?;
    let dest = root.join(dest_directory_name);

    debug!("Acquiring a lock on {}", root.display());
    let _lock = FileLock::new(&root.join(LOCK_FILE_NAME))?;

    let report = fetch::fetch_trees(source, &manifest, &dest)?;
    if report.has_failures() {
        return Err(format!(
            "{} of {} dependencies failed to fetch",
            report.failed(),
            report.outcomes.len()
        )
        .into());
    }

    Ok(())
}

/// Handler to list command
pub fn do_list(root: &Path, manifest_file_name: &Path) -> Result<(), Box<dyn Error>> {
    let manifest = load_manifest(root, manifest_file_name)?;

    for dependency in &manifest.dependencies {
        println!(
            "{} {} {}",
            dependency.name, dependency.coordinate, dependency.specification
        );
    }

    Ok(())
}

/// Handler to init command, writes the built-in dependency list out as a
/// manifest file the user can edit.
pub fn do_init(root: &Path, manifest_file_name: &Path) -> Result<(), Box<dyn Error>> {
    let manifest_file_path = root.join(manifest_file_name);
    if manifest_file_path.exists() {
        return Err(format!("File already exists: {}", manifest_file_path.display()).into());
    }

    std::fs::write(
        &manifest_file_path,
        toml::to_string_pretty(&Manifest::builtin().into_toml())?,
    )?;
    info!("Wrote manifest to {}", manifest_file_path.display());

    Ok(())
}

/// Handler to clean command
pub fn do_clean(root: &Path, dest_directory_name: &Path) -> Result<(), Box<dyn Error>> {
    let dest = root.join(dest_directory_name);

    info!("Cleaning dependency trees folder {}.", dest.display());
    match std::fs::remove_dir_all(&dest) {
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            info!("{} is already removed, nothing to do", dest.display());
            Ok(())
        }
        otherwise => otherwise,
    }?;

    Ok(())
}

fn load_manifest(root: &Path, manifest_file_name: &Path) -> Result<Manifest, Box<dyn Error>> {
    let manifest_file_path = root.join(manifest_file_name);
    if manifest_file_path.exists() {
        Ok(Manifest::from_file(&manifest_file_path)?)
    } else {
        info!(
            "No manifest at {}, using the built-in dependency list",
            manifest_file_path.display()
        );
        Ok(Manifest::builtin())
    }
}
