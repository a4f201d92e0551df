//! Tar build context for the image recipe.
//!
//! Entries are written in sorted order with fixed ownership and timestamps,
//! so the same tree always produces the same archive bytes.

use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs::Metadata;
use cap_std::fs_utf8::Dir;
use tar::{Builder, EntryType, Header};

use super::{CONTAINERFILE_NAME, ImageRecipe, MANIFEST_FILES, SOURCE_DIR, render_containerfile};
use crate::error::{FilesystemError, PasstiderError};

const DIRECTORY_MODE: u32 = 0o755;
const FILE_MODE: u32 = 0o644;

/// Build the tar context for `recipe` from the project at `project_dir`.
///
/// The archive holds the rendered `Containerfile`, the dependency manifests
/// and the source tree. Nothing else from the project is sent to the engine.
///
/// # Errors
///
/// Returns `FilesystemError::NotFound` when the project directory, a
/// manifest or the source directory is missing, and
/// `FilesystemError::IoError` when reading or archiving fails.
pub fn build_context(project_dir: &Utf8Path, recipe: &ImageRecipe) -> Result<Vec<u8>, PasstiderError> {
    let project = Dir::open_ambient_dir(project_dir, ambient_authority())
        .map_err(|error| map_io_error(project_dir, &error))?;

    for required in MANIFEST_FILES.iter().chain([SOURCE_DIR].iter()) {
        if !project.exists(required) {
            return Err(FilesystemError::NotFound {
                path: project_dir.join(required).into_std_path_buf(),
            }
            .into());
        }
    }

    let containerfile = render_containerfile(recipe);
    build_archive(&project, &containerfile).map_err(|error| map_io_error(project_dir, &error))
}

fn build_archive(project: &Dir, containerfile: &str) -> io::Result<Vec<u8>> {
    let mut builder = Builder::new(vec![]);

    let mut header = file_header(EntryType::Regular, FILE_MODE);
    header.set_size(u64::try_from(containerfile.len()).map_err(io::Error::other)?);
    header.set_cksum();
    builder.append_data(&mut header, CONTAINERFILE_NAME, containerfile.as_bytes())?;

    for manifest in MANIFEST_FILES {
        append_file(&mut builder, project, manifest, Utf8Path::new(manifest))?;
    }

    let source_path = Utf8PathBuf::from(SOURCE_DIR);
    let metadata = project.metadata(SOURCE_DIR)?;
    append_directory(&mut builder, &source_path, &metadata)?;
    let source_dir = project.open_dir(SOURCE_DIR)?;
    append_directory_contents(&mut builder, &source_dir, &source_path)?;

    builder.finish()?;
    builder.into_inner()
}

fn append_directory_contents(
    builder: &mut Builder<Vec<u8>>,
    current_dir: &Dir,
    current_relative_path: &Utf8Path,
) -> io::Result<()> {
    for entry in sorted_entries(current_dir)? {
        let entry_path = current_relative_path.join(&entry.file_name);
        match entry.kind {
            EntryKind::Directory => {
                let metadata = current_dir.metadata(&entry.file_name)?;
                append_directory(builder, &entry_path, &metadata)?;
                let child = current_dir.open_dir(&entry.file_name)?;
                append_directory_contents(builder, &child, &entry_path)?;
            }
            EntryKind::File => append_file(builder, current_dir, &entry.file_name, &entry_path)?,
            EntryKind::Other => {
                tracing::debug!(path = %entry_path, "skipping non-regular file in build context");
            }
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    Directory,
    File,
    Other,
}

#[derive(Debug)]
struct SortedEntry {
    file_name: String,
    kind: EntryKind,
}

fn sorted_entries(directory: &Dir) -> io::Result<Vec<SortedEntry>> {
    let mut entries = vec![];
    for entry_result in directory.entries()? {
        let entry = entry_result?;
        let file_type = entry.file_type()?;
        let kind = if file_type.is_dir() {
            EntryKind::Directory
        } else if file_type.is_file() {
            EntryKind::File
        } else {
            EntryKind::Other
        };
        entries.push(SortedEntry {
            file_name: entry.file_name()?,
            kind,
        });
    }
    entries.sort_unstable_by(|left, right| left.file_name.cmp(&right.file_name));
    Ok(entries)
}

fn file_header(entry_type: EntryType, mode: u32) -> Header {
    let mut header = Header::new_gnu();
    header.set_entry_type(entry_type);
    header.set_mode(mode);
    header.set_mtime(0);
    header.set_uid(0);
    header.set_gid(0);
    header
}

fn append_directory(
    builder: &mut Builder<Vec<u8>>,
    relative_path: &Utf8Path,
    metadata: &Metadata,
) -> io::Result<()> {
    let mut header = file_header(EntryType::Directory, metadata_mode(metadata, DIRECTORY_MODE));
    header.set_size(0);
    header.set_cksum();
    let path = format!("{}/", archive_path(relative_path));
    builder.append_data(&mut header, path, io::empty())
}

fn append_file(
    builder: &mut Builder<Vec<u8>>,
    parent_dir: &Dir,
    file_name: &str,
    relative_path: &Utf8Path,
) -> io::Result<()> {
    let metadata = parent_dir.metadata(file_name)?;
    let mut file = parent_dir.open(file_name)?;

    let mut header = file_header(EntryType::Regular, metadata_mode(&metadata, FILE_MODE));
    header.set_size(metadata.len());
    header.set_cksum();
    builder.append_data(&mut header, archive_path(relative_path), &mut file)
}

fn archive_path(path: &Utf8Path) -> String {
    path.as_str().replace('\\', "/")
}

#[cfg(unix)]
fn metadata_mode(metadata: &Metadata, _fallback: u32) -> u32 {
    use cap_std::fs::PermissionsExt;

    metadata.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn metadata_mode(_metadata: &Metadata, fallback: u32) -> u32 {
    fallback
}

fn map_io_error(path: &Utf8Path, error: &io::Error) -> PasstiderError {
    if error.kind() == io::ErrorKind::NotFound {
        return FilesystemError::NotFound {
            path: path.as_std_path().to_path_buf(),
        }
        .into();
    }
    FilesystemError::IoError {
        path: path.as_std_path().to_path_buf(),
        message: error.to_string(),
    }
    .into()
}
