//! Package archives
//!
//! Downloaded package files are bundled into a single deflated zip next to
//! them, then the loose files are removed so the archive is the only artefact
//! left behind.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::errors::{PackageError, PackageResult};
use crate::logging::ChannelLogger;

const LOG: ChannelLogger = ChannelLogger::new("archive");

/// Zip `files` into `archive`, deleting each file once it has been added
///
/// Entries are stored under their file name only.
pub fn package_files(files: &[PathBuf], archive: &Path) -> PackageResult<()> {
    let names: Vec<String> = files.iter().map(|f| entry_name(f)).collect();
    LOG.info(format!("Zipping {:?} into a package", names));
    LOG.user(format!("Zipping {:?} into a package", names));

    let archive_error = |source| PackageError::Archive {
        path: archive.to_path_buf(),
        source,
    };

    let mut zip = ZipWriter::new(File::create(archive)?);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for (file, name) in files.iter().zip(&names) {
        zip.start_file(name.as_str(), options).map_err(archive_error)?;
        let mut source = File::open(file)?;
        io::copy(&mut source, &mut zip)?;
        drop(source);
        fs::remove_file(file)?;
    }

    zip.finish().map_err(archive_error)?;
    Ok(())
}

fn entry_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}
