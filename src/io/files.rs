use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::core::resolution::{FileArchiver, FileDeleter};

const MAX_ARCHIVE_ATTEMPTS: u32 = 10_000;

/// Removes files with `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsDeleter;

impl FileDeleter for FsDeleter {
    fn delete(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }
}

/// Writes `<file name>.zip` next to the original, or into `target_dir`.
#[derive(Debug, Default, Clone)]
pub struct ZipArchiver {
    target_dir: Option<PathBuf>,
}

impl ZipArchiver {
    pub fn new(target_dir: Option<PathBuf>) -> Self {
        Self { target_dir }
    }

    /// `<file name>.zip`, or `<file name>.<n>.zip` for the `n`th
    /// archive of the same name.
    pub fn archive_path(&self, path: &Path, attempt: u32) -> io::Result<PathBuf> {
        let file_name = path.file_name().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} has no file name", path.display()),
            )
        })?;

        let mut archive_name = file_name.to_os_string();
        if attempt > 0 {
            archive_name.push(format!(".{attempt}"));
        }
        archive_name.push(".zip");

        let dir = match &self.target_dir {
            Some(dir) => dir.clone(),
            None => path.parent().map(Path::to_path_buf).unwrap_or_default(),
        };
        Ok(dir.join(archive_name))
    }

    /// Claim the first archive name not already on disk. Existing archives
    /// are never opened for writing.
    fn create_archive_file(&self, path: &Path) -> io::Result<(PathBuf, File)> {
        for attempt in 0..MAX_ARCHIVE_ATTEMPTS {
            let dest = self.archive_path(path, attempt)?;
            match File::create_new(&dest) {
                Ok(file) => return Ok((dest, file)),
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(err) => return Err(err),
            }
        }
        Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("no free archive name for {}", path.display()),
        ))
    }

    fn write_archive(&self, path: &Path, dest: File) -> io::Result<()> {
        let entry_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut source = BufReader::new(File::open(path)?);
        let mut zip = ZipWriter::new(dest);
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        zip.start_file(entry_name, options).map_err(zip_to_io)?;
        io::copy(&mut source, &mut zip)?;
        let file = zip.finish().map_err(zip_to_io)?;
        file.sync_all()
    }
}

impl FileArchiver for ZipArchiver {
    fn archive(&self, path: &Path) -> io::Result<PathBuf> {
        if !path.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} is not a file", path.display()),
            ));
        }

        if let Some(dir) = &self.target_dir {
            fs::create_dir_all(dir)?;
        }

        let (dest, file) = self.create_archive_file(path)?;
        if let Err(err) = self.write_archive(path, file) {
            // Only `dest` was created by this call; the original is untouched.
            let _ = fs::remove_file(&dest);
            return Err(err);
        }
        Ok(dest)
    }
}

fn zip_to_io(err: zip::result::ZipError) -> io::Error {
    io::Error::other(err)
}
