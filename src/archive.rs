use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use tokio::task::spawn_blocking;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::storage::is_part_file;
use crate::{Error, Result};

/// Zips the regular files directly inside `dir` (no subdirectories, no part files)
/// into an in-memory archive with flat entry names.
pub(crate) async fn zip_dir(dir: PathBuf) -> Result<Vec<u8>> {
    spawn_blocking(move || zip_dir_blocking(&dir)).await?
}

fn zip_dir_blocking(dir: &Path) -> Result<Vec<u8>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && !is_part_file(&path) {
            files.push(path);
        }
    }
    files.sort();

    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(9));
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for path in files {
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| Error::BadArtifactPath(path.display().to_string()))?;
        zip.start_file(name, options)?;
        zip.write_all(&fs::read(&path)?)?;
    }

    Ok(zip.finish()?.into_inner())
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use zip::ZipArchive;

    use super::*;

    #[tokio::test]
    async fn zips_files_flat_and_skips_parts() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("1.gif"), b"GIF89a-one").unwrap();
        fs::write(tmp.path().join("2.gif"), b"GIF89a-two").unwrap();
        fs::write(tmp.path().join("3.gif.part"), b"GIF").unwrap();
        fs::create_dir(tmp.path().join("nested")).unwrap();

        let bytes = zip_dir(tmp.path().to_path_buf()).await.unwrap();

        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let names: Vec<String> = archive.file_names().map(str::to_string).collect();
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"1.gif".to_string()));
        assert!(names.contains(&"2.gif".to_string()));

        let mut body = Vec::new();
        archive
            .by_name("2.gif")
            .unwrap()
            .read_to_end(&mut body)
            .unwrap();
        assert_eq!(body, b"GIF89a-two");
    }

    #[tokio::test]
    async fn empty_dir_makes_empty_archive() {
        let tmp = tempfile::tempdir().unwrap();
        let bytes = zip_dir(tmp.path().to_path_buf()).await.unwrap();
        assert_eq!(ZipArchive::new(Cursor::new(bytes)).unwrap().len(), 0);
    }

    #[tokio::test]
    async fn missing_dir_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let res = zip_dir(tmp.path().join("nope")).await;
        assert!(matches!(res, Err(Error::Io(_))));
    }
}
