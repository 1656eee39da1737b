//! Subcommand handlers: log in, then list or download.

use std::io::{Seek, SeekFrom};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use economist_audio_core::catalog::format_edition_token;
use economist_audio_core::{DownloadArtifact, EditionCatalog, EditionDate, SessionClient};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::app::config::ResolvedConfig;
use crate::cli::{Command, DownloadArgs};

/// Logs in and runs `command`.
pub(crate) async fn run_command(command: &Command, config: &ResolvedConfig) -> Result<()> {
    let credentials = config.credentials()?;
    let session = SessionClient::new(credentials, config.session_options()?)
        .context("Failed to set up HTTP session")?;
    let mut catalog = EditionCatalog::new(session);

    info!("Logging in");
    catalog.login().await.context("Login failed")?;
    info!("Logged in");

    match command {
        Command::Download(args) => run_download(&catalog, args).await,
        Command::ListIssues { year } => run_list_issues(&catalog, *year).await,
        Command::ListIssueSections { issue } => run_list_issue_sections(&catalog, issue).await,
    }
}

async fn run_list_issues(catalog: &EditionCatalog, year: i32) -> Result<()> {
    let dates = catalog
        .list_editions(Some(year))
        .await
        .with_context(|| format!("Failed to list editions for {year}"))?;
    let lines: Vec<String> = dates.into_iter().map(format_edition_token).collect();
    print_lines(&lines).await
}

async fn run_list_issue_sections(catalog: &EditionCatalog, issue: &EditionDate) -> Result<()> {
    let sections = catalog
        .list_sections(issue)
        .await
        .with_context(|| format!("Failed to list sections of edition {issue}"))?;
    print_lines(&sections).await
}

async fn run_download(catalog: &EditionCatalog, args: &DownloadArgs) -> Result<()> {
    let artifact = catalog
        .resolve_download(&args.issue, args.section())
        .await
        .with_context(|| format!("Failed to resolve download for edition {}", args.issue))?;
    debug!(
        url = %artifact.url(),
        edition_date = %artifact.edition_date(),
        size = ?artifact.content_length(),
        "Download started"
    );

    if let Some(output) = &args.output {
        let bytes = write_to_file(artifact, output).await?;
        info!(path = %output.display(), bytes, "Archive saved");
    } else if let Some(extract_dir) = &args.extract {
        let target = extract_target(extract_dir, args.subdir, &artifact);
        extract_archive(artifact, &target).await?;
        info!(path = %target.display(), "Archive extracted");
    } else {
        let mut stdout = tokio::io::stdout();
        artifact
            .write_to(&mut stdout)
            .await
            .context("Failed to write archive to stdout")?;
    }
    Ok(())
}

async fn write_to_file(artifact: DownloadArtifact, path: &Path) -> Result<u64> {
    let mut file = tokio::fs::File::create(path)
        .await
        .with_context(|| format!("Failed to create '{}'", path.display()))?;
    match artifact.write_to(&mut file).await {
        Ok(bytes) => Ok(bytes),
        Err(error) => {
            drop(file);
            let _ = tokio::fs::remove_file(path).await;
            Err(error).with_context(|| format!("Failed to write '{}'", path.display()))
        }
    }
}

/// Directory the archive is extracted into.
pub(crate) fn extract_target(extract_dir: &Path, subdir: bool, artifact: &DownloadArtifact) -> PathBuf {
    subdir_target(extract_dir, subdir, artifact.edition_date())
}

fn subdir_target(extract_dir: &Path, subdir: bool, date: chrono::NaiveDate) -> PathBuf {
    if subdir {
        extract_dir.join(format_edition_token(date))
    } else {
        extract_dir.to_path_buf()
    }
}

/// Spools the archive to a temporary file, then unpacks it into `target`.
async fn extract_archive(artifact: DownloadArtifact, target: &Path) -> Result<()> {
    tokio::fs::create_dir_all(target)
        .await
        .with_context(|| format!("Failed to create '{}'", target.display()))?;

    let spool = tempfile::tempfile().context("Failed to create temporary file")?;
    let mut spool = tokio::fs::File::from_std(spool);
    let bytes = artifact
        .write_to(&mut spool)
        .await
        .context("Failed to download archive")?;
    debug!(bytes, "Archive spooled");

    let spool = spool.into_std().await;
    let target = target.to_path_buf();
    tokio::task::spawn_blocking(move || unzip_into(spool, &target))
        .await
        .context("Extraction task failed")?
}

fn unzip_into(mut file: std::fs::File, target: &Path) -> Result<()> {
    file.seek(SeekFrom::Start(0))
        .context("Failed to rewind temporary file")?;
    let mut archive = zip::ZipArchive::new(file).context("Downloaded file is not a zip archive")?;
    archive
        .extract(target)
        .with_context(|| format!("Failed to extract archive into '{}'", target.display()))?;
    debug!(entries = archive.len(), "Archive unpacked");
    Ok(())
}

async fn print_lines(lines: &[String]) -> Result<()> {
    let mut stdout = tokio::io::stdout();
    for line in lines {
        stdout.write_all(line.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
    }
    stdout.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use chrono::NaiveDate;
    use tempfile::TempDir;

    use super::*;

    fn zip_with(entries: &[(&str, &[u8])]) -> std::fs::File {
        let mut file = tempfile::tempfile().unwrap();
        {
            let mut writer = zip::ZipWriter::new(&mut file);
            for (name, contents) in entries {
                writer
                    .start_file(*name, zip::write::FileOptions::default())
                    .unwrap();
                writer.write_all(contents).unwrap();
            }
            writer.finish().unwrap();
        }
        file
    }

    #[test]
    fn test_subdir_target_uses_edition_date() {
        let date = NaiveDate::from_ymd_opt(2019, 3, 2).unwrap();
        assert_eq!(
            subdir_target(Path::new("audio"), true, date),
            PathBuf::from("audio/2019-03-02")
        );
        assert_eq!(
            subdir_target(Path::new("audio"), false, date),
            PathBuf::from("audio")
        );
    }

    #[test]
    fn test_unzip_into_extracts_entries() {
        let temp = TempDir::new().unwrap();
        let file = zip_with(&[
            ("01 Introduction.mp3", b"ID3intro"),
            ("02 The world this week.mp3", b"ID3world"),
        ]);
        unzip_into(file, temp.path()).unwrap();
        assert_eq!(
            std::fs::read(temp.path().join("01 Introduction.mp3")).unwrap(),
            b"ID3intro"
        );
        assert!(temp.path().join("02 The world this week.mp3").exists());
    }

    #[test]
    fn test_unzip_into_rejects_non_zip() {
        let temp = TempDir::new().unwrap();
        let mut file = tempfile::tempfile().unwrap();
        file.write_all(b"<html>Access denied</html>").unwrap();
        let error = unzip_into(file, temp.path()).unwrap_err();
        assert!(error.to_string().contains("not a zip archive"));
    }
}
