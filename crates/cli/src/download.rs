//! HydroSHEDS downloads
//!
//! Files stream to `<name>.part` and are renamed once complete, so a failed
//! or timed-out transfer never leaves a file under its final name. Zip
//! archives are extracted into the HydroSHEDS directory.

use crate::config::DownloadConfig;
use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

/// Region codes HydroSHEDS publishes
pub const REGIONS: [&str; 9] = ["af", "ar", "as", "au", "eu", "gr", "na", "sa", "si"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Product {
    /// Elevation grid (BIL)
    Dem,
    /// HydroBASINS polygons, all levels
    Basins,
}

pub struct Downloader {
    dir: PathBuf,
    config: DownloadConfig,
    resolution: String,
}

impl Downloader {
    pub fn new(dir: &Path, config: DownloadConfig, resolution: &str) -> Result<Self> {
        if !dir.is_dir() {
            bail!("{} does not exist", dir.display());
        }
        Ok(Self {
            dir: dir.to_path_buf(),
            config,
            resolution: resolution.to_string(),
        })
    }

    pub fn url(&self, product: Product, region: &str) -> String {
        let template = match product {
            Product::Dem => &self.config.dem_url,
            Product::Basins => &self.config.basins_url,
        };
        template
            .replace("{region}", region)
            .replace("{resolution}", &self.resolution)
    }

    /// Fetch one product for one region, unzipping archives. Returns the
    /// downloaded file.
    pub fn download(&self, product: Product, region: &str) -> Result<PathBuf> {
        check_region(region)?;
        let url = self.url(product, region);
        let name = url
            .rsplit('/')
            .next()
            .and_then(|n| n.split('?').next())
            .filter(|n| !n.is_empty())
            .with_context(|| format!("Cannot derive a file name from {}", url))?;
        let dest = self.dir.join(name);
        if dest.exists() {
            bail!("{} already exists", dest.display());
        }

        info!("Downloading from {}", url);
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to start async runtime")?;
        let timeout = Duration::from_secs(self.config.timeout_secs);
        runtime.block_on(fetch(&url, &dest, timeout))?;

        if dest.extension().is_some_and(|ext| ext == "zip") {
            unzip(&dest, &self.dir)?;
        }
        Ok(dest)
    }
}

pub fn check_region(region: &str) -> Result<()> {
    if !REGIONS.contains(&region) {
        bail!(
            "Unrecognized region: {}, must be one of {}",
            region,
            REGIONS.join(", ")
        );
    }
    Ok(())
}

fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    dest.with_file_name(name)
}

async fn fetch(url: &str, dest: &Path, timeout: Duration) -> Result<()> {
    let part = part_path(dest);
    let result = stream_to(url, &part, timeout).await;
    match result {
        Ok(()) => {
            tokio::fs::rename(&part, dest)
                .await
                .with_context(|| format!("Failed to move download to {}", dest.display()))?;
            Ok(())
        }
        Err(e) => {
            if let Err(rm) = tokio::fs::remove_file(&part).await {
                warn!("Could not remove {}: {}", part.display(), rm);
            }
            Err(e)
        }
    }
}

async fn stream_to(url: &str, part: &Path, timeout: Duration) -> Result<()> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .context("Failed to build HTTP client")?;
    let mut response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Request to {} failed", url))?
        .error_for_status()?;

    let pb = match response.content_length() {
        Some(len) => {
            let pb = ProgressBar::new(len);
            if let Ok(style) = ProgressStyle::default_bar()
                .template("{bar:40.green} {bytes}/{total_bytes} ({eta})")
            {
                pb.set_style(style);
            }
            pb
        }
        None => ProgressBar::new_spinner(),
    };

    let mut file = tokio::fs::File::create(part)
        .await
        .with_context(|| format!("Failed to create {}", part.display()))?;
    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await?;
        pb.inc(chunk.len() as u64);
    }
    file.flush().await?;
    pb.finish_and_clear();
    Ok(())
}

/// Extract every entry of `archive` into `dir`
pub fn unzip(archive: &Path, dir: &Path) -> Result<()> {
    let file = File::open(archive).with_context(|| format!("Failed to open {}", archive.display()))?;
    let mut zip = zip::ZipArchive::new(file)
        .with_context(|| format!("{} is not a zip archive", archive.display()))?;
    info!("Extracting {} files from {}", zip.len(), archive.display());
    zip.extract(dir)
        .with_context(|| format!("Failed to extract {}", archive.display()))?;
    Ok(())
}
