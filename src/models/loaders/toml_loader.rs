use std::path::Path;

use tokio::fs;

use crate::error::JobError;
use crate::models::job::HarvestJob;

/// 从 TOML 文件加载抓取任务
pub async fn load_job(path: &Path) -> Result<HarvestJob, JobError> {
    let shown = path.display().to_string();

    let content = fs::read_to_string(path).await.map_err(|source| JobError::Read {
        path: shown.clone(),
        source,
    })?;

    let job: HarvestJob = toml::from_str(&content).map_err(|source| JobError::Parse {
        path: shown.clone(),
        source,
    })?;

    tracing::info!(
        "已加载任务文件 {}: {} 个单独学号, {} 个区间",
        shown,
        job.singles.len(),
        job.ranges.len()
    );

    Ok(job)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_load_job() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            singles = ["22A1"]
            output = "out.xlsx"

            [[ranges]]
            from = "22A101"
            to = "22A102"
            "#
        )
        .unwrap();

        let job = load_job(file.path()).await.unwrap();
        assert_eq!(job.output.as_deref(), Some("out.xlsx"));
        assert_eq!(job.roll_numbers().unwrap(), vec!["22A1", "22A101", "22A102"]);
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let result = load_job(Path::new("does/not/exist.toml")).await;
        assert!(matches!(result, Err(JobError::Read { .. })));
    }

    #[tokio::test]
    async fn test_load_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "singles = [").unwrap();
        let result = load_job(file.path()).await;
        assert!(matches!(result, Err(JobError::Parse { .. })));
    }
}
