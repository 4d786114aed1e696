// src/pipeline/checkpoint.rs

//! Checkpoint and resume bookkeeping for a run.

use crate::catalog::PostcodeCatalog;
use crate::error::Result;
use crate::models::{
    FinalAggregate, ProgressSnapshot, RunOptions, RunStatus, SearchResult, UnitOutput,
};
use crate::storage::CheckpointStorage;

/// Index to start a run from.
///
/// Returns the position of `marker` (normalized to four digits) in `units`,
/// or 0 when there is no marker or it is not in the list.
pub fn compute_resume_index(units: &[String], marker: Option<&str>) -> usize {
    let Some(marker) = marker else {
        return 0;
    };

    let normalized = PostcodeCatalog::normalize(marker);
    match units.iter().position(|u| *u == normalized) {
        Some(index) => {
            log::info!("Resuming from postcode {normalized} (index {index})");
            index
        }
        None => {
            log::warn!("Resume postcode {marker} not in this run, starting from the beginning");
            0
        }
    }
}

/// Writes a run's snapshots under the file names derived from its options.
pub struct Checkpointer<'a> {
    storage: &'a dyn CheckpointStorage,
    output_file: String,
    progress_file: String,
    partial_file: String,
    last_processed: Option<usize>,
}

impl<'a> Checkpointer<'a> {
    pub fn new(storage: &'a dyn CheckpointStorage, options: &RunOptions) -> Self {
        Self {
            storage,
            output_file: options.output_file.clone(),
            progress_file: options.progress_file(),
            partial_file: options.partial_file(),
            last_processed: None,
        }
    }

    /// Write an in-progress checkpoint. Returns `false` when skipped because
    /// `processed` has not changed since the previous write.
    pub async fn write_progress(
        &mut self,
        results: &[SearchResult],
        processed: usize,
        total: usize,
    ) -> Result<bool> {
        if self.last_processed == Some(processed) {
            return Ok(false);
        }

        let snapshot = ProgressSnapshot::new(results, processed, total);
        self.storage
            .write_progress(&self.progress_file, &snapshot)
            .await?;
        self.last_processed = Some(processed);

        log::info!(
            "Progress saved: {processed}/{total} ({}%)",
            snapshot.progress_percent
        );
        Ok(true)
    }

    /// Write the completed aggregate.
    pub async fn write_final(&self, results: &[SearchResult]) -> Result<FinalAggregate> {
        let aggregate = FinalAggregate::from_results(results, RunStatus::Completed);
        self.storage
            .write_aggregate(&self.output_file, &aggregate)
            .await?;
        log::info!("Results saved to {}", self.storage.location(&self.output_file));
        Ok(aggregate)
    }

    /// Write whatever was collected before the run aborted.
    pub async fn write_partial(&self, results: &[SearchResult]) -> Result<FinalAggregate> {
        let aggregate = FinalAggregate::from_results(results, RunStatus::Failed);
        self.storage
            .write_aggregate(&self.partial_file, &aggregate)
            .await?;
        log::info!(
            "Partial results saved to {}",
            self.storage.location(&self.partial_file)
        );
        Ok(aggregate)
    }

    /// Write a single-search result.
    pub async fn write_single(&self, result: &SearchResult) -> Result<UnitOutput> {
        let output = UnitOutput::from(result);
        self.storage
            .write_unit_output(&self.output_file, &output)
            .await?;
        log::info!("Results saved to {}", self.storage.location(&self.output_file));
        Ok(output)
    }

    /// The checkpoint a previous run of the same output left behind.
    pub async fn load_progress(&self) -> Result<Option<ProgressSnapshot>> {
        self.storage.load_progress(&self.progress_file).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Region;
    use crate::models::ScrapeMode;
    use crate::storage::LocalStorage;
    use tempfile::TempDir;

    fn units() -> Vec<String> {
        vec!["0800".into(), "2000".into(), "3000".into()]
    }

    #[test]
    fn test_resume_index() {
        assert_eq!(compute_resume_index(&units(), Some("2000")), 1);
        assert_eq!(compute_resume_index(&units(), Some("800")), 0);
        assert_eq!(compute_resume_index(&units(), Some("3000")), 2);
        assert_eq!(compute_resume_index(&units(), Some("9999")), 0);
        assert_eq!(compute_resume_index(&units(), None), 0);
    }

    #[tokio::test]
    async fn test_repeat_progress_skipped() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        let options = RunOptions::for_mode(&ScrapeMode::Sample);
        let mut checkpointer = Checkpointer::new(&storage, &options);

        let results = vec![SearchResult::success("0800", Some(Region::Nt), Vec::new())];
        assert!(checkpointer.write_progress(&results, 1, 3).await.unwrap());
        assert!(!checkpointer.write_progress(&results, 1, 3).await.unwrap());
        assert!(checkpointer.write_progress(&results, 2, 3).await.unwrap());

        let loaded = checkpointer.load_progress().await.unwrap().unwrap();
        assert_eq!(loaded.processed, 2);
        assert_eq!(loaded.progress_percent, "66.7");
        assert!(tmp.path().join("progress_ca_members_sample.json").exists());
    }

    #[tokio::test]
    async fn test_final_and_partial_files() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        let options = RunOptions::for_mode(&ScrapeMode::Cities);
        let checkpointer = Checkpointer::new(&storage, &options);

        let results = vec![SearchResult::success("2000", Some(Region::Nsw), Vec::new())];
        let final_agg = checkpointer.write_final(&results).await.unwrap();
        let partial = checkpointer.write_partial(&results).await.unwrap();

        assert_eq!(final_agg.summary.status, RunStatus::Completed);
        assert_eq!(partial.summary.status, RunStatus::Failed);
        assert!(tmp.path().join("ca_members_major_cities.json").exists());
        assert!(tmp.path().join("partial_ca_members_major_cities.json").exists());
    }

    #[tokio::test]
    async fn test_single_output_file() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        let options = RunOptions::for_mode(&ScrapeMode::Single("3000".into()));
        let checkpointer = Checkpointer::new(&storage, &options);

        let result = SearchResult::success("3000", Some(Region::Vic), Vec::new());
        checkpointer.write_single(&result).await.unwrap();

        let raw = std::fs::read_to_string(tmp.path().join("ca_members_headed.json")).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["totalCount"], 0);
        assert!(json["searchDetails"].as_array().unwrap().is_empty());
    }
}
