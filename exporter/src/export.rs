//! The export pipeline.
//!
//! An export takes one project collection from iRODS to a repository. The descriptive metadata
//! always becomes a new draft dataset; with [`data_export`](ExportRequest::data_export), the
//! files of the collection follow as a single zip archive which is streamed straight from iRODS
//! into the upload and verified on both ends. Every step is announced on the collection through
//! [`Progress`].

use crate::{
    bundle::{self, Plan},
    dataverse::{Dataverse, Upload},
    irods::{Avu, Irods, METADATA_FILE},
    mailer::{Confirmation, Mailer},
    mapper::map_dataset,
    metadata::CollectionMetadata,
    status::{ExporterState, Progress, Repository, EXTERNAL_PID},
};
use anyhow::Error;
use async_std::{channel, task::sleep};
use clap::Args;
use derive_more::Display;
use futures::{join, TryStreamExt};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use ExporterState::*;

/// Number of chunks buffered between the bundle and the upload.
const UPLOAD_BUFFER: usize = 4;

/// Export options.
#[derive(Clone, Debug, Args)]
pub struct Options {
    /// Seconds for which a finished export stays in the `exported` state.
    #[clap(long, env = "EXPORT_REPORT_DELAY", default_value = "5")]
    pub export_report_delay: u64,

    /// Also write every bundle to this file.
    #[clap(long, env = "EXPORT_DEBUG_ARCHIVE")]
    pub export_debug_archive: Option<PathBuf>,
}

/// A request to export a collection, as published on the message broker.
#[derive(Clone, Debug, Display, PartialEq, Eq, Deserialize, Serialize)]
#[display(fmt = "{} export of {}/{}", repository, project, collection)]
pub struct ExportRequest {
    pub project: String,
    pub collection: String,
    pub repository: Repository,
    /// Dataverse collection in which to create the dataset.
    #[serde(default)]
    pub dataverse_alias: String,
    /// E-mail address of the user who requested the export.
    #[serde(default)]
    pub depositor: String,
    /// Delete the exported files from iRODS once they are safely deposited.
    #[serde(default)]
    pub delete: bool,
    /// Restrict access to the deposited files.
    #[serde(default)]
    pub restrict: bool,
    /// Deposit the files of the collection, not just its metadata.
    #[serde(default)]
    pub data_export: bool,
    /// Comma-separated paths, relative to the collection, of the files to deposit.
    ///
    /// If empty, all files are deposited.
    #[serde(default)]
    pub restrict_list: String,
}

impl ExportRequest {
    /// The iRODS path of the collection to export.
    pub fn collection_path(&self, zone: &str) -> String {
        format!("/{zone}/projects/{}/{}", self.project, self.collection)
    }
}

/// An export which failed in a way that is recorded on the collection.
///
/// The failure state is left in place for the user to see.
#[derive(Clone, Debug, Display, PartialEq, Eq)]
#[display(fmt = "export failed ({}): {}", state, reason)]
pub struct ExportFailed {
    pub state: ExporterState,
    pub reason: String,
}

impl std::error::Error for ExportFailed {}

/// Exports collections from iRODS to Dataverse.
pub struct Exporter<I, D, M> {
    irods: I,
    dataverse: D,
    mailer: M,
    zone: String,
    report_delay: Duration,
    debug_archive: Option<PathBuf>,
}

impl<I: Irods, D: Dataverse, M: Mailer> Exporter<I, D, M> {
    pub fn new(irods: I, dataverse: D, mailer: M, zone: impl Into<String>) -> Self {
        Self {
            irods,
            dataverse,
            mailer,
            zone: zone.into(),
            report_delay: Duration::from_secs(5),
            debug_archive: None,
        }
    }

    /// Apply [`Options`].
    pub fn with_options(self, opt: &Options) -> Self {
        Self {
            report_delay: Duration::from_secs(opt.export_report_delay),
            debug_archive: opt.export_debug_archive.clone(),
            ..self
        }
    }

    pub fn with_report_delay(self, report_delay: Duration) -> Self {
        Self {
            report_delay,
            ..self
        }
    }

    /// Run an export.
    ///
    /// # Returns
    ///
    /// The persistent identifier of the new dataset.
    ///
    /// # Errors
    ///
    /// If the export fails in a step which reports its own failure state, the error is an
    /// [`ExportFailed`] and the state is left on the collection. On any other error, all progress
    /// AVUs are removed from the collection.
    pub async fn export(&self, req: &ExportRequest) -> Result<String, Error> {
        if req.repository != Repository::Dataverse {
            return Err(Error::msg(format!(
                "exports to {} are not supported",
                req.repository
            )));
        }

        let collection = req.collection_path(&self.zone);
        tracing::info!("starting {req} ({collection})");
        let progress = Progress::new(&self.irods, collection.as_str(), req.repository);
        match self.export_to_dataverse(req, &collection, &progress).await {
            Ok(pid) => {
                tracing::info!("export of {collection} done: {pid}");
                Ok(pid)
            }
            Err(err) => {
                if err.downcast_ref::<ExportFailed>().is_none() {
                    tracing::warn!("unexpected error, cleaning up {collection}");
                    if let Err(cleanup_err) = progress.cleanup().await {
                        tracing::error!("cleaning up {collection} failed: {cleanup_err:#}");
                    }
                }
                Err(err)
            }
        }
    }

    async fn export_to_dataverse(
        &self,
        req: &ExportRequest,
        collection: &str,
        progress: &Progress<'_, I>,
    ) -> Result<String, Error> {
        let mut md = self.irods.read_metadata(collection).await?;
        if !req.depositor.is_empty() {
            md.depositor = req.depositor.clone();
        }
        let dataset = map_dataset(&md)?;

        progress.update(CreateExporter, CreateDataset).await?;
        let pid = match self
            .dataverse
            .create_dataset(&req.dataverse_alias, &dataset)
            .await
        {
            Ok(pid) => pid,
            Err(err) => {
                tracing::error!("create dataset failed: {err:#}");
                progress.update(CreateDataset, CreateDatasetFailed).await?;
                if req.data_export {
                    progress.update(CreateDataset, DatasetUnknown).await?;
                }
                return Err(ExportFailed {
                    state: CreateDatasetFailed,
                    reason: format!("{err:#}"),
                }
                .into());
            }
        };
        tracing::info!("dataset created with pid: {pid}");

        if req.data_export {
            let deposited = self.deposit_files(req, collection, &md, &pid, progress).await?;
            progress.update(ValidateUpload, Finalize).await?;
            if req.delete {
                self.delete(&deposited).await?;
            }
            self.final_report(collection, &pid, progress).await?;
            self.confirm(&md, &pid).await;
            self.submit_for_review(&pid).await;
        } else {
            progress.update(CreateDataset, Finalize).await?;
            self.final_report(collection, &pid, progress).await?;
            self.confirm(&md, &pid).await;
        }
        Ok(pid)
    }

    /// Bundle, upload and validate the files of the collection.
    ///
    /// Returns the paths of the validated files.
    async fn deposit_files(
        &self,
        req: &ExportRequest,
        collection: &str,
        md: &CollectionMetadata,
        pid: &str,
        progress: &Progress<'_, I>,
    ) -> Result<Vec<String>, Error> {
        progress.update(CreateDataset, PrepareCollection).await?;
        let objects = bundle::select(
            collection,
            self.irods.list(collection).await?,
            &req.restrict_list,
        );
        let plan = Plan::new(collection, objects);
        tracing::info!(
            "bundling {} files into {} bytes",
            plan.members().len(),
            plan.size()
        );

        progress.update(PrepareCollection, ZipCollection).await?;
        progress
            .update(ZipCollection, UploadZippedCollection)
            .await?;
        let (sink, source) = channel::bounded(UPLOAD_BUFFER);
        let upload: Upload = Box::new(source.into_async_read());
        let (irods_sums, bundled, uploaded) = join!(
            self.irods_checksums(&plan),
            bundle::stream(&self.irods, &plan, sink, self.debug_archive.as_deref()),
            self.dataverse
                .add_file(pid, &md.title, upload, plan.size(), req.restrict),
        );
        let irods_sums = irods_sums?;
        let (bundled, uploaded) = match (bundled, uploaded) {
            (Ok(bundled), uploaded) => (bundled, uploaded),
            (Err(err), Ok(_)) => return Err(err),
            (Err(err), Err(upload_err)) => {
                tracing::error!("bundle aborted: {err:#}");
                return Err(fail(progress, UploadZippedCollection, UploadFailed, upload_err).await);
            }
        };

        progress
            .update(UploadZippedCollection, ValidateChecksum)
            .await?;
        let corrupted = corrupted_files(&irods_sums, &bundled.sha256);
        if !corrupted.is_empty() {
            tracing::error!("SHA-256 checksum: failed for {corrupted:?}");
            let reason = format!("SHA-256 mismatch for {}", corrupted.join(", "));
            return Err(fail(progress, ValidateChecksum, UploadCorrupted, reason).await);
        }
        tracing::info!("iRODS & buffer SHA-256 checksum: validated");

        progress.update(ValidateChecksum, ValidateUpload).await?;
        tracing::info!("buffer MD5: {}", bundled.md5);
        match uploaded {
            Err(err) => {
                tracing::error!("upload failed: {err:#}");
                return Err(fail(progress, ValidateUpload, UploadFailed, format!("{err:#}")).await);
            }
            Ok(md5) if md5 != bundled.md5 => {
                tracing::error!("Dataverse MD5 {md5} does not match buffer MD5 {}", bundled.md5);
                let reason = format!("Dataverse reported MD5 {md5}, expected {}", bundled.md5);
                return Err(fail(progress, ValidateUpload, UploadCorrupted, reason).await);
            }
            Ok(_) => tracing::info!("checksum MD5 validated"),
        }

        Ok(bundled.sha256.into_keys().collect())
    }

    async fn irods_checksums(&self, plan: &Plan) -> Result<BTreeMap<String, String>, Error> {
        let mut sums = BTreeMap::new();
        for member in plan.members() {
            let sum = self.irods.checksum(&member.object.path).await?;
            tracing::info!("iRODS {} SHA-256: {sum}", member.name);
            sums.insert(member.object.path.clone(), sum);
        }
        Ok(sums)
    }

    /// Delete deposited files from iRODS, keeping the collection's description.
    async fn delete(&self, paths: &[String]) -> Result<(), Error> {
        for path in paths {
            if path.rsplit('/').next() == Some(METADATA_FILE) {
                continue;
            }
            tracing::info!("deleting {path}");
            self.irods.remove(path).await?;
        }
        Ok(())
    }

    async fn final_report(
        &self,
        collection: &str,
        pid: &str,
        progress: &Progress<'_, I>,
    ) -> Result<(), Error> {
        tracing::info!("report final progress");
        self.irods
            .add_avu(
                collection,
                &Avu::with_unit(EXTERNAL_PID, pid, Repository::Dataverse.to_string()),
            )
            .await?;
        progress.update(Finalize, Exported).await?;
        sleep(self.report_delay).await;
        progress.clear(Exported).await
    }

    /// The deposit is complete by now, so a failed submission only leaves the draft unreviewed.
    async fn submit_for_review(&self, pid: &str) {
        if let Err(err) = self.dataverse.submit_for_review(pid).await {
            tracing::error!("submitting {pid} for review failed: {err:#}");
        }
    }

    async fn confirm(&self, md: &CollectionMetadata, pid: &str) {
        let confirmation = Confirmation::new(
            md,
            Repository::Dataverse,
            pid,
            self.dataverse.dataset_url(pid),
        );
        if let Err(err) = self.mailer.send(&confirmation).await {
            tracing::error!(
                "sending confirmation to {} failed: {err:#}",
                md.depositor
            );
        }
    }
}

/// Record a failure state, returning the error to propagate.
async fn fail<I: Irods>(
    progress: &Progress<'_, I>,
    from: ExporterState,
    to: ExporterState,
    reason: impl std::fmt::Display,
) -> Error {
    if let Err(err) = progress.update(from, to).await {
        return err;
    }
    ExportFailed {
        state: to,
        reason: reason.to_string(),
    }
    .into()
}

/// Paths whose bundled contents do not match the checksum computed by iRODS.
fn corrupted_files(
    irods: &BTreeMap<String, String>,
    bundled: &BTreeMap<String, String>,
) -> Vec<String> {
    bundled
        .iter()
        .filter(|(path, sha)| irods.get(*path) != Some(*sha))
        .map(|(path, _)| path.clone())
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{dataverse::mock::MockDataverse, irods::mock::MockIrods, mailer::mock::MockMailer};
    use serde_json::json;
    use std::io::{Cursor, Read};
    use zip::ZipArchive;

    const COLLECTION: &str = "/nlmumc/projects/P000000010/C000000001";

    fn request(data_export: bool) -> ExportRequest {
        serde_json::from_value(json!({
            "project": "P000000010",
            "collection": "C000000001",
            "repository": "Dataverse",
            "dataverse_alias": "mumc",
            "depositor": "jane@example.org",
            "data_export": data_export,
        }))
        .unwrap()
    }

    async fn zone() -> MockIrods {
        let metadata = json!({
            "title": "Heart study",
            "creator": "pi@example.org",
            "description": "Hearts, mostly.",
            "date": "2021-04-01",
            "PID": "21.T12996/P000000010C000000001",
            "contact": [{}],
            "factors": ["age"],
            "articles": [],
        });
        let irods = MockIrods::default()
            .with_file(
                format!("{COLLECTION}/{METADATA_FILE}"),
                serde_json::to_vec(&metadata).unwrap(),
            )
            .with_file(format!("{COLLECTION}/scan.dcm"), vec![7; 1000])
            .with_file(format!("{COLLECTION}/notes/readme.txt"), b"read me".to_vec());
        irods
            .add_avu(COLLECTION, &CreateExporter.avu(Repository::Dataverse))
            .await
            .unwrap();
        irods
    }

    fn exporter(
        irods: &MockIrods,
        dataverse: &MockDataverse,
        mailer: &MockMailer,
    ) -> Exporter<MockIrods, MockDataverse, MockMailer> {
        Exporter::new(irods.clone(), dataverse.clone(), mailer.clone(), "nlmumc")
            .with_report_delay(Duration::ZERO)
    }

    /// The values of every progress AVU ever attached to the collection, in order.
    async fn history(irods: &MockIrods) -> Vec<String> {
        irods
            .added_avus()
            .await
            .into_iter()
            .filter(|(coll, avu)| coll == COLLECTION && avu.attribute == "exporterState")
            .map(|(_, avu)| avu.value)
            .collect()
    }

    async fn progress_avus(irods: &MockIrods) -> Vec<String> {
        irods
            .avus(COLLECTION)
            .await
            .unwrap()
            .into_iter()
            .filter(|avu| avu.attribute == "exporterState")
            .map(|avu| avu.value)
            .collect()
    }

    #[test]
    fn test_request_defaults() {
        let req = request(false);
        assert!(!req.delete);
        assert!(!req.restrict);
        assert_eq!(req.restrict_list, "");
        assert_eq!(req.collection_path("nlmumc"), COLLECTION);
        assert_eq!(
            req.to_string(),
            "Dataverse export of P000000010/C000000001"
        );

        let err = serde_json::from_value::<ExportRequest>(json!({
            "project": "P1",
            "collection": "C1",
            "repository": "Figshare",
        }))
        .unwrap_err();
        assert!(err.to_string().contains("Figshare"), "{err}");
    }

    #[async_std::test]
    async fn test_metadata_only() {
        let irods = zone().await;
        let dataverse = MockDataverse::default();
        let mailer = MockMailer::default();
        let pid = exporter(&irods, &dataverse, &mailer)
            .export(&request(false))
            .await
            .unwrap();

        assert_eq!(
            history(&irods).await,
            [
                "Dataverse:create-exporter",
                "Dataverse:create-dataset",
                "Dataverse:finalize",
                "Dataverse:exported",
            ]
        );
        assert!(progress_avus(&irods).await.is_empty());
        assert!(irods
            .avus(COLLECTION)
            .await
            .unwrap()
            .contains(&Avu::with_unit("externalPID", &pid, "Dataverse")));

        let datasets = dataverse.datasets().await;
        assert_eq!(datasets.len(), 1);
        assert_eq!(datasets[0].0, "mumc");
        assert!(dataverse.deposits().await.is_empty());
        assert!(dataverse.reviews().await.is_empty());

        let sent = mailer.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].depositor, "jane@example.org");
        assert_eq!(sent[0].external_pid, pid);
        assert_eq!(sent[0].numfiles, 3);
    }

    #[async_std::test]
    async fn test_data_export() {
        let irods = zone().await;
        let dataverse = MockDataverse::default();
        let mailer = MockMailer::default();
        let mut req = request(true);
        req.restrict = true;
        let pid = exporter(&irods, &dataverse, &mailer)
            .export(&req)
            .await
            .unwrap();

        assert_eq!(
            history(&irods).await,
            [
                "Dataverse:create-exporter",
                "Dataverse:create-dataset",
                "Dataverse:prepare-collection",
                "Dataverse:zip-collection",
                "Dataverse:upload-zipped-collection",
                "Dataverse:validate-checksum",
                "Dataverse:validate-upload",
                "Dataverse:finalize",
                "Dataverse:exported",
            ]
        );
        assert!(progress_avus(&irods).await.is_empty());
        assert_eq!(dataverse.reviews().await, [pid.clone()]);
        assert_eq!(mailer.sent().await.len(), 1);
        assert!(irods.removed().await.is_empty());

        let deposits = dataverse.deposits().await;
        assert_eq!(deposits.len(), 1);
        assert_eq!(deposits[0].pid, pid);
        assert_eq!(deposits[0].name, "Heart study");
        assert!(deposits[0].restrict);

        let mut archive = ZipArchive::new(Cursor::new(deposits[0].contents.clone())).unwrap();
        let mut names = archive.file_names().map(String::from).collect::<Vec<_>>();
        names.sort();
        assert_eq!(names, ["metadata.json", "notes/readme.txt", "scan.dcm"]);
        let mut contents = vec![];
        archive
            .by_name("notes/readme.txt")
            .unwrap()
            .read_to_end(&mut contents)
            .unwrap();
        assert_eq!(contents, b"read me");
    }

    #[async_std::test]
    async fn test_restrict_list_and_delete() {
        let irods = zone().await;
        let dataverse = MockDataverse::default();
        let mailer = MockMailer::default();
        let mut req = request(true);
        req.delete = true;
        req.restrict_list = "scan.dcm,metadata.json".into();
        exporter(&irods, &dataverse, &mailer)
            .export(&req)
            .await
            .unwrap();

        let deposits = dataverse.deposits().await;
        let archive = ZipArchive::new(Cursor::new(deposits[0].contents.clone())).unwrap();
        assert_eq!(archive.len(), 2);
        assert_eq!(irods.removed().await, [format!("{COLLECTION}/scan.dcm")]);
    }

    #[async_std::test]
    async fn test_checksum_mismatch() {
        let irods = zone().await.with_checksum(format!("{COLLECTION}/scan.dcm"), "00");
        let dataverse = MockDataverse::default();
        let mailer = MockMailer::default();
        let mut req = request(true);
        req.delete = true;
        let err = exporter(&irods, &dataverse, &mailer)
            .export(&req)
            .await
            .unwrap_err();
        let failed = err.downcast_ref::<ExportFailed>().unwrap();
        assert_eq!(failed.state, UploadCorrupted);
        assert!(failed.reason.contains("scan.dcm"), "{}", failed.reason);

        assert_eq!(progress_avus(&irods).await, ["Dataverse:upload-corrupted"]);
        assert!(irods.removed().await.is_empty());
        assert!(dataverse.reviews().await.is_empty());
        assert!(mailer.sent().await.is_empty());
    }

    #[async_std::test]
    async fn test_md5_mismatch() {
        let irods = zone().await;
        let dataverse = MockDataverse::default().corrupting_files();
        let mailer = MockMailer::default();
        let err = exporter(&irods, &dataverse, &mailer)
            .export(&request(true))
            .await
            .unwrap_err();
        assert_eq!(err.downcast_ref::<ExportFailed>().unwrap().state, UploadCorrupted);
        assert_eq!(progress_avus(&irods).await, ["Dataverse:upload-corrupted"]);
        assert!(
            !history(&irods)
                .await
                .contains(&"Dataverse:finalize".to_string())
        );
    }

    #[async_std::test]
    async fn test_upload_failed() {
        let irods = zone().await;
        let dataverse = MockDataverse::default().rejecting_files();
        let mailer = MockMailer::default();
        let err = exporter(&irods, &dataverse, &mailer)
            .export(&request(true))
            .await
            .unwrap_err();
        assert_eq!(err.downcast_ref::<ExportFailed>().unwrap().state, UploadFailed);
        assert_eq!(progress_avus(&irods).await, ["Dataverse:upload-failed"]);
    }

    #[async_std::test]
    async fn test_create_dataset_failed() {
        let irods = zone().await;
        let dataverse = MockDataverse::default().rejecting_datasets();
        let mailer = MockMailer::default();
        let err = exporter(&irods, &dataverse, &mailer)
            .export(&request(true))
            .await
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<ExportFailed>().unwrap().state,
            CreateDatasetFailed
        );
        assert_eq!(
            progress_avus(&irods).await,
            [
                "Dataverse:create-dataset-failed",
                "Dataverse:dataset-unknown"
            ]
        );
        assert!(mailer.sent().await.is_empty());
    }

    #[async_std::test]
    async fn test_unexpected_error_cleans_up() {
        // A PID the mapper cannot split.
        let irods = MockIrods::default().with_file(
            format!("{COLLECTION}/{METADATA_FILE}"),
            serde_json::to_vec(&json!({
                "title": "t",
                "creator": "c",
                "date": "d",
                "PID": "no-slash",
            }))
            .unwrap(),
        );
        irods
            .add_avu(COLLECTION, &CreateExporter.avu(Repository::Dataverse))
            .await
            .unwrap();
        irods
            .add_avu(COLLECTION, &Avu::new("title", "t"))
            .await
            .unwrap();
        let dataverse = MockDataverse::default();
        let mailer = MockMailer::default();
        let err = exporter(&irods, &dataverse, &mailer)
            .export(&request(true))
            .await
            .unwrap_err();
        assert!(err.downcast_ref::<ExportFailed>().is_none());
        assert!(progress_avus(&irods).await.is_empty());
        assert_eq!(
            irods.avus(COLLECTION).await.unwrap(),
            [Avu::new("title", "t")]
        );
        assert!(dataverse.datasets().await.is_empty());
    }

    #[async_std::test]
    async fn test_mail_failure_is_not_fatal() {
        let irods = zone().await;
        let dataverse = MockDataverse::default();
        let mailer = MockMailer::failing();
        exporter(&irods, &dataverse, &mailer)
            .export(&request(false))
            .await
            .unwrap();
        assert!(progress_avus(&irods).await.is_empty());
    }

    #[async_std::test]
    async fn test_review_failure_is_not_fatal() {
        let irods = zone().await;
        let dataverse = MockDataverse::default().rejecting_reviews();
        let mailer = MockMailer::default();
        let pid = exporter(&irods, &dataverse, &mailer)
            .export(&request(true))
            .await
            .unwrap();
        assert_eq!(dataverse.deposits().await.len(), 1);
        assert!(dataverse.reviews().await.is_empty());
        assert_eq!(mailer.sent().await.len(), 1);
        assert!(progress_avus(&irods).await.is_empty());
        assert!(irods
            .avus(COLLECTION)
            .await
            .unwrap()
            .contains(&Avu::with_unit(EXTERNAL_PID, pid.as_str(), "Dataverse")));
    }

    #[async_std::test]
    async fn test_unsupported_repository() {
        let irods = zone().await;
        let dataverse = MockDataverse::default();
        let mailer = MockMailer::default();
        let mut req = request(false);
        req.repository = Repository::Easy;
        let err = exporter(&irods, &dataverse, &mailer)
            .export(&req)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("EASY"), "{err}");
        assert_eq!(progress_avus(&irods).await, ["Dataverse:create-exporter"]);
    }

    #[test]
    fn test_corrupted_files() {
        let sums = |pairs: &[(&str, &str)]| {
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>()
        };
        let irods = sums(&[("/a", "1"), ("/b", "2")]);
        assert!(corrupted_files(&irods, &sums(&[("/a", "1"), ("/b", "2")])).is_empty());
        assert_eq!(
            corrupted_files(&irods, &sums(&[("/a", "1"), ("/b", "3"), ("/c", "4")])),
            ["/b", "/c"]
        );
    }
}
