//! Wire client for the external sandboxed job runner.
//!
//! The runner exposes three verbs: open a named work area, upload a file into
//! it, and submit a job over previously uploaded files. Job completion is
//! reported asynchronously to the callback URL carried by the job descriptor.

use crate::config::Config;
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Handle to a file staged on the runner: the name it was uploaded under and
/// the name the job sees inside the sandbox.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunnerFile {
    #[serde(rename = "localFile")]
    pub local_file: String,
    #[serde(rename = "destFile")]
    pub dest_file: String,
}

#[derive(Debug, Clone)]
pub struct RunnerClient {
    http: reqwest::Client,
    base_url: String,
    key: String,
    workspace: String,
    job_image: String,
    job_timeout_secs: u64,
}

impl RunnerClient {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.runner_host.clone(),
            key: config.runner_key.clone(),
            workspace: config.runner_workspace.clone(),
            job_image: config.job_image.clone(),
            job_timeout_secs: config.job_timeout_secs,
        }
    }

    /// Idempotently opens the work area on the runner. Called once at startup.
    pub async fn open_workspace(&self) -> Result<serde_json::Value> {
        let url = format!("{}/open/{}/{}/", self.base_url, self.key, self.workspace);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(AppError::from_runner)?
            .error_for_status()
            .map_err(AppError::from_runner)?;

        response
            .json()
            .await
            .map_err(|e| AppError::Protocol(e.to_string()))
    }

    /// Uploads a local file under `runner_name`; the sandbox will see it as
    /// `vm_name`. Returns the handle a job descriptor needs.
    pub async fn upload_file(
        &self,
        local_path: &Path,
        runner_name: &str,
        vm_name: &str,
    ) -> Result<RunnerFile> {
        let body = tokio::fs::read(local_path).await?;

        let url = format!("{}/upload/{}/{}/", self.base_url, self.key, self.workspace);
        self.http
            .post(&url)
            .header("filename", runner_name)
            .body(body)
            .send()
            .await
            .map_err(AppError::from_runner)?
            .error_for_status()
            .map_err(AppError::from_runner)?;

        Ok(RunnerFile {
            local_file: runner_name.to_string(),
            dest_file: vm_name.to_string(),
        })
    }

    /// Submits a job over staged files. The runner POSTs the content of
    /// `output_file` to `callback_url` when the job finishes.
    pub async fn add_job(
        &self,
        job_name: &str,
        files: &[RunnerFile],
        output_file: &str,
        callback_url: &str,
    ) -> Result<serde_json::Value> {
        let descriptor = serde_json::json!({
            "image": self.job_image,
            "jobName": job_name,
            "files": files,
            "output_file": output_file,
            "callback_url": callback_url,
            "timeout": self.job_timeout_secs,
        });

        let url = format!("{}/addJob/{}/{}/", self.base_url, self.key, self.workspace);
        let response = self
            .http
            .post(&url)
            .json(&descriptor)
            .send()
            .await
            .map_err(AppError::from_runner)?
            .error_for_status()
            .map_err(AppError::from_runner)?;

        response
            .json()
            .await
            .map_err(|e| AppError::Protocol(e.to_string()))
    }

    /// Shared client for plain HTTP downloads (engine artifacts).
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }
}
