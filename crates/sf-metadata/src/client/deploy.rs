use busbar_sf_client::security::url as url_security;
use busbar_sf_client::MultipartPart;
use tracing::{info, instrument};

use crate::deploy::{
    DeployJob, DeployMode, DeployOptions, DeployRequestBody, DeployRequestResponse, DeployResult,
    DeployStatusResponse,
};
use crate::error::{Error, ErrorKind, Result};
use crate::package::DeployPackage;

/// Archive file name sent with every deploy request.
const PACKAGE_FILE_NAME: &str = "deploymentPackage.zip";

impl super::MetadataClient {
    /// Submit a package with default options for `mode`.
    pub async fn submit(&self, package: &DeployPackage, mode: DeployMode) -> Result<DeployJob> {
        self.submit_with_options(package, &DeployOptions::for_mode(mode))
            .await
    }

    /// Submit a package for asynchronous deployment.
    ///
    /// Sent exactly once. A failed submission never leaves a job behind that
    /// the caller knows about, so it is not retried here either.
    #[instrument(skip(self, package, options), fields(members = package.member_count()))]
    pub async fn submit_with_options(
        &self,
        package: &DeployPackage,
        options: &DeployOptions,
    ) -> Result<DeployJob> {
        let archive = package.to_zip()?;
        let body = serde_json::to_value(DeployRequestBody {
            deploy_options: options,
        })
        .map_err(|e| Error::with_source(ErrorKind::Submission(e.to_string()), e))?;

        let parts = vec![
            MultipartPart::json("json", &body).map_err(submission_error)?,
            MultipartPart::file("file", PACKAGE_FILE_NAME, "application/zip", archive),
        ];

        let url = self.client.metadata_rest_url("deployRequest");
        let response: DeployRequestResponse = self
            .client
            .post_multipart(&url, parts)
            .await
            .map_err(submission_error)?;

        let id = response
            .id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| {
                Error::new(ErrorKind::Submission(
                    "deploy request response carried no job id".to_string(),
                ))
            })?;

        let mode = options.mode();
        info!(job_id = %id, ?mode, "Deploy submitted");

        Ok(DeployJob {
            id,
            mode,
            manifest: package.manifest().clone(),
        })
    }

    /// Read the current state of a deployment, including component details.
    #[instrument(skip(self))]
    pub async fn check_status(&self, job_id: &str) -> Result<DeployResult> {
        if !url_security::is_valid_salesforce_id(job_id) {
            return Err(Error::new(ErrorKind::InvalidName(format!(
                "'{job_id}' is not a valid deploy job id"
            ))));
        }

        let url = self.client.metadata_rest_url(&format!(
            "deployRequest/{}?includeDetails=true",
            url_security::encode_param(job_id)
        ));
        let response: DeployStatusResponse = self.client.get_json(&url).await?;
        Ok(response.deploy_result)
    }
}

fn submission_error(err: busbar_sf_client::Error) -> Error {
    Error::with_source(ErrorKind::Submission(err.to_string()), err)
}
