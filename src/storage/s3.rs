// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! S3 (and S3-compatible) backend built on `aws-sdk-s3`.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::retry::RetryConfig;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::operation::head_object::HeadObjectError;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::DateTime as S3DateTime;
use aws_sdk_s3::Client;
use chrono::{DateTime, Utc};

use super::{ObjectMetadata, ObjectStorage, StorageError, StorageResult};
use crate::config::S3Settings;

/// S3 storage gateway.
#[derive(Clone)]
pub struct S3Storage {
    client: Client,
    bucket: String,
}

impl S3Storage {
    /// Build the client from settings.
    ///
    /// Static credentials are used when both keys are configured, otherwise
    /// the default AWS provider chain. A custom endpoint switches to
    /// path-style addressing (MinIO and most S3-compatible stores need it).
    /// SDK retries are disabled: failures propagate immediately.
    pub async fn connect(settings: &S3Settings) -> StorageResult<Self> {
        if settings.bucket.is_empty() {
            return Err(StorageError::Config("bucket name is empty".to_string()));
        }

        let region = Region::new(settings.region.clone());
        let mut builder = match (&settings.access_key_id, &settings.secret_access_key) {
            (Some(access_key_id), Some(secret_access_key)) => aws_sdk_s3::Config::builder()
                .behavior_version(BehaviorVersion::latest())
                .region(region)
                .credentials_provider(Credentials::new(
                    access_key_id,
                    secret_access_key,
                    None,
                    None,
                    "environment",
                )),
            _ => {
                let shared = aws_config::defaults(BehaviorVersion::latest())
                    .region(region)
                    .load()
                    .await;
                aws_sdk_s3::config::Builder::from(&shared)
            }
        };

        builder = builder.retry_config(RetryConfig::disabled());
        if let Some(ref endpoint) = settings.endpoint {
            builder = builder
                .endpoint_url(endpoint.as_str().trim_end_matches('/'))
                .force_path_style(true);
        }

        tracing::info!(
            bucket = %settings.bucket,
            region = %settings.region,
            endpoint = settings.endpoint.as_ref().map(|u| u.as_str()).unwrap_or("aws"),
            "S3 storage configured"
        );

        Ok(Self {
            client: Client::from_conf(builder.build()),
            bucket: settings.bucket.clone(),
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

fn presigning_config(ttl: Duration) -> StorageResult<PresigningConfig> {
    PresigningConfig::expires_in(ttl).map_err(|e| StorageError::Presign(e.to_string()))
}

fn is_not_found(err: &SdkError<HeadObjectError>) -> bool {
    match err {
        SdkError::ServiceError(service_err) => {
            matches!(service_err.err(), HeadObjectError::NotFound(_))
                || service_err.raw().status().as_u16() == 404
        }
        _ => false,
    }
}

fn to_chrono(value: &S3DateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(value.secs(), value.subsec_nanos())
}

#[async_trait]
impl ObjectStorage for S3Storage {
    async fn create_upload_url(
        &self,
        file_key: &str,
        content_type: &str,
        ttl: Duration,
    ) -> StorageResult<String> {
        let request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(file_key)
            .content_type(content_type)
            .presigned(presigning_config(ttl)?)
            .await
            .map_err(|e| StorageError::Presign(DisplayErrorContext(&e).to_string()))?;

        tracing::debug!(
            bucket = %self.bucket,
            key = %file_key,
            ttl_secs = ttl.as_secs(),
            "Presigned PUT issued"
        );

        Ok(request.uri().to_string())
    }

    async fn create_playback_url(&self, file_key: &str, ttl: Duration) -> StorageResult<String> {
        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(file_key)
            .presigned(presigning_config(ttl)?)
            .await
            .map_err(|e| StorageError::Presign(DisplayErrorContext(&e).to_string()))?;

        tracing::debug!(
            bucket = %self.bucket,
            key = %file_key,
            ttl_secs = ttl.as_secs(),
            "Presigned GET issued"
        );

        Ok(request.uri().to_string())
    }

    async fn get_metadata(&self, file_key: &str) -> StorageResult<Option<ObjectMetadata>> {
        let start = Instant::now();
        let result = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(file_key)
            .send()
            .await;

        match result {
            Ok(output) => Ok(Some(ObjectMetadata {
                size: output.content_length().unwrap_or(0).max(0) as u64,
                content_type: output.content_type().map(str::to_string),
                last_modified: output.last_modified().and_then(to_chrono),
            })),
            Err(e) if is_not_found(&e) => Ok(None),
            Err(e) => {
                let detail = DisplayErrorContext(&e).to_string();
                tracing::error!(
                    error = %detail,
                    bucket = %self.bucket,
                    key = %file_key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 head_object failed"
                );
                Err(StorageError::Backend(detail))
            }
        }
    }
}
