use crate::config::analysis::AnalysisConfig;
use crate::domain::model::{ParsedDocument, SourceDocument, TransformResult};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::Path;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    /// Names of the regular files directly under the storage root.
    fn list_files(&self) -> impl std::future::Future<Output = Result<Vec<String>>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn input_dir(&self) -> &Path;
    fn output_dir(&self) -> &Path;
    fn workers(&self) -> usize;
    fn page_base(&self) -> usize;
    fn dump_lines(&self) -> bool;
    fn analysis(&self) -> &AnalysisConfig;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self, source: &SourceDocument) -> Result<ParsedDocument>;
    async fn transform(&self, document: ParsedDocument) -> Result<TransformResult>;
    async fn load(&self, source: &SourceDocument, result: TransformResult) -> Result<String>;
}
