use std::{
	path::{Path, PathBuf},
	time::Duration,
};

use reqwest::Client;

use crate::{Error, Result};
use faq_config::{Knowledge, ObjectStore};

const QUESTION_COLUMN: &str = "question";
const ANSWER_COLUMN: &str = "answer";

/// One question/answer row of the dataset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FaqRecord {
	pub question: String,
	pub answer: String,
}
impl FaqRecord {
	/// The indexed text unit.
	pub fn text(&self) -> String {
		format!("Q: {}\nA: {}", self.question, self.answer)
	}
}

/// Resolves the local CSV path, downloading it first when an object store is configured and no
/// cached copy exists.
pub async fn ensure_dataset(cfg: &Knowledge) -> Result<PathBuf> {
	let path = cfg.data_path.clone();
	let Some(object_store) = cfg.object_store.as_ref() else { return Ok(path) };

	if tokio::fs::try_exists(&path).await.unwrap_or(false) {
		tracing::info!(path = %path.display(), "Using cached dataset.");

		return Ok(path);
	}

	download(object_store, &path).await?;

	Ok(path)
}

pub fn object_url(object_store: &ObjectStore) -> String {
	format!(
		"{}/{}/{}",
		object_store.endpoint.trim_end_matches('/'),
		object_store.bucket.trim_matches('/'),
		object_store.key.trim_start_matches('/')
	)
}

pub async fn download(object_store: &ObjectStore, dest: &Path) -> Result<()> {
	let url = object_url(object_store);
	let download_err = |source| Error::Download { url: url.clone(), source };
	let client = Client::builder()
		.timeout(Duration::from_millis(object_store.timeout_ms))
		.build()
		.map_err(download_err)?;
	let bytes = client
		.get(&url)
		.send()
		.await
		.and_then(|res| res.error_for_status())
		.map_err(download_err)?
		.bytes()
		.await
		.map_err(download_err)?;
	let write_err = |source| Error::WriteCache { path: dest.to_path_buf(), source };

	if let Some(parent) = dest.parent().filter(|parent| !parent.as_os_str().is_empty()) {
		tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
	}

	let partial = dest.with_extension("partial");

	tokio::fs::write(&partial, &bytes).await.map_err(write_err)?;
	tokio::fs::rename(&partial, dest).await.map_err(write_err)?;

	tracing::info!(%url, path = %dest.display(), bytes = bytes.len(), "Downloaded dataset.");

	Ok(())
}

pub fn load_csv(path: &Path) -> Result<Vec<FaqRecord>> {
	let read_err = |source| Error::ReadDataset { path: path.to_path_buf(), source };
	let mut reader = csv::Reader::from_path(path).map_err(read_err)?;
	let headers = reader.headers().map_err(read_err)?.clone();
	let column = |name: &'static str| {
		headers
			.iter()
			.position(|header| header.trim().eq_ignore_ascii_case(name))
			.ok_or(Error::MissingColumn { path: path.to_path_buf(), column: name })
	};
	let question_idx = column(QUESTION_COLUMN)?;
	let answer_idx = column(ANSWER_COLUMN)?;
	let mut records = Vec::new();

	for row in reader.records() {
		let row = row.map_err(read_err)?;
		let question = row.get(question_idx).unwrap_or_default().trim().to_string();
		let answer = row.get(answer_idx).unwrap_or_default().trim().to_string();

		records.push(FaqRecord { question, answer });
	}

	tracing::info!(path = %path.display(), rows = records.len(), "Loaded dataset.");

	Ok(records)
}
