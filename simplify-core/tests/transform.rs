//! Transformation adapter tests against fake pipelines and model sources.

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use simplify_core::io::{read_lines, write_lines};
use simplify_core::model::source::SourceError;
use simplify_core::model::{ModelArtifact, ModelSource};
use simplify_core::pipeline::{PipelineJob, SimplificationPipeline};
use simplify_core::preprocessor::Preprocessor;
use simplify_core::tokenize::Tokenization;
use simplify_core::{SimplificationRequest, SimplifyError, Transformer};
use tempfile::TempDir;

/// Applies `map` to every line and records each job it sees.
struct MapPipeline {
	map: fn(&str) -> String,
	jobs: Mutex<Vec<(usize, Vec<Preprocessor>)>>,
}

impl MapPipeline {
	fn new(map: fn(&str) -> String) -> Arc<Self> {
		Arc::new(Self { map, jobs: Mutex::new(Vec::new()) })
	}

	fn calls(&self) -> usize {
		self.jobs.lock().unwrap().len()
	}
}

impl SimplificationPipeline for MapPipeline {
	fn run(&self, job: &PipelineJob<'_>) -> Result<(), SimplifyError> {
		assert!(job.model_dir.is_dir());
		self.jobs.lock().unwrap().push((job.beam, job.preprocessors.to_vec()));
		let lines = read_lines(job.source)?;
		write_lines(job.prediction, lines.iter().map(|l| (self.map)(l)))?;
		Ok(())
	}
}

struct CrashingPipeline;

impl SimplificationPipeline for CrashingPipeline {
	fn run(&self, _job: &PipelineJob<'_>) -> Result<(), SimplifyError> {
		Err(SimplifyError::PipelineExecution { message: "decoder crashed".to_owned() })
	}
}

/// Creates a one-file model directory and counts its fetches.
struct FakeSource {
	fetches: Arc<AtomicUsize>,
}

impl ModelSource for FakeSource {
	fn fetch(&self, destination: &Path) -> Result<(), SourceError> {
		self.fetches.fetch_add(1, Ordering::SeqCst);
		fs::write(destination.join("checkpoint_best.pt"), "weights")?;
		Ok(())
	}

	fn describe(&self) -> String {
		"fake".to_owned()
	}
}

struct StorageFault;

impl ModelSource for StorageFault {
	fn fetch(&self, _destination: &Path) -> Result<(), SourceError> {
		Err(Box::new(std::io::Error::new(std::io::ErrorKind::StorageFull, "disk full")))
	}

	fn describe(&self) -> String {
		"full disk".to_owned()
	}
}

struct Fixture {
	root: TempDir,
	fetches: Arc<AtomicUsize>,
}

impl Fixture {
	fn new() -> Self {
		let root = tempfile::tempdir().unwrap();
		fs::create_dir(root.path().join("scratch")).unwrap();
		Self { root, fetches: Arc::new(AtomicUsize::new(0)) }
	}

	fn scratch(&self) -> std::path::PathBuf {
		self.root.path().join("scratch")
	}

	fn scratch_is_empty(&self) -> bool {
		fs::read_dir(self.scratch()).unwrap().next().is_none()
	}

	fn model(&self) -> Arc<ModelArtifact> {
		Arc::new(ModelArtifact::new(
			self.root.path().join("model"),
			Box::new(FakeSource { fetches: self.fetches.clone() }),
		))
	}

	fn transformer(&self, pipeline: Arc<dyn SimplificationPipeline>) -> Transformer {
		Transformer::new(self.model(), pipeline).with_scratch_dir(self.scratch())
	}
}

fn lowercase(line: &str) -> String {
	line.to_lowercase()
}

fn echo(line: &str) -> String {
	line.to_owned()
}

#[test]
fn lowercasing_stub_with_default_knobs() {
	let fixture = Fixture::new();
	let pipeline = MapPipeline::new(lowercase);
	let transformer = fixture.transformer(pipeline.clone()).with_tokenization(Tokenization::None);

	let request = SimplificationRequest::new("The cat sat on the mat.\nIt was a sunny day.");
	let lines = transformer.transform(&request).unwrap();

	assert_eq!(lines, ["the cat sat on the mat.", "it was a sunny day."]);
	let jobs = pipeline.jobs.lock().unwrap();
	let (beam, stages) = &jobs[0];
	assert_eq!(*beam, 1);
	assert_eq!(
		stages,
		&[
			Preprocessor::LengthRatio { target_ratio: 0.95 },
			Preprocessor::Levenshtein { target_ratio: 0.75 },
			Preprocessor::WordRankRatio { target_ratio: 0.75 },
			Preprocessor::SentencePiece { vocab_size: 10000 },
		]
	);
}

#[test]
fn lines_are_word_tokenized_by_default() {
	let fixture = Fixture::new();
	let transformer = fixture.transformer(MapPipeline::new(echo));

	let lines = transformer.transform(&SimplificationRequest::new("It isn't raining.")).unwrap();
	assert_eq!(lines, ["It is n't raining ."]);
}

#[test]
fn output_line_count_matches_input() {
	let fixture = Fixture::new();
	let transformer = fixture.transformer(MapPipeline::new(echo));

	for text in ["one", "one\ntwo", "a\n\nc", "a\r\nb\r\nc", "x\ny\nz\nw\n"] {
		let expected = text.lines().count();
		assert_eq!(transformer.transform(&SimplificationRequest::new(text)).unwrap().len(), expected, "{text:?}");
	}
	assert!(fixture.scratch_is_empty());
}

#[test]
fn identical_calls_are_idempotent_and_fetch_the_model_once() {
	let fixture = Fixture::new();
	let transformer = fixture.transformer(MapPipeline::new(lowercase));
	let request = SimplificationRequest::new("Some Text.\nMore Text.");

	let first = transformer.transform(&request).unwrap();
	let second = transformer.transform(&request).unwrap();

	assert_eq!(first, second);
	assert_eq!(fixture.fetches.load(Ordering::SeqCst), 1);
}

#[test]
fn empty_text_yields_no_lines() {
	let fixture = Fixture::new();
	let pipeline = MapPipeline::new(echo);
	let transformer = fixture.transformer(pipeline.clone());

	assert!(transformer.transform(&SimplificationRequest::new("")).unwrap().is_empty());
	assert_eq!(pipeline.calls(), 0);
	assert_eq!(fixture.fetches.load(Ordering::SeqCst), 0);
}

#[test]
fn out_of_range_knobs_never_reach_the_pipeline() {
	let fixture = Fixture::new();
	let pipeline = MapPipeline::new(echo);
	let transformer = fixture.transformer(pipeline.clone());

	let mut request = SimplificationRequest::new("text");
	request.vocab_size = 4999;
	assert!(matches!(transformer.transform(&request), Err(SimplifyError::InvalidParameter { .. })));

	let mut request = SimplificationRequest::new("text");
	request.levenshtein_ratio = 1.5;
	assert!(matches!(transformer.transform(&request), Err(SimplifyError::InvalidParameter { .. })));

	assert_eq!(pipeline.calls(), 0);
	assert!(fixture.scratch_is_empty());
}

#[test]
fn storage_fault_is_model_unavailable_and_releases_artifacts() {
	let fixture = Fixture::new();
	let model = Arc::new(ModelArtifact::new(fixture.root.path().join("model"), Box::new(StorageFault)));
	let pipeline = MapPipeline::new(echo);
	let transformer = Transformer::new(model, pipeline.clone()).with_scratch_dir(fixture.scratch());

	match transformer.transform(&SimplificationRequest::new("Hello.")) {
		Err(SimplifyError::ModelUnavailable { message }) => assert!(message.contains("disk full"), "{message}"),
		other => panic!("expected ModelUnavailable, got {other:?}"),
	}
	assert_eq!(pipeline.calls(), 0);
	assert!(fixture.scratch_is_empty());
}

#[test]
fn pipeline_failure_propagates_and_releases_artifacts() {
	let fixture = Fixture::new();
	let transformer = fixture.transformer(Arc::new(CrashingPipeline));

	match transformer.transform(&SimplificationRequest::new("Hello.")) {
		Err(SimplifyError::PipelineExecution { message }) => assert_eq!(message, "decoder crashed"),
		other => panic!("expected PipelineExecution, got {other:?}"),
	}
	assert!(fixture.scratch_is_empty());
}

#[test]
fn concurrent_transforms_share_one_model_preparation() {
	let fixture = Fixture::new();
	let transformer = Arc::new(fixture.transformer(MapPipeline::new(lowercase)));

	let handles: Vec<_> = (0..6)
		.map(|i| {
			let transformer = transformer.clone();
			std::thread::spawn(move || transformer.transform(&SimplificationRequest::new(format!("Line {i}"))))
		})
		.collect();
	for (i, handle) in handles.into_iter().enumerate() {
		assert_eq!(handle.join().unwrap().unwrap(), [format!("line {i}")]);
	}

	assert_eq!(fixture.fetches.load(Ordering::SeqCst), 1);
}
