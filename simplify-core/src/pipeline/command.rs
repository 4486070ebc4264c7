use std::ffi::OsString;
use std::process::{Command, Stdio};

use serde::{Serialize, Serializer};

use super::{PipelineJob, SimplificationPipeline};
use crate::error::SimplifyError;
use crate::preprocessor::{serialize_stages, Preprocessor};

/// Maximum number of stderr lines kept in an error report.
const STDERR_TAIL: usize = 20;

/// Runs an external simplifier program once per job.
///
/// The program is invoked as:
///
/// ```text
/// <program> <args...> --model-dir <dir> --beam <n> --preprocessors <json> <source> <prediction>
/// ```
///
/// where `<json>` is the ordered `{stage: kwargs}` mapping. Its stdout is
/// discarded and stderr is only surfaced when the program fails.
#[derive(Debug, Clone)]
pub struct CommandPipeline {
	program: OsString,
	args: Vec<OsString>,
}

impl CommandPipeline {
	pub fn new<P, I, A>(program: P, args: I) -> Self
	where
		P: Into<OsString>,
		I: IntoIterator<Item = A>,
		A: Into<OsString>,
	{
		Self {
			program: program.into(),
			args: args.into_iter().map(Into::into).collect(),
		}
	}

	fn command(&self, job: &PipelineJob<'_>) -> Result<Command, SimplifyError> {
		let preprocessors = serde_json::to_string(&Stages(job.preprocessors))
			.map_err(|e| SimplifyError::pipeline(format!("cannot encode preprocessors: {e}")))?;

		let mut command = Command::new(&self.program);
		command
			.args(&self.args)
			.arg("--model-dir")
			.arg(job.model_dir)
			.arg("--beam")
			.arg(job.beam.to_string())
			.arg("--preprocessors")
			.arg(preprocessors)
			.arg(job.source)
			.arg(job.prediction)
			.stdin(Stdio::null())
			.stdout(Stdio::null())
			.stderr(Stdio::piped());
		Ok(command)
	}
}

impl SimplificationPipeline for CommandPipeline {
	fn run(&self, job: &PipelineJob<'_>) -> Result<(), SimplifyError> {
		let output = self.command(job)?.output().map_err(|e| {
			SimplifyError::pipeline(format!("failed to start {}: {e}", self.program.to_string_lossy()))
		})?;

		if output.status.success() {
			return Ok(());
		}

		let stderr = String::from_utf8_lossy(&output.stderr);
		let lines: Vec<&str> = stderr.lines().collect();
		let tail = lines[lines.len().saturating_sub(STDERR_TAIL)..].join("\n");
		Err(SimplifyError::pipeline(format!(
			"{} exited with {}: {}",
			self.program.to_string_lossy(),
			output.status,
			tail.trim()
		)))
	}
}

struct Stages<'a>(&'a [Preprocessor]);

impl Serialize for Stages<'_> {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serialize_stages(self.0, serializer)
	}
}
