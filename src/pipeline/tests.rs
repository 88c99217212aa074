use crate::pipeline::{
    FailurePolicy, Layout, Pipeline, RunContext, Stage, StageOutcome, Summary, ToolCommand, ToolStatus,
};
use crate::run;

use color_eyre::eyre::{eyre, Report, Result};

/// Counts how many times it ran, then returns a fixed outcome.
struct Fixed(Option<StageOutcome>);

impl Stage for Fixed {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn run(&self, context: &mut RunContext) -> Result<StageOutcome, Report> {
        context.reference_length = Some(context.reference_length.unwrap_or_default() + 1);
        self.0.clone().ok_or_else(|| eyre!("fixed stage failed"))
    }
}

#[test]
fn stages_run_in_order() -> Result<(), Report> {
    let mut context = RunContext::new(&run::Args::default());
    let pipeline = Pipeline::new().stage(Fixed(Some(StageOutcome::Continue))).stage(Fixed(Some(StageOutcome::Continue)));
    assert_eq!(pipeline.run(&mut context)?, StageOutcome::Continue);
    assert_eq!(context.reference_length, Some(2));
    Ok(())
}

#[test]
fn halt_skips_remaining_stages() -> Result<(), Report> {
    let mut context = RunContext::new(&run::Args::default());
    let halt = StageOutcome::Halt("too few dates".to_string());
    let pipeline = Pipeline::new()
        .stage(Fixed(Some(halt.clone())))
        .stage(Fixed(Some(StageOutcome::Continue)));
    assert_eq!(pipeline.run(&mut context)?, halt);
    assert_eq!(context.reference_length, Some(1));
    Ok(())
}

#[test]
fn error_stops_pipeline() -> Result<(), Report> {
    let mut context = RunContext::new(&run::Args::default());
    let pipeline = Pipeline::new().stage(Fixed(None)).stage(Fixed(Some(StageOutcome::Continue)));
    assert!(pipeline.run(&mut context).is_err());
    assert_eq!(context.reference_length, Some(1));
    Ok(())
}

#[test]
fn missing_values_are_errors() -> Result<(), Report> {
    let context = RunContext::new(&run::Args::default());
    assert!(context.dates().is_err());
    assert!(context.reference_length().is_err());
    assert!(context.oldest_node().is_err());
    assert!(context.refseq_acc().is_err());
    Ok(())
}

#[test]
fn layout_check() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let layout = Layout::new(dir.path());
    assert!(layout.check().is_err());

    std::fs::write(layout.metadata(), "")?;
    let error = layout.check().err().map(|e| e.to_string()).unwrap_or_default();
    assert!(error.contains("output_stats.tsv"), "{error}");

    std::fs::write(layout.stats(), "")?;
    layout.check()?;
    assert!(Layout::new(dir.path().join("missing")).check().is_err());
    Ok(())
}

#[test]
fn summary_round_trip() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let mut context = RunContext::new(&run::Args::default());
    context.reference_length = Some(29903);
    let summary = Summary::new(&context, StageOutcome::Halt("reason".to_string()));

    let path = dir.path().join("clockroot_summary.json");
    summary.write(&path)?;
    let summary = Summary::read(&path)?;
    assert_eq!(summary.reference_length, Some(29903));
    assert_eq!(summary.outcome, StageOutcome::Halt("reason".to_string()));
    Ok(())
}

#[test]
fn command_line_quoting() -> Result<(), Report> {
    let command = ToolCommand::new("treetime").arg("--dates").arg("my dir/dates.csv").arg("it's");
    assert_eq!(command.command_line(), r"treetime --dates 'my dir/dates.csv' 'it'\''s'");
    Ok(())
}

#[cfg(unix)]
#[test]
fn tool_success_writes_log() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let output = dir.path().join("out.txt");
    let log = dir.path().join("tool.log");
    let command = ToolCommand::new("sh")
        .arg("-c")
        .arg(format!("echo hello; touch '{}'", output.display()))
        .output(output.clone())
        .log(log.clone());

    assert_eq!(command.run()?, ToolStatus::Success);
    let log = std::fs::read_to_string(&log)?;
    assert!(log.starts_with("hello\n"), "{log}");
    assert!(log.lines().last().is_some_and(|l| l.starts_with("[OK] sh -c")), "{log}");
    Ok(())
}

#[cfg(unix)]
#[test]
fn tool_missing_output() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let command = ToolCommand::new("sh").arg("-c").arg("true").output(dir.path().join("never.txt"));
    let error = command.run().err().map(|e| e.to_string()).unwrap_or_default();
    assert!(error.contains("did not produce"), "{error}");
    Ok(())
}

#[cfg(unix)]
#[test]
fn tool_failure_policies() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let log = dir.path().join("treetime.log");
    let command = ToolCommand::new("sh").arg("-c").arg("echo oops >&2; exit 3").log(log.clone());

    let error = command.clone().run().err().map(|e| e.to_string()).unwrap_or_default();
    assert!(error.contains("failed with return code 3"), "{error}");

    let status = command.policy(FailurePolicy::Tolerant).run()?;
    assert!(matches!(status, ToolStatus::Failed(reason) if reason.contains("return code 3")));

    let log = std::fs::read_to_string(&log)?;
    assert!(log.contains("oops"), "{log}");
    assert!(log.contains("[ERROR] sh -c 'echo oops >&2; exit 3' failed with return code 3"), "{log}");
    Ok(())
}

#[test]
fn tool_not_found() -> Result<(), Report> {
    let command = ToolCommand::new("clockroot-no-such-program");
    assert!(command.clone().run().is_err());
    let status = command.policy(FailurePolicy::Tolerant).run()?;
    assert!(matches!(status, ToolStatus::Failed(_)));
    Ok(())
}
