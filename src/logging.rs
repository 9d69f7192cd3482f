use simplelog::{
	format_description, ColorChoice, CombinedLogger, Config, ConfigBuilder, LevelFilter, LevelPadding, TermLogger,
	TerminalMode, WriteLogger,
};
use std::path::PathBuf;

fn config(ignore: &[&'static str]) -> Config {
	let mut builder = ConfigBuilder::new();
	builder
		.set_time_format_custom(format_description!("[hour]:[minute]:[second].[subsecond digits:3]"))
		// [ERROR]
		// [ WARN]
		// [ INFO]
		.set_level_padding(LevelPadding::Left)
		.set_thread_level(LevelFilter::Off)
		.set_target_level(LevelFilter::Error)
		.set_location_level(LevelFilter::Off);
	for target in ignore {
		builder.add_filter_ignore_str(*target);
	}
	builder.build()
}

/// Logs to stderr up to `terminal_level`, and everything to a truncated `<name>.log` in the working directory.
/// Stdout is left for command output. Targets starting with any of `ignore` are dropped.
pub fn init(name: &str, terminal_level: LevelFilter, ignore: &[&'static str]) -> anyhow::Result<PathBuf> {
	let log_path = std::env::current_dir()?.join(format!("{name}.log"));
	let file = std::fs::File::create(&log_path)?;
	let config = config(ignore);
	CombinedLogger::init(vec![
		TermLogger::new(terminal_level, config.clone(), TerminalMode::Stderr, ColorChoice::Auto),
		WriteLogger::new(LevelFilter::Trace, config, file),
	])?;
	log::debug!("Writing log to {}", log_path.display());
	log::debug!("Executing: {:?}", std::env::args().collect::<Vec<_>>());
	Ok(log_path)
}
