use std::path::Path;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use owo_colors::OwoColorize;
use snipgen_cli::Commands;
use snipgen_cli::OutputFormat;
use snipgen_cli::SnipgenCli;
use snipgen_core::ScanReport;
use snipgen_core::SnipgenConfig;
use snipgen_core::SnipgenError;
use snipgen_core::TagPair;
use snipgen_core::find_project_root;
use snipgen_core::scan_project;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,yellow) => {
		if color_enabled() {
			format!("{}", $text.yellow())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,bold) => {
		if color_enabled() {
			format!("{}", $text.bold())
		} else {
			format!("{}", $text)
		}
	};
}

fn main() {
	let args = SnipgenCli::parse();

	// Respect NO_COLOR env var and --no-color flag.
	let use_color = !args.no_color
		&& std::env::var_os("NO_COLOR").is_none()
		&& supports_color::on(supports_color::Stream::Stdout).is_some();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	if args.verbose {
		tracing_subscriber::fmt()
			.with_writer(std::io::stderr)
			.with_env_filter(
				tracing_subscriber::EnvFilter::try_from_default_env()
					.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
			)
			.init();
	}

	// Install miette's fancy handler for rich error diagnostics.
	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	let result = match args.command {
		Some(Commands::Check { format }) => run_check(&args, format),
		Some(Commands::List { format }) => run_list(&args, format),
		None => {
			eprintln!("No subcommand specified. Run `snipgen --help` for usage.");
			process::exit(1);
		}
	};

	if let Err(e) = result {
		match e.downcast::<SnipgenError>() {
			Ok(err) => {
				let report = miette::Report::new(*err);
				eprintln!("{report:?}");
			}
			Err(e) => {
				eprintln!("{} {e}", colored!("error:", red));
			}
		}
		process::exit(2);
	}
}

fn resolve_root(args: &SnipgenCli) -> Result<PathBuf, Box<dyn std::error::Error>> {
	let start = match &args.path {
		Some(path) => path.clone(),
		None => std::env::current_dir()?,
	};
	Ok(find_project_root(&start)?)
}

/// Marker tokens for this run: command-line overrides first, then the root
/// config's `[parse]` section, then the built-in defaults.
fn resolve_tags(args: &SnipgenCli, root: &Path) -> Result<TagPair, Box<dyn std::error::Error>> {
	let config_tags = SnipgenConfig::load_dir(root)?
		.map_or_else(TagPair::default, |config| config.parse.tag_pair());
	Ok(TagPair::new(
		args.tag_start.clone().unwrap_or(config_tags.start),
		args.tag_end.clone().unwrap_or(config_tags.end),
	))
}

fn scan(args: &SnipgenCli) -> Result<(PathBuf, ScanReport), Box<dyn std::error::Error>> {
	let root = resolve_root(args)?;
	let tags = resolve_tags(args, &root)?;
	if args.verbose {
		println!("Project root: {}", root.display());
		println!("Marker tokens: `{}` .. `{}`", tags.start, tags.end);
	}
	let report = scan_project(&root, &tags)?;
	Ok((root, report))
}

fn run_check(args: &SnipgenCli, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
	let (root, report) = scan(args)?;

	if report.is_ok() {
		match format {
			OutputFormat::Json => {
				println!(
					"{}",
					serde_json::json!({ "ok": true, "regions": report.regions.len(), "problems": [] })
				);
			}
			OutputFormat::Text => {
				println!(
					"Check passed: {} region(s), all well formed.",
					report.regions.len()
				);
			}
		}
		return Ok(());
	}

	match format {
		OutputFormat::Json => {
			let problems: Vec<serde_json::Value> = report
				.problems
				.iter()
				.map(|problem| {
					serde_json::json!({
						"file": make_relative(&problem.file, &root),
						"error": problem.error.to_string(),
					})
				})
				.collect();
			let output = serde_json::json!({
				"ok": false,
				"regions": report.regions.len(),
				"problems": problems,
			});
			println!("{output}");
		}
		OutputFormat::Text => {
			eprintln!("Check failed.");
			eprintln!();
			eprintln!("Malformed regions:");
			for problem in &report.problems {
				let rel = make_relative(&problem.file, &root);
				eprintln!("  {rel}: {}", problem.error);
			}
			eprintln!();
			eprintln!(
				"{} {} file(s) with malformed regions",
				colored!("error:", red),
				report.problems.len()
			);
		}
	}

	process::exit(1);
}

fn run_list(args: &SnipgenCli, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
	let (root, report) = scan(args)?;

	match format {
		OutputFormat::Json => {
			let regions: Vec<serde_json::Value> = report
				.regions
				.iter()
				.map(|found| {
					serde_json::json!({
						"file": make_relative(&found.file, &root),
						"name": found.region.name,
						"argument": found.region.argument,
						"line_start": found.region.line_start,
						"line_end": found.region.line_end,
					})
				})
				.collect();
			println!("{}", serde_json::json!({ "regions": regions }));
		}
		OutputFormat::Text => {
			if report.regions.is_empty() {
				println!("No snippet regions found.");
			} else {
				println!("{}", colored!("Regions:", bold));
				for found in &report.regions {
					let rel = make_relative(&found.file, &root);
					let argument = if found.region.argument.is_null() {
						String::new()
					} else {
						format!(" {}", found.region.argument)
					};
					println!(
						"  {} {rel}:{}-{}{argument}",
						found.region.name, found.region.line_start, found.region.line_end
					);
				}
				println!("\n{} region(s)", report.regions.len());
			}

			for problem in &report.problems {
				let rel = make_relative(&problem.file, &root);
				eprintln!("{} {rel}: {}", colored!("warning:", yellow), problem.error);
			}
		}
	}

	Ok(())
}

/// Make a path relative to root for display purposes.
fn make_relative(path: &Path, root: &Path) -> String {
	path.strip_prefix(root)
		.unwrap_or(path)
		.display()
		.to_string()
}
