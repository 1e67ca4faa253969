use clap::Parser;
use std::path::PathBuf;

use promptkit::helpers;
use promptkit::Templates;

#[derive(Parser)]
/// Render a template from the templates directory
struct Cli {
	/// template name, without the .txt extension
	name: String,
	#[clap(long, default_value = "templates")]
	dir: PathBuf,
	#[clap(long = "var", value_parser = parse_var)]
	/// variable as key=value (repeatable)
	vars: Vec<(String, String)>,
	#[clap(long)]
	/// leave unknown placeholders in place instead of failing
	safe: bool,
}

fn parse_var(s: &str) -> Result<(String, String), String> {
	helpers::parse_key_value(s).map_err(|e| e.to_string())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
	env_logger::init();
	let args = Cli::parse();

	let templates = Templates::new(args.dir);
	let output = if args.safe {
		templates.safe_substitute(&args.name, args.vars)?
	} else {
		templates.substitute(&args.name, args.vars)?
	};
	print!("{}", output);
	Ok(())
}
