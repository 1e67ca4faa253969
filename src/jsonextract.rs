use clap::{Arg, ArgAction, Command};
use std::fs;

use promptkit::helpers;
use promptkit::jsonblock;

fn main() -> Result<(), Box<dyn std::error::Error>> {
	env_logger::init();
	let matches = Command::new("jsonextract")
		.version("1.0")
		.about("Prints the JSON held in a ```json fenced block")
		.arg(
			Arg::new("file")
				.help("Text file or '-' for stdin")
				.default_value("-"),
		)
		.arg(
			Arg::new("first")
				.long("first")
				.help("Take the first block when there are several")
				.action(ArgAction::SetTrue),
		)
		.arg(
			Arg::new("path")
				.long("path")
				.help("Path in JSON to print (e.g., parent.child[0].key)"),
		)
		.get_matches();

	let file = matches.get_one::<String>("file").map(String::as_str).unwrap_or("-");
	let text = if file == "-" {
		helpers::read_stdin::<String>()?
	} else {
		fs::read_to_string(file)?
	};

	let value = if matches.get_flag("first") {
		jsonblock::json_loads_first(&text)?
	} else {
		jsonblock::json_loads(&text)?
	};

	let selected = match matches.get_one::<String>("path") {
		Some(path) => jsonblock::select(&value, path)?,
		None => &value,
	};

	println!("{}", serde_json::to_string_pretty(selected)?);
	Ok(())
}
