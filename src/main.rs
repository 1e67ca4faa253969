use clap::Parser;
use std::path::PathBuf;

use promptkit::helpers;
use promptkit::{ChatClient, Config, Message, Templates};

#[derive(Parser)]
struct Cli {
	/// The message to send to the assistant (prefix a filename with @ to send that file as your
	/// message, or use - for stdin). Ignored when --template is given.
	message: Option<String>,
	#[clap(long)]
	/// configuration file (YAML, or JSON when it ends in .json)
	config: Option<PathBuf>,
	#[clap(long)]
	/// JSON file holding prior messages to send before this one
	history: Option<PathBuf>,
	#[clap(long)]
	/// write the history, this message and the reply to a JSON file
	save_history: Option<PathBuf>,
	#[clap(long)]
	/// system message placed before any history
	system: Option<String>,
	#[clap(long)]
	/// render templates/<NAME>.txt and send that as the message
	template: Option<String>,
	#[clap(long, default_value = "templates")]
	templates_dir: PathBuf,
	#[clap(long = "var", value_parser = parse_var)]
	/// template variable as key=value (repeatable)
	vars: Vec<(String, String)>,
	#[clap(long)]
	/// parse the ```json block in the reply and print it
	extract_json: bool,
}

fn parse_var(s: &str) -> Result<(String, String), String> {
	helpers::parse_key_value(s).map_err(|e| e.to_string())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
	env_logger::init();
	let args = Cli::parse();

	let config = match &args.config {
		Some(path) => Config::from_path(path),
		None => Config::load(),
	};
	let config = match config {
		Ok(config) => config,
		Err(err) => {
			eprintln!("Cannot load configuration: {}", err);
			std::process::exit(1);
		}
	};

	let message = match (&args.template, args.message.as_deref()) {
		(Some(name), _) => Templates::new(&args.templates_dir).substitute(name, args.vars.iter().cloned())?,
		(None, Some(arg)) => helpers::read_text_arg(arg)?,
		(None, None) => return Err("Nothing to send: give a message or --template".into()),
	};

	let mut history: Vec<Message> = Vec::new();
	if let Some(system) = &args.system {
		history.push(Message::system(system.as_str()));
	}
	if let Some(path) = &args.history {
		history.extend(helpers::read_from_json::<Vec<Message>>(path)?);
	}

	log::info!("Sending {} prior messages to {}", history.len(), config.model);
	let client = ChatClient::new(config)?;
	let reply = client.invoke(&message, &history)?;

	if let Some(path) = &args.save_history {
		history.push(Message::user(message));
		history.push(Message::assistant(reply.as_str()));
		helpers::save_to_json(path, &history)?;
	}

	if args.extract_json {
		let value = promptkit::json_loads_first(&reply)?;
		println!("{}", serde_json::to_string_pretty(&value)?);
	} else {
		println!("{}", reply);
	}
	Ok(())
}
